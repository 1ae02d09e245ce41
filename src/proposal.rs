//! The proposal render request and the data object handed to the template.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use crate::budget::{budget_by_category, BudgetCategoryView, BudgetLine};
use crate::hyperlink::{RelIdAllocator, Relationship};
use crate::markup::{html_to_word_xml, EM_DASH};
use crate::plain_text::html_to_plain_text;

const UNTIL_FINISH: &str = "Until finish";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityTime {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub until_finish: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CommitteeMember {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunDownItem {
    pub time_start: Option<String>,
    pub time_end: Option<String>,
    pub duration_minutes: Option<u32>,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Event values already resolved by the caller (lookups populated, dates parsed).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProposalRequest {
    pub name: String,
    pub activity_type: Option<String>,
    pub description: Option<String>,
    pub activity: Vec<String>,
    pub purpose: Vec<String>,
    #[serde(deserialize_with = "deserialize_date")]
    pub activity_date: Option<NaiveDate>,
    pub activity_time: ActivityTime,
    pub activity_location: Option<String>,
    pub target_audience: Option<i64>,
    pub committee: Vec<CommitteeMember>,
    pub run_down: Vec<RunDownItem>,
    pub budget: Vec<BudgetLine>,
}

/// Accept either `YYYY-MM-DD` or a full RFC 3339 timestamp.
fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| Some(dt.date_naive()))
        .map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitteeEntry {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunDownRow {
    pub waktu: String,
    pub duration: String,
    pub name: String,
    pub description: String,
    pub description_formatted: String,
}

/// Template render data. Field names are the template's placeholder names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProposalData {
    pub event_name: String,
    pub activity_type: String,
    pub event_description: String,
    pub activity: Vec<String>,
    pub purpose: Vec<String>,
    pub activity_date: String,
    pub date: String,
    pub activity_location: String,
    pub location: String,
    pub activity_start_time: String,
    pub activity_end_time: String,
    pub start_time: String,
    pub end_time: String,
    pub time: String,
    pub target_audience: String,
    pub committee: Vec<CommitteeEntry>,
    pub committee_list: Vec<String>,
    #[serde(rename = "runDown")]
    pub run_down: Vec<RunDownRow>,
    #[serde(rename = "budgetByCategory")]
    pub budget_by_category: Vec<BudgetCategoryView>,
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.is_empty())
}

fn numbered(items: &[String]) -> Vec<String> {
    items
        .iter()
        .enumerate()
        .map(|(i, text)| format!("{}. {}", i + 1, text))
        .collect()
}

/// `Monday, 3 March 2025`
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%A, %-d %B %Y").to_string()
}

fn committee_entry(member: &CommitteeMember) -> CommitteeEntry {
    let email = member.email.clone().unwrap_or_default();
    let name = match member.name.as_deref().map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => email.clone(),
    };
    CommitteeEntry { name, email }
}

fn run_down_row(item: &RunDownItem) -> RunDownRow {
    let waktu = [item.time_start.as_deref(), item.time_end.as_deref()]
        .into_iter()
        .filter_map(non_blank)
        .collect::<Vec<_>>()
        .join(" - ");
    let description = item.description.as_deref().unwrap_or_default();
    RunDownRow {
        waktu: if waktu.is_empty() { EM_DASH.to_string() } else { waktu },
        duration: item
            .duration_minutes
            .map_or_else(|| EM_DASH.to_string(), |m| m.to_string()),
        name: non_blank(item.name.as_deref()).unwrap_or(EM_DASH).to_string(),
        description: html_to_plain_text(description),
        description_formatted: html_to_word_xml(description).into_string(),
    }
}

impl ProposalData {
    /// Assemble render data, allocating hyperlink ids from `ids`. Returns the
    /// relationships the rendered package must register.
    pub fn assemble(request: &ProposalRequest, ids: &mut RelIdAllocator) -> (Self, Vec<Relationship>) {
        let activity_date = request.activity_date.map(format_long_date).unwrap_or_default();
        let at = &request.activity_time;
        let start_time = non_blank(at.start_time.as_deref()).unwrap_or_default().to_string();
        let end_time = if at.until_finish {
            UNTIL_FINISH.to_string()
        } else {
            non_blank(at.end_time.as_deref()).unwrap_or_default().to_string()
        };
        let time = match (start_time.is_empty(), end_time.is_empty()) {
            (false, false) => format!("{start_time} - {end_time}"),
            (false, true) => start_time.clone(),
            _ => end_time.clone(),
        };

        let committee: Vec<CommitteeEntry> = request.committee.iter().map(committee_entry).collect();
        let committee_list = committee
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let name = c.name.trim();
                format!("{}. {}", i + 1, if name.is_empty() { EM_DASH } else { name })
            })
            .collect();

        let (budget_by_category, relationships) = budget_by_category(&request.budget, ids);
        let location = request.activity_location.clone().unwrap_or_default();

        let data = ProposalData {
            event_name: request.name.clone(),
            activity_type: request.activity_type.clone().unwrap_or_default(),
            event_description: request.description.clone().unwrap_or_default(),
            activity: numbered(&request.activity),
            purpose: numbered(&request.purpose),
            date: activity_date.clone(),
            activity_date,
            activity_location: location.clone(),
            location,
            activity_start_time: start_time.clone(),
            activity_end_time: end_time.clone(),
            start_time,
            end_time,
            time,
            target_audience: request.target_audience.unwrap_or(0).to_string(),
            committee,
            committee_list,
            run_down: request.run_down.iter().map(run_down_row).collect(),
            budget_by_category,
        };
        (data, relationships)
    }
}
