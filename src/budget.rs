use serde::{Deserialize, Serialize};

use crate::hyperlink::{resolve_description, RelIdAllocator, Relationship};
use crate::markup::EM_DASH;

pub const OTHER_CATEGORY: &str = "other";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetKind {
    Income,
    #[default]
    Outcome,
}

impl BudgetKind {
    pub fn label(self) -> &'static str {
        match self {
            BudgetKind::Income => "Income",
            BudgetKind::Outcome => "Outcome",
        }
    }
}

/// One budget line as stored on the event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BudgetLine {
    pub item: Option<String>,
    #[serde(rename = "type")]
    pub kind: BudgetKind,
    pub qty: f64,
    pub price_per_qty: f64,
    pub description: Option<String>,
    pub category: Option<String>,
}

impl BudgetLine {
    pub fn qty(&self) -> f64 {
        non_negative(self.qty)
    }

    pub fn price_per_qty(&self) -> f64 {
        non_negative(self.price_per_qty)
    }

    pub fn line_total(&self) -> f64 {
        self.qty() * self.price_per_qty()
    }
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetItemView {
    pub item: String,
    #[serde(rename = "type")]
    pub type_label: &'static str,
    pub qty: f64,
    pub price_per_qty: f64,
    pub price_display: String,
    pub description: String,
    pub description_display_xml: String,
    pub line_total: f64,
    pub line_total_display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetCategoryView {
    pub category_name: String,
    pub items: Vec<BudgetItemView>,
    pub total: f64,
    pub total_display: String,
}

/// Trimmed category label; blank or absent collapses to [`OTHER_CATEGORY`].
pub fn normalize_category(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => OTHER_CATEGORY.to_string(),
    }
}

/// Group lines by normalized category, categories in first-seen order.
pub fn group_by_category(lines: &[BudgetLine]) -> Vec<(String, Vec<&BudgetLine>)> {
    let mut groups: Vec<(String, Vec<&BudgetLine>)> = Vec::new();
    for line in lines {
        let name = normalize_category(line.category.as_deref());
        match groups.iter_mut().find(|(n, _)| *n == name) {
            Some((_, items)) => items.push(line),
            None => groups.push((name, vec![line])),
        }
    }
    groups
}

/// `Rp 1.234.567,89`; non-finite amounts show as `Rp 0,00`.
pub fn format_rupiah(amount: f64) -> String {
    if !amount.is_finite() {
        return "Rp 0,00".to_string();
    }
    let cents = (amount.abs() * 100.0).round() as u64;
    let int_part = (cents / 100).to_string();
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}Rp {grouped},{:02}", cents % 100)
}

fn item_view(line: &BudgetLine, ids: &mut RelIdAllocator, rels: &mut Vec<Relationship>) -> BudgetItemView {
    let resolved = resolve_description(line.description.as_deref().unwrap_or_default(), ids);
    let description = line.description.clone().unwrap_or_else(|| EM_DASH.to_string());
    rels.extend(resolved.relationship);
    BudgetItemView {
        item: line.item.clone().unwrap_or_else(|| EM_DASH.to_string()),
        type_label: line.kind.label(),
        qty: line.qty(),
        price_per_qty: line.price_per_qty(),
        price_display: format_rupiah(line.price_per_qty()),
        description,
        description_display_xml: resolved.markup.into_string(),
        line_total: line.line_total(),
        line_total_display: format_rupiah(line.line_total()),
    }
}

/// Build the per-category budget tables. URL descriptions allocate relationship
/// ids in table order; the allocated relationships are returned for registration.
pub fn budget_by_category(
    lines: &[BudgetLine],
    ids: &mut RelIdAllocator,
) -> (Vec<BudgetCategoryView>, Vec<Relationship>) {
    let mut rels = Vec::new();
    let mut categories = Vec::new();
    for (name, lines) in group_by_category(lines) {
        let total: f64 = lines.iter().map(|l| l.line_total()).sum();
        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            items.push(item_view(line, ids, &mut rels));
        }
        categories.push(BudgetCategoryView {
            category_name: name,
            items,
            total,
            total_display: format_rupiah(total),
        });
    }
    (categories, rels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(category: &str, qty: f64, price: f64) -> BudgetLine {
        BudgetLine {
            item: Some(format!("{category}-item")),
            qty,
            price_per_qty: price,
            category: Some(category.to_string()),
            ..BudgetLine::default()
        }
    }

    #[test]
    fn groups_in_first_seen_order_with_other_bucket() {
        let lines = vec![line("Food", 2.0, 10.0), line("  ", 1.0, 5.0), line("Food", 3.0, 1.0)];
        let mut ids = RelIdAllocator::default();
        let (cats, rels) = budget_by_category(&lines, &mut ids);
        assert!(rels.is_empty());
        assert_eq!(cats.len(), 2);
        assert_eq!(cats[0].category_name, "Food");
        assert_eq!(cats[0].items.len(), 2);
        assert_eq!(cats[0].total, 23.0);
        assert_eq!(cats[1].category_name, OTHER_CATEGORY);
        assert_eq!(cats[1].items.len(), 1);
        assert_eq!(cats[1].total, 5.0);
    }

    #[test]
    fn category_labels_are_trimmed() {
        let lines = vec![line(" Venue ", 1.0, 1.0), line("Venue", 1.0, 1.0)];
        assert_eq!(group_by_category(&lines).len(), 1);
        assert_eq!(normalize_category(None), OTHER_CATEGORY);
    }

    #[test]
    fn url_descriptions_allocate_sequential_ids() {
        let mut a = line("A", 1.0, 1.0);
        a.description = Some("https://a.test".into());
        let mut b = line("B", 1.0, 1.0);
        b.description = Some("plain note".into());
        let mut c = line("A", 1.0, 1.0);
        c.description = Some("http://c.test".into());
        let mut ids = RelIdAllocator::new(8);
        let (cats, rels) = budget_by_category(&[a, b, c], &mut ids);
        // category A (a, c) renders before category B.
        assert_eq!(
            rels.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            vec!["rId8", "rId9"]
        );
        assert_eq!(rels[1].target, "http://c.test");
        assert!(cats[0].items[1].description_display_xml.contains("r:id=\"rId9\""));
        assert!(cats[1].items[0].description_display_xml.contains(">plain note<"));
    }

    #[test]
    fn item_view_fields() {
        let mut l = line("Food", 3.0, 1500.5);
        l.kind = BudgetKind::Income;
        l.item = None;
        let mut ids = RelIdAllocator::default();
        let (cats, _) = budget_by_category(&[l], &mut ids);
        let item = &cats[0].items[0];
        assert_eq!(item.item, EM_DASH);
        assert_eq!(item.type_label, "Income");
        assert_eq!(item.price_display, "Rp 1.500,50");
        assert_eq!(item.line_total, 4501.5);
        assert_eq!(item.line_total_display, "Rp 4.501,50");
        assert_eq!(item.description, EM_DASH);
        assert!(item.description_display_xml.contains(EM_DASH));
    }

    #[test]
    fn negative_and_non_finite_amounts_count_as_zero() {
        let l = line("X", -2.0, f64::NAN);
        assert_eq!(l.line_total(), 0.0);
    }

    #[test]
    fn rupiah_formatting() {
        assert_eq!(format_rupiah(0.0), "Rp 0,00");
        assert_eq!(format_rupiah(999.0), "Rp 999,00");
        assert_eq!(format_rupiah(1000.0), "Rp 1.000,00");
        assert_eq!(format_rupiah(1234567.891), "Rp 1.234.567,89");
        assert_eq!(format_rupiah(0.999), "Rp 1,00");
        assert_eq!(format_rupiah(-2500.0), "-Rp 2.500,00");
        assert_eq!(format_rupiah(f64::INFINITY), "Rp 0,00");
    }

    #[test]
    fn budget_line_deserializes_from_event_json() {
        let json = r#"{"item":"Tent","type":"income","qty":2,"pricePerQty":150000,"category":"Gear"}"#;
        let l: BudgetLine = serde_json::from_str(json).unwrap();
        assert_eq!(l.kind, BudgetKind::Income);
        assert_eq!(l.line_total(), 300000.0);
        assert_eq!(l.description, None);
    }
}
