use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::escape::{xml_escape_attr, xml_escape_text};
use crate::markup::{Rendered, NS_W};

pub const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const HYPERLINK_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
pub const LINK_DISPLAY_TEXT: &str = "Link";

lazy_static! {
    static ref REL_ID: Regex = Regex::new(r#"\bId="rId(\d+)""#).expect("relationship id pattern");
}

/// An external hyperlink target registered in the document relationships part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relationship {
    pub id: String,
    pub target: String,
}

/// Hands out `rIdN` identifiers for one generation run. Ids only ever move
/// forward; once the counter space is used up no further ids are issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelIdAllocator {
    next: Option<u64>,
}

impl RelIdAllocator {
    pub const DEFAULT_SEED: u64 = 100;

    pub fn new(seed: u64) -> Self {
        Self { next: Some(seed) }
    }

    /// Seed from an existing relationships part: one past the highest `rIdN`,
    /// or [`Self::DEFAULT_SEED`] when the part has no `rIdN` ids. An id too
    /// large for the counter leaves nothing safe to issue.
    pub fn from_rels_xml(rels_xml: Option<&str>) -> Self {
        let mut max: Option<u64> = None;
        for caps in rels_xml.into_iter().flat_map(|xml| REL_ID.captures_iter(xml)) {
            match caps[1].parse::<u64>() {
                Ok(n) => max = max.max(Some(n)),
                Err(_) => return Self { next: None },
            }
        }
        match max {
            Some(n) => Self {
                next: n.checked_add(1),
            },
            None => Self::new(Self::DEFAULT_SEED),
        }
    }

    /// The number the next allocation will use, if any remain.
    pub fn peek(&self) -> Option<u64> {
        self.next
    }

    pub fn allocate(&mut self) -> Option<String> {
        let n = self.next?;
        self.next = n.checked_add(1);
        Some(format!("rId{n}"))
    }
}

impl Default for RelIdAllocator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDescription {
    pub markup: Rendered,
    pub relationship: Option<Relationship>,
}

pub fn is_web_url(s: &str) -> bool {
    let starts = |prefix: &str| {
        s.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    };
    starts("http://") || starts("https://")
}

fn wrap_paragraph(inner: &str) -> String {
    format!("<w:p xmlns:w=\"{NS_W}\">{inner}</w:p>")
}

fn hyperlink_xml(rel_id: &str, url: &str) -> String {
    format!(
        concat!(
            "<w:hyperlink xmlns:w=\"{w}\" xmlns:r=\"{r}\" r:id=\"{id}\" w:tooltip=\"{tooltip}\">",
            "<w:r xmlns:w=\"{w}\"><w:rPr><w:color w:val=\"0000FF\"/><w:u w:val=\"single\"/></w:rPr>",
            "<w:t xml:space=\"preserve\">{text}</w:t></w:r>",
            "</w:hyperlink>"
        ),
        w = NS_W,
        r = NS_R,
        id = xml_escape_attr(rel_id),
        tooltip = xml_escape_attr(url),
        text = xml_escape_text(LINK_DISPLAY_TEXT),
    )
}

fn text_run_xml(text: &str) -> String {
    format!(
        "<w:r xmlns:w=\"{NS_W}\"><w:t xml:space=\"preserve\">{}</w:t></w:r>",
        xml_escape_text(text)
    )
}

/// Render a free-text description. A value that starts with `http://` or
/// `https://` becomes a clickable "Link" backed by a freshly allocated
/// relationship; anything else is a plain run. Blank input is a placeholder.
/// A URL that cannot get an id is kept as plain text.
pub fn resolve_description(description: &str, ids: &mut RelIdAllocator) -> ResolvedDescription {
    let s = description.trim();
    if s.is_empty() {
        return ResolvedDescription {
            markup: Rendered::placeholder(),
            relationship: None,
        };
    }

    if is_web_url(s) {
        match ids.allocate() {
            Some(id) => {
                return ResolvedDescription {
                    markup: Rendered::Markup(wrap_paragraph(&hyperlink_xml(&id, s))),
                    relationship: Some(Relationship {
                        id,
                        target: s.to_string(),
                    }),
                }
            }
            None => warn!(url = s, "relationship ids exhausted; link kept as text"),
        }
    }

    ResolvedDescription {
        markup: Rendered::Markup(wrap_paragraph(&text_run_xml(s))),
        relationship: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::EM_DASH;

    #[test]
    fn url_becomes_link_with_relationship() {
        let mut ids = RelIdAllocator::new(8);
        let out = resolve_description("https://example.com/x", &mut ids);
        let rel = out.relationship.expect("relationship");
        assert_eq!(rel.id, "rId8");
        assert_eq!(rel.target, "https://example.com/x");
        let xml = out.markup.as_str();
        assert!(xml.contains(">Link</w:t>"));
        assert!(xml.contains("r:id=\"rId8\""));
        assert!(xml.contains("w:tooltip=\"https://example.com/x\""));
        assert_eq!(ids.peek(), Some(9));
    }

    #[test]
    fn url_scheme_is_case_insensitive_and_target_is_verbatim() {
        let mut ids = RelIdAllocator::default();
        let out = resolve_description("  HTTP://Example.com/a?b=1&c=\"d\"  ", &mut ids);
        let rel = out.relationship.expect("relationship");
        assert_eq!(rel.id, "rId100");
        assert_eq!(rel.target, "HTTP://Example.com/a?b=1&c=\"d\"");
        assert!(out
            .markup
            .as_str()
            .contains("w:tooltip=\"HTTP://Example.com/a?b=1&amp;c=&quot;d&quot;\""));
    }

    #[test]
    fn embedded_url_stays_plain_text() {
        let mut ids = RelIdAllocator::new(1);
        let out = resolve_description("Please see https://example.com", &mut ids);
        assert!(out.relationship.is_none());
        assert!(out.markup.as_str().contains(">Please see https://example.com</w:t>"));
        assert_eq!(ids.peek(), Some(1));
    }

    #[test]
    fn plain_text_is_escaped() {
        let mut ids = RelIdAllocator::default();
        let out = resolve_description("Snacks & <drinks>", &mut ids);
        assert!(out.markup.as_str().contains(">Snacks &amp; &lt;drinks&gt;</w:t>"));
    }

    #[test]
    fn control_characters_are_stripped_from_markup() {
        let mut ids = RelIdAllocator::default();
        let out = resolve_description("tea\u{0}cups", &mut ids);
        assert!(out.markup.as_str().contains(">teacups</w:t>"));
        let out = resolve_description("https://x.test/\u{1}a", &mut ids);
        assert!(out.markup.as_str().contains("w:tooltip=\"https://x.test/a\""));
    }

    #[test]
    fn blank_is_placeholder_without_allocation() {
        let mut ids = RelIdAllocator::new(5);
        let out = resolve_description("   ", &mut ids);
        assert!(out.markup.is_placeholder());
        assert!(out.markup.as_str().contains(EM_DASH));
        assert!(out.relationship.is_none());
        assert_eq!(ids.peek(), Some(5));
    }

    #[test]
    fn seed_follows_highest_existing_id() {
        let rels = r#"<Relationships><Relationship Id="rId5" Target="a"/><Relationship Id="rId7" Target="b"/></Relationships>"#;
        let mut ids = RelIdAllocator::from_rels_xml(Some(rels));
        assert_eq!(ids.allocate().as_deref(), Some("rId8"));
        assert_eq!(ids.allocate().as_deref(), Some("rId9"));
        assert_eq!(ids.allocate().as_deref(), Some("rId10"));
    }

    #[test]
    fn seed_defaults_without_rid_ids() {
        assert_eq!(RelIdAllocator::from_rels_xml(None).peek(), Some(100));
        assert_eq!(
            RelIdAllocator::from_rels_xml(Some(r#"<Relationship Id="image1"/>"#)).peek(),
            Some(100)
        );
    }

    #[test]
    fn seed_stays_above_ids_past_u32() {
        let rels = r#"<Relationship Id="rId100"/><Relationship Id="rId4294967295"/>"#;
        let mut ids = RelIdAllocator::from_rels_xml(Some(rels));
        assert_eq!(ids.allocate().as_deref(), Some("rId4294967296"));
        assert_eq!(ids.allocate().as_deref(), Some("rId4294967297"));
    }

    #[test]
    fn exhausted_counter_never_repeats() {
        let mut ids = RelIdAllocator::new(u64::MAX);
        assert_eq!(ids.allocate(), Some(format!("rId{}", u64::MAX)));
        assert_eq!(ids.allocate(), None);
        assert_eq!(ids.allocate(), None);

        let max = format!(r#"<Relationship Id="rId{}"/>"#, u64::MAX);
        assert_eq!(RelIdAllocator::from_rels_xml(Some(&max)).peek(), None);
        let huge = r#"<Relationship Id="rId100"/><Relationship Id="rId99999999999999999999999"/>"#;
        assert_eq!(RelIdAllocator::from_rels_xml(Some(huge)).peek(), None);
    }

    #[test]
    fn url_without_available_id_stays_text() {
        let mut ids = RelIdAllocator::from_rels_xml(Some(r#"<Relationship Id="rId99999999999999999999999"/>"#));
        let out = resolve_description("https://example.com", &mut ids);
        assert!(out.relationship.is_none());
        assert!(out.markup.as_str().contains(">https://example.com</w:t>"));
    }
}
