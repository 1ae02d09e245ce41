// Blocks -> WordprocessingML paragraphs.
//
// Fragments are spliced into a rendered template body, so every paragraph
// carries its own `w` namespace declaration.

use crate::escape::xml_escape_text;
use crate::rich_text::{parse_blocks, Block, InlineRun, ListKind};

pub const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const EM_DASH: &str = "\u{2014}";
pub const BULLET: char = '\u{2022}';

/// Markup for a field, or the em-dash placeholder when there was nothing to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Markup(String),
    Placeholder(String),
}

impl Rendered {
    pub fn placeholder() -> Self {
        Rendered::Placeholder(placeholder_paragraph())
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Rendered::Placeholder(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Rendered::Markup(xml) | Rendered::Placeholder(xml) => xml,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            Rendered::Markup(xml) | Rendered::Placeholder(xml) => xml,
        }
    }
}

pub fn placeholder_paragraph() -> String {
    paragraph_xml(&[InlineRun::plain(EM_DASH)])
}

fn run_xml(run: &InlineRun, out: &mut String) {
    out.push_str("<w:r>");
    if run.bold {
        out.push_str("<w:rPr><w:b/></w:rPr>");
    }
    out.push_str("<w:t xml:space=\"preserve\">");
    out.push_str(&xml_escape_text(&run.text));
    out.push_str("</w:t></w:r>");
}

pub fn paragraph_xml(runs: &[InlineRun]) -> String {
    let mut out = format!("<w:p xmlns:w=\"{NS_W}\">");
    if runs.is_empty() {
        out.push_str("<w:r><w:t xml:space=\"preserve\"> </w:t></w:r>");
    }
    for run in runs {
        run_xml(run, &mut out);
    }
    out.push_str("</w:p>");
    out
}

/// Merge `prefix` into the first run so it shares that run's formatting.
fn with_prefix(runs: &[InlineRun], prefix: &str) -> Vec<InlineRun> {
    let mut out = runs.to_vec();
    match out.first_mut() {
        Some(first) if !first.text.is_empty() => first.text.insert_str(0, prefix),
        _ => out.insert(0, InlineRun::plain(prefix)),
    }
    out
}

fn block_prefix(block: &Block) -> Option<String> {
    match block {
        Block::ContentParagraph { number, .. } => number.map(|n| format!("{n}. ")),
        Block::ListItem {
            kind: ListKind::Ordered,
            index,
            ..
        } => Some(format!("{index}. ")),
        Block::ListItem {
            kind: ListKind::Unordered,
            ..
        } => Some(format!("{BULLET} ")),
    }
}

pub fn block_xml(block: &Block) -> String {
    match block_prefix(block) {
        Some(prefix) => paragraph_xml(&with_prefix(block.runs(), &prefix)),
        None => paragraph_xml(block.runs()),
    }
}

pub fn blocks_xml(blocks: &[Block]) -> String {
    blocks.iter().map(block_xml).collect()
}

/// Convert editor HTML into a run of `<w:p>` elements for a raw-markup template tag.
pub fn html_to_word_xml(html: &str) -> Rendered {
    if html.trim().is_empty() {
        return Rendered::placeholder();
    }
    let blocks = parse_blocks(html);
    if blocks.is_empty() {
        return Rendered::placeholder();
    }
    Rendered::Markup(blocks_xml(&blocks))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(inner: &str) -> String {
        format!("<w:p xmlns:w=\"{NS_W}\">{inner}</w:p>")
    }

    fn r(text: &str) -> String {
        format!("<w:r><w:t xml:space=\"preserve\">{text}</w:t></w:r>")
    }

    fn rb(text: &str) -> String {
        format!("<w:r><w:rPr><w:b/></w:rPr><w:t xml:space=\"preserve\">{text}</w:t></w:r>")
    }

    #[test]
    fn blank_input_is_placeholder() {
        for input in ["", "   ", "<p></p>", "<p><br></p>"] {
            let out = html_to_word_xml(input);
            assert!(out.is_placeholder(), "{input:?}");
            assert_eq!(out.as_str(), p(&r(EM_DASH)));
        }
    }

    #[test]
    fn single_paragraph_keeps_bold_runs() {
        let out = html_to_word_xml("<p>Bring <strong>ID</strong> card</p>");
        assert_eq!(out.as_str(), p(&format!("{}{}{}", r("Bring "), rb("ID"), r(" card"))));
    }

    #[test]
    fn multi_paragraph_content_is_numbered() {
        let out = html_to_word_xml("<p>Alpha</p><p>Beta</p>");
        assert_eq!(out.as_str(), format!("{}{}", p(&r("1. Alpha")), p(&r("2. Beta"))));
    }

    #[test]
    fn header_prefix_inherits_bold() {
        let out = html_to_word_xml("<p>Summary:</p><p>Body text</p>");
        assert_eq!(
            out.as_str(),
            format!("{}{}", p(&rb("1. Summary:")), p(&r("2. Body text")))
        );
    }

    #[test]
    fn long_colon_line_is_not_bolded() {
        let line = format!("{}:", "x".repeat(81));
        let out = html_to_word_xml(&format!("<p>{line}</p><p>next</p>"));
        assert!(out.as_str().starts_with(&p(&r(&format!("1. {line}")))));
    }

    #[test]
    fn ordered_numbering_restarts_per_list() {
        let out = html_to_word_xml("<ol><li>a</li><li>b</li></ol><p>gap</p><ol><li>c</li></ol>");
        let expected = [
            p(&r("1. a")),
            p(&r("2. b")),
            p(&r("gap")),
            p(&r("1. c")),
        ]
        .concat();
        assert_eq!(out.as_str(), expected);
    }

    #[test]
    fn bullets_and_empty_items() {
        let out = html_to_word_xml("<ul><li><b>Key</b> point</li><li></li></ul>");
        let expected = [
            p(&format!("{}{}", rb("\u{2022} Key"), r(" point"))),
            p(&r("\u{2022} ")),
        ]
        .concat();
        assert_eq!(out.as_str(), expected);
    }

    #[test]
    fn text_is_escaped_but_quotes_are_kept() {
        let out = html_to_word_xml("<p>Fish &amp; \"chips\" &lt;hot&gt;</p>");
        assert_eq!(out.as_str(), p(&r("Fish &amp; \"chips\" &lt;hot&gt;")));
    }

    #[test]
    fn control_references_never_reach_the_document() {
        let out = html_to_word_xml("<p>a&#0;b&#x1;c</p>");
        assert_eq!(out.as_str(), p(&r("a&amp;#0;b&amp;#x1;c")));
        let out = html_to_word_xml("<p>bell\u{7} here</p>");
        assert_eq!(out.as_str(), p(&r("bell here")));
    }

    #[test]
    fn concatenated_runs_reconstruct_text() {
        let html = "<p>a <b>b</b> c <strong>d e</strong>f</p>";
        let blocks = parse_blocks(html);
        let text: String = blocks[0].runs().iter().map(|r| r.text.as_str()).collect();
        assert_eq!(text, "a b c d ef");
        let bolds: Vec<bool> = blocks[0].runs().iter().map(|r| r.bold).collect();
        assert_eq!(bolds, vec![false, true, false, true, false]);
    }
}
