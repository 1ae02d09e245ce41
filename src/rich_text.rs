//! Rich-text parsing for editor HTML.
//!
//! The accepted vocabulary is small: `p`, `div`, `br`, `strong`/`b`, `ol`/`ul`
//! and `li`. Every other tag is dropped while its text is kept. The scanner
//! works directly on the source string and never fails; input it cannot make
//! sense of simply yields fewer (or no) blocks.

use std::ops::Range;

use crate::entities::{decode_entities, unwrap_editor_html};

const HEADER_MAX_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineRun {
    pub bold: bool,
    pub text: String,
}

impl InlineRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            bold: false,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Ordered,
    Unordered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// A paragraph from a content region. `number` is set when the region
    /// holds more than one paragraph.
    ContentParagraph {
        runs: Vec<InlineRun>,
        number: Option<usize>,
    },
    /// One `<li>`; `index` is 1-based within its list.
    ListItem {
        kind: ListKind,
        index: usize,
        runs: Vec<InlineRun>,
    },
}

impl Block {
    pub fn runs(&self) -> &[InlineRun] {
        match self {
            Block::ContentParagraph { runs, .. } | Block::ListItem { runs, .. } => runs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentKind<'a> {
    Content(&'a str),
    List { kind: ListKind, items: Vec<&'a str> },
}

/// A top-level region of the input. `span` is the byte range it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment<'a> {
    pub span: Range<usize>,
    pub kind: FragmentKind<'a>,
}

#[derive(Debug, Clone, Copy)]
struct Tag<'a> {
    start: usize,
    end: usize,
    name: &'a str,
    closing: bool,
}

impl Tag<'_> {
    fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

fn find_tag_end(s: &str, lt: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut in_s = false;
    let mut in_d = false;
    for (i, &c) in bytes.iter().enumerate().skip(lt) {
        match c {
            b'\'' if !in_d => in_s = !in_s,
            b'"' if !in_s => in_d = !in_d,
            b'>' if !in_s && !in_d => return Some(i),
            _ => {}
        }
    }
    None
}

/// Find the next markup tag at or after `from`. A `<` only opens a tag when it
/// is followed by a letter, `/` or `!` and is eventually closed by `>`.
fn next_tag(s: &str, from: usize) -> Option<Tag<'_>> {
    let bytes = s.as_bytes();
    let mut i = from;
    while let Some(rel) = s.get(i..)?.find('<') {
        let lt = i + rel;
        let opens = matches!(bytes.get(lt + 1), Some(c) if c.is_ascii_alphabetic() || *c == b'/' || *c == b'!');
        if !opens {
            i = lt + 1;
            continue;
        }
        let gt = find_tag_end(s, lt)?;
        let raw = s[lt + 1..gt].trim();
        let closing = raw.starts_with('/');
        let body = raw.trim_start_matches('/').trim_start();
        let name_end = body
            .find(|c: char| c.is_whitespace() || c == '/')
            .unwrap_or(body.len());
        return Some(Tag {
            start: lt,
            end: gt + 1,
            name: &body[..name_end],
            closing,
        });
    }
    None
}

fn tags(s: &str) -> impl Iterator<Item = Tag<'_>> + '_ {
    let mut pos = 0;
    std::iter::from_fn(move || {
        let tag = next_tag(s, pos)?;
        pos = tag.end;
        Some(tag)
    })
}

fn find_closing<'a>(s: &'a str, from: usize, name: &str) -> Option<Tag<'a>> {
    let mut pos = from;
    while let Some(tag) = next_tag(s, pos) {
        if tag.closing && tag.is(name) {
            return Some(tag);
        }
        pos = tag.end;
    }
    None
}

/// Remove every tag, keeping the text between them verbatim.
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pos = 0;
    for tag in tags(s) {
        out.push_str(&s[pos..tag.start]);
        pos = tag.end;
    }
    out.push_str(&s[pos..]);
    out
}

/// Text a reader would see: tags removed, entities decoded.
fn visible_text(s: &str) -> String {
    decode_entities(&strip_tags(s))
}

fn list_items<'a>(inner: &'a str) -> Vec<&'a str> {
    let mut items = Vec::new();
    let mut pos = 0;
    while let Some(tag) = next_tag(inner, pos) {
        if tag.closing || !tag.is("li") {
            pos = tag.end;
            continue;
        }
        let Some(close) = find_closing(inner, tag.end, "li") else {
            break;
        };
        items.push(inner[tag.end..close.start].trim());
        pos = close.end;
    }
    items
}

/// Split the input into content regions and `<ol>`/`<ul>` regions, in order.
/// A list opener without a matching closer is left in the surrounding content.
pub fn split_fragments(html: &str) -> Vec<Fragment<'_>> {
    let mut fragments = Vec::new();
    let mut last = 0;
    let mut pos = 0;
    while let Some(tag) = next_tag(html, pos) {
        pos = tag.end;
        if tag.closing {
            continue;
        }
        let kind = if tag.is("ol") {
            ListKind::Ordered
        } else if tag.is("ul") {
            ListKind::Unordered
        } else {
            continue;
        };
        let Some(close) = find_closing(html, tag.end, tag.name) else {
            continue;
        };
        if tag.start > last {
            fragments.push(Fragment {
                span: last..tag.start,
                kind: FragmentKind::Content(&html[last..tag.start]),
            });
        }
        fragments.push(Fragment {
            span: tag.start..close.end,
            kind: FragmentKind::List {
                kind,
                items: list_items(&html[tag.end..close.start]),
            },
        });
        last = close.end;
        pos = close.end;
    }
    if last < html.len() {
        fragments.push(Fragment {
            span: last..html.len(),
            kind: FragmentKind::Content(&html[last..]),
        });
    }
    fragments
}

fn is_block_separator(tag: &Tag<'_>) -> bool {
    tag.is("br") || (tag.closing && (tag.is("p") || tag.is("div")))
}

/// Cut a content region at `<br>`, `</p>`, `</div>` and raw line breaks,
/// returning the trimmed pieces that still carry visible text.
pub fn split_paragraphs(html: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut pos = 0;
    for tag in tags(html).filter(is_block_separator) {
        pieces.push(&html[pos..tag.start]);
        pos = tag.end;
    }
    pieces.push(&html[pos..]);

    pieces
        .into_iter()
        .flat_map(|piece| piece.split(['\n', '\r']))
        .map(str::trim)
        .filter(|piece| !piece.is_empty() && !visible_text(piece).trim().is_empty())
        .collect()
}

fn flush_run(runs: &mut Vec<InlineRun>, buf: &mut String, bold: bool) {
    let text = decode_entities(buf);
    buf.clear();
    if !text.trim().is_empty() {
        runs.push(InlineRun { bold, text });
    }
}

/// Parse inline content into runs, toggling bold on `<strong>`/`<b>`.
pub fn parse_inlines(html: &str) -> Vec<InlineRun> {
    let mut runs = Vec::new();
    let mut buf = String::new();
    let mut bold = false;
    let mut pos = 0;
    for tag in tags(html) {
        buf.push_str(&html[pos..tag.start]);
        pos = tag.end;
        if tag.is("strong") || tag.is("b") {
            flush_run(&mut runs, &mut buf, bold);
            bold = !tag.closing;
        }
    }
    buf.push_str(&html[pos..]);
    flush_run(&mut runs, &mut buf, bold);

    if runs.is_empty() {
        let text = visible_text(html);
        let text = text.trim();
        if !text.is_empty() {
            runs.push(InlineRun::plain(text));
        }
    }
    runs
}

/// A short line ending in a colon reads as a section header.
pub fn is_section_header(html: &str) -> bool {
    let text = visible_text(html);
    let text = text.trim();
    let len = text.chars().count();
    (1..=HEADER_MAX_CHARS).contains(&len) && text.ends_with(':')
}

fn content_blocks(html: &str, out: &mut Vec<Block>) {
    let paragraphs = split_paragraphs(html);
    let numbered = paragraphs.len() > 1;
    let mut number = 0;
    for p in paragraphs {
        let mut runs = parse_inlines(p);
        if runs.is_empty() {
            continue;
        }
        if is_section_header(p) {
            for run in &mut runs {
                run.bold = true;
            }
        }
        number += 1;
        out.push(Block::ContentParagraph {
            runs,
            number: numbered.then_some(number),
        });
    }
}

/// Parse editor HTML into blocks, in document order.
pub fn parse_blocks(html: &str) -> Vec<Block> {
    let s = unwrap_editor_html(html);
    if s.is_empty() {
        return Vec::new();
    }

    let mut blocks = Vec::new();
    for fragment in split_fragments(s) {
        match fragment.kind {
            FragmentKind::Content(content) => content_blocks(content, &mut blocks),
            FragmentKind::List { kind, items } => {
                for (i, item) in items.into_iter().enumerate() {
                    blocks.push(Block::ListItem {
                        kind,
                        index: i + 1,
                        runs: parse_inlines(item),
                    });
                }
            }
        }
    }

    if blocks.is_empty() {
        let runs = parse_inlines(s);
        if !runs.is_empty() {
            blocks.push(Block::ContentParagraph { runs, number: None });
        }
    }
    blocks
}
