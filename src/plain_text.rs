use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::markup::EM_DASH;

fn html5_parse(input: &str) -> RcDom {
    parse_document(RcDom::default(), Default::default()).one(input)
}

fn tag_lower(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.to_string().to_ascii_lowercase()),
        _ => None,
    }
}

fn ends_line(tag: &str) -> bool {
    matches!(tag, "p" | "div" | "li" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

fn body_children(dom: &RcDom) -> Vec<Handle> {
    fn find_body(node: &Handle) -> Option<Handle> {
        if tag_lower(node).as_deref() == Some("body") {
            return Some(node.clone());
        }
        node.children.borrow().iter().find_map(find_body)
    }
    match find_body(&dom.document) {
        Some(body) => body.children.borrow().clone(),
        None => dom.document.children.borrow().clone(),
    }
}

fn walk(node: &Handle, out: &mut String) {
    match &node.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        NodeData::Element { .. } => {
            let tag = tag_lower(node).unwrap_or_default();
            if matches!(tag.as_str(), "script" | "style" | "template") {
                return;
            }
            if tag == "br" {
                out.push('\n');
                return;
            }
            for child in node.children.borrow().iter() {
                walk(child, out);
            }
            if ends_line(&tag) {
                out.push('\n');
            }
        }
        _ => {}
    }
}

fn collapse_blank_lines(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut newlines = 0;
    for ch in s.chars() {
        if ch == '\n' {
            newlines += 1;
            if newlines > 2 {
                continue;
            }
        } else {
            newlines = 0;
        }
        out.push(ch);
    }
    out
}

/// Flatten editor HTML to text for template fields that cannot take markup.
/// Blank input yields an em dash.
pub fn html_to_plain_text(html: &str) -> String {
    if html.trim().is_empty() {
        return EM_DASH.to_string();
    }
    let wrapped = format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"></head><body>{}</body></html>",
        html
    );
    let dom = html5_parse(&wrapped);
    let mut text = String::new();
    for child in body_children(&dom) {
        walk(&child, &mut text);
    }
    let text = text.replace('\u{00A0}', " ");
    let text = collapse_blank_lines(text.trim());
    if text.is_empty() {
        EM_DASH.to_string()
    } else {
        text
    }
}
