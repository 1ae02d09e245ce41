//! Placeholder substitution seam.
//!
//! A full templating engine (loops, raw-markup tags) plugs in behind
//! [`TemplateRenderer`]. [`ScalarRenderer`] covers plain `{key}` tags only.

use serde_json::Value;

use crate::error::RenderError;
use crate::escape::xml_escape_text;
use crate::package::{Package, DOCUMENT_PART};

pub trait TemplateRenderer {
    fn render(&self, package: &mut Package, data: &Value) -> Result<(), RenderError>;
}

/// Replaces `{key}` in the main document part with the escaped text of each
/// top-level string, number or boolean in the render data. Lists, objects and
/// unknown tags are left in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarRenderer;

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        }),
        _ => None,
    }
}

impl TemplateRenderer for ScalarRenderer {
    fn render(&self, package: &mut Package, data: &Value) -> Result<(), RenderError> {
        let fields = data.as_object().ok_or(RenderError::InvalidData)?;
        let doc = package
            .part_text(DOCUMENT_PART)
            .ok_or_else(|| RenderError::missing_part(DOCUMENT_PART))?;

        // Single left-to-right pass: substituted text is never rescanned.
        let mut out = String::with_capacity(doc.len());
        let mut rest = doc;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            let substituted = tail[1..].find('}').and_then(|close| {
                let text = fields.get(&tail[1..close + 1]).and_then(scalar_text)?;
                Some((text, close + 2))
            });
            match substituted {
                Some((text, used)) => {
                    out.push_str(&xml_escape_text(&text));
                    rest = &tail[used..];
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        package.set_part(DOCUMENT_PART, out);
        Ok(())
    }
}
