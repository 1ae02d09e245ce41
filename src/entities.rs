use lazy_static::lazy_static;
use regex::Regex;

use crate::escape::is_xml_char;

lazy_static! {
    // Rich-text editors export their content inside a `div.ql-editor` container.
    static ref EDITOR_WRAPPER: Regex =
        Regex::new(r#"(?is)^<div[^>]*\bclass="[^"]*ql-editor[^"]*"[^>]*>(.*)</div>\s*$"#)
            .expect("editor wrapper pattern");
}

pub fn decode_entities(s: &str) -> String {
    // Named: &nbsp; &amp; &lt; &gt; &quot;, plus decimal/hex numeric references.
    // Anything unrecognised stays as literal text.
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match decode_one(tail) {
            Some((c, used)) => {
                out.push(c);
                rest = &tail[used..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode the entity at the start of `s` (which begins with `&`), returning the
/// character and the number of bytes consumed.
fn decode_one(s: &str) -> Option<(char, usize)> {
    let semi = s[1..].find(';')? + 1;
    let ent = &s[1..semi];
    if ent.is_empty() || ent.len() > 10 {
        return None;
    }
    let c = match ent {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        _ if ent.eq_ignore_ascii_case("nbsp") => '\u{00A0}',
        _ if ent.starts_with("#x") || ent.starts_with("#X") => numeric_ref(&ent[2..], 16)?,
        _ if ent.starts_with('#') => numeric_ref(&ent[1..], 10)?,
        _ => return None,
    };
    Some((c, semi + 1))
}

// Digits only (no sign), and only code points XML can carry.
fn numeric_ref(digits: &str, radix: u32) -> Option<char> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u32::from_str_radix(digits, radix)
        .ok()
        .and_then(char::from_u32)
        .filter(|&c| is_xml_char(c))
}

/// Trim the input and strip the editor's outer container when it wraps everything.
pub fn unwrap_editor_html(html: &str) -> &str {
    let s = html.trim();
    match EDITOR_WRAPPER.captures(s).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => s,
    }
}
