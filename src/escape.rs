// XML escaping for the WordprocessingML fragments built by this crate.

/// Whether `c` may appear in an XML 1.0 document.
pub fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
}

/// Escape character data for a `<w:t>` element. Quotes are left alone and
/// characters XML cannot carry are dropped.
pub fn xml_escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ if is_xml_char(ch) => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Escape a value placed inside a double-quoted attribute, dropping characters
/// XML cannot carry.
pub fn xml_escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ if is_xml_char(ch) => out.push(ch),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_escape_keeps_quotes() {
        assert_eq!(xml_escape_text("a & <b> \"c\""), "a &amp; &lt;b&gt; \"c\"");
    }

    #[test]
    fn control_characters_are_dropped() {
        assert_eq!(xml_escape_text("a\u{0}b\u{1}\tc\r\n\u{FFFE}d"), "ab\tc\r\nd");
        assert_eq!(xml_escape_attr("https://x.test/\u{7}a\u{FFFF}"), "https://x.test/a");
        assert_eq!(xml_escape_text("é ϕ \u{10000}"), "é ϕ \u{10000}");
    }

    #[test]
    fn attr_escape_handles_quotes() {
        assert_eq!(
            xml_escape_attr("https://x.test/?a=1&b=\"2\""),
            "https://x.test/?a=1&amp;b=&quot;2&quot;"
        );
    }
}
