//! Byte decoding for HTML files whose encoding is not known up front.

use encoding_rs::Encoding;
use encoding_rs::UTF_8;

/// Decoded page text plus the name of the encoding that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHtml {
    pub text: String,
    pub encoding: &'static str,
}

/// Decodes `body` using, in order: a byte-order mark, a `<meta charset>` in
/// the first 8 KiB, the `charset` parameter of `content_type`, then UTF-8.
/// Malformed sequences become U+FFFD.
pub fn decode_html_bytes(body: &[u8], content_type: Option<&str>) -> DecodedHtml {
    let encoding = detect_charset(body, content_type)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);

    // `decode` sniffs a BOM first and reports the encoding it actually used.
    let (text, actual, _) = encoding.decode(body);
    DecodedHtml {
        text: text.into_owned(),
        encoding: actual.name(),
    }
}

fn detect_charset(body: &[u8], content_type: Option<&str>) -> Option<String> {
    let is_html = content_type.is_none_or(|value| {
        let lower = value.to_ascii_lowercase();
        lower.contains("text/html") || lower.contains("application/xhtml+xml")
    });

    if is_html {
        if let Some(meta_charset) = parse_charset_from_html_prefix(body) {
            return Some(meta_charset);
        }
    }

    content_type.and_then(parse_charset_from_content_type)
}

fn parse_charset_from_content_type(content_type: &str) -> Option<String> {
    for part in content_type.split(';').skip(1) {
        let Some((name, value)) = part.split_once('=') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case("charset") {
            continue;
        }

        let label = value.trim().trim_matches('"').trim_matches('\'');
        if !label.is_empty() {
            return Some(label.to_owned());
        }
    }

    None
}

fn parse_charset_from_html_prefix(body: &[u8]) -> Option<String> {
    let prefix_len = body.len().min(8192);
    let prefix = String::from_utf8_lossy(&body[..prefix_len]);
    let lower = prefix.to_ascii_lowercase();
    let mut search_start = 0_usize;

    while let Some(relative) = lower[search_start..].find("charset=") {
        let charset_start = search_start + relative + "charset=".len();
        if let Some(label) = parse_charset_label(&prefix[charset_start..]) {
            return Some(label);
        }
        search_start = charset_start;
    }

    None
}

fn parse_charset_label(input: &str) -> Option<String> {
    let trimmed = input.trim_start();
    let first = trimmed.chars().next()?;

    if first == '"' || first == '\'' {
        let rest = &trimmed[first.len_utf8()..];
        let end = rest.find(first)?;
        let label = rest[..end].trim();
        return (!label.is_empty()).then(|| label.to_owned());
    }

    let end = trimmed
        .find(|ch: char| ch.is_whitespace() || matches!(ch, '"' | '\'' | ';' | '>' | '/'))
        .unwrap_or(trimmed.len());
    let label = trimmed[..end].trim();
    (!label.is_empty()).then(|| label.to_owned())
}

#[cfg(test)]
mod tests {
    use super::decode_html_bytes;
    use super::parse_charset_label;

    #[test]
    fn defaults_to_utf8() {
        let decoded = decode_html_bytes("<p>Café</p>".as_bytes(), None);
        assert_eq!(decoded.text, "<p>Café</p>");
        assert_eq!(decoded.encoding, "UTF-8");
    }

    #[test]
    fn honors_meta_charset() {
        let body = b"<meta charset=\"windows-1252\"><p>Caf\xe9</p>";
        let decoded = decode_html_bytes(body, None);
        assert_eq!(decoded.encoding, "windows-1252");
        assert!(decoded.text.ends_with("<p>Caf\u{e9}</p>"));
    }

    #[test]
    fn falls_back_to_content_type_parameter() {
        let decoded = decode_html_bytes(b"<p>Caf\xe9</p>", Some("text/html; charset=ISO-8859-1"));
        assert_eq!(decoded.text, "<p>Caf\u{e9}</p>");
    }

    #[test]
    fn byte_order_mark_wins() {
        let body = b"\xef\xbb\xbf<meta charset=\"windows-1252\">ok";
        let decoded = decode_html_bytes(body, None);
        assert_eq!(decoded.encoding, "UTF-8");
        assert!(decoded.text.ends_with("ok"));
        assert!(!decoded.text.starts_with('\u{feff}'));
    }

    #[test]
    fn label_parsing_handles_quotes_and_terminators() {
        assert_eq!(parse_charset_label(" 'utf-8' "), Some("utf-8".to_owned()));
        assert_eq!(parse_charset_label("utf-8\">"), Some("utf-8".to_owned()));
        assert_eq!(parse_charset_label("\"\""), None);
    }
}
