//! Byte-level HTML tokenizer.

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedTag {
    pub(crate) name: String,
    pub(crate) attrs: Vec<(String, String)>,
    pub(crate) self_closing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Doctype(String),
    StartTag(ParsedTag),
    EndTag(String),
    Text(String),
    Comment(String),
}

/// Elements whose content is taken verbatim up to the matching end tag.
/// The flag says whether character references are decoded inside.
const RAW_TEXT_ELEMENTS: &[(&str, bool)] = &[
    ("script", false),
    ("style", false),
    ("textarea", true),
    ("title", true),
];

pub(crate) fn tokenize(input: &str) -> Vec<Token> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pending_text = String::new();
    let mut idx = 0_usize;

    while idx < bytes.len() {
        if bytes[idx] != b'<' {
            let next = find_byte(bytes, idx, b'<').unwrap_or(bytes.len());
            pending_text.push_str(&decode_entities(&input[idx..next]));
            idx = next;
            continue;
        }

        if starts_with(bytes, idx, b"<!--") {
            let body_start = idx.saturating_add(4);
            let end = find_subslice(bytes, body_start, b"-->");
            flush_text(&mut tokens, &mut pending_text);
            let body_end = end.unwrap_or(bytes.len());
            tokens.push(Token::Comment(input[body_start.min(body_end)..body_end].to_owned()));
            idx = end.map(|end| end.saturating_add(3)).unwrap_or(bytes.len());
            continue;
        }

        if starts_with(bytes, idx, b"<!") {
            let next = skip_to_gt(bytes, idx.saturating_add(2));
            let inner_end = if next > 0 && bytes.get(next - 1) == Some(&b'>') {
                next - 1
            } else {
                next
            };
            let inner = &input[idx.saturating_add(2).min(inner_end)..inner_end];
            if let Some(rest) = strip_prefix_ignore_ascii_case(inner, "doctype") {
                flush_text(&mut tokens, &mut pending_text);
                tokens.push(Token::Doctype(rest.trim().to_owned()));
            }
            idx = next;
            continue;
        }

        if starts_with(bytes, idx, b"<?") {
            idx = skip_processing_instruction(bytes, idx);
            continue;
        }

        if bytes.get(idx.saturating_add(1)) == Some(&b'/') {
            if let Some((name, next_idx)) = parse_end_tag(bytes, idx) {
                flush_text(&mut tokens, &mut pending_text);
                tokens.push(Token::EndTag(name));
                idx = next_idx;
                continue;
            }
        }

        let Some((tag, next_idx)) = parse_tag(input, idx) else {
            // A stray `<` is literal text.
            pending_text.push('<');
            idx = idx.saturating_add(1);
            continue;
        };

        flush_text(&mut tokens, &mut pending_text);
        let raw = RAW_TEXT_ELEMENTS
            .iter()
            .find(|(name, _)| *name == tag.name)
            .filter(|_| !tag.self_closing)
            .map(|(_, decode)| *decode);
        let name = tag.name.clone();
        tokens.push(Token::StartTag(tag));
        idx = next_idx;

        if let Some(decode) = raw {
            let (raw_text, after) = read_raw_text_until_end_tag(input, idx, &name);
            if !raw_text.is_empty() {
                let text = if decode {
                    decode_entities(raw_text)
                } else {
                    raw_text.to_owned()
                };
                tokens.push(Token::Text(text));
            }
            tokens.push(Token::EndTag(name));
            idx = after;
        }
    }

    flush_text(&mut tokens, &mut pending_text);
    tokens
}

fn flush_text(tokens: &mut Vec<Token>, pending: &mut String) {
    if !pending.is_empty() {
        tokens.push(Token::Text(core::mem::take(pending)));
    }
}

fn parse_tag(input: &str, start: usize) -> Option<(ParsedTag, usize)> {
    let bytes = input.as_bytes();
    if bytes.get(start).copied() != Some(b'<') {
        return None;
    }

    let mut idx = start.saturating_add(1);
    let name_start = idx;
    while idx < bytes.len() && is_tag_name_char(bytes[idx]) {
        idx = idx.saturating_add(1);
    }
    if idx == name_start || !bytes[name_start].is_ascii_alphabetic() {
        return None;
    }

    let name = input[name_start..idx].to_ascii_lowercase();
    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut self_closing = false;

    loop {
        idx = skip_spaces(bytes, idx);
        match bytes.get(idx).copied() {
            None => return None,
            Some(b'>') => {
                return Some((
                    ParsedTag {
                        name,
                        attrs,
                        self_closing,
                    },
                    idx.saturating_add(1),
                ));
            }
            Some(b'/') => {
                idx = idx.saturating_add(1);
                self_closing = bytes.get(idx).copied() == Some(b'>');
                continue;
            }
            Some(_) => self_closing = false,
        }

        let attr_start = idx;
        while idx < bytes.len()
            && !bytes[idx].is_ascii_whitespace()
            && !matches!(bytes[idx], b'=' | b'>' | b'/')
        {
            idx = idx.saturating_add(1);
        }
        if idx == attr_start {
            // Stray `=`.
            idx = idx.saturating_add(1);
            continue;
        }
        let attr_name = input[attr_start..idx].to_ascii_lowercase();

        idx = skip_spaces(bytes, idx);
        let mut value = String::new();
        if bytes.get(idx).copied() == Some(b'=') {
            idx = skip_spaces(bytes, idx.saturating_add(1));
            match bytes.get(idx).copied() {
                Some(quote @ (b'"' | b'\'')) => {
                    let value_start = idx.saturating_add(1);
                    let value_end = find_byte(bytes, value_start, quote)?;
                    value = decode_entities(&input[value_start..value_end]);
                    idx = value_end.saturating_add(1);
                }
                Some(_) => {
                    let value_start = idx;
                    while idx < bytes.len() && !bytes[idx].is_ascii_whitespace() && bytes[idx] != b'>'
                    {
                        idx = idx.saturating_add(1);
                    }
                    value = decode_entities(&input[value_start..idx]);
                }
                None => return None,
            }
        }

        // First occurrence wins, as in browsers.
        if !attrs.iter().any(|(existing, _)| *existing == attr_name) {
            attrs.push((attr_name, value));
        }
    }
}

fn parse_end_tag(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    let mut idx = start.saturating_add(2);
    let name_start = idx;
    while idx < bytes.len() && is_tag_name_char(bytes[idx]) {
        idx = idx.saturating_add(1);
    }
    if idx == name_start {
        return None;
    }
    let name = String::from_utf8_lossy(&bytes[name_start..idx]).to_ascii_lowercase();
    Some((name, skip_to_gt(bytes, idx)))
}

fn read_raw_text_until_end_tag<'a>(
    input: &'a str,
    start: usize,
    tag_name: &str,
) -> (&'a str, usize) {
    let bytes = input.as_bytes();
    let tag_bytes = tag_name.as_bytes();
    let mut idx = start;

    while idx < bytes.len() {
        if bytes[idx] == b'<'
            && bytes.get(idx.saturating_add(1)).copied() == Some(b'/')
            && starts_with_ignore_ascii_case(bytes, idx.saturating_add(2), tag_bytes)
            && tag_name_boundary(bytes, idx.saturating_add(2 + tag_bytes.len()))
        {
            return (&input[start..idx], skip_to_gt(bytes, idx));
        }

        idx = idx.saturating_add(1);
    }

    (&input[start..], bytes.len())
}

/// Decodes the character references this site's markup uses: the five XML
/// entities, `&nbsp;`, and numeric references. Unknown references stay literal.
pub(crate) fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut cursor = 0_usize;

    while let Some(rel_amp) = input[cursor..].find('&') {
        let amp = cursor + rel_amp;
        out.push_str(&input[cursor..amp]);

        let rest = &input[(amp + 1)..];
        let Some(rel_semi) = rest.find(';') else {
            out.push('&');
            cursor = amp + 1;
            continue;
        };

        let semi = amp + 1 + rel_semi;
        let entity = &input[(amp + 1)..semi];
        if let Some(decoded) = decode_entity(entity) {
            out.push(decoded);
            cursor = semi + 1;
        } else {
            out.push('&');
            cursor = amp + 1;
        }
    }

    out.push_str(&input[cursor..]);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "nbsp" => Some('\u{a0}'),
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                char::from_u32(u32::from_str_radix(hex, 16).ok()?)
            } else if let Some(dec) = entity.strip_prefix('#') {
                char::from_u32(dec.parse::<u32>().ok()?)
            } else {
                None
            }
        }
    }
}

fn strip_prefix_ignore_ascii_case<'a>(input: &'a str, prefix: &str) -> Option<&'a str> {
    let head = input.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        input.get(prefix.len()..)
    } else {
        None
    }
}

fn skip_processing_instruction(bytes: &[u8], start: usize) -> usize {
    if let Some(end) = find_subslice(bytes, start.saturating_add(2), b"?>") {
        return end.saturating_add(2);
    }

    skip_to_gt(bytes, start.saturating_add(2))
}

fn skip_to_gt(bytes: &[u8], mut idx: usize) -> usize {
    while idx < bytes.len() {
        if bytes[idx] == b'>' {
            return idx.saturating_add(1);
        }
        idx = idx.saturating_add(1);
    }

    bytes.len()
}

fn tag_name_boundary(bytes: &[u8], idx: usize) -> bool {
    match bytes.get(idx).copied() {
        None => true,
        Some(byte) => byte.is_ascii_whitespace() || byte == b'>' || byte == b'/',
    }
}

fn skip_spaces(bytes: &[u8], mut idx: usize) -> usize {
    while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
        idx = idx.saturating_add(1);
    }
    idx
}

fn is_tag_name_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b':')
}

fn starts_with(bytes: &[u8], idx: usize, pattern: &[u8]) -> bool {
    let end = idx.saturating_add(pattern.len());
    end <= bytes.len() && bytes[idx..end] == *pattern
}

fn starts_with_ignore_ascii_case(bytes: &[u8], idx: usize, pattern: &[u8]) -> bool {
    let end = idx.saturating_add(pattern.len());
    if end > bytes.len() {
        return false;
    }

    bytes[idx..end]
        .iter()
        .zip(pattern.iter())
        .all(|(left, right)| left.eq_ignore_ascii_case(right))
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }

    bytes[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

fn find_byte(bytes: &[u8], from: usize, byte: u8) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|candidate| *candidate == byte)
        .map(|offset| from + offset)
}

#[cfg(test)]
mod tests {
    use super::Token;
    use super::decode_entities;
    use super::tokenize;

    fn start_tag(token: &Token) -> (&str, &[(String, String)], bool) {
        match token {
            Token::StartTag(tag) => (tag.name.as_str(), tag.attrs.as_slice(), tag.self_closing),
            other => panic!("expected start tag, got {other:?}"),
        }
    }

    #[test]
    fn reads_quoted_unquoted_and_bare_attributes() {
        let tokens = tokenize(r#"<INPUT Type=checkbox value='a b' checked data-x="1 &amp; 2">"#);
        assert_eq!(tokens.len(), 1);
        let (name, attrs, self_closing) = start_tag(&tokens[0]);
        assert_eq!(name, "input");
        assert!(!self_closing);
        assert_eq!(
            attrs,
            &[
                ("type".to_owned(), "checkbox".to_owned()),
                ("value".to_owned(), "a b".to_owned()),
                ("checked".to_owned(), String::new()),
                ("data-x".to_owned(), "1 & 2".to_owned()),
            ]
        );
    }

    #[test]
    fn first_duplicate_attribute_wins() {
        let tokens = tokenize(r#"<a href="/one" href="/two">x</a>"#);
        let (_, attrs, _) = start_tag(&tokens[0]);
        assert_eq!(attrs, &[("href".to_owned(), "/one".to_owned())]);
    }

    #[test]
    fn self_closing_and_unquoted_slashes() {
        let tokens = tokenize("<br/><a href=/News/>n</a>");
        let (_, _, self_closing) = start_tag(&tokens[0]);
        assert!(self_closing);
        let (_, attrs, _) = start_tag(&tokens[1]);
        assert_eq!(attrs, &[("href".to_owned(), "/News/".to_owned())]);
    }

    #[test]
    fn script_body_stays_raw() {
        let tokens = tokenize("<script>if (a < b && c) {}</script>after");
        assert_eq!(
            tokens[1..],
            [
                Token::Text("if (a < b && c) {}".to_owned()),
                Token::EndTag("script".to_owned()),
                Token::Text("after".to_owned()),
            ]
        );
    }

    #[test]
    fn doctype_comment_and_stray_angle_bracket() {
        let tokens = tokenize("<!DOCTYPE html><!-- note -->1 < 2");
        assert_eq!(
            tokens,
            vec![
                Token::Doctype("html".to_owned()),
                Token::Comment(" note ".to_owned()),
                Token::Text("1 < 2".to_owned()),
            ]
        );
    }

    #[test]
    fn decodes_known_entities_and_keeps_unknown_ones() {
        assert_eq!(decode_entities("&#8249; &#x203A; &lt;b&gt;"), "\u{2039} \u{203a} <b>");
        assert_eq!(decode_entities("a&nbsp;b"), "a\u{a0}b");
        assert_eq!(decode_entities("&bogus; & fish"), "&bogus; & fish");
    }
}
