//! Inline `style` attribute parsing.

/// Splits an inline style into `(property, value)` pairs. Property names are
/// lowercased; declarations without a colon or with an empty side are dropped.
pub(crate) fn parse_inline_style(input: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for declaration in split_top_level(input, b';') {
        let Some((name, value)) = declaration.split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();
        if name.is_empty() || value.is_empty() {
            continue;
        }
        out.push((name, value.to_owned()));
    }
    out
}

pub(crate) fn serialize_inline_style(declarations: &[(String, String)]) -> String {
    declarations
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

fn split_top_level(input: &str, delimiter: u8) -> Vec<&str> {
    let bytes = input.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0_usize;
    let mut quote: Option<u8> = None;
    let mut paren_depth = 0_u32;

    for (idx, byte) in bytes.iter().copied().enumerate() {
        if let Some(open) = quote {
            if byte == open {
                quote = None;
            }
            continue;
        }

        match byte {
            b'\'' | b'"' => quote = Some(byte),
            b'(' => paren_depth = paren_depth.saturating_add(1),
            b')' => paren_depth = paren_depth.saturating_sub(1),
            _ if byte == delimiter && paren_depth == 0 => {
                parts.push(&input[start..idx]);
                start = idx.saturating_add(1);
            }
            _ => {}
        }
    }

    if start < input.len() {
        parts.push(&input[start..]);
    }
    parts
}
