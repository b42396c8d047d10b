//! Selector text to selector structures.

use sf_core::FixError;
use sf_core::FixResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Selector {
    /// Rightmost compound first; each segment names the combinator linking it
    /// to the segment after it (its left neighbour in source order).
    pub(crate) segments: Vec<SelectorSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorSegment {
    pub(crate) compound: CompoundSelector,
    pub(crate) combinator_to_next: Option<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CompoundSelector {
    pub(crate) tag: Option<String>,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attributes: Vec<AttributeSelector>,
    pub(crate) pseudo_classes: Vec<PseudoClass>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AttributeSelector {
    pub(crate) name: String,
    pub(crate) operator: AttributeOperator,
    pub(crate) value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttributeOperator {
    Exists,
    Equals,
    Includes,
    Contains,
    Prefix,
    Suffix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PseudoClass {
    Checked,
    FirstChild,
    NthChild(Nth),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Nth {
    Index(usize),
    Odd,
    Even,
}

pub(crate) fn parse_selector_list(input: &str) -> FixResult<Vec<Selector>> {
    let mut selectors = Vec::new();
    for part in split_top_level(input, b',') {
        if part.trim().is_empty() {
            return Err(invalid(input, "empty selector in list"));
        }
        selectors.push(parse_selector(part)?);
    }

    if selectors.is_empty() {
        return Err(invalid(input, "selector is empty"));
    }
    Ok(selectors)
}

fn parse_selector(input: &str) -> FixResult<Selector> {
    let trimmed = input.trim();
    let bytes = trimmed.as_bytes();
    let mut idx = 0_usize;
    let mut quote: Option<u8> = None;
    let mut bracket_depth = 0_u32;
    let mut paren_depth = 0_u32;
    let mut pending_descendant = false;
    let mut compound = String::new();
    let mut compounds = Vec::new();
    let mut combinators = Vec::new();

    while idx < bytes.len() {
        let byte = bytes[idx];
        let ch = trimmed[idx..].chars().next().unwrap_or('\u{FFFD}');
        let width = ch.len_utf8();

        if let Some(open) = quote {
            compound.push(ch);
            if byte == open {
                quote = None;
            }
            idx = idx.saturating_add(width);
            continue;
        }

        if bracket_depth > 0 || paren_depth > 0 {
            compound.push(ch);
            match byte {
                b'\'' | b'"' => quote = Some(byte),
                b'[' => bracket_depth = bracket_depth.saturating_add(1),
                b']' => bracket_depth = bracket_depth.saturating_sub(1),
                b'(' => paren_depth = paren_depth.saturating_add(1),
                b')' => paren_depth = paren_depth.saturating_sub(1),
                _ => {}
            }
            idx = idx.saturating_add(width);
            continue;
        }

        match byte {
            b'>' => {
                if !compound.trim().is_empty() {
                    compounds.push(compound.trim().to_owned());
                    compound.clear();
                } else if compounds.is_empty()
                    || (!pending_descendant && combinators.len() == compounds.len())
                {
                    return Err(invalid(trimmed, "child combinator without a left-hand compound"));
                }
                pending_descendant = false;
                combinators.push(Combinator::Child);
            }
            b'+' | b'~' => {
                return Err(FixError::new(
                    "css.selector_unsupported",
                    format!("sibling combinators are not supported in `{trimmed}`"),
                ));
            }
            _ if byte.is_ascii_whitespace() => {
                if !compound.trim().is_empty() {
                    compounds.push(compound.trim().to_owned());
                    compound.clear();
                    pending_descendant = true;
                }
            }
            _ => {
                if pending_descendant && combinators.len() < compounds.len() {
                    combinators.push(Combinator::Descendant);
                }
                pending_descendant = false;
                match byte {
                    b'\'' | b'"' => quote = Some(byte),
                    b'[' => bracket_depth = bracket_depth.saturating_add(1),
                    b'(' => paren_depth = paren_depth.saturating_add(1),
                    _ => {}
                }
                compound.push(ch);
            }
        }

        idx = idx.saturating_add(width);
    }

    if quote.is_some() || bracket_depth > 0 || paren_depth > 0 {
        return Err(invalid(trimmed, "unterminated quote, bracket, or parenthesis"));
    }

    let tail = compound.trim();
    if !tail.is_empty() {
        compounds.push(tail.to_owned());
    }

    if compounds.is_empty() || combinators.len() + 1 != compounds.len() {
        return Err(invalid(trimmed, "dangling combinator"));
    }

    let mut left_to_right = Vec::with_capacity(compounds.len());
    for raw in &compounds {
        left_to_right.push(parse_compound(raw)?);
    }

    let mut segments = Vec::with_capacity(left_to_right.len());
    for index in (0..left_to_right.len()).rev() {
        let combinator_to_next = if index == 0 {
            None
        } else {
            combinators.get(index - 1).copied()
        };
        segments.push(SelectorSegment {
            compound: left_to_right[index].clone(),
            combinator_to_next,
        });
    }

    Ok(Selector { segments })
}

fn parse_compound(input: &str) -> FixResult<CompoundSelector> {
    let mut selector = CompoundSelector::default();
    let bytes = input.as_bytes();
    let mut idx = 0_usize;
    let mut universal = false;

    if bytes.first() == Some(&b'*') {
        universal = true;
        idx = 1;
    } else if bytes.first().is_some_and(|byte| byte.is_ascii_alphabetic()) {
        let end = scan_ident(bytes, idx);
        selector.tag = Some(input[idx..end].to_ascii_lowercase());
        idx = end;
    }

    while idx < bytes.len() {
        match bytes[idx] {
            b'#' => {
                let start = idx.saturating_add(1);
                let end = scan_ident(bytes, start);
                if start == end || selector.id.is_some() {
                    return Err(invalid(input, "malformed id selector"));
                }
                selector.id = Some(input[start..end].to_owned());
                idx = end;
            }
            b'.' => {
                let start = idx.saturating_add(1);
                let end = scan_ident(bytes, start);
                if start == end {
                    return Err(invalid(input, "malformed class selector"));
                }
                selector.classes.push(input[start..end].to_owned());
                idx = end;
            }
            b'[' => {
                let close = find_attribute_close(bytes, idx)
                    .ok_or_else(|| invalid(input, "unterminated attribute selector"))?;
                selector
                    .attributes
                    .push(parse_attribute(&input[idx + 1..close], input)?);
                idx = close.saturating_add(1);
            }
            b':' => {
                let start = idx.saturating_add(1);
                let end = scan_ident(bytes, start);
                let name = input[start..end].to_ascii_lowercase();
                let mut argument = None;
                idx = end;
                if bytes.get(idx) == Some(&b'(') {
                    let close = input[idx..]
                        .find(')')
                        .map(|offset| idx + offset)
                        .ok_or_else(|| invalid(input, "unterminated pseudo-class argument"))?;
                    argument = Some(input[idx + 1..close].trim());
                    idx = close.saturating_add(1);
                }
                selector
                    .pseudo_classes
                    .push(parse_pseudo_class(&name, argument, input)?);
            }
            _ => return Err(invalid(input, "unexpected character")),
        }
    }

    let empty = selector.tag.is_none()
        && selector.id.is_none()
        && selector.classes.is_empty()
        && selector.attributes.is_empty()
        && selector.pseudo_classes.is_empty();
    if empty && !universal {
        return Err(invalid(input, "empty compound selector"));
    }
    Ok(selector)
}

fn parse_attribute(body: &str, context: &str) -> FixResult<AttributeSelector> {
    let body = body.trim();
    let operator_at = body.find(['=', '*', '^', '$', '~']);
    let Some(at) = operator_at else {
        if body.is_empty() {
            return Err(invalid(context, "empty attribute selector"));
        }
        return Ok(AttributeSelector {
            name: body.to_ascii_lowercase(),
            operator: AttributeOperator::Exists,
            value: String::new(),
        });
    };

    let name = body[..at].trim().to_ascii_lowercase();
    let rest = &body[at..];
    let (operator, value_raw) = if let Some(value) = rest.strip_prefix("*=") {
        (AttributeOperator::Contains, value)
    } else if let Some(value) = rest.strip_prefix("^=") {
        (AttributeOperator::Prefix, value)
    } else if let Some(value) = rest.strip_prefix("$=") {
        (AttributeOperator::Suffix, value)
    } else if let Some(value) = rest.strip_prefix("~=") {
        (AttributeOperator::Includes, value)
    } else if let Some(value) = rest.strip_prefix('=') {
        (AttributeOperator::Equals, value)
    } else {
        return Err(invalid(context, "unknown attribute operator"));
    };

    if name.is_empty() {
        return Err(invalid(context, "attribute selector without a name"));
    }

    Ok(AttributeSelector {
        name,
        operator,
        value: unquote(value_raw.trim()).to_owned(),
    })
}

fn parse_pseudo_class(name: &str, argument: Option<&str>, context: &str) -> FixResult<PseudoClass> {
    match (name, argument) {
        ("checked", None) => Ok(PseudoClass::Checked),
        ("first-child", None) => Ok(PseudoClass::FirstChild),
        ("nth-child", Some(argument)) => {
            let nth = match argument.to_ascii_lowercase().as_str() {
                "odd" => Nth::Odd,
                "even" => Nth::Even,
                other => match other.parse::<usize>() {
                    Ok(index) if index > 0 => Nth::Index(index),
                    _ => return Err(invalid(context, "unsupported nth-child argument")),
                },
            };
            Ok(PseudoClass::NthChild(nth))
        }
        _ => Err(FixError::new(
            "css.selector_unsupported",
            format!("pseudo-class `:{name}` is not supported in `{context}`"),
        )),
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

fn find_attribute_close(bytes: &[u8], open: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    let mut idx = open.saturating_add(1);
    while idx < bytes.len() {
        let byte = bytes[idx];
        match quote {
            Some(open_quote) if byte == open_quote => quote = None,
            Some(_) => {}
            None if byte == b'\'' || byte == b'"' => quote = Some(byte),
            None if byte == b']' => return Some(idx),
            None => {}
        }
        idx = idx.saturating_add(1);
    }
    None
}

fn scan_ident(bytes: &[u8], mut idx: usize) -> usize {
    while idx < bytes.len() && is_selector_ident_char(bytes[idx]) {
        idx = idx.saturating_add(1);
    }
    idx
}

fn is_selector_ident_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' || byte >= 0x80
}

fn split_top_level(input: &str, delimiter: u8) -> Vec<&str> {
    let bytes = input.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0_usize;
    let mut quote: Option<u8> = None;
    let mut paren_depth = 0_u32;
    let mut bracket_depth = 0_u32;

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
            b'[' => bracket_depth = bracket_depth.saturating_add(1),
            b']' => bracket_depth = bracket_depth.saturating_sub(1),
            _ if byte == delimiter && paren_depth == 0 && bracket_depth == 0 => {
                parts.push(&input[start..idx]);
                start = idx.saturating_add(1);
            }
            _ => {}
        }
    }

    parts.push(&input[start..]);
    parts
}

fn invalid(selector: &str, reason: &str) -> FixError {
    FixError::new(
        "css.selector_invalid",
        format!("invalid selector `{selector}`: {reason}"),
    )
}

#[cfg(test)]
mod tests {
    use super::AttributeOperator;
    use super::Combinator;
    use super::Nth;
    use super::PseudoClass;
    use super::parse_selector_list;

    #[test]
    fn parses_compound_with_attributes_and_pseudo_classes() {
        let selectors = parse_selector_list(r#"input[type="checkbox"]:checked"#)
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(selectors.len(), 1);
        let compound = &selectors[0].segments[0].compound;
        assert_eq!(compound.tag.as_deref(), Some("input"));
        assert_eq!(compound.attributes[0].name, "type");
        assert_eq!(compound.attributes[0].operator, AttributeOperator::Equals);
        assert_eq!(compound.attributes[0].value, "checkbox");
        assert_eq!(compound.pseudo_classes, vec![PseudoClass::Checked]);
    }

    #[test]
    fn keeps_commas_inside_attribute_values() {
        let selectors = parse_selector_list(r#"[data-x="a,b"], .row"#)
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(selectors.len(), 2);
        assert_eq!(selectors[0].segments[0].compound.attributes[0].value, "a,b");
    }

    #[test]
    fn records_combinators_right_to_left() {
        let selectors =
            parse_selector_list("#root > div  div:nth-child(2)").unwrap_or_else(|_| unreachable!());
        let segments = &selectors[0].segments;
        assert_eq!(segments.len(), 3);
        assert_eq!(
            segments[0].compound.pseudo_classes,
            vec![PseudoClass::NthChild(Nth::Index(2))]
        );
        assert_eq!(segments[0].combinator_to_next, Some(Combinator::Descendant));
        assert_eq!(segments[1].combinator_to_next, Some(Combinator::Child));
        assert_eq!(segments[2].compound.id.as_deref(), Some("root"));
        assert_eq!(segments[2].combinator_to_next, None);
    }

    #[test]
    fn parses_substring_attribute_match() {
        let selectors =
            parse_selector_list(r#"[class*="col-"]"#).unwrap_or_else(|_| unreachable!());
        let attribute = &selectors[0].segments[0].compound.attributes[0];
        assert_eq!(attribute.operator, AttributeOperator::Contains);
        assert_eq!(attribute.value, "col-");
    }

    #[test]
    fn rejects_malformed_and_unsupported_selectors() {
        for bad in ["", " , .a", ".a >", "div[", ".", "a:hover", "> a"] {
            assert!(parse_selector_list(bad).is_err(), "{bad} should fail");
        }
        let sibling = parse_selector_list("a + b");
        assert!(sibling.is_err_and(|error| error.code == "css.selector_unsupported"));
    }
}
