//! DOM to markup.

use crate::RAW_TEXT_PARENTS;
use crate::is_void_element;
use sf_dom::Document;
use sf_dom::NodeId;
use sf_dom::NodeKind;

/// Serializes every child of the document root.
pub fn serialize_document(doc: &Document) -> String {
    inner_html(doc, doc.root())
}

pub fn outer_html(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, id, false, &mut out);
    out
}

pub fn inner_html(doc: &Document, id: NodeId) -> String {
    let raw = doc
        .tag_name(id)
        .is_some_and(|tag| RAW_TEXT_PARENTS.contains(&tag));
    let mut out = String::new();
    for child in doc.children(id) {
        write_node(doc, *child, raw, &mut out);
    }
    out
}

fn write_node(doc: &Document, id: NodeId, raw_text: bool, out: &mut String) {
    match doc.kind(id) {
        None | Some(NodeKind::Document) => {
            for child in doc.children(id) {
                write_node(doc, *child, false, out);
            }
        }
        Some(NodeKind::Doctype(name)) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        Some(NodeKind::Comment(text)) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        Some(NodeKind::Text(text)) => {
            if raw_text {
                out.push_str(text);
            } else {
                escape_into(text, false, out);
            }
        }
        Some(NodeKind::Element(element)) => {
            let checkable = doc.is_checkable(id);
            out.push('<');
            out.push_str(&element.tag);
            for (name, value) in &element.attrs {
                // Checkedness is reflected from live state below.
                if checkable && name == "checked" {
                    continue;
                }
                out.push(' ');
                out.push_str(name);
                if !value.is_empty() {
                    out.push_str("=\"");
                    escape_into(value, true, out);
                    out.push('"');
                }
            }
            if checkable && element.checked {
                out.push_str(" checked");
            }
            out.push('>');

            if is_void_element(&element.tag) {
                return;
            }
            out.push_str(&inner_html(doc, id));
            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
    }
}

fn escape_into(input: &str, attribute: bool, out: &mut String) {
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::outer_html;
    use super::serialize_document;
    use crate::HtmlParser;

    #[test]
    fn round_trips_simple_markup() {
        let input = r#"<div class="row"><a href="/News?a=1&amp;b=2" aria-label="Next slide">&#8250;</a><br></div>"#;
        let doc = HtmlParser.parse(input);
        assert_eq!(
            serialize_document(&doc),
            "<div class=\"row\"><a href=\"/News?a=1&amp;b=2\" aria-label=\"Next slide\">\u{203a}</a><br></div>"
        );
    }

    #[test]
    fn escapes_text_and_attribute_values() {
        let mut doc = HtmlParser.parse("<p></p>");
        let p = doc.children(doc.root())[0];
        doc.set_attr(p, "title", "say \"hi\" <now>").unwrap_or_else(|_| unreachable!());
        doc.set_text_content(p, "1 < 2 & 3").unwrap_or_else(|_| unreachable!());
        assert_eq!(
            outer_html(&doc, p),
            "<p title=\"say &quot;hi&quot; <now>\">1 &lt; 2 &amp; 3</p>"
        );
    }

    #[test]
    fn script_text_is_not_escaped() {
        let doc = HtmlParser.parse("<script>if (a < b) { go(); }</script>");
        assert_eq!(serialize_document(&doc), "<script>if (a < b) { go(); }</script>");
    }

    #[test]
    fn reflects_live_checkedness() {
        let mut doc = HtmlParser.parse(r#"<input type="checkbox" value="ACT" checked>"#);
        let input = doc.children(doc.root())[0];
        assert_eq!(
            outer_html(&doc, input),
            r#"<input type="checkbox" value="ACT" checked>"#
        );

        doc.set_checked(input, false).unwrap_or_else(|_| unreachable!());
        assert_eq!(outer_html(&doc, input), r#"<input type="checkbox" value="ACT">"#);
    }

    #[test]
    fn bare_attributes_stay_bare() {
        let doc = HtmlParser.parse("<form novalidate><button disabled>Send</button></form>");
        assert_eq!(
            serialize_document(&doc),
            "<form novalidate><button disabled>Send</button></form>"
        );
    }
}
