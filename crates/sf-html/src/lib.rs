//! HTML parsing into the arena DOM, and serialization back out.
//!
//! The parser is forgiving in the way static-site output needs: unmatched end
//! tags are ignored, unclosed elements are closed at end of input, and a few
//! implied end tags (`p`, `li`, `option`, table cells) are honored.

mod charset;
mod serialize;
mod tokenizer;

pub use charset::DecodedHtml;
pub use charset::decode_html_bytes;
pub use serialize::inner_html;
pub use serialize::outer_html;
pub use serialize::serialize_document;

use sf_core::FixResult;
use sf_dom::Document;
use sf_dom::NodeId;
use tokenizer::ParsedTag;
use tokenizer::Token;

/// Elements that never have content or an end tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose text is serialized without escaping.
pub(crate) const RAW_TEXT_PARENTS: &[&str] = &["script", "style"];

const CLOSES_PARAGRAPH: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "div",
    "dl",
    "fieldset",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "ul",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Parses raw HTML into a DOM document.
#[derive(Debug, Default)]
pub struct HtmlParser;

impl HtmlParser {
    pub fn parse(&self, input: &str) -> Document {
        let mut doc = Document::new();
        let root = doc.root();
        if let Err(error) = build_tree(&mut doc, root, input, true) {
            tracing::warn!(code = error.code, "html tree construction stopped early: {error}");
        }
        doc
    }

    /// Parses `input` as a fragment owned by `doc`. The returned top-level
    /// nodes are detached and ready to be inserted anywhere.
    pub fn parse_fragment(&self, doc: &mut Document, input: &str) -> FixResult<Vec<NodeId>> {
        let container = doc.create_element("template");
        build_tree(doc, container, input, false)?;
        let nodes = doc.children(container).to_vec();
        for node in &nodes {
            doc.detach(*node)?;
        }
        Ok(nodes)
    }
}

fn build_tree(doc: &mut Document, container: NodeId, input: &str, allow_doctype: bool) -> FixResult<()> {
    // The container stays at the bottom of the stack and is never popped.
    let mut stack = vec![container];

    for token in tokenizer::tokenize(input) {
        let current = stack.last().copied().unwrap_or(container);
        match token {
            Token::Doctype(name) => {
                if allow_doctype {
                    let node = doc.create_doctype(&name);
                    doc.append_child(current, node)?;
                }
            }
            Token::Comment(text) => {
                let node = doc.create_comment(&text);
                doc.append_child(current, node)?;
            }
            Token::Text(text) => {
                let node = doc.create_text(&text);
                doc.append_child(current, node)?;
            }
            Token::StartTag(tag) => {
                close_implied(doc, &mut stack, &tag.name);
                let parent = stack.last().copied().unwrap_or(container);
                let element = create_element(doc, &tag)?;
                doc.append_child(parent, element)?;
                if !tag.self_closing && !is_void_element(&tag.name) {
                    stack.push(element);
                }
            }
            Token::EndTag(name) => {
                let open = stack
                    .iter()
                    .enumerate()
                    .skip(1)
                    .rev()
                    .find(|(_, id)| doc.tag_name(**id) == Some(name.as_str()))
                    .map(|(index, _)| index);
                // Unmatched end tags are ignored.
                if let Some(index) = open {
                    stack.truncate(index);
                }
            }
        }
    }

    Ok(())
}

fn create_element(doc: &mut Document, tag: &ParsedTag) -> FixResult<NodeId> {
    let element = doc.create_element(&tag.name);
    for (name, value) in &tag.attrs {
        doc.set_attr(element, name, value)?;
    }
    if doc.is_checkable(element) && doc.has_attr(element, "checked") {
        doc.set_checked(element, true)?;
    }
    Ok(element)
}

fn close_implied(doc: &Document, stack: &mut Vec<NodeId>, opening: &str) {
    loop {
        if stack.len() <= 1 {
            return;
        }
        let Some(top) = stack.last().and_then(|id| doc.tag_name(*id)) else {
            return;
        };
        let implied = match top {
            "p" => CLOSES_PARAGRAPH.contains(&opening),
            "li" => opening == "li",
            "option" => opening == "option",
            "dt" | "dd" => matches!(opening, "dt" | "dd"),
            "td" | "th" => matches!(opening, "td" | "th" | "tr"),
            "tr" => opening == "tr",
            _ => false,
        };
        if !implied {
            return;
        }
        stack.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::HtmlParser;
    use super::outer_html;
    use super::serialize_document;
    use sf_dom::NodeKind;

    #[test]
    fn builds_nested_tree_with_attributes() {
        let doc = HtmlParser.parse(
            r#"<div class="tile-range col-4"><p class="address">Canberra, ACT</p></div>"#,
        );
        let root = doc.root();
        let div = doc.children(root)[0];
        assert_eq!(doc.tag_name(div), Some("div"));
        assert!(doc.has_class(div, "col-4"));
        let p = doc.children(div)[0];
        assert_eq!(doc.text_content(p), "Canberra, ACT");
    }

    #[test]
    fn void_elements_do_not_swallow_siblings() {
        let doc = HtmlParser.parse(r#"<form><input name="a"><button>Go</button></form>"#);
        let form = doc.children(doc.root())[0];
        let children = doc.element_children(form);
        assert_eq!(children.len(), 2);
        assert_eq!(doc.tag_name(children[1]), Some("button"));
    }

    #[test]
    fn unmatched_end_tags_are_ignored() {
        let doc = HtmlParser.parse("<div></span><b>x</b></div></div>tail");
        let root = doc.root();
        assert_eq!(doc.children(root).len(), 2);
        assert_eq!(doc.text_content(root), "xtail");
    }

    #[test]
    fn end_tag_closes_intervening_elements() {
        let doc = HtmlParser.parse("<ul><li><b>a</ul><p>after</p>");
        let root = doc.root();
        let top: Vec<_> = doc
            .element_children(root)
            .into_iter()
            .filter_map(|id| doc.tag_name(id).map(ToOwned::to_owned))
            .collect();
        assert_eq!(top, vec!["ul", "p"]);
    }

    #[test]
    fn implied_end_tags_for_paragraphs_and_list_items() {
        let doc = HtmlParser.parse("<ul><li>one<li>two</ul><p>a<div>b</div>");
        let root = doc.root();
        let ul = doc.element_children(root)[0];
        assert_eq!(doc.element_children(ul).len(), 2);
        assert_eq!(doc.element_children(root).len(), 3);
    }

    #[test]
    fn checked_attribute_seeds_checkedness() {
        let doc = HtmlParser.parse(
            r#"<input type="checkbox" checked><input type="checkbox"><input type="text" checked>"#,
        );
        let inputs = doc.element_children(doc.root());
        assert!(doc.is_checked(inputs[0]));
        assert!(!doc.is_checked(inputs[1]));
        assert!(!doc.is_checked(inputs[2]));
    }

    #[test]
    fn keeps_doctype_and_comments() {
        let doc = HtmlParser.parse("<!doctype html><!-- built --><html></html>");
        let kinds: Vec<_> = doc
            .children(doc.root())
            .iter()
            .filter_map(|id| doc.kind(*id).cloned())
            .collect();
        assert!(matches!(kinds[0], NodeKind::Doctype(ref name) if name == "html"));
        assert!(matches!(kinds[1], NodeKind::Comment(_)));
        assert_eq!(
            serialize_document(&doc),
            "<!DOCTYPE html><!-- built --><html></html>"
        );
    }

    #[test]
    fn fragments_are_detached_and_owned_by_the_document() {
        let mut doc = HtmlParser.parse("<main></main>");
        let main = doc.children(doc.root())[0];
        let nodes = HtmlParser
            .parse_fragment(&mut doc, "<h2>Search</h2><p>Use the links &amp; menu.</p>")
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().all(|id| doc.parent(*id).is_none()));

        for node in &nodes {
            doc.append_child(main, *node).unwrap_or_else(|_| unreachable!());
        }
        assert_eq!(
            outer_html(&doc, main),
            "<main><h2>Search</h2><p>Use the links &amp; menu.</p></main>"
        );
    }

    #[test]
    fn fragment_ignores_doctype() {
        let mut doc = HtmlParser.parse("");
        let nodes = HtmlParser
            .parse_fragment(&mut doc, "<!DOCTYPE html><span>x</span>")
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(nodes.len(), 1);
        assert_eq!(doc.tag_name(nodes[0]), Some("span"));
    }
}
