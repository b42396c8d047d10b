//! Small builders for the elements the routines inject, plus the tile
//! visibility helpers shared by both filters.

use sf_core::FixResult;
use sf_css::Query;
use sf_dom::Document;
use sf_dom::NodeId;
use sf_html::HtmlParser;

const COLUMN_SELECTOR: &str = r#"[class*="col-"]"#;

/// Creates a detached element with an optional class attribute.
pub(crate) fn element(doc: &mut Document, tag: &str, class: &str) -> FixResult<NodeId> {
    let node = doc.create_element(tag);
    if !class.is_empty() {
        doc.set_attr(node, "class", class)?;
    }
    Ok(node)
}

pub(crate) fn append_element(
    doc: &mut Document,
    parent: NodeId,
    tag: &str,
    class: &str,
) -> FixResult<NodeId> {
    let node = element(doc, tag, class)?;
    doc.append_child(parent, node)?;
    Ok(node)
}

pub(crate) fn append_text(doc: &mut Document, parent: NodeId, text: &str) -> FixResult<()> {
    let node = doc.create_text(text);
    doc.append_child(parent, node)
}

/// Parses fixed markup and appends the resulting nodes to `parent`.
pub(crate) fn append_fragment(doc: &mut Document, parent: NodeId, html: &str) -> FixResult<()> {
    for node in HtmlParser.parse_fragment(doc, html)? {
        doc.append_child(parent, node)?;
    }
    Ok(())
}

pub(crate) fn append_link(
    doc: &mut Document,
    parent: NodeId,
    href: &str,
    label: &str,
) -> FixResult<NodeId> {
    let link = append_element(doc, parent, "a", "")?;
    doc.set_attr(link, "href", href)?;
    append_text(doc, link, label)?;
    Ok(link)
}

pub(crate) fn append_mailto(doc: &mut Document, parent: NodeId, email: &str) -> FixResult<NodeId> {
    append_link(doc, parent, &format!("mailto:{email}"), email)
}

/// The element whose visibility stands for a tile: its nearest grid column,
/// or the tile itself.
pub(crate) fn column_of(doc: &Document, tile: NodeId) -> FixResult<NodeId> {
    Ok(doc.closest(tile, COLUMN_SELECTOR)?.unwrap_or(tile))
}

pub(crate) fn set_visible(doc: &mut Document, node: NodeId, visible: bool) -> FixResult<()> {
    doc.set_style_property(node, "display", if visible { "" } else { "none" })
}

/// Trimmed text of the first descendant of `scope` matching `selector`.
pub(crate) fn child_text(doc: &Document, scope: NodeId, selector: &str) -> FixResult<Option<String>> {
    Ok(doc
        .query_selector(scope, selector)?
        .map(|node| doc.text_content(node).trim().to_owned()))
}
