use crate::Install;
use crate::config::SearchNoticeConfig;
use crate::location::PageLocation;
use crate::markup;
use sf_core::FixResult;
use sf_css::Query;
use sf_dom::Document;
use sf_dom::NodeId;

pub const MAIN_SELECTOR: &str =
    r#".container main, main, [role="main"], #root > div > div:nth-child(2)"#;
pub const SEARCH_INPUT_SELECTOR: &str = r#"input[type="search"], input[placeholder*="Search"], input[placeholder*="search"]"#;

const NOTICE_BODY: &str = "<h2>Search</h2><p>Full-text search is not available in this version \
     of the site. Use the links below to browse our content, or navigate using the menu above.</p>";

/// Where the notice goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Right after the search input's container.
    After(NodeId),
    /// As the first child of the main content area.
    Prepend(NodeId),
}

/// Picks the insertion point: after the search input's nearest `.container`
/// (or its parent) when an input exists, otherwise at the start of the main
/// area or the first `.container`.
pub fn find_placement(doc: &Document) -> FixResult<Option<Placement>> {
    let root = doc.root();
    if let Some(input) = doc.query_selector(root, SEARCH_INPUT_SELECTOR)? {
        let wrap = match doc.closest(input, ".container")? {
            Some(container) => Some(container),
            None => doc.parent(input),
        };
        // The wrap needs a parent of its own to have a next sibling slot.
        return Ok(wrap
            .filter(|wrap| doc.parent(*wrap).is_some())
            .map(Placement::After));
    }

    let main = match doc.query_selector(root, MAIN_SELECTOR)? {
        Some(main) => Some(main),
        None => doc.query_selector(root, ".container")?,
    };
    Ok(main.map(Placement::Prepend))
}

pub(crate) fn install(
    doc: &mut Document,
    location: &PageLocation,
    config: &SearchNoticeConfig,
) -> FixResult<Install<NodeId>> {
    if !location.path_contains(&config.path_marker) {
        return Ok(Install::Skipped("not a search route"));
    }
    let Some(placement) = find_placement(doc)? else {
        return Ok(Install::Skipped("no search input or main content area"));
    };

    let notice = markup::element(doc, "div", "sf-search-notice")?;
    markup::append_fragment(doc, notice, NOTICE_BODY)?;
    let links = markup::append_element(doc, notice, "div", "sf-browse-links")?;
    for link in &config.links {
        markup::append_link(doc, links, &link.href, &link.label)?;
    }

    let summary = match placement {
        Placement::After(wrap) => {
            doc.insert_after(wrap, notice)?;
            format!("notice after {wrap}")
        }
        Placement::Prepend(main) => {
            doc.prepend_child(main, notice)?;
            format!("notice at start of {main}")
        }
    };
    Ok(Install::Applied {
        state: notice,
        summary,
    })
}
