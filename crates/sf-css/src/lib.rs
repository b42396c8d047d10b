//! CSS selector parsing and DOM queries.
//!
//! Supports the subset the page fixes rely on: type, universal, id, class and
//! attribute selectors, `:checked`, `:first-child`, `:nth-child()`, descendant
//! and child combinators, and comma-separated lists.

mod matching;
mod parser;

use sf_core::FixResult;
use sf_dom::Document;
use sf_dom::NodeId;

/// A parsed, comma-separated selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    source: String,
    selectors: Vec<parser::Selector>,
}

impl SelectorList {
    pub fn parse(input: &str) -> FixResult<Self> {
        Ok(Self {
            source: input.trim().to_owned(),
            selectors: parser::parse_selector_list(input)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// True when any selector in the list matches `node`.
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.selectors
            .iter()
            .any(|selector| matching::matches_selector(selector, doc, node))
    }

    /// First matching descendant of `scope` in document order.
    pub fn query_first(&self, doc: &Document, scope: NodeId) -> Option<NodeId> {
        doc.descendants(scope)
            .into_iter()
            .find(|node| self.matches(doc, *node))
    }

    /// Every matching descendant of `scope` in document order.
    pub fn query_all(&self, doc: &Document, scope: NodeId) -> Vec<NodeId> {
        doc.descendants(scope)
            .into_iter()
            .filter(|node| self.matches(doc, *node))
            .collect()
    }

    /// Nearest ancestor-or-self of `node` that matches.
    pub fn closest(&self, doc: &Document, node: NodeId) -> Option<NodeId> {
        core::iter::once(node)
            .chain(doc.ancestors(node))
            .find(|candidate| self.matches(doc, *candidate))
    }
}

/// String-selector conveniences on [`Document`], mirroring the DOM API names.
pub trait Query {
    fn query_selector(&self, scope: NodeId, selector: &str) -> FixResult<Option<NodeId>>;
    fn query_selector_all(&self, scope: NodeId, selector: &str) -> FixResult<Vec<NodeId>>;
    fn closest(&self, node: NodeId, selector: &str) -> FixResult<Option<NodeId>>;
    fn matches(&self, node: NodeId, selector: &str) -> FixResult<bool>;
}

impl Query for Document {
    fn query_selector(&self, scope: NodeId, selector: &str) -> FixResult<Option<NodeId>> {
        Ok(SelectorList::parse(selector)?.query_first(self, scope))
    }

    fn query_selector_all(&self, scope: NodeId, selector: &str) -> FixResult<Vec<NodeId>> {
        Ok(SelectorList::parse(selector)?.query_all(self, scope))
    }

    fn closest(&self, node: NodeId, selector: &str) -> FixResult<Option<NodeId>> {
        Ok(SelectorList::parse(selector)?.closest(self, node))
    }

    fn matches(&self, node: NodeId, selector: &str) -> FixResult<bool> {
        Ok(SelectorList::parse(selector)?.matches(self, node))
    }
}
