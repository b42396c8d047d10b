use crate::Handler;
use crate::Install;
use crate::markup;
use core::cmp::Ordering;
use sf_core::FixResult;
use sf_css::Query;
use sf_dom::Document;
use sf_dom::EventKind;
use sf_dom::Listeners;
use sf_dom::NodeId;

/// Label and `data-cat` value of the button that shows every tile.
pub const ALL_CATEGORY: &str = "All";

/// Selected news category. "All" admits every tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFilter {
    categories: Vec<String>,
    selected: String,
}

impl CategoryFilter {
    pub fn new(categories: Vec<String>) -> Self {
        Self {
            categories,
            selected: ALL_CATEGORY.to_owned(),
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    /// Returns false (and keeps the current selection) for an unknown category.
    pub fn select(&mut self, category: &str) -> bool {
        if category != ALL_CATEGORY && !self.categories.iter().any(|known| known == category) {
            return false;
        }
        category.clone_into(&mut self.selected);
        true
    }

    pub fn admits(&self, category: &str) -> bool {
        self.selected == ALL_CATEGORY || self.selected == category
    }
}

/// Distinct non-empty categories in first-seen order.
pub fn collect_categories<'a, I>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut categories: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !categories.iter().any(|seen| seen == tag) {
            categories.push(tag.to_owned());
        }
    }
    categories
}

#[derive(Debug, Clone)]
pub struct NewsFilter {
    bar: NodeId,
    buttons: Vec<NodeId>,
    tiles: Vec<NodeId>,
    state: CategoryFilter,
}

impl NewsFilter {
    pub fn bar(&self) -> NodeId {
        self.bar
    }

    /// The "All" button first, then one per category.
    pub fn buttons(&self) -> &[NodeId] {
        &self.buttons
    }

    pub fn state(&self) -> &CategoryFilter {
        &self.state
    }

    pub fn button_for(&self, doc: &Document, category: &str) -> Option<NodeId> {
        self.buttons
            .iter()
            .copied()
            .find(|button| doc.attr(*button, "data-cat") == Some(category))
    }

    /// Delegated click handler on the bar.
    pub(crate) fn on_click(&mut self, doc: &mut Document, target: NodeId) -> FixResult<()> {
        let Some(button) = doc.closest(target, ".sf-filter-btn")? else {
            return Ok(());
        };
        if !doc.contains(self.bar, button) {
            return Ok(());
        }
        let Some(category) = doc.attr(button, "data-cat").map(ToOwned::to_owned) else {
            return Ok(());
        };
        self.select(doc, &category)
    }

    pub fn select(&mut self, doc: &mut Document, category: &str) -> FixResult<()> {
        if !self.state.select(category) {
            tracing::debug!(category, "unknown news category");
            return Ok(());
        }

        for button in &self.buttons {
            let active = doc.attr(*button, "data-cat") == Some(self.state.selected());
            doc.toggle_class(*button, "active", active)?;
        }
        for tile in &self.tiles {
            // Tags are read live on every selection.
            let category = markup::child_text(doc, *tile, ".tags")?.unwrap_or_default();
            let column = markup::column_of(doc, *tile)?;
            markup::set_visible(doc, column, self.state.admits(&category))?;
        }
        Ok(())
    }
}

pub(crate) fn install(
    doc: &mut Document,
    listeners: &mut Listeners<Handler>,
) -> FixResult<Install<NewsFilter>> {
    let root = doc.root();
    let tiles = doc.query_selector_all(root, ".tile-range")?;
    if tiles.is_empty() {
        return Ok(Install::Skipped("no .tile-range tiles"));
    }

    let mut tags = Vec::new();
    for tile in &tiles {
        if let Some(tag) = markup::child_text(doc, *tile, ".tags")? {
            tags.push(tag);
        }
    }
    if tags.is_empty() {
        return Ok(Install::Skipped("no tile carries .tags"));
    }
    let categories = collect_categories(tags.iter().map(String::as_str));
    if categories.is_empty() {
        return Ok(Install::Skipped("every .tags element is empty"));
    }

    let Some(first_row) = first_row(doc, &tiles)? else {
        return Ok(Install::Skipped("no .row holds a tile"));
    };
    let Some(row_parent) = doc.parent(first_row) else {
        return Ok(Install::Skipped("tile row is detached"));
    };

    let bar = markup::element(doc, "div", "sf-news-filter container")?;
    let mut buttons = Vec::with_capacity(categories.len().saturating_add(1));
    buttons.push(filter_button(doc, bar, ALL_CATEGORY, true)?);
    for category in &categories {
        buttons.push(filter_button(doc, bar, category, false)?);
    }
    doc.insert_before(row_parent, bar, Some(first_row))?;
    listeners.add(bar, EventKind::Click, Handler::NewsBarClick);

    let summary = format!("{} categories over {} tile(s)", categories.len(), tiles.len());
    Ok(Install::Applied {
        state: NewsFilter {
            bar,
            buttons,
            tiles,
            state: CategoryFilter::new(categories),
        },
        summary,
    })
}

/// Earliest row, in document order, that is the nearest `.row` of some tile.
fn first_row(doc: &Document, tiles: &[NodeId]) -> FixResult<Option<NodeId>> {
    let mut first: Option<NodeId> = None;
    for tile in tiles {
        let Some(row) = doc.closest(*tile, ".row")? else {
            continue;
        };
        first = match first {
            Some(current) if doc.document_order(row, current) != Some(Ordering::Less) => {
                Some(current)
            }
            _ => Some(row),
        };
    }
    Ok(first)
}

fn filter_button(
    doc: &mut Document,
    bar: NodeId,
    label: &str,
    active: bool,
) -> FixResult<NodeId> {
    let class = if active {
        "sf-filter-btn active"
    } else {
        "sf-filter-btn"
    };
    let button = markup::append_element(doc, bar, "button", class)?;
    markup::append_text(doc, button, label)?;
    doc.set_attr(button, "data-cat", label)?;
    Ok(button)
}

#[cfg(test)]
mod tests {
    use super::CategoryFilter;
    use super::collect_categories;

    #[test]
    fn categories_are_distinct_trimmed_and_in_first_seen_order() {
        let categories = collect_categories([" Media ", "ESG", "", "Media", "Leasing", "ESG"]);
        assert_eq!(categories, vec!["Media", "ESG", "Leasing"]);
    }

    #[test]
    fn selection_admits_matching_category_or_everything_for_all() {
        let mut filter = CategoryFilter::new(vec!["Media".to_owned(), "ESG".to_owned()]);
        assert_eq!(filter.selected(), "All");
        assert!(filter.admits("Media") && filter.admits(""));

        assert!(filter.select("ESG"));
        assert!(filter.admits("ESG"));
        assert!(!filter.admits("Media"));
        assert!(!filter.admits(""));

        assert!(!filter.select("Sport"));
        assert_eq!(filter.selected(), "ESG");

        assert!(filter.select("All"));
        assert!(filter.admits("Media"));
    }
}
