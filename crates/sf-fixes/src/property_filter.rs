//! Wires the property page's facet checkboxes to tile visibility.
//!
//! Each `.tile-range` tile is stamped with `data-sf-type`/`data-sf-state`
//! derived from its `.address` line. Each `.filter-items` container is
//! classified as the type or the state facet. A change on any classified
//! checkbox re-evaluates every tile.

use crate::Handler;
use crate::Install;
use crate::config::PropertyFilterConfig;
use crate::markup;
use crate::report::Diagnostic;
use crate::report::Routine;
use sf_core::FixResult;
use sf_css::Query;
use sf_dom::Document;
use sf_dom::EventKind;
use sf_dom::Listeners;
use sf_dom::NodeId;

pub const TYPE_ATTRIBUTE: &str = "data-sf-type";
pub const STATE_ATTRIBUTE: &str = "data-sf-state";

/// Checkbox value that stands for "no constraint" in a facet container.
pub const ALL_VALUE: &str = "All";

const CHECKBOX_SELECTOR: &str = r#"input[type="checkbox"]"#;
const ALL_SELECTOR: &str = r#"input[value="All"]"#;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileFacets {
    pub property_type: String,
    pub state: String,
}

/// Splits `"<type> | <locality>, <state>"`. The type is everything before the
/// first `|`; the state is everything after the last `,` of the remainder.
/// A missing delimiter leaves the corresponding facet empty.
pub fn parse_address(text: &str) -> TileFacets {
    let text = text.trim();
    let Some((property_type, location)) = text.split_once('|') else {
        return TileFacets::default();
    };
    let state = location
        .trim()
        .rsplit_once(',')
        .map(|(_, state)| state.trim().to_owned())
        .unwrap_or_default();

    TileFacets {
        property_type: property_type.trim().to_owned(),
        state,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacetKind {
    Type,
    State,
}

impl FacetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::State => "state",
        }
    }

    fn from_marker(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "type" => Some(Self::Type),
            "state" => Some(Self::State),
            _ => None,
        }
    }
}

/// The checked values of one facet container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetSelection {
    values: Vec<String>,
}

impl FacetSelection {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Nothing checked, or "All" checked.
    pub fn is_unconstrained(&self) -> bool {
        self.values.is_empty() || self.values.iter().any(|value| value == ALL_VALUE)
    }

    pub fn admits(&self, value: &str) -> bool {
        self.is_unconstrained() || self.values.iter().any(|candidate| candidate == value)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

pub fn tile_visible(facets: &TileFacets, types: &FacetSelection, states: &FacetSelection) -> bool {
    types.admits(&facets.property_type) && states.admits(&facets.state)
}

/// How a `.filter-items` container came to be assigned a facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Marked(FacetKind),
    Sniffed(FacetKind),
    /// Values from both vocabularies; used as the type container.
    Ambiguous,
    Unknown,
}

impl Classification {
    pub fn kind(self) -> Option<FacetKind> {
        match self {
            Self::Marked(kind) | Self::Sniffed(kind) => Some(kind),
            Self::Ambiguous => Some(FacetKind::Type),
            Self::Unknown => None,
        }
    }
}

/// Classifies `container` by its facet marker attribute, falling back to the
/// values of its checkboxes. A container matching both vocabularies is
/// [`Classification::Ambiguous`].
pub fn classify_container(
    doc: &Document,
    container: NodeId,
    config: &PropertyFilterConfig,
) -> FixResult<Classification> {
    if let Some(kind) = doc
        .attr(container, &config.facet_attribute)
        .and_then(FacetKind::from_marker)
    {
        return Ok(Classification::Marked(kind));
    }

    let values = checkbox_values(doc, container)?;
    let in_vocabulary =
        |vocabulary: &[String]| values.iter().any(|value| vocabulary.contains(value));
    let classification = match (
        in_vocabulary(&config.type_vocabulary),
        in_vocabulary(&config.state_vocabulary),
    ) {
        (true, true) => Classification::Ambiguous,
        (true, false) => Classification::Sniffed(FacetKind::Type),
        (false, true) => Classification::Sniffed(FacetKind::State),
        (false, false) => Classification::Unknown,
    };
    Ok(classification)
}

fn checkbox_values(doc: &Document, container: NodeId) -> FixResult<Vec<String>> {
    Ok(doc
        .query_selector_all(container, CHECKBOX_SELECTOR)?
        .into_iter()
        .filter_map(|checkbox| doc.value(checkbox).map(ToOwned::to_owned))
        .collect())
}

#[derive(Debug, Clone)]
pub struct PropertyFilter {
    tiles: Vec<NodeId>,
    type_container: Option<NodeId>,
    state_container: Option<NodeId>,
}

impl PropertyFilter {
    pub fn tiles(&self) -> &[NodeId] {
        &self.tiles
    }

    pub fn container(&self, kind: FacetKind) -> Option<NodeId> {
        match kind {
            FacetKind::Type => self.type_container,
            FacetKind::State => self.state_container,
        }
    }

    /// Values currently checked in the container for `kind`.
    pub fn selection(&self, doc: &Document, kind: FacetKind) -> FixResult<FacetSelection> {
        let Some(container) = self.container(kind) else {
            return Ok(FacetSelection::default());
        };
        let checked = doc
            .query_selector_all(container, CHECKBOX_SELECTOR)?
            .into_iter()
            .filter(|checkbox| doc.is_checked(*checkbox))
            .filter_map(|checkbox| doc.value(checkbox).map(ToOwned::to_owned));
        Ok(FacetSelection::new(checked))
    }

    /// Shows or hides every tile's column from the live checkbox state.
    pub fn apply(&self, doc: &mut Document) -> FixResult<()> {
        let types = self.selection(doc, FacetKind::Type)?;
        let states = self.selection(doc, FacetKind::State)?;

        let mut shown = 0_usize;
        for tile in &self.tiles {
            let facets = TileFacets {
                property_type: doc.attr(*tile, TYPE_ATTRIBUTE).unwrap_or_default().to_owned(),
                state: doc.attr(*tile, STATE_ATTRIBUTE).unwrap_or_default().to_owned(),
            };
            let visible = tile_visible(&facets, &types, &states);
            let column = markup::column_of(doc, *tile)?;
            markup::set_visible(doc, column, visible)?;
            if visible {
                shown = shown.saturating_add(1);
            }
        }

        tracing::debug!(shown, total = self.tiles.len(), "property filter applied");
        Ok(())
    }

    /// Change handler for a checkbox in the `kind` container. Checking "All"
    /// clears its siblings; checking anything else clears "All".
    pub(crate) fn on_change(
        &self,
        doc: &mut Document,
        checkbox: NodeId,
        kind: FacetKind,
        is_all: bool,
    ) -> FixResult<()> {
        if let Some(container) = self.container(kind) {
            if doc.is_checked(checkbox) {
                if is_all {
                    for other in others(doc, container)? {
                        doc.set_checked(other, false)?;
                    }
                } else if let Some(all) = doc.query_selector(container, ALL_SELECTOR)? {
                    doc.set_checked(all, false)?;
                }
            }
        }
        self.apply(doc)
    }
}

fn others(doc: &Document, container: NodeId) -> FixResult<Vec<NodeId>> {
    Ok(doc
        .query_selector_all(container, CHECKBOX_SELECTOR)?
        .into_iter()
        .filter(|checkbox| doc.value(*checkbox) != Some(ALL_VALUE))
        .collect())
}

pub(crate) fn install(
    doc: &mut Document,
    config: &PropertyFilterConfig,
    listeners: &mut Listeners<Handler>,
    diagnostics: &mut Vec<Diagnostic>,
) -> FixResult<Install<PropertyFilter>> {
    let root = doc.root();
    let tiles = doc.query_selector_all(root, ".tile-range")?;
    if tiles.is_empty() {
        return Ok(Install::Skipped("no .tile-range tiles"));
    }
    let containers = doc.query_selector_all(root, ".filter-items")?;
    if containers.is_empty() {
        return Ok(Install::Skipped("no .filter-items containers"));
    }

    for tile in &tiles {
        let Some(address) = markup::child_text(doc, *tile, ".address")? else {
            continue;
        };
        let facets = parse_address(&address);
        doc.set_attr(*tile, TYPE_ATTRIBUTE, &facets.property_type)?;
        doc.set_attr(*tile, STATE_ATTRIBUTE, &facets.state)?;
    }

    let mut filter = PropertyFilter {
        tiles,
        type_container: None,
        state_container: None,
    };
    for container in containers {
        let classification = classify_container(doc, container, config)?;
        let Some(kind) = classification.kind() else {
            Diagnostic::new(
                Routine::PropertyFilter,
                Some(container),
                "facet container matches neither vocabulary and has no facet marker; ignored",
            )
            .emit(diagnostics);
            continue;
        };
        if classification == Classification::Ambiguous {
            Diagnostic::new(
                Routine::PropertyFilter,
                Some(container),
                "facet container matches both type and state vocabularies; treated as type",
            )
            .emit(diagnostics);
        }

        let slot = match kind {
            FacetKind::Type => &mut filter.type_container,
            FacetKind::State => &mut filter.state_container,
        };
        if let Some(first) = *slot {
            Diagnostic::new(
                Routine::PropertyFilter,
                Some(container),
                format!(
                    "second {} container ignored; {first} already holds that facet",
                    kind.as_str()
                ),
            )
            .emit(diagnostics);
            continue;
        }
        *slot = Some(container);
    }

    let mut wired = 0_usize;
    for kind in [FacetKind::Type, FacetKind::State] {
        let Some(container) = filter.container(kind) else {
            continue;
        };
        if let Some(all) = doc.query_selector(container, ALL_SELECTOR)? {
            listeners.add(all, EventKind::Change, Handler::FacetChange { kind, is_all: true });
            wired = wired.saturating_add(1);
        }
        for checkbox in others(doc, container)? {
            listeners.add(checkbox, EventKind::Change, Handler::FacetChange {
                kind,
                is_all: false,
            });
            wired = wired.saturating_add(1);
        }
    }

    let classified = [filter.type_container, filter.state_container]
        .iter()
        .flatten()
        .count();
    let summary = format!(
        "{} tile(s), {classified} facet container(s), {wired} checkbox(es)",
        filter.tiles.len()
    );
    Ok(Install::Applied {
        state: filter,
        summary,
    })
}
