//! Best-effort DOM patches for a statically exported site.
//!
//! Six independent routines run once against a parsed [`sf_dom::Document`]:
//! carousel controls, the property facet filter, the news category bar, the
//! contact-form fallback, the search-page notice, and click-to-open nav
//! dropdowns. Each is a no-op when the markup it expects is missing. A
//! [`Page`] owns the document, boots the routines, and replays user events
//! through the listeners they registered.

pub mod carousel;
pub mod config;
pub mod contact_form;
pub mod location;
mod markup;
pub mod nav_dropdown;
pub mod news_filter;
mod page;
pub mod property_filter;
mod report;
pub mod search_notice;

#[cfg(test)]
mod tests;

pub use config::FixesConfig;
pub use location::PageLocation;
pub use page::Page;
pub use page::ReadyState;
pub use report::BootReport;
pub use report::Diagnostic;
pub use report::Outcome;
pub use report::Routine;
pub use report::RoutineReport;

use property_filter::FacetKind;

/// Listener payloads registered by the routines. Indices refer to the
/// component state the [`Page`] keeps for each routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Handler {
    CarouselStep { carousel: usize, delta: i64 },
    CarouselDot { carousel: usize, slide: usize },
    CarouselTouchStart(usize),
    CarouselTouchEnd(usize),
    FacetChange { kind: FacetKind, is_all: bool },
    NewsBarClick,
    ContactSubmit,
    NavToggle(usize),
    NavCloseAll,
}

/// What a routine's installer produced.
#[derive(Debug)]
pub(crate) enum Install<T> {
    Applied { state: T, summary: String },
    Skipped(&'static str),
}
