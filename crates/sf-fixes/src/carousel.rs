//! Prev/next buttons, dot indicators, and swipe handling for slideshow
//! viewports that lost their script.

use crate::Handler;
use crate::Install;
use crate::config::CarouselConfig;
use crate::markup;
use sf_core::FixResult;
use sf_css::Query;
use sf_dom::Document;
use sf_dom::EventKind;
use sf_dom::Listeners;
use sf_dom::NodeId;

/// Index of the visible slide in a carousel of `count` slides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarouselState {
    current: usize,
    count: usize,
}

impl CarouselState {
    /// `None` for an empty carousel.
    pub fn new(count: usize) -> Option<Self> {
        (count > 0).then_some(Self { current: 0, count })
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Moves to slide `n` taken modulo the slide count, so any integer
    /// (negative included) lands on a valid index. Returns the new index.
    pub fn show(&mut self, n: i64) -> usize {
        let count = as_i64(self.count);
        self.current = usize::try_from(n.rem_euclid(count)).unwrap_or(0);
        self.current
    }

    pub fn next(&mut self) -> usize {
        self.show(as_i64(self.current).saturating_add(1))
    }

    pub fn prev(&mut self) -> usize {
        self.show(as_i64(self.current).saturating_sub(1))
    }
}

fn as_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Next,
    Prev,
}

/// Remembers where a touch started and turns the release into a direction.
#[derive(Debug, Clone, PartialEq)]
pub struct SwipeTracker {
    start_x: Option<f64>,
    threshold: f64,
}

impl SwipeTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            start_x: None,
            threshold,
        }
    }

    pub fn touch_start(&mut self, x: f64) {
        self.start_x = Some(x);
    }

    /// Ends the gesture. Travel strictly beyond the threshold swipes: leftward
    /// (negative) goes to the next slide, rightward to the previous one. A
    /// release without a recorded start is ignored.
    pub fn touch_end(&mut self, x: f64) -> Option<SwipeDirection> {
        let start = self.start_x.take()?;
        let dx = x - start;
        if dx.abs() <= self.threshold {
            return None;
        }
        Some(if dx < 0.0 {
            SwipeDirection::Next
        } else {
            SwipeDirection::Prev
        })
    }

    pub fn cancel(&mut self) {
        self.start_x = None;
    }

    pub fn is_tracking(&self) -> bool {
        self.start_x.is_some()
    }
}

/// One enhanced viewport and the controls injected around it.
#[derive(Debug, Clone)]
pub struct Carousel {
    viewport: NodeId,
    wrap: NodeId,
    slides: Vec<NodeId>,
    prev_button: NodeId,
    next_button: NodeId,
    dots: Vec<NodeId>,
    state: CarouselState,
    swipe: SwipeTracker,
}

impl Carousel {
    pub fn viewport(&self) -> NodeId {
        self.viewport
    }

    pub fn wrap(&self) -> NodeId {
        self.wrap
    }

    pub fn slides(&self) -> &[NodeId] {
        &self.slides
    }

    pub fn prev_button(&self) -> NodeId {
        self.prev_button
    }

    pub fn next_button(&self) -> NodeId {
        self.next_button
    }

    pub fn dots(&self) -> &[NodeId] {
        &self.dots
    }

    pub fn state(&self) -> CarouselState {
        self.state
    }

    pub fn show(&mut self, doc: &mut Document, n: i64) -> FixResult<()> {
        let previous = self.state.current();
        let current = self.state.show(n);
        if let Some(slide) = self.slides.get(previous) {
            markup::set_visible(doc, *slide, false)?;
        }
        if let Some(slide) = self.slides.get(current) {
            markup::set_visible(doc, *slide, true)?;
        }
        self.sync_dots(doc)
    }

    pub fn step(&mut self, doc: &mut Document, delta: i64) -> FixResult<()> {
        let target = as_i64(self.state.current()).saturating_add(delta);
        self.show(doc, target)
    }

    pub(crate) fn touch_start(&mut self, x: f64) {
        self.swipe.touch_start(x);
    }

    pub(crate) fn touch_end(&mut self, doc: &mut Document, x: Option<f64>) -> FixResult<()> {
        let Some(x) = x else {
            self.swipe.cancel();
            return Ok(());
        };
        match self.swipe.touch_end(x) {
            Some(SwipeDirection::Next) => self.step(doc, 1),
            Some(SwipeDirection::Prev) => self.step(doc, -1),
            None => Ok(()),
        }
    }

    /// Hides every slide but the current one.
    fn render(&self, doc: &mut Document) -> FixResult<()> {
        for (index, slide) in self.slides.iter().enumerate() {
            markup::set_visible(doc, *slide, index == self.state.current())?;
        }
        self.sync_dots(doc)
    }

    fn sync_dots(&self, doc: &mut Document) -> FixResult<()> {
        for (index, dot) in self.dots.iter().enumerate() {
            doc.toggle_class(*dot, "active", index == self.state.current())?;
        }
        Ok(())
    }
}

pub(crate) fn enhance_carousels(
    doc: &mut Document,
    config: &CarouselConfig,
    listeners: &mut Listeners<Handler>,
) -> FixResult<Install<Vec<Carousel>>> {
    let viewports = doc.query_selector_all(doc.root(), ".flickity-viewport")?;
    if viewports.is_empty() {
        return Ok(Install::Skipped("no .flickity-viewport"));
    }

    let mut carousels = Vec::new();
    for viewport in viewports {
        let Some(slider) = doc.query_selector(viewport, ".flickity-slider")? else {
            tracing::debug!(%viewport, "viewport without a slider");
            continue;
        };
        let slides = doc.element_children(slider);
        if slides.len() < 2 || doc.parent(viewport).is_none() {
            tracing::debug!(%viewport, slides = slides.len(), "nothing to navigate");
            continue;
        }
        let Some(state) = CarouselState::new(slides.len()) else {
            continue;
        };

        let index = carousels.len();
        let carousel = build_controls(doc, viewport, slides, state, config.swipe_threshold)?;
        listeners.add(carousel.prev_button, EventKind::Click, Handler::CarouselStep {
            carousel: index,
            delta: -1,
        });
        listeners.add(carousel.next_button, EventKind::Click, Handler::CarouselStep {
            carousel: index,
            delta: 1,
        });
        for (slide, dot) in carousel.dots.iter().enumerate() {
            listeners.add(*dot, EventKind::Click, Handler::CarouselDot {
                carousel: index,
                slide,
            });
        }
        listeners.add(viewport, EventKind::TouchStart, Handler::CarouselTouchStart(index));
        listeners.add(viewport, EventKind::TouchEnd, Handler::CarouselTouchEnd(index));

        tracing::debug!(%viewport, slides = carousel.slides.len(), "carousel enhanced");
        carousels.push(carousel);
    }

    if carousels.is_empty() {
        return Ok(Install::Skipped("no viewport with two or more slides"));
    }
    let summary = format!("{} carousel(s)", carousels.len());
    Ok(Install::Applied {
        state: carousels,
        summary,
    })
}

fn build_controls(
    doc: &mut Document,
    viewport: NodeId,
    slides: Vec<NodeId>,
    state: CarouselState,
    swipe_threshold: f64,
) -> FixResult<Carousel> {
    let wrap = markup::element(doc, "div", "sf-carousel-wrap")?;
    doc.wrap(viewport, wrap)?;

    let prev_button = nav_button(doc, wrap, "sf-carousel-prev", "Previous slide", "\u{2039}")?;
    let next_button = nav_button(doc, wrap, "sf-carousel-next", "Next slide", "\u{203a}")?;

    let dots_bar = markup::element(doc, "div", "sf-carousel-dots")?;
    let mut dots = Vec::with_capacity(slides.len());
    for index in 0..slides.len() {
        let class = if index == 0 {
            "sf-carousel-dot active"
        } else {
            "sf-carousel-dot"
        };
        let dot = markup::append_element(doc, dots_bar, "button", class)?;
        doc.set_attr(dot, "aria-label", &format!("Go to slide {}", index.saturating_add(1)))?;
        dots.push(dot);
    }
    doc.insert_after(wrap, dots_bar)?;

    let carousel = Carousel {
        viewport,
        wrap,
        slides,
        prev_button,
        next_button,
        dots,
        state,
        swipe: SwipeTracker::new(swipe_threshold),
    };
    carousel.render(doc)?;
    Ok(carousel)
}

fn nav_button(
    doc: &mut Document,
    wrap: NodeId,
    modifier: &str,
    label: &str,
    glyph: &str,
) -> FixResult<NodeId> {
    let button = markup::append_element(doc, wrap, "button", &format!("sf-carousel-btn {modifier}"))?;
    doc.set_attr(button, "aria-label", label)?;
    markup::append_text(doc, button, glyph)?;
    Ok(button)
}
