use crate::FixesConfig;
use crate::Handler;
use crate::Install;
use crate::PageLocation;
use crate::carousel;
use crate::carousel::Carousel;
use crate::contact_form;
use crate::contact_form::ContactForm;
use crate::nav_dropdown;
use crate::nav_dropdown::NavDropdowns;
use crate::news_filter;
use crate::news_filter::NewsFilter;
use crate::property_filter;
use crate::property_filter::PropertyFilter;
use crate::report::BootReport;
use crate::report::Diagnostic;
use crate::report::Outcome;
use crate::report::Routine;
use crate::search_notice;
use sf_core::FixError;
use sf_core::FixResult;
use sf_css::Query;
use sf_dom::Document;
use sf_dom::DomEvent;
use sf_dom::EventKind;
use sf_dom::Listeners;
use sf_dom::NodeId;
use sf_html::HtmlParser;

/// `document.readyState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

/// A document plus the fixes applied to it.
#[derive(Debug)]
pub struct Page {
    document: Document,
    location: PageLocation,
    config: FixesConfig,
    ready_state: ReadyState,
    boot_pending: bool,
    report: Option<BootReport>,
    listeners: Listeners<Handler>,
    carousels: Vec<Carousel>,
    property_filter: Option<PropertyFilter>,
    news_filter: Option<NewsFilter>,
    contact_form: Option<ContactForm>,
    search_notice: Option<NodeId>,
    nav_dropdowns: Option<NavDropdowns>,
    diagnostics: Vec<Diagnostic>,
    submissions: Vec<NodeId>,
}

impl Page {
    /// Wraps an already parsed document. The page starts out `Complete`.
    pub fn new(document: Document, location: PageLocation, config: FixesConfig) -> Self {
        Self {
            document,
            location,
            config,
            ready_state: ReadyState::Complete,
            boot_pending: false,
            report: None,
            listeners: Listeners::new(),
            carousels: Vec::new(),
            property_filter: None,
            news_filter: None,
            contact_form: None,
            search_notice: None,
            nav_dropdowns: None,
            diagnostics: Vec::new(),
            submissions: Vec::new(),
        }
    }

    pub fn from_html(html: &str, location: PageLocation, config: FixesConfig) -> Self {
        Self::new(HtmlParser.parse(html), location, config)
    }

    pub fn with_ready_state(mut self, ready_state: ReadyState) -> Self {
        self.ready_state = ready_state;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn location(&self) -> &PageLocation {
        &self.location
    }

    pub fn config(&self) -> &FixesConfig {
        &self.config
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    pub fn report(&self) -> Option<&BootReport> {
        self.report.as_ref()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Forms whose submission went through without being prevented.
    pub fn submissions(&self) -> &[NodeId] {
        &self.submissions
    }

    pub fn carousels(&self) -> &[Carousel] {
        &self.carousels
    }

    pub fn property_filter(&self) -> Option<&PropertyFilter> {
        self.property_filter.as_ref()
    }

    pub fn news_filter(&self) -> Option<&NewsFilter> {
        self.news_filter.as_ref()
    }

    pub fn contact_form(&self) -> Option<&ContactForm> {
        self.contact_form.as_ref()
    }

    pub fn search_notice(&self) -> Option<NodeId> {
        self.search_notice
    }

    pub fn nav_dropdowns(&self) -> Option<&NavDropdowns> {
        self.nav_dropdowns.as_ref()
    }

    /// First element in the document matching `selector`.
    pub fn query(&self, selector: &str) -> FixResult<Option<NodeId>> {
        self.document.query_selector(self.document.root(), selector)
    }

    pub fn query_all(&self, selector: &str) -> FixResult<Vec<NodeId>> {
        self.document
            .query_selector_all(self.document.root(), selector)
    }

    pub fn to_html(&self) -> String {
        sf_html::serialize_document(&self.document)
    }

    // ---- boot -------------------------------------------------------------

    /// Runs every enabled routine once, in order. A routine that fails is
    /// logged and recorded; the rest still run. Booting again returns the
    /// first report without touching the document.
    pub fn boot(&mut self) -> &BootReport {
        if self.report.is_none() {
            let report = self.run_routines();
            self.report = Some(report);
        }
        self.report.get_or_insert_with(BootReport::default)
    }

    /// Boots now unless the document is still loading, in which case boot
    /// waits for [`Page::finish_loading`].
    pub fn boot_when_ready(&mut self) -> Option<&BootReport> {
        if self.ready_state == ReadyState::Loading {
            tracing::debug!("document still loading; boot deferred");
            self.boot_pending = true;
            return None;
        }
        Some(self.boot())
    }

    /// Moves a loading document to `Interactive` and runs a deferred boot.
    pub fn finish_loading(&mut self) -> Option<&BootReport> {
        if self.ready_state != ReadyState::Loading {
            return None;
        }
        self.ready_state = ReadyState::Interactive;
        if !self.boot_pending {
            return None;
        }
        self.boot_pending = false;
        Some(self.boot())
    }

    fn run_routines(&mut self) -> BootReport {
        let mut report = BootReport::default();
        for routine in Routine::ALL {
            let outcome = if !self.is_enabled(routine) {
                Outcome::Disabled
            } else {
                match self.with_pending_listeners(|page, listeners| page.install(routine, listeners)) {
                    Ok(outcome) => outcome,
                    Err(error) => {
                        tracing::warn!(%routine, code = error.code, "routine failed: {error}");
                        Outcome::Failed(error)
                    }
                }
            };
            match &outcome {
                Outcome::Applied(summary) => tracing::debug!(%routine, "applied: {summary}"),
                Outcome::Skipped(reason) => tracing::debug!(%routine, "skipped: {reason}"),
                Outcome::Disabled => tracing::debug!(%routine, "disabled"),
                Outcome::Failed(_) => {}
            }
            report.record(routine, outcome);
        }
        report
    }

    fn is_enabled(&self, routine: Routine) -> bool {
        match routine {
            Routine::Carousel => self.config.carousel.enabled,
            Routine::PropertyFilter => self.config.property_filter.enabled,
            Routine::NewsFilter => self.config.news_filter.enabled,
            Routine::ContactForm => self.config.contact_form.enabled,
            Routine::SearchNotice => self.config.search_notice.enabled,
            Routine::NavDropdown => self.config.nav_dropdown.enabled,
        }
    }

    /// Runs an installer against a scratch listener table that is merged into
    /// the page only when the installer succeeds. Nodes it inserted before
    /// failing stay in the document, inert.
    pub(crate) fn with_pending_listeners<T>(
        &mut self,
        install: impl FnOnce(&mut Self, &mut Listeners<Handler>) -> FixResult<T>,
    ) -> FixResult<T> {
        let mut pending = Listeners::new();
        let installed = install(self, &mut pending)?;
        self.listeners.append(&mut pending);
        Ok(installed)
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn install(&mut self, routine: Routine, listeners: &mut Listeners<Handler>) -> FixResult<Outcome> {
        let doc = &mut self.document;
        let config = &self.config;
        let outcome = match routine {
            Routine::Carousel => keep(
                carousel::enhance_carousels(doc, &config.carousel, listeners)?,
                &mut self.carousels,
            ),
            Routine::PropertyFilter => keep_some(
                property_filter::install(
                    doc,
                    &config.property_filter,
                    listeners,
                    &mut self.diagnostics,
                )?,
                &mut self.property_filter,
            ),
            Routine::NewsFilter => keep_some(
                news_filter::install(doc, listeners)?,
                &mut self.news_filter,
            ),
            Routine::ContactForm => keep_some(
                contact_form::install(doc, &config.contact_form, listeners)?,
                &mut self.contact_form,
            ),
            Routine::SearchNotice => keep_some(
                search_notice::install(doc, &self.location, &config.search_notice)?,
                &mut self.search_notice,
            ),
            Routine::NavDropdown => keep_some(
                nav_dropdown::install(doc, listeners)?,
                &mut self.nav_dropdowns,
            ),
        };
        Ok(outcome)
    }

    // ---- events -----------------------------------------------------------

    /// Dispatches `event` at its target and bubbles it to the document root,
    /// running matching listeners in registration order at each node until
    /// propagation is stopped. The path is fixed before any handler runs.
    pub fn dispatch(&mut self, mut event: DomEvent) -> FixResult<DomEvent> {
        self.ensure_node(event.target)?;
        tracing::trace!(kind = event.kind.as_str(), target = %event.target, "dispatch");

        for node in self.document.event_path(event.target) {
            event.current_target = node;
            for handler in self.listeners.handlers(node, event.kind) {
                self.run_handler(handler, &mut event)?;
            }
            if event.is_propagation_stopped() {
                break;
            }
        }
        Ok(event)
    }

    fn run_handler(&mut self, handler: Handler, event: &mut DomEvent) -> FixResult<()> {
        let doc = &mut self.document;
        match handler {
            Handler::CarouselStep { carousel, delta } => match self.carousels.get_mut(carousel) {
                Some(carousel) => carousel.step(doc, delta),
                None => Ok(()),
            },
            Handler::CarouselDot { carousel, slide } => match self.carousels.get_mut(carousel) {
                Some(carousel) => carousel.show(doc, i64::try_from(slide).unwrap_or(i64::MAX)),
                None => Ok(()),
            },
            Handler::CarouselTouchStart(carousel) => {
                if let (Some(carousel), Some(x)) = (self.carousels.get_mut(carousel), event.client_x) {
                    carousel.touch_start(x);
                }
                Ok(())
            }
            Handler::CarouselTouchEnd(carousel) => match self.carousels.get_mut(carousel) {
                Some(carousel) => carousel.touch_end(doc, event.client_x),
                None => Ok(()),
            },
            Handler::FacetChange { kind, is_all } => match &self.property_filter {
                Some(filter) => filter.on_change(doc, event.current_target, kind, is_all),
                None => Ok(()),
            },
            Handler::NewsBarClick => match &mut self.news_filter {
                Some(filter) => filter.on_click(doc, event.target),
                None => Ok(()),
            },
            Handler::ContactSubmit => match &mut self.contact_form {
                Some(form) => form.on_submit(doc, event),
                None => Ok(()),
            },
            Handler::NavToggle(menu) => match &mut self.nav_dropdowns {
                Some(nav) => nav.on_toggle(doc, menu, event),
                None => Ok(()),
            },
            Handler::NavCloseAll => match &mut self.nav_dropdowns {
                Some(nav) => nav.on_document_click(doc),
                None => Ok(()),
            },
        }
    }

    /// Simulates a user click. Checkboxes toggle first (radios check) and
    /// fire `change` when the click is not cancelled; a click on a submit
    /// button submits its form.
    pub fn click(&mut self, target: NodeId) -> FixResult<DomEvent> {
        self.ensure_node(target)?;
        let checkable = self.document.is_checkable(target);
        let previous = self.document.is_checked(target);
        if checkable {
            let is_radio = self
                .document
                .attr(target, "type")
                .is_some_and(|kind| kind.eq_ignore_ascii_case("radio"));
            self.document.set_checked(target, is_radio || !previous)?;
        }

        let event = self.dispatch(DomEvent::new(EventKind::Click, target))?;

        if checkable {
            if event.is_default_prevented() {
                self.document.set_checked(target, previous)?;
            } else if self.document.is_checked(target) != previous {
                self.dispatch(DomEvent::new(EventKind::Change, target))?;
            }
        } else if !event.is_default_prevented() {
            if let Some(form) = self.submitted_form(target)? {
                self.submit(form)?;
            }
        }
        Ok(event)
    }

    /// Clicks a checkbox if its state differs from `checked`. Returns whether
    /// anything happened.
    pub fn check(&mut self, target: NodeId, checked: bool) -> FixResult<bool> {
        self.ensure_node(target)?;
        if !self.document.is_checkable(target) {
            return Err(FixError::new(
                "fixes.not_checkable",
                format!("{target} is not a checkbox or radio input"),
            ));
        }
        if self.document.is_checked(target) == checked {
            return Ok(false);
        }
        self.click(target)?;
        Ok(true)
    }

    /// Fires `submit` at `form`; an unprevented submission is recorded.
    pub fn submit(&mut self, form: NodeId) -> FixResult<DomEvent> {
        self.ensure_node(form)?;
        if self.document.tag_name(form) != Some("form") {
            return Err(FixError::new(
                "fixes.not_a_form",
                format!("{form} is not a form element"),
            ));
        }
        let event = self.dispatch(DomEvent::new(EventKind::Submit, form))?;
        if !event.is_default_prevented() {
            tracing::info!(%form, "form submitted");
            self.submissions.push(form);
        }
        Ok(event)
    }

    pub fn touch_start(&mut self, target: NodeId, x: f64) -> FixResult<DomEvent> {
        self.dispatch(DomEvent::new(EventKind::TouchStart, target).with_client_x(x))
    }

    pub fn touch_end(&mut self, target: NodeId, x: f64) -> FixResult<DomEvent> {
        self.dispatch(DomEvent::new(EventKind::TouchEnd, target).with_client_x(x))
    }

    /// A touch that starts at x = 0 and ends at `dx`.
    pub fn swipe(&mut self, target: NodeId, dx: f64) -> FixResult<()> {
        self.touch_start(target, 0.0)?;
        self.touch_end(target, dx)?;
        Ok(())
    }

    /// The form a click on `target` would submit, if `target` sits in a
    /// submit button.
    fn submitted_form(&self, target: NodeId) -> FixResult<Option<NodeId>> {
        let doc = &self.document;
        let Some(control) = doc.closest(target, "button, input")? else {
            return Ok(None);
        };
        let kind = doc.attr(control, "type").map(str::to_ascii_lowercase);
        let submits = match doc.tag_name(control) {
            Some("button") => kind.as_deref().is_none_or(|kind| kind == "submit"),
            Some("input") => kind.as_deref() == Some("submit"),
            _ => false,
        };
        if !submits {
            return Ok(None);
        }
        doc.closest(control, "form")
    }

    fn ensure_node(&self, id: NodeId) -> FixResult<()> {
        if self.document.kind(id).is_none() {
            return Err(FixError::new(
                "fixes.unknown_node",
                format!("{id} does not belong to this page"),
            ));
        }
        Ok(())
    }
}

fn keep<T>(install: Install<T>, slot: &mut T) -> Outcome {
    match install {
        Install::Applied { state, summary } => {
            *slot = state;
            Outcome::Applied(summary)
        }
        Install::Skipped(reason) => Outcome::Skipped(reason),
    }
}

fn keep_some<T>(install: Install<T>, slot: &mut Option<T>) -> Outcome {
    match install {
        Install::Applied { state, summary } => {
            *slot = Some(state);
            Outcome::Applied(summary)
        }
        Install::Skipped(reason) => Outcome::Skipped(reason),
    }
}
