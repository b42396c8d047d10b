use core::fmt;
use sf_core::FixError;
use sf_dom::NodeId;

/// The six routines, in boot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Routine {
    Carousel,
    PropertyFilter,
    NewsFilter,
    ContactForm,
    SearchNotice,
    NavDropdown,
}

impl Routine {
    pub const ALL: [Routine; 6] = [
        Routine::Carousel,
        Routine::PropertyFilter,
        Routine::NewsFilter,
        Routine::ContactForm,
        Routine::SearchNotice,
        Routine::NavDropdown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Carousel => "carousel",
            Self::PropertyFilter => "property-filter",
            Self::NewsFilter => "news-filter",
            Self::ContactForm => "contact-form",
            Self::SearchNotice => "search-notice",
            Self::NavDropdown => "nav-dropdown",
        }
    }
}

impl fmt::Display for Routine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The routine patched the document; the text summarizes what it touched.
    Applied(String),
    /// The markup the routine looks for is absent. Nothing was mutated.
    Skipped(&'static str),
    /// Switched off in the configuration.
    Disabled,
    /// The routine hit an error and was abandoned.
    Failed(FixError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineReport {
    pub routine: Routine,
    pub outcome: Outcome,
}

/// What `Page::boot` did, one entry per routine in boot order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootReport {
    entries: Vec<RoutineReport>,
}

impl BootReport {
    pub(crate) fn record(&mut self, routine: Routine, outcome: Outcome) {
        self.entries.push(RoutineReport { routine, outcome });
    }

    pub fn entries(&self) -> &[RoutineReport] {
        &self.entries
    }

    pub fn outcome(&self, routine: Routine) -> Option<&Outcome> {
        self.entries
            .iter()
            .find(|entry| entry.routine == routine)
            .map(|entry| &entry.outcome)
    }

    pub fn is_applied(&self, routine: Routine) -> bool {
        matches!(self.outcome(routine), Some(Outcome::Applied(_)))
    }

    pub fn applied(&self) -> impl Iterator<Item = Routine> + '_ {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.outcome, Outcome::Applied(_)))
            .map(|entry| entry.routine)
    }

    pub fn failures(&self) -> impl Iterator<Item = (Routine, &FixError)> + '_ {
        self.entries.iter().filter_map(|entry| match &entry.outcome {
            Outcome::Failed(error) => Some((entry.routine, error)),
            _ => None,
        })
    }
}

impl fmt::Display for BootReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, entry) in self.entries.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            match &entry.outcome {
                Outcome::Applied(summary) => write!(f, "{}: applied ({summary})", entry.routine)?,
                Outcome::Skipped(reason) => write!(f, "{}: skipped ({reason})", entry.routine)?,
                Outcome::Disabled => write!(f, "{}: disabled", entry.routine)?,
                Outcome::Failed(error) => write!(f, "{}: failed ({error})", entry.routine)?,
            }
        }
        Ok(())
    }
}

/// Something a routine noticed about the markup but chose to work around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub routine: Routine,
    pub node: Option<NodeId>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(routine: Routine, node: Option<NodeId>, message: impl Into<String>) -> Self {
        Self {
            routine,
            node,
            message: message.into(),
        }
    }

    /// Logs the diagnostic at `warn` and appends it to `sink`.
    pub(crate) fn emit(self, sink: &mut Vec<Diagnostic>) {
        match self.node {
            Some(node) => tracing::warn!(routine = %self.routine, %node, "{}", self.message),
            None => tracing::warn!(routine = %self.routine, "{}", self.message),
        }
        sink.push(self);
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node {
            Some(node) => write!(f, "{} at {node}: {}", self.routine, self.message),
            None => write!(f, "{}: {}", self.routine, self.message),
        }
    }
}
