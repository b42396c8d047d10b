//! Event scripts: one user action per line, replayed against a booted page.
//!
//! ```text
//! # open the first submenu, then filter offices in NSW
//! click .nav-item .nav-link-wrapper
//! check #types input[value="Office"]
//! check #states input[value="NSW"]
//! swipe .flickity-viewport -60
//! submit form[novalidate]
//! ```
//!
//! Each action targets the first element matching its selector.

use sf_core::FixError;
use sf_core::FixResult;
use sf_dom::NodeId;
use sf_fixes::Page;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Click(String),
    Check(String),
    Uncheck(String),
    Submit(String),
    /// Horizontal touch drag of `dx` units over the target.
    Swipe { selector: String, dx: f64 },
}

impl Action {
    fn selector(&self) -> &str {
        match self {
            Self::Click(selector)
            | Self::Check(selector)
            | Self::Uncheck(selector)
            | Self::Submit(selector)
            | Self::Swipe { selector, .. } => selector,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// 1-based line in the script source.
    pub line: usize,
    pub action: Action,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    steps: Vec<Step>,
}

impl Script {
    pub fn parse(input: &str) -> FixResult<Self> {
        let mut steps = Vec::new();
        for (index, raw) in input.lines().enumerate() {
            let line = index.saturating_add(1);
            let text = raw.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            steps.push(Step {
                line,
                action: parse_action(text).map_err(|message| script_error(line, message))?,
            });
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Runs every step in order and returns how many ran. Stops at the first
    /// step whose target is missing or whose event fails.
    pub fn replay(&self, page: &mut Page) -> FixResult<usize> {
        for step in &self.steps {
            let target = resolve(page, step)?;
            tracing::debug!(line = step.line, action = ?step.action, %target, "replaying");
            perform(page, &step.action, target)
                .map_err(|error| FixError::new(error.code, format!("line {}: {}", step.line, error.message)))?;
        }
        Ok(self.steps.len())
    }
}

fn parse_action(text: &str) -> Result<Action, String> {
    let (verb, rest) = text
        .split_once(char::is_whitespace)
        .map_or((text, ""), |(verb, rest)| (verb, rest.trim()));
    if rest.is_empty() {
        return Err(format!("`{verb}` needs a selector"));
    }

    let selector = rest.to_owned();
    match verb.to_ascii_lowercase().as_str() {
        "click" => Ok(Action::Click(selector)),
        "check" => Ok(Action::Check(selector)),
        "uncheck" => Ok(Action::Uncheck(selector)),
        "submit" => Ok(Action::Submit(selector)),
        "swipe" => {
            let Some((selector, dx)) = rest.rsplit_once(char::is_whitespace) else {
                return Err("`swipe` needs a selector and a distance".to_owned());
            };
            let dx = dx
                .parse::<f64>()
                .ok()
                .filter(|dx| dx.is_finite())
                .ok_or_else(|| format!("swipe distance `{dx}` is not a number"))?;
            Ok(Action::Swipe {
                selector: selector.trim().to_owned(),
                dx,
            })
        }
        other => Err(format!("unknown action `{other}`")),
    }
}

fn resolve(page: &Page, step: &Step) -> FixResult<NodeId> {
    let selector = step.action.selector();
    page.query(selector)
        .map_err(|error| script_error(step.line, error.to_string()))?
        .ok_or_else(|| {
            FixError::new(
                "cli.script_target_missing",
                format!("line {}: nothing matches `{selector}`", step.line),
            )
        })
}

fn perform(page: &mut Page, action: &Action, target: NodeId) -> FixResult<()> {
    match action {
        Action::Click(_) => page.click(target).map(drop),
        Action::Check(_) => page.check(target, true).map(drop),
        Action::Uncheck(_) => page.check(target, false).map(drop),
        Action::Submit(_) => page.submit(target).map(drop),
        Action::Swipe { dx, .. } => page.swipe(target, *dx),
    }
}

fn script_error(line: usize, message: impl Into<String>) -> FixError {
    FixError::new("cli.script_invalid", format!("line {line}: {}", message.into()))
}
