//! Routine switches and the site constants each routine relies on.
//!
//! Every field has a default reproducing the markup of the site the fixes were
//! written for, so an empty TOML document is a complete configuration.

use serde::Deserialize;
use serde::Serialize;
use sf_core::FixError;
use sf_core::FixResult;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixesConfig {
    pub carousel: CarouselConfig,
    pub property_filter: PropertyFilterConfig,
    pub news_filter: NewsFilterConfig,
    pub contact_form: ContactFormConfig,
    pub search_notice: SearchNoticeConfig,
    pub nav_dropdown: NavDropdownConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CarouselConfig {
    pub enabled: bool,
    /// Horizontal travel a swipe must exceed before it changes slides.
    pub swipe_threshold: f64,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            swipe_threshold: 40.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PropertyFilterConfig {
    pub enabled: bool,
    pub type_vocabulary: Vec<String>,
    pub state_vocabulary: Vec<String>,
    /// Attribute that marks a `.filter-items` container as `type` or `state`.
    pub facet_attribute: String,
}

impl Default for PropertyFilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            type_vocabulary: to_strings(&["Retail", "Office", "Hotel", "Civic"]),
            state_vocabulary: to_strings(&["ACT", "NSW", "QLD", "VIC"]),
            facet_attribute: "data-sf-facet".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NewsFilterConfig {
    pub enabled: bool,
}

impl Default for NewsFilterConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContactFormConfig {
    pub enabled: bool,
    pub email: String,
}

impl Default for ContactFormConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            email: "enquiries@qicre.com".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchNoticeConfig {
    pub enabled: bool,
    /// Case-insensitive substring of the path that identifies the search route.
    pub path_marker: String,
    pub links: Vec<BrowseLink>,
}

impl Default for SearchNoticeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path_marker: "/search".to_owned(),
            links: [
                ("/Properties", "Browse Properties"),
                ("/News", "Browse News"),
                ("/ESG/ESG-overview", "ESG Reports"),
                ("/Brand_iQ", "Brand iQ"),
                ("/Contact-Us", "Contact Us"),
            ]
            .into_iter()
            .map(|(href, label)| BrowseLink {
                href: href.to_owned(),
                label: label.to_owned(),
            })
            .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrowseLink {
    pub href: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NavDropdownConfig {
    pub enabled: bool,
}

impl Default for NavDropdownConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl FixesConfig {
    /// Parses and validates a TOML document. Missing sections and fields take
    /// their defaults.
    pub fn from_toml_str(input: &str) -> FixResult<Self> {
        let config: Self = toml::from_str(input)
            .map_err(|error| FixError::new("fixes.config_parse", error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> FixResult<String> {
        toml::to_string_pretty(self).map_err(serialize_error)
    }

    pub fn validate(&self) -> FixResult<()> {
        let threshold = self.carousel.swipe_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(invalid(format!(
                "carousel.swipe_threshold must be a finite, non-negative number (got {threshold})"
            )));
        }

        let filter = &self.property_filter;
        check_vocabulary("property_filter.type_vocabulary", &filter.type_vocabulary)?;
        check_vocabulary("property_filter.state_vocabulary", &filter.state_vocabulary)?;
        if let Some(shared) = filter
            .type_vocabulary
            .iter()
            .find(|value| filter.state_vocabulary.contains(value))
        {
            return Err(invalid(format!(
                "`{shared}` appears in both property_filter vocabularies"
            )));
        }
        if !is_attribute_name(&filter.facet_attribute) {
            return Err(invalid(format!(
                "property_filter.facet_attribute `{}` is not a lowercase attribute name",
                filter.facet_attribute
            )));
        }

        let email = self.contact_form.email.as_str();
        let well_formed = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty())
            && !email
                .chars()
                .any(|ch| ch.is_whitespace() || matches!(ch, '"' | '<' | '>' | '\''));
        if !well_formed {
            return Err(invalid(format!("contact_form.email `{email}` is not an address")));
        }

        let search = &self.search_notice;
        if search.path_marker.trim().is_empty() {
            return Err(invalid("search_notice.path_marker must not be empty"));
        }
        for link in &search.links {
            if link.href.trim().is_empty() || link.label.trim().is_empty() {
                return Err(invalid(
                    "search_notice.links entries need a non-empty href and label",
                ));
            }
        }

        Ok(())
    }
}

fn check_vocabulary(field: &str, values: &[String]) -> FixResult<()> {
    if values.is_empty() {
        return Err(invalid(format!("{field} must list at least one value")));
    }
    if values.iter().any(|value| value.trim().is_empty()) {
        return Err(invalid(format!("{field} contains an empty value")));
    }
    if values.iter().any(|value| value == "All") {
        return Err(invalid(format!("{field} must not contain the reserved value `All`")));
    }
    Ok(())
}

fn is_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit() || matches!(byte, b'-' | b'_'))
}

fn invalid(message: impl Into<String>) -> FixError {
    FixError::new("fixes.config_invalid", message)
}

fn serialize_error(error: impl std::fmt::Display) -> FixError {
    FixError::new("fixes.config_serialize", error.to_string())
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}
