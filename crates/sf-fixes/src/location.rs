use sf_core::FixError;
use sf_core::FixResult;
use url::Position;
use url::Url;

/// Base used to resolve bare paths; only its path component is ever read.
const PLACEHOLDER_BASE: &str = "http://static-fixes.invalid/";

/// Location of the page being patched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    href: String,
    pathname: String,
}

impl PageLocation {
    /// Accepts an absolute URL (`https://host/News?x=1`) or a bare path
    /// (`/search-results`).
    pub fn parse(input: &str) -> FixResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        let (url, relative) = match Url::parse(trimmed) {
            Ok(url) => (url, false),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let url = Url::parse(PLACEHOLDER_BASE)
                    .and_then(|base| base.join(trimmed))
                    .map_err(|error| invalid(trimmed, &error))?;
                (url, true)
            }
            Err(error) => return Err(invalid(trimmed, &error)),
        };

        if url.cannot_be_a_base() {
            return Err(FixError::new(
                "fixes.location_invalid",
                format!("`{trimmed}` has no path component"),
            ));
        }

        let href = if relative {
            url[Position::BeforePath..].to_owned()
        } else {
            url.as_str().to_owned()
        };
        Ok(Self {
            href,
            pathname: url.path().to_owned(),
        })
    }

    pub fn root() -> Self {
        Self {
            href: "/".to_owned(),
            pathname: "/".to_owned(),
        }
    }

    pub fn pathname(&self) -> &str {
        &self.pathname
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    /// Case-insensitive substring test against the path.
    pub fn path_contains(&self, marker: &str) -> bool {
        self.pathname
            .to_lowercase()
            .contains(&marker.to_lowercase())
    }
}

impl Default for PageLocation {
    fn default() -> Self {
        Self::root()
    }
}

fn invalid(input: &str, error: &url::ParseError) -> FixError {
    FixError::new(
        "fixes.location_invalid",
        format!("cannot parse page location `{input}`: {error}"),
    )
}

#[cfg(test)]
mod tests {
    use super::PageLocation;

    #[test]
    fn parses_absolute_urls_and_bare_paths() {
        let absolute =
            PageLocation::parse("https://www.example.com/Search?q=office").unwrap_or_else(|_| unreachable!());
        assert_eq!(absolute.pathname(), "/Search");

        let bare = PageLocation::parse("/News/article-1?x=1#top").unwrap_or_else(|_| unreachable!());
        assert_eq!(bare.pathname(), "/News/article-1");
        assert_eq!(bare.href(), "/News/article-1?x=1#top");

        let relative = PageLocation::parse("search-results").unwrap_or_else(|_| unreachable!());
        assert_eq!(relative.pathname(), "/search-results");
    }

    #[test]
    fn empty_input_is_the_root() {
        let location = PageLocation::parse("   ").unwrap_or_else(|_| unreachable!());
        assert_eq!(location.pathname(), "/");
    }

    #[test]
    fn marker_match_ignores_case() {
        let location = PageLocation::parse("/SEARCH-results").unwrap_or_else(|_| unreachable!());
        assert!(location.path_contains("/search"));
        let other = PageLocation::parse("/research").unwrap_or_else(|_| unreachable!());
        assert!(!other.path_contains("/search"));
    }

    #[test]
    fn rejects_paths_without_hierarchy() {
        let error = PageLocation::parse("mailto:someone@example.com")
            .err()
            .unwrap_or_else(|| unreachable!());
        assert_eq!(error.code, "fixes.location_invalid");
    }
}
