//! Where to look for jobs.
//!
//! A source is a URL plus how to read it. URLs may be templates:
//! `{query}` and `{location}` are replaced with the URL-encoded search
//! keywords and location, so one configured source can serve any query.

use crate::extract::SelectorProfile;
use crate::search::JobQuery;
use serde::{Deserialize, Serialize};
use url::Url;

/// How a source's body should be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// HTML listing or detail page: JSON-LD first, then CSS selectors.
    #[default]
    Html,
    /// RSS 2.0 or Atom feed.
    Feed,
}

/// A configured job source.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub kind: SourceKind,
    #[serde(default)]
    pub selectors: Option<SelectorProfile>,
}

impl SourceConfig {
    /// Build an ad-hoc source from a bare URL given on the command line.
    /// The host names the source; feed-looking paths are read as feeds.
    pub fn from_url(raw: &str) -> Self {
        let parsed = Url::parse(raw).ok();
        let name = parsed
            .as_ref()
            .and_then(|u| u.host_str())
            .map(|h| h.trim_start_matches("www.").to_string())
            .unwrap_or_else(|| raw.to_string());

        let path = parsed
            .as_ref()
            .map(|u| u.path().to_lowercase())
            .unwrap_or_default();
        let kind = if path.ends_with(".xml")
            || path.ends_with(".rss")
            || path.ends_with(".atom")
            || path.ends_with("/feed")
            || path.ends_with("/rss")
        {
            SourceKind::Feed
        } else {
            SourceKind::Html
        };

        Self {
            name,
            url: raw.to_string(),
            kind,
            selectors: None,
        }
    }

    /// Fill `{query}` and `{location}` placeholders from the query.
    pub fn resolve_url(&self, query: &JobQuery) -> String {
        let keywords = query.keyword_text();
        let location = query.location.as_deref().unwrap_or("");
        self.url
            .replace("{query}", &urlencoding::encode(&keywords))
            .replace("{location}", &urlencoding::encode(location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url_names_by_host() {
        let source = SourceConfig::from_url("https://www.jobs.example.com/listings?page=1");
        assert_eq!(source.name, "jobs.example.com");
        assert_eq!(source.kind, SourceKind::Html);
        assert!(source.selectors.is_none());
    }

    #[test]
    fn test_from_url_detects_feeds() {
        assert_eq!(
            SourceConfig::from_url("https://example.com/jobs.rss").kind,
            SourceKind::Feed
        );
        assert_eq!(
            SourceConfig::from_url("https://example.com/careers/feed").kind,
            SourceKind::Feed
        );
    }

    #[test]
    fn test_resolve_url_encodes_placeholders() {
        let source = SourceConfig {
            name: "board".into(),
            url: "https://jobs.example.com/search?q={query}&l={location}".into(),
            kind: SourceKind::Html,
            selectors: None,
        };
        let query = JobQuery {
            keywords: vec!["rust".into(), "c++".into()],
            location: Some("New York".into()),
            ..JobQuery::default()
        };
        assert_eq!(
            source.resolve_url(&query),
            "https://jobs.example.com/search?q=rust%20c%2B%2B&l=New%20York"
        );
    }

    #[test]
    fn test_resolve_url_without_placeholders_is_unchanged() {
        let source = SourceConfig::from_url("https://example.com/jobs");
        assert_eq!(source.resolve_url(&JobQuery::default()), "https://example.com/jobs");
    }
}
