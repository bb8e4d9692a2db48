//! Selector catalog: logical field name -> selector string.
//!
//! A key that is absent (or empty) means the field is not available on the
//! target site and its extractor is skipped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Logical keys understood by the traversal.
pub mod selector_keys {
    pub const SESSION_LIST: &str = "session_list";
    pub const TITLE: &str = "title";
    pub const DATE_TIME: &str = "date_time";
    pub const EVENT_TYPE: &str = "event_type";
    pub const SESSION_TYPE: &str = "session_type";
    pub const LOCATION: &str = "location";
    pub const DISEASE: &str = "disease";
    pub const SESSION_AUTHORS: &str = "session_authors";
    pub const SESSION_AFFILIATIONS: &str = "session_affiliations";
    pub const SESSION_AUTHOR_BLOCK: &str = "session_author_block";
    pub const SESSION_ABSTRACT: &str = "session_abstract";
    pub const PRESENTATION_SECTION: &str = "presentation_section";
    pub const PRESENTATION_TITLE: &str = "presentation_title";
    pub const PRESENTATION_AUTHORS: &str = "presentation_authors";
    pub const PRESENTATION_AFFILIATIONS: &str = "presentation_affiliations";
    pub const PRESENTATION_TIME: &str = "presentation_time";
    pub const PRESENTATION_LINK: &str = "presentation_link";

    /// Keys read inside each presentation section.
    pub const PRESENTATION_SCOPED: [&str; 5] = [
        PRESENTATION_TITLE,
        PRESENTATION_AUTHORS,
        PRESENTATION_AFFILIATIONS,
        PRESENTATION_TIME,
        PRESENTATION_LINK,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectorCatalog {
    entries: BTreeMap<String, String>,
}

impl SelectorCatalog {
    pub const fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, selector: &str) -> Self {
        self.insert(key, selector);
        self
    }

    pub fn without(mut self, key: &str) -> Self {
        self.entries.remove(key);
        self
    }

    pub fn insert(&mut self, key: &str, selector: &str) {
        self.entries.insert(key.to_string(), selector.to_string());
    }

    /// Selector for `key`, or `None` when the field should be skipped.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(|selector| selector.trim())
            .filter(|selector| !selector.is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Configured (non-empty) entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, selector)| (key.as_str(), selector.trim()))
            .filter(|(_, selector)| !selector.is_empty())
    }
}

impl Default for SelectorCatalog {
    fn default() -> Self {
        use selector_keys::{
            DATE_TIME, DISEASE, EVENT_TYPE, LOCATION, PRESENTATION_AFFILIATIONS,
            PRESENTATION_AUTHORS, PRESENTATION_LINK, PRESENTATION_SECTION, PRESENTATION_TIME,
            PRESENTATION_TITLE, SESSION_AFFILIATIONS, SESSION_AUTHORS, SESSION_LIST,
            SESSION_TYPE, TITLE,
        };

        Self::empty()
            .with(SESSION_LIST, ".session-card")
            .with(TITLE, "h3")
            .with(DATE_TIME, "[data-cy='time'] > span")
            .with(EVENT_TYPE, "p[data-cy='meeting'] > span > span")
            .with(SESSION_TYPE, "p[data-cy='type'] > span > span")
            .with(LOCATION, "p[data-cy='location']")
            .with(DISEASE, "p[data-cy='tracks']")
            .with(SESSION_AUTHORS, "div.col > p[data-cy='chairs'] h5.text-14")
            .with(SESSION_AFFILIATIONS, "div.col > p[data-cy='chairs'] p.text-12")
            .with(PRESENTATION_SECTION, "div[id*='presentation']")
            .with(PRESENTATION_TITLE, "h6.my-2")
            .with(PRESENTATION_AUTHORS, "h5.text-14")
            .with(PRESENTATION_AFFILIATIONS, "p.text-12")
            .with(PRESENTATION_TIME, "div.presentation-time")
            .with(PRESENTATION_LINK, "a[href]")
    }
}

#[cfg(test)]
mod tests {
    use super::selector_keys::{SESSION_ABSTRACT, SESSION_LIST, TITLE};
    use super::*;

    #[test]
    fn empty_selectors_count_as_absent() {
        let catalog = SelectorCatalog::empty().with(TITLE, "   ").with(SESSION_LIST, " .card ");
        assert_eq!(catalog.get(TITLE), None);
        assert_eq!(catalog.get(SESSION_LIST), Some(".card"));
        assert_eq!(catalog.iter().count(), 1);
    }

    #[test]
    fn defaults_cover_session_and_presentation_fields() {
        let catalog = SelectorCatalog::default();
        assert!(catalog.contains(SESSION_LIST));
        assert!(catalog.contains(selector_keys::PRESENTATION_SECTION));
        assert!(!catalog.contains(SESSION_ABSTRACT));
    }

    #[test]
    fn deserializes_from_flat_map() {
        let catalog: SelectorCatalog =
            serde_json::from_str(r#"{"session_list": "li.result", "title": "h1"}"#).unwrap();
        assert_eq!(catalog.get(SESSION_LIST), Some("li.result"));
        assert_eq!(catalog.get(TITLE), Some("h1"));
        assert!(catalog.without(TITLE).get(TITLE).is_none());
    }
}
