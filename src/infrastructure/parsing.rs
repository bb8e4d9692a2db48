//! Field extraction for program pages.
//!
//! - `config`: selector catalog (logical key -> selector)
//! - `context`: wait bounds for extractors
//! - `datetime`: time string normalization
//! - `author_block`: author/affiliation marker pairing
//! - `session_fields` / `presentation_fields`: DOM-backed extractors

pub mod author_block;
pub mod config;
pub mod context;
pub mod datetime;
pub mod presentation_fields;
pub mod session_fields;

use url::Url;

pub use author_block::{AffiliationEntry, AuthorBlock, AuthorEntry, parse_author_block};
pub use config::{SelectorCatalog, selector_keys};
pub use context::ExtractionContext;
pub use datetime::{normalize_batch, normalize_time_span, parse_presentation_time};

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove every occurrence of a field label such as "Location" and tidy the rest.
pub fn strip_label(text: &str, label: &str) -> String {
    normalize_whitespace(&text.replace(label, ""))
}

/// Resolve a possibly relative href against the page it was found on.
pub fn resolve_href(base: &str, href: &str) -> String {
    if let Ok(absolute) = Url::parse(href) {
        return absolute.to_string();
    }
    Url::parse(base)
        .and_then(|base| base.join(href))
        .map_or_else(|_| href.to_string(), |url| url.to_string())
}
