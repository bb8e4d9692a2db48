//! Parser for combined author/affiliation blocks.
//!
//! A block is inner HTML holding an author list and an affiliation list
//! separated by a double line break (or `;` + line break). Authors carry
//! numeric superscript markers (`Jane Doe1,2`) that point at numbered
//! affiliations (`1; University A; 2; Institute B`). Markers are optional on
//! both sides.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use serde::{Deserialize, Serialize};

use super::normalize_whitespace;
use crate::domain::ExtractionResult;
use crate::infrastructure::parsing_error::{ExtractionError, ExtractionOutcome};

static BLOCK_SEPARATOR: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>\s*<br\s*/?>|;\s*<br\s*/?>"));
static AUTHOR_MARKER: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"(.*?)\s*(\d+)"));
static AFFILIATION_MARKER: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"(\d+)\s*;"));

fn pattern(compiled: &'static Lazy<Result<Regex, regex::Error>>) -> ExtractionOutcome<&'static Regex> {
    compiled
        .as_ref()
        .map_err(|e| ExtractionError::unknown(format!("author block pattern: {e}")))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorEntry {
    pub name: String,
    pub markers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffiliationEntry {
    pub marker: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorBlock {
    pub authors: Vec<AuthorEntry>,
    pub affiliations: Vec<AffiliationEntry>,
}

impl AuthorBlock {
    /// `Jane Doe 1,2; John Roe 3`
    pub fn authors_line(&self) -> String {
        self.authors
            .iter()
            .map(|author| {
                if author.markers.is_empty() {
                    author.name.clone()
                } else {
                    format!("{} {}", author.name, author.markers.join(","))
                }
            })
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// `1 University A; 2 Institute B`
    pub fn affiliations_line(&self) -> String {
        self.affiliations
            .iter()
            .map(|affiliation| match &affiliation.marker {
                Some(marker) => format!("{marker} {}", affiliation.name),
                None => affiliation.name.clone(),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Visible text of an HTML fragment, text nodes joined with `separator`.
pub fn fragment_text(html: &str, separator: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .text()
        .map(normalize_whitespace)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

fn clean_name(raw: &str) -> String {
    normalize_whitespace(raw.trim_matches(|c: char| c == ',' || c == ';' || c.is_whitespace()))
}

fn parse_authors(segment_html: &str) -> ExtractionOutcome<Vec<AuthorEntry>> {
    let text = fragment_text(segment_html, " ");
    let marker = pattern(&AUTHOR_MARKER)?;
    let mut authors: Vec<AuthorEntry> = Vec::new();
    let mut consumed = 0;

    for caps in marker.captures_iter(&text) {
        let name = clean_name(&caps[1]);
        let number = caps[2].to_string();
        if let Some(whole) = caps.get(0) {
            consumed = whole.end();
        }
        if name.is_empty() {
            // `Jane Doe1,2`: the second marker belongs to the previous author.
            if let Some(last) = authors.last_mut() {
                last.markers.push(number);
            }
            continue;
        }
        authors.push(AuthorEntry {
            name,
            markers: vec![number],
        });
    }

    authors.extend(
        text[consumed..]
            .split(',')
            .map(clean_name)
            .filter(|name| !name.is_empty())
            .map(|name| AuthorEntry {
                name,
                markers: Vec::new(),
            }),
    );
    Ok(authors)
}

fn parse_affiliations(segment_html: &str) -> ExtractionOutcome<Vec<AffiliationEntry>> {
    let text = fragment_text(segment_html, "; ");
    let marker = pattern(&AFFILIATION_MARKER)?;
    let markers: Vec<_> = marker.captures_iter(&text).collect();

    if markers.is_empty() {
        let name = clean_name(&text);
        return Ok(if name.is_empty() {
            Vec::new()
        } else {
            vec![AffiliationEntry { marker: None, name }]
        });
    }

    let mut affiliations = Vec::new();
    let leading = markers
        .first()
        .and_then(|caps| caps.get(0))
        .map_or("", |whole| &text[..whole.start()]);
    let leading = clean_name(leading);
    if !leading.is_empty() {
        affiliations.push(AffiliationEntry {
            marker: None,
            name: leading,
        });
    }

    for (index, caps) in markers.iter().enumerate() {
        let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = markers
            .get(index + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |next| next.start());
        let name = clean_name(&text[whole.end()..end]);
        if !name.is_empty() {
            affiliations.push(AffiliationEntry {
                marker: Some(number.as_str().to_string()),
                name,
            });
        }
    }
    Ok(affiliations)
}

/// Split an author/affiliation block and pair authors with their markers.
///
/// Never raises: a block without the author/affiliation separator comes back
/// as a failure carrying whatever authors could be read from the whole text.
pub fn parse_author_block(inner_html: &str) -> ExtractionResult<AuthorBlock> {
    match try_parse_author_block(inner_html) {
        Ok(result) => result,
        Err(e) => ExtractionResult::from_error(&e, AuthorBlock::default()),
    }
}

fn try_parse_author_block(inner_html: &str) -> ExtractionOutcome<ExtractionResult<AuthorBlock>> {
    let separator = pattern(&BLOCK_SEPARATOR)?;
    let mut parts = separator.splitn(inner_html, 2);
    let authors_part = parts.next().unwrap_or_default();

    let Some(affiliations_part) = parts.next() else {
        let block = AuthorBlock {
            authors: parse_authors(authors_part)?,
            ..AuthorBlock::default()
        };
        return Ok(ExtractionResult::failure(
            "No separator between authors and affiliations",
            block,
        ));
    };

    let block = AuthorBlock {
        authors: parse_authors(authors_part)?,
        affiliations: parse_affiliations(affiliations_part)?,
    };
    Ok(ExtractionResult::success(
        format!(
            "Parsed {} authors and {} affiliations",
            block.authors.len(),
            block.affiliations.len()
        ),
        block,
    ))
}
