//! Session-level field extractors.
//!
//! Each extractor reads one logical field from the open detail view and
//! returns an [`ExtractionResult`]; none of them propagate errors, so a
//! missing field never aborts the item.

use std::time::Duration;

use tracing::debug;

use super::author_block::{AuthorBlock, fragment_text, parse_author_block};
use super::datetime::normalize_time_span;
use super::{normalize_whitespace, strip_label};
use crate::domain::{ExtractionResult, TimeSpan};
use crate::infrastructure::dom::DomAccessor;
use crate::infrastructure::parsing_error::ExtractionOutcome;

/// Text of every node matching `selector`, waiting up to `timeout` for the first.
pub async fn collect_texts<A: DomAccessor>(
    accessor: &mut A,
    selector: &str,
    timeout: Duration,
) -> ExtractionOutcome<Vec<String>> {
    let nodes = accessor.wait_present_all(selector, timeout).await?;
    let mut texts = Vec::with_capacity(nodes.len());
    for node in &nodes {
        texts.push(accessor.text(node).await?);
    }
    Ok(texts)
}

async fn first_text<A: DomAccessor>(
    accessor: &mut A,
    selector: &str,
    timeout: Duration,
) -> ExtractionOutcome<String> {
    let node = accessor.wait_present(selector, timeout).await?;
    accessor.text(&node).await
}

async fn first_inner_html<A: DomAccessor>(
    accessor: &mut A,
    selector: &str,
    timeout: Duration,
) -> ExtractionOutcome<String> {
    let node = accessor.wait_present(selector, timeout).await?;
    accessor.inner_html(&node).await
}

pub async fn extract_texts<A: DomAccessor>(
    accessor: &mut A,
    selector: &str,
    timeout: Duration,
) -> ExtractionResult<Vec<String>> {
    match collect_texts(accessor, selector, timeout).await {
        Ok(texts) => ExtractionResult::success(format!("{} elements", texts.len()), texts),
        Err(e) => {
            debug!("No text for '{}': {}", selector, e);
            ExtractionResult::from_error(&e, Vec::new())
        }
    }
}

pub async fn extract_event_types<A: DomAccessor>(
    accessor: &mut A,
    selector: &str,
    timeout: Duration,
) -> ExtractionResult<Vec<String>> {
    extract_texts(accessor, selector, timeout).await
}

pub async fn extract_session_types<A: DomAccessor>(
    accessor: &mut A,
    selector: &str,
    timeout: Duration,
) -> ExtractionResult<Vec<String>> {
    extract_texts(accessor, selector, timeout).await
}

/// Locations with the leading "Location" label removed.
pub async fn extract_locations<A: DomAccessor>(
    accessor: &mut A,
    selector: &str,
    timeout: Duration,
) -> ExtractionResult<Vec<String>> {
    extract_texts(accessor, selector, timeout)
        .await
        .map(|texts| texts.iter().map(|text| strip_label(text, "Location")).collect())
}

/// Disease tracks with the "Track" label removed.
pub async fn extract_diseases<A: DomAccessor>(
    accessor: &mut A,
    selector: &str,
    timeout: Duration,
) -> ExtractionResult<Vec<String>> {
    extract_texts(accessor, selector, timeout)
        .await
        .map(|texts| texts.iter().map(|text| strip_label(text, "Track")).collect())
}

/// Text of the first matching node.
pub async fn extract_title<A: DomAccessor>(
    accessor: &mut A,
    selector: &str,
    timeout: Duration,
) -> ExtractionResult<String> {
    match first_text(accessor, selector, timeout).await {
        Ok(title) => ExtractionResult::success("title found", title),
        Err(e) => ExtractionResult::from_error(&e, String::new()),
    }
}

/// Non-empty texts joined with `"; "` (authors, affiliations).
pub async fn extract_joined_texts<A: DomAccessor>(
    accessor: &mut A,
    selector: &str,
    timeout: Duration,
) -> ExtractionResult<String> {
    extract_texts(accessor, selector, timeout).await.map(|texts| {
        texts
            .into_iter()
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("; ")
    })
}

/// Normalized time spans, one per matching node.
///
/// A node whose text cannot be read degrades to an empty unparsed span; the
/// other nodes are still normalized.
pub async fn extract_time_spans<A: DomAccessor>(
    accessor: &mut A,
    selector: &str,
    timeout: Duration,
) -> ExtractionResult<Vec<TimeSpan>> {
    let nodes = match accessor.wait_present_all(selector, timeout).await {
        Ok(nodes) => nodes,
        Err(e) => return ExtractionResult::from_error(&e, Vec::new()),
    };

    let mut spans = Vec::with_capacity(nodes.len());
    for node in &nodes {
        let span = match accessor.text(node).await {
            Ok(text) => normalize_time_span(&text),
            Err(e) => {
                debug!("Time text unreadable: {}", e);
                TimeSpan::default()
            }
        };
        spans.push(span);
    }
    let parsed = spans.iter().filter(|span| span.is_parsed()).count();
    ExtractionResult::success(format!("{parsed}/{} time spans parsed", spans.len()), spans)
}

/// Author/affiliation block read from the node's inner HTML.
pub async fn extract_author_block<A: DomAccessor>(
    accessor: &mut A,
    selector: &str,
    timeout: Duration,
) -> ExtractionResult<AuthorBlock> {
    match first_inner_html(accessor, selector, timeout).await {
        Ok(html) => parse_author_block(&html),
        Err(e) => ExtractionResult::from_error(&e, AuthorBlock::default()),
    }
}

/// Plain text of an abstract with whitespace collapsed.
pub async fn extract_abstract<A: DomAccessor>(
    accessor: &mut A,
    selector: &str,
    timeout: Duration,
) -> ExtractionResult<String> {
    let html = first_inner_html(accessor, selector, timeout).await;
    match html.map(|html| normalize_whitespace(&fragment_text(&html, " "))) {
        Ok(text) if !text.is_empty() => ExtractionResult::success("abstract found", text),
        Ok(_) => ExtractionResult::failure("abstract is empty", String::new()),
        Err(e) => ExtractionResult::from_error(&e, String::new()),
    }
}
