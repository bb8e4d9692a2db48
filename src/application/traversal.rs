//! Two-level walk over the program: session list, session detail, nested
//! presentations.
//!
//! The controller owns the accessor for the whole run. Every loop iteration
//! re-queries the session list, since any handle obtained before a
//! navigation is stale once the list page is shown again. Per-item failures
//! skip the item; navigation and unknown failures end the run, and the rows
//! collected so far are still returned.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use super::validated_config::{ConfigError, ValidatedTraversalConfig};
use crate::domain::placeholders::{NO_AFFILIATIONS, NO_AUTHORS, NO_TITLE};
use crate::domain::{ExtractionResult, PresentationFields, ProgramTable, SessionFields, TimeSpan};
use crate::infrastructure::dom::DomAccessor;
use crate::infrastructure::parsing::presentation_fields::{
    count_sections, extract_section_links, extract_section_texts, extract_section_times,
    extract_section_titles,
};
use crate::infrastructure::parsing::session_fields::{
    extract_abstract, extract_author_block, extract_diseases, extract_event_types,
    extract_joined_texts, extract_locations, extract_session_types, extract_time_spans,
    extract_title,
};
use crate::infrastructure::parsing::{ExtractionContext, SelectorCatalog, resolve_href, selector_keys};
use crate::infrastructure::parsing_error::{ExtractionError, ExtractionOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TraversalState {
    ListView,
    ItemOpen,
    PresentationScan,
    Finished,
}

/// Why the walk stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Termination {
    /// Every index in the configured range was visited.
    ScanCompleted,
    /// The list had fewer items than the next index.
    ListExhausted { index: usize, available: usize },
    /// The initial session list never appeared.
    ListUnavailable { reason: String },
    Cancelled { next_index: usize },
    /// Graceful shutdown after an unrecoverable error.
    Fatal { error: String },
}

impl Termination {
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TraversalStats {
    pub items_opened: usize,
    pub items_skipped: usize,
    pub session_rows: usize,
    pub presentation_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraversalReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub termination: Termination,
    pub stats: TraversalStats,
    pub table: ProgramTable,
}

enum ItemOutcome {
    Completed { presentations: usize },
    Skipped { reason: String },
    ListExhausted { available: usize },
}

pub struct TraversalController<A: DomAccessor> {
    accessor: A,
    config: ValidatedTraversalConfig,
    list_selector: String,
    table: ProgramTable,
    stats: TraversalStats,
    state: TraversalState,
    run_id: Uuid,
}

impl<A: DomAccessor> TraversalController<A> {
    /// Takes ownership of the accessor after vetting every configured selector against it.
    pub fn new(accessor: A, config: ValidatedTraversalConfig) -> Result<Self, ConfigError> {
        config.check_selectors(&accessor)?;
        let list_selector = config
            .selectors
            .get(selector_keys::SESSION_LIST)
            .map(str::to_string)
            .ok_or(ConfigError::MissingSelector {
                key: selector_keys::SESSION_LIST,
            })?;

        Ok(Self {
            accessor,
            config,
            list_selector,
            table: ProgramTable::new(),
            stats: TraversalStats::default(),
            state: TraversalState::ListView,
            run_id: Uuid::new_v4(),
        })
    }

    pub const fn state(&self) -> TraversalState {
        self.state
    }

    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Walk the configured item range, then close the accessor.
    ///
    /// Never fails: the report always carries the rows gathered before the
    /// walk ended, whatever the reason.
    pub async fn run(mut self, cancel: CancellationToken) -> TraversalReport {
        let started_at = Utc::now();
        let span = info_span!("traversal", run_id = %self.run_id);
        let termination = self.walk(&cancel).instrument(span).await;

        self.state = TraversalState::Finished;
        if let Err(e) = self.accessor.close().await {
            warn!("Failed to close document session: {}", e);
        }

        match &termination {
            Termination::Fatal { error } => error!("💥 Traversal aborted: {}", error),
            other => info!("🏁 Traversal finished: {:?}", other),
        }
        info!(
            "📊 opened={} skipped={} session_rows={} presentation_rows={}",
            self.stats.items_opened,
            self.stats.items_skipped,
            self.stats.session_rows,
            self.stats.presentation_rows
        );

        TraversalReport {
            run_id: self.run_id,
            started_at,
            finished_at: Utc::now(),
            termination,
            stats: self.stats,
            table: self.table,
        }
    }

    async fn walk(&mut self, cancel: &CancellationToken) -> Termination {
        self.config.log_config();

        if let Some(url) = self.config.start_url.clone() {
            info!("🌐 Opening {}", url);
            if let Err(e) = self.accessor.navigate_to(&url).await {
                return Termination::Fatal {
                    error: e.to_string(),
                };
            }
        }

        match self
            .accessor
            .wait_present_all(&self.list_selector, self.config.list_timeout)
            .await
        {
            Ok(items) => info!("📋 Session list ready with {} items", items.len()),
            Err(e) if e.is_recoverable() => {
                warn!("Session list never appeared: {}", e);
                return Termination::ListUnavailable {
                    reason: e.to_string(),
                };
            }
            Err(e) => {
                return Termination::Fatal {
                    error: e.to_string(),
                };
            }
        }

        for index in self.config.start_index..self.config.end_index() {
            if cancel.is_cancelled() {
                info!("🛑 Cancellation requested before item {}", index);
                return Termination::Cancelled { next_index: index };
            }

            match self.process_item(index).await {
                Ok(ItemOutcome::Completed { presentations }) => {
                    debug!("Item {} done with {} presentations", index, presentations);
                }
                Ok(ItemOutcome::Skipped { reason }) => {
                    self.stats.items_skipped += 1;
                    warn!("⏭️ Skipping item {}: {}", index, reason);
                }
                Ok(ItemOutcome::ListExhausted { available }) => {
                    info!("List exhausted at index {} ({} items)", index, available);
                    return Termination::ListExhausted { index, available };
                }
                Err(e) if e.is_recoverable() => {
                    self.stats.items_skipped += 1;
                    warn!("⏭️ Skipping item {}: {}", index, e);
                }
                Err(e) => {
                    return Termination::Fatal {
                        error: e.to_string(),
                    };
                }
            }
        }
        Termination::ScanCompleted
    }

    /// ListView -> ItemOpen -> PresentationScan -> ListView for one index.
    async fn process_item(&mut self, index: usize) -> ExtractionOutcome<ItemOutcome> {
        self.state = TraversalState::ListView;
        let items = self
            .accessor
            .wait_present_all(&self.list_selector, self.config.list_timeout)
            .await?;
        let Some(item) = items.get(index).copied() else {
            return Ok(ItemOutcome::ListExhausted {
                available: items.len(),
            });
        };

        self.accessor.scroll_into_view(&item).await?;
        let click = self
            .config
            .retrier
            .retry_click(&mut self.accessor, &item)
            .await;
        if !click.status {
            let last_kind = click
                .data
                .attempts
                .last()
                .and_then(|attempt| attempt.error_kind);
            if last_kind.is_some_and(|kind| kind.is_fatal()) {
                return Err(ExtractionError::unknown(click.message));
            }
            return Ok(ItemOutcome::Skipped {
                reason: format!(
                    "click failed after {} attempt(s): {}",
                    click.data.attempt_count(),
                    click.message
                ),
            });
        }

        self.state = TraversalState::ItemOpen;
        self.stats.items_opened += 1;
        tokio::time::sleep(self.config.settle_duration).await;
        let extracted = self.extract_open_item().await;

        // Once the item is open the list must be restored, whatever extraction did.
        self.return_to_list().await?;

        let presentations = extracted?;
        Ok(ItemOutcome::Completed { presentations })
    }

    /// Session row followed by one row per presentation, in document order.
    async fn extract_open_item(&mut self) -> ExtractionOutcome<usize> {
        let ctx = self.config.extraction;
        let mut session =
            extract_session_fields(&mut self.accessor, &self.config.selectors, &ctx).await;
        session.source_url = self.accessor.current_location().await?;

        self.table
            .append_session(&session)
            .map_err(|e| ExtractionError::unknown(e.to_string()))?;
        self.stats.session_rows += 1;
        debug!("Session row appended: {}", session.title);

        self.state = TraversalState::PresentationScan;
        let presentations = extract_presentation_fields(
            &mut self.accessor,
            &self.config.selectors,
            &ctx,
            &session.source_url,
        )
        .await;
        for presentation in &presentations {
            self.table
                .append_presentation(&session, presentation)
                .map_err(|e| ExtractionError::unknown(e.to_string()))?;
            self.stats.presentation_rows += 1;
        }
        Ok(presentations.len())
    }

    async fn return_to_list(&mut self) -> ExtractionOutcome<()> {
        self.accessor
            .navigate_back()
            .await
            .map_err(|e| ExtractionError::navigation(format!("history back failed: {e}")))?;
        self.state = TraversalState::ListView;
        tokio::time::sleep(self.config.settle_duration).await;
        Ok(())
    }
}

fn report_soft_failure<T>(field: &str, result: &ExtractionResult<T>) {
    if !result.status {
        debug!("Field '{}' degraded: {}", field, result.message);
    }
}

/// Session-level fields of the open item. Keys absent from the catalog are skipped.
pub async fn extract_session_fields<A: DomAccessor>(
    accessor: &mut A,
    selectors: &SelectorCatalog,
    ctx: &ExtractionContext,
) -> SessionFields {
    let mut session = SessionFields::default();

    if let Some(selector) = selectors.get(selector_keys::EVENT_TYPE) {
        let result = extract_event_types(accessor, selector, ctx.element_timeout).await;
        report_soft_failure(selector_keys::EVENT_TYPE, &result);
        session.event_type = result.data.into_iter().next().unwrap_or_default();
    }

    if let Some(selector) = selectors.get(selector_keys::DATE_TIME) {
        let result = extract_time_spans(accessor, selector, ctx.element_timeout).await;
        report_soft_failure(selector_keys::DATE_TIME, &result);
        session.time = result.data.into_iter().next().unwrap_or_else(TimeSpan::default);
    }

    if let Some(selector) = selectors.get(selector_keys::LOCATION) {
        let result = extract_locations(accessor, selector, ctx.element_timeout).await;
        report_soft_failure(selector_keys::LOCATION, &result);
        session.locations = result.data;
    }

    if let Some(selector) = selectors.get(selector_keys::SESSION_TYPE) {
        let result = extract_session_types(accessor, selector, ctx.element_timeout).await;
        report_soft_failure(selector_keys::SESSION_TYPE, &result);
        session.session_type = result.data.join("; ");
    }

    if let Some(selector) = selectors.get(selector_keys::TITLE) {
        let result = extract_title(accessor, selector, ctx.element_timeout).await;
        report_soft_failure(selector_keys::TITLE, &result);
        session.title = if result.data.is_empty() {
            NO_TITLE.to_string()
        } else {
            result.data
        };
    }

    if let Some(selector) = selectors.get(selector_keys::DISEASE) {
        let result = extract_diseases(accessor, selector, ctx.element_timeout).await;
        report_soft_failure(selector_keys::DISEASE, &result);
        session.disease = result.data.into_iter().next().unwrap_or_default();
    }

    if let Some(selector) = selectors.get(selector_keys::SESSION_AUTHORS) {
        let result = extract_joined_texts(accessor, selector, ctx.people_timeout).await;
        report_soft_failure(selector_keys::SESSION_AUTHORS, &result);
        session.authors = result.data;
    }

    if let Some(selector) = selectors.get(selector_keys::SESSION_AFFILIATIONS) {
        let result = extract_joined_texts(accessor, selector, ctx.people_timeout).await;
        report_soft_failure(selector_keys::SESSION_AFFILIATIONS, &result);
        session.affiliations = result.data;
    }

    if let Some(selector) = selectors.get(selector_keys::SESSION_AUTHOR_BLOCK) {
        let result = extract_author_block(accessor, selector, ctx.people_timeout).await;
        report_soft_failure(selector_keys::SESSION_AUTHOR_BLOCK, &result);
        if result.status {
            session.authors = result.data.authors_line();
            session.affiliations = result.data.affiliations_line();
        }
    }

    if let Some(selector) = selectors.get(selector_keys::SESSION_ABSTRACT) {
        let result = extract_abstract(accessor, selector, ctx.element_timeout).await;
        report_soft_failure(selector_keys::SESSION_ABSTRACT, &result);
        session.details = result.status.then_some(result.data);
    }

    session
}

/// One entry per presentation section; empty when no section selector is
/// configured or the session has no sections.
pub async fn extract_presentation_fields<A: DomAccessor>(
    accessor: &mut A,
    selectors: &SelectorCatalog,
    ctx: &ExtractionContext,
    session_url: &str,
) -> Vec<PresentationFields> {
    let Some(section) = selectors.get(selector_keys::PRESENTATION_SECTION) else {
        return Vec::new();
    };
    let timeout = ctx.section_timeout;

    let count = count_sections(accessor, section, timeout).await;
    if count.data == 0 {
        debug!("{}", count.message);
        return Vec::new();
    }

    let titles = match selectors.get(selector_keys::PRESENTATION_TITLE) {
        Some(selector) => extract_section_titles(accessor, section, selector, timeout).await.data,
        None => Vec::new(),
    };
    let authors = match selectors.get(selector_keys::PRESENTATION_AUTHORS) {
        Some(selector) => {
            extract_section_texts(accessor, section, selector, ctx.people_timeout, NO_AUTHORS)
                .await
                .data
        }
        None => Vec::new(),
    };
    let affiliations = match selectors.get(selector_keys::PRESENTATION_AFFILIATIONS) {
        Some(selector) => {
            extract_section_texts(accessor, section, selector, ctx.people_timeout, NO_AFFILIATIONS)
                .await
                .data
        }
        None => Vec::new(),
    };
    let times = match selectors.get(selector_keys::PRESENTATION_TIME) {
        Some(selector) => extract_section_times(accessor, section, selector, timeout).await.data,
        None => Vec::new(),
    };
    let links = match selectors.get(selector_keys::PRESENTATION_LINK) {
        Some(selector) => extract_section_links(accessor, section, selector, timeout).await.data,
        None => Vec::new(),
    };

    let text_at = |values: &[String], i: usize, placeholder: &str| {
        values
            .get(i)
            .cloned()
            .unwrap_or_else(|| placeholder.to_string())
    };

    (0..count.data)
        .map(|i| PresentationFields {
            title: text_at(&titles, i, NO_TITLE),
            authors: text_at(&authors, i, NO_AUTHORS),
            affiliations: text_at(&affiliations, i, NO_AFFILIATIONS),
            time: times.get(i).cloned().flatten(),
            link: links.get(i).cloned().flatten().map(|mut link| {
                link.url = resolve_href(session_url, &link.url);
                link
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::AppConfig;
    use crate::infrastructure::dom::SnapshotBrowser;

    const DETAIL: &str = r#"<html><body>
        <h3>Lung Cancer Highlights</h3>
        <div data-cy="time"><span>May 31, 2024 1:00 PM – 2:15 PM CDT</span></div>
        <div id="presentation-1"><h6 class="my-2">Talk A</h6><a href="/abs/a">A</a></div>
        <div id="presentation-2"><h5 class="text-14">J. Doe</h5></div>
    </body></html>"#;

    #[tokio::test]
    async fn presentation_fields_fill_gaps_with_placeholders() {
        let mut browser = SnapshotBrowser::new("https://program.test/s/1")
            .with_page("https://program.test/s/1", DETAIL);
        let selectors = AppConfig::default().selectors;
        let ctx = ExtractionContext::default();

        let presentations =
            extract_presentation_fields(&mut browser, &selectors, &ctx, "https://program.test/s/1")
                .await;
        assert_eq!(presentations.len(), 2);
        assert_eq!(presentations[0].title, "Talk A");
        assert_eq!(presentations[0].authors, NO_AUTHORS);
        assert_eq!(
            presentations[0].link.as_ref().map(|link| link.url.as_str()),
            Some("https://program.test/abs/a")
        );
        assert_eq!(presentations[1].title, NO_TITLE);
        assert_eq!(presentations[1].authors, "J. Doe");
        assert_eq!(presentations[1].affiliations, NO_AFFILIATIONS);
        assert!(presentations[1].time.is_none());
    }

    #[tokio::test]
    async fn absent_keys_are_skipped() {
        let mut browser = SnapshotBrowser::new("https://program.test/s/1")
            .with_page("https://program.test/s/1", DETAIL);
        let selectors = SelectorCatalog::empty()
            .with(selector_keys::SESSION_LIST, ".card")
            .with(selector_keys::DATE_TIME, "[data-cy='time'] > span");
        let ctx = ExtractionContext::default();

        let session = extract_session_fields(&mut browser, &selectors, &ctx).await;
        assert_eq!(session.time.date(), "31-May-2024");
        assert_eq!(session.title, "");
        assert!(session.locations.is_empty());

        let presentations =
            extract_presentation_fields(&mut browser, &selectors, &ctx, "https://program.test/s/1")
                .await;
        assert!(presentations.is_empty());
    }

    #[test]
    fn only_fatal_termination_reports_fatal() {
        assert!(Termination::Fatal { error: "x".into() }.is_fatal());
        assert!(!Termination::ScanCompleted.is_fatal());
    }
}
