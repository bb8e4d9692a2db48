//! Document access capability.
//!
//! The traversal never talks to a browser directly; it drives a
//! [`DomAccessor`]. Node handles are only valid for the document generation
//! they were issued in: every navigation bumps the generation, and an old
//! handle then fails with [`ExtractionError::Stale`] instead of reading
//! whatever node happens to sit at the same position.

pub mod snapshot_browser;

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, sleep};

use crate::infrastructure::parsing_error::{ExtractionError, ExtractionOutcome};

pub use snapshot_browser::SnapshotBrowser;

/// Polling interval of the provided presence waits.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Opaque reference to a node in one document generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    generation: u64,
    slot: usize,
}

impl NodeHandle {
    pub const fn new(generation: u64, slot: usize) -> Self {
        Self { generation, slot }
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub const fn slot(&self) -> usize {
        self.slot
    }
}

#[async_trait]
pub trait DomAccessor: Send {
    /// Reject a selector the backend cannot evaluate. Called once per
    /// configured selector at startup.
    fn check_selector(&self, _selector: &str) -> ExtractionOutcome<()> {
        Ok(())
    }

    /// All matches in document order, optionally restricted to descendants of `scope`.
    async fn find_all(
        &mut self,
        scope: Option<&NodeHandle>,
        selector: &str,
    ) -> ExtractionOutcome<Vec<NodeHandle>>;

    async fn find(
        &mut self,
        scope: Option<&NodeHandle>,
        selector: &str,
    ) -> ExtractionOutcome<NodeHandle> {
        self.find_all(scope, selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ExtractionError::not_found(selector))
    }

    /// Wait until at least one node matches, polling until `timeout`.
    async fn wait_present_all(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> ExtractionOutcome<Vec<NodeHandle>> {
        let deadline = Instant::now() + timeout;
        loop {
            let nodes = self.find_all(None, selector).await?;
            if !nodes.is_empty() {
                return Ok(nodes);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(ExtractionError::timeout(selector, timeout));
            }
            sleep(DEFAULT_POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    async fn wait_present(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> ExtractionOutcome<NodeHandle> {
        self.wait_present_all(selector, timeout)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ExtractionError::timeout(selector, timeout))
    }

    /// Rendered text of the node, whitespace collapsed.
    async fn text(&mut self, node: &NodeHandle) -> ExtractionOutcome<String>;

    async fn attribute(
        &mut self,
        node: &NodeHandle,
        name: &str,
    ) -> ExtractionOutcome<Option<String>>;

    async fn inner_html(&mut self, node: &NodeHandle) -> ExtractionOutcome<String>;

    async fn scroll_into_view(&mut self, node: &NodeHandle) -> ExtractionOutcome<()>;

    async fn wait_interactable(
        &mut self,
        node: &NodeHandle,
        timeout: Duration,
    ) -> ExtractionOutcome<()>;

    /// Move to the node and click it.
    async fn click(&mut self, node: &NodeHandle) -> ExtractionOutcome<()>;

    async fn navigate_to(&mut self, url: &str) -> ExtractionOutcome<()>;

    async fn navigate_back(&mut self) -> ExtractionOutcome<()>;

    async fn current_location(&mut self) -> ExtractionOutcome<String>;

    async fn close(&mut self) -> ExtractionOutcome<()>;
}
