//! Offline [`DomAccessor`] over saved HTML pages.
//!
//! Pages are keyed by URL. Clicking a node follows its `href` (or
//! `data-href`, or the first descendant link), `navigate_back` pops the
//! history stack. The document is re-parsed with `scraper` on every call, so
//! nothing non-`Send` is held across an await.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};
use url::Url;

use super::{DomAccessor, NodeHandle};
use crate::infrastructure::parsing::normalize_whitespace;
use crate::infrastructure::parsing_error::{ExtractionError, ExtractionOutcome};

#[derive(Debug, Clone, Default)]
pub struct SnapshotBrowser {
    pages: HashMap<String, String>,
    history: Vec<String>,
    generation: u64,
    /// Slot -> position of the node in document order.
    slots: Vec<usize>,
    pending_interceptions: u32,
    closed: bool,
}

impl SnapshotBrowser {
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            history: vec![start_url.into()],
            ..Self::default()
        }
    }

    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.insert_page(url, html);
        self
    }

    pub fn insert_page(&mut self, url: impl Into<String>, html: impl Into<String>) {
        self.pages.insert(url.into(), html.into());
    }

    /// Load every `*.html` file of `dir` as a `file://` page and start at `start_page`.
    pub fn from_dir(dir: &Path, start_page: &str) -> anyhow::Result<Self> {
        let dir = std::fs::canonicalize(dir)
            .with_context(|| format!("Snapshot directory not found: {}", dir.display()))?;
        let mut browser = Self::default();

        for entry in std::fs::read_dir(&dir)
            .with_context(|| format!("Failed to read snapshot directory: {}", dir.display()))?
        {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("html") {
                continue;
            }
            let html = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read snapshot page: {}", path.display()))?;
            let url = Url::from_file_path(&path)
                .map_err(|()| anyhow!("Snapshot path is not absolute: {}", path.display()))?;
            browser.insert_page(url.to_string(), html);
        }

        let start = Url::from_file_path(dir.join(start_page))
            .map_err(|()| anyhow!("Invalid start page: {start_page}"))?
            .to_string();
        if !browser.pages.contains_key(&start) {
            return Err(anyhow!("Start page {start_page} is not in {}", dir.display()));
        }
        info!(
            "📂 Loaded {} snapshot pages from {}",
            browser.pages.len(),
            dir.display()
        );
        browser.history.push(start);
        Ok(browser)
    }

    /// Make the next `count` clicks fail as if an overlay intercepted them.
    pub fn intercept_next_clicks(&mut self, count: u32) {
        self.pending_interceptions = count;
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub fn history_depth(&self) -> usize {
        self.history.len()
    }

    fn ensure_open(&self) -> ExtractionOutcome<()> {
        if self.closed {
            return Err(ExtractionError::unknown("browser session already closed"));
        }
        Ok(())
    }

    fn current_url(&self) -> ExtractionOutcome<&str> {
        self.ensure_open()?;
        self.history
            .last()
            .map(String::as_str)
            .ok_or_else(|| ExtractionError::navigation("no page loaded"))
    }

    fn current_document(&self) -> ExtractionOutcome<Html> {
        let url = self.current_url()?;
        let source = self
            .pages
            .get(url)
            .ok_or_else(|| ExtractionError::navigation(format!("page not captured: {url}")))?;
        Ok(Html::parse_document(source))
    }

    fn compile(selector: &str) -> ExtractionOutcome<Selector> {
        Selector::parse(selector)
            .map_err(|e| ExtractionError::parse_failure(selector, format!("invalid CSS selector: {e}")))
    }

    fn resolve<'a>(&self, html: &'a Html, node: &NodeHandle) -> ExtractionOutcome<ElementRef<'a>> {
        let stale = || ExtractionError::Stale {
            handle_generation: node.generation(),
            current_generation: self.generation,
        };
        if node.generation() != self.generation {
            return Err(stale());
        }
        let position = *self.slots.get(node.slot()).ok_or_else(stale)?;
        html.root_element()
            .descendants()
            .nth(position)
            .and_then(ElementRef::wrap)
            .ok_or_else(stale)
    }

    fn with_node<R>(
        &self,
        node: &NodeHandle,
        read: impl FnOnce(ElementRef<'_>) -> R,
    ) -> ExtractionOutcome<R> {
        let html = self.current_document()?;
        let element = self.resolve(&html, node)?;
        Ok(read(element))
    }

    fn select_positions(
        &self,
        scope: Option<&NodeHandle>,
        selector: &str,
    ) -> ExtractionOutcome<Vec<usize>> {
        let html = self.current_document()?;
        let compiled = Self::compile(selector)?;
        let order: Vec<_> = html.root_element().descendants().map(|n| n.id()).collect();
        let position_of = |element: ElementRef<'_>| order.iter().position(|id| *id == element.id());

        let positions = match scope {
            Some(handle) => self
                .resolve(&html, handle)?
                .select(&compiled)
                .filter_map(position_of)
                .collect(),
            None => html.select(&compiled).filter_map(position_of).collect(),
        };
        Ok(positions)
    }

    fn issue_handles(&mut self, positions: Vec<usize>) -> Vec<NodeHandle> {
        positions
            .into_iter()
            .map(|position| {
                self.slots.push(position);
                NodeHandle::new(self.generation, self.slots.len() - 1)
            })
            .collect()
    }

    fn link_target(&self, node: &NodeHandle) -> ExtractionOutcome<Option<String>> {
        let nested_link = Self::compile("a[href]")?;
        self.with_node(node, |element| {
            element
                .value()
                .attr("href")
                .or_else(|| element.value().attr("data-href"))
                .or_else(|| {
                    element
                        .select(&nested_link)
                        .next()
                        .and_then(|link| link.value().attr("href"))
                })
                .map(str::to_string)
        })
    }

    /// Resolve `target` to a captured page key, relative to the current page.
    fn resolve_page(&self, target: &str) -> Option<String> {
        if self.pages.contains_key(target) {
            return Some(target.to_string());
        }
        let base = self.history.last().and_then(|url| Url::parse(url).ok())?;
        let joined = base.join(target).ok()?.to_string();
        self.pages.contains_key(&joined).then_some(joined)
    }

    fn load(&mut self, url: String) {
        debug!("📄 Snapshot navigation -> {}", url);
        self.history.push(url);
        self.invalidate_handles();
    }

    fn invalidate_handles(&mut self) {
        self.generation += 1;
        self.slots.clear();
    }
}

#[async_trait]
impl DomAccessor for SnapshotBrowser {
    fn check_selector(&self, selector: &str) -> ExtractionOutcome<()> {
        Self::compile(selector).map(|_| ())
    }

    async fn find_all(
        &mut self,
        scope: Option<&NodeHandle>,
        selector: &str,
    ) -> ExtractionOutcome<Vec<NodeHandle>> {
        let positions = self.select_positions(scope, selector)?;
        Ok(self.issue_handles(positions))
    }

    /// A saved page never changes, so there is nothing to wait for.
    async fn wait_present_all(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> ExtractionOutcome<Vec<NodeHandle>> {
        let nodes = self.find_all(None, selector).await?;
        if nodes.is_empty() {
            return Err(ExtractionError::timeout(selector, timeout));
        }
        Ok(nodes)
    }

    async fn text(&mut self, node: &NodeHandle) -> ExtractionOutcome<String> {
        self.with_node(node, |element| {
            normalize_whitespace(&element.text().collect::<String>())
        })
    }

    async fn attribute(
        &mut self,
        node: &NodeHandle,
        name: &str,
    ) -> ExtractionOutcome<Option<String>> {
        self.with_node(node, |element| element.value().attr(name).map(str::to_string))
    }

    async fn inner_html(&mut self, node: &NodeHandle) -> ExtractionOutcome<String> {
        self.with_node(node, |element| element.inner_html())
    }

    async fn scroll_into_view(&mut self, node: &NodeHandle) -> ExtractionOutcome<()> {
        self.with_node(node, |_| ())
    }

    async fn wait_interactable(
        &mut self,
        node: &NodeHandle,
        timeout: Duration,
    ) -> ExtractionOutcome<()> {
        let blocked = self.with_node(node, |element| {
            let value = element.value();
            value.attr("disabled").is_some()
                || value.attr("hidden").is_some()
                || value.attr("aria-disabled") == Some("true")
        })?;
        if blocked {
            return Err(ExtractionError::timeout("<interactable>", timeout));
        }
        Ok(())
    }

    async fn click(&mut self, node: &NodeHandle) -> ExtractionOutcome<()> {
        let target = self
            .link_target(node)?
            .ok_or_else(|| ExtractionError::interaction("element has no navigation target"))?;

        if self.pending_interceptions > 0 {
            self.pending_interceptions -= 1;
            return Err(ExtractionError::interaction(
                "click intercepted by another element",
            ));
        }

        let url = self
            .resolve_page(&target)
            .ok_or_else(|| ExtractionError::interaction(format!("no page captured for {target}")))?;
        self.load(url);
        Ok(())
    }

    async fn navigate_to(&mut self, url: &str) -> ExtractionOutcome<()> {
        self.ensure_open()?;
        let resolved = self
            .resolve_page(url)
            .ok_or_else(|| ExtractionError::navigation(format!("no page captured for {url}")))?;
        self.load(resolved);
        Ok(())
    }

    async fn navigate_back(&mut self) -> ExtractionOutcome<()> {
        self.ensure_open()?;
        if self.history.len() < 2 {
            return Err(ExtractionError::navigation("no previous page in history"));
        }
        self.history.pop();
        self.invalidate_handles();
        Ok(())
    }

    async fn current_location(&mut self) -> ExtractionOutcome<String> {
        self.current_url().map(str::to_string)
    }

    async fn close(&mut self) -> ExtractionOutcome<()> {
        self.closed = true;
        self.slots.clear();
        Ok(())
    }
}
