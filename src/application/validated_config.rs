use std::time::Duration;

use thiserror::Error;
use tracing::info;
use url::Url;

use crate::infrastructure::config::AppConfig;
use crate::infrastructure::dom::DomAccessor;
use crate::infrastructure::parsing::{ExtractionContext, SelectorCatalog, selector_keys};
use crate::infrastructure::retry_manager::ClickRetrier;

/// Startup configuration problems. Raised once, before any navigation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Required selector '{key}' is not configured")]
    MissingSelector { key: &'static str },

    #[error("Selector '{key}' ('{selector}') rejected: {reason}")]
    InvalidSelector {
        key: String,
        selector: String,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Keys every site must provide.
pub const REQUIRED_SELECTORS: [&str; 2] = [selector_keys::SESSION_LIST, selector_keys::DATE_TIME];

/// Traversal settings checked and clamped into usable ranges.
#[derive(Debug, Clone)]
pub struct ValidatedTraversalConfig {
    pub selectors: SelectorCatalog,
    pub start_url: Option<String>,
    pub start_index: usize,
    pub scan_count: usize,
    pub settle_duration: Duration,
    pub list_timeout: Duration,
    pub extraction: ExtractionContext,
    pub retrier: ClickRetrier,
}

fn millis(value: u64, min: u64, max: u64) -> Duration {
    Duration::from_millis(value.max(min).min(max))
}

impl ValidatedTraversalConfig {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let selectors = config.selectors.clone();
        for key in REQUIRED_SELECTORS {
            if !selectors.contains(key) {
                return Err(ConfigError::MissingSelector { key });
            }
        }
        let scoped_in_use = selector_keys::PRESENTATION_SCOPED
            .iter()
            .any(|key| selectors.contains(key));
        if scoped_in_use && !selectors.contains(selector_keys::PRESENTATION_SECTION) {
            return Err(ConfigError::MissingSelector {
                key: selector_keys::PRESENTATION_SECTION,
            });
        }

        let start_url = config
            .site
            .start_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty());
        if let Some(url) = start_url {
            Url::parse(url)
                .map_err(|e| ConfigError::Invalid(format!("start_url '{url}': {e}")))?;
        }

        let traversal = &config.traversal;
        let retry_base = millis(traversal.retry_base_delay_ms, 0, 30_000);
        let retry_max = millis(traversal.retry_max_delay_ms, 0, 120_000).max(retry_base);

        Ok(Self {
            selectors,
            start_url: start_url.map(str::to_string),
            start_index: traversal.start_index,
            scan_count: traversal.scan_count.max(1).min(10_000),
            settle_duration: millis(traversal.settle_duration_ms, 0, 60_000),
            list_timeout: millis(traversal.list_timeout_ms, 0, 300_000),
            extraction: ExtractionContext::default()
                .with_element_timeout(millis(traversal.element_timeout_ms, 0, 300_000))
                .with_people_timeout(millis(traversal.people_timeout_ms, 0, 300_000))
                .with_section_timeout(millis(traversal.section_timeout_ms, 0, 300_000)),
            retrier: ClickRetrier::new(
                traversal.click_max_attempts.max(1).min(10),
                millis(traversal.interactable_timeout_ms, 0, 300_000),
                retry_base,
                retry_max,
            ),
        })
    }

    /// Ask the accessor to vet every configured selector.
    pub fn check_selectors<A: DomAccessor>(&self, accessor: &A) -> Result<(), ConfigError> {
        for (key, selector) in self.selectors.iter() {
            accessor
                .check_selector(selector)
                .map_err(|e| ConfigError::InvalidSelector {
                    key: key.to_string(),
                    selector: selector.to_string(),
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }

    /// Last index (exclusive) the walk may visit.
    pub const fn end_index(&self) -> usize {
        self.start_index.saturating_add(self.scan_count)
    }

    pub fn log_config(&self) {
        info!("🔧 Traversal configuration applied:");
        info!("   items: {}..{}", self.start_index, self.end_index());
        info!("   settle_duration: {:?}", self.settle_duration);
        info!("   list_timeout: {:?}", self.list_timeout);
        info!(
            "   element/people/section timeouts: {:?}/{:?}/{:?}",
            self.extraction.element_timeout,
            self.extraction.people_timeout,
            self.extraction.section_timeout
        );
        info!("   click attempts: {}", self.retrier.max_attempts());
        info!("   selectors configured: {}", self.selectors.iter().count());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::asco;
    use crate::infrastructure::dom::SnapshotBrowser;

    #[test]
    fn defaults_validate() {
        let validated = ValidatedTraversalConfig::from_config(&AppConfig::default()).unwrap();
        assert_eq!(validated.scan_count, 2);
        assert_eq!(validated.settle_duration, Duration::from_secs(5));
        assert_eq!(validated.retrier.max_attempts(), 3);
        assert_eq!(validated.end_index(), 2);
    }

    #[test]
    fn missing_required_selector_fails_fast() {
        let mut config = AppConfig::default();
        config.selectors = config.selectors.without(selector_keys::DATE_TIME);
        assert_eq!(
            ValidatedTraversalConfig::from_config(&config).unwrap_err(),
            ConfigError::MissingSelector {
                key: selector_keys::DATE_TIME
            }
        );
    }

    #[test]
    fn presentation_fields_need_a_section_selector() {
        let mut config = AppConfig::default();
        config.selectors = config.selectors.without(selector_keys::PRESENTATION_SECTION);
        assert!(matches!(
            ValidatedTraversalConfig::from_config(&config),
            Err(ConfigError::MissingSelector { key }) if key == selector_keys::PRESENTATION_SECTION
        ));

        // Without any presentation-scoped key the section selector is optional.
        let mut config = AppConfig::default();
        config.selectors = SelectorCatalog::empty()
            .with(selector_keys::SESSION_LIST, ".card")
            .with(selector_keys::DATE_TIME, "time");
        assert!(ValidatedTraversalConfig::from_config(&config).is_ok());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let mut config = AppConfig::default();
        config.traversal.scan_count = 0;
        config.traversal.click_max_attempts = 99;
        config.traversal.settle_duration_ms = 10_000_000;
        config.traversal.retry_base_delay_ms = 5_000;
        config.traversal.retry_max_delay_ms = 1;

        let validated = ValidatedTraversalConfig::from_config(&config).unwrap();
        assert_eq!(validated.scan_count, 1);
        assert_eq!(validated.retrier.max_attempts(), 10);
        assert_eq!(validated.settle_duration, Duration::from_secs(60));
        assert_eq!(validated.retrier.calculate_backoff(1), Duration::from_secs(5));
    }

    #[test]
    fn bad_start_url_is_rejected() {
        let mut config = AppConfig::default();
        config.site.start_url = Some("not a url".into());
        assert!(matches!(
            ValidatedTraversalConfig::from_config(&config),
            Err(ConfigError::Invalid(_))
        ));

        config.site.start_url = Some("   ".into());
        let validated = ValidatedTraversalConfig::from_config(&config).unwrap();
        assert_eq!(validated.start_url, None);

        config.site.start_url = Some(asco::SCHEDULED_SESSIONS_URL.into());
        let validated = ValidatedTraversalConfig::from_config(&config).unwrap();
        assert_eq!(validated.start_url.as_deref(), Some(asco::SCHEDULED_SESSIONS_URL));
    }

    #[test]
    fn accessor_rejects_malformed_selector() {
        let mut config = AppConfig::default();
        config.selectors.insert(selector_keys::TITLE, "h3[");
        let validated = ValidatedTraversalConfig::from_config(&config).unwrap();

        let err = validated
            .check_selectors(&SnapshotBrowser::new("https://program.test/"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSelector { key, .. } if key == selector_keys::TITLE));
    }
}
