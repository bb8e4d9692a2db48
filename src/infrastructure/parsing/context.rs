//! Wait bounds shared by the field extractors.

use std::time::Duration;

use crate::infrastructure::config::defaults;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionContext {
    /// Single-value and list fields.
    pub element_timeout: Duration,
    /// Session author/affiliation lists, which render late.
    pub people_timeout: Duration,
    /// Presentation sections.
    pub section_timeout: Duration,
}

impl Default for ExtractionContext {
    fn default() -> Self {
        Self {
            element_timeout: Duration::from_millis(defaults::ELEMENT_TIMEOUT_MS),
            people_timeout: Duration::from_millis(defaults::PEOPLE_TIMEOUT_MS),
            section_timeout: Duration::from_millis(defaults::SECTION_TIMEOUT_MS),
        }
    }
}

impl ExtractionContext {
    pub const fn with_element_timeout(mut self, timeout: Duration) -> Self {
        self.element_timeout = timeout;
        self
    }

    pub const fn with_people_timeout(mut self, timeout: Duration) -> Self {
        self.people_timeout = timeout;
        self
    }

    pub const fn with_section_timeout(mut self, timeout: Duration) -> Self {
        self.section_timeout = timeout;
        self
    }
}
