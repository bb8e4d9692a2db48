//! Normalized date/time values for sessions and presentations.

use serde::{Deserialize, Serialize};

use super::placeholders::{NO_TIME, NO_TIME_ZONE};

/// Structured date/time recovered from a recognized format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTimeSpan {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub timezone: Option<String>,
    /// Always `start-end`.
    pub combined: String,
}

impl ParsedTimeSpan {
    pub fn new(
        date: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
        timezone: Option<String>,
    ) -> Self {
        let start_time = start_time.into();
        let end_time = end_time.into();
        let combined = format!("{start_time}-{end_time}");
        Self {
            date: date.into(),
            start_time,
            end_time,
            timezone,
            combined,
        }
    }
}

/// A session's date/time: either structured, or the raw text when no format matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeSpan {
    Parsed(ParsedTimeSpan),
    Unparsed { raw_text: String },
}

impl TimeSpan {
    pub fn unparsed(raw_text: impl Into<String>) -> Self {
        Self::Unparsed {
            raw_text: raw_text.into(),
        }
    }

    pub const fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }

    pub fn date(&self) -> &str {
        match self {
            Self::Parsed(span) => &span.date,
            Self::Unparsed { .. } => "",
        }
    }

    pub fn start_time(&self) -> &str {
        match self {
            Self::Parsed(span) => &span.start_time,
            Self::Unparsed { .. } => "",
        }
    }

    pub fn end_time(&self) -> &str {
        match self {
            Self::Parsed(span) => &span.end_time,
            Self::Unparsed { .. } => "",
        }
    }

    pub fn timezone(&self) -> &str {
        match self {
            Self::Parsed(span) => span.timezone.as_deref().unwrap_or_default(),
            Self::Unparsed { .. } => "",
        }
    }

    /// Display value for the "Time" column. Unrecognized input is shown verbatim.
    pub fn display_time(&self) -> &str {
        match self {
            Self::Parsed(span) => &span.combined,
            Self::Unparsed { raw_text } => raw_text,
        }
    }
}

impl Default for TimeSpan {
    fn default() -> Self {
        Self::unparsed("")
    }
}

/// Time range shown on an individual presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationTime {
    pub time: String,
    pub start_time: String,
    pub end_time: String,
    pub timezone: String,
}

impl PresentationTime {
    pub fn new(start_time: &str, end_time: &str, timezone: &str) -> Self {
        Self {
            time: format!("{start_time} - {end_time}"),
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            timezone: timezone.to_string(),
        }
    }

    /// Marker written when the text does not carry a recognizable range.
    pub fn no_time() -> Self {
        Self {
            time: NO_TIME.to_string(),
            start_time: NO_TIME.to_string(),
            end_time: NO_TIME.to_string(),
            timezone: NO_TIME_ZONE.to_string(),
        }
    }

    /// Blank cells, used when the presentation has no time element at all.
    pub fn blank() -> Self {
        Self {
            time: String::new(),
            start_time: String::new(),
            end_time: String::new(),
            timezone: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_is_start_dash_end() {
        let span = ParsedTimeSpan::new("31-May-2024", "1:00 PM", "2:15 PM", Some("CDT".into()));
        assert_eq!(span.combined, "1:00 PM-2:15 PM");
    }

    #[test]
    fn unparsed_exposes_raw_text_only_as_time() {
        let span = TimeSpan::unparsed("TBD");
        assert_eq!(span.display_time(), "TBD");
        assert_eq!(span.date(), "");
        assert_eq!(span.timezone(), "");
        assert!(!span.is_parsed());
    }

    #[test]
    fn unparsed_serializes_with_raw_text_key() {
        let json = serde_json::to_value(TimeSpan::unparsed("TBD")).unwrap();
        assert_eq!(json["raw_text"], "TBD");
    }
}
