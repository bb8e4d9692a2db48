//! Date/time normalization for session and presentation time strings.
//!
//! Session time text is split on whitespace and tested against an ordered
//! table of structural matchers. The first matcher whose predicate accepts
//! the tokens extracts the span; if extraction fails, or nothing matches, the
//! raw text is kept as [`TimeSpan::Unparsed`]. Adding a format means adding a
//! row to [`MATCHERS`].

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::domain::time_span::{ParsedTimeSpan, PresentationTime, TimeSpan};
use crate::infrastructure::parsing_error::{ExtractionError, ExtractionOutcome};

/// Zone abbreviations accepted at the end of a time string, optionally
/// followed by an offset such as `GMT-5`.
pub const KNOWN_TIMEZONES: &[&str] = &[
    "PST", "PDT", "MST", "MDT", "CST", "CDT", "EST", "EDT", "AKST", "AKDT", "HST", "GMT", "UTC",
    "BST", "WET", "CET", "CEST", "EET", "EEST", "IST", "JST", "KST", "AEST", "AEDT",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeFormat {
    /// `May 31, 2024 1:00 PM – 2:15 PM CDT`
    MonthDayYearWithZone,
    /// `Fri 2024-05-31 13:00 – 14:15`
    IsoDateClock,
    /// `April 7, 2024, 1:30 PM - 5:00 PM`
    MonthDayYear,
}

struct FormatMatcher {
    format: DateTimeFormat,
    accepts: fn(&[&str]) -> bool,
    extract: fn(&[&str]) -> ExtractionOutcome<ParsedTimeSpan>,
}

/// Tried in order; the first accepting matcher wins.
const MATCHERS: [FormatMatcher; 3] = [
    FormatMatcher {
        format: DateTimeFormat::MonthDayYearWithZone,
        accepts: accepts_zoned,
        extract: extract_zoned,
    },
    FormatMatcher {
        format: DateTimeFormat::IsoDateClock,
        accepts: accepts_iso_clock,
        extract: extract_iso_clock,
    },
    FormatMatcher {
        format: DateTimeFormat::MonthDayYear,
        accepts: accepts_month_day_year,
        extract: extract_month_day_year,
    },
];

pub fn is_known_timezone(token: &str) -> bool {
    let split = token
        .find(|c: char| !c.is_ascii_uppercase())
        .unwrap_or(token.len());
    let (abbreviation, offset) = token.split_at(split);
    if !(3..=4).contains(&abbreviation.len()) || !KNOWN_TIMEZONES.contains(&abbreviation) {
        return false;
    }
    offset.is_empty()
        || ((offset.starts_with('+') || offset.starts_with('-'))
            && offset.len() > 1
            && offset[1..].chars().all(|c| c.is_ascii_digit() || c == ':'))
}

/// Day and year both trail a comma in `April 7, 2024,`.
fn strip_punctuation(token: &str) -> &str {
    token.trim_matches(|c: char| c == ',' || c == '.')
}

fn token<'a>(tokens: &[&'a str], index: usize) -> ExtractionOutcome<&'a str> {
    tokens.get(index).copied().ok_or_else(|| {
        ExtractionError::parse_failure(&tokens.join(" "), format!("missing token {index}"))
    })
}

/// Two dashes is enough; `May-31-2024` and `2024-05-31,` both count.
fn is_dashed_date(token: &str) -> bool {
    token.matches('-').count() == 2
}

/// `H:MM` or `H:MM:SS`.
fn is_clock(token: &str) -> bool {
    let colons = token.matches(':').count();
    (1..=2).contains(&colons) && token.chars().all(|c| c.is_ascii_digit() || c == ':')
}

fn accepts_zoned(tokens: &[&str]) -> bool {
    tokens.len() >= 9 && tokens.last().is_some_and(|last| is_known_timezone(last))
}

fn extract_zoned(tokens: &[&str]) -> ExtractionOutcome<ParsedTimeSpan> {
    // Only the day token carries a comma here.
    let date = format!(
        "{}-{}-{}",
        token(tokens, 1)?.trim_matches(','),
        token(tokens, 0)?,
        token(tokens, 2)?
    );
    let start = format!("{} {}", token(tokens, 3)?, token(tokens, 4)?);
    let end = format!("{} {}", token(tokens, 6)?, token(tokens, 7)?);
    let zone = token(tokens, 8)?.to_string();
    Ok(ParsedTimeSpan::new(date, start, end, Some(zone)))
}

fn accepts_iso_clock(tokens: &[&str]) -> bool {
    tokens.len() >= 5 && is_dashed_date(tokens[1]) && is_clock(tokens[2])
}

fn extract_iso_clock(tokens: &[&str]) -> ExtractionOutcome<ParsedTimeSpan> {
    Ok(ParsedTimeSpan::new(
        token(tokens, 1)?,
        token(tokens, 2)?,
        token(tokens, 4)?,
        None,
    ))
}

fn accepts_month_day_year(tokens: &[&str]) -> bool {
    tokens.len() >= 7 && tokens[1].contains(',')
}

fn extract_month_day_year(tokens: &[&str]) -> ExtractionOutcome<ParsedTimeSpan> {
    let month = strip_punctuation(token(tokens, 0)?);
    let day = strip_punctuation(token(tokens, 1)?);
    let year = strip_punctuation(token(tokens, 2)?);
    let date = if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) {
        format!("{day}-{month}-{year}")
    } else {
        format!("{day}-{month}")
    };
    let start = format!("{} {}", token(tokens, 3)?, token(tokens, 4)?);
    let end = format!("{} {}", token(tokens, 6)?, token(tokens, 7)?);
    Ok(ParsedTimeSpan::new(date, start, end, None))
}

/// Format the first accepting matcher would try, if any.
pub fn detect_format(text: &str) -> Option<DateTimeFormat> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    MATCHERS
        .iter()
        .find(|matcher| (matcher.accepts)(&tokens))
        .map(|matcher| matcher.format)
}

/// Normalize one time string. Never fails: unrecognized text comes back as
/// [`TimeSpan::Unparsed`].
pub fn normalize_time_span(text: &str) -> TimeSpan {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if let Some(matcher) = MATCHERS.iter().find(|matcher| (matcher.accepts)(&tokens)) {
        match (matcher.extract)(&tokens) {
            Ok(span) => return TimeSpan::Parsed(span),
            Err(e) => debug!("{:?} accepted '{}' but extraction failed: {}", matcher.format, text, e),
        }
    }
    TimeSpan::unparsed(text)
}

/// Normalize each text independently; one bad entry never affects the others.
pub fn normalize_batch<S: AsRef<str>>(texts: &[S]) -> Vec<TimeSpan> {
    texts
        .iter()
        .map(|text| normalize_time_span(text.as_ref()))
        .collect()
}

static PRESENTATION_TIME: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| {
    let zones = KNOWN_TIMEZONES.join("|");
    Regex::new(&format!(
        r"(\d{{1,2}}:\d{{2}} ?[AP]M)\s*[–—-]\s*(\d{{1,2}}:\d{{2}} ?[AP]M)\s+((?:{zones})(?:[+-]\d{{1,2}}(?::\d{{2}})?)?)"
    ))
});

/// Parse `H:MM AM – H:MM PM ZONE`. Text without such a range yields
/// [`PresentationTime::no_time`].
pub fn parse_presentation_time(text: &str) -> ExtractionOutcome<PresentationTime> {
    let pattern = PRESENTATION_TIME
        .as_ref()
        .map_err(|e| ExtractionError::unknown(format!("presentation time pattern: {e}")))?;

    Ok(pattern.captures(text).map_or_else(PresentationTime::no_time, |caps| {
        PresentationTime::new(&caps[1], &caps[2], &caps[3])
    }))
}
