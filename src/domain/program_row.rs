//! Output row model: the fixed column schema and the builder that turns
//! session/presentation fields into one row.

use serde::{Deserialize, Serialize};

use super::placeholders::NO_DETAILS;
use super::time_span::{PresentationTime, TimeSpan};

pub const COLUMN_COUNT: usize = 16;

/// Output columns, in order.
pub const COLUMNS: [&str; COLUMN_COUNT] = [
    "Event Type",
    "Date",
    "Time",
    "Start Time",
    "End Time",
    "Time Zone",
    "Location",
    "Session Type",
    "Session Details",
    "Title",
    "Abs",
    "Disease",
    "Authors",
    "Affiliations",
    "Details",
    "Source",
];

/// A URL paired with display text, rendered as a spreadsheet hyperlink formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayLink {
    pub url: String,
    pub text: String,
}

impl DisplayLink {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
        }
    }

    pub fn to_cell(&self) -> String {
        format!(
            "=HYPERLINK(\"{}\", \"{}\")",
            self.url.replace('"', "\"\""),
            self.text.replace('"', "\"\"")
        )
    }
}

/// Everything extracted from a session's detail view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFields {
    pub event_type: String,
    pub time: TimeSpan,
    pub locations: Vec<String>,
    pub session_type: String,
    pub title: String,
    pub disease: String,
    pub authors: String,
    pub affiliations: String,
    /// Abstract or other free text; `None` writes the "No Details Found" marker.
    pub details: Option<String>,
    /// Location of the detail view the fields were read from.
    pub source_url: String,
}

impl SessionFields {
    pub fn location_cell(&self) -> String {
        self.locations.join(";")
    }

    /// `session type;location;title`
    pub fn session_details_for(&self, title: &str) -> String {
        format!("{};{};{}", self.session_type, self.location_cell(), title)
    }
}

/// Fields scoped to one presentation section of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationFields {
    pub title: String,
    pub authors: String,
    pub affiliations: String,
    pub time: Option<PresentationTime>,
    pub link: Option<DisplayLink>,
}

/// One fully populated output row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramRow {
    pub event_type: String,
    pub date: String,
    pub time: String,
    pub start_time: String,
    pub end_time: String,
    pub time_zone: String,
    pub location: String,
    pub session_type: String,
    pub session_details: String,
    pub title: String,
    pub abs: String,
    pub disease: String,
    pub authors: String,
    pub affiliations: String,
    pub details: String,
    pub source: String,
}

impl ProgramRow {
    /// The row describing the session itself.
    pub fn session(session: &SessionFields) -> Self {
        let abs = DisplayLink::new(&session.source_url, &session.session_type).to_cell();
        Self {
            event_type: session.event_type.clone(),
            date: session.time.date().to_string(),
            time: session.time.display_time().to_string(),
            start_time: session.time.start_time().to_string(),
            end_time: session.time.end_time().to_string(),
            time_zone: session.time.timezone().to_string(),
            location: session.location_cell(),
            session_type: session.session_type.clone(),
            session_details: session.session_details_for(&session.title),
            title: session.title.clone(),
            abs,
            disease: session.disease.clone(),
            authors: session.authors.clone(),
            affiliations: session.affiliations.clone(),
            details: session
                .details
                .clone()
                .unwrap_or_else(|| NO_DETAILS.to_string()),
            source: session.source_url.clone(),
        }
    }

    /// A presentation row; session-level columns are inherited from the parent session.
    pub fn presentation(session: &SessionFields, presentation: &PresentationFields) -> Self {
        let time = presentation
            .time
            .clone()
            .unwrap_or_else(PresentationTime::blank);
        let (abs, source) = presentation.link.as_ref().map_or_else(
            || (String::new(), session.source_url.clone()),
            |link| (link.to_cell(), link.url.clone()),
        );

        Self {
            event_type: session.event_type.clone(),
            date: session.time.date().to_string(),
            time: time.time,
            start_time: time.start_time,
            end_time: time.end_time,
            time_zone: time.timezone,
            location: session.location_cell(),
            session_type: session.session_type.clone(),
            session_details: session.session_details_for(&presentation.title),
            title: presentation.title.clone(),
            abs,
            disease: session.disease.clone(),
            authors: presentation.authors.clone(),
            affiliations: presentation.affiliations.clone(),
            details: NO_DETAILS.to_string(),
            source,
        }
    }

    /// Cells in `COLUMNS` order.
    pub fn into_cells(self) -> [String; COLUMN_COUNT] {
        [
            self.event_type,
            self.date,
            self.time,
            self.start_time,
            self.end_time,
            self.time_zone,
            self.location,
            self.session_type,
            self.session_details,
            self.title,
            self.abs,
            self.disease,
            self.authors,
            self.affiliations,
            self.details,
            self.source,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::time_span::ParsedTimeSpan;

    fn sample_session() -> SessionFields {
        SessionFields {
            event_type: "Oral Abstract Session".into(),
            time: TimeSpan::Parsed(ParsedTimeSpan::new(
                "31-May-2024",
                "1:00 PM",
                "2:15 PM",
                Some("CDT".into()),
            )),
            locations: vec!["Hall A".into(), "Room 2".into()],
            session_type: "Lung Cancer".into(),
            title: "Advances in NSCLC".into(),
            disease: "Lung".into(),
            authors: "Jane Doe; John Roe".into(),
            affiliations: "Univ A; Univ B".into(),
            details: None,
            source_url: "https://example.test/session/1".into(),
        }
    }

    #[test]
    fn session_row_fills_every_column() {
        let cells = ProgramRow::session(&sample_session()).into_cells();
        assert_eq!(cells[0], "Oral Abstract Session");
        assert_eq!(cells[1], "31-May-2024");
        assert_eq!(cells[2], "1:00 PM-2:15 PM");
        assert_eq!(cells[6], "Hall A;Room 2");
        assert_eq!(cells[8], "Lung Cancer;Hall A;Room 2;Advances in NSCLC");
        assert_eq!(
            cells[10],
            "=HYPERLINK(\"https://example.test/session/1\", \"Lung Cancer\")"
        );
        assert_eq!(cells[14], NO_DETAILS);
        assert_eq!(cells[15], "https://example.test/session/1");
    }

    #[test]
    fn presentation_row_inherits_session_columns() {
        let session = sample_session();
        let presentation = PresentationFields {
            title: "Abstract 9001".into(),
            authors: "A. Author".into(),
            affiliations: "Inst X".into(),
            time: Some(PresentationTime::new("1:00 PM", "1:10 PM", "CDT")),
            link: Some(DisplayLink::new("https://example.test/abs/9001", "9001")),
        };

        let row = ProgramRow::presentation(&session, &presentation);
        assert_eq!(row.event_type, session.event_type);
        assert_eq!(row.date, "31-May-2024");
        assert_eq!(row.time, "1:00 PM - 1:10 PM");
        assert_eq!(row.session_details, "Lung Cancer;Hall A;Room 2;Abstract 9001");
        assert_eq!(row.source, "https://example.test/abs/9001");
        assert_eq!(row.details, NO_DETAILS);
    }

    #[test]
    fn presentation_without_link_points_at_session() {
        let session = sample_session();
        let row = ProgramRow::presentation(&session, &PresentationFields::default());
        assert_eq!(row.abs, "");
        assert_eq!(row.source, session.source_url);
        assert_eq!(row.time, "");
    }

    #[test]
    fn hyperlink_escapes_quotes() {
        let link = DisplayLink::new("https://x.test/?q=\"a\"", "say \"hi\"");
        assert_eq!(
            link.to_cell(),
            "=HYPERLINK(\"https://x.test/?q=\"\"a\"\"\", \"say \"\"hi\"\"\")"
        );
    }
}
