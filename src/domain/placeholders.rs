//! Neutral values written in place of fields that could not be extracted.

pub const NO_DETAILS: &str = "No Details Found";
pub const NO_TIME: &str = "No Time";
pub const NO_TIME_ZONE: &str = "No Time Zone";
pub const NO_TITLE: &str = "No title found";
pub const NO_AUTHORS: &str = "No authors found";
pub const NO_AFFILIATIONS: &str = "No affiliations found";
pub const NO_PRESENTATIONS: &str = "No Presentations";
