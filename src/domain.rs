//! Domain layer: extraction results, time spans, rows and the output table.

pub mod extraction_result;
pub mod placeholders;
pub mod program_row;
pub mod program_table;
pub mod time_span;

pub use extraction_result::ExtractionResult;
pub use program_row::{
    COLUMN_COUNT, COLUMNS, DisplayLink, PresentationFields, ProgramRow, SessionFields,
};
pub use program_table::{ProgramTable, TableError};
pub use time_span::{ParsedTimeSpan, PresentationTime, TimeSpan};
