//! Column-major output table.
//!
//! Rows only enter through [`ProgramTable::append_session`] and
//! [`ProgramTable::append_presentation`], which both go through a single
//! private writer that pushes one cell into every column. Column lengths can
//! therefore never diverge.

use serde::Serialize;
use thiserror::Error;

use super::program_row::{COLUMN_COUNT, COLUMNS, PresentationFields, ProgramRow, SessionFields};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("Column length mismatch before append: {lengths:?}")]
    ColumnLengthMismatch { lengths: Vec<usize> },
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramTable {
    columns: Vec<Vec<String>>,
}

impl Default for ProgramTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramTable {
    pub fn new() -> Self {
        Self {
            columns: vec![Vec::new(); COLUMN_COUNT],
        }
    }

    pub fn append_session(&mut self, session: &SessionFields) -> Result<usize, TableError> {
        self.push_row(ProgramRow::session(session))
    }

    pub fn append_presentation(
        &mut self,
        session: &SessionFields,
        presentation: &PresentationFields,
    ) -> Result<usize, TableError> {
        self.push_row(ProgramRow::presentation(session, presentation))
    }

    fn push_row(&mut self, row: ProgramRow) -> Result<usize, TableError> {
        if !self.is_consistent() {
            return Err(TableError::ColumnLengthMismatch {
                lengths: self.column_lengths(),
            });
        }
        for (column, cell) in self.columns.iter_mut().zip(row.into_cells()) {
            column.push(cell);
        }
        Ok(self.len())
    }

    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_lengths(&self) -> Vec<usize> {
        self.columns.iter().map(Vec::len).collect()
    }

    pub fn is_consistent(&self) -> bool {
        let len = self.len();
        self.columns.iter().all(|column| column.len() == len)
    }

    pub fn column(&self, name: &str) -> Option<&[String]> {
        COLUMNS
            .iter()
            .position(|column| *column == name)
            .map(|index| self.columns[index].as_slice())
    }

    pub fn row(&self, index: usize) -> Option<Vec<&str>> {
        if index >= self.len() {
            return None;
        }
        Some(
            self.columns
                .iter()
                .map(|column| column[index].as_str())
                .collect(),
        )
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&str>> + '_ {
        (0..self.len()).filter_map(move |index| self.row(index))
    }
}
