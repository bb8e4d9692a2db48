//! Writes the program table as CSV, TSV or JSON.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::info;

use crate::domain::{COLUMNS, ProgramTable};
use crate::infrastructure::config::OutputFormat;

fn needs_quoting(field: &str, delimiter: char) -> bool {
    field.contains(delimiter) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn write_row<W: Write, S: AsRef<str>>(out: &mut W, fields: &[S], delimiter: char) -> Result<()> {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            write!(out, "{delimiter}")?;
        }
        let field = field.as_ref();
        if needs_quoting(field, delimiter) {
            write!(out, "\"{}\"", field.replace('"', "\"\""))?;
        } else {
            out.write_all(field.as_bytes())?;
        }
    }
    writeln!(out)?;
    Ok(())
}

/// Header plus one line per row, fields quoted only when needed.
pub fn write_delimited<W: Write>(table: &ProgramTable, out: &mut W, delimiter: char) -> Result<()> {
    write_row(out, &COLUMNS, delimiter)?;
    for row in table.rows() {
        write_row(out, &row, delimiter)?;
    }
    Ok(())
}

/// Array of objects keyed by column name, in column order.
pub fn table_to_json(table: &ProgramTable) -> Value {
    Value::Array(
        table
            .rows()
            .map(|row| {
                let record: Map<String, Value> = COLUMNS
                    .iter()
                    .zip(row)
                    .map(|(column, cell)| ((*column).to_string(), Value::String(cell.to_string())))
                    .collect();
                Value::Object(record)
            })
            .collect(),
    )
}

pub fn write_table(table: &ProgramTable, path: &Path, format: OutputFormat) -> Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;
    let mut out = BufWriter::new(file);

    match format {
        OutputFormat::Csv => write_delimited(table, &mut out, ',')?,
        OutputFormat::Tsv => write_delimited(table, &mut out, '\t')?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &table_to_json(table))?;
            writeln!(out)?;
        }
    }
    out.flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;

    info!("📝 Wrote {} rows to {} ({:?})", table.len(), path.display(), format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SessionFields, TimeSpan};

    fn table() -> ProgramTable {
        let mut table = ProgramTable::new();
        table
            .append_session(&SessionFields {
                title: "Lung, \"advanced\"".into(),
                session_type: "Oral".into(),
                time: TimeSpan::unparsed("TBD"),
                source_url: "https://program.test/s/1".into(),
                ..SessionFields::default()
            })
            .unwrap();
        table
    }

    #[test]
    fn csv_has_header_and_quotes_when_needed() {
        let mut out = Vec::new();
        write_delimited(&table(), &mut out, ',').unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        assert_eq!(lines.next().unwrap(), COLUMNS.join(","));
        let row = lines.next().unwrap();
        assert!(row.contains("\"Lung, \"\"advanced\"\"\""));
        assert!(row.ends_with("https://program.test/s/1"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn json_keys_follow_columns() {
        let value = table_to_json(&table());
        let record = value[0].as_object().unwrap();
        let keys: Vec<_> = record.keys().map(String::as_str).collect();
        assert_eq!(keys.len(), COLUMNS.len());
        assert_eq!(record["Time"], "TBD");
        assert_eq!(record["Source"], "https://program.test/s/1");
    }

    #[test]
    fn write_table_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("program.tsv");
        write_table(&table(), &path, OutputFormat::Tsv).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("Event Type\tDate\t"));
    }

    #[test]
    fn empty_table_still_writes_header() {
        let mut out = Vec::new();
        write_delimited(&ProgramTable::new(), &mut out, ',').unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }
}
