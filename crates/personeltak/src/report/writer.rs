use super::ReportError;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ReportError> {
    let mut writer = BufWriter::new(create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer
        .flush()
        .map_err(|source| ReportError::io(path, source))
}

pub(crate) fn write_csv_file<T: Serialize>(
    path: &Path,
    columns: &[&str],
    rows: &[T],
) -> Result<(), ReportError> {
    let writer = BufWriter::new(create(path)?);
    write_csv(writer, columns, rows).map_err(|err| err.at(path))
}

/// Header row first, so tables without rows still carry their columns.
pub fn write_csv<W: Write, T: Serialize>(
    mut writer: W,
    columns: &[&str],
    rows: &[T],
) -> Result<(), ReportError> {
    writer
        .write_all(UTF8_BOM)
        .map_err(ReportError::Write)?;

    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(columns)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush().map_err(ReportError::Write)
}

fn create(path: &Path) -> Result<File, ReportError> {
    File::create(path).map_err(|source| ReportError::io(path, source))
}
