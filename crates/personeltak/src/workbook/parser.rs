use super::WorkbookError;
use crate::scoring::ValidationError;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const BOM: char = '\u{feff}';

/// The three CSV tables making up a workbook directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Criteria,
    Employees,
    Evaluations,
}

impl Table {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Criteria => "Kriterler",
            Self::Employees => "Calisanlar",
            Self::Evaluations => "Degerlendirmeler",
        }
    }

    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Criteria => "Kriterler.csv",
            Self::Employees => "Calisanlar.csv",
            Self::Evaluations => "Degerlendirmeler.csv",
        }
    }

    pub const fn required_columns(self) -> &'static [&'static str] {
        match self {
            Self::Criteria => &["Po"],
            Self::Employees => &["Sicil"],
            Self::Evaluations => &["Sicil", "Po", "Rol", "Puan", "Tarih"],
        }
    }
}

/// Reads every row of `table` from `path`. A missing file is a missing table.
pub(crate) fn read_table<T: DeserializeOwned>(
    path: &Path,
    table: Table,
) -> Result<Vec<T>, WorkbookError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ValidationError::MissingTable(table.name().to_string()).into())
        }
        Err(source) => {
            return Err(WorkbookError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    parse_table(file, table).map_err(|err| err.at(path))
}

pub(crate) fn parse_table<T: DeserializeOwned, R: Read>(
    reader: R,
    table: Table,
) -> Result<Vec<T>, WorkbookError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = clean_headers(csv_reader.headers()?);
    require_columns(&headers, table)?;
    csv_reader.set_headers(headers);

    let mut rows = Vec::new();
    for record in csv_reader.deserialize::<T>() {
        rows.push(record?);
    }
    Ok(rows)
}

pub(crate) fn clean_headers(headers: &csv::StringRecord) -> csv::StringRecord {
    headers
        .iter()
        .map(|header| header.trim_start_matches(BOM).trim())
        .collect()
}

pub(crate) fn require_columns(
    headers: &csv::StringRecord,
    table: Table,
) -> Result<(), ValidationError> {
    for column in table.required_columns() {
        if !headers.iter().any(|header| header == *column) {
            return Err(ValidationError::MissingColumn {
                table: table.name().to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}
