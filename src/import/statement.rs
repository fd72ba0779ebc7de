//! Bank statement CSV reader: `;`-delimited, headerless, columns in
//! [`FIELD_NAMES`](crate::domain::FIELD_NAMES) order.

use std::{fs::File, io::Read, path::Path};

use csv::{ReaderBuilder, StringRecord};

use crate::{
    domain::{Record, StatementRow},
    errors::ImportError,
};

pub const STATEMENT_DELIMITER: u8 = b';';

const BOM: char = '\u{feff}';

/// Reads every row of the statement at `path`.
pub fn read_statement(path: &Path, delimiter: u8) -> Result<Vec<Record>, ImportError> {
    let file = File::open(path).map_err(|err| ImportError::Csv {
        path: path.to_path_buf(),
        source: err.into(),
    })?;
    read_statement_from(file, path, delimiter)
}

/// Reads statement rows from any reader; `origin` only labels errors.
pub fn read_statement_from<R: Read>(
    reader: R,
    origin: &Path,
    delimiter: u8,
) -> Result<Vec<Record>, ImportError> {
    let mut csv = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut records = Vec::new();
    for row in csv.records() {
        let row = row.map_err(|source| ImportError::Csv {
            path: origin.to_path_buf(),
            source,
        })?;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let line = row.position().map_or(0, |pos| pos.line());
        let record = Record::from_row(statement_row(&row)).map_err(|source| ImportError::Record {
            path: origin.to_path_buf(),
            line,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

fn statement_row(row: &StringRecord) -> StatementRow {
    let cell = |index: usize| row.get(index).unwrap_or_default().to_string();
    StatementRow {
        date: cell(0).trim_start_matches(BOM).to_string(),
        amount: cell(1),
        kind: cell(2),
        account: cell(3),
        label_out: cell(4),
        label_in: cell(5),
        tbd: cell(6),
        note: cell(7),
    }
}
