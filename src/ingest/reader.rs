//! Drives a [`CsvVisitor`] over a CSV stream.

use std::io::{BufRead, BufReader, Read};

use tracing::{debug, error};

use super::record::CsvRow;
use super::visitor::CsvVisitor;

/// Default field delimiter for error check files.
pub const DEFAULT_DELIMITER: u8 = b',';

/// Reads a CSV stream and applies `visitor` to the header and every row.
///
/// Returns false if the stream is empty, has no header, fails the header
/// check, or cannot be parsed. Otherwise every row is visited, even after a
/// row fails, and the result is true only if all rows passed. Rows shorter
/// than the header read their missing columns as empty values.
pub fn read_csv<R: Read, V: CsvVisitor + ?Sized>(input: R, visitor: &mut V, delimiter: u8) -> bool {
    let mut input = BufReader::new(input);
    match input.fill_buf() {
        Ok(buffer) if buffer.is_empty() => {
            error!("CSV file is empty");
            return false;
        }
        Ok(_) => {}
        Err(err) => {
            error!(error = %err, "Encountered error reading CSV: {err}");
            return false;
        }
    }

    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(input);

    let header: Vec<String> = match reader.headers() {
        Ok(record) => record.iter().map(str::to_string).collect(),
        Err(err) => {
            error!(error = %err, "Encountered error reading CSV: {err}");
            return false;
        }
    };
    if header.iter().all(String::is_empty) {
        error!("CSV has no headers");
        return false;
    }

    if !visitor.visit_header(&header) {
        return false;
    }

    let mut success = true;
    let mut rows = 0usize;
    for (index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                error!(error = %err, "Encountered error reading CSV: {err}");
                return false;
            }
        };

        let line_num = record
            .position()
            .map_or(index as u64 + 2, ::csv::Position::line);
        let row: CsvRow = header
            .iter()
            .enumerate()
            .map(|(column, name)| (name.as_str(), record.get(column).unwrap_or_default()))
            .collect();

        let row_success = visitor.visit_row(&row, line_num);
        success = row_success && success;
        rows += 1;
    }

    debug!(rows, success, "Finished reading CSV");
    success
}
