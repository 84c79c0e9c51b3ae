// Row decoding of day file bodies

use crate::core::constants::*;
use crate::core::error::{DecodeWarning, Result};
use crate::core::format::{Record, Schema};
use crate::core::schema::{parse_header, ParsedHeader};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::iter::Enumerate;
use std::str::Lines;
use tracing::debug;

/// Text of one day file with its header already parsed. Rows are decoded
/// on demand; every call to [`DayContent::rows`] starts from the top.
#[derive(Debug, Clone)]
pub struct DayContent {
    text: String,
    header: ParsedHeader,
    delimiter: char,
}

impl DayContent {
    pub fn parse(text: String, delimiter: char) -> Result<Self> {
        let header = parse_header(&text, delimiter)?;
        Ok(Self {
            text,
            header,
            delimiter,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.header.schema
    }

    pub fn into_schema(self) -> Schema {
        self.header.schema
    }

    pub fn rows(&self) -> RowDecoder<'_> {
        RowDecoder {
            lines: self.text[self.header.body_offset..].lines().enumerate(),
            first_line: self.header.body_line,
            delimiter: self.delimiter,
            columns: self.header.schema.channels.len(),
            skipped: 0,
        }
    }
}

/// Iterator over the well-formed rows of a day file body, in file order.
pub struct RowDecoder<'a> {
    lines: Enumerate<Lines<'a>>,
    first_line: usize,
    delimiter: char,
    columns: usize,
    skipped: usize,
}

impl RowDecoder<'_> {
    /// Rows rejected so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Iterator for RowDecoder<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        loop {
            let (index, content) = self.lines.next()?;
            let trimmed = content.trim();
            if trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIX) {
                continue;
            }

            match decode_row(content, self.first_line + index, self.delimiter, self.columns) {
                Ok(record) => return Some(record),
                Err(warning) => {
                    debug!("skipping row: {}", warning);
                    self.skipped += 1;
                }
            }
        }
    }
}

fn decode_row(
    content: &str,
    line: usize,
    delimiter: char,
    columns: usize,
) -> std::result::Result<Record, DecodeWarning> {
    let cells: Vec<&str> = content.split(delimiter).collect();
    if cells.len() != columns + 1 {
        return Err(DecodeWarning::ColumnCount {
            line,
            expected: columns + 1,
            found: cells.len(),
        });
    }

    let timestamp = parse_timestamp(cells[0]).ok_or_else(|| DecodeWarning::Timestamp {
        line,
        text: cells[0].to_string(),
    })?;

    let mut values = Vec::with_capacity(columns);
    for (column, cell) in cells[1..].iter().enumerate() {
        let value = parse_value(cell).ok_or_else(|| DecodeWarning::Value {
            line,
            column,
            text: cell.to_string(),
        })?;
        values.push(value);
    }

    Ok(Record { timestamp, values })
}

pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    let text = text.strip_suffix('Z').unwrap_or(text);

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

/// `Some(None)` for a missing-value marker, `None` for garbage.
fn parse_value(cell: &str) -> Option<Option<f64>> {
    let cell = cell.trim();
    if cell.is_empty() || MISSING_MARKERS.iter().any(|m| cell.eq_ignore_ascii_case(m)) {
        return Some(None);
    }

    match cell.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(Some(value)),
        Ok(_) => Some(None),
        Err(_) => None,
    }
}
