//! Sheet document parsing.
//!
//! Row 1 is a header and is always skipped. Every other line must look like
//! `"Name","Type","Value"`. Lines that do not split into exactly three fields
//! are skipped so one bad row never sinks the whole document.

use tracing::debug;

use crate::types::ValueRow;

/// Field separator: a comma flanked by double quotes.
pub const FIELD_DELIMITER: &str = "\",\"";

/// Split a document into rows, skipping the header and malformed lines.
pub fn parse_document(document: &str) -> Vec<ValueRow> {
    document
        .lines()
        .enumerate()
        .skip(1)
        .filter_map(|(index, line)| {
            if line.trim().is_empty() {
                return None;
            }
            let row = parse_line(line);
            if row.is_none() {
                debug!(line = index + 1, "Skipping malformed row");
            }
            row
        })
        .collect()
}

/// Parse one data line into a row.
pub fn parse_line(line: &str) -> Option<ValueRow> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    let [name, type_tag, raw] = fields[..] else {
        return None;
    };

    let name = name.strip_prefix('"').unwrap_or(name);
    let raw = raw.strip_suffix('"').unwrap_or(raw);
    if name.is_empty() {
        return None;
    }

    Some(ValueRow::new(name, type_tag, raw))
}
