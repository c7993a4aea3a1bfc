//! Code for writing the collapsed output table.

use std::io::Write;

use super::schema::{columns, CollapsedRow};
use crate::common::PLACEHOLDER;

/// Header of the output table for the given input header.
pub fn output_header(input_header: &[String]) -> Vec<String> {
    [columns::BATCH_ID, columns::MERGE_COUNT, columns::CYTOBAND]
        .iter()
        .map(|name| name.to_string())
        .chain(input_header.iter().cloned())
        .collect()
}

/// Blank out placeholders and absent values.
fn blank_placeholder(value: Option<&str>) -> &str {
    match value {
        Some(value) if value != PLACEHOLDER => value,
        _ => "",
    }
}

/// Writes `CollapsedRow`s as TSV, preserving the column order of the header.
pub struct CollapsedTableWriter<W: Write> {
    writer: csv::Writer<W>,
    count: usize,
}

impl<W: Write> CollapsedTableWriter<W> {
    /// Create a new writer and write out the header.
    pub fn new(inner: W, input_header: &[String]) -> Result<Self, anyhow::Error> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_writer(inner);
        writer.write_record(output_header(input_header))?;

        Ok(Self { writer, count: 0 })
    }

    /// Write one row.
    pub fn write_row(&mut self, row: &CollapsedRow) -> Result<(), anyhow::Error> {
        let merge_count = row.merge_count.to_string();
        let record = [
            row.batch_id.as_str(),
            merge_count.as_str(),
            row.cytoband.as_str(),
        ]
        .into_iter()
        .map(Some)
        .chain(row.values.iter().map(|value| value.as_deref()))
        .map(blank_placeholder);
        self.writer.write_record(record)?;
        self.count += 1;

        Ok(())
    }

    /// Number of rows written so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Flush and return the inner writer.
    pub fn finish(self) -> Result<W, anyhow::Error> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("problem flushing output: {}", e.error()))
    }
}
