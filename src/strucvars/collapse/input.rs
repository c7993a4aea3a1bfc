//! Code for reading the AnnotSV input table.

use std::{io::Read, path::Path};

use super::schema::{columns, AnnotationRow, AnnotationTable, SvType};
use crate::{common::open_read_maybe_gz, err::InputError};

/// Rename the per-batch genotype count columns to `#hom` and `#htz`.
pub fn canonicalize_header(header: &[String], batch_id: &str) -> Vec<String> {
    let hom = format!("{}({})", columns::HOM, batch_id);
    let htz = format!("{}({})", columns::HTZ, batch_id);
    header
        .iter()
        .map(|name| {
            if *name == hom {
                columns::HOM.to_string()
            } else if *name == htz {
                columns::HTZ.to_string()
            } else {
                name.clone()
            }
        })
        .collect()
}

/// Positions of the columns that are parsed for each row.
struct CoreColumns {
    gene_name: usize,
    sv_type: usize,
    chromosome: usize,
    start: usize,
    end: usize,
    sv_length: usize,
}

impl CoreColumns {
    fn new(header: &[String]) -> Result<Self, InputError> {
        let required = [
            columns::GENE_NAME,
            columns::SV_TYPE,
            columns::SV_CHROM,
            columns::SV_START,
            columns::SV_END,
            columns::SV_LENGTH,
        ];
        let idxs = required
            .iter()
            .map(|name| header.iter().position(|h| h == name))
            .collect::<Vec<_>>();
        let missing = required
            .iter()
            .zip(idxs.iter())
            .filter(|(_, idx)| idx.is_none())
            .map(|(name, _)| name.to_string())
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(InputError::MissingColumns(missing));
        }
        let idxs = idxs.into_iter().flatten().collect::<Vec<_>>();

        Ok(Self {
            gene_name: idxs[0],
            sv_type: idxs[1],
            chromosome: idxs[2],
            start: idxs[3],
            end: idxs[4],
            sv_length: idxs[5],
        })
    }
}

fn parse_int(row: usize, column: &str, value: &str) -> Result<i64, InputError> {
    value
        .trim()
        .parse()
        .map_err(|e| InputError::InvalidInteger {
            row,
            column: column.to_string(),
            value: value.to_string(),
            source: e,
        })
}

/// Read the AnnotSV table from `reader`.
///
/// Row numbers in errors are 1-based and count the header line.
pub fn read_annotation_table<R: Read>(
    reader: R,
    batch_id: &str,
) -> Result<AnnotationTable, InputError> {
    let unreadable = |e: csv::Error| InputError::Unreadable {
        path: "<input>".to_string(),
        message: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .quoting(false)
        .flexible(true)
        .from_reader(reader);
    let header = reader
        .headers()
        .map_err(unreadable)?
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>();
    let header = canonicalize_header(&header, batch_id);
    let core = CoreColumns::new(&header)?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(unreadable)?;
        let row_no = i + 2;
        if record.len() != header.len() {
            return Err(InputError::RaggedRow {
                row: row_no,
                actual: record.len(),
                expected: header.len(),
            });
        }
        let values = record.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let sv_type = values[core.sv_type].trim();
        let sv_type = sv_type
            .parse::<SvType>()
            .map_err(|_| InputError::InvalidSvType {
                row: row_no,
                value: sv_type.to_string(),
            })?;
        // Only validated, the length column is merged from the raw cells.
        parse_int(row_no, columns::SV_LENGTH, &values[core.sv_length])?;
        rows.push(AnnotationRow {
            gene_name: values[core.gene_name].clone(),
            sv_type,
            chromosome: values[core.chromosome].trim().to_string(),
            start: parse_int(row_no, columns::SV_START, &values[core.start])?,
            end: parse_int(row_no, columns::SV_END, &values[core.end])?,
            values,
        });
    }

    Ok(AnnotationTable { header, rows })
}

/// Load the AnnotSV table from a (possibly gzip-compressed) file.
#[tracing::instrument]
pub fn load_annotation_table(path: &Path, batch_id: &str) -> Result<AnnotationTable, InputError> {
    tracing::debug!("loading AnnotSV rows from {:?}...", path);
    let reader = open_read_maybe_gz(path).map_err(|e| InputError::Unreadable {
        path: format!("{}", path.display()),
        message: e.root_cause().to_string(),
    })?;
    let table = read_annotation_table(reader, batch_id).map_err(|e| match e {
        InputError::Unreadable { message, .. } => InputError::Unreadable {
            path: format!("{}", path.display()),
            message,
        },
        e => e,
    })?;
    tracing::debug!("... done loading {} rows", table.rows.len());

    Ok(table)
}
