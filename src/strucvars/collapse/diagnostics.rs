//! The per-run diagnostics log.

use std::io::Write;

use chrono::{DateTime, Local};

use super::cytoband::UNKNOWN_CYTOBAND;

/// A recoverable problem found while collapsing one gene group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The group mixes deletions and duplications and was skipped.
    MixedSvTypes { gene: String },
    /// No cytoband could be found for the collapsed variant.
    UnresolvedCytoband {
        gene: String,
        chromosome: String,
        position: i64,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::MixedSvTypes { gene } => write!(
                f,
                "Error: DEL and DUP in gene {}... not including in output file.",
                gene
            ),
            Diagnostic::UnresolvedCytoband {
                gene,
                chromosome,
                position,
            } => write!(
                f,
                "Warning: variant at {}:{} in gene {} not found in cytoband data, using {:?}.",
                chromosome, position, gene, UNKNOWN_CYTOBAND
            ),
        }
    }
}

/// Write the header line of the diagnostics log.
pub fn write_header<W: Write>(
    writer: &mut W,
    batch_id: &str,
    started: DateTime<Local>,
) -> Result<(), anyhow::Error> {
    writeln!(
        writer,
        "************ cnv_collapse error log: {} ({}) ************",
        batch_id,
        started.format("%Y-%m-%d %H:%M:%S")
    )?;

    Ok(())
}

/// Write one line per diagnostic.
pub fn write_diagnostics<W: Write>(
    writer: &mut W,
    diagnostics: &[Diagnostic],
) -> Result<(), anyhow::Error> {
    for diagnostic in diagnostics {
        writeln!(writer, "{}", diagnostic)?;
    }

    Ok(())
}

/// Write the error that aborted the run.
pub fn write_error<W: Write>(
    writer: &mut W,
    error: &dyn std::fmt::Display,
) -> Result<(), anyhow::Error> {
    writeln!(writer, "Error: {}", error)?;

    Ok(())
}
