//! Lookup of cytogenetic bands from the UCSC `cytoBand.txt` table.

use std::path::Path;

use indexmap::IndexMap;

use crate::common::{open_read_maybe_gz, ucsc_chrom_name};

/// Band value used when no band can be found.
pub const UNKNOWN_CYTOBAND: &str = "unk";

/// Module with code for loading data from input.
mod input {
    use serde::Deserialize;

    /// One line of the UCSC `cytoBand.txt` file.
    #[derive(Deserialize, Debug)]
    pub struct Record {
        pub chrom: String,
        pub start: i64,
        pub end: i64,
        pub band: String,
        #[allow(dead_code)]
        pub gie_stain: String,
    }
}

/// A cytogenetic band.
#[derive(Debug, Clone, PartialEq, Eq, derive_new::new)]
pub struct CytobandEntry {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub band: String,
}

/// Cytogenetic bands, grouped by chromosome in table order.
#[derive(Debug, Default, Clone)]
pub struct CytobandResolver {
    by_chrom: IndexMap<String, Vec<CytobandEntry>>,
}

impl CytobandResolver {
    /// Construct from entries sorted by position within each chromosome.
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = CytobandEntry>,
    {
        let mut by_chrom: IndexMap<String, Vec<CytobandEntry>> = IndexMap::new();
        for entry in entries {
            by_chrom.entry(entry.chrom.clone()).or_default().push(entry);
        }
        Self { by_chrom }
    }

    /// Load from a (possibly gzip-compressed) headerless TSV file.
    #[tracing::instrument]
    pub fn from_path(path: &Path) -> Result<Self, anyhow::Error> {
        tracing::debug!("loading cytobands from {:?}...", path);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .delimiter(b'\t')
            .from_reader(open_read_maybe_gz(path)?);

        let mut entries = Vec::new();
        for record in reader.deserialize() {
            let record: input::Record =
                record.map_err(|e| anyhow::anyhow!("problem parsing {:?}: {}", path, e))?;
            entries.push(CytobandEntry::new(
                record.chrom,
                record.start,
                record.end,
                record.band,
            ));
        }
        tracing::debug!("... done loading {} cytobands", entries.len());

        Ok(Self::new(entries))
    }

    /// Total number of bands.
    pub fn len(&self) -> usize {
        self.by_chrom.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_chrom.is_empty()
    }

    /// Label of the last band on `chromosome` that starts at or before
    /// `position`, e.g., `chr1p36.33`.
    pub fn resolve(&self, chromosome: &str, position: i64) -> Option<String> {
        let chrom = ucsc_chrom_name(chromosome);
        self.by_chrom
            .get(&chrom)?
            .iter()
            .rev()
            .find(|entry| entry.start <= position)
            .map(|entry| format!("{}{}", chrom, entry.band))
    }
}
