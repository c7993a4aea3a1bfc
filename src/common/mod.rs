//! Common functionality.

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

pub mod io;

pub use io::{open_read_maybe_gz, open_write_maybe_gz};

/// Commonly used command line arguments.
#[derive(Parser, Debug)]
pub struct Args {
    /// Verbosity of the program
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            verbose: Verbosity::new(0, 0),
        }
    }
}

/// Placeholder that AnnotSV writes for "not available".
pub const PLACEHOLDER: &str = "-";

/// Whether a raw cell value carries no information (empty or placeholder).
pub fn is_missing(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == PLACEHOLDER
}

/// Return chromosome name with a single leading `chr`.
pub fn ucsc_chrom_name(chrom: &str) -> String {
    let bare = chrom
        .strip_prefix("chr")
        .or_else(|| chrom.strip_prefix("CHR"))
        .or_else(|| chrom.strip_prefix("Chr"))
        .unwrap_or(chrom);
    format!("chr{bare}")
}

/// Return the version of the `cnv-collapse-worker` crate and `x.y.z` in tests.
pub fn worker_version() -> &'static str {
    if cfg!(test) {
        "x.y.z"
    } else {
        env!("CARGO_PKG_VERSION")
    }
}
