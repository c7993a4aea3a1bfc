use std::num::{ParseFloatError, ParseIntError};

/// Violations of the input contract, reported before any group is collapsed.
#[derive(thiserror::Error, Debug)]
pub enum InputError {
    #[error("problem reading {path}: {message}")]
    Unreadable { path: String, message: String },
    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("row {row}: invalid integer {value:?} in column {column:?}: {source}")]
    InvalidInteger {
        row: usize,
        column: String,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("row {row}: invalid SV type {value:?}, expected DEL or DUP")]
    InvalidSvType { row: usize, value: String },
    #[error("row {row}: has {actual} fields but header has {expected}")]
    RaggedRow {
        row: usize,
        actual: usize,
        expected: usize,
    },
    #[error("could not determine batch identifier from {0:?}")]
    NoBatchId(String),
}

/// Failures while merging the values of one field.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MergeError {
    #[error("invalid numeric token {token:?}: {source}")]
    InvalidNumber {
        token: String,
        #[source]
        source: ParseFloatError,
    },
    #[error("invalid integer token {token:?}: {source}")]
    InvalidInteger {
        token: String,
        #[source]
        source: ParseIntError,
    },
    #[error("sum overflows when adding {token:?}")]
    Overflow { token: String },
}

/// Failure collapsing the group of one gene.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("collapsing gene {gene:?}, field {field:?}: {source}")]
pub struct CollapseError {
    pub gene: String,
    pub field: String,
    #[source]
    pub source: MergeError,
}
