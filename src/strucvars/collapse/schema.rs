//! Records and tables of the collapse step.

use strum_macros::{Display, EnumString};

/// Names of the AnnotSV columns that are interpreted beyond their policy.
pub mod columns {
    pub const ANNOTSV_ID: &str = "AnnotSV ID";
    pub const SV_CHROM: &str = "SV chrom";
    pub const SV_START: &str = "SV start";
    pub const SV_END: &str = "SV end";
    pub const SV_LENGTH: &str = "SV length";
    pub const SV_TYPE: &str = "SV type";
    pub const GENE_NAME: &str = "Gene name";
    pub const LOCATION: &str = "location";
    pub const GD_ID: &str = "GD_ID";
    pub const HOM: &str = "#hom";
    pub const HTZ: &str = "#htz";

    /// Columns prepended to the output table.
    pub const BATCH_ID: &str = "Phenotips ID";
    pub const MERGE_COUNT: &str = "MergeCount";
    pub const CYTOBAND: &str = "CytoBand";
}

/// Type of a copy number variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum SvType {
    /// Deletion
    Del,
    /// Duplication
    Dup,
}

/// One AnnotSV row with its positional core parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRow {
    pub gene_name: String,
    pub sv_type: SvType,
    pub chromosome: String,
    /// 1-based start position
    pub start: i64,
    /// 1-based end position
    pub end: i64,
    /// Raw cell values, aligned with the table header.
    pub values: Vec<String>,
}

/// The AnnotSV input table, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationTable {
    /// Header after renaming the per-batch `#hom`/`#htz` columns.
    pub header: Vec<String>,
    pub rows: Vec<AnnotationRow>,
}

/// One output row per gene group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapsedRow {
    pub batch_id: String,
    /// Number of input rows merged into this one.
    pub merge_count: usize,
    pub cytoband: String,
    /// Collapsed values, aligned with the input header; `None` when nothing
    /// could be derived.
    pub values: Vec<Option<String>>,
}
