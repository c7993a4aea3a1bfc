//! Declarative table of the merge policy for each AnnotSV field.

use regex::Regex;

use super::schema::columns;
use crate::err::InputError;

lazy_static::lazy_static! {
    static ref SPLIT_COMMA: Regex = Regex::new(",").unwrap();
    static ref SPLIT_SEMICOLON: Regex = Regex::new(";").unwrap();
    static ref SPLIT_SLASH: Regex = Regex::new("/").unwrap();
    static ref SPLIT_SLASH_SEMICOLON: Regex = Regex::new("/|;").unwrap();
    static ref SPLIT_PMIDS: Regex = Regex::new("//|;|/").unwrap();
    static ref SPLIT_INHERITANCE: Regex = Regex::new(",|//|/|;").unwrap();
}

/// Delimiter used for splitting list-valued fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Split {
    #[strum(serialize = ",")]
    Comma,
    #[strum(serialize = ";")]
    Semicolon,
    #[strum(serialize = "/")]
    Slash,
    #[strum(serialize = "/|;")]
    SlashOrSemicolon,
    /// `//`, `;`, or `/` as found in DDD PubMed ID lists
    #[strum(serialize = "//|;|/")]
    Pmids,
    /// `,`, `//`, `/`, or `;` as found in OMIM inheritance lists
    #[strum(serialize = ",|//|/|;")]
    Inheritance,
}

impl Split {
    /// The compiled regular expression to split with.
    pub fn regex(&self) -> &'static Regex {
        match self {
            Split::Comma => &SPLIT_COMMA,
            Split::Semicolon => &SPLIT_SEMICOLON,
            Split::Slash => &SPLIT_SLASH,
            Split::SlashOrSemicolon => &SPLIT_SLASH_SEMICOLON,
            Split::Pmids => &SPLIT_PMIDS,
            Split::Inheritance => &SPLIT_INHERITANCE,
        }
    }
}

/// How the values of one field collapse into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Value of the first row.
    First,
    /// Value of the last row.
    Last,
    /// Integer sum over all rows.
    Sum,
    /// Smallest number, ignoring placeholders.
    Min,
    /// Largest number, ignoring placeholders.
    Max,
    /// Union of unique sub-values.
    Unique { split: Split, join: &'static str },
    /// Spliced first/last location.
    Location,
    /// Rebuilt from the collapsed coordinates.
    AnnotSvId,
    /// Keys of the paired dictionary with `value_field`.
    PairedKeys { value_field: &'static str },
    /// Values of the paired dictionary, keyed by `GD_ID`.
    PairedValues,
}

const COMMA: Policy = Policy::Unique {
    split: Split::Comma,
    join: ", ",
};
const SEMICOLON: Policy = Policy::Unique {
    split: Split::Semicolon,
    join: ", ",
};

/// The catalogue of AnnotSV fields and their merge policy.
pub const FIELD_POLICIES: &[(&str, Policy)] = &[
    (columns::ANNOTSV_ID, Policy::AnnotSvId),
    (columns::SV_CHROM, Policy::First),
    (columns::SV_START, Policy::First),
    (columns::SV_END, Policy::Last),
    (columns::SV_LENGTH, Policy::Sum),
    (columns::SV_TYPE, Policy::First),
    ("CopyNumber", Policy::First),
    ("AnnotSV type", Policy::First),
    (columns::GENE_NAME, Policy::First),
    ("NM", Policy::First),
    ("CDS length", Policy::Sum),
    ("tx length", Policy::Sum),
    (columns::LOCATION, Policy::Location),
    ("intersectStart", Policy::First),
    ("intersectEnd", Policy::Last),
    ("DGV_GAIN_IDs", COMMA),
    ("DGV_GAIN_n_samples_with_SV", Policy::Min),
    ("DGV_GAIN_n_samples_tested", Policy::Min),
    ("DGV_GAIN_Frequency", Policy::Min),
    ("DGV_LOSS_IDs", COMMA),
    ("DGV_LOSS_n_samples_with_SV", Policy::Min),
    ("DGV_LOSS_n_samples_tested", Policy::Min),
    ("DGV_LOSS_Frequency", Policy::Min),
    (
        columns::GD_ID,
        Policy::PairedKeys {
            value_field: "GD_AN",
        },
    ),
    ("GD_AN", Policy::PairedValues),
    ("GD_N_HET", Policy::PairedValues),
    ("GD_N_HOMALT", Policy::PairedValues),
    ("GD_AF", Policy::Min),
    ("GD_POPMAX_AF", Policy::Min),
    ("GD_ID_others", SEMICOLON),
    ("DDD_SV", SEMICOLON),
    ("DDD_DUP_n_samples_with_SV", Policy::Max),
    ("DDD_DUP_Frequency", Policy::Max),
    ("DDD_DEL_n_samples_with_SV", Policy::Max),
    ("DDD_DEL_Frequency", Policy::Max),
    ("1000g_event", SEMICOLON),
    ("1000g_AF", Policy::Min),
    ("1000g_max_AF", Policy::Min),
    ("IMH_ID", SEMICOLON),
    ("IMH_AF", Policy::Min),
    ("IMH_ID_others", SEMICOLON),
    ("promoters", COMMA),
    ("dbVar_event", COMMA),
    ("dbVar_variant", COMMA),
    ("dbVar_status", COMMA),
    ("TADcoordinates", COMMA),
    ("ENCODEexperiments", COMMA),
    (columns::HOM, COMMA),
    (columns::HTZ, COMMA),
    ("GCcontent_left", Policy::First),
    ("GCcontent_right", Policy::Last),
    ("Repeats_coord_left", Policy::First),
    ("Repeats_coord_right", Policy::Last),
    ("Repeats_type_left", Policy::First),
    ("Repeats_type_right", Policy::Last),
    ("ACMG", COMMA),
    ("HI_CGscore", Policy::Min),
    ("TriS_CGscore", COMMA),
    (
        "DDD_status",
        Policy::Unique {
            split: Split::Slash,
            join: "/",
        },
    ),
    (
        "DDD_mode",
        Policy::Unique {
            split: Split::Slash,
            join: "/",
        },
    ),
    (
        "DDD_consequence",
        Policy::Unique {
            split: Split::Slash,
            join: ", ",
        },
    ),
    (
        "DDD_disease",
        Policy::Unique {
            split: Split::Slash,
            join: ", ",
        },
    ),
    (
        "DDD_pmids",
        Policy::Unique {
            split: Split::Pmids,
            join: ", ",
        },
    ),
    ("HI_DDDpercent", Policy::Min),
    ("synZ_ExAC", Policy::Max),
    ("misZ_ExAC", Policy::Max),
    ("pLI_ExAC", Policy::Max),
    ("delZ_ExAC", Policy::Max),
    ("dupZ_ExAC", Policy::Max),
    ("cnvZ_ExAC", Policy::Max),
    ("morbidGenes", COMMA),
    ("morbidGenesCandidates", COMMA),
    ("Mim Number", SEMICOLON),
    (
        "Phenotypes",
        Policy::Unique {
            split: Split::SlashOrSemicolon,
            join: "; ",
        },
    ),
    (
        "Inheritance",
        Policy::Unique {
            split: Split::Inheritance,
            join: ", ",
        },
    ),
    ("AnnotSV ranking", Policy::Max),
    ("Mappability", Policy::First),
    ("NA12878_mode_CN", Policy::First),
    ("Repeatability_Score", Policy::Min),
];

/// Policy of the field `name`, `None` for fields outside of the catalogue.
pub fn policy_for(name: &str) -> Option<Policy> {
    FIELD_POLICIES
        .iter()
        .find(|(field, _)| *field == name)
        .map(|(_, policy)| *policy)
}

/// A column's policy resolved against the input header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnPlan {
    /// Column not in the catalogue, written blank.
    Blank,
    First,
    Last,
    Sum,
    Min,
    Max,
    Unique { split: Split, join: &'static str },
    Location,
    AnnotSvId,
    /// Keys of `GD_ID` paired with the values at `value_idx`.
    PairedKeys { value_idx: usize },
    /// Values at this column paired with the keys at `key_idx`.
    PairedValues { key_idx: usize },
}

/// The merge plan for all columns of one input table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapsePlan {
    /// Input column names, in header order.
    pub names: Vec<String>,
    /// One entry per input column, in header order.
    pub columns: Vec<ColumnPlan>,
}

impl CollapsePlan {
    /// Resolve the field catalogue against `header`.
    ///
    /// Fails if any catalogued field is missing from `header`.
    pub fn new(header: &[String]) -> Result<Self, InputError> {
        let missing = FIELD_POLICIES
            .iter()
            .filter(|(field, _)| !header.iter().any(|name| name == field))
            .map(|(field, _)| field.to_string())
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(InputError::MissingColumns(missing));
        }

        let index_of = |field: &str| -> Result<usize, InputError> {
            header
                .iter()
                .position(|name| name == field)
                .ok_or_else(|| InputError::MissingColumns(vec![field.to_string()]))
        };

        let mut columns = Vec::with_capacity(header.len());
        for name in header {
            let column = match policy_for(name) {
                None => ColumnPlan::Blank,
                Some(Policy::First) => ColumnPlan::First,
                Some(Policy::Last) => ColumnPlan::Last,
                Some(Policy::Sum) => ColumnPlan::Sum,
                Some(Policy::Min) => ColumnPlan::Min,
                Some(Policy::Max) => ColumnPlan::Max,
                Some(Policy::Unique { split, join }) => ColumnPlan::Unique { split, join },
                Some(Policy::Location) => ColumnPlan::Location,
                Some(Policy::AnnotSvId) => ColumnPlan::AnnotSvId,
                Some(Policy::PairedKeys { value_field }) => ColumnPlan::PairedKeys {
                    value_idx: index_of(value_field)?,
                },
                Some(Policy::PairedValues) => ColumnPlan::PairedValues {
                    key_idx: index_of(columns::GD_ID)?,
                },
            };
            columns.push(column);
        }

        Ok(Self {
            names: header.to_vec(),
            columns,
        })
    }
}
