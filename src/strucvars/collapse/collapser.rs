//! Collapsing of gene groups into one row each.

use itertools::Itertools;
use rayon::prelude::*;

use super::{
    cytoband::{CytobandResolver, UNKNOWN_CYTOBAND},
    diagnostics::Diagnostic,
    group::gene_groups,
    merge,
    policy::{CollapsePlan, ColumnPlan},
    schema::{AnnotationRow, AnnotationTable, CollapsedRow},
};
use crate::{
    common::is_missing,
    err::{CollapseError, MergeError},
};

/// Result of collapsing one gene group.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupOutcome {
    /// The group was collapsed, possibly with recoverable problems.
    Collapsed {
        row: CollapsedRow,
        diagnostics: Vec<Diagnostic>,
    },
    /// The group was skipped.
    Skipped { diagnostic: Diagnostic },
    /// The group had no rows.
    Empty,
}

/// Result of collapsing a whole table.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CollapsedTable {
    /// Output rows in order of the gene groups.
    pub rows: Vec<CollapsedRow>,
    /// Diagnostics in order of the gene groups.
    pub diagnostics: Vec<Diagnostic>,
}

/// A fatal error while collapsing a table.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{error}")]
pub struct CollapseFailure {
    /// Diagnostics of the groups before the failing one.
    pub diagnostics: Vec<Diagnostic>,
    pub error: CollapseError,
}

/// Collapses the rows of one gene group according to a `CollapsePlan`.
#[derive(Debug, derive_new::new)]
pub struct RowCollapser<'a> {
    plan: &'a CollapsePlan,
    cytobands: &'a CytobandResolver,
    batch_id: &'a str,
}

impl<'a> RowCollapser<'a> {
    /// Collapse `rows`, which must be non-empty and share one gene name.
    pub fn collapse_group(&self, rows: &[AnnotationRow]) -> Result<GroupOutcome, CollapseError> {
        let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
            return Ok(GroupOutcome::Empty);
        };

        // All rows of a group must have the same SV type.
        if rows.iter().any(|row| row.sv_type != first.sv_type) {
            tracing::debug!("mixed SV types in gene {}, skipping", &first.gene_name);
            return Ok(GroupOutcome::Skipped {
                diagnostic: Diagnostic::MixedSvTypes {
                    gene: first.gene_name.clone(),
                },
            });
        }

        let mut diagnostics = Vec::new();
        let cytoband = match self.cytobands.resolve(&first.chromosome, first.start) {
            Some(cytoband) => cytoband,
            None => {
                tracing::warn!(
                    "variant {}:{} in gene {} not found in cytoband data",
                    &first.chromosome,
                    first.start,
                    &first.gene_name
                );
                diagnostics.push(Diagnostic::UnresolvedCytoband {
                    gene: first.gene_name.clone(),
                    chromosome: first.chromosome.clone(),
                    position: first.start,
                });
                UNKNOWN_CYTOBAND.to_string()
            }
        };

        let values = self
            .plan
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                self.collapse_column(rows, first, last, idx, column)
                    .map_err(|source| CollapseError {
                        gene: first.gene_name.clone(),
                        field: self.plan.names[idx].clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(GroupOutcome::Collapsed {
            row: CollapsedRow {
                batch_id: self.batch_id.to_string(),
                merge_count: rows.len(),
                cytoband,
                values,
            },
            diagnostics,
        })
    }

    /// Collapse the values of column `idx`.
    fn collapse_column(
        &self,
        rows: &[AnnotationRow],
        first: &AnnotationRow,
        last: &AnnotationRow,
        idx: usize,
        column: &ColumnPlan,
    ) -> Result<Option<String>, MergeError> {
        let cells = move || rows.iter().map(move |row| row.values[idx].as_str());
        Ok(match column {
            ColumnPlan::Blank => None,
            ColumnPlan::First => Some(first.values[idx].clone()),
            ColumnPlan::Last => Some(last.values[idx].clone()),
            ColumnPlan::Sum => merge::sum_values(cells())?.map(|sum| sum.to_string()),
            ColumnPlan::Min => merge::min_value(cells())?,
            ColumnPlan::Max => merge::max_value(cells())?,
            ColumnPlan::Unique { split, join } => merge::unique_values(cells(), split.regex(), join),
            ColumnPlan::Location => Some(collapse_location(&cells().collect::<Vec<_>>())),
            ColumnPlan::AnnotSvId => Some(format!(
                "{}_{}_{}_{}",
                first.chromosome, first.start, last.end, first.sv_type
            )),
            ColumnPlan::PairedKeys { value_idx } => paired_cells(rows, idx, *value_idx).keys(),
            ColumnPlan::PairedValues { key_idx } => paired_cells(rows, *key_idx, idx).values(),
        })
    }
}

/// Paired dictionary of the keys at `key_idx` and values at `value_idx`.
fn paired_cells(
    rows: &[AnnotationRow],
    key_idx: usize,
    value_idx: usize,
) -> merge::PairedDictionary {
    merge::paired_dictionary(
        rows.iter()
            .map(|row| (row.values[key_idx].as_str(), row.values[value_idx].as_str())),
    )
}

/// Collapse the `location` values of a group.
///
/// A single distinct value is kept as is, otherwise the locations of the
/// first and last row are spliced.
fn collapse_location(locations: &[&str]) -> String {
    let first = locations.first().copied().unwrap_or_default();
    let last = locations.last().copied().unwrap_or_default();
    let distinct = locations
        .iter()
        .filter(|location| !is_missing(location))
        .unique()
        .count();
    if distinct > 1 && !is_missing(first) && !is_missing(last) {
        merge::splice_location(first, last)
    } else {
        first.to_string()
    }
}

/// Collapse all gene groups of `table`.
///
/// Groups are collapsed in parallel, the result is in group order.  On
/// failure, the diagnostics of the groups before the first failing one are
/// returned with the error.
pub fn collapse_table(
    table: &AnnotationTable,
    plan: &CollapsePlan,
    cytobands: &CytobandResolver,
    batch_id: &str,
) -> Result<CollapsedTable, CollapseFailure> {
    let collapser = RowCollapser::new(plan, cytobands, batch_id);
    let gene_names = table
        .rows
        .iter()
        .map(|row| row.gene_name.as_str())
        .collect::<Vec<_>>();
    let groups = gene_groups(&gene_names);
    tracing::debug!(
        "collapsing {} rows in {} gene groups",
        table.rows.len(),
        groups.len()
    );

    let outcomes = groups
        .par_iter()
        .map(|range| collapser.collapse_group(&table.rows[range.clone()]))
        .collect::<Vec<_>>();

    let mut result = CollapsedTable::default();
    for outcome in outcomes {
        match outcome {
            Ok(GroupOutcome::Collapsed { row, diagnostics }) => {
                result.rows.push(row);
                result.diagnostics.extend(diagnostics);
            }
            Ok(GroupOutcome::Skipped { diagnostic }) => {
                tracing::warn!("{}", &diagnostic);
                result.diagnostics.push(diagnostic);
            }
            Ok(GroupOutcome::Empty) => (),
            Err(error) => {
                return Err(CollapseFailure {
                    diagnostics: result.diagnostics,
                    error,
                })
            }
        }
    }

    Ok(result)
}
