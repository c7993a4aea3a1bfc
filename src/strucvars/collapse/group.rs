//! Partitioning of rows into gene groups.

use std::ops::Range;

/// Index ranges of maximal contiguous runs of equal gene names.
///
/// Non-adjacent runs of the same gene yield separate ranges.
pub fn gene_groups<S: AsRef<str>>(gene_names: &[S]) -> Vec<Range<usize>> {
    let mut result = Vec::new();
    let mut begin = 0;
    for i in 1..=gene_names.len() {
        if i == gene_names.len() || gene_names[i].as_ref() != gene_names[begin].as_ref() {
            result.push(begin..i);
            begin = i;
        }
    }
    result
}
