//! Merging of the values of one field across the rows of a gene group.

use indexmap::IndexMap;
use itertools::Itertools;
use regex::Regex;

use crate::{common::is_missing, err::MergeError};

lazy_static::lazy_static! {
    static ref MULTIPLE_SPACES: Regex = Regex::new(" +").unwrap();
    static ref FIRST_NUMBER: Regex = Regex::new(r"\d+").unwrap();
}

/// Union of all sub-values in `values`, in order of first occurrence.
///
/// Each non-missing value is split on `split`, tokens are trimmed and
/// de-duplicated, and the result is joined with `join`.  Leading and
/// trailing occurrences of `join` are removed from the result, and runs of
/// spaces are collapsed to one.  Returns `None` if all values are missing.
pub fn unique_values<'a, I>(values: I, split: &Regex, join: &str) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut any_present = false;
    let tokens = values
        .into_iter()
        .filter(|value| !is_missing(value))
        .inspect(|_| any_present = true)
        .flat_map(|value| split.split(value))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .unique()
        .collect::<Vec<_>>();
    if !any_present {
        return None;
    }

    let joined = tokens.join(join);
    let stripped = strip_join(&joined, join);
    Some(MULTIPLE_SPACES.replace_all(stripped, " ").into_owned())
}

/// Strip leading and trailing join strings and their trimmed form.
fn strip_join<'a>(value: &'a str, join: &str) -> &'a str {
    let mut patterns = vec![join];
    let trimmed = join.trim();
    if !trimmed.is_empty() && trimmed != join {
        patterns.push(trimmed);
    }

    let mut result = value;
    loop {
        let before = result.len();
        for pattern in &patterns {
            if pattern.is_empty() {
                continue;
            }
            result = result.strip_prefix(pattern).unwrap_or(result);
            result = result.strip_suffix(pattern).unwrap_or(result);
        }
        if result.len() == before {
            break;
        }
    }
    result.trim()
}

/// Parse the numeric candidates for `min_value`/`max_value`.
///
/// Comma-joined lists are flattened.  Missing tokens, `NaN`, and values
/// `<= -1` are dropped.
fn numeric_candidates<'a, I>(values: I) -> Result<Vec<(f64, &'a str)>, MergeError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut result = Vec::new();
    for value in values {
        for token in value.split(',').map(str::trim) {
            if is_missing(token) {
                continue;
            }
            let number: f64 = token.parse().map_err(|e| MergeError::InvalidNumber {
                token: token.to_string(),
                source: e,
            })?;
            if number.is_nan() || number <= -1.0 {
                continue;
            }
            result.push((number, token));
        }
    }
    Ok(result)
}

/// Smallest value, in its original text form.
pub fn min_value<'a, I>(values: I) -> Result<Option<String>, MergeError>
where
    I: IntoIterator<Item = &'a str>,
{
    Ok(numeric_candidates(values)?
        .into_iter()
        .reduce(|best, next| if next.0 < best.0 { next } else { best })
        .map(|(_, text)| text.to_string()))
}

/// Largest value, in its original text form.
pub fn max_value<'a, I>(values: I) -> Result<Option<String>, MergeError>
where
    I: IntoIterator<Item = &'a str>,
{
    Ok(numeric_candidates(values)?
        .into_iter()
        .reduce(|best, next| if next.0 > best.0 { next } else { best })
        .map(|(_, text)| text.to_string()))
}

/// Sum of integer values, missing values are skipped.
pub fn sum_values<'a, I>(values: I) -> Result<Option<i64>, MergeError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut result = None;
    for value in values {
        let value = value.trim();
        if is_missing(value) {
            continue;
        }
        let number: i64 = value.parse().map_err(|e| MergeError::InvalidInteger {
            token: value.to_string(),
            source: e,
        })?;
        result = Some(
            result
                .unwrap_or(0i64)
                .checked_add(number)
                .ok_or_else(|| MergeError::Overflow {
                    token: value.to_string(),
                })?,
        );
    }
    Ok(result)
}

/// Identifier to value mapping rebuilt from parallel `;`-separated lists.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PairedDictionary {
    pub entries: IndexMap<String, String>,
}

impl PairedDictionary {
    /// Keys in insertion order, joined with `", "`.
    pub fn keys(&self) -> Option<String> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.entries.keys().join(", "))
        }
    }

    /// Values in insertion order, joined with `", "`.
    pub fn values(&self) -> Option<String> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.entries.values().join(", "))
        }
    }
}

/// Zip `(keys, values)` cells of each row into one mapping.
///
/// Keys seen in an earlier row win; later duplicates are dropped.
pub fn paired_dictionary<'a, I>(cells: I) -> PairedDictionary
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut entries = IndexMap::new();
    for (keys, values) in cells {
        for (key, value) in keys.split(';').zip(values.split(';')) {
            let key = key.trim();
            if is_missing(key) || entries.contains_key(key) {
                continue;
            }
            entries.insert(key.to_string(), value.trim().to_string());
        }
    }
    PairedDictionary { entries }
}

/// Split an AnnotSV location such as `exon3-intron5` into its two ends.
fn location_ends(location: &str) -> (&str, &str) {
    location.split_once('-').unwrap_or((location, location))
}

/// First run of digits in `location`, e.g., `3` for `exon3-intron5`.
fn location_number(location: &str) -> Option<u64> {
    FIRST_NUMBER
        .find(location)
        .and_then(|m| m.as_str().parse().ok())
}

/// Splice the location of the first and last row of a group.
///
/// The left end is taken from `first`, the right end from `last`, unless the
/// number in `first` is larger than the one in `last`, then the two are
/// swapped.
pub fn splice_location(first: &str, last: &str) -> String {
    let swap = matches!(
        (location_number(first), location_number(last)),
        (Some(a), Some(b)) if a > b
    );
    let (left, right) = if swap { (last, first) } else { (first, last) };
    format!("{}-{}", location_ends(left).0, location_ends(right).1)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use regex::Regex;

    use crate::err::MergeError;

    #[rstest::rstest]
    #[case(&["a,b", "b,c"], ",", ", ", Some("a, b, c"))]
    #[case(&["-", "", "a"], ",", ", ", Some("a"))]
    #[case(&["-", ""], ",", ", ", None)]
    #[case(&[], ",", ", ", None)]
    #[case(&["a, b", "b"], ",", ", ", Some("a, b"))]
    #[case(&["AR/AD", "AD"], "/", "/", Some("AR/AD"))]
    #[case(&["1234//5678;1234/9"], "//|;|/", ", ", Some("1234, 5678, 9"))]
    #[case(&["Disease A/Disease  B;Disease A"], "/|;", "; ", Some("Disease A; Disease B"))]
    #[case(&["AD,AR//XL;AD"], ",|//|/|;", ", ", Some("AD, AR, XL"))]
    #[case(&[",a,", "a, "], ",", ", ", Some("a"))]
    #[case(&["a;", ";b"], ";", ", ", Some("a, b"))]
    fn unique_values(
        #[case] values: &[&str],
        #[case] split: &str,
        #[case] join: &str,
        #[case] expected: Option<&str>,
    ) {
        let split = Regex::new(split).unwrap();
        let actual = super::unique_values(values.iter().copied(), &split, join);
        assert_eq!(expected.map(str::to_string), actual);
    }

    #[test]
    fn unique_values_all_blank_tokens() {
        let split = Regex::new(",").unwrap();
        let actual = super::unique_values([",", " , "], &split, ", ");
        assert_eq!(Some(String::new()), actual);
    }

    #[rstest::rstest]
    #[case(&["nssv1,nssv2", "nssv2,nssv3", "nssv1"], ",", ", ")]
    #[case(&["AR/AD", "XL/AR"], "/", "/")]
    #[case(&["A;B", "B;C"], ";", ", ")]
    fn unique_values_idempotent(
        #[case] values: &[&str],
        #[case] split: &str,
        #[case] join: &str,
    ) {
        let split = Regex::new(split).unwrap();
        let once = super::unique_values(values.iter().copied(), &split, join).unwrap();
        let rejoin = Regex::new(&regex::escape(join.trim())).unwrap();
        let twice = super::unique_values([once.as_str()], &rejoin, join).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn min_max_exclude_sentinels() -> Result<(), anyhow::Error> {
        let values = ["-1", "0.2", "-", "0.05"];
        assert_eq!(Some("0.05".to_string()), super::min_value(values)?);
        assert_eq!(Some("0.2".to_string()), super::max_value(values)?);
        Ok(())
    }

    #[rstest::rstest]
    #[case(&["0.50", "0.7"], Some("0.50"), Some("0.7"))]
    #[case(&["3,10", "7"], Some("3"), Some("10"))]
    #[case(&["-1", "-", ""], None, None)]
    #[case(&["-1.5", "-0.5"], Some("-0.5"), Some("-0.5"))]
    #[case(&["0.5", "0.50"], Some("0.5"), Some("0.5"))]
    #[case(&["10", "9"], Some("9"), Some("10"))]
    #[case(&["1e-3", "0.01"], Some("1e-3"), Some("0.01"))]
    fn min_max(
        #[case] values: &[&str],
        #[case] expected_min: Option<&str>,
        #[case] expected_max: Option<&str>,
    ) -> Result<(), anyhow::Error> {
        assert_eq!(
            expected_min.map(str::to_string),
            super::min_value(values.iter().copied())?
        );
        assert_eq!(
            expected_max.map(str::to_string),
            super::max_value(values.iter().copied())?
        );
        Ok(())
    }

    #[test]
    fn min_value_malformed_token() {
        let err = super::min_value(["0.1", "abc"]).unwrap_err();
        assert!(matches!(
            err,
            crate::err::MergeError::InvalidNumber { ref token, .. } if token == "abc"
        ));
    }

    #[test]
    fn max_value_malformed_list_token() {
        assert!(super::max_value(["1,x"]).is_err());
    }

    #[rstest::rstest]
    #[case(&["100", "150"], Some(250))]
    #[case(&["-100", "-150"], Some(-250))]
    #[case(&["-", "12"], Some(12))]
    #[case(&["-", ""], None)]
    fn sum_values(#[case] values: &[&str], #[case] expected: Option<i64>) {
        assert_eq!(expected, super::sum_values(values.iter().copied()).unwrap());
    }

    #[test]
    fn sum_values_malformed() {
        assert!(super::sum_values(["1.5"]).is_err());
    }

    #[test]
    fn sum_values_overflow() {
        assert_eq!(
            Err(MergeError::Overflow {
                token: "1".to_string()
            }),
            super::sum_values(["9223372036854775807", "-", "1"])
        );
    }

    #[test]
    fn paired_dictionary_first_wins() {
        let dict = super::paired_dictionary([("A;B", "10;20"), ("B;C", "99;30")]);
        assert_eq!(Some("A, B, C".to_string()), dict.keys());
        assert_eq!(Some("10, 20, 30".to_string()), dict.values());
        assert_eq!(Some(&"20".to_string()), dict.entries.get("B"));
    }

    #[test]
    fn paired_dictionary_skips_placeholders() {
        let dict = super::paired_dictionary([("-", "-"), ("gnomAD_DEL_1", "7"), ("", "")]);
        assert_eq!(Some("gnomAD_DEL_1".to_string()), dict.keys());
        assert_eq!(Some("7".to_string()), dict.values());
    }

    #[test]
    fn paired_dictionary_empty() {
        let dict = super::paired_dictionary([("-", "-")]);
        assert_eq!(None, dict.keys());
        assert_eq!(None, dict.values());
    }

    #[test]
    fn paired_dictionary_short_values() {
        let dict = super::paired_dictionary([("A;B;C", "1;2")]);
        assert_eq!(Some("A, B".to_string()), dict.keys());
    }

    #[rstest::rstest]
    #[case("exon1-intron2", "exon4-txEnd", "exon1-txEnd")]
    #[case("exon4-txEnd", "exon1-intron2", "exon1-txEnd")]
    #[case("txStart-exon3", "intron5-txEnd", "txStart-txEnd")]
    #[case("exon10-exon10", "exon9-exon9", "exon9-exon10")]
    #[case("exon2", "exon3", "exon2-exon3")]
    fn splice_location(#[case] first: &str, #[case] last: &str, #[case] expected: &str) {
        assert_eq!(expected, super::splice_location(first, last));
    }
}
