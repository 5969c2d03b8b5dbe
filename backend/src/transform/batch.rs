//! Batch transformation over a lazy row sequence.
//!
//! [`transform_batch`] is fail-fast: it yields one result per row, and the
//! first failing row is yielded as a [`RowError`] after which the iterator
//! ends. [`run_batch`] applies a [`BatchPolicy`] on top and collects the
//! outcome.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::iter::FusedIterator;

use super::mapping::MappingTable;
use super::row::transform_row;
use crate::error::RowError;
use crate::models::{Node, RawRow};

/// What to do with a row whose transformation fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchPolicy {
    /// Abort the whole batch on the first failing row.
    #[default]
    #[serde(alias = "strict")]
    FailFast,
    /// Drop failing rows and report them alongside the output.
    #[serde(alias = "skip")]
    SkipInvalid,
}

impl std::str::FromStr for BatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail-fast" | "failfast" | "strict" => Ok(BatchPolicy::FailFast),
            "skip-invalid" | "skip" | "lenient" => Ok(BatchPolicy::SkipInvalid),
            other => Err(format!("unknown batch policy '{}' (expected fail-fast or skip-invalid)", other)),
        }
    }
}

impl std::fmt::Display for BatchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchPolicy::FailFast => write!(f, "fail-fast"),
            BatchPolicy::SkipInvalid => write!(f, "skip-invalid"),
        }
    }
}

/// Lazy, fail-fast iterator returned by [`transform_batch`].
pub struct TransformBatch<'m, I> {
    rows: I,
    mappings: &'m MappingTable,
    index: usize,
    failed: bool,
}

impl<I> Iterator for TransformBatch<'_, I>
where
    I: Iterator,
    I::Item: Borrow<RawRow>,
{
    type Item = Result<Node, RowError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let row = self.rows.next()?;
        let index = self.index;
        self.index += 1;

        match transform_row(row.borrow(), self.mappings) {
            Ok(node) => Some(Ok(node)),
            Err(source) => {
                self.failed = true;
                Some(Err(RowError { row: index, source }))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            (0, Some(0))
        } else {
            let (_, upper) = self.rows.size_hint();
            (0, upper)
        }
    }
}

impl<I> FusedIterator for TransformBatch<'_, I>
where
    I: Iterator,
    I::Item: Borrow<RawRow>,
{
}

/// Transform rows one by one, in order, stopping after the first failure.
///
/// Row indices in errors are zero-based over data rows. An empty input
/// yields nothing.
pub fn transform_batch<I>(rows: I, mappings: &MappingTable) -> TransformBatch<'_, I::IntoIter>
where
    I: IntoIterator,
    I::Item: Borrow<RawRow>,
{
    TransformBatch {
        rows: rows.into_iter(),
        mappings,
        index: 0,
        failed: false,
    }
}

/// Collected result of [`run_batch`].
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Transformed rows, in input order.
    pub records: Vec<Node>,
    /// Rows dropped under [`BatchPolicy::SkipInvalid`].
    pub skipped: Vec<RowError>,
}

impl BatchOutcome {
    pub fn summary(&self) -> String {
        format!(
            "Transformed: {} records, {} skipped",
            self.records.len(),
            self.skipped.len()
        )
    }
}

/// Transform every row under `policy`.
///
/// # Errors
/// With [`BatchPolicy::FailFast`], the first [`RowError`]. With
/// [`BatchPolicy::SkipInvalid`] this never fails.
pub fn run_batch<I>(
    rows: I,
    mappings: &MappingTable,
    policy: BatchPolicy,
) -> Result<BatchOutcome, RowError>
where
    I: IntoIterator,
    I::Item: Borrow<RawRow>,
{
    let mut outcome = BatchOutcome::default();

    match policy {
        BatchPolicy::FailFast => {
            for result in transform_batch(rows, mappings) {
                outcome.records.push(result?);
            }
        }
        BatchPolicy::SkipInvalid => {
            for (index, row) in rows.into_iter().enumerate() {
                match transform_row(row.borrow(), mappings) {
                    Ok(node) => outcome.records.push(node),
                    Err(source) => outcome.skipped.push(RowError { row: index, source }),
                }
            }
        }
    }

    Ok(outcome)
}
