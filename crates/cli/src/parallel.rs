//! Parallel file processing utilities.

use std::path::Path;

use anyhow::{Context, Error, Result};
use log::{error, info};
use rayon::prelude::*;

/// Result of a parallel batch operation.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub succeeded: usize,
    pub errors: Vec<Error>,
}

impl BatchResult {
    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed()
    }

    pub fn all_succeeded(&self) -> bool {
        self.errors.is_empty()
    }

    /// The first failure, with the batch totals as context.
    pub fn ok_or_first_error(self, operation: &str) -> Result<()> {
        let (succeeded, failed) = (self.succeeded, self.failed());
        match self.errors.into_iter().next() {
            None => Ok(()),
            Some(e) => {
                Err(e.context(format!("{operation} failed: {succeeded} succeeded, {failed} failed")))
            }
        }
    }
}

/// Process items in parallel with consistent error reporting.
pub fn process_parallel_iter<T, R, F>(
    label: &str,
    items: impl IntoIterator<Item = T>,
    op: F,
) -> BatchResult
where
    T: Send,
    R: Send,
    F: Fn(T) -> Result<R> + Sync,
{
    let items: Vec<T> = items.into_iter().collect();
    let results: Vec<_> = items.into_par_iter().map(&op).collect();

    let mut result = BatchResult::default();
    for r in results {
        match r {
            Ok(_) => result.succeeded += 1,
            Err(e) => {
                error!("{e:?}");
                result.errors.push(e);
            }
        }
    }

    info!("{label}: {} succeeded, {} failed", result.succeeded, result.failed());
    result
}

/// Run an operation on multiple files in parallel with consistent error reporting.
pub fn run_parallel<T, F>(label: &str, items: &[T], op: F) -> BatchResult
where
    T: AsRef<Path> + Sync,
    F: Fn(&Path) -> Result<()> + Sync,
{
    process_parallel_iter(label, items.iter(), |item| {
        let path = item.as_ref();
        op(path).with_context(|| format!("Failed to process {}", path.display()))
    })
}
