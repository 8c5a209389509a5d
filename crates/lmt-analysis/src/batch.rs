//! Per-trial parallel execution
//!
//! Trials (one recording each) are analyzed independently. [`map_trials`]
//! spreads them over scoped worker threads and returns the results in input
//! order, so merged diagnostics are reproducible run to run.

use std::{num::NonZeroUsize, panic, thread};

use lmt_table::WideTable;

/// One recording: its wide table and a display name.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    pub name: String,
    pub table: WideTable,
}

impl Trial {
    #[must_use]
    pub fn new(name: impl Into<String>, table: WideTable) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }
}

/// Applies `f` to every trial on worker threads, keeping input order.
///
/// # Examples
///
/// ```
/// # use lmt_analysis::batch::{Trial, map_trials};
/// # use lmt_table::WideTable;
/// let trials = (0..5)
///     .map(|i| Trial::new(format!("trial-{i}"), WideTable::default()))
///     .collect::<Vec<_>>();
/// let names = map_trials(&trials, |trial| trial.name.clone());
/// assert_eq!(names[3], "trial-3");
/// ```
pub fn map_trials<R, F>(trials: &[Trial], f: F) -> Vec<R>
where
    R: Send,
    F: Fn(&Trial) -> R + Sync,
{
    if trials.len() <= 1 {
        return trials.iter().map(&f).collect();
    }

    let workers = thread::available_parallelism()
        .map_or(1, NonZeroUsize::get)
        .min(trials.len());
    let chunk_size = trials.len().div_ceil(workers);
    tracing::debug!(trials = trials.len(), workers, "analyzing trials");

    let f = &f;
    thread::scope(|s| {
        let handles = trials
            .chunks(chunk_size)
            .map(|chunk| s.spawn(move || chunk.iter().map(f).collect::<Vec<_>>()))
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap_or_else(|err| panic::resume_unwind(err)))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use lmt_table::{Tag, WideRow};

    use super::*;

    #[test]
    fn test_results_keep_input_order() {
        let trials = (0..37)
            .map(|i| {
                let rows = (0..i)
                    .map(|ts| WideRow::new(ts, vec![None]).unwrap())
                    .collect();
                Trial::new(i.to_string(), WideTable::new(vec![Tag::new("A")], rows).unwrap())
            })
            .collect::<Vec<_>>();
        let lengths = map_trials(&trials, |trial| trial.table.rows().len());
        assert_eq!(lengths, (0..37).collect::<Vec<usize>>());
    }

    #[test]
    fn test_empty_batch() {
        let lengths = map_trials(&[], |trial| trial.name.len());
        assert!(lengths.is_empty());
    }
}
