//! Result bookkeeping shared by both suites.

use parking_lot::Mutex;
use serde::Serialize;

/// A recorded case outcome.
pub trait Outcome {
    /// Whether the case passed.
    fn passed(&self) -> bool;
}

/// Pass/fail counts over a suite's results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
}

impl Summary {
    /// Count the outcomes in `results`.
    pub fn of<T: Outcome>(results: &[T]) -> Self {
        let passed = results.iter().filter(|r| r.passed()).count();
        Self {
            passed,
            failed: results.len() - passed,
        }
    }

    /// Total cases recorded.
    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    /// True if nothing failed. An empty suite counts as passing.
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Append-only result list. Appends from concurrent cases are serialised.
#[derive(Debug, Default)]
pub(crate) struct ResultLog<T> {
    entries: Mutex<Vec<T>>,
}

impl<T: Outcome + Clone> ResultLog<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn push(&self, result: T) {
        self.entries.lock().push(result);
    }

    pub(crate) fn snapshot(&self) -> Vec<T> {
        self.entries.lock().clone()
    }

    pub(crate) fn summary(&self) -> Summary {
        Summary::of(self.entries.lock().as_slice())
    }
}
