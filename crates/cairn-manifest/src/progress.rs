//! Progress reporting side channel.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Mutex, PoisonError};

use tracing::warn;

/// Which phase a progress event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A chunk was stored during a build.
    Upload,
    /// A chunk was fetched during a restore.
    Recreate,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Upload => "upload",
            Step::Recreate => "recreate",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observer notified once per processed chunk.
///
/// `index` is 1-based and strictly increasing within one build or restore,
/// counting chunks in completion order. Observers cannot influence the
/// operation: they return nothing, and a panic inside one is caught and
/// logged rather than propagated.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, step: Step, index: usize, total: usize);
}

impl<F> ProgressObserver for F
where
    F: Fn(Step, usize, usize) + Send + Sync,
{
    fn on_progress(&self, step: Step, index: usize, total: usize) {
        self(step, index, total)
    }
}

/// Numbers completions for one operation and forwards them to an observer.
///
/// Numbering and notification happen under one lock, so indices reach the
/// observer in increasing order even when workers finish concurrently.
pub(crate) struct ProgressCounter<'a> {
    observer: Option<&'a dyn ProgressObserver>,
    step: Step,
    total: usize,
    done: Mutex<usize>,
}

impl<'a> ProgressCounter<'a> {
    pub(crate) fn new(observer: Option<&'a dyn ProgressObserver>, step: Step, total: usize) -> Self {
        Self {
            observer,
            step,
            total,
            done: Mutex::new(0),
        }
    }

    pub(crate) fn tick(&self) {
        let Some(observer) = self.observer else {
            return;
        };
        let mut done = self.done.lock().unwrap_or_else(PoisonError::into_inner);
        *done += 1;
        let index = *done;
        let notified = catch_unwind(AssertUnwindSafe(|| {
            observer.on_progress(self.step, index, self.total)
        }));
        if notified.is_err() {
            warn!(step = %self.step, index, "progress observer panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_step_labels() {
        assert_eq!(Step::Upload.to_string(), "upload");
        assert_eq!(Step::Recreate.as_str(), "recreate");
    }

    #[test]
    fn test_counter_is_one_based_and_monotonic() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = seen.clone();
            move |step: Step, index: usize, total: usize| {
                seen.lock().unwrap().push((step, index, total));
            }
        };

        let counter = ProgressCounter::new(Some(&sink as &dyn ProgressObserver), Step::Upload, 3);
        std::thread::scope(|s| {
            for _ in 0..3 {
                s.spawn(|| counter.tick());
            }
        });

        let seen = seen.lock().unwrap();
        let indices: Vec<_> = seen.iter().map(|(_, i, _)| *i).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert!(seen.iter().all(|(s, _, t)| *s == Step::Upload && *t == 3));
    }

    #[test]
    fn test_panicking_observer_is_contained() {
        let seen = Mutex::new(Vec::new());
        let flaky = |_: Step, index: usize, _: usize| {
            if index == 2 {
                panic!("observer failure");
            }
            seen.lock().unwrap().push(index);
        };

        let counter = ProgressCounter::new(Some(&flaky as &dyn ProgressObserver), Step::Upload, 3);
        for _ in 0..3 {
            counter.tick();
        }

        assert_eq!(*seen.lock().unwrap(), vec![1, 3]);
        assert_eq!(*counter.done.lock().unwrap(), 3);
    }

    #[test]
    fn test_counter_without_observer() {
        let counter = ProgressCounter::new(None, Step::Recreate, 10);
        counter.tick();
        assert_eq!(*counter.done.lock().unwrap(), 0);
    }
}
