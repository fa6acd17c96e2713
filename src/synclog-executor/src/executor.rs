use std::{
    env::{self, VarError},
    option::IntoIter as OptionIter,
};

use synclog_writer::{Worker, WorkerReport};
use thiserror::Error;

mod current;
use current::Current;

mod threaded;
use threaded::Threaded;

const SYNCLOG_WORKER_THREADS: &str = "SYNCLOG_WORKER_THREADS";

#[derive(Clone, Debug, Error)]
#[error(
    "invalid value in {}; must be a natural number",
    SYNCLOG_WORKER_THREADS
)]
pub struct BadConfiguration;

fn threads_from(
    var: Result<String, VarError>,
    fallback: impl FnOnce() -> usize,
) -> Result<usize, BadConfiguration> {
    match var {
        Ok(value) => value.trim().parse().map_err(|_| BadConfiguration),
        Err(_) => Ok(fallback()),
    }
}

fn available_threads(fallback: impl FnOnce() -> usize) -> Result<usize, BadConfiguration> {
    threads_from(env::var(SYNCLOG_WORKER_THREADS), fallback)
}

/// A task to carry out inside the executor.
///
/// Tasks are constructed by the user and dispatched to the
/// threadpool. A [`Completed`] report is handed back to the
/// caller once the task's worker has finished.
#[derive(Debug)]
pub struct Task {
    /// A caller-chosen number to tell reports apart.
    pub id: usize,
    /// The worker to run.
    pub worker: Worker,
}

impl Task {
    /// Creates a [`Task`] which runs `worker`.
    pub fn new(id: usize, worker: Worker) -> Self {
        Self { id, worker }
    }

    pub(super) fn process(self) -> Completed {
        log::trace!("Starting task #{}", self.id);
        let report = self.worker.run();

        Completed {
            id: self.id,
            report,
        }
    }
}

/// The outcome of a finished [`Task`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Completed {
    /// The id of the task.
    pub id: usize,
    /// What the task's worker did.
    pub report: WorkerReport,
}

/// An executor for running log workers.
///
/// The number of threads is given by the caller, but can be overridden
/// with the `SYNCLOG_WORKER_THREADS` environment variable.
///
/// The API is the same for both flavors of execution and users
/// should not need to worry about any execution flavor details.
pub enum Executor {
    /// A single-threaded executor on the current thread.
    Current(Current),
    /// A multithreaded executor performing work on background threads.
    Threaded(Threaded),
}

impl Executor {
    /// Creates a single-threaded executor on the current thread.
    #[inline]
    pub fn current() -> Self {
        Self::Current(Current::new())
    }

    /// Creates an executor with exactly `nthreads` threads.
    ///
    /// `0` and `1` pick the single-threaded flavor.
    pub fn with_threads(nthreads: usize) -> Self {
        match nthreads {
            0 | 1 => Self::current(),
            n => Self::Threaded(Threaded::new(n)),
        }
    }

    /// Gets an executor with one thread per worker, unless the
    /// environment configures a thread count.
    pub fn for_workers(workers: usize) -> Result<Self, BadConfiguration> {
        available_threads(|| workers).map(Self::with_threads)
    }

    /// Gets the number of threads tasks run on.
    pub fn threads(&self) -> usize {
        match self {
            Self::Threaded(t) => t.threads(),
            Self::Current(..) => 1,
        }
    }

    /// Dispatches a task to be performed inside the executor.
    pub fn dispatch(&self, task: Task) -> SubmitIterator<'_> {
        match self {
            Self::Threaded(t) => SubmitIterator::Threaded(t.dispatch(task)),
            Self::Current(c) => SubmitIterator::Current(c.dispatch(task)),
        }
    }

    /// Joins all pending tasks on the executor.
    pub fn join(&self) -> JoinIterator<'_> {
        match self {
            Self::Threaded(t) => JoinIterator::Threaded(t.join()),
            Self::Current(..) => JoinIterator::Current,
        }
    }
}

/// An iterator that yields finished tasks until resources become
/// available to enqueue the pending task.
#[must_use = "Consume this Iterator to ensure the pending task gets executed"]
pub enum SubmitIterator<'a> {
    Current(OptionIter<Completed>),
    Threaded(threaded::SubmitIterator<'a>),
}

impl Iterator for SubmitIterator<'_> {
    type Item = Completed;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Threaded(si) => si.next(),
            Self::Current(oi) => oi.next(),
        }
    }
}

/// An iterator that yields finished tasks until no more are running
/// on the executor.
#[must_use = "Consume this Iterator to ensure all tasks have terminated"]
pub enum JoinIterator<'a> {
    Current,
    Threaded(threaded::JoinIterator<'a>),
}

impl Iterator for JoinIterator<'_> {
    type Item = Completed;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Threaded(ji) => ji.next(),
            Self::Current => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_when_unset() {
        assert_eq!(threads_from(Err(VarError::NotPresent), || 10).unwrap(), 10);
    }

    #[test]
    fn override_from_env() {
        assert_eq!(threads_from(Ok("4".into()), || 10).unwrap(), 4);
        assert_eq!(threads_from(Ok(" 2\n".into()), || 10).unwrap(), 2);
    }

    #[test]
    fn reject_garbage() {
        assert!(threads_from(Ok("many".into()), || 10).is_err());
        assert!(threads_from(Ok("-3".into()), || 10).is_err());
    }
}
