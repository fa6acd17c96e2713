use std::{fs::File, io::Write, sync::Arc};

use crate::{CallerId, SynchronizedWriter};

/// The number of records a [`Worker`] writes unless told otherwise.
pub const DEFAULT_REPEAT: usize = 10;

/// What a [`Worker`] did during its run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerReport {
    /// The identity the worker logged under.
    pub caller: CallerId,
    /// The number of records the writer accepted.
    ///
    /// Records whose write failed still count, records refused by a
    /// closed writer do not.
    pub lines: usize,
}

/// Writes a fixed number of records to a shared writer.
///
/// The worker holds a shared reference to the writer but never owns
/// the underlying file.
#[derive(Debug)]
pub struct Worker<W: Write = File> {
    writer: Arc<SynchronizedWriter<W>>,
    repeat: usize,
}

impl<W: Write> Worker<W> {
    /// Creates a worker that writes `repeat` records to `writer`.
    pub fn new(writer: Arc<SynchronizedWriter<W>>, repeat: usize) -> Self {
        Self { writer, repeat }
    }

    /// Creates a worker that writes [`DEFAULT_REPEAT`] records.
    pub fn with_default_repeat(writer: Arc<SynchronizedWriter<W>>) -> Self {
        Self::new(writer, DEFAULT_REPEAT)
    }

    /// Gets the number of records this worker writes.
    #[inline]
    pub fn repeat(&self) -> usize {
        self.repeat
    }

    /// Writes all records sequentially on the calling thread.
    ///
    /// Returns once every record was handed to the writer.
    pub fn run(&self) -> WorkerReport {
        let caller = CallerId::current();
        let lines = (0..self.repeat)
            .filter_map(|_| self.writer.log(caller))
            .count();

        WorkerReport { caller, lines }
    }
}
