use std::{
    fmt,
    fs::{File, OpenOptions},
    io::{self, Write},
    path::Path,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
    thread,
    time::Duration,
};

use chrono::Local;

use crate::{record::Record, CallerId, WriterError};

/// The default pause after each record, see
/// [`WriterOptions::fairness_delay`].
pub const DEFAULT_FAIRNESS_DELAY: Duration = Duration::from_millis(1);

/// Tunables for a [`SynchronizedWriter`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WriterOptions {
    /// How long a caller sleeps after releasing the lock.
    ///
    /// This gives other blocked callers a chance to acquire the lock
    /// before the same thread comes back for its next record. It has
    /// no effect on correctness; [`Duration::ZERO`] disables it.
    pub fairness_delay: Duration,

    /// The caller identity of the header record.
    pub sentinel: CallerId,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            fairness_delay: DEFAULT_FAIRNESS_DELAY,
            sentinel: CallerId::SENTINEL,
        }
    }
}

struct State<W> {
    sink: Option<W>,
    counter: u64,
    line: Vec<u8>,
}

impl<W: Write> State<W> {
    /// Formats and writes the next record, then advances the counter.
    ///
    /// The counter advances even when the write fails, so it counts
    /// attempts rather than persisted records.
    fn append(&mut self, caller: CallerId) -> Result<u64, WriterError> {
        let sink = self.sink.as_mut().ok_or(WriterError::Closed)?;
        let counter = self.counter;

        let record = Record {
            counter,
            caller,
            timestamp: Local::now().time(),
        };

        self.line.clear();
        let result = writeln!(self.line, "{record}")
            .and_then(|()| write_line(sink, &self.line))
            .and_then(|()| sink.flush());

        self.counter += 1;

        result
            .map(|()| counter)
            .map_err(|source| WriterError::Write { counter, source })
    }
}

/// Writes a complete line to `sink`.
///
/// When the sink fails after taking part of the line, the fragment is
/// terminated on a best-effort basis so the next record starts on a
/// line of its own.
fn write_line<W: Write>(sink: &mut W, line: &[u8]) -> io::Result<()> {
    let mut written = 0;
    while written < line.len() {
        let err = match sink.write(&line[written..]) {
            Ok(0) => io::Error::from(io::ErrorKind::WriteZero),
            Ok(n) => {
                written += n;
                continue;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => e,
        };

        if written > 0 {
            let _ = sink.write_all(b"\n");
        }

        return Err(err);
    }

    Ok(())
}

/// A log file which serializes appends from any number of threads.
///
/// Formatting a record, writing it and advancing the counter happen
/// as one unit under a single lock, so records in the file appear in
/// the order their callers acquired that lock and every counter value
/// appears exactly once.
///
/// The writer is usually shared through an [`Arc`][std::sync::Arc].
/// It is closed deterministically, either by [`SynchronizedWriter::close`]
/// or when the last reference is dropped.
///
/// Any [`Write`] implementation may serve as the sink; [`File`] is the
/// default.
pub struct SynchronizedWriter<W: Write = File> {
    target: String,
    options: WriterOptions,
    state: Mutex<State<W>>,
    // Mirrors `State::counter` for lock-free reads.
    count: AtomicU64,
    failures: AtomicU64,
}

impl SynchronizedWriter<File> {
    /// Creates the file at `path` with default options, truncating it
    /// if it exists, and writes the header record.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, WriterError> {
        Self::create_with(path, WriterOptions::default())
    }

    /// Creates the file at `path` with the given options, truncating it
    /// if it exists, and writes the header record.
    pub fn create_with<P: AsRef<Path>>(path: P, options: WriterOptions) -> Result<Self, WriterError> {
        let path = path.as_ref();
        let target = path.display().to_string();

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|source| WriterError::Resource {
                target: target.clone(),
                source,
            })?;

        Self::open(file, target, options)
    }
}

impl<W: Write> SynchronizedWriter<W> {
    /// Wraps an arbitrary sink and writes the header record to it.
    ///
    /// `target` describes the sink in diagnostics.
    pub fn from_sink(sink: W, target: impl Into<String>, options: WriterOptions) -> Result<Self, WriterError> {
        Self::open(sink, target.into(), options)
    }

    fn open(sink: W, target: String, options: WriterOptions) -> Result<Self, WriterError> {
        let mut state = State {
            sink: Some(sink),
            counter: 0,
            line: Vec::with_capacity(64),
        };

        // A target that cannot take its header is unusable from the start.
        if let Err(e) = state.append(options.sentinel) {
            let source = match e {
                WriterError::Write { source, .. } => source,
                e => io::Error::other(e),
            };

            return Err(WriterError::Resource { target, source });
        }

        log::debug!("Opened log target '{target}'");

        Ok(Self {
            target,
            options,
            count: AtomicU64::new(state.counter),
            failures: AtomicU64::new(0),
            state: Mutex::new(state),
        })
    }

    fn lock(&self) -> MutexGuard<'_, State<W>> {
        // The state is consistent at every point a panic could occur,
        // so a poisoned lock is still safe to use.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends one record on behalf of `caller`.
    ///
    /// Blocks until the writer's lock is acquired. The record's counter
    /// is read after acquiring it, so concurrent callers always get
    /// distinct, consecutive values.
    ///
    /// Failures are reported through the `log` facade and never returned.
    /// When the write itself fails the counter is still consumed, which
    /// makes [`SynchronizedWriter::count`] a count of attempts; the lost
    /// records are tallied in [`SynchronizedWriter::failures`].
    ///
    /// A record the sink only partially accepted stays in the file as a
    /// truncated line. It is terminated where possible so that later
    /// records remain intact, but the log will no longer pass
    /// [`verify`][crate::verify::verify].
    ///
    /// Returns the counter value assigned to the record, or [`None`] when
    /// the writer is already closed.
    pub fn log(&self, caller: CallerId) -> Option<u64> {
        let result = {
            let mut state = self.lock();
            let result = state.append(caller);
            self.count.store(state.counter, Ordering::Release);

            result
        };

        let counter = match result {
            Ok(counter) => {
                log::trace!("Caller {caller} wrote record {counter}");
                counter
            }

            Err(WriterError::Write { counter, source }) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                log::error!(
                    "Failed to write record {counter} to '{}': {source}",
                    self.target
                );
                counter
            }

            Err(e) => {
                log::error!("Caller {caller} cannot log to '{}': {e}", self.target);
                return None;
            }
        };

        if !self.options.fairness_delay.is_zero() {
            thread::sleep(self.options.fairness_delay);
        }

        Some(counter)
    }

    /// Releases the underlying sink.
    ///
    /// This takes the same lock as [`SynchronizedWriter::log`] and thus
    /// never overlaps with a write in progress. Calling it again after
    /// the sink was released does nothing.
    ///
    /// Even when flushing fails, the sink is released and the writer
    /// stays closed.
    pub fn close(&self) -> Result<(), WriterError> {
        let Some(mut sink) = self.lock().sink.take() else {
            return Ok(());
        };

        let result = sink.flush().map_err(|source| WriterError::Close {
            target: self.target.clone(),
            source,
        });
        drop(sink);

        log::debug!("Closed log target '{}'", self.target);
        result
    }

    /// Whether [`SynchronizedWriter::close`] has released the sink.
    pub fn is_closed(&self) -> bool {
        self.lock().sink.is_none()
    }

    /// Gets the number of records attempted so far, including the
    /// header record.
    ///
    /// This is also the counter value the next record will get.
    #[inline]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    /// Gets the number of records whose write failed.
    #[inline]
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Gets the description of the log target.
    #[inline]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Gets the options the writer was created with.
    #[inline]
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }
}

impl<W: Write> Drop for SynchronizedWriter<W> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::error!("{e}");
        }
    }
}

impl<W: Write> fmt::Debug for SynchronizedWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynchronizedWriter")
            .field("target", &self.target)
            .field("options", &self.options)
            .field("count", &self.count())
            .field("failures", &self.failures())
            .finish_non_exhaustive()
    }
}
