use std::{collections::BTreeMap, path::PathBuf, sync::Arc, time::Duration};

use clap::Args;
use eyre::Context;
use synclog_executor::{Completed, Executor, Task};
use synclog_writer::{CallerId, DEFAULT_REPEAT, Worker, WriterOptions, WriterRegistry};

use super::Command;

const DEFAULT_PATH: &str = "out.txt";
const DEFAULT_WORKERS: usize = 10;
const DEFAULT_DELAY_MS: u64 = 1;

/// Subcommand for running concurrent workers against one log file.
#[derive(Debug, Args)]
pub struct Run {
    /// The log file to create.
    ///
    /// An existing file at this path will be truncated.
    #[clap(default_value = DEFAULT_PATH, env = "SYNCLOG_PATH")]
    path: PathBuf,

    /// The number of workers to run concurrently.
    #[clap(short, long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// The number of records every worker writes.
    #[clap(short = 'n', long, default_value_t = DEFAULT_REPEAT)]
    lines: usize,

    /// Milliseconds a worker pauses after each record to let others
    /// acquire the file. 0 disables the pause.
    #[clap(long, default_value_t = DEFAULT_DELAY_MS)]
    delay_ms: u64,

    /// The number of threads to run workers on.
    ///
    /// Defaults to one thread per worker, or the value of the
    /// SYNCLOG_WORKER_THREADS environment variable when set.
    #[clap(short, long)]
    threads: Option<usize>,
}

impl Run {
    fn executor(&self) -> eyre::Result<Executor> {
        match self.threads {
            Some(n) => Ok(Executor::with_threads(n)),
            None => Executor::for_workers(self.workers).map_err(Into::into),
        }
    }
}

#[derive(Default)]
struct Tally {
    tasks: usize,
    callers: BTreeMap<CallerId, usize>,
}

impl Tally {
    fn record(&mut self, completed: Completed) {
        let Completed { id, report } = completed;
        log::debug!(
            "Worker #{} finished {} records as caller {}",
            id + 1,
            report.lines,
            report.caller
        );

        self.tasks += 1;
        *self.callers.entry(report.caller).or_default() += report.lines;
    }
}

impl Command for Run {
    fn handle(self) -> eyre::Result<()> {
        let options = WriterOptions {
            fairness_delay: Duration::from_millis(self.delay_ms),
            ..Default::default()
        };

        // Dropping the registry on any early return closes the file.
        let registry = WriterRegistry::with_options(options);
        let writer = registry
            .open(&self.path)
            .with_context(|| format!("failed to create log at '{}'", self.path.display()))?;

        log::info!("Logging to '{}'", self.path.display());

        let executor = self.executor()?;
        log::debug!("Running workers on {} threads", executor.threads());

        let mut tally = Tally::default();
        for id in 0..self.workers {
            log::info!("Launching worker #{}", id + 1);

            let task = Task::new(id, Worker::new(Arc::clone(&writer), self.lines));
            executor.dispatch(task).for_each(|c| tally.record(c));
        }

        executor.join().for_each(|c| tally.record(c));

        if let Err(e) = registry.close_all() {
            log::error!("{e}");
        }

        for (caller, lines) in &tally.callers {
            log::info!("Caller {caller} wrote {lines} records");
        }

        // The counter includes the header and every failed attempt.
        let attempts = writer.count().saturating_sub(1);
        log::info!(
            "{} workers wrote {} of {} records to '{}', counter at {}",
            tally.tasks,
            attempts.saturating_sub(writer.failures()),
            attempts,
            self.path.display(),
            writer.count()
        );

        if writer.failures() > 0 {
            log::warn!(
                "{} records could not be written and are missing from the file",
                writer.failures()
            );
        }

        Ok(())
    }
}
