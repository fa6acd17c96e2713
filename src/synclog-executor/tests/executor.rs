use std::{collections::HashSet, fs, sync::Arc, time::Duration};

use synclog_executor::{Completed, Executor, Task};
use synclog_writer::{verify::verify, CallerId, SynchronizedWriter, Worker, WriterOptions};

const NO_DELAY: WriterOptions = WriterOptions {
    fairness_delay: Duration::ZERO,
    sentinel: CallerId::SENTINEL,
};

fn run(executor: &Executor, writer: &Arc<SynchronizedWriter>, workers: usize, lines: usize) -> Vec<Completed> {
    let mut done = Vec::new();
    for id in 0..workers {
        let task = Task::new(id, Worker::new(Arc::clone(writer), lines));
        done.extend(executor.dispatch(task));
    }
    done.extend(executor.join());

    done
}

#[test]
fn threaded_runs_every_task() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");
    let writer = Arc::new(SynchronizedWriter::create(&path).unwrap());

    let executor = Executor::with_threads(10);
    assert_eq!(executor.threads(), 10);

    let done = run(&executor, &writer, 10, 10);
    assert_eq!(done.len(), 10);
    assert!(done.iter().all(|c| c.report.lines == 10));

    let ids: HashSet<_> = done.iter().map(|c| c.id).collect();
    assert_eq!(ids, (0..10).collect::<HashSet<_>>());

    assert_eq!(writer.count(), 101);
    writer.close().unwrap();

    let summary = verify(fs::read(&path).unwrap().as_slice()).unwrap();
    assert_eq!(summary.records, 101);
}

#[test]
fn threaded_with_backpressure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");
    let writer = Arc::new(SynchronizedWriter::create_with(&path, NO_DELAY).unwrap());

    // Far more tasks than threads, so dispatching has to wait for
    // queued tasks to drain.
    let executor = Executor::with_threads(2);
    let done = run(&executor, &writer, 64, 5);

    assert_eq!(done.len(), 64);
    assert_eq!(writer.count(), 64 * 5 + 1);
}

#[test]
fn current_runs_inline() {
    let dir = tempfile::tempdir().unwrap();
    let writer = Arc::new(
        SynchronizedWriter::create_with(dir.path().join("out.txt"), NO_DELAY).unwrap(),
    );

    let executor = Executor::with_threads(1);
    assert!(matches!(executor, Executor::Current(..)));

    let task = Task::new(0, Worker::new(Arc::clone(&writer), 3));
    let done: Vec<_> = executor.dispatch(task).collect();

    assert_eq!(done.len(), 1);
    assert_eq!(done[0].report.caller, CallerId::current());
    assert_eq!(done[0].report.lines, 3);
    assert_eq!(executor.join().count(), 0);
}

#[test]
fn drop_joins_pending_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let writer = Arc::new(
        SynchronizedWriter::create_with(dir.path().join("out.txt"), NO_DELAY).unwrap(),
    );

    {
        let executor = Executor::with_threads(4);
        for id in 0..4 {
            let task = Task::new(id, Worker::new(Arc::clone(&writer), 25));
            executor.dispatch(task).for_each(drop);
        }
    }

    assert_eq!(writer.count(), 4 * 25 + 1);
}
