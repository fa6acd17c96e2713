use std::sync::mpsc;

use threadpool::{Builder, ThreadPool};

use super::{Completed, Task};

const WORKER_NAME: &str = "synclog-worker";
const WORKER_STACK: usize = 1_048_576;

// An arbitrary threshold to limit the amount of pending tasks in
// the executor. Workers spend most of their time blocked on the
// writer, so queueing more of them gains nothing.
const QUEUE_THRESHOLD: usize = 8;

fn make_worker_pool(nthreads: usize) -> ThreadPool {
    Builder::new()
        .num_threads(nthreads)
        .thread_name(WORKER_NAME.into())
        .thread_stack_size(WORKER_STACK)
        .build()
}

enum Notification {
    Done(Completed),
    End,
}

/// An executor flavor which processes tasks on background threads.
pub struct Threaded {
    pool: ThreadPool,
    tx: mpsc::Sender<Notification>,
    rx: mpsc::Receiver<Notification>,
}

impl Threaded {
    pub(super) fn new(nthreads: usize) -> Self {
        let (tx, rx) = mpsc::channel();

        log::debug!("Spawning {nthreads} worker threads");
        Self {
            pool: make_worker_pool(nthreads),
            tx,
            rx,
        }
    }

    pub(super) fn threads(&self) -> usize {
        self.pool.max_count()
    }

    fn execute(&self, task: Task) {
        let tx = self.tx.clone();
        self.pool.execute(move || {
            let _ = tx.send(Notification::Done(task.process()));
        });
    }

    #[must_use]
    pub(super) fn dispatch(&self, task: Task) -> SubmitIterator<'_> {
        SubmitIterator {
            threaded: self,
            task: Some(task),
        }
    }

    #[must_use]
    pub(super) fn join(&self) -> JoinIterator<'_> {
        self.pool.join();
        let _ = self.tx.send(Notification::End);

        JoinIterator { threaded: self }
    }
}

impl Drop for Threaded {
    fn drop(&mut self) {
        self.join().for_each(drop);
    }
}

pub struct SubmitIterator<'a> {
    threaded: &'a Threaded,
    task: Option<Task>,
}

impl Iterator for SubmitIterator<'_> {
    type Item = Completed;

    fn next(&mut self) -> Option<Self::Item> {
        if self.threaded.pool.queued_count() < QUEUE_THRESHOLD {
            if let Some(t) = self.task.take() {
                self.threaded.execute(t);
            }

            None
        } else {
            for notification in self.threaded.rx.iter() {
                if let Notification::Done(c) = notification {
                    return Some(c);
                }

                if self.threaded.pool.queued_count() < QUEUE_THRESHOLD {
                    if let Some(t) = self.task.take() {
                        self.threaded.execute(t);
                    }

                    return None;
                }
            }

            unreachable!()
        }
    }
}

pub struct JoinIterator<'a> {
    threaded: &'a Threaded,
}

impl Iterator for JoinIterator<'_> {
    type Item = Completed;

    fn next(&mut self) -> Option<Self::Item> {
        match self.threaded.rx.recv() {
            Ok(notification) => match notification {
                Notification::Done(c) => Some(c),
                Notification::End => None,
            },

            Err(_) => None,
        }
    }
}
