//! Implementation of a worker pool for driving log workers.
//!
//! # Motivation
//!
//! A logging session starts a number of [`Worker`]s which all hammer
//! the same [`SynchronizedWriter`] at once. Someone has to give them
//! threads to run on and wait for all of them to finish before the
//! writer may be closed.
//!
//! # Design
//!
//! The main thread produces tasks for the pool and collects reports of
//! finished tasks. Dispatching blocks once too many tasks are queued,
//! handing finished reports back to the caller while it waits.
//!
//! [`Worker`]: synclog_writer::Worker
//! [`SynchronizedWriter`]: synclog_writer::SynchronizedWriter

#![deny(rust_2018_idioms, rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod executor;
pub use executor::*;
