//! Serialized appends to a single log file from many threads.
//!
//! The centerpiece is [`SynchronizedWriter`], which owns one open file
//! and a line counter. Every [`SynchronizedWriter::log`] call formats,
//! writes and counts one record while holding the writer's lock, so the
//! file ends up as a total order over all logging events no matter how
//! many threads race for it.
//!
//! Records have the shape `<counter>,<caller>,<HH:MM:SS.mmm>`. The first
//! record is always written at construction with counter `0` and the
//! sentinel caller.
//!
//! [`Worker`]s drive a fixed number of records against a shared writer
//! and [`WriterRegistry`] hands out at most one writer per path.

#![deny(rust_2018_idioms, rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod caller;
pub use caller::CallerId;

mod error;
pub use error::WriterError;

pub mod record;

mod registry;
pub use registry::WriterRegistry;

pub mod verify;

mod worker;
pub use worker::*;

mod writer;
pub use writer::*;
