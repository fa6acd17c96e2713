//! Consistency checks for produced log files.
//!
//! A log written by a [`SynchronizedWriter`][crate::SynchronizedWriter]
//! is well-formed when every line is a complete record and the counters
//! run from `0` upwards without gaps or repeats.

use std::{collections::BTreeMap, io};

use thiserror::Error;

use crate::record::{Record, RecordError};

/// Errors that make a log fail verification.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Reading the log failed.
    #[error("failed to read log: {0}")]
    Io(#[from] io::Error),

    /// The log does not start with a header record, either because it
    /// is empty or because its first counter is not `0`.
    #[error("log does not start with a header record")]
    MissingHeader,

    /// A line is not a valid record.
    #[error("line {line}: {source}")]
    Malformed {
        /// The 1-based line number.
        line: usize,
        /// Why the line was rejected.
        source: RecordError,
    },

    /// A record's counter does not follow its predecessor.
    #[error("line {line}: expected counter {expected}, found {found}")]
    OutOfOrder {
        /// The 1-based line number.
        line: usize,
        /// The counter the record should have.
        expected: u64,
        /// The counter the record has.
        found: u64,
    },
}

/// Statistics of a log which passed verification.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Summary {
    /// The total number of records, including the header.
    pub records: u64,
    /// The number of records per caller identity.
    pub callers: BTreeMap<String, u64>,
}

/// Reads a whole log from `reader` and checks its consistency.
pub fn verify<R: io::BufRead>(mut reader: R) -> Result<Summary, VerifyError> {
    let mut summary = Summary::default();
    let mut buf = String::new();

    loop {
        buf.clear();
        if reader.read_line(&mut buf)? == 0 {
            break;
        }

        let line = summary.records as usize + 1;
        let malformed = |source| VerifyError::Malformed { line, source };

        let Some(text) = buf.strip_suffix('\n') else {
            return Err(malformed(RecordError::Unterminated));
        };
        let text = text.strip_suffix('\r').unwrap_or(text);

        let record = Record::parse(text).map_err(malformed)?;
        if summary.records == 0 && record.counter != 0 {
            return Err(VerifyError::MissingHeader);
        }
        if record.counter != summary.records {
            return Err(VerifyError::OutOfOrder {
                line,
                expected: summary.records,
                found: record.counter,
            });
        }

        *summary.callers.entry(record.caller.to_owned()).or_default() += 1;
        summary.records += 1;
    }

    if summary.records == 0 {
        Err(VerifyError::MissingHeader)
    } else {
        Ok(summary)
    }
}
