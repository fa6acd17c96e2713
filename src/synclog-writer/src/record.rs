//! The record format written to log files.
//!
//! Every record is a single line of three comma-separated fields:
//!
//! ```text
//! <counter>,<caller>,<HH:MM:SS.mmm>
//! ```
//!
//! There is no escaping, so callers never contain commas.

use std::fmt;

use chrono::NaiveTime;
use thiserror::Error;

/// The [`chrono`] format string for record timestamps.
///
/// 24-hour clock, zero-padded, with milliseconds to three digits.
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S%.3f";

const TIMESTAMP_LEN: usize = "HH:MM:SS.mmm".len();

/// Errors that occur when parsing a line into a [`Record`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum RecordError {
    /// The line does not end in a line terminator.
    #[error("record is not terminated by a newline")]
    Unterminated,

    /// The line does not consist of exactly three fields.
    #[error("expected 3 fields, found {0}")]
    FieldCount(usize),

    /// The counter field is not an unsigned integer.
    #[error("invalid counter '{0}'")]
    Counter(String),

    /// The caller field is empty.
    #[error("missing caller identity")]
    EmptyCaller,

    /// The timestamp field is not of the form `HH:MM:SS.mmm`.
    #[error("invalid timestamp '{0}'")]
    Timestamp(String),
}

/// A single log record.
///
/// The caller is generic so that records can be written from a
/// [`CallerId`][crate::CallerId] and read back as borrowed strings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Record<C> {
    /// The value of the writer's counter when the record was made.
    pub counter: u64,
    /// The identity of the thread which made the record.
    pub caller: C,
    /// The wall-clock time of the record.
    pub timestamp: NaiveTime,
}

impl<'a> Record<&'a str> {
    /// Parses a record from a line with its terminator stripped.
    pub fn parse(line: &'a str) -> Result<Self, RecordError> {
        let mut fields = line.split(',');
        let (Some(counter), Some(caller), Some(timestamp), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(RecordError::FieldCount(line.split(',').count()));
        };

        Ok(Self {
            counter: parse_counter(counter)?,
            caller: parse_caller(caller)?,
            timestamp: parse_timestamp(timestamp)?,
        })
    }
}

impl<C: fmt::Display> fmt::Display for Record<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{}",
            self.counter,
            self.caller,
            self.timestamp.format(TIMESTAMP_FORMAT)
        )
    }
}

fn parse_counter(field: &str) -> Result<u64, RecordError> {
    // `u64::from_str` tolerates a leading `+`, which the format does not.
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RecordError::Counter(field.into()));
    }

    field
        .parse()
        .map_err(|_| RecordError::Counter(field.into()))
}

fn parse_caller(field: &str) -> Result<&str, RecordError> {
    if field.is_empty() {
        Err(RecordError::EmptyCaller)
    } else {
        Ok(field)
    }
}

fn parse_timestamp(field: &str) -> Result<NaiveTime, RecordError> {
    let bytes = field.as_bytes();
    let well_formed = bytes.len() == TIMESTAMP_LEN
        && bytes[2] == b':'
        && bytes[5] == b':'
        && bytes[8] == b'.'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| matches!(i, 2 | 5 | 8) || b.is_ascii_digit());

    if !well_formed {
        return Err(RecordError::Timestamp(field.into()));
    }

    NaiveTime::parse_from_str(field, TIMESTAMP_FORMAT)
        .map_err(|_| RecordError::Timestamp(field.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CallerId;

    fn time(h: u32, m: u32, s: u32, ms: u32) -> NaiveTime {
        NaiveTime::from_hms_milli_opt(h, m, s, ms).unwrap()
    }

    #[test]
    fn display_pads_fields() {
        let record = Record {
            counter: 7,
            caller: CallerId::new(3),
            timestamp: time(9, 5, 2, 40),
        };

        assert_eq!(record.to_string(), "7,3,09:05:02.040");
    }

    #[test]
    fn display_uses_24_hour_clock() {
        let record = Record {
            counter: 0,
            caller: CallerId::SENTINEL,
            timestamp: time(23, 59, 59, 999),
        };

        assert_eq!(record.to_string(), "0,0,23:59:59.999");
    }

    #[test]
    fn display_truncates_to_milliseconds() {
        let record = Record {
            counter: 1,
            caller: "worker",
            timestamp: NaiveTime::from_hms_nano_opt(12, 0, 0, 123_987_654).unwrap(),
        };

        assert_eq!(record.to_string(), "1,worker,12:00:00.123");
    }

    #[test]
    fn parse_valid() {
        let record = Record::parse("42,17,14:03:27.501").unwrap();

        assert_eq!(record.counter, 42);
        assert_eq!(record.caller, "17");
        assert_eq!(record.timestamp, time(14, 3, 27, 501));
    }

    #[test]
    fn parse_rejects_field_count() {
        assert_eq!(
            Record::parse("1,2"),
            Err(RecordError::FieldCount(2))
        );
        assert_eq!(
            Record::parse("1,2,00:00:00.000,4"),
            Err(RecordError::FieldCount(4))
        );
    }

    #[test]
    fn parse_rejects_counter() {
        for bad in ["", "+1", "-1", "1a", "99999999999999999999999"] {
            let line = format!("{bad},1,00:00:00.000");
            assert_eq!(
                Record::parse(&line),
                Err(RecordError::Counter(bad.into())),
                "{line}"
            );
        }
    }

    #[test]
    fn parse_rejects_empty_caller() {
        assert_eq!(
            Record::parse("1,,00:00:00.000"),
            Err(RecordError::EmptyCaller)
        );
    }

    #[test]
    fn parse_rejects_timestamp() {
        for bad in [
            "00:00:00",
            "00:00:00:000",
            "0:00:00.0000",
            "00:00:00.00",
            "24:00:00.000",
            "ab:cd:ef.ghi",
        ] {
            let line = format!("1,1,{bad}");
            assert_eq!(
                Record::parse(&line),
                Err(RecordError::Timestamp(bad.into())),
                "{line}"
            );
        }
    }
}
