// src/error.rs

use thiserror::Error;

/// Everything that can stop a run before an answer is printed.
///
/// Network and I/O failures travel as `anyhow::Error` with context; the
/// variants here are the conditions the caller can act on or report by name.
#[derive(Debug, Error)]
pub enum CheckerError {
    // ----- resolution -----
    #[error(
        "found no file to download on {page}; it is possible the file name has changed"
    )]
    NoMatchingFile { page: String },

    #[error("refusing to use `{0}` as a local file name")]
    UnsafeFileName(String),

    // ----- data shape -----
    #[error("worksheet `{title}` not found (available: {})", available.join(", "))]
    WorksheetNotFound {
        title: String,
        available: Vec<String>,
    },

    #[error("worksheet has no data rows with a date")]
    EmptyTable,

    #[error("{region} on row {row} holds no number: {value:?}")]
    NotANumber {
        row: u32,
        region: String,
        value: String,
    },

    #[error("row {0} is outside the loaded table")]
    RowOutOfTable(u32),

    // ----- user input -----
    #[error("you must give a number between 1 and {max}, got `{given}`")]
    InvalidDays { given: String, max: i64 },

    #[error(
        "given days value {given} is not valid for the data available; enter a value between 1 and {max}"
    )]
    DaysOutOfRange { given: i64, max: i64 },

    #[error("no health board is named exactly `{0}`")]
    UnknownBoard(String),

    #[error(
        "invalid name `{given}`, enter a name that matches one of the following: {}",
        valid.join(", ")
    )]
    InvalidName { given: String, valid: Vec<String> },

    #[error("missing the health board name; --cases needs a number of days and a health board name or `all`")]
    MissingBoard,
}
