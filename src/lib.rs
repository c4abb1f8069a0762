//! Header-aware CSV record reading.
//!
//! - The first record read becomes a [`HeaderIndex`] (name -> position, last
//!   duplicate wins).
//! - Later records come back raw, projected by header name
//!   ([`HeaderedReader::read_named`]) or as a name-keyed map
//!   ([`HeaderedReader::read_map`]).
//! - Optional validators run on raw physical lines (before tokenization) and
//!   on tokenized rows.
//! - Diagnostics are resolved for an explicit [`Locale`]; the locale never
//!   changes outcomes.
//!
//! Data shape: a [`Record`] is a `Vec<String>`.
#![cfg_attr(docsrs, feature(doc_cfg))]
//
mod codec;
mod config;
mod header;
mod io;
mod mapping;
mod messages;
mod reader;
mod source;
mod validator;

pub use crate::config::{ReaderConfig, WidthCheck};
pub use crate::header::HeaderIndex;
pub use crate::io::{decode_stream, open_path, SourceMeta};
pub use crate::mapping::{bind_all, BoundRecord, ColumnPositionMapping, RecordSchema};
pub use crate::messages::{
    fill, BundledMessages, Diagnostics, Locale, MessageKey, MessageResolver, UnknownLocale,
};
pub use crate::reader::{HeaderedReader, HeaderedReaderBuilder};
pub use crate::source::{csv_reader, LineRecordSource, Record, RecordSource};
pub use crate::validator::{
    ConstraintViolation, DataValidator, LineValidator, Predicate, RowValidator, Subject,
    ValidatorChain, Violated,
};

use thiserror::Error;

/// Which piece of configuration was missing or unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationKind {
    /// A column mapping was used for binding before a target schema was set.
    TargetUnset,
    /// A line validator was given to a source that never sees raw lines.
    LineValidationUnsupported,
}

/// Locale-independent classification of a [`CsvError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnknownHeaderName,
    RecordHeaderWidthMismatch,
    ConstraintViolation,
    Configuration(ConfigurationKind),
    Malformed,
    Io,
    Csv,
}

/// Error type returned by this crate when not using `anyhow`.
///
/// `message` fields hold text resolved for the reader's locale; match on
/// the variant or on [`CsvError::kind`], never on the text.
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("{message}")]
    UnknownHeaderName { name: String, message: String },
    #[error("{message}")]
    RecordHeaderWidthMismatch {
        /// Records pulled so far, header included.
        record: u64,
        expected: usize,
        actual: usize,
        message: String,
    },
    #[error(transparent)]
    ConstraintViolation(#[from] ConstraintViolation),
    #[error("{message}")]
    Configuration {
        kind: ConfigurationKind,
        message: String,
    },
    /// Structurally broken input (unterminated quote, multiline limit).
    #[error("{message}")]
    Malformed { line: u64, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv_async::Error),
}

impl CsvError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CsvError::UnknownHeaderName { .. } => ErrorKind::UnknownHeaderName,
            CsvError::RecordHeaderWidthMismatch { .. } => ErrorKind::RecordHeaderWidthMismatch,
            CsvError::ConstraintViolation(_) => ErrorKind::ConstraintViolation,
            CsvError::Configuration { kind, .. } => ErrorKind::Configuration(*kind),
            CsvError::Malformed { .. } => ErrorKind::Malformed,
            CsvError::Io(_) => ErrorKind::Io,
            CsvError::Csv(_) => ErrorKind::Csv,
        }
    }
}

pub type CsvResult<T> = std::result::Result<T, CsvError>;
