use std::collections::HashMap;

use futures::stream::{self, Stream};
use tracing::{debug, trace};

use crate::config::{ReaderConfig, WidthCheck};
use crate::header::HeaderIndex;
use crate::messages::{Diagnostics, Locale, MessageKey};
use crate::source::{Record, RecordSource};
use crate::validator::{DataValidator, LineValidator, RowValidator};
use crate::{ConfigurationKind, CsvError, CsvResult};

/// Reader that treats the first record as the header and serves later
/// records by header name.
///
/// The header is read when the reader is built. Each read call pulls exactly
/// one record from the source; nothing is buffered between calls.
pub struct HeaderedReader<S> {
    source: S,
    header: HeaderIndex,
    records_read: u64,
    row_validator: Option<Box<RowValidator>>,
    map_width_check: WidthCheck,
    diagnostics: Diagnostics,
}

/// Collects validators and configuration, then reads the header.
pub struct HeaderedReaderBuilder {
    config: ReaderConfig,
    line_validator: Option<Box<LineValidator>>,
    row_validator: Option<Box<RowValidator>>,
}

impl HeaderedReaderBuilder {
    pub fn new(config: ReaderConfig) -> Self {
        Self {
            config,
            line_validator: None,
            row_validator: None,
        }
    }

    /// Runs on every raw physical line, header included. Only sources that
    /// see raw lines accept one; see [`RecordSource::install_line_validator`].
    pub fn line_validator<V>(mut self, validator: V) -> Self
    where
        V: DataValidator<str> + Send + Sync + 'static,
    {
        self.line_validator = Some(Box::new(validator));
        self
    }

    /// Runs on every tokenized record, header included.
    pub fn row_validator<V>(mut self, validator: V) -> Self
    where
        V: DataValidator<[String]> + Send + Sync + 'static,
    {
        self.row_validator = Some(Box::new(validator));
        self
    }

    pub async fn build<S: RecordSource>(self, mut source: S) -> CsvResult<HeaderedReader<S>> {
        let diagnostics = self.config.diagnostics();
        if let Some(validator) = self.line_validator {
            if source.install_line_validator(validator).is_err() {
                return Err(CsvError::Configuration {
                    kind: ConfigurationKind::LineValidationUnsupported,
                    message: diagnostics.message(MessageKey::LineValidationUnsupported, &[]),
                });
            }
        }

        let mut reader = HeaderedReader {
            source,
            header: HeaderIndex::default(),
            records_read: 0,
            row_validator: self.row_validator,
            map_width_check: self.config.map_width_check,
            diagnostics,
        };
        if let Some(names) = reader.read_next().await? {
            reader.header = HeaderIndex::from_record(&names);
        }
        debug!(
            width = reader.header.width(),
            distinct = reader.header.len(),
            locale = %reader.diagnostics.locale(),
            "header indexed"
        );
        Ok(reader)
    }
}

impl<S: RecordSource> HeaderedReader<S> {
    /// Reads the header from `source` with no validators.
    pub async fn new(source: S, config: ReaderConfig) -> CsvResult<Self> {
        HeaderedReaderBuilder::new(config).build(source).await
    }

    pub fn header(&self) -> &HeaderIndex {
        &self.header
    }

    /// Records pulled from the source so far; the header counts as the first.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    pub fn locale(&self) -> Locale {
        self.diagnostics.locale()
    }

    /// Replaces the row validator for all later reads.
    pub fn set_row_validator<V>(&mut self, validator: V)
    where
        V: DataValidator<[String]> + Send + Sync + 'static,
    {
        self.row_validator = Some(Box::new(validator));
    }

    pub fn clear_row_validator(&mut self) {
        self.row_validator = None;
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Next record, whole and unprojected, after row validation.
    pub async fn read_next(&mut self) -> CsvResult<Option<Record>> {
        let Some(record) = self.source.pull_next().await? else {
            return Ok(None);
        };
        self.records_read += 1;
        if let Some(validator) = &self.row_validator {
            if let Err(violation) = validator.validate(&record) {
                debug!(record = self.records_read, reason = violation.reason(), "row rejected");
                return Err(violation.into());
            }
        }
        Ok(Some(record))
    }

    /// Next record projected onto `names`, in the order given.
    ///
    /// `None` returns the record unprojected. `Some(&[])` returns an empty
    /// vector. Every name is resolved before any value is copied, and the
    /// record width is checked once, before any indexing.
    pub async fn read_named(&mut self, names: Option<&[&str]>) -> CsvResult<Option<Record>> {
        let Some(names) = names else {
            return self.read_next().await;
        };
        let Some(record) = self.read_next().await? else {
            return Ok(None);
        };

        let positions = names
            .iter()
            .map(|&name| {
                self.header
                    .position(name)
                    .ok_or_else(|| self.unknown_header(name))
            })
            .collect::<CsvResult<Vec<_>>>()?;

        if positions.is_empty() {
            return Ok(Some(Vec::new()));
        }
        self.check_width(&record)?;

        Ok(Some(
            positions
                .into_iter()
                .map(|pos| record[pos].clone())
                .collect(),
        ))
    }

    /// Next record as header name -> value.
    ///
    /// Only header positions inside the record are mapped. Under
    /// [`WidthCheck::Strict`] a width mismatch is rejected first, so that
    /// only matters with [`WidthCheck::Relaxed`], where a short record
    /// yields a partial map.
    pub async fn read_map(&mut self) -> CsvResult<Option<HashMap<String, String>>> {
        let Some(record) = self.read_next().await? else {
            return Ok(None);
        };
        if self.map_width_check == WidthCheck::Strict {
            self.check_width(&record)?;
        }

        let mut mapped = HashMap::with_capacity(self.header.len());
        for (name, pos) in self.header.iter() {
            if let Some(value) = record.get(pos) {
                mapped.insert(name.to_string(), value.clone());
            }
        }
        Ok(Some(mapped))
    }

    /// Remaining records as a stream; ends at the first error.
    pub fn into_records(self) -> impl Stream<Item = CsvResult<Record>> {
        stream::try_unfold(self, |mut reader| async move {
            Ok::<_, CsvError>(reader.read_next().await?.map(|record| (record, reader)))
        })
    }

    /// Remaining records as name-keyed maps; ends at the first error.
    pub fn into_maps(self) -> impl Stream<Item = CsvResult<HashMap<String, String>>> {
        stream::try_unfold(self, |mut reader| async move {
            Ok::<_, CsvError>(reader.read_map().await?.map(|map| (map, reader)))
        })
    }

    fn check_width(&self, record: &[String]) -> CsvResult<()> {
        let expected = self.header.width();
        if record.len() == expected {
            return Ok(());
        }
        debug!(
            record = self.records_read,
            expected,
            actual = record.len(),
            "record/header width mismatch"
        );
        Err(CsvError::RecordHeaderWidthMismatch {
            record: self.records_read,
            expected,
            actual: record.len(),
            message: self.diagnostics.message(
                MessageKey::HeaderDataMismatch,
                &[
                    self.records_read.to_string(),
                    record.len().to_string(),
                    expected.to_string(),
                ],
            ),
        })
    }

    fn unknown_header(&self, name: &str) -> CsvError {
        trace!(name, "unknown header name requested");
        CsvError::UnknownHeaderName {
            name: name.to_string(),
            message: self
                .diagnostics
                .message(MessageKey::HeaderNonexistent, &[name.to_string()]),
        }
    }
}
