//! Where records come from.
//!
//! A [`RecordSource`] yields one tokenized record per call, in input order,
//! and `None` once exhausted. Three sources ship with the crate:
//!
//! - `csv_async::AsyncReader<R>` straight from [`csv_reader`] (fastest, never
//!   sees raw lines);
//! - [`LineRecordSource`], which reads physical lines so a line validator
//!   can vet them before tokenization;
//! - `VecDeque<Record>` for data already in memory.

use std::collections::VecDeque;
use std::future::Future;

use csv_async::{AsyncReader, AsyncReaderBuilder, StringRecord};
use csv_core::ReadRecordResult;
use memchr::memchr2;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead};
use tracing::{debug, trace};

use crate::config::ReaderConfig;
use crate::messages::{Diagnostics, MessageKey};
use crate::validator::{DataValidator, LineValidator};
use crate::{CsvError, CsvResult};

/// One logical CSV record.
pub type Record = Vec<String>;

pub trait RecordSource {
    /// Next record, or `None` when the input is exhausted.
    fn pull_next(&mut self) -> impl Future<Output = CsvResult<Option<Record>>> + Send;

    /// Hands the source a validator for raw lines. Sources that never see
    /// raw lines give the validator back.
    fn install_line_validator(
        &mut self,
        validator: Box<LineValidator>,
    ) -> Result<(), Box<LineValidator>> {
        Err(validator)
    }
}

/// Headerless, flexible `csv_async` reader configured from `config`.
/// The headered reader consumes the header itself, so the tokenizer must
/// not. `skip_lines` and `multiline_limit` are not applied here.
///
/// Blank lines are skipped by the tokenizer and never reach the caller;
/// [`LineRecordSource`] instead reports a blank line as one empty field.
pub fn csv_reader<R>(raw: R, config: &ReaderConfig) -> AsyncReader<R>
where
    R: AsyncRead + Unpin + Send,
{
    AsyncReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(config.delimiter)
        .quote(config.quote)
        // Larger internal buffer reduces syscalls and allocator churn
        .buffer_capacity(config.buffer_capacity)
        .create_reader(raw)
}

impl<R> RecordSource for AsyncReader<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn pull_next(&mut self) -> CsvResult<Option<Record>> {
        let mut record = StringRecord::new();
        if !self.read_record(&mut record).await? {
            return Ok(None);
        }
        trace!(line = record.position().map(|p| p.line()), fields = record.len(), "pulled record");
        Ok(Some(record.iter().map(str::to_owned).collect()))
    }
}

impl RecordSource for VecDeque<Record> {
    async fn pull_next(&mut self) -> CsvResult<Option<Record>> {
        Ok(self.pop_front())
    }
}

/// Line-oriented source: physical lines are read one at a time, checked by
/// the optional line validator, joined while a quoted field is still open,
/// and only then tokenized.
///
/// Physical lines end at `\n`, `\r\n` or a lone `\r`. A quote only opens a
/// quoted field at the start of a field, as in the tokenizer; `5" tv` is a
/// plain value. If the joined text still tokenizes into more than one record
/// the pull fails with [`CsvError::Malformed`] rather than dropping any.
///
/// A line the validator rejects is consumed and never tokenized; a record
/// interrupted by a rejection or a broken multiline limit is dropped and the
/// next pull starts at the following physical line.
///
/// A blank line yields a record with one empty field, so it is a width
/// mismatch against any wider header. The [`csv_reader`] source skips blank
/// lines instead.
pub struct LineRecordSource<R> {
    inner: R,
    delimiter: u8,
    quote: u8,
    skip_lines: usize,
    multiline_limit: usize,
    diagnostics: Diagnostics,
    line_validator: Option<Box<LineValidator>>,
    tokenizer: Tokenizer,
    lines_read: u64,
    skipped: bool,
}

impl<R> LineRecordSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(inner: R, config: &ReaderConfig) -> Self {
        Self {
            inner,
            delimiter: config.delimiter,
            quote: config.quote,
            skip_lines: config.skip_lines,
            multiline_limit: config.multiline_limit,
            diagnostics: config.diagnostics(),
            line_validator: None,
            tokenizer: Tokenizer::new(config.delimiter, config.quote),
            lines_read: 0,
            skipped: false,
        }
    }

    pub fn with_line_validator<V>(mut self, validator: V) -> Self
    where
        V: DataValidator<str> + Send + Sync + 'static,
    {
        self.line_validator = Some(Box::new(validator));
        self
    }

    /// Physical lines consumed so far, skipped lines included.
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Reads one physical line, terminator included, into `buf`.
    async fn read_physical(&mut self, buf: &mut String) -> CsvResult<bool> {
        buf.clear();
        let mut bytes = Vec::new();
        let mut after_cr = false;
        loop {
            let (used, done) = {
                let available = self.inner.fill_buf().await?;
                if available.is_empty() {
                    break;
                }
                if after_cr {
                    // only a directly following \n belongs to this line
                    if available[0] == b'\n' {
                        bytes.push(b'\n');
                        (1, true)
                    } else {
                        (0, true)
                    }
                } else {
                    match memchr2(b'\n', b'\r', available) {
                        Some(i) => {
                            bytes.extend_from_slice(&available[..=i]);
                            after_cr = available[i] == b'\r';
                            (i + 1, !after_cr)
                        }
                        None => {
                            bytes.extend_from_slice(available);
                            (available.len(), false)
                        }
                    }
                }
            };
            self.inner.consume(used);
            if done {
                break;
            }
        }

        if bytes.is_empty() {
            return Ok(false);
        }
        let line = String::from_utf8(bytes)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        buf.push_str(&line);
        self.lines_read += 1;
        Ok(true)
    }

    async fn skip_leading(&mut self) -> CsvResult<()> {
        if self.skipped {
            return Ok(());
        }
        self.skipped = true;
        let mut buf = String::new();
        for _ in 0..self.skip_lines {
            if !self.read_physical(&mut buf).await? {
                break;
            }
        }
        if self.skip_lines > 0 {
            debug!(skipped = self.lines_read, "skipped leading lines");
        }
        Ok(())
    }

    fn check_line(&self, raw: &str) -> CsvResult<()> {
        if let Some(validator) = &self.line_validator {
            let line = strip_terminator(raw);
            if let Err(violation) = validator.validate(line) {
                debug!(line = self.lines_read, reason = violation.reason(), "line rejected");
                return Err(violation.into());
            }
        }
        Ok(())
    }
}

impl<R> RecordSource for LineRecordSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn pull_next(&mut self) -> CsvResult<Option<Record>> {
        self.skip_leading().await?;

        let mut logical = String::new();
        let mut physical = String::new();
        let mut quoting = QuoteState::default();
        let mut spanned = 0usize;
        let mut started_at = 0u64;

        loop {
            if !self.read_physical(&mut physical).await? {
                if spanned == 0 {
                    return Ok(None);
                }
                return Err(CsvError::Malformed {
                    line: started_at,
                    message: self
                        .diagnostics
                        .message(MessageKey::UnterminatedQuote, &[started_at.to_string()]),
                });
            }
            if spanned == 0 {
                started_at = self.lines_read;
            }
            spanned += 1;

            self.check_line(&physical)?;

            if self.multiline_limit > 0 && spanned > self.multiline_limit {
                return Err(CsvError::Malformed {
                    line: self.lines_read,
                    message: self.diagnostics.message(
                        MessageKey::MultilineLimitBroken,
                        &[self.multiline_limit.to_string(), self.lines_read.to_string()],
                    ),
                });
            }

            quoting.scan(physical.as_bytes(), self.delimiter, self.quote);
            logical.push_str(&physical);
            if !quoting.in_quotes {
                break;
            }
        }

        let mut records = self.tokenizer.split(logical.as_bytes())?;
        if records.len() > 1 {
            debug!(line = started_at, records = records.len(), "logical record overran");
            return Err(CsvError::Malformed {
                line: started_at,
                message: self.diagnostics.message(
                    MessageKey::RecordOverrun,
                    &[started_at.to_string(), records.len().to_string()],
                ),
            });
        }
        let record = records.pop().unwrap_or_else(|| vec![String::new()]);
        trace!(line = started_at, spans = spanned, fields = record.len(), "pulled record");
        Ok(Some(record))
    }

    fn install_line_validator(
        &mut self,
        validator: Box<LineValidator>,
    ) -> Result<(), Box<LineValidator>> {
        self.line_validator = Some(validator);
        Ok(())
    }
}

fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Whether a quoted field is open, following the tokenizer's rules: a quote
/// opens a field only at its start, and a doubled quote inside a quoted
/// field is an escaped quote.
#[derive(Debug, Clone, Copy)]
struct QuoteState {
    in_quotes: bool,
    field_start: bool,
    just_closed: bool,
}

impl Default for QuoteState {
    fn default() -> Self {
        Self {
            in_quotes: false,
            field_start: true,
            just_closed: false,
        }
    }
}

impl QuoteState {
    fn scan(&mut self, line: &[u8], delimiter: u8, quote: u8) {
        for &b in line {
            if self.in_quotes {
                if b == quote {
                    self.in_quotes = false;
                    self.just_closed = true;
                }
                continue;
            }
            if self.just_closed && b == quote {
                self.in_quotes = true;
                self.just_closed = false;
                continue;
            }
            self.just_closed = false;
            if b == quote && self.field_start {
                self.in_quotes = true;
                self.field_start = false;
                continue;
            }
            self.field_start = b == delimiter;
        }
    }
}

/// `csv_core` reader reused for every logical record, with buffers that
/// only ever grow.
struct Tokenizer {
    core: csv_core::Reader,
    output: Vec<u8>,
    ends: Vec<usize>,
}

impl Tokenizer {
    fn new(delimiter: u8, quote: u8) -> Self {
        Self {
            core: csv_core::ReaderBuilder::new()
                .delimiter(delimiter)
                .quote(quote)
                .build(),
            output: vec![0; 1024],
            ends: vec![0; 32],
        }
    }

    /// Every record in `input`, which is complete text. Blank lines produce
    /// nothing.
    fn split(&mut self, mut input: &[u8]) -> CsvResult<Vec<Record>> {
        self.core.reset();
        let mut records = Vec::new();
        let (mut out_len, mut ends_len) = (0usize, 0usize);
        loop {
            let (result, read, written, ended) = self.core.read_record(
                input,
                &mut self.output[out_len..],
                &mut self.ends[ends_len..],
            );
            input = &input[read..];
            out_len += written;
            ends_len += ended;
            match result {
                // input exhausted; the next call with empty input signals EOF
                ReadRecordResult::InputEmpty => {}
                ReadRecordResult::OutputFull => {
                    let grown = self.output.len() * 2;
                    self.output.resize(grown, 0);
                }
                ReadRecordResult::OutputEndsFull => {
                    let grown = self.ends.len() * 2;
                    self.ends.resize(grown, 0);
                }
                ReadRecordResult::Record => {
                    records.push(self.fields(out_len, ends_len)?);
                    out_len = 0;
                    ends_len = 0;
                }
                ReadRecordResult::End => break,
            }
        }
        Ok(records)
    }

    fn fields(&self, out_len: usize, ends_len: usize) -> CsvResult<Record> {
        let data = &self.output[..out_len];
        let mut start = 0;
        let mut fields = Vec::with_capacity(ends_len);
        for &end in &self.ends[..ends_len] {
            let field = std::str::from_utf8(&data[start..end])
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            fields.push(field.to_owned());
            start = end;
        }
        Ok(fields)
    }
}
