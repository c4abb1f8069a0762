use std::fmt;
use std::sync::Arc;

use crate::messages::{BundledMessages, Diagnostics, Locale, MessageResolver};

/// How `read_map` treats records whose width differs from the header's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidthCheck {
    /// Reject with `RecordHeaderWidthMismatch`.
    #[default]
    Strict,
    /// Skip the check; only header positions inside the record are mapped.
    Relaxed,
}

/// Options shared by record sources and the headered reader.
#[derive(Clone)]
pub struct ReaderConfig {
    pub delimiter: u8,
    pub quote: u8,
    /// Physical lines dropped before the header is read.
    pub skip_lines: usize,
    /// Most physical lines one record may span; 0 means unlimited.
    pub multiline_limit: usize,
    pub locale: Locale,
    pub map_width_check: WidthCheck,
    pub buffer_capacity: usize,
    pub messages: Arc<dyn MessageResolver>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            skip_lines: 0,
            multiline_limit: 0,
            locale: Locale::default(),
            map_width_check: WidthCheck::default(),
            buffer_capacity: 1 << 20, // 1 MiB
            messages: Arc::new(BundledMessages),
        }
    }
}

impl fmt::Debug for ReaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderConfig")
            .field("delimiter", &char::from(self.delimiter))
            .field("quote", &char::from(self.quote))
            .field("skip_lines", &self.skip_lines)
            .field("multiline_limit", &self.multiline_limit)
            .field("locale", &self.locale)
            .field("map_width_check", &self.map_width_check)
            .field("buffer_capacity", &self.buffer_capacity)
            .field("messages", &self.messages)
            .finish()
    }
}

impl ReaderConfig {
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn quote(mut self, quote: u8) -> Self {
        self.quote = quote;
        self
    }

    pub fn skip_lines(mut self, lines: usize) -> Self {
        self.skip_lines = lines;
        self
    }

    pub fn multiline_limit(mut self, limit: usize) -> Self {
        self.multiline_limit = limit;
        self
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn map_width_check(mut self, check: WidthCheck) -> Self {
        self.map_width_check = check;
        self
    }

    pub fn buffer_capacity(mut self, bytes: usize) -> Self {
        self.buffer_capacity = bytes;
        self
    }

    pub fn messages(mut self, resolver: Arc<dyn MessageResolver>) -> Self {
        self.messages = resolver;
        self
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics::new(self.locale, Arc::clone(&self.messages))
    }
}
