//! Position-based column naming for headerless input.
//!
//! Where [`HeaderIndex`](crate::HeaderIndex) learns names from the data, a
//! [`ColumnPositionMapping`] is told them up front, one optional name per
//! column position. Binding a record copies the values of the columns the
//! target [`RecordSchema`] asks for; there is no type conversion.

use std::collections::BTreeMap;

use tracing::debug;

use crate::messages::{Diagnostics, Locale, MessageKey};
use crate::source::RecordSource;
use crate::{ConfigurationKind, CsvError, CsvResult};

/// Named set of fields a bound record is made of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    name: String,
    fields: Vec<String>,
}

impl RecordSchema {
    pub fn new<I, F>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}

/// Values of one record keyed by schema field. Fields without a mapped
/// column, or whose column is past the end of the record, are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundRecord {
    values: BTreeMap<String, String>,
}

impl BoundRecord {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.values
    }
}

#[derive(Debug, Clone, Default)]
pub struct ColumnPositionMapping {
    columns: Vec<Option<String>>,
    target: Option<RecordSchema>,
    diagnostics: Diagnostics,
}

impl ColumnPositionMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_diagnostics(diagnostics: Diagnostics) -> Self {
        Self {
            diagnostics,
            ..Self::default()
        }
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.diagnostics = self.diagnostics.with_locale(locale);
    }

    pub fn set_target(&mut self, schema: RecordSchema) {
        self.target = Some(schema);
    }

    pub fn target(&self) -> Option<&RecordSchema> {
        self.target.as_ref()
    }

    /// Names columns by position; `None` leaves that column unnamed.
    /// Replaces any earlier mapping.
    pub fn set_column_mapping<I, N>(&mut self, columns: I)
    where
        I: IntoIterator<Item = Option<N>>,
        N: Into<String>,
    {
        self.columns = columns.into_iter().map(|c| c.map(Into::into)).collect();
    }

    pub fn clear_column_mapping(&mut self) {
        self.columns.clear();
    }

    pub fn column_mapping(&self) -> &[Option<String>] {
        &self.columns
    }

    /// Name of the column at `position`; `None` when unnamed or out of range.
    pub fn column_name(&self, position: usize) -> Option<&str> {
        self.columns.get(position).and_then(|c| c.as_deref())
    }

    /// Position of `name`; the last position wins if a name repeats.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .rposition(|c| c.as_deref() == Some(name))
    }

    /// The target schema, or a localized configuration error when unset.
    pub fn ensure_ready(&self) -> CsvResult<&RecordSchema> {
        self.target.as_ref().ok_or_else(|| CsvError::Configuration {
            kind: ConfigurationKind::TargetUnset,
            message: self.diagnostics.message(MessageKey::TargetUnset, &[]),
        })
    }

    pub fn bind(&self, record: &[String]) -> CsvResult<BoundRecord> {
        let schema = self.ensure_ready()?;
        let mut values = BTreeMap::new();
        for (position, column) in self.columns.iter().enumerate() {
            let Some(name) = column else { continue };
            if !schema.has_field(name) {
                continue;
            }
            if let Some(value) = record.get(position) {
                values.insert(name.clone(), value.clone());
            }
        }
        Ok(BoundRecord { values })
    }
}

/// Binds every remaining record of `source`. The mapping is checked before
/// the first record is pulled.
pub async fn bind_all<S: RecordSource>(
    mapping: &ColumnPositionMapping,
    source: &mut S,
) -> CsvResult<Vec<BoundRecord>> {
    let schema = mapping.ensure_ready()?;
    let mut bound = Vec::new();
    while let Some(record) = source.pull_next().await? {
        bound.push(mapping.bind(&record)?);
    }
    debug!(schema = schema.name(), records = bound.len(), "bound records");
    Ok(bound)
}
