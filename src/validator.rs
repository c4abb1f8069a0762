//! Pluggable line and row validation.
//!
//! A validator has a pure check ([`DataValidator::is_valid`]) and an
//! enforcing form ([`DataValidator::validate`]) that the provided
//! implementation derives from the check, so the two can never disagree.

use std::fmt;
use thiserror::Error;

/// What a validator rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violated {
    /// A raw physical line, before tokenization.
    Line(String),
    /// A tokenized record.
    Row(Vec<String>),
}

/// A validator's semantic rejection of a line or a row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct ConstraintViolation {
    subject: Violated,
    reason: String,
}

impl ConstraintViolation {
    pub fn new(subject: Violated, reason: impl Into<String>) -> Self {
        Self {
            subject,
            reason: reason.into(),
        }
    }

    pub fn subject(&self) -> &Violated {
        &self.subject
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// The offending raw line, when a line validator raised this.
    pub fn line(&self) -> Option<&str> {
        match &self.subject {
            Violated::Line(line) => Some(line),
            Violated::Row(_) => None,
        }
    }

    /// The offending fields, when a row validator raised this.
    pub fn row(&self) -> Option<&[String]> {
        match &self.subject {
            Violated::Row(fields) => Some(fields),
            Violated::Line(_) => None,
        }
    }
}

/// Data a validator can be asked about; knows how to copy itself into a
/// [`Violated`] report.
pub trait Subject {
    fn to_violated(&self) -> Violated;
}

impl Subject for str {
    fn to_violated(&self) -> Violated {
        Violated::Line(self.to_string())
    }
}

impl Subject for [String] {
    fn to_violated(&self) -> Violated {
        Violated::Row(self.to_vec())
    }
}

pub trait DataValidator<T: Subject + ?Sized> {
    /// Side-effect free check.
    fn is_valid(&self, data: &T) -> bool;

    /// Text placed in the violation raised by [`validate`](Self::validate).
    fn reason(&self, data: &T) -> String;

    fn validate(&self, data: &T) -> Result<(), ConstraintViolation> {
        if self.is_valid(data) {
            Ok(())
        } else {
            Err(ConstraintViolation::new(data.to_violated(), self.reason(data)))
        }
    }
}

/// Validator over raw physical lines.
pub type LineValidator = dyn DataValidator<str> + Send + Sync;

/// Validator over tokenized records.
pub type RowValidator = dyn DataValidator<[String]> + Send + Sync;

/// Validator built from a closure and a fixed reason.
pub struct Predicate<F> {
    check: F,
    reason: String,
}

impl<F> Predicate<F> {
    pub fn new(reason: impl Into<String>, check: F) -> Self {
        Self {
            check,
            reason: reason.into(),
        }
    }
}

impl<F> fmt::Debug for Predicate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

impl<T, F> DataValidator<T> for Predicate<F>
where
    T: Subject + ?Sized,
    F: Fn(&T) -> bool,
{
    fn is_valid(&self, data: &T) -> bool {
        (self.check)(data)
    }

    fn reason(&self, _data: &T) -> String {
        self.reason.clone()
    }
}

/// Several validators applied as one. Valid only when every member is;
/// the violation lists each failing member's reason, joined by `"; "`.
pub struct ValidatorChain<T: Subject + ?Sized> {
    validators: Vec<Box<dyn DataValidator<T> + Send + Sync>>,
}

impl<T: Subject + ?Sized> ValidatorChain<T> {
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    pub fn push<V>(&mut self, validator: V)
    where
        V: DataValidator<T> + Send + Sync + 'static,
    {
        self.validators.push(Box::new(validator));
    }

    pub fn with<V>(mut self, validator: V) -> Self
    where
        V: DataValidator<T> + Send + Sync + 'static,
    {
        self.push(validator);
        self
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl<T: Subject + ?Sized> Default for ValidatorChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Subject + ?Sized> fmt::Debug for ValidatorChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorChain")
            .field("len", &self.validators.len())
            .finish()
    }
}

impl<T: Subject + ?Sized> DataValidator<T> for ValidatorChain<T> {
    fn is_valid(&self, data: &T) -> bool {
        self.validators.iter().all(|v| v.is_valid(data))
    }

    fn reason(&self, data: &T) -> String {
        self.validators
            .iter()
            .filter(|v| !v.is_valid(data))
            .map(|v| v.reason(data))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
