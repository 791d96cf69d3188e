//! The value-or-error carrier for one pipeline item.

use crate::error::{Error, Result};

/// One pipeline item: either a value or the error that replaced it.
///
/// An envelope carrying an error has no value, so downstream stages cannot
/// observe a half-defined item. Stages forward error envelopes instead of
/// failing the whole stream; the final consumer decides what to do with them.
#[derive(Debug, Clone)]
pub struct Envelope<T> {
    result: Result<T>,
}

impl<T> Envelope<T> {
    pub fn new(result: Result<T>) -> Self {
        Self { result }
    }

    /// Wrap a successful value
    pub fn ok(value: T) -> Self {
        Self { result: Ok(value) }
    }

    /// Wrap a failure
    pub fn err(error: impl Into<Error>) -> Self {
        Self {
            result: Err(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn is_err(&self) -> bool {
        self.result.is_err()
    }

    pub fn value(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&Error> {
        self.result.as_ref().err()
    }

    pub fn into_value(self) -> Option<T> {
        self.result.ok()
    }

    /// Split the envelope into its value or error.
    pub fn into_result(self) -> Result<T> {
        self.result
    }

    pub fn as_result(&self) -> &Result<T> {
        &self.result
    }
}

impl<T> From<Result<T>> for Envelope<T> {
    fn from(result: Result<T>) -> Self {
        Self::new(result)
    }
}

impl<T> From<Envelope<T>> for Result<T> {
    fn from(envelope: Envelope<T>) -> Self {
        envelope.result
    }
}
