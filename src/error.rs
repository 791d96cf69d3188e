//! Error types for stream pipelines.

use std::panic::Location;
use std::sync::Arc;

/// The main error type carried by pipeline items and returned by queue operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A user-supplied stage function failed to handle an item
    #[error("{0}")]
    Stage(Arc<dyn std::error::Error + Send + Sync>),

    /// An error annotated with the location it was traced at
    #[error("{source}\nconveyor::trace - {location}")]
    Traced {
        source: Box<Error>,
        location: &'static Location<'static>,
    },

    /// The cancellation token fired before the operation completed
    #[error("Pipeline was cancelled")]
    Cancelled,

    /// The receiving side of a queue was dropped
    #[error("Channel was closed unexpectedly")]
    ChannelClosed,

    /// A custom error with a message
    #[error("{0}")]
    Custom(String),
}

// Convenience constructors
impl Error {
    /// Create a stage error from any error type
    pub fn stage<E: std::error::Error + Send + Sync + 'static>(error: E) -> Self {
        Error::Stage(Arc::new(error))
    }

    /// Create a custom error with a message
    pub fn custom<S: Into<String>>(message: S) -> Self {
        Error::Custom(message.into())
    }

    /// Wrap this error with the given call site.
    pub(crate) fn traced(self, location: &'static Location<'static>) -> Self {
        Error::Traced {
            source: Box::new(self),
            location,
        }
    }

    /// Looks through trace annotations for the original stage failure of type `E`.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Error::Stage(inner) => inner.downcast_ref::<E>(),
            Error::Traced { source, .. } => source.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// The innermost location recorded by `trace`, if any.
    pub fn location(&self) -> Option<&'static Location<'static>> {
        match self {
            Error::Traced { source, location } => source.location().or(Some(*location)),
            _ => None,
        }
    }

    /// The error with every trace annotation removed.
    pub fn root(&self) -> &Error {
        match self {
            Error::Traced { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), Error::Cancelled)
    }
}

// Common conversions
impl<T> From<tokio::sync::mpsc::error::SendError<T>> for Error {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Error::ChannelClosed
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::stage(e)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Custom(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Custom(s.to_string())
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Helper trait for converting foreign errors into stage errors
pub trait IntoError<T> {
    fn into_stage_error(self) -> Result<T>;
}

impl<T, E> IntoError<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn into_stage_error(self) -> Result<T> {
        self.map_err(Error::stage)
    }
}
