//! Call-site annotation for errors produced inside stage functions.

use std::panic::Location;

use crate::error::{Error, Result};

/// Annotate an error with the caller's location, passing values through untouched.
///
/// The original error is kept, not replaced: its message leads the traced
/// message and it stays reachable through [`Error::downcast_ref`] and
/// `source()`.
///
/// ```rust
/// use conveyor::{trace, Error};
///
/// let ok: Result<u8, Error> = trace(Ok::<u8, Error>(1));
/// assert_eq!(ok.unwrap(), 1);
///
/// let err = trace(Err::<u8, _>("disk full")).unwrap_err();
/// assert!(err.to_string().starts_with("disk full\nconveyor::trace - "));
/// assert!(err.location().is_some());
/// ```
#[track_caller]
pub fn trace<T, E>(result: std::result::Result<T, E>) -> Result<T>
where
    E: Into<Error>,
{
    let location = Location::caller();
    result.map_err(|error| error.into().traced(location))
}

/// Method form of [`trace`].
pub trait TraceExt<T> {
    fn trace(self) -> Result<T>;
}

impl<T, E> TraceExt<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    #[track_caller]
    fn trace(self) -> Result<T> {
        trace(self)
    }
}
