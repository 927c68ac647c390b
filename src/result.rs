//! [`DataResult`] carries success, failure, or failure with a partial value.

use std::fmt;

/// The outcome of a fallible data operation.
///
/// Unlike [`std::result::Result`], the error side may carry a *partial*
/// value: a best-effort reconstruction the caller is free to accept or
/// discard. Codecs use this to hand back everything they managed to decode
/// before the first failure.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum DataResult<A> {
    /// The operation succeeded.
    Ok(A),
    /// The operation failed, possibly with a partial value.
    Err(DataError<A>),
}

/// The error half of a [`DataResult`]: a caller-facing message plus an
/// optional partial value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataError<A> {
    message: String,
    partial: Option<A>,
}

impl<A> DataError<A> {
    /// Creates an error with no partial value.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            partial: None,
        }
    }

    /// Creates an error carrying a partial value.
    pub fn with_partial(message: impl Into<String>, partial: A) -> Self {
        Self {
            message: message.into(),
            partial: Some(partial),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The partial value, if any was recovered.
    pub fn partial(&self) -> Option<&A> {
        self.partial.as_ref()
    }

    /// Consumes the error, returning the partial value if any.
    pub fn into_partial(self) -> Option<A> {
        self.partial
    }

    fn map<B>(self, f: impl FnOnce(A) -> B) -> DataError<B> {
        DataError {
            message: self.message,
            partial: self.partial.map(f),
        }
    }
}

impl<A> fmt::Display for DataError<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl<A> DataResult<A> {
    /// Creates a successful result.
    pub fn ok(value: A) -> Self {
        Self::Ok(value)
    }

    /// Creates an error result with no partial value.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Err(DataError::new(message))
    }

    /// Creates an error result carrying a partial value.
    pub fn error_with_partial(message: impl Into<String>, partial: A) -> Self {
        Self::Err(DataError::with_partial(message, partial))
    }

    /// Returns `true` if the result is a success.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Returns `true` if the result is an error.
    pub fn is_err(&self) -> bool {
        matches!(self, Self::Err(_))
    }

    /// The success value, discarding any error.
    pub fn value(self) -> Option<A> {
        match self {
            Self::Ok(value) => Some(value),
            Self::Err(_) => None,
        }
    }

    /// The error, if any.
    pub fn err(self) -> Option<DataError<A>> {
        match self {
            Self::Ok(_) => None,
            Self::Err(err) => Some(err),
        }
    }

    /// Maps the success value, carrying any partial value through the same
    /// function.
    pub fn map<B>(self, f: impl FnOnce(A) -> B) -> DataResult<B> {
        match self {
            Self::Ok(value) => DataResult::Ok(f(value)),
            Self::Err(err) => DataResult::Err(err.map(f)),
        }
    }

    /// Chains a fallible operation.
    ///
    /// On error, the partial value (if present) is pushed through `f` as
    /// well: if it converts cleanly it becomes the new partial, and if it
    /// fails the two messages are chained.
    pub fn and_then<B>(self, f: impl FnOnce(A) -> DataResult<B>) -> DataResult<B> {
        match self {
            Self::Ok(value) => f(value),
            Self::Err(err) => {
                let message = err.message;
                match err.partial.map(f) {
                    Some(DataResult::Ok(partial)) => {
                        DataResult::Err(DataError::with_partial(message, partial))
                    }
                    Some(DataResult::Err(inner)) => DataResult::Err(DataError {
                        message: format!("{message}; {}", inner.message),
                        partial: inner.partial,
                    }),
                    None => DataResult::Err(DataError::new(message)),
                }
            }
        }
    }

    /// Transforms the error message, leaving success and partial values
    /// untouched.
    pub fn map_err(self, f: impl FnOnce(String) -> String) -> Self {
        match self {
            Self::Ok(value) => Self::Ok(value),
            Self::Err(err) => Self::Err(DataError {
                message: f(err.message),
                partial: err.partial,
            }),
        }
    }

    /// Recovers from an error that carries a partial value, invoking
    /// `on_error` with the message first. Errors without a partial value
    /// stay errors.
    pub fn promote_partial(self, on_error: impl FnOnce(&str)) -> Self {
        match self {
            Self::Ok(value) => Self::Ok(value),
            Self::Err(err) => {
                on_error(&err.message);
                match err.partial {
                    Some(partial) => Self::Ok(partial),
                    None => Self::Err(DataError::new(err.message)),
                }
            }
        }
    }

    /// Returns the success value or the given default.
    pub fn unwrap_or(self, default: A) -> A {
        match self {
            Self::Ok(value) => value,
            Self::Err(_) => default,
        }
    }

    /// Returns the success value or computes one from the error.
    pub fn unwrap_or_else(self, f: impl FnOnce(DataError<A>) -> A) -> A {
        match self {
            Self::Ok(value) => value,
            Self::Err(err) => f(err),
        }
    }

    /// Converts into a plain [`Result`].
    pub fn into_result(self) -> Result<A, DataError<A>> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::Err(err) => Err(err),
        }
    }
}

impl<A> From<DataResult<A>> for Result<A, DataError<A>> {
    fn from(value: DataResult<A>) -> Self {
        value.into_result()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_map_carries_partial() {
        let result = DataResult::error_with_partial("bad", 2).map(|v: i32| v * 10);
        let err = result.err().unwrap();
        assert_eq!(err.message(), "bad");
        assert_eq!(err.partial(), Some(&20));
    }

    #[test]
    fn test_and_then_chains_messages() {
        let result = DataResult::error_with_partial("first", 1)
            .and_then(|_: i32| DataResult::<i32>::error("second"));
        let err = result.err().unwrap();
        assert_eq!(err.message(), "first; second");
        assert_eq!(err.partial(), None);
    }

    #[test]
    fn test_promote_partial() {
        let mut seen = None;
        let result =
            DataResult::error_with_partial("lossy", 7).promote_partial(|m| seen = Some(m.to_owned()));
        assert_eq!(result, DataResult::Ok(7));
        assert_eq!(seen.as_deref(), Some("lossy"));
    }
}
