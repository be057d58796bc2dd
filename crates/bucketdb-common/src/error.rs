//! Error types for BucketDB
//!
//! Every fallible operation in the workspace returns [`Result`]. Callers that
//! only care about the category of a failure compare [`Error::kind`].

use std::fmt;

use sled::transaction::TransactionError;
use thiserror::Error;

/// Result type alias using BucketDB's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for BucketDB
#[derive(Error, Debug)]
pub enum Error {
    /// Key absent from an existing table
    #[error("no results found for key {key:?} in table {table:?}")]
    NoResults { table: String, key: String },

    /// Table name does not refer to a created table, or is not a legal name
    #[error("invalid table: {0:?}")]
    InvalidTable(String),

    /// Create-only write found the key already present
    #[error("key {key:?} already exists in table {table:?}")]
    AlreadyExists { table: String, key: String },

    /// Update-only write found no record to replace
    #[error("key {key:?} does not exist in table {table:?}")]
    DoesNotExist { table: String, key: String },

    #[error("no db connection")]
    NoConnection,

    // Serialization Errors
    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    // Storage engine Errors
    #[error("Engine error: {0}")]
    Engine(#[from] sled::Error),

    // IO Errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration Errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Several independent failures, each kept intact
    #[error("{}", Joined(.0))]
    Multiple(Vec<Error>),
}

/// Discriminant of [`Error`] without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NoResults,
    InvalidTable,
    AlreadyExists,
    DoesNotExist,
    NoConnection,
    Encoding,
    Engine,
    Io,
    Config,
    Multiple,
}

impl Error {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NoResults { .. } => ErrorKind::NoResults,
            Error::InvalidTable(_) => ErrorKind::InvalidTable,
            Error::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Error::DoesNotExist { .. } => ErrorKind::DoesNotExist,
            Error::NoConnection => ErrorKind::NoConnection,
            Error::Encoding(_) => ErrorKind::Encoding,
            Error::Engine(_) => ErrorKind::Engine,
            Error::Io(_) => ErrorKind::Io,
            Error::Config(_) => ErrorKind::Config,
            Error::Multiple(_) => ErrorKind::Multiple,
        }
    }

    /// Collapse a list of failures into a single result.
    ///
    /// No errors is success, exactly one error is returned as-is, anything
    /// more becomes [`Error::Multiple`].
    pub fn join(mut errors: Vec<Error>) -> Result<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(Error::Multiple(errors)),
        }
    }

    /// The individual causes carried by this error.
    ///
    /// For [`Error::Multiple`] these are the joined errors; any other error
    /// yields itself.
    pub fn causes(&self) -> Vec<&Error> {
        match self {
            Error::Multiple(errors) => errors.iter().collect(),
            other => vec![other],
        }
    }
}

struct Joined<'a>(&'a [Error]);

impl fmt::Display for Joined<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl From<TransactionError<Error>> for Error {
    fn from(e: TransactionError<Error>) -> Self {
        match e {
            TransactionError::Abort(inner) => inner,
            TransactionError::Storage(inner) => Error::Engine(inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_results() -> Error {
        Error::NoResults {
            table: "users".to_string(),
            key: "first".to_string(),
        }
    }

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(no_results().kind(), ErrorKind::NoResults);
        assert_eq!(
            Error::InvalidTable("x".into()).kind(),
            ErrorKind::InvalidTable
        );
        assert_eq!(Error::NoConnection.kind(), ErrorKind::NoConnection);
    }

    #[test]
    fn test_join_empty_is_ok() {
        assert!(Error::join(Vec::new()).is_ok());
    }

    #[test]
    fn test_join_single_is_unwrapped() {
        let err = Error::join(vec![Error::InvalidTable(String::new())]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTable);
    }

    #[test]
    fn test_join_keeps_every_cause() {
        let err = Error::join(vec![Error::InvalidTable(String::new()), no_results()])
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Multiple);
        let kinds: Vec<ErrorKind> = err.causes().iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![ErrorKind::InvalidTable, ErrorKind::NoResults]);

        let message = err.to_string();
        assert_eq!(message.lines().count(), 2);
        assert!(message.contains("invalid table"));
        assert!(message.contains("no results found"));
    }

    #[test]
    fn test_transaction_abort_unwraps_guard_error() {
        let err: Error = TransactionError::Abort(Error::AlreadyExists {
            table: "t".to_string(),
            key: "k".to_string(),
        })
        .into();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_transaction_storage_becomes_engine_error() {
        let err: Error = TransactionError::<Error>::Storage(sled::Error::Unsupported(
            "nope".to_string(),
        ))
        .into();
        assert_eq!(err.kind(), ErrorKind::Engine);
    }
}
