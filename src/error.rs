use thiserror::Error;

use crate::{
    types::TypeId,
    version::Version,
};

/// An error that may occur when building a fixer or running a migration.
///
/// Recoverable data-shaped failures (kind mismatches, missing fields,
/// unknown tags) flow through [`DataResult`](crate::result::DataResult)
/// instead; this type covers misconfiguration and misuse of the runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A schema lookup referenced a version that was never registered.
    #[error("unknown schema version {0}")]
    UnknownVersion(Version),

    /// A type lookup missed in a schema and all of its parents.
    #[error("unknown type `{type_id}` in schema {version}")]
    UnknownType {
        /// The missing type.
        type_id: TypeId,
        /// The schema the lookup started from.
        version: Version,
    },

    /// `update` was asked to migrate to an older version.
    #[error("cannot migrate backwards from {from} to {to}")]
    BackwardMigration {
        /// The stored version.
        from: Version,
        /// The requested target version.
        to: Version,
    },

    /// A negative or otherwise unrepresentable version value.
    #[error("invalid version: {0}")]
    InvalidVersion(i64),

    /// A dotted path failed to parse.
    #[error("malformed path `{path}` at byte {position}: {message}")]
    PathParse {
        /// The path text as given.
        path: String,
        /// Byte offset of the offending character.
        position: usize,
        /// What went wrong.
        message: String,
    },
}
