//! Integer schema versions.

use std::fmt;

use serde::Serialize;

use crate::error::Error;

/// A schema version: a non-negative integer, totally ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Version(u32);

impl Version {
    /// Creates a version from its integer value.
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// The integer value of the version.
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<u32> for Version {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Conversion trait for anything that can be used as a [`Version`].
pub trait IntoVersion {
    /// Converts the type into [`Version`].
    ///
    /// # Errors
    /// - If the type does not represent a valid version (e.g. a negative
    ///   integer).
    fn into_version(self) -> Result<Version, Error>;
}

impl IntoVersion for Version {
    fn into_version(self) -> Result<Version, Error> {
        Ok(self)
    }
}

impl IntoVersion for u32 {
    fn into_version(self) -> Result<Version, Error> {
        Ok(Version(self))
    }
}

impl IntoVersion for i32 {
    fn into_version(self) -> Result<Version, Error> {
        i64::from(self).into_version()
    }
}

impl IntoVersion for i64 {
    fn into_version(self) -> Result<Version, Error> {
        u32::try_from(self)
            .map(Version)
            .map_err(|_| Error::InvalidVersion(self))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_into_version() {
        assert_eq!(3_u32.into_version().unwrap(), Version::new(3));
        assert_eq!(3_i64.into_version().unwrap(), Version::new(3));
        assert!((-1_i32).into_version().is_err());
    }

    #[test]
    fn test_ordering() {
        assert!(Version::new(1) < Version::new(2));
        assert_eq!(Version::new(2).to_string(), "v2");
    }
}
