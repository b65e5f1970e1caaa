//! Package identity type.
//!
//! A package build is identified by its name, version, release, architecture
//! and file name. Every field becomes one directory level of the canonical
//! store, so each must be a single safe path component.

use serde::Serialize;
use std::fmt;

use crate::error::{ShelfError, ShelfResult};
use crate::utils::path::is_safe_component;

/// Identity of one package build
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PackageIdentity {
    name: String,
    version: String,
    release: String,
    arch: String,
    filename: String,
}

impl PackageIdentity {
    /// Create a new identity, rejecting fields that are not plain path components
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        release: impl Into<String>,
        arch: impl Into<String>,
        filename: impl Into<String>,
    ) -> ShelfResult<Self> {
        let identity = Self {
            name: name.into(),
            version: version.into(),
            release: release.into(),
            arch: arch.into(),
            filename: filename.into(),
        };

        for (field, value) in identity.fields() {
            if !is_safe_component(value) {
                return Err(ShelfError::InvalidPackageIdentity {
                    field,
                    value: value.to_string(),
                });
            }
        }

        Ok(identity)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn release(&self) -> &str {
        &self.release
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Fields in canonical store order
    pub fn fields(&self) -> [(&'static str, &str); 5] {
        [
            ("name", &self.name),
            ("version", &self.version),
            ("release", &self.release),
            ("arch", &self.arch),
            ("filename", &self.filename),
        ]
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}.{}",
            self.name, self.version, self.release, self.arch
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_creation() {
        let id = PackageIdentity::new("foo", "1.0", "1", "x86_64", "foo-1.0-1.x86_64.rpm").unwrap();

        assert_eq!(id.name(), "foo");
        assert_eq!(id.version(), "1.0");
        assert_eq!(id.release(), "1");
        assert_eq!(id.arch(), "x86_64");
        assert_eq!(id.filename(), "foo-1.0-1.x86_64.rpm");
        assert_eq!(id.to_string(), "foo-1.0-1.x86_64");
    }

    #[test]
    fn test_identity_rejects_traversal() {
        let err = PackageIdentity::new("foo", "..", "1", "noarch", "foo.rpm").unwrap_err();
        assert!(matches!(
            err,
            ShelfError::InvalidPackageIdentity { field: "version", .. }
        ));

        assert!(PackageIdentity::new("foo/bar", "1", "1", "noarch", "f.rpm").is_err());
        assert!(PackageIdentity::new("foo", "1", "1", "noarch", "").is_err());
    }

    #[test]
    fn test_identity_serializes_fields() {
        let id = PackageIdentity::new("bash", "5.1.8", "6.el9", "x86_64", "bash.rpm").unwrap();
        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json["release"], "6.el9");
        assert_eq!(json["filename"], "bash.rpm");
    }
}
