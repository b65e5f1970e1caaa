//! Checksum types.
//!
//! Package checksums arrive either as a single digest or as a mapping from
//! algorithm name to digest. Selecting one digest from a mapping follows a
//! fixed preference order so the canonical path never depends on map order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{ShelfError, ShelfResult};

/// Digest algorithms understood by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Md5,
    #[serde(alias = "sha")]
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Every supported algorithm
    pub const ALL: [HashAlgorithm; 6] = [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha224,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
    ];

    /// Canonical lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha224 => "sha224",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    /// Length of the hex digest
    pub fn hex_len(&self) -> usize {
        match self {
            HashAlgorithm::Md5 => 32,
            HashAlgorithm::Sha1 => 40,
            HashAlgorithm::Sha224 => 56,
            HashAlgorithm::Sha256 => 64,
            HashAlgorithm::Sha384 => 96,
            HashAlgorithm::Sha512 => 128,
        }
    }
}

impl Default for HashAlgorithm {
    /// `sha` (sha1) is the historical default hashtype of package checks
    fn default() -> Self {
        HashAlgorithm::Sha1
    }
}

impl FromStr for HashAlgorithm {
    type Err = ShelfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha" | "sha1" => Ok(HashAlgorithm::Sha1),
            "sha224" => Ok(HashAlgorithm::Sha224),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            _ => Err(ShelfError::UnsupportedAlgorithm {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A digest together with the algorithm that produced it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChecksumRecord {
    pub algorithm: HashAlgorithm,
    pub digest: String,
}

impl ChecksumRecord {
    /// Create a record, normalizing the digest to lowercase
    pub fn new(algorithm: HashAlgorithm, digest: impl Into<String>) -> Self {
        Self {
            algorithm,
            digest: digest.into().trim().to_ascii_lowercase(),
        }
    }

    /// Compare against another hex digest, ignoring case
    pub fn matches(&self, digest: &str) -> bool {
        self.digest.eq_ignore_ascii_case(digest.trim())
    }
}

impl fmt::Display for ChecksumRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.digest)
    }
}

/// Checksum as supplied for a package: one digest or a digest per algorithm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChecksumSpec {
    Single(String),
    Multi(BTreeMap<String, String>),
}

impl ChecksumSpec {
    /// Pick the digest used for the canonical path.
    ///
    /// Order: a single digest as given; otherwise `sha256`, then the
    /// `fallback` algorithm, then the only entry of a one-entry mapping.
    /// Anything else is ambiguous. Keys are compared by parsed algorithm,
    /// so `sha` and `SHA1` both count as sha1.
    pub fn select_digest(&self, fallback: HashAlgorithm) -> ShelfResult<&str> {
        let map = match self {
            ChecksumSpec::Single(digest) => return Ok(digest),
            ChecksumSpec::Multi(map) => map,
        };

        if map.is_empty() {
            return Err(ShelfError::AmbiguousChecksum {
                available: String::new(),
            });
        }

        let find = |wanted: HashAlgorithm| {
            map.iter()
                .find(|(key, _)| key.parse::<HashAlgorithm>().ok() == Some(wanted))
                .map(|(_, digest)| digest.as_str())
        };

        if let Some(digest) = find(HashAlgorithm::Sha256).or_else(|| find(fallback)) {
            return Ok(digest);
        }

        if map.len() == 1 {
            if let Some(digest) = map.values().next() {
                return Ok(digest);
            }
        }

        Err(ShelfError::AmbiguousChecksum {
            available: map.keys().cloned().collect::<Vec<_>>().join(", "),
        })
    }
}

impl From<&str> for ChecksumSpec {
    fn from(digest: &str) -> Self {
        ChecksumSpec::Single(digest.to_string())
    }
}

impl From<ChecksumRecord> for ChecksumSpec {
    fn from(record: ChecksumRecord) -> Self {
        ChecksumSpec::Multi(BTreeMap::from([(
            record.algorithm.name().to_string(),
            record.digest,
        )]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multi(entries: &[(&str, &str)]) -> ChecksumSpec {
        ChecksumSpec::Multi(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!("sha".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha1);
        assert_eq!("SHA".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha1);
        assert_eq!("Sha256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("md5".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Md5);

        let err = "crc32".parse::<HashAlgorithm>().unwrap_err();
        assert!(matches!(err, ShelfError::UnsupportedAlgorithm { name } if name == "crc32"));
    }

    #[test]
    fn test_algorithm_serde_alias() {
        let alg: HashAlgorithm = serde_json::from_str("\"sha\"").unwrap();
        assert_eq!(alg, HashAlgorithm::Sha1);
        assert_eq!(serde_json::to_string(&HashAlgorithm::Sha256).unwrap(), "\"sha256\"");
    }

    #[test]
    fn test_record_normalizes_case() {
        let record = ChecksumRecord::new(HashAlgorithm::Sha256, "DEADBEEF");
        assert_eq!(record.digest, "deadbeef");
        assert!(record.matches("DeadBeef"));
        assert!(!record.matches("deadbeee"));
        assert_eq!(record.to_string(), "sha256:deadbeef");
    }

    #[test]
    fn test_select_single() {
        let spec = ChecksumSpec::from("abc123");
        assert_eq!(spec.select_digest(HashAlgorithm::Sha1).unwrap(), "abc123");
    }

    #[test]
    fn test_select_prefers_sha256() {
        let spec = multi(&[("md5", "111"), ("sha1", "222"), ("sha256", "333")]);
        assert_eq!(spec.select_digest(HashAlgorithm::Sha1).unwrap(), "333");
    }

    #[test]
    fn test_select_uses_fallback() {
        let spec = multi(&[("md5", "111"), ("sha", "222")]);
        assert_eq!(spec.select_digest(HashAlgorithm::Sha1).unwrap(), "222");
        assert_eq!(spec.select_digest(HashAlgorithm::Md5).unwrap(), "111");
    }

    #[test]
    fn test_select_single_entry() {
        let spec = multi(&[("sha512", "999")]);
        assert_eq!(spec.select_digest(HashAlgorithm::Sha1).unwrap(), "999");
    }

    #[test]
    fn test_select_ambiguous() {
        let spec = multi(&[("md5", "111"), ("sha512", "999")]);
        let err = spec.select_digest(HashAlgorithm::Sha1).unwrap_err();
        assert!(matches!(err, ShelfError::AmbiguousChecksum { available } if available == "md5, sha512"));
    }

    #[test]
    fn test_select_empty() {
        let spec = multi(&[]);
        assert!(matches!(
            spec.select_digest(HashAlgorithm::Sha1),
            Err(ShelfError::AmbiguousChecksum { .. })
        ));
    }

    #[test]
    fn test_spec_untagged_deserialize() {
        let single: ChecksumSpec = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(single, ChecksumSpec::Single("abc".to_string()));

        let map: ChecksumSpec = serde_json::from_str(r#"{"sha256":"def"}"#).unwrap();
        assert_eq!(map.select_digest(HashAlgorithm::Sha1).unwrap(), "def");
    }
}
