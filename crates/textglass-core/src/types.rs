//! Core types for TextGlass

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version of the configuration format this engine understands
pub const SPEC_VERSION: f64 = 1.0;

/// Reserved attribute key holding the id of the resolved pattern
pub const PATTERN_ID_KEY: &str = "patternId";

/// Suffix of the companion key that reports an attribute transformer failure
pub const ERROR_SUFFIX: &str = "_error";

/// Attribute mapping produced by classification.
///
/// Insertion ordered so that two runs over the same domain and input
/// render identically.
pub type AttributeMap = IndexMap<String, String>;

/// Name and version stamped on a loaded configuration by its base document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainIdentity {
    /// Domain name, e.g. `useragent`
    pub domain: String,

    /// Domain version, compared as an opaque string
    pub domain_version: String,
}

impl DomainIdentity {
    /// Create a new domain identity
    pub fn new(domain: impl Into<String>, domain_version: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            domain_version: domain_version.into(),
        }
    }

    /// Check that `other` names the same domain and version.
    ///
    /// Returns a description of the first difference found.
    pub fn check_matches(&self, other: &DomainIdentity) -> std::result::Result<(), String> {
        if self.domain != other.domain {
            return Err(format!("domains do not match: {} != {}", self.domain, other.domain));
        }

        if self.domain_version != other.domain_version {
            return Err(format!(
                "versions do not match: {} != {}",
                self.domain_version, other.domain_version
            ));
        }

        Ok(())
    }
}

impl fmt::Display for DomainIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}", self.domain, self.domain_version)
    }
}
