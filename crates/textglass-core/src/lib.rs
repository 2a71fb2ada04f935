//! TextGlass Core
//!
//! Core types and utilities shared across TextGlass components.
//!
//! This crate provides:
//! - Error types and result handling
//! - The ordered attribute map returned by classification
//! - Domain identity (name, version, spec version) stamped on loaded configurations

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{AttributeMap, DomainIdentity, ERROR_SUFFIX, PATTERN_ID_KEY, SPEC_VERSION};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{AttributeMap, DomainIdentity};
}
