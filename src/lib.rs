//! # Logmask
//!
//! Deterministic field masking for structured log and telemetry records.
//!
//! Logmask compiles a declarative set of masking rules into an engine that
//! transforms designated fields of key-value event records — hashing
//! identifiers, stripping URL paths, truncating IP addresses to a subnet —
//! while leaving every other field untouched. A single bad field never
//! fails the record: transforms fail open on unparsable input, and each
//! compiled masker runs inside its own isolation boundary.
//!
//! ## Features
//!
//! - Five field selectors: exact key, nested key chain, key-name pattern,
//!   value-content pattern, value-in-subnet membership
//! - Salted digest transforms (MD5 through SHA-512), URL path redaction,
//!   IP subnet truncation
//! - Deterministic per-key salt assignment, reproducible across deploys
//! - Strict left-to-right masker ordering with per-masker fault isolation
//! - Thread-safe: one compiled engine may be shared across workers
//!
//! ## Example
//!
//! ```rust
//! use logmask::{MaskMethod, MaskRule, MaskingConfig, MaskingEngine, Record};
//! use serde_json::json;
//!
//! let config = MaskingConfig::new()
//!     .with_salts(["s1", "s2", "s3"])
//!     .with_mask(MaskRule::new(MaskMethod::Digest256).with_key("user_id"));
//! let engine = MaskingEngine::compile(&config).expect("valid config");
//!
//! let record: Record = json!({"user_id": "1234", "path": "/index.html"})
//!     .as_object()
//!     .cloned()
//!     .expect("object literal");
//! let masked = engine.apply(record);
//! assert_ne!(masked["user_id"], json!("1234"));
//! assert_eq!(masked["path"], json!("/index.html"));
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod engine;
pub mod masker;
pub mod net;
pub mod record;
pub mod salt;
pub mod transform;

// Re-exports for convenience
pub use config::{LegacyMaskParams, MaskMethod, MaskRule, MaskingConfig};
pub use engine::MaskingEngine;
pub use masker::{Masker, SaltSource, Selector};
pub use net::Subnet;
pub use record::{Record, coerce_to_string};
pub use salt::SaltPool;
pub use transform::{DigestAlgorithm, Transform};

/// Configuration-time error.
///
/// Every variant is fatal: it surfaces from [`MaskingEngine::compile`]
/// (or from config loading) before any record is processed, so a
/// misconfigured pipeline never starts.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `NoMaskers` | The compiled masker list is empty |
/// | `SaltMissing` | A rule needs pool-based salt resolution but the pool is empty |
/// | `InvalidPattern` | A `key_pattern` or `value_pattern` regex fails to compile |
/// | `InvalidSubnet` | A `value_in_subnet` CIDR literal fails to parse |
/// | `OperationFailed` | A config file cannot be read or parsed |
#[derive(Debug, ThisError)]
pub enum Error {
    /// No masking operations were configured.
    ///
    /// Raised when:
    /// - No rule declares any selector
    /// - The config contains neither rule blocks nor legacy parameters
    #[error("no masking operations configured")]
    NoMaskers,

    /// A salt is required but missing.
    ///
    /// Raised when:
    /// - A rule has no rule-level `salt` override
    /// - And the global salt pool (`salt` + `salts`) is empty
    #[error("salt (or salts) required, but missing")]
    SaltMissing,

    /// A selector regular expression failed to compile.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern text.
        pattern: String,
        /// The underlying regex error.
        source: regex::Error,
    },

    /// A CIDR subnet literal failed to parse.
    #[error("invalid subnet '{subnet}': {reason}")]
    InvalidSubnet {
        /// The offending subnet text.
        subnet: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An operation failed.
    ///
    /// Raised when:
    /// - A config file cannot be read from disk
    /// - Config text fails JSON or TOML deserialization
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for logmask operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Runtime error raised inside a single masker application.
///
/// Non-fatal by contract: [`MaskingEngine::apply`] catches it, logs the
/// classification and message, skips that masker's effect on that record,
/// and continues. It never escapes `apply`. Distinct from the transforms'
/// own fail-open handling of unparsable input, which returns the value
/// unchanged rather than erroring at all.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum MaskError {
    /// Salt resolution was attempted against an empty pool.
    ///
    /// Compilation rejects this combination up front, so hitting it at
    /// apply time indicates a broken invariant, not bad input.
    #[error("salt pool is empty")]
    EmptySaltPool,

    /// The salt assignment cache lock was poisoned by a panicked writer.
    #[error("salt assignment cache is poisoned")]
    PoisonedSaltCache,
}

impl MaskError {
    /// Short classification name, used as the `error_class` log field.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::EmptySaltPool => "EmptySaltPool",
            Self::PoisonedSaltCache => "PoisonedSaltCache",
        }
    }
}
