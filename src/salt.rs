//! Deterministic salt assignment.
//!
//! The pool holds an ordered list of secret strings. Each field key is
//! assigned one of them by a stable function of the key's first and last
//! characters, so the same key always maps to the same salt — across
//! calls, across engine instances, and across redeployed pipelines
//! configured with an identical pool.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use crate::MaskError;

/// An ordered pool of salt secrets with memoized per-key assignment.
///
/// The assignment cache is lazily populated on first resolution of each
/// distinct key, append-only, and never invalidated for the lifetime of
/// the pool. It is guarded by an `RwLock`, so one pool may be shared by
/// concurrent workers (reads dominate: each key is written at most once).
pub struct SaltPool {
    salts: Vec<String>,
    assignments: RwLock<HashMap<String, String>>,
}

impl SaltPool {
    /// Creates a pool from an ordered list of salts.
    ///
    /// An empty list is accepted here; [`crate::MaskingEngine::compile`]
    /// rejects configurations that would actually resolve against an
    /// empty pool, before any record is processed.
    #[must_use]
    pub fn new(salts: Vec<String>) -> Self {
        Self {
            salts,
            assignments: RwLock::new(HashMap::new()),
        }
    }

    /// Number of salts in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.salts.len()
    }

    /// Whether the pool holds no salts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.salts.is_empty()
    }

    /// Resolves the salt assigned to `key`.
    ///
    /// The empty key maps to the first salt; any other key maps to
    /// `pool[(first_char + last_char) % len]` over Unicode code points.
    /// The result is cached on first resolution and is identical for
    /// every later call with the same key.
    pub fn resolve(&self, key: &str) -> Result<String, MaskError> {
        {
            let cache = self
                .assignments
                .read()
                .map_err(|_| MaskError::PoisonedSaltCache)?;
            if let Some(salt) = cache.get(key) {
                return Ok(salt.clone());
            }
        }

        let salt = self.pick(key).ok_or(MaskError::EmptySaltPool)?.clone();
        let mut cache = self
            .assignments
            .write()
            .map_err(|_| MaskError::PoisonedSaltCache)?;
        Ok(cache.entry(key.to_string()).or_insert(salt).clone())
    }

    /// Stable salt choice for a key; `None` only when the pool is empty.
    fn pick(&self, key: &str) -> Option<&String> {
        if self.salts.is_empty() {
            return None;
        }
        match (key.chars().next(), key.chars().last()) {
            (Some(first), Some(last)) => {
                let index = (u32::from(first) + u32::from(last)) as usize % self.salts.len();
                self.salts.get(index)
            }
            _ => self.salts.first(),
        }
    }
}

// Salts are secrets; keep them out of debug output.
impl fmt::Debug for SaltPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaltPool")
            .field("salts", &format_args!("<{} redacted>", self.salts.len()))
            .finish_non_exhaustive()
    }
}
