//! The masking engine.
//!
//! Compilation expands rule blocks into an ordered masker sequence and
//! validates the configuration; application folds that sequence over a
//! record left to right, isolating each masker behind its own error
//! boundary so a single failure never drops a record.

use regex::Regex;
use tracing::{debug, error};

use crate::config::{MaskMethod, MaskRule, MaskingConfig};
use crate::masker::{Masker, SaltSource, Selector};
use crate::net::Subnet;
use crate::record::Record;
use crate::salt::SaltPool;
use crate::transform::{DigestAlgorithm, Transform};
use crate::{Error, Result};

/// A compiled masking engine.
///
/// Everything is immutable after [`compile`](Self::compile) except the
/// salt assignment cache inside the pool, so one engine may be shared
/// across worker threads.
#[derive(Debug)]
pub struct MaskingEngine {
    maskers: Vec<Masker>,
    salts: SaltPool,
}

impl MaskingEngine {
    /// Compiles a configuration into an engine.
    ///
    /// Maskers are produced in declaration order: per rule, exact keys,
    /// key chains, key pattern, value pattern, value-in-subnet; across
    /// rules, declared order, with expanded legacy rules trailing the
    /// rule blocks.
    ///
    /// # Errors
    ///
    /// Fails on a malformed selector pattern or subnet literal, when the
    /// masker list comes out empty, or when a rule would need pool-based
    /// salt resolution against an empty pool. All of these surface here,
    /// before any record is processed.
    pub fn compile(config: &MaskingConfig) -> Result<Self> {
        let mut pool_salts = config.salt_list();
        let mut maskers = Vec::new();

        // Declared rules must find a salt in the declared pool; the
        // legacy widening below does not rescue them.
        let mut salt_missing = false;
        for rule in &config.masks {
            if rule.salt.is_none() && pool_salts.is_empty() {
                salt_missing = true;
            }
            compile_rule(rule, &mut maskers)?;
        }

        let legacy_rules = config.legacy.expand();
        if config.legacy.has_rules() && pool_salts.is_empty() {
            pool_salts.push(config.legacy.hash_salt.clone().unwrap_or_default());
        }
        for rule in &legacy_rules {
            compile_rule(rule, &mut maskers)?;
        }

        if maskers.is_empty() {
            return Err(Error::NoMaskers);
        }
        if salt_missing {
            return Err(Error::SaltMissing);
        }

        debug!(
            maskers = maskers.len(),
            salts = pool_salts.len(),
            "compiled masking engine"
        );
        Ok(Self {
            maskers,
            salts: SaltPool::new(pool_salts),
        })
    }

    /// Number of compiled maskers.
    #[must_use]
    pub fn masker_count(&self) -> usize {
        self.maskers.len()
    }

    /// Applies every masker to the record, in declaration order.
    ///
    /// A strict left-to-right fold: each masker sees the previous
    /// masker's output, so chained masking is observable. Never fails
    /// and never drops the record — a masker that errors is logged with
    /// its classification and message, its effect on this record is
    /// skipped, and processing continues with the next masker.
    #[must_use]
    pub fn apply(&self, mut record: Record) -> Record {
        for masker in &self.maskers {
            if let Err(e) = masker.apply(&mut record, &self.salts) {
                error!(
                    error_class = e.kind(),
                    error = %e,
                    "unexpected error while masking value"
                );
            }
        }
        record
    }
}

/// Expands one rule into maskers, one per selector entry.
fn compile_rule(rule: &MaskRule, maskers: &mut Vec<Masker>) -> Result<()> {
    let transform = transform_for(rule);
    let salt = rule
        .salt
        .clone()
        .map_or(SaltSource::Resolve, SaltSource::Fixed);
    let for_each = rule.mask_array_elements;

    let push = |maskers: &mut Vec<Masker>, selector: Selector| {
        maskers.push(Masker::new(
            selector,
            transform.clone(),
            salt.clone(),
            for_each,
        ));
    };

    for key in rule.key.iter().chain(&rule.keys) {
        push(maskers, Selector::Key(key.clone()));
    }
    for chain in rule.key_chain.iter().chain(&rule.key_chains) {
        let mut segments: Vec<String> = chain.split('.').map(str::to_string).collect();
        let Some(leaf) = segments.pop() else { continue };
        push(
            maskers,
            Selector::KeyChain {
                heading: segments,
                leaf,
            },
        );
    }
    if let Some(pattern) = &rule.key_pattern {
        push(maskers, Selector::KeyPattern(compile_pattern(pattern)?));
    }
    if let Some(pattern) = &rule.value_pattern {
        push(maskers, Selector::ValuePattern(compile_pattern(pattern)?));
    }
    if let Some(subnet) = &rule.value_in_subnet {
        push(maskers, Selector::ValueInSubnet(Subnet::parse(subnet)?));
    }

    Ok(())
}

fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| Error::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

const fn transform_for(rule: &MaskRule) -> Transform {
    match rule.method {
        MaskMethod::Digest128 => Transform::Digest(DigestAlgorithm::Md5),
        MaskMethod::Digest160 => Transform::Digest(DigestAlgorithm::Sha1),
        MaskMethod::Digest256 => Transform::Digest(DigestAlgorithm::Sha256),
        MaskMethod::Digest384 => Transform::Digest(DigestAlgorithm::Sha384),
        MaskMethod::Digest512 => Transform::Digest(DigestAlgorithm::Sha512),
        MaskMethod::UrlPath => Transform::UrlPath,
        MaskMethod::Network => Transform::Network {
            ipv4_mask_bits: rule.ipv4_mask_bits,
            ipv6_mask_bits: rule.ipv6_mask_bits,
        },
    }
}
