//! Compiled maskers.
//!
//! A masker binds one field-selection strategy to one transform and one
//! salt source. Maskers are immutable after compilation and are applied
//! to records in strict declaration order by the engine.

use std::net::IpAddr;

use regex::Regex;
use serde_json::Value;

use crate::MaskError;
use crate::net::Subnet;
use crate::record::{Record, coerce_to_string};
use crate::salt::SaltPool;
use crate::transform::Transform;

/// Field-selection strategy for a compiled masker.
#[derive(Debug, Clone)]
pub enum Selector {
    /// Exact top-level key.
    Key(String),
    /// Dotted path into nested mappings; the transform applies only at
    /// the final segment.
    KeyChain {
        /// Leading segments, navigated through nested mappings.
        heading: Vec<String>,
        /// Final segment, the field that gets masked.
        leaf: String,
    },
    /// Regex over top-level field names.
    KeyPattern(Regex),
    /// Regex over the string form of top-level values.
    ValuePattern(Regex),
    /// Top-level string values parsing as an address inside this
    /// network.
    ValueInSubnet(Subnet),
}

/// Where a masker's salt comes from at apply time.
#[derive(Debug, Clone)]
pub enum SaltSource {
    /// Rule-level override, used verbatim.
    Fixed(String),
    /// Deterministic per-key resolution from the shared pool.
    Resolve,
}

impl SaltSource {
    fn salt_for(&self, key: &str, pool: &SaltPool) -> Result<String, MaskError> {
        match self {
            Self::Fixed(salt) => Ok(salt.clone()),
            Self::Resolve => pool.resolve(key),
        }
    }
}

/// A compiled, executable masking unit.
#[derive(Debug, Clone)]
pub struct Masker {
    selector: Selector,
    transform: Transform,
    salt: SaltSource,
    mask_array_elements: bool,
}

impl Masker {
    /// Binds a selector to a transform and salt source.
    #[must_use]
    pub(crate) const fn new(
        selector: Selector,
        transform: Transform,
        salt: SaltSource,
        mask_array_elements: bool,
    ) -> Self {
        Self {
            selector,
            transform,
            salt,
            mask_array_elements,
        }
    }

    /// The masker's selection strategy.
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Applies this masker to a record in place.
    ///
    /// Selectors that find nothing are no-ops. Pattern, value and subnet
    /// selectors inspect top-level fields only; nested mappings are
    /// reached exclusively through key chains.
    pub(crate) fn apply(&self, record: &mut Record, pool: &SaltPool) -> Result<(), MaskError> {
        match &self.selector {
            Selector::Key(key) => {
                if let Some(value) = record.get_mut(key) {
                    let salt = self.salt.salt_for(key, pool)?;
                    let masked = self.mask_value(value, &salt);
                    *value = masked;
                }
            }
            Selector::KeyChain { heading, leaf } => {
                if let Some(container) = chain_container_mut(record, heading)
                    && let Some(value) = container.get_mut(leaf)
                {
                    let salt = self.salt.salt_for(leaf, pool)?;
                    let masked = self.mask_value(value, &salt);
                    *value = masked;
                }
            }
            Selector::KeyPattern(pattern) => {
                for (key, value) in record.iter_mut() {
                    if pattern.is_match(key) {
                        let salt = self.salt.salt_for(key, pool)?;
                        let masked = self.mask_value(value, &salt);
                        *value = masked;
                    }
                }
            }
            Selector::ValuePattern(pattern) => {
                for (key, value) in record.iter_mut() {
                    if pattern.is_match(&coerce_to_string(value)) {
                        let salt = self.salt.salt_for(key, pool)?;
                        let masked = self.transform.apply(value, &salt);
                        *value = masked;
                    }
                }
            }
            Selector::ValueInSubnet(subnet) => {
                for (key, value) in record.iter_mut() {
                    let is_member = match &*value {
                        Value::String(text) => text
                            .parse::<IpAddr>()
                            .is_ok_and(|addr| subnet.contains(&addr)),
                        _ => false,
                    };
                    if is_member {
                        let salt = self.salt.salt_for(key, pool)?;
                        let masked = self.transform.apply(value, &salt);
                        *value = masked;
                    }
                }
            }
        }
        Ok(())
    }

    /// Transforms one selected value, fanning out over array elements
    /// when configured. With per-element masking off, an array passes
    /// whole into the transform (the whole-value fallback).
    fn mask_value(&self, value: &Value, salt: &str) -> Value {
        match value {
            Value::Array(items) if self.mask_array_elements => Value::Array(
                items
                    .iter()
                    .map(|item| self.transform.apply(item, salt))
                    .collect(),
            ),
            other => self.transform.apply(other, salt),
        }
    }
}

/// Follows the heading segments of a key chain through nested mappings.
/// Any absent or non-mapping segment makes the chain a no-op.
fn chain_container_mut<'a>(record: &'a mut Record, heading: &[String]) -> Option<&'a mut Record> {
    let mut current = record;
    for segment in heading {
        match current.get_mut(segment) {
            Some(Value::Object(next)) => current = next,
            _ => return None,
        }
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    // Tests may panic on bad fixtures
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::transform::DigestAlgorithm;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().expect("object literal")
    }

    fn pool() -> SaltPool {
        SaltPool::new(vec!["s1".to_string(), "s2".to_string()])
    }

    fn digest_masker(selector: Selector, mask_array_elements: bool) -> Masker {
        Masker::new(
            selector,
            Transform::Digest(DigestAlgorithm::Sha256),
            SaltSource::Fixed("salt".to_string()),
            mask_array_elements,
        )
    }

    fn expected_digest(text: &str) -> Value {
        json!(DigestAlgorithm::Sha256.hex_digest("salt", text))
    }

    #[test]
    fn test_exact_key_masks_present_field() {
        let masker = digest_masker(Selector::Key("user_id".to_string()), false);
        let mut rec = record(json!({"user_id": "1234", "other": "x"}));
        masker.apply(&mut rec, &pool()).expect("apply");
        assert_eq!(rec["user_id"], expected_digest("1234"));
        assert_eq!(rec["other"], json!("x"));
    }

    #[test]
    fn test_exact_key_absent_is_noop() {
        let masker = digest_masker(Selector::Key("missing".to_string()), false);
        let mut rec = record(json!({"user_id": "1234"}));
        masker.apply(&mut rec, &pool()).expect("apply");
        assert_eq!(rec, record(json!({"user_id": "1234"})));
    }

    #[test]
    fn test_array_elements_masked_individually() {
        let masker = digest_masker(Selector::Key("ids".to_string()), true);
        let mut rec = record(json!({"ids": ["a", "b"]}));
        masker.apply(&mut rec, &pool()).expect("apply");
        assert_eq!(
            rec["ids"],
            json!([
                DigestAlgorithm::Sha256.hex_digest("salt", "a"),
                DigestAlgorithm::Sha256.hex_digest("salt", "b"),
            ])
        );
    }

    #[test]
    fn test_array_whole_value_fallback() {
        let masker = digest_masker(Selector::Key("ids".to_string()), false);
        let mut rec = record(json!({"ids": ["a", "b"]}));
        masker.apply(&mut rec, &pool()).expect("apply");
        assert_eq!(rec["ids"], expected_digest(r#"["a","b"]"#));
    }

    #[test]
    fn test_key_chain_masks_only_the_leaf() {
        let masker = digest_masker(
            Selector::KeyChain {
                heading: vec!["user".to_string(), "profile".to_string()],
                leaf: "email".to_string(),
            },
            false,
        );
        let mut rec = record(json!({
            "user": {"profile": {"email": "a@example.com", "name": "a"}, "id": 1},
            "email": "top@example.com"
        }));
        masker.apply(&mut rec, &pool()).expect("apply");
        assert_eq!(
            rec["user"]["profile"]["email"],
            expected_digest("a@example.com")
        );
        assert_eq!(rec["user"]["profile"]["name"], json!("a"));
        assert_eq!(rec["user"]["id"], json!(1));
        assert_eq!(rec["email"], json!("top@example.com"));
    }

    #[test]
    fn test_key_chain_absent_segment_is_noop() {
        let masker = digest_masker(
            Selector::KeyChain {
                heading: vec!["user".to_string(), "profile".to_string()],
                leaf: "email".to_string(),
            },
            false,
        );
        let original = record(json!({"user": {"id": 1}}));
        let mut rec = original.clone();
        masker.apply(&mut rec, &pool()).expect("apply");
        assert_eq!(rec, original);
    }

    #[test]
    fn test_key_chain_non_mapping_segment_is_noop() {
        let masker = digest_masker(
            Selector::KeyChain {
                heading: vec!["user".to_string()],
                leaf: "email".to_string(),
            },
            false,
        );
        let original = record(json!({"user": "flat string"}));
        let mut rec = original.clone();
        masker.apply(&mut rec, &pool()).expect("apply");
        assert_eq!(rec, original);
    }

    #[test]
    fn test_key_pattern_matches_top_level_names_only() {
        let pattern = Regex::new(r"^(source|src)_?ip").expect("valid regex");
        let masker = digest_masker(Selector::KeyPattern(pattern), false);
        let mut rec = record(json!({
            "source_ip": "10.0.0.1",
            "src_ip_addr": "10.0.0.2",
            "dest_ip": "10.0.0.3",
            "nested": {"source_ip": "10.0.0.4"}
        }));
        masker.apply(&mut rec, &pool()).expect("apply");
        assert_eq!(rec["source_ip"], expected_digest("10.0.0.1"));
        assert_eq!(rec["src_ip_addr"], expected_digest("10.0.0.2"));
        assert_eq!(rec["dest_ip"], json!("10.0.0.3"));
        // Nested field names are out of a key pattern's reach.
        assert_eq!(rec["nested"]["source_ip"], json!("10.0.0.4"));
    }

    #[test]
    fn test_value_pattern_matches_coerced_values() {
        let pattern = Regex::new(r"@example\.com$").expect("valid regex");
        let masker = digest_masker(Selector::ValuePattern(pattern), false);
        let mut rec = record(json!({
            "email": "a@example.com",
            "other": "a@elsewhere.org",
            "nested": {"email": "b@example.com"}
        }));
        masker.apply(&mut rec, &pool()).expect("apply");
        assert_eq!(rec["email"], expected_digest("a@example.com"));
        assert_eq!(rec["other"], json!("a@elsewhere.org"));
        assert_eq!(rec["nested"]["email"], json!("b@example.com"));
    }

    #[test]
    fn test_value_pattern_sees_numbers_through_coercion() {
        let pattern = Regex::new(r"^\d{4}$").expect("valid regex");
        let masker = digest_masker(Selector::ValuePattern(pattern), false);
        let mut rec = record(json!({"pin": 1234, "year_note": "in 1234 AD"}));
        masker.apply(&mut rec, &pool()).expect("apply");
        assert_eq!(rec["pin"], expected_digest("1234"));
        assert_eq!(rec["year_note"], json!("in 1234 AD"));
    }

    #[test]
    fn test_value_in_subnet_masks_member_addresses() {
        let subnet = Subnet::parse("192.168.0.0/16").expect("valid cidr");
        let masker = digest_masker(Selector::ValueInSubnet(subnet), false);
        let mut rec = record(json!({
            "client": "192.168.1.9",
            "upstream": "8.8.8.8",
            "host": "not-an-ip",
            "port": 443
        }));
        masker.apply(&mut rec, &pool()).expect("apply");
        assert_eq!(rec["client"], expected_digest("192.168.1.9"));
        assert_eq!(rec["upstream"], json!("8.8.8.8"));
        assert_eq!(rec["host"], json!("not-an-ip"));
        assert_eq!(rec["port"], json!(443));
    }

    #[test]
    fn test_resolved_salt_varies_by_key() {
        let masker = Masker::new(
            Selector::KeyPattern(Regex::new("^k").expect("valid regex")),
            Transform::Digest(DigestAlgorithm::Sha256),
            SaltSource::Resolve,
            false,
        );
        let salts = pool();
        let mut rec = record(json!({"ka": "v", "kb": "v"}));
        masker.apply(&mut rec, &salts).expect("apply");
        // 'k'+'a' = 204 -> s1; 'k'+'b' = 205 -> s2.
        let expected_ka = DigestAlgorithm::Sha256.hex_digest("s1", "v");
        let expected_kb = DigestAlgorithm::Sha256.hex_digest("s2", "v");
        assert_eq!(rec["ka"], json!(expected_ka));
        assert_eq!(rec["kb"], json!(expected_kb));
    }
}
