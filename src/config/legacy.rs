//! Deprecated flat configuration parameters.
//!
//! Early configurations named their targets through flat parameters
//! (`sha1_keys = "user_id, remote.addr"`) instead of rule blocks. The
//! adapter below expands them into ordinary [`MaskRule`]s so only one
//! compilation path exists.

use serde::Deserialize;

use super::{MaskMethod, MaskRule};

/// Deprecated flat masking parameters.
///
/// Each `*_keys` parameter is a comma-separated key list; entries
/// containing `.` are treated as key chains. Expanded rules always mask
/// array elements individually and carry `hash_salt` (or the empty
/// string) as their salt override, so they never resolve from the pool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LegacyMaskParams {
    /// Keys to mask with the 128-bit digest.
    #[serde(default)]
    pub md5_keys: Option<String>,
    /// Keys to mask with the 160-bit digest.
    #[serde(default)]
    pub sha1_keys: Option<String>,
    /// Keys to mask with the 256-bit digest.
    #[serde(default)]
    pub sha256_keys: Option<String>,
    /// Keys to mask with the 384-bit digest.
    #[serde(default)]
    pub sha384_keys: Option<String>,
    /// Keys to mask with the 512-bit digest.
    #[serde(default)]
    pub sha512_keys: Option<String>,
    /// Salt override for all expanded rules.
    #[serde(default)]
    pub hash_salt: Option<String>,
    /// Keys holding IP addresses to truncate.
    #[serde(default)]
    pub ipaddr_mask_keys: Option<String>,
    /// IPv4 prefix length for `ipaddr_mask_keys`.
    #[serde(default = "default_ipv4_mask_subnet")]
    pub ipv4_mask_subnet: u8,
    /// IPv6 prefix length for `ipaddr_mask_keys`.
    #[serde(default = "default_ipv6_mask_subnet")]
    pub ipv6_mask_subnet: u8,
}

const fn default_ipv4_mask_subnet() -> u8 {
    24
}

const fn default_ipv6_mask_subnet() -> u8 {
    104
}

impl Default for LegacyMaskParams {
    fn default() -> Self {
        Self {
            md5_keys: None,
            sha1_keys: None,
            sha256_keys: None,
            sha384_keys: None,
            sha512_keys: None,
            hash_salt: None,
            ipaddr_mask_keys: None,
            ipv4_mask_subnet: default_ipv4_mask_subnet(),
            ipv6_mask_subnet: default_ipv6_mask_subnet(),
        }
    }
}

impl LegacyMaskParams {
    /// Whether any deprecated key parameter is present.
    #[must_use]
    pub const fn has_rules(&self) -> bool {
        self.md5_keys.is_some()
            || self.sha1_keys.is_some()
            || self.sha256_keys.is_some()
            || self.sha384_keys.is_some()
            || self.sha512_keys.is_some()
            || self.ipaddr_mask_keys.is_some()
    }

    /// Expands the flat parameters into rule blocks, one rule per listed
    /// key so that masker order follows list order exactly.
    #[must_use]
    pub fn expand(&self) -> Vec<MaskRule> {
        let salt = self.hash_salt.clone().unwrap_or_default();
        let mut rules = Vec::new();

        let digest_params = [
            (&self.md5_keys, MaskMethod::Digest128),
            (&self.sha1_keys, MaskMethod::Digest160),
            (&self.sha256_keys, MaskMethod::Digest256),
            (&self.sha384_keys, MaskMethod::Digest384),
            (&self.sha512_keys, MaskMethod::Digest512),
        ];
        for (param, method) in digest_params {
            let Some(list) = param else { continue };
            for key in split_key_list(list) {
                rules.push(rule_for_key(method, key, &salt));
            }
        }

        if let Some(list) = &self.ipaddr_mask_keys {
            for key in split_key_list(list) {
                let rule = rule_for_key(MaskMethod::Network, key, &salt)
                    .with_ipv4_mask_bits(self.ipv4_mask_subnet)
                    .with_ipv6_mask_bits(self.ipv6_mask_subnet);
                rules.push(rule);
            }
        }

        rules
    }
}

fn split_key_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|key| !key.is_empty())
}

fn rule_for_key(method: MaskMethod, key: &str, salt: &str) -> MaskRule {
    let rule = MaskRule::new(method)
        .with_salt(salt)
        .with_mask_array_elements(true);
    if key.contains('.') {
        rule.with_key_chain(key)
    } else {
        rule.with_key(key)
    }
}

#[cfg(test)]
mod tests {
    // Tests may panic on bad fixtures
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn test_empty_params_expand_to_nothing() {
        let params = LegacyMaskParams::default();
        assert!(!params.has_rules());
        assert!(params.expand().is_empty());
    }

    #[test]
    fn test_digest_keys_expand_in_list_order() {
        let params = LegacyMaskParams {
            sha1_keys: Some("user_id, remote.addr ,host".to_string()),
            hash_salt: Some("pepper".to_string()),
            ..Default::default()
        };
        let rules = params.expand();
        assert_eq!(rules.len(), 3);

        assert_eq!(rules[0].method, MaskMethod::Digest160);
        assert_eq!(rules[0].keys, vec!["user_id"]);
        assert_eq!(rules[0].salt.as_deref(), Some("pepper"));
        assert!(rules[0].mask_array_elements);

        // Dotted entries become key chains, keeping their place in line.
        assert!(rules[1].keys.is_empty());
        assert_eq!(rules[1].key_chains, vec!["remote.addr"]);

        assert_eq!(rules[2].keys, vec!["host"]);
    }

    #[test]
    fn test_missing_hash_salt_becomes_empty_override() {
        let params = LegacyMaskParams {
            md5_keys: Some("id".to_string()),
            ..Default::default()
        };
        let rules = params.expand();
        assert_eq!(rules[0].salt.as_deref(), Some(""));
    }

    #[test]
    fn test_ipaddr_keys_carry_subnet_defaults() {
        let params = LegacyMaskParams {
            ipaddr_mask_keys: Some("source_ip, dest_ip".to_string()),
            ..Default::default()
        };
        let rules = params.expand();
        assert_eq!(rules.len(), 2);
        for rule in &rules {
            assert_eq!(rule.method, MaskMethod::Network);
            assert_eq!(rule.ipv4_mask_bits, Some(24));
            assert_eq!(rule.ipv6_mask_bits, Some(104));
            assert!(rule.mask_array_elements);
        }
    }

    #[test]
    fn test_custom_subnet_widths() {
        let params = LegacyMaskParams {
            ipaddr_mask_keys: Some("addr".to_string()),
            ipv4_mask_subnet: 16,
            ipv6_mask_subnet: 64,
            ..Default::default()
        };
        let rules = params.expand();
        assert_eq!(rules[0].ipv4_mask_bits, Some(16));
        assert_eq!(rules[0].ipv6_mask_bits, Some(64));
    }

    #[test]
    fn test_deserializes_from_flat_json() {
        let params: LegacyMaskParams = serde_json::from_str(
            r#"{"sha256_keys": "a,b", "hash_salt": "s", "ipv4_mask_subnet": 8}"#,
        )
        .expect("valid params");
        assert_eq!(params.sha256_keys.as_deref(), Some("a,b"));
        assert_eq!(params.ipv4_mask_subnet, 8);
        assert_eq!(params.ipv6_mask_subnet, 104);
    }
}
