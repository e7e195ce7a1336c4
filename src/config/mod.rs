//! Masking rule configuration.
//!
//! These are the already-parsed structures the compiler consumes. They
//! derive `Deserialize`, so hosts can hand them over as JSON or TOML
//! text as well as build them programmatically through the `with_*`
//! builders.

mod legacy;

pub use legacy::LegacyMaskParams;

use serde::Deserialize;

use crate::{Error, Result};

/// Masking method selector for a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum MaskMethod {
    /// 128-bit digest (MD5).
    #[serde(rename = "digest-128", alias = "md5")]
    Digest128,
    /// 160-bit digest (SHA-1).
    #[serde(rename = "digest-160", alias = "sha1")]
    Digest160,
    /// 256-bit digest (SHA-256).
    #[serde(rename = "digest-256", alias = "sha256")]
    Digest256,
    /// 384-bit digest (SHA-384).
    #[serde(rename = "digest-384", alias = "sha384")]
    Digest384,
    /// 512-bit digest (SHA-512).
    #[serde(rename = "digest-512", alias = "sha512")]
    Digest512,
    /// Replace an absolute URL's path and strip user info, query and
    /// fragment.
    #[serde(rename = "url-path", alias = "uri_path")]
    UrlPath,
    /// Truncate IP addresses to a configured subnet prefix.
    #[serde(rename = "network")]
    Network,
}

impl MaskMethod {
    /// Parses a method name, accepting the legacy aliases.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "digest-128" | "md5" => Some(Self::Digest128),
            "digest-160" | "sha1" => Some(Self::Digest160),
            "digest-256" | "sha256" => Some(Self::Digest256),
            "digest-384" | "sha384" => Some(Self::Digest384),
            "digest-512" | "sha512" => Some(Self::Digest512),
            "url-path" | "uri_path" => Some(Self::UrlPath),
            "network" => Some(Self::Network),
            _ => None,
        }
    }

    /// Canonical method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Digest128 => "digest-128",
            Self::Digest160 => "digest-160",
            Self::Digest256 => "digest-256",
            Self::Digest384 => "digest-384",
            Self::Digest512 => "digest-512",
            Self::UrlPath => "url-path",
            Self::Network => "network",
        }
    }
}

impl std::fmt::Display for MaskMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declarative masking rule: a method applied through one or more
/// selectors.
///
/// A rule compiles into one masker per non-empty selector kind, and one
/// per entry for `keys` and `key_chains`.
#[derive(Debug, Clone, Deserialize)]
pub struct MaskRule {
    /// Transform method.
    pub method: MaskMethod,
    /// Rule-level salt override. When set, every masker of this rule
    /// uses it instead of pool-based resolution.
    #[serde(default)]
    pub salt: Option<String>,
    /// Single exact top-level key.
    #[serde(default)]
    pub key: Option<String>,
    /// Exact top-level keys.
    #[serde(default)]
    pub keys: Vec<String>,
    /// Single dotted path into nested mappings.
    #[serde(default)]
    pub key_chain: Option<String>,
    /// Dotted paths into nested mappings.
    #[serde(default)]
    pub key_chains: Vec<String>,
    /// Regex matched against every top-level field name.
    #[serde(default)]
    pub key_pattern: Option<String>,
    /// Regex matched against the string form of every top-level value.
    #[serde(default)]
    pub value_pattern: Option<String>,
    /// CIDR network matched against every top-level value parsing as an
    /// IP address.
    #[serde(default)]
    pub value_in_subnet: Option<String>,
    /// Transform array elements individually instead of the whole value.
    #[serde(default)]
    pub mask_array_elements: bool,
    /// IPv4 prefix length for the `network` method.
    #[serde(default)]
    pub ipv4_mask_bits: Option<u8>,
    /// IPv6 prefix length for the `network` method.
    #[serde(default)]
    pub ipv6_mask_bits: Option<u8>,
}

impl MaskRule {
    /// Creates an empty rule for `method`; add selectors with the
    /// builder methods.
    #[must_use]
    pub const fn new(method: MaskMethod) -> Self {
        Self {
            method,
            salt: None,
            key: None,
            keys: Vec::new(),
            key_chain: None,
            key_chains: Vec::new(),
            key_pattern: None,
            value_pattern: None,
            value_in_subnet: None,
            mask_array_elements: false,
            ipv4_mask_bits: None,
            ipv6_mask_bits: None,
        }
    }

    /// Sets the rule-level salt override.
    #[must_use]
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    /// Adds an exact top-level key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.keys.push(key.into());
        self
    }

    /// Adds exact top-level keys.
    #[must_use]
    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Adds a dotted key chain.
    #[must_use]
    pub fn with_key_chain(mut self, chain: impl Into<String>) -> Self {
        self.key_chains.push(chain.into());
        self
    }

    /// Adds dotted key chains.
    #[must_use]
    pub fn with_key_chains<I, S>(mut self, chains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_chains.extend(chains.into_iter().map(Into::into));
        self
    }

    /// Sets the key-name pattern.
    #[must_use]
    pub fn with_key_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.key_pattern = Some(pattern.into());
        self
    }

    /// Sets the value-content pattern.
    #[must_use]
    pub fn with_value_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.value_pattern = Some(pattern.into());
        self
    }

    /// Sets the value-subnet selector.
    #[must_use]
    pub fn with_value_in_subnet(mut self, subnet: impl Into<String>) -> Self {
        self.value_in_subnet = Some(subnet.into());
        self
    }

    /// Sets whether array values are transformed per element.
    #[must_use]
    pub const fn with_mask_array_elements(mut self, enabled: bool) -> Self {
        self.mask_array_elements = enabled;
        self
    }

    /// Sets the IPv4 prefix length for the `network` method.
    #[must_use]
    pub const fn with_ipv4_mask_bits(mut self, bits: u8) -> Self {
        self.ipv4_mask_bits = Some(bits);
        self
    }

    /// Sets the IPv6 prefix length for the `network` method.
    #[must_use]
    pub const fn with_ipv6_mask_bits(mut self, bits: u8) -> Self {
        self.ipv6_mask_bits = Some(bits);
        self
    }
}

/// Top-level engine configuration: the salt pool plus rule blocks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MaskingConfig {
    /// A single salt, placed first in the pool.
    #[serde(default)]
    pub salt: Option<String>,
    /// Further salts, appended to the pool in declared order.
    #[serde(default)]
    pub salts: Vec<String>,
    /// Masking rule blocks, applied in declared order.
    #[serde(default)]
    pub masks: Vec<MaskRule>,
    /// Deprecated flat parameters, expanded into ordinary rules at
    /// compile time.
    #[serde(flatten)]
    pub legacy: LegacyMaskParams,
}

impl MaskingConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the single leading salt.
    #[must_use]
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    /// Appends salts to the pool.
    #[must_use]
    pub fn with_salts<I, S>(mut self, salts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.salts.extend(salts.into_iter().map(Into::into));
        self
    }

    /// Appends a rule block.
    #[must_use]
    pub fn with_mask(mut self, rule: MaskRule) -> Self {
        self.masks.push(rule);
        self
    }

    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid JSON for this shape.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::OperationFailed {
            operation: "parse_masking_config".to_string(),
            cause: e.to_string(),
        })
    }

    /// Loads a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: e.to_string(),
        })?;

        toml::from_str(&contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })
    }

    /// The salt pool declared by this configuration: `salt` first, then
    /// `salts`, in order. Legacy widening happens during compilation.
    #[must_use]
    pub fn salt_list(&self) -> Vec<String> {
        self.salt
            .iter()
            .chain(self.salts.iter())
            .cloned()
            .collect()
    }
}
