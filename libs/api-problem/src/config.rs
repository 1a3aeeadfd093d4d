//! XML rendering options (`XmlOptions`, `KeyPolicy`)

use serde::{Deserialize, Serialize};

/// What to do with an extension key that is not a legal XML element name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPolicy {
    /// Fail rendering with [`ProblemError::InvalidExtensionKey`](crate::ProblemError::InvalidExtensionKey)
    #[default]
    Reject,
    /// Replace illegal characters with `_` (prefixing `_` when the first character cannot start a name)
    Sanitize,
}

/// XML rendering options.
///
/// Deserializable so a host application can keep it in its own configuration tree:
///
/// ```yaml
/// problem_xml:
///   complex_properties: true
///   pretty: false
///   key_policy: sanitize
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct XmlOptions {
    /// Render object and list extensions as nested elements (default: true).
    /// When off, only scalar extensions are written.
    pub complex_properties: bool,
    /// Indent output with two spaces (default: false)
    pub pretty: bool,
    /// Handling of keys that are not valid element names (default: reject)
    pub key_policy: KeyPolicy,
}

impl Default for XmlOptions {
    fn default() -> Self {
        Self {
            complex_properties: true,
            pretty: false,
            key_policy: KeyPolicy::Reject,
        }
    }
}

impl XmlOptions {
    /// Options that write scalar extensions only.
    #[must_use]
    pub fn flat() -> Self {
        Self {
            complex_properties: false,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    #[must_use]
    pub fn with_key_policy(mut self, key_policy: KeyPolicy) -> Self {
        self.key_policy = key_policy;
        self
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_render_complex_and_reject_bad_keys() {
        let opts = XmlOptions::default();
        assert!(opts.complex_properties);
        assert!(!opts.pretty);
        assert_eq!(opts.key_policy, KeyPolicy::Reject);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let opts: XmlOptions =
            serde_json::from_value(json!({"pretty": true, "key_policy": "sanitize"})).unwrap();
        assert_eq!(
            opts,
            XmlOptions::default()
                .with_pretty(true)
                .with_key_policy(KeyPolicy::Sanitize)
        );
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        let result = serde_json::from_value::<XmlOptions>(json!({"indent": 4}));
        assert!(result.is_err());
    }

    #[test]
    fn flat_disables_complex_properties() {
        assert!(!XmlOptions::flat().complex_properties);
    }
}
