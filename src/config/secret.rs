//! Credential handling using the secrecy crate
//!
//! LeanCloud application/master keys and the Deta project key are held as
//! [`SecretString`]. The wrapped value is zeroed on drop, redacted in `Debug`
//! output, and only reachable through `expose_secret()`.
//!
//! # Example
//!
//! ```rust
//! use dittorm::config::{secret_string, SecretString};
//! use secrecy::ExposeSecret;
//!
//! let key: SecretString = secret_string("a0abcyxz_secret".to_string());
//! assert_eq!(key.expose_secret().as_str(), "a0abcyxz_secret");
//! assert!(!format!("{key:?}").contains("a0abcyxz_secret"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// Newtype wrapper for String that implements the required traits for Secret
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl From<&str> for SecretValue {
    fn from(s: &str) -> Self {
        SecretValue(s.to_string())
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl SecretValue {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// A string credential that is zeroed on drop and redacted in `Debug`
pub type SecretString = Secret<SecretValue>;

/// Wrap a plain string as a [`SecretString`]
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_secret_string_creation() {
        let secret = secret_string("app-key".to_string());
        assert_eq!(secret.expose_secret(), "app-key");
        assert!(!secret.expose_secret().is_empty());
    }

    #[test]
    fn test_secret_debug_redacted() {
        let secret = secret_string("master-key".to_string());
        let debug_output = format!("{secret:?}");
        assert!(!debug_output.contains("master-key"));
    }

    #[test]
    fn test_secret_deserializes_from_toml() {
        #[derive(Deserialize)]
        struct Section {
            project_key: SecretString,
        }

        let section: Section = toml::from_str(r#"project_key = "a0_b1""#).unwrap();
        assert_eq!(section.project_key.expose_secret().as_str(), "a0_b1");
    }
}
