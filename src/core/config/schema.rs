//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Config values are validated after parsing: naming defaults must be
//! non-empty, since an empty default name can never be returned in token
//! mode and an empty attribute key never matches.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::naming::NamingPolicy;

/// Configuration file contents.
///
/// # Example
///
/// ```toml
/// [naming]
/// default_name = "unknown"
/// stash_attribute = "STASH"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Name resolution defaults
    pub naming: Option<NamingConfig>,
}

impl ConfigFile {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(naming) = &self.naming {
            naming.validate()?;
        }
        Ok(())
    }
}

/// Name resolution settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct NamingConfig {
    /// Name returned when no candidate is usable (default: "unknown")
    pub default_name: Option<String>,

    /// Attribute key consulted as the cube naming fallback (default: "STASH")
    pub stash_attribute: Option<String>,
}

impl NamingConfig {
    /// Validate the naming settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = &self.default_name {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "naming.default_name cannot be empty".to_string(),
                ));
            }
        }

        if let Some(key) = &self.stash_attribute {
            if key.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "naming.stash_attribute cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Apply these settings over the built-in policy.
    pub fn policy(&self) -> NamingPolicy {
        let defaults = NamingPolicy::default();
        NamingPolicy {
            default_name: self.default_name.clone().unwrap_or(defaults.default_name),
            stash_attribute: self
                .stash_attribute
                .clone()
                .unwrap_or(defaults.stash_attribute),
        }
    }
}
