//! Resolver configuration loading and validation

use crate::error::{AuthzError, Result};
use crate::types::{GUEST_ROLE, SIGNATURE_SEPARATOR, WILDCARD_ROLE};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Resolver configuration
///
/// ```toml
/// guest_role = "guest"
/// wildcard_role = "*"
/// enable_metrics = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Static role of an absent subject
    #[serde(default = "default_guest_role")]
    pub guest_role: String,

    /// Role granting an action to anyone
    #[serde(default = "default_wildcard_role")]
    pub wildcard_role: String,

    /// Attach a metrics collector to the resolver
    #[serde(default = "default_true")]
    pub enable_metrics: bool,
}

fn default_guest_role() -> String { GUEST_ROLE.to_string() }
fn default_wildcard_role() -> String { WILDCARD_ROLE.to_string() }
fn default_true() -> bool { true }

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            guest_role: default_guest_role(),
            wildcard_role: default_wildcard_role(),
            enable_metrics: true,
        }
    }
}

impl ResolverConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: ResolverConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for (field, role) in [
            ("guest_role", &self.guest_role),
            ("wildcard_role", &self.wildcard_role),
        ] {
            if role.is_empty() {
                return Err(AuthzError::InvalidConfig(format!("{} cannot be empty", field)));
            }
            if role.contains(SIGNATURE_SEPARATOR) {
                return Err(AuthzError::InvalidConfig(format!(
                    "{} cannot contain '{}'",
                    field, SIGNATURE_SEPARATOR
                )));
            }
        }

        if self.guest_role == self.wildcard_role {
            return Err(AuthzError::InvalidConfig(
                "guest_role and wildcard_role must differ".to_string(),
            ));
        }

        Ok(())
    }
}
