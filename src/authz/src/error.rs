//! Error types for the permission resolver

use thiserror::Error;

/// Permission resolver errors
///
/// Every variant collapses to a deny at the `authorize`/`check` boundary.
/// Callers that opt into propagation (`try_authorize`, `try_check`, `evaluate`)
/// see them directly.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// A model action was invoked without a target entity
    #[error("Action '{action}' requires an entity but none was supplied")]
    MissingEntity { action: String },

    /// No namespace could be resolved for a policy or entity type
    #[error("Unresolved namespace: {0}")]
    UnresolvedNamespace(String),

    /// Action name that cannot form a signature
    #[error("Invalid action name: '{0}'")]
    InvalidAction(String),

    /// Invalid resolver configuration or action table
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A collaborator could not produce a result
    #[error("Lookup failed in {collaborator}: {message}")]
    LookupFailure {
        collaborator: &'static str,
        message: String,
    },

    /// The permission store has no snapshot loaded
    #[error("Permission snapshot unavailable")]
    SnapshotUnavailable,

    /// Role gate rejected the subject
    #[error("Access denied")]
    AccessDenied,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML decoding error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl AuthzError {
    /// Build a lookup failure for the named collaborator
    pub fn lookup(collaborator: &'static str, message: impl ToString) -> Self {
        Self::LookupFailure {
            collaborator,
            message: message.to_string(),
        }
    }

    /// Caller or policy wiring is wrong; never caused by runtime data
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::MissingEntity { .. }
                | Self::UnresolvedNamespace(_)
                | Self::InvalidAction(_)
                | Self::InvalidConfig(_)
        )
    }

    /// A collaborator failed to answer
    pub fn is_lookup_failure(&self) -> bool {
        matches!(self, Self::LookupFailure { .. } | Self::SnapshotUnavailable)
    }
}

/// Result type for resolver operations
pub type Result<T> = std::result::Result<T, AuthzError>;
