//! Core authorization types

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Role granted to anyone, including anonymous subjects
pub const WILDCARD_ROLE: &str = "*";

/// Static role of an absent subject
pub const GUEST_ROLE: &str = "guest";

/// Separator between namespace and action in a signature
pub const SIGNATURE_SEPARATOR: char = ':';

/// Set of role names. Ordered so decisions and logs are deterministic.
pub type RoleSet = BTreeSet<String>;

/// Build a role set from anything yielding string-like items
pub fn role_set<I, S>(roles: I) -> RoleSet
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    roles.into_iter().map(Into::into).collect()
}

/// Identity making a request
pub trait Subject: Send + Sync {
    /// Stable identity, used to key the per-request role cache
    fn subject_id(&self) -> &str;
}

/// Typed resource instance targeted by an action
pub trait Entity: Send + Sync {
    /// Type name, resolved to a namespace by an `EntityDescriptor`
    fn entity_type(&self) -> &str;

    /// Instance identifier
    fn entity_id(&self) -> &str;

    /// Instance-level soft-deleted flag
    fn is_soft_deleted(&self) -> bool {
        false
    }
}

/// Principal (user, service account, agent)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Principal identifier (e.g., "user:alice@example.com")
    pub id: String,

    /// Additional attributes carried for callers; never consulted by the resolver
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl Principal {
    /// Create a new principal
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: HashMap::new(),
        }
    }

    /// Add an attribute to the principal
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

impl Subject for Principal {
    fn subject_id(&self) -> &str {
        &self.id
    }
}

/// Entity instance value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Entity type name (e.g., "Post")
    #[serde(rename = "type")]
    pub entity_type: String,

    /// Instance identifier
    pub id: String,

    /// Whether the instance is currently soft-deleted
    #[serde(default)]
    pub deleted: bool,

    /// Additional attributes carried for callers
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl Record {
    /// Create a live record
    pub fn new(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
            deleted: false,
            attributes: HashMap::new(),
        }
    }

    /// Mark the record as soft-deleted
    pub fn soft_deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    /// Add an attribute to the record
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

impl Entity for Record {
    fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn entity_id(&self) -> &str {
        &self.id
    }

    fn is_soft_deleted(&self) -> bool {
        self.deleted
    }
}

/// Dynamic permission lookup key: `namespace:action`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    /// Join a namespace and an action
    pub fn new(namespace: &str, action: &str) -> Self {
        Self(format!("{namespace}{SIGNATURE_SEPARATOR}{action}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into `(namespace, action)` at the last separator.
    ///
    /// The resolver rejects namespaces and action names containing the
    /// separator, so signatures it builds split back into their parts.
    pub fn parts(&self) -> Option<(&str, &str)> {
        self.0.rsplit_once(SIGNATURE_SEPARATOR)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Signature {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One dynamically stored grant: `role` may perform the action behind `signature`
///
/// Records are not unique per signature; each contributes one role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub signature: Signature,
    pub role: String,
}

impl PermissionRecord {
    pub fn new(signature: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            signature: Signature::from(signature.into()),
            role: role.into(),
        }
    }

    /// Record granting `role` the `action` in `namespace`
    pub fn grant(namespace: &str, action: &str, role: impl Into<String>) -> Self {
        Self {
            signature: Signature::new(namespace, action),
            role: role.into(),
        }
    }
}
