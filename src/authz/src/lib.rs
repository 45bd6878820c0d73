//! # RPAC Authorization Resolver
//!
//! Role and relationship based permission resolution.
//!
//! ## Features
//!
//! - **Static and dynamic permissions**: roles declared per action in code are
//!   merged with records from a refreshable permission store
//! - **Relationship roles**: a subject gains a role such as `owner` or `author`
//!   when it relates to the target entity
//! - **Wildcard role** (`*`) granting an action to anyone, anonymous included
//! - **Soft-delete guards** on `delete`, `restore` and `forceDelete`
//! - **Per-request role memoization** through an explicit context
//! - **Role gate** for coarse route-level filtering
//!
//! ## Example
//!
//! ```rust
//! use rpac_authz::{
//!     ActionTable, AuthorizationContext, CachedPermissionStore, EntityRegistry, EntityType,
//!     PermissionRecord, PermissionResolver, Principal, Record, StaticRoleProvider, TablePolicy,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = TablePolicy::new("Post", ActionTable::standard().allow("update", ["editor"]));
//! let store = CachedPermissionStore::new(vec![PermissionRecord::grant("Post", "update", "owner")]);
//! let entities = EntityRegistry::new()
//!     .with_type("Post", EntityType::new("Post").with_relationship("owner"));
//! let roles = StaticRoleProvider::new();
//!
//! let post = Record::new("Post", "42");
//! roles.relate("user:alice", &post, "owner");
//!
//! let resolver = PermissionResolver::builder(Arc::new(policy))
//!     .store(Arc::new(store))
//!     .roles(Arc::new(roles))
//!     .entities(Arc::new(entities))
//!     .build()?;
//!
//! let alice = Principal::new("user:alice");
//! let ctx = AuthorizationContext::for_subject(&alice);
//! assert!(resolver.update(&ctx, &post));
//! # Ok(())
//! # }
//! ```

pub mod collaborators;
pub mod config;
pub mod context;
pub mod decision;
pub mod error;
pub mod gate;
pub mod metrics;
pub mod policy;
pub mod resolver;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use collaborators::{EntityDescriptor, EntityRegistry, EntityType, RoleProvider, StaticRoleProvider};
pub use config::ResolverConfig;
pub use context::AuthorizationContext;
pub use decision::{Decision, DecisionReason, StructuralDenial};
pub use error::{AuthzError, Result};
pub use gate::RoleGate;
pub use metrics::{MetricsSnapshot, ResolverMetrics};
pub use policy::{
    derive_namespace, ActionKind, ActionSpec, ActionTable, PolicyUnit, StandardAction, TablePolicy,
};
pub use resolver::{PermissionResolver, PermissionResolverBuilder};
pub use store::{
    CachedPermissionStore, InMemoryPermissionSource, JsonFilePermissionSource, PermissionSnapshot,
    PermissionSource, PermissionStore,
};
pub use types::{
    role_set, Entity, PermissionRecord, Principal, Record, RoleSet, Signature, Subject,
    GUEST_ROLE, WILDCARD_ROLE,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
