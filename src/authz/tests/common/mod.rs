//! Shared fixtures for integration tests

#![allow(dead_code)]

use rpac_authz::{
    ActionTable, AuthzError, CachedPermissionStore, Entity, EntityRegistry, EntityType,
    PermissionRecord, PermissionResolver, PermissionSnapshot, PermissionStore, Result,
    RoleProvider, RoleSet, StaticRoleProvider, Subject, TablePolicy,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Install a test subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `Post` (soft-deletable, owner/author/reviewer) and `Comment` (hard delete, author)
pub fn blog_entities() -> EntityRegistry {
    EntityRegistry::new()
        .with_type(
            "Post",
            EntityType::new("Post")
                .with_relationship("owner")
                .with_relationship("author")
                .with_relationship("reviewer")
                .with_soft_delete(),
        )
        .with_type(
            "Comment",
            EntityType::new("Comment").with_relationship("author"),
        )
}

/// Post policy granting `update` to editors in code
pub fn post_policy() -> TablePolicy {
    TablePolicy::new("Post", ActionTable::standard().allow("update", ["editor"]))
}

pub struct Fixture {
    pub store: Arc<CachedPermissionStore>,
    pub roles: Arc<StaticRoleProvider>,
    pub resolver: PermissionResolver,
}

/// Resolver over `post_policy`, `blog_entities` and the given records
pub fn fixture(records: Vec<PermissionRecord>) -> Fixture {
    fixture_with_policy(post_policy(), records)
}

pub fn fixture_with_policy(policy: TablePolicy, records: Vec<PermissionRecord>) -> Fixture {
    init_tracing();

    let store = Arc::new(CachedPermissionStore::new(records));
    let roles = Arc::new(StaticRoleProvider::new());
    let resolver = PermissionResolver::builder(Arc::new(policy))
        .store(store.clone())
        .roles(roles.clone())
        .entities(Arc::new(blog_entities()))
        .build()
        .expect("fixture resolver");

    Fixture {
        store,
        roles,
        resolver,
    }
}

/// Role provider that always fails
pub struct FailingRoleProvider;

impl RoleProvider for FailingRoleProvider {
    fn roles_of(&self, _subject: &dyn Subject) -> Result<RoleSet> {
        Err(AuthzError::lookup("role provider", "storage unavailable"))
    }

    fn related_to(
        &self,
        _subject: &dyn Subject,
        _entity: &dyn Entity,
        _relationship: &str,
    ) -> Result<bool> {
        Err(AuthzError::lookup("role provider", "storage unavailable"))
    }
}

/// Permission store that always fails
pub struct FailingStore;

impl PermissionStore for FailingStore {
    fn current(&self) -> Result<Arc<PermissionSnapshot>> {
        Err(AuthzError::lookup("permission store", "database offline"))
    }
}

/// Role provider wrapper counting static role lookups
pub struct CountingRoleProvider {
    inner: StaticRoleProvider,
    lookups: AtomicUsize,
}

impl CountingRoleProvider {
    pub fn new(inner: StaticRoleProvider) -> Self {
        Self {
            inner,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &StaticRoleProvider {
        &self.inner
    }
}

impl RoleProvider for CountingRoleProvider {
    fn roles_of(&self, subject: &dyn Subject) -> Result<RoleSet> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.roles_of(subject)
    }

    fn related_to(
        &self,
        subject: &dyn Subject,
        entity: &dyn Entity,
        relationship: &str,
    ) -> Result<bool> {
        self.inner.related_to(subject, entity, relationship)
    }
}
