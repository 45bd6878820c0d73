//! Permission resolver
//!
//! Decides whether the subject of an [`AuthorizationContext`] may perform an
//! action, optionally against a target entity.
//!
//! # Pipeline
//!
//! ```text
//! action, entity? ──► namespace ──► signature ──► static ∪ dynamic roles
//!                                                      │
//!                                   "*" present? ──────┼──► allow
//!                                                      ▼
//!              relationship roles ∪ static roles ──► intersect ──► allow / deny
//! ```
//!
//! The standard wrappers (`delete`, `restore`, `force_delete`) run soft-delete
//! guards before any of this; a guard denial cannot be overridden by any role.

use crate::collaborators::{EntityDescriptor, EntityRegistry, RoleProvider, StaticRoleProvider};
use crate::config::ResolverConfig;
use crate::context::AuthorizationContext;
use crate::decision::{Decision, StructuralDenial};
use crate::error::{AuthzError, Result};
use crate::metrics::{MetricsSnapshot, ResolverMetrics};
use crate::policy::{ActionKind, PolicyUnit, StandardAction};
use crate::store::{CachedPermissionStore, PermissionStore};
use crate::types::{Entity, RoleSet, Signature, Subject, SIGNATURE_SEPARATOR};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Resolves permissions for one policy unit
pub struct PermissionResolver {
    policy: Arc<dyn PolicyUnit>,
    namespace: String,
    store: Arc<dyn PermissionStore>,
    roles: Arc<dyn RoleProvider>,
    entities: Arc<dyn EntityDescriptor>,
    config: ResolverConfig,
    metrics: Option<Arc<ResolverMetrics>>,
}

impl PermissionResolver {
    pub fn builder(policy: Arc<dyn PolicyUnit>) -> PermissionResolverBuilder {
        PermissionResolverBuilder::new(policy)
    }

    /// Namespace of the bound policy unit
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn policy(&self) -> &dyn PolicyUnit {
        self.policy.as_ref()
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Get resolver metrics
    pub fn metrics(&self) -> Option<MetricsSnapshot> {
        self.metrics.as_ref().map(|metrics| metrics.snapshot())
    }

    /// Whether the context's subject may perform `action`. Never fails: every
    /// error is logged and becomes a deny.
    pub fn authorize(
        &self,
        ctx: &AuthorizationContext<'_>,
        action: &str,
        entity: Option<&dyn Entity>,
    ) -> bool {
        self.try_authorize(ctx, action, entity).unwrap_or(false)
    }

    /// Like [`authorize`](Self::authorize) but surfaces configuration and lookup errors
    pub fn try_authorize(
        &self,
        ctx: &AuthorizationContext<'_>,
        action: &str,
        entity: Option<&dyn Entity>,
    ) -> Result<bool> {
        self.evaluate(ctx, action, entity).map(|decision| decision.allowed)
    }

    /// Full decision with its reason
    pub fn evaluate(
        &self,
        ctx: &AuthorizationContext<'_>,
        action: &str,
        entity: Option<&dyn Entity>,
    ) -> Result<Decision> {
        let result = self
            .require_entity(action, entity)
            .and_then(|_| self.resolve(ctx, action, entity));
        self.finalize(action, result)
    }

    /// Decision for a standard action, soft-delete guards included
    pub fn evaluate_standard(
        &self,
        ctx: &AuthorizationContext<'_>,
        action: StandardAction,
        entity: Option<&dyn Entity>,
    ) -> Result<Decision> {
        let name = action.as_str();
        let result = self.require_entity(name, entity).and_then(|_| {
            if let Some(denial) = entity.and_then(|entity| self.guard(action, entity)) {
                debug!("Structural denial for {}: {}", name, denial);
                if let Some(metrics) = &self.metrics {
                    metrics.record_structural_denial();
                }
                return Ok(Decision::structural(denial));
            }
            self.resolve(ctx, name, entity)
        });
        self.finalize(name, result)
    }

    pub fn view_any(&self, ctx: &AuthorizationContext<'_>) -> bool {
        self.standard(ctx, StandardAction::ViewAny, None)
    }

    pub fn view(&self, ctx: &AuthorizationContext<'_>, entity: &dyn Entity) -> bool {
        self.standard(ctx, StandardAction::View, Some(entity))
    }

    pub fn create(&self, ctx: &AuthorizationContext<'_>) -> bool {
        self.standard(ctx, StandardAction::Create, None)
    }

    pub fn update(&self, ctx: &AuthorizationContext<'_>, entity: &dyn Entity) -> bool {
        self.standard(ctx, StandardAction::Update, Some(entity))
    }

    /// Denied outright when the record is already soft-deleted
    pub fn delete(&self, ctx: &AuthorizationContext<'_>, entity: &dyn Entity) -> bool {
        self.standard(ctx, StandardAction::Delete, Some(entity))
    }

    /// Denied outright unless the record is soft-deleted
    pub fn restore(&self, ctx: &AuthorizationContext<'_>, entity: &dyn Entity) -> bool {
        self.standard(ctx, StandardAction::Restore, Some(entity))
    }

    /// Denied outright when the type has no soft delete; plain `delete` is
    /// already permanent there
    pub fn force_delete(&self, ctx: &AuthorizationContext<'_>, entity: &dyn Entity) -> bool {
        self.standard(ctx, StandardAction::ForceDelete, Some(entity))
    }

    /// Roles allowed to perform `action`: static policy roles merged with the
    /// store's records for the signature
    pub fn allowed_roles(&self, action: &str, entity: Option<&dyn Entity>) -> Result<RoleSet> {
        if action.is_empty() || action.contains(SIGNATURE_SEPARATOR) {
            return Err(AuthzError::InvalidAction(action.to_string()));
        }
        let signature = Signature::new(&self.namespace_for(entity)?, action);
        let snapshot = self.store.current()?;

        let mut allowed = self.policy.permissions(action);
        allowed.extend(snapshot.roles_for(&signature).iter().cloned());

        debug!("Allowed roles for {}: {:?}", signature, allowed);
        Ok(allowed)
    }

    /// Roles the context's subject holds, relative to `entity` when given
    pub fn subject_roles(
        &self,
        ctx: &AuthorizationContext<'_>,
        entity: Option<&dyn Entity>,
    ) -> Result<RoleSet> {
        let mut roles = match (ctx.subject(), entity) {
            (Some(subject), Some(entity)) => self.relationship_roles(subject, entity)?,
            _ => RoleSet::new(),
        };
        roles.extend(self.static_roles(ctx)?);

        debug!("Subject roles: {:?}", roles);
        Ok(roles)
    }

    fn standard(
        &self,
        ctx: &AuthorizationContext<'_>,
        action: StandardAction,
        entity: Option<&dyn Entity>,
    ) -> bool {
        self.evaluate_standard(ctx, action, entity)
            .map(|decision| decision.allowed)
            .unwrap_or(false)
    }

    fn resolve(
        &self,
        ctx: &AuthorizationContext<'_>,
        action: &str,
        entity: Option<&dyn Entity>,
    ) -> Result<Decision> {
        let allowed = self.allowed_roles(action, entity)?;

        if allowed.contains(&self.config.wildcard_role) {
            debug!("Wildcard grants {}", action);
            if let Some(metrics) = &self.metrics {
                metrics.record_wildcard();
            }
            return Ok(Decision::wildcard());
        }

        let subject_roles = self.subject_roles(ctx, entity)?;
        let matched: RoleSet = allowed.intersection(&subject_roles).cloned().collect();

        if matched.is_empty() {
            Ok(Decision::no_match())
        } else {
            Ok(Decision::matched(matched))
        }
    }

    fn action_kind(&self, action: &str) -> Option<ActionKind> {
        self.policy
            .action_kind(action)
            .or_else(|| StandardAction::from_name(action).map(StandardAction::kind))
    }

    fn require_entity(&self, action: &str, entity: Option<&dyn Entity>) -> Result<()> {
        if entity.is_none() && self.action_kind(action) == Some(ActionKind::Model) {
            return Err(AuthzError::MissingEntity {
                action: action.to_string(),
            });
        }
        Ok(())
    }

    fn guard(&self, action: StandardAction, entity: &dyn Entity) -> Option<StructuralDenial> {
        let soft_delete = self.entities.supports_soft_delete(entity.entity_type());

        match action {
            StandardAction::Delete if soft_delete && self.entities.is_soft_deleted(entity) => {
                Some(StructuralDenial::AlreadyDeleted)
            }
            StandardAction::Restore if soft_delete && !self.entities.is_soft_deleted(entity) => {
                Some(StructuralDenial::NotDeleted)
            }
            StandardAction::ForceDelete if !soft_delete => {
                Some(StructuralDenial::SoftDeleteUnsupported)
            }
            _ => None,
        }
    }

    fn namespace_for(&self, entity: Option<&dyn Entity>) -> Result<String> {
        let Some(entity) = entity else {
            return Ok(self.namespace.clone());
        };

        match self.entities.namespace_of(entity.entity_type()) {
            Some(namespace) if !namespace.is_empty() && !namespace.contains(SIGNATURE_SEPARATOR) => {
                Ok(namespace)
            }
            _ => Err(AuthzError::UnresolvedNamespace(format!(
                "entity type '{}'",
                entity.entity_type()
            ))),
        }
    }

    fn relationship_roles(&self, subject: &dyn Subject, entity: &dyn Entity) -> Result<RoleSet> {
        let mut roles = RoleSet::new();
        for relationship in self.entities.relationships_of(entity.entity_type()) {
            if self.roles.related_to(subject, entity, &relationship)? {
                roles.insert(relationship);
            }
        }
        Ok(roles)
    }

    fn static_roles(&self, ctx: &AuthorizationContext<'_>) -> Result<RoleSet> {
        let Some(subject) = ctx.subject() else {
            return Ok(RoleSet::from([self.config.guest_role.clone()]));
        };

        let subject_id = subject.subject_id();
        if let Some(roles) = ctx.cached_roles(subject_id) {
            if let Some(metrics) = &self.metrics {
                metrics.record_role_cache(true);
            }
            return Ok(roles);
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_role_cache(false);
        }
        let roles = self.roles.roles_of(subject)?;
        ctx.remember_roles(subject_id, roles.clone());
        Ok(roles)
    }

    fn finalize(&self, action: &str, result: Result<Decision>) -> Result<Decision> {
        match &result {
            Ok(decision) => {
                debug!(
                    "Decision for {}:{}: {} ({:?})",
                    self.namespace,
                    action,
                    if decision.allowed { "ALLOW" } else { "DENY" },
                    decision.reason
                );
            }
            Err(e) if e.is_configuration_error() => {
                error!("Denying {}:{} on configuration error: {}", self.namespace, action, e);
                if let Some(metrics) = &self.metrics {
                    metrics.record_configuration_error();
                }
            }
            Err(e) => {
                warn!("Denying {}:{} on lookup failure: {}", self.namespace, action, e);
                if let Some(metrics) = &self.metrics {
                    metrics.record_lookup_failure();
                }
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_decision(result.as_ref().map(|d| d.allowed).unwrap_or(false));
        }
        result
    }
}

impl fmt::Debug for PermissionResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionResolver")
            .field("namespace", &self.namespace)
            .field("config", &self.config)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

/// Builder for [`PermissionResolver`]
///
/// Collaborators left unset default to empty in-memory implementations.
pub struct PermissionResolverBuilder {
    policy: Arc<dyn PolicyUnit>,
    store: Option<Arc<dyn PermissionStore>>,
    roles: Option<Arc<dyn RoleProvider>>,
    entities: Option<Arc<dyn EntityDescriptor>>,
    config: ResolverConfig,
    metrics: Option<Arc<ResolverMetrics>>,
}

impl PermissionResolverBuilder {
    pub fn new(policy: Arc<dyn PolicyUnit>) -> Self {
        Self {
            policy,
            store: None,
            roles: None,
            entities: None,
            config: ResolverConfig::default(),
            metrics: None,
        }
    }

    pub fn store(mut self, store: Arc<dyn PermissionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn roles(mut self, roles: Arc<dyn RoleProvider>) -> Self {
        self.roles = Some(roles);
        self
    }

    pub fn entities(mut self, entities: Arc<dyn EntityDescriptor>) -> Self {
        self.entities = Some(entities);
        self
    }

    pub fn config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Share a metrics collector across resolvers; implies metrics are enabled
    pub fn metrics(mut self, metrics: Arc<ResolverMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Validate the wiring and build the resolver
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if the configuration or the policy's action table is invalid
    /// - `UnresolvedNamespace` if the policy has an empty namespace or one
    ///   containing the signature separator
    pub fn build(self) -> Result<PermissionResolver> {
        self.config.validate()?;
        self.policy.actions().validate()?;

        let namespace = self.policy.namespace();
        if namespace.is_empty() || namespace.contains(SIGNATURE_SEPARATOR) {
            return Err(AuthzError::UnresolvedNamespace(format!(
                "policy namespace '{}' is not usable",
                namespace
            )));
        }

        let metrics = match self.metrics {
            Some(metrics) => Some(metrics),
            None if self.config.enable_metrics => Some(Arc::new(ResolverMetrics::new())),
            None => None,
        };

        debug!("PermissionResolver initialized for namespace {}", namespace);

        Ok(PermissionResolver {
            policy: self.policy,
            namespace,
            store: self
                .store
                .unwrap_or_else(|| Arc::new(CachedPermissionStore::empty())),
            roles: self
                .roles
                .unwrap_or_else(|| Arc::new(StaticRoleProvider::new())),
            entities: self
                .entities
                .unwrap_or_else(|| Arc::new(EntityRegistry::new())),
            config: self.config,
            metrics,
        })
    }
}
