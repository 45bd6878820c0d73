//! Collaborator contracts consumed by the resolver, plus in-memory implementations
//!
//! Production deployments back `RoleProvider` with their user/role storage and
//! `EntityDescriptor` with their model metadata. The in-memory versions here are
//! thread-safe (`DashMap`) and suitable for embedding and tests.

use crate::error::Result;
use crate::types::{Entity, RoleSet, Subject};
use dashmap::{DashMap, DashSet};
use serde::{Deserialize, Serialize};

/// Source of subject roles and subject/entity relationships
pub trait RoleProvider: Send + Sync {
    /// Static roles of a subject, independent of any entity
    fn roles_of(&self, subject: &dyn Subject) -> Result<RoleSet>;

    /// Whether `subject` relates to `entity` through `relationship`
    fn related_to(
        &self,
        subject: &dyn Subject,
        entity: &dyn Entity,
        relationship: &str,
    ) -> Result<bool>;
}

/// Type-level metadata about entities
pub trait EntityDescriptor: Send + Sync {
    /// Namespace of an entity type; `None` when the type is unknown
    fn namespace_of(&self, entity_type: &str) -> Option<String>;

    /// Relationship names the type exposes for authorization, in declaration order
    fn relationships_of(&self, entity_type: &str) -> Vec<String>;

    fn supports_soft_delete(&self, entity_type: &str) -> bool;

    fn is_soft_deleted(&self, entity: &dyn Entity) -> bool {
        entity.is_soft_deleted()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RelationshipFact {
    subject_id: String,
    entity_type: String,
    entity_id: String,
    relationship: String,
}

/// Role provider backed by in-memory maps
#[derive(Debug, Default)]
pub struct StaticRoleProvider {
    roles: DashMap<String, RoleSet>,
    relationships: DashSet<RelationshipFact>,
}

impl StaticRoleProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the static roles of a subject
    pub fn assign_roles<I, S>(&self, subject_id: impl Into<String>, roles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles
            .insert(subject_id.into(), roles.into_iter().map(Into::into).collect());
    }

    pub fn grant_role(&self, subject_id: impl Into<String>, role: impl Into<String>) {
        self.roles
            .entry(subject_id.into())
            .or_default()
            .insert(role.into());
    }

    pub fn revoke_role(&self, subject_id: &str, role: &str) {
        if let Some(mut roles) = self.roles.get_mut(subject_id) {
            roles.remove(role);
        }
    }

    /// Record that `subject_id` relates to the entity through `relationship`
    pub fn relate(
        &self,
        subject_id: impl Into<String>,
        entity: &dyn Entity,
        relationship: impl Into<String>,
    ) {
        self.relationships.insert(RelationshipFact {
            subject_id: subject_id.into(),
            entity_type: entity.entity_type().to_string(),
            entity_id: entity.entity_id().to_string(),
            relationship: relationship.into(),
        });
    }

    pub fn unrelate(&self, subject_id: &str, entity: &dyn Entity, relationship: &str) {
        self.relationships.remove(&RelationshipFact {
            subject_id: subject_id.to_string(),
            entity_type: entity.entity_type().to_string(),
            entity_id: entity.entity_id().to_string(),
            relationship: relationship.to_string(),
        });
    }
}

impl RoleProvider for StaticRoleProvider {
    fn roles_of(&self, subject: &dyn Subject) -> Result<RoleSet> {
        Ok(self
            .roles
            .get(subject.subject_id())
            .map(|roles| roles.clone())
            .unwrap_or_default())
    }

    fn related_to(
        &self,
        subject: &dyn Subject,
        entity: &dyn Entity,
        relationship: &str,
    ) -> Result<bool> {
        Ok(self.relationships.contains(&RelationshipFact {
            subject_id: subject.subject_id().to_string(),
            entity_type: entity.entity_type().to_string(),
            entity_id: entity.entity_id().to_string(),
            relationship: relationship.to_string(),
        }))
    }
}

/// Authorization metadata of one entity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    pub namespace: String,

    #[serde(default)]
    pub relationships: Vec<String>,

    #[serde(default)]
    pub soft_delete: bool,
}

impl EntityType {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            relationships: Vec::new(),
            soft_delete: false,
        }
    }

    pub fn with_relationship(mut self, relationship: impl Into<String>) -> Self {
        self.relationships.push(relationship.into());
        self
    }

    pub fn with_soft_delete(mut self) -> Self {
        self.soft_delete = true;
        self
    }
}

/// Entity descriptor backed by a registry of entity types
#[derive(Debug, Default)]
pub struct EntityRegistry {
    types: DashMap<String, EntityType>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the metadata of an entity type
    pub fn register(&self, entity_type: impl Into<String>, descriptor: EntityType) {
        self.types.insert(entity_type.into(), descriptor);
    }

    pub fn with_type(self, entity_type: impl Into<String>, descriptor: EntityType) -> Self {
        self.register(entity_type, descriptor);
        self
    }
}

impl EntityDescriptor for EntityRegistry {
    fn namespace_of(&self, entity_type: &str) -> Option<String> {
        self.types
            .get(entity_type)
            .map(|descriptor| descriptor.namespace.clone())
    }

    fn relationships_of(&self, entity_type: &str) -> Vec<String> {
        self.types
            .get(entity_type)
            .map(|descriptor| descriptor.relationships.clone())
            .unwrap_or_default()
    }

    fn supports_soft_delete(&self, entity_type: &str) -> bool {
        self.types
            .get(entity_type)
            .map(|descriptor| descriptor.soft_delete)
            .unwrap_or(false)
    }
}
