//! Policy units and their static action tables
//!
//! A policy unit is bound to one namespace and declares, per action, whether the
//! action targets an entity and which roles are allowed without consulting the
//! dynamic permission store.

use crate::error::{AuthzError, Result};
use crate::types::{RoleSet, SIGNATURE_SEPARATOR};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Whether an action targets an entity instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    /// Requires an entity (view, update, delete, ...)
    Model,
    /// Entity-less (viewAny, create)
    NonModel,
}

/// The seven conventional actions every policy exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardAction {
    ViewAny,
    View,
    Create,
    Update,
    Delete,
    Restore,
    ForceDelete,
}

impl StandardAction {
    pub const ALL: [StandardAction; 7] = [
        StandardAction::ViewAny,
        StandardAction::View,
        StandardAction::Create,
        StandardAction::Update,
        StandardAction::Delete,
        StandardAction::Restore,
        StandardAction::ForceDelete,
    ];

    /// Action name as it appears in signatures
    pub fn as_str(self) -> &'static str {
        match self {
            StandardAction::ViewAny => "viewAny",
            StandardAction::View => "view",
            StandardAction::Create => "create",
            StandardAction::Update => "update",
            StandardAction::Delete => "delete",
            StandardAction::Restore => "restore",
            StandardAction::ForceDelete => "forceDelete",
        }
    }

    pub fn kind(self) -> ActionKind {
        match self {
            StandardAction::ViewAny | StandardAction::Create => ActionKind::NonModel,
            _ => ActionKind::Model,
        }
    }

    /// Look up a standard action by its signature name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.as_str() == name)
    }
}

impl fmt::Display for StandardAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static declaration of one action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSpec {
    pub kind: ActionKind,

    /// Roles allowed by code, independent of the permission store
    #[serde(default)]
    pub default_roles: RoleSet,
}

/// Per-policy action table, built once at construction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionTable {
    actions: BTreeMap<String, ActionSpec>,
}

impl ActionTable {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding the seven standard actions with no default roles
    pub fn standard() -> Self {
        StandardAction::ALL
            .into_iter()
            .fold(Self::new(), |table, action| {
                table.declare(action.as_str(), action.kind(), RoleSet::new())
            })
    }

    /// Declare (or redeclare) an action
    pub fn declare<I, S>(mut self, action: impl Into<String>, kind: ActionKind, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions.insert(
            action.into(),
            ActionSpec {
                kind,
                default_roles: roles.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    pub fn model_action<I, S>(self, action: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declare(action, ActionKind::Model, roles)
    }

    pub fn non_model_action<I, S>(self, action: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declare(action, ActionKind::NonModel, roles)
    }

    /// Add default roles to an action.
    ///
    /// An undeclared action is declared with the kind of the matching standard
    /// action, or as a model action otherwise.
    pub fn allow<I, S>(mut self, action: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let action = action.into();
        let kind = StandardAction::from_name(&action)
            .map(StandardAction::kind)
            .unwrap_or(ActionKind::Model);
        self.actions
            .entry(action)
            .or_insert_with(|| ActionSpec {
                kind,
                default_roles: RoleSet::new(),
            })
            .default_roles
            .extend(roles.into_iter().map(Into::into));
        self
    }

    pub fn get(&self, action: &str) -> Option<&ActionSpec> {
        self.actions.get(action)
    }

    pub fn kind(&self, action: &str) -> Option<ActionKind> {
        self.actions.get(action).map(|spec| spec.kind)
    }

    /// Default roles of an action; empty for unknown actions
    pub fn roles(&self, action: &str) -> RoleSet {
        self.actions
            .get(action)
            .map(|spec| spec.default_roles.clone())
            .unwrap_or_default()
    }

    /// Declared actions of the given kind, in name order
    pub fn actions_of(&self, kind: ActionKind) -> Vec<String> {
        self.actions
            .iter()
            .filter(|(_, spec)| spec.kind == kind)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Reject action names that cannot form a signature
    pub fn validate(&self) -> Result<()> {
        for name in self.actions.keys() {
            if name.is_empty() {
                return Err(AuthzError::InvalidConfig(
                    "Action name cannot be empty".to_string(),
                ));
            }
            if name.contains(SIGNATURE_SEPARATOR) {
                return Err(AuthzError::InvalidConfig(format!(
                    "Action name '{}' cannot contain '{}'",
                    name, SIGNATURE_SEPARATOR
                )));
            }
        }
        Ok(())
    }
}

/// One authorization unit per entity namespace
pub trait PolicyUnit: Send + Sync {
    /// Namespace used as the left-hand side of signatures.
    ///
    /// Defaults to the implementing type's path, see [`derive_namespace`].
    fn namespace(&self) -> String {
        derive_namespace(std::any::type_name::<Self>())
    }

    /// Static action table
    fn actions(&self) -> &ActionTable;

    /// Roles allowed by code for `action`; may contain the wildcard role
    fn permissions(&self, action: &str) -> RoleSet {
        self.actions().roles(action)
    }

    fn action_kind(&self, action: &str) -> Option<ActionKind> {
        self.actions().kind(action)
    }

    fn model_actions(&self) -> Vec<String> {
        self.actions().actions_of(ActionKind::Model)
    }

    fn non_model_actions(&self) -> Vec<String> {
        self.actions().actions_of(ActionKind::NonModel)
    }
}

/// Policy unit defined entirely by data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablePolicy {
    namespace: String,
    actions: ActionTable,
}

impl TablePolicy {
    pub fn new(namespace: impl Into<String>, actions: ActionTable) -> Self {
        Self {
            namespace: namespace.into(),
            actions,
        }
    }
}

impl PolicyUnit for TablePolicy {
    fn namespace(&self) -> String {
        self.namespace.clone()
    }

    fn actions(&self) -> &ActionTable {
        &self.actions
    }
}

/// Separator between module segments of a derived namespace
pub const NAMESPACE_PATH_SEPARATOR: char = '.';

/// Derive a namespace from a type path:
/// `app::blog::policies::PostPolicy` -> `app.blog.Post`
///
/// The module path is kept so same-named policies in different modules stay
/// apart. `policies` segments and a trailing `Policy` are dropped, and generic
/// arguments are ignored. A type named just `Policy` yields an empty namespace,
/// which resolver construction rejects.
pub fn derive_namespace(type_name: &str) -> String {
    let base = type_name.split('<').next().unwrap_or(type_name);
    let mut segments: Vec<&str> = base
        .split("::")
        .filter(|segment| !segment.is_empty() && !segment.eq_ignore_ascii_case("policies"))
        .collect();

    let Some(last) = segments.pop() else {
        return String::new();
    };
    let name = last.strip_suffix("Policy").unwrap_or(last);
    if name.is_empty() {
        return String::new();
    }

    segments.push(name);
    segments.join(&NAMESPACE_PATH_SEPARATOR.to_string())
}
