//! Authorization decisions and reason codes

use crate::types::RoleSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Soft-delete guard that denied a destructive action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralDenial {
    /// `delete` on an instance that is already soft-deleted
    AlreadyDeleted,
    /// `restore` on an instance that is not soft-deleted
    NotDeleted,
    /// `forceDelete` on a type without soft-delete support
    SoftDeleteUnsupported,
}

impl fmt::Display for StructuralDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StructuralDenial::AlreadyDeleted => "record is already deleted",
            StructuralDenial::NotDeleted => "record is not deleted",
            StructuralDenial::SoftDeleteUnsupported => "type does not support soft delete",
        };
        f.write_str(text)
    }
}

/// Reason for an authorization decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DecisionReason {
    /// The wildcard role was among the allowed roles
    Wildcard,

    /// Subject roles intersected the allowed roles
    RoleMatch { roles: RoleSet },

    /// No subject role was allowed
    NoMatchingRole,

    /// A soft-delete guard denied the action
    Structural { denial: StructuralDenial },
}

/// Authorization decision
///
/// `allowed` is the whole answer; `reason` exists for callers that need to
/// tell a structural denial from an ordinary one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub allowed: bool,
    pub reason: DecisionReason,
}

impl Decision {
    pub fn wildcard() -> Self {
        Self {
            allowed: true,
            reason: DecisionReason::Wildcard,
        }
    }

    /// Allow because of the given matching roles
    pub fn matched(roles: RoleSet) -> Self {
        Self {
            allowed: true,
            reason: DecisionReason::RoleMatch { roles },
        }
    }

    pub fn no_match() -> Self {
        Self {
            allowed: false,
            reason: DecisionReason::NoMatchingRole,
        }
    }

    pub fn structural(denial: StructuralDenial) -> Self {
        Self {
            allowed: false,
            reason: DecisionReason::Structural { denial },
        }
    }

    pub fn is_structural_denial(&self) -> bool {
        matches!(self.reason, DecisionReason::Structural { .. })
    }
}
