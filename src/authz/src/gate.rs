//! Role gate for request-pipeline filters
//!
//! A coarse check run before any entity-specific authorization: the subject
//! passes only if it is present and holds at least one of the allowed static
//! roles. The gate never looks at policy units, stored permissions or
//! relationships. Filters turn a `false` into an access-denied response.

use crate::collaborators::RoleProvider;
use crate::error::{AuthzError, Result};
use crate::types::{RoleSet, Subject};
use std::sync::Arc;
use tracing::{debug, warn};

/// Separator of role lists in route declarations (`"admin|staff"`)
pub const ROLE_LIST_SEPARATOR: char = '|';

pub struct RoleGate {
    roles: Arc<dyn RoleProvider>,
}

impl RoleGate {
    pub fn new(roles: Arc<dyn RoleProvider>) -> Self {
        Self { roles }
    }

    /// Parse a pipe-separated role list. An empty list allows nobody.
    pub fn parse_roles(list: &str) -> RoleSet {
        list.split(ROLE_LIST_SEPARATOR)
            .map(str::trim)
            .filter(|role| !role.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Whether `subject` holds one of `allowed`. Lookup failures deny.
    pub fn check(&self, subject: Option<&dyn Subject>, allowed: &RoleSet) -> bool {
        match self.try_check(subject, allowed) {
            Ok(passed) => passed,
            Err(e) => {
                warn!("Role gate denying on lookup failure: {}", e);
                false
            }
        }
    }

    /// Like [`check`](Self::check) but surfaces lookup failures
    pub fn try_check(&self, subject: Option<&dyn Subject>, allowed: &RoleSet) -> Result<bool> {
        let Some(subject) = subject else {
            debug!("Role gate: anonymous subject rejected");
            return Ok(false);
        };

        if allowed.is_empty() {
            debug!("Role gate: empty allow-list rejects {}", subject.subject_id());
            return Ok(false);
        }

        let held = self.roles.roles_of(subject)?;
        let passed = !held.is_disjoint(allowed);
        debug!(
            "Role gate: {} with {:?} against {:?}: {}",
            subject.subject_id(),
            held,
            allowed,
            passed
        );
        Ok(passed)
    }

    /// `Ok(())` when the gate passes, `AccessDenied` otherwise
    pub fn require(&self, subject: Option<&dyn Subject>, allowed: &RoleSet) -> Result<()> {
        if self.check(subject, allowed) {
            Ok(())
        } else {
            Err(AuthzError::AccessDenied)
        }
    }
}
