//! Per-request authorization context
//!
//! Holds the subject of one incoming request and memoizes its static roles so
//! several `authorize` calls made while serving that request share a single
//! role lookup. The context is `!Sync` and is meant to be dropped with the
//! request; never pool or reuse it.

use crate::types::{RoleSet, Subject};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

pub struct AuthorizationContext<'a> {
    subject: Option<&'a dyn Subject>,
    static_roles: RefCell<HashMap<String, RoleSet>>,
}

impl<'a> AuthorizationContext<'a> {
    pub fn new(subject: Option<&'a dyn Subject>) -> Self {
        Self {
            subject,
            static_roles: RefCell::new(HashMap::new()),
        }
    }

    pub fn for_subject(subject: &'a dyn Subject) -> Self {
        Self::new(Some(subject))
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn subject(&self) -> Option<&'a dyn Subject> {
        self.subject
    }

    pub fn is_anonymous(&self) -> bool {
        self.subject.is_none()
    }

    /// Cached static roles of a subject, if already looked up in this context
    pub fn cached_roles(&self, subject_id: &str) -> Option<RoleSet> {
        self.static_roles.borrow().get(subject_id).cloned()
    }

    pub fn remember_roles(&self, subject_id: &str, roles: RoleSet) {
        self.static_roles
            .borrow_mut()
            .insert(subject_id.to_string(), roles);
    }

    /// Number of subjects with cached roles
    pub fn cached_subjects(&self) -> usize {
        self.static_roles.borrow().len()
    }
}

impl fmt::Debug for AuthorizationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationContext")
            .field("subject", &self.subject.map(|s| s.subject_id()))
            .field("cached_subjects", &self.cached_subjects())
            .finish()
    }
}
