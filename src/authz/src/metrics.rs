//! Decision counters for resolver observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of resolver counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Allowed decisions
    pub allowed: u64,

    /// Denied decisions, whatever the cause
    pub denied: u64,

    /// Allows short-circuited by the wildcard role
    pub wildcard_grants: u64,

    /// Denials by a soft-delete guard
    pub structural_denials: u64,

    /// Collaborator failures converted to deny
    pub lookup_failures: u64,

    /// Caller or wiring errors converted to deny
    pub configuration_errors: u64,

    /// Static role lookups answered by the request context
    pub role_cache_hits: u64,

    /// Static role lookups that reached the role provider
    pub role_cache_misses: u64,
}

impl MetricsSnapshot {
    pub fn total_decisions(&self) -> u64 {
        self.allowed + self.denied
    }

    /// Calculate allow rate
    pub fn allow_rate(&self) -> f64 {
        let total = self.total_decisions();
        if total == 0 {
            0.0
        } else {
            self.allowed as f64 / total as f64
        }
    }

    /// Calculate role cache hit rate
    pub fn role_cache_hit_rate(&self) -> f64 {
        let total = self.role_cache_hits + self.role_cache_misses;
        if total == 0 {
            0.0
        } else {
            self.role_cache_hits as f64 / total as f64
        }
    }
}

/// Lock-free metrics collector shared by all evaluations of a resolver
#[derive(Debug, Default)]
pub struct ResolverMetrics {
    allowed: AtomicU64,
    denied: AtomicU64,
    wildcard_grants: AtomicU64,
    structural_denials: AtomicU64,
    lookup_failures: AtomicU64,
    configuration_errors: AtomicU64,
    role_cache_hits: AtomicU64,
    role_cache_misses: AtomicU64,
}

impl ResolverMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_decision(&self, allowed: bool) {
        if allowed {
            self.allowed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.denied.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_wildcard(&self) {
        self.wildcard_grants.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_structural_denial(&self) {
        self.structural_denials.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lookup_failure(&self) {
        self.lookup_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_configuration_error(&self) {
        self.configuration_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_role_cache(&self, hit: bool) {
        if hit {
            self.role_cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.role_cache_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            allowed: self.allowed.load(Ordering::Relaxed),
            denied: self.denied.load(Ordering::Relaxed),
            wildcard_grants: self.wildcard_grants.load(Ordering::Relaxed),
            structural_denials: self.structural_denials.load(Ordering::Relaxed),
            lookup_failures: self.lookup_failures.load(Ordering::Relaxed),
            configuration_errors: self.configuration_errors.load(Ordering::Relaxed),
            role_cache_hits: self.role_cache_hits.load(Ordering::Relaxed),
            role_cache_misses: self.role_cache_misses.load(Ordering::Relaxed),
        }
    }
}
