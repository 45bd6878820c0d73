//! Dynamic permission storage
//!
//! The resolver reads an immutable [`PermissionSnapshot`] through the
//! [`PermissionStore`] trait. [`CachedPermissionStore`] holds the current
//! snapshot behind an `Arc` and swaps it whole on refresh, so a reader keeps the
//! snapshot it started with even while an administrator replaces it.

use crate::error::{AuthzError, Result};
use crate::types::{PermissionRecord, Signature};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Immutable set of permission records, indexed by signature
#[derive(Debug, Clone, Default)]
pub struct PermissionSnapshot {
    generation: u64,
    records: Vec<PermissionRecord>,
    index: HashMap<Signature, Vec<String>>,
}

impl PermissionSnapshot {
    pub fn new(records: Vec<PermissionRecord>) -> Self {
        Self::with_generation(records, 0)
    }

    fn with_generation(records: Vec<PermissionRecord>, generation: u64) -> Self {
        let mut index: HashMap<Signature, Vec<String>> = HashMap::new();
        for record in &records {
            index
                .entry(record.signature.clone())
                .or_default()
                .push(record.role.clone());
        }

        Self {
            generation,
            records,
            index,
        }
    }

    /// Number of swaps that preceded this snapshot in its store
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Records in load order
    pub fn records(&self) -> &[PermissionRecord] {
        &self.records
    }

    /// Roles granted for a signature, duplicates included
    pub fn roles_for(&self, signature: &Signature) -> &[String] {
        self.index
            .get(signature)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Read path of the dynamic permission store
pub trait PermissionStore: Send + Sync {
    /// Current snapshot. Fails when no snapshot can be produced.
    fn current(&self) -> Result<Arc<PermissionSnapshot>>;
}

/// Backing source the store loads records from
#[async_trait]
pub trait PermissionSource: Send + Sync {
    async fn load(&self) -> Result<Vec<PermissionRecord>>;
}

/// Refreshable, process-wide permission cache
pub struct CachedPermissionStore {
    snapshot: RwLock<Option<Arc<PermissionSnapshot>>>,
    generation: AtomicU64,
    stale: AtomicBool,
}

impl CachedPermissionStore {
    /// Store loaded with a fixed set of records
    pub fn new(records: Vec<PermissionRecord>) -> Self {
        Self {
            snapshot: RwLock::new(Some(Arc::new(PermissionSnapshot::new(records)))),
            generation: AtomicU64::new(0),
            stale: AtomicBool::new(false),
        }
    }

    /// Loaded store with no records
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Store that has not loaded anything yet; reads fail until a refresh
    pub fn unloaded() -> Self {
        Self {
            snapshot: RwLock::new(None),
            generation: AtomicU64::new(0),
            stale: AtomicBool::new(false),
        }
    }

    /// Store loaded from a source
    pub async fn load_from(source: &dyn PermissionSource) -> Result<Self> {
        let store = Self::unloaded();
        store.refresh(source).await?;
        Ok(store)
    }

    /// Atomically replace the snapshot
    pub fn replace(&self, records: Vec<PermissionRecord>) -> Arc<PermissionSnapshot> {
        let mut slot = self.snapshot.write();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Arc::new(PermissionSnapshot::with_generation(records, generation));
        *slot = Some(Arc::clone(&snapshot));
        self.stale.store(false, Ordering::SeqCst);

        info!(
            "Permission snapshot replaced: generation={}, records={}",
            generation,
            snapshot.len()
        );
        snapshot
    }

    /// Reload from `source` and swap. On failure the previous snapshot stays live.
    pub async fn refresh(&self, source: &dyn PermissionSource) -> Result<Arc<PermissionSnapshot>> {
        match source.load().await {
            Ok(records) => Ok(self.replace(records)),
            Err(e) => {
                warn!("Permission refresh failed, keeping previous snapshot: {}", e);
                Err(e)
            }
        }
    }

    /// Reload from `source` only when the store is stale or was never loaded
    pub async fn refresh_if_stale(
        &self,
        source: &dyn PermissionSource,
    ) -> Result<Option<Arc<PermissionSnapshot>>> {
        if self.is_loaded() && !self.is_stale() {
            return Ok(None);
        }
        self.refresh(source).await.map(Some)
    }

    /// Mark the snapshot stale. Reads keep the previous snapshot until the next
    /// refresh or replace.
    pub fn invalidate(&self) {
        self.stale.store(true, Ordering::SeqCst);
        info!(
            "Permission snapshot invalidated: generation={}",
            self.generation.load(Ordering::SeqCst)
        );
    }

    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::SeqCst)
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.read().is_some()
    }
}

impl Default for CachedPermissionStore {
    fn default() -> Self {
        Self::empty()
    }
}

impl PermissionStore for CachedPermissionStore {
    fn current(&self) -> Result<Arc<PermissionSnapshot>> {
        self.snapshot
            .read()
            .as_ref()
            .map(Arc::clone)
            .ok_or(AuthzError::SnapshotUnavailable)
    }
}

/// In-memory permission source, the administration surface for tests and embedding
pub struct InMemoryPermissionSource {
    records: tokio::sync::RwLock<Vec<PermissionRecord>>,
}

impl InMemoryPermissionSource {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<PermissionRecord>) -> Self {
        Self {
            records: tokio::sync::RwLock::new(records),
        }
    }

    pub async fn put(&self, record: PermissionRecord) {
        self.records.write().await.push(record);
    }

    /// Remove every copy of a record; returns how many were removed
    pub async fn remove(&self, record: &PermissionRecord) -> usize {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|existing| existing != record);
        before - records.len()
    }

    /// Remove all records with a signature; returns how many were removed
    pub async fn remove_signature(&self, signature: &Signature) -> usize {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|existing| &existing.signature != signature);
        before - records.len()
    }

    pub async fn list(&self) -> Vec<PermissionRecord> {
        self.records.read().await.clone()
    }
}

impl Default for InMemoryPermissionSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PermissionSource for InMemoryPermissionSource {
    async fn load(&self) -> Result<Vec<PermissionRecord>> {
        Ok(self.list().await)
    }
}

/// Permission source reading a JSON array of `{signature, role}` objects
pub struct JsonFilePermissionSource {
    path: PathBuf,
}

impl JsonFilePermissionSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PermissionSource for JsonFilePermissionSource {
    async fn load(&self) -> Result<Vec<PermissionRecord>> {
        let bytes = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
