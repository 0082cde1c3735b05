//! Assignment table: a ConfigMap mapping resource identities to
//! on-demand percentages.
//!
//! Entries are consumed: the hook reads an entry, patches the workload
//! and then removes the entry. Removal is a read-modify-write guarded by
//! `resourceVersion`, so a concurrent writer causes a retry rather than a
//! lost update. It is still not a transaction with the lookup: an entry
//! rewritten between lookup and cleanup is removed anyway.

use crate::{
    errors::{classify_kube, ErrorClass},
    workload::ResourceIdentity,
};
use anyhow::Context as _;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::{ObjectMeta, PostParams};
use rand::distributions::Distribution;
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
    time::Duration,
};

const CLEANUP_ATTEMPTS: usize = 3;
const CONFLICT_SLEEP_MILLIS: u64 = 50;
const FIELD_MANAGER: &str = "spot-webhook";

/// Storage holding assignment tables.
/// Implemented by `kube::Client` and by `InMemoryStore`.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    async fn get(&self, namespace: &str, name: &str) -> Result<ConfigMap, kube::Error>;

    /// Replaces the table. If `table` carries a resourceVersion that is
    /// not current, a `Conflict` error is returned.
    async fn replace(
        &self,
        namespace: &str,
        name: &str,
        table: &ConfigMap,
    ) -> Result<ConfigMap, kube::Error>;
}

#[async_trait]
impl AssignmentStore for kube::Client {
    async fn get(&self, namespace: &str, name: &str) -> Result<ConfigMap, kube::Error> {
        kube::Api::<ConfigMap>::namespaced(self.clone(), namespace)
            .get(name)
            .await
    }

    async fn replace(
        &self,
        namespace: &str,
        name: &str,
        table: &ConfigMap,
    ) -> Result<ConfigMap, kube::Error> {
        let params = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        kube::Api::<ConfigMap>::namespaced(self.clone(), namespace)
            .replace(name, &params, table)
            .await
    }
}

/// Location of the assignment table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub namespace: String,
    pub name: String,
}

/// Result of looking up an identity
#[derive(Debug, PartialEq, Eq)]
pub enum Lookup {
    /// Entry exists, contains percentage (opaque)
    Found(String),
    /// Table has no data at all
    Empty,
    /// Table has data, but not for this identity
    Missing,
}

/// Reads the entry for `identity`.
/// # Errors
/// Fails if the table can not be fetched. Never retried.
pub async fn lookup<S: AssignmentStore + ?Sized>(
    store: &S,
    table: &TableRef,
    identity: &ResourceIdentity,
) -> anyhow::Result<Lookup> {
    let cm = store
        .get(&table.namespace, &table.name)
        .await
        .context("spot deployment ConfigMap couldn't be retrieved")?;
    let data = match cm.data {
        Some(data) if !data.is_empty() => data,
        _ => return Ok(Lookup::Empty),
    };
    Ok(match data.get(identity.as_str()) {
        Some(value) => Lookup::Found(value.clone()),
        None => Lookup::Missing,
    })
}

/// Removes the entry for `identity` from the table.
/// Returns `false` if there was nothing to remove.
#[tracing::instrument(skip(store, table, identity), fields(resource = %identity))]
pub async fn consume<S: AssignmentStore + ?Sized>(
    store: &S,
    table: &TableRef,
    identity: &ResourceIdentity,
) -> anyhow::Result<bool> {
    for attempt_id in 0..CLEANUP_ATTEMPTS {
        let mut cm = store
            .get(&table.namespace, &table.name)
            .await
            .context("failed to get assignment table")?;
        let removed = cm
            .data
            .as_mut()
            .and_then(|data| data.remove(identity.as_str()));
        if removed.is_none() {
            tracing::debug!("entry is already gone");
            return Ok(false);
        }
        match store.replace(&table.namespace, &table.name, &cm).await {
            Ok(_) => {
                tracing::debug!("deleted entry from ConfigMap");
                return Ok(true);
            }
            Err(err) => match classify_kube(&err) {
                ErrorClass::Conflict => {
                    tracing::debug!(attempt_id = attempt_id, "Conflict, will retry");
                    let dist = rand::distributions::Uniform::new(1.0, 1.1);
                    let factor = dist.sample(&mut rand::thread_rng());
                    let sleep_time = (CONFLICT_SLEEP_MILLIS as f64 * factor) as u64;
                    tokio::time::sleep(Duration::from_millis(sleep_time)).await;
                }
                _ => return Err(err).context("failed to update assignment table"),
            },
        }
    }
    anyhow::bail!(
        "assignment table kept changing, gave up after {} attempts",
        CLEANUP_ATTEMPTS
    )
}

#[derive(Default)]
struct Tables {
    items: BTreeMap<(String, String), ConfigMap>,
    last_version: u64,
}

/// Assignment store living in process memory.
/// Mimics apiserver behavior: NotFound for missing tables,
/// Conflict for stale resourceVersion.
#[derive(Clone, Default)]
pub struct InMemoryStore(Arc<Mutex<Tables>>);

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Creates or overwrites a table
    pub fn put(&self, namespace: &str, name: &str, data: Option<BTreeMap<String, String>>) {
        let mut tables = self.tables();
        tables.last_version += 1;
        let cm = ConfigMap {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                resource_version: Some(tables.last_version.to_string()),
                ..Default::default()
            },
            data,
            ..Default::default()
        };
        tables
            .items
            .insert((namespace.to_string(), name.to_string()), cm);
    }

    /// Returns current data of a table, `None` if the table does not exist
    pub fn data(&self, namespace: &str, name: &str) -> Option<BTreeMap<String, String>> {
        self.tables()
            .items
            .get(&(namespace.to_string(), name.to_string()))
            .map(|cm| cm.data.clone().unwrap_or_default())
    }
}

#[async_trait]
impl AssignmentStore for InMemoryStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<ConfigMap, kube::Error> {
        self.tables()
            .items
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| crate::errors::not_found("configmaps", namespace, name))
    }

    async fn replace(
        &self,
        namespace: &str,
        name: &str,
        table: &ConfigMap,
    ) -> Result<ConfigMap, kube::Error> {
        let mut tables = self.tables();
        let next_version = tables.last_version + 1;
        let current = tables
            .items
            .get_mut(&(namespace.to_string(), name.to_string()))
            .ok_or_else(|| crate::errors::not_found("configmaps", namespace, name))?;
        if let Some(version) = &table.metadata.resource_version {
            if current.metadata.resource_version.as_ref() != Some(version) {
                return Err(crate::errors::conflict("configmaps", name));
            }
        }
        let mut updated = table.clone();
        updated.metadata.resource_version = Some(next_version.to_string());
        *current = updated.clone();
        tables.last_version = next_version;
        Ok(updated)
    }
}
