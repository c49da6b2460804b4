use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::ResourceError;
use crate::list::{FetchOutcome, ListController};

/// A list view that can be told its data is stale.
#[async_trait]
pub trait Invalidate: Send + Sync {
    async fn invalidate(&self) -> FetchOutcome;
}

#[async_trait]
impl<T> Invalidate for ListController<T>
where
    T: Send + Sync + 'static,
{
    async fn invalidate(&self) -> FetchOutcome {
        self.refetch().await
    }
}

type Entry = (u64, Weak<dyn Invalidate>);

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    lists: Mutex<HashMap<String, Vec<Entry>>>,
}

impl Registry {
    fn remove(&self, resource: &str, id: u64) {
        let mut lists = self.lists.lock();
        if let Some(entries) = lists.get_mut(resource) {
            entries.retain(|(entry_id, _)| *entry_id != id);
            if entries.is_empty() {
                lists.remove(resource);
            }
        }
    }
}

/// Keeps list views consistent with server state after mutations.
///
/// Lists register per resource name; [`after_mutation`](Self::after_mutation)
/// refetches every live list of that resource with its current query.
/// Registrations hold the list weakly and end when the [`Subscription`] drops.
#[derive(Clone, Default)]
pub struct Coordinator {
    registry: Arc<Registry>,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lists = self.registry.lists.lock();
        f.debug_struct("Coordinator")
            .field("resources", &lists.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Coordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `list` to mutations of `resource`.
    #[must_use = "the list is unregistered when the Subscription is dropped"]
    pub fn register<L>(&self, resource: impl Into<String>, list: &Arc<L>) -> Subscription
    where
        L: Invalidate + 'static,
    {
        let resource = resource.into();
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        let list: Arc<dyn Invalidate> = list.clone();
        self.registry
            .lists
            .lock()
            .entry(resource.clone())
            .or_default()
            .push((id, Arc::downgrade(&list)));
        debug!(resource = %resource, id, "list registered");

        Subscription {
            registry: Arc::downgrade(&self.registry),
            resource,
            id,
        }
    }

    /// Number of live lists subscribed to `resource`.
    #[must_use]
    pub fn active(&self, resource: &str) -> usize {
        self.registry
            .lists
            .lock()
            .get(resource)
            .map_or(0, |entries| entries.iter().filter(|(_, w)| w.strong_count() > 0).count())
    }

    /// Refetch every live list of `resource` and wait for all of them.
    ///
    /// Returns how many lists were refetched.
    pub async fn after_mutation(&self, resource: &str) -> usize {
        let lists: Vec<Arc<dyn Invalidate>> = {
            let mut registry = self.registry.lists.lock();
            let Some(entries) = registry.get_mut(resource) else {
                return 0;
            };
            entries.retain(|(_, w)| w.strong_count() > 0);
            entries.iter().filter_map(|(_, w)| w.upgrade()).collect()
        };

        let outcomes = join_all(lists.iter().map(|list| list.invalidate())).await;
        let failed = outcomes
            .iter()
            .filter(|o| **o == FetchOutcome::Failed)
            .count();
        info!(resource, refetched = lists.len(), failed, "lists invalidated");
        lists.len()
    }

    /// Await a mutation and invalidate `resource` only if it succeeded.
    ///
    /// # Errors
    /// Returns the mutation's own error untouched.
    pub async fn apply<T, F>(&self, resource: &str, mutation: F) -> Result<T, ResourceError>
    where
        F: Future<Output = Result<T, ResourceError>>,
    {
        let value = mutation.await?;
        self.after_mutation(resource).await;
        Ok(value)
    }
}

/// Registration handle returned by [`Coordinator::register`].
#[derive(Debug)]
pub struct Subscription {
    registry: Weak<Registry>,
    resource: String,
    id: u64,
}

impl Subscription {
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.resource, self.id);
        }
    }
}
