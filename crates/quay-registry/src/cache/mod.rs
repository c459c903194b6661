//! Per-registry resolution cache
//!
//! Each registry URL owns one entry that moves from `Pending` to either
//! `Resolved` or `Failed` exactly once and then never changes. The first
//! caller for a URL installs the entry and spawns the assembly; everyone
//! else, including later callers, waits on the same entry. Assembly runs as
//! its own task, so it completes and populates the entry even if the caller
//! that started it goes away.

use std::future::Future;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::view::RegistryView;

/// State of one registry entry
#[derive(Debug, Clone)]
pub enum EntryState {
    /// Assembly in progress
    Pending,
    /// Assembly succeeded
    Resolved(Arc<RegistryView>),
    /// Assembly failed; the registry is unusable for this run
    Failed,
}

impl EntryState {
    /// Whether the entry is still waiting for assembly
    pub fn is_pending(&self) -> bool {
        matches!(self, EntryState::Pending)
    }

    /// The resolved view, if any
    pub fn view(&self) -> Option<Arc<RegistryView>> {
        match self {
            EntryState::Resolved(view) => Some(Arc::clone(view)),
            _ => None,
        }
    }
}

/// Memoized registry views keyed by registry URL
#[derive(Debug, Default)]
pub struct RegistryCache {
    entries: DashMap<String, watch::Receiver<EntryState>>,
}

impl RegistryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Resolve the view for `registry_url`, assembling it on first use.
    ///
    /// `assemble` is only invoked by the caller that installs the entry.
    pub async fn resolve<F, Fut>(&self, registry_url: &str, assemble: F) -> Option<Arc<RegistryView>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<RegistryView>> + Send + 'static,
    {
        let mut receiver = match self.entries.entry(registry_url.to_string()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let (sender, receiver) = watch::channel(EntryState::Pending);
                entry.insert(receiver.clone());

                debug!(registry = registry_url, "Assembling registry view");
                let work = assemble();
                let registry = registry_url.to_string();
                tokio::spawn(async move {
                    let state = match work.await {
                        Some(view) => EntryState::Resolved(Arc::new(view)),
                        None => {
                            warn!(registry = %registry, "Registry unusable for this run");
                            EntryState::Failed
                        },
                    };
                    // Receivers stored in the map keep the channel open
                    let _ = sender.send(state);
                });

                receiver
            },
        };

        // An assembly task that panicked drops the sender and reads as failed
        let result = match receiver.wait_for(|state| !state.is_pending()).await {
            Ok(state) => state.view(),
            Err(_) => None,
        };
        result
    }

    /// Current state of an entry, without waiting
    pub fn state(&self, registry_url: &str) -> Option<EntryState> {
        self.entries
            .get(registry_url)
            .map(|receiver| receiver.borrow().clone())
    }

    /// Number of registries seen
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no registry has been seen
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests;
