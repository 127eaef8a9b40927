// Artifactory MCP Gateway - Handle Store
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Registry of opaque server-side objects exchanged with callers as short
// string ids. One lock guards the counter and the map together, so the
// increment-then-insert sequence is atomic. Ids are never reused: a stale
// id held by a client fails deterministically instead of resolving to an
// unrelated object.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::bridge::BridgeObject;
use crate::errors::BridgeError;
use crate::models::{DropHandleResult, HandleInfo};

struct StoredHandle {
    object: Arc<dyn BridgeObject>,
    class_name: String,
    // Rendered once at insertion. Not refreshed if the object mutates.
    summary: String,
    seq: u64,
}

#[derive(Default)]
struct Inner {
    items: HashMap<String, StoredHandle>,
    counter: u64,
}

/// Concurrency-safe handle registry. The store holds the only strong
/// reference a caller can reach; dropping the entry releases the object.
#[derive(Default)]
pub struct HandleStore {
    inner: Mutex<Inner>,
}

impl HandleStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic mid-operation never leaves the map half-written, so a
        // poisoned lock is still safe to reuse.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register an object and return its new id.
    pub fn put(&self, object: Arc<dyn BridgeObject>) -> String {
        let mut inner = self.lock();
        inner.counter += 1;
        let handle_id = format!("h{}", inner.counter);
        let seq = inner.counter;
        inner.items.insert(
            handle_id.clone(),
            StoredHandle {
                class_name: object.class_name().to_string(),
                summary: object.summary(),
                object,
                seq,
            },
        );
        handle_id
    }

    pub fn get(&self, handle_id: &str) -> Result<Arc<dyn BridgeObject>, BridgeError> {
        let inner = self.lock();
        match inner.items.get(handle_id) {
            Some(stored) => Ok(Arc::clone(&stored.object)),
            None => Err(BridgeError::not_found(format!(
                "Unknown handle_id {:?}.",
                handle_id
            ))),
        }
    }

    /// Remove an entry, reporting whether it was present. Never fails.
    pub fn drop_id(&self, handle_id: &str) -> bool {
        self.lock().items.remove(handle_id).is_some()
    }

    /// Snapshot of live handles, in insertion order.
    pub fn list(&self) -> Vec<HandleInfo> {
        let inner = self.lock();
        let mut entries: Vec<&StoredHandle> = inner.items.values().collect();
        entries.sort_by_key(|stored| stored.seq);
        entries
            .iter()
            .map(|stored| HandleInfo {
                handle_id: format!("h{}", stored.seq),
                class_name: stored.class_name.clone(),
                summary: stored.summary.clone(),
            })
            .collect()
    }

    pub fn count(&self) -> usize {
        self.lock().items.len()
    }
}

/// Idempotent drop: the desired post-state ("handle absent") is always
/// achieved, so dropped is always true and existed reports the prior state.
pub fn drop_handle(store: &HandleStore, handle_id: &str) -> Result<DropHandleResult, BridgeError> {
    let normalized = handle_id.trim();
    if normalized.is_empty() {
        return Err(BridgeError::validation("handle_id cannot be empty."));
    }

    let existed = store.drop_id(normalized);
    Ok(DropHandleResult {
        handle_id: normalized.to_string(),
        dropped: true,
        existed,
        remaining_handles: store.count(),
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{CallArgs, CallOutcome, MemberSpec};

    struct Marker;

    impl BridgeObject for Marker {
        fn class_name(&self) -> &'static str {
            "Marker"
        }
        fn summary(&self) -> String {
            "Marker()".to_string()
        }
        fn members(&self) -> &'static [MemberSpec] {
            &[]
        }
        fn call(&self, name: &str, _args: CallArgs) -> Result<CallOutcome, BridgeError> {
            Err(BridgeError::not_found(format!("Method {:?} not found.", name)))
        }
    }

    #[test]
    fn ids_are_distinct_and_monotonic() {
        let store = HandleStore::new();
        let first = store.put(Arc::new(Marker));
        let second = store.put(Arc::new(Marker));
        assert_eq!(first, "h1");
        assert_eq!(second, "h2");
    }

    #[test]
    fn get_returns_same_object_until_dropped() {
        let store = HandleStore::new();
        let object: Arc<dyn BridgeObject> = Arc::new(Marker);
        let id = store.put(Arc::clone(&object));

        let fetched = store.get(&id).unwrap();
        assert!(Arc::ptr_eq(&fetched, &object), "get must return the stored object");

        assert!(store.drop_id(&id));
        assert!(store.get(&id).is_err(), "dropped handle must not resolve");
    }

    #[test]
    fn ids_never_reused_after_drop() {
        let store = HandleStore::new();
        let first = store.put(Arc::new(Marker));
        store.drop_id(&first);
        let second = store.put(Arc::new(Marker));
        assert_ne!(first, second, "counter must not rewind on removal");
    }

    #[test]
    fn drop_handle_is_idempotent_and_reports_existence() {
        let store = HandleStore::new();
        let id = store.put(Arc::new(Marker));

        let first = drop_handle(&store, &id).unwrap();
        let second = drop_handle(&store, &id).unwrap();

        assert!(first.dropped);
        assert!(first.existed);
        assert_eq!(first.remaining_handles, 0);

        assert!(second.dropped);
        assert!(!second.existed);
        assert_eq!(second.remaining_handles, 0);
    }

    #[test]
    fn drop_handle_rejects_empty_id() {
        let store = HandleStore::new();
        let err = drop_handle(&store, "   ").unwrap_err();
        assert!(
            err.to_string().contains("handle_id cannot be empty"),
            "got: {}",
            err
        );
    }

    #[test]
    fn list_reports_class_and_summary_in_insertion_order() {
        let store = HandleStore::new();
        store.put(Arc::new(Marker));
        store.put(Arc::new(Marker));

        let listed = store.list();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].handle_id, "h1");
        assert_eq!(listed[1].handle_id, "h2");
        assert_eq!(listed[0].class_name, "Marker");
        assert_eq!(listed[0].summary, "Marker()");
    }

    #[test]
    fn concurrent_puts_never_collide() {
        let store = Arc::new(HandleStore::new());
        let mut threads = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            threads.push(std::thread::spawn(move || {
                let mut ids = Vec::new();
                for _ in 0..50 {
                    ids.push(store.put(Arc::new(Marker)));
                }
                ids
            }));
        }

        let mut all_ids: Vec<String> = Vec::new();
        for thread in threads {
            all_ids.extend(thread.join().unwrap());
        }
        all_ids.sort();
        all_ids.dedup();
        assert_eq!(all_ids.len(), 400, "every put must yield a unique id");
        assert_eq!(store.count(), 400);
    }
}
