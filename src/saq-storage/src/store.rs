//! The in-memory object store.
//!
//! The store owns the merged set of SAOs across all providers, plus the
//! secondary indexes the optimizer's fast paths rely on. Mutation happens
//! only through whole-provider replacement: a write rebuilds a fresh
//! [`StoreIndex`] and swaps it in behind the lock, so readers holding a
//! snapshot never observe a partial update.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use saq_core::{ObjectList, SaObject};

/// Fully qualified object identity: `(type, id, source)`.
pub type ObjectKey = (String, String, String);

/// Logical object identity: `(type, id)`.
pub type LogicalKey = (String, String);

/// An immutable, internally consistent view of the store.
///
/// Queries evaluate against one `StoreIndex` for their whole duration;
/// provider updates build a new index and swap the root `Arc`.
#[derive(Debug, Default)]
pub struct StoreIndex {
    /// Contribution per provider, in provider registration order.
    providers: IndexMap<String, Vec<Arc<SaObject>>>,
    /// All objects in provider-then-contribution order.
    all: ObjectList,
    /// Primary storage: one entry per `(type, id, source)` triple.
    by_key: HashMap<ObjectKey, Arc<SaObject>>,
    /// Logical identity: objects sharing `(type, id)` across sources.
    by_logical: HashMap<LogicalKey, Vec<Arc<SaObject>>>,
    /// Type index.
    by_type: HashMap<String, Vec<Arc<SaObject>>>,
    /// Id index.
    by_id: HashMap<String, Vec<Arc<SaObject>>>,
}

impl StoreIndex {
    fn build(providers: IndexMap<String, Vec<Arc<SaObject>>>) -> Self {
        let mut all = ObjectList::empty();
        let mut by_key: HashMap<ObjectKey, Arc<SaObject>> = HashMap::new();
        let mut by_logical: HashMap<LogicalKey, Vec<Arc<SaObject>>> = HashMap::new();
        let mut by_type: HashMap<String, Vec<Arc<SaObject>>> = HashMap::new();
        let mut by_id: HashMap<String, Vec<Arc<SaObject>>> = HashMap::new();

        for objects in providers.values() {
            for obj in objects {
                all.push(Arc::clone(obj));
                for (type_name, id, source) in obj.unique_keys() {
                    by_logical
                        .entry((type_name.clone(), id.clone()))
                        .or_default()
                        .push(Arc::clone(obj));
                    by_key.insert((type_name, id, source), Arc::clone(obj));
                }
                for type_name in obj.types() {
                    by_type
                        .entry(type_name.to_string())
                        .or_default()
                        .push(Arc::clone(obj));
                }
                by_id
                    .entry(obj.id().to_string())
                    .or_default()
                    .push(Arc::clone(obj));
            }
        }

        Self {
            providers,
            all,
            by_key,
            by_logical,
            by_type,
            by_id,
        }
    }

    /// All objects, in provider-then-contribution order.
    pub fn all(&self) -> &ObjectList {
        &self.all
    }

    /// Total object count.
    pub fn len(&self) -> usize {
        self.all.len()
    }

    /// Whether the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// Registered provider names, in registration order.
    pub fn provider_names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    /// A provider's current contribution.
    pub fn provider_objects(&self, source: &str) -> Option<&[Arc<SaObject>]> {
        self.providers.get(source).map(Vec::as_slice)
    }

    /// Primary lookup by fully qualified identity.
    pub fn get(&self, type_name: &str, id: &str, source: &str) -> Option<&Arc<SaObject>> {
        self.by_key
            .get(&(type_name.to_string(), id.to_string(), source.to_string()))
    }

    /// Objects carrying `type_name`.
    pub fn objects_of_type(&self, type_name: &str) -> ObjectList {
        self.by_type
            .get(type_name)
            .map_or_else(ObjectList::empty, |objs| objs.iter().cloned().collect())
    }

    /// Objects with id `id` (any type, any source).
    pub fn objects_with_id(&self, id: &str) -> ObjectList {
        self.by_id
            .get(id)
            .map_or_else(ObjectList::empty, |objs| objs.iter().cloned().collect())
    }

    /// Objects sharing the logical identity `(type, id)` across sources.
    pub fn logical_group(&self, type_name: &str, id: &str) -> ObjectList {
        self.by_logical
            .get(&(type_name.to_string(), id.to_string()))
            .map_or_else(ObjectList::empty, |objs| objs.iter().cloned().collect())
    }

    /// Iterate the primary index.
    pub fn keys(&self) -> impl Iterator<Item = &ObjectKey> {
        self.by_key.keys()
    }
}

/// A shared snapshot of the store.
pub type StoreSnapshot = Arc<StoreIndex>;

/// The process-wide object store.
///
/// Handed to the runtime as an explicit handle so tests can instantiate
/// isolated stores.
#[derive(Debug)]
pub struct SaoStore {
    index: RwLock<StoreSnapshot>,
}

impl SaoStore {
    /// Create an empty store with no providers.
    pub fn new() -> Self {
        Self {
            index: RwLock::new(Arc::new(StoreIndex::default())),
        }
    }

    /// Take a consistent snapshot for query evaluation.
    pub fn snapshot(&self) -> StoreSnapshot {
        Arc::clone(&self.index.read())
    }

    /// Register `source` with an empty contribution, preserving first-seen
    /// provider order even before its first successful fetch.
    pub fn register_provider(&self, source: &str) {
        let mut guard = self.index.write();
        if guard.providers.contains_key(source) {
            return;
        }
        let mut providers = guard.providers.clone();
        providers.insert(source.to_string(), Vec::new());
        *guard = Arc::new(StoreIndex::build(providers));
    }

    /// Atomically replace `source`'s entire contribution.
    ///
    /// Objects whose `(type, id, source)` triples collide with an earlier
    /// object in the same contribution are dropped (first occurrence wins).
    pub fn replace_provider(&self, source: &str, objects: Vec<SaObject>) {
        let deduped = dedupe(objects);

        let mut guard = self.index.write();
        let mut providers = guard.providers.clone();
        providers.insert(source.to_string(), deduped);
        *guard = Arc::new(StoreIndex::build(providers));
    }

    /// Degrade `source` to an empty contribution.
    pub fn clear_provider(&self, source: &str) {
        self.replace_provider(source, Vec::new());
    }
}

impl Default for SaoStore {
    fn default() -> Self {
        Self::new()
    }
}

fn dedupe(objects: Vec<SaObject>) -> Vec<Arc<SaObject>> {
    let mut seen: Vec<ObjectKey> = Vec::new();
    let mut out = Vec::with_capacity(objects.len());
    for obj in objects {
        let keys: Vec<ObjectKey> = obj.unique_keys().collect();
        if keys.iter().any(|k| seen.contains(k)) {
            continue;
        }
        seen.extend(keys);
        out.push(Arc::new(obj));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person(id: &str, source: &str, types: &[&str]) -> SaObject {
        SaObject::from_json(json!({
            "__id__": id,
            "__source__": source,
            "__types__": types,
        }))
        .unwrap()
    }

    #[test]
    fn test_replace_and_indexes() {
        let store = SaoStore::new();
        store.replace_provider(
            "hr",
            vec![
                person("a", "hr", &["person", "employee"]),
                person("b", "hr", &["person"]),
            ],
        );

        let snap = store.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.objects_of_type("person").len(), 2);
        assert_eq!(snap.objects_of_type("employee").len(), 1);
        assert_eq!(snap.objects_with_id("a").len(), 1);
        assert!(snap.get("person", "a", "hr").is_some());
        assert!(snap.get("person", "a", "it").is_none());
        assert_eq!(snap.logical_group("person", "a").len(), 1);
    }

    #[test]
    fn test_duplicate_contribution_collapses() {
        let store = SaoStore::new();
        store.replace_provider(
            "hr",
            vec![
                person("a", "hr", &["person", "employee"]),
                person("a", "hr", &["person", "employee"]),
            ],
        );
        assert_eq!(store.snapshot().objects_of_type("person").len(), 1);
    }

    #[test]
    fn test_replace_is_whole_contribution() {
        let store = SaoStore::new();
        store.replace_provider("hr", vec![person("a", "hr", &["person"])]);
        store.replace_provider("hr", vec![person("b", "hr", &["person"])]);

        let snap = store.snapshot();
        assert_eq!(snap.len(), 1);
        assert!(snap.objects_with_id("a").is_empty());
        assert_eq!(snap.objects_with_id("b").len(), 1);
    }

    #[test]
    fn test_snapshot_isolation_across_writes() {
        let store = SaoStore::new();
        store.replace_provider("hr", vec![person("a", "hr", &["person"])]);

        let before = store.snapshot();
        store.replace_provider("hr", vec![person("b", "hr", &["person"])]);
        let after = store.snapshot();

        assert_eq!(before.objects_with_id("a").len(), 1);
        assert!(before.objects_with_id("b").is_empty());
        assert_eq!(after.objects_with_id("b").len(), 1);
    }

    #[test]
    fn test_logical_group_spans_sources() {
        let store = SaoStore::new();
        store.replace_provider("hr", vec![person("a", "hr", &["person"])]);
        store.replace_provider("it", vec![person("a", "it", &["person"])]);

        let snap = store.snapshot();
        assert_eq!(snap.logical_group("person", "a").len(), 2);
        assert_eq!(snap.objects_with_id("a").len(), 2);
        assert_eq!(snap.provider_names().collect::<Vec<_>>(), ["hr", "it"]);
    }

    #[test]
    fn test_clear_provider_keeps_registration() {
        let store = SaoStore::new();
        store.replace_provider("hr", vec![person("a", "hr", &["person"])]);
        store.clear_provider("hr");

        let snap = store.snapshot();
        assert!(snap.is_empty());
        assert_eq!(snap.provider_names().collect::<Vec<_>>(), ["hr"]);
    }

    #[test]
    fn test_snapshots_stay_consistent_under_concurrent_writes() {
        let store = Arc::new(SaoStore::new());
        store.replace_provider("hr", vec![person("a", "hr", &["person"])]);

        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 0..200 {
                    let id = format!("w{}", i % 7);
                    store.replace_provider("it", vec![person(&id, "it", &["person"])]);
                }
            })
        };

        for _ in 0..200 {
            let snap = store.snapshot();
            // Whatever state was committed, the snapshot's indexes agree
            // with its object set for the whole read.
            assert_eq!(snap.objects_of_type("person").len(), snap.len());
            assert!(snap.len() >= 1 && snap.len() <= 2);
        }
        writer.join().unwrap();
    }

    #[test]
    fn test_register_provider_is_idempotent() {
        let store = SaoStore::new();
        store.register_provider("hr");
        store.replace_provider("hr", vec![person("a", "hr", &["person"])]);
        store.register_provider("hr");
        assert_eq!(store.snapshot().len(), 1);
    }
}
