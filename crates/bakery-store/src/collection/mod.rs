//! # Collection Module
//!
//! One insertion-ordered, identity-keyed collection per entity kind.
//!
//! ## Copy-on-Write Snapshots
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How a Mutation Is Published                          │
//! │                                                                         │
//! │  upsert_one(order)                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  watch::Sender::send_if_modified   ← holds the channel's write lock     │
//! │       │                                                                 │
//! │       ├── identical entity?  ──► return false (no one is woken)        │
//! │       │                                                                 │
//! │       └── changed ──► clone Vec, replace slot, swap in new Arc<Vec>    │
//! │                          │                                              │
//! │                          ▼                                              │
//! │              every Receiver sees has_changed() == true                  │
//! │              and the old Arc is untouched for readers holding it        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Mutations never await. Each one runs entirely inside the watch channel's
//! write lock, so no other caller observes a half-applied change.
//!
//! ## Available Collections
//!
//! - [`order`] - order-specific queries on `Collection<Order>`

pub mod order;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

use bakery_core::{Customer, Order, Product, Shipper, StaffUser};

use crate::error::{StoreError, StoreResult};

// =============================================================================
// Entity
// =============================================================================

/// An entity the store can hold.
///
/// Identity is the server-assigned `id`. Equality (`PartialEq`) decides
/// whether an upsert is a real change.
pub trait Entity:
    Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Name used in logs and errors.
    const KIND: &'static str;

    fn id(&self) -> &str;
}

impl Entity for Order {
    const KIND: &'static str = "order";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Customer {
    const KIND: &'static str = "customer";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Product {
    const KIND: &'static str = "product";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Shipper {
    const KIND: &'static str = "shipper";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for StaffUser {
    const KIND: &'static str = "user";

    fn id(&self) -> &str {
        &self.id
    }
}

// =============================================================================
// Upsert Outcome
// =============================================================================

/// What `upsert_one` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// New identity, appended at the end.
    Inserted,
    /// Existing identity, replaced in place.
    Replaced,
    /// Existing identity with identical data. Subscribers were not woken.
    Unchanged,
    /// The entity had an empty id and was not stored.
    Ignored,
}

impl UpsertOutcome {
    /// Whether subscribers were notified.
    pub fn changed(&self) -> bool {
        matches!(self, UpsertOutcome::Inserted | UpsertOutcome::Replaced)
    }
}

// =============================================================================
// Collection
// =============================================================================

/// Insertion-ordered collection of one entity kind.
///
/// ## Usage
/// ```rust,ignore
/// let orders = store.orders();
/// let mut rx = orders.subscribe();
///
/// orders.upsert_one(order.clone());   // Inserted, rx wakes
/// orders.upsert_one(order);           // Unchanged, rx stays quiet
/// orders.remove_one("ORD-1");
/// orders.remove_one("ORD-1");         // false, not an error
/// ```
pub struct Collection<T: Entity> {
    tx: watch::Sender<Arc<Vec<T>>>,
}

impl<T: Entity> Collection<T> {
    /// Creates an empty collection.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(Vec::new()));
        Collection { tx }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// The current snapshot. Cheap: clones an `Arc`.
    pub fn snapshot(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.tx.borrow())
    }

    /// A receiver that wakes on every effective mutation.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<T>>> {
        self.tx.subscribe()
    }

    pub fn get(&self, id: &str) -> Option<T> {
        self.tx.borrow().iter().find(|e| e.id() == id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tx.borrow().iter().any(|e| e.id() == id)
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Replaces the whole collection. No merge.
    ///
    /// Subscribers are not woken when `items` equals the current contents.
    pub fn set_all(&self, items: Vec<T>) {
        let count = items.len();
        let changed = self.tx.send_if_modified(|current| {
            if current.as_slice() == items.as_slice() {
                return false;
            }
            *current = Arc::new(items);
            true
        });
        debug!(entity = T::KIND, count, changed, "Collection replaced");
    }

    /// Inserts `item` if its id is unseen, otherwise replaces the existing
    /// entry at the same position.
    ///
    /// Applying the same value twice is a no-op the second time: no duplicate
    /// entry and no second notification.
    pub fn upsert_one(&self, item: T) -> UpsertOutcome {
        if item.id().is_empty() {
            warn!(entity = T::KIND, "Ignoring upsert of entity without id");
            return UpsertOutcome::Ignored;
        }

        let id = item.id().to_string();
        let mut outcome = UpsertOutcome::Unchanged;

        self.tx.send_if_modified(|current| {
            match current.iter().position(|e| e.id() == item.id()) {
                Some(index) if current[index] == item => false,
                Some(index) => {
                    let mut next = (**current).clone();
                    next[index] = item;
                    *current = Arc::new(next);
                    outcome = UpsertOutcome::Replaced;
                    true
                }
                None => {
                    let mut next = (**current).clone();
                    next.push(item);
                    *current = Arc::new(next);
                    outcome = UpsertOutcome::Inserted;
                    true
                }
            }
        });

        debug!(entity = T::KIND, id = %id, ?outcome, "Upserted");
        outcome
    }

    /// Removes the entry with `id`. Returns whether anything was removed.
    ///
    /// Removing an absent id is not an error: a delete broadcast may arrive
    /// after this client already removed the entry itself.
    pub fn remove_one(&self, id: &str) -> bool {
        let removed = self.tx.send_if_modified(|current| {
            match current.iter().position(|e| e.id() == id) {
                Some(index) => {
                    let mut next = (**current).clone();
                    next.remove(index);
                    *current = Arc::new(next);
                    true
                }
                None => false,
            }
        });

        debug!(entity = T::KIND, id = %id, removed, "Removed");
        removed
    }

    /// Shallow-merges top-level `fields` into the entry with `id`.
    ///
    /// ## Returns
    /// - `Ok(true)` when the entry changed
    /// - `Ok(false)` when `id` is absent or the merge changed nothing
    /// - `Err` when the merged value is not a valid entity; the entry is kept
    pub fn patch_one(&self, id: &str, fields: &Map<String, Value>) -> StoreResult<bool> {
        if let Some(Value::String(attempted)) = fields.get("id") {
            if attempted != id {
                return Err(StoreError::IdentityChange {
                    entity: T::KIND,
                    id: id.to_string(),
                    attempted: attempted.clone(),
                });
            }
        }

        let mut result = Ok(false);

        self.tx.send_if_modified(|current| {
            let Some(index) = current.iter().position(|e| e.id() == id) else {
                return false;
            };

            let merged = match merge_fields(&current[index], fields) {
                Ok(merged) => merged,
                Err(err) => {
                    result = Err(err);
                    return false;
                }
            };

            if merged == current[index] {
                return false;
            }

            let mut next = (**current).clone();
            next[index] = merged;
            *current = Arc::new(next);
            result = Ok(true);
            true
        });

        match &result {
            Ok(changed) => debug!(entity = T::KIND, id = %id, changed, "Patched"),
            Err(err) => warn!(entity = T::KIND, id = %id, error = %err, "Patch rejected"),
        }
        result
    }

    /// [`Collection::patch_one`] with a typed patch.
    ///
    /// `patch` must serialize to a JSON object; fields it skips are left alone.
    pub fn patch_with<P: Serialize>(&self, id: &str, patch: &P) -> StoreResult<bool> {
        match serde_json::to_value(patch)? {
            Value::Object(fields) => self.patch_one(id, &fields),
            _ => Err(StoreError::PatchNotObject { entity: T::KIND }),
        }
    }

    /// Empties the collection.
    pub fn clear(&self) {
        self.set_all(Vec::new());
    }
}

impl<T: Entity> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> std::fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("entity", &T::KIND)
            .field("len", &self.len())
            .finish()
    }
}

fn merge_fields<T: Entity>(entity: &T, fields: &Map<String, Value>) -> StoreResult<T> {
    let mut value = serde_json::to_value(entity)?;
    let Value::Object(target) = &mut value else {
        return Err(StoreError::PatchNotObject { entity: T::KIND });
    };

    for (key, field) in fields {
        target.insert(key.clone(), field.clone());
    }

    serde_json::from_value(value).map_err(|err| StoreError::PatchRejected {
        entity: T::KIND,
        id: entity.id().to_string(),
        reason: err.to_string(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shipper(id: &str, name: &str) -> Shipper {
        Shipper {
            id: id.to_string(),
            name: name.to_string(),
            phone: "0900000000".to_string(),
            messaging_handle: None,
            is_active: true,
        }
    }

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn ids(collection: &Collection<Shipper>) -> Vec<String> {
        collection.snapshot().iter().map(|s| s.id.clone()).collect()
    }

    #[test]
    fn test_upsert_inserts_then_replaces_in_place() {
        let shippers = Collection::new();
        assert_eq!(shippers.upsert_one(shipper("a", "An")), UpsertOutcome::Inserted);
        assert_eq!(shippers.upsert_one(shipper("b", "Binh")), UpsertOutcome::Inserted);
        assert_eq!(shippers.upsert_one(shipper("c", "Cuong")), UpsertOutcome::Inserted);

        assert_eq!(
            shippers.upsert_one(shipper("b", "Binh Nguyen")),
            UpsertOutcome::Replaced
        );
        assert_eq!(ids(&shippers), vec!["a", "b", "c"]);
        assert_eq!(shippers.get("b").unwrap().name, "Binh Nguyen");
    }

    #[test]
    fn test_upsert_is_idempotent_and_quiet() {
        let shippers = Collection::new();
        let mut rx = shippers.subscribe();

        shippers.upsert_one(shipper("a", "An"));
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        let before = shippers.snapshot();
        assert_eq!(shippers.upsert_one(shipper("a", "An")), UpsertOutcome::Unchanged);

        assert_eq!(shippers.len(), 1);
        assert!(!rx.has_changed().unwrap());
        assert!(Arc::ptr_eq(&before, &shippers.snapshot()));
    }

    #[test]
    fn test_upsert_without_id_is_ignored() {
        let shippers = Collection::new();
        assert_eq!(shippers.upsert_one(shipper("", "Nobody")), UpsertOutcome::Ignored);
        assert!(shippers.is_empty());
    }

    #[test]
    fn test_mutation_produces_new_snapshot() {
        let shippers = Collection::new();
        shippers.upsert_one(shipper("a", "An"));
        let before = shippers.snapshot();

        shippers.upsert_one(shipper("a", "An Tran"));
        let after = shippers.snapshot();

        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before[0].name, "An");
        assert_eq!(after[0].name, "An Tran");
    }

    #[test]
    fn test_remove_twice_is_noop() {
        let shippers = Collection::new();
        shippers.upsert_one(shipper("a", "An"));
        shippers.upsert_one(shipper("b", "Binh"));

        assert!(shippers.remove_one("a"));
        let mut rx = shippers.subscribe();
        assert!(!shippers.remove_one("a"));

        assert!(!rx.has_changed().unwrap());
        assert_eq!(ids(&shippers), vec!["b"]);
    }

    #[test]
    fn test_set_all_replaces_wholesale() {
        let shippers = Collection::new();
        shippers.upsert_one(shipper("a", "An"));

        shippers.set_all(vec![shipper("x", "Xuan"), shipper("y", "Yen")]);
        assert_eq!(ids(&shippers), vec!["x", "y"]);
        assert!(shippers.get("a").is_none());

        let mut rx = shippers.subscribe();
        shippers.set_all(vec![shipper("x", "Xuan"), shipper("y", "Yen")]);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_patch_merges_top_level_fields() {
        let shippers = Collection::new();
        shippers.upsert_one(shipper("a", "An"));

        let changed = shippers
            .patch_one("a", &fields(json!({ "messagingHandle": "@an", "isActive": false })))
            .unwrap();

        assert!(changed);
        let patched = shippers.get("a").unwrap();
        assert_eq!(patched.messaging_handle.as_deref(), Some("@an"));
        assert!(!patched.is_active);
        assert_eq!(patched.name, "An");
    }

    #[test]
    fn test_patch_absent_is_silent_noop() {
        let shippers: Collection<Shipper> = Collection::new();
        let mut rx = shippers.subscribe();

        let changed = shippers
            .patch_one("ghost", &fields(json!({ "name": "Ghost" })))
            .unwrap();

        assert!(!changed);
        assert!(!rx.has_changed().unwrap());
        assert!(shippers.is_empty());
    }

    #[test]
    fn test_patch_with_bad_type_keeps_entry() {
        let shippers = Collection::new();
        shippers.upsert_one(shipper("a", "An"));

        let err = shippers
            .patch_one("a", &fields(json!({ "isActive": "nope" })))
            .unwrap_err();

        assert!(matches!(err, StoreError::PatchRejected { .. }));
        assert!(shippers.get("a").unwrap().is_active);
    }

    #[test]
    fn test_patch_cannot_change_identity() {
        let shippers = Collection::new();
        shippers.upsert_one(shipper("a", "An"));

        let err = shippers
            .patch_one("a", &fields(json!({ "id": "b" })))
            .unwrap_err();
        assert!(matches!(err, StoreError::IdentityChange { .. }));
        assert!(shippers.contains("a"));
    }

    #[test]
    fn test_patch_with_typed_struct() {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Rename<'a> {
            name: &'a str,
        }

        let shippers = Collection::new();
        shippers.upsert_one(shipper("a", "An"));
        assert!(shippers.patch_with("a", &Rename { name: "An Le" }).unwrap());
        assert_eq!(shippers.get("a").unwrap().name, "An Le");

        let err = shippers.patch_with("a", &"not an object").unwrap_err();
        assert!(matches!(err, StoreError::PatchNotObject { .. }));
    }

    #[tokio::test]
    async fn test_subscriber_wakes_on_change() {
        let shippers = Arc::new(Collection::new());
        let mut rx = shippers.subscribe();

        let writer = Arc::clone(&shippers);
        tokio::spawn(async move {
            writer.upsert_one(shipper("a", "An"));
        });

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 1);
    }
}
