//! The bounded, de-duplicated window of recent items.
//!
//! One producer (the poller) calls [`ItemCollection::add`]; any number of
//! HTTP handlers call [`ItemCollection::snapshot`] and friends at the same
//! time.  Every operation takes the same lock for its whole duration, so all
//! callers observe a single order of mutations and never see the window and
//! the id index out of step with each other.
//!
//! ```text
//!   poller ──add()──►  ┌──────────────────────────────┐
//!                      │ Mutex<Window>                │
//!                      │   items: VecDeque<Item>      │ ──snapshot()──► handlers
//!                      │   seen:  HashSet<String>     │
//!                      │   newest_id, last_modified   │
//!                      └──────────────────────────────┘
//! ```
//!
//! The lock is never held across I/O or an `.await`; the longest critical
//! section is the `O(capacity)` clone in `snapshot`.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::error::CollectionError;
use crate::source::Item;

/// Default number of items retained.
pub const DEFAULT_CAPACITY: usize = 50;

/// Largest capacity the configuration accepts.
pub const MAX_CAPACITY: usize = 10_000;

/// State guarded by the collection's lock.
#[derive(Debug)]
struct Window {
    /// Oldest first, in insertion order.
    items: VecDeque<Item>,
    /// Ids currently present in `items`.
    seen: HashSet<String>,
    /// Lexically greatest id ever added.  Survives eviction.
    newest_id: String,
    last_modified: DateTime<Utc>,
}

/// A concurrency-safe, fixed-capacity, insertion-ordered set of [`Item`]s.
#[derive(Debug)]
pub struct ItemCollection {
    capacity: usize,
    window: Mutex<Window>,
}

impl ItemCollection {
    /// Create an empty collection holding at most `capacity` items.
    pub fn new(capacity: usize) -> Result<Self, CollectionError> {
        if capacity == 0 {
            return Err(CollectionError::InvalidCapacity(capacity));
        }
        Ok(Self {
            capacity,
            window: Mutex::new(Window {
                items: VecDeque::new(),
                seen: HashSet::new(),
                newest_id: String::new(),
                last_modified: Utc::now(),
            }),
        })
    }

    // Every mutation below completes before anything that could panic, so a
    // poisoned lock still guards a consistent window.
    fn lock(&self) -> MutexGuard<'_, Window> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert `item` unless an item with the same id is already retained.
    ///
    /// Evicts from the oldest end to stay within capacity.  Returns `true`
    /// when the item was inserted, `false` for a duplicate.
    pub fn add(&self, item: Item) -> bool {
        let mut window = self.lock();
        if window.seen.contains(&item.id) {
            return false;
        }

        while window.items.len() >= self.capacity {
            match window.items.pop_front() {
                Some(evicted) => {
                    window.seen.remove(&evicted.id);
                }
                None => break,
            }
        }

        if window.newest_id.is_empty() || item.id > window.newest_id {
            window.newest_id.clone_from(&item.id);
        }
        window.seen.insert(item.id.clone());
        window.items.push_back(item);
        window.last_modified = Utc::now();
        true
    }

    /// Point-in-time copy of the retained items, oldest first.
    pub fn snapshot(&self) -> Vec<Item> {
        self.lock().items.iter().cloned().collect()
    }

    /// Snapshot and last-modified time read under one lock acquisition, so
    /// the timestamp always describes the returned window.
    pub fn snapshot_with_last_modified(&self) -> (Vec<Item>, DateTime<Utc>) {
        let window = self.lock();
        (window.items.iter().cloned().collect(), window.last_modified)
    }

    /// Greatest id ever added, or an empty string before the first add.
    pub fn newest_id(&self) -> String {
        self.lock().newest_id.clone()
    }

    /// Time of the last successful insertion, or of construction if nothing
    /// has been inserted yet.
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.lock().last_modified
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Check the window/index invariants.  Test builds only.
    #[cfg(test)]
    fn assert_consistent(&self) {
        let window = self.lock();
        assert!(window.items.len() <= self.capacity, "window over capacity");
        assert_eq!(window.items.len(), window.seen.len(), "index out of step");
        for item in &window.items {
            assert!(window.seen.contains(&item.id), "id {} missing from index", item.id);
            assert!(item.id <= window.newest_id, "newest_id behind retained id");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn make_item(id: &str) -> Item {
        Item::new("ferris", "Ferris", format!("post {id}"), "Wed Oct 10 20:19:24 +0000 2018", id)
    }

    fn ids(collection: &ItemCollection) -> Vec<String> {
        collection.snapshot().into_iter().map(|i| i.id).collect()
    }

    // -- construction --------------------------------------------------------

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(
            ItemCollection::new(0).unwrap_err(),
            CollectionError::InvalidCapacity(0)
        );
    }

    #[test]
    fn huge_capacity_allocates_lazily() {
        let collection = ItemCollection::new(usize::MAX).unwrap();
        assert_eq!(collection.capacity(), usize::MAX);
        assert!(collection.add(make_item("1")));
        assert_eq!(ids(&collection), ["1"]);
        collection.assert_consistent();
    }

    #[test]
    fn new_collection_starts_empty() {
        let before = Utc::now();
        let collection = ItemCollection::new(DEFAULT_CAPACITY).unwrap();
        assert_eq!(collection.len(), 0);
        assert!(collection.snapshot().is_empty());
        assert_eq!(collection.newest_id(), "");
        assert_eq!(collection.capacity(), 50);
        assert!(collection.last_modified() >= before);
        assert!(collection.last_modified() <= Utc::now());
    }

    // -- add -----------------------------------------------------------------

    #[test]
    fn add_appends_in_insertion_order() {
        let collection = ItemCollection::new(10).unwrap();
        for id in ["3", "1", "2"] {
            assert!(collection.add(make_item(id)));
        }
        assert_eq!(ids(&collection), ["3", "1", "2"]);
        collection.assert_consistent();
    }

    #[test]
    fn duplicate_add_is_a_noop() {
        let collection = ItemCollection::new(10).unwrap();
        assert!(collection.add(make_item("1")));
        let stamp = collection.last_modified();
        let before = collection.snapshot();

        let mut again = make_item("1");
        again.body = "different body, same id".into();
        assert!(!collection.add(again));

        assert_eq!(collection.snapshot(), before, "original copy is kept");
        assert_eq!(collection.last_modified(), stamp);
        collection.assert_consistent();
    }

    #[test]
    fn eviction_drops_oldest_inserted() {
        let collection = ItemCollection::new(2).unwrap();
        for id in ["1", "2", "3"] {
            collection.add(make_item(id));
        }
        assert_eq!(ids(&collection), ["2", "3"]);
        collection.assert_consistent();
    }

    #[test]
    fn eviction_ignores_source_timestamps() {
        let collection = ItemCollection::new(2).unwrap();
        let mut newer = make_item("a");
        newer.created_at = "Fri Jan 01 00:00:00 +0000 2027".into();
        let mut older = make_item("b");
        older.created_at = "Mon Jan 01 00:00:00 +0000 2001".into();

        collection.add(newer);
        collection.add(older);
        collection.add(make_item("c"));

        assert_eq!(ids(&collection), ["b", "c"]);
    }

    #[test]
    fn evicted_id_can_be_added_again() {
        let collection = ItemCollection::new(2).unwrap();
        for id in ["1", "2", "3"] {
            collection.add(make_item(id));
        }
        assert!(collection.add(make_item("1")), "evicted id is no longer seen");
        assert_eq!(ids(&collection), ["3", "1"]);
        collection.assert_consistent();
    }

    #[test]
    fn capacity_three_scenario() {
        let collection = ItemCollection::new(3).unwrap();
        for id in ["1", "2", "3", "4"] {
            collection.add(make_item(id));
        }
        assert_eq!(ids(&collection), ["2", "3", "4"]);
        assert_eq!(collection.newest_id(), "4");
    }

    #[test]
    fn never_exceeds_capacity() {
        let collection = ItemCollection::new(5).unwrap();
        for n in 0..100 {
            collection.add(make_item(&format!("{n:04}")));
            assert!(collection.len() <= 5);
        }
        assert_eq!(ids(&collection), ["0095", "0096", "0097", "0098", "0099"]);
        collection.assert_consistent();
    }

    #[test]
    fn empty_id_is_accepted_once() {
        let collection = ItemCollection::new(3).unwrap();
        assert!(collection.add(make_item("")));
        assert!(!collection.add(make_item("")));
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.newest_id(), "");
    }

    #[test]
    fn add_updates_last_modified() {
        let collection = ItemCollection::new(3).unwrap();
        let created = collection.last_modified();
        collection.add(make_item("1"));
        assert!(collection.last_modified() >= created);
    }

    // -- newest_id -----------------------------------------------------------

    #[test]
    fn newest_id_is_monotonic() {
        let collection = ItemCollection::new(10).unwrap();
        collection.add(make_item("100"));
        assert_eq!(collection.newest_id(), "100");
        collection.add(make_item("101"));
        assert_eq!(collection.newest_id(), "101");
        collection.add(make_item("099"));
        assert_eq!(collection.newest_id(), "101");
    }

    #[test]
    fn newest_id_survives_eviction() {
        let collection = ItemCollection::new(1).unwrap();
        collection.add(make_item("9"));
        collection.add(make_item("1"));
        assert_eq!(ids(&collection), ["1"]);
        assert_eq!(collection.newest_id(), "9");
    }

    #[test]
    fn newest_id_is_lexical() {
        let collection = ItemCollection::new(10).unwrap();
        collection.add(make_item("9"));
        collection.add(make_item("10"));
        assert_eq!(collection.newest_id(), "9");
    }

    // -- snapshot ------------------------------------------------------------

    #[test]
    fn snapshot_is_detached_from_later_adds() {
        let collection = ItemCollection::new(2).unwrap();
        collection.add(make_item("1"));
        let snap = collection.snapshot();
        collection.add(make_item("2"));
        collection.add(make_item("3"));
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].id, "1");
    }

    #[test]
    fn snapshot_with_last_modified_matches_separate_reads() {
        let collection = ItemCollection::new(2).unwrap();
        collection.add(make_item("1"));
        let (items, stamp) = collection.snapshot_with_last_modified();
        assert_eq!(items, collection.snapshot());
        assert_eq!(stamp, collection.last_modified());
    }

    // -- concurrency ---------------------------------------------------------

    #[test]
    fn concurrent_writers_keep_invariants() {
        const WRITERS: usize = 8;
        const PER_WRITER: usize = 200;
        let collection = ItemCollection::new(64).unwrap();

        std::thread::scope(|s| {
            for w in 0..WRITERS {
                let collection = &collection;
                s.spawn(move || {
                    for n in 0..PER_WRITER {
                        // Every writer also races on a shared id.
                        collection.add(make_item(&format!("{w}-{n:04}")));
                        collection.add(make_item("shared"));
                    }
                });
            }
            for _ in 0..4 {
                let collection = &collection;
                s.spawn(move || {
                    for _ in 0..PER_WRITER {
                        let snap = collection.snapshot();
                        assert!(snap.len() <= 64);
                        let unique: HashSet<_> = snap.iter().map(|i| &i.id).collect();
                        assert_eq!(unique.len(), snap.len(), "duplicate id in snapshot");
                        let _ = collection.newest_id();
                    }
                });
            }
        });

        assert_eq!(collection.len(), 64);
        assert_eq!(collection.newest_id(), "shared");
        collection.assert_consistent();
    }

    #[test]
    fn concurrent_distinct_adds_below_capacity_are_all_kept() {
        const WRITERS: usize = 4;
        const PER_WRITER: usize = 25;
        let collection = Arc::new(ItemCollection::new(WRITERS * PER_WRITER).unwrap());

        let handles: Vec<_> = (0..WRITERS)
            .map(|w| {
                let collection = Arc::clone(&collection);
                std::thread::spawn(move || {
                    for n in 0..PER_WRITER {
                        assert!(collection.add(make_item(&format!("{w}:{n:02}"))));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(collection.len(), WRITERS * PER_WRITER, "no lost updates");
        assert_eq!(collection.newest_id(), "3:24");
        collection.assert_consistent();
    }
}
