//! Responsibility-chain table
//!
//! Maps the identity of a trackable object to its [`ChainLink`]. The table
//! never owns trackable objects: each entry keeps a weak [`Liveness`] handle
//! to its owner, and [`ResponsibilityChain::cleanup`] evicts the entries whose
//! owner is gone. Nothing is evicted automatically when an owner is dropped,
//! so callers should sweep periodically.

use crate::chain::ChainLink;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError, Weak};

/// Identity of a trackable object: the address of its `Arc` allocation
///
/// An address can be reused once the object and every weak handle to it are
/// gone, so an identity is only meaningful together with a [`Liveness`] handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectIdentity(usize);

impl ObjectIdentity {
    pub fn of<T: ?Sized>(owner: &Arc<T>) -> Self {
        Self(Arc::as_ptr(owner) as *const () as usize)
    }
}

impl fmt::Display for ObjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

/// Weak handle to the owner of a table entry
#[derive(Clone)]
pub struct Liveness(Weak<dyn Any + Send + Sync>);

impl Liveness {
    pub fn of<T: Any + Send + Sync>(owner: &Arc<T>) -> Self {
        let weak = Arc::downgrade(owner);
        Self(weak)
    }

    /// True while the owner still exists
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl fmt::Debug for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Liveness").field(&self.is_alive()).finish()
    }
}

struct ChainEntry {
    link: Arc<ChainLink>,
    liveness: Liveness,
}

static GLOBAL: LazyLock<ResponsibilityChain> = LazyLock::new(ResponsibilityChain::new);

/// Identity-keyed registry of chain links
#[derive(Default)]
pub struct ResponsibilityChain {
    entries: Mutex<HashMap<ObjectIdentity, ChainEntry>>,
}

impl ResponsibilityChain {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide table used by trackable objects
    pub fn global() -> &'static ResponsibilityChain {
        &GLOBAL
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<ObjectIdentity, ChainEntry>> {
        // Entries stay consistent across a panic elsewhere; keep serving them
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store or replace the link for `identity`
    pub fn register(&self, identity: ObjectIdentity, liveness: Liveness, link: ChainLink) -> Arc<ChainLink> {
        let link = Arc::new(link);
        let previous = self.entries().insert(
            identity,
            ChainEntry {
                link: Arc::clone(&link),
                liveness,
            },
        );
        match previous {
            Some(_) => log::debug!("Replaced chain link for {}", identity),
            None => log::debug!("Registered chain link for {}", identity),
        }
        link
    }

    /// Register `link` unless `identity` already has a live entry
    ///
    /// Check and insert happen under one lock. Returns whichever link ends up
    /// in the table.
    pub fn register_if_absent(&self, identity: ObjectIdentity, liveness: Liveness, link: ChainLink) -> Arc<ChainLink> {
        let mut entries = self.entries();
        if let Some(entry) = entries.get(&identity).filter(|entry| entry.liveness.is_alive()) {
            return Arc::clone(&entry.link);
        }

        let link = Arc::new(link);
        let stale = entries.insert(
            identity,
            ChainEntry {
                link: Arc::clone(&link),
                liveness,
            },
        );
        drop(entries);

        log::debug!("Registered chain link for {}", identity);
        drop(stale);
        link
    }

    /// Current link for `identity`
    ///
    /// Entries whose owner is gone are treated as absent even before cleanup.
    pub fn lookup(&self, identity: ObjectIdentity) -> Option<Arc<ChainLink>> {
        self.entries()
            .get(&identity)
            .filter(|entry| entry.liveness.is_alive())
            .map(|entry| Arc::clone(&entry.link))
    }

    pub fn remove(&self, identity: ObjectIdentity) -> Option<Arc<ChainLink>> {
        self.entries().remove(&identity).map(|entry| entry.link)
    }

    /// Evict every entry whose owner no longer exists
    ///
    /// Returns the number of evicted entries.
    pub fn cleanup(&self) -> usize {
        // Dropping evicted links can release other links; do it unlocked
        let evicted: Vec<ChainEntry> = {
            let mut entries = self.entries();
            let stale: Vec<ObjectIdentity> = entries
                .iter()
                .filter(|(_, entry)| !entry.liveness.is_alive())
                .map(|(identity, _)| *identity)
                .collect();
            stale.iter().filter_map(|identity| entries.remove(identity)).collect()
        };

        if !evicted.is_empty() {
            log::debug!("Evicted {} stale chain link(s)", evicted.len());
        }
        evicted.len()
    }

    /// Number of entries, stale ones included
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertySet;

    struct Owner;

    fn tracker() -> ChainLink {
        ChainLink::tracker(PropertySet::new(), || None)
    }

    #[test]
    fn test_register_and_lookup() {
        let table = ResponsibilityChain::new();
        let owner = Arc::new(Owner);
        let identity = ObjectIdentity::of(&owner);

        assert!(table.lookup(identity).is_none());
        let link = table.register(identity, Liveness::of(&owner), tracker());

        let found = table.lookup(identity).unwrap();
        assert!(Arc::ptr_eq(&link, &found));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_register_replaces() {
        let table = ResponsibilityChain::new();
        let owner = Arc::new(Owner);
        let identity = ObjectIdentity::of(&owner);

        let first = table.register(identity, Liveness::of(&owner), tracker());
        let second = table.register(identity, Liveness::of(&owner), tracker());

        assert_eq!(table.len(), 1);
        let found = table.lookup(identity).unwrap();
        assert!(Arc::ptr_eq(&second, &found));
        assert!(!Arc::ptr_eq(&first, &found));
    }

    #[test]
    fn test_register_if_absent_keeps_live_entry() {
        let table = ResponsibilityChain::new();
        let owner = Arc::new(Owner);
        let identity = ObjectIdentity::of(&owner);

        let first = table.register_if_absent(identity, Liveness::of(&owner), tracker());
        let second = table.register_if_absent(identity, Liveness::of(&owner), tracker());

        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&table.lookup(identity).unwrap(), &first));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_register_if_absent_concurrent_callers_agree() {
        let table = ResponsibilityChain::new();
        let owner = Arc::new(Owner);
        let identity = ObjectIdentity::of(&owner);

        let links: Vec<Arc<ChainLink>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| table.register_if_absent(identity, Liveness::of(&owner), tracker())))
                .collect();
            handles.into_iter().map(|handle| handle.join().unwrap()).collect()
        });

        let stored = table.lookup(identity).unwrap();
        assert!(links.iter().all(|link| Arc::ptr_eq(link, &stored)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_cleanup_keeps_live_entries() {
        let table = ResponsibilityChain::new();
        assert_eq!(table.cleanup(), 0);

        let live = Arc::new(Owner);
        let dead = Arc::new(Owner);
        let live_id = ObjectIdentity::of(&live);
        let dead_id = ObjectIdentity::of(&dead);
        table.register(live_id, Liveness::of(&live), tracker());
        table.register(dead_id, Liveness::of(&dead), tracker());

        drop(dead);
        // Stale but not yet swept
        assert_eq!(table.len(), 2);
        assert!(table.lookup(dead_id).is_none());

        assert_eq!(table.cleanup(), 1);
        assert_eq!(table.len(), 1);
        assert!(table.lookup(live_id).is_some());
        assert_eq!(table.cleanup(), 0);
    }

    #[test]
    fn test_cleanup_all_stale() {
        let table = ResponsibilityChain::new();
        for _ in 0..3 {
            let owner = Arc::new(Owner);
            table.register(ObjectIdentity::of(&owner), Liveness::of(&owner), tracker());
        }
        // Each entry's weak handle pins its allocation, so no address was reused
        assert_eq!(table.len(), 3);
        assert_eq!(table.cleanup(), 3);
        assert!(table.is_empty());
    }

    #[test]
    fn test_remove_and_clear() {
        let table = ResponsibilityChain::new();
        let a = Arc::new(Owner);
        let b = Arc::new(Owner);
        table.register(ObjectIdentity::of(&a), Liveness::of(&a), tracker());
        table.register(ObjectIdentity::of(&b), Liveness::of(&b), tracker());

        assert!(table.remove(ObjectIdentity::of(&a)).is_some());
        assert!(table.remove(ObjectIdentity::of(&a)).is_none());
        assert_eq!(table.len(), 1);

        table.clear();
        assert!(table.is_empty());
    }

    #[test]
    fn test_liveness_follows_owner() {
        let owner = Arc::new(Owner);
        let liveness = Liveness::of(&owner);
        let clone = Arc::clone(&owner);

        drop(owner);
        assert!(liveness.is_alive());
        drop(clone);
        assert!(!liveness.is_alive());
    }
}
