//! # Object Pool
//!
//! Per-type recycling store for boxed instances.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};

use crate::config::DEFAULT_POOL_CAPACITY;
use crate::entity::TypeKey;

/// Counters describing pool traffic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Fetches served from a recycled instance.
    pub hits: u64,
    /// Fetches that had to construct a new instance.
    pub misses: u64,
    /// Instances accepted back into a store.
    pub recycled: u64,
    /// Instances dropped because their store was full.
    pub dropped: u64,
}

/// Storage for one type: a single fast slot plus a bounded MPMC queue.
struct TypeStore<T: ?Sized> {
    fast: Mutex<Option<Box<T>>>,
    tx: Sender<Box<T>>,
    rx: Receiver<Box<T>>,
}

impl<T: ?Sized> TypeStore<T> {
    fn new(capacity: usize) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        Self {
            fast: Mutex::new(None),
            tx,
            rx,
        }
    }

    fn take(&self) -> Option<Box<T>> {
        if let Some(mut fast) = self.fast.try_lock() {
            if let Some(item) = fast.take() {
                return Some(item);
            }
        }
        self.rx.try_recv().ok()
    }

    /// Returns the item back if the store is full.
    fn put(&self, item: Box<T>) -> Result<(), Box<T>> {
        let item = match self.fast.try_lock() {
            Some(mut fast) if fast.is_none() => {
                *fast = Some(item);
                return Ok(());
            }
            _ => item,
        };
        match self.tx.try_send(item) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(item) | TrySendError::Disconnected(item)) => Err(item),
        }
    }

    fn len(&self) -> usize {
        usize::from(self.fast.lock().is_some()) + self.rx.len()
    }
}

/// Thread-safe recycling pool keyed by [`TypeKey`].
///
/// Instances are handed out as owned boxes, so an instance can only be
/// returned once. Callers decide whether an instance is pool-owned; the
/// entity lifecycle tracks that with the `FROM_POOL` status bit.
///
/// # Example
///
/// ```rust,ignore
/// let pool: ObjectPool<dyn Behavior> = ObjectPool::new(1000);
/// let key = TypeKey::of::<Bullet>();
///
/// let bullet = pool.fetch(key, || Box::new(Bullet::default()));
/// pool.recycle(key, bullet);
/// ```
pub struct ObjectPool<T: ?Sized> {
    stores: RwLock<HashMap<TypeKey, Arc<TypeStore<T>>>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    recycled: AtomicU64,
    dropped: AtomicU64,
}

impl<T: ?Sized + Send> ObjectPool<T> {
    /// Creates a pool keeping at most `capacity` instances per type.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Per-type bound; the fast slot counts toward it
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            stores: RwLock::new(HashMap::new()),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            recycled: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Returns the per-type capacity.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    fn store(&self, key: TypeKey) -> Option<Arc<TypeStore<T>>> {
        self.stores.read().get(&key).cloned()
    }

    fn store_or_insert(&self, key: TypeKey) -> Arc<TypeStore<T>> {
        if let Some(store) = self.store(key) {
            return store;
        }
        // Queue holds capacity - 1; the fast slot holds the last one.
        let bound = self.capacity.saturating_sub(1);
        Arc::clone(
            self.stores
                .write()
                .entry(key)
                .or_insert_with(|| Arc::new(TypeStore::new(bound))),
        )
    }

    /// Takes a recycled instance of `key`, if one is stored.
    #[must_use]
    pub fn take(&self, key: TypeKey) -> Option<Box<T>> {
        let item = self.store(key)?.take();
        if item.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        item
    }

    /// Returns a recycled instance of `key`, or constructs one with `make`.
    pub fn fetch<F>(&self, key: TypeKey, make: F) -> Box<T>
    where
        F: FnOnce() -> Box<T>,
    {
        if let Some(item) = self.take(key) {
            return item;
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        make()
    }

    /// Returns an instance to the store for `key`.
    ///
    /// # Returns
    ///
    /// `true` if the instance was stored, `false` if the store was full and
    /// the instance was dropped.
    pub fn recycle(&self, key: TypeKey, item: Box<T>) -> bool {
        if self.capacity == 0 {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        let store = self.store_or_insert(key);
        if let Err(item) = store.put(item) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(type_name = key.name(), "pool full, dropping instance");
            drop(item);
            return false;
        }
        self.recycled.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Number of instances currently stored for `key`.
    #[must_use]
    pub fn available(&self, key: TypeKey) -> usize {
        self.store(key).map_or(0, |store| store.len())
    }

    /// Drops every stored instance.
    pub fn clear(&self) {
        self.stores.write().clear();
    }

    /// Snapshot of the traffic counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            recycled: self.recycled.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

impl<T: ?Sized + Send> Default for ObjectPool<T> {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}
