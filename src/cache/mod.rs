//! Normalised entity store with optimistic updates.
//!
//! Every entity fetched from GitHub is stored once, under its [`EntityKey`],
//! as a flat record of GraphQL field names to JSON values. Later fetches of
//! the same key merge into the stored record field by field, so a view that
//! reads the key always sees the latest known values.
//!
//! Tentative writes are kept apart from server data as a stack of optimistic
//! layers. Reads fold the layers over the server record in application
//! order, so the most recent layer on a key wins. Rolling a layer back simply
//! removes it, which restores exactly what the remaining data describes. A
//! rollback never disturbs layers applied to other keys, and a commit never
//! changes what a read returns.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{BoxedStr, LensError};
use crate::listeners::{SubscriptionId, Subscribers};


/// Field values of one entity, keyed by GraphQL field name.
pub type Record = Map<String, Value>;

/// Identity of a cached entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey(Box<str>);

impl EntityKey {
    pub fn new(key: impl BoxedStr) -> Self {
        Self(key.boxed())
    }

    /// Key for an object addressed by its GitHub global node id.
    #[must_use]
    pub fn node(id: &str) -> Self {
        Self::new(id)
    }

    /// Key for an object only unique within a type, e.g. an issue number
    /// within a repository.
    pub fn typed(typename: &str, local: impl fmt::Display) -> Self {
        Self::new(format!("{typename}:{local}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A model that can be written into the cache.
pub trait CacheEntity: Serialize {
    fn entity_key(&self) -> EntityKey;

    /// Serialise `self` into a cache record.
    ///
    /// # Errors
    ///
    /// Returns [`LensError::CacheRecord`] when the value does not serialise
    /// to a JSON object.
    fn to_record(&self) -> Result<Record, LensError> {
        record_from(&self.entity_key(), self)
    }
}

/// Serialise `value` into a record stored under `key`.
///
/// # Errors
///
/// Returns [`LensError::CacheRecord`] if serialisation fails or produces
/// anything other than a JSON object.
pub fn record_from<T>(key: &EntityKey, value: &T) -> Result<Record, LensError>
where
    T: Serialize + ?Sized,
{
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(LensError::CacheRecord {
            key: key.as_str().boxed(),
            message: format!("expected an object, found {other}").boxed(),
        }),
        Err(e) => Err(LensError::CacheRecord {
            key: key.as_str().boxed(),
            message: e.to_string().boxed(),
        }),
    }
}

/// Change notifications emitted by [`SharedCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Upserted(EntityKey),
    OptimisticApplied(EntityKey),
    Committed(EntityKey),
    RolledBack(EntityKey),
}

impl CacheEvent {
    #[must_use]
    pub fn key(&self) -> &EntityKey {
        match self {
            Self::Upserted(k)
            | Self::OptimisticApplied(k)
            | Self::Committed(k)
            | Self::RolledBack(k) => k,
        }
    }
}

/// Receipt for a tentative update.
///
/// The token is consumed by [`EntityCache::commit`] or
/// [`EntityCache::rollback`], so each optimistic update resolves once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an optimistic update must be committed or rolled back"]
pub struct OptimisticToken {
    id: u64,
    key: EntityKey,
}

impl OptimisticToken {
    #[must_use]
    pub fn key(&self) -> &EntityKey {
        &self.key
    }
}

#[derive(Debug)]
struct OptimisticLayer {
    id: u64,
    key: EntityKey,
    fields: Record,
}

/// The keyed store itself. Most callers want [`SharedCache`].
#[derive(Debug, Default)]
pub struct EntityCache {
    base: HashMap<EntityKey, Record>,
    layers: Vec<OptimisticLayer>,
    next_layer: u64,
}

impl EntityCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `fields` into the confirmed record for `key`.
    ///
    /// Fields absent from `fields` keep their stored values.
    pub fn upsert(&mut self, key: EntityKey, fields: Record) -> CacheEvent {
        self.base.entry(key.clone()).or_default().extend(fields);
        CacheEvent::Upserted(key)
    }

    /// Layer a tentative update over `key` until it is committed or rolled
    /// back.
    pub fn apply_optimistic(&mut self, key: EntityKey, fields: Record) -> OptimisticToken {
        let id = self.next_layer;
        self.next_layer += 1;
        self.layers.push(OptimisticLayer {
            id,
            key: key.clone(),
            fields,
        });
        OptimisticToken { id, key }
    }

    /// Make a tentative update permanent and drop its rollback data.
    ///
    /// Committing never changes what [`read`](Self::read) returns. The
    /// committed fields move into the confirmed record and are stripped from
    /// older layers on the same key, which they already overrode.
    ///
    /// # Errors
    ///
    /// Returns [`LensError::UnknownOptimisticUpdate`] when the token was not
    /// issued by this cache.
    pub fn commit(&mut self, token: OptimisticToken) -> Result<CacheEvent, LensError> {
        let pos = self.layer_position(&token)?;
        let layer = self.layers.remove(pos);
        for older in self.layers.iter_mut().take(pos) {
            if older.key == layer.key {
                older.fields.retain(|name, _| !layer.fields.contains_key(name));
            }
        }
        self.base
            .entry(layer.key.clone())
            .or_default()
            .extend(layer.fields);
        Ok(CacheEvent::Committed(layer.key))
    }

    /// Discard a tentative update, restoring whatever lies beneath it.
    ///
    /// Layers need not be rolled back newest first. Removing a layer from the
    /// middle of a key's stack leaves the layers above it in force, so `read`
    /// then shows the confirmed record overlaid by every layer still pending,
    /// oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`LensError::UnknownOptimisticUpdate`] when the token was not
    /// issued by this cache.
    pub fn rollback(&mut self, token: OptimisticToken) -> Result<CacheEvent, LensError> {
        let layer = self.take_layer(&token)?;
        Ok(CacheEvent::RolledBack(layer.key))
    }

    fn layer_position(&self, token: &OptimisticToken) -> Result<usize, LensError> {
        self.layers
            .iter()
            .position(|l| l.id == token.id && l.key == token.key)
            .ok_or(LensError::UnknownOptimisticUpdate(token.id))
    }

    fn take_layer(&mut self, token: &OptimisticToken) -> Result<OptimisticLayer, LensError> {
        let pos = self.layer_position(token)?;
        Ok(self.layers.remove(pos))
    }

    /// Current view of `key`: the confirmed record with every pending layer
    /// for that key folded on top, oldest first.
    #[must_use]
    pub fn read(&self, key: &EntityKey) -> Option<Record> {
        let mut layers = self.layers.iter().filter(|l| &l.key == key).peekable();
        let base = self.base.get(key);
        if base.is_none() && layers.peek().is_none() {
            return None;
        }
        let mut record = base.cloned().unwrap_or_default();
        for layer in layers {
            record.extend(layer.fields.clone());
        }
        Some(record)
    }

    /// Read `key` and deserialise it into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`LensError::CacheRecord`] when the stored fields do not fit
    /// `T`.
    pub fn read_as<T: DeserializeOwned>(&self, key: &EntityKey) -> Result<Option<T>, LensError> {
        self.read(key)
            .map(|record| {
                serde_json::from_value(Value::Object(record)).map_err(|e| LensError::CacheRecord {
                    key: key.as_str().boxed(),
                    message: e.to_string().boxed(),
                })
            })
            .transpose()
    }

    #[must_use]
    pub fn contains(&self, key: &EntityKey) -> bool {
        self.base.contains_key(key) || self.layers.iter().any(|l| &l.key == key)
    }

    /// Number of optimistic updates awaiting confirmation.
    #[must_use]
    pub fn pending_optimistic(&self) -> usize {
        self.layers.len()
    }
}

/// A cloneable handle to one [`EntityCache`] plus its subscribers.
///
/// All handles observe the same store. Subscribers are notified after the
/// store borrow is released, so callbacks may read the cache.
#[derive(Debug, Clone, Default)]
pub struct SharedCache {
    inner: Rc<RefCell<EntityCache>>,
    listeners: Rc<Subscribers<CacheEvent>>,
}

impl SharedCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, key: EntityKey, fields: Record) {
        let event = self.inner.borrow_mut().upsert(key, fields);
        debug!(key = %event.key(), "cache upsert");
        self.listeners.notify(&event);
    }

    /// Write a model into the cache under its own key.
    ///
    /// # Errors
    ///
    /// Returns [`LensError::CacheRecord`] if the model cannot be serialised.
    pub fn upsert_entity<T>(&self, entity: &T) -> Result<EntityKey, LensError>
    where
        T: CacheEntity + ?Sized,
    {
        let key = entity.entity_key();
        let record = entity.to_record()?;
        self.upsert(key.clone(), record);
        Ok(key)
    }

    pub fn apply_optimistic(&self, key: EntityKey, fields: Record) -> OptimisticToken {
        let token = self.inner.borrow_mut().apply_optimistic(key, fields);
        debug!(key = %token.key(), "optimistic update applied");
        self.listeners
            .notify(&CacheEvent::OptimisticApplied(token.key().clone()));
        token
    }

    /// # Errors
    ///
    /// See [`EntityCache::commit`].
    pub fn commit(&self, token: OptimisticToken) -> Result<(), LensError> {
        let event = self.inner.borrow_mut().commit(token)?;
        self.listeners.notify(&event);
        Ok(())
    }

    /// # Errors
    ///
    /// See [`EntityCache::rollback`].
    pub fn rollback(&self, token: OptimisticToken) -> Result<(), LensError> {
        let event = self.inner.borrow_mut().rollback(token)?;
        warn!(key = %event.key(), "optimistic update rolled back");
        self.listeners.notify(&event);
        Ok(())
    }

    #[must_use]
    pub fn read(&self, key: &EntityKey) -> Option<Record> {
        self.inner.borrow().read(key)
    }

    /// # Errors
    ///
    /// See [`EntityCache::read_as`].
    pub fn read_as<T: DeserializeOwned>(&self, key: &EntityKey) -> Result<Option<T>, LensError> {
        self.inner.borrow().read_as(key)
    }

    #[must_use]
    pub fn contains(&self, key: &EntityKey) -> bool {
        self.inner.borrow().contains(key)
    }

    #[must_use]
    pub fn pending_optimistic(&self) -> usize {
        self.inner.borrow().pending_optimistic()
    }

    pub fn subscribe(&self, callback: impl Fn(&CacheEvent) + 'static) -> SubscriptionId {
        self.listeners.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }
}
