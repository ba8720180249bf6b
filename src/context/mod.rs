//! Scoped, type-checked key/value storage for one pipeline execution.
//!
//! [`DynamicChainContext`] carries repositories and intermediate values between
//! chain steps. Values stored through [`store_disposable`](DynamicChainContext::store_disposable)
//! are owned for disposal: every one of them is disposed exactly once when the
//! context is cleared, disposed or dropped.
//!
//! Misuse (blank keys, missing keys, wrong types) is a programmer error and is
//! reported through [`ContextError`] rather than being absorbed into a chain.
//!
//! # Examples
//!
//! ```
//! use service_rail::context::{ContextError, DynamicChainContext};
//!
//! let mut context = DynamicChainContext::new();
//! context.store("Name", String::from("Barbell")).unwrap();
//!
//! assert_eq!(context.get::<String>("Name").unwrap(), "Barbell");
//! assert!(matches!(context.get::<u32>("Name"), Err(ContextError::TypeMismatch { .. })));
//! assert!(context.try_get::<u32>("Name").is_none());
//! ```
use std::any::Any;
use std::collections::HashMap;

use crate::naming::{DataKey, NamingEngine};

/// Misuse of a [`DynamicChainContext`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("storage key cannot be empty or whitespace")]
    EmptyKey,
    #[error("no item with key '{key}' found in context; store it before retrieving it")]
    MissingKey { key: String },
    #[error("item with key '{key}' is of type {actual}, not {expected}")]
    TypeMismatch { key: String, expected: &'static str, actual: &'static str },
    #[error("context has been disposed; nothing more can be stored")]
    Disposed,
}

/// Failure reported by a [`Disposable`] value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct DisposeError {
    message: String,
}

impl DisposeError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self { message: message.into() }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A resource released explicitly when its owning context ends.
pub trait Disposable: Send + Sync + 'static {
    fn dispose(&mut self) -> Result<(), DisposeError>;
}

type AnyValue = dyn Any + Send + Sync + 'static;

type Disposer = fn(&mut AnyValue) -> Result<(), DisposeError>;

fn dispose_as<T: Disposable>(value: &mut AnyValue) -> Result<(), DisposeError> {
    match value.downcast_mut::<T>() {
        Some(value) => value.dispose(),
        None => Ok(()),
    }
}

struct Entry {
    value: Box<AnyValue>,
    type_name: &'static str,
    disposer: Option<Disposer>,
}

impl Entry {
    fn new<T: Any + Send + Sync>(value: T, disposer: Option<Disposer>) -> Self {
        Self {
            value: Box::new(value),
            type_name: NamingEngine::type_name::<T>(),
            disposer,
        }
    }

    fn dispose(&mut self, key: &str) {
        if let Some(disposer) = self.disposer.take() {
            if let Err(error) = disposer(self.value.as_mut()) {
                tracing::warn!(key, %error, "failed to dispose context value");
            }
        }
    }
}

/// Type-checked heterogeneous storage scoped to one chain execution.
#[derive(Default)]
pub struct DynamicChainContext {
    storage: HashMap<String, Entry>,
    disposal_order: Vec<String>,
    displaced: Vec<(String, Entry)>,
    disposed: bool,
}

impl DynamicChainContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// A replaced disposable is still disposed when the context ends. A
    /// disposed context rejects the value with [`ContextError::Disposed`],
    /// disposing it right away if it was stored as disposable.
    pub fn store<T: Any + Send + Sync>(&mut self, key: &str, value: T) -> Result<(), ContextError> {
        self.insert(key, Entry::new(value, None))
    }

    /// Stores `value` under `key` and takes over its disposal.
    pub fn store_disposable<T: Disposable>(
        &mut self,
        key: &str,
        value: T,
    ) -> Result<(), ContextError> {
        self.insert(key, Entry::new(value, Some(dispose_as::<T>)))
    }

    fn insert(&mut self, key: &str, mut entry: Entry) -> Result<(), ContextError> {
        if self.disposed {
            entry.dispose(key);
            return Err(ContextError::Disposed);
        }
        let key = valid_key(key)?;
        let tracked = entry.disposer.is_some();
        if let Some(previous) = self.storage.insert(key.to_owned(), entry) {
            if previous.disposer.is_some() {
                self.displaced.push((key.to_owned(), previous));
            }
        }
        self.disposal_order.retain(|existing| existing != key);
        if tracked {
            self.disposal_order.push(key.to_owned());
        }
        Ok(())
    }

    /// Returns the value stored under `key`.
    pub fn get<T: Any>(&self, key: &str) -> Result<&T, ContextError> {
        let key = valid_key(key)?;
        let entry = self.entry(key)?;
        entry
            .value
            .downcast_ref::<T>()
            .ok_or_else(|| mismatch::<T>(key, entry.type_name))
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Result<&mut T, ContextError> {
        let key = valid_key(key)?;
        let entry = self
            .storage
            .get_mut(key)
            .ok_or_else(|| ContextError::MissingKey { key: key.to_owned() })?;
        let actual = entry.type_name;
        entry.value.downcast_mut::<T>().ok_or_else(|| mismatch::<T>(key, actual))
    }

    /// Like [`get`](Self::get) but never fails: blank keys, missing keys and
    /// type mismatches all yield `None`.
    pub fn try_get<T: Any>(&self, key: &str) -> Option<&T> {
        if key.trim().is_empty() {
            return None;
        }
        self.storage.get(key)?.value.downcast_ref::<T>()
    }

    /// Existence check. Blank keys are never present.
    pub fn contains(&self, key: &str) -> bool {
        !key.trim().is_empty() && self.storage.contains_key(key)
    }

    pub fn store_repository<R: Any + Send + Sync>(
        &mut self,
        repository: R,
        read_only: bool,
    ) -> Result<(), ContextError> {
        self.store(&NamingEngine::repository_key::<R>(read_only), repository)
    }

    pub fn get_repository<R: Any>(&self, read_only: bool) -> Result<&R, ContextError> {
        self.get(&NamingEngine::repository_key::<R>(read_only))
    }

    pub fn try_get_repository<R: Any>(&self, read_only: bool) -> Option<&R> {
        self.try_get(&NamingEngine::repository_key::<R>(read_only))
    }

    /// Stores `value` under its [`DataKey`].
    pub fn store_data<T: DataKey + Any + Send + Sync>(
        &mut self,
        value: T,
    ) -> Result<(), ContextError> {
        self.store(&T::data_key(), value)
    }

    pub fn get_data<T: DataKey + Any>(&self) -> Result<&T, ContextError> {
        self.get(&T::data_key())
    }

    pub fn try_get_data<T: DataKey + Any>(&self) -> Option<&T> {
        self.try_get(&T::data_key())
    }

    /// Removes the entry under `key`, disposing it if the context owned its disposal.
    ///
    /// Returns `false` when nothing was stored under `key`.
    pub fn remove(&mut self, key: &str) -> bool {
        if key.trim().is_empty() {
            return false;
        }
        match self.storage.remove(key) {
            Some(mut entry) => {
                self.disposal_order.retain(|existing| existing != key);
                entry.dispose(key);
                true
            }
            None => false,
        }
    }

    /// Removes and returns the value under `key`; the caller becomes responsible
    /// for disposing it.
    ///
    /// On a type mismatch the entry is left in place.
    pub fn take<T: Any>(&mut self, key: &str) -> Result<T, ContextError> {
        let key = valid_key(key)?;
        let entry = self.entry(key)?;
        if !entry.value.is::<T>() {
            return Err(mismatch::<T>(key, entry.type_name));
        }
        let entry = self
            .storage
            .remove(key)
            .ok_or_else(|| ContextError::MissingKey { key: key.to_owned() })?;
        self.disposal_order.retain(|existing| existing != key);
        let actual = entry.type_name;
        entry
            .value
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| mismatch::<T>(key, actual))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.storage.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Disposes every owned disposable, then drops all entries.
    ///
    /// A failing disposal is logged and does not stop the remaining ones.
    pub fn clear(&mut self) {
        for (key, mut entry) in self.displaced.drain(..) {
            entry.dispose(&key);
        }
        for key in std::mem::take(&mut self.disposal_order) {
            if let Some(entry) = self.storage.get_mut(&key) {
                entry.dispose(&key);
            }
        }
        self.storage.clear();
    }

    /// Clears the context once; later calls do nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.clear();
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn entry(&self, key: &str) -> Result<&Entry, ContextError> {
        self.storage
            .get(key)
            .ok_or_else(|| ContextError::MissingKey { key: key.to_owned() })
    }
}

impl Drop for DynamicChainContext {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl core::fmt::Debug for DynamicChainContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DynamicChainContext")
            .field("keys", &self.storage.keys().collect::<Vec<_>>())
            .field("disposables", &self.disposal_order)
            .field("disposed", &self.disposed)
            .finish()
    }
}

fn valid_key(key: &str) -> Result<&str, ContextError> {
    if key.trim().is_empty() {
        Err(ContextError::EmptyKey)
    } else {
        Ok(key)
    }
}

fn mismatch<T: ?Sized>(key: &str, actual: &'static str) -> ContextError {
    ContextError::TypeMismatch {
        key: key.to_owned(),
        expected: NamingEngine::type_name::<T>(),
        actual,
    }
}
