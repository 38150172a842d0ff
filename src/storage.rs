use gloo_storage::errors::StorageError as GlooStorageError;
use gloo_storage::{LocalStorage, SessionStorage, Storage};
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::rc::Rc;
use thiserror::Error;

pub const MATCHES_KEY: &str = "matches";
pub const LAST_SESSION_DATE_KEY: &str = "lastSessionDate";
pub const VIEWED_KEY: &str = "viewedProfiles";
pub const LIKED_KEY: &str = "likedProfiles";
pub const DISLIKED_KEY: &str = "dislikedProfiles";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read `{key}`: {message}")]
    Read { key: String, message: String },
    #[error("failed to write `{key}`: {message}")]
    Write { key: String, message: String },
    #[error("stored `{key}` is malformed: {message}")]
    Decode { key: String, message: String },
}

/// A string-keyed store of JSON values.
///
/// Mirrors the shape of `gloo_storage::Storage` so the browser stores and the
/// in-memory store are interchangeable behind the session store.
pub trait Backend {
    /// `Ok(None)` when the key is absent.
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError>;

    fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StorageError>;

    fn delete(&mut self, key: &str);
}

/// Browser storage through `gloo_storage`.
#[derive(Debug)]
pub struct WebBackend<S> {
    storage: PhantomData<S>,
}

/// `localStorage`, survives reloads and new days.
pub type DurableBackend = WebBackend<LocalStorage>;
/// `sessionStorage`, scoped to the tab.
pub type SessionBackend = WebBackend<SessionStorage>;

impl<S> WebBackend<S> {
    pub fn new() -> Self {
        Self {
            storage: PhantomData,
        }
    }
}

impl<S> Default for WebBackend<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Storage> Backend for WebBackend<S> {
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match S::get::<T>(key) {
            Ok(value) => Ok(Some(value)),
            Err(GlooStorageError::KeyNotFound(_)) => Ok(None),
            Err(GlooStorageError::SerdeError(err)) => Err(StorageError::Decode {
                key: key.to_owned(),
                message: err.to_string(),
            }),
            Err(err) => Err(StorageError::Read {
                key: key.to_owned(),
                message: err.to_string(),
            }),
        }
    }

    fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        S::set(key, value).map_err(|err| StorageError::Write {
            key: key.to_owned(),
            message: err.to_string(),
        })
    }

    fn delete(&mut self, key: &str) {
        S::delete(key);
    }
}

/// In-memory backend holding the same serialized strings the browser would.
///
/// Clones share their entries, so a clone kept outside the session store sees
/// every write and can be handed to a fresh store to simulate a reload.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
    read_only: Rc<Cell<bool>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn insert_raw(&self, key: &str, value: impl Into<String>) {
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), value.into());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// While set, every write fails the way a full browser quota does.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
    }
}

impl Backend for MemoryBackend {
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let entries = self.entries.borrow();
        let Some(raw) = entries.get(key) else {
            return Ok(None);
        };
        serde_json::from_str(raw)
            .map(Some)
            .map_err(|err| StorageError::Decode {
                key: key.to_owned(),
                message: err.to_string(),
            })
    }

    fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        if self.read_only.get() {
            return Err(StorageError::Write {
                key: key.to_owned(),
                message: "storage is read-only".to_owned(),
            });
        }
        let raw = serde_json::to_string(value).map_err(|err| StorageError::Write {
            key: key.to_owned(),
            message: err.to_string(),
        })?;
        self.entries.borrow_mut().insert(key.to_owned(), raw);
        Ok(())
    }

    fn delete(&mut self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

/// Reads `key`, treating absent or malformed data as the default value.
pub fn load_or_default<B, T>(backend: &B, key: &str) -> T
where
    B: Backend,
    T: DeserializeOwned + Default,
{
    match backend.get::<T>(key) {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(err) => {
            warn!("Falling back to default for `{}`: {}", key, err);
            T::default()
        }
    }
}
