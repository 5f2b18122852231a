//! Durable session list and active-session pointer
//!
//! The raw key-value area (`chrome.storage.local` in the extension) is injected
//! as a [`KeyValueStore`]; [`SessionStore`] layers the two logical keys on top.
//! Nothing here is transactional: read-modify-write is last-write-wins.
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{ACTIVE_SESSION_KEY, SESSIONS_KEY, SETTINGS_KEY, Settings};
use crate::error::Result;
use crate::session_data::Session;

/// Opaque get/set/remove persistence
#[async_trait(?Send)]
pub trait KeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}

/// One key's change, as delivered by `storage.onChanged`
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub key: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

pub type ChangeListener = Box<dyn Fn(&StorageChange)>;

/// Stores that can report changes to their keys
pub trait ChangeNotifier {
    fn subscribe(&self, listener: ChangeListener);
}

/// In-memory store; stands in for extension storage in tests and headless use
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Rc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    values: RefCell<HashMap<String, Value>>,
    listeners: RefCell<Vec<ChangeListener>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Synchronous peek, for assertions
    pub fn snapshot(&self, key: &str) -> Option<Value> {
        self.inner.values.borrow().get(key).cloned()
    }

    fn emit(&self, change: StorageChange) {
        if change.old_value == change.new_value {
            return;
        }
        for listener in self.inner.listeners.borrow().iter() {
            listener(&change);
        }
    }
}

#[async_trait(?Send)]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.snapshot(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let old_value = self
            .inner
            .values
            .borrow_mut()
            .insert(key.to_string(), value.clone());
        self.emit(StorageChange {
            key: key.to_string(),
            old_value,
            new_value: Some(value),
        });
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let old_value = self.inner.values.borrow_mut().remove(key);
        self.emit(StorageChange {
            key: key.to_string(),
            old_value,
            new_value: None,
        });
        Ok(())
    }
}

impl ChangeNotifier for MemoryStore {
    fn subscribe(&self, listener: ChangeListener) {
        self.inner.listeners.borrow_mut().push(listener);
    }
}

/// Session list with the list-level edits used by the command handlers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorageData {
    pub sessions: Vec<Session>,
}

impl StorageData {
    pub fn new(sessions: Vec<Session>) -> Self {
        StorageData { sessions }
    }

    pub fn add_session(&mut self, session: Session) {
        self.sessions.push(session);
    }

    pub fn remove_session(&mut self, session_id: &str) -> bool {
        let original_len = self.sessions.len();
        self.sessions.retain(|s| s.id != session_id);
        self.sessions.len() < original_len
    }

    pub fn get_session(&self, session_id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    /// Rename a session and stamp `updated_at`; returns the updated copy
    pub fn update_session_title(
        &mut self,
        session_id: &str,
        title: String,
        updated_at: i64,
    ) -> Option<Session> {
        self.sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .map(|session| {
                session.title = title;
                session.updated_at = updated_at;
                session.clone()
            })
    }
}

/// Typed access to the persisted keys
#[derive(Clone)]
pub struct SessionStore {
    backend: Rc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(backend: Rc<dyn KeyValueStore>) -> Self {
        SessionStore { backend }
    }

    /// All sessions in storage order; a missing key is an empty list
    pub async fn load(&self) -> Result<StorageData> {
        match self.backend.get(SESSIONS_KEY).await? {
            Some(Value::Null) | None => Ok(StorageData::default()),
            Some(value) => Ok(StorageData::new(serde_json::from_value(value)?)),
        }
    }

    pub async fn save(&self, data: &StorageData) -> Result<()> {
        let value = serde_json::to_value(&data.sessions)?;
        self.backend.set(SESSIONS_KEY, value).await
    }

    pub async fn active_session_id(&self) -> Result<Option<String>> {
        let value = self.backend.get(ACTIVE_SESSION_KEY).await?;
        Ok(value
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|id| !id.is_empty()))
    }

    pub async fn set_active_session_id(&self, session_id: &str) -> Result<()> {
        self.backend
            .set(ACTIVE_SESSION_KEY, Value::String(session_id.to_string()))
            .await
    }

    pub async fn clear_active_session_id(&self) -> Result<()> {
        self.backend.remove(ACTIVE_SESSION_KEY).await
    }

    pub async fn settings(&self) -> Result<Settings> {
        Ok(Settings::from_stored(self.backend.get(SETTINGS_KEY).await?))
    }

    /// Drop every saved session and the pointer
    pub async fn remove_all(&self) -> Result<()> {
        self.backend.remove(SESSIONS_KEY).await?;
        self.backend.remove(ACTIVE_SESSION_KEY).await
    }
}
