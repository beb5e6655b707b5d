use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-request session state: string keys to string values
///
/// The bag knows nothing about value semantics. Structured values are
/// encoded by [`ValueCodec`](super::ValueCodec) before they are inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionBag {
    id: Option<String>,
    values: HashMap<String, String>,
    is_new: bool,
}

/// Serialized form of a bag's contents, shared by every backend
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct SessionPayload {
    pub values: HashMap<String, String>,
}

impl SessionBag {
    /// A fresh, empty bag without a backend identifier (cookie sessions)
    pub fn new() -> Self {
        Self {
            id: None,
            values: HashMap::new(),
            is_new: true,
        }
    }

    /// A fresh, empty bag bound to a newly issued identifier
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            values: HashMap::new(),
            is_new: true,
        }
    }

    /// A bag restored from a backend
    pub fn restored(id: Option<String>, values: HashMap<String, String>) -> Self {
        Self {
            id,
            values,
            is_new: false,
        }
    }

    /// Backend session identifier, if the backend uses one
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// True when the bag was created for this request rather than loaded
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub(crate) fn to_payload(&self) -> SessionPayload {
        SessionPayload {
            values: self.values.clone(),
        }
    }
}
