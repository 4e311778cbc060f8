//! Client cache of the agenda and the reducer that keeps it in sync.
//!
//! The cache is mutated only by [`Store::dispatch`], which applies one
//! [`Action`] through [`reduce`] as a single indivisible step. `reduce` is
//! pure: all network fallibility lives in [`crate::operations`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::contact::{Contact, ContactId};

/// Cached contact sequence plus the outcome message of the last mutation.
///
/// Order is arrival order from the last load, then append order for adds.
/// Identifiers are unique within `contacts`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactCache {
    pub contacts: Vec<Contact>,
    pub message: Option<String>,
}

impl ContactCache {
    pub fn get(&self, id: ContactId) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

/// The closed set of cache transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Replace the whole sequence. Message untouched.
    Load(Vec<Contact>),
    /// Append a server-confirmed record.
    Add(Contact),
    /// Replace the record with the same identifier.
    Update(Contact),
    /// Remove by identifier. `name` is the display name known to the caller.
    Delete { id: ContactId, name: Option<String> },
    ClearMessage,
}

impl Action {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Load(_) => TAG_LOAD,
            Self::Add(_) => TAG_ADD,
            Self::Update(_) => TAG_UPDATE,
            Self::Delete { .. } => TAG_DELETE,
            Self::ClearMessage => TAG_CLEAR_MESSAGE,
        }
    }
}

pub fn created_message(name: &str) -> String {
    format!("Contact \"{name}\" created successfully")
}

pub fn updated_message(name: &str) -> String {
    format!("Contact \"{name}\" updated successfully")
}

pub fn deleted_message(name: &str) -> String {
    format!("Contact \"{name}\" deleted successfully")
}

/// Apply one action to the cache.
pub fn reduce(mut cache: ContactCache, action: Action) -> ContactCache {
    match action {
        Action::Load(contacts) => {
            cache.contacts = dedup_by_id(contacts);
            cache
        }
        Action::Add(contact) => {
            cache.message = Some(created_message(&contact.name));
            // Identifier collisions replace in place; the service is the
            // source of truth for the record.
            match cache.contacts.iter_mut().find(|c| c.id == contact.id) {
                Some(existing) => {
                    tracing::warn!("add_contact: id {} already cached, replacing", contact.id);
                    *existing = contact;
                }
                None => cache.contacts.push(contact),
            }
            cache
        }
        Action::Update(contact) => {
            cache.message = Some(updated_message(&contact.name));
            if let Some(existing) = cache.contacts.iter_mut().find(|c| c.id == contact.id) {
                *existing = contact;
            }
            cache
        }
        Action::Delete { id, name } => {
            let Some(pos) = cache.contacts.iter().position(|c| c.id == id) else {
                return cache;
            };
            let removed = cache.contacts.remove(pos);
            let name = name.filter(|n| !n.is_empty()).unwrap_or(removed.name);
            cache.message = Some(deleted_message(&name));
            cache
        }
        Action::ClearMessage => {
            cache.message = None;
            cache
        }
    }
}

fn dedup_by_id(contacts: Vec<Contact>) -> Vec<Contact> {
    let mut seen = std::collections::HashSet::with_capacity(contacts.len());
    let mut unique = Vec::with_capacity(contacts.len());
    for contact in contacts {
        if seen.insert(contact.id) {
            unique.push(contact);
        } else {
            tracing::warn!("load_contacts: dropping duplicate id {}", contact.id);
        }
    }
    unique
}

// ─────────────────────────────────────────────────────────────────────────────
// Tagged wire form
// ─────────────────────────────────────────────────────────────────────────────

pub const TAG_LOAD: &str = "load_contacts";
pub const TAG_ADD: &str = "add_contact";
pub const TAG_UPDATE: &str = "update_contact";
pub const TAG_DELETE: &str = "delete_contact";
pub const TAG_CLEAR_MESSAGE: &str = "clear_message";

/// Errors decoding a [`TaggedAction`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The tag is outside the closed action set. This is a programming
    /// error in the caller and must not be ignored.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("invalid payload for {tag}: {source}")]
    InvalidPayload {
        tag: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A `{ "type": ..., "payload": ... }` action as it arrives from outside the
/// crate's typed API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedAction {
    #[serde(rename = "type")]
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl TaggedAction {
    pub fn new(tag: impl Into<String>, payload: Option<serde_json::Value>) -> Self {
        Self {
            tag: tag.into(),
            payload,
        }
    }

    /// Decode into a typed action. `Ok(None)` means the payload was absent
    /// for an action that needs one, which leaves the cache unchanged.
    pub fn decode(self) -> Result<Option<Action>, StoreError> {
        let Self { tag, payload } = self;
        let payload = payload.filter(|p| !p.is_null());

        let action = match tag.as_str() {
            TAG_LOAD => match payload {
                Some(value) => Action::Load(payload_as(&tag, value)?),
                None => Action::Load(Vec::new()),
            },
            TAG_ADD => match payload {
                Some(value) => Action::Add(payload_as(&tag, value)?),
                None => return Ok(None),
            },
            TAG_UPDATE => match payload {
                Some(value) => Action::Update(payload_as(&tag, value)?),
                None => {
                    tracing::error!("update_contact: payload without id");
                    return Ok(None);
                }
            },
            TAG_DELETE => {
                let target: DeleteTarget = payload_as(&tag, payload.unwrap_or_default())?;
                target.into_action()
            }
            TAG_CLEAR_MESSAGE => Action::ClearMessage,
            _ => return Err(StoreError::UnknownAction(tag)),
        };
        Ok(Some(action))
    }
}

fn payload_as<T: DeserializeOwned>(tag: &str, value: serde_json::Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|source| StoreError::InvalidPayload {
        tag: tag.to_string(),
        source,
    })
}

/// Delete payload: a bare identifier or `{id, name?}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DeleteTarget {
    Id(ContactId),
    Named {
        id: ContactId,
        #[serde(default)]
        name: Option<String>,
    },
}

impl DeleteTarget {
    fn into_action(self) -> Action {
        match self {
            Self::Id(id) => Action::Delete { id, name: None },
            Self::Named { id, name } => Action::Delete { id, name },
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store container
// ─────────────────────────────────────────────────────────────────────────────

/// Owned handle to one session's cache.
///
/// Create one at application start and hand clones to whoever needs to
/// dispatch or observe. Dropping the last clone ends the session.
#[derive(Debug, Clone)]
pub struct Store {
    tx: watch::Sender<ContactCache>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Empty cache, no message.
    pub fn new() -> Self {
        Self::with_cache(ContactCache::default())
    }

    pub fn with_cache(cache: ContactCache) -> Self {
        let (tx, _rx) = watch::channel(cache);
        Self { tx }
    }

    /// Apply `action` and return the resulting cache.
    pub fn dispatch(&self, action: Action) -> ContactCache {
        tracing::debug!("dispatch {}", action.tag());
        let mut next = None;
        self.tx.send_modify(|cache| {
            let current = std::mem::take(cache);
            *cache = reduce(current, action);
            next = Some(cache.clone());
        });
        next.unwrap_or_else(|| self.snapshot())
    }

    /// Decode and apply a tagged action. Unknown tags are an error and leave
    /// the cache untouched.
    pub fn dispatch_tagged(&self, tagged: TaggedAction) -> Result<ContactCache, StoreError> {
        match tagged.decode()? {
            Some(action) => Ok(self.dispatch(action)),
            None => Ok(self.snapshot()),
        }
    }

    pub fn snapshot(&self) -> ContactCache {
        self.tx.borrow().clone()
    }

    /// Receiver notified after every dispatch.
    pub fn subscribe(&self) -> watch::Receiver<ContactCache> {
        self.tx.subscribe()
    }
}
