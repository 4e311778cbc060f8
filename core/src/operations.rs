//! User-triggered contact flows.
//!
//! Each operation performs exactly one remote call (load may add the
//! implicit agenda creation) and dispatches to the [`Store`] only after the
//! service confirms. A failed call leaves the cache in its last-known-good
//! state and is logged here, at the boundary, before being handed back as an
//! [`OperationError`] with a user-facing message.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use thiserror::Error;

use crate::client::{AgendaClient, RemoteError};
use crate::contact::{Contact, ContactDraft, ContactId};
use crate::store::{Action, Store};
use crate::validation::{self, FieldErrors};

/// One logical user action. At most one call per key is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Load,
    Create,
    Update(ContactId),
    Delete(ContactId),
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load => write!(f, "load"),
            Self::Create => write!(f, "create"),
            Self::Update(id) => write!(f, "update of contact {id}"),
            Self::Delete(id) => write!(f, "delete of contact {id}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum OperationError {
    /// Form data failed a field rule; nothing was sent.
    #[error("invalid contact: {0}")]
    Validation(#[from] FieldErrors),

    #[error("{kind} failed: {source}")]
    Remote {
        kind: OperationKind,
        #[source]
        source: RemoteError,
    },

    /// The agenda was missing and creating it failed.
    #[error("agenda could not be created: {0}")]
    AgendaCreation(#[source] RemoteError),

    /// The same action is already waiting on the service.
    #[error("{0} already in progress")]
    InFlight(OperationKind),
}

impl OperationError {
    /// Generic text for the user. Details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(errors) => errors.to_string(),
            Self::Remote {
                kind: OperationKind::Load,
                source,
            } => format!("Error loading contacts: {source}"),
            Self::Remote {
                kind: OperationKind::Create | OperationKind::Update(_),
                ..
            } => "Error saving contact".to_string(),
            Self::Remote {
                kind: OperationKind::Delete(_),
                ..
            } => "Error deleting contact".to_string(),
            Self::AgendaCreation(_) => {
                "Error loading contacts: agenda could not be created".to_string()
            }
            Self::InFlight(kind) => format!("A {kind} is already in progress"),
        }
    }
}

/// What the view shows after a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Ready { count: usize },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted {
        id: ContactId,
        name: Option<String>,
    },
    /// The user declined; no call was made.
    Cancelled,
}

/// Blocking confirmation step shown before a delete.
#[async_trait]
pub trait DeleteConfirmation: Send + Sync {
    async fn confirm(&self, id: ContactId, name: Option<&str>) -> bool;
}

/// Pre-answered confirmation (`--yes`, tests).
#[async_trait]
impl DeleteConfirmation for bool {
    async fn confirm(&self, _id: ContactId, _name: Option<&str>) -> bool {
        *self
    }
}

/// Orchestrates remote calls and dispatches for one agenda session.
#[derive(Clone)]
pub struct ContactOperations {
    client: Arc<dyn AgendaClient>,
    store: Store,
    in_flight: Arc<Mutex<HashSet<OperationKind>>>,
}

impl ContactOperations {
    pub fn new(client: Arc<dyn AgendaClient>, store: Store) -> Self {
        Self {
            client,
            store,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Edit-form initial values for a cached contact.
    pub fn draft_for(&self, id: ContactId) -> Option<ContactDraft> {
        self.store.snapshot().get(id).map(Contact::to_draft)
    }

    /// Whether a call for `kind` is currently outstanding.
    pub fn is_in_flight(&self, kind: OperationKind) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&kind)
    }

    fn begin(&self, kind: OperationKind) -> Result<InFlightGuard, OperationError> {
        let mut pending = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !pending.insert(kind) {
            tracing::warn!("{kind} requested while one is in flight");
            return Err(OperationError::InFlight(kind));
        }
        Ok(InFlightGuard {
            pending: Arc::clone(&self.in_flight),
            kind,
        })
    }

    /// Load the agenda into the cache, creating the agenda if it is missing.
    pub async fn load(&self) -> LoadState {
        match self.try_load().await {
            Ok(count) => LoadState::Ready { count },
            Err(err) => LoadState::Failed {
                message: err.user_message(),
            },
        }
    }

    /// [`Self::load`] with the typed error. Returns the number of cached contacts.
    pub async fn try_load(&self) -> Result<usize, OperationError> {
        let _guard = self.begin(OperationKind::Load)?;
        let agenda = self.client.agenda().to_string();

        let contacts = match self.client.list_contacts().await {
            Ok(contacts) => contacts,
            Err(err) if err.is_not_found() => {
                tracing::info!("agenda {agenda} not found, creating it");
                self.client.create_agenda().await.map_err(|source| {
                    tracing::error!("creating agenda {agenda} failed: {source}");
                    OperationError::AgendaCreation(source)
                })?;
                Vec::new()
            }
            Err(source) => return Err(remote_failure(OperationKind::Load, source)),
        };

        let cache = self.store.dispatch(Action::Load(contacts));
        tracing::info!("loaded {} contacts from agenda {agenda}", cache.len());
        Ok(cache.len())
    }

    /// Validate, create remotely, then add the canonical record.
    pub async fn create(&self, draft: &ContactDraft) -> Result<Contact, OperationError> {
        let draft = validation::validate(draft)?;
        let _guard = self.begin(OperationKind::Create)?;

        let contact = self
            .client
            .create_contact(&draft)
            .await
            .map_err(|source| remote_failure(OperationKind::Create, source))?;

        tracing::info!("created contact {} ({})", contact.id, contact.name);
        self.store.dispatch(Action::Add(contact.clone()));
        Ok(contact)
    }

    /// Validate, update remotely, then replace the cached record.
    pub async fn update(
        &self,
        id: ContactId,
        draft: &ContactDraft,
    ) -> Result<Contact, OperationError> {
        let draft = validation::validate(draft)?;
        let kind = OperationKind::Update(id);
        let _guard = self.begin(kind)?;

        let contact = self
            .client
            .update_contact(id, &draft)
            .await
            .map_err(|source| remote_failure(kind, source))?;

        if contact.id != id {
            tracing::warn!("update of {id} answered with record {}", contact.id);
        }
        tracing::info!("updated contact {} ({})", contact.id, contact.name);
        self.store.dispatch(Action::Update(contact.clone()));
        Ok(contact)
    }

    /// Ask for confirmation, delete remotely, then drop the cached record.
    pub async fn delete(
        &self,
        id: ContactId,
        confirmation: &dyn DeleteConfirmation,
    ) -> Result<DeleteOutcome, OperationError> {
        let name = self.store.snapshot().get(id).map(|c| c.name.clone());
        if !confirmation.confirm(id, name.as_deref()).await {
            tracing::debug!("delete of {id} cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }

        let kind = OperationKind::Delete(id);
        let _guard = self.begin(kind)?;

        self.client
            .delete_contact(id)
            .await
            .map_err(|source| remote_failure(kind, source))?;

        tracing::info!("deleted contact {id}");
        self.store.dispatch(Action::Delete {
            id,
            name: name.clone(),
        });
        Ok(DeleteOutcome::Deleted { id, name })
    }

    /// Dismiss the status message.
    pub fn clear_message(&self) {
        self.store.dispatch(Action::ClearMessage);
    }
}

fn remote_failure(kind: OperationKind, source: RemoteError) -> OperationError {
    tracing::error!("{kind} failed: {source}");
    OperationError::Remote { kind, source }
}

/// Releases the in-flight slot when the call settles, success or not.
struct InFlightGuard {
    pending: Arc<Mutex<HashSet<OperationKind>>>,
    kind: OperationKind,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.kind);
    }
}
