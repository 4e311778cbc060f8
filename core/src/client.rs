//! HTTP contract of the remote agenda service.
//!
//! Endpoints, relative to the configured base URL:
//!
//! | Operation      | Verb   | Path                               |
//! |----------------|--------|------------------------------------|
//! | list contacts  | GET    | `/agendas/{slug}/contacts`         |
//! | create agenda  | POST   | `/agendas/{slug}`                  |
//! | create contact | POST   | `/agendas/{slug}/contacts`         |
//! | update contact | PUT    | `/agendas/{slug}/contacts/{id}`    |
//! | delete contact | DELETE | `/agendas/{slug}/contacts/{id}`    |

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::config::AgendaConfig;
use crate::contact::{
    Contact, ContactDraft, ContactEnvelope, ContactId, ContactListPayload, ContactPayload,
};

/// Failure of a single remote call.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The agenda (or contact) does not exist on the service.
    #[error("not found: {0}")]
    NotFound(String),

    /// Non-success status other than 404.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Transport failure (connect, TLS, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// Success status with a body we could not decode.
    #[error("parse error: {0}")]
    Parse(String),
}

impl RemoteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Remote agenda operations consumed by [`crate::operations::ContactOperations`].
#[async_trait]
pub trait AgendaClient: Send + Sync {
    /// Agenda slug this client is scoped to.
    fn agenda(&self) -> &str;

    /// List the agenda's contacts. A missing agenda is [`RemoteError::NotFound`].
    async fn list_contacts(&self) -> Result<Vec<Contact>, RemoteError>;

    /// Create the (empty) agenda.
    async fn create_agenda(&self) -> Result<(), RemoteError>;

    /// Create a contact and return the canonical record.
    async fn create_contact(&self, draft: &ContactDraft) -> Result<Contact, RemoteError>;

    /// Replace a contact's fields and return the canonical record.
    async fn update_contact(
        &self,
        id: ContactId,
        draft: &ContactDraft,
    ) -> Result<Contact, RemoteError>;

    async fn delete_contact(&self, id: ContactId) -> Result<(), RemoteError>;
}

/// [`AgendaClient`] over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpAgendaClient {
    client: reqwest::Client,
    base_url: String,
    agenda: String,
}

impl HttpAgendaClient {
    pub fn new(base_url: impl Into<String>, agenda: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, agenda)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        agenda: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            agenda: agenda.into(),
        }
    }

    /// Build from configuration, applying the optional request timeout.
    pub fn from_config(config: &AgendaConfig) -> Result<Self, RemoteError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        Ok(Self::with_client(client, &config.base_url, &config.agenda))
    }

    fn agenda_url(&self) -> String {
        format!(
            "{}/agendas/{}",
            self.base_url,
            urlencoding::encode(&self.agenda)
        )
    }

    fn contacts_url(&self) -> String {
        format!("{}/contacts", self.agenda_url())
    }

    fn contact_url(&self, id: ContactId) -> String {
        format!("{}/contacts/{id}", self.agenda_url())
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, RemoteError> {
        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound(body));
        }
        Err(RemoteError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RemoteError> {
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| RemoteError::Parse(e.to_string()))
    }
}

#[async_trait]
impl AgendaClient for HttpAgendaClient {
    fn agenda(&self) -> &str {
        &self.agenda
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>, RemoteError> {
        let url = self.contacts_url();
        tracing::debug!("GET {url}");
        let response = self.send(self.client.get(&url)).await?;
        let payload: ContactListPayload = Self::json(response).await?;
        Ok(payload.contacts)
    }

    async fn create_agenda(&self) -> Result<(), RemoteError> {
        let url = self.agenda_url();
        tracing::debug!("POST {url}");
        self.send(self.client.post(&url).json(&serde_json::json!({})))
            .await?;
        Ok(())
    }

    async fn create_contact(&self, draft: &ContactDraft) -> Result<Contact, RemoteError> {
        let url = self.contacts_url();
        tracing::debug!("POST {url}");
        let response = self
            .send(self.client.post(&url).json(&ContactPayload::from(draft)))
            .await?;
        let envelope: ContactEnvelope = Self::json(response).await?;
        Ok(envelope.into_contact())
    }

    async fn update_contact(
        &self,
        id: ContactId,
        draft: &ContactDraft,
    ) -> Result<Contact, RemoteError> {
        let url = self.contact_url(id);
        tracing::debug!("PUT {url}");
        let response = self
            .send(self.client.put(&url).json(&ContactPayload::from(draft)))
            .await?;
        let envelope: ContactEnvelope = Self::json(response).await?;
        Ok(envelope.into_contact())
    }

    async fn delete_contact(&self, id: ContactId) -> Result<(), RemoteError> {
        let url = self.contact_url(id);
        tracing::debug!("DELETE {url}");
        self.send(self.client.delete(&url)).await?;
        Ok(())
    }
}
