//! Contact records as exchanged with the agenda service.

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier assigned by the agenda service. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(pub u64);

impl std::fmt::Display for ContactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ContactId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(ContactId)
    }
}

/// A canonical contact record, as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Contact {
    /// Draft carrying this record's current field values (the edit form's
    /// initial state).
    pub fn to_draft(&self) -> ContactDraft {
        ContactDraft {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            image_url: self.image_url.clone(),
        }
    }
}

/// Contact fields without an identifier: the payload of create and update.
///
/// Build one from user input and pass it through
/// [`crate::validation::validate`] before sending it anywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDraft {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub image_url: Option<String>,
}

/// Request body for create and update.
///
/// Every field is always sent. Absent optionals go out as empty strings, which
/// is what the service receives from an untouched form field and is how an
/// update clears a value.
#[derive(Debug, Serialize)]
pub(crate) struct ContactPayload<'a> {
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    address: &'a str,
    image_url: &'a str,
}

impl<'a> From<&'a ContactDraft> for ContactPayload<'a> {
    fn from(draft: &'a ContactDraft) -> Self {
        Self {
            name: &draft.name,
            email: &draft.email,
            phone: draft.phone.as_deref().unwrap_or_default(),
            address: draft.address.as_deref().unwrap_or_default(),
            image_url: draft.image_url.as_deref().unwrap_or_default(),
        }
    }
}

/// Body of the list endpoint. A missing `contacts` field means no contacts.
#[derive(Debug, Deserialize)]
pub(crate) struct ContactListPayload {
    #[serde(default)]
    pub contacts: Vec<Contact>,
}

/// Create/update responses come either bare or wrapped in `{"result": ...}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ContactEnvelope {
    Wrapped { result: Contact },
    Bare(Contact),
}

impl ContactEnvelope {
    pub fn into_contact(self) -> Contact {
        match self {
            Self::Wrapped { result } => result,
            Self::Bare(contact) => contact,
        }
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
