//! Field rules enforced before any create or update call.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::contact::ContactDraft;

const NAME_MIN_CHARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Email,
    Phone,
    Address,
    ImageUrl,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Address => "address",
            Self::ImageUrl => "image_url",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(Field),

    #[error("name must be at least 2 characters")]
    NameTooShort,

    #[error("email must look like user@domain.tld")]
    InvalidEmail,

    #[error("phone must be 9-15 digits, spaces, hyphens or parentheses")]
    InvalidPhone,

    #[error("image url must start with http:// or https://")]
    InvalidImageUrl,
}

impl ValidationError {
    pub fn field(&self) -> Field {
        match self {
            Self::Required(field) => *field,
            Self::NameTooShort => Field::Name,
            Self::InvalidEmail => Field::Email,
            Self::InvalidPhone => Field::Phone,
            Self::InvalidImageUrl => Field::ImageUrl,
        }
    }
}

/// Every rule that failed for one draft, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<ValidationError>);

impl FieldErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn for_field(&self, field: Field) -> Option<&ValidationError> {
        self.0.iter().find(|e| e.field() == field)
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for FieldErrors {}

// Literal patterns, covered by `patterns_compile`.
#[allow(clippy::expect_used)]
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

#[allow(clippy::expect_used)]
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9\s()\-]{9,15}$").expect("phone pattern compiles"));

/// Trim every field, turn blank optionals into `None`, then check the rules.
///
/// Returns the normalised draft, ready to send.
pub fn validate(draft: &ContactDraft) -> Result<ContactDraft, FieldErrors> {
    let normalized = normalize(draft);
    let mut errors = Vec::new();

    if normalized.name.is_empty() {
        errors.push(ValidationError::Required(Field::Name));
    } else if normalized.name.chars().count() < NAME_MIN_CHARS {
        errors.push(ValidationError::NameTooShort);
    }

    if normalized.email.is_empty() {
        errors.push(ValidationError::Required(Field::Email));
    } else if !EMAIL_RE.is_match(&normalized.email) {
        errors.push(ValidationError::InvalidEmail);
    }

    if let Some(phone) = &normalized.phone
        && !PHONE_RE.is_match(phone)
    {
        errors.push(ValidationError::InvalidPhone);
    }

    if let Some(url) = &normalized.image_url
        && !(url.starts_with("http://") || url.starts_with("https://"))
    {
        errors.push(ValidationError::InvalidImageUrl);
    }

    if errors.is_empty() {
        Ok(normalized)
    } else {
        Err(FieldErrors(errors))
    }
}

fn normalize(draft: &ContactDraft) -> ContactDraft {
    let optional = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    ContactDraft {
        name: draft.name.trim().to_string(),
        email: draft.email.trim().to_string(),
        phone: optional(&draft.phone),
        address: optional(&draft.address),
        image_url: optional(&draft.image_url),
    }
}
