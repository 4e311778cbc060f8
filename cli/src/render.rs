//! Plain-text rendering of contacts and status lines.

use agenda_core::{Contact, FieldErrors};
use owo_colors::{OwoColorize, Style};

/// Colour styles, disabled when stdout is not a colour terminal.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn detect() -> Self {
        Self {
            enabled: supports_color::on(supports_color::Stream::Stdout).is_some(),
        }
    }

    pub fn plain() -> Self {
        Self { enabled: false }
    }

    fn paint(self, text: &str, style: Style) -> String {
        if self.enabled {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }

    fn heading(self, text: &str) -> String {
        self.paint(text, Style::new().bold())
    }

    fn label(self, text: &str) -> String {
        self.paint(text, Style::new().dimmed())
    }

    fn success(self, text: &str) -> String {
        self.paint(text, Style::new().green())
    }
}

/// One contact as a card. Absent optional fields are omitted.
pub fn contact_card(contact: &Contact, palette: Palette) -> String {
    let mut lines = vec![format!(
        "{} {}",
        palette.heading(&contact.name),
        palette.label(&format!("#{}", contact.id))
    )];

    let fields = [
        ("email", Some(contact.email.as_str())),
        ("phone", contact.phone.as_deref()),
        ("address", contact.address.as_deref()),
        ("image", contact.image_url.as_deref()),
    ];
    for (label, value) in fields {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            lines.push(format!("  {} {value}", palette.label(&format!("{label:<8}"))));
        }
    }
    lines.join("\n")
}

pub fn contact_list(contacts: &[Contact], palette: Palette) -> String {
    if contacts.is_empty() {
        return "No contacts yet".to_string();
    }
    contacts
        .iter()
        .map(|contact| contact_card(contact, palette))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn message_banner(message: &str, palette: Palette) -> String {
    palette.success(&format!("✓ {message}"))
}

/// One line per failed rule, prefixed with the field name.
pub fn field_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|error| format!("  {}: {error}", error.field()))
        .collect::<Vec<_>>()
        .join("\n")
}
