//! Client-side state for a remote contact agenda.
//!
//! The remote service owns the contact records. This crate keeps a cached
//! copy of one agenda's contacts and keeps it consistent with the service:
//!
//! - [`store`]: the cache, the closed set of actions and the pure reducer.
//! - [`operations`]: user-triggered flows that call the service and, only
//!   after it confirms, dispatch the matching action.
//! - [`client`]: the HTTP contract consumed from the agenda service.
//! - [`validation`]: field rules checked before any create/update call.
//! - [`config`]: layered configuration (defaults, `config.toml`, env).

pub mod client;
pub mod config;
pub mod contact;
pub mod operations;
pub mod store;
pub mod validation;


pub use client::AgendaClient;
pub use client::HttpAgendaClient;
pub use client::RemoteError;
pub use config::AgendaConfig;
pub use config::ConfigError;
pub use config::ConfigLoader;
pub use contact::Contact;
pub use contact::ContactDraft;
pub use contact::ContactId;
pub use operations::ContactOperations;
pub use operations::DeleteConfirmation;
pub use operations::DeleteOutcome;
pub use operations::LoadState;
pub use operations::OperationError;
pub use store::Action;
pub use store::ContactCache;
pub use store::Store;
pub use store::StoreError;
pub use store::TaggedAction;
pub use validation::FieldErrors;
