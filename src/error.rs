//! Error kinds surfaced by the contacts core.

use thiserror::Error;

/// Failure of a public contacts operation.
///
/// Per-record problems (`MalformedRecord`) are normally logged and skipped by
/// the stores; they only escape when a single record was asked for.
#[derive(Error, Debug)]
pub enum ContactsError {
    #[error("contacts permission is not granted (status: {status})")]
    Permission { status: String },

    #[error("failed to fetch contacts from the address book: {message}")]
    Fetch { message: String },

    #[error("malformed record {source_name}: {message}")]
    MalformedRecord { source_name: String, message: String },

    #[error("failed to write {path}: {message}")]
    Write { path: String, message: String },

    #[error("no contact with id {id}")]
    NotFound { id: String },
}

impl ContactsError {
    pub fn malformed(source_name: impl Into<String>, message: impl ToString) -> Self {
        Self::MalformedRecord {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    pub fn write(path: &std::path::Path, err: impl ToString) -> Self {
        Self::Write {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    /// Short message suitable for showing in place of the contact list.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Permission { .. } => "Contacts permission is not granted.",
            Self::Fetch { .. } => "Failed to load contacts.",
            Self::MalformedRecord { .. } => "A contact record could not be read.",
            Self::Write { .. } => "Failed to save changes.",
            Self::NotFound { .. } => "Contact not found.",
        }
    }
}

pub type Result<T> = std::result::Result<T, ContactsError>;
