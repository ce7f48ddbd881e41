//! The OS address book, seen as an opaque capability.
//!
//! This module provides:
//! - `AddressBook` trait for whatever supplies device contacts
//! - `JsonAddressBook`, backed by an exported JSON array of raw records
//! - `NoAddressBook`, for setups without a device address book

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::contact::{NativePermission, NativeStatus};
use crate::error::{ContactsError, Result};

/// Device contact source and its permission gate.
pub trait AddressBook {
    /// Current permission state, without prompting.
    fn permission(&self) -> Result<NativePermission>;

    /// Prompt the user (at most once) and report the outcome.
    fn request_permission(&self) -> Result<NativePermission>;

    /// Untyped records; each is validated separately by the caller.
    fn list_contacts(&self) -> Result<Vec<Value>>;
}

/// Address book read from a JSON export on disk.
///
/// Access counts as granted while the export exists. A missing export is
/// reported as denied with no further prompting.
#[derive(Debug, Clone)]
pub struct JsonAddressBook {
    path: PathBuf,
}

impl JsonAddressBook {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AddressBook for JsonAddressBook {
    fn permission(&self) -> Result<NativePermission> {
        if self.path.is_file() {
            Ok(NativePermission::new(NativeStatus::Granted, true))
        } else {
            Ok(NativePermission::new(NativeStatus::Denied, false))
        }
    }

    fn request_permission(&self) -> Result<NativePermission> {
        self.permission()
    }

    fn list_contacts(&self) -> Result<Vec<Value>> {
        let raw = fs::read_to_string(&self.path).map_err(|err| {
            let message = if err.kind() == ErrorKind::NotFound {
                format!("address book export not found at {}", self.path.display())
            } else {
                format!("failed to read {}: {err}", self.path.display())
            };
            ContactsError::Fetch { message }
        })?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str(&raw) {
            Ok(Value::Array(records)) => Ok(records),
            Ok(_) => Err(ContactsError::Fetch {
                message: format!("{} does not contain a JSON array", self.path.display()),
            }),
            Err(err) => Err(ContactsError::Fetch {
                message: format!("failed to parse {}: {err}", self.path.display()),
            }),
        }
    }
}

/// Always-granted source with no contacts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAddressBook;

impl AddressBook for NoAddressBook {
    fn permission(&self) -> Result<NativePermission> {
        Ok(NativePermission::new(NativeStatus::Granted, true))
    }

    fn request_permission(&self) -> Result<NativePermission> {
        self.permission()
    }

    fn list_contacts(&self) -> Result<Vec<Value>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_json_address_book_permission_follows_export() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("contacts.json");
        let book = JsonAddressBook::new(path.clone());

        let missing = book.permission().unwrap();
        assert_eq!(missing.status, NativeStatus::Denied);
        assert!(!missing.can_ask_again);

        fs::write(&path, "[]").unwrap();
        assert_eq!(book.request_permission().unwrap().status, NativeStatus::Granted);
    }

    #[test]
    fn test_json_address_book_lists_records() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("contacts.json");
        fs::write(&path, r#"[{"id":"1","name":"Ann"}, 5]"#).unwrap();

        let records = JsonAddressBook::new(path).list_contacts().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["name"], "Ann");
    }

    #[test]
    fn test_json_address_book_fetch_errors() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("contacts.json");
        let book = JsonAddressBook::new(path.clone());
        assert!(matches!(
            book.list_contacts(),
            Err(ContactsError::Fetch { .. })
        ));

        fs::write(&path, r#"{"id":"1"}"#).unwrap();
        assert!(matches!(
            book.list_contacts(),
            Err(ContactsError::Fetch { .. })
        ));
    }
}
