//! Aggregation of device and custom contacts, plus the call log, behind one
//! object the presentation layer talks to.
//!
//! The service keeps the state a screen needs between calls: the last loaded
//! contact list, the current permission status, the error message to show
//! and the call log. Operations run to completion; there is no cancellation
//! and writes must not be issued concurrently.

use tracing::{debug, info, warn};

use crate::contact::{Contact, PermissionStatus, RecentCall};
use crate::error::{ContactsError, Result};
use crate::group::{self, Alphabet, Section};
use crate::normalize;
use crate::recents::RecentCallStore;
use crate::search;
use crate::source::AddressBook;
use crate::store::CustomContactStore;

pub const PERMISSION_DENIED_MESSAGE: &str =
    "Contacts permission was denied. You can enable it from system settings.";

pub struct ContactsService {
    address_book: Box<dyn AddressBook>,
    store: CustomContactStore,
    recents: RecentCallStore,
    alphabet: Alphabet,
    permission_status: PermissionStatus,
    contacts: Vec<Contact>,
    recent_calls: Vec<RecentCall>,
    error: Option<String>,
}

impl ContactsService {
    pub fn new(
        address_book: Box<dyn AddressBook>,
        store: CustomContactStore,
        recents: RecentCallStore,
    ) -> Self {
        Self {
            address_book,
            store,
            recents,
            alphabet: Alphabet::default(),
            permission_status: PermissionStatus::Undetermined,
            contacts: Vec::new(),
            recent_calls: Vec::new(),
            error: None,
        }
    }

    pub fn with_alphabet(mut self, alphabet: Alphabet) -> Self {
        self.alphabet = alphabet;
        self
    }

    pub fn permission_status(&self) -> PermissionStatus {
        self.permission_status
    }

    /// Contacts from the last successful reload; empty after a failed one.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn recent_calls(&self) -> &[RecentCall] {
        &self.recent_calls
    }

    pub fn store(&self) -> &CustomContactStore {
        &self.store
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Query the OS without prompting. A failing query reads as `Denied`.
    pub fn get_permission_status(&mut self) -> PermissionStatus {
        let status = match self.address_book.permission() {
            Ok(native) => native.into(),
            Err(err) => {
                warn!(%err, "permission query failed; treating as denied");
                PermissionStatus::Denied
            }
        };
        self.permission_status = status;
        status
    }

    /// Prompt the user for access.
    pub fn request_permission(&mut self) -> PermissionStatus {
        self.error = None;
        let status = match self.address_book.request_permission() {
            Ok(native) => native.into(),
            Err(err) => {
                warn!(%err, "permission request failed; treating as denied");
                PermissionStatus::Denied
            }
        };
        self.permission_status = status;
        if matches!(status, PermissionStatus::Denied | PermissionStatus::Blocked) {
            self.error = Some(PERMISSION_DENIED_MESSAGE.to_string());
        }
        info!(%status, "contacts permission requested");
        status
    }

    /// Rebuild the unified list: device contacts first, then custom ones.
    ///
    /// On failure the visible list is cleared and the error message recorded.
    pub fn reload_contacts(&mut self) -> Result<&[Contact]> {
        self.error = None;
        match self.load_contacts() {
            Ok(contacts) => {
                debug!(count = contacts.len(), "contacts reloaded");
                self.contacts = contacts;
                Ok(&self.contacts)
            }
            Err(err) => {
                warn!(%err, "contact reload failed");
                self.contacts.clear();
                self.error = Some(err.user_message().to_string());
                Err(err)
            }
        }
    }

    fn load_contacts(&mut self) -> Result<Vec<Contact>> {
        let status = self.get_permission_status();
        if !status.is_granted() {
            return Err(ContactsError::Permission {
                status: status.to_string(),
            });
        }

        let records = self.address_book.list_contacts()?;
        let mut contacts = Vec::with_capacity(records.len());
        for (idx, record) in records.into_iter().enumerate() {
            match normalize::parse_os_record(record, &format!("address book entry {idx}")) {
                Ok(raw) => contacts.push(normalize::normalize_os_contact(&raw)),
                Err(err) => warn!(%err, "skipping address book entry"),
            }
        }

        contacts.extend(self.store.list_contacts()?);
        Ok(contacts)
    }

    /// Loaded contacts matching `query`, in alphabetic sections.
    pub fn sections(&self, query: &str) -> Vec<Section> {
        let visible: Vec<Contact> = search::filter(&self.contacts, query)
            .into_iter()
            .cloned()
            .collect();
        group::group(&visible, &self.alphabet)
    }

    pub fn search(&self, query: &str) -> Vec<&Contact> {
        search::filter(&self.contacts, query)
    }

    pub fn find_contact(&self, id: &str) -> Option<&Contact> {
        self.contacts.iter().find(|contact| contact.id == id)
    }

    pub fn create_custom_contact(
        &mut self,
        name: &str,
        phone: &str,
        photo: Option<&str>,
    ) -> Result<String> {
        self.store.create(name, phone, photo)
    }

    pub fn update_custom_contact(
        &mut self,
        existing_id: &str,
        name: &str,
        phone: &str,
        photo: Option<&str>,
    ) -> Result<String> {
        self.store.update(existing_id, name, phone, photo)
    }

    pub fn delete_custom_contact(&mut self, id: &str) -> Result<()> {
        self.store.delete(id)
    }

    pub fn reload_recents(&mut self) -> &[RecentCall] {
        self.recent_calls = self.recents.get();
        &self.recent_calls
    }

    pub fn recent_calls_matching(&self, query: &str) -> Vec<&RecentCall> {
        search::filter(&self.recent_calls, query)
    }

    pub fn log_call(&mut self, call: RecentCall) -> Result<()> {
        self.recent_calls = self.recents.append(call)?;
        Ok(())
    }

    /// Record a call to a loaded contact. Contacts without a number cannot
    /// be called and yield `None`.
    pub fn place_call(&mut self, id: &str, timestamp: i64) -> Result<Option<RecentCall>> {
        let contact = self
            .find_contact(id)
            .ok_or_else(|| ContactsError::NotFound { id: id.to_string() })?;
        if contact.phone_numbers.is_empty() {
            return Ok(None);
        }
        let call = RecentCall::from_contact(contact, timestamp);
        self.log_call(call.clone())?;
        Ok(Some(call))
    }

    pub fn clear_recents(&mut self) -> Result<()> {
        self.recents.clear()?;
        self.recent_calls.clear();
        Ok(())
    }
}
