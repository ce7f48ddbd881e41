//! File-backed store for user-created contacts.
//!
//! Each contact is one JSON document named `<slug>-<uuid>.json` inside a
//! dedicated `contacts/` directory. Writes go through [`write_atomic`] so a
//! failed save never leaves a half-written document behind.
//!
//! Callers must serialize writes: there is no locking, and two concurrent
//! edits of the same contact resolve as last-writer-wins.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::contact::{Contact, CustomContactRecord};
use crate::error::{ContactsError, Result};
use crate::normalize::{self, CUSTOM_CONTACT_EXTENSION};

const CONTACTS_SUBDIR: &str = "contacts";

/// What happens to a custom contact's identity when it is edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditIdentity {
    /// Rewrite the existing file; `id` and `uuid` survive the edit.
    #[default]
    Preserve,
    /// Write under a fresh uuid and a name derived from the new display name,
    /// then remove the old file. Any stored reference to the old id dangles.
    Regenerate,
}

/// A custom-contact file as found on disk, before normalization.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub file_name: String,
    pub contents: String,
}

#[derive(Debug, Clone)]
pub struct CustomContactStore {
    dir: PathBuf,
    edit_identity: EditIdentity,
}

impl CustomContactStore {
    /// Store rooted at `<documents_dir>/contacts`.
    pub fn open(documents_dir: &Path) -> Self {
        Self::with_dir(documents_dir.join(CONTACTS_SUBDIR))
    }

    pub fn with_dir(dir: PathBuf) -> Self {
        Self {
            dir,
            edit_identity: EditIdentity::default(),
        }
    }

    pub fn with_edit_identity(mut self, edit_identity: EditIdentity) -> Self {
        self.edit_identity = edit_identity;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn edit_identity(&self) -> EditIdentity {
        self.edit_identity
    }

    /// Raw contents of every custom-contact file, sorted by file name.
    ///
    /// Unreadable files are logged and skipped. A missing directory means
    /// nothing has been saved yet.
    pub fn list_files(&self) -> Result<Vec<StoredFile>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(ContactsError::Fetch {
                    message: format!("failed to read directory {}: {err}", self.dir.display()),
                })
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(dir = %self.dir.display(), ?err, "skipping unreadable directory entry");
                    continue;
                }
            };
            let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !is_custom_contact_file(&file_name) {
                continue;
            }
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            match fs::read_to_string(&path) {
                Ok(contents) => files.push(StoredFile {
                    file_name,
                    contents,
                }),
                Err(err) => {
                    warn!(path = %path.display(), ?err, "failed to read custom contact");
                }
            }
        }
        files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(files)
    }

    /// All custom contacts, normalized. Malformed files are logged and skipped.
    pub fn list_contacts(&self) -> Result<Vec<Contact>> {
        let contacts = self
            .list_files()?
            .into_iter()
            .filter_map(|file| {
                match normalize::normalize_custom_contact_file(&file.file_name, &file.contents) {
                    Ok(contact) => Some(contact),
                    Err(err) => {
                        warn!(%err, "skipping malformed custom contact");
                        None
                    }
                }
            })
            .collect();
        Ok(contacts)
    }

    pub fn get(&self, id: &str) -> Result<Contact> {
        let path = self
            .path_for(id)
            .ok_or_else(|| ContactsError::NotFound { id: id.to_string() })?;
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(ContactsError::NotFound { id: id.to_string() })
            }
            Err(err) => return Err(ContactsError::malformed(id, err)),
        };
        normalize::normalize_custom_contact_file(id, &contents)
    }

    /// Save a new contact and return its id (the file name).
    pub fn create(&self, name: &str, phone: &str, photo: Option<&str>) -> Result<String> {
        let record = build_record(name, phone, photo);
        let file_name = file_name_for(&record.name, &new_uuid());
        self.write_record(&file_name, &record)?;
        debug!(file = %file_name, "created custom contact");
        Ok(file_name)
    }

    /// Replace the fields of an existing contact and return its id afterwards.
    ///
    /// With [`EditIdentity::Regenerate`] the returned id differs from
    /// `existing_id`, which no longer resolves.
    pub fn update(
        &self,
        existing_id: &str,
        name: &str,
        phone: &str,
        photo: Option<&str>,
    ) -> Result<String> {
        let existing = self
            .path_for(existing_id)
            .filter(|path| path.is_file())
            .ok_or_else(|| ContactsError::NotFound {
                id: existing_id.to_string(),
            })?;
        let record = build_record(name, phone, photo);

        match self.edit_identity {
            EditIdentity::Preserve => {
                self.write_record(existing_id, &record)?;
                debug!(file = %existing_id, "updated custom contact in place");
                Ok(existing_id.to_string())
            }
            EditIdentity::Regenerate => {
                let file_name = file_name_for(&record.name, &new_uuid());
                self.write_record(&file_name, &record)?;
                let removed = fs::remove_file(&existing);
                roll_back_unless_removed(removed, &existing, &self.dir.join(&file_name))?;
                debug!(from = %existing_id, to = %file_name, "recreated custom contact");
                Ok(file_name)
            }
        }
    }

    /// Remove a contact. Deleting an unknown id is not an error.
    pub fn delete(&self, id: &str) -> Result<()> {
        let Some(path) = self.path_for(id) else {
            return Ok(());
        };
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(file = %id, "deleted custom contact");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ContactsError::write(&path, err)),
        }
    }

    fn write_record(&self, file_name: &str, record: &CustomContactRecord) -> Result<()> {
        let target = self.dir.join(file_name);
        let bytes =
            serde_json::to_vec(record).map_err(|err| ContactsError::write(&target, err))?;
        write_atomic(&target, &bytes)
    }

    /// Path of an id inside the store, or `None` if it cannot name one of our files.
    fn path_for(&self, id: &str) -> Option<PathBuf> {
        if id.contains(['/', '\\']) || !is_custom_contact_file(id) {
            return None;
        }
        Some(self.dir.join(id))
    }
}

/// Drop the freshly written document when the old one could not be
/// removed, so a failed edit never leaves the contact on disk twice.
fn roll_back_unless_removed(
    removed: std::io::Result<()>,
    existing: &Path,
    fresh: &Path,
) -> Result<()> {
    let Err(err) = removed else {
        return Ok(());
    };
    if let Err(rollback) = fs::remove_file(fresh) {
        warn!(path = %fresh.display(), ?rollback, "failed to roll back recreated contact");
    }
    Err(ContactsError::write(existing, err))
}

/// File names following the `<slug>-<uuid>.json` convention. Hidden files
/// (including in-flight temporaries) never match.
pub fn is_custom_contact_file(file_name: &str) -> bool {
    !file_name.starts_with('.')
        && file_name.ends_with(CUSTOM_CONTACT_EXTENSION)
        && file_name.contains('-')
}

pub fn file_name_for(name: &str, uuid: &str) -> String {
    format!(
        "{}-{}{}",
        normalize::slugify(name),
        uuid,
        CUSTOM_CONTACT_EXTENSION
    )
}

fn new_uuid() -> String {
    // Hyphen-free so the uuid is exactly the text after the last '-' in the file name.
    Uuid::new_v4().simple().to_string()
}

/// Fields are stored as given; only an empty name or photo is replaced.
fn build_record(name: &str, phone: &str, photo: Option<&str>) -> CustomContactRecord {
    CustomContactRecord {
        name: if name.is_empty() {
            crate::contact::UNNAMED.to_string()
        } else {
            name.to_string()
        },
        phone_number: phone.to_string(),
        photo: photo.filter(|p| !p.is_empty()).map(str::to_string),
    }
}

/// Write `data` to a hidden sibling of `target`, sync it, then rename it over
/// `target`.
pub fn write_atomic(target: &Path, data: &[u8]) -> Result<()> {
    use std::fs::OpenOptions;
    use std::io::Write;

    let parent = target
        .parent()
        .ok_or_else(|| ContactsError::write(target, "target path has no parent"))?;
    fs::create_dir_all(parent).map_err(|err| ContactsError::write(parent, err))?;

    let base = target
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("dialbook");
    let mut counter: u32 = 0;
    let temp_path = loop {
        let candidate = if counter == 0 {
            parent.join(format!(".{base}.tmp"))
        } else {
            parent.join(format!(".{base}.{counter}.tmp"))
        };
        if !candidate.exists() {
            break candidate;
        }
        counter += 1;
    };

    let written = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .and_then(|mut file| {
            file.write_all(data)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&temp_path, target));

    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(ContactsError::write(target, err));
    }

    if let Ok(dir_file) = fs::File::open(parent) {
        let _ = dir_file.sync_all();
    }

    Ok(())
}
