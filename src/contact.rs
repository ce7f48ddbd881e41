use std::fmt;

use serde::{Deserialize, Serialize};

pub const UNNAMED: &str = "Unnamed";

/// A contact as presented to the UI, regardless of where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// OS identifier for address-book contacts, file name for custom ones.
    pub id: String,
    pub uuid: String,
    pub name: String,
    /// Primary phone number, empty when the contact has none.
    pub phone_numbers: String,
    pub avatar: Option<String>,
    pub is_custom: bool,
}

/// On-disk payload of a custom contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomContactRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub photo: Option<String>,
}

/// Snapshot of a call taken when it was placed. Never updated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentCall {
    pub id: String,
    pub name: String,
    pub phone_numbers: String,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl RecentCall {
    pub fn from_contact(contact: &Contact, timestamp: i64) -> Self {
        Self {
            id: contact.id.clone(),
            name: contact.name.clone(),
            phone_numbers: contact.phone_numbers.clone(),
            avatar: contact.avatar.clone(),
            timestamp,
        }
    }
}

/// Permission state for the OS address book as seen by the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    #[default]
    Undetermined,
    Granted,
    Denied,
    /// Denied and the OS will not prompt again; only system settings can fix it.
    Blocked,
}

impl PermissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionStatus::Undetermined => "undetermined",
            PermissionStatus::Granted => "granted",
            PermissionStatus::Denied => "denied",
            PermissionStatus::Blocked => "blocked",
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

impl fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status as reported by the native permission API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeStatus {
    Undetermined,
    Granted,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativePermission {
    pub status: NativeStatus,
    pub can_ask_again: bool,
}

impl NativePermission {
    pub const fn new(status: NativeStatus, can_ask_again: bool) -> Self {
        Self {
            status,
            can_ask_again,
        }
    }
}

impl From<NativePermission> for PermissionStatus {
    fn from(native: NativePermission) -> Self {
        match native.status {
            NativeStatus::Granted => PermissionStatus::Granted,
            NativeStatus::Undetermined => PermissionStatus::Undetermined,
            NativeStatus::Denied if native.can_ask_again => PermissionStatus::Denied,
            NativeStatus::Denied => PermissionStatus::Blocked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_permission_mapping() {
        let cases = [
            (NativeStatus::Granted, false, PermissionStatus::Granted),
            (NativeStatus::Undetermined, true, PermissionStatus::Undetermined),
            (NativeStatus::Denied, true, PermissionStatus::Denied),
            (NativeStatus::Denied, false, PermissionStatus::Blocked),
        ];
        for (status, can_ask_again, expected) in cases {
            let mapped: PermissionStatus = NativePermission::new(status, can_ask_again).into();
            assert_eq!(mapped, expected, "{status:?} / {can_ask_again}");
        }
    }

    #[test]
    fn test_recent_call_wire_format() {
        let call = RecentCall {
            id: "42".to_string(),
            name: "Ann".to_string(),
            phone_numbers: "555".to_string(),
            avatar: None,
            timestamp: 1_700_000_000_000,
        };
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["phoneNumbers"], "555");
        assert_eq!(json["timestamp"], 1_700_000_000_000_i64);
        assert!(json["avatar"].is_null());
    }

    #[test]
    fn test_record_tolerates_missing_fields() {
        let record: CustomContactRecord = serde_json::from_str(r#"{"name":"Ann"}"#).unwrap();
        assert_eq!(record.phone_number, "");
        assert_eq!(record.photo, None);
    }
}
