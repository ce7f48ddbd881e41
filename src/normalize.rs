//! Conversion of raw address-book records and custom-contact payloads into
//! the canonical [`Contact`] shape.

use serde::Deserialize;
use serde_json::Value;

use crate::contact::{Contact, CustomContactRecord, UNNAMED};
use crate::error::{ContactsError, Result};

pub const CUSTOM_CONTACT_EXTENSION: &str = ".json";

/// Record as delivered by the OS address book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOsContact {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone_numbers: Vec<RawPhoneNumber>,
    #[serde(default)]
    pub image: Option<RawImage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawPhoneNumber {
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawImage {
    #[serde(default)]
    pub uri: Option<String>,
}

/// Validate one untyped address-book entry.
pub fn parse_os_record(value: Value, source_name: &str) -> Result<RawOsContact> {
    if !value.is_object() {
        return Err(ContactsError::malformed(source_name, "expected a JSON object"));
    }
    serde_json::from_value(value).map_err(|err| ContactsError::malformed(source_name, err))
}

pub fn normalize_os_contact(raw: &RawOsContact) -> Contact {
    let parts = [raw.first_name.as_deref(), raw.last_name.as_deref()];
    let name = non_empty(raw.name.as_deref())
        .map(str::to_string)
        .or_else(|| join_name_parts(&parts))
        .unwrap_or_else(|| UNNAMED.to_string());

    let phone_numbers = raw
        .phone_numbers
        .iter()
        .find_map(|phone| non_empty(phone.number.as_deref()))
        .unwrap_or_default()
        .to_string();

    let avatar = raw
        .image
        .as_ref()
        .and_then(|image| non_empty(image.uri.as_deref()))
        .map(str::to_string);

    Contact {
        id: raw.id.clone(),
        uuid: raw.id.clone(),
        name,
        phone_numbers,
        avatar,
        is_custom: false,
    }
}

/// Parse and normalize the contents of one custom-contact file.
pub fn normalize_custom_contact_file(file_name: &str, raw: &str) -> Result<Contact> {
    let value: Value =
        serde_json::from_str(raw).map_err(|err| ContactsError::malformed(file_name, err))?;
    if !value.is_object() {
        return Err(ContactsError::malformed(file_name, "expected a JSON object"));
    }
    let record: CustomContactRecord =
        serde_json::from_value(value).map_err(|err| ContactsError::malformed(file_name, err))?;
    Ok(contact_from_record(file_name, &record))
}

pub fn contact_from_record(file_name: &str, record: &CustomContactRecord) -> Contact {
    let name = if record.name.is_empty() {
        UNNAMED.to_string()
    } else {
        record.name.clone()
    };
    Contact {
        id: file_name.to_string(),
        uuid: uuid_from_file_name(file_name).to_string(),
        name,
        phone_numbers: record.phone_number.clone(),
        avatar: record.photo.clone().filter(|photo| !photo.is_empty()),
        is_custom: true,
    }
}

/// The part of `<slug>-<uuid>.json` after the last hyphen, without extension.
pub fn uuid_from_file_name(file_name: &str) -> &str {
    let stem = file_name
        .strip_suffix(CUSTOM_CONTACT_EXTENSION)
        .unwrap_or(file_name);
    match stem.rfind('-') {
        Some(idx) => &stem[idx + 1..],
        None => stem,
    }
}

/// Display name entered as separate first and last name fields.
pub fn compose_display_name(first: &str, last: &str) -> String {
    join_name_parts(&[Some(first), Some(last)]).unwrap_or_else(|| UNNAMED.to_string())
}

/// File-system safe form of a display name.
pub fn slugify(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == ' ')
        .collect();

    let mut slug = String::with_capacity(kept.len());
    let mut in_space = false;
    for c in kept.chars() {
        if c == ' ' {
            if !in_space {
                slug.push('-');
            }
            in_space = true;
        } else {
            slug.push(c);
            in_space = false;
        }
    }
    slug
}

fn join_name_parts(parts: &[Option<&str>]) -> Option<String> {
    let joined = parts
        .iter()
        .filter_map(|part| non_empty(*part))
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str) -> RawOsContact {
        RawOsContact {
            id: id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_os_name_resolution() {
        let mut contact = raw("1");
        contact.name = Some("Full Name".to_string());
        contact.first_name = Some("First".to_string());
        assert_eq!(normalize_os_contact(&contact).name, "Full Name");

        contact.name = Some(String::new());
        contact.last_name = Some("Last".to_string());
        assert_eq!(normalize_os_contact(&contact).name, "First Last");

        contact.first_name = None;
        assert_eq!(normalize_os_contact(&contact).name, "Last");

        assert_eq!(normalize_os_contact(&raw("2")).name, UNNAMED);
    }

    #[test]
    fn test_os_first_non_empty_phone() {
        let mut contact = raw("7");
        contact.phone_numbers = vec![
            RawPhoneNumber::default(),
            RawPhoneNumber {
                number: Some(String::new()),
                label: Some("home".to_string()),
            },
            RawPhoneNumber {
                number: Some("+354 555 1234".to_string()),
                label: Some("mobile".to_string()),
            },
        ];
        contact.image = Some(RawImage {
            uri: Some("file:///a.png".to_string()),
        });

        let normalized = normalize_os_contact(&contact);
        assert_eq!(normalized.phone_numbers, "+354 555 1234");
        assert_eq!(normalized.id, "7");
        assert_eq!(normalized.uuid, "7");
        assert_eq!(normalized.avatar.as_deref(), Some("file:///a.png"));
        assert!(!normalized.is_custom);

        assert_eq!(normalize_os_contact(&raw("8")).phone_numbers, "");
    }

    #[test]
    fn test_parse_os_record_rejects_non_objects() {
        let err = parse_os_record(serde_json::json!("nope"), "record 3").unwrap_err();
        assert!(matches!(err, ContactsError::MalformedRecord { .. }));

        let parsed = parse_os_record(
            serde_json::json!({"id": "9", "firstName": "Ann", "phoneNumbers": [{"number": "1"}]}),
            "record 0",
        )
        .unwrap();
        assert_eq!(parsed.first_name.as_deref(), Some("Ann"));
    }

    #[test]
    fn test_custom_file_normalization() {
        let contact = normalize_custom_contact_file(
            "Ann-Smith-0f3c2a.json",
            r#"{"name":"Ann Smith","phoneNumber":"555-0100","photo":null}"#,
        )
        .unwrap();
        assert_eq!(contact.id, "Ann-Smith-0f3c2a.json");
        assert_eq!(contact.uuid, "0f3c2a");
        assert_eq!(contact.name, "Ann Smith");
        assert_eq!(contact.phone_numbers, "555-0100");
        assert_eq!(contact.avatar, None);
        assert!(contact.is_custom);

        let unnamed =
            normalize_custom_contact_file("-abc.json", r#"{"name":"","phoneNumber":"1"}"#).unwrap();
        assert_eq!(unnamed.name, UNNAMED);
    }

    #[test]
    fn test_custom_file_malformed() {
        for payload in ["[1,2]", "{\"name\":", "\"text\"", "{\"name\": 5}"] {
            let err = normalize_custom_contact_file("x-1.json", payload).unwrap_err();
            assert!(
                matches!(err, ContactsError::MalformedRecord { .. }),
                "{payload} should be malformed"
            );
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Ann Smith"), "Ann-Smith");
        assert_eq!(slugify("  Jón   Þór  "), "-Jn-r-");
        assert_eq!(slugify("O'Brien (work)"), "OBrien-work");
        assert_eq!(slugify("a-b"), "a-b");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_compose_display_name() {
        assert_eq!(compose_display_name("Ann", "Smith"), "Ann Smith");
        assert_eq!(compose_display_name("Ann", ""), "Ann");
        assert_eq!(compose_display_name(" ", " "), UNNAMED);
    }

    #[test]
    fn test_uuid_from_file_name() {
        assert_eq!(uuid_from_file_name("Ann-Smith-abc123.json"), "abc123");
        assert_eq!(uuid_from_file_name("plain.json"), "plain");
    }
}
