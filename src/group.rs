//! Alphabetic sectioning of the contact list.
//!
//! The alphabet is data: swapping between the plain A-Z set and a
//! locale-specific one only changes which [`Alphabet`] is passed in.

use std::collections::HashMap;

use deunicode::deunicode;
use serde::Serialize;

use crate::contact::Contact;

pub const CATCH_ALL: &str = "#";

const ICELANDIC_LETTERS: [char; 32] = [
    'A', 'Á', 'B', 'D', 'Ð', 'E', 'É', 'F', 'G', 'H', 'I', 'Í', 'J', 'K', 'L', 'M', 'N', 'O', 'Ó',
    'P', 'R', 'S', 'T', 'U', 'Ú', 'V', 'X', 'Y', 'Ý', 'Þ', 'Æ', 'Ö',
];

/// Ordered set of section letters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    letters: Vec<char>,
}

impl Alphabet {
    /// Letters are upper-cased; duplicates keep their first position.
    pub fn new(letters: impl IntoIterator<Item = char>) -> Self {
        let mut seen = Vec::new();
        for letter in letters {
            let upper = uppercase_single(letter).unwrap_or(letter);
            if !seen.contains(&upper) {
                seen.push(upper);
            }
        }
        Self { letters: seen }
    }

    pub fn ascii() -> Self {
        Self::new('A'..='Z')
    }

    pub fn icelandic() -> Self {
        Self::new(ICELANDIC_LETTERS)
    }

    pub fn letters(&self) -> &[char] {
        &self.letters
    }

    pub fn position(&self, letter: char) -> Option<usize> {
        self.letters.iter().position(|c| *c == letter)
    }

    /// Section title for a display name.
    pub fn bucket(&self, name: &str) -> String {
        name.chars()
            .next()
            .and_then(uppercase_single)
            .filter(|c| self.position(*c).is_some())
            .map(String::from)
            .unwrap_or_else(|| CATCH_ALL.to_string())
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::ascii()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: String,
    pub data: Vec<Contact>,
}

/// Sort contacts by name and bucket them by first letter. Sections follow
/// alphabet order with the catch-all section last.
pub fn group(contacts: &[Contact], alphabet: &Alphabet) -> Vec<Section> {
    let mut sorted = contacts.to_vec();
    sort_by_name(&mut sorted);

    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, Vec<Contact>> = HashMap::new();
    for contact in sorted {
        let title = alphabet.bucket(&contact.name);
        if !buckets.contains_key(&title) {
            order.push(title.clone());
        }
        buckets.entry(title).or_default().push(contact);
    }

    order.sort_by_key(|title| {
        title
            .chars()
            .next()
            .filter(|_| title.as_str() != CATCH_ALL)
            .and_then(|c| alphabet.position(c))
            .unwrap_or(usize::MAX)
    });

    order
        .into_iter()
        .map(|title| {
            let data = buckets.remove(&title).unwrap_or_default();
            Section { title, data }
        })
        .collect()
}

/// Accent- and case-insensitive ordering, falling back to the exact text so
/// the order is total.
pub fn sort_by_name(contacts: &mut [Contact]) {
    contacts.sort_by_cached_key(|contact| collation_key(&contact.name));
}

fn collation_key(name: &str) -> (String, String, String) {
    (
        deunicode(name).to_lowercase(),
        name.to_lowercase(),
        name.to_string(),
    )
}

fn uppercase_single(c: char) -> Option<char> {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(single), None) => Some(single),
        _ => None,
    }
}
