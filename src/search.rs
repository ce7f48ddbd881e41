use crate::contact::{Contact, RecentCall};

/// Rows that can be matched against a free-text query.
pub trait Searchable {
    fn search_name(&self) -> &str;

    /// Phone numbers of the row; several numbers are matched as one
    /// space-joined string.
    fn search_numbers(&self) -> Vec<&str>;
}

impl Searchable for Contact {
    fn search_name(&self) -> &str {
        &self.name
    }

    fn search_numbers(&self) -> Vec<&str> {
        vec![self.phone_numbers.as_str()]
    }
}

impl Searchable for RecentCall {
    fn search_name(&self) -> &str {
        &self.name
    }

    fn search_numbers(&self) -> Vec<&str> {
        vec![self.phone_numbers.as_str()]
    }
}

/// Lower-cased query, or `None` when it is blank. Surrounding whitespace is
/// kept and takes part in the match.
pub fn normalize_query(query: &str) -> Option<String> {
    if query.trim().is_empty() {
        None
    } else {
        Some(query.to_lowercase())
    }
}

/// Case-insensitive substring match on name or phone number. A blank query
/// matches everything.
pub fn matches<T: Searchable + ?Sized>(item: &T, query: &str) -> bool {
    match normalize_query(query) {
        Some(normalized) => matches_normalized(item, &normalized),
        None => true,
    }
}

/// As [`matches`], with a query already passed through [`normalize_query`].
pub fn matches_normalized<T: Searchable + ?Sized>(item: &T, normalized: &str) -> bool {
    if item.search_name().to_lowercase().contains(normalized) {
        return true;
    }
    item.search_numbers()
        .join(" ")
        .to_lowercase()
        .contains(normalized)
}

pub fn filter<'a, T: Searchable>(items: &'a [T], query: &str) -> Vec<&'a T> {
    match normalize_query(query) {
        Some(normalized) => items
            .iter()
            .filter(|item| matches_normalized(*item, &normalized))
            .collect(),
        None => items.iter().collect(),
    }
}
