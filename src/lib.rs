//! Contact aggregation, search and call-log core for a phone dialer.
//!
//! Device contacts (through an [`source::AddressBook`]) and user-created
//! contacts (one JSON document each, see [`store`]) are merged by
//! [`service::ContactsService`] into one list of [`contact::Contact`] values,
//! which [`search`] filters and [`group`] splits into alphabetic sections.

pub mod config;
pub mod contact;
pub mod error;
pub mod group;
pub mod normalize;
pub mod recents;
pub mod search;
pub mod service;
pub mod source;
pub mod store;

pub use contact::{Contact, PermissionStatus, RecentCall};
pub use error::ContactsError;
pub use service::ContactsService;
