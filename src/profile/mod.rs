//! Configuration Profile documents.
//!
//! - [`types`] — serializable types that mirror the profile payload schema
//! - [`builder`] — assembles a document from preference trees and MCX payloads
//! - [`serialization`] — atomic save and validated load

pub mod builder;
pub mod serialization;
pub mod types;

pub use builder::{ProfileBuilder, ProfileOptions};
pub use serialization::{OutputFormat, ProfileIdentity};
pub use types::{ManageMode, PayloadContentBody, PayloadEntry, ProfileDocument};
