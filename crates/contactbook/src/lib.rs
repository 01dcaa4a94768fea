//! `contactbook` - a local address book
//!
//! Contacts live in an ordered record store persisted as one JSON blob in a
//! key-value backend (SQLite by default). A session state machine gates every
//! action behind a login, a pure query pipeline produces the visible list, and
//! the whole book can be exported to or imported from CSV and XLSX files.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod contact;
pub mod error;
pub mod logging;
pub mod query;
pub mod session;
pub mod storage;
pub mod store;
pub mod transfer;

pub use config::Config;
pub use contact::{Contact, Group, NewContact};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use session::{Page, Session};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use store::RecordStore;
