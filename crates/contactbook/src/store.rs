//! The record store: the session's source of truth for contacts.
//!
//! Records are kept in insertion order in memory and the whole set is
//! written through the injected [`KeyValueStore`] after every mutation.

use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::contact::{Contact, NewContact};
use crate::error::Result;
use crate::storage::KeyValueStore;

/// Storage key the record set lives under unless configured otherwise.
pub const DEFAULT_RECORDS_KEY: &str = "contacts";

/// Hands out strictly increasing, timestamp-derived ids.
///
/// Each id is the current time in milliseconds, or one more than the last id
/// when the clock hasn't moved past it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    /// Create a generator that has handed out nothing yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a generator whose next id is greater than `last`.
    #[must_use]
    pub fn seeded(last: i64) -> Self {
        Self { last }
    }

    /// The most recent id handed out or observed.
    #[must_use]
    pub fn last(&self) -> i64 {
        self.last
    }

    /// Produce the next id.
    pub fn next_id(&mut self) -> i64 {
        self.next_at(Utc::now().timestamp_millis())
    }

    fn next_at(&mut self, now_millis: i64) -> i64 {
        let id = now_millis.max(self.last.saturating_add(1));
        self.last = id;
        id
    }

    /// Record an id assigned elsewhere so later ids stay above it.
    pub fn observe(&mut self, id: i64) {
        self.last = self.last.max(id);
    }
}

/// How imported records get their ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdPolicy {
    /// Keep the id from the source, unless it is missing or already taken.
    #[default]
    Preserve,
    /// Always assign a fresh id.
    Fresh,
}

/// A record waiting to be appended, with the id it arrived with (if any).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRecord {
    /// Id carried by the source, if any.
    pub id: Option<i64>,
    /// The contact fields.
    pub fields: NewContact,
}

/// In-memory ordered contact collection persisted through a key-value port.
#[derive(Debug)]
pub struct RecordStore<S> {
    backend: S,
    key: String,
    records: Vec<Contact>,
    ids: IdGenerator,
}

impl<S: KeyValueStore> RecordStore<S> {
    /// Load the record set from `backend` under the default key.
    ///
    /// A missing or unreadable blob yields an empty store.
    pub fn load(backend: S) -> Self {
        Self::load_with_key(backend, DEFAULT_RECORDS_KEY)
    }

    /// Load the record set from `backend` under `key`.
    ///
    /// A missing or unreadable blob yields an empty store.
    pub fn load_with_key(backend: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let records = match backend.get(&key) {
            Ok(Some(blob)) => match serde_json::from_str::<Vec<Contact>>(&blob) {
                Ok(records) => records.into_iter().map(Contact::normalized).collect(),
                Err(e) => {
                    warn!(key = %key, error = %e, "Stored contacts are corrupt, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(key = %key, error = %e, "Could not read stored contacts, starting empty");
                Vec::new()
            }
        };

        let highest = records.iter().map(|c| c.id).max().unwrap_or(0);
        debug!(count = records.len(), highest_id = highest, "Loaded contacts");

        Self {
            backend,
            key,
            records,
            ids: IdGenerator::seeded(highest),
        }
    }

    /// All records in insertion order.
    #[must_use]
    pub fn all(&self) -> &[Contact] {
        &self.records
    }

    /// Look up a record by id.
    #[must_use]
    pub fn get(&self, id: i64) -> Option<&Contact> {
        self.records.iter().find(|c| c.id == id)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The storage key the record set is written under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The underlying key-value backend.
    #[must_use]
    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Append a new record with a freshly assigned id.
    pub fn add(&mut self, form: NewContact) -> Contact {
        let taken: HashSet<i64> = self.records.iter().map(|c| c.id).collect();
        let id = self.fresh_id(&taken);
        let contact = Contact::from_form(id, form);
        self.records.push(contact.clone());
        info!(id, name = %contact.name, "Added contact");
        self.persist();
        contact
    }

    /// Replace the record with the same id, keeping its position.
    ///
    /// Returns `false` and leaves the store untouched when no record matches.
    pub fn update(&mut self, contact: Contact) -> bool {
        let contact = contact.normalized();
        let Some(slot) = self.records.iter_mut().find(|c| c.id == contact.id) else {
            debug!(id = contact.id, "Update ignored, no such contact");
            return false;
        };
        info!(id = contact.id, "Updated contact");
        *slot = contact;
        self.persist();
        true
    }

    /// Remove the record with the given id.
    ///
    /// Returns `false` and leaves the store untouched when no record matches.
    pub fn remove(&mut self, id: i64) -> bool {
        let Some(index) = self.records.iter().position(|c| c.id == id) else {
            debug!(id, "Remove ignored, no such contact");
            return false;
        };
        self.records.remove(index);
        info!(id, "Removed contact");
        self.persist();
        true
    }

    /// Append a batch of records and persist once.
    ///
    /// With [`IdPolicy::Preserve`] a record keeps its id unless the id is
    /// missing or already used by the store or an earlier record in the batch,
    /// in which case it gets a fresh one. Returns the appended records.
    pub fn append_batch(
        &mut self,
        batch: impl IntoIterator<Item = PendingRecord>,
        policy: IdPolicy,
    ) -> Vec<Contact> {
        let mut taken: HashSet<i64> = self.records.iter().map(|c| c.id).collect();
        let mut appended = Vec::new();

        for pending in batch {
            let id = match (policy, pending.id) {
                (IdPolicy::Preserve, Some(id)) if !taken.contains(&id) => {
                    self.ids.observe(id);
                    id
                }
                (IdPolicy::Preserve, Some(id)) => {
                    let fresh = self.fresh_id(&taken);
                    warn!(id, fresh, "Imported id already in use, assigned a new one");
                    fresh
                }
                _ => self.fresh_id(&taken),
            };
            taken.insert(id);
            appended.push(Contact::from_form(id, pending.fields));
        }

        if !appended.is_empty() {
            self.records.extend(appended.iter().cloned());
            info!(count = appended.len(), "Appended contacts");
            self.persist();
        }
        appended
    }

    /// Next generated id, or the lowest free positive id once the generator
    /// has nothing left above the highest id in `taken`.
    fn fresh_id(&mut self, taken: &HashSet<i64>) -> i64 {
        let id = self.ids.next_id();
        if !taken.contains(&id) {
            return id;
        }
        let mut free = 1;
        while taken.contains(&free) {
            free += 1;
        }
        warn!(free, "No ids left above the highest one, reusing a free lower id");
        free
    }

    /// Write the full record set to the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend write fails.
    pub fn flush(&mut self) -> Result<()> {
        let blob = serde_json::to_string(&self.records)?;
        self.backend.set(&self.key, &blob)
    }

    fn persist(&mut self) {
        if let Err(e) = self.flush() {
            error!(key = %self.key, error = %e, "Failed to persist contacts");
        }
    }
}
