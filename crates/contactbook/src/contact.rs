//! Core contact types for contactbook.
//!
//! This module defines the contact record, the group enumeration, and the
//! id-less form used when creating or editing a contact.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Earliest birthday year accepted by the contact form.
pub const MIN_BIRTH_YEAR: i32 = 1900;

/// Latest birthday year accepted by the contact form.
pub const MAX_BIRTH_YEAR: i32 = 2099;

/// The group a contact belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    /// Family members.
    Family,
    /// Friends.
    Friend,
    /// Work contacts.
    Work,
    /// Everything else.
    #[default]
    Other,
}

impl Group {
    /// All groups, in display order.
    pub const ALL: [Group; 4] = [Group::Family, Group::Friend, Group::Work, Group::Other];

    /// The lowercase name used in storage and spreadsheets.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Family => "family",
            Self::Friend => "friend",
            Self::Work => "work",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Group {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| {
                Error::validation(
                    "group",
                    format!("unknown group '{s}' (expected family, friend, work or other)"),
                )
            })
    }
}

/// A stored contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Unique identifier, assigned by the record store.
    pub id: i64,

    /// Display name.
    pub name: String,

    /// Phone number, kept as entered.
    pub phone: String,

    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Birthday as an ISO date (`YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,

    /// Company or workplace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    /// Free-form note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,

    /// Group membership.
    #[serde(default)]
    pub group: Group,
}

impl Contact {
    /// Build a contact from a form and an id. Blank optional fields become
    /// `None`.
    #[must_use]
    pub fn from_form(id: i64, form: NewContact) -> Self {
        let form = form.normalized();
        Self {
            id,
            name: form.name,
            phone: form.phone,
            email: form.email,
            birthday: form.birthday,
            company: form.company,
            memo: form.memo,
            group: form.group,
        }
    }

    /// Turn blank optional fields into `None`.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        clear_blank([
            &mut self.email,
            &mut self.birthday,
            &mut self.company,
            &mut self.memo,
        ]);
        self
    }

    /// Copy this contact's fields into a form, dropping the id.
    #[must_use]
    pub fn to_form(&self) -> NewContact {
        NewContact {
            name: self.name.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            birthday: self.birthday.clone(),
            company: self.company.clone(),
            memo: self.memo.clone(),
            group: self.group,
        }
    }

    /// Check whether any of name, phone or email contains `needle`.
    ///
    /// `needle` must already be lowercase.
    #[must_use]
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.phone.to_lowercase().contains(needle)
            || self
                .email
                .as_deref()
                .is_some_and(|email| email.to_lowercase().contains(needle))
    }
}

/// The fields of a contact without its id, as submitted from a form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContact {
    /// Display name.
    pub name: String,
    /// Phone number.
    pub phone: String,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Birthday as an ISO date.
    #[serde(default)]
    pub birthday: Option<String>,
    /// Company or workplace.
    #[serde(default)]
    pub company: Option<String>,
    /// Free-form note.
    #[serde(default)]
    pub memo: Option<String>,
    /// Group membership.
    #[serde(default)]
    pub group: Group,
}

impl NewContact {
    /// Create a form with the two required fields set.
    #[must_use]
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            ..Self::default()
        }
    }

    /// Turn empty optional fields into `None`.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        clear_blank([
            &mut self.email,
            &mut self.birthday,
            &mut self.company,
            &mut self.memo,
        ]);
        self
    }

    /// Validate the form the way the contact form does before submitting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("name", "must not be empty"));
        }
        if self.phone.trim().is_empty() {
            return Err(Error::validation("phone", "must not be empty"));
        }
        if let Some(email) = self.email.as_deref() {
            if !email_regex().is_match(email) {
                return Err(Error::validation(
                    "email",
                    format!("'{email}' is not an email address"),
                ));
            }
        }
        if let Some(birthday) = self.birthday.as_deref() {
            validate_birthday(birthday)?;
        }
        Ok(())
    }
}

fn clear_blank(fields: [&mut Option<String>; 4]) {
    for field in fields {
        if field.as_deref().is_some_and(|v| v.trim().is_empty()) {
            *field = None;
        }
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("email pattern is valid"))
}

fn validate_birthday(birthday: &str) -> Result<()> {
    let date = NaiveDate::parse_from_str(birthday, "%Y-%m-%d").map_err(|_| {
        Error::validation("birthday", format!("'{birthday}' is not a YYYY-MM-DD date"))
    })?;
    if !(MIN_BIRTH_YEAR..=MAX_BIRTH_YEAR).contains(&date.year()) {
        return Err(Error::validation(
            "birthday",
            format!("year must be between {MIN_BIRTH_YEAR} and {MAX_BIRTH_YEAR}"),
        ));
    }
    Ok(())
}
