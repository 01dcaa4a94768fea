//! The query pipeline that turns the record set into the displayed list.
//!
//! Three pure stages run in a fixed order: search filter, sort, group filter.
//! None of them touches the record store; the whole chain is recomputed on
//! every call.
//!
//! # Example
//!
//! ```
//! use contactbook::contact::{Contact, NewContact};
//! use contactbook::query::{run, GroupFilter, SortOption, ViewQuery};
//!
//! let contacts = vec![
//!     Contact::from_form(1, NewContact::new("Ann", "111")),
//!     Contact::from_form(2, NewContact::new("Bob", "222")),
//! ];
//! let query = ViewQuery {
//!     search: "an".to_string(),
//!     sort: SortOption::NameAsc,
//!     group: GroupFilter::All,
//! };
//! let visible = run(&contacts, &query);
//! assert_eq!(visible.len(), 1);
//! assert_eq!(visible[0].name, "Ann");
//! ```

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::contact::{Contact, Group};
use crate::error::{Error, Result};

/// Sort order for the contact list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    /// Name, A to Z.
    #[default]
    NameAsc,
    /// Name, Z to A.
    NameDesc,
    /// Most recently added first.
    DateAdded,
}

impl std::fmt::Display for SortOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NameAsc => write!(f, "name-asc"),
            Self::NameDesc => write!(f, "name-desc"),
            Self::DateAdded => write!(f, "date-added"),
        }
    }
}

impl FromStr for SortOption {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "name-asc" | "name_asc" => Ok(Self::NameAsc),
            "name-desc" | "name_desc" => Ok(Self::NameDesc),
            "date-added" | "date_added" => Ok(Self::DateAdded),
            _ => Err(Error::validation(
                "sort",
                format!("unknown sort '{s}' (expected name-asc, name-desc or date-added)"),
            )),
        }
    }
}

/// Group restriction for the contact list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupFilter {
    /// Every group.
    #[default]
    All,
    /// One group only.
    #[serde(untagged)]
    Only(Group),
}

impl GroupFilter {
    /// Whether a contact passes this filter.
    #[must_use]
    pub fn accepts(self, contact: &Contact) -> bool {
        match self {
            Self::All => true,
            Self::Only(group) => contact.group == group,
        }
    }
}

impl std::fmt::Display for GroupFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(group) => group.fmt(f),
        }
    }
}

impl FromStr for GroupFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == "all" {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

/// The three inputs of the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    /// Substring searched in name, phone and email.
    pub search: String,
    /// Sort order.
    pub sort: SortOption,
    /// Group restriction.
    pub group: GroupFilter,
}

/// Run the full pipeline: search, then sort, then group filter.
#[must_use]
pub fn run(contacts: &[Contact], query: &ViewQuery) -> Vec<Contact> {
    let found = filter_search(contacts, &query.search);
    let sorted = sort(&found, query.sort);
    filter_group(&sorted, query.group)
}

/// Keep contacts whose name, phone or email contains `term`, ignoring case.
///
/// An empty term keeps everything.
#[must_use]
pub fn filter_search(contacts: &[Contact], term: &str) -> Vec<Contact> {
    if term.is_empty() {
        return contacts.to_vec();
    }
    let needle = term.to_lowercase();
    contacts
        .iter()
        .filter(|c| c.matches_lowercase(&needle))
        .cloned()
        .collect()
}

/// Stable sort by the given option.
#[must_use]
pub fn sort(contacts: &[Contact], option: SortOption) -> Vec<Contact> {
    let mut sorted = contacts.to_vec();
    match option {
        SortOption::NameAsc => sorted.sort_by(|a, b| compare_names(&a.name, &b.name)),
        SortOption::NameDesc => sorted.sort_by(|a, b| compare_names(&b.name, &a.name)),
        SortOption::DateAdded => sorted.sort_by(|a, b| b.id.cmp(&a.id)),
    }
    sorted
}

/// Keep contacts accepted by the group filter.
#[must_use]
pub fn filter_group(contacts: &[Contact], filter: GroupFilter) -> Vec<Contact> {
    contacts
        .iter()
        .filter(|c| filter.accepts(c))
        .cloned()
        .collect()
}

/// Case-insensitive collation with a raw tiebreak so distinct names never tie.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::NewContact;

    fn contact(id: i64, name: &str, phone: &str, group: Group) -> Contact {
        let mut form = NewContact::new(name, phone);
        form.group = group;
        Contact::from_form(id, form)
    }

    fn names(contacts: &[Contact]) -> Vec<&str> {
        contacts.iter().map(|c| c.name.as_str()).collect()
    }

    fn ann_and_bob() -> Vec<Contact> {
        vec![
            contact(1, "Ann", "111", Group::Family),
            contact(2, "Bob", "222", Group::Work),
        ]
    }

    fn query(search: &str, sort: SortOption, group: GroupFilter) -> ViewQuery {
        ViewQuery {
            search: search.to_string(),
            sort,
            group,
        }
    }

    #[test]
    fn test_scenario_search() {
        let store = ann_and_bob();
        let view = run(&store, &query("an", SortOption::NameAsc, GroupFilter::All));
        assert_eq!(names(&view), vec!["Ann"]);
    }

    #[test]
    fn test_scenario_name_desc() {
        let store = ann_and_bob();
        let view = run(&store, &query("", SortOption::NameDesc, GroupFilter::All));
        assert_eq!(names(&view), vec!["Bob", "Ann"]);
    }

    #[test]
    fn test_scenario_group() {
        let store = ann_and_bob();
        let view = run(
            &store,
            &query("", SortOption::NameAsc, GroupFilter::Only(Group::Family)),
        );
        assert_eq!(names(&view), vec!["Ann"]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let store = vec![contact(1, "john smith", "555", Group::Other)];
        assert_eq!(filter_search(&store, "JOHN").len(), 1);
    }

    #[test]
    fn test_search_matches_phone_and_email() {
        let mut with_email = contact(1, "Ann", "111", Group::Other);
        with_email.email = Some("ann@Mail.example".to_string());
        let store = vec![with_email, contact(2, "Bob", "010-222", Group::Other)];

        assert_eq!(names(&filter_search(&store, "mail.EXAMPLE")), vec!["Ann"]);
        assert_eq!(names(&filter_search(&store, "010")), vec!["Bob"]);
        assert!(filter_search(&store, "nobody").is_empty());
    }

    #[test]
    fn test_empty_search_matches_everything() {
        let store = ann_and_bob();
        assert_eq!(filter_search(&store, ""), store);
    }

    #[test]
    fn test_name_asc_and_desc_are_reverses() {
        let store = vec![
            contact(1, "delta", "1", Group::Other),
            contact(2, "Alpha", "2", Group::Other),
            contact(3, "charlie", "3", Group::Other),
            contact(4, "Bravo", "4", Group::Other),
        ];
        let asc = sort(&store, SortOption::NameAsc);
        let mut desc = sort(&store, SortOption::NameDesc);
        desc.reverse();

        assert_eq!(names(&asc), vec!["Alpha", "Bravo", "charlie", "delta"]);
        assert_eq!(asc, desc);
    }

    #[test]
    fn test_name_sort_is_stable_for_equal_names() {
        let store = vec![
            contact(1, "Sam", "first", Group::Other),
            contact(2, "Sam", "second", Group::Other),
        ];
        let asc = sort(&store, SortOption::NameAsc);
        assert_eq!(asc[0].phone, "first");
        assert_eq!(asc[1].phone, "second");
    }

    #[test]
    fn test_date_added_sorts_newest_first() {
        let store = vec![
            contact(10, "Old", "1", Group::Other),
            contact(30, "Newest", "2", Group::Other),
            contact(20, "Middle", "3", Group::Other),
        ];
        let sorted = sort(&store, SortOption::DateAdded);
        assert_eq!(names(&sorted), vec!["Newest", "Middle", "Old"]);
    }

    #[test]
    fn test_group_all_is_passthrough() {
        let store = vec![
            contact(1, "Zed", "1", Group::Work),
            contact(2, "Amy", "2", Group::Friend),
            contact(3, "Kim", "3", Group::Other),
        ];
        let sorted = sort(&store, SortOption::NameAsc);
        assert_eq!(filter_group(&sorted, GroupFilter::All), sorted);
        assert_eq!(
            run(&store, &query("", SortOption::NameAsc, GroupFilter::All)),
            sorted
        );
    }

    #[test]
    fn test_pipeline_is_deterministic_and_pure() {
        let store = vec![
            contact(1, "Ann", "111", Group::Family),
            contact(2, "Anna", "112", Group::Family),
            contact(3, "Bob", "113", Group::Work),
        ];
        let snapshot = store.clone();
        let q = query("1", SortOption::DateAdded, GroupFilter::Only(Group::Family));

        let first = run(&store, &q);
        let second = run(&store, &q);
        assert_eq!(first, second);
        assert_eq!(names(&first), vec!["Anna", "Ann"]);
        assert_eq!(store, snapshot);
    }

    #[test]
    fn test_sort_option_parse_and_display() {
        for option in [
            SortOption::NameAsc,
            SortOption::NameDesc,
            SortOption::DateAdded,
        ] {
            assert_eq!(option.to_string().parse::<SortOption>().unwrap(), option);
        }
        assert_eq!(
            "name_desc".parse::<SortOption>().unwrap(),
            SortOption::NameDesc
        );
        assert!("newest".parse::<SortOption>().is_err());
    }

    #[test]
    fn test_group_filter_parse_and_display() {
        assert_eq!("all".parse::<GroupFilter>().unwrap(), GroupFilter::All);
        assert_eq!(
            "friend".parse::<GroupFilter>().unwrap(),
            GroupFilter::Only(Group::Friend)
        );
        assert_eq!(GroupFilter::Only(Group::Work).to_string(), "work");
        assert!("everyone".parse::<GroupFilter>().is_err());
    }

    #[test]
    fn test_group_filter_serde() {
        let all: GroupFilter = serde_json::from_str(r#""all""#).unwrap();
        assert_eq!(all, GroupFilter::All);
        let work: GroupFilter = serde_json::from_str(r#""work""#).unwrap();
        assert_eq!(work, GroupFilter::Only(Group::Work));
        assert_eq!(serde_json::to_string(&work).unwrap(), r#""work""#);
    }
}
