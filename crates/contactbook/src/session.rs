//! The session controller: page state machine, authentication and view inputs.
//!
//! A [`Session`] holds only ephemeral view state. It never owns the record
//! store; actions that change records take `&mut RecordStore<_>` explicitly.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::AuthConfig;
use crate::contact::{Contact, NewContact};
use crate::error::{Error, Result};
use crate::query::{self, GroupFilter, SortOption, ViewQuery};
use crate::storage::KeyValueStore;
use crate::store::RecordStore;

/// The page the session is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    /// Login form.
    Login,
    /// Contact list.
    List,
    /// New-contact form.
    Add,
    /// Edit form for the selected contact.
    Edit,
    /// Detail view of the selected contact.
    Detail,
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Login => write!(f, "login"),
            Self::List => write!(f, "list"),
            Self::Add => write!(f, "add"),
            Self::Edit => write!(f, "edit"),
            Self::Detail => write!(f, "detail"),
        }
    }
}

/// Ephemeral view state for one user session.
#[derive(Debug, Clone)]
pub struct Session {
    credentials: AuthConfig,
    page: Page,
    selected: Option<Contact>,
    authenticated: bool,
    query: ViewQuery,
}

impl Session {
    /// Start a session on the login page.
    #[must_use]
    pub fn new(credentials: AuthConfig) -> Self {
        Self {
            credentials,
            page: Page::Login,
            selected: None,
            authenticated: false,
            query: ViewQuery::default(),
        }
    }

    /// Start a session with initial sort and group inputs.
    #[must_use]
    pub fn with_view(credentials: AuthConfig, sort: SortOption, group: GroupFilter) -> Self {
        let mut session = Self::new(credentials);
        session.query.sort = sort;
        session.query.group = group;
        session
    }

    /// The current page.
    #[must_use]
    pub fn page(&self) -> Page {
        self.page
    }

    /// The selected contact, if any.
    #[must_use]
    pub fn selected(&self) -> Option<&Contact> {
        self.selected.as_ref()
    }

    /// Whether a user is logged in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// The current search, sort and group inputs.
    #[must_use]
    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    /// Log in with an email and password.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthenticationFailed`] when the pair doesn't match,
    /// or [`Error::InvalidTransition`] when already logged in.
    pub fn login(&mut self, email: &str, password: &str) -> Result<()> {
        if self.authenticated {
            return Err(self.invalid("log in"));
        }
        if !self.credentials.matches(email, password) {
            warn!(email, "Login rejected");
            return Err(Error::AuthenticationFailed);
        }
        info!(email, "Logged in");
        self.authenticated = true;
        self.go(Page::List);
        Ok(())
    }

    /// Log out, returning to the login page. Records are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAuthenticated`] when nobody is logged in.
    pub fn logout(&mut self) -> Result<()> {
        self.require_auth()?;
        info!("Logged out");
        self.authenticated = false;
        self.selected = None;
        self.go(Page::Login);
        Ok(())
    }

    /// Go to the contact list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAuthenticated`] when nobody is logged in.
    pub fn show_list(&mut self) -> Result<()> {
        self.require_auth()?;
        self.selected = None;
        self.go(Page::List);
        Ok(())
    }

    /// Open an empty new-contact form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAuthenticated`] when nobody is logged in.
    pub fn create(&mut self) -> Result<()> {
        self.require_auth()?;
        self.selected = None;
        self.go(Page::Add);
        Ok(())
    }

    /// Open the detail view of `contact`.
    ///
    /// # Errors
    ///
    /// Fails unless logged in and on the list or detail page.
    pub fn select(&mut self, contact: Contact) -> Result<()> {
        self.require_page(&[Page::List, Page::Detail], "select a contact")?;
        self.selected = Some(contact);
        self.go(Page::Detail);
        Ok(())
    }

    /// Open the edit form for `contact`.
    ///
    /// # Errors
    ///
    /// Fails unless logged in and on the list or detail page.
    pub fn edit(&mut self, contact: Contact) -> Result<()> {
        self.require_page(&[Page::List, Page::Detail], "edit")?;
        self.selected = Some(contact);
        self.go(Page::Edit);
        Ok(())
    }

    /// Open the edit form for the contact shown in the detail view.
    ///
    /// # Errors
    ///
    /// Fails unless logged in and on the detail page.
    pub fn edit_selected(&mut self) -> Result<()> {
        self.require_page(&[Page::Detail], "edit")?;
        let contact = self.selected_or_internal()?;
        self.edit(contact)
    }

    /// Submit the add or edit form.
    ///
    /// On the add page the form becomes a new record; on the edit page it
    /// replaces the selected record, keeping its id. Either way the session
    /// returns to the list.
    ///
    /// # Errors
    ///
    /// Fails unless logged in and on the add or edit page, or when the form
    /// doesn't validate. Nothing changes on failure.
    pub fn submit<S: KeyValueStore>(
        &mut self,
        store: &mut RecordStore<S>,
        form: NewContact,
    ) -> Result<Contact> {
        self.require_page(&[Page::Add, Page::Edit], "submit a contact")?;
        let form = form.normalized();
        form.validate()?;

        let saved = if self.page == Page::Add {
            store.add(form)
        } else {
            let id = self.selected_or_internal()?.id;
            let contact = Contact::from_form(id, form);
            store.update(contact.clone());
            contact
        };

        self.selected = None;
        self.go(Page::List);
        Ok(saved)
    }

    /// Delete the contact shown in the detail view and return to the list.
    ///
    /// # Errors
    ///
    /// Fails unless logged in and on the detail page.
    pub fn delete_selected<S: KeyValueStore>(&mut self, store: &mut RecordStore<S>) -> Result<()> {
        self.require_page(&[Page::Detail], "delete")?;
        let contact = self.selected_or_internal()?;
        store.remove(contact.id);
        self.selected = None;
        self.go(Page::List);
        Ok(())
    }

    /// Set the search term.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAuthenticated`] when nobody is logged in.
    pub fn set_search(&mut self, term: impl Into<String>) -> Result<()> {
        self.require_auth()?;
        self.query.search = term.into();
        Ok(())
    }

    /// Set the sort order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAuthenticated`] when nobody is logged in.
    pub fn set_sort(&mut self, sort: SortOption) -> Result<()> {
        self.require_auth()?;
        self.query.sort = sort;
        Ok(())
    }

    /// Set the group filter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAuthenticated`] when nobody is logged in.
    pub fn set_group_filter(&mut self, group: GroupFilter) -> Result<()> {
        self.require_auth()?;
        self.query.group = group;
        Ok(())
    }

    /// The contacts to display under the current view inputs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAuthenticated`] when nobody is logged in.
    pub fn visible<S: KeyValueStore>(&self, store: &RecordStore<S>) -> Result<Vec<Contact>> {
        self.require_auth()?;
        Ok(query::run(store.all(), &self.query))
    }

    fn go(&mut self, page: Page) {
        debug!(from = %self.page, to = %page, "Page change");
        self.page = page;
    }

    fn require_auth(&self) -> Result<()> {
        if self.authenticated {
            Ok(())
        } else {
            Err(Error::NotAuthenticated)
        }
    }

    fn require_page(&self, allowed: &[Page], action: &'static str) -> Result<()> {
        self.require_auth()?;
        if allowed.contains(&self.page) {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> Error {
        Error::InvalidTransition {
            page: self.page,
            action,
        }
    }

    fn selected_or_internal(&self) -> Result<Contact> {
        self.selected
            .clone()
            .ok_or_else(|| Error::internal(format!("{} page without a selection", self.page)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::Group;
    use crate::storage::MemoryStore;

    fn logged_in() -> (Session, RecordStore<MemoryStore>) {
        let mut session = Session::new(AuthConfig::default());
        session.login("test@example.com", "password").unwrap();
        (session, RecordStore::load(MemoryStore::new()))
    }

    #[test]
    fn test_initial_state() {
        let session = Session::new(AuthConfig::default());
        assert_eq!(session.page(), Page::Login);
        assert!(!session.is_authenticated());
        assert!(session.selected().is_none());
    }

    #[test]
    fn test_login_success() {
        let mut session = Session::new(AuthConfig::default());
        session.login("test@example.com", "password").unwrap();
        assert_eq!(session.page(), Page::List);
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_login_failure_stays_on_login() {
        let mut session = Session::new(AuthConfig::default());
        for (email, password) in [
            ("test@example.com", "wrong"),
            ("TEST@example.com", "password"),
            ("", ""),
        ] {
            let err = session.login(email, password).unwrap_err();
            assert!(err.is_authentication_failure());
            assert_eq!(session.page(), Page::Login);
            assert!(!session.is_authenticated());
        }
    }

    #[test]
    fn test_login_with_configured_credentials() {
        let credentials = AuthConfig {
            email: "me@home.example".to_string(),
            password: "hunter2".to_string(),
        };
        let mut session = Session::new(credentials);
        assert!(session.login("test@example.com", "password").is_err());
        session.login("me@home.example", "hunter2").unwrap();
        assert_eq!(session.page(), Page::List);
    }

    #[test]
    fn test_login_twice_is_invalid() {
        let (mut session, _) = logged_in();
        let err = session.login("test@example.com", "password").unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { page: Page::List, .. }));
    }

    #[test]
    fn test_actions_require_login() {
        let mut session = Session::new(AuthConfig::default());
        let mut store = RecordStore::load(MemoryStore::new());
        let contact = Contact::from_form(1, NewContact::new("Ann", "111"));

        assert!(matches!(session.create(), Err(Error::NotAuthenticated)));
        assert!(matches!(session.show_list(), Err(Error::NotAuthenticated)));
        assert!(matches!(
            session.select(contact.clone()),
            Err(Error::NotAuthenticated)
        ));
        assert!(matches!(session.edit(contact), Err(Error::NotAuthenticated)));
        assert!(matches!(
            session.submit(&mut store, NewContact::new("Ann", "111")),
            Err(Error::NotAuthenticated)
        ));
        assert!(matches!(session.logout(), Err(Error::NotAuthenticated)));
        assert!(matches!(session.visible(&store), Err(Error::NotAuthenticated)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_create_and_submit_adds_contact() {
        let (mut session, mut store) = logged_in();
        session.create().unwrap();
        assert_eq!(session.page(), Page::Add);
        assert!(session.selected().is_none());

        let saved = session
            .submit(&mut store, NewContact::new("Cho", "333"))
            .unwrap();
        assert_eq!(session.page(), Page::List);
        assert_eq!(store.all(), &[saved.clone()]);
        assert_eq!(saved.group, Group::Other);
    }

    #[test]
    fn test_invalid_form_keeps_page_and_store() {
        let (mut session, mut store) = logged_in();
        session.create().unwrap();

        let err = session
            .submit(&mut store, NewContact::new("", "333"))
            .unwrap_err();
        assert!(matches!(err, Error::Validation { field: "name", .. }));
        assert_eq!(session.page(), Page::Add);
        assert!(store.is_empty());
    }

    #[test]
    fn test_select_then_edit_then_submit_updates() {
        let (mut session, mut store) = logged_in();
        let ann = store.add(NewContact::new("Ann", "111"));
        let bob = store.add(NewContact::new("Bob", "222"));

        session.select(ann.clone()).unwrap();
        assert_eq!(session.page(), Page::Detail);
        assert_eq!(session.selected(), Some(&ann));

        session.edit_selected().unwrap();
        assert_eq!(session.page(), Page::Edit);

        let mut form = ann.to_form();
        form.phone = "999".to_string();
        let saved = session.submit(&mut store, form).unwrap();

        assert_eq!(saved.id, ann.id);
        assert_eq!(session.page(), Page::List);
        assert_eq!(store.all()[0].phone, "999");
        assert_eq!(store.all()[1], bob);
    }

    #[test]
    fn test_edit_from_list() {
        let (mut session, mut store) = logged_in();
        let ann = store.add(NewContact::new("Ann", "111"));

        session.edit(ann.clone()).unwrap();
        assert_eq!(session.page(), Page::Edit);
        assert_eq!(session.selected(), Some(&ann));
    }

    #[test]
    fn test_submit_edit_of_deleted_contact_is_noop() {
        let (mut session, mut store) = logged_in();
        let ann = store.add(NewContact::new("Ann", "111"));
        session.edit(ann.clone()).unwrap();
        store.remove(ann.id);

        session.submit(&mut store, ann.to_form()).unwrap();
        assert!(store.is_empty());
        assert_eq!(session.page(), Page::List);
    }

    #[test]
    fn test_delete_selected() {
        let (mut session, mut store) = logged_in();
        let ann = store.add(NewContact::new("Ann", "111"));
        let bob = store.add(NewContact::new("Bob", "222"));

        session.select(ann).unwrap();
        session.delete_selected(&mut store).unwrap();

        assert_eq!(session.page(), Page::List);
        assert!(session.selected().is_none());
        assert_eq!(store.all(), &[bob]);
    }

    #[test]
    fn test_invalid_transitions_leave_state_alone() {
        let (mut session, mut store) = logged_in();
        let ann = store.add(NewContact::new("Ann", "111"));

        let err = session.delete_selected(&mut store).unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { page: Page::List, .. }));
        let err = session.edit_selected().unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
        let err = session
            .submit(&mut store, NewContact::new("X", "1"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));

        session.create().unwrap();
        let err = session.select(ann).unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { page: Page::Add, .. }));
        assert_eq!(session.page(), Page::Add);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_logout_keeps_records() {
        let (mut session, mut store) = logged_in();
        store.add(NewContact::new("Ann", "111"));
        session.create().unwrap();

        session.logout().unwrap();
        assert_eq!(session.page(), Page::Login);
        assert!(!session.is_authenticated());
        assert!(session.selected().is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_visible_uses_view_inputs() {
        let (mut session, mut store) = logged_in();
        let mut form = NewContact::new("Ann", "111");
        form.group = Group::Family;
        store.add(form);
        store.add(NewContact::new("Bob", "222"));
        store.add(NewContact::new("Anya", "333"));

        session.set_sort(SortOption::NameDesc).unwrap();
        let names: Vec<String> = session
            .visible(&store)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Bob", "Anya", "Ann"]);

        session.set_search("AN").unwrap();
        session
            .set_group_filter(GroupFilter::Only(Group::Family))
            .unwrap();
        let visible = session.visible(&store).unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Ann");
    }

    #[test]
    fn test_with_view_sets_initial_inputs() {
        let session = Session::with_view(
            AuthConfig::default(),
            SortOption::DateAdded,
            GroupFilter::Only(Group::Work),
        );
        assert_eq!(session.query().sort, SortOption::DateAdded);
        assert_eq!(session.query().group, GroupFilter::Only(Group::Work));
    }

    #[test]
    fn test_page_display() {
        assert_eq!(Page::Login.to_string(), "login");
        assert_eq!(Page::Detail.to_string(), "detail");
    }
}
