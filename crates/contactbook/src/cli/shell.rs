//! Interactive line-oriented session.
//!
//! Each input line is one command. Commands map onto [`Session`] actions;
//! errors are printed and the loop keeps going.

use std::io::{BufRead, Write};
use std::path::Path;

use tracing::debug;

use crate::config::TransferConfig;
use crate::contact::{Contact, Group, NewContact};
use crate::error::{Error, Result};
use crate::query::{GroupFilter, SortOption};
use crate::session::{Page, Session};
use crate::storage::KeyValueStore;
use crate::store::RecordStore;
use crate::transfer::{self, ImportOptions, TableFormat};

use super::commands::OutputFormat;
use super::output::{write_detail, write_list};

const HELP: &str = "\
Commands:
  login EMAIL PASSWORD    log in
  logout                  log out
  list                    show the contact list
  search [TEXT]           filter by name, phone or email (empty clears)
  sort OPTION             name-asc, name-desc or date-added
  group FILTER            all, family, friend, work or other
  select ID               show one contact
  new                     start a new contact
  edit [ID]               edit a contact (the selected one without ID)
  set FIELD VALUE         set a form field (empty VALUE clears it)
  save                    submit the form
  delete                  delete the selected contact
  export FILE             export all contacts to .csv or .xlsx
  import FILE             import contacts from .csv or .xlsx
  page                    show the current page
  help                    show this help
  quit                    leave the shell";

/// What the loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Interactive shell over a session and a record store.
#[derive(Debug)]
pub struct Shell<'a, S> {
    session: Session,
    store: &'a mut RecordStore<S>,
    transfer: TransferConfig,
    draft: Option<NewContact>,
}

impl<'a, S: KeyValueStore> Shell<'a, S> {
    /// Create a shell.
    pub fn new(session: Session, store: &'a mut RecordStore<S>, transfer: TransferConfig) -> Self {
        Self {
            session,
            store,
            transfer,
            draft: None,
        }
    }

    /// The underlying session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Read commands until `quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error when reading input or writing output fails. Command
    /// errors are printed and do not stop the loop.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> Result<()> {
        write!(out, "{}> ", self.session.page())?;
        out.flush()?;
        for line in input.lines() {
            let line = line?;
            match self.execute(line.trim_end_matches('\r'), &mut out) {
                Ok(Flow::Quit) => return Ok(()),
                Ok(Flow::Continue) => {}
                Err(e) => writeln!(out, "error: {e}")?,
            }
            write!(out, "{}> ", self.session.page())?;
            out.flush()?;
        }
        writeln!(out)?;
        Ok(())
    }

    fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow> {
        let (command, raw) = line
            .trim_start()
            .split_once(char::is_whitespace)
            .unwrap_or((line.trim(), ""));
        let rest = raw.trim();
        debug!(command, "Shell command");

        match command {
            "" => {}
            "login" => {
                let mut args = rest.split_whitespace();
                let (Some(email), Some(password)) = (args.next(), args.next()) else {
                    return Err(usage("login EMAIL PASSWORD"));
                };
                self.session.login(email, password)?;
                self.print_list(out)?;
            }
            "logout" => {
                self.session.logout()?;
                self.draft = None;
                writeln!(out, "Logged out.")?;
            }
            "list" => {
                self.session.show_list()?;
                self.draft = None;
                self.print_list(out)?;
            }
            "search" => {
                self.session.set_search(raw)?;
                self.print_list(out)?;
            }
            "sort" => {
                self.session.set_sort(rest.parse::<SortOption>()?)?;
                self.print_list(out)?;
            }
            "group" => {
                self.session.set_group_filter(rest.parse::<GroupFilter>()?)?;
                self.print_list(out)?;
            }
            "select" => {
                let id = parse_id(rest)?;
                let contact = self.lookup(id)?;
                self.session.select(contact)?;
                if let Some(selected) = self.session.selected() {
                    write_detail(out, selected, false)?;
                }
            }
            "new" => {
                self.session.create()?;
                self.draft = Some(NewContact::default());
                writeln!(out, "New contact. Use 'set FIELD VALUE', then 'save'.")?;
            }
            "edit" => {
                if rest.is_empty() {
                    self.session.edit_selected()?;
                } else {
                    let contact = self.lookup(parse_id(rest)?)?;
                    self.session.edit(contact)?;
                }
                self.draft = self.session.selected().map(Contact::to_form);
                writeln!(out, "Editing. Use 'set FIELD VALUE', then 'save'.")?;
            }
            "set" => {
                let (field, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                self.set_field(field, value.trim())?;
            }
            "save" => {
                let form = self.draft.clone().ok_or_else(|| self.invalid("save"))?;
                let saved = self.session.submit(&mut *self.store, form)?;
                self.draft = None;
                writeln!(out, "Saved contact {}.", saved.id)?;
            }
            "delete" => {
                let id = self.session.selected().map(|c| c.id);
                self.session.delete_selected(&mut *self.store)?;
                if let Some(id) = id {
                    writeln!(out, "Deleted contact {id}.")?;
                }
            }
            "export" => {
                let path = self.transfer_path(rest, "export FILE")?;
                let count = transfer::export(
                    self.store.all(),
                    path,
                    TableFormat::from_path(path)?,
                    &self.transfer.sheet_name,
                )?;
                writeln!(out, "Exported {count} contact(s) to {}.", path.display())?;
            }
            "import" => {
                let path = self.transfer_path(rest, "import FILE")?;
                let options = ImportOptions {
                    id_policy: self.transfer.id_policy,
                    strict: self.transfer.strict_import,
                };
                let added =
                    transfer::import(&mut *self.store, path, TableFormat::from_path(path)?, options)?;
                writeln!(out, "Imported {} contact(s).", added.len())?;
            }
            "page" => writeln!(out, "{}", self.session.page())?,
            "help" => writeln!(out, "{HELP}")?,
            "quit" | "exit" => return Ok(Flow::Quit),
            other => writeln!(out, "unknown command '{other}' (try 'help')")?,
        }
        Ok(Flow::Continue)
    }

    fn print_list<W: Write>(&self, out: &mut W) -> Result<()> {
        let visible = self.session.visible(&*self.store)?;
        if visible.is_empty() {
            writeln!(out, "No contacts.")?;
        } else {
            write_list(out, &visible, OutputFormat::Plain)?;
        }
        Ok(())
    }

    fn lookup(&self, id: i64) -> Result<Contact> {
        self.store.get(id).cloned().ok_or(Error::ContactNotFound(id))
    }

    fn set_field(&mut self, field: &str, value: &str) -> Result<()> {
        let action = "set a field";
        if !matches!(self.session.page(), Page::Add | Page::Edit) {
            return Err(self.invalid(action));
        }
        let draft = self.draft.as_mut().ok_or_else(|| Error::internal("form page without a draft"))?;
        let optional = || (!value.is_empty()).then(|| value.to_string());
        match field {
            "name" => draft.name = value.to_string(),
            "phone" => draft.phone = value.to_string(),
            "email" => draft.email = optional(),
            "birthday" => draft.birthday = optional(),
            "company" => draft.company = optional(),
            "memo" => draft.memo = optional(),
            "group" => draft.group = value.parse::<Group>()?,
            _ => {
                return Err(usage(
                    "set name|phone|email|birthday|company|memo|group VALUE",
                ))
            }
        }
        Ok(())
    }

    fn transfer_path<'p>(&self, rest: &'p str, usage_text: &str) -> Result<&'p Path> {
        if !self.session.is_authenticated() {
            return Err(Error::NotAuthenticated);
        }
        if rest.is_empty() {
            return Err(usage(usage_text));
        }
        Ok(Path::new(rest))
    }

    fn invalid(&self, action: &'static str) -> Error {
        if self.session.is_authenticated() {
            Error::InvalidTransition {
                page: self.session.page(),
                action,
            }
        } else {
            Error::NotAuthenticated
        }
    }
}

fn parse_id(text: &str) -> Result<i64> {
    text.parse()
        .map_err(|_| Error::validation("id", format!("'{text}' is not a contact id")))
}

fn usage(text: &str) -> Error {
    Error::validation("command", format!("usage: {text}"))
}
