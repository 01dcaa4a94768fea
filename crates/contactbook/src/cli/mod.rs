//! Command-line interface for contactbook.
//!
//! This module provides the CLI structure, output rendering and the
//! interactive shell for the `cbook` binary.

mod commands;
mod output;
mod shell;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, ConfigCommand, DeleteCommand, DetailArgs, EditCommand, ExportCommand,
    FileFormatArg, GroupArg, GroupFilterArg, ImportCommand, ListCommand, OutputFormat,
    ShowCommand, SortArg,
};
pub use output::{write_detail, write_list};
pub use shell::Shell;

use crate::logging::Verbosity;

/// cbook - a local address book
///
/// Keeps contacts in a local database with search, sorting, groups and
/// CSV/XLSX export and import.
#[derive(Debug, Parser)]
#[command(name = "cbook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Login email
    #[arg(long, global = true, env = "CONTACTBOOK_EMAIL")]
    pub email: Option<String>,

    /// Login password
    #[arg(long, global = true, env = "CONTACTBOOK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List contacts
    List(ListCommand),

    /// Show one contact
    Show(ShowCommand),

    /// Add a contact
    Add(AddCommand),

    /// Change fields of a contact
    Edit(EditCommand),

    /// Delete a contact
    Delete(DeleteCommand),

    /// Export all contacts to a CSV or XLSX file
    Export(ExportCommand),

    /// Import contacts from a CSV or XLSX file
    Import(ImportCommand),

    /// Start an interactive session
    Shell,

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "cbook");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(parse(&["cbook", "shell"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["cbook", "-v", "shell"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["cbook", "-vv", "shell"]).verbosity(), Verbosity::Trace);
        assert_eq!(parse(&["cbook", "shell", "-q"]).verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn test_parse_list() {
        let cli = parse(&[
            "cbook", "list", "--search", "ann", "--sort", "date-added", "--group", "family",
            "--format", "json",
        ]);
        let Command::List(list) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(list.search.as_deref(), Some("ann"));
        assert_eq!(list.sort, Some(SortArg::DateAdded));
        assert_eq!(list.group, Some(GroupFilterArg::Family));
        assert_eq!(list.format, OutputFormat::Json);
    }

    #[test]
    fn test_parse_list_defaults() {
        let Command::List(list) = parse(&["cbook", "list"]).command else {
            panic!("expected list");
        };
        assert!(list.sort.is_none());
        assert!(list.group.is_none());
        assert_eq!(list.format, OutputFormat::Table);
    }

    #[test]
    fn test_parse_add() {
        let cli = parse(&[
            "cbook", "add", "--name", "Ann", "--phone", "111", "--group", "work", "--email",
            "ann@example.com",
        ]);
        let Command::Add(add) = cli.command else {
            panic!("expected add");
        };
        let form = add.into_form();
        assert_eq!(form.name, "Ann");
        assert_eq!(form.email.as_deref(), Some("ann@example.com"));
        assert_eq!(form.group, crate::contact::Group::Work);
    }

    #[test]
    fn test_add_requires_name_and_phone() {
        assert!(Cli::try_parse_from(["cbook", "add", "--name", "Ann"]).is_err());
        assert!(Cli::try_parse_from(["cbook", "add", "--phone", "111"]).is_err());
    }

    #[test]
    fn test_parse_edit() {
        let Command::Edit(edit) = parse(&["cbook", "edit", "42", "--phone", "999"]).command else {
            panic!("expected edit");
        };
        assert_eq!(edit.id, 42);
        assert_eq!(edit.phone.as_deref(), Some("999"));
        assert!(edit.name.is_none());
    }

    #[test]
    fn test_parse_import() {
        let cli = parse(&["cbook", "import", "book.xlsx", "--fresh-ids", "--strict"]);
        let Command::Import(import) = cli.command else {
            panic!("expected import");
        };
        assert_eq!(import.file, PathBuf::from("book.xlsx"));
        assert!(import.fresh_ids);
        assert!(import.strict);
        assert!(import.format.is_none());
    }

    #[test]
    fn test_parse_export_with_format() {
        let Command::Export(export) = parse(&["cbook", "export", "out.dat", "-f", "csv"]).command
        else {
            panic!("expected export");
        };
        assert_eq!(export.format, Some(FileFormatArg::Csv));
    }

    #[test]
    fn test_parse_credentials() {
        let cli = parse(&[
            "cbook", "--email", "a@b.c", "--password", "secret", "delete", "7",
        ]);
        assert_eq!(cli.email.as_deref(), Some("a@b.c"));
        assert_eq!(cli.password.as_deref(), Some("secret"));
        assert!(matches!(cli.command, Command::Delete(DeleteCommand { id: 7 })));
    }

    #[test]
    fn test_parse_config_subcommands() {
        assert!(matches!(
            parse(&["cbook", "config", "show", "--json"]).command,
            Command::Config(ConfigCommand::Show { json: true })
        ));
        assert!(matches!(
            parse(&["cbook", "config", "path"]).command,
            Command::Config(ConfigCommand::Path)
        ));
        assert!(matches!(
            parse(&["cbook", "-c", "/tmp/c.toml", "config", "validate"]).command,
            Command::Config(ConfigCommand::Validate { file: None })
        ));
    }

    #[test]
    fn test_parse_invalid_group() {
        assert!(Cli::try_parse_from(["cbook", "list", "--group", "enemies"]).is_err());
    }
}
