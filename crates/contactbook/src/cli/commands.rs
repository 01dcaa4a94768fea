//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::contact::{Group, NewContact};
use crate::query::{GroupFilter, SortOption};
use crate::transfer::TableFormat;

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Only show contacts whose name, phone or email contains this text
    #[arg(short, long)]
    pub search: Option<String>,

    /// Sort order (defaults to the configured view)
    #[arg(long, value_enum)]
    pub sort: Option<SortArg>,

    /// Only show one group (defaults to the configured view)
    #[arg(short, long, value_enum)]
    pub group: Option<GroupFilterArg>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Contact id
    pub id: i64,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Optional contact fields shared by `add` and `edit`.
#[derive(Debug, Default, Args)]
pub struct DetailArgs {
    /// Email address
    #[arg(long)]
    pub email: Option<String>,

    /// Birthday as YYYY-MM-DD
    #[arg(long)]
    pub birthday: Option<String>,

    /// Company
    #[arg(long)]
    pub company: Option<String>,

    /// Free-form memo
    #[arg(long)]
    pub memo: Option<String>,

    /// Group
    #[arg(short, long, value_enum)]
    pub group: Option<GroupArg>,
}

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Name
    #[arg(short, long)]
    pub name: String,

    /// Phone number
    #[arg(short, long)]
    pub phone: String,

    /// Optional fields
    #[command(flatten)]
    pub details: DetailArgs,
}

impl AddCommand {
    /// Build the new-contact form.
    #[must_use]
    pub fn into_form(self) -> NewContact {
        let mut form = NewContact::new(self.name, self.phone);
        self.details.apply(&mut form);
        form
    }
}

/// Edit command arguments. Fields not given keep their current value;
/// an empty value clears an optional field.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Contact id
    pub id: i64,

    /// New name
    #[arg(short, long)]
    pub name: Option<String>,

    /// New phone number
    #[arg(short, long)]
    pub phone: Option<String>,

    /// Optional fields
    #[command(flatten)]
    pub details: DetailArgs,
}

impl EditCommand {
    /// Overlay the given fields on an existing form.
    pub fn apply(self, form: &mut NewContact) {
        if let Some(name) = self.name {
            form.name = name;
        }
        if let Some(phone) = self.phone {
            form.phone = phone;
        }
        self.details.apply(form);
    }
}

impl DetailArgs {
    fn apply(self, form: &mut NewContact) {
        if self.email.is_some() {
            form.email = self.email;
        }
        if self.birthday.is_some() {
            form.birthday = self.birthday;
        }
        if self.company.is_some() {
            form.company = self.company;
        }
        if self.memo.is_some() {
            form.memo = self.memo;
        }
        if let Some(group) = self.group {
            form.group = group.into();
        }
    }
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Contact id
    pub id: i64,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Destination file
    pub file: PathBuf,

    /// File format (defaults to the file extension)
    #[arg(short, long, value_enum)]
    pub format: Option<FileFormatArg>,
}

/// Import command arguments.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// Source file
    pub file: PathBuf,

    /// File format (defaults to the file extension)
    #[arg(short, long, value_enum)]
    pub format: Option<FileFormatArg>,

    /// Assign new ids instead of keeping the ones in the file
    #[arg(long)]
    pub fresh_ids: bool,

    /// Reject rows with an empty name or phone
    #[arg(long)]
    pub strict: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Contact group argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GroupArg {
    /// Family
    Family,
    /// Friends
    Friend,
    /// Work
    Work,
    /// Everyone else
    Other,
}

impl From<GroupArg> for Group {
    fn from(arg: GroupArg) -> Self {
        match arg {
            GroupArg::Family => Self::Family,
            GroupArg::Friend => Self::Friend,
            GroupArg::Work => Self::Work,
            GroupArg::Other => Self::Other,
        }
    }
}

/// Group filter argument for listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GroupFilterArg {
    /// Every group
    All,
    /// Family
    Family,
    /// Friends
    Friend,
    /// Work
    Work,
    /// Everyone else
    Other,
}

impl From<GroupFilterArg> for GroupFilter {
    fn from(arg: GroupFilterArg) -> Self {
        match arg {
            GroupFilterArg::All => Self::All,
            GroupFilterArg::Family => Self::Only(Group::Family),
            GroupFilterArg::Friend => Self::Only(Group::Friend),
            GroupFilterArg::Work => Self::Only(Group::Work),
            GroupFilterArg::Other => Self::Only(Group::Other),
        }
    }
}

/// Sort order argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    /// Name, A to Z
    NameAsc,
    /// Name, Z to A
    NameDesc,
    /// Newest first
    DateAdded,
}

impl From<SortArg> for SortOption {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::NameAsc => Self::NameAsc,
            SortArg::NameDesc => Self::NameDesc,
            SortArg::DateAdded => Self::DateAdded,
        }
    }
}

/// Spreadsheet file format argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FileFormatArg {
    /// Comma-separated values
    Csv,
    /// Excel workbook
    Xlsx,
}

impl From<FileFormatArg> for TableFormat {
    fn from(arg: FileFormatArg) -> Self {
        match arg {
            FileFormatArg::Csv => Self::Csv,
            FileFormatArg::Xlsx => Self::Xlsx,
        }
    }
}

/// Output format for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One contact per line
    #[default]
    Plain,
    /// Aligned columns with a header
    Table,
    /// JSON array
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_arg_conversion() {
        assert_eq!(Group::from(GroupArg::Family), Group::Family);
        assert_eq!(Group::from(GroupArg::Friend), Group::Friend);
        assert_eq!(Group::from(GroupArg::Work), Group::Work);
        assert_eq!(Group::from(GroupArg::Other), Group::Other);
    }

    #[test]
    fn test_group_filter_arg_conversion() {
        assert_eq!(GroupFilter::from(GroupFilterArg::All), GroupFilter::All);
        assert_eq!(
            GroupFilter::from(GroupFilterArg::Work),
            GroupFilter::Only(Group::Work)
        );
    }

    #[test]
    fn test_sort_arg_conversion() {
        assert_eq!(SortOption::from(SortArg::NameAsc), SortOption::NameAsc);
        assert_eq!(SortOption::from(SortArg::NameDesc), SortOption::NameDesc);
        assert_eq!(SortOption::from(SortArg::DateAdded), SortOption::DateAdded);
    }

    #[test]
    fn test_file_format_arg_conversion() {
        assert_eq!(TableFormat::from(FileFormatArg::Csv), TableFormat::Csv);
        assert_eq!(TableFormat::from(FileFormatArg::Xlsx), TableFormat::Xlsx);
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_add_into_form() {
        let cmd = AddCommand {
            name: "Ann".to_string(),
            phone: "111".to_string(),
            details: DetailArgs {
                company: Some("Acme".to_string()),
                group: Some(GroupArg::Work),
                ..DetailArgs::default()
            },
        };
        let form = cmd.into_form();
        assert_eq!(form.name, "Ann");
        assert_eq!(form.company.as_deref(), Some("Acme"));
        assert_eq!(form.group, Group::Work);
        assert!(form.email.is_none());
    }

    #[test]
    fn test_edit_keeps_unspecified_fields() {
        let mut form = NewContact::new("Ann", "111");
        form.email = Some("ann@example.com".to_string());
        form.memo = Some("old".to_string());

        EditCommand {
            id: 1,
            name: None,
            phone: Some("999".to_string()),
            details: DetailArgs {
                memo: Some(String::new()),
                ..DetailArgs::default()
            },
        }
        .apply(&mut form);

        assert_eq!(form.name, "Ann");
        assert_eq!(form.phone, "999");
        assert_eq!(form.email.as_deref(), Some("ann@example.com"));
        assert_eq!(form.memo.as_deref(), Some(""));
        assert!(form.normalized().memo.is_none());
    }
}
