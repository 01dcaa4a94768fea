//! Bulk export and import of contacts as spreadsheet tables.
//!
//! Records are converted to and from a format-neutral [`Table`] (a header row
//! plus data rows of [`Cell`]s). The table is then written or read as CSV or
//! as an XLSX workbook.
//!
//! Import parses the whole file before touching the store, so a bad row
//! rejects the file without appending anything. A successful import is
//! appended as one batch with a single persistence write.

mod delimited;
mod workbook;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use tracing::{debug, info};

use crate::contact::{Contact, Group, NewContact};
use crate::error::{Error, Result};
use crate::storage::KeyValueStore;
use crate::store::{IdPolicy, PendingRecord, RecordStore};

pub use delimited::{read_csv, write_csv};
pub use workbook::{read_xlsx, write_xlsx};

/// Column names, in export order.
pub const COLUMNS: [&str; 8] = [
    "id", "name", "phone", "email", "birthday", "company", "memo", "group",
];

/// Default worksheet name for exported workbooks.
pub const DEFAULT_SHEET_NAME: &str = "contacts";

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// No value.
    Empty,
    /// A text value.
    Text(String),
    /// A numeric value.
    Number(f64),
}

impl Cell {
    /// An id cell: a number when the id survives the trip through `f64`,
    /// text otherwise.
    #[allow(clippy::cast_precision_loss)]
    fn from_id(id: i64) -> Self {
        if id.unsigned_abs() <= MAX_EXACT_ID {
            Self::Number(id as f64)
        } else {
            Self::Text(id.to_string())
        }
    }

    fn from_optional(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => Self::Text(v.to_string()),
            _ => Self::Empty,
        }
    }

    /// Text form of the cell; `None` for empty cells.
    ///
    /// Integral numbers print without a fractional part, so a phone number
    /// typed as a number in a spreadsheet comes back as its digits.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Text(s) if s.is_empty() => None,
            Self::Text(s) => Some(s.clone()),
            Self::Number(n) => Some(integral(*n).map_or_else(|| n.to_string(), |i| i.to_string())),
        }
    }

    /// Interpret the cell as an optional integer id.
    ///
    /// # Errors
    ///
    /// Returns a message when the cell holds something other than an integer.
    pub fn to_id(&self) -> std::result::Result<Option<i64>, String> {
        match self {
            Self::Empty => Ok(None),
            Self::Number(n) => integral(*n)
                .map(Some)
                .ok_or_else(|| format!("'{n}' is not an integer id")),
            Self::Text(s) if s.trim().is_empty() => Ok(None),
            Self::Text(s) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| format!("'{s}' is not an integer id")),
        }
    }
}

static EMPTY_CELL: Cell = Cell::Empty;

/// Largest magnitude at which every integer is exactly representable as `f64`.
const MAX_EXACT_F64_INT: f64 = 9_007_199_254_740_992.0;
const MAX_EXACT_ID: u64 = 1 << 53;

#[allow(clippy::cast_possible_truncation)]
fn integral(n: f64) -> Option<i64> {
    (n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_EXACT_F64_INT).then(|| n as i64)
}

/// A header row and its data rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Column names from the first row.
    pub headers: Vec<String>,
    /// Data rows; a row may be shorter than the header.
    pub rows: Vec<Vec<Cell>>,
}

/// Spreadsheet file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Comma-separated values.
    Csv,
    /// Office Open XML workbook.
    Xlsx,
}

impl TableFormat {
    /// Pick a format from a file's extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for anything but `.csv` and `.xlsx`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("xlsx") => Ok(Self::Xlsx),
            Some(other) => Err(Error::UnsupportedFormat(format!(".{other}"))),
            None => Err(Error::UnsupportedFormat(format!(
                "{} has no extension",
                path.display()
            ))),
        }
    }
}

/// Options for [`import`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// How imported records get their ids.
    pub id_policy: IdPolicy,
    /// Reject rows with an empty name or phone.
    pub strict: bool,
}

/// Build the export table for a set of contacts.
#[must_use]
pub fn contacts_to_table(contacts: &[Contact]) -> Table {
    let rows = contacts
        .iter()
        .map(|c| {
            vec![
                Cell::from_id(c.id),
                Cell::from_optional(Some(&c.name)),
                Cell::from_optional(Some(&c.phone)),
                Cell::from_optional(c.email.as_deref()),
                Cell::from_optional(c.birthday.as_deref()),
                Cell::from_optional(c.company.as_deref()),
                Cell::from_optional(c.memo.as_deref()),
                Cell::Text(c.group.to_string()),
            ]
        })
        .collect();

    Table {
        headers: COLUMNS.iter().map(ToString::to_string).collect(),
        rows,
    }
}

/// Turn an import table into pending records.
///
/// Row numbers in errors are spreadsheet rows: the header is row 1.
///
/// # Errors
///
/// Returns [`Error::ImportHeader`] when `name` or `phone` has no column, and
/// [`Error::ImportCell`] for a malformed id or group, or (when `strict`) an
/// empty name or phone.
pub fn table_to_records(table: &Table, strict: bool) -> Result<Vec<PendingRecord>> {
    let index: HashMap<&str, usize> = table
        .headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.as_str(), i))
        .collect();

    for required in ["name", "phone"] {
        if !index.contains_key(required) {
            return Err(Error::ImportHeader {
                column: required.to_string(),
            });
        }
    }
    for header in &table.headers {
        if !COLUMNS.contains(&header.as_str()) {
            debug!(column = %header, "Ignoring unknown import column");
        }
    }

    let mut records = Vec::with_capacity(table.rows.len());
    for (i, row) in table.rows.iter().enumerate() {
        if row.iter().all(|cell| cell.to_text().is_none()) {
            continue;
        }
        let row_number = i + 2;
        let fields = RowView { index: &index, row };
        let text = |column: &str| fields.cell(column).to_text();

        let id = fields
            .cell("id")
            .to_id()
            .map_err(|message| Error::import_cell(row_number, "id", message))?;

        let name = text("name").unwrap_or_default();
        let phone = text("phone").unwrap_or_default();
        if strict {
            for (column, value) in [("name", &name), ("phone", &phone)] {
                if value.trim().is_empty() {
                    return Err(Error::import_cell(row_number, column, "must not be empty"));
                }
            }
        }

        let group = match text("group") {
            None => Group::default(),
            Some(value) => value.parse::<Group>().map_err(|_| {
                Error::import_cell(row_number, "group", format!("unknown group '{value}'"))
            })?,
        };

        records.push(PendingRecord {
            id,
            fields: NewContact {
                name,
                phone,
                email: text("email"),
                birthday: text("birthday"),
                company: text("company"),
                memo: text("memo"),
                group,
            },
        });
    }
    Ok(records)
}

/// Cells of one row addressed by header name.
struct RowView<'a> {
    index: &'a HashMap<&'a str, usize>,
    row: &'a [Cell],
}

impl<'a> RowView<'a> {
    fn cell(&self, column: &str) -> &'a Cell {
        self.index
            .get(column)
            .and_then(|&col| self.row.get(col))
            .unwrap_or(&EMPTY_CELL)
    }
}

/// Read a table from a file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or parsed.
pub fn read_table(path: &Path, format: TableFormat) -> Result<Table> {
    match format {
        TableFormat::Csv => read_csv(BufReader::new(File::open(path)?)),
        TableFormat::Xlsx => read_xlsx(path),
    }
}

/// Write a table to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_table(table: &Table, path: &Path, format: TableFormat, sheet_name: &str) -> Result<()> {
    match format {
        TableFormat::Csv => write_csv(table, BufWriter::new(File::create(path)?)),
        TableFormat::Xlsx => write_xlsx(table, path, sheet_name),
    }
}

/// Export every contact to `path`. Returns the number of rows written.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn export(contacts: &[Contact], path: &Path, format: TableFormat, sheet_name: &str) -> Result<usize> {
    let table = contacts_to_table(contacts);
    write_table(&table, path, format, sheet_name)?;
    info!(count = contacts.len(), path = %path.display(), "Exported contacts");
    Ok(contacts.len())
}

/// Import every row of `path` into `store` as one batch.
///
/// Nothing is appended unless the whole file parses.
///
/// # Errors
///
/// Returns an error if the file cannot be read or any row is rejected.
pub fn import<S: KeyValueStore>(
    store: &mut RecordStore<S>,
    path: &Path,
    format: TableFormat,
    options: ImportOptions,
) -> Result<Vec<Contact>> {
    let table = read_table(path, format)?;
    let pending = table_to_records(&table, options.strict)?;
    let appended = store.append_batch(pending, options.id_policy);
    info!(count = appended.len(), path = %path.display(), "Imported contacts");
    Ok(appended)
}
