//! CSV encoding of tables.

use std::io::{Read, Write};

use crate::error::Result;

use super::{Cell, Table};

/// Write `table` as CSV, header row first.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(&table.headers)?;
    for row in &table.rows {
        csv.write_record(row.iter().map(|cell| cell.to_text().unwrap_or_default()))?;
    }
    csv.flush()?;
    Ok(())
}

/// Read CSV into a table. The first record is the header.
///
/// Rows may have fewer or more fields than the header. Empty fields become
/// [`Cell::Empty`].
///
/// # Errors
///
/// Returns an error if the input is not valid CSV.
pub fn read_csv<R: Read>(reader: R) -> Result<Table> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv.headers()?.iter().map(ToString::to_string).collect();
    let mut rows = Vec::new();
    for record in csv.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok(Table { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_quotes_special_characters() {
        let table = Table {
            headers: vec!["name".to_string(), "memo".to_string()],
            rows: vec![vec![
                Cell::Text("Smith, Jo".to_string()),
                Cell::Text("said \"hi\"".to_string()),
            ]],
        };
        let mut out = Vec::new();
        write_csv(&table, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "name,memo\n\"Smith, Jo\",\"said \"\"hi\"\"\"\n");
    }

    #[test]
    fn test_write_numbers_and_empty_cells() {
        let table = Table {
            headers: vec!["id".to_string(), "email".to_string()],
            rows: vec![vec![Cell::Number(1_700_000_000_000.0), Cell::Empty]],
        };
        let mut out = Vec::new();
        write_csv(&table, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "id,email\n1700000000000,\n");
    }

    #[test]
    fn test_read_ragged_rows() {
        let input = "name,phone,group\nAnn,111\nBob,222,work,extra\n";
        let table = read_csv(input.as_bytes()).unwrap();

        assert_eq!(table.headers, vec!["name", "phone", "group"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].len(), 2);
        assert_eq!(table.rows[1][2], Cell::Text("work".to_string()));
    }

    #[test]
    fn test_read_empty_fields() {
        let table = read_csv("name,phone\n,111\n".as_bytes()).unwrap();
        assert_eq!(table.rows[0][0], Cell::Empty);
    }

    #[test]
    fn test_read_empty_input() {
        let table = read_csv("".as_bytes()).unwrap();
        assert!(table.headers.is_empty());
        assert!(table.rows.is_empty());
    }
}
