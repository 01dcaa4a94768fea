//! Text rendering of contacts for the terminal.

use std::io::Write;

use crate::contact::Contact;
use crate::error::Result;

use super::commands::OutputFormat;

/// Write a contact listing in the given format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_list<W: Write>(out: &mut W, contacts: &[Contact], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Plain => {
            for c in contacts {
                writeln!(out, "{}\t{}\t{}\t{}", c.id, c.name, c.phone, c.group)?;
            }
        }
        OutputFormat::Table => write_table(out, contacts)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, contacts)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn write_table<W: Write>(out: &mut W, contacts: &[Contact]) -> Result<()> {
    if contacts.is_empty() {
        writeln!(out, "No contacts.")?;
        return Ok(());
    }

    let rows: Vec<[String; 5]> = contacts
        .iter()
        .map(|c| {
            [
                c.id.to_string(),
                c.name.clone(),
                c.phone.clone(),
                c.email.clone().unwrap_or_default(),
                c.group.to_string(),
            ]
        })
        .collect();
    let headers = ["ID", "NAME", "PHONE", "EMAIL", "GROUP"];

    let mut widths = headers.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    write_row(out, &headers, &widths)?;
    for row in &rows {
        write_row(out, row, &widths)?;
    }
    writeln!(out, "{} contact(s)", rows.len())?;
    Ok(())
}

fn write_row<W: Write, S: AsRef<str>>(out: &mut W, cells: &[S], widths: &[usize]) -> Result<()> {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell.as_ref()))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(out, "{}", line.trim_end())?;
    Ok(())
}

/// Write the detail view of one contact.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_detail<W: Write>(out: &mut W, contact: &Contact, json: bool) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, contact)?;
        writeln!(out)?;
        return Ok(());
    }

    let optional = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    writeln!(out, "Id:        {}", contact.id)?;
    writeln!(out, "Name:      {}", contact.name)?;
    writeln!(out, "Phone:     {}", contact.phone)?;
    writeln!(out, "Email:     {}", optional(&contact.email))?;
    writeln!(out, "Birthday:  {}", optional(&contact.birthday))?;
    writeln!(out, "Company:   {}", optional(&contact.company))?;
    writeln!(out, "Group:     {}", contact.group)?;
    writeln!(out, "Memo:      {}", optional(&contact.memo))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::{Group, NewContact};

    fn contacts() -> Vec<Contact> {
        let mut ann = NewContact::new("Ann", "111");
        ann.email = Some("ann@example.com".to_string());
        ann.group = Group::Family;
        vec![
            Contact::from_form(1, ann),
            Contact::from_form(2, NewContact::new("Bob", "222")),
        ]
    }

    fn render(format: OutputFormat) -> String {
        let mut out = Vec::new();
        write_list(&mut out, &contacts(), format).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_plain_list() {
        assert_eq!(render(OutputFormat::Plain), "1\tAnn\t111\tfamily\n2\tBob\t222\tother\n");
    }

    #[test]
    fn test_table_list() {
        let text = render(OutputFormat::Table);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "ID  NAME  PHONE  EMAIL            GROUP");
        assert_eq!(lines[1], "1   Ann   111    ann@example.com  family");
        assert_eq!(lines[2], "2   Bob   222                     other");
        assert_eq!(lines[3], "2 contact(s)");
    }

    #[test]
    fn test_empty_table() {
        let mut out = Vec::new();
        write_list(&mut out, &[], OutputFormat::Table).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No contacts.\n");
    }

    #[test]
    fn test_json_list() {
        let parsed: Vec<Contact> = serde_json::from_str(&render(OutputFormat::Json)).unwrap();
        assert_eq!(parsed, contacts());
    }

    #[test]
    fn test_detail() {
        let mut out = Vec::new();
        write_detail(&mut out, &contacts()[0], false).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Name:      Ann"));
        assert!(text.contains("Email:     ann@example.com"));
        assert!(text.contains("Company:   -"));
    }
}
