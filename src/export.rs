//! Write each category to a semicolon-separated, BOM-prefixed CSV that
//! spreadsheet tools open without an import dialog.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::db::Database;
use crate::models::{Category, Contact, InvalidEmail, Record, IMPORTED_DATE_FORMAT};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const EXPORT_DELIMITER: u8 = b';';

const CLIENT_HEADERS: &[&str] = &[
    "Name",
    "Email",
    "Imported Date",
    "Client Code",
    "Address",
    "Postal Code",
    "Town",
    "City",
    "Additional Info",
];

const COMMERCIAL_HEADERS: &[&str] = &[
    "Name",
    "Email",
    "Company",
    "Imported Date",
    "Client Code",
    "Address",
    "Postal Code",
    "Town",
    "City",
    "Additional Info",
];

const INVALID_HEADERS: &[&str] = &["Email", "Name", "Imported Date", "Reason"];

pub fn headers(category: Category) -> &'static [&'static str] {
    match category {
        Category::Client => CLIENT_HEADERS,
        Category::Commercial => COMMERCIAL_HEADERS,
        Category::Invalid => INVALID_HEADERS,
    }
}

/// File name used by [`export_all`].
pub fn file_name(category: Category) -> String {
    format!("{}.csv", category.table())
}

fn contact_row(contact: &Contact) -> Vec<String> {
    let f = &contact.fields;
    let date = contact.imported_date.format(IMPORTED_DATE_FORMAT).to_string();
    let mut row = vec![f.name.clone(), f.email.clone()];
    if contact.kind.category() == Category::Commercial {
        row.push(f.company.clone());
    }
    row.extend([
        date,
        f.client_code.clone(),
        f.address.clone(),
        f.postal_code.clone(),
        f.town.clone(),
        f.city.clone(),
        f.additional_info.clone(),
    ]);
    row
}

fn invalid_row(invalid: &InvalidEmail) -> Vec<String> {
    vec![
        invalid.email.clone(),
        invalid.name.clone(),
        invalid.imported_date.format(IMPORTED_DATE_FORMAT).to_string(),
        invalid.reason.clone(),
    ]
}

/// Pad with empty cells or cut so every row matches the header width.
fn fit_to_width(mut row: Vec<String>, width: usize) -> Vec<String> {
    row.resize(width, String::new());
    row
}

/// Write `records` under the header row for `category`.
pub fn write_records<W: Write>(mut out: W, category: Category, records: &[Record]) -> Result<()> {
    out.write_all(UTF8_BOM)?;
    let header = headers(category);
    let mut writer = csv::WriterBuilder::new()
        .delimiter(EXPORT_DELIMITER)
        .from_writer(out);

    writer.write_record(header)?;
    for record in records {
        let row = match record {
            Record::Contact(contact) => contact_row(contact),
            Record::Invalid(invalid) => invalid_row(invalid),
        };
        writer.write_record(fit_to_width(row, header.len()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Export one category to `path`. Returns the number of records written.
pub fn export_category(db: &Database, category: Category, path: &Path) -> Result<usize> {
    let records = db.list_all(category)?;
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_records(file, category, &records)?;
    info!(category = category.as_str(), count = records.len(), path = %path.display(), "exported");
    Ok(records.len())
}

/// Export every category into `dir`, one file each.
pub fn export_all(db: &Database, dir: &Path) -> Result<Vec<(PathBuf, usize)>> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let mut written = Vec::with_capacity(Category::ALL.len());
    for category in Category::ALL {
        let path = dir.join(file_name(category));
        let count = export_category(db, category, &path)?;
        written.push((path, count));
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContactFields;

    #[test]
    fn writes_bom_header_and_rows() {
        let db = Database::open_memory().unwrap();
        let mut fields = ContactFields::new("ana@example.com", "Ana");
        fields.city = "Madrid".to_string();
        db.upsert_client(&fields);

        let mut out = Vec::new();
        write_records(&mut out, Category::Client, &db.list_all(Category::Client).unwrap()).unwrap();

        assert!(out.starts_with(UTF8_BOM));
        let text = String::from_utf8(out[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Name;Email;Imported Date;Client Code;Address;Postal Code;Town;City;Additional Info"
        );
        let cells: Vec<&str> = lines[1].split(';').collect();
        assert_eq!(cells.len(), 9);
        assert_eq!(cells[0], "Ana");
        assert_eq!(cells[7], "Madrid");
    }

    #[test]
    fn commercial_rows_include_company() {
        let db = Database::open_memory().unwrap();
        let mut fields = ContactFields::new("bob@acme.com", "Bob");
        fields.company = "Acme; Inc".to_string();
        db.upsert_commercial(&fields);

        let mut out = Vec::new();
        write_records(&mut out, Category::Commercial, &db.list_all(Category::Commercial).unwrap()).unwrap();
        let text = String::from_utf8(out[UTF8_BOM.len()..].to_vec()).unwrap();

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .from_reader(text.as_bytes());
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(row.len(), 10);
        assert_eq!(&row[2], "Acme; Inc");
    }

    #[test]
    fn rows_fit_header_width() {
        assert_eq!(fit_to_width(vec!["a".into()], 3), vec!["a", "", ""]);
        assert_eq!(fit_to_width(vec!["a".into(), "b".into(), "c".into()], 2), vec!["a", "b"]);
    }

    #[test]
    fn export_all_writes_three_files() {
        let db = Database::open_memory().unwrap();
        db.insert_invalid_email("bad@", "Bad", "Invalid format");
        let dir = tempfile::tempdir().unwrap();

        let written = export_all(&db, dir.path()).unwrap();
        assert_eq!(written.len(), 3);
        assert!(dir.path().join("clients.csv").exists());
        assert!(dir.path().join("commercial_contacts.csv").exists());

        let invalid = std::fs::read_to_string(dir.path().join("invalid_emails.csv")).unwrap();
        assert!(invalid.contains("Email;Name;Imported Date;Reason"));
        assert!(invalid.contains("bad@;Bad;"));
        assert_eq!(written[2].1, 1);
    }
}
