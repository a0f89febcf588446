//! CSV ingestion: decode the file, pull mapped columns out of each row and
//! collapse rows that share an email.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::classify::normalize_email;
use crate::error::ImportError;
use crate::models::{ColumnMapping, ContactFields, Field};

mod encoding;

pub use encoding::{decode_text, read_text, TextEncoding};

/// Outcome of reading one CSV file.
#[derive(Debug, Clone, Default)]
pub struct IngestResult {
    /// One bundle per distinct email, in order of first appearance. Values come
    /// from the last row carrying that email.
    pub records: Vec<ContactFields>,
    pub rows_read: usize,
    pub skipped_insufficient_columns: usize,
    pub skipped_empty_email: usize,
}

impl IngestResult {
    /// Rows folded into an earlier row with the same email.
    pub fn duplicate_rows(&self) -> usize {
        self.rows_read
            .saturating_sub(self.skipped_insufficient_columns)
            .saturating_sub(self.skipped_empty_email)
            .saturating_sub(self.records.len())
    }
}

fn csv_reader(text: &str, delimiter: u8) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes())
}

fn cell(record: &csv::StringRecord, column: Option<usize>) -> String {
    column
        .and_then(|idx| record.get(idx))
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

/// Read every row of `path` through `mapping`.
///
/// The first row is treated as data unless `skip_header` is set: once the
/// caller has chosen column indices there is no header detection.
pub fn read_csv(
    path: &Path,
    mapping: &ColumnMapping,
    delimiter: u8,
    skip_header: bool,
) -> Result<IngestResult, ImportError> {
    let (text, _) = read_text(path)?;
    if text.trim().is_empty() {
        return Err(ImportError::Empty);
    }
    parse_rows(&text, mapping, delimiter, skip_header)
}

/// Parse already-decoded CSV text. Split out so callers holding text can reuse it.
pub fn parse_rows(
    text: &str,
    mapping: &ColumnMapping,
    delimiter: u8,
    skip_header: bool,
) -> Result<IngestResult, ImportError> {
    let mut reader = csv_reader(text, delimiter);
    let mut result = IngestResult::default();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let required = mapping.max_index();

    for (idx, row) in reader.records().enumerate() {
        let record = row?;
        if skip_header && idx == 0 {
            continue;
        }
        result.rows_read += 1;

        if record.len() <= required {
            result.skipped_insufficient_columns += 1;
            debug!(
                line = idx + 1,
                columns = record.len(),
                needed = required + 1,
                "skipping row with too few columns"
            );
            continue;
        }

        let email = normalize_email(&cell(&record, Some(mapping.email)));
        if email.is_empty() {
            result.skipped_empty_email += 1;
            debug!(line = idx + 1, "skipping row without email");
            continue;
        }

        let mut fields = ContactFields::new(email.clone(), String::new());
        for field in [
            Field::Name,
            Field::ClientCode,
            Field::Address,
            Field::PostalCode,
            Field::Town,
            Field::City,
            Field::Company,
        ] {
            fields.set(field, cell(&record, mapping.column_for(field)));
        }

        match positions.get(&email) {
            Some(&pos) => result.records[pos] = fields,
            None => {
                positions.insert(email, result.records.len());
                result.records.push(fields);
            }
        }
    }

    Ok(result)
}

/// First `rows` rows (header included) for showing the user numbered columns.
pub fn preview(path: &Path, delimiter: u8, rows: usize) -> Result<Vec<Vec<String>>, ImportError> {
    let (text, _) = read_text(path)?;
    let mut reader = csv_reader(&text, delimiter);
    let mut out = Vec::with_capacity(rows);
    for row in reader.records().take(rows) {
        out.push(row?.iter().map(str::to_string).collect());
    }
    if out.is_empty() {
        return Err(ImportError::Empty);
    }
    Ok(out)
}

/// Guess column indices from header text. Falls back to name=0, email=1.
pub fn suggest_mapping(headers: &[String]) -> ColumnMapping {
    let mut mapping = ColumnMapping::new(1, 0);
    for (i, header) in headers.iter().enumerate() {
        let header = header.to_lowercase();
        if header.contains("email") || header.contains("correo") {
            mapping.email = i;
        } else if header.contains("empresa")
            || header.contains("compañía")
            || header.contains("company")
        {
            mapping.company = Some(i);
        } else if header.contains("nombre") || header.contains("name") {
            mapping.name = i;
        }
    }
    mapping
}
