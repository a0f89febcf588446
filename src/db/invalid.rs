use anyhow::Result;
use rusqlite::{params, OptionalExtension, Row};
use tracing::warn;

use super::contacts::parse_imported_date;
use super::Database;
use crate::classify::normalize_email;
use crate::models::{now_imported_date, InvalidEmail, IMPORTED_DATE_FORMAT};

/// Reason recorded when an imported address fails the syntax check.
pub const INVALID_FORMAT_REASON: &str = "Invalid format";

/// Default reason when a record is moved to the invalid category by hand.
pub const MANUAL_INVALID_REASON: &str = "Manually marked as invalid";

impl Database {
    /// Record an invalid email. An existing row, and its reason, is left alone.
    ///
    /// Returns whether a row was written. Storage errors are logged and read as `false`.
    pub fn insert_invalid_email(&self, email: &str, name: &str, reason: &str) -> bool {
        match self.insert_invalid_row(email, name, reason) {
            Ok(written) => written,
            Err(e) => {
                warn!(email, error = %e, "failed to record invalid email");
                false
            }
        }
    }

    pub(super) fn insert_invalid_row(&self, email: &str, name: &str, reason: &str) -> Result<bool> {
        let date = now_imported_date().format(IMPORTED_DATE_FORMAT).to_string();
        let rows = self.conn.execute(
            "INSERT OR IGNORE INTO invalid_emails (email, name, imported_date, reason)
             VALUES (?1, ?2, ?3, ?4)",
            params![normalize_email(email), name.trim(), date, reason],
        )?;
        Ok(rows > 0)
    }

    pub fn get_invalid(&self, email: &str) -> Result<Option<InvalidEmail>> {
        let invalid = self
            .conn
            .query_row(
                "SELECT email, name, imported_date, reason FROM invalid_emails WHERE email = ?",
                [normalize_email(email)],
                Self::row_to_invalid,
            )
            .optional()?;
        Ok(invalid)
    }

    pub fn list_invalid(&self) -> Result<Vec<InvalidEmail>> {
        let mut stmt = self.conn.prepare(
            "SELECT email, name, imported_date, reason FROM invalid_emails ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], Self::row_to_invalid)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub(super) fn row_to_invalid(row: &Row) -> rusqlite::Result<InvalidEmail> {
        let date: Option<String> = row.get("imported_date")?;
        Ok(InvalidEmail {
            email: row.get("email")?,
            name: row.get::<_, Option<String>>("name")?.unwrap_or_default(),
            imported_date: parse_imported_date(date.as_deref().unwrap_or_default()),
            reason: row.get::<_, Option<String>>("reason")?.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    #[test]
    fn test_insert_invalid_once() {
        let db = Database::open_memory().unwrap();

        assert!(db.insert_invalid_email("Bad@", "Bad", INVALID_FORMAT_REASON));
        assert!(!db.insert_invalid_email("bad@", "Other", "something else"));

        let stored = db.get_invalid("bad@").unwrap().unwrap();
        assert_eq!(stored.name, "Bad");
        assert_eq!(stored.reason, INVALID_FORMAT_REASON);
        assert_eq!(db.count(Category::Invalid).unwrap(), 1);
    }

    #[test]
    fn test_list_invalid_in_insert_order() {
        let db = Database::open_memory().unwrap();
        db.insert_invalid_email("z@", "", INVALID_FORMAT_REASON);
        db.insert_invalid_email("a@", "", INVALID_FORMAT_REASON);

        let emails: Vec<String> = db.list_invalid().unwrap().into_iter().map(|i| i.email).collect();
        assert_eq!(emails, vec!["z@", "a@"]);
    }

    #[test]
    fn test_insert_invalid_reports_storage_failure() {
        let db = Database::open_memory().unwrap();
        db.conn().execute_batch("DROP TABLE invalid_emails;").unwrap();
        assert!(!db.insert_invalid_email("bad@", "", INVALID_FORMAT_REASON));
    }
}
