use anyhow::{bail, Result};
use chrono::NaiveDateTime;
use rusqlite::{params_from_iter, OptionalExtension, Row};
use serde::Serialize;
use tracing::{debug, warn};

use super::invalid::MANUAL_INVALID_REASON;
use super::Database;
use crate::classify::{normalize_email, normalize_for_compare, same_name};
use crate::models::*;

/// Result of an insert-or-update against one contact table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    New,
    Updated { changes: Vec<FieldChange> },
    Unchanged,
    /// Storage failure, already logged. The record was not written.
    Error(String),
}

impl UpsertOutcome {
    pub fn changed_fields(&self) -> Vec<Field> {
        match self {
            Self::Updated { changes } => changes.iter().map(|c| c.field).collect(),
            _ => Vec::new(),
        }
    }
}

/// Matches from every category for one search query.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    pub clients: Vec<Contact>,
    pub commercial: Vec<Contact>,
    pub invalid: Vec<InvalidEmail>,
}

impl SearchResults {
    pub fn total(&self) -> usize {
        self.clients.len() + self.commercial.len() + self.invalid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Parse a stored timestamp, falling back to now for legacy or hand-edited rows.
pub(super) fn parse_imported_date(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, IMPORTED_DATE_FORMAT).unwrap_or_else(|_| now_imported_date())
}

/// Fields whose normalized values differ. Names ignore case.
pub fn diff_fields(
    kind: ContactKind,
    existing: &ContactFields,
    incoming: &ContactFields,
) -> Vec<FieldChange> {
    kind.comparable_fields()
        .iter()
        .filter_map(|&field| {
            let old = existing.get(field);
            let new = incoming.get(field);
            let unchanged = match field {
                Field::Name => same_name(old, new),
                _ => normalize_for_compare(old) == normalize_for_compare(new),
            };
            if unchanged {
                return None;
            }
            debug!(
                field = field.column(),
                old,
                new,
                old_normalized = %normalize_for_compare(old),
                new_normalized = %normalize_for_compare(new),
                "field changed"
            );
            Some(FieldChange {
                field,
                old: old.to_string(),
                new: new.to_string(),
            })
        })
        .collect()
}

fn select_columns(kind: ContactKind) -> String {
    ["email", "imported_date"]
        .into_iter()
        .chain(kind.comparable_fields().iter().map(|f| f.column()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Escape LIKE metacharacters (% _ \)
fn escape_like(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' | '_' | '\\' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}

impl Database {
    // ==================== UPSERT ====================

    pub fn upsert_client(&self, fields: &ContactFields) -> UpsertOutcome {
        self.upsert_contact(ContactKind::Client, fields)
    }

    pub fn upsert_commercial(&self, fields: &ContactFields) -> UpsertOutcome {
        self.upsert_contact(ContactKind::Commercial, fields)
    }

    /// Insert a new contact or overwrite the fields of an existing one that changed.
    ///
    /// Nothing is written when every field normalizes to the stored value.
    /// `imported_date` is only set on insert.
    pub fn upsert_contact(&self, kind: ContactKind, fields: &ContactFields) -> UpsertOutcome {
        match self.try_upsert(kind, fields) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(email = %fields.email, table = kind.table(), error = %e, "upsert failed");
                UpsertOutcome::Error(e.to_string())
            }
        }
    }

    fn try_upsert(&self, kind: ContactKind, fields: &ContactFields) -> Result<UpsertOutcome> {
        let fields = fields.clone().normalized();
        if fields.email.is_empty() {
            bail!("email is required");
        }

        match self.get_contact(kind, &fields.email)? {
            None => {
                self.insert_contact(kind, &fields, now_imported_date())?;
                Ok(UpsertOutcome::New)
            }
            Some(existing) => {
                let changes = diff_fields(kind, &existing.fields, &fields);
                if changes.is_empty() {
                    return Ok(UpsertOutcome::Unchanged);
                }
                // Fields that only differ by case or spacing keep their stored text.
                let which: Vec<Field> = changes.iter().map(|c| c.field).collect();
                self.write_fields(kind, &fields.email, &fields, &which)?;
                Ok(UpsertOutcome::Updated { changes })
            }
        }
    }

    fn insert_contact(
        &self,
        kind: ContactKind,
        fields: &ContactFields,
        imported_date: NaiveDateTime,
    ) -> Result<()> {
        let columns = select_columns(kind);
        let count = kind.comparable_fields().len() + 2;
        let placeholders: Vec<String> = (1..=count).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            kind.table(),
            columns,
            placeholders.join(", ")
        );

        let date = imported_date.format(IMPORTED_DATE_FORMAT).to_string();
        let mut values: Vec<&str> = vec![fields.email.as_str(), date.as_str()];
        values.extend(kind.comparable_fields().iter().map(|f| fields.get(*f)));

        self.conn.execute(&sql, params_from_iter(values))?;
        Ok(())
    }

    /// Overwrite the listed columns of one row with values from `fields`.
    fn write_fields(
        &self,
        kind: ContactKind,
        email: &str,
        fields: &ContactFields,
        which: &[Field],
    ) -> Result<usize> {
        if which.is_empty() {
            return Ok(0);
        }
        let assignments: Vec<String> = which
            .iter()
            .enumerate()
            .map(|(i, f)| format!("{} = ?{}", f.column(), i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE email = ?{}",
            kind.table(),
            assignments.join(", "),
            which.len() + 1
        );

        let mut values: Vec<&str> = which.iter().map(|f| fields.get(*f)).collect();
        values.push(email);

        Ok(self.conn.execute(&sql, params_from_iter(values))?)
    }

    /// Put back the `old` side of each change, undoing a rejected update.
    pub fn revert_fields(&self, kind: ContactKind, email: &str, changes: &[FieldChange]) -> Result<()> {
        let mut original = ContactFields::default();
        for change in changes {
            original.set(change.field, change.old.clone());
        }
        let which: Vec<Field> = changes.iter().map(|c| c.field).collect();
        self.write_fields(kind, &normalize_email(email), &original, &which)?;
        Ok(())
    }

    // ==================== READ ====================

    pub fn get_contact(&self, kind: ContactKind, email: &str) -> Result<Option<Contact>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE email = ?",
            select_columns(kind),
            kind.table()
        );
        let contact = self
            .conn
            .query_row(&sql, [normalize_email(email)], |row| {
                Self::row_to_contact(kind, row)
            })
            .optional()?;
        Ok(contact)
    }

    /// All contacts of one kind in table order.
    pub fn list_contacts(&self, kind: ContactKind) -> Result<Vec<Contact>> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY id",
            select_columns(kind),
            kind.table()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let contacts = stmt
            .query_map([], |row| Self::row_to_contact(kind, row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(contacts)
    }

    pub fn list_clients(&self) -> Result<Vec<Contact>> {
        self.list_contacts(ContactKind::Client)
    }

    pub fn list_commercial(&self) -> Result<Vec<Contact>> {
        self.list_contacts(ContactKind::Commercial)
    }

    pub fn list_all(&self, category: Category) -> Result<Vec<Record>> {
        let records = match category.contact_kind() {
            Some(kind) => self
                .list_contacts(kind)?
                .into_iter()
                .map(Record::Contact)
                .collect(),
            None => self
                .list_invalid()?
                .into_iter()
                .map(Record::Invalid)
                .collect(),
        };
        Ok(records)
    }

    /// Fetch one record from a specific category.
    pub fn get_record(&self, category: Category, email: &str) -> Result<Option<Record>> {
        let record = match category.contact_kind() {
            Some(kind) => self.get_contact(kind, email)?.map(Record::Contact),
            None => self.get_invalid(email)?.map(Record::Invalid),
        };
        Ok(record)
    }

    pub fn count(&self, category: Category) -> Result<i64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", category.table()),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// First category holding `email`, checked client, commercial, invalid.
    pub fn find_category(&self, email: &str) -> Result<Option<Category>> {
        let email = normalize_email(email);
        for category in Category::ALL {
            let found: bool = self.conn.query_row(
                &format!(
                    "SELECT EXISTS(SELECT 1 FROM {} WHERE email = ?)",
                    category.table()
                ),
                [&email],
                |row| row.get(0),
            )?;
            if found {
                return Ok(Some(category));
            }
        }
        Ok(None)
    }

    /// Case-insensitive substring search over every text column of all categories.
    pub fn search(&self, query: &str) -> Result<SearchResults> {
        let pattern = format!("%{}%", escape_like(&query.trim().to_lowercase()));

        let mut results = SearchResults {
            clients: self.search_contacts(ContactKind::Client, &pattern)?,
            commercial: self.search_contacts(ContactKind::Commercial, &pattern)?,
            invalid: Vec::new(),
        };

        let mut stmt = self.conn.prepare(
            r#"SELECT email, name, imported_date, reason FROM invalid_emails
               WHERE LOWER(email) LIKE ?1 ESCAPE '\'
                  OR LOWER(name) LIKE ?1 ESCAPE '\'
                  OR LOWER(reason) LIKE ?1 ESCAPE '\'
               ORDER BY id"#,
        )?;
        results.invalid = stmt
            .query_map([&pattern], Self::row_to_invalid)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(results)
    }

    fn search_contacts(&self, kind: ContactKind, pattern: &str) -> Result<Vec<Contact>> {
        let conditions: Vec<String> = ["email"]
            .into_iter()
            .chain(kind.comparable_fields().iter().map(|f| f.column()))
            .map(|col| format!("LOWER({}) LIKE ?1 ESCAPE '\\'", col))
            .collect();
        let sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY id",
            select_columns(kind),
            kind.table(),
            conditions.join(" OR ")
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let contacts = stmt
            .query_map([pattern], |row| Self::row_to_contact(kind, row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(contacts)
    }

    // ==================== DELETE / MOVE ====================

    /// Remove one row. Returns whether it existed; storage errors are logged and read as `false`.
    pub fn delete_record(&self, category: Category, email: &str) -> bool {
        let sql = format!("DELETE FROM {} WHERE email = ?", category.table());
        match self.conn.execute(&sql, [normalize_email(email)]) {
            Ok(rows) => rows > 0,
            Err(e) => {
                warn!(email, table = category.table(), error = %e, "delete failed");
                false
            }
        }
    }

    /// Remove an email from every category in one transaction.
    pub fn delete_from_all(&self, email: &str) -> Result<usize> {
        let email = normalize_email(email);
        let tx = self.conn.unchecked_transaction()?;
        let mut deleted = 0;
        for category in Category::ALL {
            deleted += tx.execute(
                &format!("DELETE FROM {} WHERE email = ?", category.table()),
                [&email],
            )?;
        }
        tx.commit()?;
        Ok(deleted)
    }

    /// Move a record between categories: delete from `from`, upsert into `to`.
    ///
    /// Both steps share one transaction, so a failure leaves the record where it was.
    /// `reason` is only used when `to` is [`Category::Invalid`].
    pub fn reclassify(
        &self,
        email: &str,
        from: Category,
        to: Category,
        fields: &ContactFields,
        reason: Option<&str>,
    ) -> bool {
        match self.try_reclassify(email, from, to, fields, reason) {
            Ok(()) => true,
            Err(e) => {
                warn!(email, from = from.as_str(), to = to.as_str(), error = %e, "reclassify failed");
                false
            }
        }
    }

    fn try_reclassify(
        &self,
        email: &str,
        from: Category,
        to: Category,
        fields: &ContactFields,
        reason: Option<&str>,
    ) -> Result<()> {
        let email = normalize_email(email);
        let mut fields = fields.clone();
        fields.email = email.clone();

        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute(
            &format!("DELETE FROM {} WHERE email = ?", from.table()),
            [&email],
        )?;
        if removed == 0 {
            debug!(email = %email, from = from.as_str(), "email was not in source category");
        }

        match to.contact_kind() {
            Some(kind) => {
                self.try_upsert(kind, &fields)?;
            }
            None => {
                let reason = reason.unwrap_or(MANUAL_INVALID_REASON);
                self.insert_invalid_row(&email, fields.name.trim(), reason)?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    // ==================== ROW MAPPERS ====================

    fn row_to_contact(kind: ContactKind, row: &Row) -> rusqlite::Result<Contact> {
        // Rows written by older tools may hold NULL instead of ''.
        let text = |column: &str| -> rusqlite::Result<String> {
            Ok(row.get::<_, Option<String>>(column)?.unwrap_or_default())
        };

        let company = match kind {
            ContactKind::Commercial => text("company")?,
            ContactKind::Client => String::new(),
        };

        Ok(Contact {
            kind,
            imported_date: parse_imported_date(&text("imported_date")?),
            fields: ContactFields {
                email: text("email")?,
                name: text("name")?,
                company,
                client_code: text("client_code")?,
                address: text("address")?,
                postal_code: text("postal_code")?,
                town: text("town")?,
                city: text("city")?,
                additional_info: text("additional_info")?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(email: &str, name: &str) -> ContactFields {
        ContactFields::new(email, name)
    }

    #[test]
    fn test_upsert_new_then_unchanged() {
        let db = Database::open_memory().unwrap();
        let fields = client("Ana@Example.com", "Ana");

        assert_eq!(db.upsert_client(&fields), UpsertOutcome::New);
        assert_eq!(db.upsert_client(&fields), UpsertOutcome::Unchanged);

        let stored = db.get_contact(ContactKind::Client, "ana@example.com").unwrap().unwrap();
        assert_eq!(stored.email(), "ana@example.com");
        assert_eq!(stored.fields.name, "Ana");
    }

    #[test]
    fn test_normalized_address_is_unchanged() {
        let db = Database::open_memory().unwrap();
        let mut fields = client("ana@example.com", "Ana");
        fields.address = "Calle Mayor 1".to_string();
        db.upsert_client(&fields);

        fields.address = "Calle Mayor   1".to_string();
        assert_eq!(db.upsert_client(&fields), UpsertOutcome::Unchanged);

        // No write happened: the stored value keeps its original spacing.
        let stored = db.get_contact(ContactKind::Client, "ana@example.com").unwrap().unwrap();
        assert_eq!(stored.fields.address, "Calle Mayor 1");
    }

    #[test]
    fn test_update_reports_changes_and_keeps_imported_date() {
        let db = Database::open_memory().unwrap();
        let mut fields = client("ana@example.com", "Ana");
        db.upsert_client(&fields);
        let before = db.get_contact(ContactKind::Client, "ana@example.com").unwrap().unwrap();

        fields.address = "Calle Falsa 123".to_string();
        fields.city = "Madrid".to_string();
        let outcome = db.upsert_client(&fields);

        assert_eq!(outcome.changed_fields(), vec![Field::Address, Field::City]);
        if let UpsertOutcome::Updated { changes } = &outcome {
            assert_eq!(changes[0].to_string(), "address: '' -> 'Calle Falsa 123'");
        }

        let after = db.get_contact(ContactKind::Client, "ana@example.com").unwrap().unwrap();
        assert_eq!(after.fields.address, "Calle Falsa 123");
        assert_eq!(after.imported_date, before.imported_date);
    }

    #[test]
    fn test_update_leaves_equivalent_fields_alone() {
        let db = Database::open_memory().unwrap();
        db.upsert_client(&client("ana@example.com", "Ana"));

        let mut fields = client("ana@example.com", "ANA");
        fields.address = "Calle Falsa 123".to_string();
        let outcome = db.upsert_client(&fields);
        assert_eq!(outcome.changed_fields(), vec![Field::Address]);

        let stored = db.get_contact(ContactKind::Client, "ana@example.com").unwrap().unwrap();
        assert_eq!(stored.fields.name, "Ana");
        assert_eq!(stored.fields.address, "Calle Falsa 123");

        if let UpsertOutcome::Updated { changes } = outcome {
            db.revert_fields(ContactKind::Client, "ana@example.com", &changes).unwrap();
        }
        let reverted = db.get_contact(ContactKind::Client, "ana@example.com").unwrap().unwrap();
        assert_eq!(reverted.fields, client("ana@example.com", "Ana"));
    }

    #[test]
    fn test_name_case_is_ignored_in_both_tables() {
        let db = Database::open_memory().unwrap();
        db.upsert_client(&client("ana@example.com", "Ana Lopez"));
        db.upsert_commercial(&client("bob@acme.com", "Bob Smith"));

        assert_eq!(
            db.upsert_client(&client("ana@example.com", "ANA LOPEZ")),
            UpsertOutcome::Unchanged
        );
        assert_eq!(
            db.upsert_commercial(&client("bob@acme.com", "bob smith")),
            UpsertOutcome::Unchanged
        );
    }

    #[test]
    fn test_commercial_compares_company() {
        let db = Database::open_memory().unwrap();
        let mut fields = client("bob@acme.com", "Bob");
        fields.company = "Acme".to_string();
        db.upsert_commercial(&fields);

        fields.company = "Acme Corp".to_string();
        let outcome = db.upsert_commercial(&fields);
        assert_eq!(outcome.changed_fields(), vec![Field::Company]);
    }

    #[test]
    fn test_empty_email_is_an_error_outcome() {
        let db = Database::open_memory().unwrap();
        let outcome = db.upsert_client(&client("   ", "Nobody"));
        assert!(matches!(outcome, UpsertOutcome::Error(_)));
        assert_eq!(db.count(Category::Client).unwrap(), 0);
    }

    #[test]
    fn test_revert_fields_restores_old_values() {
        let db = Database::open_memory().unwrap();
        let mut fields = client("ana@example.com", "Ana");
        db.upsert_client(&fields);

        fields.address = "Calle Falsa 123".to_string();
        let UpsertOutcome::Updated { changes } = db.upsert_client(&fields) else {
            panic!("expected an update");
        };

        db.revert_fields(ContactKind::Client, "ana@example.com", &changes).unwrap();
        let stored = db.get_contact(ContactKind::Client, "ana@example.com").unwrap().unwrap();
        assert_eq!(stored.fields.address, "");
    }

    #[test]
    fn test_find_category_priority() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.find_category("x@acme.com").unwrap(), None);

        db.upsert_commercial(&client("x@acme.com", "X"));
        assert_eq!(db.find_category("X@ACME.com").unwrap(), Some(Category::Commercial));

        // Transient double membership: client wins.
        db.upsert_client(&client("x@acme.com", "X"));
        assert_eq!(db.find_category("x@acme.com").unwrap(), Some(Category::Client));

        db.insert_invalid_email("bad@", "", "Invalid format");
        assert_eq!(db.find_category("bad@").unwrap(), Some(Category::Invalid));
    }

    #[test]
    fn test_delete_record() {
        let db = Database::open_memory().unwrap();
        db.upsert_client(&client("ana@example.com", "Ana"));

        assert!(db.delete_record(Category::Client, "ana@example.com"));
        assert!(!db.delete_record(Category::Client, "ana@example.com"));
        assert_eq!(db.find_category("ana@example.com").unwrap(), None);
    }

    #[test]
    fn test_delete_from_all() {
        let db = Database::open_memory().unwrap();
        db.upsert_client(&client("x@acme.com", "X"));
        db.upsert_commercial(&client("x@acme.com", "X"));

        assert_eq!(db.delete_from_all("x@acme.com").unwrap(), 2);
        assert_eq!(db.find_category("x@acme.com").unwrap(), None);
    }

    #[test]
    fn test_reclassify_moves_record() {
        let db = Database::open_memory().unwrap();
        let mut fields = client("x@acme.com", "X");
        fields.city = "Bilbao".to_string();
        db.upsert_client(&fields);

        fields.company = "Acme".to_string();
        assert!(db.reclassify("x@acme.com", Category::Client, Category::Commercial, &fields, None));

        assert_eq!(db.count(Category::Client).unwrap(), 0);
        let moved = db.get_contact(ContactKind::Commercial, "x@acme.com").unwrap().unwrap();
        assert_eq!(moved.fields.city, "Bilbao");
        assert_eq!(moved.fields.company, "Acme");
    }

    #[test]
    fn test_reclassify_to_invalid_uses_reason() {
        let db = Database::open_memory().unwrap();
        db.upsert_client(&client("x@acme.com", "X"));

        let fields = client("x@acme.com", "X");
        assert!(db.reclassify("x@acme.com", Category::Client, Category::Invalid, &fields, Some("bounced")));
        let invalid = db.get_invalid("x@acme.com").unwrap().unwrap();
        assert_eq!(invalid.reason, "bounced");

        assert!(db.reclassify("x@acme.com", Category::Invalid, Category::Client, &fields, None));
        let record = db.get_record(Category::Client, "x@acme.com").unwrap();
        assert!(record.is_some());
        assert_eq!(db.count(Category::Invalid).unwrap(), 0);
    }

    #[test]
    fn test_reclassify_rolls_back_on_failure() {
        let db = Database::open_memory().unwrap();
        db.upsert_client(&client("x@acme.com", "X"));
        db.conn()
            .execute_batch("DROP TABLE commercial_contacts;")
            .unwrap();

        let fields = client("x@acme.com", "X");
        assert!(!db.reclassify("x@acme.com", Category::Client, Category::Commercial, &fields, None));
        assert_eq!(db.count(Category::Client).unwrap(), 1);
    }

    #[test]
    fn test_list_all_in_table_order() {
        let db = Database::open_memory().unwrap();
        for email in ["c@x.com", "a@x.com", "b@x.com"] {
            db.upsert_client(&client(email, "N"));
        }

        let emails: Vec<String> = db
            .list_all(Category::Client)
            .unwrap()
            .iter()
            .map(|r| r.email().to_string())
            .collect();
        assert_eq!(emails, vec!["c@x.com", "a@x.com", "b@x.com"]);
    }

    #[test]
    fn test_search_spans_categories() {
        let db = Database::open_memory().unwrap();
        let mut ana = client("ana@example.com", "Ana");
        ana.town = "Getafe".to_string();
        db.upsert_client(&ana);
        let mut acme = client("info@getafe-motor.com", "Info");
        acme.company = "Motor SL".to_string();
        db.upsert_commercial(&acme);
        db.insert_invalid_email("getafe@", "", "Invalid format");
        db.upsert_client(&client("other@example.com", "Other"));

        let results = db.search("GETAFE").unwrap();
        assert_eq!(results.clients.len(), 1);
        assert_eq!(results.commercial.len(), 1);
        assert_eq!(results.invalid.len(), 1);
        assert_eq!(results.total(), 3);
    }

    #[test]
    fn test_search_escapes_wildcards() {
        let db = Database::open_memory().unwrap();
        db.upsert_client(&client("ana@example.com", "Ana"));
        assert!(db.search("%").unwrap().is_empty());
    }
}
