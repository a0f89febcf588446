use anyhow::Result;
use rusqlite::{params, OptionalExtension};

use super::Database;
use crate::models::{ColumnMapping, Field, ImportOptions};

pub const SETTING_EMAIL_INDEX: &str = "email_index";
pub const SETTING_NAME_INDEX: &str = "name_index";
pub const SETTING_CLIENT_CODE_INDEX: &str = "client_code_index";
pub const SETTING_ADDRESS_INDEX: &str = "address_index";
pub const SETTING_POSTAL_CODE_INDEX: &str = "postal_code_index";
pub const SETTING_TOWN_INDEX: &str = "town_index";
pub const SETTING_CITY_INDEX: &str = "city_index";
pub const SETTING_COMPANY_INDEX: &str = "company_index";
pub const SETTING_DELIMITER: &str = "delimiter";
pub const SETTING_AUTO_CLASSIFY: &str = "auto_classify";
pub const SETTING_SKIP_HEADER: &str = "skip_header";

/// Stored in place of an index for a column the file does not have.
const UNMAPPED: i64 = -1;

const OPTIONAL_INDEX_KEYS: [(Field, &str); 6] = [
    (Field::ClientCode, SETTING_CLIENT_CODE_INDEX),
    (Field::Address, SETTING_ADDRESS_INDEX),
    (Field::PostalCode, SETTING_POSTAL_CODE_INDEX),
    (Field::Town, SETTING_TOWN_INDEX),
    (Field::City, SETTING_CITY_INDEX),
    (Field::Company, SETTING_COMPANY_INDEX),
];

fn index_value(idx: Option<usize>) -> String {
    idx.map(|i| i.to_string())
        .unwrap_or_else(|| UNMAPPED.to_string())
}

fn parse_index(value: &str) -> Option<usize> {
    value.trim().parse::<i64>().ok().filter(|i| *i >= 0).map(|i| i as usize)
}

fn set_optional(mapping: &mut ColumnMapping, field: Field, idx: Option<usize>) {
    match field {
        Field::ClientCode => mapping.client_code = idx,
        Field::Address => mapping.address = idx,
        Field::PostalCode => mapping.postal_code = idx,
        Field::Town => mapping.town = idx,
        Field::City => mapping.city = idx,
        Field::Company => mapping.company = idx,
        Field::Name | Field::AdditionalInfo => {}
    }
}

impl Database {
    // ==================== SETTINGS ====================

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM config WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO config (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Persist the options of the last import so the next one can default to them.
    pub fn save_import_options(&self, options: &ImportOptions) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let mapping = &options.mapping;

        self.set_setting(SETTING_EMAIL_INDEX, &mapping.email.to_string())?;
        self.set_setting(SETTING_NAME_INDEX, &mapping.name.to_string())?;
        for (field, key) in OPTIONAL_INDEX_KEYS {
            self.set_setting(key, &index_value(mapping.column_for(field)))?;
        }
        self.set_setting(SETTING_DELIMITER, &(options.delimiter as char).to_string())?;
        self.set_setting(SETTING_AUTO_CLASSIFY, if options.auto_classify { "1" } else { "0" })?;
        self.set_setting(SETTING_SKIP_HEADER, if options.skip_header { "1" } else { "0" })?;

        tx.commit()?;
        Ok(())
    }

    /// Options saved by [`save_import_options`](Self::save_import_options).
    ///
    /// `None` until an email index has been stored. Missing or malformed keys
    /// fall back to their defaults.
    pub fn load_import_options(&self) -> Result<Option<ImportOptions>> {
        let Some(email) = self
            .get_setting(SETTING_EMAIL_INDEX)?
            .as_deref()
            .and_then(parse_index)
        else {
            return Ok(None);
        };

        let name = self
            .get_setting(SETTING_NAME_INDEX)?
            .as_deref()
            .and_then(parse_index)
            .unwrap_or(0);

        let mut mapping = ColumnMapping::new(email, name);
        for (field, key) in OPTIONAL_INDEX_KEYS {
            let idx = self.get_setting(key)?.as_deref().and_then(parse_index);
            set_optional(&mut mapping, field, idx);
        }

        let mut options = ImportOptions {
            mapping,
            ..ImportOptions::default()
        };
        if let Some(delimiter) = self.get_setting(SETTING_DELIMITER)? {
            if let [byte] = delimiter.as_bytes() {
                options.delimiter = *byte;
            }
        }
        options.auto_classify = self.get_setting(SETTING_AUTO_CLASSIFY)?.as_deref() == Some("1");
        options.skip_header = self.get_setting(SETTING_SKIP_HEADER)?.as_deref() == Some("1");

        Ok(Some(options))
    }
}
