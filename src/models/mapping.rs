use serde::{Deserialize, Serialize};

use super::Field;

/// Default field delimiter for contact CSV files.
pub const DEFAULT_DELIMITER: u8 = b';';

/// Which CSV column (zero-based) holds each field. `None` means "not in this file".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub email: usize,
    pub name: usize,
    pub client_code: Option<usize>,
    pub address: Option<usize>,
    pub postal_code: Option<usize>,
    pub town: Option<usize>,
    pub city: Option<usize>,
    pub company: Option<usize>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            email: 0,
            name: 0,
            client_code: None,
            address: None,
            postal_code: None,
            town: None,
            city: None,
            company: None,
        }
    }
}

impl ColumnMapping {
    pub fn new(email: usize, name: usize) -> Self {
        Self {
            email,
            name,
            ..Self::default()
        }
    }

    /// Highest column index any mapped field reads from.
    pub fn max_index(&self) -> usize {
        self.optional_columns()
            .iter()
            .filter_map(|(_, idx)| *idx)
            .chain([self.email, self.name])
            .max()
            .unwrap_or(0)
    }

    /// Column for a field, if the file provides it. Additional info never comes from CSV.
    pub fn column_for(&self, field: Field) -> Option<usize> {
        match field {
            Field::Name => Some(self.name),
            Field::AdditionalInfo => None,
            other => self
                .optional_columns()
                .into_iter()
                .find(|(f, _)| *f == other)
                .and_then(|(_, idx)| idx),
        }
    }

    pub fn is_mapped(&self, field: Field) -> bool {
        self.column_for(field).is_some()
    }

    fn optional_columns(&self) -> [(Field, Option<usize>); 6] {
        [
            (Field::ClientCode, self.client_code),
            (Field::Address, self.address),
            (Field::PostalCode, self.postal_code),
            (Field::Town, self.town),
            (Field::City, self.city),
            (Field::Company, self.company),
        ]
    }
}

/// Everything an import run needs besides the file itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOptions {
    pub delimiter: u8,
    pub mapping: ColumnMapping,
    /// Send first-seen emails with a business domain or a company to the commercial table.
    pub auto_classify: bool,
    pub skip_header: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            mapping: ColumnMapping::default(),
            auto_classify: false,
            skip_header: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_index_covers_optional_columns() {
        let mut mapping = ColumnMapping::new(1, 0);
        assert_eq!(mapping.max_index(), 1);

        mapping.city = Some(6);
        mapping.company = Some(3);
        assert_eq!(mapping.max_index(), 6);
    }

    #[test]
    fn column_for_reports_unmapped_fields() {
        let mut mapping = ColumnMapping::new(1, 0);
        mapping.address = Some(2);

        assert_eq!(mapping.column_for(Field::Name), Some(0));
        assert_eq!(mapping.column_for(Field::Address), Some(2));
        assert!(!mapping.is_mapped(Field::Company));
        assert!(!mapping.is_mapped(Field::AdditionalInfo));
    }
}
