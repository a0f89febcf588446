use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use super::{Category, ContactKind, Field};
use crate::classify::normalize_email;

/// Storage format for `imported_date`.
pub const IMPORTED_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time truncated to the stored (whole second) precision.
pub fn now_imported_date() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// The editable part of a contact, as supplied by an import row or a manual add.
///
/// Absent values are empty strings, never `None`, matching how rows are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFields {
    pub email: String,
    pub name: String,
    pub company: String,
    pub client_code: String,
    pub address: String,
    pub postal_code: String,
    pub town: String,
    pub city: String,
    pub additional_info: String,
}

impl ContactFields {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Trim every value and lowercase the email key.
    pub fn normalized(mut self) -> Self {
        self.email = normalize_email(&self.email);
        for field in ALL_FIELDS {
            let trimmed = self.get(*field).trim().to_string();
            self.set(*field, trimmed);
        }
        self
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Company => &self.company,
            Field::ClientCode => &self.client_code,
            Field::Address => &self.address,
            Field::PostalCode => &self.postal_code,
            Field::Town => &self.town,
            Field::City => &self.city,
            Field::AdditionalInfo => &self.additional_info,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Name => self.name = value,
            Field::Company => self.company = value,
            Field::ClientCode => self.client_code = value,
            Field::Address => self.address = value,
            Field::PostalCode => self.postal_code = value,
            Field::Town => self.town = value,
            Field::City => self.city = value,
            Field::AdditionalInfo => self.additional_info = value,
        }
    }
}

const ALL_FIELDS: &[Field] = &[
    Field::Name,
    Field::Company,
    Field::ClientCode,
    Field::Address,
    Field::PostalCode,
    Field::Town,
    Field::City,
    Field::AdditionalInfo,
];

/// A stored client or commercial contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub kind: ContactKind,
    pub imported_date: NaiveDateTime,
    #[serde(flatten)]
    pub fields: ContactFields,
}

impl Contact {
    pub fn email(&self) -> &str {
        &self.fields.email
    }

    pub fn display_name(&self) -> &str {
        if self.fields.name.is_empty() {
            "(unnamed)"
        } else {
            &self.fields.name
        }
    }
}

/// A stored invalid email. Re-imports never overwrite `reason`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidEmail {
    pub email: String,
    pub name: String,
    pub imported_date: NaiveDateTime,
    pub reason: String,
}

/// One row of any category, as returned by category-generic listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Contact(Contact),
    Invalid(InvalidEmail),
}

impl Record {
    pub fn email(&self) -> &str {
        match self {
            Self::Contact(c) => c.email(),
            Self::Invalid(i) => &i.email,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Self::Contact(c) => c.kind.category(),
            Self::Invalid(_) => Category::Invalid,
        }
    }

    /// Field bundle for moving this record to another category.
    pub fn to_fields(&self) -> ContactFields {
        match self {
            Self::Contact(c) => c.fields.clone(),
            Self::Invalid(i) => ContactFields::new(i.email.clone(), i.name.clone()),
        }
    }
}

/// One detected difference between the stored and incoming value of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: Field,
    pub old: String,
    pub new: String,
}

impl std::fmt::Display for FieldChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: '{}' -> '{}'", self.field.label(), self.old, self.new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_trims_and_lowercases_email() {
        let mut fields = ContactFields::new("  Ana@Example.COM ", "  Ana  ");
        fields.city = " Madrid\t".to_string();

        let fields = fields.normalized();
        assert_eq!(fields.email, "ana@example.com");
        assert_eq!(fields.name, "Ana");
        assert_eq!(fields.city, "Madrid");
    }

    #[test]
    fn field_change_renders_old_and_new() {
        let change = FieldChange {
            field: Field::PostalCode,
            old: "28001".to_string(),
            new: "28002".to_string(),
        };
        assert_eq!(change.to_string(), "postal code: '28001' -> '28002'");
    }

    #[test]
    fn invalid_record_converts_to_fields() {
        let record = Record::Invalid(InvalidEmail {
            email: "bad@".to_string(),
            name: "Bad".to_string(),
            imported_date: now_imported_date(),
            reason: "invalid format".to_string(),
        });
        let fields = record.to_fields();
        assert_eq!(fields.email, "bad@");
        assert_eq!(fields.name, "Bad");
        assert!(fields.company.is_empty());
    }
}
