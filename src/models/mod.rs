mod category;
mod contact;
mod mapping;

pub use category::{Category, ContactKind, Field};
pub use contact::{
    now_imported_date, Contact, ContactFields, FieldChange, InvalidEmail, Record,
    IMPORTED_DATE_FORMAT,
};
pub use mapping::{ColumnMapping, ImportOptions, DEFAULT_DELIMITER};
