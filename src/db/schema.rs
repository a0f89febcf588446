/// Ordered migrations. Index 0 is version 1; append only.
pub const MIGRATIONS: &[&str] = &[SCHEMA_V1, MIGRATION_V2];

pub const SCHEMA_VERSION: i32 = MIGRATIONS.len() as i32;

pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY,
    version INTEGER NOT NULL
);
"#;

pub const SCHEMA_V1: &str = r#"
-- Regular clients
CREATE TABLE IF NOT EXISTS clients (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL UNIQUE,
    imported_date TEXT NOT NULL,
    client_code TEXT NOT NULL DEFAULT '',
    address TEXT NOT NULL DEFAULT '',
    postal_code TEXT NOT NULL DEFAULT '',
    town TEXT NOT NULL DEFAULT '',
    city TEXT NOT NULL DEFAULT '',
    additional_info TEXT NOT NULL DEFAULT ''
);

-- Business contacts
CREATE TABLE IF NOT EXISTS commercial_contacts (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL UNIQUE,
    imported_date TEXT NOT NULL,
    company TEXT NOT NULL DEFAULT '',
    client_code TEXT NOT NULL DEFAULT '',
    address TEXT NOT NULL DEFAULT '',
    postal_code TEXT NOT NULL DEFAULT '',
    town TEXT NOT NULL DEFAULT '',
    city TEXT NOT NULL DEFAULT '',
    additional_info TEXT NOT NULL DEFAULT ''
);

-- Addresses that failed validation or were marked invalid by hand
CREATE TABLE IF NOT EXISTS invalid_emails (
    id INTEGER PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL DEFAULT '',
    imported_date TEXT NOT NULL,
    reason TEXT NOT NULL DEFAULT ''
);

-- Persisted settings (last column mapping, delimiter, ...)
CREATE TABLE IF NOT EXISTS config (
    id INTEGER PRIMARY KEY,
    key TEXT NOT NULL UNIQUE,
    value TEXT NOT NULL
);
"#;

/// V2 migration: index import dates for listing by recency
pub const MIGRATION_V2: &str = r#"
CREATE INDEX IF NOT EXISTS idx_clients_imported ON clients(imported_date);
CREATE INDEX IF NOT EXISTS idx_commercial_imported ON commercial_contacts(imported_date);
"#;
