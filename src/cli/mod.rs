use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::models::Category;

pub mod add;
pub mod delete;
pub mod display;
pub mod export;
pub mod import;
pub mod list;
pub mod preview;
pub mod reclassify;
pub mod search;
pub mod ui;

pub use add::run_add;
pub use delete::run_delete;
pub use export::run_export;
pub use import::run_import;
pub use list::run_list;
pub use preview::run_preview;
pub use reclassify::run_reclassify;
pub use search::run_search;

#[derive(Parser)]
#[command(name = "contactsort")]
#[command(about = "Import, classify and export contact lists from CSV files")]
#[command(version)]
pub struct Cli {
    /// Database file [default: config dir, or $CONTACTSORT_DB]
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,
    /// Print debug logging to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import a CSV file, merging it with stored contacts
    Import(ImportArgs),
    /// Show the first rows of a CSV file with column numbers
    Preview(PreviewArgs),
    /// Add or update a single contact
    Add(AddArgs),
    /// List every record in a category
    List(ListArgs),
    /// Search all categories
    Search(SearchArgs),
    /// Delete a record
    Delete(DeleteArgs),
    /// Move a record to another category
    Reclassify(ReclassifyArgs),
    /// Export categories to semicolon-separated CSV
    Export(ExportArgs),
}

/// One stored category on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    #[value(alias = "clients")]
    Client,
    #[value(alias = "commercial_contacts")]
    Commercial,
    #[value(alias = "invalid_emails")]
    Invalid,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Client => Category::Client,
            CategoryArg::Commercial => Category::Commercial,
            CategoryArg::Invalid => Category::Invalid,
        }
    }
}

/// A category, or every category at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scope {
    #[value(alias = "clients")]
    Client,
    #[value(alias = "commercial_contacts")]
    Commercial,
    #[value(alias = "invalid_emails")]
    Invalid,
    All,
}

impl Scope {
    pub fn category(&self) -> Option<Category> {
        match self {
            Self::Client => Some(Category::Client),
            Self::Commercial => Some(Category::Commercial),
            Self::Invalid => Some(Category::Invalid),
            Self::All => None,
        }
    }
}

/// Target category for `add`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AddCategory {
    #[default]
    Auto,
    Client,
    Commercial,
    Invalid,
}

/// Accepts a single ASCII character, or `tab`.
pub fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => match s.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(format!("delimiter must be one ASCII character, got '{}'", s)),
        },
    }
}

/// An optional column on the command line: an index, or `none` to leave it unmapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnArg {
    Index(usize),
    Unused,
}

impl ColumnArg {
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Index(idx) => Some(idx),
            Self::Unused => None,
        }
    }
}

/// Accepts a column number, or `none` / `-1` for "not in this file".
pub fn parse_column(s: &str) -> Result<ColumnArg, String> {
    match s.trim() {
        "none" | "-" | "-1" => Ok(ColumnArg::Unused),
        other => other
            .parse()
            .map(ColumnArg::Index)
            .map_err(|_| format!("expected a column number or 'none', got '{}'", s)),
    }
}

#[derive(Args)]
pub struct ImportArgs {
    /// CSV file to import
    pub file: PathBuf,
    /// Field delimiter [default: last used, or ;]
    #[arg(short, long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Column number (from 0) of the email address
    #[arg(long, value_name = "N")]
    pub email: Option<usize>,
    #[arg(long, value_name = "N")]
    pub name: Option<usize>,
    /// Optional columns take a number, or `none` to drop a saved mapping
    #[arg(long, value_name = "N|none", value_parser = parse_column, allow_negative_numbers = true)]
    pub client_code: Option<ColumnArg>,
    #[arg(long, value_name = "N|none", value_parser = parse_column, allow_negative_numbers = true)]
    pub address: Option<ColumnArg>,
    #[arg(long, value_name = "N|none", value_parser = parse_column, allow_negative_numbers = true)]
    pub postal_code: Option<ColumnArg>,
    #[arg(long, value_name = "N|none", value_parser = parse_column, allow_negative_numbers = true)]
    pub town: Option<ColumnArg>,
    #[arg(long, value_name = "N|none", value_parser = parse_column, allow_negative_numbers = true)]
    pub city: Option<ColumnArg>,
    #[arg(long, value_name = "N|none", value_parser = parse_column, allow_negative_numbers = true)]
    pub company: Option<ColumnArg>,
    /// Ignore saved column settings and guess from the first row
    #[arg(long)]
    pub reset_mapping: bool,
    /// Send new business-domain or company contacts to the commercial list
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub auto_classify: Option<bool>,
    /// Treat the first row as a header
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub skip_header: Option<bool>,
    /// Keep every detected change without asking
    #[arg(short, long, conflicts_with = "no")]
    pub yes: bool,
    /// Reject every detected change without asking
    #[arg(short, long)]
    pub no: bool,
    /// Print the import report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct PreviewArgs {
    pub file: PathBuf,
    #[arg(short, long, value_parser = parse_delimiter, default_value = ";")]
    pub delimiter: u8,
    #[arg(short, long, default_value = "5")]
    pub rows: usize,
}

#[derive(Args)]
pub struct AddArgs {
    /// Prompted for when omitted
    #[arg(short, long)]
    pub email: Option<String>,
    #[arg(short, long)]
    pub name: Option<String>,
    #[arg(long)]
    pub company: Option<String>,
    #[arg(long)]
    pub client_code: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub postal_code: Option<String>,
    #[arg(long)]
    pub town: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    /// Free-form notes, stored as additional info
    #[arg(long)]
    pub info: Option<String>,
    #[arg(short, long, value_enum, default_value_t = AddCategory::Auto)]
    pub category: AddCategory,
    /// Reason stored with an invalid email
    #[arg(long)]
    pub reason: Option<String>,
    /// Keep changes to an existing contact without asking
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(value_enum)]
    pub category: CategoryArg,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Text to look for in any field
    pub query: String,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct DeleteArgs {
    #[arg(value_enum)]
    pub scope: Scope,
    pub email: String,
    /// Skip confirmation
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ReclassifyArgs {
    pub email: String,
    #[arg(value_enum)]
    pub to: CategoryArg,
    /// Reason stored when moving to invalid
    #[arg(long)]
    pub reason: Option<String>,
}

#[derive(Args)]
pub struct ExportArgs {
    #[arg(value_enum)]
    pub scope: Scope,
    /// Output file, or directory for `all`
    pub path: PathBuf,
}
