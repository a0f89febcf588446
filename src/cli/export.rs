use std::path::Path;

use anyhow::Result;

use crate::cli::Scope;
use crate::db::Database;
use crate::export::{export_all, export_category};

/// Execute the export command
pub fn run_export(db: &Database, scope: Scope, path: &Path) -> Result<()> {
    match scope.category() {
        Some(category) => {
            let count = export_category(db, category, path)?;
            println!("Exported {} {} records to {}", count, category.as_str(), path.display());
        }
        None => {
            for (file, count) in export_all(db, path)? {
                println!("  {:>6}  {}", count, file.display());
            }
            println!("Exported to {}", path.display());
        }
    }
    Ok(())
}
