use anyhow::Result;

use crate::cli::display::print_table;
use crate::db::Database;
use crate::models::Category;

/// Execute the list command
pub fn run_list(db: &Database, category: Category, json: bool) -> Result<()> {
    let records = db.list_all(category)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No {} records.", category.as_str());
        return Ok(());
    }

    print_table(category, &records);
    println!("\n{} {} records", records.len(), category.as_str());
    Ok(())
}
