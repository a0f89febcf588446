use anyhow::{anyhow, Result};

use crate::cli::display::print_table;
use crate::db::Database;
use crate::models::{Category, Record};

/// Execute the search command
pub fn run_search(db: &Database, query: &str, json: bool) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        return Err(anyhow!("Search query cannot be empty."));
    }

    let results = db.search(query)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No matches.");
        return Ok(());
    }

    let sections: [(Category, Vec<Record>); 3] = [
        (
            Category::Client,
            results.clients.into_iter().map(Record::Contact).collect(),
        ),
        (
            Category::Commercial,
            results.commercial.into_iter().map(Record::Contact).collect(),
        ),
        (
            Category::Invalid,
            results.invalid.into_iter().map(Record::Invalid).collect(),
        ),
    ];

    let mut total = 0;
    for (category, records) in &sections {
        if records.is_empty() {
            continue;
        }
        println!("{} ({})", category.table(), records.len());
        print_table(*category, records);
        println!();
        total += records.len();
    }
    println!("{} matches", total);

    Ok(())
}
