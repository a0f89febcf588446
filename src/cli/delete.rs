use anyhow::{anyhow, Result};

use crate::cli::display::print_record;
use crate::cli::ui::{confirm, error};
use crate::cli::Scope;
use crate::db::Database;
use crate::models::Category;

/// Execute the delete command
pub fn run_delete(db: &Database, scope: Scope, email: &str, force: bool) -> Result<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(anyhow!("Email cannot be empty."));
    }

    match scope.category() {
        Some(category) => delete_one(db, category, email, force),
        None => delete_everywhere(db, email, force),
    }
}

fn delete_one(db: &Database, category: Category, email: &str, force: bool) -> Result<()> {
    let Some(record) = db.get_record(category, email)? else {
        println!("No {} with email {}.", category.label(), email);
        return Ok(());
    };

    print_record(&record);
    println!();

    if !force && !confirm(&format!("Delete {}?", record.email()), false) {
        return Ok(());
    }

    if db.delete_record(category, email) {
        println!("Deleted.");
    } else {
        error(&format!("failed to delete {}", email));
    }
    Ok(())
}

fn delete_everywhere(db: &Database, email: &str, force: bool) -> Result<()> {
    let mut found = Vec::new();
    for category in Category::ALL {
        if let Some(record) = db.get_record(category, email)? {
            found.push(record);
        }
    }

    if found.is_empty() {
        println!("No matches.");
        return Ok(());
    }

    for record in &found {
        print_record(record);
    }
    println!();

    if !force && !confirm(&format!("Delete {} from every list?", email), false) {
        return Ok(());
    }

    let deleted = db.delete_from_all(email)?;
    println!("Deleted {} records.", deleted);
    Ok(())
}
