use anyhow::{anyhow, bail, Result};

use crate::db::Database;
use crate::models::Category;

/// Execute the reclassify command
pub fn run_reclassify(db: &Database, email: &str, to: Category, reason: Option<&str>) -> Result<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(anyhow!("Email cannot be empty."));
    }

    let Some(from) = db.find_category(email)? else {
        println!("No matches.");
        return Ok(());
    };
    if from == to {
        println!("Already a {}.", to.label());
        return Ok(());
    }

    let record = db
        .get_record(from, email)?
        .ok_or_else(|| anyhow!("{} disappeared from {}", email, from.table()))?;

    if !db.reclassify(email, from, to, &record.to_fields(), reason) {
        bail!("could not move {} to {}", email, to.table());
    }
    println!("Moved {} from {} to {}.", record.email(), from.table(), to.table());
    Ok(())
}
