use std::path::Path;

use anyhow::Result;

use crate::cli::ui::pad;
use crate::ingest::{preview, suggest_mapping};

const CELL_WIDTH: usize = 18;

/// Execute the preview command: numbered columns plus a suggested mapping.
pub fn run_preview(file: &Path, delimiter: u8, rows: usize) -> Result<()> {
    let rows = preview(file, delimiter, rows.max(1))?;
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);

    let numbers: Vec<String> = (0..width).map(|i| pad(&format!("[{}]", i), CELL_WIDTH)).collect();
    println!("{}", numbers.join(" ").trim_end());
    for row in &rows {
        let cells: Vec<String> = row.iter().map(|c| pad(c.trim(), CELL_WIDTH)).collect();
        println!("{}", cells.join(" ").trim_end());
    }

    let suggested = suggest_mapping(&rows[0]);
    let mut flags = vec![
        format!("--email {}", suggested.email),
        format!("--name {}", suggested.name),
    ];
    if let Some(company) = suggested.company {
        flags.push(format!("--company {}", company));
    }
    println!("\nSuggested: {}", flags.join(" "));
    Ok(())
}
