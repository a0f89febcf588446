use anyhow::Result;

use crate::classify::{is_valid_email, normalize_email};
use crate::cli::ui::{warning, PromptDecider};
use crate::cli::ImportArgs;
use crate::db::Database;
use crate::ingest::{preview, suggest_mapping};
use crate::models::{ColumnMapping, ImportOptions, DEFAULT_DELIMITER};
use crate::reconcile::{import_batch, FixedDecider, Session, SessionReport};

/// Execute the import command.
pub fn run_import(db: &Database, args: &ImportArgs) -> Result<()> {
    let options = resolve_options(db, args)?;
    if !args.json {
        eprintln!("Importing: {}", args.file.display());
        eprintln!("  {}", describe_mapping(&options));
    }

    let mut session = Session::new();
    let report = if args.yes {
        import_batch(db, &args.file, &options, &mut session, &mut FixedDecider::accept_all())?
    } else if args.no {
        import_batch(db, &args.file, &options, &mut session, &mut FixedDecider::reject_all())?
    } else {
        import_batch(db, &args.file, &options, &mut session, &mut PromptDecider)?
    };

    // Remember what worked for next time
    if let Err(e) = db.save_import_options(&options) {
        warning(&format!("could not save import settings: {}", e));
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

/// Flags override the saved options; without saved options (or with
/// `--reset-mapping`) the first row is used to guess columns.
pub fn resolve_options(db: &Database, args: &ImportArgs) -> Result<ImportOptions> {
    let saved = if args.reset_mapping {
        None
    } else {
        db.load_import_options()?
    };
    let delimiter = args
        .delimiter
        .or(saved.map(|o| o.delimiter))
        .unwrap_or(DEFAULT_DELIMITER);

    let (mut mapping, header_guess) = match saved {
        Some(saved) => (saved.mapping, None),
        None => {
            let rows = preview(&args.file, delimiter, 1)?;
            let mapping = suggest_mapping(&rows[0]);
            let looks_like_header = rows[0]
                .get(mapping.email)
                .map(|cell| !is_valid_email(&normalize_email(cell)))
                .unwrap_or(false);
            (mapping, Some(looks_like_header))
        }
    };
    apply_flags(&mut mapping, args);

    Ok(ImportOptions {
        delimiter,
        mapping,
        auto_classify: args
            .auto_classify
            .or(saved.map(|o| o.auto_classify))
            .unwrap_or(false),
        skip_header: args
            .skip_header
            .or(saved.map(|o| o.skip_header))
            .or(header_guess)
            .unwrap_or(false),
    })
}

fn apply_flags(mapping: &mut ColumnMapping, args: &ImportArgs) {
    if let Some(email) = args.email {
        mapping.email = email;
    }
    if let Some(name) = args.name {
        mapping.name = name;
    }
    let optional = [
        (args.client_code, &mut mapping.client_code),
        (args.address, &mut mapping.address),
        (args.postal_code, &mut mapping.postal_code),
        (args.town, &mut mapping.town),
        (args.city, &mut mapping.city),
        (args.company, &mut mapping.company),
    ];
    for (flag, slot) in optional {
        if let Some(flag) = flag {
            *slot = flag.index();
        }
    }
}

fn describe_mapping(options: &ImportOptions) -> String {
    let m = &options.mapping;
    let mut parts = vec![format!("email={}", m.email), format!("name={}", m.name)];
    for (label, idx) in [
        ("client_code", m.client_code),
        ("address", m.address),
        ("postal_code", m.postal_code),
        ("town", m.town),
        ("city", m.city),
        ("company", m.company),
    ] {
        if let Some(idx) = idx {
            parts.push(format!("{}={}", label, idx));
        }
    }
    let delimiter = match options.delimiter {
        b'\t' => "tab".to_string(),
        other => (other as char).to_string(),
    };
    parts.push(format!("delimiter='{}'", delimiter));
    if options.skip_header {
        parts.push("skip header".to_string());
    }
    if options.auto_classify {
        parts.push("auto-classify".to_string());
    }
    parts.join(" ")
}

fn print_summary(report: &SessionReport) {
    println!(
        "\nRead {} rows, {} distinct emails",
        report.rows_read,
        report.processed()
    );
    println!(
        "New {}, updated {}, unchanged {}",
        report.new_count, report.updated_count, report.unchanged_count
    );

    if report.invalid_count > 0 {
        println!("Invalid emails: {}", report.invalid_count);
    }
    if report.duplicate_skipped_count > 0 {
        println!("Skipped {} already marked invalid", report.duplicate_skipped_count);
    }
    if report.duplicate_rows > 0 {
        println!("Merged {} repeated rows", report.duplicate_rows);
    }
    if report.skipped_insufficient_columns > 0 || report.skipped_empty_email > 0 {
        println!(
            "Skipped rows: {} too short, {} without email",
            report.skipped_insufficient_columns, report.skipped_empty_email
        );
    }
    if report.error_count > 0 {
        println!("Errors: {}", report.error_count);
    }

    for record in &report.changes {
        println!("\n{}", record.email);
        for change in &record.changes {
            println!("  {}", change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::io::Write;

    fn import_args(argv: &[&str]) -> ImportArgs {
        let mut full = vec!["contactsort", "import"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Import(args) => args,
            _ => panic!("expected import"),
        }
    }

    #[test]
    fn header_guess_when_nothing_saved() {
        let db = Database::open_memory().unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "nombre;email;empresa\nJuan;juan@empresa.com;Empresa SA").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let options = resolve_options(&db, &import_args(&[&path])).unwrap();
        assert_eq!(options.mapping.email, 1);
        assert_eq!(options.mapping.company, Some(2));
        assert!(options.skip_header);
        assert!(!options.auto_classify);
    }

    #[test]
    fn flags_override_saved_options() {
        let db = Database::open_memory().unwrap();
        let mut saved = ImportOptions::default();
        saved.mapping = ColumnMapping::new(3, 1);
        saved.mapping.city = Some(4);
        saved.auto_classify = true;
        db.save_import_options(&saved).unwrap();

        let args = import_args(&["missing.csv", "--email", "0", "--town", "5"]);
        let options = resolve_options(&db, &args).unwrap();
        assert_eq!(options.mapping.email, 0);
        assert_eq!(options.mapping.name, 1);
        assert_eq!(options.mapping.city, Some(4));
        assert_eq!(options.mapping.town, Some(5));
        assert!(options.auto_classify);

        let options =
            resolve_options(&db, &import_args(&["missing.csv", "--auto-classify=false"])).unwrap();
        assert!(!options.auto_classify);
    }

    #[test]
    fn narrower_file_imports_after_wider_saved_mapping() {
        let db = Database::open_memory().unwrap();
        let mut wide = ImportOptions::default();
        wide.mapping = ColumnMapping::new(1, 0);
        wide.mapping.client_code = Some(2);
        wide.mapping.city = Some(6);
        db.save_import_options(&wide).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Ana;ana@gmail.com;C1\nBob;bob@acme.com;C2").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let options = resolve_options(&db, &import_args(&[&path, "--city", "none"])).unwrap();
        assert_eq!(options.mapping.city, None);
        assert_eq!(options.mapping.client_code, Some(2));
        let report = import_batch(
            &db,
            file.path(),
            &options,
            &mut Session::new(),
            &mut FixedDecider::accept_all(),
        )
        .unwrap();
        assert_eq!(report.skipped_insufficient_columns, 0);
        assert_eq!(report.new_count, 2);

        let options = resolve_options(&db, &import_args(&[&path, "--reset-mapping"])).unwrap();
        assert_eq!(options.mapping.city, None);
        assert_eq!(options.mapping.client_code, None);
        assert_eq!(options.mapping.email, 1);
    }

    #[test]
    fn describe_mapping_lists_mapped_columns() {
        let mut options = ImportOptions::default();
        options.mapping = ColumnMapping::new(1, 0);
        options.mapping.company = Some(2);
        assert_eq!(
            describe_mapping(&options),
            "email=1 name=0 company=2 delimiter=';'"
        );
    }
}
