use clap::Parser;
use contactsort::cli::{
    run_add, run_delete, run_export, run_import, run_list, run_preview, run_reclassify,
    run_search, Cli, Commands,
};
use contactsort::db::Database;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    contactsort::logging::init(cli.verbose);

    // Preview only reads the CSV file.
    if let Commands::Preview(args) = &cli.command {
        return run_preview(&args.file, args.delimiter, args.rows);
    }

    let db = match cli.db {
        Some(path) => Database::open_at(path)?,
        None => Database::open()?,
    };

    match cli.command {
        Commands::Import(args) => run_import(&db, &args)?,
        Commands::Preview(_) => {}
        Commands::Add(args) => run_add(&db, args)?,
        Commands::List(args) => run_list(&db, args.category.into(), args.json)?,
        Commands::Search(args) => run_search(&db, &args.query, args.json)?,
        Commands::Delete(args) => run_delete(&db, args.scope, &args.email, args.force)?,
        Commands::Reclassify(args) => {
            run_reclassify(&db, &args.email, args.to.into(), args.reason.as_deref())?
        }
        Commands::Export(args) => run_export(&db, args.scope, &args.path)?,
    }

    Ok(())
}
