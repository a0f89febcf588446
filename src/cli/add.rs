use anyhow::{anyhow, Result};

use crate::classify::is_valid_email;
use crate::cli::ui::{confirm, text_input, warning, PromptDecider};
use crate::cli::{AddArgs, AddCategory};
use crate::db::Database;
use crate::models::{ContactFields, Field};
use crate::reconcile::{add_contact, AddOutcome, AddTarget, FixedDecider, Session};

/// Execute the add command
pub fn run_add(db: &Database, args: AddArgs) -> Result<()> {
    // No email on the command line: ask for everything
    let fields = match args.email.clone() {
        Some(email) => fields_from_args(email, &args),
        None => match interactive_mode()? {
            Some(fields) => fields,
            None => {
                println!("Cancelled.");
                return Ok(());
            }
        },
    };

    let fields = fields.normalized();
    if fields.email.is_empty() {
        return Err(anyhow!("Email is required."));
    }

    let target = match args.category {
        AddCategory::Auto => AddTarget::Auto,
        AddCategory::Client => AddTarget::Client,
        AddCategory::Commercial => AddTarget::Commercial,
        AddCategory::Invalid => AddTarget::Invalid {
            reason: args.reason.clone(),
        },
    };

    if matches!(target, AddTarget::Client | AddTarget::Commercial) && !is_valid_email(&fields.email) {
        warning(&format!("{} does not look like a valid email.", fields.email));
        if !confirm("Add anyway?", false) {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let mut session = Session::new();
    let outcome = if args.yes {
        add_contact(db, &fields, &target, &mut session, &mut FixedDecider::accept_all())?
    } else {
        add_contact(db, &fields, &target, &mut session, &mut PromptDecider)?
    };

    print_outcome(&outcome);
    Ok(())
}

fn fields_from_args(email: String, args: &AddArgs) -> ContactFields {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    ContactFields {
        email,
        name: text(&args.name),
        company: text(&args.company),
        client_code: text(&args.client_code),
        address: text(&args.address),
        postal_code: text(&args.postal_code),
        town: text(&args.town),
        city: text(&args.city),
        additional_info: text(&args.info),
    }
}

fn interactive_mode() -> Result<Option<ContactFields>> {
    let Some(email) = text_input("email:")? else {
        return Ok(None);
    };

    let mut fields = ContactFields::new(email, String::new());
    for field in [
        Field::Name,
        Field::Company,
        Field::ClientCode,
        Field::Address,
        Field::PostalCode,
        Field::Town,
        Field::City,
        Field::AdditionalInfo,
    ] {
        if let Some(value) = text_input(&format!("{}:", field.label()))? {
            fields.set(field, value);
        }
    }
    Ok(Some(fields))
}

fn print_outcome(outcome: &AddOutcome) {
    match outcome {
        AddOutcome::Added(category) => println!("Added to {}.", category.table()),
        AddOutcome::Updated { changes, .. } => {
            for change in changes {
                println!("  {}", change);
            }
            println!("Updated.");
        }
        AddOutcome::Unchanged(_) => println!("No changes."),
        AddOutcome::Rejected(_) => println!("Changes discarded."),
        AddOutcome::Skipped(existing) => println!("Skipped: already a {}.", existing.label()),
        AddOutcome::Reclassified { from } => println!("Moved from {} to clients.", from.table()),
    }
}
