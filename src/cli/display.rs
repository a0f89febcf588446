use crate::cli::ui::{pad, term_size};
use crate::models::{Category, Contact, InvalidEmail, Record, IMPORTED_DATE_FORMAT};

/// Print one record with every non-empty field
pub fn print_record(record: &Record) {
    match record {
        Record::Contact(contact) => print_contact(contact),
        Record::Invalid(invalid) => print_invalid(invalid),
    }
}

pub fn print_contact(contact: &Contact) {
    let f = &contact.fields;
    println!("{} <{}>", contact.display_name(), f.email);

    if !f.company.is_empty() {
        println!("  {}", f.company);
    }
    if !f.client_code.is_empty() {
        println!("  client code {}", f.client_code);
    }

    let location: Vec<&str> = [f.address.as_str(), f.postal_code.as_str(), f.town.as_str(), f.city.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    if !location.is_empty() {
        println!("  {}", location.join(", "));
    }

    if !f.additional_info.is_empty() {
        println!("  {}", f.additional_info);
    }
    println!(
        "  {} since {}",
        contact.kind.category().label(),
        contact.imported_date.format(IMPORTED_DATE_FORMAT)
    );
}

pub fn print_invalid(invalid: &InvalidEmail) {
    if invalid.name.is_empty() {
        println!("{}", invalid.email);
    } else {
        println!("{} <{}>", invalid.name, invalid.email);
    }
    println!(
        "  invalid since {}: {}",
        invalid.imported_date.format(IMPORTED_DATE_FORMAT),
        invalid.reason
    );
}

/// One line per record, sized to the terminal.
pub fn print_table(category: Category, records: &[Record]) {
    let (width, _) = term_size();
    // email, name, then whatever room is left
    let email_w = (width / 3).clamp(16, 40);
    let name_w = (width / 4).clamp(10, 30);
    let rest_w = width.saturating_sub(email_w + name_w + 4).max(10);

    for record in records {
        let (email, name, rest) = match record {
            Record::Contact(c) => {
                let f = &c.fields;
                let place = if f.town.is_empty() { &f.city } else { &f.town };
                let rest = match category {
                    Category::Commercial if !f.company.is_empty() => {
                        format!("{}  {}", f.company, place)
                    }
                    _ => place.clone(),
                };
                (f.email.as_str(), c.display_name(), rest)
            }
            Record::Invalid(i) => (i.email.as_str(), i.name.as_str(), i.reason.clone()),
        };
        println!(
            "{}  {}  {}",
            pad(email, email_w),
            pad(name, name_w),
            pad(rest.trim(), rest_w).trim_end()
        );
    }
}
