use serde::{Deserialize, Serialize};

/// Which table an email lives in. Lookups check them in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Client,
    Commercial,
    Invalid,
}

impl Category {
    /// Lookup priority: client, then commercial, then invalid.
    pub const ALL: [Category; 3] = [Self::Client, Self::Commercial, Self::Invalid];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Commercial => "commercial",
            Self::Invalid => "invalid",
        }
    }

    /// Human-facing label used in prompts and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Commercial => "commercial contact",
            Self::Invalid => "invalid email",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            Self::Client => "clients",
            Self::Commercial => "commercial_contacts",
            Self::Invalid => "invalid_emails",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "client" | "clients" | "cliente" => Some(Self::Client),
            "commercial" | "comercial" | "commercial_contacts" => Some(Self::Commercial),
            "invalid" | "invalid_emails" => Some(Self::Invalid),
            _ => None,
        }
    }

    /// The contact kind for this category, `None` for invalid emails.
    pub fn contact_kind(&self) -> Option<ContactKind> {
        match self {
            Self::Client => Some(ContactKind::Client),
            Self::Commercial => Some(ContactKind::Commercial),
            Self::Invalid => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two categories that hold full contact records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContactKind {
    #[default]
    Client,
    Commercial,
}

impl ContactKind {
    pub fn category(&self) -> Category {
        match self {
            Self::Client => Category::Client,
            Self::Commercial => Category::Commercial,
        }
    }

    pub fn table(&self) -> &'static str {
        self.category().table()
    }

    /// Fields compared for change detection and replaced on update.
    pub fn comparable_fields(&self) -> &'static [Field] {
        match self {
            Self::Client => &[
                Field::Name,
                Field::ClientCode,
                Field::Address,
                Field::PostalCode,
                Field::Town,
                Field::City,
                Field::AdditionalInfo,
            ],
            Self::Commercial => &[
                Field::Name,
                Field::Company,
                Field::ClientCode,
                Field::Address,
                Field::PostalCode,
                Field::Town,
                Field::City,
                Field::AdditionalInfo,
            ],
        }
    }
}

/// A stored contact column that can change between imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Company,
    ClientCode,
    Address,
    PostalCode,
    Town,
    City,
    AdditionalInfo,
}

impl Field {
    pub fn column(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Company => "company",
            Self::ClientCode => "client_code",
            Self::Address => "address",
            Self::PostalCode => "postal_code",
            Self::Town => "town",
            Self::City => "city",
            Self::AdditionalInfo => "additional_info",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Company => "company",
            Self::ClientCode => "client code",
            Self::Address => "address",
            Self::PostalCode => "postal code",
            Self::Town => "town",
            Self::City => "city",
            Self::AdditionalInfo => "additional info",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_plural_and_table_names() {
        assert_eq!(Category::parse("Clients"), Some(Category::Client));
        assert_eq!(Category::parse("commercial_contacts"), Some(Category::Commercial));
        assert_eq!(Category::parse(" invalid "), Some(Category::Invalid));
        assert_eq!(Category::parse("nope"), None);
    }

    #[test]
    fn commercial_compares_company_clients_do_not() {
        assert!(ContactKind::Commercial
            .comparable_fields()
            .contains(&Field::Company));
        assert!(!ContactKind::Client.comparable_fields().contains(&Field::Company));
    }
}
