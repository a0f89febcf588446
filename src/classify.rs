//! Email heuristics: syntax check, personal-vs-business domain, and the
//! normalization used when deciding whether a stored value changed.

use std::sync::OnceLock;

use regex::Regex;

/// Webmail providers whose addresses are treated as personal.
pub const PERSONAL_DOMAINS: &[&str] = &[
    "gmail.com",
    "hotmail.com",
    "yahoo.com",
    "outlook.com",
    "live.com",
    "icloud.com",
    "aol.com",
    "protonmail.com",
    "mail.com",
    "gmx.com",
];

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"))
}

/// Syntactic check only; no DNS or MX lookup.
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Heuristic: any domain outside [`PERSONAL_DOMAINS`] is assumed to be a business.
pub fn is_commercial_domain(email: &str) -> bool {
    match email.split_once('@') {
        Some((_, domain)) => {
            let domain = domain.to_lowercase();
            !PERSONAL_DOMAINS.contains(&domain.as_str())
        }
        None => false,
    }
}

/// Key form of an email: trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Comparison form of a stored value. Never written back to the database.
///
/// Drops `*` and `\r`, turns tabs and newlines into spaces, trims, and
/// collapses whitespace runs to a single space.
pub fn normalize_for_compare(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .filter(|c| *c != '*' && *c != '\r')
        .map(|c| if c == '\t' || c == '\n' { ' ' } else { c })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Names compare case-insensitively after normalization, in both contact tables.
pub fn same_name(a: &str, b: &str) -> bool {
    normalize_for_compare(a).to_lowercase() == normalize_for_compare(b).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_literals() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(is_valid_email("a.b+c@sub.domain.io"));
        assert!(!is_valid_email("no-at-sign.com"));
    }

    #[test]
    fn valid_email_rejects_spaces_and_short_tld() {
        assert!(!is_valid_email("ana maria@example.com"));
        assert!(!is_valid_email("ana@example.c"));
        assert!(!is_valid_email("ana@example.c0m"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn commercial_domain_literals() {
        assert!(!is_commercial_domain("user@gmail.com"));
        assert!(is_commercial_domain("user@acme-corp.com"));
        assert!(!is_commercial_domain("no-domain"));
    }

    #[test]
    fn commercial_domain_ignores_case() {
        assert!(!is_commercial_domain("User@GMAIL.com"));
        assert!(!is_commercial_domain("someone@ProtonMail.com"));
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize_for_compare("Calle Mayor   1"), "Calle Mayor 1");
        assert_eq!(normalize_for_compare("  Calle\tMayor\r\n1 "), "Calle Mayor 1");
    }

    #[test]
    fn normalize_strips_asterisks() {
        assert_eq!(normalize_for_compare("*ACME* S.L."), "ACME S.L.");
        assert_eq!(normalize_for_compare("***"), "");
    }

    #[test]
    fn names_compare_without_case() {
        assert!(same_name("JUAN  PÉREZ", "juan pérez"));
        assert!(!same_name("Juan Pérez", "Juana Pérez"));
    }
}
