/// State that outlives a single record: owned by the caller and passed to
/// every import or add in the same run.
#[derive(Debug, Clone, Default)]
pub struct Session {
    skip_all_duplicates: bool,
    new_emails: Vec<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip_all_duplicates(&self) -> bool {
        self.skip_all_duplicates
    }

    pub fn set_skip_all_duplicates(&mut self) {
        self.skip_all_duplicates = true;
    }

    /// Emails first stored during this session, for highlighting.
    pub fn new_emails(&self) -> &[String] {
        &self.new_emails
    }

    pub fn is_new(&self, email: &str) -> bool {
        self.new_emails.iter().any(|e| e == email)
    }

    pub(super) fn record_new(&mut self, email: &str) {
        if !self.is_new(email) {
            self.new_emails.push(email.to_string());
        }
    }
}
