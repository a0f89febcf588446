//! Points where reconciliation stops and asks the caller what to do.

use serde::Serialize;

use crate::models::{Category, FieldChange};

/// An existing contact would change. Sent before the change is kept.
#[derive(Debug, Clone, Copy)]
pub struct ChangeRequest<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub category: Category,
    pub changes: &'a [FieldChange],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeDecision {
    Accept,
    Reject,
}

/// A manual add hit an email stored under a different category.
#[derive(Debug, Clone, Copy)]
pub struct DuplicateRequest<'a> {
    pub email: &'a str,
    pub existing: Category,
    /// `None` when the add let the category be chosen automatically.
    pub requested: Option<Category>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DuplicateDecision {
    Skip,
    /// Skip this one and every later cross-category duplicate in the session.
    SkipAll,
    ReclassifyAsClient,
}

pub trait Decider {
    fn confirm_changes(&mut self, request: &ChangeRequest<'_>) -> ChangeDecision;
    fn resolve_duplicate(&mut self, request: &DuplicateRequest<'_>) -> DuplicateDecision;
}

/// Answers every request the same way. Used for non-interactive runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedDecider {
    pub changes: ChangeDecision,
    pub duplicates: DuplicateDecision,
}

impl FixedDecider {
    pub fn accept_all() -> Self {
        Self {
            changes: ChangeDecision::Accept,
            duplicates: DuplicateDecision::Skip,
        }
    }

    pub fn reject_all() -> Self {
        Self {
            changes: ChangeDecision::Reject,
            duplicates: DuplicateDecision::Skip,
        }
    }
}

impl Decider for FixedDecider {
    fn confirm_changes(&mut self, _request: &ChangeRequest<'_>) -> ChangeDecision {
        self.changes
    }

    fn resolve_duplicate(&mut self, _request: &DuplicateRequest<'_>) -> DuplicateDecision {
        self.duplicates
    }
}
