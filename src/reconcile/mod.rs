//! Decide where each incoming contact belongs and merge it with what is stored.
//!
//! Per email: unknown addresses are classified and inserted, known clients and
//! commercial contacts are updated (the caller confirms any change through a
//! [`Decider`]), and addresses already marked invalid are left alone.

use std::path::Path;

use anyhow::{anyhow, bail, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classify::{is_commercial_domain, is_valid_email};
use crate::db::{Database, UpsertOutcome, INVALID_FORMAT_REASON, MANUAL_INVALID_REASON};
use crate::error::ImportError;
use crate::ingest::{self, IngestResult};
use crate::models::{
    Category, ColumnMapping, ContactFields, ContactKind, Field, FieldChange, ImportOptions,
};

mod decision;
mod session;

pub use decision::{
    ChangeDecision, ChangeRequest, Decider, DuplicateDecision, DuplicateRequest, FixedDecider,
};
pub use session::Session;

/// Changes accepted for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordChanges {
    pub email: String,
    pub category: Category,
    pub changes: Vec<FieldChange>,
}

/// Tallies for one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub new_count: usize,
    pub updated_count: usize,
    pub unchanged_count: usize,
    pub duplicate_skipped_count: usize,
    pub invalid_count: usize,
    pub error_count: usize,
    pub changes: Vec<RecordChanges>,
    pub new_emails: Vec<String>,
    pub rows_read: usize,
    pub skipped_insufficient_columns: usize,
    pub skipped_empty_email: usize,
    pub duplicate_rows: usize,
}

impl SessionReport {
    fn from_ingest(ingest: &IngestResult) -> Self {
        Self {
            rows_read: ingest.rows_read,
            skipped_insufficient_columns: ingest.skipped_insufficient_columns,
            skipped_empty_email: ingest.skipped_empty_email,
            duplicate_rows: ingest.duplicate_rows(),
            ..Self::default()
        }
    }

    /// Distinct emails that reached the store, whatever the outcome.
    pub fn processed(&self) -> usize {
        self.new_count
            + self.updated_count
            + self.unchanged_count
            + self.duplicate_skipped_count
            + self.invalid_count
            + self.error_count
    }
}

/// Category for an email that is in no table yet.
pub fn first_seen_kind(fields: &ContactFields, auto_classify: bool) -> ContactKind {
    if auto_classify && (is_commercial_domain(&fields.email) || !fields.company.trim().is_empty()) {
        ContactKind::Commercial
    } else {
        ContactKind::Client
    }
}

/// Read `path` and reconcile every distinct email in it.
///
/// Only input problems fail the batch. Storage errors on single records are
/// logged and counted in `error_count`.
pub fn import_batch(
    db: &Database,
    path: &Path,
    options: &ImportOptions,
    session: &mut Session,
    decider: &mut dyn Decider,
) -> Result<SessionReport, ImportError> {
    let ingest = ingest::read_csv(path, &options.mapping, options.delimiter, options.skip_header)?;
    info!(
        path = %path.display(),
        rows = ingest.rows_read,
        distinct = ingest.records.len(),
        "read import file"
    );
    Ok(reconcile_records(db, &ingest, options, session, decider))
}

/// Reconcile already-parsed rows.
pub fn reconcile_records(
    db: &Database,
    ingest: &IngestResult,
    options: &ImportOptions,
    session: &mut Session,
    decider: &mut dyn Decider,
) -> SessionReport {
    let mut report = SessionReport::from_ingest(ingest);

    for fields in &ingest.records {
        reconcile_record(db, fields, options, session, decider, &mut report);
    }

    info!(
        new = report.new_count,
        updated = report.updated_count,
        unchanged = report.unchanged_count,
        duplicates = report.duplicate_skipped_count,
        invalid = report.invalid_count,
        errors = report.error_count,
        "import finished"
    );
    report
}

fn reconcile_record(
    db: &Database,
    fields: &ContactFields,
    options: &ImportOptions,
    session: &mut Session,
    decider: &mut dyn Decider,
    report: &mut SessionReport,
) {
    let fields = fields.clone().normalized();
    let email = fields.email.clone();

    let existing = match db.find_category(&email) {
        Ok(existing) => existing,
        Err(e) => {
            warn!(email = %email, error = %e, "lookup failed, skipping record");
            report.error_count += 1;
            return;
        }
    };

    let (kind, incoming) = match existing {
        None if !is_valid_email(&email) => {
            if db.insert_invalid_email(&email, &fields.name, INVALID_FORMAT_REASON) {
                report.invalid_count += 1;
            } else {
                report.error_count += 1;
            }
            return;
        }
        None => (first_seen_kind(&fields, options.auto_classify), fields),
        Some(category) => match category.contact_kind() {
            Some(kind) => match keep_unmapped_fields(db, kind, fields, &options.mapping) {
                Ok(incoming) => (kind, incoming),
                Err(e) => {
                    warn!(email = %email, error = %e, "could not load stored contact");
                    report.error_count += 1;
                    return;
                }
            },
            None => {
                debug!(email = %email, "already marked invalid, skipping");
                report.duplicate_skipped_count += 1;
                return;
            }
        },
    };

    match apply_upsert(db, kind, &incoming, decider) {
        Ok(Applied::New) => {
            report.new_count += 1;
            report.new_emails.push(email.clone());
            session.record_new(&email);
        }
        Ok(Applied::Accepted(changes)) => {
            report.updated_count += 1;
            report.changes.push(RecordChanges {
                email,
                category: kind.category(),
                changes,
            });
        }
        Ok(Applied::Unchanged) | Ok(Applied::Rejected) => report.unchanged_count += 1,
        Err(e) => {
            warn!(email = %email, error = %e, "record not stored");
            report.error_count += 1;
        }
    }
}

/// Copy stored values into fields the import file has no column for, so a
/// partial mapping neither erases data nor reports spurious changes.
fn keep_unmapped_fields(
    db: &Database,
    kind: ContactKind,
    mut fields: ContactFields,
    mapping: &ColumnMapping,
) -> Result<ContactFields> {
    if let Some(stored) = db.get_contact(kind, &fields.email)? {
        for &field in kind.comparable_fields() {
            if !mapping.is_mapped(field) {
                fields.set(field, stored.fields.get(field).to_string());
            }
        }
    }
    Ok(fields)
}

/// Like [`keep_unmapped_fields`] for manual adds: blank values keep what is stored.
fn keep_blank_fields(
    db: &Database,
    kind: ContactKind,
    mut fields: ContactFields,
) -> Result<ContactFields> {
    if let Some(stored) = db.get_contact(kind, &fields.email)? {
        for &field in kind.comparable_fields() {
            if fields.get(field).is_empty() {
                fields.set(field, stored.fields.get(field).to_string());
            }
        }
    }
    Ok(fields)
}

enum Applied {
    New,
    Accepted(Vec<FieldChange>),
    Unchanged,
    Rejected,
}

/// Upsert, then let the decider keep or undo any change to an existing record.
fn apply_upsert(
    db: &Database,
    kind: ContactKind,
    fields: &ContactFields,
    decider: &mut dyn Decider,
) -> Result<Applied> {
    match db.upsert_contact(kind, fields) {
        UpsertOutcome::New => Ok(Applied::New),
        UpsertOutcome::Unchanged => Ok(Applied::Unchanged),
        UpsertOutcome::Error(msg) => Err(anyhow!(msg)),
        UpsertOutcome::Updated { changes } => {
            let request = ChangeRequest {
                email: &fields.email,
                name: &fields.name,
                category: kind.category(),
                changes: &changes,
            };
            match decider.confirm_changes(&request) {
                ChangeDecision::Accept => Ok(Applied::Accepted(changes)),
                ChangeDecision::Reject => {
                    db.revert_fields(kind, &fields.email, &changes)?;
                    debug!(
                        email = %fields.email,
                        fields = changes.len(),
                        "changes rejected, reverted"
                    );
                    Ok(Applied::Rejected)
                }
            }
        }
    }
}

// ==================== MANUAL ADD ====================

/// Category requested for a manually added contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddTarget {
    /// Invalid syntax goes to the invalid table, otherwise the import rule
    /// with auto-classification on.
    Auto,
    Client,
    Commercial,
    Invalid { reason: Option<String> },
}

impl AddTarget {
    pub fn category(&self) -> Option<Category> {
        match self {
            Self::Auto => None,
            Self::Client => Some(Category::Client),
            Self::Commercial => Some(Category::Commercial),
            Self::Invalid { .. } => Some(Category::Invalid),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AddOutcome {
    Added(Category),
    Updated {
        category: Category,
        changes: Vec<FieldChange>,
    },
    Unchanged(Category),
    Rejected(Category),
    /// A different category already holds the email and it was left there.
    Skipped(Category),
    Reclassified { from: Category },
}

/// Add or update one contact by hand.
pub fn add_contact(
    db: &Database,
    fields: &ContactFields,
    target: &AddTarget,
    session: &mut Session,
    decider: &mut dyn Decider,
) -> Result<AddOutcome> {
    let fields = fields.clone().normalized();
    if fields.email.is_empty() {
        bail!("email is required");
    }

    let Some(existing) = db.find_category(&fields.email)? else {
        return add_new(db, fields, target, session, decider);
    };

    // A stored client is always updated in place, whatever was requested.
    let update_in_place = match target {
        _ if existing == Category::Client => true,
        AddTarget::Auto => existing != Category::Invalid,
        other => other.category() == Some(existing),
    };

    if update_in_place {
        let Some(kind) = existing.contact_kind() else {
            debug!(email = %fields.email, "already marked invalid");
            return Ok(AddOutcome::Unchanged(existing));
        };
        let incoming = keep_blank_fields(db, kind, fields)?;
        return Ok(match apply_upsert(db, kind, &incoming, decider)? {
            Applied::New => {
                session.record_new(&incoming.email);
                AddOutcome::Added(existing)
            }
            Applied::Accepted(changes) => AddOutcome::Updated {
                category: existing,
                changes,
            },
            Applied::Unchanged => AddOutcome::Unchanged(existing),
            Applied::Rejected => AddOutcome::Rejected(existing),
        });
    }

    if session.skip_all_duplicates() {
        debug!(
            email = %fields.email,
            existing = existing.as_str(),
            "skipping duplicate (skip all)"
        );
        return Ok(AddOutcome::Skipped(existing));
    }

    let request = DuplicateRequest {
        email: &fields.email,
        existing,
        requested: target.category(),
    };
    match decider.resolve_duplicate(&request) {
        DuplicateDecision::Skip => Ok(AddOutcome::Skipped(existing)),
        DuplicateDecision::SkipAll => {
            session.set_skip_all_duplicates();
            Ok(AddOutcome::Skipped(existing))
        }
        DuplicateDecision::ReclassifyAsClient => {
            let fields = match existing.contact_kind() {
                Some(kind) => keep_blank_fields(db, kind, fields)?,
                None => fields,
            };
            if !db.reclassify(&fields.email, existing, Category::Client, &fields, None) {
                bail!("could not move {} to {}", fields.email, Category::Client.label());
            }
            info!(email = %fields.email, from = existing.as_str(), "reclassified as client");
            Ok(AddOutcome::Reclassified { from: existing })
        }
    }
}

fn add_new(
    db: &Database,
    fields: ContactFields,
    target: &AddTarget,
    session: &mut Session,
    decider: &mut dyn Decider,
) -> Result<AddOutcome> {
    let kind = match target {
        AddTarget::Invalid { reason } => {
            let reason = reason.as_deref().unwrap_or(MANUAL_INVALID_REASON);
            if !db.insert_invalid_email(&fields.email, &fields.name, reason) {
                bail!("could not record {} as invalid", fields.email);
            }
            return Ok(AddOutcome::Added(Category::Invalid));
        }
        AddTarget::Auto if !is_valid_email(&fields.email) => {
            if !db.insert_invalid_email(&fields.email, &fields.name, INVALID_FORMAT_REASON) {
                bail!("could not record {} as invalid", fields.email);
            }
            return Ok(AddOutcome::Added(Category::Invalid));
        }
        AddTarget::Auto => first_seen_kind(&fields, true),
        AddTarget::Client => ContactKind::Client,
        AddTarget::Commercial => ContactKind::Commercial,
    };

    match apply_upsert(db, kind, &fields, decider)? {
        Applied::New => {
            session.record_new(&fields.email);
            Ok(AddOutcome::Added(kind.category()))
        }
        Applied::Accepted(changes) => Ok(AddOutcome::Updated {
            category: kind.category(),
            changes,
        }),
        Applied::Unchanged => Ok(AddOutcome::Unchanged(kind.category())),
        Applied::Rejected => Ok(AddOutcome::Rejected(kind.category())),
    }
}

/// Fields that were not compared because the mapping left them out.
pub fn unmapped_fields(kind: ContactKind, mapping: &ColumnMapping) -> Vec<Field> {
    kind.comparable_fields()
        .iter()
        .copied()
        .filter(|f| !mapping.is_mapped(*f))
        .collect()
}
