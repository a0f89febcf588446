//! Shared UI primitives for contactsort
//!
//! Conventions:
//! - Prompts: sentence case ending in `?` or `:`
//! - Feedback: short, single line: `Deleted.`
//! - Decisions and progress go to stderr so `--json` output stays clean

use anyhow::Result;
use inquire::{ui::RenderConfig, Confirm, Select, Text};

use crate::reconcile::{
    ChangeDecision, ChangeRequest, Decider, DuplicateDecision, DuplicateRequest,
};

// ============================================================================
// Layout Primitives
// ============================================================================

/// Get terminal dimensions, defaulting to 80x24 if unavailable (pipes, non-TTY).
pub fn term_size() -> (usize, usize) {
    crossterm::terminal::size()
        .map(|(w, h)| (w as usize, h as usize))
        .unwrap_or((80, 24))
}

/// Number of rows a select menu can show.
pub fn visible_lines() -> usize {
    let (_, height) = term_size();
    height.saturating_sub(4).max(5)
}

/// Truncate to `max_chars`, ending in an ellipsis when cut.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let kept: String = s.chars().take(max_chars - 1).collect();
    format!("{}…", kept)
}

/// Left-align `s` in exactly `width` characters.
pub fn pad(s: &str, width: usize) -> String {
    let cut = truncate(s, width);
    let len = cut.chars().count();
    format!("{}{}", cut, " ".repeat(width.saturating_sub(len)))
}

// ============================================================================
// Message Functions
// ============================================================================

/// Print an error message to stderr
#[inline]
pub fn error(msg: &str) {
    eprintln!("Error: {}", msg);
}

/// Print a warning message to stderr
#[inline]
pub fn warning(msg: &str) {
    eprintln!("Warning: {}", msg);
}

// ============================================================================
// Prompts
// ============================================================================

/// Get a minimal render config for inquire prompts
pub fn minimal_render_config() -> RenderConfig<'static> {
    RenderConfig::default_colored()
        .with_prompt_prefix(inquire::ui::Styled::new(""))
        .with_answered_prompt_prefix(inquire::ui::Styled::new(""))
}

/// Yes/no question. Escape and interrupts count as the default.
pub fn confirm(prompt: &str, default: bool) -> bool {
    Confirm::new(prompt)
        .with_render_config(minimal_render_config())
        .with_default(default)
        .prompt()
        .unwrap_or(default)
}

/// Optional text field. `None` when skipped or left blank.
pub fn text_input(prompt: &str) -> Result<Option<String>> {
    let value = Text::new(prompt)
        .with_render_config(minimal_render_config())
        .prompt_skippable()?;
    Ok(value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()))
}

// ============================================================================
// Interactive Decider
// ============================================================================

const DUPLICATE_CHOICES: [(&str, DuplicateDecision); 3] = [
    ("Skip", DuplicateDecision::Skip),
    ("Skip all duplicates", DuplicateDecision::SkipAll),
    ("Move to clients", DuplicateDecision::ReclassifyAsClient),
];

/// Asks the user at every decision point.
#[derive(Debug, Default)]
pub struct PromptDecider;

impl Decider for PromptDecider {
    fn confirm_changes(&mut self, request: &ChangeRequest<'_>) -> ChangeDecision {
        let name = if request.name.is_empty() { "(unnamed)" } else { request.name };
        eprintln!();
        eprintln!("{} <{}> ({})", name, request.email, request.category.label());
        for change in request.changes {
            eprintln!("  {}", change);
        }

        if confirm("Keep these changes?", true) {
            ChangeDecision::Accept
        } else {
            ChangeDecision::Reject
        }
    }

    fn resolve_duplicate(&mut self, request: &DuplicateRequest<'_>) -> DuplicateDecision {
        let requested = request
            .requested
            .map(|c| c.label())
            .unwrap_or("a new contact");
        eprintln!();
        eprintln!(
            "{} is already stored as {}, not {}.",
            request.email,
            request.existing.label(),
            requested
        );

        let labels: Vec<&str> = DUPLICATE_CHOICES.iter().map(|(label, _)| *label).collect();
        let choice = Select::new("What now?", labels)
            .with_render_config(minimal_render_config())
            .with_page_size(visible_lines())
            .prompt_skippable()
            .ok()
            .flatten();

        DUPLICATE_CHOICES
            .iter()
            .find(|(label, _)| Some(*label) == choice)
            .map(|(_, decision)| *decision)
            .unwrap_or(DuplicateDecision::Skip)
    }
}
