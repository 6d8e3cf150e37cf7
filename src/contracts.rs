use crate::errors::{AppError, AppResult};
use crate::expr::Expression;
use crate::models::{TaskDraft, HIGHEST_PRIORITY, LOWEST_PRIORITY};
use chrono::NaiveDateTime;

/// Placeholder in a postcondition that stands for the filtered collection.
pub const RESULT_VARIABLE: &str = "result";

pub mod add_task {
    pub const PRECONDITION: &str = "task ≠ null ∧ ¬IsEmpty(task.Title) \
        ∧ task.Deadline > Now() ∧ task.Priority ∈ [1,4]";
    pub const POSTCONDITION: &str = "Tasks.Contains(task) ∧ Tasks.Count = old(Tasks.Count) + 1";
}

pub mod filter_tasks {
    pub const PRECONDITION: &str = "byDeadline ∨ byPriority ∨ ¬IsEmpty(customFilter)";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WpCalculation {
    pub wp: Expression,
    pub steps: Vec<String>,
}

/// Substitutes `filter_condition` for the `result` placeholder of
/// `postcondition` and records the five-line derivation.
///
/// This is a single textual substitution, not a proof: malformed filter text
/// is embedded verbatim.
pub fn compute_wp(filter_condition: &str, postcondition: &Expression) -> WpCalculation {
    let wp = postcondition
        .substitute(RESULT_VARIABLE, filter_condition)
        .into_owned();

    let steps = vec![
        "WP calculation for filtering:".to_string(),
        format!("Postcondition: {}", postcondition),
        format!("Filter condition: {}", filter_condition),
        format!("WP result: {}", wp),
        format!(
            "Definiteness conditions: {}",
            wp.definiteness_conditions().join(", ")
        ),
    ];

    WpCalculation { wp, steps }
}

/// Checks a draft against the AddTask precondition.
pub fn validate_new_task(draft: &TaskDraft, now: NaiveDateTime) -> AppResult<()> {
    if draft.title.trim().is_empty() {
        return Err(AppError::Validation("Task title cannot be empty".to_string()));
    }

    validate_record_text("title", &draft.title)?;
    validate_record_text("description", &draft.description)?;
    validate_deadline(draft.deadline, now)?;

    if !(HIGHEST_PRIORITY..=LOWEST_PRIORITY).contains(&draft.priority) {
        return Err(AppError::Validation(format!(
            "Priority {} is out of allowed range ({}..={})",
            draft.priority, HIGHEST_PRIORITY, LOWEST_PRIORITY
        )));
    }

    Ok(())
}

/// Characters the task file uses as field and record separators.
const RESERVED_CHARS: &[char] = &['|', '\n', '\r'];

fn validate_record_text(field: &str, value: &str) -> AppResult<()> {
    if value.contains(RESERVED_CHARS) {
        return Err(AppError::Validation(format!(
            "Task {} cannot contain '|' or line breaks",
            field
        )));
    }
    Ok(())
}

pub fn validate_deadline(deadline: NaiveDateTime, now: NaiveDateTime) -> AppResult<()> {
    if deadline <= now {
        return Err(AppError::Validation(format!(
            "Deadline {} must be in the future",
            deadline.format("%Y-%m-%d %H:%M:%S")
        )));
    }
    Ok(())
}
