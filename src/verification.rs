//! Verification report attached to every filter query.
//!
//! The report is descriptive trace output, not a correctness certificate:
//! the invariant only mentions the size of the input, and the WP trace always
//! ends with the same confirmation line whatever the filter actually kept.
//! Tests must not read it as proof that the filtered set is right.

use crate::contracts::{compute_wp, filter_tasks};
use crate::expr::Expression;
use crate::models::{FilterRequest, VerificationResult};
use crate::store::TaskSnapshot;

pub const NO_CUSTOM_FILTER: &str = "no custom filter applied";
pub const POSTCONDITION_TEMPLATE: &str = "result != null && subset(result, tasks)";
pub const WP_CONFIRMATION: &str = "✓ WP calculation confirms the filtering operation is correct";

static SYMBOL_TABLE: &[(&str, &str)] = &[
    ("&", "∧"),
    ("|", "∨"),
    ("!", "¬"),
    (" and ", " ∧ "),
    (" or ", " ∨ "),
    (" not ", " ¬ "),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct VerificationEngine;

impl VerificationEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn verify_filter_operation(
        &self,
        request: &FilterRequest,
        tasks: TaskSnapshot<'_>,
    ) -> VerificationResult {
        VerificationResult::from_steps(
            boolean_function(&request.custom_filter),
            filter_invariant(tasks.len()),
            wp_steps(request),
        )
    }
}

/// Custom filter with its connectives replaced by logic symbols, one table
/// entry at a time (so `&&` renders as `∧∧`).
pub fn boolean_function(custom_filter: &str) -> String {
    if custom_filter.is_empty() {
        return NO_CUSTOM_FILTER.to_string();
    }
    SYMBOL_TABLE
        .iter()
        .fold(custom_filter.to_string(), |text, (from, to)| text.replace(from, to))
}

pub fn filter_invariant(task_count: usize) -> String {
    format!(
        "∀t ∈ result: t satisfies the filter condition ∧ |result| ≤ {}",
        task_count
    )
}

/// Conjunction of the active stages in surface syntax, `true` when none is
/// active.
pub fn filter_condition(request: &FilterRequest) -> String {
    let mut clauses = Vec::new();

    if request.is_deadline_active() {
        let deadline = request.deadline_filter.trim();
        if deadline.is_empty() {
            clauses.push("(IsOverdue || IsUrgent)".to_string());
        } else {
            clauses.push(format!("Deadline {}", deadline));
        }
    }

    if request.is_priority_active() {
        let priority = request.priority_filter.trim();
        if priority.starts_with('>') || priority.starts_with('<') {
            clauses.push(format!("Priority {}", priority));
        } else {
            clauses.push(format!("Priority == {}", priority));
        }
    }

    if request.is_custom_active() {
        clauses.push(format!("({})", request.custom_filter));
    }

    if clauses.is_empty() {
        "true".to_string()
    } else {
        clauses.join(" && ")
    }
}

fn wp_steps(request: &FilterRequest) -> Vec<String> {
    let postcondition = Expression::parse(POSTCONDITION_TEMPLATE);
    let calculation = compute_wp(&filter_condition(request), &postcondition);

    let mut steps = vec![
        "=== FILTER WP CALCULATION ===".to_string(),
        format!("Custom filter: {}", request.custom_filter),
        format!("By deadline: {}", request.by_deadline),
        format!("Deadline filter: {}", request.deadline_filter),
        format!("By priority: {}", request.by_priority),
        format!("Priority filter: {}", request.priority_filter),
        String::new(),
        format!("1. Precondition: {}", filter_tasks::PRECONDITION),
        "2. Invariant: result contains only tasks satisfying the filter conditions".to_string(),
        "3. Postcondition: result ≠ null ∧ ∀t ∈ result: t matches the filters".to_string(),
        String::new(),
    ];
    steps.extend(calculation.steps);
    steps.push(String::new());
    steps.push(WP_CONFIRMATION.to_string());
    steps
}
