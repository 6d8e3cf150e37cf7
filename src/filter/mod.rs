pub mod predicate;

use crate::errors::{AppError, AppResult};
use crate::models::{
    urgency_horizon, FilterNotice, FilterRequest, FilterStage, Task, LOWEST_PRIORITY,
};
use crate::store::TaskSnapshot;
use chrono::{NaiveDate, NaiveDateTime};
use std::cmp::Ordering;

pub use predicate::{compile_condition, Field, Predicate, Value};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%m/%d/%Y"];
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Clone, Default)]
pub struct FilterOutcome<'a> {
    /// Borrowed from the snapshot, in snapshot order.
    pub tasks: Vec<&'a Task>,
    pub notices: Vec<FilterNotice>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeadlineRule {
    RelativeToToday(Ordering),
    OnDate(NaiveDate),
    OverdueOrUrgent { horizon: NaiveDateTime },
    DueByToday,
}

impl DeadlineRule {
    fn matches(self, task: &Task, now: NaiveDateTime) -> bool {
        let today = now.date();
        match self {
            Self::RelativeToToday(ordering) => task.deadline.date().cmp(&today) == ordering,
            Self::OnDate(date) => task.deadline.date() == date,
            Self::OverdueOrUrgent { horizon } => {
                task.is_overdue(now) || task.is_urgent_before(horizon)
            }
            Self::DueByToday => task.deadline.date() <= today && !task.completed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PriorityRule {
    Exactly(i64),
    Above(i64),
    Below(i64),
    LowestOpen,
}

impl PriorityRule {
    fn matches(self, task: &Task) -> bool {
        let priority = i64::from(task.priority);
        match self {
            Self::Exactly(value) => priority == value,
            Self::Above(bound) => priority > bound,
            Self::Below(bound) => priority < bound,
            Self::LowestOpen => task.priority >= LOWEST_PRIORITY && !task.completed,
        }
    }
}

/// Multi-criteria task filter.
///
/// Stages run in a fixed order (deadline, priority, custom) and each active
/// stage narrows the working set. A stage that cannot understand its filter
/// text applies its default rule; a stage that fails internally passes its
/// input through unchanged. Both cases are reported as [`FilterNotice`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterEngine;

impl FilterEngine {
    pub fn new() -> Self {
        Self
    }

    /// Applies every active stage of `request` to `tasks`. Never fails and
    /// never reorders; with no active stage the whole snapshot is returned.
    pub fn evaluate<'a>(
        &self,
        tasks: TaskSnapshot<'a>,
        request: &FilterRequest,
        now: NaiveDateTime,
    ) -> FilterOutcome<'a> {
        let mut notices = Vec::new();
        let mut current: Vec<&'a Task> = tasks.iter().collect();

        if request.is_deadline_active() {
            current = fail_open(FilterStage::Deadline, current, &mut notices, |input, notices| {
                apply_deadline(input, &request.deadline_filter, now, notices)
            });
        }

        if request.is_priority_active() {
            current = fail_open(FilterStage::Priority, current, &mut notices, |input, notices| {
                apply_priority(input, &request.priority_filter, notices)
            });
        }

        if request.is_custom_active() {
            let (predicate, notice) = compile_condition(&request.custom_filter);
            notices.extend(notice);
            let before = current.len();
            current.retain(|task| predicate.evaluate(task, now));
            tracing::debug!(
                stage = FilterStage::Custom.as_str(),
                before,
                after = current.len(),
                predicate = ?predicate,
                "filter stage applied"
            );
        }

        FilterOutcome {
            tasks: current,
            notices,
        }
    }
}

fn fail_open<'a, F>(
    stage: FilterStage,
    input: Vec<&'a Task>,
    notices: &mut Vec<FilterNotice>,
    apply: F,
) -> Vec<&'a Task>
where
    F: FnOnce(&[&'a Task], &mut Vec<FilterNotice>) -> AppResult<Vec<&'a Task>>,
{
    match apply(input.as_slice(), notices) {
        Ok(kept) => {
            tracing::debug!(
                stage = stage.as_str(),
                before = input.len(),
                after = kept.len(),
                "filter stage applied"
            );
            kept
        }
        Err(error) => {
            tracing::warn!(
                stage = stage.as_str(),
                error = %error,
                "filter stage failed; passing tasks through unfiltered"
            );
            notices.push(FilterNotice::Ignored {
                stage,
                reason: error.to_string(),
            });
            input
        }
    }
}

fn apply_deadline<'a>(
    input: &[&'a Task],
    filter: &str,
    now: NaiveDateTime,
    notices: &mut Vec<FilterNotice>,
) -> AppResult<Vec<&'a Task>> {
    let filter = filter.trim();
    let rule = match filter {
        "> today" => DeadlineRule::RelativeToToday(Ordering::Greater),
        "< today" => DeadlineRule::RelativeToToday(Ordering::Less),
        "== today" => DeadlineRule::RelativeToToday(Ordering::Equal),
        "" => DeadlineRule::OverdueOrUrgent {
            horizon: urgency_horizon(now).ok_or_else(|| {
                AppError::Internal("Urgency window runs past the end of the calendar".to_string())
            })?,
        },
        other => match parse_date(other) {
            Some(date) => DeadlineRule::OnDate(date),
            None => {
                tracing::warn!(
                    filter = %other,
                    "deadline filter not understood; keeping open tasks due by today"
                );
                notices.push(FilterNotice::Fallback {
                    stage: FilterStage::Deadline,
                    filter: other.to_string(),
                });
                DeadlineRule::DueByToday
            }
        },
    };

    Ok(input
        .iter()
        .copied()
        .filter(|task| rule.matches(task, now))
        .collect())
}

fn apply_priority<'a>(
    input: &[&'a Task],
    filter: &str,
    notices: &mut Vec<FilterNotice>,
) -> AppResult<Vec<&'a Task>> {
    let filter = filter.trim();
    let rule = if let Ok(value) = filter.parse::<i64>() {
        PriorityRule::Exactly(value)
    } else if let Some(rest) = filter.strip_prefix('>') {
        PriorityRule::Above(parse_bound(rest)?)
    } else if let Some(rest) = filter.strip_prefix('<') {
        PriorityRule::Below(parse_bound(rest)?)
    } else {
        tracing::warn!(
            filter = %filter,
            "priority filter not understood; keeping open lowest-priority tasks"
        );
        notices.push(FilterNotice::Fallback {
            stage: FilterStage::Priority,
            filter: filter.to_string(),
        });
        PriorityRule::LowestOpen
    };

    Ok(input
        .iter()
        .copied()
        .filter(|task| rule.matches(task))
        .collect())
}

fn parse_bound(text: &str) -> AppResult<i64> {
    let text = text.trim();
    text.parse::<i64>().map_err(|error| {
        AppError::Parse(format!("Priority bound '{}' is not an integer: {}", text, error))
    })
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_TIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .map(|value| value.date())
        })
}
