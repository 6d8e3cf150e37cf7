use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub const HIGHEST_PRIORITY: i32 = 1;
pub const LOWEST_PRIORITY: i32 = 4;
pub const URGENCY_WINDOW_HOURS: i64 = 24;

/// Stored in `VerificationResult::wp_result` when no WP steps were produced.
pub const WP_COMPLETE_SENTINEL: &str = "WP calculation complete";

/// Position of a task in the append-only store. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub title: String,
    pub description: String,
    pub deadline: NaiveDateTime,
    /// 1 is the highest priority, 4 the lowest.
    pub priority: i32,
    pub completed: bool,
    pub created_at: NaiveDateTime,
}

impl Task {
    pub fn from_draft(draft: TaskDraft, now: NaiveDateTime) -> Self {
        Self {
            title: draft.title,
            description: draft.description,
            deadline: draft.deadline,
            priority: draft.priority,
            completed: false,
            created_at: now,
        }
    }

    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        !self.completed && self.deadline < now
    }

    pub fn is_urgent(&self, now: NaiveDateTime) -> bool {
        match urgency_horizon(now) {
            Some(horizon) => self.is_urgent_before(horizon),
            None => self.priority == HIGHEST_PRIORITY,
        }
    }

    pub fn is_urgent_before(&self, horizon: NaiveDateTime) -> bool {
        self.priority == HIGHEST_PRIORITY && self.deadline <= horizon
    }
}

/// Latest deadline that still counts as urgent, or `None` when `now + 24h`
/// falls off the end of the calendar.
pub fn urgency_horizon(now: NaiveDateTime) -> Option<NaiveDateTime> {
    now.checked_add_signed(Duration::hours(URGENCY_WINDOW_HOURS))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub deadline: NaiveDateTime,
    pub priority: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterRequest {
    pub custom_filter: String,
    pub by_deadline: bool,
    pub by_priority: bool,
    pub deadline_filter: String,
    pub priority_filter: String,
}

impl FilterRequest {
    pub fn is_deadline_active(&self) -> bool {
        self.by_deadline
    }

    pub fn is_priority_active(&self) -> bool {
        self.by_priority && !self.priority_filter.trim().is_empty()
    }

    pub fn is_custom_active(&self) -> bool {
        !self.custom_filter.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub boolean_function: String,
    pub invariant: String,
    pub wp_steps: Vec<String>,
    pub wp_result: String,
}

impl VerificationResult {
    pub fn from_steps(
        boolean_function: String,
        invariant: String,
        mut wp_steps: Vec<String>,
    ) -> Self {
        if wp_steps.is_empty() {
            wp_steps.push(WP_COMPLETE_SENTINEL.to_string());
        }
        let wp_result = wp_steps
            .last()
            .cloned()
            .unwrap_or_else(|| WP_COMPLETE_SENTINEL.to_string());
        Self {
            boolean_function,
            invariant,
            wp_steps,
            wp_result,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterStage {
    Deadline,
    Priority,
    Custom,
}

impl FilterStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deadline => "deadline",
            Self::Priority => "priority",
            Self::Custom => "custom",
        }
    }
}

/// Raised whenever a stage could not honour its filter text as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FilterNotice {
    /// The filter text was not understood and the stage's default rule ran instead.
    Fallback { stage: FilterStage, filter: String },
    /// The stage hit an internal error and passed its input through unchanged.
    Ignored { stage: FilterStage, reason: String },
}

impl FilterNotice {
    pub fn stage(&self) -> FilterStage {
        match self {
            Self::Fallback { stage, .. } | Self::Ignored { stage, .. } => *stage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredResult {
    pub filtered_tasks: Vec<Task>,
    pub verification: VerificationResult,
    #[serde(default)]
    pub notices: Vec<FilterNotice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSettings {
    pub data_file: String,
    pub log_dir: Option<String>,
    pub log_filter: String,
    pub autosave: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            data_file: "tasks.txt".to_string(),
            log_dir: None,
            log_filter: "info".to_string(),
            autosave: true,
        }
    }
}
