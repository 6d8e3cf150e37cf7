use crate::errors::{AppError, AppResult};
use crate::models::Task;
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FIELD_COUNT: usize = 6;

/// Line-oriented task file: one task per line,
/// `Title|Description|Deadline|Priority|Completed|Created`.
///
/// Fields are not escaped. A `|` or line break inside a title or description
/// corrupts that record, so such text is rejected when a task is created.
#[derive(Debug, Clone)]
pub struct TaskDataService {
    path: PathBuf,
}

impl TaskDataService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save_tasks(&self, tasks: &[Task]) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| AppError::Io(err.to_string()))?;
        }

        let mut content = String::new();
        for task in tasks {
            content.push_str(&format_task_line(task));
            content.push('\n');
        }

        fs::write(&self.path, content).map_err(|err| {
            AppError::Io(format!("Failed to save tasks to {}: {}", self.path.display(), err))
        })?;
        tracing::info!(path = %self.path.display(), count = tasks.len(), "saved tasks");
        Ok(())
    }

    /// Loads every well-formed record. A missing file is an empty list.
    pub fn load_tasks(&self) -> AppResult<Vec<Task>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let raw = fs::read_to_string(&self.path).map_err(|err| {
            AppError::Io(format!("Failed to load tasks from {}: {}", self.path.display(), err))
        })?;

        let mut tasks = Vec::new();
        for (index, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_task_line(line) {
                Ok(Some(task)) => tasks.push(task),
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        line = index + 1,
                        error = %error,
                        "skipping malformed task record"
                    );
                }
            }
        }

        tracing::info!(path = %self.path.display(), count = tasks.len(), "loaded tasks");
        Ok(tasks)
    }

    pub fn data_file_exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn delete_data_file(&self) -> AppResult<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

pub fn format_task_line(task: &Task) -> String {
    format!(
        "{}|{}|{}|{}|{}|{}",
        task.title,
        task.description,
        task.deadline.format(TIMESTAMP_FORMAT),
        task.priority,
        if task.completed { "True" } else { "False" },
        task.created_at.format(TIMESTAMP_FORMAT)
    )
}

/// `Ok(None)` for lines with too few fields; those are dropped silently.
pub fn parse_task_line(line: &str) -> AppResult<Option<Task>> {
    let parts: Vec<&str> = line.split('|').collect();
    if parts.len() < FIELD_COUNT {
        return Ok(None);
    }

    Ok(Some(Task {
        title: parts[0].to_string(),
        description: parts[1].to_string(),
        deadline: NaiveDateTime::parse_from_str(parts[2].trim(), TIMESTAMP_FORMAT)?,
        priority: parts[3].trim().parse::<i32>()?,
        completed: parse_flag(parts[4])?,
        created_at: NaiveDateTime::parse_from_str(parts[5].trim(), TIMESTAMP_FORMAT)?,
    }))
}

fn parse_flag(raw: &str) -> AppResult<bool> {
    let value = raw.trim();
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(AppError::Parse(format!("'{}' is not True or False", value)))
    }
}

#[cfg(test)]
mod tests {
    use super::{format_task_line, parse_task_line, TaskDataService};
    use crate::models::Task;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::fs;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, day)
            .and_then(|date| date.and_hms_opt(hour, 15, 30))
            .expect("valid timestamp")
    }

    fn sample(title: &str, completed: bool) -> Task {
        Task {
            title: title.to_string(),
            description: "Quarterly numbers".to_string(),
            deadline: at(20, 17),
            priority: 3,
            completed,
            created_at: at(2, 9),
        }
    }

    #[test]
    fn formats_six_pipe_separated_fields() {
        assert_eq!(
            format_task_line(&sample("Report", true)),
            "Report|Quarterly numbers|2024-11-20 17:15:30|3|True|2024-11-02 09:15:30"
        );
    }

    #[test]
    fn short_lines_are_dropped_and_bad_fields_are_errors() {
        assert!(parse_task_line("only|three|fields").expect("short").is_none());
        assert!(parse_task_line("a|b|not-a-date|1|True|2024-11-02 09:15:30").is_err());
        assert!(parse_task_line("a|b|2024-11-20 17:15:30|high|True|2024-11-02 09:15:30").is_err());
        assert!(parse_task_line("a|b|2024-11-20 17:15:30|1|maybe|2024-11-02 09:15:30").is_err());
        let task = parse_task_line("a|b|2024-11-20 17:15:30|1|false|2024-11-02 09:15:30")
            .expect("parse")
            .expect("record");
        assert!(!task.completed);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("tasks.txt");
        let service = TaskDataService::new(&path);
        assert_eq!(service.path(), path.as_path());
        let tasks = vec![sample("Report", false), sample("Review", true)];

        service.save_tasks(&tasks).expect("save");
        assert!(service.data_file_exists());
        assert_eq!(service.load_tasks().expect("load"), tasks);
    }

    #[test]
    fn load_skips_blank_short_and_malformed_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tasks.txt");
        let good = format_task_line(&sample("Keep", false));
        fs::write(
            &path,
            format!("\n{}\n   \nbroken|line\nx|y|nope|1|True|nope\n{}\n", good, good),
        )
        .expect("write fixture");

        let loaded = TaskDataService::new(&path).load_tasks().expect("load");
        assert_eq!(loaded.len(), 2);
        assert!(loaded.iter().all(|task| task.title == "Keep"));
    }

    #[test]
    fn missing_file_loads_empty_and_delete_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = TaskDataService::new(dir.path().join("absent.txt"));
        assert!(service.load_tasks().expect("load").is_empty());
        assert!(!service.data_file_exists());
        service.delete_data_file().expect("delete missing");

        service.save_tasks(&[]).expect("save empty");
        assert!(service.data_file_exists());
        service.delete_data_file().expect("delete");
        assert!(!service.data_file_exists());
    }
}
