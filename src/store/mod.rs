mod flat_file;

pub use flat_file::{format_task_line, parse_task_line, TaskDataService, TIMESTAMP_FORMAT};

use crate::errors::{AppError, AppResult};
use crate::models::{Task, TaskId};
use chrono::NaiveDateTime;
use std::sync::{Arc, RwLock};

/// Read-only view over the task collection. Filtering and verification only
/// ever see this type, so they cannot add, drop or edit tasks.
#[derive(Debug, Clone, Copy)]
pub struct TaskSnapshot<'a> {
    tasks: &'a [Task],
}

impl<'a> TaskSnapshot<'a> {
    pub fn new(tasks: &'a [Task]) -> Self {
        Self { tasks }
    }

    pub fn iter(&self) -> std::slice::Iter<'a, Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn as_slice(&self) -> &'a [Task] {
        self.tasks
    }
}

/// Append-only ordered task collection. A task's id is its insertion index.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn add(&mut self, task: Task) -> TaskId {
        let id = TaskId(self.tasks.len());
        self.tasks.push(task);
        id
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(id.0)
    }

    pub fn set_deadline(&mut self, id: TaskId, deadline: NaiveDateTime) -> AppResult<()> {
        self.get_mut(id)?.deadline = deadline;
        Ok(())
    }

    pub fn mark_completed(&mut self, id: TaskId) -> AppResult<()> {
        self.get_mut(id)?.completed = true;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn snapshot(&self) -> TaskSnapshot<'_> {
        TaskSnapshot::new(&self.tasks)
    }

    fn get_mut(&mut self, id: TaskId) -> AppResult<&mut Task> {
        self.tasks
            .get_mut(id.0)
            .ok_or_else(|| AppError::NotFound(format!("Task {} does not exist", id.0)))
    }
}

/// Single-writer, multi-reader handle over a [`TaskStore`].
#[derive(Debug, Clone, Default)]
pub struct SharedTaskStore {
    inner: Arc<RwLock<TaskStore>>,
}

impl SharedTaskStore {
    pub fn new(store: TaskStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Runs `read` against a snapshot while holding the read lock.
    pub fn read<T>(&self, read: impl FnOnce(TaskSnapshot<'_>) -> T) -> AppResult<T> {
        let guard = self
            .inner
            .read()
            .map_err(|_| AppError::Internal("task store lock poisoned".to_string()))?;
        Ok(read(guard.snapshot()))
    }

    pub fn write<T>(&self, write: impl FnOnce(&mut TaskStore) -> AppResult<T>) -> AppResult<T> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| AppError::Internal("task store lock poisoned".to_string()))?;
        write(&mut *guard)
    }

    pub fn to_vec(&self) -> AppResult<Vec<Task>> {
        self.read(|snapshot| snapshot.as_slice().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::{SharedTaskStore, TaskStore};
    use crate::errors::AppResult;
    use crate::models::{Task, TaskId};
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use std::thread;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 20)
            .and_then(|date| date.and_hms_opt(hour, 0, 0))
            .expect("valid timestamp")
    }

    fn task(title: &str) -> Task {
        Task {
            title: title.to_string(),
            description: "desc".to_string(),
            deadline: at(18),
            priority: 2,
            completed: false,
            created_at: at(8),
        }
    }

    #[test]
    fn ids_follow_insertion_order() {
        let mut store = TaskStore::new();
        assert!(store.is_empty());
        assert!(store.snapshot().is_empty());
        assert_eq!(store.add(task("a")), TaskId(0));
        assert_eq!(store.add(task("b")), TaskId(1));
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(TaskId(1)).map(|t| t.title.as_str()), Some("b"));
        let titles: Vec<&str> = store.snapshot().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[test]
    fn updates_existing_tasks_and_rejects_unknown_ids() {
        let mut store = TaskStore::new();
        let id = store.add(task("a"));
        store.set_deadline(id, at(18) + Duration::days(2)).expect("move");
        store.mark_completed(id).expect("complete");
        let stored = store.get(id).expect("task exists");
        assert!(stored.completed);
        assert_eq!(stored.deadline, at(18) + Duration::days(2));

        let error = store.mark_completed(TaskId(9)).expect_err("unknown id");
        assert!(error.to_string().contains("NOT_FOUND"));
    }

    #[test]
    fn readers_see_appends_from_a_writer_thread() {
        let shared = SharedTaskStore::new(TaskStore::new());
        let writer = shared.clone();
        let handle = thread::spawn(move || {
            for index in 0..10 {
                writer
                    .write(|store| Ok(store.add(task(&format!("t{}", index)))))
                    .expect("append");
            }
        });
        handle.join().expect("writer thread");

        let count = shared.read(|snapshot| snapshot.len()).expect("read");
        assert_eq!(count, 10);
        assert_eq!(shared.to_vec().expect("copy")[9].title, "t9");
    }

    #[test]
    fn poisoned_lock_surfaces_as_internal_error() {
        let shared = SharedTaskStore::new(TaskStore::new());
        let writer = shared.clone();
        let outcome = thread::spawn(move || {
            let _ = writer.write(|_store| -> AppResult<()> { panic!("writer died mid-update") });
        })
        .join();
        assert!(outcome.is_err());

        let read_error = shared.read(|snapshot| snapshot.len()).expect_err("read");
        assert!(read_error.to_string().contains("INTERNAL"));
        let write_error = shared
            .write(|store| Ok(store.add(task("late"))))
            .expect_err("write");
        assert!(write_error.to_string().contains("INTERNAL"));
        let copy_error = shared.to_vec().expect_err("to_vec");
        assert!(copy_error.to_string().contains("INTERNAL"));
    }
}
