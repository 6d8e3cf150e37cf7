use crate::contracts::{validate_deadline, validate_new_task};
use crate::errors::AppResult;
use crate::filter::FilterEngine;
use crate::models::{AppSettings, FilterRequest, FilteredResult, Task, TaskDraft, TaskId};
use crate::store::{SharedTaskStore, TaskDataService, TaskSnapshot, TaskStore};
use crate::verification::VerificationEngine;
use chrono::{Local, NaiveDateTime};

pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// The core query: filter `tasks` with `request` and attach the
/// verification report for the same request and snapshot.
pub fn run_filter_query(
    tasks: TaskSnapshot<'_>,
    request: &FilterRequest,
    now: NaiveDateTime,
) -> FilteredResult {
    let verification = VerificationEngine::new().verify_filter_operation(request, tasks);
    let outcome = FilterEngine::new().evaluate(tasks, request, now);

    if !outcome.notices.is_empty() {
        tracing::info!(notices = outcome.notices.len(), "filter query degraded; see notices");
    }

    FilteredResult {
        filtered_tasks: outcome.tasks.into_iter().cloned().collect(),
        verification,
        notices: outcome.notices,
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerService {
    store: SharedTaskStore,
    data: TaskDataService,
    settings: AppSettings,
}

impl SchedulerService {
    /// Service with an empty store; nothing is read from disk.
    pub fn new(settings: AppSettings) -> Self {
        Self {
            store: SharedTaskStore::new(TaskStore::new()),
            data: TaskDataService::new(&settings.data_file),
            settings,
        }
    }

    /// Service seeded from the configured data file.
    pub fn open(settings: AppSettings) -> AppResult<Self> {
        let data = TaskDataService::new(&settings.data_file);
        let tasks = data.load_tasks()?;
        Ok(Self {
            store: SharedTaskStore::new(TaskStore::from_tasks(tasks)),
            data,
            settings,
        })
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn store(&self) -> SharedTaskStore {
        self.store.clone()
    }

    pub fn tasks(&self) -> AppResult<Vec<Task>> {
        self.store.to_vec()
    }

    pub fn add_task(&self, draft: TaskDraft) -> AppResult<TaskId> {
        self.add_task_at(draft, local_now())
    }

    pub fn add_task_at(&self, draft: TaskDraft, now: NaiveDateTime) -> AppResult<TaskId> {
        validate_new_task(&draft, now)?;
        let task = Task::from_draft(draft, now);
        let id = self.commit(|store| Ok(store.add(task)))?;
        tracing::info!(task_id = id.0, "task added");
        Ok(id)
    }

    pub fn move_task(&self, id: TaskId, deadline: NaiveDateTime) -> AppResult<()> {
        self.move_task_at(id, deadline, local_now())
    }

    pub fn move_task_at(
        &self,
        id: TaskId,
        deadline: NaiveDateTime,
        now: NaiveDateTime,
    ) -> AppResult<()> {
        validate_deadline(deadline, now)?;
        self.commit(|store| store.set_deadline(id, deadline))?;
        tracing::info!(task_id = id.0, deadline = %deadline, "task moved");
        Ok(())
    }

    pub fn complete_task(&self, id: TaskId) -> AppResult<()> {
        self.commit(|store| store.mark_completed(id))?;
        tracing::info!(task_id = id.0, "task completed");
        Ok(())
    }

    pub fn filter_tasks(&self, request: &FilterRequest) -> AppResult<FilteredResult> {
        self.filter_tasks_at(request, local_now())
    }

    pub fn filter_tasks_at(
        &self,
        request: &FilterRequest,
        now: NaiveDateTime,
    ) -> AppResult<FilteredResult> {
        self.store.read(|snapshot| run_filter_query(snapshot, request, now))
    }

    /// Writes the data file under the store's write lock so a save never
    /// overtakes a later mutation.
    pub fn save(&self) -> AppResult<()> {
        self.store
            .write(|store| self.data.save_tasks(store.snapshot().as_slice()))
    }

    /// Applies `change` and, with autosave on, writes the file before the
    /// write lock is released.
    fn commit<T>(&self, change: impl FnOnce(&mut TaskStore) -> AppResult<T>) -> AppResult<T> {
        let autosave = self.settings.autosave;
        self.store.write(|store| {
            let value = change(store)?;
            if autosave {
                self.data.save_tasks(store.snapshot().as_slice())?;
            }
            Ok(value)
        })
    }
}
