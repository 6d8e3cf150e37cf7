use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use smart_task_scheduler_lib::contracts::validate_new_task;
use smart_task_scheduler_lib::verification::VerificationEngine;
use smart_task_scheduler_lib::{
    FilterEngine, FilterRequest, Task, TaskDataService, TaskDraft, TaskSnapshot,
};

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 5, 20)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .expect("valid timestamp")
}

fn arb_task() -> impl Strategy<Value = Task> {
    (
        "[A-Za-z0-9 ]{1,20}",
        "[A-Za-z0-9 .,]{0,40}",
        -10_000i64..10_000,
        1i32..=4,
        any::<bool>(),
        -20_000i64..0,
    )
        .prop_map(
            |(title, description, deadline_minutes, priority, completed, created_minutes)| Task {
                title,
                description,
                deadline: base() + Duration::minutes(deadline_minutes),
                priority,
                completed,
                created_at: base() + Duration::minutes(created_minutes),
            },
        )
}

fn arb_request() -> impl Strategy<Value = FilterRequest> {
    (
        prop::sample::select(vec![
            "",
            "Priority == 1",
            "IsOverdue",
            "IsUrgent || Priority > 2",
            "!IsCompleted && Priority <= 2",
            "nonsense ((",
        ]),
        any::<bool>(),
        any::<bool>(),
        prop::sample::select(vec!["", "> today", "< today", "== today", "2025-05-21", "soon"]),
        prop::sample::select(vec!["", "1", ">2", "<3", ">x", "high"]),
    )
        .prop_map(|(custom, by_deadline, by_priority, deadline, priority)| FilterRequest {
            custom_filter: custom.to_string(),
            by_deadline,
            by_priority,
            deadline_filter: deadline.to_string(),
            priority_filter: priority.to_string(),
        })
}

proptest! {
    /// Every kept task is one of the inputs, in input order, at most once.
    #[test]
    fn filtered_tasks_are_an_ordered_subset(
        tasks in prop::collection::vec(arb_task(), 0..30),
        request in arb_request(),
    ) {
        let outcome = FilterEngine::new().evaluate(TaskSnapshot::new(&tasks), &request, base());
        let mut last_index = None;
        for kept in &outcome.tasks {
            let index = tasks.iter().position(|task| std::ptr::eq(task, *kept));
            prop_assert!(index.is_some());
            prop_assert!(index > last_index);
            last_index = index;
        }
    }

    #[test]
    fn filtered_priorities_stay_in_range(
        tasks in prop::collection::vec(arb_task(), 0..30),
        request in arb_request(),
    ) {
        let outcome = FilterEngine::new().evaluate(TaskSnapshot::new(&tasks), &request, base());
        prop_assert!(outcome.tasks.iter().all(|task| (1..=4).contains(&task.priority)));
    }

    #[test]
    fn evaluation_is_idempotent(
        tasks in prop::collection::vec(arb_task(), 0..30),
        request in arb_request(),
    ) {
        let engine = FilterEngine::new();
        let first = engine.evaluate(TaskSnapshot::new(&tasks), &request, base());
        let second = engine.evaluate(TaskSnapshot::new(&tasks), &request, base());
        prop_assert_eq!(first.tasks, second.tasks);
        prop_assert_eq!(first.notices, second.notices);
    }

    #[test]
    fn wp_trace_is_never_empty_and_ends_with_result(
        tasks in prop::collection::vec(arb_task(), 0..10),
        request in arb_request(),
    ) {
        let report = VerificationEngine::new()
            .verify_filter_operation(&request, TaskSnapshot::new(&tasks));
        prop_assert!(!report.wp_steps.is_empty());
        prop_assert_eq!(report.wp_steps.last(), Some(&report.wp_result));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn task_file_round_trips(tasks in prop::collection::vec(arb_task(), 0..20)) {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = TaskDataService::new(dir.path().join("tasks.txt"));
        service.save_tasks(&tasks).expect("save");
        let loaded = service.load_tasks().expect("load");
        prop_assert_eq!(loaded, tasks);
    }

    #[test]
    fn accepted_drafts_survive_the_task_file(
        title in "[A-Za-z |\n\r]{1,12}",
        description in "[a-z |\n]{0,12}",
    ) {
        let draft = TaskDraft {
            title,
            description,
            deadline: base() + Duration::hours(3),
            priority: 2,
        };
        match validate_new_task(&draft, base()) {
            Ok(()) => {
                let task = Task::from_draft(draft, base());
                let dir = tempfile::tempdir().expect("tempdir");
                let service = TaskDataService::new(dir.path().join("tasks.txt"));
                service.save_tasks(std::slice::from_ref(&task)).expect("save");
                prop_assert_eq!(service.load_tasks().expect("load"), vec![task]);
            }
            Err(error) => {
                prop_assert!(error.to_string().starts_with("VALIDATION_FAILED"));
                let text = format!("{}{}", draft.title, draft.description);
                prop_assert!(draft.title.trim().is_empty() || text.contains(['|', '\n', '\r']));
            }
        }
    }
}
