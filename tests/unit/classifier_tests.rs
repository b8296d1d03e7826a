//! Unit tests for deadline classification and workload counting.

use chrono::{Duration, NaiveDate};

use task_digest::engine::classifier::{classify, completion_rate};
use task_digest::models::task::{Task, TaskStatus};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 5).expect("valid date")
}

fn task(title: &str, status: TaskStatus, assignee: &str, due: Option<NaiveDate>) -> Task {
    Task::new(title, status)
        .with_assignee(assignee, None)
        .with_due_date(due)
}

#[test]
fn done_task_is_never_overdue() {
    let tasks = vec![task(
        "finished",
        TaskStatus::Done,
        "Ana",
        Some(today() - Duration::days(1)),
    )];
    let result = classify(&tasks, today(), 2);
    assert!(result.overdue_tasks.is_empty());
    assert!(result.at_risk_tasks.is_empty());
    assert!(result.active_count_by_assignee.is_empty());
}

#[test]
fn past_due_todo_is_overdue_by_whole_days() {
    let tasks = vec![task(
        "late",
        TaskStatus::ToDo,
        "Ana",
        NaiveDate::from_ymd_opt(2024, 1, 1),
    )];
    let result = classify(&tasks, today(), 2);
    assert_eq!(result.overdue_tasks.len(), 1);
    assert_eq!(result.overdue_tasks[0].days_overdue, 4);
}

#[test]
fn due_tomorrow_is_at_risk() {
    let tasks = vec![task(
        "soon",
        TaskStatus::InProgress,
        "Ana",
        Some(today() + Duration::days(1)),
    )];
    let result = classify(&tasks, today(), 2);
    assert_eq!(result.at_risk_tasks.len(), 1);
    assert_eq!(result.at_risk_tasks[0].days_until_due, 1);
}

#[test]
fn risk_window_bounds_are_inclusive() {
    let tasks = vec![
        task("today", TaskStatus::ToDo, "Ana", Some(today())),
        task("edge", TaskStatus::ToDo, "Ana", Some(today() + Duration::days(2))),
        task("beyond", TaskStatus::ToDo, "Ana", Some(today() + Duration::days(3))),
    ];
    let result = classify(&tasks, today(), 2);
    let titles: Vec<&str> = result
        .at_risk_tasks
        .iter()
        .map(|e| e.task.title.as_str())
        .collect();
    assert_eq!(titles, vec!["today", "edge"]);
    assert!(result.overdue_tasks.is_empty());
}

#[test]
fn zero_window_only_flags_today() {
    let tasks = vec![
        task("today", TaskStatus::ToDo, "Ana", Some(today())),
        task("tomorrow", TaskStatus::ToDo, "Ana", Some(today() + Duration::days(1))),
    ];
    let result = classify(&tasks, today(), 0);
    assert_eq!(result.at_risk_tasks.len(), 1);
    assert_eq!(result.at_risk_tasks[0].days_until_due, 0);
}

#[test]
fn empty_input_is_all_zero() {
    let result = classify(&[], today(), 2);
    assert_eq!(result.total_count, 0);
    assert_eq!(result.done_count, 0);
    assert!((result.completion_rate - 0.0).abs() < f64::EPSILON);
    assert!(result.overdue_tasks.is_empty());
    assert!(result.at_risk_tasks.is_empty());
    assert!(result.active_count_by_assignee.is_empty());
    assert!(result.workload().is_empty());
}

#[test]
fn status_buckets_sum_to_total() {
    let tasks = vec![
        task("a", TaskStatus::Done, "Ana", None),
        task("b", TaskStatus::InProgress, "Ana", None),
        task("c", TaskStatus::ToDo, "Ben", None),
        task("d", TaskStatus::Unknown, "Ben", None),
        task("e", TaskStatus::Done, "Cy", None),
    ];
    let result = classify(&tasks, today(), 2);
    assert_eq!(result.total_count, 5);
    assert_eq!(
        result.done_count + result.in_progress_count + result.todo_count + result.unknown_count,
        result.total_count
    );
    assert!((result.completion_rate - 40.0).abs() < f64::EPSILON);
}

#[test]
fn completion_rate_rounds_to_one_decimal() {
    assert!((completion_rate(2, 3) - 66.7).abs() < 1e-9);
    assert!((completion_rate(1, 6) - 16.7).abs() < 1e-9);
    assert!((completion_rate(3, 3) - 100.0).abs() < 1e-9);
    assert!((completion_rate(0, 0) - 0.0).abs() < 1e-9);
}

#[test]
fn overdue_sort_is_descending_and_stable() {
    let tasks = vec![
        task("first-3", TaskStatus::ToDo, "Ana", Some(today() - Duration::days(3))),
        task("worst", TaskStatus::ToDo, "Ana", Some(today() - Duration::days(9))),
        task("second-3", TaskStatus::InProgress, "Ben", Some(today() - Duration::days(3))),
        task("mild", TaskStatus::ToDo, "Ben", Some(today() - Duration::days(1))),
        task("third-3", TaskStatus::Unknown, "Cy", Some(today() - Duration::days(3))),
    ];
    let result = classify(&tasks, today(), 2);
    let titles: Vec<&str> = result
        .overdue_tasks
        .iter()
        .map(|e| e.task.title.as_str())
        .collect();
    assert_eq!(
        titles,
        vec!["worst", "first-3", "second-3", "third-3", "mild"]
    );
}

#[test]
fn at_risk_sort_is_ascending_and_stable() {
    let tasks = vec![
        task("b-2", TaskStatus::ToDo, "Ana", Some(today() + Duration::days(2))),
        task("a-1", TaskStatus::ToDo, "Ana", Some(today() + Duration::days(1))),
        task("c-2", TaskStatus::ToDo, "Ana", Some(today() + Duration::days(2))),
        task("d-0", TaskStatus::ToDo, "Ana", Some(today())),
    ];
    let result = classify(&tasks, today(), 2);
    let titles: Vec<&str> = result
        .at_risk_tasks
        .iter()
        .map(|e| e.task.title.as_str())
        .collect();
    assert_eq!(titles, vec!["d-0", "a-1", "b-2", "c-2"]);
}

#[test]
fn overdue_and_at_risk_are_disjoint() {
    let tasks: Vec<Task> = (-5..=5)
        .map(|offset| {
            task(
                &format!("t{offset}"),
                TaskStatus::ToDo,
                "Ana",
                Some(today() + Duration::days(offset)),
            )
        })
        .collect();
    let result = classify(&tasks, today(), 3);
    for overdue in &result.overdue_tasks {
        assert!(result
            .at_risk_tasks
            .iter()
            .all(|risk| risk.task.title != overdue.task.title));
    }
    assert_eq!(result.overdue_tasks.len(), 5);
    assert_eq!(result.at_risk_tasks.len(), 4);
}

#[test]
fn tasks_without_due_date_count_toward_workload_only() {
    let tasks = vec![
        task("x", TaskStatus::ToDo, "Ana", None),
        task("y", TaskStatus::InProgress, "Ana", None),
        task("z", TaskStatus::Done, "Ana", None),
    ];
    let result = classify(&tasks, today(), 2);
    assert!(result.overdue_tasks.is_empty());
    assert!(result.at_risk_tasks.is_empty());
    assert_eq!(result.active_count_by_assignee.get("Ana"), Some(&2));
}

#[test]
fn workload_sorts_by_count_then_name() {
    let tasks = vec![
        task("1", TaskStatus::ToDo, "Zed", None),
        task("2", TaskStatus::ToDo, "Amy", None),
        task("3", TaskStatus::ToDo, "Bob", None),
        task("4", TaskStatus::ToDo, "Bob", None),
        task("5", TaskStatus::Done, "Amy", None),
    ];
    let result = classify(&tasks, today(), 2);
    assert_eq!(result.workload(), vec![("Bob", 2), ("Amy", 1), ("Zed", 1)]);
}

#[test]
fn huge_window_saturates_instead_of_overflowing() {
    let far = NaiveDate::from_ymd_opt(9000, 1, 1);
    let tasks = vec![
        task("distant", TaskStatus::ToDo, "Ana", far),
        task("late", TaskStatus::ToDo, "Ana", Some(today() - Duration::days(3))),
    ];
    let result = classify(&tasks, today(), u32::MAX);
    assert_eq!(result.overdue_tasks.len(), 1);
    assert_eq!(result.at_risk_tasks.len(), 1);
    assert_eq!(result.at_risk_tasks[0].task.title, "distant");
}
