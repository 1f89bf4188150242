//! Behaviour of the reconciler, checked against every kind of record store

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dayplanner::mock_behaviour::MockBehaviour;
use dayplanner::reconciler::{DeleteOutcome, NewAppointment};
use dayplanner::store::SyncedCollection;
use dayplanner::task::AppointmentChanges;
use dayplanner::traits::RecordStore;
use dayplanner::config::Settings;
use dayplanner::{Category, Error, Reconciler, Task};

use scenarii::{add_tasks, assert_invariants, batched_reconciler, date, ids, local_reconciler, synced_reconciler};


async fn invariants_hold_after_every_operation<S: RecordStore>(mut rec: Reconciler<S>) {
    let tasks = add_tasks(&mut rec, &["a", "b", "c", ""]).await;
    assert_invariants(&rec);

    rec.schedule_task(tasks[0].id(), date(2024, 1, 1), date(2024, 1, 2)).await.unwrap();
    rec.complete_task(tasks[1].id()).await.unwrap();
    rec.refresh();
    assert_invariants(&rec);

    let renaming = AppointmentChanges { description: Some("renamed".to_string()), ..Default::default() };
    let completing = AppointmentChanges { category: Some(Category::Completed), ..Default::default() };
    for changes in vec![renaming, completing] {
        rec.edit_appointment(tasks[0].id(), changes).await.unwrap();
        rec.refresh();
        assert_invariants(&rec);
    }

    rec.uncomplete_task(tasks[0].id()).await.unwrap();
    rec.uncomplete_task(tasks[1].id()).await.unwrap();
    rec.save_task(tasks[3].id(), "filled in").await.unwrap();
    rec.add_appointment(NewAppointment { title: "call".to_string(), start_date: date(2024, 2, 1), end_date: date(2024, 2, 1) }).await.unwrap();
    rec.refresh();
    assert_invariants(&rec);

    assert_eq!(rec.task(tasks[0].id()).unwrap().category(), Category::Scheduled);
    assert_eq!(rec.task(tasks[0].id()).unwrap().description(), "renamed");
    assert_eq!(rec.task(tasks[1].id()).unwrap().category(), Category::Unscheduled);
    assert_eq!(rec.task(tasks[3].id()).unwrap().description(), "filled in");
}

#[tokio::test]
async fn test_invariants_hold_after_every_operation() {
    invariants_hold_after_every_operation(local_reconciler()).await;
    invariants_hold_after_every_operation(synced_reconciler()).await;
}


async fn completing_is_idempotent<S: RecordStore>(mut rec: Reconciler<S>) {
    let tasks = add_tasks(&mut rec, &["a"]).await;

    rec.complete_task(tasks[0].id()).await.unwrap();
    rec.refresh();
    let once = rec.tasks().to_vec();

    rec.complete_task(tasks[0].id()).await.unwrap();
    rec.refresh();
    assert_eq!(rec.tasks(), &once[..]);
    assert_eq!(rec.count_tasks(Category::Completed), 1);
}

#[tokio::test]
async fn test_completing_is_idempotent() {
    completing_is_idempotent(local_reconciler()).await;
    completing_is_idempotent(synced_reconciler()).await;
}


async fn uncompleting_restores_the_schedule<S: RecordStore>(mut rec: Reconciler<S>) {
    let tasks = add_tasks(&mut rec, &["scheduled one", "plain one"]).await;
    rec.schedule_task(tasks[0].id(), date(2024, 1, 1), date(2024, 1, 2)).await.unwrap();

    for task in &tasks {
        rec.complete_task(task.id()).await.unwrap();
        rec.uncomplete_task(task.id()).await.unwrap();
    }
    rec.refresh();

    let scheduled = rec.task(tasks[0].id()).unwrap();
    assert_eq!(scheduled.category(), Category::Scheduled);
    assert!(!scheduled.completed());
    assert_eq!(scheduled.start_date(), Some(date(2024, 1, 1)));
    assert_eq!(scheduled.end_date(), Some(date(2024, 1, 2)));

    assert_eq!(rec.task(tasks[1].id()).unwrap().category(), Category::Unscheduled);
}

#[tokio::test]
async fn test_uncompleting_restores_the_schedule() {
    uncompleting_restores_the_schedule(local_reconciler()).await;
    uncompleting_restores_the_schedule(synced_reconciler()).await;
}


async fn counting<S: RecordStore>(mut rec: Reconciler<S>) {
    let tasks = add_tasks(&mut rec, &["a", "b", "c"]).await;
    rec.schedule_task(tasks[1].id(), date(2024, 5, 1), date(2024, 5, 3)).await.unwrap();
    rec.refresh();

    assert_eq!(rec.count_tasks(Category::Unscheduled), 2);
    assert_eq!(rec.count_tasks(Category::Scheduled), 1);
    assert_eq!(rec.count_tasks(Category::Completed), 0);
}

#[tokio::test]
async fn test_counting() {
    counting(local_reconciler()).await;
    counting(synced_reconciler()).await;
}


async fn deleting_asks_for_confirmation<S: RecordStore>(mut rec: Reconciler<S>) {
    let asked = Arc::new(AtomicUsize::new(0));
    let counter = asked.clone();
    rec.set_delete_confirmation(move |_task: &Task| {
        counter.fetch_add(1, Ordering::SeqCst);
        false
    });

    let tasks = add_tasks(&mut rec, &["important", ""]).await;

    assert_eq!(rec.delete_task(tasks[0].id()).await.unwrap(), DeleteOutcome::Cancelled);
    assert_eq!(asked.load(Ordering::SeqCst), 1);
    rec.refresh();
    assert!(rec.task(tasks[0].id()).is_ok());

    assert_eq!(rec.delete_task(tasks[1].id()).await.unwrap(), DeleteOutcome::Deleted);
    assert_eq!(asked.load(Ordering::SeqCst), 1);
    rec.refresh();
    assert!(rec.task(tasks[1].id()).unwrap_err().is_not_found());

    rec.set_delete_confirmation(|_task: &Task| true);
    assert_eq!(rec.delete_task(tasks[0].id()).await.unwrap(), DeleteOutcome::Deleted);
    assert_eq!(rec.delete_task(tasks[0].id()).await.unwrap(), DeleteOutcome::AlreadyGone);
    rec.refresh();
    assert!(rec.tasks().is_empty());
}

#[tokio::test]
async fn test_deleting_asks_for_confirmation() {
    deleting_asks_for_confirmation(local_reconciler()).await;
    deleting_asks_for_confirmation(synced_reconciler()).await;
}


async fn reversed_schedules_are_rejected<S: RecordStore>(mut rec: Reconciler<S>) {
    let tasks = add_tasks(&mut rec, &["a"]).await;
    let before = rec.task(tasks[0].id()).unwrap().clone();

    let err = rec.schedule_task(tasks[0].id(), date(2024, 3, 5), date(2024, 3, 1)).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    assert!(!rec.refresh());
    assert_eq!(rec.task(tasks[0].id()).unwrap(), &before);
    assert_eq!(before.category(), Category::Unscheduled);
    assert!(before.schedule().is_none());
}

#[tokio::test]
async fn test_reversed_schedules_are_rejected() {
    reversed_schedules_are_rejected(local_reconciler()).await;
    reversed_schedules_are_rejected(synced_reconciler()).await;
}


async fn reordering<S: RecordStore>(mut rec: Reconciler<S>) {
    let tasks = add_tasks(&mut rec, &["A", "scheduled", "B", "done", "C"]).await;
    let (a, sched, b, done, c) = (&tasks[0], &tasks[1], &tasks[2], &tasks[3], &tasks[4]);
    rec.schedule_task(sched.id(), date(2024, 1, 1), date(2024, 1, 2)).await.unwrap();
    rec.complete_task(done.id()).await.unwrap();
    rec.refresh();

    let before = rec.derive_list_projection();
    assert_eq!(ids(&before.unscheduled), ids(&[a.clone(), b.clone(), c.clone()]));

    rec.apply_reorder(&[c.clone(), a.clone(), b.clone()]);

    let after = rec.derive_list_projection();
    assert_eq!(ids(&after.unscheduled), ids(&[c.clone(), a.clone(), b.clone()]));
    assert_eq!(after.scheduled, before.scheduled);
    assert_eq!(after.completed, before.completed);

    let others: Vec<_> = rec.tasks().iter()
        .filter(|t| t.category() != Category::Unscheduled)
        .map(|t| t.id().clone())
        .collect();
    assert_eq!(others, vec![sched.id().clone(), done.id().clone()]);
}

#[tokio::test]
async fn test_reordering() {
    reordering(local_reconciler()).await;
    reordering(synced_reconciler()).await;
}


async fn calendar_shows_scheduled_tasks<S: RecordStore>(mut rec: Reconciler<S>) {
    let tasks = add_tasks(&mut rec, &["plain", "meeting"]).await;
    rec.schedule_task(tasks[1].id(), date(2024, 1, 1), date(2024, 1, 2)).await.unwrap();
    let appointment = rec.add_appointment(NewAppointment {
        title: "lunch".to_string(),
        start_date: date(2024, 1, 3),
        end_date: date(2024, 1, 3),
    }).await.unwrap();
    rec.refresh();

    let calendar = rec.derive_calendar_projection();
    assert_eq!(calendar.len(), 2);
    assert_eq!(calendar[0].id, *tasks[1].id());
    assert_eq!(calendar[0].title, "meeting");
    assert_eq!(calendar[1].id, *appointment.id());
    assert_eq!(calendar[1].start_date, date(2024, 1, 3));

    // Dragging an appointment in the calendar
    rec.edit_appointment(appointment.id(), AppointmentChanges {
        start_date: Some(date(2024, 1, 4)),
        end_date: Some(date(2024, 1, 5)),
        ..Default::default()
    }).await.unwrap();
    rec.refresh();
    let moved = rec.derive_calendar_projection();
    assert_eq!(moved[1].start_date, date(2024, 1, 4));
    assert_eq!(moved[1].title, "lunch");

    assert_eq!(rec.delete_appointment(appointment.id()).await.unwrap(), DeleteOutcome::Deleted);
    rec.refresh();
    assert_eq!(rec.derive_calendar_projection().len(), 1);
}

#[tokio::test]
async fn test_calendar_shows_scheduled_tasks() {
    calendar_shows_scheduled_tasks(local_reconciler()).await;
    calendar_shows_scheduled_tasks(synced_reconciler()).await;
}


#[tokio::test]
async fn test_changes_are_visible_once_delivered() {
    let (collection, mut rec) = batched_reconciler();

    let a = rec.add_task("a").await.unwrap();
    rec.add_task("b").await.unwrap();
    rec.complete_task(a.id()).await.unwrap();

    // Nothing has been delivered yet
    assert!(!rec.refresh());
    assert!(rec.tasks().is_empty());
    assert_eq!(rec.count_tasks(Category::Unscheduled), 0);

    // Everything arrives as a single notification
    assert!(collection.deliver());
    rec.next_notification().await.unwrap();
    assert_eq!(rec.tasks().len(), 2);
    assert_eq!(rec.task(a.id()).unwrap().category(), Category::Completed);
    assert!(!rec.refresh());
}

#[tokio::test]
async fn test_requests_on_undelivered_tasks() {
    let (collection, mut rec) = batched_reconciler();
    let asked = Arc::new(AtomicUsize::new(0));
    let counter = asked.clone();
    rec.set_delete_confirmation(move |task: &Task| {
        counter.fetch_add(1, Ordering::SeqCst);
        task.is_undelivered()
    });

    let placeholder = rec.add_task("").await.unwrap();
    let kept = rec.add_task("b").await.unwrap();
    assert!(rec.tasks().is_empty());

    // Its current dates and category are unknown, so an edit cannot be checked yet
    let changes = AppointmentChanges { description: Some("edited".to_string()), ..Default::default() };
    assert!(rec.edit_appointment(kept.id(), changes.clone()).await.unwrap_err().is_not_found());
    assert!(rec.uncomplete_task(kept.id()).await.unwrap_err().is_not_found());

    // Its description is unknown, so the deletion is confirmed before it is sent
    assert_eq!(rec.delete_task(placeholder.id()).await.unwrap(), DeleteOutcome::Deleted);
    assert_eq!(asked.load(Ordering::SeqCst), 1);

    assert!(collection.deliver());
    rec.next_notification().await.unwrap();
    assert_eq!(ids(rec.tasks()), vec![kept.id().clone()]);

    // Once delivered, the edit goes through
    rec.edit_appointment(kept.id(), changes).await.unwrap();
    collection.deliver();
    rec.refresh();
    assert_eq!(rec.task(kept.id()).unwrap().description(), "edited");
}

#[tokio::test]
async fn test_uncompleting_uses_fresh_data() {
    let _ = env_logger::builder().is_test(true).try_init();
    let collection = SyncedCollection::for_user("shared");
    let mut first = Reconciler::new(collection.clone(), Settings::default());
    let mut second = Reconciler::new(collection.clone(), Settings::default());

    let task = first.add_task("shared task").await.unwrap();
    first.complete_task(task.id()).await.unwrap();
    first.refresh();
    assert!(first.task(task.id()).unwrap().schedule().is_none());

    // Another session schedules it, then completes it again
    second.refresh();
    second.schedule_task(task.id(), date(2024, 1, 1), date(2024, 1, 2)).await.unwrap();
    second.complete_task(task.id()).await.unwrap();

    // The first session has not looked at the store since, but uncompleting must not rely on its stale copy
    first.uncomplete_task(task.id()).await.unwrap();
    first.refresh();
    assert_eq!(first.task(task.id()).unwrap().category(), Category::Scheduled);
}

#[tokio::test]
async fn test_last_write_wins() {
    let _ = env_logger::builder().is_test(true).try_init();
    let collection = SyncedCollection::for_user("shared");
    let mut first = Reconciler::new(collection.clone(), Settings::default());
    let mut second = Reconciler::new(collection.clone(), Settings::default());

    let task = first.add_task("original").await.unwrap();
    first.save_task(task.id(), "from the first session").await.unwrap();
    second.save_task(task.id(), "from the second session").await.unwrap();

    first.refresh();
    second.refresh();
    assert_eq!(first.task(task.id()).unwrap().description(), "from the second session");
    assert_eq!(first.tasks(), second.tasks());
}

#[tokio::test]
async fn test_unavailable_store() {
    let mut rec = synced_reconciler();
    let tasks = add_tasks(&mut rec, &["a"]).await;
    rec.store().set_behaviour(MockBehaviour { create_behaviour: (0, 1), ..MockBehaviour::default() });

    let err = rec.add_task("b").await.unwrap_err();
    assert!(matches!(err, Error::StoreUnavailable(_)));
    assert!(!rec.refresh());
    assert_eq!(rec.tasks().len(), 1);

    // The core does not retry, but the next request goes through
    rec.complete_task(tasks[0].id()).await.unwrap();
    rec.refresh();
    assert_eq!(rec.count_tasks(Category::Completed), 1);

    rec.store().set_behaviour(MockBehaviour::fail_now(1));
    let err = rec.delete_appointment(tasks[0].id()).await.unwrap_err();
    assert!(matches!(err, Error::StoreUnavailable(_)));
    rec.refresh();
    assert_eq!(rec.tasks().len(), 1);
}

#[tokio::test]
async fn test_inconsistent_documents_from_other_clients() {
    use dayplanner::record::{StoredDate, TaskDocument};

    let mut rec = synced_reconciler();
    // Another client wrote a task that is completed, but filed as scheduled, with a single date
    let document = TaskDocument {
        desc: "odd".to_string(),
        completed: true,
        category: Category::Scheduled,
        start_date: StoredDate::from(date(2024, 1, 1)),
        end_date: StoredDate::Empty,
    };
    let id = rec.store_mut().create(document).await.unwrap();
    rec.refresh();

    let task = rec.task(&id).unwrap();
    assert_eq!(task.category(), Category::Completed);
    assert!(task.schedule().is_none());
    assert_invariants(&rec);
}
