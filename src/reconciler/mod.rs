//! This module keeps an in-memory collection of tasks in line with a record store
//!
//! It is also responsible for the consistency of task categories, schedules and completion flags

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::record::{DocumentPatch, Snapshot, StoredDate, TaskDocument, TaskId};
use crate::task::{AppointmentChanges, Category, Schedule, Task};
use crate::traits::{DeleteConfirmation, RecordStore, RefuseDeletion, SnapshotReceiver};

pub mod past_due;
pub mod projection;
use projection::{Appointment, ListProjection};

/// An appointment that is created straight from the calendar view
#[derive(Clone, Debug, PartialEq)]
pub struct NewAppointment {
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// What happened to a deletion request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The deletion has been sent to the store
    Deleted,
    /// The user did not confirm. Nothing has been sent
    Cancelled,
    /// There was no such task (anymore)
    AlreadyGone,
}

/// Owns the collection of tasks a user sees, and turns user actions into requests to a [`RecordStore`].
///
/// Requests do not modify the collection: it is replaced as a whole whenever the store notifies a new content (see [`Self::refresh`]).
/// With a store that notifies synchronously (e.g. a [`LocalStore`](crate::store::LocalStore)), changes are visible right after a request.
/// With a remote store, they become visible once the store has delivered them.
pub struct Reconciler<S>
where
    S: RecordStore,
{
    store: S,
    subscription: SnapshotReceiver,
    /// The current tasks, in display order
    tasks: Vec<Task>,
    confirmation: Box<dyn DeleteConfirmation>,
    settings: Settings,
}

impl<S> Reconciler<S>
where
    S: RecordStore,
{
    /// Create a reconciler and load the current content of `store`.
    ///
    /// Deletions that need a confirmation are refused until [`Self::set_delete_confirmation`] is called
    pub fn new(store: S, settings: Settings) -> Self {
        let subscription = store.subscribe_all();
        let mut reconciler = Self {
            store,
            subscription,
            tasks: Vec::new(),
            confirmation: Box::new(RefuseDeletion),
            settings,
        };
        let initial = reconciler.subscription.borrow_and_update().clone();
        reconciler.apply_snapshot(&initial);
        reconciler
    }

    /// Set how the user is asked to confirm the deletion of tasks that have a description
    pub fn set_delete_confirmation<C: DeleteConfirmation + 'static>(&mut self, confirmation: C) {
        self.confirmation = Box::new(confirmation);
    }

    pub fn store(&self) -> &S { &self.store }
    pub fn store_mut(&mut self) -> &mut S { &mut self.store }
    pub fn settings(&self) -> &Settings { &self.settings }

    /// The current tasks, in display order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Returns the task with the given id, as of the last applied notification
    pub fn task(&self, id: &TaskId) -> Result<&Task> {
        self.tasks.iter()
            .find(|task| task.id() == id)
            .ok_or_else(|| Error::NotFound(id.clone()))
    }

    /// Apply the latest notification of the store, if there is a new one.
    ///
    /// Returns whether the collection has been replaced
    pub fn refresh(&mut self) -> bool {
        match self.subscription.has_changed() {
            Ok(true) => {
                let snapshot = self.subscription.borrow_and_update().clone();
                self.apply_snapshot(&snapshot);
                true
            },
            Ok(false) => false,
            Err(_) => {
                log::warn!("The record store has closed its subscription. Keeping the last known tasks");
                false
            },
        }
    }

    /// Wait until the store notifies a new content, then apply it
    pub async fn next_notification(&mut self) -> Result<()> {
        if self.subscription.changed().await.is_err() {
            return Err(Error::store_unavailable("the record store has closed its subscription"));
        }
        let snapshot = self.subscription.borrow_and_update().clone();
        self.apply_snapshot(&snapshot);
        Ok(())
    }

    /// Replace the collection with the content of a snapshot.
    ///
    /// Tasks that were already known keep their display position, new ones are appended in store order.
    fn apply_snapshot(&mut self, snapshot: &Snapshot) {
        let mut tasks: Vec<Task> = snapshot.iter()
            .filter_map(|record| match Task::from_record(record) {
                Ok(task) => Some(task),
                Err(err) => {
                    log::warn!("Ignoring record {}: {}", record.id, err);
                    None
                },
            })
            .collect();

        let positions: HashMap<TaskId, usize> = self.tasks.iter()
            .enumerate()
            .map(|(pos, task)| (task.id().clone(), pos))
            .collect();
        tasks.sort_by_key(|task| positions.get(task.id()).copied().unwrap_or(usize::MAX));

        log::debug!("Applying a snapshot of {} tasks", tasks.len());
        self.tasks = tasks;
    }

    /// Look a task up after having picked up the latest notification, so that decisions are never taken on stale data
    fn current_task(&mut self, id: &TaskId) -> Result<Task> {
        self.refresh();
        self.task(id).cloned()
    }

    /// Send a patch, considering an unknown id is not an error: the task is gone already
    async fn send_update(&mut self, id: &TaskId, changes: DocumentPatch) -> Result<()> {
        match self.store.update(id, changes).await {
            Err(Error::NotFound(_)) => {
                log::info!("Task {} has vanished from the store. Ignoring the change", id);
                Ok(())
            },
            other => other,
        }
    }


    /// Create a task that is not scheduled yet.
    ///
    /// An empty description is allowed: this is a placeholder that can be filled in later with [`Self::save_task`]
    pub async fn add_task(&mut self, description: &str) -> Result<Task> {
        let document = TaskDocument::unscheduled(description.to_string());
        let id = self.store.create(document.clone()).await?;
        log::info!("Added task {}", id);
        Task::from_document(id, &document)
    }

    /// Create a task that directly lands in the calendar
    pub async fn add_appointment(&mut self, appointment: NewAppointment) -> Result<Task> {
        let schedule = Schedule::new(appointment.start_date, appointment.end_date)?;
        let document = TaskDocument::scheduled(appointment.title, &schedule);
        let id = self.store.create(document.clone()).await?;
        log::info!("Added appointment {}", id);
        Task::from_document(id, &document)
    }

    /// Merge some changes into a task (e.g. when an appointment is moved or resized in the calendar).
    ///
    /// Only the supplied fields are sent. The resulting task must be consistent, otherwise nothing is sent.
    /// A past task that is moved to dates that have not elapsed goes back to the scheduled tasks.
    ///
    /// Returns [`Error::NotFound`] without sending anything if the task has not been delivered (yet).
    pub async fn edit_appointment(&mut self, id: &TaskId, changes: AppointmentChanges) -> Result<()> {
        let current = self.current_task(id).map_err(|err| {
            if err.is_not_found() {
                log::info!("Cannot edit task {}: it is not (or no longer) known", id);
            }
            err
        })?;
        let edited = current.with_changes(&changes)?;

        let dates_changed = changes.start_date.is_some() || changes.end_date.is_some();
        let category = match changes.category {
            None if current.category() == Category::Past && dates_changed && !edited.is_past_due(Utc::now()) => {
                log::debug!("Task {} is not past due anymore", id);
                Some(Category::Scheduled)
            },
            category => category,
        };

        let patch = DocumentPatch {
            desc: changes.description,
            completed: category.map(|cat| cat == Category::Completed),
            category,
            start_date: changes.start_date.map(StoredDate::from),
            end_date: changes.end_date.map(StoredDate::from),
        };
        if patch.is_empty() {
            return Ok(());
        }
        self.send_update(id, patch).await
    }

    /// Delete a task.
    ///
    /// If it has a description, the user is asked to confirm first. Tasks without description have never been "real" to the user, and are deleted straight away.
    /// A task that has not been delivered yet may have a description, so its deletion is always confirmed.
    pub async fn delete_task(&mut self, id: &TaskId) -> Result<DeleteOutcome> {
        let task = match self.current_task(id) {
            Ok(task) => task,
            Err(Error::NotFound(_)) => {
                log::debug!("Task {} is not known (yet). Sending its deletion anyway", id);
                Task::undelivered(id.clone())
            },
            Err(err) => return Err(err),
        };

        let needs_confirmation = task.is_undelivered() || !task.description().is_empty();
        if needs_confirmation && !self.confirmation.confirm_delete(&task).await {
            log::debug!("Deletion of {} has been cancelled", id);
            return Ok(DeleteOutcome::Cancelled);
        }

        self.send_delete(id).await
    }

    /// Delete a task from the calendar view. This does not ask for any confirmation
    pub async fn delete_appointment(&mut self, id: &TaskId) -> Result<DeleteOutcome> {
        self.send_delete(id).await
    }

    async fn send_delete(&mut self, id: &TaskId) -> Result<DeleteOutcome> {
        match self.store.delete(id).await {
            Ok(()) => {
                log::info!("Deleted task {}", id);
                Ok(DeleteOutcome::Deleted)
            },
            Err(Error::NotFound(_)) => Ok(DeleteOutcome::AlreadyGone),
            Err(err) => Err(err),
        }
    }

    /// Change the description of a task
    pub async fn save_task(&mut self, id: &TaskId, description: &str) -> Result<()> {
        let patch = DocumentPatch {
            desc: Some(description.to_string()),
            ..DocumentPatch::default()
        };
        self.send_update(id, patch).await
    }

    /// Put a task into the calendar.
    ///
    /// A schedule that ends before it starts is rejected, and the task is left untouched
    pub async fn schedule_task(&mut self, id: &TaskId, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
        let schedule = Schedule::new(start, end)?;
        let patch = DocumentPatch {
            completed: Some(false),
            category: Some(Category::Scheduled),
            start_date: Some(StoredDate::from(schedule.start())),
            end_date: Some(StoredDate::from(schedule.end())),
            ..DocumentPatch::default()
        };
        self.send_update(id, patch).await
    }

    /// Mark a task as completed. Completing a completed task changes nothing
    pub async fn complete_task(&mut self, id: &TaskId) -> Result<()> {
        let patch = DocumentPatch {
            completed: Some(true),
            category: Some(Category::Completed),
            ..DocumentPatch::default()
        };
        self.send_update(id, patch).await
    }

    /// Mark a task as not completed.
    ///
    /// It goes back to the calendar if it has dates, to the unscheduled tasks otherwise.
    /// Returns [`Error::NotFound`] without sending anything if the task has not been delivered (yet), as its dates are unknown
    pub async fn uncomplete_task(&mut self, id: &TaskId) -> Result<()> {
        let current = self.current_task(id).map_err(|err| {
            if err.is_not_found() {
                log::info!("Cannot uncomplete task {}: it is not (or no longer) known", id);
            }
            err
        })?;

        let patch = DocumentPatch {
            completed: Some(false),
            category: Some(Category::for_uncompleted(current.schedule())),
            ..DocumentPatch::default()
        };
        self.send_update(id, patch).await
    }

    /// Number of tasks in a given category
    pub fn count_tasks(&self, category: Category) -> usize {
        self.tasks.iter()
            .filter(|task| task.category() == category)
            .count()
    }

    /// Apply a drag-and-drop reordering of the unscheduled tasks.
    ///
    /// `new_unscheduled_order` is the full list shown in the unscheduled area, including tasks dragged in from elsewhere.
    /// Other tasks are left untouched, in their existing order. Unscheduled tasks that are missing from the new order are kept after it.
    /// The display order only lives in this reconciler: it is not sent to the store.
    pub fn apply_reorder(&mut self, new_unscheduled_order: &[Task]) {
        self.refresh();

        let mut seen = HashSet::new();
        let mut reordered = Vec::with_capacity(new_unscheduled_order.len());
        for wanted in new_unscheduled_order {
            if !seen.insert(wanted.id().clone()) {
                log::warn!("Task {} appears twice in the new order. Ignoring the duplicate", wanted.id());
                continue;
            }
            match self.tasks.iter().find(|task| task.id() == wanted.id()) {
                Some(task) => reordered.push(task.clone()),
                None => log::warn!("Cannot reorder unknown task {}", wanted.id()),
            }
        }

        let (left_out, complement): (Vec<Task>, Vec<Task>) = self.tasks.drain(..)
            .filter(|task| !seen.contains(task.id()))
            .partition(|task| task.category() == Category::Unscheduled);
        if !left_out.is_empty() {
            log::warn!("{} unscheduled tasks are missing from the new order. Keeping them at the end", left_out.len());
        }

        self.tasks = complement;
        self.tasks.extend(reordered);
        self.tasks.extend(left_out);
    }

    /// The tasks, split by category
    pub fn derive_list_projection(&self) -> ListProjection {
        ListProjection::from_tasks(&self.tasks)
    }

    /// The tasks that are shown in the calendar
    pub fn derive_calendar_projection(&self) -> Vec<Appointment> {
        projection::calendar_appointments(&self.tasks, Utc::now())
    }

    /// Move every scheduled task whose end has elapsed to the `past` category.
    ///
    /// This does nothing unless [`Settings::enable_past_due_sweep`] is set.
    /// Returns the number of tasks that have been moved
    pub async fn sweep_past_due(&mut self, now: DateTime<Utc>) -> Result<usize> {
        if !self.settings.enable_past_due_sweep {
            return Ok(0);
        }
        self.refresh();

        let overdue: Vec<TaskId> = self.tasks.iter()
            .filter(|task| task.category() == Category::Scheduled && task.is_past_due(now))
            .map(|task| task.id().clone())
            .collect();

        for id in &overdue {
            log::debug!("Task {} is past due", id);
            let patch = DocumentPatch {
                category: Some(Category::Past),
                ..DocumentPatch::default()
            };
            self.send_update(id, patch).await?;
        }
        Ok(overdue.len())
    }
}
