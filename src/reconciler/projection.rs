//! Read-only views of the task collection, as renderers consume them

use chrono::{DateTime, Utc};

use crate::record::TaskId;
use crate::task::{Category, Task};

/// The tasks of the list view, split by category. Each list keeps the display order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListProjection {
    pub unscheduled: Vec<Task>,
    pub scheduled: Vec<Task>,
    pub completed: Vec<Task>,
    /// Always empty unless the past-due sweep is enabled
    pub past: Vec<Task>,
}

impl ListProjection {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut projection = Self::default();
        for task in tasks {
            let list = match task.category() {
                Category::Unscheduled => &mut projection.unscheduled,
                Category::Scheduled => &mut projection.scheduled,
                Category::Completed => &mut projection.completed,
                Category::Past => &mut projection.past,
            };
            list.push(task.clone());
        }
        projection
    }

    pub fn len(&self) -> usize {
        self.unscheduled.len() + self.scheduled.len() + self.completed.len() + self.past.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}


/// An entry of the calendar view
#[derive(Clone, Debug, PartialEq)]
pub struct Appointment {
    pub id: TaskId,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Whether its end has elapsed at the time the projection was built
    pub past_due: bool,
}

/// The calendar entries: scheduled tasks, and past ones (only produced by the past-due sweep)
pub fn calendar_appointments(tasks: &[Task], now: DateTime<Utc>) -> Vec<Appointment> {
    tasks.iter()
        .filter(|task| matches!(task.category(), Category::Scheduled | Category::Past))
        .filter_map(|task| {
            let schedule = task.schedule()?;
            Some(Appointment {
                id: task.id().clone(),
                title: task.description().to_string(),
                start_date: schedule.start(),
                end_date: schedule.end(),
                past_due: task.is_past_due(now),
            })
        })
        .collect()
}
