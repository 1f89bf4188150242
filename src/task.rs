//! To-do tasks, and the rules that keep their fields consistent

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::record::{StoredRecord, TaskDocument, TaskId};

/// Where a task belongs.
///
/// The category and the completion flag are redundant, but stores keep both. This crate makes sure they agree:
/// a task is `Completed` if and only if it is completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Not in the calendar yet. Such tasks have no dates
    Unscheduled,
    /// In the calendar. Such tasks have a [`Schedule`]
    Scheduled,
    Completed,
    /// A scheduled task whose end has elapsed.
    /// This is only ever produced by the past-due sweep, which is disabled by default (see [`crate::config::Settings`])
    Past,
}

impl Category {
    /// Whether tasks of this category must have a schedule
    pub fn requires_schedule(&self) -> bool {
        matches!(self, Category::Scheduled | Category::Past)
    }

    /// The category a non-completed task falls back to
    pub fn for_uncompleted(schedule: Option<&Schedule>) -> Self {
        match schedule {
            Some(_) => Category::Scheduled,
            None => Category::Unscheduled,
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Unscheduled => write!(f, "unscheduled"),
            Category::Scheduled => write!(f, "scheduled"),
            Category::Completed => write!(f, "completed"),
            Category::Past => write!(f, "past"),
        }
    }
}


/// The time span of a task in the calendar.
///
/// Start and end are always set together, and `start <= end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schedule {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Schedule {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(Error::validation(format!("schedule ends ({}) before it starts ({})", end, start)));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> { self.start }
    pub fn end(&self) -> DateTime<Utc>   { self.end   }
}


/// Changes that can be applied to a task from the calendar view (moving or resizing an appointment, renaming it...).
///
/// Fields that are `None` are left untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppointmentChanges {
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub category: Option<Category>,
}


/// A to-do task
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    id: TaskId,
    description: String,
    category: Category,
    schedule: Option<Schedule>,
    undelivered: bool,
}

impl Task {
    pub fn id(&self) -> &TaskId                 { &self.id                }
    pub fn description(&self) -> &str           { &self.description       }
    pub fn category(&self) -> Category          { self.category           }
    pub fn completed(&self) -> bool             { self.category == Category::Completed }
    pub fn schedule(&self) -> Option<&Schedule> { self.schedule.as_ref()  }
    pub fn start_date(&self) -> Option<DateTime<Utc>> { self.schedule.map(|s| s.start()) }
    pub fn end_date(&self) -> Option<DateTime<Utc>>   { self.schedule.map(|s| s.end())   }
    /// Whether this is a stand-in for a task the store holds but has not delivered yet.
    /// Such a task has an empty description and no dates, whatever the store holds
    pub fn is_undelivered(&self) -> bool        { self.undelivered            }

    pub(crate) fn undelivered(id: TaskId) -> Self {
        Self {
            id,
            description: String::new(),
            category: Category::Unscheduled,
            schedule: None,
            undelivered: true,
        }
    }

    /// Build a task from what a record store holds.
    ///
    /// Documents that break the task invariants (e.g. they have been written by another client) are repaired, and a warning is logged.
    /// This only fails if the stored dates cannot be represented.
    pub fn from_document(id: TaskId, document: &TaskDocument) -> Result<Self> {
        let start = document.start_date.to_datetime()?;
        let end = document.end_date.to_datetime()?;

        let mut schedule = match (start, end) {
            (None, None) => None,
            (Some(start), Some(end)) => match Schedule::new(start, end) {
                Ok(schedule) => Some(schedule),
                Err(_) => {
                    log::warn!("Task {} ends before it starts. Ignoring its dates", id);
                    None
                }
            },
            _ => {
                log::warn!("Task {} has only one of its dates set. Ignoring its dates", id);
                None
            },
        };

        let category = if document.completed {
            if document.category != Category::Completed {
                log::warn!("Task {} is completed but is in category {}. Moving it to completed", id, document.category);
            }
            Category::Completed
        } else {
            match document.category {
                Category::Completed => {
                    log::warn!("Task {} is in category completed but is not completed", id);
                    Category::for_uncompleted(schedule.as_ref())
                },
                cat if cat.requires_schedule() && schedule.is_none() => {
                    log::warn!("Task {} is {} but has no dates. Considering it unscheduled", id, cat);
                    Category::Unscheduled
                },
                Category::Unscheduled if schedule.is_some() => {
                    log::warn!("Task {} is unscheduled but has dates. Ignoring its dates", id);
                    schedule = None;
                    Category::Unscheduled
                },
                cat => cat,
            }
        };

        Ok(Self {
            id,
            description: document.desc.clone(),
            category,
            schedule,
            undelivered: false,
        })
    }

    pub fn from_record(record: &StoredRecord) -> Result<Self> {
        Self::from_document(record.id.clone(), &record.document)
    }

    /// Returns what this task would look like once `changes` are merged into it, or a validation error if the result would be inconsistent
    pub fn with_changes(&self, changes: &AppointmentChanges) -> Result<Self> {
        let category = changes.category.unwrap_or(self.category);
        let start = changes.start_date.or_else(|| self.start_date());
        let end = changes.end_date.or_else(|| self.end_date());

        let schedule = match (start, end) {
            (None, None) => None,
            (Some(start), Some(end)) => Some(Schedule::new(start, end)?),
            _ => return Err(Error::validation("start and end dates must be set together")),
        };

        if category.requires_schedule() && schedule.is_none() {
            return Err(Error::validation(format!("a {} task must have dates", category)));
        }
        if category == Category::Unscheduled && schedule.is_some() {
            return Err(Error::validation("an unscheduled task cannot have dates"));
        }

        Ok(Self {
            id: self.id.clone(),
            description: changes.description.clone().unwrap_or_else(|| self.description.clone()),
            category,
            schedule,
            undelivered: false,
        })
    }

    /// Whether this task should have been done already.
    ///
    /// Completed tasks are never past due. Others are past due when their end date is strictly before `now`.
    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        if self.completed() {
            return false;
        }
        match self.end_date() {
            Some(end) => end < now,
            None => false,
        }
    }

    /// The (store) document that describes this task
    pub fn to_document(&self) -> TaskDocument {
        TaskDocument {
            desc: self.description.clone(),
            completed: self.completed(),
            category: self.category,
            start_date: self.start_date().into(),
            end_date: self.end_date().into(),
        }
    }
}
