//! This crate is the core of a personal day planner: tasks that can be scheduled into a calendar, and completed.
//!
//! Tasks are persisted by a [`RecordStore`](traits::RecordStore). This crate provides a local one ([`LocalStore`](store::LocalStore)),
//! and one that behaves like a live-synced document database ([`SyncedCollection`](store::SyncedCollection)).
//!
//! A [`Reconciler`] sits between a store and the views of an app. \
//! It turns user actions into requests to the store, keeps the categories, schedules and completion flags of tasks consistent,
//! and derives what the list view and the calendar view display.
//! Which of these views are visible is decided by a [`ViewController`](view::ViewController).

pub mod traits;
pub mod config;
mod error;
pub use error::{Error, Result};

pub mod record;
pub use record::TaskId;
pub mod task;
pub use task::{Category, Schedule, Task};

pub mod reconciler;
pub use reconciler::Reconciler;
pub mod store;
pub mod view;

pub mod mock_behaviour;
pub mod utils;
