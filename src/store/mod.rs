//! In-process realizations of [`RecordStore`](crate::traits::RecordStore)
//!
//! * [`LocalStore`] keeps its records on the device (in a JSON file, or only in memory)
//! * [`SyncedCollection`] behaves like a collection of a live-synced document database

pub mod local_store;
pub mod synced_collection;

pub use local_store::LocalStore;
pub use synced_collection::{Delivery, SyncedCollection};

use crate::error::{Error, Result};
use crate::record::{DocumentPatch, Snapshot, TaskId};

/// Merge `changes` into the record `id`
fn update_record(records: &mut Snapshot, id: &TaskId, changes: &DocumentPatch) -> Result<()> {
    match records.iter_mut().find(|record| &record.id == id) {
        None => Err(Error::NotFound(id.clone())),
        Some(record) => {
            changes.apply_to(&mut record.document);
            Ok(())
        }
    }
}

fn delete_record(records: &mut Snapshot, id: &TaskId) -> Result<()> {
    let len_before = records.len();
    records.retain(|record| &record.id != id);
    if records.len() == len_before {
        return Err(Error::NotFound(id.clone()));
    }
    Ok(())
}
