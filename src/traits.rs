use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::Result;
use crate::record::{DocumentPatch, Snapshot, TaskDocument, TaskId};
use crate::task::Task;

/// The receiving end of a store subscription.
///
/// It always holds the complete current set of records, and is notified whenever it changes.
pub type SnapshotReceiver = watch::Receiver<Snapshot>;

/// A place where task documents are persisted (a remote document database, a local file...)
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a new document, and return the id it has been given
    async fn create(&mut self, document: TaskDocument) -> Result<TaskId>;
    /// Merge some fields into an existing document.
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if there is no such document
    async fn update(&mut self, id: &TaskId, changes: DocumentPatch) -> Result<()>;
    /// Remove a document.
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if there is no such document
    async fn delete(&mut self, id: &TaskId) -> Result<()>;

    /// Subscribe to the whole content of this store.
    ///
    /// The receiver immediately holds the current content, and is notified again every time it changes.
    /// Several writes may be delivered as a single notification.
    fn subscribe_all(&self) -> SnapshotReceiver;
}

/// Asks the user whether a task should really be deleted
///
/// A task the store has not delivered yet is passed as a stand-in: only its id is known (see [`Task::is_undelivered`]).
#[async_trait]
pub trait DeleteConfirmation: Send + Sync {
    /// Returns `false` to abandon the deletion
    async fn confirm_delete(&self, task: &Task) -> bool;
}

#[async_trait]
impl<F> DeleteConfirmation for F
where
    F: Fn(&Task) -> bool + Send + Sync,
{
    async fn confirm_delete(&self, task: &Task) -> bool {
        (self)(task)
    }
}

/// Refuses every deletion. This is what a reconciler uses until it is given a real confirmation
#[derive(Clone, Copy, Debug, Default)]
pub struct RefuseDeletion;

#[async_trait]
impl DeleteConfirmation for RefuseDeletion {
    async fn confirm_delete(&self, task: &Task) -> bool {
        log::warn!("No delete confirmation has been set. Keeping task {}", task.id());
        false
    }
}
