//! A record store that behaves like a per-user collection of a live-synced document database

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::Result;
use crate::mock_behaviour::MockBehaviour;
use crate::record::{DocumentPatch, Snapshot, StoredRecord, TaskDocument, TaskId};
use crate::traits::{RecordStore, SnapshotReceiver};

/// When subscribers of a [`SyncedCollection`] are told about writes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Every write is published as soon as it is applied
    Immediate,
    /// Writes are only published on [`SyncedCollection::deliver`]. Every pending write is then published at once
    Batched,
}

/// A collection of task documents, shared by every session that holds a clone of this handle.
///
/// Ids are assigned by the collection. Concurrent writes to the same document simply overwrite each other (last write wins).
#[derive(Clone, Debug)]
pub struct SyncedCollection {
    inner: Arc<Mutex<Collection>>,
}

#[derive(Debug)]
struct Collection {
    path: String,
    records: Snapshot,
    delivery: Delivery,
    pending_writes: usize,
    behaviour: MockBehaviour,
    sender: watch::Sender<Snapshot>,
}

impl Collection {
    fn written(&mut self) {
        self.pending_writes += 1;
        if self.delivery == Delivery::Immediate {
            self.publish();
        }
    }

    fn publish(&mut self) {
        log::trace!("{}: publishing {} records ({} pending writes)", self.path, self.records.len(), self.pending_writes);
        self.pending_writes = 0;
        self.sender.send_replace(self.records.clone());
    }
}

impl SyncedCollection {
    /// Create an empty collection
    pub fn new<S: ToString>(path: S) -> Self {
        let (sender, _) = watch::channel(Snapshot::new());
        let collection = Collection {
            path: path.to_string(),
            records: Snapshot::new(),
            delivery: Delivery::Immediate,
            pending_writes: 0,
            behaviour: MockBehaviour::default(),
            sender,
        };
        Self { inner: Arc::new(Mutex::new(collection)) }
    }

    /// Create the empty task collection of a given user
    pub fn for_user(user_id: &str) -> Self {
        Self::new(format!("users/{}/tasks", user_id))
    }

    pub fn with_delivery(self, delivery: Delivery) -> Self {
        self.collection().delivery = delivery;
        self
    }

    fn collection(&self) -> MutexGuard<'_, Collection> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn path(&self) -> String {
        self.collection().path.clone()
    }

    /// Make the next writes succeed or fail, as if the server was (un)reachable
    pub fn set_behaviour(&self, behaviour: MockBehaviour) {
        self.collection().behaviour = behaviour;
    }

    /// Number of writes that have not been published yet
    pub fn pending_writes(&self) -> usize {
        self.collection().pending_writes
    }

    /// Publish every pending write in a single notification.
    /// Returns whether there was something to publish
    pub fn deliver(&self) -> bool {
        let mut collection = self.collection();
        if collection.pending_writes == 0 {
            return false;
        }
        collection.publish();
        true
    }

    /// The records that have been written, including the ones that are not published yet
    pub fn records(&self) -> Snapshot {
        self.collection().records.clone()
    }
}

#[async_trait]
impl RecordStore for SyncedCollection {
    async fn create(&mut self, document: TaskDocument) -> Result<TaskId> {
        let mut collection = self.collection();
        collection.behaviour.can_create()?;

        let id = TaskId::random_document();
        log::debug!("{}: adding document {}", collection.path, id);
        collection.records.push(StoredRecord { id: id.clone(), document });
        collection.written();
        Ok(id)
    }

    async fn update(&mut self, id: &TaskId, changes: DocumentPatch) -> Result<()> {
        let mut collection = self.collection();
        collection.behaviour.can_update()?;

        super::update_record(&mut collection.records, id, &changes)?;
        log::debug!("{}: merged changes into {}", collection.path, id);
        collection.written();
        Ok(())
    }

    async fn delete(&mut self, id: &TaskId) -> Result<()> {
        let mut collection = self.collection();
        collection.behaviour.can_delete()?;

        super::delete_record(&mut collection.records, id)?;
        log::debug!("{}: deleted {}", collection.path, id);
        collection.written();
        Ok(())
    }

    fn subscribe_all(&self) -> SnapshotReceiver {
        self.collection().sender.subscribe()
    }
}
