//! A record store that keeps its data on the local device

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::record::{DocumentPatch, Snapshot, StoredRecord, TaskDocument, TaskId};
use crate::traits::{RecordStore, SnapshotReceiver};


/// A record store that stores its records in a local file (or only in memory).
///
/// Every write is saved before it is published, so that subscribers are notified synchronously, and never see data that has not been persisted.
/// Ids are generated locally, see [`TaskId::random_local`].
#[derive(Debug)]
pub struct LocalStore {
    backing_file: Option<PathBuf>,
    data: LocalData,
    sender: watch::Sender<Snapshot>,
}

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
struct LocalData {
    tasks: Vec<StoredRecord>,
}

impl LocalStore {
    /// Initialize a store from the content of a valid backing file if it exists.
    /// Returns an error otherwise
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let data: LocalData = serde_json::from_reader(file)?;
        log::debug!("Loaded {} tasks from {:?}", data.tasks.len(), path);

        Ok(Self::with_data(Some(PathBuf::from(path)), data))
    }

    /// Initialize an empty store, that will be saved into `path`
    pub fn new(path: &Path) -> Self {
        Self::with_data(Some(PathBuf::from(path)), LocalData::default())
    }

    /// Initialize an empty store that is never saved
    pub fn in_memory() -> Self {
        Self::with_data(None, LocalData::default())
    }

    fn with_data(backing_file: Option<PathBuf>, data: LocalData) -> Self {
        let (sender, _) = watch::channel(data.tasks.clone());
        Self { backing_file, data, sender }
    }

    pub fn backing_file(&self) -> Option<&Path> {
        self.backing_file.as_deref()
    }

    /// The records this store currently holds
    pub fn records(&self) -> &[StoredRecord] {
        &self.data.tasks
    }

    /// Store `data` to the backing file
    fn save_to_file(&self, data: &LocalData) -> Result<()> {
        let path = match &self.backing_file {
            None => return Ok(()),
            Some(path) => path,
        };

        let file = std::fs::File::create(path)
            .map_err(|err| Error::store_unavailable(format!("unable to save file {:?}: {}", path, err)))?;
        serde_json::to_writer(file, data)
            .map_err(|err| Error::store_unavailable(format!("unable to serialize into {:?}: {}", path, err)))?;
        Ok(())
    }

    /// Save `data`, then make it the current content and notify subscribers.
    /// Nothing changes in case it cannot be saved
    fn commit(&mut self, data: LocalData) -> Result<()> {
        self.save_to_file(&data)?;
        self.data = data;
        self.sender.send_replace(self.data.tasks.clone());
        Ok(())
    }
}

#[async_trait]
impl RecordStore for LocalStore {
    async fn create(&mut self, document: TaskDocument) -> Result<TaskId> {
        let id = TaskId::random_local();
        log::debug!("Creating local record {}", id);

        let mut data = self.data.clone();
        data.tasks.push(StoredRecord { id: id.clone(), document });
        self.commit(data)?;
        Ok(id)
    }

    async fn update(&mut self, id: &TaskId, changes: DocumentPatch) -> Result<()> {
        let mut data = self.data.clone();
        super::update_record(&mut data.tasks, id, &changes)?;
        self.commit(data)
    }

    async fn delete(&mut self, id: &TaskId) -> Result<()> {
        let mut data = self.data.clone();
        super::delete_record(&mut data.tasks, id)?;
        self.commit(data)
    }

    fn subscribe_all(&self) -> SnapshotReceiver {
        self.sender.subscribe()
    }
}
