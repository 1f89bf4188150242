//! Store-native representation of tasks
//!
//! Record stores know nothing about [`Task`](crate::Task)s: they hold [`TaskDocument`]s keyed by [`TaskId`],
//! accept [`DocumentPatch`]es, and publish [`Snapshot`]s. Dates are kept as store-native [`Timestamp`]s, and an absent
//! date is the distinguished [`StoredDate::Empty`] value (serialized as an empty string), not a null and not epoch zero.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::config::LOCAL_ID_PREFIX;
use crate::error::{Error, Result};
use crate::task::{Category, Schedule};


/// The opaque identifier of a task, assigned when the task is created
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId {
    content: String,
}

impl TaskId {
    /// Generate a random id for a record that is created locally.
    /// It is namespaced by [`LOCAL_ID_PREFIX`]
    pub fn random_local() -> Self {
        let prefix = match LOCAL_ID_PREFIX.lock() {
            Ok(prefix) => prefix.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        Self { content: format!("{}{}", prefix, Uuid::new_v4()) }
    }

    /// Generate a random id the way a document database does (no namespace, no hyphens)
    pub fn random_document() -> Self {
        Self { content: Uuid::new_v4().simple().to_string() }
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }
}

impl From<String> for TaskId {
    fn from(content: String) -> Self {
        Self { content }
    }
}
impl From<&str> for TaskId {
    fn from(content: &str) -> Self {
        Self { content: content.to_string() }
    }
}
impl FromStr for TaskId {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}



/// A point in time, as document stores represent it
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    seconds: i64,
    nanos: u32,
}

impl Timestamp {
    pub fn new(seconds: i64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    pub fn seconds(&self) -> i64 { self.seconds }
    pub fn nanos(&self) -> u32   { self.nanos   }

    pub fn to_datetime(&self) -> Result<DateTime<Utc>> {
        Utc.timestamp_opt(self.seconds, self.nanos)
            .single()
            .ok_or_else(|| Error::InvalidRecord(format!("timestamp out of range ({}s, {}ns)", self.seconds, self.nanos)))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(date: DateTime<Utc>) -> Self {
        Self { seconds: date.timestamp(), nanos: date.timestamp_subsec_nanos() }
    }
}


/// A nullable date, as stored in a [`TaskDocument`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoredDate {
    /// No date. This is serialized as an empty string
    Empty,
    At(Timestamp),
}

impl StoredDate {
    pub fn is_empty(&self) -> bool {
        matches!(self, StoredDate::Empty)
    }

    pub fn to_datetime(&self) -> Result<Option<DateTime<Utc>>> {
        match self {
            StoredDate::Empty => Ok(None),
            StoredDate::At(ts) => ts.to_datetime().map(Some),
        }
    }
}

impl Default for StoredDate {
    fn default() -> Self {
        StoredDate::Empty
    }
}

impl From<Option<DateTime<Utc>>> for StoredDate {
    fn from(date: Option<DateTime<Utc>>) -> Self {
        match date {
            None => StoredDate::Empty,
            Some(date) => StoredDate::At(Timestamp::from(date)),
        }
    }
}

impl From<DateTime<Utc>> for StoredDate {
    fn from(date: DateTime<Utc>) -> Self {
        StoredDate::At(Timestamp::from(date))
    }
}

/// Used to support serde
impl Serialize for StoredDate {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            StoredDate::Empty => serializer.serialize_str(""),
            StoredDate::At(ts) => ts.serialize(serializer),
        }
    }
}

/// Used to support serde.
/// Apart from `""` and timestamps, RFC 3339 strings are accepted, as older local snapshots used them.
impl<'de> Deserialize<'de> for StoredDate {
    fn deserialize<D>(deserializer: D) -> std::result::Result<StoredDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawDate {
            Text(String),
            Stamp(Timestamp),
        }

        match RawDate::deserialize(deserializer)? {
            RawDate::Stamp(ts) => Ok(StoredDate::At(ts)),
            RawDate::Text(text) if text.is_empty() => Ok(StoredDate::Empty),
            RawDate::Text(text) => DateTime::parse_from_rfc3339(&text)
                .map(|date| StoredDate::from(date.with_timezone(&Utc)))
                .map_err(|err| serde::de::Error::custom(format!("invalid date {:?}: {}", text, err))),
        }
    }
}



/// A task, as it is stored by a [`RecordStore`](crate::traits::RecordStore)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDocument {
    pub desc: String,
    pub completed: bool,
    pub category: Category,
    #[serde(default)]
    pub start_date: StoredDate,
    #[serde(default)]
    pub end_date: StoredDate,
}

impl TaskDocument {
    /// A document for a brand new task that has no date yet
    pub fn unscheduled(desc: String) -> Self {
        Self {
            desc,
            completed: false,
            category: Category::Unscheduled,
            start_date: StoredDate::Empty,
            end_date: StoredDate::Empty,
        }
    }

    /// A document for a brand new task that directly lands in the calendar
    pub fn scheduled(desc: String, schedule: &Schedule) -> Self {
        Self {
            desc,
            completed: false,
            category: Category::Scheduled,
            start_date: StoredDate::from(schedule.start()),
            end_date: StoredDate::from(schedule.end()),
        }
    }
}


/// A set of fields to merge into an existing [`TaskDocument`].
///
/// Fields that are `None` are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<StoredDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<StoredDate>,
}

impl DocumentPatch {
    pub fn is_empty(&self) -> bool {
        self.desc.is_none()
            && self.completed.is_none()
            && self.category.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }

    /// Merge this patch into a document
    pub fn apply_to(&self, document: &mut TaskDocument) {
        if let Some(desc) = &self.desc {
            document.desc = desc.clone();
        }
        if let Some(completed) = self.completed {
            document.completed = completed;
        }
        if let Some(category) = self.category {
            document.category = category;
        }
        if let Some(start) = self.start_date {
            document.start_date = start;
        }
        if let Some(end) = self.end_date {
            document.end_date = end;
        }
    }
}


/// A document and its key
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: TaskId,
    pub document: TaskDocument,
}

/// The complete set of records of a store, at a given time
pub type Snapshot = Vec<StoredRecord>;
