//! Support for library configuration options

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Prefix of the ids generated for records created locally (see [`TaskId::random_local`](crate::record::TaskId::random_local)).
/// Feel free to override it when initing this library.
pub static LOCAL_ID_PREFIX: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("local-".to_string())));

/// Windows narrower than this (in pixels) use the compact layout
pub const DEFAULT_COMPACT_LAYOUT_BREAKPOINT: u32 = 768;

/// Options of a [`Reconciler`](crate::reconciler::Reconciler) and of the views it feeds
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Whether scheduled tasks are periodically moved to the `past` category once their end has elapsed
    pub enable_past_due_sweep: bool,
    pub past_due_sweep_interval_secs: u64,
    pub compact_layout_breakpoint: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_past_due_sweep: false,
            past_due_sweep_interval_secs: 60,
            compact_layout_breakpoint: DEFAULT_COMPACT_LAYOUT_BREAKPOINT,
        }
    }
}

impl Settings {
    /// Read settings from a JSON file. Missing keys take their default value
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let settings = serde_json::from_reader(file)?;
        Ok(settings)
    }

    pub fn past_due_sweep_interval(&self) -> Duration {
        // An interval of zero would make tokio panic
        Duration::from_secs(self.past_due_sweep_interval_secs.max(1))
    }
}
