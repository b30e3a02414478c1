use serde::{Deserialize, Serialize};

/// A tracked interval. `end_time` is absent while the timer is running.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryRecord {
    pub id: String,
    pub task_id: String,
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
}

impl TimeEntryRecord {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}
