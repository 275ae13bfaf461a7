//! Test data builders for creating buffer entries

use super::at;
use displaykit::buffer::{Activity, CommandHistoryEntry, StreamRow};
use displaykit::Scalar;
use std::collections::BTreeMap;

/// Builder for creating test Activities
pub struct ActivityBuilder {
    id: String,
    start: i64,
    status: String,
}

impl ActivityBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            start: 0,
            status: "RUNNING".to_string(),
        }
    }

    pub fn start(mut self, secs: i64) -> Self {
        self.start = secs;
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    pub fn build(self) -> Activity {
        Activity {
            id: self.id,
            start: at(self.start),
            activity_type: "SCRIPT".to_string(),
            status: self.status,
            detail: String::new(),
        }
    }
}

/// Builder for creating test command history entries
pub struct CommandBuilder {
    sequence_number: u64,
    generation_time: i64,
    attributes: BTreeMap<String, Scalar>,
}

impl CommandBuilder {
    pub fn new(sequence_number: u64) -> Self {
        Self {
            sequence_number,
            generation_time: 0,
            attributes: BTreeMap::new(),
        }
    }

    pub fn generated(mut self, secs: i64) -> Self {
        self.generation_time = secs;
        self
    }

    pub fn attribute(mut self, name: &str, value: impl Into<Scalar>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn build(self) -> CommandHistoryEntry {
        CommandHistoryEntry {
            origin: "operator@ground".to_string(),
            sequence_number: self.sequence_number,
            command_name: "/YSS/SIMULATOR/SWITCH_VOLTAGE_ON".to_string(),
            generation_time: at(self.generation_time),
            attributes: self.attributes,
        }
    }
}

pub fn stream_row(id: u64, secs: i64) -> StreamRow {
    StreamRow {
        id,
        time: at(secs),
        columns: BTreeMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_builder() {
        let activity = ActivityBuilder::new("a-1").start(10).status("SUCCESSFUL").build();
        assert_eq!(activity.id, "a-1");
        assert_eq!(activity.start, at(10));
        assert_eq!(activity.status, "SUCCESSFUL");
    }
}
