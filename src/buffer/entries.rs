//! Entry types of the widget buffers

use super::{BufferEntry, RealtimeArchiveBuffer};
use crate::types::Scalar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of the activities table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub activity_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub detail: String,
}

impl BufferEntry for Activity {
    type Key = String;
    type Order = DateTime<Utc>;

    fn key(&self) -> String {
        self.id.clone()
    }

    fn order(&self) -> DateTime<Utc> {
        self.start
    }
}

/// A command history record, identified by its origin and sequence number.
///
/// Realtime updates carry the full record with the latest acknowledgement
/// attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandHistoryEntry {
    pub origin: String,
    pub sequence_number: u64,
    pub command_name: String,
    pub generation_time: DateTime<Utc>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Scalar>,
}

impl BufferEntry for CommandHistoryEntry {
    type Key = (String, u64);
    /// Same-timestamp commands order by descending sequence number
    type Order = (DateTime<Utc>, u64);

    fn key(&self) -> (String, u64) {
        (self.origin.clone(), self.sequence_number)
    }

    fn order(&self) -> (DateTime<Utc>, u64) {
        (self.generation_time, self.sequence_number)
    }
}

/// A plotted parameter sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotSample {
    pub time: DateTime<Utc>,
    pub value: f64,
}

impl PlotSample {
    pub fn new(time: DateTime<Utc>, value: f64) -> Self {
        Self { time, value }
    }
}

impl BufferEntry for PlotSample {
    type Key = DateTime<Utc>;
    type Order = DateTime<Utc>;

    fn key(&self) -> DateTime<Utc> {
        self.time
    }

    fn order(&self) -> DateTime<Utc> {
        self.time
    }
}

/// A row of a stream table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamRow {
    pub id: u64,
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub columns: BTreeMap<String, Scalar>,
}

impl BufferEntry for StreamRow {
    type Key = u64;
    type Order = DateTime<Utc>;

    fn key(&self) -> u64 {
        self.id
    }

    fn order(&self) -> DateTime<Utc> {
        self.time
    }
}

pub type ActivityBuffer = RealtimeArchiveBuffer<Activity>;
pub type CommandHistoryBuffer = RealtimeArchiveBuffer<CommandHistoryEntry>;
pub type PlotBuffer = RealtimeArchiveBuffer<PlotSample>;
pub type StreamRowBuffer = RealtimeArchiveBuffer<StreamRow>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn command(seq: u64, secs: i64) -> CommandHistoryEntry {
        CommandHistoryEntry {
            origin: "user@host".to_string(),
            sequence_number: seq,
            command_name: "/YSS/SIMULATOR/SWITCH_VOLTAGE_ON".to_string(),
            generation_time: at(secs),
            attributes: BTreeMap::new(),
        }
    }

    #[test]
    fn test_command_history_tiebreak_by_sequence() {
        let mut buffer = CommandHistoryBuffer::new(10, 5).unwrap();
        buffer.add_archive_data(vec![command(2, 100), command(1, 100), command(3, 90)]);
        let order: Vec<u64> = buffer
            .snapshot()
            .iter()
            .map(|c| c.sequence_number)
            .collect();
        assert_eq!(order, vec![2, 1, 3]);
    }

    #[test]
    fn test_command_ack_update_replaces_record() {
        let mut buffer = CommandHistoryBuffer::new(10, 5).unwrap();
        buffer.add_archive_data(vec![command(1, 100), command(2, 101)]);

        let mut acked = command(1, 100);
        acked
            .attributes
            .insert("Acknowledge_Sent_Status".to_string(), Scalar::from("OK"));
        buffer.add_realtime(acked.clone());

        let snapshot = buffer.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[1], acked);
    }

    #[test]
    fn test_activity_serde() {
        let activity = Activity {
            id: "a-1".to_string(),
            start: at(1_700_000_000),
            activity_type: "SCRIPT".to_string(),
            status: "RUNNING".to_string(),
            detail: String::new(),
        };
        let json = serde_json::to_string(&activity).unwrap();
        let back: Activity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, activity);
    }

    #[test]
    fn test_stream_rows_by_time() {
        let mut buffer = StreamRowBuffer::new(10, 5).unwrap();
        buffer.add_realtime(StreamRow {
            id: 7,
            time: at(5),
            columns: BTreeMap::new(),
        });
        buffer.add_realtime(StreamRow {
            id: 8,
            time: at(9),
            columns: BTreeMap::new(),
        });
        let ids: Vec<u64> = buffer.snapshot().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![8, 7]);
    }
}
