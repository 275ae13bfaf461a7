//! Integration tests for the realtime/archive buffers

mod common;

use common::builders::{stream_row, ActivityBuilder, CommandBuilder};
use common::at;
use displaykit::buffer::{
    ActivityBuffer, CommandHistoryBuffer, ExpirationBuffer, PlotBuffer, PlotSample,
    RealtimeArchiveBuffer, SampleBuffer, ScrollbackBuffer, StreamRowBuffer,
};
use displaykit::config::{BufferConfig, BufferSettings, DedupPolicy};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_activity_update_merges_into_archive() {
    let mut buffer = ActivityBuffer::new(100, 80).unwrap();
    buffer.add_archive_data(vec![
        ActivityBuilder::new("1").start(10).status("RUNNING").build(),
        ActivityBuilder::new("2").start(5).status("SUCCESSFUL").build(),
    ]);
    buffer.add_realtime(ActivityBuilder::new("1").start(12).status("SUCCESSFUL").build());

    let snapshot = buffer.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].id, "1");
    assert_eq!(snapshot[0].start, at(12));
    assert_eq!(snapshot[0].status, "SUCCESSFUL");
    assert_eq!(snapshot[1].id, "2");
}

#[test]
fn test_new_realtime_activity_is_appended() {
    let mut buffer = ActivityBuffer::new(100, 80).unwrap();
    buffer.add_archive_data(vec![ActivityBuilder::new("old").start(1).build()]);
    buffer.add_realtime(ActivityBuilder::new("new").start(2).build());
    let ids: Vec<String> = buffer.snapshot().into_iter().map(|a| a.id).collect();
    assert_eq!(ids, vec!["new", "old"]);
}

#[test]
fn test_command_history_same_timestamp_order() {
    let mut buffer = CommandHistoryBuffer::new(100, 80).unwrap();
    buffer.add_archive_data((1..=3).map(|seq| CommandBuilder::new(seq).generated(50).build()));
    buffer.add_realtime(
        CommandBuilder::new(2)
            .generated(50)
            .attribute("Acknowledge_Queued_Status", "OK")
            .build(),
    );

    let snapshot = buffer.snapshot();
    let seqs: Vec<u64> = snapshot.iter().map(|c| c.sequence_number).collect();
    assert_eq!(seqs, vec![3, 2, 1]);
    assert_eq!(snapshot[1].attributes.len(), 1);
}

#[test]
fn test_watermark_pauses_pagination_and_compact_recovers() {
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    let mut buffer = StreamRowBuffer::from_config(&BufferConfig::new(10, 8))
        .unwrap()
        .on_watermark(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

    buffer.add_archive_data((0..20).map(|id| stream_row(id, id as i64)));
    for id in 100..115 {
        buffer.add_realtime(stream_row(id, id as i64));
    }
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(buffer.realtime_len(), 10);
    assert_eq!(buffer.dropped(), 5);

    buffer.compact(12);
    let snapshot = buffer.snapshot();
    assert_eq!(snapshot.len(), 12);
    assert_eq!(snapshot[0].id, 109);
    assert_eq!(snapshot[11].id, 18);

    // The next cycle can fire again
    for id in 200..208 {
        buffer.add_realtime(stream_row(id, id as i64));
    }
    assert_eq!(fired.load(Ordering::SeqCst), 2);
}

#[test]
fn test_buffers_from_default_settings() {
    let settings = BufferSettings::default();
    let plots = PlotBuffer::from_config(&settings.plot_samples).unwrap();
    assert_eq!(plots.dedup(), DedupPolicy::Append);
    let commands = CommandHistoryBuffer::from_config(&settings.command_history).unwrap();
    assert_eq!(commands.dedup(), DedupPolicy::ById);

    let mut rows = StreamRowBuffer::from_settings(&settings.stream_rows, &settings).unwrap();
    rows.add_archive_data((0..150).map(|id| stream_row(id, id as i64)));
    rows.compact_to_limit();
    assert_eq!(rows.snapshot().len(), settings.compact_limit);
    assert!(ScrollbackBuffer::<String>::new(settings.scrollback_capacity).is_ok());
}

#[test]
fn test_sample_buffers_interchangeable() {
    let mut buffers: Vec<Box<dyn SampleBuffer>> = vec![
        Box::new(ExpirationBuffer::new(chrono::Duration::seconds(3))),
        Box::new(ScrollbackBuffer::<PlotSample>::new(4).unwrap()),
    ];
    for buffer in buffers.iter_mut() {
        for secs in 0..10 {
            buffer.push(PlotSample::new(at(secs), secs as f64));
        }
    }
    let lens: Vec<usize> = buffers.iter().map(|b| b.samples().len()).collect();
    assert_eq!(lens, vec![4, 4]);
    assert_eq!(buffers[0].samples()[0].time, at(6));
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    id: u8,
    t: u8,
}

impl displaykit::buffer::BufferEntry for Entry {
    type Key = u8;
    type Order = u8;

    fn key(&self) -> u8 {
        self.id
    }

    fn order(&self) -> u8 {
        self.t
    }
}

proptest! {
    #[test]
    fn test_snapshot_ordering_and_dedup(
        archive in prop::collection::vec((0u8..30, 0u8..100), 0..40),
        realtime in prop::collection::vec((0u8..30, 0u8..100), 0..40),
    ) {
        let mut buffer = RealtimeArchiveBuffer::new(64, 32).unwrap();
        buffer.add_archive_data(archive.iter().map(|&(id, t)| Entry { id, t }));
        for &(id, t) in &realtime {
            buffer.add_realtime(Entry { id, t });
        }

        let snapshot = buffer.snapshot();
        prop_assert!(snapshot.windows(2).all(|w| w[0].t >= w[1].t));

        let mut ids: Vec<u8> = snapshot.iter().map(|e| e.id).collect();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), snapshot.len());

        let mut expected: Vec<u8> = archive
            .iter()
            .chain(realtime.iter())
            .map(|&(id, _)| id)
            .collect();
        expected.sort_unstable();
        expected.dedup();
        prop_assert_eq!(ids, expected);
    }

    #[test]
    fn test_compaction_bounds_memory(
        realtime in prop::collection::vec((0u8..255, 0u8..255), 0..100),
        limit in 0usize..50,
    ) {
        let mut buffer = RealtimeArchiveBuffer::new(40, 30).unwrap();
        for &(id, t) in &realtime {
            buffer.add_realtime(Entry { id, t });
        }
        buffer.compact(limit);
        prop_assert!(buffer.snapshot().len() <= limit);
        prop_assert_eq!(buffer.realtime_len(), 0);
        buffer.reset();
        prop_assert_eq!(buffer.snapshot().len(), 0);
    }
}
