use super::BufferEntry;
use crate::config::{BufferConfig, BufferSettings, DedupPolicy, DEFAULT_COMPACT_LIMIT};
use crate::error::Result;
use std::cmp::Reverse;
use std::collections::HashMap;

/// Callback fired when the realtime store reaches its watermark
pub type WatermarkHandler = Box<dyn FnMut() + Send>;

#[derive(Debug, Clone)]
struct Slot<T> {
    entry: T,
    /// Insertion sequence, tiebreak for equal ordering keys
    seq: u64,
}

/// Merges an archive baseline with realtime entries
pub struct RealtimeArchiveBuffer<T: BufferEntry> {
    config: BufferConfig,
    archive: Vec<Slot<T>>,
    /// Realtime entries in arrival order, never more than `capacity`
    realtime: Vec<Slot<T>>,
    next_seq: u64,
    watermark_fired: bool,
    on_watermark: Option<WatermarkHandler>,
    dirty: bool,
    dropped: u64,
    overflow_warned: bool,
    /// Entries kept by `compact_to_limit`
    compact_limit: usize,
}

impl<T: BufferEntry> RealtimeArchiveBuffer<T> {
    /// Create a buffer deduplicating by key
    pub fn new(capacity: usize, watermark: usize) -> Result<Self> {
        Self::from_config(&BufferConfig::new(capacity, watermark))
    }

    pub fn from_config(config: &BufferConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: *config,
            archive: Vec::new(),
            realtime: Vec::with_capacity(config.capacity),
            next_seq: 0,
            watermark_fired: false,
            on_watermark: None,
            dirty: false,
            dropped: 0,
            overflow_warned: false,
            compact_limit: DEFAULT_COMPACT_LIMIT,
        })
    }

    /// Create a buffer from one section of `settings`, compacting to its `compact_limit`
    pub fn from_settings(config: &BufferConfig, settings: &BufferSettings) -> Result<Self> {
        Ok(Self::from_config(config)?.with_compact_limit(settings.compact_limit))
    }

    pub fn with_compact_limit(mut self, limit: usize) -> Self {
        self.compact_limit = limit;
        self
    }

    pub fn with_dedup(mut self, dedup: DedupPolicy) -> Self {
        self.config.dedup = dedup;
        self
    }

    /// Install the watermark callback
    pub fn on_watermark(mut self, handler: impl FnMut() + Send + 'static) -> Self {
        self.on_watermark = Some(Box::new(handler));
        self
    }

    pub fn set_on_watermark(&mut self, handler: impl FnMut() + Send + 'static) {
        self.on_watermark = Some(Box::new(handler));
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    pub fn watermark(&self) -> usize {
        self.config.watermark
    }

    pub fn dedup(&self) -> DedupPolicy {
        self.config.dedup
    }

    pub fn compact_limit(&self) -> usize {
        self.compact_limit
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Append a page of archive entries
    pub fn add_archive_data(&mut self, items: impl IntoIterator<Item = T>) {
        for entry in items {
            let seq = self.next_seq();
            self.archive.push(Slot { entry, seq });
        }
        self.dirty = true;
    }

    /// Record one realtime entry.
    ///
    /// Once `capacity` realtime entries are held further ones are dropped
    /// until the buffer is reset or compacted.
    pub fn add_realtime(&mut self, entry: T) {
        if self.realtime.len() >= self.config.capacity {
            self.dropped += 1;
            if !self.overflow_warned {
                self.overflow_warned = true;
                tracing::warn!(
                    "Realtime buffer full ({} entries), dropping updates until compacted",
                    self.config.capacity
                );
            }
            return;
        }

        let seq = self.next_seq();
        self.realtime.push(Slot { entry, seq });
        self.dirty = true;

        if !self.watermark_fired && self.realtime.len() >= self.config.watermark {
            self.watermark_fired = true;
            tracing::debug!(
                "Realtime buffer reached watermark {} of {}",
                self.config.watermark,
                self.config.capacity
            );
            if let Some(handler) = self.on_watermark.as_mut() {
                handler();
            }
        }
    }

    /// Merged view, newest first
    pub fn snapshot(&self) -> Vec<T> {
        let mut merged: Vec<(u64, &T)> =
            Vec::with_capacity(self.archive.len() + self.realtime.len());

        match self.config.dedup {
            DedupPolicy::Append => {
                merged.extend(
                    self.archive
                        .iter()
                        .chain(self.realtime.iter())
                        .map(|slot| (slot.seq, &slot.entry)),
                );
            }
            DedupPolicy::ById => {
                let mut positions: HashMap<T::Key, usize> =
                    HashMap::with_capacity(merged.capacity());
                for slot in self.archive.iter().chain(self.realtime.iter()) {
                    match positions.get(&slot.entry.key()) {
                        // Replaced in place: the entry keeps its original slot sequence
                        Some(&position) => merged[position].1 = &slot.entry,
                        None => {
                            positions.insert(slot.entry.key(), merged.len());
                            merged.push((slot.seq, &slot.entry));
                        }
                    }
                }
            }
        }

        merged.sort_by_cached_key(|(seq, entry)| Reverse((entry.order(), *seq)));
        merged.into_iter().map(|(_, entry)| entry.clone()).collect()
    }

    /// Snapshot only if something changed since the last poll
    pub fn poll_snapshot(&mut self) -> Option<Vec<T>> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.snapshot())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Keep the `limit` newest merged entries as the new archive baseline
    pub fn compact(&mut self, limit: usize) {
        let mut kept = self.snapshot();
        kept.truncate(limit);
        tracing::debug!("Compacting buffer to {} entries", kept.len());
        self.reset();
        // Oldest first so reinstalled sequences keep the tie order
        kept.reverse();
        self.add_archive_data(kept);
    }

    /// Compact to the configured limit
    pub fn compact_to_limit(&mut self) {
        self.compact(self.compact_limit);
    }

    /// Empty both stores and re-arm the watermark
    pub fn reset(&mut self) {
        self.archive.clear();
        self.realtime.clear();
        self.watermark_fired = false;
        self.overflow_warned = false;
        self.dropped = 0;
        self.dirty = true;
    }

    /// Realtime entries discarded since the last reset
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn archive_len(&self) -> usize {
        self.archive.len()
    }

    pub fn realtime_len(&self) -> usize {
        self.realtime.len()
    }

    pub fn watermark_fired(&self) -> bool {
        self.watermark_fired
    }
}

impl<T: BufferEntry> std::fmt::Debug for RealtimeArchiveBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeArchiveBuffer")
            .field("config", &self.config)
            .field("archive_len", &self.archive.len())
            .field("realtime_len", &self.realtime.len())
            .field("watermark_fired", &self.watermark_fired)
            .field("dirty", &self.dirty)
            .field("dropped", &self.dropped)
            .field("compact_limit", &self.compact_limit)
            .finish()
    }
}
