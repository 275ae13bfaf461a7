//! Realtime/archive buffers backing table and plot widgets
//!
//! A widget first loads a page of archive entries, then keeps receiving
//! realtime entries. [`RealtimeArchiveBuffer`] merges both into one
//! newest-first view, replacing archive entries by realtime updates with
//! the same key. [`ScrollbackBuffer`] is the plain ring used where entries
//! have no identity, and [`ExpirationBuffer`] keeps a time window of plot
//! samples.
//!
//! None of the buffer operations fail; only construction validates its
//! sizing.

mod entries;
mod expiration;
mod merge;
mod scrollback;

pub use crate::config::DedupPolicy;
pub use entries::{
    Activity, ActivityBuffer, CommandHistoryBuffer, CommandHistoryEntry, PlotBuffer, PlotSample,
    StreamRow, StreamRowBuffer,
};
pub use expiration::{ExpirationBuffer, SampleBuffer};
pub use merge::{RealtimeArchiveBuffer, WatermarkHandler};
pub use scrollback::ScrollbackBuffer;

use std::hash::Hash;

/// An entry that can be merged and ordered by a buffer
pub trait BufferEntry: Clone {
    /// Identity used to replace archive entries by realtime updates
    type Key: Eq + Hash + Clone;

    /// Snapshot ordering, sorted descending
    type Order: Ord;

    fn key(&self) -> Self::Key;

    fn order(&self) -> Self::Order;
}
