use super::{PlotSample, ScrollbackBuffer};
use chrono::Duration;
use std::collections::VecDeque;

/// Sample storage behind a line plot
pub trait SampleBuffer {
    fn push(&mut self, sample: PlotSample);

    /// Samples, oldest first
    fn samples(&self) -> Vec<PlotSample>;

    fn clear(&mut self);
}

/// Keeps the samples within `period` of the newest one
#[derive(Debug, Clone)]
pub struct ExpirationBuffer {
    period: Duration,
    samples: VecDeque<PlotSample>,
}

impl ExpirationBuffer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            samples: VecDeque::new(),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn expire(&mut self) {
        let Some(newest) = self.samples.back().map(|s| s.time) else {
            return;
        };
        let cutoff = newest - self.period;
        while self.samples.front().is_some_and(|s| s.time < cutoff) {
            self.samples.pop_front();
        }
    }
}

impl SampleBuffer for ExpirationBuffer {
    fn push(&mut self, sample: PlotSample) {
        // Out-of-order samples are inserted at their time position
        let position = self.samples.partition_point(|s| s.time <= sample.time);
        self.samples.insert(position, sample);
        self.expire();
    }

    fn samples(&self) -> Vec<PlotSample> {
        self.samples.iter().copied().collect()
    }

    fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Sample-count expiry
impl SampleBuffer for ScrollbackBuffer<PlotSample> {
    fn push(&mut self, sample: PlotSample) {
        ScrollbackBuffer::push(self, sample);
    }

    fn samples(&self) -> Vec<PlotSample> {
        self.chronological()
    }

    fn clear(&mut self) {
        self.reset();
    }
}
