use std::sync::Arc;

use crate::error::{Result, StackError};

/// Read-only view of a recording, as exposed by whatever wraps the raw data.
pub trait DataSource {
    fn row_count(&self) -> usize;
    fn channel_names(&self) -> Vec<String>;
    /// Optional per-channel type tag, parallel to `channel_names`.
    fn channel_tags(&self) -> Option<Vec<Option<String>>>;
    /// Samples `[start, end)` for every channel (rows) plus their timestamps.
    fn read(&self, start: usize, end: usize) -> (Vec<Vec<f64>>, Vec<f64>);
    fn sample_count(&self) -> usize;
    fn sample_rate(&self) -> f64;
    fn start_time(&self) -> f64;
}

/// Immutable channels x time sample matrix.
///
/// Rows are shared (`Arc<[f64]>`) so rendered traces can keep a reference to
/// the full-resolution samples without copying them.
#[derive(Debug, Clone)]
pub struct SignalBuffer {
    rows: Vec<Arc<[f64]>>,
    times: Arc<[f64]>,
    sample_rate: f64,
}

impl SignalBuffer {
    /// Build a buffer from equally long rows sampled at `sample_rate` starting at `start_time`.
    pub fn new(rows: Vec<Vec<f64>>, sample_rate: f64, start_time: f64) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(StackError::Load(format!("invalid sample rate {sample_rate}")));
        }
        let len = rows.first().map(|r| r.len()).unwrap_or(0);
        let times: Vec<f64> = (0..len).map(|i| start_time + i as f64 / sample_rate).collect();
        Self::with_times(rows, times, sample_rate)
    }

    /// Build a buffer with explicit timestamps (must be non-decreasing).
    pub fn with_times(rows: Vec<Vec<f64>>, times: Vec<f64>, sample_rate: f64) -> Result<Self> {
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != times.len()) {
            return Err(StackError::Load(format!(
                "row {i} has {} samples, expected {}",
                row.len(),
                times.len()
            )));
        }
        if !times.windows(2).all(|w| w[0] <= w[1]) {
            return Err(StackError::Load("timestamps are not sorted".to_string()));
        }
        Ok(Self {
            rows: rows.into_iter().map(Arc::from).collect(),
            times: Arc::from(times),
            sample_rate,
        })
    }

    /// Pull the whole recording out of a data source.
    pub fn from_source(source: &dyn DataSource) -> Result<Self> {
        let (rows, times) = source.read(0, source.sample_count());
        if rows.len() != source.row_count() {
            return Err(StackError::InvalidState(format!(
                "data source reported {} rows but returned {}",
                source.row_count(),
                rows.len()
            )));
        }
        Self::with_times(rows, times, source.sample_rate())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn sample_count(&self) -> usize {
        self.times.len()
    }

    pub fn row(&self, index: usize) -> Option<&Arc<[f64]>> {
        self.rows.get(index)
    }

    pub fn times(&self) -> &Arc<[f64]> {
        &self.times
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn start_time(&self) -> f64 {
        self.times.first().copied().unwrap_or(0.0)
    }

    pub fn end_time(&self) -> f64 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Copy out samples `[start, end)`, clamped to the buffer.
    pub fn read(&self, start: usize, end: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
        let end = end.min(self.sample_count());
        let start = start.min(end);
        let rows = self.rows.iter().map(|r| r[start..end].to_vec()).collect();
        (rows, self.times[start..end].to_vec())
    }
}

/// A recording that lives entirely in memory: names, optional tags and samples.
#[derive(Debug, Clone)]
pub struct InMemoryRecording {
    pub names: Vec<String>,
    pub tags: Option<Vec<Option<String>>>,
    pub buffer: SignalBuffer,
}

impl InMemoryRecording {
    pub fn new(names: Vec<String>, tags: Option<Vec<Option<String>>>, buffer: SignalBuffer) -> Self {
        Self { names, tags, buffer }
    }
}

impl DataSource for InMemoryRecording {
    fn row_count(&self) -> usize {
        self.buffer.row_count()
    }

    fn channel_names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn channel_tags(&self) -> Option<Vec<Option<String>>> {
        self.tags.clone()
    }

    fn read(&self, start: usize, end: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
        self.buffer.read(start, end)
    }

    fn sample_count(&self) -> usize {
        self.buffer.sample_count()
    }

    fn sample_rate(&self) -> f64 {
        self.buffer.sample_rate()
    }

    fn start_time(&self) -> f64 {
        self.buffer.start_time()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn times_follow_sample_rate() {
        let buffer = SignalBuffer::new(vec![vec![0.0; 4], vec![1.0; 4]], 2.0, 10.0).unwrap();
        assert_eq!(&buffer.times()[..], &[10.0, 10.5, 11.0, 11.5]);
        assert_eq!(buffer.start_time(), 10.0);
        assert_eq!(buffer.end_time(), 11.5);
        assert_eq!(buffer.row_count(), 2);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = SignalBuffer::new(vec![vec![0.0; 4], vec![1.0; 3]], 1.0, 0.0).unwrap_err();
        assert!(matches!(err, StackError::Load(_)));
    }

    #[test]
    fn read_clamps_range() {
        let buffer = SignalBuffer::new(vec![vec![1.0, 2.0, 3.0]], 1.0, 0.0).unwrap();
        let (rows, times) = buffer.read(1, 99);
        assert_eq!(rows, vec![vec![2.0, 3.0]]);
        assert_eq!(times, vec![1.0, 2.0]);
        let (rows, times) = buffer.read(5, 2);
        assert!(rows[0].is_empty());
        assert!(times.is_empty());
    }
}
