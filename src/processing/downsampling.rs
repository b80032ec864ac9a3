use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Point-reduction strategy used when a trace has more samples in view than
/// the output surface should receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    /// Per bucket, keep the minimum and the maximum sample (in time order).
    MinMax,
    /// Largest-Triangle-Three-Buckets.
    Lttb,
}

impl Default for Reduction {
    fn default() -> Self {
        Reduction::MinMax
    }
}

impl Reduction {
    pub fn label(&self) -> &'static str {
        match self {
            Reduction::MinMax => "Min/Max",
            Reduction::Lttb => "LTTB",
        }
    }
}

/// A reduced series. `indices` maps every kept point back to its sample
/// index in the full-resolution data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReducedSeries {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub indices: Vec<usize>,
}

impl ReducedSeries {
    fn gather(x: &[f64], y: &[f64], indices: Vec<usize>) -> Self {
        Self {
            x: indices.iter().map(|&i| x[i]).collect(),
            y: indices.iter().map(|&i| y[i]).collect(),
            indices,
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Largest-Triangle-Three-Buckets (LTTB) downsampling.
/// Returns the indices of the kept points, always including the first and last.
pub fn lttb_indices(x: &[f64], y: &[f64], target: usize) -> Vec<usize> {
    let n = x.len();
    if n <= target || target < 3 {
        return (0..n).collect();
    }

    let mut out = Vec::with_capacity(target);

    // Always keep the first point
    out.push(0);

    let bucket_size = (n - 2) as f64 / (target - 2) as f64;

    let mut prev_idx: usize = 0;

    for i in 0..(target - 2) {
        let bucket_start = ((i as f64 * bucket_size) as usize + 1).min(n - 1);
        let bucket_end = (((i as f64 + 1.0) * bucket_size) as usize + 1).min(n - 1);

        // Average of the next bucket is the third triangle vertex
        let next_bucket_start = bucket_end;
        let next_bucket_end = (((i as f64 + 2.0) * bucket_size) as usize + 1).min(n);

        let mut avg_x = 0.0;
        let mut avg_y = 0.0;
        let next_count = (next_bucket_end - next_bucket_start).max(1);
        for j in next_bucket_start..next_bucket_end {
            avg_x += x[j];
            avg_y += y[j];
        }
        avg_x /= next_count as f64;
        avg_y /= next_count as f64;

        let mut max_area = -1.0f64;
        let mut best_idx = bucket_start;

        let prev_x = x[prev_idx];
        let prev_y = y[prev_idx];

        for j in bucket_start..bucket_end.max(bucket_start + 1) {
            // Triangle area (doubled, no need for /2 since we're comparing)
            let area = ((prev_x - avg_x) * (y[j] - prev_y)
                - (prev_x - x[j]) * (avg_y - prev_y))
                .abs();
            if area > max_area {
                max_area = area;
                best_idx = j;
            }
        }

        out.push(best_idx);
        prev_idx = best_idx;
    }

    // Always keep the last point
    out.push(n - 1);

    out
}

/// Min/max-per-bucket decimation. Splits the series into `target / 2`
/// buckets and keeps each bucket's extremes, so peaks survive any zoom level.
/// First and last sample are always kept. Below four points there is room
/// for at most one interior sample: the largest absolute excursion.
pub fn min_max_indices(y: &[f64], target: usize) -> Vec<usize> {
    let n = y.len();
    if n <= target {
        return (0..n).collect();
    }
    if target < 4 {
        return small_target_indices(y, target);
    }

    let buckets = (target - 2) / 2;
    let inner = n - 2;
    let mut out = Vec::with_capacity(target);
    out.push(0);

    for b in 0..buckets {
        let start = 1 + b * inner / buckets;
        let end = 1 + (b + 1) * inner / buckets;
        if start >= end {
            continue;
        }
        let mut min_i = start;
        let mut max_i = start;
        for j in start..end {
            let v = y[j];
            if !v.is_finite() {
                continue;
            }
            if !y[min_i].is_finite() || v < y[min_i] {
                min_i = j;
            }
            if !y[max_i].is_finite() || v > y[max_i] {
                max_i = j;
            }
        }
        if min_i == max_i {
            out.push(min_i);
        } else {
            out.push(min_i.min(max_i));
            out.push(min_i.max(max_i));
        }
    }

    out.push(n - 1);
    out
}

fn small_target_indices(y: &[f64], target: usize) -> Vec<usize> {
    let n = y.len();
    match target {
        0 => Vec::new(),
        1 => vec![0],
        2 => vec![0, n - 1],
        _ => {
            let peak = (1..n - 1)
                .filter(|&i| y[i].is_finite())
                .max_by(|&a, &b| y[a].abs().partial_cmp(&y[b].abs()).unwrap_or(std::cmp::Ordering::Equal));
            match peak {
                Some(i) => vec![0, i, n - 1],
                None => vec![0, n - 1],
            }
        }
    }
}

/// Index range of the samples inside `[view_min, view_max]`, widened by one
/// sample on each side for line continuity. `x` must be sorted.
pub fn visible_range(x: &[f64], view_min: f64, view_max: f64) -> Range<usize> {
    let start = x.partition_point(|&v| v < view_min).saturating_sub(1);
    let end = (x.partition_point(|&v| v <= view_max) + 1).min(x.len());
    start..end.max(start)
}

/// Reduce the part of a sorted series that falls inside the view window.
pub fn downsample_for_view(
    x: &[f64],
    y: &[f64],
    view_min: f64,
    view_max: f64,
    max_points: usize,
    reduction: Reduction,
) -> ReducedSeries {
    if x.is_empty() {
        return ReducedSeries::default();
    }

    let range = visible_range(x, view_min, view_max);
    let offset = range.start;
    let slice_x = &x[range.clone()];
    let slice_y = &y[range];

    let local = match reduction {
        Reduction::MinMax => min_max_indices(slice_y, max_points),
        Reduction::Lttb => lttb_indices(slice_x, slice_y, max_points),
    };
    let indices = local.into_iter().map(|i| i + offset).collect();
    ReducedSeries::gather(x, y, indices)
}

/// Every sample inside the window, no reduction.
pub fn window_for_view(x: &[f64], y: &[f64], view_min: f64, view_max: f64) -> ReducedSeries {
    if x.is_empty() {
        return ReducedSeries::default();
    }
    let indices = visible_range(x, view_min, view_max).collect();
    ReducedSeries::gather(x, y, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn small_series_untouched() {
        let x = ramp(10);
        assert_eq!(lttb_indices(&x, &x, 100), (0..10).collect::<Vec<_>>());
        assert_eq!(min_max_indices(&x, 100), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn lttb_keeps_endpoints_and_target() {
        let x = ramp(1000);
        let y: Vec<f64> = x.iter().map(|v| (v * 0.1).sin()).collect();
        let idx = lttb_indices(&x, &y, 50);
        assert_eq!(idx.len(), 50);
        assert_eq!(idx[0], 0);
        assert_eq!(idx[49], 999);
        assert!(idx.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn min_max_keeps_spikes() {
        let mut y = vec![0.0; 10_000];
        y[1234] = 50.0;
        y[7777] = -50.0;
        let idx = min_max_indices(&y, 100);
        assert!(idx.len() <= 100);
        assert!(idx.contains(&1234));
        assert!(idx.contains(&7777));
        assert_eq!(idx[0], 0);
        assert_eq!(*idx.last().unwrap(), 9999);
        assert!(idx.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn min_max_honors_tiny_targets() {
        let mut y = vec![0.0; 1000];
        y[400] = -9.0;
        assert_eq!(min_max_indices(&y, 3), vec![0, 400, 999]);
        assert_eq!(min_max_indices(&y, 2), vec![0, 999]);

        let x = ramp(1000);
        let r = downsample_for_view(&x, &y, f64::NEG_INFINITY, f64::INFINITY, 3, Reduction::MinMax);
        assert!(r.len() <= 3);
        assert_eq!(r.indices, vec![0, 400, 999]);
    }

    #[test]
    fn visible_range_pads_one_sample() {
        let x = ramp(100);
        assert_eq!(visible_range(&x, 10.0, 20.0), 9..22);
        assert_eq!(visible_range(&x, -5.0, 500.0), 0..100);
        assert_eq!(visible_range(&x, 200.0, 300.0), 99..100);
    }

    #[test]
    fn view_reduction_maps_back_to_source_indices() {
        let x = ramp(10_000);
        let y: Vec<f64> = x.iter().map(|v| v * 2.0).collect();
        let reduced = downsample_for_view(&x, &y, 2000.0, 8000.0, 200, Reduction::MinMax);
        assert!(reduced.len() <= 200);
        for (k, &i) in reduced.indices.iter().enumerate() {
            assert_eq!(reduced.x[k], x[i]);
            assert_eq!(reduced.y[k], y[i]);
        }
        assert_eq!(reduced.indices[0], 1999);
    }
}
