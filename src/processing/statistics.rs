/// Population standard deviation of the finite values in `y`.
/// Returns `None` when no finite value is present.
pub fn std_dev(y: &[f64]) -> Option<f64> {
    let mut count = 0usize;
    let mut sum = 0.0;
    for &v in y.iter().filter(|v| v.is_finite()) {
        count += 1;
        sum += v;
    }
    if count == 0 {
        return None;
    }
    let mean = sum / count as f64;
    let variance = y
        .iter()
        .filter(|v| v.is_finite())
        .map(|v| (v - mean).powi(2))
        .sum::<f64>()
        / count as f64;
    Some(variance.sqrt())
}

/// Summary statistics for one channel.
#[derive(Debug, Clone)]
pub struct SeriesStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub peak_to_peak: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl SeriesStats {
    /// Compute statistics from samples, ignoring NaN/Inf.
    pub fn compute(y: &[f64]) -> Option<Self> {
        let vals: Vec<f64> = y.iter().copied().filter(|v| v.is_finite()).collect();
        if vals.is_empty() {
            return None;
        }

        let count = vals.len();
        let min = vals.iter().copied().fold(f64::INFINITY, f64::min);
        let max = vals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = vals.iter().sum::<f64>() / count as f64;
        let std_dev = std_dev(&vals)?;

        Some(SeriesStats {
            count,
            min,
            max,
            peak_to_peak: max - min,
            mean,
            std_dev,
        })
    }

    /// Format as a multi-line report string.
    pub fn report(&self, label: &str) -> String {
        format!(
            "{}:\n  Samples: {}\n  Min: {:.3}\n  Max: {:.3}\n  Peak-to-Peak: {:.3}\n  Mean: {:.3}\n  Std Dev: {:.3}",
            label, self.count, self.min, self.max, self.peak_to_peak, self.mean, self.std_dev
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_std() {
        assert_eq!(std_dev(&[1.0, -1.0, 1.0, -1.0]), Some(1.0));
        assert_eq!(std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), Some(2.0));
        assert_eq!(std_dev(&[3.0]), Some(0.0));
    }

    #[test]
    fn non_finite_samples_are_ignored() {
        assert_eq!(std_dev(&[1.0, f64::NAN, -1.0, f64::INFINITY]), Some(1.0));
        assert_eq!(std_dev(&[f64::NAN]), None);
        assert_eq!(std_dev(&[]), None);
    }

    #[test]
    fn stats_report() {
        let stats = SeriesStats::compute(&[1.0, 3.0, f64::NAN]).unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.peak_to_peak, 2.0);
        assert_eq!(stats.mean, 2.0);
        assert!(stats.report("Cz").starts_with("Cz:"));
    }
}
