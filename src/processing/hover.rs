use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;

/// A point found by a hover lookup: which trace, which full-resolution sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoverHit {
    pub trace: usize,
    pub sample: usize,
    /// Distance in normalized (view-relative) units.
    pub distance: f64,
}

/// 2D KD-tree over the displayed points of one trace, for fast nearest-point
/// hover lookup. Coordinates are divided by the view span on each axis so
/// distances are comparable between time and amplitude. The tree is built in
/// one pass, so flat stretches with many equal coordinates are fine.
pub struct HoverTree {
    trace: usize,
    tree: Option<ImmutableKdTree<f64, u64, 2, 32>>,
    /// Full-resolution sample index per tree item.
    samples: Vec<usize>,
    x_span: f64,
    y_span: f64,
}

impl HoverTree {
    /// Build from displayed points. `indices` are the full-resolution sample
    /// indices parallel to `x`/`y`. Non-finite points are skipped.
    pub fn build(trace: usize, x: &[f64], y: &[f64], indices: &[usize], x_span: f64, y_span: f64) -> Self {
        let x_span = x_span.abs().max(1e-15);
        let y_span = y_span.abs().max(1e-15);
        let mut coords: Vec<[f64; 2]> = Vec::with_capacity(x.len());
        let mut samples = Vec::with_capacity(x.len());

        for ((&xv, &yv), &i) in x.iter().zip(y.iter()).zip(indices.iter()) {
            if xv.is_finite() && yv.is_finite() {
                coords.push([xv / x_span, yv / y_span]);
                samples.push(i);
            }
        }

        let tree = (!coords.is_empty()).then(|| ImmutableKdTree::new_from_slice(&coords));
        Self { trace, tree, samples, x_span, y_span }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Nearest displayed point to (qx, qy) in data coordinates.
    pub fn nearest(&self, qx: f64, qy: f64) -> Option<HoverHit> {
        let tree = self.tree.as_ref()?;
        let result = tree.nearest_one::<SquaredEuclidean>(&[qx / self.x_span, qy / self.y_span]);
        let sample = *self.samples.get(result.item as usize)?;
        Some(HoverHit {
            trace: self.trace,
            sample,
            distance: result.distance.sqrt(),
        })
    }
}

/// Closest hit over several per-trace trees.
pub fn nearest_across(trees: &[HoverTree], qx: f64, qy: f64) -> Option<HoverHit> {
    trees
        .iter()
        .filter_map(|t| t.nearest(qx, qy))
        .min_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal))
}
