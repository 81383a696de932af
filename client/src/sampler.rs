//! Viewport sampling: probe the rendered surface on a fixed grid,
//! dedupe the hits into a feature set, and fold that set into
//! aggregate statistics.
//!
//! Sampling is approximate by construction. A denser grid trades
//! latency for accuracy; the grid size lives in `config`.

use std::collections::HashSet;

use serde_json::{Map, Value};

use meridian_shared::stats::{ViewportFeature, ViewportStats};

use crate::config::{PICK_RADIUS_PX, SAMPLE_GRID_SIZE};

/// One hit-test result from the rendering surface.
#[derive(Debug, Clone, PartialEq)]
pub struct PickHit {
    pub layer_id: String,
    pub attributes: Map<String, Value>,
}

/// Hit-testing collaborator backed by the rendering surface. A pick
/// failure is per-point and recoverable; the sampler keeps going.
pub trait PickOracle {
    fn pick(&self, x: f64, y: f64, radius: f64) -> Result<Vec<PickHit>, String>;
}

/// Attribute names tried in order when identifying a feature.
const ID_ATTRIBUTES: [&str; 3] = ["id", "cartodb_id", "geoid"];

/// Cell centers of a `grid` x `grid` subdivision of a `width` x
/// `height` viewport, row by row.
pub fn sample_points(width: f64, height: f64, grid: usize) -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(grid * grid);
    for j in 0..grid {
        for i in 0..grid {
            let x = (i as f64 + 0.5) * width / grid as f64;
            let y = (j as f64 + 0.5) * height / grid as f64;
            points.push((x, y));
        }
    }
    points
}

fn feature_id(attributes: &Map<String, Value>) -> Option<String> {
    for name in ID_ATTRIBUTES {
        match attributes.get(name) {
            Some(Value::String(s)) => return Some(s.clone()),
            Some(Value::Null) | None => {}
            Some(other) => return Some(other.to_string()),
        }
    }
    None
}

/// Holds the most recent sampled feature set and its statistics.
/// Each sampling pass replaces both wholesale; nothing accumulates
/// across passes.
pub struct ViewportSampler {
    grid: usize,
    pick_radius: f64,
    features: Vec<ViewportFeature>,
    stats: ViewportStats,
}

impl Default for ViewportSampler {
    fn default() -> Self {
        Self {
            grid: SAMPLE_GRID_SIZE,
            pick_radius: PICK_RADIUS_PX,
            features: Vec::new(),
            stats: ViewportStats::default(),
        }
    }
}

impl ViewportSampler {
    pub fn features(&self) -> &[ViewportFeature] {
        &self.features
    }

    pub fn stats(&self) -> &ViewportStats {
        &self.stats
    }

    /// Run one full sampling pass over the viewport. Per-point pick
    /// failures are logged and skipped; the pass always produces a
    /// (possibly smaller) result.
    pub fn sample(
        &mut self,
        oracle: &dyn PickOracle,
        width: f64,
        height: f64,
    ) -> ViewportStats {
        let mut seen = HashSet::new();
        let mut features = Vec::new();
        // Positional fallback for features exposing no id attribute.
        // Distinct anonymous features picked at different points get
        // distinct keys; the same anonymous feature picked twice is
        // counted twice. Accepted inaccuracy.
        let mut hit_index: usize = 0;

        for (x, y) in sample_points(width, height, self.grid) {
            let hits = match oracle.pick(x, y, self.pick_radius) {
                Ok(hits) => hits,
                Err(err) => {
                    tracing::debug!(x, y, error = %err, "pick failed, skipping sample point");
                    continue;
                }
            };
            for hit in hits {
                let key = match feature_id(&hit.attributes) {
                    Some(id) => format!("{}-{}", hit.layer_id, id),
                    None => format!("{}-{}", hit.layer_id, hit_index),
                };
                hit_index += 1;
                if seen.insert(key) {
                    features.push(ViewportFeature {
                        layer_id: hit.layer_id,
                        properties: hit.attributes,
                    });
                }
            }
        }

        self.stats = ViewportStats::from_features(&features);
        self.features = features;
        self.stats.clone()
    }
}
