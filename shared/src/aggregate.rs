//! Pre-aggregated point data for the density heatmap representation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One weighted coordinate, produced externally and consumed read-only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregatePoint {
    /// Longitude, latitude.
    pub coordinates: [f64; 2],
    pub weight: f64,
}

impl AggregatePoint {
    /// Well-formed means exactly two finite coordinates and a finite
    /// weight. Negative weights are left to the renderer.
    pub fn is_valid(&self) -> bool {
        self.coordinates.iter().all(|c| c.is_finite()) && self.weight.is_finite()
    }
}

/// Keep only the well-formed points. Partially invalid data never
/// rejects the valid remainder.
pub fn filter_valid(points: &[AggregatePoint]) -> Vec<AggregatePoint> {
    points.iter().copied().filter(AggregatePoint::is_valid).collect()
}

/// Parse an untyped JSON payload into aggregate points. A payload
/// that is not an array is rejected wholesale (empty result);
/// individual entries that are not well-formed records are dropped.
pub fn parse_points(payload: &Value) -> Vec<AggregatePoint> {
    let Some(entries) = payload.as_array() else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| serde_json::from_value::<AggregatePoint>(entry.clone()).ok())
        .filter(AggregatePoint::is_valid)
        .collect()
}
