//! Aggregate statistics over the features currently visible in the
//! viewport.
//!
//! The feature set comes from grid sampling, so these numbers are
//! approximate by design: exact for sparse point data at low zoom, an
//! undercount at high density.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::style::{LAYER_DEMOGRAPHICS, LAYER_RETAIL_STORES};

/// One sampled feature: its originating layer plus whatever attribute
/// payload the picking oracle returned. Replaced wholesale each
/// sampling cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportFeature {
    pub layer_id: String,
    pub properties: Map<String, Value>,
}

/// Derived aggregate over the current viewport feature set. Categories
/// with zero contributing features report zero, never NaN.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ViewportStats {
    pub store_count: usize,
    pub avg_revenue: f64,
    pub total_population: f64,
    pub total_households: f64,
    pub avg_income: f64,
    pub block_groups: usize,
}

/// Read a numeric property, treating null as absent.
fn number(props: &Map<String, Value>, key: &str) -> Option<f64> {
    props.get(key).and_then(Value::as_f64)
}

impl ViewportStats {
    pub fn from_features(features: &[ViewportFeature]) -> Self {
        let mut store_count = 0usize;
        let mut revenue_sum = 0.0;
        let mut block_groups = 0usize;
        let mut population_sum = 0.0;
        let mut households_sum = 0.0;
        let mut income_sum = 0.0;

        for feature in features {
            match feature.layer_id.as_str() {
                LAYER_RETAIL_STORES => {
                    store_count += 1;
                    revenue_sum += number(&feature.properties, "revenue").unwrap_or(0.0);
                }
                LAYER_DEMOGRAPHICS => {
                    block_groups += 1;
                    let population = feature
                        .properties
                        .get("population")
                        .filter(|v| !v.is_null())
                        .or_else(|| feature.properties.get("total_pop"))
                        .and_then(Value::as_f64)
                        .unwrap_or(0.0);
                    population_sum += population;
                    households_sum += number(&feature.properties, "households").unwrap_or(0.0);
                    income_sum += number(&feature.properties, "median_income").unwrap_or(0.0);
                }
                _ => {}
            }
        }

        Self {
            store_count,
            avg_revenue: if store_count > 0 {
                revenue_sum / store_count as f64
            } else {
                0.0
            },
            total_population: population_sum,
            total_households: households_sum,
            avg_income: if block_groups > 0 {
                income_sum / block_groups as f64
            } else {
                0.0
            },
            block_groups,
        }
    }

    pub fn has_data(&self) -> bool {
        self.store_count > 0
            || self.total_population > 0.0
            || self.total_households > 0.0
            || self.avg_income > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(layer_id: &str, props: Value) -> ViewportFeature {
        let Value::Object(properties) = props else {
            panic!("props must be an object");
        };
        ViewportFeature {
            layer_id: layer_id.into(),
            properties,
        }
    }

    #[test]
    fn empty_feature_set_is_all_zero() {
        let stats = ViewportStats::from_features(&[]);
        assert_eq!(stats, ViewportStats::default());
        assert!(!stats.has_data());
        assert_eq!(stats.avg_revenue, 0.0);
        assert_eq!(stats.avg_income, 0.0);
    }

    #[test]
    fn store_stats_count_and_average() {
        let features = vec![
            feature(LAYER_RETAIL_STORES, json!({"revenue": 100_000.0})),
            feature(LAYER_RETAIL_STORES, json!({"revenue": 300_000.0})),
        ];
        let stats = ViewportStats::from_features(&features);
        assert_eq!(stats.store_count, 2);
        assert_eq!(stats.avg_revenue, 200_000.0);
        assert!(stats.has_data());
    }

    #[test]
    fn non_numeric_attributes_are_ignored() {
        let features = vec![
            feature(LAYER_RETAIL_STORES, json!({"revenue": "confidential"})),
            feature(LAYER_RETAIL_STORES, json!({"revenue": 50_000.0})),
        ];
        let stats = ViewportStats::from_features(&features);
        assert_eq!(stats.store_count, 2);
        assert_eq!(stats.avg_revenue, 25_000.0);
    }

    #[test]
    fn population_falls_back_to_total_pop() {
        let features = vec![
            feature(LAYER_DEMOGRAPHICS, json!({"total_pop": 1_200.0})),
            feature(LAYER_DEMOGRAPHICS, json!({"population": 800.0, "total_pop": 9_999.0})),
        ];
        let stats = ViewportStats::from_features(&features);
        assert_eq!(stats.total_population, 2_000.0);
        assert_eq!(stats.block_groups, 2);
    }

    #[test]
    fn income_averages_over_polygon_features() {
        let features = vec![
            feature(LAYER_DEMOGRAPHICS, json!({"median_income": 60_000.0})),
            feature(LAYER_DEMOGRAPHICS, json!({"median_income": 40_000.0})),
            // Missing income still counts toward the divisor.
            feature(LAYER_DEMOGRAPHICS, json!({})),
        ];
        let stats = ViewportStats::from_features(&features);
        assert!((stats.avg_income - 100_000.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_layers_do_not_contribute() {
        let features = vec![feature("mystery-layer", json!({"revenue": 1e6}))];
        let stats = ViewportStats::from_features(&features);
        assert_eq!(stats, ViewportStats::default());
    }
}
