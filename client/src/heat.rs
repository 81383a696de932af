//! Density data for the aggregate heatmap: the SQL query, row
//! mapping, and the wasm fetch path.
//!
//! Row parsing and weight derivation are platform-neutral so they can
//! be tested natively; only the HTTP fetch itself is wasm-gated.

use serde::Deserialize;

use meridian_shared::aggregate::AggregatePoint;

use crate::config::SourceConfig;

/// Point coordinates with revenue, pulled straight from the warehouse.
pub const DENSITY_SQL: &str = "SELECT ST_X(geom) as lng, ST_Y(geom) as lat, revenue \
     FROM `carto-demo-data.demo_tables.retail_stores`";

#[derive(Debug, Clone, Deserialize)]
pub struct DensityRow {
    pub lng: f64,
    pub lat: f64,
    #[serde(default)]
    pub revenue: f64,
}

#[derive(Debug, Deserialize)]
pub struct DensityResponse {
    pub rows: Vec<DensityRow>,
}

/// Heat weight for one store. Revenue is scaled down so typical
/// values land near 1.0; missing or non-positive revenue contributes
/// a floor weight instead of vanishing.
pub fn weight_for_revenue(revenue: f64) -> f64 {
    revenue.max(1.0) / 100_000.0
}

pub fn row_to_point(row: &DensityRow) -> AggregatePoint {
    AggregatePoint {
        coordinates: [row.lng, row.lat],
        weight: weight_for_revenue(row.revenue),
    }
}

pub fn query_url(source: &SourceConfig) -> String {
    format!(
        "{}/v3/sql/{}/query",
        source.api_base_url, source.connection_name
    )
}

#[cfg(target_arch = "wasm32")]
pub async fn fetch_density_points(source: &SourceConfig) -> Result<Vec<AggregatePoint>, String> {
    use gloo_net::http::Request;

    if !source.is_configured() {
        return Err("data source is not configured".to_string());
    }

    let response = Request::get(&query_url(source))
        .query([("q", DENSITY_SQL)])
        .header("Authorization", &format!("Bearer {}", source.access_token))
        .send()
        .await
        .map_err(|e| format!("density query failed: {e}"))?;

    if !response.ok() {
        return Err(format!("density query returned {}", response.status()));
    }

    let body: DensityResponse = response
        .json()
        .await
        .map_err(|e| format!("density response parse failed: {e}"))?;

    Ok(body.rows.iter().map(row_to_point).collect())
}
