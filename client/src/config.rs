//! Tunables and external data-source configuration.

/// Debounce window for persisting layer styles to durable storage.
pub const PERSISTENCE_DEBOUNCE_MS: u32 = 300;
/// Throttle interval for viewport sampling during camera movement.
pub const VIEWPORT_SAMPLE_THROTTLE_MS: u32 = 200;

/// Viewport sample grid is GRID x GRID cell centers.
pub const SAMPLE_GRID_SIZE: usize = 8;
/// Pixel radius handed to the picking oracle per sample point.
pub const PICK_RADIUS_PX: f64 = 4.0;

/// Fixed density heatmap rendering parameters.
pub const HEATMAP_RADIUS_PIXELS: f64 = 50.0;
pub const HEATMAP_INTENSITY: f64 = 1.5;
pub const HEATMAP_THRESHOLD: f64 = 0.05;

/// Durable storage keys.
pub const KEY_LAYER_STYLES: &str = "meridian:layer-styles";
pub const KEY_HEATMAP_ENABLED: &str = "meridian:heatmap-enabled";

/// Dataset references containing this marker resolve through the
/// tileset source rather than the table source.
pub const TILESET_PATTERN: &str = "tilesets";

pub fn is_tileset(dataset: &str) -> bool {
    dataset.contains(TILESET_PATTERN)
}

/// Connection details for the external geospatial data source.
/// Supplied by the embedder; an unconfigured source is a per-layer,
/// non-fatal error at compile time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceConfig {
    pub api_base_url: String,
    pub connection_name: String,
    pub access_token: String,
}

impl SourceConfig {
    pub fn new(api_base_url: &str, connection_name: &str, access_token: &str) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            connection_name: connection_name.into(),
            access_token: access_token.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_base_url.is_empty()
            && !self.connection_name.is_empty()
            && !self.access_token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tileset_detection() {
        assert!(is_tileset("carto-demo-data.demo_tilesets.sociodemographics_usa_blockgroup"));
        assert!(!is_tileset("carto-demo-data.demo_tables.retail_stores"));
    }

    #[test]
    fn source_requires_all_fields() {
        assert!(SourceConfig::new("https://api.example.com", "bq", "token").is_configured());
        assert!(!SourceConfig::new("", "bq", "token").is_configured());
        assert!(!SourceConfig::new("https://api.example.com", "", "token").is_configured());
        assert!(!SourceConfig::new("https://api.example.com", "bq", "").is_configured());
        assert!(!SourceConfig::default().is_configured());
    }
}
