//! Layer style and configuration types, plus the built-in catalog.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Layer id of the polygon demographics overlay.
pub const LAYER_DEMOGRAPHICS: &str = "sociodemographics";
/// Layer id of the point retail-stores overlay.
pub const LAYER_RETAIL_STORES: &str = "retail-stores";

/// Layer whose opacity is forced to zero while the density heatmap is
/// active, so the heatmap is readable over the polygon fill.
pub const HEATMAP_SUPPRESSED_LAYER: &str = LAYER_DEMOGRAPHICS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryKind {
    Point,
    Polygon,
}

/// Visual style of one layer. Persisted whole; unknown fields in
/// persisted data are ignored and missing ones keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerStyle {
    pub fill_color: String,
    pub outline_color: String,
    pub outline_width: f64,
    /// Point radius in pixels. Ignored but retained for polygon layers.
    pub radius: f64,
    pub color_by_column: Option<String>,
    pub visible: bool,
    pub opacity: f64,
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            fill_color: "#ffffff".into(),
            outline_color: "#ffffff".into(),
            outline_width: 1.0,
            radius: 6.0,
            color_by_column: None,
            visible: true,
            opacity: 0.9,
        }
    }
}

impl LayerStyle {
    /// Shallow-merge a persisted JSON object onto this style: every
    /// recognized, correctly-typed field present in the object
    /// overwrites the current value, everything else is preserved.
    /// Fields introduced since the data was persisted keep their
    /// catalog defaults.
    pub fn merge_json(&mut self, persisted: &Map<String, Value>) {
        if let Some(v) = persisted.get("fill_color").and_then(Value::as_str) {
            self.fill_color = v.to_string();
        }
        if let Some(v) = persisted.get("outline_color").and_then(Value::as_str) {
            self.outline_color = v.to_string();
        }
        if let Some(v) = persisted.get("outline_width").and_then(Value::as_f64) {
            self.outline_width = v;
        }
        if let Some(v) = persisted.get("radius").and_then(Value::as_f64) {
            self.radius = v;
        }
        match persisted.get("color_by_column") {
            Some(Value::Null) => self.color_by_column = None,
            Some(Value::String(s)) => self.color_by_column = Some(s.clone()),
            _ => {}
        }
        if let Some(v) = persisted.get("visible").and_then(Value::as_bool) {
            self.visible = v;
        }
        if let Some(v) = persisted.get("opacity").and_then(Value::as_f64) {
            self.opacity = v;
        }
    }

    /// Apply an in-process partial update. `None` fields are left
    /// untouched.
    pub fn apply(&mut self, patch: &StylePatch) {
        if let Some(v) = &patch.fill_color {
            self.fill_color = v.clone();
        }
        if let Some(v) = &patch.outline_color {
            self.outline_color = v.clone();
        }
        if let Some(v) = patch.outline_width {
            self.outline_width = v;
        }
        if let Some(v) = patch.radius {
            self.radius = v;
        }
        if let Some(v) = &patch.color_by_column {
            self.color_by_column = v.clone();
        }
        if let Some(v) = patch.visible {
            self.visible = v;
        }
        if let Some(v) = patch.opacity {
            self.opacity = v;
        }
    }
}

/// Partial style update. The outer `Option` marks presence; for
/// `color_by_column` the inner `Option` distinguishes "select this
/// column" from "clear the selection".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StylePatch {
    pub fill_color: Option<String>,
    pub outline_color: Option<String>,
    pub outline_width: Option<f64>,
    pub radius: Option<f64>,
    pub color_by_column: Option<Option<String>>,
    pub visible: Option<bool>,
    pub opacity: Option<f64>,
}

impl StylePatch {
    pub fn opacity(value: f64) -> Self {
        Self {
            opacity: Some(value),
            ..Self::default()
        }
    }

    pub fn color_by(column: Option<&str>) -> Self {
        Self {
            color_by_column: Some(column.map(str::to_string)),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: String,
}

impl ColumnSpec {
    pub fn number(name: &str) -> Self {
        Self {
            name: name.into(),
            kind: "number".into(),
        }
    }
}

/// One styleable dataset overlay. Created from the catalog at startup
/// and never destroyed; only `style` mutates afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub id: String,
    pub name: String,
    /// Opaque dataset reference, resolved by the data-source collaborator.
    pub dataset: String,
    pub kind: GeometryKind,
    pub style: LayerStyle,
    pub columns: Vec<ColumnSpec>,
    pub color_by_options: Vec<String>,
}

/// The built-in layer catalog: one polygon overlay, one point overlay.
pub fn catalog() -> Vec<LayerConfig> {
    vec![
        LayerConfig {
            id: LAYER_DEMOGRAPHICS.into(),
            name: "US Demographics".into(),
            dataset: "carto-demo-data.demo_tilesets.sociodemographics_usa_blockgroup".into(),
            kind: GeometryKind::Polygon,
            style: LayerStyle {
                fill_color: "#4ECDC4".into(),
                outline_color: "#1e1e24".into(),
                outline_width: 0.5,
                radius: 0.0,
                color_by_column: Some("total_pop".into()),
                visible: true,
                opacity: 0.6,
            },
            columns: vec![ColumnSpec::number("total_pop")],
            color_by_options: vec!["total_pop".into(), "median_income".into()],
        },
        LayerConfig {
            id: LAYER_RETAIL_STORES.into(),
            name: "Retail Stores".into(),
            dataset: "carto-demo-data.demo_tables.retail_stores".into(),
            kind: GeometryKind::Point,
            style: LayerStyle {
                fill_color: "#FF6B6B".into(),
                outline_color: "#ffffff".into(),
                outline_width: 1.0,
                radius: 6.0,
                color_by_column: None,
                visible: true,
                opacity: 0.9,
            },
            columns: vec![ColumnSpec::number("revenue")],
            color_by_options: vec!["revenue".into()],
        },
    ]
}
