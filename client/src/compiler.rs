//! Compiles layer configurations into the ordered descriptor list the
//! rendering engine consumes.
//!
//! The compile is a pure function of its input: no shared state, no
//! partial failure. Individual layers can drop out (missing source
//! credentials) without aborting the rest, and descriptor order
//! always follows catalog order, which is paint order.

use serde_json::{Map, Value};

use meridian_shared::aggregate::{AggregatePoint, filter_valid};
use meridian_shared::colors::{HEATMAP_COLOR_RANGE, PaletteMode, Rgb, Rgba, fill_color, line_color};
use meridian_shared::style::{GeometryKind, LayerConfig, LayerStyle};

use crate::config::{
    HEATMAP_INTENSITY, HEATMAP_RADIUS_PIXELS, HEATMAP_THRESHOLD, SourceConfig, is_tileset,
};

/// How the data-source collaborator should resolve a dataset
/// reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Table,
    Tileset,
}

/// Change-detection hints for the renderer: per accessor, the style
/// fields it depends on and their current values. The renderer
/// re-invokes an accessor only when one of its listed values changed
/// since the previous descriptor list.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateTriggers {
    pub fill: Vec<(&'static str, String)>,
    pub line: Vec<(&'static str, String)>,
    pub radius: Vec<(&'static str, String)>,
}

impl UpdateTriggers {
    fn for_style(style: &LayerStyle) -> Self {
        Self {
            fill: vec![
                ("fill_color", style.fill_color.clone()),
                (
                    "color_by_column",
                    style.color_by_column.clone().unwrap_or_default(),
                ),
                ("opacity", style.opacity.to_string()),
            ],
            line: vec![("outline_color", style.outline_color.clone())],
            radius: vec![("radius", style.radius.to_string())],
        }
    }
}

/// Normal per-feature layer descriptor. Carries a style snapshot so
/// its color accessors are pure functions of the descriptor itself.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureLayer {
    pub id: String,
    pub dataset: String,
    pub source_kind: SourceKind,
    pub kind: GeometryKind,
    pub style: LayerStyle,
    pub palette: PaletteMode,
    pub pickable: bool,
    pub update_triggers: UpdateTriggers,
}

impl FeatureLayer {
    pub fn fill_color(&self, attributes: &Map<String, Value>) -> Rgba {
        fill_color(&self.style, attributes, self.palette.ramp())
    }

    pub fn line_color(&self) -> Rgba {
        line_color(&self.style)
    }

    pub fn line_width(&self) -> f64 {
        self.style.outline_width
    }

    pub fn point_radius(&self) -> f64 {
        self.style.radius
    }
}

/// Density heatmap descriptor, substituted for a point layer while
/// aggregate mode is on. Never hit-testable.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapLayer {
    pub id: String,
    pub points: Vec<AggregatePoint>,
    pub radius_pixels: f64,
    pub intensity: f64,
    pub threshold: f64,
    pub color_range: [Rgb; 5],
    pub pickable: bool,
}

/// One compiled render layer. Created fresh each compile, never
/// mutated, discarded once the renderer consumes it.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderLayerDescriptor {
    Feature(FeatureLayer),
    Heatmap(HeatmapLayer),
}

impl RenderLayerDescriptor {
    pub fn id(&self) -> &str {
        match self {
            RenderLayerDescriptor::Feature(layer) => &layer.id,
            RenderLayerDescriptor::Heatmap(layer) => &layer.id,
        }
    }

    pub fn pickable(&self) -> bool {
        match self {
            RenderLayerDescriptor::Feature(layer) => layer.pickable,
            RenderLayerDescriptor::Heatmap(layer) => layer.pickable,
        }
    }
}

pub struct CompileInput<'a> {
    pub configs: &'a [LayerConfig],
    pub heatmap_enabled: bool,
    pub aggregate_points: &'a [AggregatePoint],
    pub source: &'a SourceConfig,
    pub palette: PaletteMode,
}

pub fn compile(input: &CompileInput<'_>) -> Vec<RenderLayerDescriptor> {
    // Validate the aggregate dataset once per compile; only the
    // invalid subset is dropped.
    let valid_points = if input.heatmap_enabled {
        let valid = filter_valid(input.aggregate_points);
        if valid.len() != input.aggregate_points.len() {
            tracing::warn!(
                total = input.aggregate_points.len(),
                valid = valid.len(),
                "dropped malformed aggregate points"
            );
        }
        valid
    } else {
        Vec::new()
    };

    let mut descriptors = Vec::new();
    for config in input.configs.iter().filter(|c| c.style.visible) {
        if input.heatmap_enabled
            && config.kind == GeometryKind::Point
            && !valid_points.is_empty()
        {
            descriptors.push(RenderLayerDescriptor::Heatmap(HeatmapLayer {
                id: format!("{}-heatmap", config.id),
                points: valid_points.clone(),
                radius_pixels: HEATMAP_RADIUS_PIXELS,
                intensity: HEATMAP_INTENSITY,
                threshold: HEATMAP_THRESHOLD,
                color_range: HEATMAP_COLOR_RANGE,
                pickable: false,
            }));
            continue;
        }

        if !input.source.is_configured() {
            tracing::error!(layer = %config.id, "data source credentials missing, skipping layer");
            continue;
        }

        descriptors.push(RenderLayerDescriptor::Feature(FeatureLayer {
            id: config.id.clone(),
            dataset: config.dataset.clone(),
            source_kind: if is_tileset(&config.dataset) {
                SourceKind::Tileset
            } else {
                SourceKind::Table
            },
            kind: config.kind,
            style: config.style.clone(),
            palette: input.palette,
            pickable: true,
            update_triggers: UpdateTriggers::for_style(&config.style),
        }));
    }
    descriptors
}
