//! The layer configuration store: ordered layer configs with id
//! lookup, the heatmap-mode flag, and the opacity suppression
//! snapshot taken while the heatmap is active.

use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};

use meridian_shared::style::{
    HEATMAP_SUPPRESSED_LAYER, LayerConfig, LayerStyle, StylePatch, catalog,
};

use crate::config::{KEY_HEATMAP_ENABLED, KEY_LAYER_STYLES};
use crate::storage::KvStore;

pub struct LayerStore {
    configs: Vec<LayerConfig>,
    index: HashMap<String, usize>,
    heatmap_enabled: bool,
    /// Opacity of the suppressed layer captured on the most recent
    /// off→on heatmap transition. Single slot, not reentrant; the
    /// store assumes single-writer access.
    suppressed_opacity: Option<f64>,
}

impl Default for LayerStore {
    fn default() -> Self {
        Self::from_configs(catalog(), false)
    }
}

impl LayerStore {
    fn from_configs(configs: Vec<LayerConfig>, heatmap_enabled: bool) -> Self {
        let index = configs
            .iter()
            .enumerate()
            .map(|(i, config)| (config.id.clone(), i))
            .collect();
        Self {
            configs,
            index,
            heatmap_enabled,
            suppressed_opacity: None,
        }
    }

    /// Build the store from the catalog overlaid with whatever the
    /// durable store holds. Any read or parse failure falls back to
    /// the catalog defaults; per-layer entries merge shallowly so
    /// style fields added since the data was persisted keep their
    /// defaults.
    pub fn load(kv: &dyn KvStore) -> Self {
        let mut configs = catalog();
        if let Some(raw) = kv.get(KEY_LAYER_STYLES)
            && let Ok(persisted) = serde_json::from_str::<HashMap<String, Map<String, Value>>>(&raw)
        {
            for config in &mut configs {
                if let Some(style) = persisted.get(&config.id) {
                    config.style.merge_json(style);
                }
            }
        }
        // No suppression snapshot is recreated across sessions: if the
        // heatmap was left on, the persisted styles already carry the
        // suppressed opacity.
        let heatmap_enabled = kv.get(KEY_HEATMAP_ENABLED).as_deref() == Some("true");
        Self::from_configs(configs, heatmap_enabled)
    }

    pub fn configs(&self) -> &[LayerConfig] {
        &self.configs
    }

    pub fn heatmap_enabled(&self) -> bool {
        self.heatmap_enabled
    }

    pub fn get(&self, id: &str) -> Option<&LayerConfig> {
        self.index.get(id).map(|&i| &self.configs[i])
    }

    /// Flip visibility on the matching layer. Unknown ids are a
    /// silent no-op.
    pub fn toggle_visibility(&mut self, id: &str) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        let style = &mut self.configs[i].style;
        style.visible = !style.visible;
        true
    }

    /// Shallow-merge a partial style into the matching layer.
    /// Unknown ids are a silent no-op.
    pub fn update_style(&mut self, id: &str, patch: &StylePatch) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        self.configs[i].style.apply(patch);
        true
    }

    /// Set the heatmap flag. Off→on snapshots the suppressed layer's
    /// current opacity and forces it to zero; on→off restores the
    /// exact snapshot and clears it. Same-value calls are idempotent.
    /// Returns whether anything changed.
    pub fn set_heatmap_enabled(&mut self, enabled: bool) -> bool {
        if enabled == self.heatmap_enabled {
            return false;
        }
        if enabled {
            if let Some(&i) = self.index.get(HEATMAP_SUPPRESSED_LAYER) {
                let style = &mut self.configs[i].style;
                self.suppressed_opacity = Some(style.opacity);
                style.opacity = 0.0;
            }
        } else if let Some(opacity) = self.suppressed_opacity.take()
            && let Some(&i) = self.index.get(HEATMAP_SUPPRESSED_LAYER)
        {
            self.configs[i].style.opacity = opacity;
        }
        self.heatmap_enabled = enabled;
        true
    }

    /// Full id → style map as JSON, the persisted representation.
    /// Ordered by id so the serialized form is stable.
    pub fn styles_json(&self) -> String {
        let map: BTreeMap<&str, &LayerStyle> = self
            .configs
            .iter()
            .map(|config| (config.id.as_str(), &config.style))
            .collect();
        serde_json::to_string(&map).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKv;
    use meridian_shared::style::{LAYER_DEMOGRAPHICS, LAYER_RETAIL_STORES};

    #[test]
    fn toggle_visibility_flips_only_target() {
        let mut store = LayerStore::default();
        assert!(store.toggle_visibility(LAYER_RETAIL_STORES));
        assert!(!store.get(LAYER_RETAIL_STORES).unwrap().style.visible);
        assert!(store.get(LAYER_DEMOGRAPHICS).unwrap().style.visible);
        assert!(store.toggle_visibility(LAYER_RETAIL_STORES));
        assert!(store.get(LAYER_RETAIL_STORES).unwrap().style.visible);
    }

    #[test]
    fn unknown_ids_leave_configs_untouched() {
        let mut store = LayerStore::default();
        let before = store.configs().to_vec();
        assert!(!store.toggle_visibility("no-such-layer"));
        assert!(!store.update_style("no-such-layer", &StylePatch::opacity(0.1)));
        assert_eq!(store.configs(), &before[..]);
    }

    #[test]
    fn update_style_merges_shallowly() {
        let mut store = LayerStore::default();
        store.update_style(
            LAYER_RETAIL_STORES,
            &StylePatch {
                fill_color: Some("#112233".into()),
                radius: Some(10.0),
                ..StylePatch::default()
            },
        );
        let style = &store.get(LAYER_RETAIL_STORES).unwrap().style;
        assert_eq!(style.fill_color, "#112233");
        assert_eq!(style.radius, 10.0);
        assert_eq!(style.opacity, 0.9);
        assert_eq!(style.outline_color, "#ffffff");
    }

    #[test]
    fn heatmap_toggle_suppresses_and_restores_opacity() {
        let mut store = LayerStore::default();
        let original = store.get(LAYER_DEMOGRAPHICS).unwrap().style.opacity;

        assert!(store.set_heatmap_enabled(true));
        assert_eq!(store.get(LAYER_DEMOGRAPHICS).unwrap().style.opacity, 0.0);

        // Unrelated edits on another layer do not disturb the snapshot.
        store.update_style(LAYER_RETAIL_STORES, &StylePatch::opacity(0.5));

        assert!(store.set_heatmap_enabled(false));
        assert_eq!(
            store.get(LAYER_DEMOGRAPHICS).unwrap().style.opacity,
            original
        );
        assert_eq!(store.get(LAYER_RETAIL_STORES).unwrap().style.opacity, 0.5);
    }

    #[test]
    fn heatmap_toggle_is_idempotent() {
        let mut store = LayerStore::default();
        assert!(!store.set_heatmap_enabled(false), "already off");
        assert!(store.set_heatmap_enabled(true));
        assert!(!store.set_heatmap_enabled(true), "second enable no-ops");
        // The snapshot from the first enable survives the no-op.
        assert!(store.set_heatmap_enabled(false));
        assert_eq!(store.get(LAYER_DEMOGRAPHICS).unwrap().style.opacity, 0.6);
    }

    #[test]
    fn load_merges_persisted_styles_onto_catalog() {
        let kv = MemoryKv::default();
        kv.set(
            KEY_LAYER_STYLES,
            r##"{"retail-stores": {"fill_color": "#00ff00", "radius": 12.0}}"##,
        );
        kv.set(KEY_HEATMAP_ENABLED, "true");

        let store = LayerStore::load(&kv);
        let style = &store.get(LAYER_RETAIL_STORES).unwrap().style;
        assert_eq!(style.fill_color, "#00ff00");
        assert_eq!(style.radius, 12.0);
        assert_eq!(style.opacity, 0.9, "unpersisted fields keep defaults");
        assert!(store.heatmap_enabled());
        // Demographics had no persisted entry at all.
        assert_eq!(
            store.get(LAYER_DEMOGRAPHICS).unwrap().style,
            catalog()[0].style
        );
    }

    #[test]
    fn load_survives_corrupt_persisted_data() {
        let kv = MemoryKv::default();
        kv.set(KEY_LAYER_STYLES, "{not json");
        kv.set(KEY_HEATMAP_ENABLED, "maybe");

        let store = LayerStore::load(&kv);
        assert_eq!(store.configs(), &catalog()[..]);
        assert!(!store.heatmap_enabled());
    }

    #[test]
    fn styles_json_contains_all_layers() {
        let store = LayerStore::default();
        let parsed: HashMap<String, LayerStyle> =
            serde_json::from_str(&store.styles_json()).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[LAYER_DEMOGRAPHICS], catalog()[0].style);
        assert_eq!(parsed[LAYER_RETAIL_STORES], catalog()[1].style);
    }
}
