//! The pipeline facade: owns the layer store, the compiled descriptor
//! list, the aggregate query state, and the viewport sampler, and
//! wires mutations to debounced persistence and throttled sampling.
//!
//! Single-threaded by design; the embedder drives it from the UI
//! event loop. Every mutation that changes render-relevant state
//! recompiles the descriptor list synchronously, so reading
//! `descriptors()` after a mutation always reflects it.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use meridian_shared::aggregate::AggregatePoint;
use meridian_shared::colors::PaletteMode;
use meridian_shared::stats::ViewportStats;
use meridian_shared::style::{LayerConfig, StylePatch};

use crate::compiler::{CompileInput, RenderLayerDescriptor, compile};
use crate::config::{
    KEY_HEATMAP_ENABLED, KEY_LAYER_STYLES, PERSISTENCE_DEBOUNCE_MS, SourceConfig,
    VIEWPORT_SAMPLE_THROTTLE_MS,
};
use crate::sampler::{PickOracle, ViewportSampler};
use crate::schedule::{Debouncer, Scheduler, Throttler};
use crate::storage::KvStore;
use crate::store::LayerStore;

/// Lifecycle of the density point fetch backing the heatmap.
#[derive(Debug, Clone, Default)]
pub struct AggregateQuery {
    pub data: Vec<AggregatePoint>,
    pub is_loading: bool,
    pub error: Option<String>,
}

struct PipelineState {
    store: LayerStore,
    palette: PaletteMode,
    aggregate: AggregateQuery,
    source: SourceConfig,
    descriptors: Vec<RenderLayerDescriptor>,
    sampler: ViewportSampler,
    oracle: Option<Rc<dyn PickOracle>>,
    canvas_size: (f64, f64),
}

impl PipelineState {
    fn recompile(&mut self) {
        self.descriptors = compile(&CompileInput {
            configs: self.store.configs(),
            heatmap_enabled: self.store.heatmap_enabled(),
            aggregate_points: &self.aggregate.data,
            source: &self.source,
            palette: self.palette,
        });
    }
}

pub struct MapPipeline {
    state: Rc<RefCell<PipelineState>>,
    kv: Rc<dyn KvStore>,
    persist: Debouncer,
    sample: Throttler,
}

impl MapPipeline {
    pub fn new(kv: Rc<dyn KvStore>, scheduler: Rc<dyn Scheduler>, source: SourceConfig) -> Self {
        let mut initial = PipelineState {
            store: LayerStore::load(kv.as_ref()),
            palette: PaletteMode::Default,
            aggregate: AggregateQuery::default(),
            source,
            descriptors: Vec::new(),
            sampler: ViewportSampler::default(),
            oracle: None,
            canvas_size: (0.0, 0.0),
        };
        initial.recompile();
        tracing::debug!(
            layers = initial.store.configs().len(),
            heatmap = initial.store.heatmap_enabled(),
            "pipeline initialized"
        );

        let state = Rc::new(RefCell::new(initial));
        let sample_state = Rc::clone(&state);
        Self {
            persist: Debouncer::new(Rc::clone(&scheduler), PERSISTENCE_DEBOUNCE_MS),
            sample: Throttler::new(scheduler, VIEWPORT_SAMPLE_THROTTLE_MS, move || {
                Self::run_sample(&sample_state);
            }),
            state,
            kv,
        }
    }

    /// Sampling reads live state at fire time, so a throttled trailing
    /// run sees whatever the pipeline holds then, not at call time.
    fn run_sample(state: &Rc<RefCell<PipelineState>>) {
        let (oracle, width, height, mut sampler) = {
            let mut s = state.borrow_mut();
            let Some(oracle) = s.oracle.clone() else {
                return;
            };
            let (width, height) = s.canvas_size;
            (oracle, width, height, std::mem::take(&mut s.sampler))
        };
        if width > 0.0 && height > 0.0 {
            sampler.sample(oracle.as_ref(), width, height);
        }
        state.borrow_mut().sampler = sampler;
    }

    /// The full style map is serialized at timer fire time, so a burst
    /// of edits persists once, with the final state.
    fn schedule_persist(&self) {
        let state = Rc::clone(&self.state);
        let kv = Rc::clone(&self.kv);
        self.persist.schedule(move || {
            let json = state.borrow().store.styles_json();
            kv.set(KEY_LAYER_STYLES, &json);
        });
    }

    pub fn toggle_visibility(&self, id: &str) {
        let changed = {
            let mut s = self.state.borrow_mut();
            let changed = s.store.toggle_visibility(id);
            if changed {
                s.recompile();
            }
            changed
        };
        if changed {
            self.schedule_persist();
            self.sample.call();
        }
    }

    pub fn update_style(&self, id: &str, patch: &StylePatch) {
        let changed = {
            let mut s = self.state.borrow_mut();
            let changed = s.store.update_style(id, patch);
            if changed {
                s.recompile();
            }
            changed
        };
        if changed {
            self.schedule_persist();
            self.sample.call();
        }
    }

    pub fn set_heatmap_enabled(&self, enabled: bool) {
        let changed = {
            let mut s = self.state.borrow_mut();
            let changed = s.store.set_heatmap_enabled(enabled);
            if changed {
                s.recompile();
            }
            changed
        };
        if changed {
            // The flag itself is small and written immediately; the
            // style map (suppressed opacity) goes through the debounce.
            self.kv
                .set(KEY_HEATMAP_ENABLED, if enabled { "true" } else { "false" });
            self.schedule_persist();
            self.sample.call();
        }
    }

    pub fn set_palette_mode(&self, palette: PaletteMode) {
        let mut s = self.state.borrow_mut();
        if s.palette != palette {
            s.palette = palette;
            s.recompile();
        }
    }

    pub fn set_aggregate_loading(&self) {
        let mut s = self.state.borrow_mut();
        s.aggregate.is_loading = true;
        s.aggregate.error = None;
    }

    /// Land the result of a density fetch. Errors clear the point set
    /// so a stale heatmap never outlives its data.
    pub fn apply_aggregate_result(&self, result: Result<Vec<AggregatePoint>, String>) {
        let mut s = self.state.borrow_mut();
        match result {
            Ok(data) => {
                tracing::debug!(points = data.len(), "density data loaded");
                s.aggregate = AggregateQuery {
                    data,
                    is_loading: false,
                    error: None,
                };
            }
            Err(error) => {
                tracing::error!(%error, "density query failed");
                s.aggregate = AggregateQuery {
                    data: Vec::new(),
                    is_loading: false,
                    error: Some(error),
                };
            }
        }
        s.recompile();
    }

    /// Land an untyped aggregate payload, as handed over by an
    /// embedder that did its own fetch. Non-array payloads read as
    /// empty; malformed entries are dropped individually.
    pub fn apply_aggregate_json(&self, payload: &serde_json::Value) {
        self.apply_aggregate_result(Ok(meridian_shared::aggregate::parse_points(payload)));
    }

    /// Attach the rendering surface once it can answer hit tests, and
    /// take an immediate first sample.
    pub fn surface_ready(&self, oracle: Rc<dyn PickOracle>, width: f64, height: f64) {
        {
            let mut s = self.state.borrow_mut();
            s.oracle = Some(oracle);
            s.canvas_size = (width, height);
        }
        Self::run_sample(&self.state);
    }

    /// Camera movement: remember the viewport and request a throttled
    /// sampling pass.
    pub fn camera_moved(&self, width: f64, height: f64) {
        self.state.borrow_mut().canvas_size = (width, height);
        self.sample.call();
    }

    pub fn descriptors(&self) -> Ref<'_, [RenderLayerDescriptor]> {
        Ref::map(self.state.borrow(), |s| s.descriptors.as_slice())
    }

    pub fn configs(&self) -> Ref<'_, [LayerConfig]> {
        Ref::map(self.state.borrow(), |s| s.store.configs())
    }

    pub fn stats(&self) -> ViewportStats {
        *self.state.borrow().sampler.stats()
    }

    pub fn heatmap_enabled(&self) -> bool {
        self.state.borrow().store.heatmap_enabled()
    }

    pub fn palette(&self) -> PaletteMode {
        self.state.borrow().palette
    }

    pub fn aggregate(&self) -> AggregateQuery {
        self.state.borrow().aggregate.clone()
    }

    pub fn source(&self) -> SourceConfig {
        self.state.borrow().source.clone()
    }
}
