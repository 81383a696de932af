//! Reactive layer-composition pipeline for a geospatial dashboard:
//! styleable layer catalog with durable persistence, descriptor
//! compilation for the renderer, a density heatmap mode, and
//! grid-sampled viewport statistics.

pub mod compiler;
pub mod config;
pub mod heat;
pub mod pipeline;
pub mod sampler;
pub mod schedule;
pub mod storage;
pub mod store;

#[cfg(target_arch = "wasm32")]
pub mod platform;

pub use compiler::{CompileInput, FeatureLayer, HeatmapLayer, RenderLayerDescriptor, compile};
pub use config::SourceConfig;
pub use pipeline::{AggregateQuery, MapPipeline};
pub use sampler::{PickHit, PickOracle, ViewportSampler};
pub use schedule::{Debouncer, ManualScheduler, Scheduler, Throttler, TimerHandle};
pub use storage::{KvStore, MemoryKv};
pub use store::LayerStore;
