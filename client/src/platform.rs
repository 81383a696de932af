//! Browser bindings: local storage, timers, and the async density
//! fetch entry point. Everything here is wasm-only; native builds and
//! tests use `MemoryKv` and `ManualScheduler` instead.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_storage::{LocalStorage, Storage};
use gloo_timers::callback::Timeout;
use wasm_bindgen::prelude::*;

use crate::pipeline::MapPipeline;
use crate::schedule::{Scheduler, TimerHandle};
use crate::storage::KvStore;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// Browser local storage. Read failures surface as absent keys and
/// write failures are logged and swallowed; in-memory state stays
/// authoritative either way.
pub struct LocalKv;

impl KvStore for LocalKv {
    fn get(&self, key: &str) -> Option<String> {
        LocalStorage::raw().get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(err) = LocalStorage::raw().set_item(key, value) {
            tracing::warn!(key, ?err, "local storage write failed");
        }
    }
}

/// One-shot timers backed by the platform timeout.
pub struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
    fn schedule(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerHandle {
        let timeout = Rc::new(RefCell::new(Some(Timeout::new(delay_ms, callback))));
        TimerHandle::new(move || {
            if let Some(timeout) = timeout.borrow_mut().take() {
                timeout.cancel();
            }
        })
    }

    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}

/// Kick off the density fetch for the heatmap. The result lands on
/// the pipeline whenever the request resolves.
pub fn load_density_data(pipeline: Rc<MapPipeline>) {
    pipeline.set_aggregate_loading();
    let source = pipeline.source();
    wasm_bindgen_futures::spawn_local(async move {
        let result = crate::heat::fetch_density_points(&source).await;
        pipeline.apply_aggregate_result(result);
    });
}
