//! Timer scheduling behind an explicit abstraction.
//!
//! The pipeline never touches ambient timer globals: it asks a
//! `Scheduler` for cancellable one-shot timers, so debounce and
//! throttle behavior is testable against a virtual clock. The wasm
//! build provides a scheduler backed by the platform timeout (see
//! `platform`); tests drive `ManualScheduler`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// One-shot timer source with a monotonic-enough millisecond clock.
pub trait Scheduler {
    /// Run `callback` after `delay_ms`. Dropping the returned handle
    /// cancels the timer; cancelling after it fired is a no-op.
    fn schedule(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerHandle;

    fn now_ms(&self) -> f64;
}

/// Cancellation token for a scheduled timer. Cancels on drop.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Trailing-edge debouncer: repeated `schedule` calls within the
/// window coalesce so only the last callback runs, once the window
/// elapses without another call. Pending work is cancelled on drop.
pub struct Debouncer {
    scheduler: Rc<dyn Scheduler>,
    delay_ms: u32,
    pending: Rc<RefCell<Option<TimerHandle>>>,
}

impl Debouncer {
    pub fn new(scheduler: Rc<dyn Scheduler>, delay_ms: u32) -> Self {
        Self {
            scheduler,
            delay_ms,
            pending: Rc::new(RefCell::new(None)),
        }
    }

    pub fn schedule(&self, callback: impl FnOnce() + 'static) {
        let pending = Rc::clone(&self.pending);
        let handle = self.scheduler.schedule(
            self.delay_ms,
            Box::new(move || {
                // Release our own handle before running; cancel after
                // fire is a no-op. Cancel closures must not touch the
                // pending slot.
                let stale = pending.borrow_mut().take();
                drop(stale);
                callback();
            }),
        );
        // Replacing the slot drops (cancels) the superseded timer.
        *self.pending.borrow_mut() = Some(handle);
    }

    pub fn cancel(&self) {
        self.pending.borrow_mut().take();
    }
}

impl Drop for Debouncer {
    // The fire callback holds its own Rc to the pending slot, so the
    // timer must be cancelled explicitly on teardown.
    fn drop(&mut self) {
        self.cancel();
    }
}

struct ThrottleState {
    last_run: Cell<f64>,
    pending: RefCell<Option<TimerHandle>>,
    action: Box<dyn Fn()>,
}

/// Leading-plus-trailing throttler around a fixed action: `call` runs
/// the action immediately when the interval has elapsed, otherwise it
/// schedules exactly one trailing run for the remainder of the
/// interval. The last pending call is never dropped (except on
/// teardown), so the action always eventually sees the latest state.
pub struct Throttler {
    scheduler: Rc<dyn Scheduler>,
    delay_ms: u32,
    state: Rc<ThrottleState>,
}

impl Throttler {
    pub fn new(scheduler: Rc<dyn Scheduler>, delay_ms: u32, action: impl Fn() + 'static) -> Self {
        Self {
            scheduler,
            delay_ms,
            state: Rc::new(ThrottleState {
                last_run: Cell::new(f64::NEG_INFINITY),
                pending: RefCell::new(None),
                action: Box::new(action),
            }),
        }
    }

    pub fn call(&self) {
        let now = self.scheduler.now_ms();
        let elapsed = now - self.state.last_run.get();
        if elapsed >= self.delay_ms as f64 {
            let stale = self.state.pending.borrow_mut().take();
            drop(stale);
            self.state.last_run.set(now);
            (self.state.action)();
            return;
        }

        let remaining = (self.delay_ms as f64 - elapsed).ceil().max(0.0) as u32;
        let state = Rc::clone(&self.state);
        let scheduler = Rc::clone(&self.scheduler);
        let handle = self.scheduler.schedule(
            remaining,
            Box::new(move || {
                let stale = state.pending.borrow_mut().take();
                drop(stale);
                state.last_run.set(scheduler.now_ms());
                (state.action)();
            }),
        );
        *self.state.pending.borrow_mut() = Some(handle);
    }

    pub fn cancel(&self) {
        self.state.pending.borrow_mut().take();
    }
}

impl Drop for Throttler {
    fn drop(&mut self) {
        self.cancel();
    }
}

struct ManualTimer {
    id: u64,
    fire_at: f64,
    cancelled: Rc<Cell<bool>>,
    callback: Box<dyn FnOnce()>,
}

struct ManualInner {
    now_ms: f64,
    next_id: u64,
    timers: Vec<ManualTimer>,
}

/// Deterministic scheduler driven by an explicit virtual clock.
/// Clones share the same clock and timer queue.
#[derive(Clone)]
pub struct ManualScheduler {
    inner: Rc<RefCell<ManualInner>>,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ManualInner {
                now_ms: 0.0,
                next_id: 0,
                timers: Vec::new(),
            })),
        }
    }

    /// Advance the clock, firing due timers in fire-time order.
    /// Timers scheduled by fired callbacks participate if they also
    /// come due within the window.
    pub fn advance(&self, ms: f64) {
        let target = self.inner.borrow().now_ms + ms;
        loop {
            let due = {
                let mut inner = self.inner.borrow_mut();
                inner.timers.retain(|t| !t.cancelled.get());
                let next = inner
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.fire_at <= target)
                    .min_by(|(_, a), (_, b)| {
                        a.fire_at
                            .partial_cmp(&b.fire_at)
                            .unwrap_or(std::cmp::Ordering::Equal)
                            .then(a.id.cmp(&b.id))
                    })
                    .map(|(pos, _)| pos);
                next.map(|pos| {
                    let timer = inner.timers.remove(pos);
                    inner.now_ms = inner.now_ms.max(timer.fire_at);
                    timer.callback
                })
            };
            match due {
                Some(callback) => callback(),
                None => break,
            }
        }
        self.inner.borrow_mut().now_ms = target;
    }

    /// Number of live (non-cancelled) timers.
    pub fn pending(&self) -> usize {
        self.inner
            .borrow()
            .timers
            .iter()
            .filter(|t| !t.cancelled.get())
            .count()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerHandle {
        let cancelled = Rc::new(Cell::new(false));
        {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            let fire_at = inner.now_ms + delay_ms as f64;
            inner.timers.push(ManualTimer {
                id,
                fire_at,
                cancelled: Rc::clone(&cancelled),
                callback,
            });
        }
        TimerHandle::new(move || cancelled.set(true))
    }

    fn now_ms(&self) -> f64 {
        self.inner.borrow().now_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        (count, move || c.set(c.get() + 1))
    }

    #[test]
    fn manual_scheduler_fires_in_order() {
        let scheduler = ManualScheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for (delay, tag) in [(30u32, "c"), (10, "a"), (20, "b")] {
            let order = Rc::clone(&order);
            let handle = scheduler.schedule(delay, Box::new(move || order.borrow_mut().push(tag)));
            // Keep timers alive past this scope.
            std::mem::forget(handle);
        }

        scheduler.advance(25.0);
        assert_eq!(*order.borrow(), vec!["a", "b"]);
        scheduler.advance(10.0);
        assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn dropping_handle_cancels_timer() {
        let scheduler = ManualScheduler::new();
        let (count, bump) = counter();
        let handle = scheduler.schedule(10, Box::new(bump));
        drop(handle);
        scheduler.advance(50.0);
        assert_eq!(count.get(), 0);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn debounce_coalesces_to_final_call() {
        let scheduler = ManualScheduler::new();
        let debouncer = Debouncer::new(Rc::new(scheduler.clone()), 300);
        let fired = Rc::new(RefCell::new(Vec::new()));

        for value in 1..=4 {
            let fired = Rc::clone(&fired);
            debouncer.schedule(move || fired.borrow_mut().push(value));
            scheduler.advance(100.0);
        }
        assert!(fired.borrow().is_empty());

        scheduler.advance(300.0);
        assert_eq!(*fired.borrow(), vec![4]);
    }

    #[test]
    fn debounce_cancel_drops_pending_work() {
        let scheduler = ManualScheduler::new();
        let debouncer = Debouncer::new(Rc::new(scheduler.clone()), 100);
        let (count, bump) = counter();
        debouncer.schedule(bump);
        debouncer.cancel();
        scheduler.advance(500.0);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn debounce_runs_again_after_idle_window() {
        let scheduler = ManualScheduler::new();
        let debouncer = Debouncer::new(Rc::new(scheduler.clone()), 100);
        let (count, bump) = counter();
        let c = Rc::clone(&count);
        debouncer.schedule(move || c.set(c.get() + 1));
        scheduler.advance(100.0);
        debouncer.schedule(bump);
        scheduler.advance(100.0);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn throttle_leads_then_trails() {
        let scheduler = ManualScheduler::new();
        let (count, bump) = counter();
        let throttler = Throttler::new(Rc::new(scheduler.clone()), 200, bump);

        throttler.call();
        assert_eq!(count.get(), 1, "leading edge fires immediately");

        throttler.call();
        throttler.call();
        assert_eq!(count.get(), 1, "calls inside the window are deferred");

        scheduler.advance(200.0);
        assert_eq!(count.get(), 2, "one trailing call for the burst");

        scheduler.advance(1_000.0);
        assert_eq!(count.get(), 2, "no spurious extra calls");
    }

    #[test]
    fn throttle_never_drops_the_last_call() {
        let scheduler = ManualScheduler::new();
        let (count, bump) = counter();
        let throttler = Throttler::new(Rc::new(scheduler.clone()), 200, bump);

        // Continuous movement: a call every 50ms for a second.
        for _ in 0..20 {
            throttler.call();
            scheduler.advance(50.0);
        }
        scheduler.advance(200.0);

        // Bounded frequency (one per 200ms window) but the trailing
        // call always lands.
        assert!(count.get() >= 5);
        assert!(count.get() <= 6);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn throttle_cancel_on_drop() {
        let scheduler = ManualScheduler::new();
        let (count, bump) = counter();
        let throttler = Throttler::new(Rc::new(scheduler.clone()), 200, bump);
        throttler.call();
        throttler.call();
        drop(throttler);
        scheduler.advance(1_000.0);
        assert_eq!(count.get(), 1, "only the leading call ran");
    }
}
