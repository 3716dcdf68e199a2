//! Standard host services backed by Rust's `std` library.
//!
//! This crate provides a concrete [`HostScheduler`] for hosts that drive
//! their own frame loop. Animation callbacks queue up until the host calls
//! [`StdHostScheduler::run_frame`]; deferred callbacks wait for
//! [`StdHostScheduler::run_idle`].

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use host_bridge_core::platform::{FrameCallback, IdleCallback};
use host_bridge_core::{HostScheduler, IdleDeadline};

/// Scheduler that holds callbacks until the host's loop runs them.
pub struct StdHostScheduler {
    frame_callbacks: RefCell<VecDeque<FrameCallback>>,
    idle_callbacks: RefCell<VecDeque<IdleCallback>>,
    frame_requested: Cell<bool>,
    frame_waker: RefCell<Option<Rc<dyn Fn()>>>,
    started: Instant,
}

impl StdHostScheduler {
    pub fn new() -> Self {
        Self {
            frame_callbacks: RefCell::new(VecDeque::new()),
            idle_callbacks: RefCell::new(VecDeque::new()),
            frame_requested: Cell::new(false),
            frame_waker: RefCell::new(None),
            started: Instant::now(),
        }
    }

    /// Returns whether a frame has been requested since the last call.
    pub fn take_frame_request(&self) -> bool {
        self.frame_requested.replace(false)
    }

    /// Registers a waker that will be invoked whenever a new frame is scheduled.
    pub fn set_frame_waker(&self, waker: impl Fn() + 'static) {
        *self.frame_waker.borrow_mut() = Some(Rc::new(waker));
    }

    pub fn clear_frame_waker(&self) {
        *self.frame_waker.borrow_mut() = None;
    }

    pub fn pending_frame_callbacks(&self) -> usize {
        self.frame_callbacks.borrow().len()
    }

    pub fn pending_idle_callbacks(&self) -> usize {
        self.idle_callbacks.borrow().len()
    }

    /// Nanoseconds since this scheduler was created, usable as a frame time.
    pub fn now_nanos(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    /// Runs the animation callbacks queued before this call. Callbacks they
    /// schedule wait for the next frame. Returns how many ran.
    pub fn run_frame(&self, frame_time_nanos: u64) -> usize {
        let callbacks: Vec<FrameCallback> = self.frame_callbacks.borrow_mut().drain(..).collect();
        let count = callbacks.len();
        for callback in callbacks {
            callback(frame_time_nanos);
        }
        if count > 0 {
            log::trace!("ran {count} frame callback(s) at {frame_time_nanos}ns");
        }
        count
    }

    /// Runs deferred callbacks until `budget` is spent or the queue is empty.
    /// Returns how many ran.
    pub fn run_idle(&self, budget: Duration) -> usize {
        let start = Instant::now();
        let mut count = 0;
        loop {
            let remaining = budget.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                break;
            }
            let next = self.idle_callbacks.borrow_mut().pop_front();
            let Some(callback) = next else {
                break;
            };
            callback(IdleDeadline::new(remaining.as_secs_f64() * 1000.0));
            count += 1;
        }
        let left = self.pending_idle_callbacks();
        if left > 0 {
            log::debug!("idle budget of {budget:?} spent with {left} callback(s) pending");
        }
        count
    }

    fn wake(&self) {
        let waker = self.frame_waker.borrow().clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdHostScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdHostScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdHostScheduler")
            .field("frame_requested", &self.frame_requested.get())
            .field("frame_callbacks", &self.pending_frame_callbacks())
            .field("idle_callbacks", &self.pending_idle_callbacks())
            .finish()
    }
}

impl HostScheduler for StdHostScheduler {
    fn schedule_animation_callback(&self, callback: FrameCallback) {
        self.frame_callbacks.borrow_mut().push_back(callback);
        self.frame_requested.set(true);
        self.wake();
    }

    fn schedule_deferred_callback(&self, callback: IdleCallback) {
        self.idle_callbacks.borrow_mut().push_back(callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use host_bridge_core::{BridgeConfig, HostBridge, MemoryViewManager};

    #[test]
    fn frame_callbacks_wait_for_run_frame() {
        let scheduler = StdHostScheduler::new();
        let seen = Rc::new(Cell::new(0_u64));
        let sink = Rc::clone(&seen);
        scheduler.schedule_animation_callback(Box::new(move |time| sink.set(time)));

        assert_eq!(seen.get(), 0);
        assert!(scheduler.take_frame_request());
        assert!(!scheduler.take_frame_request());
        assert_eq!(scheduler.run_frame(16_000_000), 1);
        assert_eq!(seen.get(), 16_000_000);
        assert_eq!(scheduler.run_frame(32_000_000), 0);
    }

    #[test]
    fn callbacks_scheduled_during_a_frame_run_next_frame() {
        let scheduler = Rc::new(StdHostScheduler::new());
        let ran = Rc::new(Cell::new(0));
        let inner_scheduler = Rc::clone(&scheduler);
        let inner_ran = Rc::clone(&ran);
        scheduler.schedule_animation_callback(Box::new(move |_| {
            let ran = Rc::clone(&inner_ran);
            inner_scheduler.schedule_animation_callback(Box::new(move |_| ran.set(ran.get() + 1)));
        }));

        assert_eq!(scheduler.run_frame(1), 1);
        assert_eq!(ran.get(), 0);
        assert_eq!(scheduler.run_frame(2), 1);
        assert_eq!(ran.get(), 1);
    }

    #[test]
    fn waker_fires_on_schedule() {
        let scheduler = StdHostScheduler::new();
        let woken = Rc::new(Cell::new(false));
        let flag = Rc::clone(&woken);
        scheduler.set_frame_waker(move || flag.set(true));
        scheduler.schedule_animation_callback(Box::new(|_| {}));
        assert!(woken.get());
    }

    #[test]
    fn idle_callbacks_respect_budget() {
        let scheduler = StdHostScheduler::new();
        let deadlines = Rc::new(RefCell::new(Vec::new()));
        for _ in 0..3 {
            let sink = Rc::clone(&deadlines);
            scheduler.schedule_deferred_callback(Box::new(move |deadline| {
                sink.borrow_mut().push(deadline)
            }));
        }

        assert_eq!(scheduler.run_idle(Duration::ZERO), 0);
        assert_eq!(scheduler.pending_idle_callbacks(), 3);

        assert_eq!(scheduler.run_idle(Duration::from_secs(5)), 3);
        let deadlines = deadlines.borrow();
        assert_eq!(deadlines.len(), 3);
        assert!(deadlines
            .iter()
            .all(|deadline| deadline.time_remaining() > 0.0 && !deadline.did_timeout));
    }

    #[test]
    fn bridge_forwards_to_std_scheduler() {
        let scheduler = Rc::new(StdHostScheduler::new());
        let bridge: HostBridge<MemoryViewManager, ()> = HostBridge::with_config(
            MemoryViewManager::new(),
            BridgeConfig::default().with_warn_experimental(false),
        )
        .with_scheduler(scheduler.clone());

        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        bridge.schedule_animation_callback(move |_| flag.set(true));
        assert!(!ran.get());
        assert_eq!(scheduler.pending_frame_callbacks(), 1);
        scheduler.run_frame(scheduler.now_nanos());
        assert!(ran.get());
    }
}
