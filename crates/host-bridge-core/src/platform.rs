//! Scheduling hooks delegated to the host environment.
//!
//! The bridge adds no coordination of its own: animation-frame and idle work
//! requested by the reconciler is handed straight to a [`HostScheduler`].

/// Callback run on the next animation frame with the frame time in nanoseconds.
pub type FrameCallback = Box<dyn FnOnce(u64) + 'static>;

/// Callback run when the host is idle.
pub type IdleCallback = Box<dyn FnOnce(IdleDeadline) + 'static>;

/// Time budget handed to idle callbacks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IdleDeadline {
    pub time_remaining_ms: f64,
    pub did_timeout: bool,
}

impl IdleDeadline {
    pub fn new(time_remaining_ms: f64) -> Self {
        Self {
            time_remaining_ms,
            did_timeout: false,
        }
    }

    pub fn time_remaining(&self) -> f64 {
        self.time_remaining_ms
    }
}

pub trait HostScheduler {
    /// Request `callback` to run before the next frame is drawn.
    fn schedule_animation_callback(&self, callback: FrameCallback);

    /// Request `callback` to run when the host has spare time.
    fn schedule_deferred_callback(&self, callback: IdleCallback);
}

/// Runs every callback on the spot. Used when the host supplies no scheduler.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateScheduler;

impl ImmediateScheduler {
    const IDLE_BUDGET_MS: f64 = 50.0;
}

impl HostScheduler for ImmediateScheduler {
    fn schedule_animation_callback(&self, callback: FrameCallback) {
        callback(0);
    }

    fn schedule_deferred_callback(&self, callback: IdleCallback) {
        callback(IdleDeadline::new(Self::IDLE_BUDGET_MS));
    }
}
