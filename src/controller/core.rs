//! Shared controller state and the transition worker loop.
//!
//! Two independent lock domains, per the concurrency model:
//!
//! 1. the device lock (`lights`), held only for the instant of applying one
//!    pattern or taking a snapshot, never across a hold;
//! 2. the queue lock (`queue`) paired with a condvar, notified both on new
//!    requests and on the stop signal so the worker never busy-polls.
//!
//! The worker is the only mutator of `state` and `lights` after construction,
//! which is what lets observers run outside the device lock and still read
//! exactly the pattern that was just applied.

use crate::controller::TrafficSignal;
use crate::light::{Light, LightState};
use crate::transition::{
    LightPattern, SignalState, TransitionPlan, TransitionTimings, LIGHT_NAMES, SIGNAL_LIGHTS,
};
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Observer invoked on the worker thread after every applied pattern.
pub(crate) type CallbackFn = dyn Fn(&dyn TrafficSignal) + Send + Sync;

/// Pending transition requests plus the worker's lifecycle flags.
struct PendingQueue {
    pending: VecDeque<SignalState>,
    stopped: bool,
    executing: bool,
}

pub(crate) struct Core {
    lights: Mutex<Vec<Box<dyn Light>>>,
    state: Mutex<SignalState>,
    callbacks: Mutex<Vec<Arc<CallbackFn>>>,
    queue: Mutex<PendingQueue>,
    wake: Condvar,
    timings: TransitionTimings,
}

impl Core {
    pub(crate) fn new(lights: Vec<Box<dyn Light>>, timings: TransitionTimings) -> Self {
        debug_assert_eq!(lights.len(), SIGNAL_LIGHTS);
        Self {
            lights: Mutex::new(lights),
            state: Mutex::new(SignalState::Off),
            callbacks: Mutex::new(Vec::new()),
            queue: Mutex::new(PendingQueue {
                pending: VecDeque::new(),
                stopped: false,
                executing: false,
            }),
            wake: Condvar::new(),
            timings,
        }
    }

    fn lock_queue(&self) -> MutexGuard<'_, PendingQueue> {
        self.queue.lock().expect("`Core` queue mutex can't be poisoned")
    }

    fn lock_state(&self) -> MutexGuard<'_, SignalState> {
        self.state.lock().expect("`Core` state mutex can't be poisoned")
    }

    fn lock_lights(&self) -> MutexGuard<'_, Vec<Box<dyn Light>>> {
        self.lights
            .lock()
            .expect("`Core` device mutex can't be poisoned")
    }

    pub(crate) fn state(&self) -> SignalState {
        *self.lock_state()
    }

    /// Snapshot of each light's state, consistent at the instant of the read.
    pub(crate) fn light_pattern(&self) -> LightPattern {
        let lights = self.lock_lights();
        let mut pattern = [LightState::Off; SIGNAL_LIGHTS];
        for (slot, light) in pattern.iter_mut().zip(lights.iter()) {
            *slot = light.state();
        }
        pattern
    }

    /// Enqueue a transition request, FIFO, no coalescing.
    ///
    /// Transient waypoints and the already-current settled state are silent
    /// no-ops. Requests made after shutdown are discarded.
    pub(crate) fn request(&self, target: SignalState) {
        if target.is_transient() {
            tracing::debug!(target = %target, "ignoring request for transient waypoint");
            return;
        }
        if target == self.state() {
            tracing::debug!(target = %target, "ignoring request for current state");
            return;
        }
        let mut queue = self.lock_queue();
        if queue.stopped {
            tracing::debug!(target = %target, "ignoring request after shutdown");
            return;
        }
        queue.pending.push_back(target);
        self.wake.notify_all();
    }

    pub(crate) fn register_callback(&self, callback: Arc<CallbackFn>) {
        self.callbacks
            .lock()
            .expect("`Core` callback mutex can't be poisoned")
            .push(callback);
    }

    /// True while a plan is executing or requests are still queued.
    pub(crate) fn in_transition(&self) -> bool {
        let queue = self.lock_queue();
        queue.executing || !queue.pending.is_empty()
    }

    /// Raise the one-shot stop flag and wake the worker.
    pub(crate) fn stop(&self) {
        let mut queue = self.lock_queue();
        queue.stopped = true;
        self.wake.notify_all();
    }

    /// Worker loop: pop exactly one target per iteration, strictly FIFO.
    ///
    /// The stop flag is observed before popping, so requests still queued at
    /// shutdown are discarded rather than executed.
    pub(crate) fn run(self: Arc<Self>) {
        tracing::debug!("transition worker started");
        loop {
            let target = {
                let mut queue = self.lock_queue();
                loop {
                    if queue.stopped {
                        if !queue.pending.is_empty() {
                            tracing::debug!(
                                discarded = queue.pending.len(),
                                "discarding queued requests on shutdown"
                            );
                        }
                        tracing::debug!("transition worker stopped");
                        return;
                    }
                    if let Some(target) = queue.pending.pop_front() {
                        queue.executing = true;
                        break target;
                    }
                    queue = self
                        .wake
                        .wait(queue)
                        .expect("`Core` queue mutex can't be poisoned");
                }
            };
            self.execute(target);
            self.lock_queue().executing = false;
        }
    }

    /// Expand one dequeued target and drive its plan to completion.
    fn execute(&self, target: SignalState) {
        let from = self.state();
        if from == target {
            tracing::debug!(target = %target, "already in target state, skipping");
            return;
        }

        // Directionality marker, asserted before the plan runs.
        if let Some(marker) = target.transient_marker() {
            *self.lock_state() = marker;
        }

        let Some(plan) = TransitionPlan::for_target(target, &self.timings) else {
            return;
        };

        tracing::debug!(
            from = %from,
            target = %target,
            steps = plan.steps().len(),
            "executing transition"
        );

        // Once dequeued, every step of the plan is applied; only holds can be
        // cut short by the stop signal, so the lights never end mid-plan.
        for step in plan.steps() {
            *self.lock_state() = step.state;
            self.apply_pattern(step.pattern);
            self.notify_observers();
            self.hold(step.hold);
        }
    }

    fn apply_pattern(&self, pattern: LightPattern) {
        let mut lights = self.lock_lights();
        for (light, state) in lights.iter_mut().zip(pattern) {
            light.set_state(state);
        }
    }

    /// Invoke observers in registration order, outside the device lock.
    ///
    /// The observer list is snapshotted first so a callback registering
    /// another callback cannot deadlock. Observer panics are not caught and
    /// take the worker down with them.
    fn notify_observers(&self) {
        let observers: Vec<Arc<CallbackFn>> = self
            .callbacks
            .lock()
            .expect("`Core` callback mutex can't be poisoned")
            .clone();
        for observer in &observers {
            (**observer)(self);
        }
    }

    /// Hold the current pattern, waking early only on the stop signal.
    ///
    /// New-request notifications during a hold must not shorten it, so the
    /// wait loops until the deadline unless the stop flag is raised.
    fn hold(&self, hold: Duration) {
        let deadline = Instant::now() + hold;
        let mut queue = self.lock_queue();
        loop {
            if queue.stopped {
                return;
            }
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            let (guard, _) = self
                .wake
                .wait_timeout(queue, deadline - now)
                .expect("`Core` queue mutex can't be poisoned");
            queue = guard;
        }
    }
}

impl TrafficSignal for Core {
    fn state(&self) -> SignalState {
        Core::state(self)
    }

    fn light_pattern(&self) -> LightPattern {
        Core::light_pattern(self)
    }

    fn light_names(&self) -> [&'static str; SIGNAL_LIGHTS] {
        LIGHT_NAMES
    }

    fn request(&self, target: SignalState) {
        Core::request(self, target)
    }
}
