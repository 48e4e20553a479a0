//! The signal controller: queued requests, a dedicated transition worker,
//! and synchronous observer notification.
//!
//! A [`SignalController`] owns its lights and a single background worker
//! thread. Callers on any thread enqueue transition requests; the worker
//! drains them strictly in submission order, expanding each into a timed
//! plan and applying one pattern at a time. Observers registered with
//! [`SignalController::register_callback`] run on the worker thread after
//! every applied pattern.
//!
//! Shutdown is join-before-free: [`SignalController::shutdown`] (or `Drop`)
//! raises a one-shot stop flag, wakes the worker, and joins it before any
//! owned state is released. Requests still queued at shutdown are discarded.

pub mod builder;
pub(crate) mod core;
pub mod error;

pub use builder::SignalControllerBuilder;
pub use error::ControllerError;

use crate::transition::{LightPattern, SignalState, LIGHT_NAMES, SIGNAL_LIGHTS};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Capability set of a signal controller.
///
/// This is the surface observers receive and the seam for substituting a
/// controller implementation. Reads are lock-protected snapshots and never
/// wait for an in-flight transition to finish.
pub trait TrafficSignal: Send + Sync {
    /// Snapshot of the current controller state.
    ///
    /// Transient waypoints (`Opening`/`Closing`) are valid reads while a
    /// multi-step transition is in flight.
    fn state(&self) -> SignalState;

    /// Snapshot of each light's state, consistent at the instant of the read
    /// (not across a whole transition).
    fn light_pattern(&self) -> LightPattern;

    /// Names of the lights, fixed at construction; defines the positional
    /// correspondence with [`TrafficSignal::light_pattern`].
    fn light_names(&self) -> [&'static str; SIGNAL_LIGHTS] {
        LIGHT_NAMES
    }

    /// Enqueue a transition toward a settled state and return immediately.
    ///
    /// Requests for transient waypoints or the already-current state are
    /// silent no-ops. Accepted requests execute strictly in submission
    /// order; there is no coalescing and no cancellation.
    fn request(&self, target: SignalState);
}

/// A traffic signal driven by a dedicated background worker thread.
///
/// # Example
///
/// ```rust
/// use signalbox::controller::SignalController;
/// use signalbox::light::LightState;
/// use signalbox::transition::SignalState;
///
/// let mut controller = SignalController::new().unwrap();
/// assert_eq!(controller.state(), SignalState::Off);
/// assert_eq!(controller.light_pattern(), [LightState::Off; 3]);
///
/// controller.request(SignalState::Open);
/// // ... the worker applies [Off, Off, On] and holds it for 3 seconds ...
///
/// controller.shutdown().unwrap();
/// ```
pub struct SignalController {
    core: Arc<core::Core>,
    worker: Option<JoinHandle<()>>,
}

impl SignalController {
    /// Create a controller with production defaults (initial state `Off`).
    pub fn new() -> Result<Self, ControllerError> {
        Self::builder().build()
    }

    /// Start building a controller.
    pub fn builder() -> SignalControllerBuilder {
        SignalControllerBuilder::new()
    }

    /// Snapshot of the current controller state.
    pub fn state(&self) -> SignalState {
        self.core.state()
    }

    /// Snapshot of each light's state.
    pub fn light_pattern(&self) -> LightPattern {
        self.core.light_pattern()
    }

    /// Names of the lights, in pattern order.
    pub fn light_names(&self) -> [&'static str; SIGNAL_LIGHTS] {
        LIGHT_NAMES
    }

    /// Enqueue a transition toward a settled state; returns immediately.
    pub fn request(&self, target: SignalState) {
        self.core.request(target);
    }

    /// Request the `Open` state.
    pub fn open(&self) {
        self.request(SignalState::Open);
    }

    /// Request the `Closed` state.
    pub fn close(&self) {
        self.request(SignalState::Closed);
    }

    /// Request the `Warning` state.
    pub fn warning(&self) {
        self.request(SignalState::Warning);
    }

    /// Request the `Off` state.
    pub fn off(&self) {
        self.request(SignalState::Off);
    }

    /// True while a plan is executing or requests are still queued.
    pub fn in_transition(&self) -> bool {
        self.core.in_transition()
    }

    /// Register an observer, invoked synchronously on the worker thread after
    /// every applied pattern. Registration order is invocation order; there
    /// is no unregistration.
    ///
    /// An observer that panics takes the worker down with it, which
    /// [`SignalController::shutdown`] reports as
    /// [`ControllerError::WorkerPanicked`].
    pub fn register_callback<F>(&self, callback: F)
    where
        F: Fn(&dyn TrafficSignal) + Send + Sync + 'static,
    {
        self.core.register_callback(Arc::new(callback));
    }

    /// Stop the worker and join it.
    ///
    /// The worker observes the stop signal with bounded latency: an in-flight
    /// plan finishes applying its remaining steps without their holds, and
    /// queued requests are discarded. Calling this a second time returns
    /// [`ControllerError::AlreadyShutdown`].
    pub fn shutdown(&mut self) -> Result<(), ControllerError> {
        let Some(worker) = self.worker.take() else {
            return Err(ControllerError::AlreadyShutdown);
        };
        self.core.stop();
        worker.join().map_err(|_| ControllerError::WorkerPanicked)
    }
}

impl TrafficSignal for SignalController {
    fn state(&self) -> SignalState {
        SignalController::state(self)
    }

    fn light_pattern(&self) -> LightPattern {
        SignalController::light_pattern(self)
    }

    fn request(&self, target: SignalState) {
        SignalController::request(self, target)
    }
}

impl Drop for SignalController {
    /// Best-effort shutdown: the worker is always joined before the owned
    /// state is torn down, since it holds a reference to that state.
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.core.stop();
            if worker.join().is_err() {
                tracing::error!("transition worker panicked during drop");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::{Light, LightState};
    use crate::transition::TransitionTimings;
    use std::sync::mpsc;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Millisecond-scale timings so full transitions complete quickly.
    fn test_timings() -> TransitionTimings {
        TransitionTimings {
            settle_hold: Duration::from_millis(20),
            clearance_hold: Duration::from_millis(10),
        }
    }

    fn test_controller(initial: SignalState) -> SignalController {
        SignalController::builder()
            .initial_state(initial)
            .timings(test_timings())
            .build()
            .unwrap()
    }

    /// Wait until the queue drains and the worker goes idle.
    fn wait_idle(controller: &SignalController) {
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while controller.in_transition() {
            assert!(
                std::time::Instant::now() < deadline,
                "controller never went idle"
            );
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn new_controller_starts_off_and_dark() {
        let controller = test_controller(SignalState::Off);
        assert_eq!(controller.state(), SignalState::Off);
        assert_eq!(controller.light_pattern(), [LightState::Off; 3]);
        assert_eq!(controller.light_names(), ["red", "amber", "green"]);
    }

    #[test]
    fn initial_state_is_requested_at_construction() {
        let controller = test_controller(SignalState::Warning);
        wait_idle(&controller);
        assert_eq!(controller.state(), SignalState::Warning);
        assert_eq!(
            controller.light_pattern(),
            [LightState::Off, LightState::Flashing, LightState::Off]
        );
    }

    #[test]
    fn requesting_a_settled_state_reaches_it() {
        let controller = test_controller(SignalState::Off);
        controller.request(SignalState::Open);
        wait_idle(&controller);
        assert_eq!(controller.state(), SignalState::Open);
        assert_eq!(
            controller.light_pattern(),
            [LightState::Off, LightState::Off, LightState::On]
        );
    }

    #[test]
    fn convenience_requests_map_to_their_targets() {
        let controller = test_controller(SignalState::Off);
        controller.close();
        wait_idle(&controller);
        assert_eq!(controller.state(), SignalState::Closed);

        controller.open();
        wait_idle(&controller);
        assert_eq!(controller.state(), SignalState::Open);

        controller.warning();
        wait_idle(&controller);
        assert_eq!(controller.state(), SignalState::Warning);

        controller.off();
        wait_idle(&controller);
        assert_eq!(controller.state(), SignalState::Off);
    }

    #[test]
    fn transient_requests_are_ignored() {
        let (tx, rx) = mpsc::channel();
        let controller = test_controller(SignalState::Off);
        controller.register_callback(move |signal| {
            tx.send(signal.state()).unwrap();
        });

        controller.request(SignalState::Opening);
        controller.request(SignalState::Closing);
        wait_idle(&controller);

        assert_eq!(controller.state(), SignalState::Off);
        assert!(rx.try_recv().is_err(), "no patterns should have been applied");
    }

    #[test]
    fn redundant_requests_cause_no_churn() {
        let controller = test_controller(SignalState::Off);
        controller.request(SignalState::Open);
        wait_idle(&controller);

        let (tx, rx) = mpsc::channel();
        controller.register_callback(move |signal| {
            tx.send(signal.state()).unwrap();
        });
        controller.request(SignalState::Open);
        wait_idle(&controller);

        assert_eq!(controller.state(), SignalState::Open);
        assert!(rx.try_recv().is_err(), "no new pattern changes expected");
    }

    #[test]
    fn callbacks_run_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let controller = test_controller(SignalState::Off);

        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            controller.register_callback(move |_| {
                order.lock().unwrap().push(tag);
            });
        }

        controller.request(SignalState::Warning);
        wait_idle(&controller);

        let seen = order.lock().unwrap().clone();
        assert_eq!(seen, vec!["first", "second", "third"]);
    }

    #[test]
    fn callbacks_observe_the_applied_pattern_and_state() {
        let (tx, rx) = mpsc::channel();
        let controller = test_controller(SignalState::Off);
        controller.register_callback(move |signal| {
            tx.send((signal.state(), signal.light_pattern())).unwrap();
        });

        controller.request(SignalState::Closed);
        wait_idle(&controller);

        let first = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(
            first,
            (
                SignalState::Closing,
                [LightState::Off, LightState::On, LightState::Off]
            )
        );
        assert_eq!(
            second,
            (
                SignalState::Closed,
                [LightState::On, LightState::Off, LightState::Off]
            )
        );
    }

    #[test]
    fn custom_light_factory_backs_the_controller() {
        struct CountingLight {
            state: LightState,
            writes: Arc<Mutex<usize>>,
        }

        impl Light for CountingLight {
            fn state(&self) -> LightState {
                self.state
            }

            fn set_state(&mut self, state: LightState) {
                self.state = state;
                *self.writes.lock().unwrap() += 1;
            }
        }

        let writes = Arc::new(Mutex::new(0));
        let factory_writes = Arc::clone(&writes);
        let controller = SignalController::builder()
            .timings(test_timings())
            .light_factory(move || {
                Box::new(CountingLight {
                    state: LightState::Off,
                    writes: Arc::clone(&factory_writes),
                })
            })
            .build()
            .unwrap();

        controller.request(SignalState::Open);
        wait_idle(&controller);

        // One plan step, three lights written.
        assert_eq!(*writes.lock().unwrap(), 3);
    }

    #[test]
    fn shutdown_joins_and_is_one_shot() {
        let mut controller = test_controller(SignalState::Off);
        controller.request(SignalState::Open);
        assert!(controller.shutdown().is_ok());
        assert!(matches!(
            controller.shutdown(),
            Err(ControllerError::AlreadyShutdown)
        ));
    }

    #[test]
    fn queued_requests_are_discarded_at_shutdown() {
        let (tx, rx) = mpsc::channel();
        let mut controller = SignalController::builder()
            .timings(TransitionTimings {
                settle_hold: Duration::from_millis(200),
                clearance_hold: Duration::from_millis(200),
            })
            .build()
            .unwrap();
        controller.register_callback(move |signal| {
            tx.send(signal.state()).unwrap();
        });

        // First request starts executing; the rest stay queued.
        controller.request(SignalState::Open);
        controller.request(SignalState::Closed);
        controller.request(SignalState::Warning);
        std::thread::sleep(Duration::from_millis(50));
        controller.shutdown().unwrap();

        // The in-flight plan still lands on its settled target.
        assert_eq!(controller.state(), SignalState::Open);
        assert_eq!(rx.try_recv(), Ok(SignalState::Open));
        assert!(rx.try_recv().is_err(), "queued requests must not run");
    }

    #[test]
    fn requests_after_shutdown_are_ignored() {
        let mut controller = test_controller(SignalState::Off);
        controller.shutdown().unwrap();
        controller.request(SignalState::Open);
        assert!(!controller.in_transition());
        assert_eq!(controller.state(), SignalState::Off);
    }

    #[test]
    fn panicking_callback_is_fatal_to_the_worker() {
        let mut controller = test_controller(SignalState::Off);
        controller.register_callback(|_| panic!("observer failure"));
        controller.request(SignalState::Open);

        // Give the worker time to hit the panic.
        std::thread::sleep(Duration::from_millis(100));
        assert!(matches!(
            controller.shutdown(),
            Err(ControllerError::WorkerPanicked)
        ));
    }

    #[test]
    fn drop_joins_the_worker() {
        let controller = test_controller(SignalState::Off);
        controller.request(SignalState::Closed);
        drop(controller);
    }
}
