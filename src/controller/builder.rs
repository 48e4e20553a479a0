//! Builder for constructing signal controllers.

use crate::controller::core::Core;
use crate::controller::error::ControllerError;
use crate::controller::SignalController;
use crate::light::{Light, LightFactory, StandardLight};
use crate::transition::{SignalState, TransitionTimings, LIGHT_NAMES};
use std::sync::Arc;
use std::thread;

/// Builder for [`SignalController`] with a fluent API.
///
/// Every knob has a production default: [`StandardLight`] devices, initial
/// state `Off`, and the production hold durations.
///
/// # Example
///
/// ```rust
/// use signalbox::controller::SignalController;
/// use signalbox::transition::SignalState;
///
/// let controller = SignalController::builder()
///     .initial_state(SignalState::Closed)
///     .build()
///     .unwrap();
/// # drop(controller);
/// ```
pub struct SignalControllerBuilder {
    initial_state: SignalState,
    timings: TransitionTimings,
    light_factory: LightFactory,
}

impl SignalControllerBuilder {
    /// Create a builder with production defaults.
    pub fn new() -> Self {
        Self {
            initial_state: SignalState::Off,
            timings: TransitionTimings::default(),
            light_factory: Box::new(|| Box::new(StandardLight::new())),
        }
    }

    /// State requested once the worker is running.
    ///
    /// The request goes through the normal queue, so construction with a
    /// non-`Off` initial state already starts timed activity. Transient
    /// states are ignored like any other request for them.
    pub fn initial_state(mut self, state: SignalState) -> Self {
        self.initial_state = state;
        self
    }

    /// Override the hold durations used when expanding plans.
    pub fn timings(mut self, timings: TransitionTimings) -> Self {
        self.timings = timings;
        self
    }

    /// Substitute the device implementation, one light per named position.
    pub fn light_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Light> + Send + Sync + 'static,
    {
        self.light_factory = Box::new(factory);
        self
    }

    /// Build the controller: create the lights, spawn the transition worker,
    /// then request the initial state.
    pub fn build(self) -> Result<SignalController, ControllerError> {
        let lights: Vec<Box<dyn Light>> =
            LIGHT_NAMES.iter().map(|_| (self.light_factory)()).collect();
        let core = Arc::new(Core::new(lights, self.timings));

        let worker_core = Arc::clone(&core);
        let worker = thread::Builder::new()
            .name("signalbox-transition".to_string())
            .spawn(move || worker_core.run())?;

        let controller = SignalController {
            core,
            worker: Some(worker),
        };
        controller.request(self.initial_state);
        Ok(controller)
    }
}

impl Default for SignalControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
