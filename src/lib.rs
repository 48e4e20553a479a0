//! Signalbox: a threaded traffic-signal controller.
//!
//! A [`SignalController`] owns a fixed set of output devices ("lights"),
//! serializes state-transition requests from any number of caller threads,
//! and executes each transition as a timed sequence of light patterns on a
//! dedicated background worker. Observers are notified synchronously after
//! every pattern change.
//!
//! # Core Concepts
//!
//! - **Light**: a single actuator holding `Off`, `On`, or `Flashing`,
//!   substitutable through the [`Light`] trait and a factory at construction
//! - **Pattern**: the per-light vector of states applied at one step
//! - **Plan**: the full ordered sequence of (pattern, hold) steps expanded
//!   from a fixed table for each requested settled state
//! - **Worker**: one background thread per controller draining requests in
//!   strict FIFO order, with join-before-free shutdown
//!
//! # Example
//!
//! ```rust
//! use signalbox::{SignalController, SignalState, TrafficSignal};
//!
//! let mut controller = SignalController::new().unwrap();
//!
//! controller.register_callback(|signal| {
//!     println!("state: {} pattern: {:?}", signal.state(), signal.light_pattern());
//! });
//!
//! // Requests return immediately and execute in submission order.
//! controller.request(SignalState::Closed);
//! controller.request(SignalState::Open);
//!
//! controller.shutdown().unwrap();
//! ```

pub mod controller;
pub mod light;
pub mod transition;

// Re-export commonly used types
pub use controller::{ControllerError, SignalController, SignalControllerBuilder, TrafficSignal};
pub use light::{Light, LightFactory, LightState, StandardLight};
pub use transition::{
    LightPattern, SignalState, TransitionPlan, TransitionStep, TransitionTimings, LIGHT_NAMES,
    SIGNAL_LIGHTS,
};
