//! Output devices ("lights") driven by the signal controller.
//!
//! A light is a single actuator holding one of a small closed set of states.
//! Lights have no concurrency of their own: the controller mutates them only
//! while holding its device lock, and snapshots them under the same lock.
//!
//! The [`Light`] trait is the seam for substituting alternative device
//! implementations (hardware shims, recording test doubles) without changing
//! the controller. A [`LightFactory`] passed at construction decides which
//! implementation backs each named position.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a single output device.
///
/// # Example
///
/// ```rust
/// use signalbox::light::LightState;
///
/// let state = LightState::Flashing;
/// assert_eq!(state.name(), "Flashing");
/// assert_eq!(state.to_string(), "Flashing");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum LightState {
    /// The light is dark.
    #[default]
    Off,
    /// The light is lit steadily.
    On,
    /// The light blinks on and off.
    Flashing,
}

impl LightState {
    /// Get the state's name for display/logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::On => "On",
            Self::Flashing => "Flashing",
        }
    }
}

impl fmt::Display for LightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single controllable output device.
///
/// Implementations must not synchronize internally; all thread-safety is the
/// controller's responsibility via its device lock.
///
/// # Example
///
/// ```rust
/// use signalbox::light::{Light, LightState, StandardLight};
///
/// let mut light = StandardLight::new();
/// assert_eq!(light.state(), LightState::Off);
///
/// light.set_state(LightState::On);
/// assert_eq!(light.state(), LightState::On);
/// ```
pub trait Light: Send {
    /// Read the current state. Pure; never blocks.
    fn state(&self) -> LightState;

    /// Overwrite the current state unconditionally.
    ///
    /// The state space is a closed enum, so no validation is required.
    fn set_state(&mut self, state: LightState);
}

/// Factory producing one boxed light per named position at construction time.
pub type LightFactory = Box<dyn Fn() -> Box<dyn Light> + Send + Sync>;

/// The default in-memory light.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct StandardLight {
    state: LightState,
}

impl StandardLight {
    /// Create a light in the `Off` state.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Light for StandardLight {
    fn state(&self) -> LightState {
        self.state
    }

    fn set_state(&mut self, state: LightState) {
        self.state = state;
    }
}
