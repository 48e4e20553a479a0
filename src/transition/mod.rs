//! Signal states, light patterns, and timed transition plans.
//!
//! A transition plan is the full ordered sequence of (pattern, hold) steps
//! needed to reach a target settled state. Plans come from a fixed table
//! rather than a pathfinding algorithm: the state space is small and the
//! table is the safety-critical core, encoding that opposing settled states
//! are never bridged without clearing through a non-conflicting pattern.
//!
//! Plans are built fresh for every accepted request and never persisted.

use crate::light::LightState;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Number of lights every signal controller owns.
pub const SIGNAL_LIGHTS: usize = 3;

/// Names of the lights, in positional correspondence with [`LightPattern`].
pub const LIGHT_NAMES: [&str; SIGNAL_LIGHTS] = ["red", "amber", "green"];

/// Per-light states applied simultaneously at one transition step.
pub type LightPattern = [LightState; SIGNAL_LIGHTS];

/// State of the signal controller.
///
/// `Off`, `Open`, `Closed`, and `Warning` are settled states, intended to be
/// stable between transitions. `Opening` and `Closing` are transient markers
/// asserted only while a multi-step transition toward `Open`/`Closed` is in
/// flight; they are valid, observable reads but cannot be requested.
///
/// # Example
///
/// ```rust
/// use signalbox::transition::SignalState;
///
/// assert!(SignalState::Warning.is_settled());
/// assert!(SignalState::Closing.is_transient());
/// assert_eq!(SignalState::Closed.transient_marker(), Some(SignalState::Closing));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum SignalState {
    /// All lights dark.
    #[default]
    Off,
    /// Moving toward `Open`.
    Opening,
    /// Traffic may pass.
    Open,
    /// Moving toward `Closed`.
    Closing,
    /// Traffic must stop.
    Closed,
    /// Hazard indication, amber flashing.
    Warning,
}

impl SignalState {
    /// Get the state's name for display/logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Opening => "Opening",
            Self::Open => "Open",
            Self::Closing => "Closing",
            Self::Closed => "Closed",
            Self::Warning => "Warning",
        }
    }

    /// Check if this state is stable between transitions.
    ///
    /// Only settled states are externally requestable.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Off | Self::Open | Self::Closed | Self::Warning)
    }

    /// Check if this state is an in-flight waypoint.
    pub fn is_transient(&self) -> bool {
        !self.is_settled()
    }

    /// The transient marker asserted while moving toward this state, if any.
    pub fn transient_marker(&self) -> Option<SignalState> {
        match self {
            Self::Open => Some(Self::Opening),
            Self::Closed => Some(Self::Closing),
            _ => None,
        }
    }
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One step of a transition plan.
///
/// Each step carries the controller state asserted while the step's pattern
/// is held. Intermediate steps assert a transient marker; the final step
/// asserts the requested settled target.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TransitionStep {
    /// Controller state asserted for the duration of this step.
    pub state: SignalState,
    /// Light states applied simultaneously, one per named position.
    pub pattern: LightPattern,
    /// How long the pattern is held before the next step.
    pub hold: Duration,
}

/// Hold durations used when expanding transition plans.
///
/// The defaults reproduce the production table. Tests inject
/// millisecond-scale values so full transitions complete quickly.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TransitionTimings {
    /// Hold applied when a plan reaches a settled state.
    pub settle_hold: Duration,
    /// Hold applied to the amber clearance step on the way to `Closed`.
    pub clearance_hold: Duration,
}

impl Default for TransitionTimings {
    fn default() -> Self {
        Self {
            settle_hold: Duration::from_millis(3000),
            clearance_hold: Duration::from_millis(2000),
        }
    }
}

/// Ordered sequence of timed steps reaching a target settled state.
///
/// # Example
///
/// ```rust
/// use signalbox::light::LightState::{Off, On};
/// use signalbox::transition::{SignalState, TransitionPlan, TransitionTimings};
///
/// let timings = TransitionTimings::default();
/// let plan = TransitionPlan::for_target(SignalState::Closed, &timings).unwrap();
///
/// assert_eq!(plan.steps().len(), 2);
/// assert_eq!(plan.steps()[0].pattern, [Off, On, Off]);
/// assert_eq!(plan.steps()[1].pattern, [On, Off, Off]);
/// assert_eq!(plan.final_state(), SignalState::Closed);
///
/// // Transient waypoints have no plan of their own.
/// assert!(TransitionPlan::for_target(SignalState::Closing, &timings).is_none());
/// ```
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TransitionPlan {
    target: SignalState,
    steps: Vec<TransitionStep>,
}

impl TransitionPlan {
    /// Expand a settled target state into its plan.
    ///
    /// Returns `None` for transient targets (`Opening`/`Closing`), which are
    /// internal waypoints and never reachable on request.
    pub fn for_target(target: SignalState, timings: &TransitionTimings) -> Option<Self> {
        use LightState::{Flashing, Off, On};

        let steps = match target {
            SignalState::Open => vec![TransitionStep {
                state: SignalState::Open,
                pattern: [Off, Off, On],
                hold: timings.settle_hold,
            }],
            SignalState::Closed => vec![
                // Amber clearance first; never jump between conflicting
                // permissive patterns.
                TransitionStep {
                    state: SignalState::Closing,
                    pattern: [Off, On, Off],
                    hold: timings.clearance_hold,
                },
                TransitionStep {
                    state: SignalState::Closed,
                    pattern: [On, Off, Off],
                    hold: timings.settle_hold,
                },
            ],
            SignalState::Warning => vec![TransitionStep {
                state: SignalState::Warning,
                pattern: [Off, Flashing, Off],
                hold: timings.settle_hold,
            }],
            SignalState::Off => vec![TransitionStep {
                state: SignalState::Off,
                pattern: [Off, Off, Off],
                hold: timings.settle_hold,
            }],
            SignalState::Opening | SignalState::Closing => return None,
        };

        Some(Self { target, steps })
    }

    /// The settled state this plan was built for.
    pub fn target(&self) -> SignalState {
        self.target
    }

    /// The ordered steps of the plan.
    pub fn steps(&self) -> &[TransitionStep] {
        &self.steps
    }

    /// The state asserted by the last step.
    ///
    /// Always equals the requested target: a completed plan collapses
    /// `Opening` to `Open` and `Closing` to `Closed`.
    pub fn final_state(&self) -> SignalState {
        self.steps
            .last()
            .map(|step| step.state)
            .unwrap_or(self.target)
    }

    /// The pattern left on the lights once the plan completes.
    pub fn final_pattern(&self) -> LightPattern {
        self.steps
            .last()
            .map(|step| step.pattern)
            .unwrap_or([LightState::Off; SIGNAL_LIGHTS])
    }
}
