//! Controller error types.

use thiserror::Error;

/// Errors that can occur over a controller's lifecycle.
///
/// Invalid transition requests are deliberately not errors: requesting a
/// transient waypoint or the already-current settled state is a silent no-op.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The transition worker thread could not be spawned.
    #[error("Failed to spawn transition worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),

    /// `shutdown` was called more than once; the worker was already joined.
    #[error("Controller already shut down; the transition worker was joined previously")]
    AlreadyShutdown,

    /// The transition worker panicked, typically because an observer callback
    /// panicked during pattern notification. Observer panics are not caught.
    #[error("Transition worker panicked before it could be joined cleanly")]
    WorkerPanicked,
}
