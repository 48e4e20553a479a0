//! Traffic signal walkthrough with a monitor callback.
//!
//! Registers an observer that prints every pattern change, then requests a
//! sequence of settled states and lets the worker drive the transitions.
//!
//! Run with: cargo run --example monitor

use signalbox::{SignalController, SignalState, TrafficSignal};
use std::thread;
use std::time::Duration;

fn monitor(signal: &dyn TrafficSignal) {
    let names = signal.light_names();
    let pattern = signal.light_pattern();
    let lights: Vec<String> = names
        .iter()
        .zip(pattern)
        .map(|(name, state)| format!("{name}: {state}"))
        .collect();
    println!("State: {} ({})", signal.state(), lights.join(", "));
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signalbox=debug".into()),
        )
        .init();

    println!("=== Traffic Signal Monitor ===\n");

    let mut controller = SignalController::new().expect("failed to start controller");
    controller.register_callback(monitor);

    for target in [
        SignalState::Closed,
        SignalState::Open,
        SignalState::Closed,
        SignalState::Warning,
        SignalState::Off,
    ] {
        println!("requesting {target}");
        controller.request(target);
    }

    // Requests return immediately; wait for the worker to drain the queue.
    while controller.in_transition() {
        thread::sleep(Duration::from_millis(100));
    }

    controller.shutdown().expect("clean shutdown");
    println!("\n=== Done ===");
}
