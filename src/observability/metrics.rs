//! Prometheus metrics for the game loop.
//!
//! Labels are drawn from closed sets (phase names, rejection kinds, the
//! debug flag) so no host-controlled string ever becomes a label value.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::engine::phase::GamePhase;
use crate::error::RedlightError;

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

const ALL_PHASES: [GamePhase; 4] = [
    GamePhase::Idle,
    GamePhase::Green,
    GamePhase::RedWarning,
    GamePhase::RedArmed,
];

/// Initializes the global metrics recorder.
///
/// With `Some(port)` a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`; with `None` the recorder is installed without an
/// endpoint.
///
/// # Errors
///
/// Returns `RedlightError::Io` if the recorder or listener cannot be
/// installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), RedlightError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| RedlightError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

fn describe_metrics() {
    describe_counter!(
        "redlight_phase_transitions_total",
        "Total number of phase transitions by phase entered"
    );
    describe_gauge!("redlight_current_phase", "Current game phase (1 = active)");
    describe_counter!("redlight_sampling_ticks_total", "Ticks sampled while armed");
    describe_histogram!(
        "redlight_sampling_duration_ms",
        "Time spent sampling one tick in milliseconds"
    );
    describe_gauge!(
        "redlight_monitored_entities",
        "Entities observed on the last sampled tick"
    );
    describe_counter!(
        "redlight_movement_detections_total",
        "Entities classified as moving, by outcome"
    );
    describe_counter!(
        "redlight_eliminations_total",
        "Elimination sequences executed"
    );
    describe_counter!(
        "redlight_rejected_commands_total",
        "Administrative commands rejected, by reason"
    );
}

/// Records entry into `phase`.
pub fn record_phase_transition(phase: GamePhase) {
    counter!("redlight_phase_transitions_total", "phase" => phase.as_str()).increment(1);
}

/// Sets the current-phase gauge, zeroing every other phase label.
pub fn set_current_phase(phase: GamePhase) {
    for candidate in ALL_PHASES {
        let value = if candidate == phase { 1.0 } else { 0.0 };
        gauge!("redlight_current_phase", "phase" => candidate.as_str()).set(value);
    }
}

/// Records one sampled tick and the number of entities it observed.
#[allow(clippy::cast_precision_loss)]
pub fn record_sampling_tick(entities: usize, duration: Duration) {
    counter!("redlight_sampling_ticks_total").increment(1);
    gauge!("redlight_monitored_entities").set(entities as f64);
    histogram!("redlight_sampling_duration_ms").record(duration.as_secs_f64() * 1000.0);
}

/// Records a movement detection.
pub fn record_detection(in_region: bool, cooling_down: bool, violation: bool) {
    let outcome = if violation {
        "violation"
    } else if !in_region {
        "outside_region"
    } else if cooling_down {
        "cooling_down"
    } else {
        "exempt"
    };
    counter!("redlight_movement_detections_total", "outcome" => outcome).increment(1);
}

/// Records an executed elimination sequence.
pub fn record_elimination(debug: bool) {
    let label = if debug { "true" } else { "false" };
    counter!("redlight_eliminations_total", "debug" => label).increment(1);
}

/// Records a rejected administrative command by error kind.
pub fn record_rejected_command(kind: &'static str) {
    counter!("redlight_rejected_commands_total", "reason" => kind).increment(1);
}
