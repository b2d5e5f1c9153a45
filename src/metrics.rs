//! Prometheus metrics for jinsoul.
//!
//! - `jinsoul_command_runs_total{command}` - command bodies executed
//! - `jinsoul_command_duration_seconds{command}` - command latency histogram
//! - `jinsoul_command_denied_total{command, identifier}` - precondition denials
//! - `jinsoul_command_errors_total{command, error}` - failed command bodies
//! - `jinsoul_messages_total{outcome}` - inbound messages by dispatch outcome

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters
// ========================================================================

/// Command bodies executed, by command name.
pub static COMMAND_RUNS: OnceLock<IntCounterVec> = OnceLock::new();

/// Precondition denials by command and identifier.
pub static COMMAND_DENIED: OnceLock<IntCounterVec> = OnceLock::new();

/// Command errors by command and error kind.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Inbound messages by dispatch outcome.
pub static MESSAGES: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Histograms
// ========================================================================

/// Command latency by command name.
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            if $metric.get().is_none() {
                match $init {
                    Ok(m) => {
                        if let Err(e) = r.register(Box::new(m.clone())) {
                            tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                        }
                        let _ = $metric.set(m);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                    }
                }
            }
        };
    }

    register!(COMMAND_RUNS, IntCounterVec::new(Opts::new("jinsoul_command_runs_total", "Command bodies executed"), &["command"]));
    register!(COMMAND_DENIED, IntCounterVec::new(Opts::new("jinsoul_command_denied_total", "Precondition denials"), &["command", "identifier"]));
    register!(COMMAND_ERRORS, IntCounterVec::new(Opts::new("jinsoul_command_errors_total", "Command errors by kind"), &["command", "error"]));
    register!(MESSAGES, IntCounterVec::new(Opts::new("jinsoul_messages_total", "Inbound messages by dispatch outcome"), &["outcome"]));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("jinsoul_command_duration_seconds", "Command latency by name")
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["command"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Recording helpers
// ============================================================================

/// Record a command execution with latency.
#[inline]
pub fn record_command(command: &str, duration_secs: f64) {
    if let Some(c) = COMMAND_RUNS.get() {
        c.with_label_values(&[command]).inc();
    }
    if let Some(h) = COMMAND_LATENCY.get() {
        h.with_label_values(&[command]).observe(duration_secs);
    }
}

/// Record a precondition denial.
#[inline]
pub fn record_denial(command: &str, identifier: &str) {
    if let Some(c) = COMMAND_DENIED.get() {
        c.with_label_values(&[command, identifier]).inc();
    }
}

/// Record a command error.
#[inline]
pub fn record_command_error(command: &str, error: &str) {
    if let Some(c) = COMMAND_ERRORS.get() {
        c.with_label_values(&[command, error]).inc();
    }
}

/// Record where an inbound message left the pipeline.
#[inline]
pub fn record_outcome(outcome: &str) {
    if let Some(c) = MESSAGES.get() {
        c.with_label_values(&[outcome]).inc();
    }
}
