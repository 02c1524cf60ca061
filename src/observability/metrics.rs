//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rescue_endpoint_rotations_total` (counter): rotations of the RPC pool
//! - `rescue_active_endpoint` (gauge): index of the bound endpoint
//! - `rescue_fee_quotes_total` (counter): quotes by tier (`precise`, `fallback`)
//! - `rescue_attempts_total` (counter): attempts by outcome label
//! - `rescue_legs_total` (counter): critical-leg settlements by leg and status
//!
//! # Design Decisions
//! - Recorders are free functions; with no exporter installed they are no-ops
//! - Exporter is opt-in through `observability.metrics_enabled`

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter with its own HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_rotation(index: usize) {
    ::metrics::counter!("rescue_endpoint_rotations_total").increment(1);
    ::metrics::gauge!("rescue_active_endpoint").set(index as f64);
}

pub fn record_fee_tier(tier: &'static str) {
    ::metrics::counter!("rescue_fee_quotes_total", "tier" => tier).increment(1);
}

pub fn record_attempt(outcome: &'static str) {
    ::metrics::counter!("rescue_attempts_total", "outcome" => outcome).increment(1);
}

pub fn record_leg(leg: &'static str, status: &'static str) {
    ::metrics::counter!("rescue_legs_total", "leg" => leg, "status" => status).increment(1);
}
