//! Metrics collection.
//!
//! # Metrics
//! - `gadget_io_requests_total` (counter): dispatches by path
//!   (`preload`, `proxied_get`, `proxied_post`, `direct`)
//! - `gadget_io_responses_total` (counter): completions by outcome
//!   (`ok`, `error`, `dropped`)

pub fn record_request(path: &'static str) {
    ::metrics::counter!("gadget_io_requests_total", "path" => path).increment(1);
}

pub fn record_response(outcome: &'static str) {
    ::metrics::counter!("gadget_io_responses_total", "outcome" => outcome).increment(1);
}
