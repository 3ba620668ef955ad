//! Router metrics.
//!
//! # Metrics
//! - `router_navigations_total` (counter): transitions by outcome
//!   (`committed`, `aborted`, `invalid`, `error`)
//! - `router_hook_outcomes_total` (counter): hook decisions by outcome
//!   (`proceed`, `abort`, `redirect`)
//! - `router_lazy_loads_total` (counter): lazy loads by result
//!   (`success`, `failure`)
//! - `router_fallbacks_total` (counter): fallback entries by reason
//!   (`init`, `unresolved_url`, `history_state`)
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; the embedding application
//!   installs whatever recorder it wants
//! - Without a recorder every call is a no-op

pub fn record_navigation(outcome: &'static str) {
    ::metrics::counter!("router_navigations_total", "outcome" => outcome).increment(1);
}

pub fn record_hook_outcome(outcome: &'static str) {
    ::metrics::counter!("router_hook_outcomes_total", "outcome" => outcome).increment(1);
}

pub fn record_lazy_load(result: &'static str) {
    ::metrics::counter!("router_lazy_loads_total", "result" => result).increment(1);
}

pub fn record_fallback(reason: &'static str) {
    ::metrics::counter!("router_fallbacks_total", "reason" => reason).increment(1);
}
