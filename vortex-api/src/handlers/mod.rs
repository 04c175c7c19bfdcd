//! API Handlers
//!
//! - [`ajax`]: nonce-gated marketplace actions with the `{success, data}` envelope
//! - [`saas`]: API-key gated SaaS backend endpoints
//! - [`ops`]: health probe, nonce issuing, Prometheus scrape

pub mod ajax;
pub mod ops;
pub mod saas;

pub use ajax::{admin_ajax, ajax_action, AjaxAction};
pub use ops::{healthz, issue_nonce, prometheus_metrics};
pub use saas::{
    analytics, asset_prediction, compute, health, market_predictions, thorius_trends,
    thorius_user_behavior,
};
