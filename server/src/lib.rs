//! Booking backend for the consultancy site.
//!
//! Hosts the signed booking webhook, the booking-record REST API, the
//! locale catalog, and a health probe.

pub mod config;
pub mod http;
pub mod i18n;
pub mod store;
pub mod types;
pub mod verification;

pub use config::Config;
pub use http::{create_router, AppState};
