//! Port definitions
//!
//! Interfaces implemented by the infrastructure (provider adapters, history
//! store) and presentation (progress) layers.

pub mod history;
pub mod progress;
pub mod provider;
