//! Use cases
//!
//! - [`run_turn`]: one prompt fanned out to every provider, then synthesized
//! - [`chat_session`]: one in-flight turn per session, older turns superseded
//! - [`aggregator`]: the synthesis call with timeout and retry
//! - [`synthesize`]: synthesis over caller-supplied answers
//! - [`ask_provider`]: a single provider call

pub mod aggregator;
pub mod ask_provider;
pub mod chat_session;
pub mod run_turn;
pub mod synthesize;

#[cfg(test)]
pub(crate) mod test_support;
