//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`TurnParams`]: which providers a turn dispatches to, its trigger policy and timeouts
//! - [`SynthesisOptions`]: sampling, timeout and retry settings for the aggregator call

pub mod synthesis_options;
pub mod turn_params;

pub use synthesis_options::SynthesisOptions;
pub use turn_params::TurnParams;
