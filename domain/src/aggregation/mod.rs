//! Response aggregation
//!
//! Collecting provider responses for a turn and deciding when synthesis
//! runs:
//!
//! - [`collector::ResponseCollector`] keeps one entry per provider
//! - [`trigger::SynthesisTrigger`] fires at most once per turn
//! - [`policy::TriggerPolicy`] decides what "enough responses" means
//! - [`fallback`] picks the degraded answer when synthesis is suppressed

pub mod collector;
pub mod fallback;
pub mod policy;
pub mod trigger;

pub use collector::{ResponseCollector, Snapshot};
pub use fallback::{fallback_answer, select_fallback};
pub use policy::{TriggerDecision, TriggerPolicy};
pub use trigger::{SynthesisTrigger, TriggerState, TriggerTransition};
