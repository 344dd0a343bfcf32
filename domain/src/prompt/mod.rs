//! Prompt domain
//!
//! Composition of the synthesis prompt from a question and collected answers.

pub mod request;
mod template;

pub use request::{SynthesisPrompt, SynthesisRequest};
pub use template::PromptTemplate;
