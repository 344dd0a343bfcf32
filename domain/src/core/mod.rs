//! Core domain concepts shared across all subdomains.
//!
//! - [`provider::ProviderId`]: the external LLM providers a prompt fans out to
//! - [`question::Question`]: a validated user prompt
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod provider;
pub mod question;
