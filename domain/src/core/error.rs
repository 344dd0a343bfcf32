//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Invalid trigger policy: {0}")]
    InvalidPolicy(String),

    #[error("Turn {0} is sealed and no longer accepts updates")]
    TurnSealed(String),

    #[error("Turn {0} already has a final answer")]
    AnswerAlreadySet(String),

    #[error("Invalid turn transition: {0}")]
    InvalidTransition(String),
}

impl DomainError {
    /// Check if this error is caused by invalid user input
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidQuestion(_) | DomainError::InvalidPolicy(_)
        )
    }
}
