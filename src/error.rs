//! Error types for the Destiny Engine.

use crate::questionnaire::{Operation, QuestionId, SessionPhase};

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to load reference data from {path}: {reason}")]
    ReferenceData { path: String, reason: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited")]
    RateLimited { provider: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("No API key configured for provider {provider}")]
    NotConfigured { provider: String },
}

/// Questionnaire errors.
///
/// Validation failures on user input are *not* errors: they are recorded on
/// the session as `last_error`. Everything here is a contract violation by
/// the caller or a malformed question set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuestionnaireError {
    #[error("Cannot {operation} while questionnaire is {phase}")]
    InvalidTransition {
        operation: Operation,
        phase: SessionPhase,
    },

    #[error("Question set must contain at least one question")]
    EmptyQuestionSet,

    #[error("Question {0} appears more than once")]
    DuplicateQuestion(QuestionId),

    #[error("Choice question {0} has no choices")]
    MissingChoices(QuestionId),

    #[error("Question {id} has an empty range: min {min} > max {max}")]
    EmptyRange { id: QuestionId, min: i64, max: i64 },

    #[error("Completed answers are missing {0}")]
    MissingAnswer(QuestionId),
}

/// Prediction service errors.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("The Oracle requires valid inputs: {0}")]
    InvalidInput(String),

    #[error("Questionnaire error: {0}")]
    Questionnaire(#[from] QuestionnaireError),
}
