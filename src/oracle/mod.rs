//! The oracle: wealth destiny predictions.
//!
//! Each step of a prediction tries the LLM first and degrades to a static
//! table when the LLM is missing, fails, or answers in an unreadable shape:
//!
//! 1. university tier (reference data → LLM → keyword table)
//! 2. career wealth estimate (detailed prompt → short prompt → keyword table)
//! 3. success probability (LLM → tier table adjusted for age)
//! 4. narrative reasoning (LLM → template)
//! 5. rank band and confidence phrase (always static)

pub mod career;
pub mod model;
pub mod probability;
pub mod prompts;
pub mod ranking;
pub mod reference;
pub mod service;
pub mod university;

pub use model::{Prediction, PredictionOutcome, PredictionRequest};
pub use reference::ReferenceData;
pub use service::{ConnectionReport, Oracle};

use async_trait::async_trait;

use crate::error::PredictionError;

/// Something that can foretell a destiny.
#[async_trait]
pub trait PredictionService: Send + Sync {
    /// Validate, normalise and predict.
    async fn predict(&self, request: PredictionRequest)
    -> Result<PredictionOutcome, PredictionError>;

    /// Send a fixed prompt to the underlying LLM.
    async fn test_connection(&self) -> ConnectionReport;
}
