//! Destiny Engine: a crystal-ball questionnaire that predicts wealth destinies.

pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod oracle;
pub mod questionnaire;
pub mod store;
