//! Prediction request and result types.

use serde::{Deserialize, Serialize};

use crate::error::PredictionError;

/// Who is asking, and what they want to become.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub name: String,
    pub age: u32,
    pub country: String,
    pub college: String,
    pub aspiration: String,
}

impl PredictionRequest {
    /// Check bounds and tidy the free-text fields.
    ///
    /// Name and aspiration are title-cased; every text field is trimmed.
    pub fn validate_and_normalize(self) -> Result<Self, PredictionError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(invalid("Name cannot be empty"));
        }
        check_len("name", name, 1, 50)?;

        if !(16..=80).contains(&self.age) {
            return Err(invalid(format!(
                "age must be between 16 and 80, got {}",
                self.age
            )));
        }

        let country = self.country.trim();
        check_len("country", country, 2, 50)?;
        let college = self.college.trim();
        check_len("college", college, 2, 100)?;
        let aspiration = self.aspiration.trim();
        check_len("aspiration", aspiration, 2, 100)?;

        Ok(Self {
            name: title_case(name),
            age: self.age,
            country: country.to_string(),
            college: college.to_string(),
            aspiration: title_case(aspiration),
        })
    }
}

fn invalid(message: impl Into<String>) -> PredictionError {
    PredictionError::InvalidInput(message.into())
}

fn check_len(field: &str, value: &str, min: usize, max: usize) -> Result<(), PredictionError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(invalid(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// The oracle's answer, as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted_lifetime_nw: f64,
    pub predicted_10_year_nw: f64,
    pub rank_band: String,
    pub reasoning: String,
    pub college_tier: Option<String>,
    pub probability_score: f64,
    pub oracle_confidence: String,
}

/// A prediction plus the context needed to persist it.
#[derive(Debug, Clone)]
pub struct PredictionOutcome {
    /// Normalised request the prediction was computed for.
    pub request: PredictionRequest,
    pub prediction: Prediction,
    /// Reference rank, or the tier score when the tier came from the LLM or the static table.
    pub college_rank: u32,
}
