//! `PredictionStore` trait: the analytics sink for served predictions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::oracle::PredictionOutcome;

/// Where a prediction request came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: String,
    pub user_agent: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            ip_address: "unknown".to_string(),
            user_agent: "unknown".to_string(),
        }
    }
}

/// One served prediction, flattened for storage.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub age: u32,
    pub university: String,
    pub aspiration: String,
    pub country: String,
    pub predicted_lifetime_nw: f64,
    pub predicted_10_year_nw: f64,
    pub rank_band: String,
    pub college_tier: Option<String>,
    pub college_rank: u32,
    pub success_probability: f64,
    pub oracle_confidence: String,
    pub reasoning: String,
    /// `"{ip}_{name}_{age}"`.
    pub session_id: String,
    pub ip_address: String,
    pub user_agent: String,
}

impl PredictionRecord {
    pub fn new(outcome: &PredictionOutcome, client: &ClientInfo) -> Self {
        let req = &outcome.request;
        let p = &outcome.prediction;
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            name: req.name.clone(),
            age: req.age,
            university: req.college.clone(),
            aspiration: req.aspiration.clone(),
            country: req.country.clone(),
            predicted_lifetime_nw: p.predicted_lifetime_nw,
            predicted_10_year_nw: p.predicted_10_year_nw,
            rank_band: p.rank_band.clone(),
            college_tier: p.college_tier.clone(),
            college_rank: outcome.college_rank,
            success_probability: p.probability_score,
            oracle_confidence: p.oracle_confidence.clone(),
            reasoning: p.reasoning.clone(),
            session_id: format!("{}_{}_{}", client.ip_address, req.name, req.age),
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
        }
    }
}

/// A value and how many predictions carried it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountStat {
    pub value: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryStat {
    pub country: String,
    pub avg_lifetime: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionStats {
    pub total_predictions: u64,
    pub top_aspirations: Vec<CountStat>,
    pub top_universities: Vec<CountStat>,
    pub country_stats: Vec<CountryStat>,
    pub last_updated: DateTime<Utc>,
}

/// Public summary of a past prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentPrediction {
    pub id: Uuid,
    pub name: String,
    pub aspiration: String,
    pub university: String,
    pub predicted_lifetime_nw: f64,
    pub rank_band: String,
    pub timestamp: DateTime<Utc>,
}

#[async_trait]
pub trait PredictionStore: Send + Sync {
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    /// Persist a prediction, returning its id.
    async fn save_prediction(&self, record: &PredictionRecord) -> Result<Uuid, DatabaseError>;

    /// Totals, top 10 aspirations and universities, and per-country averages.
    async fn prediction_stats(&self) -> Result<PredictionStats, DatabaseError>;

    /// Newest first.
    async fn recent_predictions(&self, limit: usize) -> Result<Vec<RecentPrediction>, DatabaseError>;
}
