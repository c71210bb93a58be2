//! The oracle: turns a prediction request into a wealth destiny.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use super::career::{self, CareerEstimate};
use super::model::{Prediction, PredictionOutcome, PredictionRequest};
use super::probability;
use super::prompts::{self, ReasoningContext};
use super::ranking;
use super::reference::ReferenceData;
use super::university::{self, TierAssessment};
use super::PredictionService;
use crate::error::PredictionError;
use crate::llm::{CompletionRequest, LlmProvider};

/// Result of a connection check.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionReport {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub api_key_present: bool,
    pub timestamp: String,
}

/// LLM-backed predictor with static fallbacks at every step.
///
/// Without an LLM every step uses its fallback, so predictions still succeed.
pub struct Oracle {
    llm: Option<Arc<dyn LlmProvider>>,
    reference: Arc<ReferenceData>,
}

impl Oracle {
    pub fn new(llm: Option<Arc<dyn LlmProvider>>, reference: Arc<ReferenceData>) -> Self {
        Self { llm, reference }
    }

    pub fn reference(&self) -> &Arc<ReferenceData> {
        &self.reference
    }

    /// Startup connection check. Skipped when no LLM is configured; the
    /// outcome is only logged.
    pub async fn check_connection_at_startup(&self) -> Option<ConnectionReport> {
        self.llm.as_ref()?;
        let report = self.test_connection().await;
        if report.status == "success" {
            info!(
                model = report.model.as_deref().unwrap_or_default(),
                "LLM connection verified"
            );
        } else {
            error!(message = %report.message, "LLM connection check failed");
        }
        Some(report)
    }

    /// Run one prompt. Failures are logged and reported as `None`.
    async fn ask(&self, step: &str, prompt: String, max_tokens: u32, temperature: f32) -> Option<String> {
        let llm = self.llm.as_ref()?;
        let request = CompletionRequest::prompt(prompt)
            .with_max_tokens(max_tokens)
            .with_temperature(temperature);
        match llm.complete(request).await {
            Ok(resp) => Some(resp.content),
            Err(e) => {
                warn!(step, error = %e, "LLM call failed, falling back");
                None
            }
        }
    }

    pub async fn assess_university(&self, college: &str) -> TierAssessment {
        if let Some(found) = university::lookup(&self.reference.universities, college) {
            info!(college, tier = %found.tier, rank = found.rank, "University found in reference data");
            return found;
        }

        if let Some(reply) = self
            .ask("university", prompts::university_prompt(college), 100, 0.3)
            .await
        {
            if let Some(assessed) = university::parse_assessment(&reply) {
                info!(college, tier = %assessed.tier, score = assessed.rank, "University assessed by LLM");
                return assessed;
            }
            warn!(college, "Unreadable university assessment");
        }

        university::fallback_rating(college)
    }

    pub async fn estimate_career(&self, aspiration: &str, country: &str) -> CareerEstimate {
        let detailed = self
            .ask("career", prompts::career_prompt(aspiration, country), 200, 0.6)
            .await
            .and_then(|reply| career::parse_detailed(&reply));
        if let Some(raw) = detailed {
            return career::validate(aspiration, country, raw);
        }

        let simple = self
            .ask(
                "career_simple",
                prompts::simple_career_prompt(aspiration, country),
                80,
                0.5,
            )
            .await
            .and_then(|reply| career::parse_simple(&reply));
        if let Some(raw) = simple {
            return career::validate(aspiration, country, raw);
        }

        let estimate = career::fallback(aspiration, country);
        warn!(
            aspiration,
            country,
            lifetime = estimate.lifetime,
            "Using keyword career estimate"
        );
        estimate
    }

    pub async fn success_probability(
        &self,
        request: &PredictionRequest,
        tier: &TierAssessment,
    ) -> (f64, String) {
        let reading = self
            .ask(
                "probability",
                prompts::probability_prompt(request, &tier.tier, tier.rank),
                150,
                0.6,
            )
            .await
            .and_then(|reply| probability::parse(&reply));
        if let Some(reading) = reading {
            let reasoning = reading
                .reasoning
                .unwrap_or_else(|| prompts::parsed_probability_reasoning(request));
            return (reading.probability, reasoning);
        }

        let simple = self
            .ask(
                "probability_simple",
                prompts::simple_probability_prompt(request),
                20,
                0.3,
            )
            .await
            .and_then(|reply| probability::parse_simple(&reply));
        if let Some(p) = simple {
            return (p, prompts::simple_probability_reasoning(request));
        }

        let p = probability::fallback(&tier.tier, request.age);
        warn!(probability = p, tier = %tier.tier, "Using tier-based probability");
        (p, prompts::fallback_probability_reasoning(request))
    }

    async fn narrative(&self, ctx: ReasoningContext<'_>) -> String {
        match self
            .ask("reasoning", prompts::reasoning_prompt(&ctx), 200, 0.8)
            .await
        {
            Some(text) => text.trim().to_string(),
            None => prompts::fallback_narrative(ctx.request, ctx.base_reasoning),
        }
    }
}

#[async_trait]
impl PredictionService for Oracle {
    async fn predict(&self, request: PredictionRequest) -> Result<PredictionOutcome, PredictionError> {
        let request = request.validate_and_normalize()?;
        info!(name = %request.name, aspiration = %request.aspiration, "Processing destiny prediction");

        let tier = self.assess_university(&request.college).await;
        let estimate = self
            .estimate_career(&request.aspiration, &request.country)
            .await;
        let (probability, base_reasoning) = self.success_probability(&request, &tier).await;
        let reasoning = self
            .narrative(ReasoningContext {
                request: &request,
                tier: &tier.tier,
                lifetime: estimate.lifetime,
                ten_year: estimate.ten_year,
                probability,
                base_reasoning: &base_reasoning,
            })
            .await;

        let rank_band = ranking::rank_band(&self.reference.wealth, estimate.lifetime, &request.country);
        let oracle_confidence = ranking::oracle_confidence(probability).to_string();

        info!(
            lifetime = estimate.lifetime,
            ten_year = estimate.ten_year,
            probability,
            rank_band = %rank_band,
            "Destiny revealed"
        );

        Ok(PredictionOutcome {
            prediction: Prediction {
                predicted_lifetime_nw: estimate.lifetime,
                predicted_10_year_nw: estimate.ten_year,
                rank_band,
                reasoning,
                college_tier: Some(tier.tier),
                probability_score: probability,
                oracle_confidence,
            },
            college_rank: tier.rank,
            request,
        })
    }

    async fn test_connection(&self) -> ConnectionReport {
        let timestamp = Utc::now().to_rfc3339();
        let Some(llm) = &self.llm else {
            return ConnectionReport {
                status: "error",
                message: "❌ No LLM API key configured".to_string(),
                ai_response: None,
                model: None,
                api_key_present: false,
                timestamp,
            };
        };

        let request = CompletionRequest::prompt(prompts::CONNECTION_PROMPT)
            .with_max_tokens(50)
            .with_temperature(0.7);
        match llm.complete(request).await {
            Ok(resp) => ConnectionReport {
                status: "success",
                message: "✅ The Oracle's AI is connected and working!".to_string(),
                ai_response: Some(resp.content),
                model: Some(llm.model_name().to_string()),
                api_key_present: true,
                timestamp,
            },
            Err(e) => ConnectionReport {
                status: "error",
                message: format!("❌ AI connection failed: {e}"),
                ai_response: None,
                model: Some(llm.model_name().to_string()),
                api_key_present: true,
                timestamp,
            },
        }
    }
}
