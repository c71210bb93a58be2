//! Prompt templates for the oracle's LLM calls.
//!
//! Each prompt pins a reply format that the matching parser understands.

use super::model::PredictionRequest;

/// Fixed prompt used by the connection check.
pub const CONNECTION_PROMPT: &str =
    "Respond with exactly: The Oracle is awake! Then give the current timestamp and a random number.";

/// Format a dollar amount with thousands separators and no cents.
pub fn format_usd(amount: f64) -> String {
    let whole = amount.round().abs() as u64;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if amount < 0.0 && whole > 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

pub fn university_prompt(college: &str) -> String {
    format!(
        "You are a strict university ranking expert. Be conservative and realistic.

University: {college}

Classification (most universities are B or C tier):
- S+ (top 0.1%, about 20 universities): Harvard, MIT, Stanford, Oxford, Cambridge, IIT Bombay
- S (top 1%): other Ivies, flagship public universities such as UC Berkeley or UCLA
- A+ (top 5%): strong regional leaders, top NITs, well known state universities
- A (top 15%): decent universities with some reputation
- B+ (top 30%): average universities
- B (top 60%): below average universities, most private colleges
- C (bottom 40%): local colleges, unknown institutions, community colleges

If you do not immediately recognise the university as world famous, it is probably B or C.

Reply in exactly this format:
TIER: [S+/S/A+/A/B+/B/C]
SCORE: [0-100, where 100 is Harvard, 85 a good state school, 60 average, 40 below average]"
    )
}

pub fn career_prompt(aspiration: &str, country: &str) -> String {
    format!(
        "You are an expert career analyst. Give realistic financial projections for a {aspiration} in {country}.

All amounts in USD (convert from local currency). Be realistic but optimistic and consider a
40-year career with investment growth.

Consider:
- current market demand and salary ranges
- career progression over 40 years
- savings and investment potential
- regional economic factors
- modern opportunities such as remote work, consulting and side businesses

Reply in exactly this format:
LIFETIME_NET_WORTH: [USD total wealth after a 40-year career]
TEN_YEAR_NET_WORTH: [USD net worth after 10 years]
CONFIDENCE_LEVEL: High/Medium/Low
REASONING: [one sentence]

Examples:
- Software Engineer in India: LIFETIME_NET_WORTH: 2500000, TEN_YEAR_NET_WORTH: 400000
- Doctor in USA: LIFETIME_NET_WORTH: 4500000, TEN_YEAR_NET_WORTH: 600000
- Teacher in India: LIFETIME_NET_WORTH: 800000, TEN_YEAR_NET_WORTH: 120000"
    )
}

pub fn simple_career_prompt(aspiration: &str, country: &str) -> String {
    format!(
        "Estimate realistic net worth for a {aspiration} in {country}, in USD.

Reply only with numbers:
Lifetime (40-year career): [USD number]
10-year mark: [USD number]

Example:
Lifetime: 1800000
10-year: 280000"
    )
}

pub fn probability_prompt(request: &PredictionRequest, tier: &str, rank: u32) -> String {
    let PredictionRequest {
        name,
        age,
        country,
        college,
        aspiration,
    } = request;
    format!(
        "You are an expert career counsellor. Assess how likely this person is to achieve their career goal.

Profile:
- Name: {name}
- Age: {age}
- Country: {country}
- University: {college} (tier {tier}, global rank ~{rank})
- Aspiration: {aspiration}

Weigh how well {college} prepares students for {aspiration}, market demand for {aspiration}
in {country}, and what being {age} means for their timing.

Reply in exactly this format:
PROBABILITY: [decimal between 0.1 and 0.95]
REASONING: [one sentence on their advantages and path to success]

Example:
PROBABILITY: 0.78
REASONING: A computer science foundation at IIT combined with India's booming tech sector sets you up well for software engineering."
    )
}

/// Inputs to the final narrative.
pub struct ReasoningContext<'a> {
    pub request: &'a PredictionRequest,
    pub tier: &'a str,
    pub lifetime: f64,
    pub ten_year: f64,
    pub probability: f64,
    pub base_reasoning: &'a str,
}

/// Short second-chance probability prompt.
pub fn simple_probability_prompt(request: &PredictionRequest) -> String {
    format!(
        "What's the success probability (0.1-0.9) for {} from {}? Just give a number.",
        request.aspiration, request.college
    )
}

pub fn reasoning_prompt(ctx: &ReasoningContext<'_>) -> String {
    let PredictionRequest {
        name,
        age,
        country,
        college,
        aspiration,
    } = ctx.request;
    format!(
        "You are a mystical Oracle revealing a person's financial destiny. Be inspiring but specific.

Destiny profile:
- Name: {name}
- Age: {age}
- Country: {country}
- University: {college} (tier {tier})
- Aspiration: {aspiration}
- Predicted lifetime net worth: {lifetime}
- Predicted 10-year net worth: {ten_year}
- Success probability: {probability:.1}%

Earlier analysis: {base}

Mention their university and how it connects to their aspiration, their age, the path from
their education to wealth, opportunities in {country} for {aspiration}, and two or three
practical recommendations.

Reply as a single paragraph in this shape:
Your {college} foundation in {country} [insight]. At {age}, [age-specific advantage]. The cosmic alignment shows [opportunity]. Your journey toward {aspiration} shall [prediction].",
        tier = ctx.tier,
        lifetime = format_usd(ctx.lifetime),
        ten_year = format_usd(ctx.ten_year),
        probability = ctx.probability * 100.0,
        base = ctx.base_reasoning,
    )
}

/// Reasoning used when the probability came from the tier table or the reply had none.
pub fn fallback_probability_reasoning(request: &PredictionRequest) -> String {
    format!(
        "Your foundation at {} combined with your {}-year-old perspective creates meaningful opportunities in {}.",
        request.college, request.age, request.aspiration
    )
}

/// Reasoning used when only a bare probability could be read from the reply.
pub fn parsed_probability_reasoning(request: &PredictionRequest) -> String {
    format!(
        "Based on your profile at {}, you have strong potential in {}.",
        request.college, request.aspiration
    )
}

/// Reasoning paired with the short-prompt probability.
pub fn simple_probability_reasoning(request: &PredictionRequest) -> String {
    format!(
        "Your educational foundation provides a solid pathway to success in {}.",
        request.aspiration
    )
}

/// Narrative used when the LLM could not produce one.
pub fn fallback_narrative(request: &PredictionRequest, base_reasoning: &str) -> String {
    format!(
        "Your foundation at {} combined with your {}-year perspective creates meaningful opportunities in {}. {}",
        request.college, request.age, request.aspiration, base_reasoning
    )
}
