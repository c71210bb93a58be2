//! Success probability: LLM reply parsing and the tier-based fallback.

use std::sync::LazyLock;

use regex::Regex;

pub const MIN_PROBABILITY: f64 = 0.1;
pub const MAX_PROBABILITY: f64 = 0.95;

const UNKNOWN_TIER_PROBABILITY: f64 = 0.4;
const AGE_ADJUSTMENT: f64 = 0.05;

static PROBABILITY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"PROBABILITY:\s*([\d.]+)").expect("valid regex"));
static REASONING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)REASONING:\s*(.+)").expect("valid regex"));
static ANY_DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"0\.\d+|\d+\.\d+").expect("valid regex"));
static FRACTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"0\.\d+").expect("valid regex"));

pub fn clamp(p: f64) -> f64 {
    p.clamp(MIN_PROBABILITY, MAX_PROBABILITY)
}

/// A parsed probability and, when the reply carried one, its reasoning.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityReading {
    pub probability: f64,
    pub reasoning: Option<String>,
}

/// Parse `PROBABILITY:`/`REASONING:`; otherwise take the first decimal in the reply.
pub fn parse(response: &str) -> Option<ProbabilityReading> {
    let labelled = PROBABILITY_LINE
        .captures(response)
        .and_then(|c| c[1].parse::<f64>().ok());
    let reasoning = REASONING_LINE
        .captures(response)
        .map(|c| c[1].trim().to_string())
        .filter(|r| !r.is_empty());

    if let (Some(p), Some(reasoning)) = (labelled, reasoning) {
        return Some(ProbabilityReading {
            probability: clamp(p),
            reasoning: Some(reasoning),
        });
    }

    ANY_DECIMAL
        .find(response)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(|p| ProbabilityReading {
            probability: clamp(p),
            reasoning: None,
        })
}

/// Read the bare `0.x` figure a short prompt asks for.
pub fn parse_simple(response: &str) -> Option<f64> {
    FRACTION
        .find(response)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(clamp)
}

/// Probability from college tier, nudged by age.
pub fn fallback(tier: &str, age: u32) -> f64 {
    let base = match tier {
        "S+" => 0.85,
        "S" => 0.75,
        "A+" => 0.65,
        "A" => 0.55,
        "B+" => 0.45,
        "B" => 0.35,
        "C" => 0.25,
        _ => UNKNOWN_TIER_PROBABILITY,
    };
    let adjusted = if age <= 22 {
        base + AGE_ADJUSTMENT
    } else if age >= 30 {
        base - AGE_ADJUSTMENT
    } else {
        base
    };
    clamp(adjusted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn parses_labelled_reply() {
        let reading = parse("PROBABILITY: 0.78\nREASONING: Strong fit.\nMore detail.").unwrap();
        assert!(approx(reading.probability, 0.78));
        assert_eq!(reading.reasoning.as_deref(), Some("Strong fit.\nMore detail."));
    }

    #[test]
    fn clamps_out_of_range() {
        let reading = parse("PROBABILITY: 1.7\nREASONING: Sure thing.").unwrap();
        assert!(approx(reading.probability, MAX_PROBABILITY));
        let reading = parse("PROBABILITY: 0.01\nREASONING: Unlikely.").unwrap();
        assert!(approx(reading.probability, MIN_PROBABILITY));
    }

    #[test]
    fn loose_decimal_has_no_reasoning() {
        let reading = parse("I'd say about 0.62 overall").unwrap();
        assert!(approx(reading.probability, 0.62));
        assert!(reading.reasoning.is_none());
        assert!(parse("no numbers at all").is_none());
    }

    #[test]
    fn tier_fallback_with_age() {
        assert!(approx(fallback("S+", 21), 0.9));
        assert!(approx(fallback("S+", 25), 0.85));
        assert!(approx(fallback("C", 35), 0.2));
        assert!(approx(fallback("Z", 25), 0.4));
        assert!(approx(fallback("A", 30), 0.5));
    }

    #[test]
    fn simple_reply_takes_first_fraction() {
        assert_eq!(parse_simple("About 0.62, maybe 0.7"), Some(0.62));
        assert_eq!(parse_simple("0.99"), Some(MAX_PROBABILITY));
        assert_eq!(parse_simple("Roughly 62%"), None);
    }
}
