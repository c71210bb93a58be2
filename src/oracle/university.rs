//! University tier assessment.
//!
//! Reference lookup first (exact, then fuzzy), then the LLM, then a static
//! keyword table.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::reference::UniversityRecord;

/// Rank used when a reference row has neither a QS nor a NIRF rank.
pub const UNRANKED: u32 = 300;

/// Fuzzy scores must beat this to count as a match.
const FUZZY_THRESHOLD: f64 = 0.3;

/// LLM-reported scores are capped here.
const MAX_LLM_SCORE: u32 = 95;

const CAMPUS_KEYWORDS: [&str; 5] = ["iit", "nit", "iisc", "iim", "bits"];

const ELITE: [&str; 12] = [
    "harvard", "mit", "stanford", "yale", "princeton", "oxford", "cambridge",
    "iit bombay", "iit delhi", "iit madras", "iit kanpur", "iit kharagpur",
];

const TOP: [&str; 16] = [
    "columbia", "brown", "cornell", "dartmouth", "upenn", "berkeley", "ucla",
    "university of chicago", "northwestern", "duke", "johns hopkins",
    "iit roorkee", "iit guwahati", "iisc bangalore", "iim ahmedabad", "iim bangalore",
];

const GOOD: [&str; 10] = [
    "university of michigan", "georgia tech", "carnegie mellon", "virginia tech",
    "nit trichy", "nit warangal", "nit surathkal", "bits pilani", "dtu", "nsit",
];

const VALID_TIERS: [&str; 7] = ["S+", "S", "A+", "A", "B+", "B", "C"];

static TIER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"TIER:\s*([A-Z+]+)").expect("valid regex"));
static SCORE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"SCORE:\s*(\d+)").expect("valid regex"));
static TIER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(S\+|A\+|B\+|S|A|B|C)(?:\s|$|[^\w+])").expect("valid regex"));

/// Tier and rank for a college.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierAssessment {
    pub tier: String,
    /// Reference rank for table matches; a 0-100 score otherwise.
    pub rank: u32,
}

impl TierAssessment {
    fn new(tier: &str, rank: u32) -> Self {
        Self {
            tier: tier.to_string(),
            rank,
        }
    }
}

fn from_record(record: &UniversityRecord) -> TierAssessment {
    TierAssessment {
        tier: record.tier.clone().unwrap_or_else(|| "A".to_string()),
        rank: record.qs_rank.or(record.nirf_rank).unwrap_or(UNRANKED),
    }
}

/// Look a college up in the reference table.
pub fn lookup(records: &[UniversityRecord], college: &str) -> Option<TierAssessment> {
    let needle = college.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    if let Some(record) = records
        .iter()
        .find(|r| r.university_name.trim().to_lowercase() == needle)
    {
        return Some(from_record(record));
    }

    let mut best: Option<(&UniversityRecord, f64)> = None;
    for record in records {
        let score = fuzzy_score(&needle, &record.university_name.trim().to_lowercase());
        if score > best.map_or(0.0, |(_, s)| s) {
            best = Some((record, score));
        }
    }
    best.filter(|(_, score)| *score > FUZZY_THRESHOLD)
        .map(|(record, _)| from_record(record))
}

/// Similarity between a lower-cased query and a lower-cased reference name.
///
/// The last rule that fires wins, so a matching campus keyword beats plain
/// containment.
pub fn fuzzy_score(query: &str, name: &str) -> f64 {
    let mut score = 0.0;

    if name.contains(query) {
        score = 0.9;
    } else if query.contains(name) {
        score = 0.8;
    }

    let query_words: HashSet<&str> = query.split_whitespace().collect();
    let name_words: HashSet<&str> = name.split_whitespace().collect();
    let common = query_words.intersection(&name_words).count();
    if common > 0 {
        let ratio = common as f64 / query_words.len().max(name_words.len()) as f64;
        if ratio > FUZZY_THRESHOLD {
            score = f64::max(score, ratio);
        }
    }

    for keyword in CAMPUS_KEYWORDS {
        if !(query.contains(keyword) && name.contains(keyword)) {
            continue;
        }
        let campus = query.replace(keyword, "");
        let campus_matches = campus
            .split_whitespace()
            .filter(|part| part.chars().count() > 2)
            .any(|part| name_words.contains(part));
        if campus_matches {
            score = 0.95;
        }
    }

    score
}

/// Parse a `TIER:`/`SCORE:` reply, falling back to a bare tier token.
pub fn parse_assessment(response: &str) -> Option<TierAssessment> {
    let tier = TIER_LINE
        .captures(response)
        .map(|c| c[1].to_string())
        .filter(|t| VALID_TIERS.contains(&t.as_str()));
    let score = SCORE_LINE
        .captures(response)
        .and_then(|c| c[1].parse::<u32>().ok());

    match (tier, score) {
        (Some(tier), Some(score)) => Some(TierAssessment {
            tier,
            rank: score.min(MAX_LLM_SCORE),
        }),
        (Some(tier), None) => Some(TierAssessment::new(&tier, default_score(&tier))),
        (None, _) => TIER_TOKEN
            .captures(response)
            .map(|c| TierAssessment::new(&c[1], default_score(&c[1]))),
    }
}

fn default_score(tier: &str) -> u32 {
    match tier {
        "S+" => 95,
        "S" => 88,
        "A+" => 78,
        "A" => 68,
        "B+" => 58,
        "B" => 48,
        _ => 35,
    }
}

/// Conservative keyword rating used when nothing else answered.
pub fn fallback_rating(college: &str) -> TierAssessment {
    let name = college.trim().to_lowercase();
    let has = |list: &[&str]| list.iter().any(|k| name.contains(k));

    if has(&ELITE) {
        TierAssessment::new("S+", 92)
    } else if has(&TOP) {
        TierAssessment::new("S", 85)
    } else if has(&GOOD) {
        TierAssessment::new("A+", 75)
    } else if has(&["institute", "college", "university"]) {
        TierAssessment::new("B", 45)
    } else {
        TierAssessment::new("C", 35)
    }
}
