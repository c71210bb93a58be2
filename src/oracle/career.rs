//! Career wealth estimation: parsing LLM figures and keeping them sane.

use std::sync::LazyLock;

use regex::Regex;

const LIFETIME_FLOOR: f64 = 50_000.0;
const TEN_YEAR_FLOOR: f64 = 10_000.0;

/// Ten-year figures above this share of lifetime are considered implausible...
const TEN_YEAR_MAX_SHARE: f64 = 0.7;
/// ...and get reset to this share.
const TEN_YEAR_RESET_SHARE: f64 = 0.4;

/// Multiplier applied to countries missing from the table.
const UNKNOWN_COUNTRY_MULTIPLIER: f64 = 0.5;

const COUNTRY_MULTIPLIERS: &[(&[&str], f64)] = &[
    (&["usa", "united states", "america"], 1.0),
    (&["canada", "australia", "uk", "united kingdom", "singapore"], 0.9),
    (&["germany", "france", "japan"], 0.8),
    (&["india"], 0.6),
    (&["china"], 0.5),
    (&["brazil", "mexico"], 0.4),
    (&["nigeria", "bangladesh", "pakistan"], 0.3),
];

/// Multipliers used by the static fallback, which has no low-income row.
const FALLBACK_COUNTRY_MULTIPLIERS: &[(&[&str], f64)] = &[
    (&["usa", "united states", "america"], 1.0),
    (&["canada", "australia", "uk", "united kingdom", "singapore"], 0.9),
    (&["germany", "france", "japan"], 0.8),
    (&["india"], 0.6),
    (&["china"], 0.5),
    (&["brazil", "mexico"], 0.4),
];

/// Upper bounds (lifetime, ten-year) per career category, before the country multiplier.
const CATEGORY_CAPS: &[(&[&str], f64, f64)] = &[
    (
        &["farm", "agriculture", "labor", "clean", "driver", "security", "retail"],
        600_000.0,
        120_000.0,
    ),
    (
        &["teacher", "nurse", "police", "clerk", "assistant"],
        1_200_000.0,
        200_000.0,
    ),
    (
        &["engineer", "accountant", "manager", "analyst", "designer"],
        3_000_000.0,
        500_000.0,
    ),
    (
        &["doctor", "lawyer", "software", "consultant", "finance"],
        5_000_000.0,
        800_000.0,
    ),
    (
        &["entrepreneur", "business", "startup", "ceo"],
        8_000_000.0,
        1_200_000.0,
    ),
];
const DEFAULT_CAPS: (f64, f64) = (2_500_000.0, 400_000.0);

/// Base figures (lifetime, ten-year) used when no LLM estimate is available.
const FALLBACK_ESTIMATES: &[(&[&str], f64, f64)] = &[
    (
        &["ai scientist", "ai engineer", "artificial intelligence", "openai"],
        3_500_000.0,
        500_000.0,
    ),
    (
        &["data scientist", "machine learning", "ml engineer", "ai researcher"],
        2_800_000.0,
        420_000.0,
    ),
    (
        &["research scientist", "computer scientist"],
        3_000_000.0,
        450_000.0,
    ),
    (
        &["software", "programmer", "developer", "tech"],
        2_200_000.0,
        380_000.0,
    ),
    (&["engineer", "technical"], 2_000_000.0, 350_000.0),
    (&["doctor", "physician"], 3_200_000.0, 500_000.0),
    (&["lawyer", "attorney"], 2_800_000.0, 450_000.0),
    (&["finance", "investment"], 2_500_000.0, 420_000.0),
    (&["consultant", "consulting"], 2_300_000.0, 400_000.0),
    (&["teacher", "education"], 900_000.0, 150_000.0),
    (&["nurse", "healthcare"], 1_100_000.0, 180_000.0),
    (&["business", "entrepreneur"], 1_500_000.0, 250_000.0),
    (&["farm", "agriculture"], 500_000.0, 80_000.0),
];
const DEFAULT_FALLBACK: (f64, f64) = (1_200_000.0, 200_000.0);

/// Comma-grouped or plain digit run.
const AMOUNT: &str = r"(\d{1,3}(?:,\d{3})+|\d+)";

fn patterns(templates: &[&str]) -> Vec<Regex> {
    templates
        .iter()
        .map(|t| Regex::new(&format!("(?i){}", t.replace("{amount}", AMOUNT))).expect("valid regex"))
        .collect()
}

static LIFETIME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    patterns(&[
        r"LIFETIME_NET_WORTH:\s*\$?{amount}",
        r"LIFETIME[_\s]*NET[_\s]*WORTH:\s*\$?{amount}",
        r"Lifetime.*?{amount}",
        r"Total.*?{amount}",
    ])
});

static TEN_YEAR_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    patterns(&[
        r"TEN_YEAR_NET_WORTH:\s*\$?{amount}",
        r"TEN[_\s]*YEAR[_\s]*NET[_\s]*WORTH:\s*\$?{amount}",
        r"10[_\s]*year.*?{amount}",
        r"ten[_\s]*year.*?{amount}",
    ])
});

static ANY_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\b{AMOUNT}\b")).expect("valid regex"));
static SIX_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{6,})\b").expect("valid regex"));

/// Lifetime and ten-year net worth in USD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CareerEstimate {
    pub lifetime: f64,
    pub ten_year: f64,
}

impl CareerEstimate {
    pub fn new(lifetime: f64, ten_year: f64) -> Self {
        Self { lifetime, ten_year }
    }
}

fn parse_amount(s: &str) -> Option<f64> {
    s.replace(',', "").parse::<f64>().ok()
}

fn first_match(patterns: &[Regex], text: &str) -> Option<f64> {
    patterns
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|c| parse_amount(&c[1]))
        .filter(|v| *v > 0.0)
}

/// Country multiplier used for caps and fallback figures.
pub fn country_multiplier(country: &str) -> f64 {
    multiplier_in(COUNTRY_MULTIPLIERS, country)
}

fn multiplier_in(table: &[(&[&str], f64)], country: &str) -> f64 {
    let country = country.trim().to_lowercase();
    table
        .iter()
        .find(|(names, _)| names.contains(&country.as_str()))
        .map_or(UNKNOWN_COUNTRY_MULTIPLIER, |(_, m)| *m)
}

fn keyword_row<'a>(
    table: &'a [(&'a [&'a str], f64, f64)],
    aspiration: &str,
) -> Option<(f64, f64)> {
    let aspiration = aspiration.to_lowercase();
    table
        .iter()
        .find(|(keys, _, _)| keys.iter().any(|k| aspiration.contains(k)))
        .map(|(_, lifetime, ten_year)| (*lifetime, *ten_year))
}

/// Parse the detailed career prompt's reply.
///
/// Labelled figures first; otherwise the two largest numbers above 10 000,
/// with the ten-year figure held to 40 % of lifetime.
pub fn parse_detailed(response: &str) -> Option<CareerEstimate> {
    let lifetime = first_match(&LIFETIME_PATTERNS, response);
    let ten_year = first_match(&TEN_YEAR_PATTERNS, response);
    if let (Some(lifetime), Some(ten_year)) = (lifetime, ten_year) {
        return Some(CareerEstimate::new(lifetime, ten_year));
    }

    let mut large: Vec<f64> = ANY_AMOUNT
        .captures_iter(response)
        .filter_map(|c| parse_amount(&c[1]))
        .filter(|v| *v > 10_000.0)
        .collect();
    if large.len() < 2 {
        return None;
    }
    large.sort_by(|a, b| b.total_cmp(a));
    let lifetime = large[0];
    Some(CareerEstimate::new(
        lifetime,
        large[1].min(lifetime * TEN_YEAR_RESET_SHARE),
    ))
}

/// Parse the short career prompt's reply: the first two 6+ digit numbers.
pub fn parse_simple(response: &str) -> Option<CareerEstimate> {
    let numbers: Vec<f64> = SIX_DIGITS
        .captures_iter(response)
        .filter_map(|c| c[1].parse::<f64>().ok())
        .take(2)
        .collect();
    match numbers[..] {
        [a, b] if b > a => Some(CareerEstimate::new(b, a)),
        [a, b] => Some(CareerEstimate::new(a, b)),
        _ => None,
    }
}

/// Clamp an LLM estimate to what the career category and country can support.
pub fn validate(aspiration: &str, country: &str, estimate: CareerEstimate) -> CareerEstimate {
    let (max_lifetime, max_ten_year) = keyword_row(CATEGORY_CAPS, aspiration).unwrap_or(DEFAULT_CAPS);
    let multiplier = country_multiplier(country);

    let mut lifetime = estimate.lifetime.min(max_lifetime * multiplier);
    let mut ten_year = estimate.ten_year.min(max_ten_year * multiplier);

    if ten_year > lifetime * TEN_YEAR_MAX_SHARE {
        ten_year = lifetime * TEN_YEAR_RESET_SHARE;
    }
    lifetime = lifetime.max(LIFETIME_FLOOR);
    ten_year = ten_year.max(TEN_YEAR_FLOOR);

    CareerEstimate::new(lifetime, ten_year)
}

/// Keyword-table estimate scaled by country.
pub fn fallback(aspiration: &str, country: &str) -> CareerEstimate {
    let (lifetime, ten_year) = keyword_row(FALLBACK_ESTIMATES, aspiration).unwrap_or(DEFAULT_FALLBACK);
    let multiplier = multiplier_in(FALLBACK_COUNTRY_MULTIPLIERS, country);
    CareerEstimate::new(lifetime * multiplier, ten_year * multiplier)
}
