//! Static reference data: university rankings and wealth percentiles.
//!
//! Loaded once at startup from `DESTINY_DATA_DIR` when configured:
//! - `university_ranks.csv` with columns `university_name,tier,qs_rank,nirf_rank`
//! - `wealth_data.json` with `global_wealth_percentiles`, `country_multipliers`
//!   and `career_base_estimates`
//!
//! A missing file falls back to the built-in tables; a malformed one is an error.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::ConfigError;

pub const UNIVERSITY_FILE: &str = "university_ranks.csv";
pub const WEALTH_FILE: &str = "wealth_data.json";

/// Percentile keys checked from the richest band down.
pub const PERCENTILE_ORDER: [&str; 8] = [
    "top_0.1", "top_0.5", "top_1", "top_2", "top_5", "top_10", "top_20", "top_50",
];

const DEFAULT_CAREERS: [&str; 4] = ["Software Engineer", "Data Scientist", "Doctor", "Lawyer"];

/// Maximum number of names returned for autocomplete.
const UNIVERSITY_LIST_LIMIT: usize = 100;

/// One row of the university ranking table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UniversityRecord {
    pub university_name: String,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub qs_rank: Option<u32>,
    #[serde(default)]
    pub nirf_rank: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PercentileBand {
    #[serde(default)]
    pub min_nw: f64,
    pub label: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WealthTable {
    #[serde(default)]
    pub global_wealth_percentiles: HashMap<String, PercentileBand>,
    #[serde(default)]
    pub country_multipliers: HashMap<String, f64>,
    /// Keyed by career name; values are informational only.
    #[serde(default)]
    pub career_base_estimates: BTreeMap<String, serde_json::Value>,
}

impl WealthTable {
    /// Built-in global percentile thresholds in USD.
    pub fn builtin() -> Self {
        let bands = [
            ("top_0.1", 50_000_000.0, "Top 0.1% - Ultra High Net Worth"),
            ("top_0.5", 10_000_000.0, "Top 0.5% - Very High Net Worth"),
            ("top_1", 5_000_000.0, "Top 1% - Elite Wealth"),
            ("top_2", 2_500_000.0, "Top 2% - High Net Worth"),
            ("top_5", 1_000_000.0, "Top 5% - Millionaire"),
            ("top_10", 500_000.0, "Top 10% - Affluent"),
            ("top_20", 200_000.0, "Top 20% - Comfortable"),
            ("top_50", 50_000.0, "Top 50% - Middle Class"),
            ("bottom_50", 0.0, "Bottom 50% - Building Wealth"),
        ];
        Self {
            global_wealth_percentiles: bands
                .into_iter()
                .map(|(key, min_nw, label)| {
                    (
                        key.to_string(),
                        PercentileBand {
                            min_nw,
                            label: label.to_string(),
                        },
                    )
                })
                .collect(),
            country_multipliers: HashMap::new(),
            career_base_estimates: BTreeMap::new(),
        }
    }
}

/// Reference tables shared by the oracle and the listing endpoints.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub universities: Vec<UniversityRecord>,
    pub wealth: WealthTable,
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self {
            universities: Vec::new(),
            wealth: WealthTable::builtin(),
        }
    }
}

impl ReferenceData {
    pub fn new(universities: Vec<UniversityRecord>, wealth: WealthTable) -> Self {
        Self {
            universities,
            wealth,
        }
    }

    /// Load reference tables from `dir`, or use the built-ins when `dir` is `None`.
    pub fn load(dir: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(dir) = dir else {
            info!("No reference data directory configured, using built-in tables");
            return Ok(Self::default());
        };

        let uni_path = dir.join(UNIVERSITY_FILE);
        let universities = if uni_path.exists() {
            load_universities(&uni_path)?
        } else {
            warn!(path = %uni_path.display(), "University data not found");
            Vec::new()
        };

        let wealth_path = dir.join(WEALTH_FILE);
        let wealth = if wealth_path.exists() {
            load_wealth(&wealth_path)?
        } else {
            warn!(path = %wealth_path.display(), "Wealth data not found, using built-in percentiles");
            WealthTable::builtin()
        };

        info!(
            universities = universities.len(),
            percentile_bands = wealth.global_wealth_percentiles.len(),
            "Reference data loaded"
        );
        Ok(Self::new(universities, wealth))
    }

    /// First names of the ranking table, for autocomplete.
    pub fn university_names(&self) -> Vec<String> {
        self.universities
            .iter()
            .take(UNIVERSITY_LIST_LIMIT)
            .map(|u| u.university_name.clone())
            .collect()
    }

    pub fn career_names(&self) -> Vec<String> {
        if self.wealth.career_base_estimates.is_empty() {
            return DEFAULT_CAREERS.iter().map(|c| c.to_string()).collect();
        }
        self.wealth.career_base_estimates.keys().cloned().collect()
    }
}

fn reference_error(path: &Path, reason: impl ToString) -> ConfigError {
    ConfigError::ReferenceData {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

pub fn load_universities(path: &Path) -> Result<Vec<UniversityRecord>, ConfigError> {
    let file = File::open(path).map_err(|e| reference_error(path, e))?;
    let mut rdr = csv::Reader::from_reader(file);
    let mut records = Vec::new();
    for row in rdr.deserialize() {
        let record: UniversityRecord = row.map_err(|e| reference_error(path, e))?;
        records.push(record);
    }
    Ok(records)
}

pub fn load_wealth(path: &Path) -> Result<WealthTable, ConfigError> {
    let file = File::open(path).map_err(|e| reference_error(path, e))?;
    serde_json::from_reader(std::io::BufReader::new(file)).map_err(|e| reference_error(path, e))
}
