//! Persistence layer: SQLite-backed storage for served predictions.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlStore;
pub use traits::{
    ClientInfo, CountStat, CountryStat, PredictionRecord, PredictionStats, PredictionStore,
    RecentPrediction,
};
