//! Headless balance tooling for the duel roster.
//!
//! This crate runs the combat core at scale, with no UI:
//!
//! - **Batch evaluation**: every pair of a roster for T trials, in parallel
//! - **Analysis**: per-character win rates, OP/WK classification, grade
//!   spreads and a balance score
//! - **Tuning**: a bounded greedy search over small stat deltas
//!
//! Reports go to stdout (markdown or JSON), logs go to stderr.
//!
//! # Example
//!
//! ```bash
//! # One battle with its turn log
//! cargo run -p duel_headless -- duel --a gojo_satoru --b ryomen_sukuna
//!
//! # Full-roster matrix, saved for later analysis
//! cargo run -p duel_headless -- batch --trials 1000 --output results/batch.json
//!
//! # Tune the 1급 group
//! cargo run -p duel_headless -- tune --grade First --rounds 4
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod analyzer;
pub mod batch;
pub mod matrix;
pub mod metrics;
pub mod roster_loader;
pub mod tuning;

pub use analyzer::{
    analyze_batch, compare_analyses, BalanceAnalysis, Classification, ClassificationView,
    ComparisonReport,
};
pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults, PairScope};
pub use matrix::WinRateMatrix;
pub use metrics::{BatchSummary, PairMetrics};
pub use roster_loader::{load_data_set, DataPaths, DataSet, RosterLoadError};
pub use tuning::{tune, TuningConfig, TuningOutcome, TuningReport};
