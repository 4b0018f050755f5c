//! Batch evaluator for roster balance testing.
//!
//! Runs every pair of a roster for a fixed number of trials in parallel
//! using rayon. Each trial seeds its own generator from the batch seed, the
//! pair and the trial number, so the matrix does not depend on how rayon
//! schedules the work.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use duel_core::arena::ArenaModifier;
use duel_core::battle::{BattleMode, BattleResult};
use duel_core::character::{Character, Grade};
use duel_core::config::BalanceConfig;
use duel_core::rng::derive_seed;
use duel_core::roster::Roster;
use duel_core::simulator::{simulate_seeded, MatchOptions};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::matrix::WinRateMatrix;
use crate::metrics::{BatchSummary, PairMetrics, PairRecord};

/// Which pairs of the roster are simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairScope {
    /// Every unordered pair.
    #[default]
    All,
    /// Only pairs sharing a grade.
    WithinGrade,
}

impl PairScope {
    /// Parse a CLI name.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "within-grade" | "within_grade" | "grade" => Some(Self::WithinGrade),
            _ => None,
        }
    }
}

/// Configuration for a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Trials per pair
    pub trials: u32,
    /// Base seed every trial seed derives from
    pub seed: u64,
    /// Pairs to simulate
    pub scope: PairScope,
    /// Rule set
    pub mode: BattleMode,
    /// Arena id applied to every battle
    pub arena: Option<String>,
    /// Worker threads (0 = use rayon default)
    pub threads: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            trials: 1000,
            seed: 0,
            scope: PairScope::All,
            mode: BattleMode::Individual,
            arena: None,
            threads: 0,
        }
    }
}

impl BatchConfig {
    /// Config with the given trial count
    pub fn new(trials: u32) -> Self {
        Self {
            trials,
            ..Default::default()
        }
    }

    /// Set base seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set pair scope
    pub fn with_scope(mut self, scope: PairScope) -> Self {
        self.scope = scope;
        self
    }

    /// Set rule set
    pub fn with_mode(mut self, mode: BattleMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set arena id
    pub fn with_arena(mut self, arena: Option<String>) -> Self {
        self.arena = arena;
        self
    }

    /// Set worker thread count
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }
}

/// Results from a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Balance configuration used
    pub balance: BalanceConfig,
    /// Roster snapshot the batch ran on
    pub characters: Vec<Character>,
    /// Win-rate matrix over `characters`
    pub matrix: WinRateMatrix,
    /// Per-pair counters
    pub pairs: Vec<PairRecord>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }

    /// Rebuild the roster the batch ran on.
    pub fn roster(&self) -> duel_core::error::Result<Roster> {
        Roster::new(self.characters.clone())
    }

    /// Hash of the matrix and pair counters.
    ///
    /// Equal for two runs with the same roster, configuration and seed,
    /// whatever the thread count. Timing is excluded.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.matrix.ids().hash(&mut hasher);
        for i in 0..self.matrix.len() {
            for j in 0..self.matrix.len() {
                self.matrix.get(i, j).map(f64::to_bits).hash(&mut hasher);
            }
        }
        for pair in &self.pairs {
            (pair.i, pair.j).hash(&mut hasher);
            pair.metrics.hash(&mut hasher);
        }
        hasher.finish()
    }
}

/// Progress tracking for batch runs
#[derive(Debug)]
pub struct BatchProgress {
    /// Total pairs
    pub total: u32,
    /// Completed pairs
    completed: AtomicU32,
    /// Start time
    start_time: Instant,
}

impl BatchProgress {
    /// Create new progress tracker
    pub fn new(total: u32) -> Self {
        Self {
            total,
            completed: AtomicU32::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a completed pair, returning the new count
    pub fn record_completion(&self) -> u32 {
        self.completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Get current completion count
    pub fn current(&self) -> u32 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Get completion percentage
    pub fn percentage(&self) -> f64 {
        f64::from(self.current()) / f64::from(self.total.max(1)) * 100.0
    }

    /// Get estimated time remaining
    pub fn eta(&self) -> Duration {
        let completed = self.current();
        if completed == 0 {
            return Duration::from_secs(0);
        }
        let per_pair = self.start_time.elapsed().as_secs_f64() / f64::from(completed);
        let remaining = self.total.saturating_sub(completed);
        Duration::from_secs_f64(per_pair * f64::from(remaining))
    }
}

/// Unordered pairs `(i, j)`, `i < j`, selected by `scope`.
#[must_use]
pub fn pairs_for(roster: &Roster, scope: PairScope) -> Vec<(usize, usize)> {
    let characters = roster.characters();
    let n = characters.len();
    (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .filter(|&(i, j)| match scope {
            PairScope::All => true,
            PairScope::WithinGrade => characters[i].grade == characters[j].grade,
        })
        .collect()
}

fn run_pair(
    a: &Character,
    b: &Character,
    (i, j): (usize, usize),
    config: &BatchConfig,
    options: &MatchOptions<'_>,
    balance: &BalanceConfig,
) -> PairMetrics {
    (0..config.trials)
        .into_par_iter()
        .fold(PairMetrics::default, |mut metrics, trial| {
            let seed = derive_seed(config.seed, i, j, trial);
            let result: BattleResult = simulate_seeded(a, b, options, balance, seed);
            metrics.record(&result);
            metrics
        })
        .reduce(PairMetrics::default, PairMetrics::merge)
}

/// Run the batch over `roster`.
///
/// `arena` must be the modifier named by `config.arena`, already resolved
/// by the caller. A roster of one character yields an empty matrix row, and
/// analysis reports it as having no opponents.
pub fn run_batch(
    roster: &Roster,
    config: &BatchConfig,
    balance: &BalanceConfig,
    arena: Option<&ArenaModifier>,
) -> BatchResults {
    let start = Instant::now();
    let pairs = pairs_for(roster, config.scope);
    let progress = BatchProgress::new(pairs.len() as u32);
    let characters = roster.characters();
    let options = MatchOptions::new()
        .with_mode(config.mode)
        .with_arena(arena);

    info!(
        characters = roster.len(),
        pairs = pairs.len(),
        trials = config.trials,
        seed = config.seed,
        mode = ?config.mode,
        "Starting batch run"
    );

    let evaluate = || -> Vec<PairRecord> {
        pairs
            .par_iter()
            .map(|&(i, j)| {
                let metrics = run_pair(
                    &characters[i],
                    &characters[j],
                    (i, j),
                    config,
                    &options,
                    balance,
                );
                let completed = progress.record_completion();
                if completed % 100 == 0 {
                    debug!(
                        completed,
                        total = progress.total,
                        percent = progress.percentage(),
                        eta_secs = progress.eta().as_secs(),
                        "Batch progress"
                    );
                }
                PairRecord {
                    i,
                    j,
                    a: characters[i].id.clone(),
                    b: characters[j].id.clone(),
                    metrics,
                }
            })
            .collect()
    };

    let records = if config.threads > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()
        {
            Ok(pool) => pool.install(evaluate),
            Err(e) => {
                warn!(error = %e, "Failed to build thread pool, using global pool");
                evaluate()
            }
        }
    } else {
        evaluate()
    };

    let mut matrix = WinRateMatrix::new(characters.iter().map(|c| c.id.clone()).collect());
    for record in &records {
        if let Some(rate) = record.metrics.win_rate_a() {
            matrix.set_pair(record.i, record.j, rate);
        }
    }

    let summary = BatchSummary::from_pairs(&records);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        battles = summary.total_battles,
        duration_secs = duration_seconds,
        avg_turns = summary.avg_turns,
        "Batch complete"
    );

    BatchResults {
        config: config.clone(),
        balance: *balance,
        characters: characters.to_vec(),
        matrix,
        pairs: records,
        summary,
        duration_seconds,
    }
}

/// Run the batch over the members of one grade.
pub fn run_grade_batch(
    roster: &Roster,
    grade: Grade,
    config: &BatchConfig,
    balance: &BalanceConfig,
    arena: Option<&ArenaModifier>,
) -> duel_core::error::Result<BatchResults> {
    let subset = roster.of_grade(grade)?;
    Ok(run_batch(&subset, config, balance, arena))
}

/// Verify determinism by running the same battle several times.
///
/// Every run uses `seed` and keeps the full turn log; all results must be
/// identical.
pub fn verify_determinism(
    a: &Character,
    b: &Character,
    balance: &BalanceConfig,
    seed: u64,
    runs: u32,
) -> bool {
    let options = MatchOptions::new().with_log();
    let mut results = (0..runs.max(1)).map(|_| simulate_seeded(a, b, &options, balance, seed));
    let Some(first) = results.next() else {
        return true;
    };
    results.all(|r| r == first)
}
