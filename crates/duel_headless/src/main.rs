//! Headless duel balance runner.
//!
//! # Usage
//!
//! ```bash
//! # One battle with its turn log
//! cargo run -p duel_headless -- duel --a gojo_satoru --b ryomen_sukuna --seed 7
//!
//! # Best-of-5 across three arenas
//! cargo run -p duel_headless -- series --a gojo_satoru --b ryomen_sukuna --best-of 5 \
//!     --arenas tokyo_shibuya,barrier_dojo,cursed_sea
//!
//! # Within-grade matrix for one grade
//! cargo run -p duel_headless -- batch --grade 1급 --trials 2000 --output results/first.json
//!
//! # Analyze or compare saved batches
//! cargo run -p duel_headless -- analyze --input results/first.json
//! cargo run -p duel_headless -- compare --before results/a.json --after results/b.json
//!
//! # Tuning search
//! cargo run -p duel_headless -- tune --grade First --rounds 4 --output results/tune.json
//! ```
//!
//! Reports go to stdout, logs to stderr.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use duel_core::arena::ArenaModifier;
use duel_core::battle::{BattleMode, BattleResult, Outcome};
use duel_core::character::{Character, Grade};
use duel_core::simulator::{simulate_seeded, simulate_series, MatchOptions};
use duel_headless::{
    analyzer::{analyze_batch, compare_analyses, ClassificationView},
    batch::{run_batch, verify_determinism, BatchConfig, BatchResults, PairScope},
    roster_loader::{load_data_set, DataPaths, DataSet},
    tuning::{tune, TuningConfig},
};

#[derive(Parser)]
#[command(name = "duel_headless")]
#[command(about = "Batch evaluator, balance analyzer and tuning search for the duel roster")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Roster RON file (default: data directory, then built-in)
    #[arg(long, global = true)]
    roster: Option<PathBuf>,

    /// Balance configuration RON file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Arena catalog RON file
    #[arg(long, global = true)]
    arena_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Individual,
    Team,
}

impl From<ModeArg> for BattleMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Individual => BattleMode::Individual,
            ModeArg::Team => BattleMode::Team,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ScopeArg {
    All,
    WithinGrade,
}

impl From<ScopeArg> for PairScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::All => PairScope::All,
            ScopeArg::WithinGrade => PairScope::WithinGrade,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ViewArg {
    Grade,
    Global,
}

impl From<ViewArg> for ClassificationView {
    fn from(view: ViewArg) -> Self {
        match view {
            ViewArg::Grade => ClassificationView::Grade,
            ViewArg::Global => ClassificationView::Global,
        }
    }
}

fn parse_grade(text: &str) -> Result<Grade, String> {
    Grade::parse(text).ok_or_else(|| format!("unknown grade '{text}'"))
}

#[derive(Subcommand)]
enum Commands {
    /// Run one battle and print its turn log
    Duel {
        /// First character id
        #[arg(long)]
        a: String,

        /// Second character id
        #[arg(long)]
        b: String,

        /// Arena id
        #[arg(long)]
        arena: Option<String>,

        /// Rule set
        #[arg(long, value_enum, default_value = "individual")]
        mode: ModeArg,

        /// Random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Play a best-of series
    Series {
        /// First character id
        #[arg(long)]
        a: String,

        /// Second character id
        #[arg(long)]
        b: String,

        /// Series length
        #[arg(long, default_value = "3", value_parser = clap::value_parser!(u32).range(1..=99))]
        best_of: u32,

        /// Comma-separated arena ids used in rotation
        #[arg(long, value_delimiter = ',')]
        arenas: Vec<String>,

        /// Rule set
        #[arg(long, value_enum, default_value = "individual")]
        mode: ModeArg,

        /// Random seed
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Evaluate the win-rate matrix
    Batch {
        /// Trials per pair
        #[arg(short, long, default_value = "1000")]
        trials: u32,

        /// Restrict the roster to one grade
        #[arg(long, value_parser = parse_grade)]
        grade: Option<Grade>,

        /// Which pairs to simulate
        #[arg(long, value_enum, default_value = "all")]
        scope: ScopeArg,

        /// Rule set
        #[arg(long, value_enum, default_value = "individual")]
        mode: ModeArg,

        /// Arena id applied to every battle
        #[arg(long)]
        arena: Option<String>,

        /// Worker threads (0 = auto)
        #[arg(long, default_value = "0")]
        threads: usize,

        /// Base seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Save results JSON here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Win rate used for classification
        #[arg(long, value_enum, default_value = "grade")]
        view: ViewArg,
    },

    /// Analyze saved batch results
    Analyze {
        /// Input batch results JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Output report path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit JSON instead of markdown
        #[arg(long)]
        json: bool,

        /// Win rate used for classification
        #[arg(long, value_enum, default_value = "grade")]
        view: ViewArg,
    },

    /// Compare two saved batch results
    Compare {
        /// Earlier batch results
        #[arg(long)]
        before: PathBuf,

        /// Later batch results
        #[arg(long)]
        after: PathBuf,

        /// Win rate used for classification
        #[arg(long, value_enum, default_value = "grade")]
        view: ViewArg,
    },

    /// Run the tuning search
    Tune {
        /// Trials per pair in every round
        #[arg(short, long, default_value = "1000")]
        trials: u32,

        /// Round cap
        #[arg(long, default_value = "4")]
        rounds: u32,

        /// Tune one grade only
        #[arg(long, value_parser = parse_grade)]
        grade: Option<Grade>,

        /// Base seed, shared by every round
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Worker threads (0 = auto)
        #[arg(long, default_value = "0")]
        threads: usize,

        /// Save the report JSON here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        /// First character id
        #[arg(long)]
        a: String,

        /// Second character id
        #[arg(long)]
        b: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for reports)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let paths = DataPaths {
        roster: cli.roster.clone(),
        arenas: cli.arena_file.clone(),
        balance: cli.config.clone(),
    };

    match cli.command {
        Commands::Duel {
            a,
            b,
            arena,
            mode,
            seed,
            json,
        } => cmd_duel(&load_data(&paths), &a, &b, arena.as_deref(), mode.into(), seed, json),
        Commands::Series {
            a,
            b,
            best_of,
            arenas,
            mode,
            seed,
        } => cmd_series(&load_data(&paths), &a, &b, best_of, &arenas, mode.into(), seed),
        Commands::Batch {
            trials,
            grade,
            scope,
            mode,
            arena,
            threads,
            seed,
            output,
            view,
        } => {
            let config = BatchConfig::new(trials)
                .with_seed(seed)
                .with_scope(scope.into())
                .with_mode(mode.into())
                .with_arena(arena)
                .with_threads(threads);
            cmd_batch(&load_data(&paths), &config, grade, output, view.into());
        }
        Commands::Analyze {
            input,
            output,
            json,
            view,
        } => cmd_analyze(&input, output, json, view.into()),
        Commands::Compare {
            before,
            after,
            view,
        } => cmd_compare(&before, &after, view.into()),
        Commands::Tune {
            trials,
            rounds,
            grade,
            seed,
            threads,
            output,
        } => {
            let batch = BatchConfig::new(trials)
                .with_seed(seed)
                .with_threads(threads);
            let config = TuningConfig::default()
                .with_max_rounds(rounds)
                .with_grade(grade);
            cmd_tune(&load_data(&paths), &config, &batch, output);
        }
        Commands::Verify { a, b, seed, runs } => cmd_verify(&load_data(&paths), &a, &b, seed, runs),
    }
}

fn fatal(message: impl std::fmt::Display) -> ! {
    tracing::error!(%message, "Command failed");
    eprintln!("FATAL: {message}");
    std::process::exit(1);
}

fn load_data(paths: &DataPaths) -> DataSet {
    match load_data_set(paths) {
        Ok(data) => {
            tracing::info!(
                characters = data.roster.len(),
                arenas = data.arenas.len(),
                "Loaded game data"
            );
            data
        }
        Err(e) => fatal(e),
    }
}

fn character<'d>(data: &'d DataSet, id: &str) -> &'d Character {
    data.roster.require(id).unwrap_or_else(|e| fatal(e))
}

fn arena<'d>(data: &'d DataSet, id: Option<&str>) -> Option<&'d ArenaModifier> {
    id.map(|id| data.arenas.require(id).unwrap_or_else(|e| fatal(e)))
}

fn banner(title: &str) {
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("{title}");
    eprintln!("{}", "=".repeat(50));
}

fn describe(result: &BattleResult) -> String {
    match (&result.outcome, &result.winner_id) {
        (Outcome::Winner(_), Some(id)) => format!("{id} wins"),
        _ => "draw".to_string(),
    }
}

fn write_or_print(output: Option<&Path>, report: &str) {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    fatal(format!("Cannot create '{}': {e}", parent.display()));
                }
            }
            if let Err(e) = std::fs::write(path, report) {
                fatal(format!("Failed to write '{}': {e}", path.display()));
            }
            eprintln!("Report written to: {}", path.display());
        }
        None => println!("{report}"),
    }
}

/// Run one battle and print its log
fn cmd_duel(
    data: &DataSet,
    a: &str,
    b: &str,
    arena_id: Option<&str>,
    mode: BattleMode,
    seed: u64,
    json: bool,
) {
    let first = character(data, a);
    let second = character(data, b);
    let options = MatchOptions::new()
        .with_mode(mode)
        .with_arena(arena(data, arena_id))
        .with_log();

    tracing::info!(a = %a, b = %b, arena = ?arena_id, mode = ?mode, seed, "Running duel");
    let result = simulate_seeded(first, second, &options, &data.balance, seed);

    if json {
        match serde_json::to_string_pretty(&result) {
            Ok(text) => println!("{text}"),
            Err(e) => fatal(e),
        }
        return;
    }

    println!("{} ({}) vs {} ({})", first.name, first.id, second.name, second.id);
    for record in result.log.iter().flatten() {
        println!(
            "T{:>2} {:<18} {:<9} {:>4}{} | {} {} -> {}",
            record.turn,
            record.attacker_id,
            format!("{:?}", record.action),
            record.damage,
            if record.critical { "!" } else { " " },
            record.defender_id,
            record.defender_hp_before,
            record.defender_hp_after
        );
    }
    println!(
        "Result: {} after {} turns ({:?}), HP {} / {}",
        describe(&result),
        result.turns,
        result.decision,
        result.final_hp[0],
        result.final_hp[1]
    );
}

/// Play a best-of series
fn cmd_series(
    data: &DataSet,
    a: &str,
    b: &str,
    best_of: u32,
    arena_ids: &[String],
    mode: BattleMode,
    seed: u64,
) {
    let first = character(data, a);
    let second = character(data, b);
    let arenas: Vec<&ArenaModifier> = arena_ids
        .iter()
        .map(|id| data.arenas.require(id).unwrap_or_else(|e| fatal(e)))
        .collect();

    tracing::info!(a = %a, b = %b, best_of, arenas = arenas.len(), seed, "Running series");
    let series = simulate_series(first, second, &arenas, best_of, mode, &data.balance, seed);

    for set in &series.sets {
        println!(
            "Set {} [{}]: {} in {} turns",
            set.set_number,
            set.arena_id.as_deref().unwrap_or("no arena"),
            describe(&set.result),
            set.result.turns
        );
    }
    println!(
        "Series: {} {} - {} {} ({})",
        first.id,
        series.wins[0],
        series.wins[1],
        second.id,
        series
            .winner_id
            .as_deref()
            .map_or_else(|| "no winner".to_string(), |w| format!("{w} wins"))
    );
}

/// Evaluate the win-rate matrix
fn cmd_batch(
    data: &DataSet,
    config: &BatchConfig,
    grade: Option<Grade>,
    output: Option<PathBuf>,
    view: ClassificationView,
) {
    let roster = match grade {
        Some(g) => data.roster.of_grade(g).unwrap_or_else(|e| fatal(e)),
        None => data.roster.clone(),
    };
    let arena = arena(data, config.arena.as_deref());

    tracing::info!(
        characters = roster.len(),
        grade = ?grade,
        trials = config.trials,
        scope = ?config.scope,
        threads = config.threads,
        seed = config.seed,
        "Batch configuration"
    );

    let results = run_batch(&roster, config, &data.balance, arena);

    if let Some(path) = &output {
        if let Err(e) = results.save(path) {
            fatal(format!("Failed to save results: {e}"));
        }
    }

    banner("BATCH COMPLETE");
    eprintln!("Characters: {}", results.characters.len());
    eprintln!("Pairs: {}", results.summary.pairs);
    eprintln!("Battles: {}", results.summary.total_battles);
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!(
        "Throughput: {:.0} battles/sec",
        results.summary.total_battles as f64 / results.duration_seconds.max(0.001)
    );
    eprintln!("Fingerprint: {:016x}", results.fingerprint());
    if let Some(path) = &output {
        eprintln!("\nResults saved to: {}", path.display());
    }

    let analysis = analyze_batch(&results, view);
    if !analysis.outliers.is_empty() {
        eprintln!("\nBalance Issues Detected:");
        for outlier in analysis.outliers_by_severity().iter().take(5) {
            eprintln!(
                "  [{:?}] {} ({}): {} {:.1}%",
                outlier.severity,
                outlier.id,
                outlier.grade,
                outlier.classification,
                outlier.rate * 100.0
            );
        }
    }

    println!("{}", analysis.to_markdown());
}

/// Analyze batch results
fn cmd_analyze(input: &Path, output: Option<PathBuf>, json: bool, view: ClassificationView) {
    tracing::info!(input = %input.display(), "Loading batch results");

    let results = BatchResults::load(input)
        .unwrap_or_else(|e| fatal(format!("Failed to load results: {e}")));
    let analysis = analyze_batch(&results, view);

    let report = if json {
        serde_json::to_string_pretty(&analysis).unwrap_or_else(|e| fatal(e))
    } else {
        analysis.to_markdown()
    };
    write_or_print(output.as_deref(), &report);
}

/// Compare two batch results
fn cmd_compare(before: &Path, after: &Path, view: ClassificationView) {
    let load = |path: &Path| {
        BatchResults::load(path)
            .unwrap_or_else(|e| fatal(format!("Failed to load '{}': {e}", path.display())))
    };
    let before = analyze_batch(&load(before), view);
    let after = analyze_batch(&load(after), view);
    let report = compare_analyses(&before, &after);

    banner(if report.overall_improved() {
        "BALANCE IMPROVED"
    } else {
        "NO IMPROVEMENT"
    });
    eprintln!(
        "Score: {:.2} -> {:.2}",
        report.score_before, report.score_after
    );

    println!("{}", report.to_markdown());
}

/// Run the tuning search
fn cmd_tune(data: &DataSet, config: &TuningConfig, batch: &BatchConfig, output: Option<PathBuf>) {
    tracing::info!(
        grade = ?config.grade,
        rounds = config.max_rounds,
        trials = batch.trials,
        seed = batch.seed,
        "Tuning configuration"
    );

    let report = tune(&data.roster, config, batch, &data.balance, None)
        .unwrap_or_else(|e| fatal(e));

    if let Some(path) = &output {
        if let Err(e) = report.save(path) {
            fatal(format!("Failed to save report: {e}"));
        }
    }

    banner("TUNING COMPLETE");
    eprintln!("Outcome: {:?}", report.outcome);
    eprintln!("Rounds: {}", report.rounds.len());
    eprintln!("Characters changed: {}", report.diffs.len());
    if let Some(path) = &output {
        eprintln!("\nReport saved to: {}", path.display());
    }

    println!("{}", report.to_markdown());
}

/// Verify determinism by running same seed multiple times
fn cmd_verify(data: &DataSet, a: &str, b: &str, seed: u64, runs: u32) {
    let first = character(data, a);
    let second = character(data, b);
    tracing::info!(a = %a, b = %b, seed, runs, "Verifying determinism");

    if verify_determinism(first, second, &data.balance, seed, runs) {
        eprintln!("Deterministic: {runs} runs of seed {seed} produced identical logs");
    } else {
        fatal(format!("Runs of seed {seed} diverged"));
    }
}
