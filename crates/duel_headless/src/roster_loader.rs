//! Roster, arena and balance data loading.
//!
//! Loads RON data files from disk into validated core types. Validation
//! happens here, once, so the combat loop never sees a malformed entry.

use std::fs;
use std::path::{Path, PathBuf};

use duel_core::arena::ArenaCatalog;
use duel_core::config::BalanceConfig;
use duel_core::error::DuelError;
use duel_core::roster::Roster;
use thiserror::Error;

/// File name of the roster inside a data directory.
pub const ROSTER_FILE: &str = "roster.ron";
/// File name of the arena catalog inside a data directory.
pub const ARENAS_FILE: &str = "arenas.ron";
/// File name of the balance configuration inside a data directory.
pub const BALANCE_FILE: &str = "balance.ron";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "DUEL_DATA_DIR";

const BUILTIN_ROSTER: &str = include_str!("../../../assets/data/roster.ron");
const BUILTIN_ARENAS: &str = include_str!("../../../assets/data/arenas.ron");

/// Errors that can occur while loading data files.
#[derive(Debug, Clone, Error)]
pub enum RosterLoadError {
    /// Failed to read file.
    #[error("IO error reading '{0}': {1}")]
    IoError(String, String),
    /// Failed to parse RON.
    #[error("Parse error in '{0}': {1}")]
    ParseError(String, String),
    /// Directory not found.
    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),
    /// Parsed, but failed validation.
    #[error(transparent)]
    Invalid(DuelError),
}

impl From<DuelError> for RosterLoadError {
    fn from(err: DuelError) -> Self {
        match err {
            DuelError::DataParseError { path, message } => Self::ParseError(path, message),
            other => Self::Invalid(other),
        }
    }
}

fn read(path: &Path) -> Result<String, RosterLoadError> {
    fs::read_to_string(path)
        .map_err(|e| RosterLoadError::IoError(path.display().to_string(), e.to_string()))
}

/// Load and validate a roster file.
pub fn load_roster(path: &Path) -> Result<Roster, RosterLoadError> {
    let content = read(path)?;
    let roster = Roster::from_ron_str(&content, &path.display().to_string())?;
    tracing::debug!(path = %path.display(), characters = roster.len(), "Loaded roster");
    Ok(roster)
}

/// Load and validate an arena catalog file.
pub fn load_arenas(path: &Path) -> Result<ArenaCatalog, RosterLoadError> {
    let content = read(path)?;
    let catalog = ArenaCatalog::from_ron_str(&content, &path.display().to_string())?;
    tracing::debug!(path = %path.display(), arenas = catalog.len(), "Loaded arenas");
    Ok(catalog)
}

/// Load and validate a balance configuration file.
pub fn load_balance_config(path: &Path) -> Result<BalanceConfig, RosterLoadError> {
    let content = read(path)?;
    Ok(BalanceConfig::from_ron_str(
        &content,
        &path.display().to_string(),
    )?)
}

/// The roster compiled into the binary.
pub fn builtin_roster() -> Result<Roster, RosterLoadError> {
    Ok(Roster::from_ron_str(BUILTIN_ROSTER, ROSTER_FILE)?)
}

/// The arena catalog compiled into the binary.
pub fn builtin_arenas() -> Result<ArenaCatalog, RosterLoadError> {
    Ok(ArenaCatalog::from_ron_str(BUILTIN_ARENAS, ARENAS_FILE)?)
}

/// Resolve the default data directory.
///
/// Looks for data files in standard locations:
/// 1. Environment variable `DUEL_DATA_DIR`
/// 2. `./assets/data/` (repo root)
/// 3. `../../assets/data/` (running from a crate directory)
pub fn default_data_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        let path = PathBuf::from(dir);
        if path.exists() {
            return Some(path);
        }
    }

    ["assets/data", "../../assets/data"]
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

/// Load all three data files from a directory.
///
/// The roster is required; a missing arena catalog yields an empty one and
/// a missing balance file yields the built-in defaults.
pub fn load_from_directory(dir: &Path) -> Result<DataSet, RosterLoadError> {
    if !dir.is_dir() {
        return Err(RosterLoadError::DirectoryNotFound(dir.display().to_string()));
    }
    let roster = load_roster(&dir.join(ROSTER_FILE))?;
    let arenas_path = dir.join(ARENAS_FILE);
    let arenas = if arenas_path.exists() {
        load_arenas(&arenas_path)?
    } else {
        tracing::warn!(dir = %dir.display(), "No arena catalog in data directory");
        ArenaCatalog::default()
    };
    let balance_path = dir.join(BALANCE_FILE);
    let balance = if balance_path.exists() {
        load_balance_config(&balance_path)?
    } else {
        BalanceConfig::default()
    };
    Ok(DataSet {
        roster,
        arenas,
        balance,
    })
}

/// Everything a command needs to run battles.
#[derive(Debug, Clone)]
pub struct DataSet {
    /// Roster.
    pub roster: Roster,
    /// Arena catalog.
    pub arenas: ArenaCatalog,
    /// Balance configuration.
    pub balance: BalanceConfig,
}

/// Explicit file overrides for [`load_data_set`].
#[derive(Debug, Clone, Default)]
pub struct DataPaths {
    /// Roster file.
    pub roster: Option<PathBuf>,
    /// Arena catalog file.
    pub arenas: Option<PathBuf>,
    /// Balance configuration file.
    pub balance: Option<PathBuf>,
}

/// Load roster, arenas and balance configuration.
///
/// Each piece comes from its explicit path if given, otherwise from the
/// default data directory, otherwise from the compiled-in data (or the
/// built-in defaults for the balance configuration).
pub fn load_data_set(paths: &DataPaths) -> Result<DataSet, RosterLoadError> {
    let data_dir = default_data_dir();
    let resolve = |explicit: &Option<PathBuf>, file: &str| {
        explicit.clone().or_else(|| {
            data_dir
                .as_ref()
                .map(|d| d.join(file))
                .filter(|p| p.exists())
        })
    };

    let roster = match resolve(&paths.roster, ROSTER_FILE) {
        Some(path) => load_roster(&path)?,
        None => {
            tracing::info!("No roster file found, using built-in roster");
            builtin_roster()?
        }
    };
    let arenas = match resolve(&paths.arenas, ARENAS_FILE) {
        Some(path) => load_arenas(&path)?,
        None => builtin_arenas()?,
    };
    let balance = match resolve(&paths.balance, BALANCE_FILE) {
        Some(path) => load_balance_config(&path)?,
        None => BalanceConfig::default(),
    };

    Ok(DataSet {
        roster,
        arenas,
        balance,
    })
}
