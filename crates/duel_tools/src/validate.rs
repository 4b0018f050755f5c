//! Data validation utilities.
//!
//! Unlike the loaders in `duel_headless`, which stop at the first bad entry,
//! the validator keeps going and reports every problem it finds so a roster
//! author can fix a file in one pass.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use duel_core::arena::ArenaCatalog;
use duel_core::character::Character;
use duel_core::config::BalanceConfig;
use duel_core::data::RosterData;
use thiserror::Error;

/// Roster file name inside a data directory.
pub const ROSTER_FILE: &str = "roster.ron";
/// Arena catalog file name inside a data directory.
pub const ARENAS_FILE: &str = "arenas.ron";
/// Balance configuration file name inside a data directory.
pub const BALANCE_FILE: &str = "balance.ron";

/// A single problem found in a data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    /// File the problem was found in.
    pub file: String,
    /// What is wrong.
    pub message: String,
}

impl Problem {
    fn new(file: &str, message: impl Into<String>) -> Self {
        Self {
            file: file.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file, self.message)
    }
}

/// Validation failures.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The data directory does not exist.
    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),
    /// One or more files contain problems.
    #[error("{} problem(s) found", .0.len())]
    Failed(Vec<Problem>),
}

/// What a successful validation checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Files that were present and checked.
    pub files_checked: Vec<String>,
    /// Valid roster entries.
    pub characters: usize,
    /// Valid arenas.
    pub arenas: usize,
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OK: {} file(s), {} characters, {} arenas",
            self.files_checked.len(),
            self.characters,
            self.arenas
        )
    }
}

/// Validate all RON data files in a directory.
///
/// `roster.ron` is required. `arenas.ron` and `balance.ron` are checked when
/// present.
///
/// # Errors
///
/// Returns [`ValidationError::DirectoryNotFound`] for a missing directory and
/// [`ValidationError::Failed`] with every problem found otherwise.
pub fn validate_data_directory(path: &Path) -> Result<ValidationReport, ValidationError> {
    if !path.is_dir() {
        return Err(ValidationError::DirectoryNotFound(path.display().to_string()));
    }

    let mut report = ValidationReport::default();
    let mut problems = Vec::new();

    match read(path, ROSTER_FILE) {
        Some(Ok(source)) => {
            report.files_checked.push(ROSTER_FILE.to_string());
            report.characters = check_roster(&source, &mut problems);
        }
        Some(Err(problem)) => problems.push(problem),
        None => problems.push(Problem::new(ROSTER_FILE, "file is missing")),
    }

    match read(path, ARENAS_FILE) {
        Some(Ok(source)) => {
            report.files_checked.push(ARENAS_FILE.to_string());
            report.arenas = check_arenas(&source, &mut problems);
        }
        Some(Err(problem)) => problems.push(problem),
        None => tracing::warn!("{ARENAS_FILE} not present, skipping"),
    }

    match read(path, BALANCE_FILE) {
        Some(Ok(source)) => {
            report.files_checked.push(BALANCE_FILE.to_string());
            check_balance(&source, &mut problems);
        }
        Some(Err(problem)) => problems.push(problem),
        None => tracing::debug!("{BALANCE_FILE} not present, defaults apply"),
    }

    if problems.is_empty() {
        Ok(report)
    } else {
        Err(ValidationError::Failed(problems))
    }
}

fn read(dir: &Path, file: &str) -> Option<Result<String, Problem>> {
    let path = dir.join(file);
    if !path.exists() {
        return None;
    }
    tracing::debug!("Checking {}", path.display());
    Some(std::fs::read_to_string(&path).map_err(|e| Problem::new(file, e.to_string())))
}

/// Check every roster entry. Returns the number of valid entries.
fn check_roster(source: &str, problems: &mut Vec<Problem>) -> usize {
    let data: RosterData = match ron::from_str(source) {
        Ok(data) => data,
        Err(e) => {
            problems.push(Problem::new(ROSTER_FILE, e.to_string()));
            return 0;
        }
    };
    if data.characters.is_empty() {
        problems.push(Problem::new(ROSTER_FILE, "roster has no characters"));
        return 0;
    }

    let mut seen = HashSet::new();
    let mut valid = 0;
    for (i, entry) in data.characters.iter().enumerate() {
        if !seen.insert(entry.id.as_str()) {
            problems.push(Problem::new(
                ROSTER_FILE,
                format!("duplicate character id '{}'", entry.id),
            ));
            continue;
        }
        match Character::from_data(entry, i) {
            Ok(_) => valid += 1,
            Err(e) => problems.push(Problem::new(ROSTER_FILE, e.to_string())),
        }
    }
    valid
}

/// Check every arena. Returns the number of valid arenas.
fn check_arenas(source: &str, problems: &mut Vec<Problem>) -> usize {
    let catalog: ArenaCatalog = match ron::from_str(source) {
        Ok(catalog) => catalog,
        Err(e) => {
            problems.push(Problem::new(ARENAS_FILE, e.to_string()));
            return 0;
        }
    };

    let mut seen = HashSet::new();
    let mut valid = 0;
    for arena in &catalog.arenas {
        if !seen.insert(arena.id.as_str()) {
            problems.push(Problem::new(
                ARENAS_FILE,
                format!("duplicate arena id '{}'", arena.id),
            ));
            continue;
        }
        match arena.validate() {
            Ok(()) => valid += 1,
            Err(e) => problems.push(Problem::new(ARENAS_FILE, e.to_string())),
        }
    }
    valid
}

fn check_balance(source: &str, problems: &mut Vec<Problem>) {
    if let Err(e) = BalanceConfig::from_ron_str(source, BALANCE_FILE) {
        problems.push(Problem::new(BALANCE_FILE, e.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const ENTRY: &str = r#"(
        id: "ID",
        name: "Name",
        grade: First,
        attribute: BODY,
        atk: 20, def: 18, spd: 19, ce: 15, hp: HP,
        crt: 10, tec: 10, mnt: 10,
    )"#;

    fn entry(id: &str, hp: i64) -> String {
        ENTRY.replace("ID", id).replace("HP", &hp.to_string())
    }

    fn roster(entries: &[String]) -> String {
        format!("RosterData(characters: [{}])", entries.join(","))
    }

    fn arena(id: &str, bonus: u32) -> String {
        format!(
            r#"(
                id: "{id}",
                name: "{id}",
                bonus_attribute: CURSE,
                bonus_percent: {bonus},
                penalty_attribute: BARRIER,
                penalty_percent: 5,
                description: "",
            )"#
        )
    }

    fn write(dir: &TempDir, file: &str, contents: &str) {
        fs::write(dir.path().join(file), contents).unwrap();
    }

    #[test]
    fn test_shipped_data_is_valid() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/data");
        let report = validate_data_directory(&dir).unwrap();
        assert_eq!(report.characters, 55);
        assert_eq!(report.arenas, 10);
        assert_eq!(report.files_checked.len(), 3);
    }

    #[test]
    fn test_roster_only_directory() {
        let dir = TempDir::new().unwrap();
        write(&dir, ROSTER_FILE, &roster(&[entry("a", 90), entry("b", 95)]));

        let report = validate_data_directory(dir.path()).unwrap();
        assert_eq!(report.characters, 2);
        assert_eq!(report.arenas, 0);
        assert_eq!(report.files_checked, vec![ROSTER_FILE.to_string()]);
    }

    #[test]
    fn test_missing_directory() {
        let err = validate_data_directory(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, ValidationError::DirectoryNotFound(_)));
    }

    #[test]
    fn test_missing_roster_is_a_problem() {
        let dir = TempDir::new().unwrap();
        let Err(ValidationError::Failed(problems)) = validate_data_directory(dir.path()) else {
            panic!("expected failure");
        };
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].file, ROSTER_FILE);
    }

    #[test]
    fn test_collects_every_problem() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            ROSTER_FILE,
            &roster(&[entry("a", -90), entry("b", 95), entry("b", 95), entry("c", 0)]),
        );
        write(
            &dir,
            ARENAS_FILE,
            &format!("ArenaCatalog(arenas: [{}, {}])", arena("x", 10), arena("y", 150)),
        );
        write(&dir, BALANCE_FILE, "BalanceConfig(attributes: (advantage: -1.0))");

        let Err(ValidationError::Failed(problems)) = validate_data_directory(dir.path()) else {
            panic!("expected failure");
        };
        let in_file = |file: &str| problems.iter().filter(|p| p.file == file).count();
        // negative hp, duplicate b, zero hp
        assert_eq!(in_file(ROSTER_FILE), 3);
        assert_eq!(in_file(ARENAS_FILE), 1);
        assert_eq!(in_file(BALANCE_FILE), 1);
        assert!(problems.iter().any(|p| p.message.contains("duplicate character id 'b'")));
    }

    #[test]
    fn test_malformed_ron_reported_per_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, ROSTER_FILE, "RosterData(characters: [");
        write(&dir, ARENAS_FILE, "not ron at all");

        let Err(ValidationError::Failed(problems)) = validate_data_directory(dir.path()) else {
            panic!("expected failure");
        };
        assert_eq!(problems.len(), 2);
    }

    #[test]
    fn test_empty_roster_is_a_problem() {
        let dir = TempDir::new().unwrap();
        write(&dir, ROSTER_FILE, "RosterData(characters: [])");
        let err = validate_data_directory(dir.path()).unwrap_err();
        assert_eq!(err.to_string(), "1 problem(s) found");
    }
}
