//! Error types for roster loading and combat configuration.

use thiserror::Error;

/// Result type alias using [`DuelError`].
pub type Result<T> = std::result::Result<T, DuelError>;

/// Top-level error type for the duel core.
///
/// Every variant describes a structural precondition violation detected at
/// load or configuration time. The battle loop itself never fails.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DuelError {
    /// A stat is negative or does not fit the stat range.
    #[error("Invalid stat '{stat}' for character '{character}': {value}")]
    InvalidStat {
        /// Character id (or list position when the id is missing).
        character: String,
        /// Stat name.
        stat: &'static str,
        /// Offending value.
        value: i64,
    },

    /// A required text field is empty.
    #[error("Character '{character}' is missing required field '{field}'")]
    MissingField {
        /// Character id (or list position when the id is missing).
        character: String,
        /// Field name.
        field: &'static str,
    },

    /// Two roster entries share an id.
    #[error("Duplicate character id: {0}")]
    DuplicateCharacter(String),

    /// Lookup of a character id that is not in the roster.
    #[error("Unknown character id: {0}")]
    UnknownCharacter(String),

    /// Lookup of an arena id that is not in the catalog.
    #[error("Unknown arena id: {0}")]
    UnknownArena(String),

    /// The roster has no characters.
    #[error("Roster is empty")]
    EmptyRoster,

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path (or source label) of the data that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Balance configuration values are inconsistent.
    #[error("Invalid balance config: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_stat_message() {
        let err = DuelError::InvalidStat {
            character: "gojo".to_string(),
            stat: "atk",
            value: -3,
        };
        assert_eq!(err.to_string(), "Invalid stat 'atk' for character 'gojo': -3");
    }

    #[test]
    fn test_parse_error_message() {
        let err = DuelError::DataParseError {
            path: "assets/data/roster.ron".to_string(),
            message: "unexpected end".to_string(),
        };
        assert!(err.to_string().contains("assets/data/roster.ron"));
    }
}
