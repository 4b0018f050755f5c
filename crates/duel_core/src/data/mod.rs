//! Raw data structures deserialized from RON files.
//!
//! Stats are read as signed integers so that a negative value surfaces as a
//! validation error naming the character and stat, instead of an opaque
//! parse failure. Conversion into the runtime types lives in
//! [`crate::character`] and [`crate::roster`].
//!
//! **Note:** This module contains no IO - it only defines data types.
//! File loading is handled by `duel_headless`.

mod character_data;

pub use character_data::{CharacterData, RosterData};
