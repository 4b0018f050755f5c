//! # Duel Development Tools
//!
//! Command-line tools for roster authors:
//! - Data validators for roster, arena and balance files

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod validate;
