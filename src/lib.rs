//! Buff sheet engine for unit rosters: which units buff which, by how much, at a
//! given level.

pub mod buffs;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod parallel;

pub use error::{BuffSheetError, Result};
