#![forbid(unsafe_code)]
//! dagprep-profile: per-column summary statistics and their differences.
//!
//! `profile` never fails: empty or all-missing columns simply yield
//! undefined (`None`) statistics. `diff` compares only what both profiles
//! share and fails when they share no column at all.

pub mod diff;
pub mod error;
pub mod profile;

pub use diff::{diff, ColumnDiff, ProfileDiff, StatDelta};
pub use error::{ProfileError, Result};
pub use profile::{
    profile, profile_with, CategoricalStats, ColumnProfile, ColumnStats, NumericStats, Profile,
    ValueCount,
};
