//! Transition normalization and rank iteration

pub mod interlevel;
pub mod normalizer;
pub mod solver;

pub use normalizer::{OutlinkNormalizer, Transition};
pub use solver::{RankOutcome, RankSolver, MAX_ITERATIONS};
