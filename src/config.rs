//! Configuration management for the ranking engine

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which power-iteration variant computes the rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankAlgorithm {
    /// Teleportation only
    PageRank,
    /// Adds the cluster-smoothed interlevel term built from a SCAN pass
    NcdAwareRank,
}

/// Where the leftover mass of dangling and negative columns is routed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrectionScope {
    /// Uniformly over every known node
    Global,
    /// Uniformly over the nodes sharing the column's node type
    PerType,
    /// Proportionally to the caller's weight vector
    Weighted,
}

/// How the working matrix is prepared before normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalculationMode {
    /// Columns are normalized as they are
    Direct,
    /// Each node type gets a reserved phantom node that absorbs the
    /// mass of columns with no positive weight
    PhantomAccount,
}

/// Parameters of the ranking pipeline. Fields missing from a serialized
/// form take their default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Share of rank that follows outgoing links
    pub outlink_weight: f64,

    /// Share of rank that flows through the cluster hierarchy
    pub interlevel_weight: f64,

    /// SCAN core threshold (mu)
    pub clustering_m: u32,

    /// SCAN similarity threshold (epsilon)
    pub clustering_e: f64,

    /// Block-height length of one decay period
    pub decay_period: u64,

    /// Per-period decay multiplier
    pub decay_koefficient: f64,

    /// Worker threads used by the matrix-vector product
    pub num_threads: usize,

    /// Power iteration stops once the L1 change drops to this value
    pub rank_calculation_precision: f64,

    /// Token to USD conversion rate applied to the transfer thresholds
    pub token_usd_rate: f64,

    /// Fixed-point scale of token amounts
    pub token_precision: u64,

    /// Minimal transfer amount, in USD
    pub transaction_amount_threshold: u64,

    /// Minimal account balance of both transfer parties, in USD
    pub account_amount_threshold: u64,

    /// Clamp negative accumulated weights to zero before normalization
    pub disable_negative_weights: bool,

    pub correction_scope: CorrectionScope,

    pub calculation_mode: CalculationMode,

    pub algorithm: RankAlgorithm,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            outlink_weight: 0.7,
            interlevel_weight: 0.1,
            clustering_m: 4,
            clustering_e: 0.3,
            decay_period: 86_400,
            decay_koefficient: 0.9,
            num_threads: 1,
            rank_calculation_precision: 0.0001,
            token_usd_rate: 1.0,
            token_precision: 100_000_000,
            transaction_amount_threshold: 100,
            account_amount_threshold: 10_000,
            disable_negative_weights: true,
            correction_scope: CorrectionScope::Global,
            calculation_mode: CalculationMode::Direct,
            algorithm: RankAlgorithm::NcdAwareRank,
        }
    }
}

impl Parameters {
    /// Read parameters from a JSON file; omitted fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(format!("opening {}", path.display()), e))?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::validation(format!("invalid parameters file {}: {}", path.display(), e)))
    }

    /// Reject out-of-range values before anything is built from them
    pub fn validate(&self) -> Result<()> {
        if !(self.outlink_weight > 0.0 && self.outlink_weight < 1.0) {
            return Err(Error::validation("outlink_weight must be between 0 and 1"));
        }

        if !(self.interlevel_weight >= 0.0) {
            return Err(Error::validation("interlevel_weight must not be negative"));
        }

        if self.outlink_weight + self.interlevel_weight >= 1.0 {
            return Err(Error::validation(
                "sum of outlink_weight and interlevel_weight must be less than 1",
            ));
        }

        if !(self.decay_koefficient > 0.0 && self.decay_koefficient < 1.0) {
            return Err(Error::validation("decay_koefficient must be between 0 and 1"));
        }

        if self.decay_period == 0 {
            return Err(Error::validation("decay_period must be positive"));
        }

        if !(self.clustering_e > 0.0) {
            return Err(Error::validation("clustering_e must be positive"));
        }

        if self.clustering_m < 1 {
            return Err(Error::validation("clustering_m must be at least 1"));
        }

        if !(self.rank_calculation_precision > 0.0) {
            return Err(Error::validation("rank_calculation_precision must be positive"));
        }

        if self.num_threads < 1 {
            return Err(Error::validation("num_threads must be at least 1"));
        }

        if !(self.token_usd_rate > 0.0) {
            return Err(Error::validation("token_usd_rate must be positive"));
        }

        Ok(())
    }

    /// Share of rank mixed in from the weight vector on every iteration
    pub fn teleportation_weight(&self) -> f64 {
        match self.algorithm {
            RankAlgorithm::PageRank => 1.0 - self.outlink_weight,
            RankAlgorithm::NcdAwareRank => 1.0 - self.outlink_weight - self.interlevel_weight,
        }
    }
}
