//! Incremental ranking of nodes in a typed relation graph

pub mod calculator;
pub mod cluster;
pub mod config;
pub mod data;
pub mod error;
pub mod graph;
pub mod matrix;
pub mod rank;
pub mod storage;
pub mod viz;

pub use calculator::{IndexCalculator, Scores};
pub use config::Parameters;
pub use error::{Error, Result};
pub use graph::{NodeType, Relation, RelationKind};
