//! Relation input and output formats

pub mod parquet;
pub mod preprocessing;
pub mod relation_log;

pub use preprocessing::{group_into_blocks, replay, Block};
