//! Relation ingestion and graph representation module

pub mod builder;
pub mod compressed;
pub mod decay;
pub mod filters;
pub mod layout;
pub mod registry;
pub mod relations;
pub mod store;

pub use compressed::CompressedGraph;
pub use decay::DecayManager;
pub use filters::{RelationFilter, TransferFilter};
pub use layout::{NodeLayout, Partition};
pub use registry::NodeRegistry;
pub use relations::{CustomRelation, NodeType, Relation, RelationKind, RelationPolicy};
pub use store::{RelationGraphStore, StoreSnapshot, WorkingSet};
