pub mod batch;
pub mod engine;

pub use batch::{attach_batch, load_queries, BatchOptions, BatchReport, Query, QueryRecord, UnknownTargetPolicy};
pub use engine::{attach_leaf, place, split_edge, EdgeSide, Placement};

/// Naming markers applied to nodes created during placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementOptions {
    /// Appended to a leaf that becomes internal.
    pub internal_suffix: String,
    /// Appended to the query name on its new leaf.
    pub new_suffix: String,
    /// Prefix of inserted split nodes, followed by their id.
    pub split_prefix: String,
}

impl Default for PlacementOptions {
    fn default() -> Self {
        Self {
            internal_suffix: "_internal".to_string(),
            new_suffix: "_new".to_string(),
            split_prefix: "parent_".to_string(),
        }
    }
}
