use crate::api::{ProgressCallback, ProgressEvent};
use crate::error::{Result, TreeError};
use crate::mutation::{Mutation, MutationSet, GAP};
use crate::placement::{place, PlacementOptions};
use crate::tree::{NodeId, Tree};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;
use tracing::{info, warn};

const TASK: &str = "Attaching sequences";

/// One entry of the upstream analysis output.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct QueryRecord {
    #[serde(alias = "sequenceName")]
    pub seq_name: String,
    pub nearest_node_id: NodeId,
    pub private_nuc_mutations: PrivateNucMutations,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct PrivateNucMutations {
    #[serde(default)]
    pub private_substitutions: Vec<NucMutationRecord>,
    #[serde(default)]
    pub private_deletions: Vec<NucMutationRecord>,
    #[serde(default)]
    pub reversion_substitutions: Vec<NucMutationRecord>,
}

/// A 0-based mutation record; a missing query allele marks a deletion.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NucMutationRecord {
    pub pos: usize,
    #[serde(alias = "ref")]
    pub ref_nuc: char,
    #[serde(default)]
    pub query_nuc: Option<char>,
}

impl NucMutationRecord {
    fn to_mutation(&self) -> Mutation {
        Mutation::from_zero_based(self.pos, self.ref_nuc, self.query_nuc.unwrap_or(GAP))
    }
}

/// A sequence ready for placement.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub name: String,
    pub nearest_node_id: NodeId,
    pub private_mutations: MutationSet,
}

impl From<QueryRecord> for Query {
    fn from(record: QueryRecord) -> Self {
        let muts = &record.private_nuc_mutations;
        let private_mutations = muts
            .private_substitutions
            .iter()
            .chain(&muts.private_deletions)
            .chain(&muts.reversion_substitutions)
            .map(NucMutationRecord::to_mutation)
            .collect();
        Query {
            name: record.seq_name,
            nearest_node_id: record.nearest_node_id,
            private_mutations,
        }
    }
}

/// Reads query records from either a bare JSON array or an object with a
/// `results` array.
pub fn load_queries<R: Read>(reader: R) -> Result<Vec<QueryRecord>> {
    let value: Value = serde_json::from_reader(reader)
        .map_err(|e| TreeError::malformed(format!("query JSON: {}", e)))?;
    let records = match value {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut fields) => fields
            .remove("results")
            .ok_or_else(|| TreeError::malformed("query JSON: expected an array or a `results` field"))?,
        _ => return Err(TreeError::malformed("query JSON: expected an array or an object")),
    };
    serde_json::from_value(records).map_err(|e| TreeError::malformed(format!("query JSON: {}", e)))
}

#[derive(clap::ValueEnum, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnknownTargetPolicy {
    /// Report the query and continue with the rest of the batch
    #[default]
    #[value(name = "skip")]
    Skip,
    /// Fail the whole batch
    #[value(name = "abort")]
    Abort,
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub placement: PlacementOptions,
    pub on_unknown_target: UnknownTargetPolicy,
    pub ladderize: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            placement: PlacementOptions::default(),
            on_unknown_target: UnknownTargetPolicy::Skip,
            ladderize: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlacementRecord {
    pub query: String,
    pub nearest_node: NodeId,
    pub attached_to: NodeId,
    pub attached_to_name: String,
    pub split_node: Option<NodeId>,
    pub leaf: NodeId,
    pub leaf_name: String,
    pub private_mutations: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SkippedQuery {
    pub query: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BatchReport {
    pub placements: Vec<PlacementRecord>,
    pub skipped: Vec<SkippedQuery>,
}

/// Places every query on the tree, least diverged first.
///
/// The order matters: later queries see the splits created by earlier ones.
/// Only ids of the tree as it was before the batch are valid attachment
/// targets.
pub fn attach_batch(
    tree: &mut Tree,
    mut queries: Vec<Query>,
    options: &BatchOptions,
    progress: Option<&ProgressCallback>,
) -> Result<BatchReport> {
    let emit = |event: ProgressEvent| {
        if let Some(callback) = progress {
            callback(event);
        }
    };

    queries.sort_by_key(|query| query.private_mutations.len());
    let loaded_nodes = tree.len();
    let total = queries.len() as u64;
    let mut report = BatchReport::default();

    emit(ProgressEvent::Started {
        task: TASK.to_string(),
    });

    for (index, query) in queries.into_iter().enumerate() {
        if query.nearest_node_id >= loaded_nodes {
            let err = TreeError::UnknownAttachmentTarget {
                query: query.name.clone(),
                node_id: query.nearest_node_id,
            };
            match options.on_unknown_target {
                UnknownTargetPolicy::Abort => return Err(err),
                UnknownTargetPolicy::Skip => {
                    warn!("Skipping query: {}", err);
                    emit(ProgressEvent::Message {
                        task: TASK.to_string(),
                        message: err.to_string(),
                    });
                    report.skipped.push(SkippedQuery {
                        query: query.name,
                        reason: err.to_string(),
                    });
                    emit(ProgressEvent::Progress {
                        task: TASK.to_string(),
                        current: index as u64 + 1,
                        total,
                    });
                    continue;
                }
            }
        }

        let private_count = query.private_mutations.len();
        let placement = place(
            tree,
            query.nearest_node_id,
            query.private_mutations,
            &query.name,
            &options.placement,
        )?;

        report.placements.push(PlacementRecord {
            attached_to_name: tree.get(placement.attached_to)?.name().to_string(),
            leaf_name: tree.get(placement.leaf)?.name().to_string(),
            query: query.name,
            nearest_node: query.nearest_node_id,
            attached_to: placement.attached_to,
            split_node: placement.split,
            leaf: placement.leaf,
            private_mutations: private_count,
        });

        emit(ProgressEvent::Progress {
            task: TASK.to_string(),
            current: index as u64 + 1,
            total,
        });
    }

    if options.ladderize {
        tree.ladderize();
    }

    info!(
        placed = report.placements.len(),
        skipped = report.skipped.len(),
        nodes = tree.len(),
        "Batch placement finished"
    );
    emit(ProgressEvent::Completed {
        task: TASK.to_string(),
    });
    Ok(report)
}
