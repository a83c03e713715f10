use crate::error::{Result, TreeError};
use crate::mutation::{remove, revert_all, shared, MutationSet};
use crate::placement::PlacementOptions;
use crate::tree::{NodeId, Tree};
use tracing::{debug, trace};

/// Where a placed sequence ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub leaf: NodeId,
    pub attached_to: NodeId,
    pub split: Option<NodeId>,
}

/// Which end of the split edge the shared mutations were computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeSide {
    /// Shared set taken from `bottom.reversion_mutations ∩ query`.
    Parent,
    /// Shared set taken from `bottom.mutations ∩ query`.
    Child,
}

enum SplitCandidate {
    ParentEdge { parent: NodeId, shared: MutationSet },
    ChildEdge { child: NodeId, shared: MutationSet },
}

/// Places one sequence on the tree, starting the search at `nearest`.
///
/// Walks towards the parent or a child while the query explains that whole
/// edge, then either attaches directly or splits the edge it overlaps most.
pub fn place(
    tree: &mut Tree,
    nearest: NodeId,
    private_mutations: MutationSet,
    name: &str,
    options: &PlacementOptions,
) -> Result<Placement> {
    let node = tree.get(nearest)?;
    let parent = node.parent();
    let children = node.children().to_vec();
    let shared_up = shared(node.reversion_mutations(), &private_mutations);

    if let Some(parent) = parent {
        if !shared_up.is_empty() && shared_up.len() == node.reversion_mutations().len() {
            trace!(query = name, from = nearest, to = parent, "Query explains parent edge, moving up");
            let remaining = remove(&private_mutations, &shared_up);
            return place(tree, parent, remaining, name, options);
        }
    }

    let mut best_count = 0;
    let mut best = None;
    if let Some(parent) = parent {
        if !shared_up.is_empty() {
            best_count = shared_up.len();
            best = Some(SplitCandidate::ParentEdge {
                parent,
                shared: shared_up,
            });
        }
    }

    for child in children {
        let child_mutations = tree.get(child)?.mutations();
        let shared_down = shared(child_mutations, &private_mutations);
        if !shared_down.is_empty() && shared_down.len() == child_mutations.len() {
            trace!(query = name, from = nearest, to = child, "Query explains child edge, moving down");
            let remaining = remove(&private_mutations, &shared_down);
            return place(tree, child, remaining, name, options);
        }
        if shared_down.len() > best_count {
            best_count = shared_down.len();
            best = Some(SplitCandidate::ChildEdge {
                child,
                shared: shared_down,
            });
        }
    }

    let placement = match best {
        None => {
            let leaf = attach_leaf(tree, nearest, private_mutations, name, options)?;
            Placement {
                leaf,
                attached_to: nearest,
                split: None,
            }
        }
        Some(candidate) => {
            let (split, shared_mutations) = match candidate {
                SplitCandidate::ParentEdge { parent, shared } => (
                    split_edge(tree, parent, nearest, &shared, EdgeSide::Parent, options)?,
                    shared,
                ),
                SplitCandidate::ChildEdge { child, shared } => (
                    split_edge(tree, nearest, child, &shared, EdgeSide::Child, options)?,
                    shared,
                ),
            };
            let remaining = remove(&private_mutations, &shared_mutations);
            let leaf = attach_leaf(tree, split, remaining, name, options)?;
            Placement {
                leaf,
                attached_to: split,
                split: Some(split),
            }
        }
    };

    debug!(
        query = name,
        leaf = placement.leaf,
        attached_to = placement.attached_to,
        split = ?placement.split,
        "Placed sequence"
    );
    Ok(placement)
}

/// Hangs a new leaf carrying `mutations` below `parent`.
///
/// A parent that is itself a leaf becomes internal first: it is renamed with
/// the internal suffix and gets a zero-length child that keeps the sample's
/// name, divergence and metadata.
pub fn attach_leaf(
    tree: &mut Tree,
    parent: NodeId,
    mutations: MutationSet,
    name: &str,
    options: &PlacementOptions,
) -> Result<NodeId> {
    if tree.get(parent)?.is_leaf() {
        convert_to_internal(tree, parent, options)?;
    }
    tree.push_node(
        Some(parent),
        format!("{}{}", name, options.new_suffix),
        mutations,
        None,
    )
}

fn convert_to_internal(tree: &mut Tree, id: NodeId, options: &PlacementOptions) -> Result<NodeId> {
    let node = tree.get(id)?;
    let original_name = node.name().to_string();
    let divergence = node.divergence();
    let metadata = node.pass_through.node_attrs.clone();

    let sample = tree.push_node(
        Some(id),
        original_name.clone(),
        MutationSet::new(),
        Some(divergence),
    )?;
    tree.get_mut(sample)?.pass_through.node_attrs = metadata;
    tree.get_mut(id)?.name = format!("{}{}", original_name, options.internal_suffix);
    Ok(sample)
}

/// Inserts a new internal node on the edge `top -> bottom` holding the part
/// of the edge shared with the query.
///
/// The new mutation sets are computed and checked before the tree is touched,
/// so a failed split leaves the tree unchanged.
pub fn split_edge(
    tree: &mut Tree,
    top: NodeId,
    bottom: NodeId,
    shared_mutations: &MutationSet,
    side: EdgeSide,
    options: &PlacementOptions,
) -> Result<NodeId> {
    let bottom_node = tree.get(bottom)?;
    if bottom_node.parent() != Some(top) {
        return Err(TreeError::InvalidStructure(format!(
            "cannot split edge {} -> {}: nodes are not parent and child",
            top, bottom
        )));
    }

    let before = bottom_node.mutations().clone();
    let (upper, lower) = match side {
        EdgeSide::Parent => {
            let upper_reversions = remove(bottom_node.reversion_mutations(), shared_mutations);
            (revert_all(&upper_reversions), revert_all(shared_mutations))
        }
        EdgeSide::Child => (shared_mutations.clone(), remove(&before, shared_mutations)),
    };
    check_partition(bottom_node.name(), &before, &upper, &lower)?;

    let split_name = format!("{}{}", options.split_prefix, tree.len());
    let split = tree.push_node(Some(top), split_name, upper, None)?;

    let top_node = tree.get_mut(top)?;
    top_node.children.retain(|&child| child != split);
    for child in top_node.children.iter_mut() {
        if *child == bottom {
            *child = split;
        }
    }
    tree.get_mut(split)?.children.push(bottom);
    tree.get_mut(bottom)?.parent = Some(split);
    tree.set_mutations(bottom, lower)?;

    Ok(split)
}

/// The two halves of a split edge must be disjoint and together rebuild the
/// original edge.
fn check_partition(
    node: &str,
    before: &MutationSet,
    upper: &MutationSet,
    lower: &MutationSet,
) -> Result<()> {
    if !upper.is_disjoint(lower) {
        return Err(TreeError::InconsistentMutationState {
            node: node.to_string(),
            detail: format!(
                "split halves overlap at {:?}",
                shared(upper, lower).iter().map(ToString::to_string).collect::<Vec<_>>()
            ),
        });
    }
    let union: MutationSet = upper.union(lower).copied().collect();
    if &union != before {
        return Err(TreeError::InconsistentMutationState {
            node: node.to_string(),
            detail: format!(
                "split does not rebuild the edge: {} + {} mutations vs {} before",
                upper.len(),
                lower.len(),
                before.len()
            ),
        });
    }
    Ok(())
}
