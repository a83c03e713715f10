use crate::error::Result;
use crate::tree::auspice::{AttrValue, AuspiceNode, BranchAttrs, NodeAttrs, TreeDocument, NUC_KEY};
use crate::tree::{NodeId, Tree};
use serde_json::{Map, Value};

/// Serializes the tree back into the external nested representation.
///
/// `envelope` holds the document-level fields of the input (if it was a full
/// Auspice document) and is reattached around the new root.
pub fn tree_to_document(tree: &Tree, envelope: Option<Map<String, Value>>) -> Result<TreeDocument> {
    Ok(TreeDocument {
        root: node_to_auspice(tree, tree.root())?,
        envelope,
    })
}

fn node_to_auspice(tree: &Tree, id: NodeId) -> Result<AuspiceNode> {
    let node = tree.get(id)?;

    let mut mutations = node.pass_through.other_mutations.clone();
    if !node.mutations().is_empty() {
        mutations.insert(
            NUC_KEY.to_string(),
            node.mutations().iter().map(ToString::to_string).collect(),
        );
    }

    let children = node
        .children()
        .iter()
        .map(|&child| node_to_auspice(tree, child))
        .collect::<Result<Vec<_>>>()?;

    Ok(AuspiceNode {
        name: node.name().to_string(),
        node_attrs: NodeAttrs {
            div: Some(node.divergence()),
            clade_membership: node.clade_membership().map(AttrValue::new),
            other: node.pass_through.node_attrs.clone(),
        },
        branch_attrs: BranchAttrs {
            mutations,
            other: node.pass_through.branch_attrs.clone(),
        },
        children,
        other: node.pass_through.other.clone(),
    })
}
