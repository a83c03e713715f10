use crate::error::{Result, TreeError};
use crate::mutation::{duplicate_positions, Mutation, MutationSet};
use crate::tree::auspice::{AuspiceNode, TreeDocument, NUC_KEY};
use crate::tree::{NodeId, Tree};
use std::io::Read;
use tracing::{debug, warn};

/// Reads an Auspice JSON document (full document or bare root node).
pub fn load_tree_document<R: Read>(reader: R) -> Result<TreeDocument> {
    let value: serde_json::Value = serde_json::from_reader(reader)
        .map_err(|e| TreeError::malformed(format!("tree JSON: {}", e)))?;
    TreeDocument::from_value(value).map_err(|e| TreeError::malformed(format!("tree JSON: {}", e)))
}

/// Builds the node arena from an external root node.
///
/// Ids are assigned in pre-order starting with the root at 0, which is the
/// numbering `nearestNodeId` refers to.
pub fn build_tree(root: &AuspiceNode, reference_length: usize) -> Result<Tree> {
    let mut tree = Tree::empty(reference_length)?;
    add_subtree(&mut tree, None, root)?;
    debug!(
        nodes = tree.len(),
        leaves = tree.leaf_count(),
        "Built reference tree"
    );
    Ok(tree)
}

fn add_subtree(tree: &mut Tree, parent: Option<NodeId>, external: &AuspiceNode) -> Result<NodeId> {
    let mutations = parse_nuc_mutations(external)?;
    let duplicates = duplicate_positions(&mutations);
    if !duplicates.is_empty() {
        warn!(
            node = %external.name,
            positions = ?duplicates.iter().map(|p| p + 1).collect::<Vec<_>>(),
            "Branch carries several mutations at the same position"
        );
    }

    let id = tree.push_node(
        parent,
        external.name.clone(),
        mutations,
        external.node_attrs.div,
    )?;

    let node = tree.get_mut(id)?;
    node.clade_membership = external
        .node_attrs
        .clade_membership
        .as_ref()
        .map(|attr| attr.value.clone());
    node.pass_through.node_attrs = external.node_attrs.other.clone();
    node.pass_through.branch_attrs = external.branch_attrs.other.clone();
    node.pass_through.other = external.other.clone();
    node.pass_through.other_mutations = external
        .branch_attrs
        .mutations
        .iter()
        .filter(|(key, _)| key.as_str() != NUC_KEY)
        .map(|(key, list)| (key.clone(), list.clone()))
        .collect();

    for child in &external.children {
        add_subtree(tree, Some(id), child)?;
    }
    Ok(id)
}

fn parse_nuc_mutations(external: &AuspiceNode) -> Result<MutationSet> {
    let Some(list) = external.branch_attrs.mutations.get(NUC_KEY) else {
        return Ok(MutationSet::new());
    };
    list.iter()
        .map(|text| {
            text.parse::<Mutation>().map_err(|e| {
                TreeError::malformed(format!("node '{}': {}", external.name, e))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::auspice::TreeDocument;
    use serde_json::json;

    fn document() -> TreeDocument {
        TreeDocument::from_value(json!({
            "name": "R",
            "node_attrs": {"div": 0.0, "clade_membership": {"value": "19A"}},
            "children": [
                {
                    "name": "A",
                    "node_attrs": {"div": 1.0},
                    "branch_attrs": {"mutations": {"nuc": ["C72T"]}},
                    "children": [
                        {"name": "A1", "node_attrs": {"div": 3.0},
                         "branch_attrs": {"mutations": {"nuc": ["G10A", "T5C"]}}}
                    ]
                },
                {"name": "B", "branch_attrs": {"mutations": {"nuc": ["A1G", "A2G"]}}}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn assigns_pre_order_ids() {
        let tree = build_tree(&document().root, 2).unwrap();
        let names: Vec<&str> = tree.nodes().map(|n| n.name()).collect();
        assert_eq!(names, vec!["R", "A", "A1", "B"]);
        assert_eq!(tree.get(2).unwrap().parent(), Some(1));
        assert_eq!(tree.get(0).unwrap().children(), &[1, 3]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn keeps_stored_divergence_and_derives_missing_one() {
        let tree = build_tree(&document().root, 2).unwrap();
        assert_eq!(tree.get(2).unwrap().divergence(), 3.0);
        assert_eq!(tree.get(2).unwrap().branch_length(), 1.0);
        // B has no div: parent divergence plus two mutations over length 2
        assert_eq!(tree.get(3).unwrap().divergence(), 1.0);
    }

    #[test]
    fn loaded_nodes_keep_their_own_clade_membership() {
        let tree = build_tree(&document().root, 2).unwrap();
        assert_eq!(tree.get(0).unwrap().clade_membership(), Some("19A"));
        assert_eq!(tree.get(1).unwrap().clade_membership(), None);
    }

    #[test]
    fn reversion_sets_are_derived() {
        let tree = build_tree(&document().root, 100).unwrap();
        let a1 = tree.find_by_name("A1").unwrap();
        let reversions: Vec<String> = a1.reversion_mutations().iter().map(|m| m.to_string()).collect();
        assert_eq!(reversions, vec!["C5T", "A10G"]);
    }

    #[test]
    fn bad_mutation_notation_is_malformed_input() {
        let doc = TreeDocument::from_value(json!({
            "name": "R",
            "branch_attrs": {"mutations": {"nuc": ["C0T"]}}
        }))
        .unwrap();
        assert!(matches!(build_tree(&doc.root, 10), Err(TreeError::MalformedInput(_))));
    }

    #[test]
    fn reads_documents_from_json_text() {
        let text = r#"{"version": "v2", "tree": {"name": "R", "children": [{"name": "A"}]}}"#;
        let doc = load_tree_document(text.as_bytes()).unwrap();
        assert!(doc.envelope.is_some());
        assert_eq!(build_tree(&doc.root, 10).unwrap().len(), 2);
        assert!(load_tree_document(&b"{\"tree\": {}}"[..]).is_err());
    }
}
