//! Arena-backed reference tree.
//!
//! Nodes are addressed by [`NodeId`], which doubles as the index into the
//! arena. Ids are handed out in creation order and never reused, so the arena
//! length is also the next free id.

pub mod auspice;
pub mod loader;
pub mod writer;

use crate::error::{Result, TreeError};
use crate::mutation::{revert_all, MutationSet};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub use loader::{build_tree, load_tree_document};
pub use writer::tree_to_document;

pub type NodeId = usize;

/// Attributes carried through from the input document without interpretation.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct PassThrough {
    pub(crate) node_attrs: Map<String, Value>,
    pub(crate) branch_attrs: Map<String, Value>,
    /// Non-nucleotide entries of `branch_attrs.mutations` (amino-acid genes).
    pub(crate) other_mutations: BTreeMap<String, Vec<String>>,
    pub(crate) other: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    mutations: MutationSet,
    reversion_mutations: MutationSet,
    pub(crate) branch_length: f64,
    pub(crate) divergence: f64,
    pub(crate) clade_membership: Option<String>,
    pub(crate) pass_through: PassThrough,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Mutations on the edge from the parent down to this node.
    pub fn mutations(&self) -> &MutationSet {
        &self.mutations
    }

    /// The same edge walked upwards: every mutation with its alleles swapped.
    pub fn reversion_mutations(&self) -> &MutationSet {
        &self.reversion_mutations
    }

    pub fn branch_length(&self) -> f64 {
        self.branch_length
    }

    pub fn divergence(&self) -> f64 {
        self.divergence
    }

    pub fn clade_membership(&self) -> Option<&str> {
        self.clade_membership.as_deref()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
    reference_length: usize,
}

impl Tree {
    /// Creates a tree consisting of a single mutation-free root.
    pub fn new(root_name: impl Into<String>, reference_length: usize) -> Result<Self> {
        let mut tree = Tree::empty(reference_length)?;
        tree.root = tree.push_node(None, root_name.into(), MutationSet::new(), Some(0.0))?;
        Ok(tree)
    }

    /// A tree without nodes; the first pushed node becomes the root.
    pub(crate) fn empty(reference_length: usize) -> Result<Self> {
        if reference_length == 0 {
            return Err(TreeError::malformed("reference length must be positive"));
        }
        Ok(Tree {
            nodes: Vec::new(),
            root: 0,
            reference_length,
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn reference_length(&self) -> usize {
        self.reference_length
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id).ok_or(TreeError::UnknownNode(id))
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id).ok_or(TreeError::UnknownNode(id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name == name)
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    pub fn max_divergence(&self) -> f64 {
        self.nodes
            .iter()
            .map(|node| node.divergence)
            .fold(0.0, f64::max)
    }

    pub fn branch_length_for(&self, mutations: &MutationSet) -> f64 {
        mutations.len() as f64 / self.reference_length as f64
    }

    /// Allocates the next id and links the node under `parent`.
    ///
    /// Without an explicit divergence the node sits `branch_length` below its
    /// parent.
    pub(crate) fn push_node(
        &mut self,
        parent: Option<NodeId>,
        name: String,
        mutations: MutationSet,
        divergence: Option<f64>,
    ) -> Result<NodeId> {
        let id = self.nodes.len();
        let branch_length = self.branch_length_for(&mutations);
        let parent_divergence = match parent {
            Some(parent_id) => self.get(parent_id)?.divergence,
            None => 0.0,
        };
        let clade_membership = match parent {
            Some(parent_id) => self.get(parent_id)?.clade_membership.clone(),
            None => None,
        };

        self.nodes.push(Node {
            id,
            name,
            parent,
            children: Vec::new(),
            reversion_mutations: revert_all(&mutations),
            mutations,
            branch_length,
            divergence: divergence.unwrap_or(parent_divergence + branch_length),
            clade_membership,
            pass_through: PassThrough::default(),
        });

        if let Some(parent_id) = parent {
            self.get_mut(parent_id)?.children.push(id);
        }
        Ok(id)
    }

    /// Replaces a node's branch mutations, keeping the reversion set and the
    /// branch length in step.
    pub(crate) fn set_mutations(&mut self, id: NodeId, mutations: MutationSet) -> Result<()> {
        let branch_length = self.branch_length_for(&mutations);
        let node = self.get_mut(id)?;
        node.reversion_mutations = revert_all(&mutations);
        node.mutations = mutations;
        node.branch_length = branch_length;
        Ok(())
    }

    /// Number of leaves below (or at) `id`.
    pub fn count_terminals(&self, id: NodeId) -> usize {
        match self.nodes.get(id) {
            Some(node) if node.is_leaf() => 1,
            Some(node) => node
                .children
                .iter()
                .map(|&child| self.count_terminals(child))
                .sum(),
            None => 0,
        }
    }

    /// Orders every child list by ascending number of descendant leaves.
    /// The sort is stable, so equally sized subtrees keep their order.
    pub fn ladderize(&mut self) {
        if self.nodes.is_empty() {
            return;
        }
        let mut terminals = vec![0usize; self.nodes.len()];
        self.fill_terminal_counts(self.root, &mut terminals);
        for node in &mut self.nodes {
            node.children.sort_by_key(|&child| terminals[child]);
        }
    }

    fn fill_terminal_counts(&self, id: NodeId, terminals: &mut [usize]) -> usize {
        let node = &self.nodes[id];
        let count = if node.is_leaf() {
            1
        } else {
            node.children
                .iter()
                .map(|&child| self.fill_terminal_counts(child, terminals))
                .sum()
        };
        terminals[id] = count;
        count
    }

    /// Ids along the path from `id` up to the root, `id` first.
    pub fn path_to_root(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut path = vec![id];
        let mut current = self.get(id)?;
        while let Some(parent) = current.parent {
            if path.len() > self.nodes.len() {
                return Err(TreeError::InvalidStructure(format!(
                    "cycle detected above node {}",
                    id
                )));
            }
            path.push(parent);
            current = self.get(parent)?;
        }
        Ok(path)
    }

    /// Verifies the structural and mutation bookkeeping invariants.
    pub fn check_invariants(&self) -> Result<()> {
        let roots: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|node| node.parent.is_none())
            .map(|node| node.id)
            .collect();
        if roots != [self.root] {
            return Err(TreeError::InvalidStructure(format!(
                "expected single root {}, found {:?}",
                self.root, roots
            )));
        }

        let mut seen_as_child = vec![0usize; self.nodes.len()];
        for (index, node) in self.nodes.iter().enumerate() {
            if node.id != index {
                return Err(TreeError::InvalidStructure(format!(
                    "node '{}' stored at slot {} carries id {}",
                    node.name, index, node.id
                )));
            }
            for &child in &node.children {
                let child_node = self.get(child)?;
                if child_node.parent != Some(node.id) {
                    return Err(TreeError::InvalidStructure(format!(
                        "node '{}' lists child '{}' whose parent is {:?}",
                        node.name, child_node.name, child_node.parent
                    )));
                }
                seen_as_child[child] += 1;
            }
            if node.reversion_mutations != revert_all(&node.mutations) {
                return Err(TreeError::InconsistentMutationState {
                    node: node.name.clone(),
                    detail: "reversion mutations do not mirror branch mutations".to_string(),
                });
            }
        }

        for node in &self.nodes {
            let expected = usize::from(node.parent.is_some());
            if seen_as_child[node.id] != expected {
                return Err(TreeError::InvalidStructure(format!(
                    "node '{}' appears in {} child lists",
                    node.name, seen_as_child[node.id]
                )));
            }
        }

        // Every node must be reachable from the root.
        for node in &self.nodes {
            let path = self.path_to_root(node.id)?;
            if path.last() != Some(&self.root) {
                return Err(TreeError::InvalidStructure(format!(
                    "node '{}' is detached from the root",
                    node.name
                )));
            }
        }
        Ok(())
    }
}
