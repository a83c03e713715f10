#![allow(dead_code)]

use std::path::PathBuf;
use treebuilder::mutation::{Mutation, MutationSet};
use treebuilder::tree::{NodeId, Tree};

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

pub fn read_json(name: &str) -> serde_json::Value {
    let text = std::fs::read_to_string(fixture(name)).expect("read fixture");
    serde_json::from_str(&text).expect("parse fixture")
}

pub fn muts(items: &[&str]) -> MutationSet {
    items
        .iter()
        .map(|s| s.parse::<Mutation>().expect("valid mutation"))
        .collect()
}

/// Newick-like rendering: `name[mutations](children)`.
pub fn shape(tree: &Tree) -> String {
    fn render(tree: &Tree, id: NodeId, out: &mut String) {
        let node = tree.get(id).expect("node exists");
        out.push_str(node.name());
        let mutations: Vec<String> = node.mutations().iter().map(ToString::to_string).collect();
        out.push('[');
        out.push_str(&mutations.join(","));
        out.push(']');
        if !node.is_leaf() {
            out.push('(');
            for (i, &child) in node.children().iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                render(tree, child, out);
            }
            out.push(')');
        }
    }
    let mut out = String::new();
    render(tree, tree.root(), &mut out);
    out
}
