use crate::cli::ReferenceArgs;
use crate::commands::resolve_reference_length;
use crate::tree::{build_tree, load_tree_document};
use crate::utils::input::open_input;
use anyhow::{Context, Result};
use std::path::Path;

pub fn run(tree_file: &Path, reference: &ReferenceArgs) -> Result<()> {
    let reference_length = resolve_reference_length(reference)?;
    let document = load_tree_document(open_input(tree_file)?)
        .with_context(|| format!("Failed to load tree {}", tree_file.display()))?;
    let tree = build_tree(&document.root, reference_length)?;
    tree.check_invariants()
        .with_context(|| format!("Tree {} is inconsistent", tree_file.display()))?;

    println!("Nodes: {}", tree.len());
    println!("Leaves: {}", tree.leaf_count());
    println!("Max divergence: {:.6}", tree.max_divergence());
    Ok(())
}
