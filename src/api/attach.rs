use crate::api::ProgressCallback;
use crate::error::Result;
use crate::placement::{attach_batch, BatchOptions, BatchReport, Query, QueryRecord};
use crate::tree::auspice::TreeDocument;
use crate::tree::{build_tree, tree_to_document};
use serde_json::Value;

pub struct AttachInput {
    /// Auspice document or bare root node.
    pub tree: Value,
    pub reference_length: usize,
    pub queries: Vec<QueryRecord>,
}

#[derive(Debug)]
pub struct AttachOutput {
    pub tree: Value,
    pub report: BatchReport,
}

/// `(tree document, reference length, queries) -> tree document`.
pub struct SequenceAttacher {
    options: BatchOptions,
    progress_callback: Option<ProgressCallback>,
}

impl Default for SequenceAttacher {
    fn default() -> Self {
        Self::new(BatchOptions::default())
    }
}

impl SequenceAttacher {
    pub fn new(options: BatchOptions) -> Self {
        Self {
            options,
            progress_callback: None,
        }
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Every input is parsed and validated before the tree is modified.
    pub fn attach(&self, input: AttachInput) -> Result<AttachOutput> {
        let document = TreeDocument::from_value(input.tree)?;
        let mut tree = build_tree(&document.root, input.reference_length)?;
        let queries: Vec<Query> = input.queries.into_iter().map(Query::from).collect();

        let report = attach_batch(
            &mut tree,
            queries,
            &self.options,
            self.progress_callback.as_ref(),
        )?;

        let tree = tree_to_document(&tree, document.envelope)?.into_value()?;
        Ok(AttachOutput { tree, report })
    }
}
