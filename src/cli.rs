use crate::placement::UnknownTargetPolicy;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Log filter (e.g. "info", "treebuilder=debug")
    #[arg(long, global = true, default_value = "info")]
    pub log: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Attach analyzed sequences to a reference tree
    Attach(AttachArgs),

    /// Load a reference tree and check its structure
    Validate {
        /// Reference tree (Auspice JSON, optionally compressed)
        tree_file: PathBuf,

        #[command(flatten)]
        reference: ReferenceArgs,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct AttachArgs {
    /// Reference tree (Auspice JSON, optionally compressed)
    pub tree_file: PathBuf,

    /// Placement results with nearest nodes and private mutations (JSON)
    pub queries_file: PathBuf,

    /// Output file for the extended tree
    #[arg(short = 'o', long = "output", default_value = "tree_attached.json")]
    pub output_file: PathBuf,

    #[command(flatten)]
    pub reference: ReferenceArgs,

    /// Optional TSV report with one line per query
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// What to do with queries whose nearest node is not in the tree
    #[arg(long, value_enum)]
    pub on_unknown_target: Option<UnknownTargetPolicy>,

    /// Keep child order as produced by placement
    #[arg(long)]
    pub no_ladderize: bool,

    /// Config file (defaults to the user config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Length of the reference sequence, given directly or read from a FASTA.
#[derive(ClapArgs, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct ReferenceArgs {
    /// Reference sequence (FASTA, first record is used)
    #[arg(long)]
    pub reference: Option<PathBuf>,

    /// Reference sequence length in nucleotides
    #[arg(long)]
    pub reference_length: Option<usize>,
}
