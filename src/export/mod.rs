//! Placement report written next to the output tree.

use crate::placement::BatchReport;
use std::io::{self, Write};

const HEADER: &str = "Query\tStatus\tNearest_Node\tAttached_To\tSplit_Node\tLeaf\tPrivate_Mutations\tNote";

/// Writes one TSV row per query, placed ones first.
pub fn write_placement_report<W: Write>(report: &BatchReport, mut writer: W) -> io::Result<()> {
    writeln!(writer, "{}", HEADER)?;
    for placement in &report.placements {
        writeln!(
            writer,
            "{}\tplaced\t{}\t{}\t{}\t{}\t{}\t",
            placement.query,
            placement.nearest_node,
            placement.attached_to_name,
            placement
                .split_node
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
            placement.leaf_name,
            placement.private_mutations,
        )?;
    }
    for skipped in &report.skipped {
        writeln!(writer, "{}\tskipped\t-\t-\t-\t-\t-\t{}", skipped.query, skipped.reason)?;
    }
    writer.flush()
}
