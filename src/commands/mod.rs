pub mod attach;
pub mod validate;

use crate::cli::ReferenceArgs;
use crate::utils::input::reference_length_from_fasta;
use anyhow::{bail, Result};

pub(crate) fn resolve_reference_length(args: &ReferenceArgs) -> Result<usize> {
    match (args.reference_length, &args.reference) {
        (Some(0), _) => bail!("Reference length must be positive"),
        (Some(length), _) => Ok(length),
        (None, Some(path)) => reference_length_from_fasta(path),
        (None, None) => bail!("Either --reference or --reference-length is required"),
    }
}
