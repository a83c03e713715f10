use anyhow::{bail, Context, Result};
use bio::io::fasta;
use std::io::{BufReader, Read};
use std::path::Path;

/// Opens a file, transparently decompressing gzip/bzip2/xz/zstd input.
pub fn open_input(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let (reader, format) = niffler::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    tracing::debug!(path = %path.display(), ?format, "Opened input");
    Ok(BufReader::new(reader))
}

/// Length of the first record of a FASTA file.
pub fn reference_length_from_fasta(path: &Path) -> Result<usize> {
    let reader = fasta::Reader::new(open_input(path)?);
    let record = match reader.records().next() {
        Some(record) => record.with_context(|| format!("Failed to parse {}", path.display()))?,
        None => bail!("Reference {} contains no sequences", path.display()),
    };
    if record.seq().is_empty() {
        bail!("Reference sequence '{}' is empty", record.id());
    }
    Ok(record.seq().len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_length_of_first_record() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, ">ref\nACGTACGT\nACGT\n>other\nAC").unwrap();
        assert_eq!(reference_length_from_fasta(file.path()).unwrap(), 12);
    }

    #[test]
    fn empty_fasta_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(reference_length_from_fasta(file.path()).is_err());
    }
}
