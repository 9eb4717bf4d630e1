use crate::core::models::sequence::ProteinSequence;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum FastaError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("FASTA input contains no sequence residues")]
    EmptySequence,
    #[error("Invalid residue '{residue}' at position {position} of sequence '{id}'")]
    InvalidResidue {
        id: String,
        position: usize,
        residue: char,
    },
}

/// Reads the first record of a FASTA stream as the parent sequence.
///
/// A missing header is accepted and yields the id `sequence`. Later records are
/// ignored with a warning.
pub fn read_sequence(reader: &mut impl BufRead) -> Result<ProteinSequence, FastaError> {
    let mut id: Option<String> = None;
    let mut residues = String::new();
    let mut extra_records = 0usize;

    for line_res in reader.lines() {
        let line = line_res?;
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        if let Some(header) = line.strip_prefix('>') {
            if id.is_none() && residues.is_empty() {
                id = Some(
                    header
                        .split_whitespace()
                        .next()
                        .unwrap_or("sequence")
                        .to_string(),
                );
            } else {
                extra_records += 1;
            }
            continue;
        }
        if extra_records == 0 {
            residues.push_str(line);
        }
    }

    if extra_records > 0 {
        warn!(extra_records, "FASTA input has multiple records; using the first");
    }

    let sequence = ProteinSequence::new(id.unwrap_or_else(|| "sequence".to_string()), &residues);
    if sequence.is_empty() {
        return Err(FastaError::EmptySequence);
    }
    if let Some((index, residue)) = sequence.first_invalid_residue() {
        return Err(FastaError::InvalidResidue {
            id: sequence.id.clone(),
            position: index + 1,
            residue,
        });
    }
    Ok(sequence)
}

pub fn read_sequence_from_path<P: AsRef<Path>>(path: P) -> Result<ProteinSequence, FastaError> {
    let file = File::open(path)?;
    read_sequence(&mut BufReader::new(file))
}
