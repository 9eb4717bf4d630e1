use crate::core::io::traits::CoordinateFile;
use crate::core::models::structure::{CoordinateSet, ResidueKey};
use crate::core::utils::identifiers::one_letter_code;
use nalgebra::Point3;
use std::collections::HashSet;
use std::io::{self, BufRead};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("No C-alpha atoms found")]
    NoAtoms,
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Line is too short for ATOM record (must be at least 54 chars)")]
    LineTooShort,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

fn parse_float(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.to_string(),
        },
    })
}

/// Reads C-alpha atoms of standard residues from fixed-column PDB records.
///
/// Only the first model is read. For atoms with alternate locations, the
/// first location seen for a residue wins. Each point is keyed by chain and
/// residue number.
pub struct PdbFile;

impl CoordinateFile for PdbFile {
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<CoordinateSet, Self::Error> {
        let mut points = Vec::new();
        let mut keys = Vec::new();
        let mut seen: HashSet<ResidueKey> = HashSet::new();

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;

            let record_type = slice_and_trim(&line, 0, 6);
            if record_type == "ENDMDL" {
                break;
            }
            if record_type != "ATOM" {
                continue;
            }
            if line.len() < 54 {
                return Err(PdbError::Parse {
                    line: line_num,
                    kind: PdbParseErrorKind::LineTooShort,
                });
            }
            if slice_and_trim(&line, 12, 16) != "CA" {
                continue;
            }
            if one_letter_code(slice_and_trim(&line, 17, 20)).is_none() {
                continue;
            }

            let chain_id = line
                .get(21..22)
                .and_then(|s| s.chars().next())
                .filter(|c| !c.is_whitespace())
                .unwrap_or('A');
            let res_num_str = slice_and_trim(&line, 22, 26);
            let residue_number: isize = res_num_str.parse().map_err(|_| PdbError::Parse {
                line: line_num,
                kind: PdbParseErrorKind::InvalidInt {
                    columns: "23-26".into(),
                    value: res_num_str.to_string(),
                },
            })?;
            let insertion_code = line.get(26..27).and_then(|s| s.chars().next()).unwrap_or(' ');

            let key = ResidueKey::new(chain_id, residue_number).with_insertion_code(insertion_code);
            if !seen.insert(key) {
                debug!(line = line_num, residue = %key, "Skipping alternate location");
                continue;
            }

            let x = parse_float(&line, line_num, 30, 38)?;
            let y = parse_float(&line, line_num, 38, 46)?;
            let z = parse_float(&line, line_num, 46, 54)?;
            points.push(Point3::new(x, y, z));
            keys.push(key);
        }

        if points.is_empty() {
            return Err(PdbError::NoAtoms);
        }
        Ok(CoordinateSet {
            points,
            keys: Some(keys),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    const PDB: &str = "\
HEADER    TEST STRUCTURE
ATOM      1  N   MET A   1      11.104   6.134  -6.504  1.00  0.00           N
ATOM      2  CA  MET A   1      11.639   6.071  -5.147  1.00  0.00           C
ATOM      3  CA AGLY A   2      12.000   7.000  -4.000  0.50  0.00           C
ATOM      4  CA BGLY A   2      12.500   7.500  -4.500  0.50  0.00           C
HETATM    5  O   HOH A 101       1.000   1.000   1.000  1.00  0.00           O
ATOM      6  CA  LYS B  10      -1.000   2.000   3.500  1.00  0.00           C
ENDMDL
ATOM      7  CA  LYS B  11      -1.000   2.000   3.500  1.00  0.00           C
";

    #[test]
    fn read_from_keeps_first_model_ca_atoms_with_keys() {
        let set = PdbFile::read_from(&mut Cursor::new(PDB)).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.points[0], Point3::new(11.639, 6.071, -5.147));
        assert_eq!(set.points[1], Point3::new(12.0, 7.0, -4.0));
        let keys = set.keys.unwrap();
        assert_eq!(keys[2], ResidueKey::new('B', 10));
    }

    #[test]
    fn read_from_keeps_insertion_codes_distinct() {
        let pdb = "\
ATOM      1  CA  SER H  52      10.000   0.000   0.000  1.00  0.00           C
ATOM      2  CA  TYR H  52A     13.800   0.000   0.000  1.00  0.00           C
ATOM      3  CA BTYR H  52A     14.000   0.500   0.000  0.50  0.00           C
ATOM      4  CA  GLY H  53      17.600   0.000   0.000  1.00  0.00           C
";
        let set = PdbFile::read_from(&mut Cursor::new(pdb)).unwrap();
        assert_eq!(set.len(), 3);
        let keys = set.keys.unwrap();
        assert_eq!(keys[0], ResidueKey::new('H', 52));
        assert_eq!(keys[1], ResidueKey::new('H', 52).with_insertion_code('A'));
        assert_ne!(keys[0], keys[1]);
        assert_eq!(keys[1].to_string(), "H52A");
    }

    #[test]
    fn read_from_rejects_malformed_coordinates() {
        let line = "ATOM      2  CA  MET A   1      11.6x9   6.071  -5.147  1.00  0.00           C\n";
        let err = PdbFile::read_from(&mut Cursor::new(line)).unwrap_err();
        assert!(matches!(
            err,
            PdbError::Parse {
                line: 1,
                kind: PdbParseErrorKind::InvalidFloat { .. }
            }
        ));
    }

    #[test]
    fn read_from_without_atoms_is_an_error() {
        let err = PdbFile::read_from(&mut Cursor::new("HEADER\nEND\n")).unwrap_err();
        assert!(matches!(err, PdbError::NoAtoms));
    }

    #[test]
    fn read_from_path_reads_file_on_disk() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(PDB.as_bytes()).unwrap();
        let set = PdbFile::read_from_path(file.path()).unwrap();
        assert_eq!(set.len(), 3);
    }
}
