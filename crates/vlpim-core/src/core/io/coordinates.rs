use crate::core::io::traits::CoordinateFile;
use crate::core::models::structure::{CoordinateSet, ResidueKey};
use nalgebra::Point3;
use serde::Deserialize;
use std::io::{self, BufRead};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinateCsvError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Row {row}: residue keys must be given for every row or for none")]
    PartialKeys { row: usize },
    #[error("No coordinates found")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct CoordinateRow {
    x: f64,
    y: f64,
    z: f64,
    #[serde(default)]
    chain: Option<char>,
    #[serde(default)]
    residue: Option<isize>,
}

/// Coordinate sets stored as CSV with `x,y,z` columns and optional
/// `chain,residue` keys.
pub struct CoordinateCsvFile;

impl CoordinateFile for CoordinateCsvFile {
    type Error = CoordinateCsvError;

    fn read_from(reader: &mut impl BufRead) -> Result<CoordinateSet, Self::Error> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut points = Vec::new();
        let mut keys = Vec::new();
        let mut keyed_rows = 0usize;

        for (index, result) in csv_reader.deserialize::<CoordinateRow>().enumerate() {
            let row = result?;
            points.push(Point3::new(row.x, row.y, row.z));
            match (row.chain, row.residue) {
                (Some(chain_id), Some(residue_number)) => {
                    keyed_rows += 1;
                    keys.push(ResidueKey::new(chain_id, residue_number));
                }
                (None, None) => {}
                _ => return Err(CoordinateCsvError::PartialKeys { row: index + 1 }),
            }
            if keyed_rows != 0 && keyed_rows != points.len() {
                return Err(CoordinateCsvError::PartialKeys { row: index + 1 });
            }
        }

        if points.is_empty() {
            return Err(CoordinateCsvError::Empty);
        }
        let keys = (keyed_rows == points.len()).then_some(keys);
        Ok(CoordinateSet { points, keys })
    }
}
