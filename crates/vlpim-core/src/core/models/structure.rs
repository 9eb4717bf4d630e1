use nalgebra::Point3;
use std::fmt;

/// Identifies a residue by chain, author residue number and insertion code.
///
/// A blank insertion code is stored as `' '`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResidueKey {
    pub chain_id: char,
    pub residue_number: isize,
    pub insertion_code: char,
}

impl ResidueKey {
    pub fn new(chain_id: char, residue_number: isize) -> Self {
        Self {
            chain_id,
            residue_number,
            insertion_code: ' ',
        }
    }

    pub fn with_insertion_code(self, insertion_code: char) -> Self {
        Self {
            insertion_code,
            ..self
        }
    }
}

impl fmt::Display for ResidueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.chain_id, self.residue_number)?;
        if self.insertion_code != ' ' {
            write!(f, "{}", self.insertion_code)?;
        }
        Ok(())
    }
}

/// An ordered set of atom positions, optionally keyed by residue.
///
/// When present, `keys` has the same length as `points`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CoordinateSet {
    pub points: Vec<Point3<f64>>,
    pub keys: Option<Vec<ResidueKey>>,
}

impl CoordinateSet {
    pub fn new(points: Vec<Point3<f64>>) -> Self {
        Self { points, keys: None }
    }

    /// Returns `None` if the key list does not match the point count.
    pub fn with_keys(points: Vec<Point3<f64>>, keys: Vec<ResidueKey>) -> Option<Self> {
        (points.len() == keys.len()).then_some(Self {
            points,
            keys: Some(keys),
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_finite(&self) -> bool {
        self.points
            .iter()
            .all(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite())
    }
}

/// Reference and predicted points in one-to-one correspondence.
#[derive(Debug, Clone, PartialEq)]
pub struct StructurePair {
    reference: Vec<Point3<f64>>,
    predicted: Vec<Point3<f64>>,
}

impl StructurePair {
    pub fn new(reference: Vec<Point3<f64>>, predicted: Vec<Point3<f64>>) -> Option<Self> {
        (reference.len() == predicted.len() && !reference.is_empty()).then_some(Self {
            reference,
            predicted,
        })
    }

    pub fn reference(&self) -> &[Point3<f64>] {
        &self.reference
    }

    pub fn predicted(&self) -> &[Point3<f64>] {
        &self.predicted
    }

    pub fn len(&self) -> usize {
        self.reference.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reference.is_empty()
    }

    /// Keeps only the pairs whose index is in `indices`, preserving their order.
    pub fn subset(&self, indices: &[usize]) -> Option<Self> {
        let reference = indices
            .iter()
            .map(|&i| self.reference.get(i).copied())
            .collect::<Option<Vec<_>>>()?;
        let predicted = indices
            .iter()
            .map(|&i| self.predicted.get(i).copied())
            .collect::<Option<Vec<_>>>()?;
        Self::new(reference, predicted)
    }
}
