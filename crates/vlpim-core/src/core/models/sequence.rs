use crate::core::utils::identifiers::first_invalid_residue;
use std::fmt;

/// The parent protein sequence that epitopes are located in.
///
/// Residues are stored upper-cased. Positions exposed by this type are 1-based,
/// matching the convention of epitope predictors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProteinSequence {
    pub id: String,
    residues: String,
}

impl ProteinSequence {
    pub fn new(id: impl Into<String>, residues: &str) -> Self {
        Self {
            id: id.into(),
            residues: residues
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| c.to_ascii_uppercase())
                .collect(),
        }
    }

    pub fn residues(&self) -> &str {
        &self.residues
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// Returns the residues covering the inclusive 1-based window `[start, end]`,
    /// or `None` when the window leaves the sequence.
    pub fn window(&self, start: usize, end: usize) -> Option<&str> {
        if start == 0 || end < start || end > self.len() {
            return None;
        }
        self.residues.get(start - 1..end)
    }

    pub fn first_invalid_residue(&self) -> Option<(usize, char)> {
        first_invalid_residue(&self.residues)
    }
}

impl fmt::Display for ProteinSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} aa)", self.id, self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_strips_whitespace_and_uppercases() {
        let seq = ProteinSequence::new("vlp", "mkt ayi\nakq");
        assert_eq!(seq.residues(), "MKTAYIAKQ");
        assert_eq!(seq.len(), 9);
    }

    #[test]
    fn window_uses_inclusive_one_based_positions() {
        let seq = ProteinSequence::new("vlp", "MKTAYIAKQ");
        assert_eq!(seq.window(1, 3), Some("MKT"));
        assert_eq!(seq.window(7, 9), Some("AKQ"));
        assert_eq!(seq.window(5, 5), Some("Y"));
    }

    #[test]
    fn window_rejects_out_of_bounds_or_inverted_ranges() {
        let seq = ProteinSequence::new("vlp", "MKTAYIAKQ");
        assert_eq!(seq.window(0, 3), None);
        assert_eq!(seq.window(8, 10), None);
        assert_eq!(seq.window(5, 4), None);
    }
}
