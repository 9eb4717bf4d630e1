use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpitopeSource {
    User,
    Predicted,
}

impl fmt::Display for EpitopeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EpitopeSource::User => write!(f, "user"),
            EpitopeSource::Predicted => write!(f, "predicted"),
        }
    }
}

/// A core epitope located in a parent sequence.
///
/// `start` and `end` are inclusive 1-based positions, so a well-formed epitope
/// satisfies `end - start + 1 == sequence.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Epitope {
    pub id: String,
    pub sequence: String,
    pub start: usize,
    pub end: usize,
    pub source: EpitopeSource,
}

impl Epitope {
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn span_is_consistent(&self) -> bool {
        self.start >= 1 && self.end >= self.start && self.end - self.start + 1 == self.sequence.len()
    }

    pub fn fits_within(&self, parent_len: usize) -> bool {
        self.start >= 1 && self.end <= parent_len
    }
}

/// A raw user-supplied epitope row before validation.
///
/// Positions are signed so that negative or zero offsets can be reported as
/// validation failures rather than rejected by the CSV deserializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpitopeRow {
    pub sequence: String,
    pub start: i64,
    pub end: i64,
}

/// A core epitope extended with flanking residues towards a target length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtendedEpitope {
    pub core: Epitope,
    pub sequence: String,
    pub start: usize,
    pub end: usize,
    /// Set when the parent sequence could not supply the full target length.
    pub truncated: bool,
}

impl ExtendedEpitope {
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn contains_core(&self) -> bool {
        self.start <= self.core.start
            && self.core.end <= self.end
            && self
                .sequence
                .get(self.core.start - self.start..=self.core.end - self.start)
                .is_some_and(|window| window == self.core.sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn epitope(sequence: &str, start: usize, end: usize) -> Epitope {
        Epitope {
            id: "E001".to_string(),
            sequence: sequence.to_string(),
            start,
            end,
            source: EpitopeSource::User,
        }
    }

    #[test]
    fn span_is_consistent_checks_length_against_positions() {
        assert!(epitope("KLAT", 3, 6).span_is_consistent());
        assert!(!epitope("KLAT", 3, 7).span_is_consistent());
        assert!(!epitope("KLAT", 0, 3).span_is_consistent());
    }

    #[test]
    fn fits_within_checks_parent_bounds() {
        assert!(epitope("KLAT", 3, 6).fits_within(6));
        assert!(!epitope("KLAT", 3, 6).fits_within(5));
    }

    #[test]
    fn contains_core_finds_core_as_contiguous_window() {
        let extended = ExtendedEpitope {
            core: epitope("KLAT", 3, 6),
            sequence: "YVKLATQ".to_string(),
            start: 1,
            end: 7,
            truncated: false,
        };
        assert!(extended.contains_core());

        let shifted = ExtendedEpitope {
            sequence: "YKLAVTQ".to_string(),
            ..extended
        };
        assert!(!shifted.contains_core());
    }
}
