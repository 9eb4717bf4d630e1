//! # Engine Module
//!
//! The algorithmic components of the candidate ranking pipeline.
//!
//! ## Architecture
//!
//! - **Epitope selection** ([`epitope`]) - Validates user epitopes, selects predicted binding
//!   cores and extends them to a target peptide length
//! - **Immunogenicity scoring** ([`scoring`]) - Allele-scoped rank normalization, per-candidate
//!   aggregation and the mode transform
//! - **Structural deviation** ([`structure`]) - RMSD through a prioritized chain of
//!   superposition strategies ending in Kabsch
//! - **Interface assessment** ([`interface`]) - Quality grading and bound checks for
//!   externally computed interface metrics
//! - **Ranking** ([`ranking`]) - Joins scores, deviations and interface metrics into the final
//!   ordered result with rejected candidates kept for diagnosis
//! - **Configuration** ([`config`]), **progress reporting** ([`progress`]) and
//!   **errors** ([`error`])
//!
//! Every component is a pure function of already-materialized inputs. The only
//! cross-candidate step is normalization, which needs every candidate's values for an
//! allele before any score is final.

pub mod config;
pub mod epitope;
pub mod error;
pub mod interface;
pub mod progress;
pub mod ranking;
pub mod scoring;
pub mod structure;
