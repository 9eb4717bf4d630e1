//! # Core Models Module
//!
//! Plain data types shared by every stage of the pipeline. Each entity is produced by
//! exactly one engine component and is treated as read-only afterwards.
//!
//! - [`sequence`] - The parent protein sequence
//! - [`epitope`] - Epitope cores, user-supplied rows, and context-extended epitopes
//! - [`binding`] - Raw predictor rows, per-allele binding records and normalized scores
//! - [`structure`] - Coordinate sets and matched structure pairs
//! - [`candidate`] - Immunogenicity scores, RMSD results, interface metrics and rankings

pub mod binding;
pub mod candidate;
pub mod epitope;
pub mod sequence;
pub mod structure;
