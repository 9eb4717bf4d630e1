//! # Core Module
//!
//! Fundamental data structures and I/O for candidate ranking.
//!
//! - **Data Models** ([`models`]) - Epitopes, binding records, candidates and coordinate sets
//! - **File I/O** ([`io`]) - FASTA, predictor output, PDB, and CSV tables
//! - **Utilities** ([`utils`]) - Residue alphabets and coordinate geometry

pub mod io;
pub mod models;
pub mod utils;
