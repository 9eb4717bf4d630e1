//! # VLPIM Core Library
//!
//! Ranks protein sequence variants ("candidates") by predicted immunogenicity and by
//! structural fidelity to a reference fold.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture with a strict one-way data flow.
//!
//! - **[`core`]: The Foundation.** Stateless data models (epitopes, binding records,
//!   coordinate sets, ranked candidates), readers and writers for the tables and
//!   structure files exchanged with external predictors, and geometry utilities.
//!
//! - **[`engine`]: The Logic Core.** The algorithmic components: epitope core selection
//!   and extension, allele-scoped rank normalization and mode-aware score aggregation,
//!   the prioritized superposition chain that produces an RMSD per candidate, and the
//!   final threshold-filtered ranking.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures that tie the engine and
//!   core together. External tools (structure aligners) are injected as trait objects,
//!   so every workflow can be exercised with synthetic inputs.

pub mod core;
pub mod engine;
pub mod workflows;
