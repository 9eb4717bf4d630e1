//! # Workflows Module
//!
//! End-to-end procedures that tie the I/O-free engine components together.
//!
//! - **Epitope workflow** ([`epitopes`]) turns a parent sequence plus either
//!   user-supplied epitope rows or binding predictions into extended epitopes
//!   ready for display on a scaffold.
//! - **Ranking workflow** ([`rank`]) scores candidates from per-allele binding
//!   records, measures structural deviation against a reference, applies the
//!   configured filters and returns the ordered, truncated candidate list.
//!
//! Both report progress through a [`ProgressReporter`](crate::engine::progress::ProgressReporter)
//! and return [`EngineError`](crate::engine::error::EngineError) on failure.

pub mod epitopes;
pub mod rank;
