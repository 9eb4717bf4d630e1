//! Readers and writers for the tabular and coordinate formats exchanged with
//! external predictors.
//!
//! Every format is handled by its own module with a dedicated error type.
//! Coordinate formats share the [`traits::CoordinateFile`] interface so that
//! callers can pick a reader from a file extension.

pub mod coordinates;
pub mod fasta;
pub mod netmhcii;
pub mod pdb;
pub mod tables;
pub mod traits;
