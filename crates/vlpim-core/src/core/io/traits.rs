use crate::core::models::structure::CoordinateSet;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Defines the interface for reading coordinate sets from a file format.
///
/// Implementors only handle parsing from a buffered reader; opening files is
/// provided by [`CoordinateFile::read_from_path`].
pub trait CoordinateFile {
    /// The error type for parse and I/O failures.
    type Error: Error + From<io::Error>;

    /// Reads a coordinate set from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or the reader fails.
    fn read_from(reader: &mut impl BufRead) -> Result<CoordinateSet, Self::Error>;

    /// Reads a coordinate set from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<CoordinateSet, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }
}
