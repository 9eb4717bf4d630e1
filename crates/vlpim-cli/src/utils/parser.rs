use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error(
        "Cannot infer coordinate format for '{0}'. Expected a '.pdb', '.ent' or '.csv' extension."
    )]
    UnknownCoordinateFormat(String),
}

/// Structure file formats accepted for reference and candidate coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateFormat {
    Pdb,
    Csv,
}

pub fn coordinate_format(path: &Path) -> Result<CoordinateFormat, ParseError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("pdb") | Some("ent") => Ok(CoordinateFormat::Pdb),
        Some("csv") => Ok(CoordinateFormat::Csv),
        _ => Err(ParseError::UnknownCoordinateFormat(
            path.display().to_string(),
        )),
    }
}

/// Relative structure paths in a manifest are resolved against the manifest's directory.
pub fn resolve_manifest_path(manifest: &Path, entry: &Path) -> PathBuf {
    if entry.is_absolute() {
        return entry.to_path_buf();
    }
    match manifest.parent() {
        Some(dir) => dir.join(entry),
        None => entry.to_path_buf(),
    }
}
