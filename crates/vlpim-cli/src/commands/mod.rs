pub mod epitopes;
pub mod rank;

use crate::config::{FileConfig, resolved_config_path};
use crate::error::{CliError, Result};
use crate::utils::parser::{CoordinateFormat, coordinate_format};
use std::path::{Path, PathBuf};
use tracing::info;
use vlpim::core::io::coordinates::CoordinateCsvFile;
use vlpim::core::io::pdb::PdbFile;
use vlpim::core::io::traits::CoordinateFile;
use vlpim::core::models::structure::CoordinateSet;

/// Reads CA coordinates, choosing the parser from the file extension.
pub fn read_coordinates(path: &Path) -> Result<CoordinateSet> {
    let format =
        coordinate_format(path).map_err(|e| CliError::Argument(e.to_string()))?;
    let coordinates = match format {
        CoordinateFormat::Pdb => {
            PdbFile::read_from_path(path).map_err(|e| CliError::parsing(path, e))?
        }
        CoordinateFormat::Csv => {
            CoordinateCsvFile::read_from_path(path).map_err(|e| CliError::parsing(path, e))?
        }
    };
    info!(
        "Loaded {} coordinates from {:?}",
        coordinates.len(),
        path
    );
    Ok(coordinates)
}

/// Writes the fully resolved configuration next to `output` and returns its path.
pub fn write_resolved_config(output: &Path, config: &FileConfig) -> Result<PathBuf> {
    let path = resolved_config_path(output);
    let content = config.to_toml()?;
    std::fs::write(&path, content).map_err(|e| CliError::writing(&path, e))?;
    info!("Resolved configuration written to {:?}", &path);
    Ok(path)
}
