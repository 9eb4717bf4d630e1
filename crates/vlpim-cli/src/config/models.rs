use std::path::{Path, PathBuf};
use vlpim::engine::config::{PipelineConfig, SelectionConfig};

#[derive(Debug, Clone, PartialEq)]
pub enum EpitopeSourcePath {
    Predictions(PathBuf),
    Epitopes(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpitopesAppConfig {
    pub fasta_path: PathBuf,
    pub source: EpitopeSourcePath,
    pub output_path: PathBuf,
    pub selection: SelectionConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BindingSource {
    Records(PathBuf),
    Predictions(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankAppConfig {
    pub source: BindingSource,
    pub reference_path: PathBuf,
    pub manifest_path: PathBuf,
    pub output_path: PathBuf,
    pub pipeline: PipelineConfig,
}

/// `report.csv` -> `report.config.toml`, next to the output.
pub fn resolved_config_path(output: &Path) -> PathBuf {
    output.with_extension("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_config_sits_next_to_output() {
        assert_eq!(
            resolved_config_path(Path::new("runs/report.csv")),
            PathBuf::from("runs/report.config.toml")
        );
        assert_eq!(
            resolved_config_path(Path::new("epitopes")),
            PathBuf::from("epitopes.config.toml")
        );
    }
}
