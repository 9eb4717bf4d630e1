use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use vlpim::core::models::candidate::ImmunogenicityMode;
use vlpim::engine::config::{InterfaceBounds, PipelineConfig, PruningConfig, SelectionConfig};

/// On-disk configuration. Every key is optional; missing keys fall back to
/// built-in defaults.
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<FileSelectionConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scoring: Option<FileScoringConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure: Option<FileStructureConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranking: Option<FileRankingConfig>,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileSelectionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strong_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weak_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_weak: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_epitopes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_sequence_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_sequence_max_epitopes: Option<usize>,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileScoringConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ImmunogenicityMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neutral_score: Option<f64>,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileStructureConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_superimposer: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pruning: Option<FilePruningConfig>,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FilePruningConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prune_fraction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_retained: Option<usize>,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileRankingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_candidates: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rmsd_filter: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rmsd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface_filter: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface_bounds: Option<FileInterfaceBounds>,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileInterfaceBounds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_dg_dsasa: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_buns: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_packstat: Option<f64>,
}

impl From<&InterfaceBounds> for FileInterfaceBounds {
    fn from(bounds: &InterfaceBounds) -> Self {
        Self {
            max_dg_dsasa: Some(bounds.max_dg_dsasa),
            max_buns: Some(bounds.max_buns),
            min_packstat: Some(bounds.min_packstat),
        }
    }
}

impl From<&PruningConfig> for FilePruningConfig {
    fn from(pruning: &PruningConfig) -> Self {
        Self {
            enabled: Some(true),
            prune_fraction: Some(pruning.prune_fraction),
            max_iterations: Some(pruning.max_iterations),
            tolerance: Some(pruning.tolerance),
            min_retained: Some(pruning.min_retained),
        }
    }
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading configuration file: {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|e| CliError::parsing(path, e))?;
        toml::from_str(&content).map_err(|e| CliError::parsing(path, e))
    }

    /// A fully populated file config that reproduces `selection` when read back.
    pub fn from_selection(selection: &SelectionConfig) -> Self {
        Self {
            selection: Some(FileSelectionConfig {
                target_length: Some(selection.target_length),
                strong_threshold: Some(selection.strong_threshold),
                weak_threshold: Some(selection.weak_threshold),
                include_weak: Some(selection.include_weak),
                max_epitopes: Some(selection.max_epitopes),
                short_sequence_length: Some(selection.short_sequence_length),
                short_sequence_max_epitopes: Some(selection.short_sequence_max_epitopes),
            }),
            ..Default::default()
        }
    }

    /// A fully populated file config that reproduces `pipeline` when read back.
    pub fn from_pipeline(pipeline: &PipelineConfig) -> Self {
        let pruning: FilePruningConfig = match &pipeline.structure.pruning {
            Some(pruning) => pruning.into(),
            None => FilePruningConfig {
                enabled: Some(false),
                ..Default::default()
            },
        };
        Self {
            scoring: Some(FileScoringConfig {
                mode: Some(pipeline.scoring.mode),
                neutral_score: Some(pipeline.scoring.neutral_score),
            }),
            structure: Some(FileStructureConfig {
                use_superimposer: Some(pipeline.structure.use_superimposer),
                pruning: Some(pruning),
            }),
            ranking: Some(FileRankingConfig {
                max_candidates: Some(pipeline.ranking.max_candidates),
                rmsd_filter: Some(pipeline.ranking.max_rmsd.is_some()),
                max_rmsd: pipeline.ranking.max_rmsd,
                interface_filter: Some(pipeline.ranking.interface_bounds.is_some()),
                interface_bounds: pipeline.ranking.interface_bounds.as_ref().map(Into::into),
            }),
            ..Default::default()
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize configuration: {}", e)))
    }
}
