use crate::core::models::candidate::ImmunogenicityMode;
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_STRONG_THRESHOLD: f64 = 1.0;
pub const DEFAULT_WEAK_THRESHOLD: f64 = 5.0;
pub const DEFAULT_MAX_EPITOPES: usize = 10;
pub const DEFAULT_SHORT_SEQUENCE_LENGTH: usize = 200;
pub const DEFAULT_SHORT_SEQUENCE_MAX_EPITOPES: usize = 3;
pub const DEFAULT_NEUTRAL_SCORE: f64 = 50.0;
pub const DEFAULT_MAX_RMSD: f64 = 2.0;
pub const DEFAULT_MAX_CANDIDATES: usize = 10;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

/// Controls how epitope cores are chosen and how far they are extended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionConfig {
    pub target_length: usize,
    pub strong_threshold: f64,
    pub weak_threshold: f64,
    pub include_weak: bool,
    pub max_epitopes: usize,
    pub short_sequence_length: usize,
    pub short_sequence_max_epitopes: usize,
}

impl SelectionConfig {
    /// Number of cores to keep for a parent of the given length.
    pub fn max_epitopes_for(&self, parent_len: usize) -> usize {
        if parent_len < self.short_sequence_length {
            self.max_epitopes.min(self.short_sequence_max_epitopes)
        } else {
            self.max_epitopes
        }
    }
}

#[derive(Default)]
pub struct SelectionConfigBuilder {
    target_length: Option<usize>,
    strong_threshold: Option<f64>,
    weak_threshold: Option<f64>,
    include_weak: Option<bool>,
    max_epitopes: Option<usize>,
    short_sequence_length: Option<usize>,
    short_sequence_max_epitopes: Option<usize>,
}

impl SelectionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target_length(mut self, length: usize) -> Self {
        self.target_length = Some(length);
        self
    }
    pub fn strong_threshold(mut self, threshold: f64) -> Self {
        self.strong_threshold = Some(threshold);
        self
    }
    pub fn weak_threshold(mut self, threshold: f64) -> Self {
        self.weak_threshold = Some(threshold);
        self
    }
    pub fn include_weak(mut self, include: bool) -> Self {
        self.include_weak = Some(include);
        self
    }
    pub fn max_epitopes(mut self, n: usize) -> Self {
        self.max_epitopes = Some(n);
        self
    }
    pub fn short_sequence_length(mut self, length: usize) -> Self {
        self.short_sequence_length = Some(length);
        self
    }
    pub fn short_sequence_max_epitopes(mut self, n: usize) -> Self {
        self.short_sequence_max_epitopes = Some(n);
        self
    }

    pub fn build(self) -> Result<SelectionConfig, ConfigError> {
        let config = SelectionConfig {
            target_length: self
                .target_length
                .ok_or(ConfigError::MissingParameter("target_length"))?,
            strong_threshold: self.strong_threshold.unwrap_or(DEFAULT_STRONG_THRESHOLD),
            weak_threshold: self.weak_threshold.unwrap_or(DEFAULT_WEAK_THRESHOLD),
            include_weak: self.include_weak.unwrap_or(false),
            max_epitopes: self.max_epitopes.unwrap_or(DEFAULT_MAX_EPITOPES),
            short_sequence_length: self
                .short_sequence_length
                .unwrap_or(DEFAULT_SHORT_SEQUENCE_LENGTH),
            short_sequence_max_epitopes: self
                .short_sequence_max_epitopes
                .unwrap_or(DEFAULT_SHORT_SEQUENCE_MAX_EPITOPES),
        };

        if config.target_length == 0 {
            return Err(invalid("target_length", "must be at least 1"));
        }
        if !(config.strong_threshold.is_finite() && config.strong_threshold > 0.0) {
            return Err(invalid("strong_threshold", "must be a positive number"));
        }
        if !(config.weak_threshold.is_finite() && config.weak_threshold >= config.strong_threshold)
        {
            return Err(invalid(
                "weak_threshold",
                format!("must be at least strong_threshold ({})", config.strong_threshold),
            ));
        }
        if config.max_epitopes == 0 {
            return Err(invalid("max_epitopes", "must be at least 1"));
        }
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringConfig {
    pub mode: ImmunogenicityMode,
    /// Normalized value given to every entry of an allele whose raw values are
    /// all identical.
    pub neutral_score: f64,
}

/// Parameters of the iterative outlier-pruning superposition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PruningConfig {
    pub prune_fraction: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub min_retained: usize,
}

impl Default for PruningConfig {
    fn default() -> Self {
        Self {
            prune_fraction: 0.1,
            max_iterations: 10,
            tolerance: 1e-3,
            min_retained: 3,
        }
    }
}

impl PruningConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.prune_fraction > 0.0 && self.prune_fraction < 1.0) {
            return Err(invalid("prune_fraction", "must be in (0, 1)"));
        }
        if self.max_iterations == 0 {
            return Err(invalid("max_iterations", "must be at least 1"));
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(invalid("tolerance", "must be a non-negative number"));
        }
        if self.min_retained < 3 {
            return Err(invalid("min_retained", "must be at least 3"));
        }
        Ok(())
    }
}

/// Which non-terminal superposition strategies are enabled. Kabsch is always on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureConfig {
    pub use_external: bool,
    /// `None` disables the pruning strategy.
    pub pruning: Option<PruningConfig>,
    pub use_superimposer: bool,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            use_external: true,
            pruning: Some(PruningConfig::default()),
            use_superimposer: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InterfaceBounds {
    pub max_dg_dsasa: f64,
    pub max_buns: f64,
    pub min_packstat: f64,
}

impl Default for InterfaceBounds {
    fn default() -> Self {
        Self {
            max_dg_dsasa: -0.5,
            max_buns: 5.0,
            min_packstat: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingConfig {
    /// `None` disables the RMSD threshold.
    pub max_rmsd: Option<f64>,
    /// `None` disables interface filtering.
    pub interface_bounds: Option<InterfaceBounds>,
    pub max_candidates: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            max_rmsd: Some(DEFAULT_MAX_RMSD),
            interface_bounds: Some(InterfaceBounds::default()),
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineConfig {
    pub scoring: ScoringConfig,
    pub structure: StructureConfig,
    pub ranking: RankingConfig,
}

#[derive(Default)]
pub struct PipelineConfigBuilder {
    mode: Option<ImmunogenicityMode>,
    neutral_score: Option<f64>,
    use_external: Option<bool>,
    pruning: Option<Option<PruningConfig>>,
    use_superimposer: Option<bool>,
    max_rmsd: Option<Option<f64>>,
    interface_bounds: Option<Option<InterfaceBounds>>,
    max_candidates: Option<usize>,
}

impl PipelineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: ImmunogenicityMode) -> Self {
        self.mode = Some(mode);
        self
    }
    pub fn neutral_score(mut self, score: f64) -> Self {
        self.neutral_score = Some(score);
        self
    }
    pub fn use_external(mut self, enabled: bool) -> Self {
        self.use_external = Some(enabled);
        self
    }
    pub fn pruning(mut self, pruning: Option<PruningConfig>) -> Self {
        self.pruning = Some(pruning);
        self
    }
    pub fn use_superimposer(mut self, enabled: bool) -> Self {
        self.use_superimposer = Some(enabled);
        self
    }
    pub fn max_rmsd(mut self, max_rmsd: Option<f64>) -> Self {
        self.max_rmsd = Some(max_rmsd);
        self
    }
    pub fn interface_bounds(mut self, bounds: Option<InterfaceBounds>) -> Self {
        self.interface_bounds = Some(bounds);
        self
    }
    pub fn max_candidates(mut self, n: usize) -> Self {
        self.max_candidates = Some(n);
        self
    }

    pub fn build(self) -> Result<PipelineConfig, ConfigError> {
        let structure_defaults = StructureConfig::default();
        let ranking_defaults = RankingConfig::default();

        let config = PipelineConfig {
            scoring: ScoringConfig {
                mode: self.mode.ok_or(ConfigError::MissingParameter("mode"))?,
                neutral_score: self.neutral_score.unwrap_or(DEFAULT_NEUTRAL_SCORE),
            },
            structure: StructureConfig {
                use_external: self.use_external.unwrap_or(structure_defaults.use_external),
                pruning: self.pruning.unwrap_or(structure_defaults.pruning),
                use_superimposer: self
                    .use_superimposer
                    .unwrap_or(structure_defaults.use_superimposer),
            },
            ranking: RankingConfig {
                max_rmsd: self.max_rmsd.unwrap_or(ranking_defaults.max_rmsd),
                interface_bounds: self
                    .interface_bounds
                    .unwrap_or(ranking_defaults.interface_bounds),
                max_candidates: self
                    .max_candidates
                    .unwrap_or(ranking_defaults.max_candidates),
            },
        };

        if !(0.0..=100.0).contains(&config.scoring.neutral_score) {
            return Err(invalid("neutral_score", "must be within [0, 100]"));
        }
        if let Some(pruning) = &config.structure.pruning {
            pruning.validate()?;
        }
        if let Some(max_rmsd) = config.ranking.max_rmsd {
            if !(max_rmsd.is_finite() && max_rmsd >= 0.0) {
                return Err(invalid("max_rmsd", "must be a non-negative number"));
            }
        }
        if config.ranking.max_candidates == 0 {
            return Err(invalid("max_candidates", "must be at least 1"));
        }
        Ok(config)
    }
}
