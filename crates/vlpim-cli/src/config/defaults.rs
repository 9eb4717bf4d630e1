use vlpim::core::models::candidate::ImmunogenicityMode;
use vlpim::engine::config::{
    DEFAULT_MAX_CANDIDATES, DEFAULT_MAX_EPITOPES, DEFAULT_MAX_RMSD, DEFAULT_NEUTRAL_SCORE,
    DEFAULT_SHORT_SEQUENCE_LENGTH, DEFAULT_SHORT_SEQUENCE_MAX_EPITOPES, DEFAULT_STRONG_THRESHOLD,
    DEFAULT_WEAK_THRESHOLD, InterfaceBounds, PruningConfig,
};

pub struct DefaultsConfig {
    pub target_length: usize,
    pub strong_threshold: f64,
    pub weak_threshold: f64,
    pub include_weak: bool,
    pub max_epitopes: usize,
    pub short_sequence_length: usize,
    pub short_sequence_max_epitopes: usize,
    pub mode: ImmunogenicityMode,
    pub neutral_score: f64,
    pub use_superimposer: bool,
    pub pruning: PruningConfig,
    pub max_rmsd: f64,
    pub max_candidates: usize,
    pub interface_bounds: InterfaceBounds,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            target_length: 15,
            strong_threshold: DEFAULT_STRONG_THRESHOLD,
            weak_threshold: DEFAULT_WEAK_THRESHOLD,
            include_weak: false,
            max_epitopes: DEFAULT_MAX_EPITOPES,
            short_sequence_length: DEFAULT_SHORT_SEQUENCE_LENGTH,
            short_sequence_max_epitopes: DEFAULT_SHORT_SEQUENCE_MAX_EPITOPES,
            mode: ImmunogenicityMode::Reduce,
            neutral_score: DEFAULT_NEUTRAL_SCORE,
            use_superimposer: true,
            pruning: PruningConfig::default(),
            max_rmsd: DEFAULT_MAX_RMSD,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            interface_bounds: InterfaceBounds::default(),
        }
    }
}
