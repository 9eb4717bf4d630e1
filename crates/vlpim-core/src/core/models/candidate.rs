use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether the pipeline optimizes for lower or higher predicted immunogenicity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImmunogenicityMode {
    #[default]
    Reduce,
    Enhance,
}

impl fmt::Display for ImmunogenicityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImmunogenicityMode::Reduce => write!(f, "reduce"),
            ImmunogenicityMode::Enhance => write!(f, "enhance"),
        }
    }
}

impl FromStr for ImmunogenicityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reduce" => Ok(ImmunogenicityMode::Reduce),
            "enhance" => Ok(ImmunogenicityMode::Enhance),
            other => Err(format!(
                "unknown mode '{}', expected 'reduce' or 'enhance'",
                other
            )),
        }
    }
}

/// One immunogenicity score per candidate. For a fixed mode, a lower
/// `overall_score` is always more favorable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateImmunogenicityScore {
    pub candidate_id: String,
    pub overall_score: f64,
    /// Sum of normalized allele scores before the mode transform.
    pub raw_aggregate: f64,
    pub pair_count: usize,
    pub mode: ImmunogenicityMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RmsdMethod {
    ExternalPrimary,
    IterativePruned,
    Superimposer,
    Kabsch,
}

impl RmsdMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RmsdMethod::ExternalPrimary => "external_primary",
            RmsdMethod::IterativePruned => "iterative_pruned",
            RmsdMethod::Superimposer => "superimposer",
            RmsdMethod::Kabsch => "kabsch",
        }
    }
}

impl fmt::Display for RmsdMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Unavailable(String),
    Succeeded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyAttempt {
    pub method: RmsdMethod,
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RmsdResult {
    pub candidate_id: String,
    pub value: f64,
    pub method_used: RmsdMethod,
    /// Number of matched atoms the reported value was computed over.
    pub retained_atoms: usize,
    /// Every strategy tried, in order, ending with the one that succeeded.
    pub attempts: Vec<StrategyAttempt>,
}

/// Interface metrics produced by an external docking/interface analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterfaceMetrics {
    pub dg_dsasa: f64,
    pub packstat: f64,
    pub buns: f64,
    pub interface_sc: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RejectionReason {
    UndefinedScore,
    MissingRmsd { reason: String },
    RmsdAboveThreshold { rmsd: f64, max: f64 },
    InterfaceOutOfBounds {
        metric: &'static str,
        value: f64,
        bound: f64,
    },
    RankCutoff { max_candidates: usize },
}

impl RejectionReason {
    /// Short machine-readable kind, used in report tables.
    pub fn kind(&self) -> &'static str {
        match self {
            RejectionReason::UndefinedScore => "undefined_score",
            RejectionReason::MissingRmsd { .. } => "missing_rmsd",
            RejectionReason::RmsdAboveThreshold { .. } => "rmsd_threshold",
            RejectionReason::InterfaceOutOfBounds { .. } => "interface_bounds",
            RejectionReason::RankCutoff { .. } => "rank_cutoff",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::UndefinedScore => {
                write!(f, "undefined_score: no scorable epitope-allele pairs")
            }
            RejectionReason::MissingRmsd { reason } => write!(f, "missing_rmsd: {}", reason),
            RejectionReason::RmsdAboveThreshold { rmsd, max } => {
                write!(f, "rmsd_threshold: {:.3} > {:.3}", rmsd, max)
            }
            RejectionReason::InterfaceOutOfBounds {
                metric,
                value,
                bound,
            } => write!(f, "interface_bounds: {} = {:.3} (bound {:.3})", metric, value, bound),
            RejectionReason::RankCutoff { max_candidates } => {
                write!(f, "rank_cutoff: beyond top {}", max_candidates)
            }
        }
    }
}

/// A candidate's row in the final result, either ranked or rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub candidate_id: String,
    pub final_rank: Option<usize>,
    pub score: Option<CandidateImmunogenicityScore>,
    pub rmsd: Option<RmsdResult>,
    pub interface: Option<InterfaceMetrics>,
    pub rejected_reason: Option<RejectionReason>,
}
