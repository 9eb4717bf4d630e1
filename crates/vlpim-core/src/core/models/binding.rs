use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The scale a raw binding value is expressed in. Lower is a stronger binder
/// for both kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetricKind {
    #[serde(rename = "rank_el", alias = "RankEL", alias = "rank")]
    RankEl,
    #[serde(rename = "ic50", alias = "IC50", alias = "nM")]
    Ic50,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::RankEl => write!(f, "rank_el"),
            MetricKind::Ic50 => write!(f, "ic50"),
        }
    }
}

impl FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rank_el" | "rankel" | "rank" => Ok(MetricKind::RankEl),
            "ic50" | "nm" => Ok(MetricKind::Ic50),
            other => Err(format!("unknown binding metric '{}'", other)),
        }
    }
}

/// One binding observation for a (candidate, epitope, allele) triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlleleBindingRecord {
    pub candidate_id: String,
    pub epitope_id: String,
    pub allele: String,
    pub value: f64,
    pub metric: MetricKind,
}

/// A single row of epitope-predictor output.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingPrediction {
    /// 1-based start of the peptide in the predicted sequence.
    pub position: usize,
    pub peptide: String,
    pub sequence_id: String,
    pub allele: String,
    pub core: Option<String>,
    pub rank_el: Option<f64>,
    pub rank_ba: Option<f64>,
    pub ic50: Option<f64>,
    pub score: Option<f64>,
}

impl BindingPrediction {
    /// Percentile rank used for strong/weak classification.
    pub fn percentile_rank(&self) -> Option<f64> {
        self.rank_el.or(self.rank_ba)
    }
}

/// A binding value after allele-scoped rank normalization, in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedAlleleScore {
    pub candidate_id: String,
    pub epitope_id: String,
    pub allele: String,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_kind_parses_common_spellings() {
        assert_eq!("RankEL".parse::<MetricKind>(), Ok(MetricKind::RankEl));
        assert_eq!("rank_el".parse::<MetricKind>(), Ok(MetricKind::RankEl));
        assert_eq!("IC50".parse::<MetricKind>(), Ok(MetricKind::Ic50));
        assert!("kd".parse::<MetricKind>().is_err());
    }

    #[test]
    fn percentile_rank_prefers_el_rank_over_ba_rank() {
        let mut prediction = BindingPrediction {
            position: 1,
            peptide: "PKYVKQNTLKLAT".to_string(),
            sequence_id: "seq".to_string(),
            allele: "DRB1_0101".to_string(),
            core: None,
            rank_el: Some(0.5),
            rank_ba: Some(3.0),
            ic50: Some(25.0),
            score: None,
        };
        assert_eq!(prediction.percentile_rank(), Some(0.5));
        prediction.rank_el = None;
        assert_eq!(prediction.percentile_rank(), Some(3.0));
        prediction.rank_ba = None;
        assert_eq!(prediction.percentile_rank(), None);
    }
}
