use super::config::RankingConfig;
use super::error::EngineError;
use super::interface::check_bounds;
use super::scoring::ScoringOutcome;
use crate::core::models::candidate::{
    CandidateImmunogenicityScore, InterfaceMetrics, RankedCandidate, RejectionReason, RmsdResult,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RankingOutcome {
    /// Accepted candidates in final order, `final_rank` starting at 1.
    pub ranked: Vec<RankedCandidate>,
    /// Every other candidate, each with the criterion it failed.
    pub rejected: Vec<RankedCandidate>,
}

impl RankingOutcome {
    pub fn len(&self) -> usize {
        self.ranked.len() + self.rejected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty() && self.rejected.is_empty()
    }

    /// Ranked candidates followed by rejected ones.
    pub fn iter(&self) -> impl Iterator<Item = &RankedCandidate> {
        self.ranked.iter().chain(self.rejected.iter())
    }
}

// Missing values sort after present ones in either direction.
fn cmp_optional(a: Option<f64>, b: Option<f64>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) if descending => y.total_cmp(&x),
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn ranking_order(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    let score = |c: &RankedCandidate| c.score.as_ref().map(|s| s.overall_score);
    let rmsd = |c: &RankedCandidate| c.rmsd.as_ref().map(|r| r.value);
    let dg = |c: &RankedCandidate| c.interface.map(|m| m.dg_dsasa);
    let packstat = |c: &RankedCandidate| c.interface.map(|m| m.packstat);
    let buns = |c: &RankedCandidate| c.interface.map(|m| m.buns);

    cmp_optional(score(a), score(b), false)
        .then_with(|| cmp_optional(rmsd(a), rmsd(b), false))
        .then_with(|| cmp_optional(dg(a), dg(b), false))
        .then_with(|| cmp_optional(packstat(a), packstat(b), true))
        .then_with(|| cmp_optional(buns(a), buns(b), false))
        .then_with(|| a.candidate_id.cmp(&b.candidate_id))
}

pub struct CandidateRanker<'a> {
    config: &'a RankingConfig,
}

impl<'a> CandidateRanker<'a> {
    pub fn new(config: &'a RankingConfig) -> Self {
        Self { config }
    }

    fn rejection(
        &self,
        score: &Result<&CandidateImmunogenicityScore, EngineError>,
        rmsd: Option<&Result<RmsdResult, EngineError>>,
        interface: Option<&InterfaceMetrics>,
    ) -> Option<RejectionReason> {
        if let Err(e) = score {
            debug!(error = %e, "No immunogenicity score");
            return Some(RejectionReason::UndefinedScore);
        }
        let rmsd = match rmsd {
            None => {
                return Some(RejectionReason::MissingRmsd {
                    reason: "no structure supplied".to_string(),
                });
            }
            Some(Err(e)) => {
                return Some(RejectionReason::MissingRmsd {
                    reason: e.to_string(),
                });
            }
            Some(Ok(result)) => result,
        };
        if let Some(max) = self.config.max_rmsd {
            if rmsd.value > max {
                return Some(RejectionReason::RmsdAboveThreshold {
                    rmsd: rmsd.value,
                    max,
                });
            }
        }
        match (&self.config.interface_bounds, interface) {
            (Some(bounds), Some(metrics)) => check_bounds(metrics, bounds),
            _ => None,
        }
    }

    /// Joins scores, deviations and interface metrics on candidate id, filters,
    /// orders and truncates.
    ///
    /// Each candidate present in any input appears exactly once in the outcome.
    #[instrument(skip_all, name = "candidate_ranking")]
    pub fn rank(
        &self,
        scoring: &ScoringOutcome,
        deviations: &BTreeMap<String, Result<RmsdResult, EngineError>>,
        interfaces: &HashMap<String, InterfaceMetrics>,
    ) -> RankingOutcome {
        let candidate_ids: BTreeSet<&str> = scoring
            .scores
            .iter()
            .map(|s| s.candidate_id.as_str())
            .chain(scoring.undefined.iter().map(String::as_str))
            .chain(deviations.keys().map(String::as_str))
            .collect();

        let mut outcome = RankingOutcome::default();
        let mut passing = Vec::new();

        for candidate_id in candidate_ids {
            let score = scoring.score_of(candidate_id);
            let deviation = deviations.get(candidate_id);
            let interface = interfaces.get(candidate_id);

            let reason = self.rejection(&score, deviation, interface);
            let candidate = RankedCandidate {
                candidate_id: candidate_id.to_string(),
                final_rank: None,
                score: score.ok().cloned(),
                rmsd: deviation.and_then(|d| d.as_ref().ok()).cloned(),
                interface: interface.copied(),
                rejected_reason: reason,
            };
            if let Some(reason) = &candidate.rejected_reason {
                debug!(candidate = candidate_id, %reason, "Candidate rejected");
                outcome.rejected.push(candidate);
            } else {
                passing.push(candidate);
            }
        }

        passing.sort_by(ranking_order);
        let max_candidates = self.config.max_candidates;
        for (index, mut candidate) in passing.into_iter().enumerate() {
            if index < max_candidates {
                candidate.final_rank = Some(index + 1);
                outcome.ranked.push(candidate);
            } else {
                candidate.rejected_reason = Some(RejectionReason::RankCutoff { max_candidates });
                outcome.rejected.push(candidate);
            }
        }

        info!(
            ranked = outcome.ranked.len(),
            rejected = outcome.rejected.len(),
            "Ranking complete"
        );
        outcome
    }
}
