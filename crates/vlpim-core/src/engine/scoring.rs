use super::config::ScoringConfig;
use super::error::EngineError;
use crate::core::models::binding::{AlleleBindingRecord, MetricKind, NormalizedAlleleScore};
use crate::core::models::candidate::{CandidateImmunogenicityScore, ImmunogenicityMode};
use itertools::{Itertools, MinMaxResult};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info, instrument, warn};

/// Maps an allele's raw values onto `[0, 100]` by rank position.
///
/// Lower raw values (stronger binders) get lower scores. Tied values share
/// their average rank. When every value is identical, each receives
/// `neutral_score`.
pub fn rank_normalize(values: &[f64], neutral_score: f64) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // 1-based positions i+1..=j+1 share their mean
        let average = (i + j) as f64 / 2.0 + 1.0;
        for &index in &order[i..=j] {
            ranks[index] = average;
        }
        i = j + 1;
    }

    let (min_rank, max_rank) = match ranks.iter().copied().minmax_by(|a, b| a.total_cmp(b)) {
        MinMaxResult::MinMax(min, max) if max > min => (min, max),
        _ => return vec![neutral_score; n],
    };
    ranks
        .iter()
        .map(|r| (r - min_rank) / (max_rank - min_rank) * 100.0)
        .collect()
}

/// Converts a raw aggregate into an overall score where lower is always better.
///
/// `Reduce` favors weak predicted binding: `100 * pairs - raw`.
/// `Enhance` favors strong predicted binding: `raw` as is, since strong binders
/// already normalize low.
pub fn apply_mode(mode: ImmunogenicityMode, raw_aggregate: f64, pair_count: usize) -> f64 {
    match mode {
        ImmunogenicityMode::Reduce => 100.0 * pair_count as f64 - raw_aggregate,
        ImmunogenicityMode::Enhance => raw_aggregate,
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoringOutcome {
    /// Ordered by overall score, then candidate id.
    pub scores: Vec<CandidateImmunogenicityScore>,
    /// Candidates with no scorable epitope-allele pairs.
    pub undefined: Vec<String>,
}

impl ScoringOutcome {
    /// The score of `candidate_id`, or [`EngineError::UndefinedScore`] when the
    /// candidate has no scorable epitope-allele pairs.
    pub fn score_of(&self, candidate_id: &str) -> Result<&CandidateImmunogenicityScore, EngineError> {
        self.scores
            .iter()
            .find(|s| s.candidate_id == candidate_id)
            .ok_or_else(|| EngineError::UndefinedScore {
                candidate_id: candidate_id.to_string(),
            })
    }
}

pub struct ImmunogenicityScorer<'a> {
    config: &'a ScoringConfig,
}

impl<'a> ImmunogenicityScorer<'a> {
    pub fn new(config: &'a ScoringConfig) -> Self {
        Self { config }
    }

    /// Normalizes every record within its (allele, metric) group.
    ///
    /// A repeated (candidate, epitope, allele) triple fails the batch.
    /// Non-finite values are dropped with a warning.
    #[instrument(skip_all, name = "normalize_bindings", fields(records = records.len()))]
    pub fn normalize(
        &self,
        records: &[AlleleBindingRecord],
    ) -> Result<Vec<NormalizedAlleleScore>, EngineError> {
        let mut seen = HashSet::with_capacity(records.len());
        let mut groups: BTreeMap<(&str, MetricKind), Vec<&AlleleBindingRecord>> = BTreeMap::new();

        for (index, record) in records.iter().enumerate() {
            if !seen.insert((
                record.candidate_id.as_str(),
                record.epitope_id.as_str(),
                record.allele.as_str(),
            )) {
                return Err(EngineError::Validation {
                    row: index + 1,
                    reason: format!(
                        "duplicate binding record for candidate '{}', epitope '{}', allele '{}'",
                        record.candidate_id, record.epitope_id, record.allele
                    ),
                });
            }
            if !record.value.is_finite() {
                warn!(
                    candidate = %record.candidate_id,
                    epitope = %record.epitope_id,
                    allele = %record.allele,
                    "Skipping non-finite binding value"
                );
                continue;
            }
            groups
                .entry((record.allele.as_str(), record.metric))
                .or_default()
                .push(record);
        }

        let mut normalized = Vec::with_capacity(records.len());
        for ((allele, metric), group) in groups {
            let values: Vec<f64> = group.iter().map(|r| r.value).collect();
            let scores = rank_normalize(&values, self.config.neutral_score);
            debug!(allele, %metric, entries = group.len(), "Normalized allele group");
            normalized.extend(group.iter().zip(scores).map(|(record, value)| {
                NormalizedAlleleScore {
                    candidate_id: record.candidate_id.clone(),
                    epitope_id: record.epitope_id.clone(),
                    allele: record.allele.clone(),
                    value,
                }
            }));
        }
        Ok(normalized)
    }

    /// Sums each candidate's normalized values and applies the mode transform.
    ///
    /// `candidate_ids` lists every candidate expected in the result; those
    /// without a single normalized value end up in `undefined`.
    pub fn aggregate(
        &self,
        candidate_ids: &[String],
        normalized: &[NormalizedAlleleScore],
    ) -> ScoringOutcome {
        let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
        for entry in normalized {
            let slot = sums.entry(entry.candidate_id.as_str()).or_insert((0.0, 0));
            slot.0 += entry.value;
            slot.1 += 1;
        }

        let expected: BTreeSet<&str> = candidate_ids
            .iter()
            .map(String::as_str)
            .chain(sums.keys().copied())
            .collect();

        let mut outcome = ScoringOutcome::default();
        for candidate_id in expected {
            match sums.get(candidate_id) {
                Some(&(raw_aggregate, pair_count)) if pair_count > 0 => {
                    outcome.scores.push(CandidateImmunogenicityScore {
                        candidate_id: candidate_id.to_string(),
                        overall_score: apply_mode(self.config.mode, raw_aggregate, pair_count),
                        raw_aggregate,
                        pair_count,
                        mode: self.config.mode,
                    });
                }
                _ => outcome.undefined.push(candidate_id.to_string()),
            }
        }

        outcome.scores.sort_by(|a, b| {
            a.overall_score
                .total_cmp(&b.overall_score)
                .then_with(|| a.candidate_id.cmp(&b.candidate_id))
        });
        outcome
    }

    /// Normalizes then aggregates. Normalization sees every record before any
    /// candidate is scored.
    #[instrument(skip_all, name = "immunogenicity_scoring", fields(mode = %self.config.mode))]
    pub fn score(
        &self,
        candidate_ids: &[String],
        records: &[AlleleBindingRecord],
    ) -> Result<ScoringOutcome, EngineError> {
        let normalized = self.normalize(records)?;
        let outcome = self.aggregate(candidate_ids, &normalized);
        if !outcome.undefined.is_empty() {
            warn!(
                count = outcome.undefined.len(),
                "Candidates without scorable epitope-allele pairs"
            );
        }
        info!(scored = outcome.scores.len(), "Scored candidates");
        Ok(outcome)
    }
}
