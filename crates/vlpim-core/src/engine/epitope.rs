use super::config::SelectionConfig;
use super::error::EngineError;
use crate::core::models::binding::BindingPrediction;
use crate::core::models::epitope::{Epitope, EpitopeRow, EpitopeSource, ExtendedEpitope};
use crate::core::models::sequence::ProteinSequence;
use crate::core::utils::identifiers::first_invalid_residue;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingStrength {
    Strong,
    Weak,
}

/// Classifies a percentile rank; ranks above the weak threshold are non-binders.
pub fn classify_rank(rank: f64, config: &SelectionConfig) -> Option<BindingStrength> {
    if !rank.is_finite() {
        None
    } else if rank <= config.strong_threshold {
        Some(BindingStrength::Strong)
    } else if rank <= config.weak_threshold {
        Some(BindingStrength::Weak)
    } else {
        None
    }
}

/// Binding evidence accumulated for one predicted core across peptides and alleles.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreBindingStats {
    pub best_rank: f64,
    pub strong_count: usize,
    pub weak_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectedCore {
    pub epitope: Epitope,
    /// Present for predicted cores only.
    pub stats: Option<CoreBindingStats>,
}

/// Computes the extended window `(start, end, truncated)` for a core at
/// `[core_start, core_end]` (1-based, inclusive).
///
/// The deficit is split evenly with the extra residue on the right. Budget that
/// one side cannot use moves to the other side.
pub fn extend_window(
    core_start: usize,
    core_end: usize,
    parent_len: usize,
    target_length: usize,
) -> (usize, usize, bool) {
    let core_len = core_end + 1 - core_start;
    if core_len >= target_length {
        return (core_start, core_end, false);
    }

    let deficit = target_length - core_len;
    let left_available = core_start - 1;
    let right_available = parent_len.saturating_sub(core_end);

    let mut left = (deficit / 2).min(left_available);
    let right = (deficit - left).min(right_available);
    left = (deficit - right).min(left_available);

    (core_start - left, core_end + right, left + right < deficit)
}

fn epitope_id(index: usize) -> String {
    format!("E{:03}", index + 1)
}

pub struct EpitopeCoreSelector<'a> {
    config: &'a SelectionConfig,
}

impl<'a> EpitopeCoreSelector<'a> {
    pub fn new(config: &'a SelectionConfig) -> Self {
        Self { config }
    }

    /// Validates user rows against the parent sequence.
    ///
    /// The first invalid row fails the whole batch with its 1-based row number.
    /// Duplicate rows are dropped, the rest are ordered by position.
    #[instrument(skip_all, name = "validate_user_epitopes", fields(rows = rows.len()))]
    pub fn validate_user_rows(
        &self,
        parent: &ProteinSequence,
        rows: &[EpitopeRow],
    ) -> Result<Vec<SelectedCore>, EngineError> {
        let mut accepted: Vec<(String, usize, usize)> = Vec::with_capacity(rows.len());
        let mut seen = HashSet::new();

        for (index, row) in rows.iter().enumerate() {
            let row_number = index + 1;
            let fail = |reason: String| EngineError::Validation {
                row: row_number,
                reason,
            };

            let sequence = row.sequence.trim().to_ascii_uppercase();
            if sequence.is_empty() {
                return Err(fail("epitope sequence is empty".to_string()));
            }
            if let Some((position, residue)) = first_invalid_residue(&sequence) {
                return Err(fail(format!(
                    "invalid residue '{}' at position {}",
                    residue,
                    position + 1
                )));
            }
            if row.start < 1 {
                return Err(fail(format!("start {} must be at least 1", row.start)));
            }
            if row.end < row.start {
                return Err(fail(format!(
                    "end {} is before start {}",
                    row.end, row.start
                )));
            }
            let span = (row.end - row.start + 1) as usize;
            if span != sequence.len() {
                return Err(fail(format!(
                    "span {}..{} covers {} residues but sequence has {}",
                    row.start,
                    row.end,
                    span,
                    sequence.len()
                )));
            }
            let (start, end) = (row.start as usize, row.end as usize);
            if end > parent.len() {
                return Err(fail(format!(
                    "end {} exceeds parent sequence length {}",
                    end,
                    parent.len()
                )));
            }
            if parent.window(start, end) != Some(sequence.as_str()) {
                warn!(
                    row = row_number,
                    epitope = %sequence,
                    "Epitope does not match the parent sequence at {}..{}",
                    start,
                    end
                );
            }

            if seen.insert((sequence.clone(), start, end)) {
                accepted.push((sequence, start, end));
            } else {
                debug!(row = row_number, "Dropping duplicate epitope row");
            }
        }

        accepted.sort_by(|a, b| (a.1, a.2).cmp(&(b.1, b.2)));
        info!(accepted = accepted.len(), "Validated user epitopes");

        Ok(accepted
            .into_iter()
            .enumerate()
            .map(|(i, (sequence, start, end))| SelectedCore {
                epitope: Epitope {
                    id: epitope_id(i),
                    sequence,
                    start,
                    end,
                    source: EpitopeSource::User,
                },
                stats: None,
            })
            .collect())
    }

    /// Selects binding cores from predictor output.
    ///
    /// Cores with at least one strong binder (or weak binder when enabled) are
    /// kept, ordered by best rank then start, and limited according to the
    /// parent length.
    #[instrument(skip_all, name = "select_predicted_cores", fields(predictions = predictions.len()))]
    pub fn select_predicted(
        &self,
        parent: &ProteinSequence,
        predictions: &[BindingPrediction],
    ) -> Vec<SelectedCore> {
        let mut cores: BTreeMap<(usize, String), CoreBindingStats> = BTreeMap::new();
        let mut mismatched = 0usize;

        for prediction in predictions {
            let Some(rank) = prediction.percentile_rank() else {
                continue;
            };
            let Some(strength) = classify_rank(rank, self.config) else {
                continue;
            };

            let peptide = prediction.peptide.to_ascii_uppercase();
            let core = prediction
                .core
                .as_deref()
                .map(str::to_ascii_uppercase)
                .unwrap_or_else(|| peptide.clone());
            let offset = match peptide.find(&core) {
                Some(offset) => offset,
                None => {
                    debug!(peptide = %peptide, core = %core, "Core not found in peptide");
                    continue;
                }
            };
            let start = prediction.position + offset;
            if start == 0 || parent.window(start, start + core.len() - 1) != Some(core.as_str()) {
                mismatched += 1;
                continue;
            }

            let stats = cores.entry((start, core)).or_insert(CoreBindingStats {
                best_rank: f64::INFINITY,
                strong_count: 0,
                weak_count: 0,
            });
            stats.best_rank = stats.best_rank.min(rank);
            match strength {
                BindingStrength::Strong => stats.strong_count += 1,
                BindingStrength::Weak => stats.weak_count += 1,
            }
        }

        if mismatched > 0 {
            warn!(
                mismatched,
                "Predicted cores not located in the parent sequence were ignored"
            );
        }

        let mut eligible: Vec<((usize, String), CoreBindingStats)> = cores
            .into_iter()
            .filter(|(_, stats)| {
                stats.strong_count > 0 || (self.config.include_weak && stats.weak_count > 0)
            })
            .collect();
        eligible.sort_by(|((start_a, core_a), a), ((start_b, core_b), b)| {
            a.best_rank
                .total_cmp(&b.best_rank)
                .then(start_a.cmp(start_b))
                .then(core_a.cmp(core_b))
        });

        let limit = self.config.max_epitopes_for(parent.len());
        if eligible.len() > limit {
            info!(
                available = eligible.len(),
                limit, "Limiting selected cores for sequence of {} residues",
                parent.len()
            );
            eligible.truncate(limit);
        }

        eligible
            .into_iter()
            .enumerate()
            .map(|(i, ((start, sequence), stats))| SelectedCore {
                epitope: Epitope {
                    id: epitope_id(i),
                    end: start + sequence.len() - 1,
                    sequence,
                    start,
                    source: EpitopeSource::Predicted,
                },
                stats: Some(stats),
            })
            .collect()
    }

    /// Extends a core with flanking parent residues towards the target length.
    pub fn extend(
        &self,
        parent: &ProteinSequence,
        core: &Epitope,
    ) -> Result<ExtendedEpitope, EngineError> {
        if !core.span_is_consistent() || !core.fits_within(parent.len()) {
            return Err(EngineError::Internal(format!(
                "epitope {} at {}..{} is not a window of the parent sequence",
                core.id, core.start, core.end
            )));
        }

        let (start, end, truncated) =
            extend_window(core.start, core.end, parent.len(), self.config.target_length);
        let sequence = parent
            .window(start, end)
            .ok_or_else(|| EngineError::Internal(format!("window {}..{} out of bounds", start, end)))?
            .to_string();

        if truncated {
            warn!(
                epitope = %core.id,
                length = sequence.len(),
                target = self.config.target_length,
                "Parent sequence too short for full extension"
            );
        }

        Ok(ExtendedEpitope {
            core: core.clone(),
            sequence,
            start,
            end,
            truncated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::SelectionConfigBuilder;

    const PARENT: &str = "MAADGYLPDWLEDNLSEGIREWWDLKPGAPKPKANQQKQDDGRGLVLPGYKYLGPFNGLDKGEPVNAADAAALEHDKAYDQQLKAGDNPYLRYNHADAEFQERLQEDTSFGGNLGRAVFQAKKRVLEPLGLVEEGAKTAPGKKRPVEQSPQEPDSSSGIGKTGQQPAKKRLNFGQTGDSESVPDPQPLGEPPATPAAVGPTTMASGGGAPMADNNEGADGVGNASGNWHCDSTWLGDRVITTSTRTWALPTYNNHLYKQIS";

    fn parent() -> ProteinSequence {
        ProteinSequence::new("vp1", PARENT)
    }

    fn config(target_length: usize) -> SelectionConfig {
        SelectionConfigBuilder::new()
            .target_length(target_length)
            .build()
            .unwrap()
    }

    fn row(sequence: &str, start: i64, end: i64) -> EpitopeRow {
        EpitopeRow {
            sequence: sequence.to_string(),
            start,
            end,
        }
    }

    fn prediction(position: usize, peptide: &str, core: &str, allele: &str, rank: f64) -> BindingPrediction {
        BindingPrediction {
            position,
            peptide: peptide.to_string(),
            sequence_id: "vp1".to_string(),
            allele: allele.to_string(),
            core: Some(core.to_string()),
            rank_el: Some(rank),
            rank_ba: None,
            ic50: None,
            score: None,
        }
    }

    fn core_at(parent: &ProteinSequence, start: usize, len: usize) -> Epitope {
        Epitope {
            id: "E001".to_string(),
            sequence: parent.window(start, start + len - 1).unwrap().to_string(),
            start,
            end: start + len - 1,
            source: EpitopeSource::User,
        }
    }

    #[test]
    fn extend_window_splits_deficit_with_extra_on_right() {
        assert_eq!(extend_window(10, 18, 100, 15), (7, 21, false));
        assert_eq!(extend_window(10, 18, 100, 14), (8, 21, false));
    }

    #[test]
    fn extend_window_at_sequence_start_shifts_deficit_right() {
        assert_eq!(extend_window(1, 9, 100, 15), (1, 15, false));
    }

    #[test]
    fn extend_window_at_sequence_end_shifts_deficit_left() {
        assert_eq!(extend_window(92, 100, 100, 15), (86, 100, false));
    }

    #[test]
    fn extend_window_flags_truncation_when_parent_too_short() {
        assert_eq!(extend_window(3, 6, 10, 15), (1, 10, true));
    }

    #[test]
    fn extend_window_keeps_cores_already_at_target_length() {
        assert_eq!(extend_window(5, 20, 100, 15), (5, 20, false));
    }

    #[test]
    fn extend_produces_exact_length_containing_core() {
        let parent = parent();
        let selector_config = config(15);
        let selector = EpitopeCoreSelector::new(&selector_config);
        for start in [1, 2, 5, 40, parent.len() - 8] {
            let core = core_at(&parent, start, 9);
            let extended = selector.extend(&parent, &core).unwrap();
            assert_eq!(extended.len(), 15, "core at {}", start);
            assert!(!extended.truncated);
            assert!(extended.contains_core());
            assert_eq!(parent.window(extended.start, extended.end), Some(extended.sequence.as_str()));
        }
    }

    #[test]
    fn extend_short_parent_is_truncated_not_failed() {
        let parent = ProteinSequence::new("short", "MKTAYIAKQR");
        let selector_config = config(15);
        let selector = EpitopeCoreSelector::new(&selector_config);
        let extended = selector.extend(&parent, &core_at(&parent, 3, 4)).unwrap();
        assert!(extended.truncated);
        assert_eq!(extended.sequence, "MKTAYIAKQR");
        assert!(extended.contains_core());
    }

    #[test]
    fn validate_user_rows_sorts_dedupes_and_assigns_ids() {
        let parent = parent();
        let selector_config = config(15);
        let selector = EpitopeCoreSelector::new(&selector_config);
        let rows = vec![
            row("WLEDNLSEG", 10, 18),
            row("MAADGYLPD", 1, 9),
            row("WLEDNLSEG", 10, 18),
        ];

        let selected = selector.validate_user_rows(&parent, &rows).unwrap();
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].epitope.id, "E001");
        assert_eq!(selected[0].epitope.start, 1);
        assert_eq!(selected[1].epitope.id, "E002");
        assert_eq!(selected[1].epitope.sequence, "WLEDNLSEG");
        assert!(selected.iter().all(|s| s.epitope.source == EpitopeSource::User));
    }

    #[test]
    fn validate_user_rows_fails_whole_batch_on_inconsistent_span() {
        let parent = parent();
        let selector_config = config(15);
        let selector = EpitopeCoreSelector::new(&selector_config);
        let rows = vec![row("MAADGYLPD", 1, 9), row("WLEDNLSEG", 10, 19)];

        let err = selector.validate_user_rows(&parent, &rows).unwrap_err();
        assert!(matches!(err, EngineError::Validation { row: 2, .. }));
    }

    #[test]
    fn validate_user_rows_rejects_out_of_bounds_and_bad_positions() {
        let parent = ProteinSequence::new("short", "MKTAYIAKQR");
        let selector_config = config(15);
        let selector = EpitopeCoreSelector::new(&selector_config);

        let cases = [
            row("AKQRX", 7, 11),
            row("MKT", 0, 2),
            row("MKT", 3, 1),
            row("MK*", 1, 3),
            row("", 1, 1),
        ];
        for case in cases {
            let err = selector.validate_user_rows(&parent, &[case.clone()]).unwrap_err();
            assert!(
                matches!(err, EngineError::Validation { row: 1, .. }),
                "row {:?} should fail validation",
                case
            );
        }
    }

    #[test]
    fn validate_user_rows_accepts_parent_mismatch_with_warning() {
        let parent = ProteinSequence::new("short", "MKTAYIAKQR");
        let selector_config = config(15);
        let selector = EpitopeCoreSelector::new(&selector_config);
        let selected = selector
            .validate_user_rows(&parent, &[row("GGG", 1, 3)])
            .unwrap();
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn classify_rank_uses_inclusive_thresholds() {
        let config = config(15);
        assert_eq!(classify_rank(1.0, &config), Some(BindingStrength::Strong));
        assert_eq!(classify_rank(1.01, &config), Some(BindingStrength::Weak));
        assert_eq!(classify_rank(5.0, &config), Some(BindingStrength::Weak));
        assert_eq!(classify_rank(5.01, &config), None);
        assert_eq!(classify_rank(f64::NAN, &config), None);
    }

    #[test]
    fn select_predicted_groups_by_core_and_orders_by_best_rank() {
        let parent = parent();
        let selector_config = config(15);
        let selector = EpitopeCoreSelector::new(&selector_config);
        // Peptide at position 8 is "PDWLEDNLSEGIREW"; its core "WLEDNLSEG" starts at 10.
        let predictions = vec![
            prediction(8, "PDWLEDNLSEGIREW", "WLEDNLSEG", "DRB1_0101", 0.8),
            prediction(9, "DWLEDNLSEGIREWW", "WLEDNLSEG", "DRB1_0401", 0.3),
            prediction(1, "MAADGYLPDWLEDNL", "MAADGYLPD", "DRB1_0101", 0.3),
            prediction(20, "REWWDLKPGAPKPKA", "WWDLKPGAP", "DRB1_0101", 3.0),
            prediction(30, "KPKANQQKQDDGRGL", "ANQQKQDDG", "DRB1_0101", 9.0),
        ];

        let selected = selector.select_predicted(&parent, &predictions);
        assert_eq!(selected.len(), 2);

        assert_eq!(selected[0].epitope.sequence, "MAADGYLPD");
        assert_eq!(selected[0].epitope.id, "E001");
        assert_eq!(selected[1].epitope.sequence, "WLEDNLSEG");
        assert_eq!(selected[1].epitope.start, 10);
        assert_eq!(selected[1].epitope.end, 18);

        let stats = selected[1].stats.as_ref().unwrap();
        assert_eq!(stats.strong_count, 2);
        assert_eq!(stats.best_rank, 0.3);
        assert!(selected.iter().all(|s| s.epitope.span_is_consistent()));
    }

    #[test]
    fn select_predicted_includes_weak_cores_when_enabled() {
        let parent = parent();
        let selector_config = SelectionConfigBuilder::new()
            .target_length(15)
            .include_weak(true)
            .build()
            .unwrap();
        let selector = EpitopeCoreSelector::new(&selector_config);
        let predictions = vec![prediction(20, "REWWDLKPGAPKPKA", "WWDLKPGAP", "DRB1_0101", 3.0)];

        let selected = selector.select_predicted(&parent, &predictions);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].stats.as_ref().unwrap().weak_count, 1);
    }

    #[test]
    fn select_predicted_limits_cores_for_short_parents() {
        let parent = ProteinSequence::new("short", &PARENT[..120]);
        let selector_config = config(15);
        let selector = EpitopeCoreSelector::new(&selector_config);
        let predictions: Vec<_> = (1..=50)
            .step_by(10)
            .map(|pos| {
                let peptide = parent.window(pos, pos + 14).unwrap();
                let core = &peptide[2..11];
                prediction(pos, peptide, core, "DRB1_0101", 0.01 * pos as f64)
            })
            .collect();

        let selected = selector.select_predicted(&parent, &predictions);
        assert_eq!(selected.len(), 3);
        let starts: Vec<_> = selected.iter().map(|s| s.epitope.start).collect();
        assert_eq!(starts, vec![3, 13, 23]);
    }

    #[test]
    fn select_predicted_ignores_cores_not_in_parent() {
        let parent = parent();
        let selector_config = config(15);
        let selector = EpitopeCoreSelector::new(&selector_config);
        let predictions = vec![prediction(1, "GGGGGGGGGGGGGGG", "GGGGGGGGG", "DRB1_0101", 0.1)];
        assert!(selector.select_predicted(&parent, &predictions).is_empty());
    }
}
