//! Structural deviation between predicted and reference coordinates.
//!
//! The engine tries an ordered chain of superposition strategies and reports
//! the first that succeeds. The chain always ends with [`kabsch::KabschStrategy`],
//! which succeeds for any finite, non-empty pair of matched point sets.

pub mod external;
pub mod kabsch;
pub mod pruned;
pub mod superimposer;

use super::config::StructureConfig;
use super::error::EngineError;
use crate::core::models::candidate::{AttemptOutcome, RmsdMethod, RmsdResult, StrategyAttempt};
use crate::core::models::structure::{CoordinateSet, ResidueKey, StructurePair};
use external::{ExternalAligner, ExternalPrimaryStrategy};
use kabsch::KabschStrategy;
use pruned::IterativePrunedStrategy;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use superimposer::QuaternionSuperimposer;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Minimum number of shared residue keys for a keyed correspondence.
pub const MIN_SHARED_KEYS: usize = 3;

/// Signal that a strategy cannot produce a result for this input and the next
/// strategy should be tried.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{reason}")]
pub struct StrategyUnavailable {
    pub reason: String,
}

impl StrategyUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deviation {
    pub rmsd: f64,
    pub retained_atoms: usize,
}

pub trait SuperpositionStrategy: Send + Sync {
    fn method(&self) -> RmsdMethod;

    fn attempt(
        &self,
        candidate_id: &str,
        pair: &StructurePair,
    ) -> Result<Deviation, StrategyUnavailable>;
}

/// Placeholder for a strategy switched off in configuration.
struct DisabledStrategy(RmsdMethod);

impl SuperpositionStrategy for DisabledStrategy {
    fn method(&self) -> RmsdMethod {
        self.0
    }

    fn attempt(&self, _: &str, _: &StructurePair) -> Result<Deviation, StrategyUnavailable> {
        Err(StrategyUnavailable::new("disabled by configuration"))
    }
}

/// Pairs reference and predicted points.
///
/// Equal-length sets pair by order. Otherwise both sets must carry residue
/// keys and share at least [`MIN_SHARED_KEYS`] of them; pairs follow the
/// reference order.
pub fn correspond(
    candidate_id: &str,
    reference: &CoordinateSet,
    predicted: &CoordinateSet,
) -> Result<StructurePair, EngineError> {
    let mismatch = || EngineError::Correspondence {
        candidate_id: candidate_id.to_string(),
        reference_len: reference.len(),
        predicted_len: predicted.len(),
    };

    if reference.len() == predicted.len() {
        return StructurePair::new(reference.points.clone(), predicted.points.clone())
            .ok_or_else(mismatch);
    }

    let (Some(reference_keys), Some(predicted_keys)) = (&reference.keys, &predicted.keys) else {
        return Err(mismatch());
    };
    let predicted_index: HashMap<ResidueKey, usize> = predicted_keys
        .iter()
        .enumerate()
        .map(|(i, key)| (*key, i))
        .collect();

    let (matched_reference, matched_predicted): (Vec<_>, Vec<_>) = reference_keys
        .iter()
        .enumerate()
        .filter_map(|(i, key)| {
            let j = *predicted_index.get(key)?;
            Some((*reference.points.get(i)?, *predicted.points.get(j)?))
        })
        .unzip();

    if matched_reference.len() < MIN_SHARED_KEYS {
        return Err(mismatch());
    }
    debug!(
        candidate = candidate_id,
        shared = matched_reference.len(),
        "Matched coordinates on residue keys"
    );
    StructurePair::new(matched_reference, matched_predicted).ok_or_else(mismatch)
}

pub struct StructuralDeviationEngine {
    strategies: Vec<Box<dyn SuperpositionStrategy>>,
    terminal: KabschStrategy,
}

impl StructuralDeviationEngine {
    /// Builds the standard chain: external, iterative pruned, superimposer, Kabsch.
    ///
    /// Disabled strategies stay in the chain and report themselves unavailable,
    /// so the attempt trace always lists every stage.
    pub fn new(config: &StructureConfig, aligner: Option<Arc<dyn ExternalAligner>>) -> Self {
        let external: Box<dyn SuperpositionStrategy> = if config.use_external {
            Box::new(ExternalPrimaryStrategy::new(aligner))
        } else {
            Box::new(DisabledStrategy(RmsdMethod::ExternalPrimary))
        };
        let pruned: Box<dyn SuperpositionStrategy> = match config.pruning {
            Some(pruning) => Box::new(IterativePrunedStrategy::new(pruning)),
            None => Box::new(DisabledStrategy(RmsdMethod::IterativePruned)),
        };
        let superimposer: Box<dyn SuperpositionStrategy> = if config.use_superimposer {
            Box::new(QuaternionSuperimposer)
        } else {
            Box::new(DisabledStrategy(RmsdMethod::Superimposer))
        };
        Self::from_strategies(vec![external, pruned, superimposer])
    }

    /// Uses `strategies` in order, followed by the Kabsch terminal strategy.
    pub fn from_strategies(strategies: Vec<Box<dyn SuperpositionStrategy>>) -> Self {
        Self {
            strategies,
            terminal: KabschStrategy,
        }
    }

    /// Computes one candidate's RMSD against the reference.
    #[instrument(skip_all, name = "structural_deviation", fields(candidate = candidate_id))]
    pub fn compute(
        &self,
        candidate_id: &str,
        reference: &CoordinateSet,
        predicted: &CoordinateSet,
    ) -> Result<RmsdResult, EngineError> {
        if !reference.is_finite() || !predicted.is_finite() {
            return Err(EngineError::InvalidCoordinates {
                candidate_id: candidate_id.to_string(),
            });
        }
        let pair = correspond(candidate_id, reference, predicted)?;

        let mut attempts = Vec::with_capacity(self.strategies.len() + 1);
        for strategy in &self.strategies {
            match strategy.attempt(candidate_id, &pair) {
                Ok(deviation) => {
                    attempts.push(StrategyAttempt {
                        method: strategy.method(),
                        outcome: AttemptOutcome::Succeeded,
                    });
                    return Ok(self.result(candidate_id, strategy.method(), deviation, attempts));
                }
                Err(unavailable) => {
                    debug!(method = %strategy.method(), reason = %unavailable, "Strategy unavailable");
                    attempts.push(StrategyAttempt {
                        method: strategy.method(),
                        outcome: AttemptOutcome::Unavailable(unavailable.reason),
                    });
                }
            }
        }

        let deviation = self
            .terminal
            .attempt(candidate_id, &pair)
            .map_err(|e| EngineError::Internal(format!("Kabsch superposition failed: {}", e)))?;
        attempts.push(StrategyAttempt {
            method: RmsdMethod::Kabsch,
            outcome: AttemptOutcome::Succeeded,
        });
        Ok(self.result(candidate_id, RmsdMethod::Kabsch, deviation, attempts))
    }

    fn result(
        &self,
        candidate_id: &str,
        method_used: RmsdMethod,
        deviation: Deviation,
        attempts: Vec<StrategyAttempt>,
    ) -> RmsdResult {
        debug!(method = %method_used, rmsd = deviation.rmsd, "RMSD computed");
        RmsdResult {
            candidate_id: candidate_id.to_string(),
            value: deviation.rmsd,
            method_used,
            retained_atoms: deviation.retained_atoms,
            attempts,
        }
    }

    /// Computes every candidate independently. Failures are kept per candidate.
    #[instrument(skip_all, name = "structural_deviation_batch", fields(candidates = candidates.len()))]
    pub fn compute_all(
        &self,
        reference: &CoordinateSet,
        candidates: &[(&str, &CoordinateSet)],
    ) -> BTreeMap<String, Result<RmsdResult, EngineError>> {
        #[cfg(not(feature = "parallel"))]
        let iterator = candidates.iter();

        #[cfg(feature = "parallel")]
        let iterator = candidates.par_iter();

        let results: BTreeMap<String, Result<RmsdResult, EngineError>> = iterator
            .map(|(candidate_id, predicted)| {
                (
                    candidate_id.to_string(),
                    self.compute(candidate_id, reference, predicted),
                )
            })
            .collect();

        let failed = results.values().filter(|r| r.is_err()).count();
        if failed > 0 {
            warn!(failed, "Structural deviation failed for some candidates");
        }
        info!(computed = results.len() - failed, "Structural deviations computed");
        results
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use nalgebra::{Point3, Rotation3, Unit, Vector3};

    pub fn helix(n: usize) -> Vec<Point3<f64>> {
        (0..n)
            .map(|i| {
                let t = i as f64 * 100f64.to_radians();
                Point3::new(2.3 * t.cos(), 2.3 * t.sin(), 1.5 * i as f64)
            })
            .collect()
    }

    pub fn moved(points: &[Point3<f64>]) -> Vec<Point3<f64>> {
        let rotation =
            Rotation3::from_axis_angle(&Unit::new_normalize(Vector3::new(0.3, -1.0, 0.7)), 0.8);
        let translation = Vector3::new(5.0, -3.0, 12.0);
        points.iter().map(|p| rotation * p + translation).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{helix, moved};
    use super::*;
    use crate::engine::config::PruningConfig;
    use external::ExternalAlignerError;
    use nalgebra::Point3;

    struct FixedAligner(Result<f64, ExternalAlignerError>);

    impl ExternalAligner for FixedAligner {
        fn name(&self) -> &str {
            "fixed"
        }

        fn align(
            &self,
            _: &[Point3<f64>],
            _: &[Point3<f64>],
        ) -> Result<f64, ExternalAlignerError> {
            self.0.clone()
        }
    }

    struct AlwaysUnavailable(RmsdMethod);

    impl SuperpositionStrategy for AlwaysUnavailable {
        fn method(&self) -> RmsdMethod {
            self.0
        }

        fn attempt(&self, _: &str, _: &StructurePair) -> Result<Deviation, StrategyUnavailable> {
            Err(StrategyUnavailable::new("forced"))
        }
    }

    fn key(residue_number: isize) -> ResidueKey {
        ResidueKey::new('A', residue_number)
    }

    fn methods(result: &RmsdResult) -> Vec<RmsdMethod> {
        result.attempts.iter().map(|a| a.method).collect()
    }

    #[test]
    fn external_aligner_result_is_used_when_available() {
        let reference = CoordinateSet::new(helix(12));
        let predicted = CoordinateSet::new(moved(&helix(12)));
        let aligner: Arc<dyn ExternalAligner> = Arc::new(FixedAligner(Ok(0.42)));
        let engine = StructuralDeviationEngine::new(&StructureConfig::default(), Some(aligner));

        let result = engine.compute("c1", &reference, &predicted).unwrap();
        assert_eq!(result.method_used, RmsdMethod::ExternalPrimary);
        assert_eq!(result.value, 0.42);
        assert_eq!(result.attempts.len(), 1);
    }

    #[test]
    fn failing_external_aligner_falls_through_to_pruning() {
        let reference = CoordinateSet::new(helix(12));
        let predicted = CoordinateSet::new(moved(&helix(12)));
        let aligner: Arc<dyn ExternalAligner> = Arc::new(FixedAligner(Err(
            ExternalAlignerError::Failed("timed out".to_string()),
        )));
        let engine = StructuralDeviationEngine::new(&StructureConfig::default(), Some(aligner));

        let result = engine.compute("c1", &reference, &predicted).unwrap();
        assert_eq!(result.method_used, RmsdMethod::IterativePruned);
        assert!(result.value < 1e-6);
        assert!(matches!(
            &result.attempts[0].outcome,
            AttemptOutcome::Unavailable(reason) if reason.contains("timed out")
        ));
    }

    #[test]
    fn fallback_proceeds_in_order_to_kabsch() {
        let reference = CoordinateSet::new(helix(10));
        let predicted = CoordinateSet::new(moved(&helix(10)));
        let config = StructureConfig {
            use_external: false,
            pruning: None,
            use_superimposer: false,
        };
        let engine = StructuralDeviationEngine::new(&config, None);

        let result = engine.compute("c1", &reference, &predicted).unwrap();
        assert_eq!(result.method_used, RmsdMethod::Kabsch);
        assert_eq!(
            methods(&result),
            vec![
                RmsdMethod::ExternalPrimary,
                RmsdMethod::IterativePruned,
                RmsdMethod::Superimposer,
                RmsdMethod::Kabsch
            ]
        );
        assert!(result.value < 1e-9);
        assert_eq!(result.retained_atoms, 10);
    }

    #[test]
    fn missing_aligner_falls_through_without_skipping_stages() {
        let reference = CoordinateSet::new(helix(8));
        let predicted = CoordinateSet::new(moved(&helix(8)));
        let engine = StructuralDeviationEngine::from_strategies(vec![
            Box::new(AlwaysUnavailable(RmsdMethod::ExternalPrimary)),
            Box::new(AlwaysUnavailable(RmsdMethod::IterativePruned)),
            Box::new(QuaternionSuperimposer),
        ]);

        let result = engine.compute("c1", &reference, &predicted).unwrap();
        assert_eq!(result.method_used, RmsdMethod::Superimposer);
        assert_eq!(
            methods(&result),
            vec![
                RmsdMethod::ExternalPrimary,
                RmsdMethod::IterativePruned,
                RmsdMethod::Superimposer
            ]
        );
    }

    #[test]
    fn pruning_reports_retained_subset() {
        let reference_points = helix(20);
        let mut predicted_points = moved(&reference_points);
        predicted_points[19].x += 8.0;
        let engine = StructuralDeviationEngine::from_strategies(vec![Box::new(
            IterativePrunedStrategy::new(PruningConfig::default()),
        )]);

        let result = engine
            .compute(
                "c1",
                &CoordinateSet::new(reference_points),
                &CoordinateSet::new(predicted_points),
            )
            .unwrap();
        assert_eq!(result.method_used, RmsdMethod::IterativePruned);
        assert!(result.retained_atoms < 20);
        assert!(result.value < 1e-6, "outlier should be pruned, rmsd {}", result.value);
    }

    #[test]
    fn mismatched_unkeyed_sets_fail_with_correspondence_error() {
        let engine = StructuralDeviationEngine::new(&StructureConfig::default(), None);
        let err = engine
            .compute(
                "c7",
                &CoordinateSet::new(helix(10)),
                &CoordinateSet::new(helix(9)),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Correspondence {
                ref candidate_id,
                reference_len: 10,
                predicted_len: 9
            } if candidate_id == "c7"
        ));
    }

    #[test]
    fn keyed_sets_of_different_length_match_on_shared_residues() {
        let points = helix(10);
        let keys: Vec<_> = (1..=10).map(key).collect();
        let reference = CoordinateSet::with_keys(points.clone(), keys.clone()).unwrap();

        let moved_points = moved(&points);
        let predicted = CoordinateSet::with_keys(moved_points[2..].to_vec(), keys[2..].to_vec()).unwrap();

        let engine = StructuralDeviationEngine::new(&StructureConfig::default(), None);
        let result = engine.compute("c1", &reference, &predicted).unwrap();
        assert!(result.value < 1e-6);
        assert_eq!(result.retained_atoms, 8);
    }

    #[test]
    fn insertion_codes_pair_with_their_own_residue() {
        let keys = vec![
            key(50),
            key(51),
            key(52),
            key(52).with_insertion_code('A'),
            key(53),
        ];
        let points = helix(5);
        let reference = CoordinateSet::with_keys(points.clone(), keys.clone()).unwrap();
        let predicted =
            CoordinateSet::with_keys(moved(&points)[..4].to_vec(), keys[..4].to_vec()).unwrap();

        let pair = correspond("c1", &reference, &predicted).unwrap();
        assert_eq!(pair.len(), 4);

        let engine = StructuralDeviationEngine::new(&StructureConfig::default(), None);
        let result = engine.compute("c1", &reference, &predicted).unwrap();
        assert!(result.value < 1e-6, "rmsd {}", result.value);
        assert_eq!(result.retained_atoms, 4);
    }

    #[test]
    fn keyed_sets_with_too_few_shared_residues_fail() {
        let reference =
            CoordinateSet::with_keys(helix(5), (1..=5).map(key).collect()).unwrap();
        let predicted =
            CoordinateSet::with_keys(helix(4), vec![key(4), key(5), key(20), key(21)]).unwrap();
        let err = correspond("c1", &reference, &predicted).unwrap_err();
        assert!(matches!(err, EngineError::Correspondence { .. }));
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        let mut points = helix(5);
        points[2].z = f64::NAN;
        let engine = StructuralDeviationEngine::new(&StructureConfig::default(), None);
        let err = engine
            .compute("c1", &CoordinateSet::new(helix(5)), &CoordinateSet::new(points))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidCoordinates { .. }));
    }

    #[test]
    fn compute_all_keeps_failures_per_candidate() {
        let reference = CoordinateSet::new(helix(10));
        let good = CoordinateSet::new(moved(&helix(10)));
        let bad = CoordinateSet::new(helix(4));
        let engine = StructuralDeviationEngine::new(&StructureConfig::default(), None);

        let results = engine.compute_all(&reference, &[("good", &good), ("bad", &bad)]);
        assert_eq!(results.len(), 2);
        assert!(results["good"].is_ok());
        assert!(results["bad"].is_err());
    }
}
