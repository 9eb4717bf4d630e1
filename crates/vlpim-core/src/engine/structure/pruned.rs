use super::{Deviation, StrategyUnavailable, SuperpositionStrategy};
use crate::core::models::candidate::RmsdMethod;
use crate::core::models::structure::StructurePair;
use crate::core::utils::geometry::{Superposition, deviations, superpose};
use crate::engine::config::PruningConfig;
use tracing::trace;

/// Superposition that repeatedly drops the worst-fitting atoms and refits.
///
/// Each round removes `floor(len * prune_fraction)` atoms, never going below
/// `min_retained`. Iteration stops when nothing more can be removed, when the
/// RMSD changes by less than `tolerance`, or after `max_iterations` rounds.
pub struct IterativePrunedStrategy {
    config: PruningConfig,
}

impl IterativePrunedStrategy {
    pub fn new(config: PruningConfig) -> Self {
        Self { config }
    }
}

impl SuperpositionStrategy for IterativePrunedStrategy {
    fn method(&self) -> RmsdMethod {
        RmsdMethod::IterativePruned
    }

    fn attempt(
        &self,
        candidate_id: &str,
        pair: &StructurePair,
    ) -> Result<Deviation, StrategyUnavailable> {
        let min_retained = self.config.min_retained.max(3);
        if pair.len() < min_retained {
            return Err(StrategyUnavailable::new(format!(
                "needs at least {} matched atoms, found {}",
                min_retained,
                pair.len()
            )));
        }

        let refit = |indices: &[usize]| -> Result<(StructurePair, Superposition), StrategyUnavailable> {
            let subset = pair
                .subset(indices)
                .ok_or_else(|| StrategyUnavailable::new("empty atom subset"))?;
            let fit = superpose(subset.reference(), subset.predicted())
                .ok_or_else(|| StrategyUnavailable::new("superposition failed"))?;
            if !fit.rmsd.is_finite() {
                return Err(StrategyUnavailable::new("non-finite RMSD"));
            }
            Ok((subset, fit))
        };

        let mut retained: Vec<usize> = (0..pair.len()).collect();
        let (mut subset, mut fit) = refit(&retained)?;

        for iteration in 0..self.config.max_iterations {
            let removable = retained.len() - min_retained;
            let prune = ((retained.len() as f64 * self.config.prune_fraction).floor() as usize)
                .min(removable);
            if prune == 0 {
                break;
            }

            let per_atom = deviations(subset.reference(), subset.predicted(), &fit);
            let mut order: Vec<usize> = (0..retained.len()).collect();
            order.sort_by(|&a, &b| per_atom[b].total_cmp(&per_atom[a]));
            let mut keep: Vec<usize> = order[prune..].iter().map(|&k| retained[k]).collect();
            keep.sort_unstable();

            let previous_rmsd = fit.rmsd;
            (subset, fit) = refit(&keep)?;
            retained = keep;

            trace!(
                candidate = candidate_id,
                iteration,
                retained = retained.len(),
                rmsd = fit.rmsd,
                "Pruning round"
            );
            if (previous_rmsd - fit.rmsd).abs() < self.config.tolerance {
                break;
            }
        }

        Ok(Deviation {
            rmsd: fit.rmsd,
            retained_atoms: retained.len(),
        })
    }
}
