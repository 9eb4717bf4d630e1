use super::{Deviation, StrategyUnavailable, SuperpositionStrategy};
use crate::core::models::candidate::RmsdMethod;
use crate::core::models::structure::StructurePair;
use crate::core::utils::geometry::superpose;

/// Closed-form optimal rotation via SVD of the cross-covariance matrix.
///
/// Terminal strategy of the chain: for a finite, non-empty [`StructurePair`]
/// the decomposition always yields both singular vector matrices.
pub struct KabschStrategy;

impl SuperpositionStrategy for KabschStrategy {
    fn method(&self) -> RmsdMethod {
        RmsdMethod::Kabsch
    }

    fn attempt(&self, _: &str, pair: &StructurePair) -> Result<Deviation, StrategyUnavailable> {
        let fit = superpose(pair.reference(), pair.predicted())
            .ok_or_else(|| StrategyUnavailable::new("singular value decomposition failed"))?;
        Ok(Deviation {
            rmsd: fit.rmsd,
            retained_atoms: pair.len(),
        })
    }
}
