use super::{Deviation, StrategyUnavailable, SuperpositionStrategy};
use crate::core::models::candidate::RmsdMethod;
use crate::core::models::structure::StructurePair;
use crate::core::utils::geometry::superpose_quaternion;

/// Single-pass best fit over all matched atoms using Horn's quaternion method.
pub struct QuaternionSuperimposer;

impl SuperpositionStrategy for QuaternionSuperimposer {
    fn method(&self) -> RmsdMethod {
        RmsdMethod::Superimposer
    }

    fn attempt(&self, _: &str, pair: &StructurePair) -> Result<Deviation, StrategyUnavailable> {
        if pair.len() < 3 {
            return Err(StrategyUnavailable::new(format!(
                "needs at least 3 matched atoms, found {}",
                pair.len()
            )));
        }
        let fit = superpose_quaternion(pair.reference(), pair.predicted())
            .ok_or_else(|| StrategyUnavailable::new("eigen decomposition did not converge"))?;
        if !fit.rmsd.is_finite() {
            return Err(StrategyUnavailable::new("non-finite RMSD"));
        }
        Ok(Deviation {
            rmsd: fit.rmsd,
            retained_atoms: pair.len(),
        })
    }
}
