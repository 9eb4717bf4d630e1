use super::{Deviation, StrategyUnavailable, SuperpositionStrategy};
use crate::core::models::candidate::RmsdMethod;
use crate::core::models::structure::StructurePair;
use nalgebra::Point3;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExternalAlignerError {
    #[error("aligner '{0}' is not available")]
    NotAvailable(String),
    #[error("alignment failed: {0}")]
    Failed(String),
}

/// A full-featured structural aligner provided by the caller.
///
/// Implementations own any subprocess invocation, timeouts and retries; every
/// failure they report makes the engine move on to the next strategy.
pub trait ExternalAligner: Send + Sync {
    fn name(&self) -> &str;

    fn align(
        &self,
        reference: &[Point3<f64>],
        predicted: &[Point3<f64>],
    ) -> Result<f64, ExternalAlignerError>;
}

pub struct ExternalPrimaryStrategy {
    aligner: Option<Arc<dyn ExternalAligner>>,
}

impl ExternalPrimaryStrategy {
    pub fn new(aligner: Option<Arc<dyn ExternalAligner>>) -> Self {
        Self { aligner }
    }
}

impl SuperpositionStrategy for ExternalPrimaryStrategy {
    fn method(&self) -> RmsdMethod {
        RmsdMethod::ExternalPrimary
    }

    fn attempt(&self, _: &str, pair: &StructurePair) -> Result<Deviation, StrategyUnavailable> {
        let aligner = self
            .aligner
            .as_ref()
            .ok_or_else(|| StrategyUnavailable::new("no external aligner configured"))?;
        let rmsd = aligner
            .align(pair.reference(), pair.predicted())
            .map_err(|e| StrategyUnavailable::new(format!("{}: {}", aligner.name(), e)))?;
        if !(rmsd.is_finite() && rmsd >= 0.0) {
            return Err(StrategyUnavailable::new(format!(
                "{} returned invalid RMSD {}",
                aligner.name(),
                rmsd
            )));
        }
        Ok(Deviation {
            rmsd,
            retained_atoms: pair.len(),
        })
    }
}
