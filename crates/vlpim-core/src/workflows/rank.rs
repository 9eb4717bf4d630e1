use crate::core::models::binding::{AlleleBindingRecord, BindingPrediction, MetricKind};
use crate::core::models::candidate::InterfaceMetrics;
use crate::core::models::structure::CoordinateSet;
use crate::engine::config::PipelineConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::ranking::{CandidateRanker, RankingOutcome};
use crate::engine::scoring::ImmunogenicityScorer;
use crate::engine::structure::StructuralDeviationEngine;
use crate::engine::structure::external::ExternalAligner;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateStructure {
    pub candidate_id: String,
    pub coordinates: CoordinateSet,
    pub interface: Option<InterfaceMetrics>,
}

#[derive(Debug, Clone, Copy)]
pub struct RankingRequest<'a> {
    pub reference: &'a CoordinateSet,
    pub candidates: &'a [CandidateStructure],
    pub records: &'a [AlleleBindingRecord],
}

/// Converts predictor rows into binding records, one per row.
///
/// The predictor's sequence identifier names the candidate and the peptide
/// position names the epitope. Percentile rank is preferred over IC50; rows
/// carrying neither are dropped.
pub fn records_from_predictions(predictions: &[BindingPrediction]) -> Vec<AlleleBindingRecord> {
    predictions
        .iter()
        .filter_map(|p| {
            let (value, metric) = match (p.rank_el, p.ic50) {
                (Some(rank), _) => (rank, MetricKind::RankEl),
                (None, Some(ic50)) => (ic50, MetricKind::Ic50),
                (None, None) => return None,
            };
            Some(AlleleBindingRecord {
                candidate_id: p.sequence_id.clone(),
                epitope_id: format!("P{}", p.position),
                allele: p.allele.clone(),
                value,
                metric,
            })
        })
        .collect()
}

#[instrument(skip_all, name = "ranking_workflow", fields(candidates = request.candidates.len(), records = request.records.len()))]
pub fn run(
    request: RankingRequest<'_>,
    config: &PipelineConfig,
    aligner: Option<Arc<dyn ExternalAligner>>,
    reporter: &ProgressReporter,
) -> Result<RankingOutcome, EngineError> {
    // Scoring is a barrier: every record is normalized before any candidate
    // moves on to structural comparison.
    reporter.report(Progress::PhaseStart {
        name: "Immunogenicity Scoring",
    });
    let candidate_ids: Vec<String> = request
        .candidates
        .iter()
        .map(|c| c.candidate_id.clone())
        .collect();
    let scoring = ImmunogenicityScorer::new(&config.scoring).score(&candidate_ids, request.records)?;
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "Structural Deviation",
    });
    reporter.report(Progress::TaskStart {
        total_steps: request.candidates.len() as u64,
    });
    let engine = StructuralDeviationEngine::new(&config.structure, aligner);
    let structures: Vec<(&str, &CoordinateSet)> = request
        .candidates
        .iter()
        .map(|c| (c.candidate_id.as_str(), &c.coordinates))
        .collect();
    let deviations = engine.compute_all(request.reference, &structures);
    for _ in 0..structures.len() {
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart { name: "Ranking" });
    let interfaces: HashMap<String, InterfaceMetrics> = request
        .candidates
        .iter()
        .filter_map(|c| Some((c.candidate_id.clone(), c.interface?)))
        .collect();
    let outcome = CandidateRanker::new(&config.ranking).rank(&scoring, &deviations, &interfaces);
    for candidate in &outcome.rejected {
        if let Some(reason) = &candidate.rejected_reason {
            reporter.report(Progress::CandidateRejected {
                candidate_id: candidate.candidate_id.clone(),
                reason: reason.to_string(),
            });
        }
    }
    reporter.report(Progress::PhaseFinish);

    info!(
        ranked = outcome.ranked.len(),
        rejected = outcome.rejected.len(),
        "Ranking workflow complete"
    );
    Ok(outcome)
}
