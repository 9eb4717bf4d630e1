use crate::core::models::binding::BindingPrediction;
use crate::core::models::epitope::{EpitopeRow, ExtendedEpitope};
use crate::core::models::sequence::ProteinSequence;
use crate::engine::config::SelectionConfig;
use crate::engine::epitope::{EpitopeCoreSelector, SelectedCore};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument, warn};

/// Where the epitope cores come from.
#[derive(Debug, Clone, Copy)]
pub enum EpitopeInput<'a> {
    User(&'a [EpitopeRow]),
    Predicted(&'a [BindingPrediction]),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpitopeWorkflowResult {
    pub selected: Vec<SelectedCore>,
    /// One entry per selected core, in the same order.
    pub extended: Vec<ExtendedEpitope>,
}

#[instrument(skip_all, name = "epitope_workflow", fields(parent = %parent.id, length = parent.len()))]
pub fn run(
    parent: &ProteinSequence,
    input: EpitopeInput<'_>,
    config: &SelectionConfig,
    reporter: &ProgressReporter,
) -> Result<EpitopeWorkflowResult, EngineError> {
    let selector = EpitopeCoreSelector::new(config);

    reporter.report(Progress::PhaseStart {
        name: "Core Selection",
    });
    let selected = match input {
        EpitopeInput::User(rows) => selector.validate_user_rows(parent, rows)?,
        EpitopeInput::Predicted(predictions) => selector.select_predicted(parent, predictions),
    };
    reporter.report(Progress::PhaseFinish);

    if selected.is_empty() {
        warn!("No epitope cores were selected");
    }

    reporter.report(Progress::PhaseStart { name: "Extension" });
    reporter.report(Progress::TaskStart {
        total_steps: selected.len() as u64,
    });
    let mut extended = Vec::with_capacity(selected.len());
    for core in &selected {
        extended.push(selector.extend(parent, &core.epitope)?);
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    let truncated = extended.iter().filter(|e| e.truncated).count();
    info!(
        selected = selected.len(),
        truncated, "Epitope workflow complete"
    );
    Ok(EpitopeWorkflowResult { selected, extended })
}
