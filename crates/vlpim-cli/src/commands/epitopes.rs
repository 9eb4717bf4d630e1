use super::write_resolved_config;
use crate::cli::EpitopesArgs;
use crate::config::{EpitopeSourcePath, FileConfig, build_epitopes_config};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use tracing::{info, warn};
use vlpim::{
    core::io::{fasta, netmhcii, tables},
    engine::progress::ProgressReporter,
    workflows::{self, epitopes::EpitopeInput},
};

pub fn run(args: EpitopesArgs) -> Result<()> {
    let app = build_epitopes_config(&args)?;

    info!("Loading parent sequence from {:?}", &app.fasta_path);
    let parent = fasta::read_sequence_from_path(&app.fasta_path)
        .map_err(|e| CliError::parsing(&app.fasta_path, e))?;
    info!("Parent sequence '{}' has {} residues.", parent.id, parent.len());

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let result = match &app.source {
        EpitopeSourcePath::Predictions(path) => {
            info!("Loading binding predictions from {:?}", path);
            let predictions = netmhcii::read_predictions_from_path(path)
                .map_err(|e| CliError::parsing(path, e))?;
            workflows::epitopes::run(
                &parent,
                EpitopeInput::Predicted(&predictions),
                &app.selection,
                &reporter,
            )?
        }
        EpitopeSourcePath::Epitopes(path) => {
            info!("Loading user epitopes from {:?}", path);
            let rows = tables::read_epitope_rows(path).map_err(|e| CliError::parsing(path, e))?;
            workflows::epitopes::run(
                &parent,
                EpitopeInput::User(&rows),
                &app.selection,
                &reporter,
            )?
        }
    };

    if result.extended.is_empty() {
        warn!("No epitopes were selected; writing an empty table.");
        println!("Warning: no epitope cores passed selection.");
    }

    tables::write_epitopes(&app.output_path, &result.extended)
        .map_err(|e| CliError::writing(&app.output_path, e))?;
    write_resolved_config(&app.output_path, &FileConfig::from_selection(&app.selection))?;

    let truncated = result.extended.iter().filter(|e| e.truncated).count();
    println!(
        "✓ {} epitope(s) written to: {}",
        result.extended.len(),
        app.output_path.display()
    );
    if truncated > 0 {
        println!(
            "  {} epitope(s) could not reach length {} and were flagged as truncated.",
            truncated, app.selection.target_length
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::WeakBinders;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    const PARENT: &str = "MKTAYIAKQRQISFVKSHFSRQLEERLGLIEVQAPILSRVGDGTQDNLSGAEKAVQVKVKALPDAQFEVVHSLAKWKRQTLGQHDFSAGEGLYTHMKALRPDEDRLSPLHSVYVDQWDWERVMGDGERQFSTLKSTVEAIWAGIKATEAAVSEEFGLAPFLPDQIHFVHSQELLSRYPDLDAKGRERAIAKDLGAVFLVGIGGKLSDGHRHDVRAPDYDDWSAAGQLIGRLSLSAAA";

    #[test]
    fn run_writes_extended_epitopes_and_resolved_config() {
        let dir = tempdir().unwrap();
        let fasta_path = dir.path().join("parent.fasta");
        fs::write(&fasta_path, format!(">parent\n{}\n", PARENT)).unwrap();

        let epitopes_path = dir.path().join("epitopes.csv");
        let core = &PARENT[29..38];
        fs::write(
            &epitopes_path,
            format!("sequence,start,end\n{},30,38\n{},1,4\n", core, &PARENT[0..4]),
        )
        .unwrap();

        let output = dir.path().join("extended.csv");
        let args = EpitopesArgs {
            fasta: fasta_path,
            predictions: None,
            epitopes: Some(epitopes_path),
            output: output.clone(),
            config: None,
            target_length: Some(15),
            max_epitopes: None,
            weak_binders: WeakBinders {
                include_weak: false,
                strong_only: false,
            },
            set_values: vec![],
        };
        run(args).unwrap();

        let table = fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("epitope_id,core_sequence"));
        assert!(lines[1].starts_with("E001,MKTA,1,4,"));
        assert!(lines[2].contains(core));

        let resolved = fs::read_to_string(dir.path().join("extended.config.toml")).unwrap();
        assert!(resolved.contains("target-length = 15"));
    }

    #[test]
    fn run_reports_unreadable_fasta_with_its_path() {
        let dir = tempdir().unwrap();
        let args = EpitopesArgs {
            fasta: PathBuf::from("/missing/parent.fasta"),
            predictions: Some(PathBuf::from("/missing/predictions.txt")),
            epitopes: None,
            output: dir.path().join("out.csv"),
            config: None,
            target_length: None,
            max_epitopes: None,
            weak_binders: WeakBinders {
                include_weak: false,
                strong_only: false,
            },
            set_values: vec![],
        };
        let err = run(args).unwrap_err();
        assert!(matches!(err, CliError::FileParsing { ref path, .. } if path.ends_with("parent.fasta")));
    }
}
