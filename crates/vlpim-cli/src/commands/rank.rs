use super::{read_coordinates, write_resolved_config};
use crate::cli::RankArgs;
use crate::config::{BindingSource, FileConfig, build_rank_config};
use crate::error::{CliError, Result};
use crate::utils::parser::resolve_manifest_path;
use crate::utils::progress::CliProgressHandler;
use tracing::{info, warn};
use vlpim::{
    core::io::{
        netmhcii,
        tables::{self, ReportRow},
    },
    engine::{interface::assess, progress::ProgressReporter},
    workflows::{
        self,
        rank::{CandidateStructure, RankingRequest, records_from_predictions},
    },
};

pub fn run(args: RankArgs) -> Result<()> {
    let app = build_rank_config(&args)?;

    let records = match &app.source {
        BindingSource::Records(path) => {
            info!("Loading binding records from {:?}", path);
            tables::read_binding_records(path).map_err(|e| CliError::parsing(path, e))?
        }
        BindingSource::Predictions(path) => {
            info!("Loading binding predictions from {:?}", path);
            let predictions = netmhcii::read_predictions_from_path(path)
                .map_err(|e| CliError::parsing(path, e))?;
            records_from_predictions(&predictions)
        }
    };
    info!("Loaded {} binding record(s).", records.len());

    info!("Loading reference structure from {:?}", &app.reference_path);
    let reference = read_coordinates(&app.reference_path)?;

    info!("Loading candidate manifest from {:?}", &app.manifest_path);
    let manifest = tables::read_manifest(&app.manifest_path)
        .map_err(|e| CliError::parsing(&app.manifest_path, e))?;
    let candidates = manifest
        .iter()
        .map(|row| -> Result<CandidateStructure> {
            let path = resolve_manifest_path(&app.manifest_path, &row.structure);
            let interface = row.interface_metrics();
            let partial = row.dg_dsasa.is_some() || row.packstat.is_some() || row.buns.is_some();
            if interface.is_none() && partial {
                warn!(
                    "Candidate '{}' has incomplete interface metrics; interface filtering is skipped for it.",
                    row.candidate_id
                );
            }
            Ok(CandidateStructure {
                candidate_id: row.candidate_id.clone(),
                coordinates: read_coordinates(&path)?,
                interface,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Ranking {} candidate(s)...", candidates.len());
    let request = RankingRequest {
        reference: &reference,
        candidates: &candidates,
        records: &records,
    };
    let outcome = workflows::rank::run(request, &app.pipeline, None, &reporter)?;

    let rows: Vec<ReportRow> = outcome
        .iter()
        .map(|candidate| {
            let quality = candidate.interface.map(|m| assess(&m).to_string());
            ReportRow::new(candidate, quality)
        })
        .collect();
    tables::write_report(&app.output_path, &rows)
        .map_err(|e| CliError::writing(&app.output_path, e))?;
    write_resolved_config(&app.output_path, &FileConfig::from_pipeline(&app.pipeline))?;

    match outcome.ranked.first() {
        Some(best) => println!(
            "✓ Best candidate '{}' (score {:.2}, RMSD {:.3} Å). {} ranked, {} rejected.",
            best.candidate_id,
            best.score.as_ref().map_or(f64::NAN, |s| s.overall_score),
            best.rmsd.as_ref().map_or(f64::NAN, |r| r.value),
            outcome.ranked.len(),
            progress_handler.rejected_count()
        ),
        None => {
            warn!("No candidate passed all filters.");
            println!("Warning: no candidate passed all filters.");
        }
    }
    println!("  Report written to: {}", app.output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn write_ca_csv(path: &Path, offset: f64, outlier: f64) {
        let mut content = String::from("x,y,z\n");
        for i in 0..10 {
            let t = i as f64 * 1.745;
            let mut x = 2.3 * t.cos() + offset;
            if i == 9 {
                x += outlier;
            }
            content.push_str(&format!("{},{},{}\n", x, 2.3 * t.sin(), 1.5 * i as f64));
        }
        fs::write(path, content).unwrap();
    }

    fn rank_args(dir: &Path) -> RankArgs {
        RankArgs {
            bindings: Some(dir.join("bindings.csv")),
            predictions: None,
            reference: dir.join("reference.csv"),
            manifest: dir.join("manifest.csv"),
            output: dir.join("report.csv"),
            config: None,
            mode: None,
            max_candidates: None,
            max_rmsd: None,
            no_rmsd_filter: false,
            no_interface_filter: false,
            set_values: vec![],
        }
    }

    #[test]
    fn run_writes_report_for_every_candidate() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("models")).unwrap();
        write_ca_csv(&root.join("reference.csv"), 0.0, 0.0);
        write_ca_csv(&root.join("models/a.csv"), 5.0, 0.0);
        write_ca_csv(&root.join("models/b.csv"), -1.0, 0.0);
        write_ca_csv(&root.join("models/c.csv"), 0.0, 0.0);

        fs::write(
            root.join("bindings.csv"),
            "candidate_id,epitope_id,allele,value,metric\n\
             a,E001,DRB1_0101,60,rank_el\n\
             b,E001,DRB1_0101,20,rank_el\n",
        )
        .unwrap();
        fs::write(
            root.join("manifest.csv"),
            "candidate_id,structure,dg_dsasa,packstat,buns,interface_sc\n\
             a,models/a.csv,-2.0,0.7,1.0,\n\
             b,models/b.csv,-1.2,0.65,3.0,60\n\
             c,models/c.csv,,,,\n",
        )
        .unwrap();

        run(rank_args(root)).unwrap();

        let report = fs::read_to_string(root.join("report.csv")).unwrap();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("candidate_id,final_rank,overall_immunogenicity_score"));
        assert!(lines[1].starts_with("a,1,"));
        assert!(lines[2].starts_with("b,2,"));
        assert!(lines[3].starts_with("c,,"));
        assert!(lines[3].contains("undefined_score"));

        let resolved = fs::read_to_string(root.join("report.config.toml")).unwrap();
        assert!(resolved.contains("mode = \"reduce\""));
    }

    #[test]
    fn run_fails_on_missing_candidate_structure() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write_ca_csv(&root.join("reference.csv"), 0.0, 0.0);
        fs::write(
            root.join("bindings.csv"),
            "candidate_id,epitope_id,allele,value,metric\na,E001,DRB1_0101,60,rank_el\n",
        )
        .unwrap();
        fs::write(
            root.join("manifest.csv"),
            "candidate_id,structure\na,models/missing.csv\n",
        )
        .unwrap();

        let err = run(rank_args(root)).unwrap_err();
        assert!(matches!(err, CliError::FileParsing { ref path, .. } if path.ends_with("missing.csv")));
    }
}
