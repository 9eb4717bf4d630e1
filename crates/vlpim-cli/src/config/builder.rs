use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileInterfaceBounds, FilePruningConfig};
use super::models::{BindingSource, EpitopeSourcePath, EpitopesAppConfig, RankAppConfig};
use crate::cli::{EpitopesArgs, RankArgs};
use crate::error::{CliError, Result};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;
use vlpim::engine::config::{
    InterfaceBounds, PipelineConfigBuilder, PruningConfig, SelectionConfigBuilder,
};

fn load_file_config(path: Option<&Path>, set_values: &[String]) -> Result<FileConfig> {
    let file_config = match path {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    apply_set_values(file_config, set_values)
}

pub fn build_epitopes_config(args: &EpitopesArgs) -> Result<EpitopesAppConfig> {
    let defaults = DefaultsConfig::default();
    let mut file_config = load_file_config(args.config.as_deref(), &args.set_values)?;
    let selection_file = file_config.selection.take().unwrap_or_default();

    let include_weak = match (args.weak_binders.include_weak, args.weak_binders.strong_only) {
        (true, false) => true,
        (false, true) => false,
        _ => selection_file.include_weak.unwrap_or(defaults.include_weak),
    };

    let selection = SelectionConfigBuilder::new()
        .target_length(
            args.target_length
                .or(selection_file.target_length)
                .unwrap_or(defaults.target_length),
        )
        .strong_threshold(
            selection_file
                .strong_threshold
                .unwrap_or(defaults.strong_threshold),
        )
        .weak_threshold(selection_file.weak_threshold.unwrap_or(defaults.weak_threshold))
        .include_weak(include_weak)
        .max_epitopes(
            args.max_epitopes
                .or(selection_file.max_epitopes)
                .unwrap_or(defaults.max_epitopes),
        )
        .short_sequence_length(
            selection_file
                .short_sequence_length
                .unwrap_or(defaults.short_sequence_length),
        )
        .short_sequence_max_epitopes(
            selection_file
                .short_sequence_max_epitopes
                .unwrap_or(defaults.short_sequence_max_epitopes),
        )
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let source = match (&args.predictions, &args.epitopes) {
        (Some(path), None) => EpitopeSourcePath::Predictions(path.clone()),
        (None, Some(path)) => EpitopeSourcePath::Epitopes(path.clone()),
        _ => {
            return Err(CliError::Argument(
                "exactly one of --predictions or --epitopes is required".to_string(),
            ));
        }
    };

    debug!("Resolved selection configuration: {:?}", selection);
    Ok(EpitopesAppConfig {
        fasta_path: args.fasta.clone(),
        source,
        output_path: args.output.clone(),
        selection,
    })
}

pub fn build_rank_config(args: &RankArgs) -> Result<RankAppConfig> {
    let defaults = DefaultsConfig::default();
    let mut file_config = load_file_config(args.config.as_deref(), &args.set_values)?;
    let scoring_file = file_config.scoring.take().unwrap_or_default();
    let structure_file = file_config.structure.take().unwrap_or_default();
    let ranking_file = file_config.ranking.take().unwrap_or_default();

    let max_rmsd = if args.no_rmsd_filter {
        None
    } else if let Some(max_rmsd) = args.max_rmsd {
        Some(max_rmsd)
    } else if ranking_file.rmsd_filter == Some(false) {
        None
    } else {
        Some(ranking_file.max_rmsd.unwrap_or(defaults.max_rmsd))
    };

    let interface_bounds = if args.no_interface_filter || ranking_file.interface_filter == Some(false)
    {
        None
    } else {
        Some(merge_interface_bounds(
            ranking_file.interface_bounds,
            &defaults.interface_bounds,
        ))
    };

    let pipeline = PipelineConfigBuilder::new()
        .mode(
            args.mode
                .or(scoring_file.mode)
                .unwrap_or(defaults.mode),
        )
        .neutral_score(scoring_file.neutral_score.unwrap_or(defaults.neutral_score))
        .pruning(merge_pruning(structure_file.pruning, &defaults.pruning))
        .use_superimposer(
            structure_file
                .use_superimposer
                .unwrap_or(defaults.use_superimposer),
        )
        .max_rmsd(max_rmsd)
        .interface_bounds(interface_bounds)
        .max_candidates(
            args.max_candidates
                .or(ranking_file.max_candidates)
                .unwrap_or(defaults.max_candidates),
        )
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let source = match (&args.bindings, &args.predictions) {
        (Some(path), None) => BindingSource::Records(path.clone()),
        (None, Some(path)) => BindingSource::Predictions(path.clone()),
        _ => {
            return Err(CliError::Argument(
                "exactly one of --bindings or --predictions is required".to_string(),
            ));
        }
    };

    debug!("Resolved pipeline configuration: {:?}", pipeline);
    Ok(RankAppConfig {
        source,
        reference_path: args.reference.clone(),
        manifest_path: args.manifest.clone(),
        output_path: args.output.clone(),
        pipeline,
    })
}

fn merge_pruning(
    file_val: Option<FilePruningConfig>,
    defaults: &PruningConfig,
) -> Option<PruningConfig> {
    let file_val = file_val.unwrap_or_default();
    if file_val.enabled == Some(false) {
        return None;
    }
    Some(PruningConfig {
        prune_fraction: file_val.prune_fraction.unwrap_or(defaults.prune_fraction),
        max_iterations: file_val.max_iterations.unwrap_or(defaults.max_iterations),
        tolerance: file_val.tolerance.unwrap_or(defaults.tolerance),
        min_retained: file_val.min_retained.unwrap_or(defaults.min_retained),
    })
}

fn merge_interface_bounds(
    file_val: Option<FileInterfaceBounds>,
    defaults: &InterfaceBounds,
) -> InterfaceBounds {
    let file_val = file_val.unwrap_or_default();
    InterfaceBounds {
        max_dg_dsasa: file_val.max_dg_dsasa.unwrap_or(defaults.max_dg_dsasa),
        max_buns: file_val.max_buns.unwrap_or(defaults.max_buns),
        min_packstat: file_val.min_packstat.unwrap_or(defaults.min_packstat),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value))
    })
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let key = key.trim();

        match key {
            "selection.target-length" => {
                config.selection.get_or_insert_with(Default::default).target_length =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "selection.strong-threshold" => {
                config.selection.get_or_insert_with(Default::default).strong_threshold =
                    Some(parse_value(key, value_str, "float")?);
            }
            "selection.weak-threshold" => {
                config.selection.get_or_insert_with(Default::default).weak_threshold =
                    Some(parse_value(key, value_str, "float")?);
            }
            "selection.include-weak" => {
                config.selection.get_or_insert_with(Default::default).include_weak =
                    Some(parse_value(key, value_str, "boolean")?);
            }
            "selection.max-epitopes" => {
                config.selection.get_or_insert_with(Default::default).max_epitopes =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "selection.short-sequence-length" => {
                config
                    .selection
                    .get_or_insert_with(Default::default)
                    .short_sequence_length = Some(parse_value(key, value_str, "integer")?);
            }
            "selection.short-sequence-max-epitopes" => {
                config
                    .selection
                    .get_or_insert_with(Default::default)
                    .short_sequence_max_epitopes = Some(parse_value(key, value_str, "integer")?);
            }
            "scoring.mode" => {
                config.scoring.get_or_insert_with(Default::default).mode =
                    Some(parse_value(key, value_str, "mode")?);
            }
            "scoring.neutral-score" => {
                config.scoring.get_or_insert_with(Default::default).neutral_score =
                    Some(parse_value(key, value_str, "float")?);
            }
            "structure.use-superimposer" => {
                config
                    .structure
                    .get_or_insert_with(Default::default)
                    .use_superimposer = Some(parse_value(key, value_str, "boolean")?);
            }
            "structure.pruning.enabled"
            | "structure.pruning.prune-fraction"
            | "structure.pruning.max-iterations"
            | "structure.pruning.tolerance"
            | "structure.pruning.min-retained" => {
                let pruning = config
                    .structure
                    .get_or_insert_with(Default::default)
                    .pruning
                    .get_or_insert_with(Default::default);
                match key {
                    "structure.pruning.enabled" => {
                        pruning.enabled = Some(parse_value(key, value_str, "boolean")?)
                    }
                    "structure.pruning.prune-fraction" => {
                        pruning.prune_fraction = Some(parse_value(key, value_str, "float")?)
                    }
                    "structure.pruning.max-iterations" => {
                        pruning.max_iterations = Some(parse_value(key, value_str, "integer")?)
                    }
                    "structure.pruning.tolerance" => {
                        pruning.tolerance = Some(parse_value(key, value_str, "float")?)
                    }
                    _ => pruning.min_retained = Some(parse_value(key, value_str, "integer")?),
                }
            }
            "ranking.max-candidates" => {
                config.ranking.get_or_insert_with(Default::default).max_candidates =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "ranking.rmsd-filter" => {
                config.ranking.get_or_insert_with(Default::default).rmsd_filter =
                    Some(parse_value(key, value_str, "boolean")?);
            }
            "ranking.max-rmsd" => {
                config.ranking.get_or_insert_with(Default::default).max_rmsd =
                    Some(parse_value(key, value_str, "float")?);
            }
            "ranking.interface-filter" => {
                config.ranking.get_or_insert_with(Default::default).interface_filter =
                    Some(parse_value(key, value_str, "boolean")?);
            }
            "ranking.interface-bounds.max-dg-dsasa"
            | "ranking.interface-bounds.max-buns"
            | "ranking.interface-bounds.min-packstat" => {
                let bounds = config
                    .ranking
                    .get_or_insert_with(Default::default)
                    .interface_bounds
                    .get_or_insert_with(Default::default);
                let value = Some(parse_value(key, value_str, "float")?);
                match key {
                    "ranking.interface-bounds.max-dg-dsasa" => bounds.max_dg_dsasa = value,
                    "ranking.interface-bounds.max-buns" => bounds.max_buns = value,
                    _ => bounds.min_packstat = value,
                }
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
