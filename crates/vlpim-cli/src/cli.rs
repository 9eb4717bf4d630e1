use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;
use vlpim::core::models::candidate::ImmunogenicityMode;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Chufan Wang",
    version,
    about = "VLPIM CLI - Epitope selection and immunogenicity-aware ranking of virus-like particle candidates.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Select epitope cores from a parent protein and extend them to the target length.
    Epitopes(EpitopesArgs),
    /// Score, filter and rank candidates by immunogenicity and structural deviation.
    Rank(RankArgs),
}

/// Arguments for the `epitopes` subcommand.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("epitope-source").required(true).args(["predictions", "epitopes"])))]
pub struct EpitopesArgs {
    // --- Inputs ---
    /// Parent protein sequence in FASTA format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub fasta: PathBuf,

    /// Binding predictor output used to select cores automatically.
    #[arg(short, long, value_name = "PATH")]
    pub predictions: Option<PathBuf>,

    /// User-supplied epitopes as a `sequence,start,end` CSV table.
    #[arg(short, long, value_name = "PATH")]
    pub epitopes: Option<PathBuf>,

    /// Path for the extended epitope table (CSV).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Selection Overrides ---
    /// Override the length epitopes are extended to.
    #[arg(short = 'L', long, value_name = "INT")]
    pub target_length: Option<usize>,

    /// Override the maximum number of cores selected for long sequences.
    #[arg(short = 'n', long, value_name = "INT")]
    pub max_epitopes: Option<usize>,

    /// Override `selection.include-weak` from the config file.
    #[command(flatten)]
    pub weak_binders: WeakBinders,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S selection.target-length=20
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// A group to handle mutually exclusive flags for weak-binder selection.
#[derive(Args, Debug, Clone, Copy)]
#[group(required = false, multiple = false)]
pub struct WeakBinders {
    /// Also select cores supported only by weak binders.
    #[arg(long)]
    pub include_weak: bool,
    /// Select only cores supported by at least one strong binder.
    #[arg(long)]
    pub strong_only: bool,
}

/// Arguments for the `rank` subcommand.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("binding-source").required(true).args(["bindings", "predictions"])))]
pub struct RankArgs {
    // --- Inputs ---
    /// Per-allele binding records as a `candidate_id,epitope_id,allele,value,metric` CSV table.
    #[arg(short, long, value_name = "PATH")]
    pub bindings: Option<PathBuf>,

    /// Binding predictor output; its sequence identifiers name the candidates.
    #[arg(short, long, value_name = "PATH")]
    pub predictions: Option<PathBuf>,

    /// Reference structure (PDB, or x,y,z CSV).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub reference: PathBuf,

    /// Candidate manifest CSV: `candidate_id,structure[,dg_dsasa,packstat,buns,interface_sc]`.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub manifest: PathBuf,

    /// Path for the ranking report (CSV).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Scoring Overrides ---
    /// Override the immunogenicity objective ('reduce' or 'enhance').
    #[arg(long, value_name = "MODE")]
    pub mode: Option<ImmunogenicityMode>,

    // --- Ranking Overrides ---
    /// Override the number of candidates kept after ranking.
    #[arg(short = 'k', long, value_name = "INT")]
    pub max_candidates: Option<usize>,

    /// Override the RMSD rejection threshold in Angstroms.
    #[arg(long, value_name = "FLOAT", conflicts_with = "no_rmsd_filter")]
    pub max_rmsd: Option<f64>,

    /// Disable the RMSD threshold, even if it is defined in the config file.
    #[arg(long)]
    pub no_rmsd_filter: bool,

    /// Disable interface-metric filtering, even if it is defined in the config file.
    #[arg(long)]
    pub no_interface_filter: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S ranking.max-rmsd=1.5
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn rank_requires_a_binding_source() {
        let result = Cli::try_parse_from([
            "vlpim", "rank", "-r", "ref.pdb", "-m", "manifest.csv", "-o", "out.csv",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn rank_parses_mode_and_overrides() {
        let cli = Cli::try_parse_from([
            "vlpim",
            "-vv",
            "rank",
            "-b",
            "bindings.csv",
            "-r",
            "ref.pdb",
            "-m",
            "manifest.csv",
            "-o",
            "out.csv",
            "--mode",
            "enhance",
            "-k",
            "5",
            "-S",
            "scoring.neutral-score=40",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Rank(args) = cli.command else {
            panic!("expected rank command");
        };
        assert_eq!(args.mode, Some(ImmunogenicityMode::Enhance));
        assert_eq!(args.max_candidates, Some(5));
        assert_eq!(args.set_values, vec!["scoring.neutral-score=40".to_string()]);
    }

    #[test]
    fn epitopes_rejects_both_sources_and_conflicting_weak_flags() {
        let both = Cli::try_parse_from([
            "vlpim", "epitopes", "-f", "p.fasta", "-p", "p.txt", "-e", "e.csv", "-o", "o.csv",
        ]);
        assert!(both.is_err());

        let conflicting = Cli::try_parse_from([
            "vlpim",
            "epitopes",
            "-f",
            "p.fasta",
            "-p",
            "p.txt",
            "-o",
            "o.csv",
            "--include-weak",
            "--strong-only",
        ]);
        assert!(conflicting.is_err());
    }
}
