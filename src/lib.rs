//! Labelcurate: class balancing and label integrity for YOLO datasets.
//!
//! Labelcurate works on datasets laid out as `<root>/<split>/images` and
//! `<root>/<split>/labels`, where each image is paired with a label file of
//! the same stem. It counts class occurrences, prunes over-represented
//! classes while keeping train/valid/test proportions, remaps class ids, and
//! keeps image/label pairs consistent through every change.
//!
//! # Modules
//!
//! - [`layout`]: Split discovery and the stem-keyed image/label join
//! - [`label`]: Class ids and label line parsing
//! - [`index`]: Per-class file membership for a split
//! - [`counter`]: Class occurrence and file counts
//! - [`prune`]: Ratio-preserving prune quotas
//! - [`sample`]: Seeded selection of files to delete
//! - [`enforce`]: Pair-consistent deletion and negative-sample injection
//! - [`integrity`]: Read-only pairing checks
//! - [`remap`]: Class id remapping
//! - [`curate`]: Dataset-level operations combining the above
//! - [`config`]: Options and the YAML config file
//! - [`error`]: Error types for labelcurate operations

pub mod config;
pub mod counter;
pub mod curate;
pub mod enforce;
pub mod error;
pub mod index;
pub mod integrity;
pub mod label;
pub mod layout;
pub mod logging;
pub mod prune;
pub mod remap;
pub mod sample;

use std::fmt::Display;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use config::{ConfigFile, CurateOptions};
use layout::Split;
use remap::ClassMap;

pub use error::CurateError;

/// The labelcurate CLI application.
#[derive(Parser)]
#[command(name = "labelcurate")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Flags shared by every subcommand.
#[derive(clap::Args)]
struct GlobalArgs {
    /// Dataset root containing train/, valid/ and test/.
    #[arg(long, global = true, env = "LABELCURATE_ROOT")]
    root: Option<PathBuf>,

    /// YAML config file. Command-line flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Split to operate on (repeatable). Defaults to all three.
    #[arg(long = "split", global = true)]
    splits: Vec<Split>,

    /// Output format for reports.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Count annotations and files per class.
    Count,
    /// Print prune quotas without changing anything.
    Plan(TargetArgs),
    /// Delete files of a class so each split keeps the same ratio.
    Prune(PruneArgs),
    /// Rewrite class ids in every label file.
    Remap(RemapArgs),
    /// List empty label files.
    Nulls,
    /// Delete empty label files together with their images.
    DeleteNulls(DryRunArgs),
    /// Copy background images into a split with empty labels.
    AddNegatives(AddNegativesArgs),
    /// Check that every image has a label and every label an image.
    Check(CheckArgs),
}

/// Class target shared by `plan` and `prune`.
#[derive(clap::Args)]
struct TargetArgs {
    /// Class id to prune.
    #[arg(long = "class")]
    class_id: Option<String>,

    /// Files of the class to keep in the reference split.
    #[arg(long = "target")]
    target_count: Option<usize>,

    /// Reference count from before an earlier prune, used as the ratio denominator.
    #[arg(long = "baseline")]
    baseline_count: Option<usize>,

    /// Split the target count refers to.
    #[arg(long = "reference")]
    reference_split: Option<Split>,
}

#[derive(clap::Args)]
struct PruneArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Seed for file selection.
    #[arg(long)]
    seed: Option<u64>,

    /// Print the selected stems.
    #[arg(long)]
    list: bool,

    #[command(flatten)]
    dry_run: DryRunArgs,
}

#[derive(clap::Args)]
struct RemapArgs {
    /// Class map as OLD=NEW pairs, e.g. `0=4,1=5`.
    #[arg(long = "map")]
    class_map: Option<String>,

    #[command(flatten)]
    dry_run: DryRunArgs,
}

#[derive(clap::Args)]
struct AddNegativesArgs {
    /// Directory of background images.
    #[arg(long = "from")]
    pool: PathBuf,

    /// Split receiving the images.
    #[arg(long = "into")]
    split: Split,

    /// Maximum number of images to add.
    #[arg(long)]
    limit: usize,

    /// Seed for picking pool images.
    #[arg(long)]
    seed: Option<u64>,

    #[command(flatten)]
    dry_run: DryRunArgs,
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Exit non-zero if any image/label pair is broken.
    #[arg(long)]
    strict: bool,

    /// Remove orphaned labels and images after checking.
    #[arg(long)]
    fix: bool,

    #[command(flatten)]
    dry_run: DryRunArgs,
}

#[derive(clap::Args)]
struct DryRunArgs {
    /// Report what would change without touching any file.
    #[arg(long)]
    dry_run: bool,
}

/// Run the labelcurate CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), CurateError> {
    let cli = Cli::parse();
    logging::init_logging(cli.global.verbose);

    let Some(command) = cli.command else {
        println!("labelcurate {}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Class balancing and label integrity for YOLO datasets.");
        println!();
        println!("Run 'labelcurate --help' for usage information.");
        return Ok(());
    };

    let mut opts = load_options(&cli.global)?;
    let output = cli.global.output;

    match command {
        Commands::Count => emit(&curate::count(&opts)?, output),
        Commands::Plan(args) => {
            args.apply(&mut opts);
            emit(&curate::plan(&opts)?, output)
        }
        Commands::Prune(args) => run_prune(args, opts, output),
        Commands::Remap(args) => {
            if let Some(map) = &args.class_map {
                opts.class_map = ClassMap::parse(map)?;
            }
            opts.dry_run = args.dry_run.dry_run;
            let report = curate::remap(&opts)?;
            emit(&report, output)?;
            finish(report.failure_count())
        }
        Commands::Nulls => {
            let report = curate::detect_nulls(&opts)?;
            emit(&report, output)?;
            finish(report.failure_count())
        }
        Commands::DeleteNulls(args) => {
            opts.dry_run = args.dry_run;
            let report = curate::delete_nulls(&opts)?;
            emit(&report, output)?;
            finish(report.failure_count())
        }
        Commands::AddNegatives(args) => {
            if let Some(seed) = args.seed {
                opts.seed = seed;
            }
            opts.dry_run = args.dry_run.dry_run;
            let report = curate::add_negatives(&opts, &args.pool, args.split, args.limit)?;
            emit(&report, output)?;
            finish(report.failure_count())
        }
        Commands::Check(args) => run_check(args, opts, output),
    }
}

impl TargetArgs {
    fn apply(&self, opts: &mut CurateOptions) {
        if let Some(class_id) = &self.class_id {
            opts.class_id = Some(class_id.clone());
        }
        if let Some(target_count) = self.target_count {
            opts.target_count = Some(target_count);
        }
        if let Some(baseline_count) = self.baseline_count {
            opts.baseline_count = Some(baseline_count);
        }
        if let Some(reference) = self.reference_split {
            opts.reference_split = reference;
        }
    }
}

/// Build options from the config file (if any) and the global flags.
fn load_options(global: &GlobalArgs) -> Result<CurateOptions, CurateError> {
    let mut opts = match &global.config {
        Some(path) => {
            let file = ConfigFile::load(path)?;
            let root = global
                .root
                .clone()
                .or_else(|| file.dataset_root(path))
                .unwrap_or_else(|| PathBuf::from("."));
            file.into_options(root)?
        }
        None => CurateOptions::new(global.root.clone().unwrap_or_else(|| PathBuf::from("."))),
    };

    if !global.splits.is_empty() {
        opts.splits = global.splits.clone();
    }

    Ok(opts)
}

fn run_prune(
    args: PruneArgs,
    mut opts: CurateOptions,
    output: OutputFormat,
) -> Result<(), CurateError> {
    args.target.apply(&mut opts);
    if let Some(seed) = args.seed {
        opts.seed = seed;
    }
    opts.dry_run = args.dry_run.dry_run;

    let outcome = curate::prune(&opts)?;
    emit(&outcome, output)?;

    if args.list && output == OutputFormat::Text {
        println!();
        println!("Selected stems:");
        for (split, stems) in outcome.selection.stems_by_split() {
            for stem in stems {
                println!("  {}/{}", split, stem);
            }
        }
    }

    finish(outcome.deletion.failure_count())
}

fn run_check(args: CheckArgs, mut opts: CurateOptions, output: OutputFormat) -> Result<(), CurateError> {
    opts.dry_run = args.dry_run.dry_run;

    let outcome = curate::check(&opts, args.fix)?;
    emit(&outcome, output)?;

    if let Some(repairs) = &outcome.repairs {
        finish(repairs.failure_count())?;
    }

    let violation_count = outcome.report.violation_count();
    if args.strict && violation_count > 0 {
        return Err(CurateError::IntegrityCheckFailed {
            violation_count,
            report: outcome.report,
        });
    }

    Ok(())
}

/// Print a report in the requested format.
fn emit<T: Serialize + Display>(report: &T, output: OutputFormat) -> Result<(), CurateError> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => print!("{}", report),
    }
    Ok(())
}

/// Turn a non-zero failure tally into a non-zero exit.
fn finish(failures: usize) -> Result<(), CurateError> {
    if failures > 0 {
        Err(CurateError::OperationIncomplete { failures })
    } else {
        Ok(())
    }
}
