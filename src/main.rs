//! distpatch - Builds minimal update bundles by diffing two product distributions.
//!
//! Usage:
//!   distpatch generate <UPDATED> <PREVIOUS> <UPDATE_DIR>   Create an update zip
//!   distpatch diff <UPDATED> <PREVIOUS>                    Show what changed
//!   distpatch validate <UPDATE_ZIP> <PREVIOUS>             Check an update zip
//!   distpatch init [DIR]                                   Write a descriptor template
//!   distpatch --help                                       Show help

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail, eyre};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use distpatch_core::{DiffConfig, DistributionTree};
use distpatch_diff::{Classifier, DiffReport};
use distpatch_scan::{TreeBuilder, ZipDistribution};
use distpatch_update::{
    DESCRIPTOR_FILE, PackagingConfig, StagingArea, UpdateDescriptor, apply, validate_update,
};

#[derive(Parser)]
#[command(
    name = "distpatch",
    version,
    about = "Builds minimal update bundles by diffing two product distributions",
    long_about = "distpatch compares an updated product distribution with the previous \
                  release, lists every added, removed and modified file, and packages the \
                  changed files together with an update descriptor into an update zip."
)]
struct Cli {
    /// Enable debug logs
    #[arg(short, long, global = true)]
    debug: bool,

    /// Enable trace logs
    #[arg(short, long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an update zip from two distributions
    Generate {
        /// Updated distribution (.zip)
        updated: PathBuf,

        /// Previously released distribution (.zip)
        previous: PathBuf,

        /// Update directory holding update-descriptor.yaml and LICENSE.txt
        update_dir: PathBuf,

        #[command(flatten)]
        diff: DiffArgs,

        /// Prefix of the update name
        #[arg(long, value_name = "PREFIX")]
        name_prefix: Option<String>,

        /// Directory in which the update is staged (defaults to the system temp dir)
        #[arg(long, value_name = "DIR")]
        staging_dir: Option<PathBuf>,
    },

    /// Show the changes between two distributions
    Diff {
        /// Updated distribution (.zip)
        updated: PathBuf,

        /// Previously released distribution (.zip)
        previous: PathBuf,

        #[command(flatten)]
        diff: DiffArgs,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Check an update zip against the distribution it applies to
    Validate {
        /// Update zip
        update_zip: PathBuf,

        /// Previously released distribution (.zip)
        previous: PathBuf,
    },

    /// Write an update-descriptor.yaml template
    Init {
        /// Update directory (defaults to current directory)
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Print a sample descriptor instead of writing one
        #[arg(short, long)]
        sample: bool,
    },
}

#[derive(Args)]
struct DiffArgs {
    /// Collapse removals below this directory to whole feature directories
    #[arg(long, value_name = "PREFIX")]
    features_root: Option<String>,

    /// Never collapse removals to feature directories
    #[arg(long, conflicts_with = "features_root")]
    no_features_root: bool,

    /// Compare paths only; never report modified files
    #[arg(long)]
    skip_digests: bool,
}

impl DiffArgs {
    fn to_config(&self) -> Result<DiffConfig> {
        let mut builder = DiffConfig::builder();
        builder.check_digests(!self.skip_digests);
        if self.no_features_root {
            builder.features_root(None::<String>);
        } else if let Some(root) = &self.features_root {
            builder.features_root(root.clone());
        }
        builder.build().map_err(|e| eyre!("{e}"))
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.debug, cli.trace);

    match cli.command {
        Command::Generate {
            updated,
            previous,
            update_dir,
            diff,
            name_prefix,
            staging_dir,
        } => {
            let mut packaging = PackagingConfig::builder();
            if let Some(prefix) = name_prefix {
                packaging.update_name_prefix(prefix);
            }
            if let Some(dir) = staging_dir {
                packaging.staging_root(dir);
            }
            let packaging = packaging.build().map_err(|e| eyre!("{e}"))?;
            run_generate(&updated, &previous, &update_dir, diff.to_config()?, &packaging)?;
        }
        Command::Diff {
            updated,
            previous,
            diff,
            format,
        } => {
            run_diff(&updated, &previous, diff.to_config()?, format)?;
        }
        Command::Validate {
            update_zip,
            previous,
        } => {
            run_validate(&update_zip, &previous)?;
        }
        Command::Init { dir, sample } => {
            run_init(&dir, sample)?;
        }
    }

    Ok(())
}

/// Install the log subscriber. `RUST_LOG` takes precedence over the flags.
fn init_logging(debug: bool, trace: bool) {
    let level = if trace {
        "trace"
    } else if debug {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Diff the distributions and package the changes as an update zip.
fn run_generate(
    updated: &Path,
    previous: &Path,
    update_dir: &Path,
    diff_config: DiffConfig,
    packaging: &PackagingConfig,
) -> Result<()> {
    if !update_dir.is_dir() {
        bail!(
            "Update location must be a directory, '{}' is not",
            update_dir.display()
        );
    }
    check_distribution(updated, "updated")?;
    check_distribution(previous, "previous")?;

    let mut descriptor = UpdateDescriptor::load(update_dir)
        .with_context(|| format!("Failed to read '{DESCRIPTOR_FILE}'"))?;
    descriptor
        .validate()
        .with_context(|| format!("'{DESCRIPTOR_FILE}' format is incorrect"))?;
    let update_name = descriptor.update_name(&packaging.update_name_prefix);
    info!(update = %update_name, "Generating update");

    let mut updated_dist = ZipDistribution::open(updated).context("Failed to open updated distribution")?;
    let updated_tree = read_tree(&diff_config, &mut updated_dist, "updated")?;
    let previous_tree = open_tree(&diff_config, previous, "previous")?;

    let classification = Classifier::new(diff_config).classify(&previous_tree, &updated_tree);
    if classification.is_empty() {
        warn!("No differences found between the distributions");
    }
    let summary = apply(&mut descriptor, &classification);

    let staging = StagingArea::create(&packaging.staging_root, &update_name)
        .context("Failed to create staging directory")?;
    install_interrupt_handler(staging.path())?;

    staging
        .stage_changes(&mut updated_dist, &classification)
        .context("Failed to copy changed files")?;
    staging
        .stage_resources(update_dir, packaging)
        .context("Failed to copy resource files")?;
    staging
        .write_descriptor(&descriptor)
        .context("Failed to write update descriptor")?;

    let packaged = staging
        .package(update_dir)
        .context("Failed to create update zip")?;
    staging.close().context("Failed to remove staging directory")?;

    println!();
    println!("{}", "─".repeat(70));
    println!(" Update {update_name}");
    println!("{}", "─".repeat(70));
    println!(" Modified files: {}", summary.modified_files);
    println!(" Removed files:  {}", summary.removed_files);
    println!(" Added files:    {}", summary.added_files);
    println!();
    println!(
        " Created {} ({})",
        packaged.path.display(),
        format_size(packaged.size)
    );
    println!();

    Ok(())
}

/// Show the classification of two distributions.
fn run_diff(updated: &Path, previous: &Path, diff_config: DiffConfig, format: OutputFormat) -> Result<()> {
    check_distribution(updated, "updated")?;
    check_distribution(previous, "previous")?;

    let updated_tree = open_tree(&diff_config, updated, "updated")?;
    let previous_tree = open_tree(&diff_config, previous, "previous")?;

    let classification = Classifier::new(diff_config).classify(&previous_tree, &updated_tree);
    let report = DiffReport::new(&previous_tree, &updated_tree, classification);

    match format {
        OutputFormat::Text => print_report(&report),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Validate an update zip.
fn run_validate(update_zip: &Path, previous: &Path) -> Result<()> {
    check_distribution(update_zip, "update")?;
    check_distribution(previous, "previous")?;

    let report = validate_update(update_zip, previous).context("Update validation failed")?;

    println!(
        "{} is valid: {} added, {} modified, {} removed",
        report.update_name, report.added_files, report.modified_files, report.removed_files
    );
    Ok(())
}

/// Write a descriptor template, or print a sample.
fn run_init(dir: &Path, sample: bool) -> Result<()> {
    let template = UpdateDescriptor::template();
    if sample {
        println!("Sample {DESCRIPTOR_FILE}:\n");
        print!("{}", template.to_yaml()?);
        return Ok(());
    }

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    let target = dir.join(DESCRIPTOR_FILE);
    if target.exists() {
        bail!("{} already exists", target.display());
    }
    template.save(dir)?;

    println!("Created {}", target.display());
    println!();
    println!("What's next?");
    println!("\tEdit the values in '{DESCRIPTOR_FILE}' and add a LICENSE.txt file.");
    println!("\tThen run 'distpatch generate <updated> <previous> {}'.", dir.display());
    Ok(())
}

/// Require an existing `.zip` distribution.
fn check_distribution(path: &Path, label: &str) -> Result<()> {
    if !path.exists() {
        bail!("The {label} distribution '{}' does not exist", path.display());
    }
    let is_zip = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
    if !path.is_file() || !is_zip {
        bail!("The {label} distribution '{}' is not a zip file", path.display());
    }
    Ok(())
}

fn open_tree(config: &DiffConfig, path: &Path, label: &str) -> Result<DistributionTree> {
    let mut dist = ZipDistribution::open(path)
        .with_context(|| format!("Failed to open {label} distribution"))?;
    read_tree(config, &mut dist, label)
}

/// Build a distribution tree, logging read progress while it runs.
fn read_tree(config: &DiffConfig, dist: &mut ZipDistribution, label: &str) -> Result<DistributionTree> {
    let builder = TreeBuilder::new(config.clone());
    let mut progress_rx = builder.subscribe();

    let result = std::thread::scope(|scope| {
        scope.spawn(move || {
            loop {
                match progress_rx.blocking_recv() {
                    Ok(progress) if !progress.current_entry.is_empty() => {
                        info!(
                            distribution = label,
                            entries = progress.entries_read,
                            files = progress.files_read,
                            rate = %format!("{:.0} entries/s", progress.entries_per_second()),
                            throughput = %format!("{}/s", format_size(progress.bytes_per_second() as u64)),
                            "Reading distribution"
                        );
                    }
                    Ok(_) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                }
            }
        });

        let result = builder.build_from_archive(dist);
        // Closes the channel so the progress thread stops.
        drop(builder);
        result
    });

    let tree = result.with_context(|| format!("Failed to read {label} distribution"))?;
    if tree.has_warnings() {
        warn!(
            distribution = label,
            warnings = tree.warnings.len(),
            "Distribution has unexpected entries"
        );
    }
    Ok(tree)
}

/// Remove the staging directory when the user presses Ctrl-C.
fn install_interrupt_handler(staging_dir: &Path) -> Result<()> {
    let staging_dir = staging_dir.to_path_buf();

    ctrlc::set_handler(move || {
        eprintln!("Interrupted, removing {}", staging_dir.display());
        let _ = std::fs::remove_dir_all(&staging_dir);
        std::process::exit(130);
    })
    .context("Failed to install interrupt handler")
}

fn print_report(report: &DiffReport) {
    println!();
    println!("{}", "─".repeat(70));
    println!(" {} → {}", report.previous, report.updated);
    println!(
        " {} files → {} files",
        report.previous_files, report.updated_files
    );
    println!("{}", "─".repeat(70));
    println!();

    print_section("Modified files", report.changes.modified.iter());
    print_section("Removed directories", report.changes.removed_directories.iter());
    print_section("Removed files", report.changes.removed_files.iter());
    print_section("Added files", report.changes.added.iter());

    if !report.has_changes() {
        println!(" No differences found.");
        println!();
    }
    if !report.warnings.is_empty() {
        println!("{} warning(s) while reading distributions", report.warnings.len());
    }
}

fn print_section<'a>(title: &str, paths: impl ExactSizeIterator<Item = &'a String>) {
    if paths.len() == 0 {
        return;
    }
    println!(" {title} ({}):", paths.len());
    for path in paths {
        println!("   {path}");
    }
    println!();
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
