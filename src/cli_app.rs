//! Top-level CLI definition and dispatch.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use imaging_archive_inventory::core::config::Config;
use imaging_archive_inventory::core::errors::IaiError;
use imaging_archive_inventory::report::assemble::{ArchiveReport, assemble};
use imaging_archive_inventory::report::writer::{ReportPaths, write_report};
use imaging_archive_inventory::scanner::aggregate::ArchiveInventory;
use imaging_archive_inventory::scanner::scan_archive_with_progress;
use imaging_archive_inventory::scanner::status::SubjectStatus;

/// Imaging Archive Inventory — recursive folder census for research imaging archives.
#[derive(Debug, Parser)]
#[command(
    name = "iai",
    author,
    version,
    about = "Imaging Archive Inventory - Folder Census Reporter",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Increase verbosity.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Quiet mode (errors only).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Scan an archive root and write the CSV report.
    Scan(ScanArgs),
    /// View and validate configuration state.
    Config(ConfigArgs),
    /// Show version and optional build metadata.
    Version(VersionArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args, Serialize, Default)]
struct ScanArgs {
    /// Archive root to inventory (overrides config and `IAI_ROOT`).
    #[arg(value_name = "ROOT")]
    root: Option<PathBuf>,
    /// Directory to create the timestamped report directory under.
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,
    /// Print progress every N folders (0 disables; overrides config).
    #[arg(long, value_name = "N")]
    progress_every: Option<u64>,
    /// Print the summary only; skip writing the report.
    #[arg(long)]
    summary_only: bool,
}

#[derive(Debug, Clone, Args, Serialize, Default)]
struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand, Serialize)]
enum ConfigCommand {
    /// Print the config file path in use.
    Path,
    /// Print the effective configuration (defaults + file + env).
    Show,
    /// Check that the configuration loads and validates.
    Validate,
}

#[derive(Debug, Clone, Args, Serialize, Default)]
struct VersionArgs {
    /// Include build metadata.
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
#[allow(dead_code)] // Internal is reserved by the exit-code contract
pub enum CliError {
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// Operation partially succeeded.
    #[error("{0}")]
    Partial(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
            Self::Partial(_) => 4,
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Scan(args) => run_scan(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Version(args) => emit_version(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

fn run_scan(cli: &Cli, args: &ScanArgs) -> Result<(), CliError> {
    let config =
        Config::load(cli.config.as_deref()).map_err(|e| CliError::Runtime(e.to_string()))?;
    let start = std::time::Instant::now();

    // Resolve inputs: CLI flags beat env-and-config (Config::load already
    // folded the env overrides in).
    let root = args
        .root
        .clone()
        .unwrap_or_else(|| config.scan.root_path.clone());
    let output_dir = args
        .out
        .clone()
        .unwrap_or_else(|| config.report.output_dir.clone());
    let progress_every = args.progress_every.unwrap_or(config.scan.progress_every);

    let mode = output_mode(cli);
    let human = mode == OutputMode::Human && !cli.quiet;

    if human {
        println!("{}", "=".repeat(RULER_WIDTH));
        println!("IMAGING ARCHIVE INVENTORY");
        println!("{}", "=".repeat(RULER_WIDTH));
        println!("Start time: {}", now_str());
        println!("Scanning: {}", root.display());
        println!("{}", "=".repeat(RULER_WIDTH));
        println!("\nPhase 1: Scanning archive folder structure...");
        println!("{}", "-".repeat(PHASE_RULE_WIDTH));
    }

    let show_progress = human && progress_every > 0;
    let inventory = scan_archive_with_progress(&root, progress_every, |visited| {
        if show_progress {
            print!("  Processed {visited} folders...\r");
            let _ = io::stdout().flush();
        }
    })
    .map_err(|e| match e {
        IaiError::RootNotFound { .. } | IaiError::RootNotDirectory { .. } => {
            CliError::User(e.to_string())
        }
        other => CliError::Runtime(other.to_string()),
    })?;

    if human {
        println!("\n  Total folders scanned: {}", inventory.overview.total_folders);
        println!("  Total files found: {}", inventory.overview.total_files);
        print_summary(cli, &inventory);
    }

    let report = assemble(&inventory);

    let written = if args.summary_only {
        None
    } else {
        let paths = write_report(&report, &output_dir)
            .map_err(|e| CliError::Runtime(e.to_string()))?;
        if human {
            print_write_summary(&report, &inventory, &paths);
        }
        Some(paths)
    };

    let elapsed = start.elapsed();

    if human {
        println!("\n{}", "=".repeat(RULER_WIDTH));
        println!("ANALYSIS COMPLETE");
        println!("{}", "=".repeat(RULER_WIDTH));
        if let Some(paths) = &written {
            println!("Report directory: {}", paths.directory.display());
        }
        println!("End time: {}", now_str());
    }

    if mode == OutputMode::Json {
        let payload = scan_payload(args, &inventory, &report, written.as_ref(), elapsed);
        write_json_line(&payload)?;
    }

    if !inventory.skipped_subtrees.is_empty() {
        return Err(CliError::Partial(format!(
            "scan finished with {} unreadable subtree(s) skipped",
            inventory.skipped_subtrees.len(),
        )));
    }

    Ok(())
}

/// Console summary block mirroring the report's `Overview` numbers.
fn print_summary(cli: &Cli, inventory: &ArchiveInventory) {
    let overview = &inventory.overview;

    println!("\n{}", "=".repeat(RULER_WIDTH));
    println!("INVENTORY SUMMARY");
    println!("{}", "=".repeat(RULER_WIDTH));
    println!("Total folders: {}", format_count(overview.total_folders));
    println!("Total files: {}", format_count(overview.total_files));
    println!("Main subfolders: {}", overview.main_subfolder_count);
    println!("DICOM files: {}", format_count(overview.total_dicom));
    println!("DAT files: {}", format_count(overview.total_dat));
    println!("NIFTI files: {}", format_count(overview.total_nifti));
    println!("Maximum depth: {}", overview.max_depth);

    if !inventory.groups.is_empty() {
        println!("\nTop-level groups:");
        for group in inventory.groups.iter().take(SUMMARY_GROUP_LIMIT) {
            println!(
                "  {}: {} folders, {} files",
                group.name,
                format_count(group.total_folders),
                format_count(group.total_files),
            );
        }
        if inventory.groups.len() > SUMMARY_GROUP_LIMIT {
            println!(
                "  ... and {} more",
                inventory.groups.len() - SUMMARY_GROUP_LIMIT,
            );
        }
    }

    let (processed, not_processed, unknown) = subject_status_counts(inventory);
    let total_subjects = processed + not_processed + unknown;
    if total_subjects > 0 {
        println!("\nSubjects: {total_subjects}");
        println!("  Processed: {processed}");
        println!("  Not processed: {not_processed}");
        println!("  Unknown: {unknown}");
    }

    if !inventory.skipped_subtrees.is_empty() {
        let warning = format!(
            "WARNING: {} subtree(s) could not be read and were skipped",
            inventory.skipped_subtrees.len(),
        );
        println!("\n{}", warning.yellow());
        if cli.verbose {
            for path in &inventory.skipped_subtrees {
                println!("  [SKIPPED] {}", path.display());
            }
        }
    }
    if cli.verbose && inventory.unmatched_records > 0 {
        println!(
            "\n{} folder record(s) matched no top-level group",
            inventory.unmatched_records,
        );
    }
}

/// Per-table write log, matching the one-line-per-table style of the
/// summary block. Groups with no records get a skip line instead.
fn print_write_summary(report: &ArchiveReport, inventory: &ArchiveInventory, paths: &ReportPaths) {
    println!("\nWriting {} tables...", paths.files.len());
    println!("{}", "-".repeat(PHASE_RULE_WIDTH));
    for table in &report.group_tables {
        println!("  Created table: {} ({} folders)", table.name, table.rows.len());
    }
    for group in &inventory.groups {
        if group.record_indices.is_empty() {
            println!("  Skipped empty: {}", group.name);
        }
    }
}

fn scan_payload(
    args: &ScanArgs,
    inventory: &ArchiveInventory,
    report: &ArchiveReport,
    written: Option<&ReportPaths>,
    elapsed: std::time::Duration,
) -> Value {
    let overview = &inventory.overview;
    let groups: Vec<Value> = inventory
        .groups
        .iter()
        .map(|group| {
            json!({
                "name": group.name,
                "total_folders": group.total_folders,
                "total_files": group.total_files,
                "total_dicom": group.total_dicom,
                "total_dat": group.total_dat,
                "max_depth": group.max_depth(),
                "subjects": group.subjects.len(),
            })
        })
        .collect();

    let (processed, not_processed, unknown) = subject_status_counts(inventory);

    json!({
        "command": "scan",
        "elapsed_seconds": elapsed.as_secs_f64(),
        "summary_only": args.summary_only,
        "overview": {
            "total_folders": overview.total_folders,
            "total_files": overview.total_files,
            "total_dicom": overview.total_dicom,
            "total_dat": overview.total_dat,
            "total_nifti": overview.total_nifti,
            "max_depth": overview.max_depth,
            "main_subfolders": overview.main_subfolder_count,
        },
        "groups": groups,
        "subjects": {
            "processed": processed,
            "not_processed": not_processed,
            "unknown": unknown,
        },
        "tables": report.group_tables.len(),
        "unmatched_records": inventory.unmatched_records,
        "skipped_subtrees": inventory
            .skipped_subtrees
            .iter()
            .map(|p| p.to_string_lossy())
            .collect::<Vec<_>>(),
        "report_directory": written.map(|paths| paths.directory.to_string_lossy().into_owned()),
    })
}

fn subject_status_counts(inventory: &ArchiveInventory) -> (u64, u64, u64) {
    let mut processed = 0u64;
    let mut not_processed = 0u64;
    let mut unknown = 0u64;
    for group in &inventory.groups {
        for subject in group.subjects.values() {
            match subject.status {
                SubjectStatus::Processed => processed += 1,
                SubjectStatus::NotProcessed => not_processed += 1,
                SubjectStatus::Unknown => unknown += 1,
            }
        }
    }
    (processed, not_processed, unknown)
}

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = Config::load(cli.config.as_deref())
                .map_err(|e| CliError::Runtime(e.to_string()))?;

            match output_mode(cli) {
                OutputMode::Human => {
                    let toml_str = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::Runtime(format!("serialize config: {e}")))?;
                    println!("{toml_str}");
                }
                OutputMode::Json => {
                    let value = serde_json::to_value(&config)?;
                    let payload = json!({
                        "command": "config show",
                        "config": value,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                let source = cli.config.clone().unwrap_or_else(Config::default_path);

                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("Configuration is valid.");
                        println!("  Source: {}", source.display());
                        println!("  Root: {}", config.scan.root_path.display());
                        println!("  Output: {}", config.report.output_dir.display());
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": true,
                            "path": source.to_string_lossy(),
                            "root_path": config.scan.root_path.to_string_lossy(),
                            "output_dir": config.report.output_dir.to_string_lossy(),
                        });
                        write_json_line(&payload)?;
                    }
                }
                Ok(())
            }
            Err(e) => {
                match output_mode(cli) {
                    OutputMode::Human => {
                        eprintln!("Configuration is INVALID: {e}");
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": false,
                            "error": e.to_string(),
                        });
                        write_json_line(&payload)?;
                    }
                }
                Err(CliError::User(format!("invalid config: {e}")))
            }
        },
    }
}

fn emit_version(cli: &Cli, args: &VersionArgs) -> Result<(), CliError> {
    let version = env!("CARGO_PKG_VERSION");
    let package = env!("CARGO_PKG_NAME");
    let target = option_env!("TARGET").unwrap_or("unknown");
    let profile = option_env!("PROFILE").unwrap_or("unknown");

    match output_mode(cli) {
        OutputMode::Human => {
            println!("iai {version}");
            if args.verbose {
                println!("package: {package}");
                println!("target: {target}");
                println!("profile: {profile}");
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "binary": "iai",
                "version": version,
                "package": package,
                "build": {
                    "target": target,
                    "profile": profile,
                }
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

/// Output selection is explicit: `--json` or the human console flow, with
/// no terminal sniffing, so redirected runs keep their banners.
const fn output_mode(cli: &Cli) -> OutputMode {
    if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    }
}

fn now_str() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i).is_multiple_of(3) {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Width of the `=` banner rulers around phase headings.
const RULER_WIDTH: usize = 80;
/// Width of the `-` rulers under phase sub-headings.
const PHASE_RULE_WIDTH: usize = 50;
/// How many groups the console summary lists before eliding.
const SUMMARY_GROUP_LIMIT: usize = 10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_before_and_after_subcommand() {
        let before = Cli::try_parse_from([
            "iai",
            "--config",
            "/tmp/iai.toml",
            "--json",
            "--no-color",
            "-v",
            "scan",
        ]);
        assert!(before.is_ok());

        let after = Cli::try_parse_from(["iai", "scan", "--json", "--no-color", "-v"]);
        assert!(after.is_ok());
    }

    #[test]
    fn parses_scan_variants() {
        let cases = [
            vec!["iai", "scan"],
            vec!["iai", "scan", "/mnt/archive/Human"],
            vec!["iai", "scan", "/mnt/archive/Human", "--out", "/tmp/reports"],
            vec!["iai", "scan", "--progress-every", "250"],
            vec!["iai", "scan", "--progress-every", "0", "--summary-only"],
        ];

        for case in cases {
            let parsed = Cli::try_parse_from(case.clone());
            assert!(parsed.is_ok(), "failed to parse case: {case:?}");
        }
    }

    #[test]
    fn parses_config_subcommands() {
        let cases = [
            vec!["iai", "config"],
            vec!["iai", "config", "path"],
            vec!["iai", "config", "show"],
            vec!["iai", "config", "validate"],
            vec!["iai", "version", "--verbose"],
        ];

        for case in cases {
            let parsed = Cli::try_parse_from(case.clone());
            assert!(parsed.is_ok(), "failed to parse case: {case:?}");
        }
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["iai", "-v", "-q", "scan"]).is_err());
    }

    #[test]
    fn completions_support_bash_zsh_and_fish() {
        for shell in ["bash", "zsh", "fish"] {
            let parsed = Cli::try_parse_from(["iai", "completions", shell]);
            assert!(parsed.is_ok(), "failed shell parse for {shell}");
        }
    }

    #[test]
    fn format_count_groups_thousands() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_000), "1,000");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn exit_codes_follow_contract() {
        assert_eq!(CliError::User("x".into()).exit_code(), 1);
        assert_eq!(CliError::Runtime("x".into()).exit_code(), 2);
        assert_eq!(CliError::Internal("x".into()).exit_code(), 3);
        assert_eq!(CliError::Partial("x".into()).exit_code(), 4);
    }
}
