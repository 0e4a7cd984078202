//! ImportPacer - paced, sequential record importer
//!
//! CLI entry point for importing, checking and inspecting configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use importpacer::cli::{Cli, Command, OutputFormat, RunArgs, SchemaArgs, TargetKind};
use importpacer::config::{Config, TargetConfig};
use importpacer::executor::{CancelToken, Executor, Outcome, ProgressEvent, ProgressReceiver, RecordAdapter, RunReport, progress_channel};
use importpacer::target::{StoreFormat, build_target};
use recordreader::{FieldSchema, RecordReader};

fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("importpacer")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let log_file = fs::File::create(log_dir.join("importpacer.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Run(args) => {
            debug!(?args, "main: matched Run command");
            apply_run_args(&mut config, &args)?;
            cmd_run(&config, &args).await
        }
        Command::Check { file, schema } => {
            debug!(?file, ?schema, "main: matched Check command");
            apply_schema_args(&mut config, &schema)?;
            cmd_check(&config, &file)
        }
        Command::ShowConfig => {
            debug!("main: matched ShowConfig command");
            print!("{}", serde_yaml::to_string(&config)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Command-line schema selection wins over the config file
fn apply_schema_args(config: &mut Config, args: &SchemaArgs) -> Result<()> {
    if !args.fields.is_empty() {
        config.field_schema = Some(FieldSchema::parse(&args.fields).context("Invalid --fields")?);
    } else if let Some(profile) = args.profile {
        config.profile = profile;
        config.field_schema = None;
    }
    Ok(())
}

fn apply_run_args(config: &mut Config, args: &RunArgs) -> Result<()> {
    apply_schema_args(config, &args.schema)?;

    if let Some(ms) = args.settle_delay_ms {
        config.executor.settle_delay_ms = ms;
    }
    if let Some(ms) = args.step_timeout_ms {
        config.executor.step_timeout_ms = ms;
    }

    config.target = target_from_args(&config.target, args);
    Ok(())
}

/// Merge target flags into the configured target; `--target` switches kind
fn target_from_args(current: &TargetConfig, args: &RunArgs) -> TargetConfig {
    let kind = args.target.unwrap_or(match current {
        TargetConfig::Memory => TargetKind::Memory,
        TargetConfig::Store { .. } => TargetKind::Store,
        TargetConfig::Form { .. } => TargetKind::Form,
    });

    match kind {
        TargetKind::Memory => TargetConfig::Memory,
        TargetKind::Store => {
            let (path, format) = match current {
                TargetConfig::Store { path, format } => (path.clone(), *format),
                _ => (PathBuf::new(), StoreFormat::default()),
            };
            TargetConfig::Store {
                path: args.store.clone().unwrap_or(path),
                format: args.store_format.unwrap_or(format),
            }
        }
        TargetKind::Form => {
            let (open_url, save_url) = match current {
                TargetConfig::Form { open_url, save_url } => (open_url.clone(), save_url.clone()),
                _ => (String::new(), String::new()),
            };
            TargetConfig::Form {
                open_url: args.open_url.clone().unwrap_or(open_url),
                save_url: args.save_url.clone().unwrap_or(save_url),
            }
        }
    }
}

/// Import every record of a file
async fn cmd_run(config: &Config, args: &RunArgs) -> Result<ExitCode> {
    debug!(file = ?args.file, "cmd_run: called");
    config.validate().context("Invalid configuration")?;

    let batch = RecordReader::new(config.schema()).read_path(&args.file)?;
    let mut target = build_target(&config.target)?;

    let (tx, rx) = progress_channel();
    let executor = Executor::new(config.executor.clone())?.with_progress(tx);
    let cancel = CancelToken::new();
    cancel.cancel_on_ctrl_c();

    if args.format == OutputFormat::Text {
        println!(
            "Importing {} records from {} into {} ({}ms between records)",
            batch.len(),
            args.file.display(),
            target.name(),
            config.executor.settle_delay_ms
        );
    }
    let printer = spawn_printer(rx, args.format);

    let report = executor.run_with_cancel(&batch, target.as_mut(), &cancel).await;
    drop(executor);
    if let Err(e) = printer.await {
        debug!(error = %e, "cmd_run: printer task failed");
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_summary(&report),
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Print records as they finish; silent for JSON output
fn spawn_printer(mut rx: ProgressReceiver, format: OutputFormat) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut total = 0;
        while let Some(event) = rx.recv().await {
            if format == OutputFormat::Json {
                if matches!(event, ProgressEvent::RunFinished { .. }) {
                    break;
                }
                continue;
            }
            match event {
                ProgressEvent::RunStarted { total: n, .. } => total = n,
                ProgressEvent::RecordFinished(entry) => {
                    let position = format!("[{}/{}]", entry.index + 1, total).dimmed();
                    let status = match &entry.outcome {
                        Outcome::Applied => "✓ applied".green().to_string(),
                        Outcome::Failed { kind, reason } => format!("✗ {}: {}", kind, reason).red().to_string(),
                        Outcome::NotAttempted => "- not attempted".dimmed().to_string(),
                    };
                    println!("  {} line {}: {} ({}ms)", position, entry.line, status, entry.duration_ms);
                    if let Some(warning) = &entry.warning {
                        println!("      {} {}", "⚠".yellow(), warning.yellow());
                    }
                }
                ProgressEvent::Cancelled { remaining } => {
                    println!("  {} {} records not attempted", "⚠ cancelled:".yellow(), remaining);
                }
                ProgressEvent::RunFinished { .. } => break,
                ProgressEvent::RecordStarted { .. } | ProgressEvent::Settling { .. } => {}
            }
        }
    })
}

fn print_summary(report: &RunReport) {
    println!();
    let summary = report.summary();
    if report.is_success() {
        println!("{} {}", "✓".green(), summary);
    } else if report.cancelled {
        println!("{} {}", "⚠".yellow(), summary);
    } else {
        println!("{} {}", "✗".red(), summary);
    }
    if report.warnings() > 0 {
        println!("  {} records had a schema mismatch", report.warnings());
    }
    println!("  Run: {}", report.run_id);
}

/// Parse a file and list what would go wrong, without touching a target
fn cmd_check(config: &Config, file: &Path) -> Result<ExitCode> {
    debug!(?file, "cmd_check: called");
    let schema = config.schema();
    let batch = RecordReader::new(schema.clone()).read_path(file)?;

    let expected: Vec<String> = schema.fields().iter().map(|f| f.to_string()).collect();
    println!("{} records, schema: {}", batch.len(), expected.join(","));

    let mut blocked = 0;
    for record in &batch {
        if let Some(mismatch) = &record.mismatch {
            println!("  line {}: {}", record.line, mismatch.to_string().yellow());
        }
        if let Some(name) = RecordAdapter::missing_required(record, &schema) {
            blocked += 1;
            println!("  line {}: {}", record.line, format!("required field '{}' is empty", name).red());
        }
    }

    let mismatched = batch.mismatched().count();
    if mismatched == 0 && blocked == 0 {
        println!("{} all records match the schema", "✓".green());
        return Ok(ExitCode::SUCCESS);
    }
    println!("{} mismatched, {} missing a required field", mismatched, blocked);
    Ok(if blocked > 0 { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
