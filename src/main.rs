use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use workflow_qa::portable;
use workflow_qa::preflight::{self, ACCEL_CHECKS, DisableStatus, PreflightConfig, PythonProber};
use workflow_qa::registry::{JsonFileRegistry, PythonRegistry, RegistrySource};
use workflow_qa::validate::{StructureOptions, TEXT2IMG_REQUIRED};
use workflow_qa::{ValidateOptions, ValidationReport, Validator};

const DEFAULT_WORKFLOW: &str = "tests/workflows/minimal_text2img.json";

#[derive(Parser)]
#[command(version, about = "Preflight and workflow checks for the portable ComfyUI package")]
struct Opts {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a workflow JSON file.
    Validate(ValidateOpts),

    /// Probe accelerator libraries and disable custom nodes that need a missing one.
    Preflight(PreflightOpts),
}

#[derive(Parser)]
struct ValidateOpts {
    /// Repository root or extracted package root.
    #[arg(long, env = "WORKFLOW_QA_ROOT", default_value = ".")]
    root: PathBuf,

    /// Workflow JSON to check. Defaults to tests/workflows/minimal_text2img.json under the root.
    #[arg(long)]
    workflow: Option<PathBuf>,

    /// Read known node types from a JSON file instead of importing ComfyUI.
    #[arg(long, conflicts_with = "structure_only")]
    registry: Option<PathBuf>,

    /// Interpreter used to import ComfyUI. Defaults to the embedded one.
    #[arg(long, env = "WORKFLOW_QA_PYTHON")]
    python: Option<PathBuf>,

    /// Skip the registry check.
    #[arg(long)]
    structure_only: bool,

    /// Reject duplicate node ids and link cycles.
    #[arg(long)]
    strict: bool,

    /// Node types the workflow must contain.
    #[arg(long, value_delimiter = ',')]
    require: Vec<String>,

    /// Require the node types of a minimal text-to-image workflow.
    #[arg(long)]
    require_text2img: bool,

    /// Run the registry check even when the structure is broken.
    #[arg(long)]
    all: bool,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Parser)]
struct PreflightOpts {
    /// Extracted package root containing ComfyUI/.
    #[arg(long, env = "WORKFLOW_QA_ROOT", default_value = ".")]
    root: PathBuf,

    /// Interpreter used for the import probes. Defaults to the package's
    /// embedded interpreter, then python from PATH.
    #[arg(long, env = "WORKFLOW_QA_PYTHON")]
    python: Option<PathBuf>,

    /// Manifest to append results to. Defaults to accel_manifest.json under the root.
    #[arg(long)]
    manifest: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    let opts = Opts::parse();
    init_logging(opts.verbose);

    match opts.command {
        Command::Validate(opts) => run_validate(opts),
        Command::Preflight(opts) => run_preflight(opts),
    }
}

fn registry_source(opts: &ValidateOpts, root: &Path) -> Option<Box<dyn RegistrySource>> {
    if opts.structure_only {
        return None;
    }
    if let Some(path) = &opts.registry {
        return Some(Box::new(JsonFileRegistry::new(path)));
    }
    let mut source = PythonRegistry::new(root);
    if let Some(python) = &opts.python {
        source = source.with_python(python);
    }
    Some(Box::new(source))
}

fn run_validate(opts: ValidateOpts) -> anyhow::Result<ExitCode> {
    let root = std::path::absolute(&opts.root)
        .with_context(|| format!("invalid root {}", opts.root.display()))?;
    let workflow = opts
        .workflow
        .clone()
        .unwrap_or_else(|| root.join(DEFAULT_WORKFLOW));

    let mut required_types = opts.require.clone();
    if opts.require_text2img {
        required_types.extend(TEXT2IMG_REQUIRED.iter().map(|s| s.to_string()));
    }

    let validator = Validator::new(ValidateOptions {
        structure: if opts.strict {
            StructureOptions::strict()
        } else {
            StructureOptions::default()
        },
        required_types,
        check_all: opts.all,
    });

    let source = registry_source(&opts, &root);
    let registry = source
        .as_ref()
        .map(|s| s.describe())
        .unwrap_or_else(|| "none".into());
    tracing::info!(workflow = %workflow.display(), %registry, "validating");
    let report = validator.validate_file(&workflow, source.as_deref());

    match opts.format {
        Format::Text => print_report(&report),
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(ExitCode::from(report.exit_code() as u8))
}

fn print_report(report: &ValidationReport) {
    if report.passed() {
        for check in &report.checks {
            println!("✓ {}", check);
        }
        return;
    }
    for line in report.display_lines() {
        eprintln!("{}", line);
    }
    eprintln!("Workflow validation failed: {}", report.outcome);
}

fn run_preflight(opts: PreflightOpts) -> anyhow::Result<ExitCode> {
    let mut config = PreflightConfig::for_root(&opts.root);
    if let Some(manifest) = opts.manifest {
        config.manifest = manifest;
    }
    let python = opts
        .python
        .unwrap_or_else(|| portable::package_python(&opts.root));
    tracing::info!(python = %python.display(), "probing accelerators");
    let prober = PythonProber::new(python);

    println!("=== Accelerator preflight ===");
    let summary = preflight::run_preflight(&config, &prober, ACCEL_CHECKS)
        .context("accelerator preflight failed")?;

    for record in &summary.records {
        match &record.error_if_any {
            None => println!("OK: {} available", record.name),
            Some(error) => println!("WARNING: {} unavailable ({})", record.name, error),
        }
    }
    println!(
        "Wrote accelerator preflight results to {}",
        config.manifest.display()
    );

    if !summary.custom_nodes_found {
        println!(
            "WARNING: custom_nodes directory not found at {}",
            config.custom_nodes.display()
        );
        return Ok(ExitCode::SUCCESS);
    }

    for record in summary.failures() {
        let error = record.error_if_any.as_deref().unwrap_or("unknown error");
        if summary.unmapped.contains(&record.name) {
            println!(
                "INFO: No dependent custom nodes mapped for {}; nothing to disable.",
                record.name
            );
            continue;
        }
        for action in summary.actions_for(&record.name) {
            match action.status {
                DisableStatus::Disabled => println!(
                    "DISABLED: {} -> {} (missing {}: {})",
                    action.node,
                    action.path.display(),
                    action.backend,
                    error
                ),
                DisableStatus::AlreadyDisabled => println!(
                    "INFO: {} already disabled at {} (missing {})",
                    action.node,
                    action.path.display(),
                    action.backend
                ),
                DisableStatus::Missing => println!(
                    "INFO: {} not found; nothing to disable for missing {}",
                    action.node, action.backend
                ),
            }
        }
    }

    let disabled: Vec<_> = summary.disabled().collect();
    if disabled.is_empty() {
        println!("No custom nodes were disabled by preflight.");
        if summary.failures().next().is_some() {
            println!("To re-enable any nodes, rename '<node>.disabled' back to '<node>'.");
        }
    } else {
        println!("=== Preflight changes ===");
        for action in disabled {
            println!("- Disabled {}", action.path.display());
        }
        println!("To re-enable, rename '<node>.disabled' back to '<node>'.");
    }

    Ok(ExitCode::SUCCESS)
}
