//! Dropins - main entry point

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use dropins_step::cli::{Cli, Commands};
use dropins_step::process_guard::{self, ProcessGuard};
use dropins_step::{
    Classification, DropinClassifier, DropinsStep, LocaleCatalog, Paths, Step, StepConfig,
    StepOutcome, UnknownDropinPolicy,
};

/// Initialize the tracing subscriber on stderr. `RUST_LOG` overrides the
/// default level.
fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_logger(cli.verbose);
    debug!("CLI arguments parsed");

    // curl children must not outlive us on Ctrl+C
    if let Err(e) = process_guard::init_signal_handlers() {
        tracing::warn!("Failed to initialize signal handlers: {}", e);
    }
    let _guard = ProcessGuard::new();

    let result = match cli.command {
        Commands::Run {
            config,
            content_dir,
            root,
            no_interaction,
            wp_version,
        } => run_step(&config, content_dir.as_deref(), root, no_interaction, wp_version),
        Commands::Check {
            names,
            policy,
            wp_version,
        } => {
            check_names(&names, policy, wp_version.as_deref().unwrap_or_default());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate { config } => validate_config(&config),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("✗ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Load the configuration and run the dropins step once.
fn run_step(
    config_path: &Path,
    content_dir: Option<&Path>,
    root: Option<PathBuf>,
    no_interaction: bool,
    wp_version: Option<String>,
) -> Result<ExitCode> {
    info!("Loading configuration from: {:?}", config_path);
    let config = StepConfig::load_from_file(config_path)?.with_wp_version_fallback(wp_version);
    config.validate()?;

    let root = root.unwrap_or_else(|| {
        config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });
    let paths = Paths::resolve(&root, &config, content_dir);

    let interactive = !no_interaction && std::io::stdin().is_terminal();
    let mut step = DropinsStep::with_defaults(interactive);

    if !step.allowed(&config, &paths) {
        println!("Nothing to do: no dropins configured or content directory unknown.");
        return Ok(ExitCode::SUCCESS);
    }

    let outcome = step.run(&config, &paths)?;

    let success = step.success();
    if !success.is_empty() {
        println!("✓ Dropins installed:\n{}", success);
    }
    let errors = step.error();
    if !errors.is_empty() {
        eprintln!("✗ Dropin errors:\n{}", errors);
    }

    Ok(match outcome {
        StepOutcome::None | StepOutcome::Success => ExitCode::SUCCESS,
        StepOutcome::Error => ExitCode::from(1),
        StepOutcome::Partial => ExitCode::from(2),
    })
}

fn check_names(names: &[String], policy: UnknownDropinPolicy, wp_version: &str) {
    let catalog = LocaleCatalog::global();
    let classifier = DropinClassifier::new(&catalog);

    for name in names {
        let verdict = match classifier.classify(name, policy, wp_version) {
            Classification::Accept => "accept".to_string(),
            Classification::Ask(kind) => format!("ask ({})", kind),
            Classification::Reject => "reject".to_string(),
        };
        println!("{}: {}", name, verdict);
    }
}

fn validate_config(config_path: &Path) -> Result<ExitCode> {
    info!("Validating configuration file: {:?}", config_path);
    let config = StepConfig::load_from_file(config_path)?;
    config.validate()?;

    println!(
        "✓ Configuration file is valid: {} dropin(s), unknown dropins policy: {}",
        config.dropins().len(),
        config.unknown_dropins_policy()
    );
    Ok(ExitCode::SUCCESS)
}
