//! Parts CLI - Apply part templates to existing projects

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use parts_core::config::PARTS_FILE_NAME;
use parts_core::templates::{check_compatibility, TemplateFetcher};
use parts_core::{
    PartApplier, PartRegistry, PartsFile, ProductConfig, RegistryOptions, TemplateVariables,
};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// CLI version
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parts product configuration
#[derive(Clone)]
pub struct PartsConfig;

impl ProductConfig for PartsConfig {
    fn name(&self) -> &'static str {
        "parts-tools"
    }

    fn display_name(&self) -> &'static str {
        "Parts"
    }

    fn default_template_url(&self) -> &'static str {
        "https://raw.githubusercontent.com/parts-dev/parts-tools/main/templates"
    }

    fn template_url_env(&self) -> &'static str {
        "PARTS_TEMPLATE_URL"
    }

    fn parts_file_env(&self) -> &'static str {
        "PARTS_CONFIG"
    }

    fn upgrade_command(&self) -> &'static str {
        "cargo install parts-tools --force"
    }
}

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "parts-tools")]
#[command(about = "CLI for applying part templates to existing projects")]
#[command(version)]
pub struct Args {
    /// Set log level (RUST_LOG takes precedence when set)
    #[arg(long, value_enum, default_value = "warn", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply a part template to the current project
    Apply(ApplyArgs),
    /// List available parts
    List(SourceArgs),
    /// Build zip files for all parts in the template directory (for development use)
    BuildZips(BuildZipsArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct SourceArgs {
    /// Parts file to read declarations from (defaults to $PARTS_CONFIG, then ./parts.yaml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Local directory to use for templates instead of fetching from remote (for development use)
    #[arg(long = "template-dir")]
    pub template_dir: Option<PathBuf>,

    /// Directory that part destinations are relative to (defaults to the current directory)
    #[arg(long)]
    pub dest: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ApplyArgs {
    /// Part id to apply
    pub part: Option<String>,

    /// Src item id restricting which files are copied
    pub src_item: Option<String>,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Template variable override (repeatable)
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// Auto-confirm all prompts (non-interactive mode)
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Parser, Debug)]
pub struct BuildZipsArgs {
    /// Local directory containing part folders and parts.yaml (for development use)
    #[arg(long = "template-dir")]
    pub template_dir: Option<PathBuf>,
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

fn vars_to_variables(vars: &[(String, String)]) -> TemplateVariables {
    vars.iter()
        .map(|(key, value)| (key.clone(), serde_json::Value::String(value.clone())))
        .collect()
}

/// Initialize tracing on stderr, from RUST_LOG or --log-level
fn initialize_tracing(log_level: &LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_filter_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn setup_fetcher<C: ProductConfig>(config: &C, template_dir: &Option<PathBuf>) -> Result<TemplateFetcher> {
    match template_dir {
        Some(path) => {
            debug!(path = %path.display(), "Using local templates");
            Ok(TemplateFetcher::from_local(path.clone(), config.user_agent()))
        }
        None => TemplateFetcher::from_config(config),
    }
}

/// Read the parts file: the explicit path, then ./parts.yaml, then the
/// template source root
async fn load_parts_file(fetcher: &TemplateFetcher, explicit: Option<&Path>) -> Result<PartsFile> {
    let local_default = PathBuf::from(PARTS_FILE_NAME);
    let local = explicit
        .map(Path::to_path_buf)
        .or_else(|| local_default.is_file().then_some(local_default));

    let content = match local {
        Some(path) => {
            debug!(path = %path.display(), "Reading parts file");
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?
        }
        None => {
            debug!("Fetching parts file from template source");
            fetcher.fetch_parts_file().await?
        }
    };

    PartsFile::from_yaml(&content).context("Failed to parse parts file")
}

async fn build_registry<C: ProductConfig>(
    config: &C,
    fetcher: &TemplateFetcher,
    args: &SourceArgs,
) -> Result<PartRegistry> {
    let explicit = args
        .config
        .clone()
        .or_else(|| std::env::var_os(config.parts_file_env()).map(PathBuf::from));
    let parts_file = load_parts_file(fetcher, explicit.as_deref()).await?;

    if let Some(min_version) = &parts_file.min_cli_version {
        if let Some(warning) = check_compatibility(CLI_VERSION, min_version, config.upgrade_command()) {
            eprintln!("{}", warning.yellow());
        }
    }

    let working_dir = match &args.dest {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    let options = RegistryOptions::new(fetcher.source().base_location(), working_dir);

    Ok(PartRegistry::define(parts_file.parts, &options).await?)
}

async fn apply(config: &PartsConfig, args: ApplyArgs) -> Result<()> {
    let fetcher = setup_fetcher(config, &args.source.template_dir)?;
    let registry = build_registry(config, &fetcher, &args.source).await?;
    let applier =
        PartApplier::new(&registry, &fetcher).variables(vars_to_variables(&args.vars));

    // No part id: pick one interactively
    #[cfg(feature = "tui")]
    {
        if args.part.is_none() {
            let tui_args = parts_core::tui::ApplyArgs {
                part: None,
                src_item: args.src_item,
                yes: args.yes,
            };
            return parts_core::run(config, &registry, &applier, tui_args).await;
        }
    }

    let part = args
        .part
        .context("Missing part id. Run `parts-tools list` to see available parts")?;

    let report = applier
        .apply_part_template(&part, args.src_item.as_deref(), &mut std::io::stdout())
        .await?;

    println!(
        "{} {} ({} files) to {}",
        "Applied".green().bold(),
        report.part_id,
        report.copied_files.len(),
        report.dest_dir.display()
    );
    if let Some(path) = &report.manifest_path {
        println!("  {} {}", "Updated".green(), path.display());
    }

    Ok(())
}

async fn list(config: &PartsConfig, args: SourceArgs) -> Result<()> {
    let fetcher = setup_fetcher(config, &args.template_dir)?;
    let registry = build_registry(config, &fetcher, &args).await?;

    if registry.is_empty() {
        println!("No parts found.");
        return Ok(());
    }

    println!("{}", format!("{} parts", config.display_name()).cyan().bold());
    println!();

    for part in registry.iter() {
        match &part.description {
            Some(description) => println!("  {} {} - {}", "->".blue(), part.id.bold(), description),
            None => println!("  {} {}", "->".blue(), part.id.bold()),
        }
        for item in &part.src_items {
            println!("       {}", item.id);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    #[cfg(feature = "tui")]
    {
        // Ensure terminal cursor is restored on panic
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = console::Term::stderr().show_cursor();
            default_panic(info);
        }));

        // Handle Ctrl+C gracefully
        ctrlc::set_handler(move || {
            let _ = console::Term::stderr().show_cursor();
            std::process::exit(130);
        })
        .ok();
    }

    let args = Args::parse();
    initialize_tracing(&args.log_level);
    let config = PartsConfig;

    let result = match args.command {
        Command::Apply(apply_args) => apply(&config, apply_args).await,
        Command::List(source_args) => list(&config, source_args).await,
        Command::BuildZips(build_args) => {
            // Build zip files for parts
            parts_core::templates::build_zips(&config, &build_args.template_dir).await
        }
    };

    // Ensure cursor is visible on normal exit
    #[cfg(feature = "tui")]
    let _ = console::Term::stderr().show_cursor();

    result
}
