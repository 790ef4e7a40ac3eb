use bytepatch_core::config::BytepatchConfig;
use bytepatch_core::engine::{FindReplaceEngine, FindReplaceRequest};
use bytepatch_core::observer::{ChangeObserver, ResourceChanged};
use bytepatch_core::pattern::TextEncoding;
use bytepatch_core::planner::ZeroMatchPolicy;
use bytepatch_core::resource::FileResource;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_FILE: &str = "bytepatch.toml";

#[derive(ValueEnum, Debug, Clone, Copy)]
enum EncodingArg {
    Utf8,
    Latin1,
    Hex,
}

impl From<EncodingArg> for TextEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Utf8 => TextEncoding::Utf8,
            EncodingArg::Latin1 => TextEncoding::Latin1,
            EncodingArg::Hex => TextEncoding::Hex,
        }
    }
}

/// Find and replace byte strings inside a binary file.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// File to patch in place.
    #[clap(short, long, value_parser)]
    file: PathBuf,
    /// Text to search for.
    #[clap(long)]
    find: String,
    /// Text written at every match.
    #[clap(long, default_value = "")]
    replace: String,
    /// Do not append a zero byte to the replacement.
    #[clap(long)]
    no_null_terminate: bool,
    /// Allow replacements longer than the text they replace.
    #[clap(long)]
    allow_overflow: bool,
    #[clap(long, value_enum)]
    encoding: Option<EncodingArg>,
    /// Fail when the search text is not found.
    #[clap(long)]
    report_not_found: bool,
    /// Print the plan without modifying the file.
    #[clap(long)]
    dry_run: bool,
    /// Copy the original to `<file>.bak` before writing.
    #[clap(long)]
    backup: bool,
    #[clap(short, long = "config", value_parser)]
    config_file: Option<PathBuf>,
    #[clap(short, long)]
    verbose: bool,
}

/// Logs every change so the user can see what was written.
struct LogObserver;

impl ChangeObserver for LogObserver {
    fn name(&self) -> &'static str {
        "LogObserver"
    }

    fn on_resource_changed(&mut self, event: &ResourceChanged) -> Result<(), anyhow::Error> {
        info!(
            resource = %event.resource_id,
            old_md5 = %event.old_md5,
            new_md5 = %event.new_md5,
            "Resource updated"
        );
        Ok(())
    }
}

fn setup_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<BytepatchConfig, anyhow::Error> {
    match &cli.config_file {
        Some(config_path) => {
            info!("Loading configuration from specified path: {config_path:?}");
            BytepatchConfig::load_from_file(config_path)
        }
        None => {
            let default_config_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_config_path.exists() {
                info!("No config file specified, loading default: {default_config_path:?}");
                BytepatchConfig::load_from_file(&default_config_path)
            } else {
                info!("No config file found, using built-in defaults");
                Ok(BytepatchConfig::default())
            }
        }
    }
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let mut config = load_config(&cli)?;
    if let Some(encoding) = cli.encoding {
        config.encoding.scheme = encoding.into();
    }
    if cli.report_not_found {
        config.policy.zero_match = ZeroMatchPolicy::Report;
    }
    if cli.no_null_terminate {
        config.policy.null_terminate = false;
    }
    if cli.allow_overflow {
        config.policy.allow_overflow = true;
    }
    if cli.backup {
        config.output.backup = true;
    }
    info!("Effective configuration: {config:?}");

    let request = FindReplaceRequest::new(cli.find, cli.replace)
        .null_terminate(config.policy.null_terminate)
        .allow_overflow(config.policy.allow_overflow);

    let mut resource = FileResource::open(&cli.file)
        .with_context(|| format!("Failed to open {:?}", cli.file))?
        .with_backup(config.output.backup);
    let engine = FindReplaceEngine::from_config(&config);

    if cli.dry_run {
        return match engine.dry_run(&resource, &request) {
            Ok(plan) => {
                println!("{}", serde_json::to_string_pretty(&plan.report())?);
                Ok(())
            }
            Err(err) => fail(&err),
        };
    }

    let mut log_observer = LogObserver;
    let mut observers: Vec<&mut dyn ChangeObserver> = vec![&mut log_observer];
    match engine.execute(&mut resource, &request, &mut observers) {
        Ok(outcome) => {
            if !outcome.changed {
                warn!("Search text not found; {:?} left unchanged", resource.path());
            }
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Err(err) => fail(&err),
    }
}

fn fail(err: &bytepatch_core::FindReplaceError) -> ! {
    eprintln!("{}", err.to_response().to_json());
    std::process::exit(1)
}
