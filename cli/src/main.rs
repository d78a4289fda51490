use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use schema_docs_core::{Filter, resolve_fields, run_models};
use schema_docs_store::{
    GeneratorConfig, SchemaCache, load_document, render_document, save_document,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_LOG_FILTER: &str = "schema_docs=info,schema_docs_core=info,schema_docs_store=info";
const VERBOSE_LOG_FILTER: &str = "schema_docs=debug,schema_docs_core=debug,schema_docs_store=debug";

/// Output format for resolved fields.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "schema-docs")]
#[command(about = "Generate and maintain model documentation from event JSON schemas")]
struct Cli {
    /// Log debug details to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate every configured model and merge it into the documentation file.
    Generate(GenerateArgs),
    /// Print the resolved leaf fields of one schema file.
    Flatten(FlattenArgs),
    /// Print the model names a config file produces.
    Names(NamesArgs),
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// Generator config (YAML, or JSON with a `.json` extension).
    #[arg(long)]
    config: PathBuf,
    /// Documentation YAML file to create or update.
    #[arg(long)]
    docs: PathBuf,
    /// Print the merged document instead of writing it.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Args)]
struct FlattenArgs {
    /// Schema JSON file.
    #[arg(long)]
    schema: PathBuf,
    /// Only consider top-level properties.
    #[arg(long)]
    shallow: bool,
    /// Exclusion filter expression (repeatable).
    #[arg(long = "filter")]
    filters: Vec<String>,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct NamesArgs {
    /// Generator config (YAML, or JSON with a `.json` extension).
    #[arg(long)]
    config: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Flatten(args) => run_flatten(args),
        Command::Names(args) => run_names(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new(VERBOSE_LOG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into())
    };
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run_generate(args: GenerateArgs) -> Result<(), String> {
    let config = GeneratorConfig::load(&args.config).map_err(|e| e.to_string())?;
    let mut cache = SchemaCache::new();
    let inputs = config.model_inputs(&mut cache).map_err(|e| e.to_string())?;
    debug!(models = inputs.len(), schemas = cache.len(), "Loaded model inputs");

    let existing = load_document(&args.docs).map_err(|e| e.to_string())?;
    let run = run_models(existing, &inputs).map_err(|e| e.to_string())?;
    let Some(document) = run.document.filter(|_| !run.documented.is_empty()) else {
        println!("No model produced documentation; nothing written.");
        return Ok(());
    };

    if args.dry_run {
        let rendered = render_document(&document).map_err(|e| e.to_string())?;
        print!("{rendered}");
        return Ok(());
    }

    save_document(&args.docs, &document).map_err(|e| e.to_string())?;
    println!(
        "Documented {} model(s) in {}.",
        run.documented.len(),
        args.docs.display()
    );
    Ok(())
}

fn run_flatten(args: FlattenArgs) -> Result<(), String> {
    let filters = Filter::compile_all(&args.filters).map_err(|e| e.to_string())?;
    let schema = SchemaCache::new()
        .load(&args.schema)
        .map_err(|e| e.to_string())?;
    let fields = resolve_fields(&schema, !args.shallow, &filters).map_err(|e| e.to_string())?;

    let rendered = match args.format {
        CliOutputFormat::Json => serde_json::to_string_pretty(&fields).map_err(|e| e.to_string())?,
        CliOutputFormat::Yaml => serde_yaml::to_string(&fields).map_err(|e| e.to_string())?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

fn run_names(args: NamesArgs) -> Result<(), String> {
    let config = GeneratorConfig::load(&args.config).map_err(|e| e.to_string())?;
    let mut cache = SchemaCache::new();
    for name in config.model_names(&mut cache).map_err(|e| e.to_string())? {
        println!("{name}");
    }
    Ok(())
}
