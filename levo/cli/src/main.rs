//! Levo CLI - generate source files from a schema and a template directory

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use levo_lib::{Generator, GeneratorConfig};
use tracing::{debug, info};
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod output;

use config::LevoConfig;
use error::CliError;

/// Generate source files from a model schema and a directory of templates
#[derive(Parser)]
#[command(name = "levo", version, about, after_help = AFTER_HELP)]
struct Cli {
    /// Project file (levo.toml) with defaults for every other option
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Schema document (JSON)
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Template directory
    #[arg(short, long)]
    templates: Option<PathBuf>,

    /// Directory generated files are written to
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Project name passed to templates
    #[arg(short, long)]
    project: Option<String>,

    /// Package name passed to templates
    #[arg(long)]
    package: Option<String>,

    /// Target language
    #[arg(long)]
    language: Option<String>,

    /// Enable a template feature flag (repeatable)
    #[arg(short, long = "feature", value_name = "NAME")]
    features: Vec<String>,

    /// Print the files that would be generated without writing them
    #[arg(long)]
    dry_run: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

const AFTER_HELP: &str = "\
MAPPINGS:
  Mappings bind template file names to model names and come from [[mapping]]
  tables in the config file. Without any, every template is rendered once
  against every model in the schema.

  Examples:
    levo -s schema.json -t templates -o out
    levo -c levo.toml --feature persistence
    levo -c levo.toml --dry-run
";

fn init_tracing(verbose: u8) {
    // Default (verbose=0) shows only WARN level
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "warn,levo_lib=info,levo=info".to_string(),
            2 => "info,levo_lib=debug,levo=debug".to_string(),
            _ => "debug,levo_lib=trace,levo=trace".to_string(),
        },
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_file(verbose >= 3)
                .with_line_number(verbose >= 3)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let file = match &cli.config {
        Some(path) => LevoConfig::load(path)?,
        None => LevoConfig::default(),
    };

    let mut config = GeneratorConfig::new();
    if let Some(project) = cli.project.or(file.project) {
        config = config.project_name(project);
    }
    if let Some(package) = cli.package.or(file.package) {
        config = config.package_name(package);
    }
    if let Some(language) = cli.language.or(file.language) {
        config = config.language(language);
    }
    for feature in file.features.iter().chain(&cli.features) {
        config = config.feature(feature);
    }

    let mut generator = Generator::new(config);
    if let Some(schema) = cli.schema.or(file.schema) {
        generator.load_schema_file(&schema)?;
    }
    let templates = cli
        .templates
        .or(file.templates)
        .ok_or(CliError::Missing("template directory"))?;
    generator.add_template_directory(&templates)?;

    if file.mappings.is_empty() {
        let mut template_names: Vec<String> = Vec::new();
        for source in generator.templates().iter() {
            if !template_names.contains(&source.file_name) {
                template_names.push(source.file_name.clone());
            }
        }
        let model_names: Vec<String> = generator
            .schema()
            .models
            .iter()
            .map(|model| model.name.clone())
            .collect();
        debug!(
            templates = template_names.len(),
            models = model_names.len(),
            "No mappings configured, mapping everything"
        );
        generator.add_mapping(template_names.as_slice(), model_names.as_slice())?;
    } else {
        for mapping in &file.mappings {
            generator.add_mapping(mapping.templates.as_slice(), mapping.models.as_slice())?;
        }
    }

    let files = generator.process_mappings()?;
    if cli.dry_run {
        output::print_plan(&files);
        return Ok(());
    }

    let root = cli.output.or(file.output).ok_or(CliError::Missing("output directory"))?;
    let written = output::write_files(&files, &root)?;
    info!(count = written.len(), "Generation finished");
    println!("Generated {} files in {}", written.len(), root.display());
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
