//! Command line driver for the validation pipeline

mod fixture;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use extval_core::{
    beanval::ModelValidationFailure,
    models::NativeValidator,
    request::QueuedMessage,
    ExtValConfig, ExtValEngine, MetaData, ValidationOutcome,
};
use fixture::Fixture;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "extval")]
#[command(about = "Runs the validation extension pipeline against a page fixture")]
#[command(version)]
struct Cli {
    /// Configuration base name; `<NAME>.toml` is read when present
    #[arg(long, value_name = "NAME", default_value = "extval")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every component and print the metadata applied to it
    Inspect {
        /// YAML fixture describing types, beans and components
        fixture: PathBuf,
        /// View to render instead of the fixture's own
        #[arg(long)]
        view: Option<String>,
    },
    /// Render, then validate submitted values and queued model validations
    Validate {
        /// YAML fixture describing types, beans and components
        fixture: PathBuf,
        /// View to validate instead of the fixture's own
        #[arg(long)]
        view: Option<String>,
    },
}

#[derive(Serialize)]
struct ComponentReport {
    client_id: String,
    meta_data: MetaData,
    required: bool,
    validators: Vec<NativeValidator>,
    attributes: BTreeMap<String, serde_json::Value>,
}

#[derive(Serialize)]
struct ValidationReport {
    view_id: String,
    outcomes: BTreeMap<String, ValidationOutcome>,
    model_failures: Vec<ModelValidationFailure>,
    messages: Vec<QueuedMessage>,
}

fn main() -> Result<ExitCode> {
    init_tracing();

    let cli = Cli::parse();
    let config = ExtValConfig::load_from(&cli.config)
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    debug!(config = ?config, "Configuration loaded");

    match cli.command {
        Commands::Inspect { fixture, view } => inspect(config, &Fixture::load(&fixture)?, view.as_deref()),
        Commands::Validate { fixture, view } => validate(config, &Fixture::load(&fixture)?, view.as_deref()),
    }
}

fn engine(config: ExtValConfig, fixture: &Fixture) -> ExtValEngine {
    ExtValEngine::builder()
        .with_config(config)
        .with_type_model(fixture.type_model())
        .build()
}

fn inspect(config: ExtValConfig, fixture: &Fixture, view: Option<&str>) -> Result<ExitCode> {
    let engine = engine(config, fixture);
    let mut ctx = fixture.request(view);

    let mut reports = Vec::new();
    for (mut component, _) in fixture.components()? {
        let meta_data = engine.init_component(&mut ctx, &mut component);
        reports.push(ComponentReport {
            client_id: component.client_id.clone(),
            meta_data,
            required: component.is_required(),
            validators: component.all_validators().cloned().collect(),
            attributes: component.attributes.clone(),
        });
    }

    println!("{}", serde_json::to_string_pretty(&reports).context("Failed to encode report")?);
    Ok(ExitCode::SUCCESS)
}

fn validate(config: ExtValConfig, fixture: &Fixture, view: Option<&str>) -> Result<ExitCode> {
    let engine = engine(config, fixture);
    let mut ctx = fixture.request(view);

    let mut outcomes = BTreeMap::new();
    for (mut component, submitted) in fixture.components()? {
        engine.init_component(&mut ctx, &mut component);
        if let Some(submitted) = submitted {
            let outcome = engine.process_validation(&mut ctx, &component, &submitted);
            outcomes.insert(component.client_id.clone(), outcome);
        }
    }

    let model_failures = engine.process_model_validation(&mut ctx);
    let failed = outcomes.values().filter(|outcome| !outcome.is_valid()).count() + model_failures.len();
    info!(
        view_id = %ctx.view_id(),
        validated = outcomes.len(),
        failed,
        "Validation finished"
    );

    let report = ValidationReport {
        view_id: ctx.view_id().to_string(),
        outcomes,
        model_failures,
        messages: ctx.messages().to_vec(),
    };
    println!("{}", serde_json::to_string_pretty(&report).context("Failed to encode report")?);

    Ok(if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let default_level = if cfg!(debug_assertions) { "debug" } else { "info" };

        format!("extval={},extval_core={}", default_level, default_level).into()
    });

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let is_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    if is_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.pretty())
            .init();
    }
}
