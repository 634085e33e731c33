//! CLI tool for data mod configuration.
//!
//! Provides commands for:
//! - Configuration validation
//! - Reference resolution
//! - Seeding a memory store and creating fixtures

mod cli;

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use datamod_core::config::DataModConfig;
use datamod_core::mapping::ColumnMapping;
use datamod_core::{DataModContext, DataSet};
use datamod_memstore::MemoryStore;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let output = match cli.command {
        Commands::Check { config } => check(&config)?,
        Commands::Resolve { config, reference } => resolve(&config, &reference)?,
        Commands::Seed {
            config,
            fixture,
            unique,
        } => seed(&config, fixture.as_deref(), unique.as_deref())?,
    };
    print!("{output}");
    Ok(())
}

/// Loads a configuration file and applies `DATAMOD_*` overrides.
fn load_config(path: &Path) -> Result<DataModConfig> {
    let mut config = DataModConfig::from_file(path)
        .with_context(|| format!("loading {}", path.display()))?;
    config.apply_env_overrides()?;
    config.validate()?;
    info!(path = %path.display(), entities = config.entities.len(), "configuration loaded");
    Ok(config)
}

fn check(path: &Path) -> Result<String> {
    let config = load_config(path)?;
    let ctx = DataModContext::from_config(&config, Arc::new(MemoryStore::new()))?;

    let mut out = String::new();
    writeln!(out, "engine: {}", config.connection.engine)?;
    if let Some(bridge) = ctx.bridge().registered_name() {
        writeln!(out, "bridge: {bridge}")?;
    }
    for identifier in ctx.registry().identifiers() {
        let entity = ctx.entity(&identifier)?;
        let layout = entity.layout()?;
        writeln!(out, "{identifier} -> {} {}", layout.base_table, layout.mapping)?;
    }
    for (reference, target) in ctx.registry().mapping().iter() {
        writeln!(out, "mapping: {reference} => {target}")?;
    }
    Ok(out)
}

fn resolve(path: &Path, reference: &str) -> Result<String> {
    let config = load_config(path)?;
    let ctx = DataModContext::from_config(&config, Arc::new(MemoryStore::new()))?;
    let entity = ctx.resolve(reference)?;
    let layout = entity.layout()?;

    let mut out = String::new();
    writeln!(out, "identifier: {}", entity.name())?;
    writeln!(out, "base table: {}", layout.base_table)?;
    for (logical, target) in layout.mapping.iter() {
        match target {
            ColumnMapping::Mapped(column) => writeln!(out, "  {logical} -> {column}")?,
            ColumnMapping::Passthrough => writeln!(out, "  {logical} (not persisted)")?,
        }
    }
    Ok(out)
}

fn seed(path: &Path, fixture: Option<&[String]>, unique: Option<&str>) -> Result<String> {
    let config = load_config(path)?;
    if config.connection.engine != "memory" {
        warn!(engine = %config.connection.engine, "seeding into a memory store regardless of engine");
    }

    let store = Arc::new(MemoryStore::new());
    let ctx = DataModContext::from_config(&config, store.clone())?;

    for identifier in ctx.registry().identifiers() {
        let layout = ctx.entity(&identifier)?.layout()?;
        if store.database().has_table(&layout.base_table) {
            continue;
        }
        let columns = layout
            .mapping
            .iter()
            .filter_map(|(_, target)| match target {
                ColumnMapping::Mapped(column) => Some(column.clone()),
                ColumnMapping::Passthrough => None,
            })
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        store.create_table(&layout.base_table, Some(columns))?;
    }

    let inserted = ctx.insert_all_seed_data()?;
    info!(rows = inserted, "seed data inserted");

    if let Some([reference, json]) = fixture {
        let data: DataSet = match serde_json::from_str(json)
            .with_context(|| format!("parsing fixture data {json}"))?
        {
            Value::Object(map) => map,
            other => bail!("fixture data must be a JSON object, got {other}"),
        };
        let id = ctx.resolve(reference)?.create_fixture(&data, unique)?;
        info!(entity = %reference, id = %id, "fixture created");
    } else if fixture.is_some() {
        bail!("--fixture takes an entity and a JSON object");
    }

    Ok(format!("{}\n", serde_json::to_string_pretty(&store.snapshot())?))
}
