//! CLI that seeds biographies and prints their resolved field selections.
//!
//! Loads a fixture document (or a saved snapshot), registers the post-load
//! resolver, loads every user joined with their biography and prints the
//! derived selections as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use orm_core::config::SessionConfig;
use orm_core::{LifecycleEvent, Session};
use orm_selection::entities::{self, Biography, User};
use orm_selection::fixture::{load_fixture, FixtureDocument};
use orm_selection::{FieldSelection, SelectionResolver};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the selection tool.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON fixture to seed from (defaults to the built-in two-user fixture)
    #[arg(short, long)]
    fixture: Option<PathBuf>,

    /// JSON session config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reuse the catalog across resolutions until the data changes
    #[arg(long)]
    cache_catalog: bool,

    /// Open the configured snapshot instead of seeding a fixture
    #[arg(long, conflicts_with = "fixture")]
    from_snapshot: bool,

    /// Write a snapshot after seeding
    #[arg(long)]
    save_snapshot: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Serialize)]
struct UserReport {
    id: Option<u64>,
    name: String,
    biography_id: Option<u64>,
    fields: Vec<FieldReport>,
}

#[derive(Serialize)]
struct FieldReport {
    id: Option<u64>,
    alias: String,
    label: String,
    choices: Vec<ChoiceReport>,
}

#[derive(Serialize)]
struct ChoiceReport {
    id: Option<u64>,
    label: String,
}

impl From<&FieldSelection> for FieldReport {
    fn from(selection: &FieldSelection) -> Self {
        Self {
            id: selection.field.id,
            alias: selection.field.alias.clone(),
            label: selection.field.label.clone(),
            choices: selection
                .choice_list
                .iter()
                .map(|c| ChoiceReport {
                    id: c.id,
                    label: c.label.clone(),
                })
                .collect(),
        }
    }
}

fn load_config(args: &Args) -> anyhow::Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SessionConfig::default(),
    };
    config.apply_env_overrides()?;
    if args.cache_catalog {
        config.cache_catalog = true;
    }
    Ok(config)
}

fn open_session(args: &Args, config: SessionConfig) -> anyhow::Result<Session> {
    if args.from_snapshot {
        let session = Session::open_snapshot(config).context("Failed to open snapshot")?;
        tracing::info!(
            "Opened snapshot with {} tables",
            session.database().table_count()
        );
        return Ok(session);
    }

    let doc = match &args.fixture {
        Some(path) => FixtureDocument::from_file(path)?,
        None => FixtureDocument::regression(),
    };

    let session = Session::in_memory(config);
    entities::install(&session)?;
    let ids = load_fixture(&session, &doc)?;
    tracing::info!(
        "Seeded {} users and {} fields",
        ids.users.len(),
        ids.fields.len()
    );

    if args.save_snapshot {
        session.save_snapshot().context("Failed to save snapshot")?;
        tracing::info!(
            "Snapshot written to {}",
            session.config().snapshot_path().display()
        );
    }
    Ok(session)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&args)?;
    let resolver = Arc::new(SelectionResolver::from_config(&config));
    let session = open_session(&args, config)?;
    session
        .event_manager()
        .add_event_listener(&[LifecycleEvent::PostLoad], resolver.clone());

    let users = session
        .find_all_joined::<User, Biography>()
        .context("Failed to load users")?;

    let report: Vec<UserReport> = users
        .iter()
        .map(|user| UserReport {
            id: user.id,
            name: user.name.clone(),
            biography_id: user.biography_id,
            fields: user
                .biography
                .as_ref()
                .and_then(|b| b.field_list.as_ref())
                .map(|list| list.iter().map(FieldReport::from).collect())
                .unwrap_or_default(),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&report)?);
    tracing::info!(
        "Resolved {} biographies with {} catalog load(s)",
        resolver.stats().resolved(),
        resolver.stats().catalog_loads()
    );
    Ok(())
}
