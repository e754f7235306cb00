//! `prefill` CLI entry-point.
//!
//! Available sub-commands:
//! - `inspect` - list every node with its submission and prefill status.
//! - `upstream` - print the ancestors of a node.
//! - `catalog` - print the prefill sources currently offered to a node.
//! - `resolve` - print a node's mappings and their resolved values.
//! - `replay` - apply a JSON script of actions, reporting catalogs and prefills per step.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use engine::{describe_source, Action, GlobalData, GlobalDataConfig, Session};
use source::FileSource;

#[derive(Parser)]
#[command(
    name = "prefill",
    about = "Dependency & prefill resolution for form workflows",
    version
)]
struct Cli {
    /// Path to the graph document (`{ nodes, edges, forms }`).
    #[arg(long, env = "PREFILL_GRAPH", global = true, default_value = "fixtures/blueprint.json")]
    graph: PathBuf,

    #[command(flatten)]
    global_data: GlobalDataArgs,

    #[command(subcommand)]
    command: Command,
}

/// Values of the Global Data catalog.
#[derive(Args)]
struct GlobalDataArgs {
    #[arg(long, env = "PREFILL_USER_ID", global = true, default_value = "user_12345")]
    user_id: String,
    #[arg(long, env = "PREFILL_SESSION_ID", global = true, default_value = "session_67890")]
    session_id: String,
    #[arg(long, env = "PREFILL_TENANT_ID", global = true, default_value = "1")]
    tenant_id: String,
}

impl From<GlobalDataArgs> for GlobalDataConfig {
    fn from(args: GlobalDataArgs) -> Self {
        Self {
            user_id: args.user_id,
            session_id: args.session_id,
            tenant_id: args.tenant_id,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List every node with its status.
    Inspect,
    /// Print the upstream ancestors of a node, sorted.
    Upstream { node_id: String },
    /// Print the prefill sources offered to a node.
    Catalog { node_id: String },
    /// Print a node's mappings and resolved prefill values.
    Resolve { node_id: String },
    /// Apply a JSON array of actions, then print every node's prefill values.
    Replay {
        /// Path to the action script.
        script: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let global = GlobalData::capture(&cli.global_data.into());
    let loaded = Session::load(&FileSource::new(&cli.graph), global).await;
    if let Some(err) = loaded.error {
        return Err(err).with_context(|| format!("cannot load graph from {}", cli.graph.display()));
    }
    let session = loaded.session;

    match cli.command {
        Command::Inspect => inspect(&session),
        Command::Upstream { node_id } => {
            session.require_node(&node_id)?;
            let mut ids: Vec<String> = session.upstream_ids(&node_id).into_iter().collect();
            ids.sort();
            for id in ids {
                println!("{id}");
            }
            Ok(())
        }
        Command::Catalog { node_id } => catalog(&session, &node_id),
        Command::Resolve { node_id } => resolve(&session, &node_id),
        Command::Replay { script } => replay(session, &script).await,
    }
}

fn inspect(session: &Session) -> Result<()> {
    for status in session.statuses() {
        println!(
            "{:<12} {:<20} {:<10} upstream={} mapped={} resolved={}",
            status.node_id,
            status.name,
            status.state.to_string(),
            status.upstream,
            status.mapped_fields,
            status.resolved_fields,
        );
    }
    Ok(())
}

fn catalog(session: &Session, node_id: &str) -> Result<()> {
    session.require_node(node_id)?;
    for entry in session.catalog(node_id) {
        println!("{} ({})", entry.name, entry.node_id);
        for (key, meta) in &entry.field_schema.properties {
            let value = match &entry.submitted {
                Some(record) => record.get(key).map(|v| format!(" = {v}")).unwrap_or_default(),
                None => session.global().value(key).map(|v| format!(" = {v}")).unwrap_or_default(),
            };
            println!(
                "  {key}: {} [{}]{value}",
                meta.display_title(key),
                meta.display_type().unwrap_or("?"),
            );
        }
    }
    Ok(())
}

fn resolve(session: &Session, node_id: &str) -> Result<()> {
    let node = session.require_node(node_id)?;
    let Some(form) = session.graph().form_for(node) else {
        bail!("node '{node_id}' does not reference a known form");
    };

    let mapping = session.mapping(node_id);
    let catalog = session.catalog(node_id);
    let values = session.resolve(node_id);

    println!("{}", session.graph().display_name(node));
    for (key, meta) in &form.field_schema.properties {
        let title = meta.display_title(key);
        match mapping.get(key) {
            None => println!("  {title}: (no prefill)"),
            Some(source) => {
                let label = describe_source(source, &catalog);
                match values.get(key) {
                    Some(value) => println!("  {title} <- {label} = {value}"),
                    None => println!("  {title} <- {label} (unresolved)"),
                }
            }
        }
    }
    Ok(())
}

async fn replay(mut session: Session, script: &Path) -> Result<()> {
    let content = tokio::fs::read_to_string(script)
        .await
        .with_context(|| format!("cannot read script {}", script.display()))?;
    let actions: Vec<Action> = serde_json::from_str(&content).context("invalid action script")?;

    info!("Replaying {} action(s)", actions.len());
    for (step, action) in actions.iter().enumerate() {
        session.require_node(action.node_id())?;
        let applied = session.apply(action);
        println!("step {}: {:?}", step + 1, action);
        if !applied.unlocked.is_empty() {
            println!("  unlocked: {}", applied.unlocked.join(", "));
        }
        session = applied.session;

        let touched = std::iter::once(action.node_id()).chain(applied.unlocked.iter().map(String::as_str));
        for node_id in touched {
            println!("  {}", step_report(&session, node_id)?);
        }
    }

    let mut resolved = serde_json::Map::new();
    for node in session.graph().nodes() {
        resolved.insert(node.id.clone(), serde_json::to_value(session.resolve(&node.id))?);
    }
    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}

/// One line per node: the sources its catalog offers and its resolved prefills.
fn step_report(session: &Session, node_id: &str) -> Result<String> {
    let sources: Vec<String> = session.catalog(node_id).into_iter().map(|e| e.node_id).collect();
    let values = serde_json::to_string(&session.resolve(node_id))?;
    Ok(format!("{node_id}: catalog=[{}] resolved={values}", sources.join(", ")))
}
