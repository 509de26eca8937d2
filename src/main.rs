mod cache;
mod commands;
mod config;
mod github;
mod invalidate;
mod logging;
mod resolve;
mod zenhub;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;

use commands::Context;
use github::GithubClient;
use resolve::{EntityKind, ResolveError};
use zenhub::GraphqlClient;

#[derive(Parser, Debug)]
#[command(name = "zh")]
#[command(about = "Resolve ZenHub pipelines, epics, sprints and issues from short names")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/zh/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Workspace id to use instead of the configured one
  #[arg(short, long, global = true)]
  workspace: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Resolve an identifier to exactly one entity
  Resolve {
    #[arg(value_enum)]
    kind: EntityKind,
    identifier: String,
    /// Repository for `#n`, bare numbers and branch names
    #[arg(long)]
    repo: Option<String>,
  },
  /// List entities; a complete listing also warms the cache
  List {
    #[arg(value_enum)]
    kind: EntityKind,
    #[arg(short, long)]
    limit: Option<usize>,
  },
  /// Create, rename or delete pipelines
  #[command(subcommand)]
  Pipeline(PipelineCommand),
  /// Create epics
  #[command(subcommand)]
  Epic(EpicCommand),
  /// Select the active workspace
  #[command(subcommand)]
  Workspace(WorkspaceCommand),
  /// Drop cached lists
  #[command(subcommand)]
  Cache(CacheCommand),
}

#[derive(Subcommand, Debug)]
enum PipelineCommand {
  Create {
    name: String,
  },
  Rename {
    pipeline: String,
    name: String,
  },
  Delete {
    pipeline: String,
    /// Pipeline that receives the deleted pipeline's issues
    #[arg(long)]
    into: String,
  },
}

#[derive(Subcommand, Debug)]
enum EpicCommand {
  Create {
    title: String,
    #[arg(long)]
    body: Option<String>,
  },
}

#[derive(Subcommand, Debug)]
enum WorkspaceCommand {
  Switch { id: String },
}

#[derive(Subcommand, Debug)]
enum CacheCommand {
  /// Clear the active workspace's cache, or one namespace of it
  Clear {
    #[arg(long)]
    namespace: Option<String>,
  },
}

async fn run(args: Args) -> Result<()> {
  let config = config::Config::load(args.config.as_deref())?;
  let _log_guard = logging::init(&config.logging)?;

  let cache = cache::open(&config.cache)?;
  let client = GraphqlClient::zenhub(&config)?;
  let github = GithubClient::from_config(&config).unwrap_or_else(|e| {
    warn!(error = %e, "GitHub lookups disabled");
    None
  });
  let mut ctx = Context::new(client, cache, config, args.workspace).with_github(github);

  let mut out = std::io::stdout().lock();
  match args.command {
    Command::Resolve {
      kind,
      identifier,
      repo,
    } => commands::resolve(&ctx, kind, &identifier, repo.as_deref(), &mut out).await,
    Command::List { kind, limit } => commands::list(&ctx, kind, limit, &mut out).await,
    Command::Pipeline(PipelineCommand::Create { name }) => {
      commands::create_pipeline(&ctx, &name, &mut out).await
    }
    Command::Pipeline(PipelineCommand::Rename { pipeline, name }) => {
      commands::rename_pipeline(&ctx, &pipeline, &name, &mut out).await
    }
    Command::Pipeline(PipelineCommand::Delete { pipeline, into }) => {
      commands::delete_pipeline(&ctx, &pipeline, &into, &mut out).await
    }
    Command::Epic(EpicCommand::Create { title, body }) => {
      commands::create_epic(&ctx, &title, body.as_deref(), &mut out).await
    }
    Command::Workspace(WorkspaceCommand::Switch { id }) => {
      commands::switch_workspace(&mut ctx, &id, &mut out).await
    }
    Command::Cache(CacheCommand::Clear { namespace }) => {
      commands::clear_cache(&ctx, namespace.as_deref(), &mut out)
    }
  }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
  color_eyre::install()?;

  let args = Args::parse();
  match run(args).await {
    Ok(()) => Ok(ExitCode::SUCCESS),
    Err(report) => match report.downcast_ref::<ResolveError>() {
      // Resolution failures are expected outcomes: print the message, not a report
      Some(err) => {
        eprintln!("zh: {}", err);
        Ok(ExitCode::from(err.exit_code() as u8))
      }
      None => Err(report),
    },
  }
}
