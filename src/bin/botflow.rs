use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as AnyhowContext, Result, bail};
use botflow::compiler::loader;
use botflow::dsl::Workflow;
use botflow::error::EngineError;
use botflow::runtime::config::EngineConfig;
use botflow::runtime::engine::{Engine, RunMode, RunStatus};
use botflow::runtime::event::{ChatMessage, MessageRole};
use botflow::runtime::observer::ConversationObserver;
use botflow::runtime::pacer::{InstantPacer, Pacer, TokioPacer};
use botflow::runtime::storage::{JsonFileStore, WorkflowStore};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Talk to a workflow document in the terminal
    Run {
        /// Path to the workflow document (JSON or YAML)
        #[arg(long)]
        file: PathBuf,
        /// Behave like the published chat instead of the authoring preview
        #[arg(long)]
        public: bool,
        /// Skip all pacing delays
        #[arg(long)]
        instant: bool,
        /// Engine configuration YAML
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List the workflows in a store
    List {
        #[arg(long)]
        store: PathBuf,
    },
    /// Import a document into a store as a new workflow
    Import {
        #[arg(long)]
        store: PathBuf,
        file: PathBuf,
    },
    /// Fill an empty store with the bundled template workflows
    Seed {
        #[arg(long)]
        store: PathBuf,
    },
    /// Print a stored workflow as JSON
    Export {
        #[arg(long)]
        store: PathBuf,
        id: String,
    },
    /// Publish a stored workflow and print its public id
    Publish {
        #[arg(long)]
        store: PathBuf,
        id: String,
    },
    /// Remove a workflow from a store
    Delete {
        #[arg(long)]
        store: PathBuf,
        id: String,
    },
    /// Open the public chat of a published workflow
    Chat {
        #[arg(long)]
        store: PathBuf,
        published_id: String,
        #[arg(long)]
        instant: bool,
    },
}

/// Prints the conversation as it happens.
struct ConsoleObserver;

impl ConversationObserver for ConsoleObserver {
    fn on_message(&self, _run_id: Uuid, message: &ChatMessage) {
        match message.role {
            MessageRole::System => println!("  [{}]", message.content),
            MessageRole::Bot => {
                println!("bot: {}", message.content);
                if let Some(media) = &message.media {
                    println!("     ({} {})", media.kind, media.url);
                }
            }
            MessageRole::User => println!("you: {}", message.content),
        }
    }
}

fn load_config(path: Option<&Path>, mode: RunMode, instant: bool) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::from_yaml_file(path)?,
        None => EngineConfig::for_mode(mode),
    };
    if instant {
        config.pacing = EngineConfig::instant().pacing;
    }
    Ok(config)
}

async fn converse(workflow: Workflow, mode: RunMode, config: EngineConfig, instant: bool) -> Result<()> {
    let pacer: Box<dyn Pacer> = if instant {
        Box::new(InstantPacer)
    } else {
        Box::new(TokioPacer)
    };

    let mut engine = Engine::new(mode)
        .with_config(config)
        .with_observer(Arc::new(ConsoleObserver));
    let run_id = engine.start(Arc::new(workflow))?;
    info!(run_id = %run_id, "Conversation started");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match engine.drive(pacer.as_ref()).await {
            RunStatus::AwaitingInput => {}
            _ => break,
        }

        let choices = engine.choices();
        if choices.is_empty() {
            println!("  (no options to choose from)");
            break;
        }
        for (i, (_, text)) in choices.iter().enumerate() {
            println!("  {}) {}", i + 1, text);
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let Some((option_id, _)) = line
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| choices.get(i))
        else {
            println!("  Pick a number between 1 and {}", choices.len());
            continue;
        };

        match engine.submit_response(option_id) {
            Ok(_) => {}
            Err(EngineError::ButtonsDisplayOnly(_)) => {
                println!("  (these buttons are display-only here)");
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            public,
            instant,
            config,
        } => {
            let mode = if public { RunMode::Public } else { RunMode::Preview };
            let workflow = loader::load_workflow_from_file(&file)
                .with_context(|| format!("Failed to load workflow from {}", file.display()))?;
            info!(workflow_id = %workflow.id, name = %workflow.name, "Loaded workflow");
            let config = load_config(config.as_deref(), mode, instant)?;
            converse(workflow, mode, config, instant).await?;
        }
        Commands::List { store } => {
            let store = JsonFileStore::open(&store).await?;
            for workflow in store.list().await? {
                let published = workflow.published_id.as_deref().unwrap_or("-");
                println!(
                    "{}\t{}\t{} nodes\tpublished: {}",
                    workflow.id,
                    workflow.name,
                    workflow.nodes.len(),
                    published
                );
            }
        }
        Commands::Import { store, file } => {
            let store = JsonFileStore::open(&store).await?;
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let workflow = match store.import_as(&text, loader::DocumentFormat::from_path(&file)).await {
                Ok(workflow) => workflow,
                Err(e) if e.is_malformed_document() => {
                    warn!(file = %file.display(), error = %e, "Rejected workflow document");
                    eprintln!("Import failed, check the document format");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };
            store.flush().await?;
            println!("{}", workflow.id);
        }
        Commands::Seed { store } => {
            let store = JsonFileStore::open(&store).await?;
            let added = store.seed_defaults().await?;
            if added > 0 {
                store.flush().await?;
            }
            println!("{} template workflows added", added);
        }
        Commands::Export { store, id } => {
            let store = JsonFileStore::open(&store).await?;
            println!("{}", store.export(&id).await?);
        }
        Commands::Publish { store, id } => {
            let store = JsonFileStore::open(&store).await?;
            let published_id = store.publish(&id).await?;
            store.flush().await?;
            println!("{}", published_id);
        }
        Commands::Delete { store, id } => {
            let store = JsonFileStore::open(&store).await?;
            if !store.delete(&id).await? {
                bail!("Workflow not found: {}", id);
            }
            store.flush().await?;
        }
        Commands::Chat {
            store,
            published_id,
            instant,
        } => {
            let store = JsonFileStore::open(&store).await?;
            let Some(workflow) = store.find_by_published_id(&published_id).await? else {
                println!("Workflow not found");
                return Ok(());
            };
            let config = load_config(None, RunMode::Public, instant)?;
            converse(workflow, RunMode::Public, config, instant).await?;
        }
    }

    Ok(())
}
