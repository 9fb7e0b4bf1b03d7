use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};

use gistling::model::{FileEntry, GistDraft, GistId, RemoteConfig};
use gistling::remote::HttpRemote;
use gistling::store::LocalStore;
use gistling::sync::SyncEngine;

#[derive(Parser)]
#[command(name = "gistling")]
#[command(about = "Local mirror and browser for your remote gists", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the remote and store the access token
    Login {
        /// Base URL of the gist service
        #[arg(long)]
        url: String,
        /// Access token
        #[arg(long)]
        token: String,
    },

    /// Forget the access token and end the session
    Logout,

    /// Mirror the remote collection into the local cache and print a summary
    Sync,

    /// List gists after a sync
    List {
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a gist from local files
    New {
        /// Description
        #[arg(short = 'm', long, default_value = "")]
        description: String,
        /// Make the gist public
        #[arg(long)]
        public: bool,
        /// Files to include
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Update a gist's description and files
    Edit {
        id: String,
        #[arg(short = 'm', long)]
        description: Option<String>,
        /// Replacement files (omit to keep current)
        files: Vec<PathBuf>,
    },

    /// Delete a gist
    Delete { id: String },

    /// Assign tags to a gist (replaces its tag set; empty clears)
    Tag {
        id: String,
        tags: Vec<String>,
    },

    /// Browse the collection in a TUI
    Browse,
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Login { url, token } => {
            let store = LocalStore::init(&LocalStore::default_dir()?)?;
            store.set_remote(RemoteConfig {
                base_url: url.trim_end_matches('/').to_string(),
            })?;
            store.set_token(&token)?;
            println!("logged in");
            Ok(())
        }
        Commands::Logout => {
            let store = open_store()?;
            store.clear_token()?;
            // In-memory session state dies with the process; a running
            // browse session resets through SyncEngine::reset_session.
            println!("logged out");
            Ok(())
        }
        Commands::Sync => {
            let (mut engine, store) = build_engine()?;
            let report = engine.full_sync()?;
            restore_tags(&mut engine, &store)?;
            println!(
                "synced {} gists ({} removed)",
                report.fetched, report.removed
            );
            Ok(())
        }
        Commands::List { json } => {
            let (mut engine, store) = build_engine()?;
            engine.full_sync()?;
            restore_tags(&mut engine, &store)?;
            if json {
                let records: Vec<_> = engine.cache().list().into_iter().collect();
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                for rec in engine.cache().list() {
                    let tags: Vec<&str> = rec.tags.iter().map(|t| t.as_str()).collect();
                    println!(
                        "{}  {:10}  {}  {}",
                        rec.id,
                        rec.primary_language(),
                        rec.description,
                        if tags.is_empty() {
                            String::new()
                        } else {
                            format!("#{}", tags.join(" #"))
                        }
                    );
                }
            }
            Ok(())
        }
        Commands::New {
            description,
            public,
            files,
        } => {
            let (mut engine, _store) = build_engine()?;
            let draft = GistDraft {
                description,
                public,
                files: read_files(&files)?,
            };
            let temp = engine.submit_create(draft);
            let events = engine.flush();
            report_outcome(&events, &temp)
        }
        Commands::Edit {
            id,
            description,
            files,
        } => {
            let (mut engine, store) = build_engine()?;
            engine.full_sync()?;
            restore_tags(&mut engine, &store)?;
            let id = GistId(id);
            let current = engine
                .cache()
                .get(&id)
                .ok_or_else(|| anyhow!("unknown gist {id}"))?;
            let draft = GistDraft {
                description: description.unwrap_or_else(|| current.description.clone()),
                public: current.public,
                files: if files.is_empty() {
                    current.files.clone()
                } else {
                    read_files(&files)?
                },
            };
            engine.submit_update(&id, draft)?;
            let events = engine.flush();
            report_outcome(&events, &id)
        }
        Commands::Delete { id } => {
            let (mut engine, store) = build_engine()?;
            engine.full_sync()?;
            restore_tags(&mut engine, &store)?;
            let id = GistId(id);
            engine.submit_delete(&id)?;
            let events = engine.flush();
            report_outcome(&events, &id)
        }
        Commands::Tag { id, tags } => {
            let (mut engine, store) = build_engine()?;
            engine.full_sync()?;
            let id = GistId(id);
            let tags: BTreeSet<String> = tags.into_iter().collect();
            engine.set_tags(&id, tags.clone())?;
            store.set_tags_for(&id, &tags)?;
            println!("tagged {id}");
            Ok(())
        }
        Commands::Browse => {
            let (engine, store) = build_engine()?;
            gistling::tui::run(engine, store)
        }
    }
}

fn open_store() -> Result<LocalStore> {
    LocalStore::open(&LocalStore::default_dir()?)
}

fn build_engine() -> Result<(SyncEngine<HttpRemote>, LocalStore)> {
    let store = open_store()?;
    let remote = store
        .remote()?
        .ok_or_else(|| anyhow!("no remote configured (run `gistling login`)"))?;
    let token = store
        .token()?
        .ok_or_else(|| anyhow!("not logged in (run `gistling login`)"))?;
    let client = HttpRemote::new(remote, token).map_err(|e| anyhow!(e))?;
    Ok((SyncEngine::new(client), store))
}

fn restore_tags(engine: &mut SyncEngine<HttpRemote>, store: &LocalStore) -> Result<()> {
    for (id, tags) in store.read_state()?.tags {
        if engine.cache().get(&id).is_some_and(|r| r.tags != tags) {
            engine.set_tags(&id, tags)?;
        }
    }
    Ok(())
}

fn read_files(paths: &[PathBuf]) -> Result<Vec<FileEntry>> {
    let mut files = Vec::new();
    for path in paths {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("bad filename {}", path.display()))?;
        files.push(FileEntry::new(name, Some(content)));
    }
    Ok(files)
}

fn report_outcome(events: &[gistling::sync::SyncEvent], id: &GistId) -> Result<()> {
    use gistling::sync::SyncEvent;
    for ev in events {
        match ev {
            SyncEvent::Created { id, .. } => println!("created {id}"),
            SyncEvent::Updated { id } => println!("updated {id}"),
            SyncEvent::Deleted { id } => println!("deleted {id}"),
            SyncEvent::RolledBack { id, error } => {
                return Err(anyhow!("{id}: {error}"));
            }
            SyncEvent::RefetchScheduled { id } => {
                eprintln!("{id} changed remotely; local copy refreshed instead")
            }
            SyncEvent::Refetched { .. } => {}
            SyncEvent::RemovedRemotely { id } => {
                return Err(anyhow!("{id} was deleted remotely"));
            }
        }
    }
    if events.is_empty() {
        return Err(anyhow!("no outcome for {id}"));
    }
    Ok(())
}
