//! `storygraph-cli`: project management, media/metadata ingestion, and
//! timeline export against the local registry.

use anyhow::{bail, Context, Result};
use canvas::{AnchorEdge, StoryNode};
use clap::{Parser, Subcommand};
use ingest::MetadataFile;
use project::RegistryDb;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "storygraph-cli", about = "Story-Graph authoring tools")]
struct Cli {
    /// Registry database path (defaults to the per-user data directory).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage projects.
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },
    /// Scan a directory for media files and seed assets.
    Scan {
        #[arg(long)]
        project: String,
        dir: PathBuf,
    },
    /// Ingest metadata files (sequence XML, SRT transcripts, CSV patches).
    Metadata {
        #[arg(long)]
        project: String,
        files: Vec<PathBuf>,
    },
    /// List a project's registered assets.
    Assets {
        #[arg(long)]
        project: String,
    },
    /// Compile the project's canvas into XMEML.
    Export {
        #[arg(long)]
        project: String,
        #[arg(long, default_value_t = exporters::DEFAULT_FPS)]
        fps: f64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ProjectAction {
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let db_path = cli
        .db
        .unwrap_or_else(|| project::app_data_dir().join("registry.db"));
    let mut db = RegistryDb::open_or_create(&db_path)
        .with_context(|| format!("opening registry at {}", db_path.display()))?;

    match cli.command {
        Command::Project { action } => match action {
            ProjectAction::Create { name, description } => {
                let created = db.create_project(&name, description.as_deref())?;
                println!("{}  {}", created.id, created.name);
            }
            ProjectAction::List => {
                let projects = db.list_projects()?;
                if projects.is_empty() {
                    println!("No projects yet.");
                }
                for p in projects {
                    let created = chrono::DateTime::from_timestamp(p.created_at, 0)
                        .map(|t| t.format("%Y-%m-%d").to_string())
                        .unwrap_or_default();
                    println!("{}  {}  ({})", p.id, p.name, created);
                }
            }
        },
        Command::Scan { project, dir } => {
            require_project(&db, &project)?;
            let assets = ingest::scan_media_dir(&dir, &project)
                .with_context(|| format!("scanning {}", dir.display()))?;
            if assets.is_empty() {
                println!("No compatible media files found in selection.");
                return Ok(());
            }
            let count = assets.len();
            db.bulk_upsert_assets(&assets)?;
            println!("Registered {count} media assets.");
        }
        Command::Metadata { project, files } => {
            require_project(&db, &project)?;
            if files.is_empty() {
                println!("No metadata files given.");
                return Ok(());
            }

            // Unreadable files are dropped here, before parsing, so they
            // cannot leave half-applied state behind.
            let mut batch = Vec::new();
            for path in &files {
                match tokio::fs::read_to_string(path).await {
                    Ok(content) => batch.push(MetadataFile {
                        name: path
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default(),
                        content,
                    }),
                    Err(err) => {
                        tracing::warn!(file = %path.display(), %err, "metadata file unreadable; skipped");
                    }
                }
            }
            if batch.is_empty() {
                println!("None of the requested files could be read.");
                return Ok(());
            }

            let mut assets = db.list_assets(&project)?;
            let outcome = ingest::ingest_metadata_batch(&batch, &mut assets, &project);
            if outcome.is_noop() {
                println!("Nothing to ingest from the selected files.");
                return Ok(());
            }
            if !outcome.new_containers.is_empty() {
                db.bulk_upsert_containers(&outcome.new_containers)?;
            }
            db.bulk_upsert_assets(&assets)?;
            println!(
                "Ingested: {} containers, {} asset rows patched, {} transcripts attached, {} files skipped.",
                outcome.new_containers.len(),
                outcome.assets_patched,
                outcome.transcripts_attached,
                outcome.files_skipped
            );
        }
        Command::Assets { project } => {
            require_project(&db, &project)?;
            let assets = db.list_assets(&project)?;
            if assets.is_empty() {
                println!("Vault empty. Run scan to populate assets.");
            }
            for a in assets {
                println!(
                    "[{}] {}  {}  {}s  {} @ {}fps",
                    a.media_type.as_str(),
                    a.file_name,
                    a.start_tc,
                    a.duration,
                    a.resolution,
                    a.fps
                );
            }
        }
        Command::Export { project, fps, output } => {
            require_project(&db, &project)?;
            let Some((nodes_json, edges_json)) = db.get_graph(&project)? else {
                println!("No canvas saved for this project.");
                return Ok(());
            };
            let nodes: Vec<StoryNode> =
                serde_json::from_value(nodes_json).context("decoding canvas nodes")?;
            let edges: Vec<AnchorEdge> =
                serde_json::from_value(edges_json).context("decoding canvas edges")?;

            match exporters::flatten_canvas_to_timeline(&nodes, &edges, fps)? {
                None => println!("No media found on canvas to export."),
                Some(xml) => match output {
                    Some(path) => {
                        tokio::fs::write(&path, xml)
                            .await
                            .with_context(|| format!("writing {}", path.display()))?;
                        println!("Exported timeline to {}.", path.display());
                    }
                    None => print!("{xml}"),
                },
            }
        }
    }
    Ok(())
}

fn require_project(db: &RegistryDb, id: &str) -> Result<()> {
    if db.get_project(id)?.is_none() {
        bail!("unknown project id: {id}");
    }
    Ok(())
}
