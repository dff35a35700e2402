//! Pedigraph CLI: parse pedigree snapshots and manage capture sessions.
//!
//! Usage:
//!   pedigraph parse <page.json> [--kit K] [--profiles p.json] [--segments s.json] [--json] [--log log.json]
//!   pedigraph rows <page.json>
//!   pedigraph session <load|next|focus|status|clear> [--db path]
//!   pedigraph capture <page.json> [--kit K] [--db path]
//!   pedigraph finalize|discard|export [--kit K] [--db path]
//!   pedigraph bundle [-o bundle.json] [--db path]

use clap::{Parser, Subcommand};
use pedigraph::model::read_records;
use pedigraph::{
    capture_page, to_gedcom, tokenize, AppConfig, Bundle, CaptureStatus, CaptureStore, ExportMeta, ExtractedPage,
    OpenStore, ProfileRecord, SegmentIndex, SegmentRecord, Session, SqliteStore,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pedigraph", version, about = "ASCII pedigree charts to GEDCOM")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an extracted page and print GEDCOM
    Parse {
        /// Extracted page JSON (text, html, anchors)
        page: PathBuf,
        /// Reference kit for root metadata
        #[arg(long)]
        kit: Option<String>,
        /// Profile records JSON
        #[arg(long)]
        profiles: Option<PathBuf>,
        /// Segment records JSON
        #[arg(long)]
        segments: Option<PathBuf>,
        /// Print the pedigree as JSON instead of GEDCOM
        #[arg(long)]
        json: bool,
        /// Write the diagnostic log as JSON
        #[arg(long)]
        log: Option<PathBuf>,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the tokenized rows of an extracted page as JSON
    Rows {
        page: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Manage the capture session
    Session {
        #[command(subcommand)]
        action: SessionAction,
        /// Path to SQLite database file
        #[arg(long, global = true)]
        db: Option<PathBuf>,
    },
    /// Parse a page for a kit and store the capture
    Capture {
        page: PathBuf,
        /// Kit to capture (the focused kit if omitted)
        #[arg(long)]
        kit: Option<String>,
        /// Segment records JSON
        #[arg(long)]
        segments: Option<PathBuf>,
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Mark a kit's capture as final
    Finalize {
        #[arg(long)]
        kit: Option<String>,
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Drop a kit's capture and mark it pending again
    Discard {
        #[arg(long)]
        kit: Option<String>,
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Write a stored capture's GEDCOM
    Export {
        #[arg(long)]
        kit: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write the capture's diagnostic log as JSON
        #[arg(long)]
        log: Option<PathBuf>,
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Write the session and every stored capture as one JSON bundle
    Bundle {
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Start a session from profile records JSON
    Load { profiles: PathBuf },
    /// Focus the next queued kit and print its tree URL
    Next,
    /// Focus a specific kit
    Focus { kit: String },
    /// Show per-kit status and stored captures
    Status,
    /// Remove the session (captures are kept)
    Clear,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("pedigraph={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Get the default database path (~/.local/share/pedigraph/pedigraph.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir().unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("pedigraph").join("pedigraph.db")
}

fn load_config(path: Option<&Path>) -> Result<AppConfig, String> {
    match path {
        Some(path) => AppConfig::from_yaml_file(path).map_err(|e| format!("Failed to read config: {}", e)),
        None => Ok(AppConfig::default()),
    }
}

fn open_store(db: Option<PathBuf>) -> Result<SqliteStore, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    SqliteStore::open(&db_path).map_err(|e| format!("Failed to open database: {}", e))
}

fn load_session(store: &SqliteStore) -> Result<Session, String> {
    store
        .load_session()
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "no session loaded; run `pedigraph session load <profiles.json>`".to_string())
}

/// The explicit kit, or the session's focused kit
fn resolve_kit(session: &Session, kit: Option<String>) -> Result<String, String> {
    kit.or_else(|| session.focused_kit.clone())
        .ok_or_else(|| "no kit given and none focused".to_string())
}

fn read_segments(path: Option<&Path>) -> Result<SegmentIndex, String> {
    match path {
        Some(path) => {
            let records: Vec<SegmentRecord> = read_records(path).map_err(|e| e.to_string())?;
            Ok(SegmentIndex::from_records(&records))
        }
        None => Ok(SegmentIndex::new()),
    }
}

fn read_page(path: &Path) -> Result<ExtractedPage, String> {
    ExtractedPage::from_json_file(path).map_err(|e| format!("cannot read page '{}': {}", path.display(), e))
}

fn write_output(path: Option<&Path>, text: &str) -> Result<(), String> {
    match path {
        Some(path) => std::fs::write(path, text).map_err(|e| format!("cannot write '{}': {}", path.display(), e)),
        None => {
            print!("{}", text);
            Ok(())
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value)
        .map(|json| json + "\n")
        .map_err(|e| e.to_string())
}

struct ParseArgs {
    page: PathBuf,
    kit: Option<String>,
    profiles: Option<PathBuf>,
    segments: Option<PathBuf>,
    json: bool,
    log: Option<PathBuf>,
    output: Option<PathBuf>,
}

fn cmd_parse(config: &AppConfig, args: ParseArgs) -> Result<(), String> {
    let page = read_page(&args.page)?;
    let pedigree = pedigraph::parse_page(&page, &config.parse);

    if let Some(log) = &args.log {
        write_output(Some(log.as_path()), &to_json(&pedigree.logs)?)?;
    }
    if args.json {
        return write_output(args.output.as_deref(), &to_json(&pedigree)?);
    }

    let profiles: Vec<ProfileRecord> = match &args.profiles {
        Some(path) => read_records(path).map_err(|e| e.to_string())?,
        None => Vec::new(),
    };
    let segments = read_segments(args.segments.as_deref())?;
    let meta = match &args.kit {
        Some(kit) => ExportMeta::for_kit(kit, &profiles, &segments, &config.export),
        None => ExportMeta::from_config(&config.export),
    };
    write_output(args.output.as_deref(), &to_gedcom(&pedigree, &meta))
}

fn cmd_rows(config: &AppConfig, page: &Path, output: Option<&Path>) -> Result<(), String> {
    let page = read_page(page)?;
    let tokenized = tokenize(&page, &config.parse);
    write_output(output, &to_json(&tokenized)?)
}

fn cmd_session(config: &AppConfig, db: Option<PathBuf>, action: SessionAction) -> Result<(), String> {
    let store = open_store(db)?;
    match action {
        SessionAction::Load { profiles } => {
            let records: Vec<ProfileRecord> = read_records(&profiles).map_err(|e| e.to_string())?;
            let total = records.len();
            let session = Session::from_profiles(records, &config.parse.links);
            store.save_session(&session).map_err(|e| e.to_string())?;
            println!("Loaded {} of {} profiles with a tree link", session.profiles.len(), total);
        }
        SessionAction::Next => {
            let mut session = load_session(&store)?;
            let (kit, url) = session
                .next_profile()
                .map(|p| (p.kit().to_string(), p.tree_url.clone()))
                .ok_or_else(|| "session has no profiles".to_string())?;
            store.save_session(&session).map_err(|e| e.to_string())?;
            println!("{}\t{}", kit, url);
        }
        SessionAction::Focus { kit } => {
            let mut session = load_session(&store)?;
            let url = session.focus(&kit).map_err(|e| e.to_string())?.tree_url.clone();
            store.save_session(&session).map_err(|e| e.to_string())?;
            println!("{}\t{}", kit, url);
        }
        SessionAction::Status => {
            let session = load_session(&store)?;
            let captures = store.list_captures().map_err(|e| e.to_string())?;
            for profile in &session.profiles {
                let kit = profile.kit();
                let status = session.status(kit);
                let marker = if session.focused_kit.as_deref() == Some(kit) { "*" } else { " " };
                let counts = captures
                    .iter()
                    .find(|c| c.kit == kit)
                    .map(|c| format!("{} people, {} families", c.people, c.families))
                    .unwrap_or_default();
                println!(
                    "{} {:<12} {:<6} {:<10} {:<30} {}",
                    marker,
                    kit,
                    status.color(),
                    status,
                    profile.profile.name,
                    counts
                );
            }
            let pending = session.counts().get("pending").copied().unwrap_or(0);
            println!("{} profiles, {} pending", session.profiles.len(), pending);
        }
        SessionAction::Clear => {
            if store.clear_session().map_err(|e| e.to_string())? {
                println!("Session cleared");
            } else {
                println!("No session to clear");
            }
        }
    }
    Ok(())
}

fn cmd_capture(
    config: &AppConfig,
    db: Option<PathBuf>,
    page: &Path,
    kit: Option<String>,
    segments: Option<&Path>,
) -> Result<(), String> {
    let store = open_store(db)?;
    let mut session = load_session(&store)?;
    let kit = resolve_kit(&session, kit)?;
    let tree_url = session.focus(&kit).map_err(|e| e.to_string())?.tree_url.clone();

    let profiles: Vec<ProfileRecord> = session.profiles.iter().map(|p| p.profile.clone()).collect();
    let segments = read_segments(segments)?;
    let meta = ExportMeta::for_kit(&kit, &profiles, &segments, &config.export);
    let page = read_page(page)?;
    let capture = capture_page(&kit, &page, &config.parse, &meta).with_source_url(tree_url);

    store.save_capture(&capture).map_err(|e| e.to_string())?;
    session
        .set_status(&kit, CaptureStatus::Captured)
        .map_err(|e| e.to_string())?;
    store.save_session(&session).map_err(|e| e.to_string())?;
    println!(
        "Captured {}: {} people, {} families",
        kit,
        capture.pedigree.people.len(),
        capture.pedigree.families.len()
    );
    Ok(())
}

/// Finalize keeps the capture; pending discards it
fn cmd_set_status(db: Option<PathBuf>, kit: Option<String>, status: CaptureStatus) -> Result<(), String> {
    let store = open_store(db)?;
    let mut session = load_session(&store)?;
    let kit = resolve_kit(&session, kit)?;
    if status == CaptureStatus::Pending {
        store.delete_capture(&kit).map_err(|e| e.to_string())?;
    } else if store.load_capture(&kit).map_err(|e| e.to_string())?.is_none() {
        return Err(format!("no capture stored for kit {}", kit));
    }
    session.set_status(&kit, status).map_err(|e| e.to_string())?;
    store.save_session(&session).map_err(|e| e.to_string())?;
    println!("{} is now {}", kit, status);
    Ok(())
}

fn cmd_export(
    db: Option<PathBuf>,
    kit: Option<String>,
    output: Option<&Path>,
    log: Option<&Path>,
) -> Result<(), String> {
    let store = open_store(db)?;
    let kit = match kit {
        Some(kit) => kit,
        None => resolve_kit(&load_session(&store)?, None)?,
    };
    let capture = store
        .load_capture(&kit)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("no capture stored for kit {}", kit))?;
    if let Some(log) = log {
        write_output(Some(log), &to_json(&capture.pedigree.logs)?)?;
    }
    write_output(output, &capture.gedcom)
}

fn cmd_bundle(config: &AppConfig, db: Option<PathBuf>, output: Option<&Path>) -> Result<(), String> {
    let store = open_store(db)?;
    let session = load_session(&store)?;
    let bundle = Bundle::from_store(&session, &store, config.export.site_label.clone()).map_err(|e| e.to_string())?;
    write_output(output, &to_json(&bundle)?)?;
    if output.is_some() {
        println!(
            "Bundled {} profiles and {} captures",
            bundle.profiles.len(),
            bundle.captures.len()
        );
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Parse {
            page,
            kit,
            profiles,
            segments,
            json,
            log,
            output,
        } => cmd_parse(
            &config,
            ParseArgs {
                page,
                kit,
                profiles,
                segments,
                json,
                log,
                output,
            },
        ),
        Commands::Rows { page, output } => cmd_rows(&config, &page, output.as_deref()),
        Commands::Session { action, db } => cmd_session(&config, db, action),
        Commands::Capture { page, kit, segments, db } => {
            cmd_capture(&config, db, &page, kit, segments.as_deref())
        }
        Commands::Finalize { kit, db } => cmd_set_status(db, kit, CaptureStatus::Finalized),
        Commands::Discard { kit, db } => cmd_set_status(db, kit, CaptureStatus::Pending),
        Commands::Export { kit, output, log, db } => cmd_export(db, kit, output.as_deref(), log.as_deref()),
        Commands::Bundle { output, db } => cmd_bundle(&config, db, output.as_deref()),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
