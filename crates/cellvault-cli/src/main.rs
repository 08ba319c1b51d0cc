//! cellvault binary
//!
//! Inspect and edit documents kept in a local content-addressed object
//! directory.
//!
//! ## Usage
//!
//! ```bash
//! cellvault new --title Budget --owner amy
//! cellvault show <cid>
//! cellvault set <cid> B2 '=B1*2' --sheet sheet-1
//! cellvault export <cid>
//! cellvault history <cid>
//! ```
//!
//! Every edit saves a new immutable version and prints its content id.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use cellvault_cas::{ContentId, FsStore};
use cellvault_store::{
    CellPatch, DocumentEditor, PersistenceGateway, StoreConfig, project_document, project_sheet,
    shared_document_store,
};
use cellvault_types::{CellRef, CellValue, DocumentState};

#[derive(Parser, Debug)]
#[command(name = "cellvault")]
#[command(about = "Spreadsheet documents in a content-addressed store")]
struct Cli {
    /// Object directory (overrides the config file)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Config file (default: ~/.config/cellvault/config.ron)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty document and save it
    New {
        #[arg(long, default_value = "Untitled")]
        title: String,
        #[arg(long, default_value = "")]
        owner: String,
    },
    /// Summarize a saved document
    Show { cid: String },
    /// Set one cell and save a new version
    Set {
        cid: String,
        /// A1-style cell key
        cell: String,
        /// Value; a leading `=` stores a formula
        value: String,
        /// Sheet id (default: the active sheet)
        #[arg(long)]
        sheet: Option<String>,
    },
    /// Print the unified cell projection as JSON
    Export {
        cid: String,
        /// Only this sheet
        #[arg(long)]
        sheet: Option<String>,
    },
    /// List recorded versions
    History { cid: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let root = cli
        .root
        .or_else(|| config.storage_root())
        .context("no storage root: pass --root or set storage.root")?;
    tracing::debug!(root = %root.display(), "using object directory");
    let objects = Arc::new(FsStore::new(root));

    let gateway_for = |doc: DocumentState| {
        let gateway = PersistenceGateway::new(shared_document_store(doc), objects.clone());
        match &config.author {
            Some(author) => gateway.with_author_fallback(author.clone()),
            None => gateway,
        }
    };

    match cli.command {
        Command::New { title, owner } => {
            let doc = DocumentState::new(title, owner, cellvault_types::now_millis());
            let receipt = gateway_for(doc).save_with_description("created").await?;
            println!("{}", receipt.content_id);
        }
        Command::Show { cid } => {
            let doc = gateway_for(DocumentState::default()).fetch(&parse_cid(&cid)?).await?;
            print_summary(&doc);
        }
        Command::Set { cid, cell, value, sheet } => {
            let gateway = gateway_for(DocumentState::default());
            let doc = gateway.checkout(&parse_cid(&cid)?).await?;
            let sheet_id = sheet.unwrap_or(doc.active_sheet_id);
            let Some(at) = CellRef::parse(&cell) else {
                bail!("not a cell reference: {cell}");
            };
            let store = gateway.store();
            if store.is_cell_locked(&sheet_id, &at.key()) {
                bail!("cell {at} on sheet {sheet_id} is locked");
            }
            if !store.update_cell(&sheet_id, &at.key(), parse_value(&value)) {
                bail!("no change applied (unknown sheet {sheet_id}, or same value)");
            }
            let receipt = gateway
                .save_with_description(format!("set {at} on {sheet_id}"))
                .await?;
            println!("{}", receipt.content_id);
        }
        Command::Export { cid, sheet } => {
            let doc = gateway_for(DocumentState::default()).fetch(&parse_cid(&cid)?).await?;
            let json = match sheet {
                Some(sheet_id) => {
                    let sheet = doc
                        .sheet(&sheet_id)
                        .with_context(|| format!("sheet not found: {sheet_id}"))?;
                    serde_json::to_string_pretty(&project_sheet(sheet))?
                }
                None => serde_json::to_string_pretty(&project_document(&doc))?,
            };
            println!("{json}");
        }
        Command::History { cid } => {
            let doc = gateway_for(DocumentState::default()).fetch(&parse_cid(&cid)?).await?;
            for entry in &doc.version_history {
                println!(
                    "{}  {}  {}  {}",
                    entry.timestamp,
                    entry.content_id,
                    entry.author,
                    entry.description.as_deref().unwrap_or("")
                );
            }
            println!("{}  {cid}  (this version)", doc.metadata.updated_at);
        }
    }
    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<StoreConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match StoreConfig::default_path() {
            Some(path) => path,
            None => return Ok(StoreConfig::default()),
        },
    };
    StoreConfig::load(&path).with_context(|| format!("loading {}", path.display()))
}

fn parse_cid(text: &str) -> Result<ContentId> {
    text.parse::<ContentId>()
        .with_context(|| format!("invalid content id {text:?}"))
}

/// `=...` is a formula, then numbers and booleans, else text.
fn parse_value(text: &str) -> CellPatch {
    if text.starts_with('=') {
        return CellPatch::formula(text, CellValue::Null);
    }
    if let Some(n) = text.parse::<f64>().ok().filter(|n| n.is_finite()) {
        return CellPatch::value(n);
    }
    match text {
        "true" | "TRUE" => CellPatch::value(true),
        "false" | "FALSE" => CellPatch::value(false),
        _ => CellPatch::value(text),
    }
}

fn print_summary(doc: &DocumentState) {
    println!("{}", doc.metadata.title);
    println!("  id:       {}", doc.document_id);
    println!("  owner:    {}", doc.metadata.owner);
    println!("  updated:  {}", doc.metadata.updated_at);
    println!("  versions: {}", doc.version_history.len());
    for sheet in &doc.sheets {
        let marker = if sheet.sheet_id == doc.active_sheet_id { "*" } else { " " };
        let lock = if sheet.protected { " [protected]" } else { "" };
        println!(
            "  {marker} {} ({}) {} cells{lock}",
            sheet.name,
            sheet.sheet_id,
            sheet.cells.len()
        );
    }
}
