use binran_catalog::Catalog;
use binran_config::Config;
use binran_extract::{PageExtractor, Poppler};
use binran_library::{ConvertEvent, Library, Tools};
use binran_storage::backend::{LocalBackend, ReadOnlyBackend};
use binran_storage::{BackendHandle, DocumentStore};
use clap::{ArgAction, Parser, Subcommand};
use exn::ResultExt;
use futures::StreamExt;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::pin::pin;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

use crate::error::{ErrorKind, Result};

/// Student handbooks as page-numbered text.
#[derive(Debug, Parser)]
#[command(name = "binran", version, about)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Log more; repeat for even more.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the handbooks in the catalog.
    Catalog,
    /// Print the text of a handbook, extracting it first if needed.
    Show {
        key: String,
        /// Only accept the request if the handbook has this department.
        #[arg(long)]
        department: Option<String>,
    },
    /// Extract and store handbooks that have not been stored yet.
    Convert {
        /// Handbooks to convert; all of them when omitted.
        keys: Vec<String>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = Config::load(self.config.as_deref()).or_raise(|| ErrorKind::Config)?;
        let catalog = config.catalog().or_raise(|| ErrorKind::Config)?;
        match self.command {
            Command::Catalog => print_catalog(&catalog).await,
            Command::Show { key, department } => show(&library(&config, catalog)?, &key, department.as_deref()).await,
            Command::Convert { keys } => convert(&library(&config, catalog)?, keys).await,
        }
    }
}

fn library(config: &Config, catalog: Catalog) -> Result<Library> {
    let tools =
        Poppler::with_paths(config.tools.pdfinfo.clone(), config.tools.pdftotext.clone()).with_layout(config.tools.layout);
    let workers = NonZeroUsize::new(config.tools.workers).unwrap_or(NonZeroUsize::MIN);
    let extractor = PageExtractor::new(Arc::new(tools) as Tools).with_workers(workers);

    let local: BackendHandle =
        Arc::new(LocalBackend::new("handbooks", &config.store.root).or_raise(|| ErrorKind::Setup)?);
    let backend: BackendHandle = match config.store.read_only {
        true => Arc::new(ReadOnlyBackend::new(local)),
        false => local,
    };
    tracing::debug!(root = %config.store.root.display(), read_only = config.store.read_only, "Document store ready");
    Ok(Library::new(catalog, DocumentStore::new(backend), extractor))
}

async fn print_catalog(catalog: &Catalog) -> Result<()> {
    let mut out = String::new();
    for entry in catalog.entries() {
        out.push_str(&format!(
            "{}\t{}\toffset {}\t{}\n",
            entry.key(),
            entry.name(),
            entry.page_offset(),
            entry.source().display()
        ));
        for (key, name) in entry.departments() {
            out.push_str(&format!("  {key}\t{name}\n"));
        }
    }
    write_stdout(&out).await
}

async fn show(library: &Library, key: &str, department: Option<&str>) -> Result<()> {
    if let Some(department) = department {
        let (entry, name) = library.department(key, department).or_raise(|| ErrorKind::Show)?;
        tracing::info!(handbook = entry.name(), department = name, "Department found");
    }
    let text = library.handbook(key).await.or_raise(|| ErrorKind::Show)?;
    write_stdout(&text).await
}

async fn convert(library: &Library, keys: Vec<String>) -> Result<()> {
    let keys = match keys.is_empty() {
        true => library.catalog().keys().map(String::from).collect(),
        false => keys,
    };
    let mut failed = 0;
    let mut events = pin!(library.convert(keys));
    while let Some(event) = events.next().await {
        match event {
            Ok(ConvertEvent::Started(total)) => tracing::info!(total, "Converting handbooks"),
            Ok(ConvertEvent::Skipped(key)) => tracing::info!(key = %key, "Skipped, already stored"),
            Ok(ConvertEvent::Converted { key, chars }) => tracing::info!(key = %key, chars, "Converted"),
            Ok(ConvertEvent::Complete) => tracing::info!(failed, "Conversion complete"),
            Err(err) => {
                failed += 1;
                tracing::error!(error = ?err, "Conversion failed");
            },
        }
    }
    if failed > 0 {
        exn::bail!(ErrorKind::Convert(failed));
    }
    Ok(())
}

async fn write_stdout(text: &str) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await.or_raise(|| ErrorKind::Output)?;
    stdout.flush().await.or_raise(|| ErrorKind::Output)
}
