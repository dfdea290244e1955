//! Layered configuration for binran.
//!
//! Sources are merged in order, later ones winning:
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. A configuration file: the path given on the command line, otherwise
//!    `binran.toml` in the working directory, otherwise `config.toml` in the
//!    platform configuration directory. TOML, YAML and JSON are accepted.
//! 3. Environment variables prefixed with `BINRAN_`, nesting with `__`, for
//!    example `BINRAN_STORE__ROOT=/srv/handbooks`.

pub mod error;

use binran_catalog::{Catalog, EntrySpec};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{ErrorKind, Result};

const APPLICATION: &str = "binran";
const ENV_PREFIX: &str = "BINRAN_";
const LOCAL_FILE: &str = "binran.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub tools: ToolsConfig,
    pub catalog: CatalogConfig,
}

/// Where materialized handbooks are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding `handbook_<key>.txt` files. Relative paths are
    /// resolved against the working directory at load time.
    pub root: PathBuf,
    /// Never write to the store; documents are materialized in memory only.
    pub read_only: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let root = match ProjectDirs::from("", "", APPLICATION) {
            Some(dirs) => dirs.data_dir().join("handbooks"),
            None => PathBuf::from("handbooks"),
        };
        Self { root, read_only: false }
    }
}

/// External PDF tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Explicit `pdfinfo` binary; looked up on `PATH` when unset.
    pub pdfinfo: Option<PathBuf>,
    /// Explicit `pdftotext` binary; looked up on `PATH` when unset.
    pub pdftotext: Option<PathBuf>,
    /// Preserve the physical layout of each page (`pdftotext -layout`).
    pub layout: bool,
    /// Pages extracted in parallel per document.
    pub workers: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self { pdfinfo: None, pdftotext: None, layout: true, workers: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Base directory for relative source paths.
    pub source_dir: PathBuf,
    /// Replaces the built-in faculty table when non-empty.
    pub entries: BTreeMap<String, EntrySpec>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { source_dir: PathBuf::from("binran_all_pdf"), entries: BTreeMap::new() }
    }
}

impl Config {
    /// Load configuration from every layer.
    ///
    /// An explicit `path` must exist; the implicit locations are optional.
    #[tracing::instrument(level = "debug")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        let file = match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(),
        };
        if let Some(file) = file {
            tracing::debug!(path = %file.display(), "Reading configuration file");
            figment = Self::merge_file(figment, &file)?;
        }
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extract and validate a configuration from an already assembled
    /// figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()
    }

    /// Build the handbook catalog this configuration describes.
    pub fn catalog(&self) -> Result<Catalog> {
        let source_dir = Some(self.catalog.source_dir.as_path());
        let catalog = match self.catalog.entries.is_empty() {
            true => Catalog::builtin(source_dir),
            false => Catalog::new(self.catalog.entries.clone(), source_dir),
        };
        catalog.or_raise(|| ErrorKind::Invalid("catalog".to_string()))
    }

    /// Candidate configuration files, in order of preference.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_FILE)];
        if let Some(dirs) = ProjectDirs::from("", "", APPLICATION) {
            paths.push(dirs.config_dir().join("config.toml"));
        }
        paths
    }

    fn discover() -> Option<PathBuf> {
        Self::search_paths().into_iter().find(|path| path.is_file())
    }

    fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
        let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
        Ok(match extension.as_deref() {
            Some("toml") => figment.merge(Toml::file(path)),
            Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
            Some("json") => figment.merge(Json::file(path)),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
        })
    }

    fn validate(mut self) -> Result<Self> {
        if self.tools.workers == 0 {
            exn::bail!(ErrorKind::Invalid("tools.workers must be at least 1".to_string()));
        }
        if let Some((key, _)) = self.catalog.entries.iter().find(|(_, entry)| entry.page_offset < 0) {
            exn::bail!(ErrorKind::Invalid(format!("catalog.entries.{key}.page_offset must not be negative")));
        }
        if self.store.root.is_relative() {
            let cwd = std::env::current_dir().or_raise(|| ErrorKind::Load)?;
            self.store.root = cwd.join(&self.store.root);
        }
        Ok(self)
    }
}
