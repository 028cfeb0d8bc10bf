//! Definition loading from disk.
//!
//! Layout of a mocks folder:
//!
//! ```text
//! mocks/
//!   routes/            any depth, one route or an array of routes per file
//!     users.yaml
//!     books/books.json
//!   collections.json   array of collections (`mocks.*` is accepted too)
//! ```
//!
//! A file that cannot be read or parsed is skipped and reported as a
//! `files:<relative path>` alert; the rest is still loaded.

use crate::alerts::AlertSink;
use crate::definitions::{CollectionDefinition, RouteDefinition};
use crate::mocks::Mocks;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];
const ROUTES_DIR: &str = "routes";
const COLLECTIONS_FILES: [&str; 2] = ["collections", "mocks"];

/// Error type for definition file loading.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Mocks folder '{0}' does not exist")]
    MissingRoot(PathBuf),
    #[error("Error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Error parsing '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Error parsing '{path}': {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Reload task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Definitions read from one mocks folder.
#[derive(Debug, Default)]
pub struct LoadedDefinitions {
    pub routes: Vec<RouteDefinition>,
    pub collections: Vec<CollectionDefinition>,
}

/// Reads route and collection files from a mocks folder.
pub struct FileLoader {
    root: PathBuf,
    alerts: Arc<dyn AlertSink>,
}

impl FileLoader {
    pub fn new(root: impl Into<PathBuf>, alerts: Arc<dyn AlertSink>) -> Self {
        Self {
            root: root.into(),
            alerts,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read every definition file. Only a missing folder is an error.
    pub fn load(&self) -> Result<LoadedDefinitions, LoadError> {
        self.alerts.clean();
        if !self.root.is_dir() {
            let err = LoadError::MissingRoot(self.root.clone());
            self.alerts.set("root", &err.to_string(), None);
            return Err(err);
        }

        let mut loaded = LoadedDefinitions::default();

        let routes_dir = self.root.join(ROUTES_DIR);
        match definition_files(&routes_dir) {
            Ok(files) => {
                for file in files {
                    loaded.routes.extend(self.read_entries::<RouteDefinition>(&file));
                }
            }
            Err(source) => self.alerts.set(
                ROUTES_DIR,
                &format!("Routes folder '{}' could not be read", routes_dir.display()),
                Some(&source.to_string()),
            ),
        }

        match self.collections_file() {
            Some(file) => loaded.collections = self.read_entries::<CollectionDefinition>(&file),
            None => self.alerts.set(
                "collections",
                &format!(
                    "No collections file found in '{}'",
                    self.root.display()
                ),
                None,
            ),
        }

        info!(
            "Read {} routes and {} collections from {}",
            loaded.routes.len(),
            loaded.collections.len(),
            self.root.display()
        );
        Ok(loaded)
    }

    /// Load the folder into `mocks`. A missing folder loads nothing.
    pub fn reload(&self, mocks: &Mocks) -> Result<(), LoadError> {
        let loaded = self.load()?;
        mocks.load(loaded.routes, loaded.collections);
        Ok(())
    }

    /// [`reload`](Self::reload) on tokio's blocking pool, for callers running
    /// on a runtime worker.
    pub async fn reload_blocking(
        self: &Arc<Self>,
        mocks: &Arc<Mocks>,
    ) -> Result<(), LoadError> {
        let loader = Arc::clone(self);
        let mocks = Arc::clone(mocks);
        tokio::task::spawn_blocking(move || loader.reload(&mocks)).await?
    }

    fn collections_file(&self) -> Option<PathBuf> {
        COLLECTIONS_FILES.iter().find_map(|name| {
            EXTENSIONS
                .iter()
                .map(|ext| self.root.join(format!("{name}.{ext}")))
                .find(|path| path.is_file())
        })
    }

    /// Entries of one file; a file holds one object or an array of them.
    fn read_entries<T: DeserializeOwned>(&self, path: &Path) -> Vec<T> {
        let label = self.label(path);
        let value = match parse_file(path) {
            Ok(value) => value,
            Err(err) => {
                self.alerts.set(&label, "Error loading file", Some(&err.to_string()));
                return Vec::new();
            }
        };

        let values = match value {
            Value::Array(values) => values,
            Value::Null => Vec::new(),
            other => vec![other],
        };

        let mut entries = Vec::with_capacity(values.len());
        for (idx, value) in values.into_iter().enumerate() {
            match serde_json::from_value(value) {
                Ok(entry) => entries.push(entry),
                Err(err) => self.alerts.set(
                    &format!("{label}:{idx}"),
                    &format!("Entry {idx} of '{label}' could not be parsed"),
                    Some(&err.to_string()),
                ),
            }
        }
        debug!("{}: {} entries", label, entries.len());
        entries
    }

    fn label(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

/// True for files the loader reads.
pub fn is_definition_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Definition files below `dir`, sorted by path.
fn definition_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !dir.exists() {
        return Ok(files);
    }
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if is_definition_file(&path) {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

fn parse_file(path: &Path) -> Result<Value, LoadError> {
    let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if is_json {
        serde_json::from_str(&contents).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_yaml::from_str(&contents).map_err(|source| LoadError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }
}
