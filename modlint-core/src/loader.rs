//! Schema loader: persisted module files into typed records.
//!
//! Loads `module_context.json`, `module_plot.json`, and every area file
//! under `areas/` (gameplay files plus `_BU` templates). A file that fails
//! to load (unreadable, malformed JSON, missing required field, pattern
//! mismatch) is recorded as a [`LoadFailure`] and skipped; the run
//! continues with whatever did load. Only a missing module root aborts.

use crate::ids::AreaId;
use crate::model::{Area, Module, ModuleContext, Plot};
use crate::report::LoadFailureReport;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Why a single file could not be loaded.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("file name declares area {expected} but the record says {declared}")]
    AreaIdMismatch { expected: String, declared: String },

    #[error("area file name {0:?} is not an area ID")]
    BadAreaFileName(String),
}

/// Why the whole run could not start.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("module directory not found: {0}")]
    MissingRoot(PathBuf),

    #[error("IO error reading module directory: {0}")]
    Io(#[from] std::io::Error),
}

/// A file the loader had to skip, with the reason.
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: SchemaError,
}

impl LoadFailure {
    pub fn to_report(&self) -> LoadFailureReport {
        LoadFailureReport {
            path: self.path.display().to_string(),
            error: self.error.to_string(),
        }
    }
}

/// The outcome of the loading phase: a (possibly partial) module plus the
/// files that could not be read.
#[derive(Debug)]
pub struct LoadedModule {
    pub module: Module,
    pub failures: Vec<LoadFailure>,
}

impl LoadedModule {
    /// Whether the plot file loaded; rules needing plot data check this
    /// and report inconclusive instead of aborting.
    pub fn plot_loaded(&self) -> bool {
        self.module.plot.is_some()
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SchemaError> {
    let content = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

/// Load a module from its root directory.
pub async fn load_module(root: impl AsRef<Path>) -> Result<LoadedModule, LoadError> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(LoadError::MissingRoot(root.to_path_buf()));
    }

    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| root.display().to_string());

    let mut module = Module {
        name,
        ..Module::default()
    };
    let mut failures = Vec::new();

    let context_path = root.join("module_context.json");
    match read_json::<ModuleContext>(&context_path).await {
        Ok(context) => module.context = Some(context),
        Err(error) => failures.push(LoadFailure {
            path: context_path,
            error,
        }),
    }

    let plot_path = root.join("module_plot.json");
    match read_json::<Plot>(&plot_path).await {
        Ok(plot) => module.plot = Some(plot),
        Err(error) => failures.push(LoadFailure {
            path: plot_path,
            error,
        }),
    }

    let areas_dir = root.join("areas");
    let mut area_files: Vec<PathBuf> = Vec::new();
    match fs::read_dir(&areas_dir).await {
        Ok(mut entries) => {
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.extension().map(|e| e == "json").unwrap_or(false) {
                    area_files.push(path);
                }
            }
        }
        Err(error) => failures.push(LoadFailure {
            path: areas_dir,
            error: error.into(),
        }),
    }

    // Deterministic load order regardless of directory iteration order.
    area_files.sort();

    for path in area_files {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let (id_part, is_template) = match stem.strip_suffix("_BU") {
            Some(prefix) => (prefix.to_string(), true),
            None => (stem.clone(), false),
        };

        let expected_id: AreaId = match id_part.parse() {
            Ok(id) => id,
            Err(_) => {
                failures.push(LoadFailure {
                    path,
                    error: SchemaError::BadAreaFileName(stem),
                });
                continue;
            }
        };

        match read_json::<Area>(&path).await {
            Ok(area) => {
                if area.area_id != expected_id {
                    failures.push(LoadFailure {
                        path,
                        error: SchemaError::AreaIdMismatch {
                            expected: expected_id.to_string(),
                            declared: area.area_id.to_string(),
                        },
                    });
                    continue;
                }
                if is_template {
                    module.templates.insert(expected_id, area);
                } else {
                    module.areas.insert(expected_id, area);
                }
            }
            Err(error) => failures.push(LoadFailure { path, error }),
        }
    }

    Ok(LoadedModule { module, failures })
}
