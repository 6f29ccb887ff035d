use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TransformError};
use crate::grid::GridDefinition;

pub const GRID_DIR_ENV: &str = "SNAKE_GRID_GSB_DIR";
pub const DEFAULT_GRID_DIR: &str = "./gsb_files";

/// Where the NTv2 `.gsb` files are deployed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridFiles {
    dir: PathBuf,
}

impl GridFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        GridFiles { dir: dir.into() }
    }

    /// Uses `SNAKE_GRID_GSB_DIR` when set, otherwise `./gsb_files`.
    pub fn from_env() -> Self {
        match env::var_os(GRID_DIR_ENV) {
            Some(dir) if !dir.is_empty() => GridFiles::new(dir),
            _ => GridFiles::default(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, definition: &GridDefinition) -> PathBuf {
        self.dir.join(definition.grid_file)
    }

    /// Resolves the grid file for `definition` to an absolute path, failing if
    /// it is not deployed or cannot be embedded in a PROJ string.
    pub fn check(&self, definition: &GridDefinition) -> Result<PathBuf> {
        let path = self.path_for(definition);
        if !path.is_file() {
            return Err(TransformError::GridFileMissing {
                grid: definition.code,
                path,
            });
        }
        let path = fs::canonicalize(&path)?;
        // PROJ strings are whitespace separated
        if path.to_string_lossy().chars().any(char::is_whitespace) {
            return Err(TransformError::UnusableGridPath {
                grid: definition.code,
                path,
            });
        }
        Ok(path)
    }
}

impl Default for GridFiles {
    fn default() -> Self {
        GridFiles::new(DEFAULT_GRID_DIR)
    }
}
