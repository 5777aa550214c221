//! Lookup table of runnable test units
//!
//! Built once at startup and handed to the suite driver.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::common::paths::is_archive;
use crate::common::{Error, Result};

use super::runner::{Harness, Outcome, RunOptions};

/// Something the suite driver can run by name
#[async_trait]
pub trait TestUnit: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, harness: &Harness, options: &RunOptions) -> Outcome;
}

/// A unit backed by one archive file
#[derive(Debug, Clone)]
pub struct ArchiveUnit {
    name: String,
    path: PathBuf,
}

impl ArchiveUnit {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Unit for an archive file, named after its stem
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(name, path)
    }
}

#[async_trait]
impl TestUnit for ArchiveUnit {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, harness: &Harness, options: &RunOptions) -> Outcome {
        harness.run(&self.name, &self.path, options).await
    }
}

/// Name to unit table
#[derive(Default)]
pub struct Registry {
    units: BTreeMap<String, Box<dyn TestUnit>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one archive unit per `*.txtar` file in `dir`
    pub fn discover(dir: &Path) -> Result<Self> {
        let mut registry = Self::new();
        registry.register_dir(dir)?;
        Ok(registry)
    }

    pub fn register_dir(&mut self, dir: &Path) -> Result<()> {
        let entries = std::fs::read_dir(dir).map_err(|e| Error::FileRead {
            path: dir.display().to_string(),
            error: e.to_string(),
        })?;

        for entry in entries {
            let path = entry?.path();
            if path.is_file() && is_archive(&path) {
                self.register(Box::new(ArchiveUnit::from_path(&path)))?;
            }
        }
        tracing::debug!("{} units registered from {}", self.len(), dir.display());
        Ok(())
    }

    pub fn register(&mut self, unit: Box<dyn TestUnit>) -> Result<()> {
        let name = unit.name().to_string();
        if self.units.contains_key(&name) {
            return Err(Error::orchestration(format!(
                "unit '{}' registered twice",
                name
            )));
        }
        self.units.insert(name, unit);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn TestUnit> {
        self.units.get(name).map(|unit| unit.as_ref())
    }

    /// Unit names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    pub fn units(&self) -> impl Iterator<Item = &dyn TestUnit> {
        self.units.values().map(|unit| unit.as_ref())
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
