//! Experiment directory layout.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Default root for experiment directories.
pub const DEFAULT_ROOT: &str = "./check";

/// Create `path` and any missing parents. Existing directories are left alone.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_directory<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if path.is_dir() {
        return Ok(());
    }

    fs::create_dir_all(path).map_err(|source| Error::CreateDir {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!("Created directory {}", path.display());
    Ok(())
}

/// Which domain is translated into which.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    AtoB,
    BtoA,
}

impl Direction {
    /// Name of the test output directory for this direction.
    #[must_use]
    pub const fn test_dir_name(self) -> &'static str {
        match self {
            Self::AtoB => "testa2b",
            Self::BtoA => "testb2a",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtoB => f.write_str("AtoB"),
            Self::BtoA => f.write_str("BtoA"),
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "AtoB" => Ok(Self::AtoB),
            "BtoA" => Ok(Self::BtoA),
            other => Err(Error::invalid(
                "direction",
                format!("expected AtoB or BtoA, got {other:?}"),
            )),
        }
    }
}

/// Output directories of one experiment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentPaths {
    /// Model checkpoints; also the experiment root.
    pub checkpoint_dir: PathBuf,
    /// Sample grids written during training.
    pub sample_dir: PathBuf,
    /// Test outputs for the chosen direction.
    pub test_dir: PathBuf,
    /// Saved run configuration.
    pub conf_dir: PathBuf,
}

impl ExperimentPaths {
    /// Lay out the directories for `experiment` under `root`.
    #[must_use]
    pub fn new<P: AsRef<Path>>(root: P, experiment: &str, direction: Direction) -> Self {
        let checkpoint_dir = root.as_ref().join(experiment);

        Self {
            sample_dir: checkpoint_dir.join("sample"),
            test_dir: checkpoint_dir.join(direction.test_dir_name()),
            conf_dir: checkpoint_dir.join("conf"),
            checkpoint_dir,
        }
    }

    /// All directories, checkpoint root first.
    #[must_use]
    pub fn all(&self) -> [&Path; 4] {
        [
            &self.checkpoint_dir,
            &self.sample_dir,
            &self.test_dir,
            &self.conf_dir,
        ]
    }

    /// Create every directory that does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    pub fn create(&self) -> Result<()> {
        self.all().into_iter().try_for_each(ensure_directory)
    }
}
