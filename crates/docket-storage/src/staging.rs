//! The staged working copy of the durable database file.
//!
//! Every open handle works against a private copy in a temporary directory;
//! the durable file is only touched by [`StagedFile::commit`]. Dropping the
//! handle (and with it the [`tempfile::TempDir`]) discards all staged
//! changes, which is the documented way to roll back.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::error::{Result, StorageError};

#[derive(Debug)]
pub(crate) struct StagedFile {
    durable: PathBuf,
    dir: TempDir,
}

const WORKING_NAME: &str = "staged.db";

impl StagedFile {
    /// Copies the durable file (when it exists) into a fresh private
    /// directory.
    pub fn stage(durable: &Path) -> Result<Self> {
        if durable.file_name().is_none() {
            return Err(StorageError::invalid_argument(format!(
                "database path {} has no file name",
                durable.display()
            )));
        }
        let dir = tempfile::tempdir()?;
        let staged = Self {
            durable: durable.to_path_buf(),
            dir,
        };
        if durable.exists() {
            fs::copy(durable, staged.working_path())?;
            debug!(durable = %durable.display(), "staged existing database");
        }
        Ok(staged)
    }

    /// Path of the working copy inside the private directory.
    pub fn working_path(&self) -> PathBuf {
        self.dir.path().join(WORKING_NAME)
    }

    pub fn durable_path(&self) -> &Path {
        &self.durable
    }

    /// Promotes the working copy over the durable file.
    ///
    /// The copy lands in a sibling file first and is then renamed into
    /// place, so a crash mid-copy leaves the durable file at its pre-commit
    /// state.
    pub fn commit(&self) -> Result<()> {
        let file_name = self
            .durable
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| WORKING_NAME.to_owned());
        let sibling = self.durable.with_file_name(format!("{file_name}.staged"));
        fs::copy(self.working_path(), &sibling)?;
        fs::rename(&sibling, &self.durable)?;
        Ok(())
    }
}
