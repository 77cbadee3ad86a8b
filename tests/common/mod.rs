//! Common test utilities for integration tests
//!
//! This module contains shared test fixtures and helper functions used across
//! integration tests. These utilities are not compiled into the library.

use anyhow::Result;
use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated test fixture with automatic cleanup
///
/// Creates a temporary copy of a fixture directory so every test runs the
/// binary in its own working directory.
pub struct TestFixture {
    _dir: TempDir,
    path: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture from the default runbook directory
    pub fn new() -> Result<Self> {
        Self::new_from("tests/fixtures/runbook")
    }

    /// Create a new test fixture from a specific source directory
    pub fn new_from(source: impl AsRef<Path>) -> Result<Self> {
        let dir = TempDir::new()?;

        copy_dir_all(source.as_ref(), dir.path())?;

        Ok(Self {
            path: dir.path().to_path_buf(),
            _dir: dir,
        })
    }

    /// Create an empty working directory
    pub fn empty() -> Result<Self> {
        let dir = TempDir::new()?;
        Ok(Self {
            path: dir.path().to_path_buf(),
            _dir: dir,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a file relative to the fixture root
    pub fn write(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.path.join(name);
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// A `runme` command whose working directory is the fixture root
    pub fn runme(&self) -> Command {
        let mut cmd = Command::cargo_bin("runme").expect("runme binary");
        cmd.current_dir(&self.path).env_remove("RUST_LOG");
        cmd
    }
}

/// Recursively copy all files and directories from src to dst
fn copy_dir_all(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<()> {
    std::fs::create_dir_all(&dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let ty = entry.file_type()?;
        if ty.is_dir() {
            copy_dir_all(entry.path(), dst.as_ref().join(entry.file_name()))?;
        } else {
            std::fs::copy(entry.path(), dst.as_ref().join(entry.file_name()))?;
        }
    }
    Ok(())
}
