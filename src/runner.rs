use crate::config::RunOptions;
use crate::error::{Result, RunmeError};
use crate::extractor::CodeBlock;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempPath;
use tokio::process::Command;

/// Shell used to launch generated scripts.
const LAUNCHER: &str = "/bin/sh";

/// Prefix of every generated script's file name.
const SCRIPT_PREFIX: &str = "rm";

/// Turns code blocks into executable scripts and runs them.
#[derive(Debug, Clone, Default)]
pub struct ScriptRunner {
    keep: bool,
    temp_dir: Option<PathBuf>,
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    /// Everything the script wrote to stdout
    pub stdout: Vec<u8>,
    /// Where the script was left, when it was kept
    pub kept: Option<PathBuf>,
}

enum ScriptPath {
    Scoped(TempPath),
    Kept(PathBuf),
}

/// A block written to disk as an executable script.
///
/// Unless the runner was asked to keep scripts, the file is removed when the
/// `Script` is dropped, whichever way execution ended.
pub struct Script {
    path: ScriptPath,
    shell: String,
    name: String,
}

impl Script {
    pub fn path(&self) -> &Path {
        match &self.path {
            ScriptPath::Scoped(temp) => temp,
            ScriptPath::Kept(path) => path,
        }
    }

    pub fn is_kept(&self) -> bool {
        matches!(self.path, ScriptPath::Kept(_))
    }

    /// Runs the script through `/bin/sh -c <path>` and waits for it to exit.
    ///
    /// Stdout is captured; stderr goes straight to the terminal.
    ///
    /// # Errors
    ///
    /// Returns [`RunmeError::Execution`] if the launcher cannot be spawned or
    /// the script exits unsuccessfully.
    pub async fn execute(&self) -> Result<Vec<u8>> {
        log::debug!("Executing {} via {}", self.path().display(), LAUNCHER);

        let child = Command::new(LAUNCHER)
            .arg("-c")
            .arg(self.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| self.execution_error(e.to_string()))?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| self.execution_error(e.to_string()))?;

        if !output.status.success() {
            return Err(self.execution_error(output.status.to_string()));
        }

        log::debug!("{} wrote {} byte(s)", self.name, output.stdout.len());
        Ok(output.stdout)
    }

    fn execution_error(&self, reason: String) -> RunmeError {
        RunmeError::Execution {
            shell: self.shell.clone(),
            name: self.name.clone(),
            reason,
        }
    }
}

impl ScriptRunner {
    pub fn new(keep: bool) -> Self {
        Self {
            keep,
            temp_dir: None,
        }
    }

    pub fn from_options(options: &RunOptions) -> Self {
        let runner = Self::new(options.keep);
        match &options.temp_dir {
            Some(dir) => runner.with_temp_dir(dir),
            None => runner,
        }
    }

    /// Write scripts into `dir` instead of the system temporary directory.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    fn scratch_dir(&self) -> Result<PathBuf> {
        match &self.temp_dir {
            Some(dir) => {
                fs::create_dir_all(dir).map_err(RunmeError::TempFile)?;
                Ok(dir.clone())
            }
            None => Ok(std::env::temp_dir()),
        }
    }

    /// Writes `#!<shell>` followed by the block's content to a fresh,
    /// uniquely named executable file.
    ///
    /// # Errors
    ///
    /// Returns [`RunmeError::TempFile`] if the file cannot be created,
    /// written or made executable.
    pub fn materialize(&self, block: &CodeBlock) -> Result<Script> {
        let dir = self.scratch_dir()?;
        let mut file = tempfile::Builder::new()
            .prefix(SCRIPT_PREFIX)
            .tempfile_in(&dir)
            .map_err(RunmeError::TempFile)?;

        write!(file, "#!{}\n{}", block.shell(), block.content()).map_err(RunmeError::TempFile)?;
        file.flush().map_err(RunmeError::TempFile)?;
        make_executable(file.path())?;

        // Release the write handle; executing a file still open for
        // writing fails with ETXTBSY.
        let temp_path = file.into_temp_path();

        let path = if self.keep {
            let kept = temp_path.keep().map_err(|e| RunmeError::TempFile(e.error))?;
            ScriptPath::Kept(kept)
        } else {
            ScriptPath::Scoped(temp_path)
        };

        let script = Script {
            path,
            shell: block.shell().to_string(),
            name: block.name().to_string(),
        };
        log::debug!("Wrote {} block to {}", script.name, script.path().display());

        Ok(script)
    }

    /// Materializes and executes a block in one step.
    pub async fn run(&self, block: &CodeBlock) -> Result<RunOutput> {
        let script = self.materialize(block)?;
        let stdout = script.execute().await?;
        let kept = script.is_kept().then(|| script.path().to_path_buf());

        Ok(RunOutput { stdout, kept })
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(RunmeError::TempFile)
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Combines blocks into one script body, tagged with the first block's shell
/// and name.
///
/// Each block's content is preceded by a newline, so joining `a` and `b`
/// gives `"\na\nb"`. Returns `None` when there is nothing to join.
pub fn join_blocks(blocks: &[CodeBlock]) -> Option<CodeBlock> {
    let first = blocks.first()?;
    let content = blocks.iter().fold(String::new(), |mut acc, block| {
        acc.push('\n');
        acc.push_str(block.content());
        acc
    });

    Some(CodeBlock::new(first.shell(), first.name(), content))
}
