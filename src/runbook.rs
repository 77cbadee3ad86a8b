use crate::config::RunOptions;
use crate::extractor::{read_code_blocks, CodeBlock};
use crate::filter::BlockFilter;
use crate::reporting;
use crate::runner::{join_blocks, ScriptRunner};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// File used when no inputs are given on the command line.
pub const DEFAULT_INPUT: &str = "README.md";

/// Counts gathered over one invocation, for the closing log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files: usize,
    pub unreadable: usize,
    pub listed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Drives one invocation: read each file, filter its blocks, then list or
/// run them.
///
/// # Overview
///
/// Files are handled one at a time in the order given, and blocks one at a
/// time in document order. Nothing here aborts the pass: an unreadable file
/// is reported and skipped, a failing block is reported and the next one
/// runs. In join mode every matching block of a file becomes one script, and
/// that script is the only thing run for the file.
pub struct Runbook {
    options: RunOptions,
    filter: BlockFilter,
    runner: ScriptRunner,
}

impl Runbook {
    pub fn new(options: RunOptions) -> Self {
        let filter = BlockFilter::from_options(&options);
        let runner = ScriptRunner::from_options(&options);
        Self {
            options,
            filter,
            runner,
        }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Processes every file in order.
    ///
    /// # Errors
    ///
    /// Only fails if writing to `out` fails.
    pub async fn process_files<W: Write>(
        &self,
        files: &[PathBuf],
        out: &mut W,
    ) -> io::Result<RunSummary> {
        let mut summary = RunSummary::default();

        for file in files {
            self.process_file(file, out, &mut summary).await?;
        }

        log::info!(
            "Processed {} file(s): {} listed, {} succeeded, {} failed, {} unreadable",
            summary.files,
            summary.listed,
            summary.succeeded,
            summary.failed,
            summary.unreadable
        );
        Ok(summary)
    }

    /// Processes the blocks of a single file
    pub async fn process_file<W: Write>(
        &self,
        path: &Path,
        out: &mut W,
        summary: &mut RunSummary,
    ) -> io::Result<()> {
        log::info!("Processing {}", path.display());
        summary.files += 1;

        let blocks = match read_code_blocks(path).await {
            Ok(blocks) => blocks,
            Err(e) => {
                summary.unreadable += 1;
                return reporting::report_read_error(out, &e);
            }
        };

        let blocks = self.filter.apply(blocks);

        if !self.options.run {
            for block in &blocks {
                reporting::report_block(out, block)?;
                summary.listed += 1;
            }
            return Ok(());
        }

        if self.options.join {
            if let Some(joined) = join_blocks(&blocks) {
                log::info!(
                    "Running {} joined block(s) as {} ({})",
                    blocks.len(),
                    joined.name(),
                    joined.shell()
                );
                self.run_block(&joined, out, summary).await?;
            }
            return Ok(());
        }

        for block in &blocks {
            log::info!("Running block {} ({})", block.name(), block.shell());
            self.run_block(block, out, summary).await?;
        }

        Ok(())
    }

    async fn run_block<W: Write>(
        &self,
        block: &CodeBlock,
        out: &mut W,
        summary: &mut RunSummary,
    ) -> io::Result<()> {
        let script = match self.runner.materialize(block) {
            Ok(script) => script,
            Err(e) => {
                summary.failed += 1;
                return reporting::report_run_error(out, &e);
            }
        };

        if script.is_kept() {
            reporting::report_kept_script(out, script.path())?;
        }

        match script.execute().await {
            Ok(stdout) => {
                summary.succeeded += 1;
                reporting::report_output(out, &stdout)
            }
            Err(e) => {
                summary.failed += 1;
                reporting::report_run_error(out, &e)
            }
        }
    }
}

/// Picks `README.md` from `dir` when it exists as a regular file.
pub fn default_input(dir: &Path) -> Option<PathBuf> {
    let candidate = dir.join(DEFAULT_INPUT);
    candidate.is_file().then_some(candidate)
}
