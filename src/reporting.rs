//! User-visible output.
//!
//! Everything here goes to the writer handed in by the caller (stdout in the
//! binary), so listings, script output and error lines interleave in the
//! order they happen.

use crate::error::RunmeError;
use crate::extractor::CodeBlock;
use std::io::{self, Write};
use std::path::Path;

/// Printed when no input files are given and there is no README.md.
pub const USAGE: &str = "Usage: runme [args] file1.md file2.md ..";

/// Printed in place of the output of a script that wrote nothing.
pub const NO_OUTPUT: &str = "[no output]";

/// Shows a block's header and content, used when not running.
pub fn report_block<W: Write>(out: &mut W, block: &CodeBlock) -> io::Result<()> {
    writeln!(out, "Shell:{}  Name:{}", block.shell(), block.name())?;
    writeln!(out, "{}", block.content())
}

/// Relays a script's stdout verbatim, or the no-output marker.
pub fn report_output<W: Write>(out: &mut W, stdout: &[u8]) -> io::Result<()> {
    if stdout.is_empty() {
        writeln!(out, "{}", NO_OUTPUT)
    } else {
        out.write_all(stdout)
    }
}

pub fn report_kept_script<W: Write>(out: &mut W, path: &Path) -> io::Result<()> {
    writeln!(out, "wrote to {}", path.display())
}

pub fn report_run_error<W: Write>(out: &mut W, error: &RunmeError) -> io::Result<()> {
    log::debug!("Run failed: {:?}", error);
    writeln!(out, "error running block:{}", error)
}

pub fn report_read_error<W: Write>(out: &mut W, error: &RunmeError) -> io::Result<()> {
    log::debug!("Read failed: {:?}", error);
    writeln!(out, "{}", error)
}

pub fn report_usage<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", USAGE)
}
