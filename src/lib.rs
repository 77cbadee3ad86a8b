//! runme library
//!
//! Lists, filters and runs the named shell blocks embedded in markdown files.
//! A block is a fenced code block whose info string is a shell followed by a
//! name:
//!
//! ````markdown
//! ```bash "build"
//! cargo build --release
//! ```
//! ````
//!
//! The primary interface is the `runme` binary, but the pieces can be used
//! programmatically as well.
//!
//! ## Public API
//!
//! - [`extract_code_blocks`] / [`read_code_blocks`] - find named blocks in markdown
//! - [`BlockFilter`] - select blocks by exact name or shell substring
//! - [`ScriptRunner`] - write a block to an executable script and run it
//! - [`Runbook`] - the per-file list/run loop used by the binary
//! - [`RunOptions`] / [`RunmeConfig`] - options from flags and `.runme.toml`

mod config;
mod error;
mod extractor;
mod filter;
pub mod reporting;
mod runbook;
mod runner;

pub use config::{CliOptions, RunOptions, RunmeConfig, DEFAULT_CONFIG_FILE};
pub use error::{Result, RunmeError};
pub use extractor::{extract_code_blocks, parse_info_string, read_code_blocks, CodeBlock};
pub use filter::BlockFilter;
pub use runbook::{default_input, RunSummary, Runbook, DEFAULT_INPUT};
pub use runner::{join_blocks, RunOutput, Script, ScriptRunner};
