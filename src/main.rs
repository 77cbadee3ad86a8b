use anyhow::{Context, Result};
use clap::Parser;
use runme::{default_input, reporting, CliOptions, RunOptions, Runbook, RunmeConfig};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::exit;

/// List or run the named shell blocks in markdown files.
#[derive(Parser)]
#[command(name = "runme", version, about)]
struct Cli {
    /// Markdown files to read (defaults to README.md)
    files: Vec<PathBuf>,

    /// Match only blocks with the specified name
    #[arg(long)]
    name: Option<String>,

    /// Match only blocks whose shell contains this string
    #[arg(long)]
    shell: Option<String>,

    /// Join all matching blocks into one run
    #[arg(long, overrides_with = "no_join")]
    join: bool,

    /// Run matching blocks one at a time, even if the config enables join
    #[arg(long, overrides_with = "join")]
    no_join: bool,

    /// Keep and display the names of any temporary files created
    #[arg(long, overrides_with = "no_keep")]
    keep: bool,

    /// Delete temporary files, even if the config enables keep
    #[arg(long, overrides_with = "keep")]
    no_keep: bool,

    /// Run the matching block(s)
    #[arg(long, overrides_with = "no_run")]
    run: bool,

    /// Only list the matching block(s), even if the config enables run
    #[arg(long, overrides_with = "run")]
    no_run: bool,

    /// Configuration file (defaults to .runme.toml when present)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    fn load_options(&self) -> Result<RunOptions> {
        let config = match &self.config {
            Some(path) => RunmeConfig::load(path)?,
            None => RunmeConfig::discover(Path::new("."))?,
        };

        let cli = CliOptions {
            name: self.name.clone(),
            shell: self.shell.clone(),
            join: toggle(self.join, self.no_join),
            keep: toggle(self.keep, self.no_keep),
            run: toggle(self.run, self.no_run),
        };

        Ok(RunOptions::merge(config, cli))
    }
}

/// `Some` only when the flag or its `--no-` form was given.
fn toggle(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let options = cli.load_options().context("Failed to load configuration")?;
    log::debug!("Options: {:?}", options);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut files = cli.files;
    if files.is_empty() {
        match default_input(Path::new(".")) {
            Some(readme) => files.push(readme),
            None => {
                reporting::report_usage(&mut out)?;
                return Ok(());
            }
        }
    }

    let runbook = Runbook::new(options);
    runbook.process_files(&files, &mut out).await?;
    out.flush()?;

    Ok(())
}
