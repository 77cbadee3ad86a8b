use crate::error::{Result, RunmeError};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".runme.toml";

/// Defaults read from a `.runme.toml` file.
///
/// Every key is optional; command-line flags take precedence over the file.
///
/// # Example
///
/// ```toml
/// shell = "bash"
/// keep = true
/// temp_dir = "${XDG_RUNTIME_DIR}/runme"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RunmeConfig {
    /// Only match blocks with exactly this name
    pub name: Option<String>,

    /// Only match blocks whose shell contains this string
    pub shell: Option<String>,

    /// Join matching blocks into a single script per file
    pub join: bool,

    /// Keep generated scripts instead of deleting them
    pub keep: bool,

    /// Run matching blocks instead of listing them
    pub run: bool,

    /// Directory for generated scripts (supports ${VAR} expansion)
    pub temp_dir: Option<String>,
}

impl RunmeConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|e| RunmeError::Config {
            path: origin.to_path_buf(),
            reason: e.message().to_string(),
        })
    }

    /// Load configuration from an explicit path, which must exist.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| RunmeError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&text, path)
    }

    /// Load `.runme.toml` from `dir` if present, otherwise the defaults.
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            log::debug!("Loading configuration from {}", candidate.display());
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }
}

/// The options every component of a run is driven by.
///
/// Built once at start-up and passed by reference into the filter and the
/// runner; nothing reads flag state from anywhere else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub name: Option<String>,
    pub shell: Option<String>,
    pub join: bool,
    pub keep: bool,
    pub run: bool,
    pub temp_dir: Option<PathBuf>,
}

/// What was given on the command line.
///
/// `None` for a boolean means neither `--flag` nor `--no-flag` was passed,
/// leaving the configuration file's value in effect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOptions {
    pub name: Option<String>,
    pub shell: Option<String>,
    pub join: Option<bool>,
    pub keep: Option<bool>,
    pub run: Option<bool>,
}

impl RunOptions {
    /// Merge file configuration with command-line options.
    ///
    /// Anything given on the command line replaces the file's value, so
    /// `--no-run` turns off `run = true`. Empty strings count as unset.
    pub fn merge(config: RunmeConfig, cli: CliOptions) -> Self {
        Self {
            name: non_empty(cli.name).or_else(|| non_empty(config.name)),
            shell: non_empty(cli.shell).or_else(|| non_empty(config.shell)),
            join: cli.join.unwrap_or(config.join),
            keep: cli.keep.unwrap_or(config.keep),
            run: cli.run.unwrap_or(config.run),
            temp_dir: non_empty(config.temp_dir).map(|dir| PathBuf::from(expand_env_vars(&dir))),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Replaces each `${VAR}` with its value from the environment.
///
/// Unset variables and an unterminated `${` are kept literally. Substituted
/// values are not scanned again.
fn expand_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let reference = &rest[start..];

        let Some(close) = reference.find('}') else {
            result.push_str(reference);
            return result;
        };

        let var_name = &reference[2..close];
        match env::var(var_name) {
            Ok(value) => result.push_str(&value),
            Err(_) => {
                log::warn!(
                    "Environment variable '{}' not found, leaving unexpanded",
                    var_name
                );
                result.push_str(&reference[..=close]);
            }
        }
        rest = &reference[close + 1..];
    }

    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_full_config() {
        let text = r#"
name = "build"
shell = "bash"
join = true
keep = true
run = true
temp_dir = "/var/tmp/runme"
"#;
        let config = RunmeConfig::from_toml(text, Path::new(".runme.toml")).unwrap();
        assert_eq!(config.name.as_deref(), Some("build"));
        assert_eq!(config.shell.as_deref(), Some("bash"));
        assert!(config.join && config.keep && config.run);
        assert_eq!(config.temp_dir.as_deref(), Some("/var/tmp/runme"));
    }

    #[test]
    fn test_parse_empty_config_is_default() {
        let config = RunmeConfig::from_toml("", Path::new(".runme.toml")).unwrap();
        assert_eq!(config, RunmeConfig::default());
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        let err = RunmeConfig::from_toml("colour = true", Path::new("x.toml")).unwrap_err();
        assert!(matches!(err, RunmeError::Config { .. }));
        assert!(err.to_string().starts_with("invalid configuration in x.toml"));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let err = RunmeConfig::load(Path::new("no/such/runme.toml")).unwrap_err();
        assert!(matches!(err, RunmeError::Config { .. }));
    }

    #[test]
    fn test_discover_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunmeConfig::discover(dir.path()).unwrap();
        assert_eq!(config, RunmeConfig::default());
    }

    #[test]
    fn test_discover_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "shell = \"sh\"\n").unwrap();
        let config = RunmeConfig::discover(dir.path()).unwrap();
        assert_eq!(config.shell.as_deref(), Some("sh"));
    }

    #[test]
    fn test_merge_cli_overrides_file() {
        let config = RunmeConfig {
            name: Some("from-file".to_string()),
            shell: Some("bash".to_string()),
            keep: true,
            ..Default::default()
        };
        let cli = CliOptions {
            name: Some("from-cli".to_string()),
            shell: Some(String::new()),
            run: Some(true),
            ..Default::default()
        };

        let options = RunOptions::merge(config, cli);
        assert_eq!(options.name.as_deref(), Some("from-cli"));
        assert_eq!(options.shell.as_deref(), Some("bash"));
        assert!(options.keep);
        assert!(options.run);
        assert!(!options.join);
    }

    #[test]
    fn test_merge_cli_can_disable_file_flags() {
        let config = RunmeConfig {
            join: true,
            keep: true,
            run: true,
            ..Default::default()
        };
        let cli = CliOptions {
            join: Some(false),
            run: Some(false),
            ..Default::default()
        };

        let options = RunOptions::merge(config, cli);
        assert!(!options.join);
        assert!(!options.run);
        // Not mentioned on the command line, so the file wins
        assert!(options.keep);
    }

    #[test]
    #[serial]
    fn test_merge_expands_temp_dir() {
        env::set_var("RUNME_TEST_SCRATCH", "/tmp/scratch");
        let config = RunmeConfig {
            temp_dir: Some("${RUNME_TEST_SCRATCH}/runme".to_string()),
            ..Default::default()
        };
        let options = RunOptions::merge(config, CliOptions::default());
        assert_eq!(options.temp_dir, Some(PathBuf::from("/tmp/scratch/runme")));
        env::remove_var("RUNME_TEST_SCRATCH");
    }

    #[test]
    #[serial]
    fn test_expand_env_vars_without_var() {
        env::remove_var("RUNME_UNSET_VAR");
        assert_eq!(expand_env_vars("${RUNME_UNSET_VAR}/runme"), "${RUNME_UNSET_VAR}/runme");
    }

    #[test]
    #[serial]
    fn test_expand_env_vars_several_references() {
        env::set_var("RUNME_TEST_ROOT", "/srv");
        env::set_var("RUNME_TEST_USER", "ops");
        assert_eq!(
            expand_env_vars("${RUNME_TEST_ROOT}/scratch-${RUNME_TEST_USER}/${RUNME_TEST_USER}"),
            "/srv/scratch-ops/ops"
        );
        env::remove_var("RUNME_TEST_ROOT");
        env::remove_var("RUNME_TEST_USER");
    }

    #[test]
    #[serial]
    fn test_expand_env_vars_does_not_rescan_values() {
        env::set_var("RUNME_TEST_NESTED", "${HOME}");
        assert_eq!(expand_env_vars("/tmp/${RUNME_TEST_NESTED}"), "/tmp/${HOME}");
        env::remove_var("RUNME_TEST_NESTED");
    }

    #[test]
    fn test_expand_env_vars_leaves_other_dollars() {
        assert_eq!(expand_env_vars("/var/tmp"), "/var/tmp");
        assert_eq!(expand_env_vars("$HOME/runme"), "$HOME/runme");
        assert_eq!(expand_env_vars("/tmp/${UNCLOSED"), "/tmp/${UNCLOSED");
        assert_eq!(expand_env_vars("/tmp/${}"), "/tmp/${}");
    }
}
