use crate::Result;
use crate::export::GraphFormat;
use crate::graph::DEFAULT_DROPPED_ATTRIBUTES;
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

/// The documented default configuration, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file looked up in the current directory
pub const CONFIG_FILE_NAME: &str = "gephi.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Graph file format to produce
    #[serde(default)]
    pub format: GraphFormat,

    /// Output file stem
    #[serde(default)]
    pub name: Option<String>,

    /// Whether to count lines of code with cloc
    #[serde(default = "default_true")]
    pub code_metrics: bool,

    /// Whether to look up the git checkout of each package
    #[serde(default = "default_true")]
    pub repositories: bool,

    /// The cloc executable
    #[serde(default = "default_cloc_program")]
    pub cloc_program: String,

    /// Maximum run time of cloc
    #[serde(default = "default_cloc_timeout", with = "humantime_serde")]
    pub cloc_timeout: Duration,

    /// Maximum run time of a single git query
    #[serde(default = "default_git_timeout", with = "humantime_serde")]
    pub git_timeout: Duration,

    /// Metadata keys that never become node attributes
    #[serde(default = "default_dropped_attributes")]
    pub dropped_attributes: Vec<String>,
}

const fn default_true() -> bool {
    true
}

fn default_cloc_program() -> String {
    "cloc".to_string()
}

const fn default_cloc_timeout() -> Duration {
    Duration::from_mins(10)
}

const fn default_git_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_dropped_attributes() -> Vec<String> {
    DEFAULT_DROPPED_ATTRIBUTES.iter().map(ToString::to_string).collect()
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `gephi.toml` in `base_dir` is used when it exists.
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading cargo-gephi configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(CONFIG_FILE_NAME);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
                Err(e) => return Err(e).into_app_err_with(|| format!("reading cargo-gephi configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_stem(name)?;
        }

        if self.cloc_program.trim().is_empty() {
            return Err(app_err!("cloc_program must not be empty"));
        }

        if self.cloc_timeout.is_zero() {
            return Err(app_err!("cloc_timeout must be greater than zero"));
        }

        if self.git_timeout.is_zero() {
            return Err(app_err!("git_timeout must be greater than zero"));
        }

        Ok(())
    }
}

/// Check that an output stem names a file inside the output directory.
pub fn validate_stem(name: &str) -> Result<()> {
    if name.trim().is_empty() || name.contains(['/', '\\']) {
        return Err(app_err!("name must be a non-empty file name without path separators, got '{name}'"));
    }

    Ok(())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            format: GraphFormat::default(),
            name: None,
            code_metrics: true,
            repositories: true,
            cloc_program: default_cloc_program(),
            cloc_timeout: default_cloc_timeout(),
            git_timeout: default_git_timeout(),
            dropped_attributes: default_dropped_attributes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, text: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::try_from(dir.path().join(CONFIG_FILE_NAME)).unwrap();
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_embedded_default_matches_default() {
        let config: Config = toml::from_str(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_missing_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();

        assert_eq!(Config::load(&base, None).unwrap(), Config::default());
    }

    #[test]
    fn test_load_from_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let _ = write_config(&dir, "format = \"gexf\"\ncode_metrics = false\ngit_timeout = \"5s\"\n");
        let base = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();

        let config = Config::load(&base, None).unwrap();
        assert_eq!(config.format, GraphFormat::Gexf);
        assert!(!config.code_metrics);
        assert!(config.repositories);
        assert_eq!(config.git_timeout, Duration::from_secs(5));
        assert_eq!(config.cloc_timeout, Duration::from_mins(10));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let result = Config::load(Utf8Path::new("."), Some(&Utf8PathBuf::from("/no/such/gephi.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "colour = \"blue\"\n");

        assert!(Config::load(Utf8Path::new("."), Some(&path)).is_err());
    }

    #[test]
    fn test_load_rejects_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "format = \"graphml\"\n");

        assert!(Config::load(Utf8Path::new("."), Some(&path)).is_err());
    }

    #[test]
    fn test_validate_name() {
        let config = Config {
            name: Some("out/graph".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            name: Some("  ".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            name: Some("graph".to_string()),
            ..Config::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_timeouts() {
        let config = Config {
            cloc_timeout: Duration::ZERO,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            git_timeout: Duration::ZERO,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_cloc_program() {
        let config = Config {
            cloc_program: String::new(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
