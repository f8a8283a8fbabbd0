use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Settings file looked up in the working directory when `--config` is absent
pub const CONFIG_FILE: &str = "cobertura-report.toml";

const DEFAULT_WARNING_THRESHOLD: f64 = 90.0;

/// Options for rendering the coverage table
#[derive(Debug, Clone, PartialEq)]
pub struct FormatterConfig {
    /// Wrap each row in a healthy/warning color
    pub colorize: bool,
    /// Rows with line or branch coverage strictly below this are warnings
    pub warning_threshold: Option<f64>,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            colorize: true,
            warning_threshold: Some(DEFAULT_WARNING_THRESHOLD),
        }
    }
}

impl FormatterConfig {
    pub fn no_color() -> Self {
        Self {
            colorize: false,
            warning_threshold: None,
        }
    }
}

/// Output format of the report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub report: ReportSettings,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ReportSettings {
    #[serde(default)]
    pub colorize: Option<bool>,
    #[serde(default)]
    pub warning_threshold: Option<f64>,
    /// Only report classes from this Cobertura package
    #[serde(default)]
    pub package: Option<String>,
    /// Minimum overall line coverage; lower fails the run
    #[serde(default)]
    pub fail_under: Option<f64>,
    #[serde(default)]
    pub format: Option<ReportFormat>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load `explicit` if given, else the default settings file if present
    pub fn load_or_default(explicit: Option<&Path>, base_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let default_path = base_dir.join(CONFIG_FILE);
        if default_path.is_file() {
            Self::load(&default_path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        let thresholds = [
            ("warning_threshold", self.report.warning_threshold),
            ("fail_under", self.report.fail_under),
        ];

        for (key, value) in thresholds {
            if let Some(value) = value {
                if !(0.0..=100.0).contains(&value) {
                    anyhow::bail!("{} must be between 0 and 100, got {}", key, value);
                }
            }
        }

        Ok(())
    }

    /// Formatter options from the file, falling back to the defaults
    pub fn formatter_config(&self) -> FormatterConfig {
        let defaults = FormatterConfig::default();
        FormatterConfig {
            colorize: self.report.colorize.unwrap_or(defaults.colorize),
            warning_threshold: self
                .report
                .warning_threshold
                .or(defaults.warning_threshold),
        }
    }
}
