use std::path::Path;

use serde::{Deserialize, Serialize};

/// Configuration for a circulation data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// How long a loan runs before it is overdue, in days.
    loan_period_days: i64,

    /// The zero-pad width of numeric book ids.
    ///
    /// For example, `BK-001` (3 digits) or `BK-0001` (4 digits).
    digits: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            loan_period_days: default_loan_period_days(),
            digits: default_digits(),
        }
    }
}

/// Errors raised loading or saving a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    Read(#[source] std::io::Error),

    /// The config file held invalid TOML.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The config file could not be written.
    #[error("failed to write config file: {0}")]
    Write(#[source] std::io::Error),
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        Ok(toml::from_str(&content)?)
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized or the
    /// file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(ConfigError::Write)
    }

    /// The loan period applied to approved issues, in days.
    #[must_use]
    pub const fn loan_period_days(&self) -> i64 {
        self.loan_period_days
    }

    /// The zero-pad width for numeric book ids.
    #[must_use]
    pub const fn digits(&self) -> usize {
        self.digits
    }

    /// Sets the loan period in days.
    pub const fn set_loan_period_days(&mut self, days: i64) {
        self.loan_period_days = days;
    }
}

const fn default_loan_period_days() -> i64 {
    7
}

const fn default_digits() -> usize {
    3
}

/// The serialized versions of the configuration.
/// This allows the file format and the domain type to evolve independently
/// without breaking existing data directories.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_loan_period_days")]
        loan_period_days: i64,

        #[serde(default = "default_digits")]
        digits: usize,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                loan_period_days,
                digits,
            } => Self {
                loan_period_days,
                digits,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            loan_period_days: config.loan_period_days,
            digits: config.digits,
        }
    }
}
