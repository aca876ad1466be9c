// src/config.rs

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    env, fs,
    ops::RangeInclusive,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::{
    adapt::Target,
    error::{MigrationError, Result},
    extract::DEFAULT_HEADER_ROWS,
    labels::{default_corrections, FlowLabels, LabelNormalizer},
};

pub const CONFIG_ENV: &str = "COUNTYFLOWS_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "countyflows.yaml";

/// Run configuration. Every field has a default, so a YAML file only needs
/// the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Zipped two-year-span workbooks (earliest era).
    pub legacy_a_dir: PathBuf,
    /// Zipped single-year workbooks (middle era).
    pub legacy_b_dir: PathBuf,
    /// Header-keyed CSV files (latest era).
    pub flat_dir: PathBuf,
    pub records_path: PathBuf,
    pub rates_path: PathBuf,
    pub target: Target,
    pub first_year: u32,
    pub last_year: u32,
    pub header_rows: usize,
    /// WHATWG encoding label for the flat files.
    pub encoding: String,
    pub flow_labels: FlowLabels,
    /// Replaces the built-in correction table when set.
    pub label_corrections: Option<HashMap<String, String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            legacy_a_dir: PathBuf::from("data/format1"),
            legacy_b_dir: PathBuf::from("data/format2"),
            flat_dir: PathBuf::from("data/format3"),
            records_path: PathBuf::from("output/all_years.csv"),
            rates_path: PathBuf::from("output/rates.csv"),
            target: Target::default(),
            first_year: 1996,
            last_year: 2016,
            header_rows: DEFAULT_HEADER_ROWS,
            encoding: "latin1".into(),
            flow_labels: FlowLabels::default(),
            label_corrections: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| MigrationError::io(path, e))?;
        let config: Config = serde_yaml::from_str(&text).map_err(|e| MigrationError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate(path)?;
        Ok(config)
    }

    /// Explicit path, then `$COUNTYFLOWS_CONFIG`, then `./countyflows.yaml`
    /// if it exists, then the built-in defaults.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self> {
        let path = explicit
            .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from))
            .or_else(|| {
                let p = PathBuf::from(DEFAULT_CONFIG_FILE);
                p.is_file().then_some(p)
            });

        match path {
            Some(p) => {
                info!(path = %p.display(), "loading config");
                Config::load(&p)
            }
            None => {
                info!("no config file; using defaults");
                Ok(Config::default())
            }
        }
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.first_year > self.last_year {
            return Err(MigrationError::Config {
                path: path.to_path_buf(),
                reason: format!(
                    "first_year {} is after last_year {}",
                    self.first_year, self.last_year
                ),
            });
        }
        self.text_encoding().map_err(|e| MigrationError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    pub fn text_encoding(&self) -> Result<&'static Encoding> {
        Encoding::for_label(self.encoding.as_bytes()).ok_or_else(|| {
            MigrationError::UnknownEncoding {
                label: self.encoding.clone(),
            }
        })
    }

    pub fn normalizer(&self) -> LabelNormalizer {
        let corrections = self
            .label_corrections
            .clone()
            .unwrap_or_else(default_corrections);
        LabelNormalizer::new(corrections, self.flow_labels.clone())
    }

    pub fn years(&self) -> RangeInclusive<u32> {
        self.first_year..=self.last_year
    }
}
