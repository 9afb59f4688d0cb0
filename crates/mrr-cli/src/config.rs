// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use log::LevelFilter;
use mrr_app::DEFAULT_VALUATION_MULTIPLIER;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_VERSION: i64 = 1;
pub const CONFIG_PATH_ENV: &str = "MRR_CONFIG_PATH";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub report: Report,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            report: Report::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Report {
    pub multiplier: Option<f64>,
}

impl Default for Report {
    fn default() -> Self {
        Self {
            multiplier: Some(DEFAULT_VALUATION_MULTIPLIER),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub path: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            path: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;

        let app_dir = config_root.join(mrr_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version. Add `version = 1` and put values under [storage], [report], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1. Run `mrr config example` for a template",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(db_path) = &self.storage.db_path {
            mrr_db::validate_db_path(db_path)?;
        }

        if let Some(multiplier) = self.report.multiplier
            && (!multiplier.is_finite() || multiplier <= 0.0)
        {
            bail!(
                "report.multiplier in {} must be positive, got {}",
                path.display(),
                multiplier
            );
        }

        if let Some(level) = &self.log.level {
            parse_level(level).with_context(|| format!("invalid [log] level in {}", path.display()))?;
        }

        if let Some(log_path) = &self.log.path
            && log_path.trim().is_empty()
        {
            bail!("log.path in {} must not be empty", path.display());
        }

        Ok(())
    }

    /// `[storage].db_path` when set, else the env override or platform default.
    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => mrr_db::default_db_path(),
        }
    }

    pub fn multiplier(&self) -> f64 {
        self.report
            .multiplier
            .unwrap_or(DEFAULT_VALUATION_MULTIPLIER)
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log
            .level
            .as_deref()
            .and_then(|level| parse_level(level).ok())
            .unwrap_or(LevelFilter::Info)
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.log.path {
            return Ok(PathBuf::from(path));
        }

        let data_root = dirs::data_local_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set [log].path in the config file")
        })?;
        let app_dir = data_root.join(mrr_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create log directory {}", app_dir.display()))?;
        Ok(app_dir.join("mrr.log"))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# mrr config\n# Place this file at: {}\n\nversion = 1\n\n[storage]\n# Optional. Default is the platform data dir (for example ~/.local/share/mrr/mrr.db)\n# db_path = \"/absolute/path/to/mrr.db\"\n\n[report]\n# ARR multiple used for valuation\nmultiplier = {:.1}\n\n[log]\n# off, error, warn, info, debug, or trace\nlevel = \"{}\"\n# path = \"/absolute/path/to/mrr.log\"\n",
            path.display(),
            DEFAULT_VALUATION_MULTIPLIER,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_level(raw: &str) -> Result<LevelFilter> {
    raw.parse::<LevelFilter>().map_err(|_| {
        anyhow!("unknown log level {raw:?}; use one of: off, error, warn, info, debug, trace")
    })
}
