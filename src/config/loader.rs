// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::core::AppConfig;
use super::validation::ConfigValidator;

pub struct ConfigLoader {
    config_path: PathBuf,
    format: ConfigFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigLoader {
    pub fn new<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let path = config_path.as_ref().to_path_buf();
        let format = Self::detect_format(&path)?;

        Ok(Self {
            config_path: path,
            format,
        })
    }

    pub fn with_format<P: AsRef<Path>>(config_path: P, format: ConfigFormat) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            format,
        }
    }

    fn detect_format(path: &Path) -> Result<ConfigFormat> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| anyhow::anyhow!("Could not determine config file format"))?;

        match extension {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            "json" => Ok(ConfigFormat::Json),
            _ => Err(anyhow::anyhow!("Unsupported config file format: {}", extension)),
        }
    }

    /// Read, parse, apply `TRACER_*` environment overrides and validate
    pub fn load_config(&self) -> Result<AppConfig> {
        let content = std::fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config file: {:?}", self.config_path))?;

        let mut config = self.parse(&content)?;

        apply_overrides(&mut config, |key| std::env::var(key).ok())?;

        ConfigValidator::validate_app_config(&config)?;

        Ok(config)
    }

    fn parse(&self, content: &str) -> Result<AppConfig> {
        let config = match self.format {
            ConfigFormat::Yaml => serde_yaml::from_str(content)
                .context("Failed to parse YAML config")?,
            ConfigFormat::Toml => toml::from_str(content)
                .context("Failed to parse TOML config")?,
            ConfigFormat::Json => serde_json::from_str(content)
                .context("Failed to parse JSON config")?,
        };
        Ok(config)
    }
}

/// Apply overrides from `lookup`, keyed by environment variable name
pub fn apply_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(log_level) = lookup("TRACER_LOG_LEVEL") {
        config.observability.log_level = log_level;
    }

    if let Some(capacity) = lookup("TRACER_CACHE_QUEUE_CAPACITY") {
        config.cache.queue_capacity = capacity.parse()
            .context("Invalid TRACER_CACHE_QUEUE_CAPACITY")?;
    }

    if let Some(max_bytes) = lookup("TRACER_MAX_CAPTURE_BYTES") {
        config.classifier.max_capture_bytes = max_bytes.parse()
            .context("Invalid TRACER_MAX_CAPTURE_BYTES")?;
    }

    Ok(())
}
