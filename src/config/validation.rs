// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use validator::Validate;

use super::core::AppConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate_app_config(config: &AppConfig) -> Result<()> {
        config.validate()
            .context("Configuration validation failed")?;

        Self::validate_observability_config(config)?;

        Ok(())
    }

    fn validate_observability_config(config: &AppConfig) -> Result<()> {
        let level = config.observability.log_level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level '{}', expected one of {:?}",
                config.observability.log_level,
                LOG_LEVELS
            ));
        }

        Ok(())
    }
}
