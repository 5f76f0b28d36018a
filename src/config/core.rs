// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::event_cache::DEFAULT_QUEUE_CAPACITY;
use crate::subscribers::DEFAULT_CHANNEL_CAPACITY;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[serde(default)]
    #[validate(nested)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    #[validate(nested)]
    pub cache: CacheConfig,

    #[serde(default)]
    #[validate(nested)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ClassifierConfig {
    /// Markup captures larger than this are rejected as unparseable
    #[validate(range(min = 1))]
    #[serde(default = "default_max_capture_bytes")]
    pub max_capture_bytes: usize,

    #[validate(range(min = 1))]
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CacheConfig {
    /// Requests queued for the cache worker before callers block
    #[validate(range(min = 1, max = 10000))]
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NotificationConfig {
    #[validate(range(min = 1, max = 100000))]
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub json_logs: bool,
}

fn default_max_capture_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_max_nodes() -> usize {
    500_000
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_capture_bytes: default_max_capture_bytes(),
            max_nodes: default_max_nodes(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}
