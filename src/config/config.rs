/*
 * Copyright (c) 2024 Yunshan Networks
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::fs;
use std::path::Path;
use std::time::Duration;

use log::LevelFilter;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("yaml config invalid: {0}")]
    YamlConfigInvalid(String),
}

/// How flow counters are keyed in the statistics table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AggregationMode {
    // (pid, sock_hash)
    PerSocket,
    // (pid, remote address, remote port, role)
    #[default]
    MergedByEndpoint,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LogConfig {
    pub level: String,
    // log to stderr when absent
    pub file: Option<String>,
    // days of rotated files kept
    pub retention: u32,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            file: None,
            retention: 7,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ObserverConfig {
    pub aggregation: AggregationMode,
    pub with_local_port: bool,
    // schedule for NetStatisticsCollector::flush, driven by the owner
    #[serde(with = "humantime_serde")]
    pub flush_interval: Duration,
    pub log: LogConfig,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            aggregation: AggregationMode::default(),
            with_local_port: false,
            flush_interval: Duration::from_secs(15),
            log: LogConfig::default(),
        }
    }
}

impl ObserverConfig {
    pub fn load_from_file<T: AsRef<Path>>(path: T) -> Result<Self, ConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::YamlConfigInvalid(e.to_string()))?;
        Self::load(&contents)
    }

    pub fn load<C: AsRef<str>>(contents: C) -> Result<Self, ConfigError> {
        let contents = contents.as_ref();
        if contents.trim().is_empty() {
            // parsing empty string leads to EOF error
            return Ok(Self::default());
        }
        let cfg: Self = serde_yaml::from_str(contents)
            .map_err(|e| ConfigError::YamlConfigInvalid(e.to_string()))?;

        if cfg.log.level.parse::<LevelFilter>().is_err() {
            return Err(ConfigError::YamlConfigInvalid(format!(
                "log level {} invalid",
                cfg.log.level
            )));
        }
        if cfg.flush_interval.is_zero() {
            return Err(ConfigError::YamlConfigInvalid(
                "flush-interval must not be zero".to_owned(),
            ));
        }
        Ok(cfg)
    }
}
