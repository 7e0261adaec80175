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

use flexi_logger::{colored_opt_format, Age, Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming};

use crate::config::LogConfig;
use crate::error::Result;

/// Starts the process wide logger. `RUST_LOG` takes precedence over
/// `config.level`. Keep the returned handle alive for as long as logs are
/// wanted.
pub fn init_logger(config: &LogConfig) -> Result<LoggerHandle> {
    let logger = Logger::try_with_env_or_str(&config.level)?.format(colored_opt_format);
    let logger = match config.file.as_ref() {
        Some(file) => {
            if let Some(dir) = Path::new(file).parent() {
                if !dir.as_os_str().is_empty() && !dir.exists() {
                    fs::create_dir_all(dir)?;
                }
            }
            logger
                .log_to_file(FileSpec::try_from(file)?)
                .rotate(
                    Criterion::Age(Age::Day),
                    Naming::Timestamps,
                    Cleanup::KeepLogFiles(config.retention.max(1) as usize),
                )
                .append()
        }
        None => logger.log_to_stderr(),
    };
    Ok(logger.start()?)
}
