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

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("buffer too short: {0} bytes, needs at least {1}")]
    BufferTooShort(usize, usize),
    #[error("frame length {0} does not match {1} available bytes")]
    FrameLengthMismatch(usize, usize),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    Logger(#[from] flexi_logger::FlexiLoggerError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
