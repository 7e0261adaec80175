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

//! Turns socket level packet events delivered by an eBPF capture program
//! into per flow statistics and structured log records.

pub mod collector;
pub mod common;
pub mod config;
pub mod ebpf;
pub mod error;
pub mod flow_generator;
pub mod platform;
pub mod utils;

pub use collector::{LogRecord, NetStatisticsCollector, StatsTable};
pub use config::ObserverConfig;
pub use error::{Error, Result};
