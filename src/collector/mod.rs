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

mod formatter;
mod log_record;
mod net_collector;
mod stats_map;

pub use formatter::{key_to_record, pair_to_record, stats_to_record};
pub use log_record::{LogContent, LogRecord};
pub use net_collector::{CollectorCounter, NetStatisticsCollector};
pub use stats_map::StatsTable;
