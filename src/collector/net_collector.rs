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

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;

use log::debug;

use public::{
    bytes::read_u32_le,
    counter::{Counter, CounterType, CounterValue, RefCountable},
    enums::{MessageType, PacketType, SocketCategory},
};

use super::formatter::pair_to_record;
use super::log_record::LogRecord;
use super::stats_map::StatsTable;
use crate::common::{ConnectionKey, EndpointKey, FlowStats, SocketKey};
use crate::config::{AggregationMode, ObserverConfig};
use crate::ebpf::{PacketEvent, FRAME_PREFIX_LEN};
use crate::flow_generator::{infer_message_type, infer_role};
use crate::platform::ServiceResolver;

#[derive(Debug, Default)]
pub struct CollectorCounter {
    decoded: AtomicU64,
    dropped: AtomicU64,
    ignored: AtomicU64,
    flushed: AtomicU64,
}

impl RefCountable for CollectorCounter {
    fn get_counters(&self) -> Vec<Counter> {
        vec![
            (
                "decoded",
                CounterType::Counted,
                CounterValue::Unsigned(self.decoded.swap(0, Ordering::Relaxed)),
            ),
            (
                "dropped",
                CounterType::Counted,
                CounterValue::Unsigned(self.dropped.swap(0, Ordering::Relaxed)),
            ),
            (
                "ignored",
                CounterType::Counted,
                CounterValue::Unsigned(self.ignored.swap(0, Ordering::Relaxed)),
            ),
            (
                "flushed",
                CounterType::Counted,
                CounterValue::Unsigned(self.flushed.swap(0, Ordering::Relaxed)),
            ),
        ]
    }
}

#[derive(Debug)]
enum Table {
    PerSocket(StatsTable<SocketKey>),
    Merged(StatsTable<EndpointKey>),
}

impl Table {
    fn get_or_create(&mut self, key: &ConnectionKey) -> &mut FlowStats {
        match self {
            Table::PerSocket(t) => t.get_or_create(key),
            Table::Merged(t) => t.get_or_create(key),
        }
    }

    fn get(&self, key: &ConnectionKey) -> Option<&FlowStats> {
        match self {
            Table::PerSocket(t) => t.get(key),
            Table::Merged(t) => t.get(key),
        }
    }

    fn len(&self) -> usize {
        match self {
            Table::PerSocket(t) => t.len(),
            Table::Merged(t) => t.len(),
        }
    }

    fn drain(&mut self) -> Vec<(ConnectionKey, FlowStats)> {
        match self {
            Table::PerSocket(t) => t.drain().collect(),
            Table::Merged(t) => t.drain().collect(),
        }
    }
}

/// Turns capture buffers into flow statistics and periodically into log
/// records.
///
/// One collector per capture path. The owner calls `flush` every
/// `flush_interval()`, the collector keeps no timer itself. Counters can be
/// polled from other threads through `counter()`.
#[derive(Debug)]
pub struct NetStatisticsCollector {
    table: Table,
    with_local_port: bool,
    flush_interval: Duration,
    counter: Arc<CollectorCounter>,
}

impl NetStatisticsCollector {
    pub fn new(config: &ObserverConfig) -> Self {
        let table = match config.aggregation {
            AggregationMode::PerSocket => Table::PerSocket(StatsTable::new()),
            AggregationMode::MergedByEndpoint => Table::Merged(StatsTable::new()),
        };
        Self {
            table,
            with_local_port: config.with_local_port,
            flush_interval: config.flush_interval,
            counter: Arc::new(CollectorCounter::default()),
        }
    }

    pub fn counter(&self) -> Arc<CollectorCounter> {
        self.counter.clone()
    }

    pub fn flush_interval(&self) -> Duration {
        self.flush_interval
    }

    pub fn aggregation(&self) -> AggregationMode {
        match self.table {
            Table::PerSocket(_) => AggregationMode::PerSocket,
            Table::Merged(_) => AggregationMode::MergedByEndpoint,
        }
    }

    /// Decodes one raw capture buffer and accounts it. Returns false when
    /// the buffer was dropped.
    pub fn on_buffer(&mut self, buf: &[u8]) -> bool {
        match PacketEvent::decode(buf) {
            (Some(event), _) => {
                self.counter.decoded.fetch_add(1, Ordering::Relaxed);
                self.on_event(&event);
                true
            }
            (None, _) => {
                self.counter.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Consumes the complete length prefixed frames at the front of `buf`
    /// and returns the bytes consumed. A trailing partial frame is left for
    /// the caller to complete.
    pub fn on_frames(&mut self, buf: &[u8]) -> usize {
        let mut offset = 0;
        while buf.len() - offset >= FRAME_PREFIX_LEN {
            let len = read_u32_le(&buf[offset..]) as usize;
            let end = offset + FRAME_PREFIX_LEN + len;
            if end > buf.len() {
                break;
            }
            self.on_buffer(&buf[offset + FRAME_PREFIX_LEN..end]);
            offset = end;
        }
        offset
    }

    /// Accumulates a decoded event. Only data events carry traffic, others
    /// are counted as ignored.
    pub fn on_event(&mut self, event: &PacketEvent) {
        let data = match event.data.as_ref() {
            Some(data) if event.is_data() && data.pkt_type != PacketType::None => data,
            _ => {
                self.counter.ignored.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };

        let msg_type = if data.msg_type != MessageType::None {
            data.msg_type
        } else {
            infer_message_type(data.pkt_type, &event.header)
        };
        let role = infer_role(data.pkt_type, msg_type);
        let key = ConnectionKey::from_event(&event.header, role, SocketCategory::Inet);

        let stats = self.table.get_or_create(&key);
        stats.on_packet(data.pkt_type, data.real_len as u64);
        stats.on_protocol(data.ptl_type);
    }

    /// Adds a latency sample to the flow of `key`.
    ///
    /// Capture events carry no latency, samples come from whoever pairs
    /// requests with responses (e.g. a protocol parser) and must use the key
    /// the flow was accumulated under.
    pub fn add_latency(&mut self, key: &ConnectionKey, pkt_type: PacketType, nanos: u64) {
        self.table
            .get_or_create(key)
            .add_latency(pkt_type, nanos);
    }

    pub fn get(&self, key: &ConnectionKey) -> Option<&FlowStats> {
        self.table.get(key)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Formats every accumulated flow and empties the table.
    pub fn flush(&mut self, resolver: &dyn ServiceResolver) -> Vec<LogRecord> {
        let records: Vec<LogRecord> = self
            .table
            .drain()
            .into_iter()
            .map(|(key, stats)| {
                let mut record = LogRecord::new();
                pair_to_record(&key, &stats, &mut record, self.with_local_port, resolver);
                record
            })
            .collect();
        self.counter
            .flushed
            .fetch_add(records.len() as u64, Ordering::Relaxed);
        debug!(
            "flushed {} flow records, aggregation {:?}",
            records.len(),
            self.aggregation()
        );
        records
    }
}
