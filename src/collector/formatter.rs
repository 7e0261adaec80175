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

// Field names below are matched on by downstream consumers, do not rename.

use serde::Serialize;

use public::enums::PacketRoleType;

use super::log_record::LogRecord;
use crate::common::{ConnectionKey, FlowStats};
use crate::platform::{ServiceCategory, ServiceResolver};

// Serialized compact in field order, without trailing newline. Consumers
// parse it as JSON and must not depend on key order.
#[derive(Serialize)]
struct RemoteInfo<'a> {
    remote_ip: &'a str,
    remote_port: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    remote_type: Option<ServiceCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remote_host: Option<String>,
}

/// Appends `remote_info`, `local_port` (only if `with_local_port`),
/// `socket_type` and `role` for `key`.
///
/// Client side flows are enriched through `resolver`; a miss reports the
/// remote as a generic server without host.
pub fn key_to_record(
    key: &ConnectionKey,
    record: &mut LogRecord,
    with_local_port: bool,
    resolver: &dyn ServiceResolver,
) {
    let remote_ip = key.dst_addr.to_string();
    let mut info = RemoteInfo {
        remote_ip: &remote_ip,
        // remote port of a server side flow is the peer's ephemeral port
        remote_port: if key.role == PacketRoleType::Server {
            "0".to_owned()
        } else {
            key.dst_port.to_string()
        },
        remote_type: None,
        remote_host: None,
    };
    if key.role == PacketRoleType::Client {
        match resolver.resolve(key.pid, &remote_ip) {
            Some(meta) => {
                info.remote_type = Some(meta.category);
                if !meta.host.is_empty() {
                    info.remote_host = Some(meta.host);
                }
            }
            None => info.remote_type = Some(ServiceCategory::Server),
        }
    }
    record.add(
        "remote_info",
        serde_json::to_string(&info).unwrap_or_default(),
    );

    // ebpf data has no local port
    if with_local_port {
        record.add("local_port", key.src_port.to_string());
    }
    record.add("socket_type", key.sock_category.to_string());
    record.add("role", key.role.to_string());
}

pub fn stats_to_record(stats: &FlowStats, record: &mut LogRecord) {
    record.add("send_bytes", stats.send_bytes.to_string());
    record.add("recv_bytes", stats.recv_bytes.to_string());
    record.add("send_packets", stats.send_packets.to_string());
    record.add("recv_packets", stats.recv_packets.to_string());
    record.add("send_total_latency", stats.send_total_latency.to_string());
    record.add("recv_total_latency", stats.recv_total_latency.to_string());
}

pub fn pair_to_record(
    key: &ConnectionKey,
    stats: &FlowStats,
    record: &mut LogRecord,
    with_local_port: bool,
    resolver: &dyn ServiceResolver,
) {
    key_to_record(key, record, with_local_port, resolver);
    stats_to_record(stats, record);
}
