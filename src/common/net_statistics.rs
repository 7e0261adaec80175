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

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use public::enums::{PacketRoleType, PacketType, ProtocolType, SocketCategory};

use super::sock_addr::SockAddress;
use crate::ebpf::PacketEventHeader;
use crate::utils::hasher::{jenkins64, xxh32};

/// Identity of a directional flow, always seen from the local side:
/// `src_*` is the observed process, `dst_*` the remote peer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionKey {
    pub pid: u32,
    pub sock_hash: u32,
    pub src_addr: SockAddress,
    pub src_port: u16,
    pub dst_addr: SockAddress,
    pub dst_port: u16,
    pub role: PacketRoleType,
    pub sock_category: SocketCategory,
}

impl ConnectionKey {
    // socket level headers are already local oriented, whatever the direction
    pub fn from_event(
        header: &PacketEventHeader,
        role: PacketRoleType,
        sock_category: SocketCategory,
    ) -> Self {
        ConnectionKey {
            pid: header.pid,
            sock_hash: header.sock_hash,
            src_addr: header.src_addr,
            src_port: header.src_port,
            dst_addr: header.dst_addr,
            dst_port: header.dst_port,
            role,
            sock_category,
        }
    }
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pid:{} sock_hash:{} {}:{} > {}:{} role:{} socket_type:{}",
            self.pid,
            self.sock_hash,
            self.src_addr,
            self.src_port,
            self.dst_addr,
            self.dst_port,
            self.role,
            self.sock_category
        )
    }
}

/// Hash and equality strategy of a statistics table.
///
/// Implementors wrap a `ConnectionKey`; their `Hash`/`Eq` decide which keys
/// share one accumulator. Equal keys must have equal `strategy_hash`.
pub trait AggregationKey: Hash + Eq + Clone {
    fn new(key: ConnectionKey) -> Self;
    fn key(&self) -> &ConnectionKey;
    fn strategy_hash(&self) -> u64;
}

/// One accumulator per socket: identity is (pid, sock_hash).
#[derive(Debug, Clone, Copy)]
pub struct SocketKey(ConnectionKey);

impl AggregationKey for SocketKey {
    fn new(key: ConnectionKey) -> Self {
        Self(key)
    }

    fn key(&self) -> &ConnectionKey {
        &self.0
    }

    fn strategy_hash(&self) -> u64 {
        jenkins64((self.0.pid as u64) << 32 | self.0.sock_hash as u64)
    }
}

impl PartialEq for SocketKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.pid == other.0.pid && self.0.sock_hash == other.0.sock_hash
    }
}

impl Eq for SocketKey {}

impl Hash for SocketKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.strategy_hash())
    }
}

/// One accumulator per (process, remote endpoint, role): all sockets a
/// process opens to the same remote service are merged. Source address,
/// source port and sock_hash do not take part.
#[derive(Debug, Clone, Copy)]
pub struct EndpointKey(ConnectionKey);

impl AggregationKey for EndpointKey {
    fn new(key: ConnectionKey) -> Self {
        Self(key)
    }

    fn key(&self) -> &ConnectionKey {
        &self.0
    }

    // folded in a fixed order: remote address, remote port, pid
    fn strategy_hash(&self) -> u64 {
        let mut hash = xxh32(&self.0.dst_addr.to_bytes(), 0);
        hash = xxh32(&self.0.dst_port.to_le_bytes(), hash);
        hash = xxh32(&self.0.pid.to_le_bytes(), hash);
        hash as u64
    }
}

impl PartialEq for EndpointKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.pid == other.0.pid
            && self.0.dst_port == other.0.dst_port
            && self.0.role == other.0.role
            && self.0.dst_addr == other.0.dst_addr
    }
}

impl Eq for EndpointKey {}

impl Hash for EndpointKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.strategy_hash())
    }
}

/// Per flow counters. Retransmission, zero window and protocol fields are
/// kept up to date but not exported yet.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowStats {
    pub send_bytes: u64,
    pub recv_bytes: u64,
    pub send_packets: u64,
    pub recv_packets: u64,
    pub protocol_matched: u64,
    pub protocol_unmatched: u64,
    pub last_inferred_protocol: ProtocolType,

    // nanoseconds
    pub send_total_latency: u64,
    pub recv_total_latency: u64,

    pub send_retran_count: u64,
    pub recv_retran_count: u64,
    pub send_zero_win_count: u64,
    pub recv_zero_win_count: u64,
}

impl FlowStats {
    pub fn on_send(&mut self, bytes: u64) {
        self.send_bytes += bytes;
        self.send_packets += 1;
    }

    pub fn on_recv(&mut self, bytes: u64) {
        self.recv_bytes += bytes;
        self.recv_packets += 1;
    }

    pub fn on_packet(&mut self, pkt_type: PacketType, bytes: u64) {
        match pkt_type {
            PacketType::Out => self.on_send(bytes),
            PacketType::In => self.on_recv(bytes),
            PacketType::None => (),
        }
    }

    pub fn add_latency(&mut self, pkt_type: PacketType, nanos: u64) {
        match pkt_type {
            PacketType::Out => self.send_total_latency += nanos,
            PacketType::In => self.recv_total_latency += nanos,
            PacketType::None => (),
        }
    }

    pub fn on_protocol(&mut self, ptl_type: ProtocolType) {
        if ptl_type == ProtocolType::None {
            self.protocol_unmatched += 1;
        } else {
            self.protocol_matched += 1;
            self.last_inferred_protocol = ptl_type;
        }
    }

    pub fn merge(&mut self, other: &FlowStats) {
        self.send_bytes += other.send_bytes;
        self.recv_bytes += other.recv_bytes;
        self.send_packets += other.send_packets;
        self.recv_packets += other.recv_packets;
        self.protocol_matched += other.protocol_matched;
        self.protocol_unmatched += other.protocol_unmatched;
        if other.last_inferred_protocol != ProtocolType::None {
            self.last_inferred_protocol = other.last_inferred_protocol;
        }
        self.send_total_latency += other.send_total_latency;
        self.recv_total_latency += other.recv_total_latency;
        self.send_retran_count += other.send_retran_count;
        self.recv_retran_count += other.recv_retran_count;
        self.send_zero_win_count += other.send_zero_win_count;
        self.recv_zero_win_count += other.recv_zero_win_count;
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::common::sock_addr::sock_address_from_str;

    fn key(sock_hash: u32, src_port: u16) -> ConnectionKey {
        ConnectionKey {
            pid: 42,
            sock_hash,
            src_addr: SockAddress::V4(Ipv4Addr::new(10, 0, 0, 2)),
            src_port,
            dst_addr: sock_address_from_str("10.0.0.9"),
            dst_port: 3306,
            role: PacketRoleType::Client,
            sock_category: SocketCategory::Inet,
        }
    }

    #[test]
    fn socket_key_identity() {
        let a = SocketKey::new(key(1, 40000));
        let b = SocketKey::new(key(1, 40001));
        let c = SocketKey::new(key(2, 40000));
        assert_eq!(a, b);
        assert_eq!(a.strategy_hash(), b.strategy_hash());
        assert_ne!(a, c);
        assert_ne!(a.strategy_hash(), c.strategy_hash());

        let mut other_pid = key(1, 40000);
        other_pid.pid = 43;
        assert_ne!(a, SocketKey::new(other_pid));
    }

    #[test]
    fn endpoint_key_identity() {
        let a = EndpointKey::new(key(1, 40000));
        let b = EndpointKey::new(key(2, 40001));
        assert_eq!(a, b);
        assert_eq!(a.strategy_hash(), b.strategy_hash());

        let mut server = key(1, 40000);
        server.role = PacketRoleType::Server;
        let server = EndpointKey::new(server);
        assert_ne!(a, server);
        // role is not hashed, only compared
        assert_eq!(a.strategy_hash(), server.strategy_hash());

        let mut other_port = key(1, 40000);
        other_port.dst_port = 3307;
        assert_ne!(a, EndpointKey::new(other_port));

        let mut other_addr = key(1, 40000);
        other_addr.dst_addr = sock_address_from_str("10.0.0.10");
        assert_ne!(a, EndpointKey::new(other_addr));
    }

    #[test]
    fn endpoint_hash_is_reproducible() {
        let k = key(1, 40000);
        let seed = xxh32(&k.dst_addr.to_bytes(), 0);
        let seed = xxh32(&3306u16.to_le_bytes(), seed);
        let expected = xxh32(&42u32.to_le_bytes(), seed);
        assert_eq!(EndpointKey::new(k).strategy_hash(), expected as u64);
    }

    #[test]
    fn key_from_event() {
        let header = PacketEventHeader {
            pid: 7,
            sock_hash: 9,
            src_addr: sock_address_from_str("192.168.1.1"),
            dst_addr: sock_address_from_str("192.168.1.2"),
            src_port: 50000,
            dst_port: 80,
            ..Default::default()
        };
        let key = ConnectionKey::from_event(&header, PacketRoleType::Client, SocketCategory::Inet);
        assert_eq!(key.pid, 7);
        assert_eq!(key.sock_hash, 9);
        assert_eq!(key.src_addr.to_string(), "192.168.1.1");
        assert_eq!(key.src_port, 50000);
        assert_eq!(key.dst_addr.to_string(), "192.168.1.2");
        assert_eq!(key.dst_port, 80);
        assert_eq!(
            key.to_string(),
            "pid:7 sock_hash:9 192.168.1.1:50000 > 192.168.1.2:80 role:client socket_type:inet"
        );
    }

    #[test]
    fn flow_stats_update_and_merge() {
        let mut stats = FlowStats::default();
        stats.on_packet(PacketType::Out, 100);
        stats.on_packet(PacketType::In, 300);
        stats.on_packet(PacketType::None, 1000);
        stats.add_latency(PacketType::In, 20);
        stats.on_protocol(ProtocolType::Http);
        stats.on_protocol(ProtocolType::None);
        assert_eq!(stats.send_bytes, 100);
        assert_eq!(stats.send_packets, 1);
        assert_eq!(stats.recv_bytes, 300);
        assert_eq!(stats.recv_packets, 1);
        assert_eq!(stats.recv_total_latency, 20);
        assert_eq!(stats.protocol_matched, 1);
        assert_eq!(stats.protocol_unmatched, 1);
        assert_eq!(stats.last_inferred_protocol, ProtocolType::Http);

        let mut total = FlowStats::default();
        total.merge(&stats);
        total.merge(&stats);
        assert_eq!(total.send_bytes, 200);
        assert_eq!(total.recv_packets, 2);
        assert_eq!(total.last_inferred_protocol, ProtocolType::Http);
    }
}
