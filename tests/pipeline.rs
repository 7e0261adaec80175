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

use std::net::Ipv6Addr;

use net_observer::{
    common::{enums::*, sock_address_from_str, SockAddress},
    ebpf::{packet_event_to_string, PacketEvent, PacketEventData, PacketEventHeader},
    platform::{ServiceCategory, ServiceMeta, ServiceMetaCache},
    NetStatisticsCollector, ObserverConfig,
};

const CONFIG: &str = r#"
aggregation: merged-by-endpoint
with-local-port: true
flush-interval: 10s
"#;

fn header(sock_hash: u32, local_port: u16, remote: &str, remote_port: u16) -> PacketEventHeader {
    PacketEventHeader {
        event_type: PacketEventType::Data,
        pid: 4242,
        sock_hash,
        time_nano: 1_700_000_000_000_000_000,
        src_addr: sock_address_from_str("10.10.0.5"),
        dst_addr: sock_address_from_str(remote),
        src_port: local_port,
        dst_port: remote_port,
    }
}

fn frame(header: PacketEventHeader, pkt_type: PacketType, payload: &[u8], out: &mut Vec<u8>) {
    let data = PacketEventData {
        pkt_type,
        ptl_type: ProtocolType::Redis,
        msg_type: MessageType::None,
        real_len: payload.len() as u32,
        buffer: payload,
    };
    PacketEvent::new_data(header, data).encode_into(out);
}

#[test]
fn frames_to_records() {
    let config = ObserverConfig::load(CONFIG).unwrap();
    let mut collector = NetStatisticsCollector::new(&config);
    let resolver = ServiceMetaCache::new();
    resolver.insert(
        4242,
        "10.10.0.9",
        ServiceMeta::new(ServiceCategory::Cache, "redis.prod"),
    );

    let mut stream = vec![];
    // two client connections to the same redis
    for (sock_hash, local_port) in [(1, 51000), (2, 51001)] {
        let h = header(sock_hash, local_port, "10.10.0.9", 6379);
        frame(h, PacketType::Out, b"*1\r\n$4\r\nPING\r\n", &mut stream);
        frame(h, PacketType::In, b"+PONG\r\n", &mut stream);
    }
    // an inbound request served by the local process
    let served = header(3, 8080, "10.10.0.77", 52000);
    frame(served, PacketType::In, b"GET / HTTP/1.1\r\n\r\n", &mut stream);

    assert_eq!(collector.on_frames(&stream), stream.len());
    assert_eq!(collector.len(), 2);

    let mut records = collector.flush(&resolver);
    assert!(collector.is_empty());
    records.sort_by(|a, b| a.get("role").cmp(&b.get("role")));
    assert_eq!(records.len(), 2);

    let client = &records[0];
    assert_eq!(client.get("role"), Some("client"));
    assert_eq!(
        client.get("remote_info"),
        Some(
            r#"{"remote_ip":"10.10.0.9","remote_port":"6379","remote_type":"cache","remote_host":"redis.prod"}"#
        )
    );
    // the first observed socket represents the merged entry
    assert_eq!(client.get("local_port"), Some("51000"));
    assert_eq!(client.get("socket_type"), Some("inet"));
    assert_eq!(client.get("send_bytes"), Some("28"));
    assert_eq!(client.get("recv_bytes"), Some("14"));
    assert_eq!(client.get("send_packets"), Some("2"));
    assert_eq!(client.get("recv_packets"), Some("2"));

    let server = &records[1];
    assert_eq!(server.get("role"), Some("server"));
    assert_eq!(
        server.get("remote_info"),
        Some(r#"{"remote_ip":"10.10.0.77","remote_port":"0"}"#)
    );
    assert_eq!(server.get("local_port"), Some("8080"));
    assert_eq!(server.get("recv_bytes"), Some("18"));
}

#[test]
fn forwarded_frame_round_trip() {
    let payload = b"hello";
    let mut h = header(9, 40000, "::1", 443);
    h.event_type = PacketEventType::Closed;
    let mut wire = vec![];
    frame(h, PacketType::Out, payload, &mut wire);

    let (event, consumed) = PacketEvent::decode_frame(&wire).unwrap();
    assert_eq!(consumed, wire.len());
    assert!(event.is_data());
    assert_eq!(event.header.dst_addr, SockAddress::V6(Ipv6Addr::LOCALHOST));
    let data = event.data.unwrap();
    assert_eq!(data.buffer, payload);
    // payload aliases the forwarded buffer
    assert!(wire.as_ptr_range().contains(&data.buffer.as_ptr()));

    let text = packet_event_to_string(&wire[4..]);
    assert!(text.contains("EventType : Data"));
    assert!(text.contains("DstAddress : ::1"));
    assert_eq!(packet_event_to_string(&wire[4..20]), "ErrorLength");

    assert!(PacketEvent::decode_frame(&wire[..wire.len() - 1]).is_err());
}
