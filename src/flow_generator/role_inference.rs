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

use public::enums::{MessageType, PacketRoleType, PacketType};

use crate::ebpf::PacketEventHeader;

// Ports below this are taken as service ports, ports at or above it as
// ephemeral client ports.
pub const SERVICE_PORT_THRESHOLD: u16 = 30000;

// Rough guess from port numbers only: a packet heading to a well known port
// (or from a larger port to a smaller one) is the request.
pub fn infer_message_type(pkt_type: PacketType, header: &PacketEventHeader) -> MessageType {
    let towards_service =
        header.src_port > header.dst_port || header.dst_port < SERVICE_PORT_THRESHOLD;
    match pkt_type {
        PacketType::In if towards_service => MessageType::Response,
        PacketType::In => MessageType::Request,
        PacketType::Out if towards_service => MessageType::Request,
        PacketType::Out => MessageType::Response,
        PacketType::None => MessageType::None,
    }
}

pub fn infer_role(pkt_type: PacketType, msg_type: MessageType) -> PacketRoleType {
    match (pkt_type, msg_type) {
        (PacketType::None, _) | (_, MessageType::None) => PacketRoleType::Unknown,
        (PacketType::In, MessageType::Request) => PacketRoleType::Server,
        (PacketType::In, MessageType::Response) => PacketRoleType::Client,
        (PacketType::Out, MessageType::Request) => PacketRoleType::Client,
        (PacketType::Out, MessageType::Response) => PacketRoleType::Server,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ports(src_port: u16, dst_port: u16) -> PacketEventHeader {
        PacketEventHeader {
            src_port,
            dst_port,
            ..Default::default()
        }
    }

    #[test]
    fn message_type_by_port() {
        let h = ports(50000, 80);
        assert_eq!(infer_message_type(PacketType::In, &h), MessageType::Response);
        assert_eq!(infer_message_type(PacketType::Out, &h), MessageType::Request);
        assert_eq!(infer_message_type(PacketType::None, &h), MessageType::None);

        // both ephemeral, smaller source port
        let h = ports(40000, 50000);
        assert_eq!(infer_message_type(PacketType::In, &h), MessageType::Request);
        assert_eq!(infer_message_type(PacketType::Out, &h), MessageType::Response);

        // well known destination wins even with a smaller source port
        let h = ports(80, 443);
        assert_eq!(infer_message_type(PacketType::In, &h), MessageType::Response);
        assert_eq!(infer_message_type(PacketType::Out, &h), MessageType::Request);
    }

    #[test]
    fn message_type_at_threshold() {
        let h = ports(100, SERVICE_PORT_THRESHOLD - 1);
        assert_eq!(infer_message_type(PacketType::Out, &h), MessageType::Request);
        let h = ports(100, SERVICE_PORT_THRESHOLD);
        assert_eq!(infer_message_type(PacketType::Out, &h), MessageType::Response);
        let h = ports(SERVICE_PORT_THRESHOLD, SERVICE_PORT_THRESHOLD);
        assert_eq!(infer_message_type(PacketType::In, &h), MessageType::Request);
    }

    #[test]
    fn role() {
        assert_eq!(
            infer_role(PacketType::In, MessageType::Request),
            PacketRoleType::Server
        );
        assert_eq!(
            infer_role(PacketType::In, MessageType::Response),
            PacketRoleType::Client
        );
        assert_eq!(
            infer_role(PacketType::Out, MessageType::Request),
            PacketRoleType::Client
        );
        assert_eq!(
            infer_role(PacketType::Out, MessageType::Response),
            PacketRoleType::Server
        );
        for msg_type in [MessageType::None, MessageType::Request, MessageType::Response] {
            assert_eq!(infer_role(PacketType::None, msg_type), PacketRoleType::Unknown);
        }
        assert_eq!(
            infer_role(PacketType::Out, MessageType::None),
            PacketRoleType::Unknown
        );
    }
}
