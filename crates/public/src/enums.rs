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

//! Enumerations shared with the kernel-side capture program.
//!
//! The numeric values are part of the capture buffer layout and must not be
//! renumbered. Unknown values decode to the "none" variant of each enum.

use std::fmt;

use num_enum::{FromPrimitive, IntoPrimitive};
use serde::Serialize;

#[derive(
    Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive, num_enum::Default,
)]
#[repr(u32)]
pub enum PacketEventType {
    #[num_enum(default)]
    None = 0,
    Data = 1,
    Connected = 2,
    Accepted = 3,
    Closed = 4,
}

impl fmt::Display for PacketEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Data => write!(f, "Data"),
            Self::Connected => write!(f, "Connected"),
            Self::Accepted => write!(f, "Accepted"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

// Direction of a captured packet relative to the observed process.
#[derive(
    Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive, num_enum::Default,
)]
#[repr(u8)]
pub enum PacketType {
    #[num_enum(default)]
    None = 0,
    In = 1,
    Out = 2,
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::In => write!(f, "In"),
            Self::Out => write!(f, "Out"),
        }
    }
}

#[derive(
    Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive, num_enum::Default,
)]
#[repr(u8)]
pub enum MessageType {
    #[num_enum(default)]
    None = 0,
    Request = 1,
    Response = 2,
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Request => write!(f, "Request"),
            Self::Response => write!(f, "Response"),
        }
    }
}

#[derive(
    Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive, num_enum::Default,
)]
#[repr(u8)]
pub enum ProtocolType {
    #[num_enum(default)]
    None = 0,
    Http = 1,
    MySql = 2,
    Dns = 3,
    Redis = 4,
    Kafka = 5,
    PgSql = 6,
    Mongo = 7,
    Dubbo = 8,
    Hsf = 9,
}

impl fmt::Display for ProtocolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "None",
            Self::Http => "HTTP",
            Self::MySql => "MySQL",
            Self::Dns => "DNS",
            Self::Redis => "Redis",
            Self::Kafka => "Kafka",
            Self::PgSql => "PgSQL",
            Self::Mongo => "Mongo",
            Self::Dubbo => "Dubbo",
            Self::Hsf => "HSF",
        };
        write!(f, "{}", s)
    }
}

#[derive(
    Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive, num_enum::Default,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum PacketRoleType {
    #[num_enum(default)]
    Unknown = 0,
    Client = 1,
    Server = 2,
}

impl fmt::Display for PacketRoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Client => write!(f, "client"),
            Self::Server => write!(f, "server"),
        }
    }
}

#[derive(
    Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive, num_enum::Default,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum SocketCategory {
    #[num_enum(default)]
    Unknown = 0,
    Inet = 1,
    Unix = 2,
}

impl fmt::Display for SocketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Inet => write!(f, "inet"),
            Self::Unix => write!(f, "unix"),
        }
    }
}
