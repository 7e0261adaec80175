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

use std::fmt::{self, Write};

use log::debug;

use public::{
    bytes::{read_u16_le, read_u32_le, read_u64_le, write_u16_le, write_u32_le, write_u64_le},
    enums::{MessageType, PacketEventType, PacketType, ProtocolType},
};

use crate::common::sock_addr::SockAddress;
use crate::error::{Error, Result};

pub const HEADER_LEN: usize = 72;
pub const DATA_LEN: usize = 16;
// u32 little endian length in front of every forwarded event
pub const FRAME_PREFIX_LEN: usize = 4;

const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";
const DUMP_SEPARATOR: &str = "###############################";
const DUMP_BYTES_PER_LINE: usize = 32;
const DUMP_BYTES_PER_GROUP: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacketEventHeader {
    pub event_type: PacketEventType,
    pub pid: u32,
    pub sock_hash: u32,
    pub time_nano: u64,
    pub src_addr: SockAddress,
    pub dst_addr: SockAddress,
    pub src_port: u16,
    pub dst_port: u16,
}

impl PacketEventHeader {
    const OFFSET_EVENT_TYPE: usize = 0;
    const OFFSET_PID: usize = 4;
    const OFFSET_SOCK_HASH: usize = 8;
    const OFFSET_TIME_NANO: usize = 16;
    const OFFSET_SRC_ADDR: usize = 24;
    const OFFSET_DST_ADDR: usize = 44;
    const OFFSET_SRC_PORT: usize = 64;
    const OFFSET_DST_PORT: usize = 66;

    fn read_from(bs: &[u8]) -> Self {
        assert!(bs.len() >= HEADER_LEN);
        Self {
            event_type: PacketEventType::from(read_u32_le(&bs[Self::OFFSET_EVENT_TYPE..])),
            pid: read_u32_le(&bs[Self::OFFSET_PID..]),
            sock_hash: read_u32_le(&bs[Self::OFFSET_SOCK_HASH..]),
            time_nano: read_u64_le(&bs[Self::OFFSET_TIME_NANO..]),
            src_addr: SockAddress::read_from(&bs[Self::OFFSET_SRC_ADDR..]),
            dst_addr: SockAddress::read_from(&bs[Self::OFFSET_DST_ADDR..]),
            src_port: read_u16_le(&bs[Self::OFFSET_SRC_PORT..]),
            dst_port: read_u16_le(&bs[Self::OFFSET_DST_PORT..]),
        }
    }

    // reserved bytes are written as zero
    fn write_to(&self, bs: &mut [u8]) {
        assert!(bs.len() >= HEADER_LEN);
        bs[..HEADER_LEN].fill(0);
        write_u32_le(&mut bs[Self::OFFSET_EVENT_TYPE..], self.event_type.into());
        write_u32_le(&mut bs[Self::OFFSET_PID..], self.pid);
        write_u32_le(&mut bs[Self::OFFSET_SOCK_HASH..], self.sock_hash);
        write_u64_le(&mut bs[Self::OFFSET_TIME_NANO..], self.time_nano);
        self.src_addr.write_to(&mut bs[Self::OFFSET_SRC_ADDR..]);
        self.dst_addr.write_to(&mut bs[Self::OFFSET_DST_ADDR..]);
        write_u16_le(&mut bs[Self::OFFSET_SRC_PORT..], self.src_port);
        write_u16_le(&mut bs[Self::OFFSET_DST_PORT..], self.dst_port);
    }
}

impl fmt::Display for PacketEventHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "EventType : {}", self.event_type)?;
        writeln!(f, "PID : {}", self.pid)?;
        writeln!(f, "SocketHash : {}", self.sock_hash)?;
        writeln!(f, "Time : {}", self.time_nano)?;
        writeln!(f, "SrcAddress : {}", self.src_addr)?;
        writeln!(f, "SrcPort : {}", self.src_port)?;
        writeln!(f, "DstAddress : {}", self.dst_addr)?;
        writeln!(f, "DstPort : {}", self.dst_port)
    }
}

/// Data section of a data event. `buffer` borrows the payload bytes from the
/// capture buffer, nothing is copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketEventData<'a> {
    pub pkt_type: PacketType,
    pub ptl_type: ProtocolType,
    pub msg_type: MessageType,
    pub real_len: u32,
    pub buffer: &'a [u8],
}

impl<'a> PacketEventData<'a> {
    const OFFSET_PKT_TYPE: usize = 0;
    const OFFSET_PTL_TYPE: usize = 1;
    const OFFSET_MSG_TYPE: usize = 2;
    const OFFSET_REAL_LEN: usize = 4;
    const OFFSET_BUFFER_LEN: usize = 8;

    // `bs` starts at the data section and runs to the end of the capture buffer
    fn read_from(bs: &'a [u8]) -> Self {
        assert!(bs.len() >= DATA_LEN);
        let declared = read_u32_le(&bs[Self::OFFSET_BUFFER_LEN..]) as usize;
        let available = bs.len() - DATA_LEN;
        if declared > available {
            debug!(
                "packet event declares {} payload bytes but only {} present, clamped",
                declared, available
            );
        }
        Self {
            pkt_type: PacketType::from(bs[Self::OFFSET_PKT_TYPE]),
            ptl_type: ProtocolType::from(bs[Self::OFFSET_PTL_TYPE]),
            msg_type: MessageType::from(bs[Self::OFFSET_MSG_TYPE]),
            real_len: read_u32_le(&bs[Self::OFFSET_REAL_LEN..]),
            buffer: &bs[DATA_LEN..DATA_LEN + declared.min(available)],
        }
    }

    fn write_to(&self, bs: &mut [u8]) {
        assert!(bs.len() >= DATA_LEN);
        bs[..DATA_LEN].fill(0);
        bs[Self::OFFSET_PKT_TYPE] = self.pkt_type.into();
        bs[Self::OFFSET_PTL_TYPE] = self.ptl_type.into();
        bs[Self::OFFSET_MSG_TYPE] = self.msg_type.into();
        write_u32_le(&mut bs[Self::OFFSET_REAL_LEN..], self.real_len);
        write_u32_le(&mut bs[Self::OFFSET_BUFFER_LEN..], self.buffer.len() as u32);
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }
}

impl fmt::Display for PacketEventData<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PacketType : {}", self.pkt_type)?;
        writeln!(f, "ProtocolType : {}", self.ptl_type)?;
        writeln!(f, "MessageType : {}", self.msg_type)?;
        writeln!(f, "RealLen : {}", self.real_len)?;
        writeln!(f, "BufferLen : {}", self.buffer.len())?;
        writeln!(f, "Data : {}", hex_dump(self.buffer))?;
        writeln!(f, "Data String : \n{}", printable(self.buffer))
    }
}

/// Decoded view over one capture buffer.
///
/// The payload of a data event aliases the buffer passed to `decode`, so the
/// event cannot outlive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketEvent<'a> {
    pub header: PacketEventHeader,
    pub data: Option<PacketEventData<'a>>,
}

impl<'a> PacketEvent<'a> {
    pub fn new(header: PacketEventHeader) -> Self {
        Self { header, data: None }
    }

    pub fn new_data(mut header: PacketEventHeader, data: PacketEventData<'a>) -> Self {
        header.event_type = PacketEventType::Data;
        Self {
            header,
            data: Some(data),
        }
    }

    /// Overlays the capture layout on `buf`.
    ///
    /// Any buffer holding the full header decodes. A data event without a
    /// complete data section yields a header-only event.
    pub fn try_decode(buf: &'a [u8]) -> Result<Self> {
        if buf.len() < HEADER_LEN {
            return Err(Error::BufferTooShort(buf.len(), HEADER_LEN));
        }
        let header = PacketEventHeader::read_from(buf);
        if header.event_type != PacketEventType::Data {
            return Ok(Self::new(header));
        }
        if buf.len() < HEADER_LEN + DATA_LEN {
            if buf.len() > HEADER_LEN {
                debug!(
                    "data event of {} bytes has no complete data section, header only",
                    buf.len()
                );
            }
            return Ok(Self::new(header));
        }
        Ok(Self {
            header,
            data: Some(PacketEventData::read_from(&buf[HEADER_LEN..])),
        })
    }

    /// Infallible form of `try_decode`, returns the event (if any) and the
    /// number of bytes consumed, which is always the whole buffer.
    pub fn decode(buf: &'a [u8]) -> (Option<Self>, usize) {
        match Self::try_decode(buf) {
            Ok(event) => (Some(event), buf.len()),
            Err(e) => {
                debug!("drop capture buffer: {}", e);
                (None, buf.len())
            }
        }
    }

    /// Decodes one forwarded frame from the front of `buf`, returning the event
    /// and the bytes consumed including the length prefix.
    pub fn decode_frame(buf: &'a [u8]) -> Result<(Self, usize)> {
        if buf.len() < FRAME_PREFIX_LEN {
            return Err(Error::BufferTooShort(buf.len(), FRAME_PREFIX_LEN));
        }
        let len = read_u32_le(buf) as usize;
        let available = buf.len() - FRAME_PREFIX_LEN;
        if len > available {
            return Err(Error::FrameLengthMismatch(len, available));
        }
        let end = FRAME_PREFIX_LEN + len;
        let event = Self::try_decode(&buf[FRAME_PREFIX_LEN..end])?;
        Ok((event, end))
    }

    pub fn is_data(&self) -> bool {
        self.header.event_type == PacketEventType::Data && self.data.is_some()
    }

    /// Size of the capture layout of this event, without the frame prefix.
    pub fn raw_len(&self) -> usize {
        match self.data.as_ref() {
            Some(data) if self.is_data() => HEADER_LEN + DATA_LEN + data.buffer_len(),
            _ => HEADER_LEN,
        }
    }

    /// Appends the capture layout of this event to `buf`, payload copied.
    pub fn write_raw(&self, buf: &mut Vec<u8>) {
        let start = buf.len();
        buf.resize(start + self.raw_len(), 0);
        let out = &mut buf[start..];
        self.header.write_to(out);
        if let Some(data) = self.data.as_ref().filter(|_| self.is_data()) {
            data.write_to(&mut out[HEADER_LEN..]);
            out[HEADER_LEN + DATA_LEN..].copy_from_slice(data.buffer);
        }
    }

    /// Appends a length prefixed frame for forwarding this event across a
    /// process or transport boundary.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        let len = self.raw_len();
        buf.reserve(FRAME_PREFIX_LEN + len);
        buf.extend_from_slice(&(len as u32).to_le_bytes());
        self.write_raw(buf);
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(FRAME_PREFIX_LEN + self.raw_len());
        self.encode_into(&mut buf);
        buf
    }
}

impl fmt::Display for PacketEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.header)?;
        match self.data.as_ref() {
            Some(data) if self.is_data() => write!(f, "\n{}", data),
            _ => Ok(()),
        }
    }
}

/// Debug text of a raw capture buffer.
pub fn packet_event_to_string(buf: &[u8]) -> String {
    match PacketEvent::try_decode(buf) {
        Ok(event) => event.to_string(),
        Err(_) => "ErrorLength".to_owned(),
    }
}

fn hex_dump(bs: &[u8]) -> String {
    let mut s = String::with_capacity(bs.len() * 3 + 2 * DUMP_SEPARATOR.len() + 16);
    s.push_str(DUMP_SEPARATOR);
    s.push('\n');
    for (i, b) in bs.iter().enumerate() {
        if i % DUMP_BYTES_PER_LINE == 0 {
            let _ = write!(s, "{:06} - {:06} : ", i, i + DUMP_BYTES_PER_LINE);
        }
        if i % DUMP_BYTES_PER_GROUP == 0 {
            s.push_str("0x");
        }
        s.push(HEX_CHARS[(b >> 4) as usize] as char);
        s.push(HEX_CHARS[(b & 0x0f) as usize] as char);
        if i % DUMP_BYTES_PER_GROUP == DUMP_BYTES_PER_GROUP - 1 {
            s.push(' ');
        }
        if i % DUMP_BYTES_PER_LINE == DUMP_BYTES_PER_LINE - 1 {
            s.push('\n');
        }
    }
    s.push('\n');
    s.push_str(DUMP_SEPARATOR);
    s.push('\n');
    s
}

fn printable(bs: &[u8]) -> String {
    bs.iter()
        .map(|b| {
            if b.is_ascii_graphic() || *b == b' ' {
                *b as char
            } else {
                '.'
            }
        })
        .collect()
}
