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
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use public::bytes::{read_u32_le, write_u32_le};

const SOCK_ADDRESS_TYPE_IPV4: u32 = 0;
const SOCK_ADDRESS_TYPE_IPV6: u32 = 1;

/// Socket address as delivered by the capture program.
///
/// Wire layout (20 bytes):
///
/// ```text
/// | type (u32 le) | address (16 bytes, network order, ipv4 uses the first 4) |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SockAddress {
    V4(Ipv4Addr),
    V6(Ipv6Addr),
}

impl SockAddress {
    pub const LEN: usize = 20;

    // Any tag other than ipv4 is read as ipv6, same as the capture program does.
    pub fn read_from(bs: &[u8]) -> Self {
        assert!(bs.len() >= Self::LEN);
        if read_u32_le(bs) == SOCK_ADDRESS_TYPE_IPV4 {
            let addr: [u8; 4] = bs[4..8].try_into().unwrap();
            SockAddress::V4(Ipv4Addr::from(addr))
        } else {
            let addr: [u8; 16] = bs[4..20].try_into().unwrap();
            SockAddress::V6(Ipv6Addr::from(addr))
        }
    }

    pub fn write_to(&self, bs: &mut [u8]) {
        assert!(bs.len() >= Self::LEN);
        bs[..Self::LEN].fill(0);
        match self {
            SockAddress::V4(addr) => {
                write_u32_le(bs, SOCK_ADDRESS_TYPE_IPV4);
                bs[4..8].copy_from_slice(&addr.octets());
            }
            SockAddress::V6(addr) => {
                write_u32_le(bs, SOCK_ADDRESS_TYPE_IPV6);
                bs[4..20].copy_from_slice(&addr.octets());
            }
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut bs = [0u8; Self::LEN];
        self.write_to(&mut bs);
        bs
    }

    pub fn is_ipv4(&self) -> bool {
        matches!(self, SockAddress::V4(_))
    }
}

impl Default for SockAddress {
    fn default() -> Self {
        SockAddress::V4(Ipv4Addr::UNSPECIFIED)
    }
}

impl From<IpAddr> for SockAddress {
    fn from(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(v4) => SockAddress::V4(v4),
            IpAddr::V6(v6) => SockAddress::V6(v6),
        }
    }
}

impl From<SockAddress> for IpAddr {
    fn from(addr: SockAddress) -> Self {
        match addr {
            SockAddress::V4(v4) => IpAddr::V4(v4),
            SockAddress::V6(v6) => IpAddr::V6(v6),
        }
    }
}

impl fmt::Display for SockAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SockAddress::V4(addr) => write!(f, "{}", addr),
            SockAddress::V6(addr) => write!(f, "{}", addr),
        }
    }
}

/// Parses textual ipv4/ipv6 without reporting errors.
///
/// Any text containing a '.' is taken as ipv4, everything else as ipv6.
/// Malformed input yields the unspecified address of the chosen family.
pub fn sock_address_from_str(ip: &str) -> SockAddress {
    if ip.contains('.') {
        SockAddress::V4(ip.parse().unwrap_or(Ipv4Addr::UNSPECIFIED))
    } else {
        SockAddress::V6(ip.parse().unwrap_or(Ipv6Addr::UNSPECIFIED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_string_and_back() {
        let cases = [
            "10.1.2.3",
            "0.0.0.0",
            "255.255.255.255",
            "::1",
            "fe80::1",
            "1002:1003:4421:5566:7788:99aa:bbcc:ddee",
        ];
        for case in cases {
            let addr = sock_address_from_str(case);
            assert_eq!(addr.to_string(), case);
            assert_eq!(sock_address_from_str(&addr.to_string()), addr);
        }
        assert!(sock_address_from_str("192.168.0.1").is_ipv4());
        assert!(!sock_address_from_str("::").is_ipv4());
    }

    #[test]
    fn malformed_input_is_zeroed() {
        assert_eq!(
            sock_address_from_str("300.1.1.1"),
            SockAddress::V4(Ipv4Addr::UNSPECIFIED)
        );
        assert_eq!(
            sock_address_from_str("not-an-ip"),
            SockAddress::V6(Ipv6Addr::UNSPECIFIED)
        );
        // dotted text is always treated as ipv4
        assert_eq!(
            sock_address_from_str("::ffff:1.2.3.4"),
            SockAddress::V4(Ipv4Addr::UNSPECIFIED)
        );
    }

    #[test]
    fn wire_layout() {
        let v4 = SockAddress::V4(Ipv4Addr::new(192, 168, 1, 10));
        let bs = v4.to_bytes();
        assert_eq!(&bs[..8], &[0, 0, 0, 0, 192, 168, 1, 10]);
        assert!(bs[8..].iter().all(|b| *b == 0));
        assert_eq!(SockAddress::read_from(&bs), v4);

        let v6 = sock_address_from_str("fe80::2");
        let bs = v6.to_bytes();
        assert_eq!(&bs[..4], &[1, 0, 0, 0]);
        assert_eq!(bs[4], 0xfe);
        assert_eq!(bs[19], 2);
        assert_eq!(SockAddress::read_from(&bs), v6);

        let mut bs = v6.to_bytes();
        bs[0] = 7;
        assert_eq!(SockAddress::read_from(&bs), v6);
    }
}
