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

// Thomas Wang / Bob Jenkins 64 bit integer mix, see
// http://burtleburtle.net/bob/hash/integer.html
// Flipping one input bit changes about half of the output bits.
pub fn jenkins64(mut hash: u64) -> u64 {
    hash = (hash << 21).wrapping_sub(hash).wrapping_sub(1);
    hash ^= hash >> 24;
    hash = hash.wrapping_add(hash << 3).wrapping_add(hash << 8);
    hash ^= hash >> 14;
    hash = hash.wrapping_add(hash << 2).wrapping_add(hash << 4);
    hash ^= hash >> 28;
    hash.wrapping_add(hash << 31)
}

// xxHash32: https://github.com/Cyan4973/xxHash/blob/dev/doc/xxhash_spec.md
// The seed parameter allows chaining, i.e. xxh32(b, xxh32(a, 0)) folds a then b.

const PRIME32_1: u32 = 0x9E3779B1;
const PRIME32_2: u32 = 0x85EBCA77;
const PRIME32_3: u32 = 0xC2B2AE3D;
const PRIME32_4: u32 = 0x27D4EB2F;
const PRIME32_5: u32 = 0x165667B1;

#[inline]
fn xxh32_round(acc: u32, input: u32) -> u32 {
    acc.wrapping_add(input.wrapping_mul(PRIME32_2))
        .rotate_left(13)
        .wrapping_mul(PRIME32_1)
}

#[inline]
fn read_u32(bs: &[u8]) -> u32 {
    u32::from_le_bytes([bs[0], bs[1], bs[2], bs[3]])
}

pub fn xxh32(input: &[u8], seed: u32) -> u32 {
    let mut rest = input;
    let mut hash = if input.len() >= 16 {
        let mut v1 = seed.wrapping_add(PRIME32_1).wrapping_add(PRIME32_2);
        let mut v2 = seed.wrapping_add(PRIME32_2);
        let mut v3 = seed;
        let mut v4 = seed.wrapping_sub(PRIME32_1);
        while rest.len() >= 16 {
            v1 = xxh32_round(v1, read_u32(&rest[0..]));
            v2 = xxh32_round(v2, read_u32(&rest[4..]));
            v3 = xxh32_round(v3, read_u32(&rest[8..]));
            v4 = xxh32_round(v4, read_u32(&rest[12..]));
            rest = &rest[16..];
        }
        v1.rotate_left(1)
            .wrapping_add(v2.rotate_left(7))
            .wrapping_add(v3.rotate_left(12))
            .wrapping_add(v4.rotate_left(18))
    } else {
        seed.wrapping_add(PRIME32_5)
    };

    hash = hash.wrapping_add(input.len() as u32);

    while rest.len() >= 4 {
        hash = hash
            .wrapping_add(read_u32(rest).wrapping_mul(PRIME32_3))
            .rotate_left(17)
            .wrapping_mul(PRIME32_4);
        rest = &rest[4..];
    }
    for b in rest {
        hash = hash
            .wrapping_add((*b as u32).wrapping_mul(PRIME32_5))
            .rotate_left(11)
            .wrapping_mul(PRIME32_1);
    }

    hash ^= hash >> 15;
    hash = hash.wrapping_mul(PRIME32_2);
    hash ^= hash >> 13;
    hash = hash.wrapping_mul(PRIME32_3);
    hash ^= hash >> 16;
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assert_jenkins64() {
        assert_eq!(
            jenkins64(1281291242888) ^ jenkins64(122345676892),
            17281198411619148719
        );
    }

    #[test]
    fn assert_xxh32() {
        assert_eq!(xxh32(b"", 0), 0x02CC5D05);
        assert_eq!(xxh32(b"abc", 0), 0x32D153FF);
        // long input takes the four lane path
        let long = [0x5au8; 37];
        assert_eq!(xxh32(&long, 7), xxh32(&long, 7));
        assert_ne!(xxh32(&long, 7), xxh32(&long, 8));
    }

    #[test]
    fn xxh32_chaining_is_order_sensitive() {
        let a = xxh32(&80u16.to_le_bytes(), xxh32(&1000u32.to_le_bytes(), 0));
        let b = xxh32(&1000u32.to_le_bytes(), xxh32(&80u16.to_le_bytes(), 0));
        assert_ne!(a, b);
    }
}
