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

// Buffers handed over by the kernel-side capture program. Each buffer holds
// exactly one packet event:
//
// |------ header (72 bytes) ------|-- data (16 bytes) --|---- payload ----|
//
// The data section and payload are only present for data events.

mod packet_event;

pub use packet_event::{
    packet_event_to_string, PacketEvent, PacketEventData, PacketEventHeader, DATA_LEN,
    FRAME_PREFIX_LEN, HEADER_LEN,
};
