// Copyright (c) 2026 The TECN Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The ACE field: a 3-bit compact summary of the receive-side CE packet
//! counter, piggybacked on the ECE/CWR/AE header bits.
//!
//! This channel is intentionally lossy (mod 8); full reconciliation happens
//! through the AccECN option.

use enumflags2::BitFlags;

use crate::segment::EcnCodepoint;
use crate::segment::HeaderFlag;

/// Bit position of the ACE field inside the header flags.
const ACE_SHIFT: u16 = 6;

/// The ACE field is three bits wide.
const ACE_MASK: u16 = 0x7;

/// Encode a CE packet counter into the 3-bit ACE value.
pub fn encode_ace(ce_packets: u32) -> u8 {
    (ce_packets & ACE_MASK as u32) as u8
}

/// Extract the raw 3-bit ACE value from header flags.
///
/// The consumer compares the decoded value against its own shadow
/// expectation to detect new CE events since the last exchange.
pub fn decode_ace(flags: BitFlags<HeaderFlag>) -> u8 {
    ((flags.bits() >> ACE_SHIFT) & ACE_MASK) as u8
}

/// Map a 3-bit ACE value onto the AE/CWR/ECE header bits.
pub fn ace_flags(ace: u8) -> BitFlags<HeaderFlag> {
    BitFlags::from_bits_truncate(((ace as u16) & ACE_MASK) << ACE_SHIFT)
}

/// The AccECN handshake encoding of an observed ECN field.
///
/// During the handshake the ACE field does not carry a counter; it reflects
/// the ECN codepoint the peer's opening segment arrived with, so that an
/// endpoint learns whether its segment was mangled or congestion-marked in
/// transit.
pub fn handshake_ace(ecn: EcnCodepoint) -> u8 {
    match ecn {
        EcnCodepoint::NotEct => 0b010,
        EcnCodepoint::Ect1 => 0b011,
        EcnCodepoint::Ect0 => 0b100,
        EcnCodepoint::Ce => 0b110,
    }
}

/// Number of new CE events signaled by an ACE value relative to the local
/// shadow of the peer's CE packet counter, wrapping mod 8.
pub fn ace_delta(shadow_ce_packets: u32, ace: u8) -> u8 {
    ace.wrapping_sub(encode_ace(shadow_ce_packets)) & ACE_MASK as u8
}
