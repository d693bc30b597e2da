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

//! TCP segment classification and header flag bits.

use enumflags2::bitflags;
use enumflags2::BitFlags;

/// TCP header flag bits, including the AccECN AE bit taken from the
/// reserved field.
///
/// The ACE field occupies bits 6..8 (ECE, CWR, AE); it must not collide
/// with SYN/ACK/FIN/RST.
#[bitflags]
#[repr(u16)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderFlag {
    /// No more data from sender.
    Fin = 1 << 0,

    /// Synchronize sequence numbers.
    Syn = 1 << 1,

    /// Reset the connection.
    Rst = 1 << 2,

    /// Push function.
    Psh = 1 << 3,

    /// Acknowledgment field is significant.
    Ack = 1 << 4,

    /// Urgent pointer field is significant.
    Urg = 1 << 5,

    /// ECN-Echo. Lowest bit of the ACE field under AccECN.
    Ece = 1 << 6,

    /// Congestion Window Reduced. Middle bit of the ACE field under AccECN.
    Cwr = 1 << 7,

    /// Accurate ECN. Highest bit of the ACE field under AccECN.
    Ae = 1 << 8,
}

/// Classification of an outbound or inbound TCP segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentType {
    /// Connection-opening segment sent by the initiator.
    Syn,

    /// Connection-opening reply sent by the responder.
    SynAck,

    /// Acknowledgment carrying no payload.
    PureAck,

    /// Segment carrying payload bytes.
    Data,

    /// Connection-closing segment.
    Fin,

    /// Connection reset.
    Rst,
}

impl SegmentType {
    /// Classify a segment from its control flags and payload size.
    ///
    /// The ACE bits (ECE/CWR/AE) do not participate in classification.
    pub fn from_flags(flags: BitFlags<HeaderFlag>, payload_len: usize) -> SegmentType {
        if flags.contains(HeaderFlag::Rst) {
            SegmentType::Rst
        } else if flags.contains(HeaderFlag::Syn | HeaderFlag::Ack) {
            SegmentType::SynAck
        } else if flags.contains(HeaderFlag::Syn) {
            SegmentType::Syn
        } else if flags.contains(HeaderFlag::Fin) {
            SegmentType::Fin
        } else if payload_len > 0 {
            SegmentType::Data
        } else {
            SegmentType::PureAck
        }
    }
}

/// The two-bit ECN field of the network-layer header.
///
/// See RFC 3168 Section 5
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EcnCodepoint {
    /// Not ECN-Capable Transport.
    #[default]
    NotEct,

    /// ECN-Capable Transport, codepoint 1.
    Ect1,

    /// ECN-Capable Transport, codepoint 0.
    Ect0,

    /// Congestion Experienced.
    Ce,
}

impl EcnCodepoint {
    /// Return the wire value of the codepoint.
    pub fn to_bits(self) -> u8 {
        match self {
            EcnCodepoint::NotEct => 0b00,
            EcnCodepoint::Ect1 => 0b01,
            EcnCodepoint::Ect0 => 0b10,
            EcnCodepoint::Ce => 0b11,
        }
    }

    /// Parse the low two bits of the network-layer ECN field.
    pub fn from_bits(bits: u8) -> EcnCodepoint {
        match bits & 0b11 {
            0b01 => EcnCodepoint::Ect1,
            0b10 => EcnCodepoint::Ect0,
            0b11 => EcnCodepoint::Ce,
            _ => EcnCodepoint::NotEct,
        }
    }

    /// Whether the codepoint marks the packet as ECN-Capable Transport.
    pub fn is_ect(self) -> bool {
        !matches!(self, EcnCodepoint::NotEct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_classification() {
        let cases = [
            (HeaderFlag::Syn.into(), 0, SegmentType::Syn),
            (HeaderFlag::Syn | HeaderFlag::Ack, 0, SegmentType::SynAck),
            (HeaderFlag::Ack.into(), 0, SegmentType::PureAck),
            (HeaderFlag::Ack.into(), 1200, SegmentType::Data),
            (HeaderFlag::Fin | HeaderFlag::Ack, 0, SegmentType::Fin),
            (HeaderFlag::Rst.into(), 0, SegmentType::Rst),
            // RST wins over anything else
            (HeaderFlag::Rst | HeaderFlag::Ack, 0, SegmentType::Rst),
        ];
        for (flags, len, want) in cases {
            assert_eq!(SegmentType::from_flags(flags, len), want);
        }
    }

    #[test]
    fn classification_ignores_ace_bits() {
        let flags = HeaderFlag::Ack | HeaderFlag::Ae | HeaderFlag::Cwr | HeaderFlag::Ece;
        assert_eq!(SegmentType::from_flags(flags, 0), SegmentType::PureAck);
    }

    #[test]
    fn ecn_codepoint_bits() {
        for bits in 0..4u8 {
            assert_eq!(EcnCodepoint::from_bits(bits).to_bits(), bits);
        }
        assert_eq!(EcnCodepoint::from_bits(0b111), EcnCodepoint::Ce);
        assert!(EcnCodepoint::Ect0.is_ect());
        assert!(EcnCodepoint::Ce.is_ect());
        assert!(!EcnCodepoint::NotEct.is_ect());
    }
}
