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

//! TECN implements the Accurate ECN (AccECN) and ECN++ extensions to TCP's
//! congestion signaling: richer-than-one-bit Explicit Congestion
//! Notification feedback between endpoints.
//!
//! The crate covers the negotiation-and-accounting subsystem of the
//! extensions:
//!
//! * deciding, per connection, which ECN capability level both ends can
//!   jointly support ([`EcnSession`]);
//! * deciding, per outbound segment, whether to mark the network-layer ECN
//!   field and which header flag bits to set ([`marking`], [`ace`]);
//! * maintaining per-direction running counters of the markings seen
//!   ([`counters`]);
//! * encoding and decoding the wire option that carries those counters with
//!   full precision ([`AccEcnOption`]).
//!
//! The surrounding TCP machinery — connection establishment and teardown,
//! retransmission, and the congestion-control reaction to the accumulated
//! feedback — is the embedding transport's concern. It drives this crate
//! through a pre-send and a post-receive hook per segment.

use std::str::FromStr;

use strum_macros::EnumIter;

/// Result type for ECN signaling operations.
pub type Result<T> = std::result::Result<T, Error>;

/// ECN capability level of an endpoint or connection.
///
/// Ordered by capability richness for negotiation purposes. A classic ECN
/// and an ECN++ endpoint advertise identical SYN flags and are told apart
/// only by their marking behavior on control segments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, EnumIter)]
pub enum EcnMode {
    /// ECN disabled entirely.
    #[default]
    NoEcn,

    /// RFC 3168 ECN: ECT marking on data-bearing segments only.
    ClassicEcn,

    /// ECN++: ECT marking extended to pure control segments.
    EcnPp,

    /// Accurate ECN: ECT marking on all segments plus precise marking
    /// counters exchanged via the ACE field and the AccECN option.
    AccEcn,
}

impl FromStr for EcnMode {
    type Err = Error;

    fn from_str(mode: &str) -> Result<EcnMode> {
        if mode.eq_ignore_ascii_case("none") {
            Ok(EcnMode::NoEcn)
        } else if mode.eq_ignore_ascii_case("classic") {
            Ok(EcnMode::ClassicEcn)
        } else if mode.eq_ignore_ascii_case("ecnpp") {
            Ok(EcnMode::EcnPp)
        } else if mode.eq_ignore_ascii_case("accecn") {
            Ok(EcnMode::AccEcn)
        } else {
            Err(Error::InvalidConfig(format!("unknown ecn mode {:?}", mode)))
        }
    }
}

/// Which end of the handshake a session drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// The end sending the SYN.
    Initiator,

    /// The end replying with the SYN+ACK.
    Responder,
}

/// Configuration for the ECN signaling of new connections.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EcnConfig {
    /// The capability level this endpoint is willing to use.
    pub mode: EcnMode,
}

impl EcnConfig {
    /// Create a configuration with the given capability level.
    pub fn new(mode: EcnMode) -> EcnConfig {
        EcnConfig { mode }
    }

    /// Create a configuration from a textual mode name, one of
    /// `none | classic | ecnpp | accecn` (case-insensitive).
    pub fn from_name(mode: &str) -> Result<EcnConfig> {
        Ok(EcnConfig {
            mode: mode.parse()?,
        })
    }

    /// Create the ECN state for a new connection under this configuration.
    pub fn new_session(&self, role: Role) -> EcnSession {
        EcnSession::new(role, self.mode)
    }
}


pub use crate::ace::decode_ace;
pub use crate::ace::encode_ace;
pub use crate::counters::CounterSet;
pub use crate::counters::CounterValues;
pub use crate::counters::EcnCounters;
pub use crate::error::Error;
pub use crate::option::AccEcnOption;
pub use crate::segment::EcnCodepoint;
pub use crate::segment::HeaderFlag;
pub use crate::segment::SegmentType;
pub use crate::session::EcnSession;
pub use crate::session::SendDirective;

pub mod ace;
mod codec;
pub mod counters;
pub mod error;
pub mod marking;
pub mod negotiation;
pub mod option;
pub mod segment;
pub mod session;
