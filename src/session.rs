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

//! Per-connection ECN signaling state.
//!
//! An [`EcnSession`] is owned exclusively by one connection and driven
//! synchronously from the transport's pre-send and post-receive hooks. It
//! negotiates the capability level over the handshake, decides network-layer
//! marking and header flag bits for every outbound segment, and keeps the
//! running marking counters for both directions. No operation here blocks,
//! performs I/O, or waits on a timer.

use enumflags2::BitFlags;
use log::*;

use crate::ace;
use crate::counters::CounterSet;
use crate::counters::COUNTER_MASK;
use crate::counters::SEED_CE_PACKETS;
use crate::marking;
use crate::negotiation;
use crate::option::AccEcnOption;
use crate::segment::EcnCodepoint;
use crate::segment::HeaderFlag;
use crate::segment::SegmentType;
use crate::EcnMode;
use crate::Role;

/// Handshake progress relevant to ECN negotiation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HandshakeState {
    /// Nothing sent or received yet.
    Idle,

    /// The initiator's SYN has gone out; waiting for the reply.
    SynSent,

    /// The responder resolved the SYN's offer; its SYN+ACK is out or about
    /// to go out.
    SynReceived,

    /// The initiator resolved the SYN+ACK; it still owes the
    /// handshake-completing acknowledgment.
    AckPending,

    /// Negotiation is settled and the handshake acknowledgment exchanged.
    Established,
}

/// ECN-related overrides for one outbound segment.
///
/// The transport applies `ecn` to the network-layer header, ORs `flags`
/// into the TCP header flags, and appends the serialized `option` to the
/// option list if present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SendDirective {
    /// The network-layer ECN codepoint to apply.
    pub ecn: EcnCodepoint,

    /// ECN-related header flag bits to set.
    pub flags: BitFlags<HeaderFlag>,

    /// Full-precision counter option to attach, if any.
    pub option: Option<AccEcnOption>,
}

/// Per-connection ECN negotiation and accounting state.
pub struct EcnSession {
    /// Trace id for logging, normally the connection identifier.
    trace_id: String,

    /// Which end of the handshake this session drives.
    role: Role,

    /// The configured capability level.
    local_mode: EcnMode,

    /// The resolved capability level, settled during the handshake and
    /// immutable afterward.
    negotiated: Option<EcnMode>,

    state: HandshakeState,

    /// Marking counters for both directions.
    counters: CounterSet,

    /// The ECN field observed on the peer's opening segment, reflected in
    /// the handshake encoding of the ACE field.
    peer_open_ecn: EcnCodepoint,

    /// The ECT value applied to our own opening segment, the expectation
    /// for the peer's handshake reflection.
    own_open_ecn: EcnCodepoint,

    /// Shadow of the CE packet counter the peer reports through the ACE
    /// field. Desynchronization is tolerated; the full option reconciles.
    peer_ce_packets: u32,

    /// The last successfully parsed option from the peer. A malformed
    /// option never touches this.
    peer_option: Option<AccEcnOption>,

    /// A received CE mark still owed a full-precision report.
    option_pending: bool,
}

impl EcnSession {
    /// Create the ECN state for a new connection.
    pub fn new(role: Role, mode: EcnMode) -> EcnSession {
        EcnSession {
            trace_id: String::from(""),
            role,
            local_mode: mode,
            negotiated: None,
            state: HandshakeState::Idle,
            counters: CounterSet::default(),
            peer_open_ecn: EcnCodepoint::NotEct,
            own_open_ecn: EcnCodepoint::NotEct,
            peer_ce_packets: 0,
            peer_option: None,
            option_pending: false,
        }
    }

    /// Set the trace id used in log lines.
    pub fn set_trace_id(&mut self, trace_id: &str) {
        self.trace_id = trace_id.to_string();
    }

    /// Pre-send hook: decide marking, header flag bits and option
    /// attachment for an outbound segment, and account the chosen marking.
    pub fn on_segment_send(&mut self, segment: SegmentType, payload_len: usize) -> SendDirective {
        let mut flags = BitFlags::empty();
        let mut option = None;

        match segment {
            SegmentType::Syn => {
                flags = negotiation::syn_flags(self.local_mode);
                if self.state == HandshakeState::Idle {
                    self.state = HandshakeState::SynSent;
                }
            }

            SegmentType::SynAck => {
                let negotiated = self.negotiated.unwrap_or(EcnMode::NoEcn);
                flags = negotiation::synack_flags(negotiated, self.peer_open_ecn);
                if negotiated == EcnMode::AccEcn {
                    // The full option is mandatory on the SYN+ACK.
                    option = Some(AccEcnOption::new(self.counters.received.values()));
                }
            }

            _ => {
                if self.negotiated == Some(EcnMode::AccEcn) {
                    let ace = if self.state == HandshakeState::AckPending {
                        // The handshake-completing acknowledgment reflects
                        // the ECN field the SYN+ACK arrived with and always
                        // carries the full option.
                        self.state = HandshakeState::Established;
                        option = Some(AccEcnOption::new(self.counters.received.values()));
                        ace::handshake_ace(self.peer_open_ecn)
                    } else {
                        ace::encode_ace(self.counters.received.values().ce_packets)
                    };
                    flags |= ace::ace_flags(ace);

                    if self.option_pending && option.is_none() {
                        option = Some(AccEcnOption::new(self.counters.received.values()));
                    }
                    if option.is_some() {
                        self.option_pending = false;
                    }
                } else if self.state == HandshakeState::AckPending {
                    self.state = HandshakeState::Established;
                }
            }
        }

        let ecn = marking::ect_codepoint(self.effective_mode(), segment);
        match segment {
            SegmentType::Syn | SegmentType::SynAck => self.own_open_ecn = ecn,
            _ => (),
        }

        // Send-side accounting records the value we chose to apply.
        match ecn {
            EcnCodepoint::Ect0 => self.counters.sent.record_ect0(payload_len),
            EcnCodepoint::Ect1 => self.counters.sent.record_ect1(payload_len),
            _ => (),
        }

        trace!(
            "{} SEND {:?} ecn={:?} flags={:?} option={}",
            self.trace_id,
            segment,
            ecn,
            flags,
            option.is_some()
        );

        SendDirective { ecn, flags, option }
    }

    /// Post-receive hook: drive negotiation, account the observed marking
    /// and reconcile the compact and full feedback channels.
    ///
    /// `ecn` is the true network ECN field as observed on the wire;
    /// `option` is the raw bytes of an attached AccECN option, if any.
    /// Nothing here is fatal: malformed or contradictory input degrades to
    /// a lower capability or is ignored.
    pub fn on_segment_recv(
        &mut self,
        flags: BitFlags<HeaderFlag>,
        ecn: EcnCodepoint,
        option: Option<&[u8]>,
        payload_len: usize,
    ) {
        let segment = SegmentType::from_flags(flags, payload_len);

        match (self.role, segment) {
            (Role::Responder, SegmentType::Syn) => {
                let mode = negotiation::resolve_responder(self.local_mode, flags);
                self.negotiated = Some(mode);
                self.peer_open_ecn = ecn;
                self.state = HandshakeState::SynReceived;
                debug!(
                    "{} RECV SYN flags={:?} ecn={:?} negotiated={:?}",
                    self.trace_id, flags, ecn, mode
                );
                if mode == EcnMode::AccEcn {
                    self.start_accounting();
                    self.record_received(ecn, payload_len);
                }
            }

            (Role::Initiator, SegmentType::SynAck) => {
                let mode = negotiation::resolve_initiator(self.local_mode, flags);
                self.negotiated = Some(mode);
                self.peer_open_ecn = ecn;
                self.state = HandshakeState::AckPending;
                debug!(
                    "{} RECV SYN+ACK flags={:?} ecn={:?} negotiated={:?}",
                    self.trace_id, flags, ecn, mode
                );
                if mode == EcnMode::AccEcn {
                    self.start_accounting();
                    self.record_received(ecn, payload_len);
                    // The reply reflects what our SYN arrived as; a CE
                    // reflection means the peer already counted one mark.
                    let reflection = ace::decode_ace(flags);
                    if reflection == ace::handshake_ace(EcnCodepoint::Ce)
                        && self.own_open_ecn != EcnCodepoint::Ce
                    {
                        self.bump_peer_ce(1);
                    }
                    if let Some(raw) = option {
                        self.process_option(raw);
                    }
                }
            }

            _ => {
                if self.state == HandshakeState::SynReceived {
                    // Handshake-completing acknowledgment at the responder.
                    self.state = HandshakeState::Established;
                    if self.negotiated == Some(EcnMode::AccEcn) {
                        self.record_received(ecn, payload_len);
                        self.check_handshake_reflection(flags);
                        if let Some(raw) = option {
                            self.process_option(raw);
                        }
                    }
                    return;
                }

                if self.negotiated != Some(EcnMode::AccEcn) {
                    // Flag-based signaling only; nothing to account.
                    return;
                }

                self.record_received(ecn, payload_len);
                if ecn == EcnCodepoint::Ce {
                    // The next acknowledgment owes a full-precision report.
                    self.option_pending = true;
                }

                let ace = ace::decode_ace(flags);
                let delta = ace::ace_delta(self.peer_ce_packets, ace);
                if delta > 0 {
                    trace!(
                        "{} RECV ace={} signals {} new CE events",
                        self.trace_id,
                        ace,
                        delta
                    );
                    self.bump_peer_ce(delta as u32);
                }

                if let Some(raw) = option {
                    self.process_option(raw);
                }
            }
        }
    }

    /// The configured capability level.
    pub fn local_mode(&self) -> EcnMode {
        self.local_mode
    }

    /// The capability level resolved during the handshake, if settled.
    pub fn negotiated_mode(&self) -> Option<EcnMode> {
        self.negotiated
    }

    /// Which end of the handshake this session drives.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether the handshake-completing acknowledgment was exchanged.
    pub fn is_established(&self) -> bool {
        self.state == HandshakeState::Established
    }

    /// The running marking counters for both directions.
    pub fn counters(&self) -> &CounterSet {
        &self.counters
    }

    /// Local shadow of the CE packet counter the peer reports via the ACE
    /// field.
    pub fn peer_ce_packets(&self) -> u32 {
        self.peer_ce_packets
    }

    /// The last successfully parsed option from the peer. The values are
    /// absolute running counters; diff against the previous reading to
    /// obtain deltas.
    pub fn peer_option(&self) -> Option<AccEcnOption> {
        self.peer_option
    }

    fn effective_mode(&self) -> EcnMode {
        self.negotiated.unwrap_or(self.local_mode)
    }

    /// Seed both counter sides and the peer shadow. Called once when the
    /// handshake settles on AccECN; redundant calls are no-ops.
    fn start_accounting(&mut self) {
        self.counters.sent.seed();
        self.counters.received.seed();
        if self.peer_ce_packets == 0 {
            self.peer_ce_packets = SEED_CE_PACKETS;
        }
    }

    /// Receive-side accounting is driven by the true network ECN field of
    /// each distinct inbound segment.
    fn record_received(&mut self, ecn: EcnCodepoint, payload_len: usize) {
        match ecn {
            EcnCodepoint::Ce => self.counters.received.record_ce(payload_len),
            EcnCodepoint::Ect0 => self.counters.received.record_ect0(payload_len),
            EcnCodepoint::Ect1 => self.counters.received.record_ect1(payload_len),
            EcnCodepoint::NotEct => (),
        }
    }

    /// Compare the handshake acknowledgment's ACE reflection against what
    /// we applied to our SYN+ACK. A CE reflection means the network marked
    /// it; any other mismatch is left to the option exchange.
    fn check_handshake_reflection(&mut self, flags: BitFlags<HeaderFlag>) {
        let ace = ace::decode_ace(flags);
        let expected = ace::handshake_ace(self.own_open_ecn);
        if ace == expected {
            return;
        }
        if ace == ace::handshake_ace(EcnCodepoint::Ce) {
            debug!(
                "{} handshake reflection reports CE on our SYN+ACK",
                self.trace_id
            );
            self.bump_peer_ce(1);
        } else {
            debug!(
                "{} handshake reflection mismatch: got {:#05b} want {:#05b}",
                self.trace_id, ace, expected
            );
        }
    }

    fn bump_peer_ce(&mut self, n: u32) {
        self.peer_ce_packets = self.peer_ce_packets.wrapping_add(n) & COUNTER_MASK;
    }

    fn process_option(&mut self, raw: &[u8]) {
        match AccEcnOption::from_bytes(raw) {
            Ok((opt, _)) => {
                trace!(
                    "{} RECV option ect0_bytes={} ce_bytes={} ect1_bytes={}",
                    self.trace_id,
                    opt.ect0_bytes,
                    opt.ce_bytes,
                    opt.ect1_bytes
                );
                self.peer_option = Some(opt);
            }
            Err(e) => warn!(
                "{} malformed AccECN option treated as absent: {:?}",
                self.trace_id, e
            ),
        }
    }
}
