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

//! Capability negotiation over the three-segment handshake.
//!
//! The negotiated mode can only settle at or below the lower of the two
//! advertised capability levels. Any unexpected or contradictory flag
//! combination resolves to the most conservative mode consistent with the
//! observation; negotiation never aborts the connection.

use std::cmp;

use enumflags2::BitFlags;

use crate::ace;
use crate::segment::EcnCodepoint;
use crate::segment::HeaderFlag;
use crate::EcnMode;

/// The ECN flags the initiator advertises on its SYN.
///
/// AccECN claims all three of ECE, CWR and AE; classic ECN and ECN++ are
/// indistinguishable at this stage and both claim ECE and CWR.
pub fn syn_flags(mode: EcnMode) -> BitFlags<HeaderFlag> {
    match mode {
        EcnMode::NoEcn => BitFlags::empty(),
        EcnMode::ClassicEcn | EcnMode::EcnPp => HeaderFlag::Ece | HeaderFlag::Cwr,
        EcnMode::AccEcn => HeaderFlag::Ece | HeaderFlag::Cwr | HeaderFlag::Ae,
    }
}

/// The highest capability level a received SYN can be offering.
///
/// An ECE+CWR offer may come from either a classic ECN or an ECN++
/// initiator; the responder cannot tell them apart and treats the offer as
/// the richer of the two, capping at its own configured mode during
/// resolution.
pub fn offered_ceiling(syn: BitFlags<HeaderFlag>) -> EcnMode {
    let ecn_bits = syn & (HeaderFlag::Ece | HeaderFlag::Cwr | HeaderFlag::Ae);

    if ecn_bits == HeaderFlag::Ece | HeaderFlag::Cwr | HeaderFlag::Ae {
        EcnMode::AccEcn
    } else if ecn_bits == HeaderFlag::Ece | HeaderFlag::Cwr {
        EcnMode::EcnPp
    } else {
        // Includes the empty set and every contradictory pattern.
        EcnMode::NoEcn
    }
}

/// Resolve the responder's negotiated mode from the initiator's SYN flags.
pub fn resolve_responder(local: EcnMode, syn: BitFlags<HeaderFlag>) -> EcnMode {
    cmp::min(local, offered_ceiling(syn))
}

/// The ECN flags the responder places on its SYN+ACK.
///
/// Under AccECN the reply reflects the ECN field the SYN arrived with
/// (AE only in the normal ECT(0) case). A classic or ECN++ outcome replies
/// with ECE alone, never AE, since the initiator cannot parse AE semantics.
pub fn synack_flags(negotiated: EcnMode, syn_ecn: EcnCodepoint) -> BitFlags<HeaderFlag> {
    match negotiated {
        EcnMode::NoEcn => BitFlags::empty(),
        EcnMode::ClassicEcn | EcnMode::EcnPp => HeaderFlag::Ece.into(),
        EcnMode::AccEcn => ace::ace_flags(ace::handshake_ace(syn_ecn)),
    }
}

/// Resolve the initiator's negotiated mode from the responder's SYN+ACK
/// flags.
pub fn resolve_initiator(local: EcnMode, synack: BitFlags<HeaderFlag>) -> EcnMode {
    let ace = ace::decode_ace(synack);

    if local == EcnMode::AccEcn {
        match ace {
            // Handshake reflection of the SYN's ECN field: the responder
            // speaks AccECN.
            0b010 | 0b011 | 0b100 | 0b110 => EcnMode::AccEcn,
            // Plain ECE: a classic or ECN++ responder. The two are
            // indistinguishable here, so settle on the lower.
            0b001 => EcnMode::ClassicEcn,
            _ => EcnMode::NoEcn,
        }
    } else if local == EcnMode::NoEcn {
        EcnMode::NoEcn
    } else {
        // Classic or ECN++ initiator: the only affirmative reply it
        // understands is ECE alone.
        if ace == 0b001 {
            local
        } else {
            EcnMode::NoEcn
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::marking;
    use crate::segment::SegmentType;

    use crate::EcnMode::*;

    /// Run one handshake at the flag level and return the mode each
    /// endpoint settles on together with the responder's reply flags.
    fn handshake(
        initiator: EcnMode,
        responder: EcnMode,
    ) -> (EcnMode, EcnMode, BitFlags<HeaderFlag>) {
        let syn = syn_flags(initiator);
        let syn_ecn = marking::ect_codepoint(initiator, SegmentType::Syn);

        let resp_mode = resolve_responder(responder, syn);
        let reply = synack_flags(resp_mode, syn_ecn);
        let init_mode = resolve_initiator(initiator, reply);

        (init_mode, resp_mode, reply)
    }

    #[test]
    fn negotiation_lattice() {
        // (initiator, responder) -> (initiator view, responder view, reply)
        let ece_only: BitFlags<HeaderFlag> = HeaderFlag::Ece.into();
        let ae_only: BitFlags<HeaderFlag> = HeaderFlag::Ae.into();
        let none = BitFlags::empty();

        let cases = [
            ((NoEcn, NoEcn), (NoEcn, NoEcn, none)),
            ((NoEcn, ClassicEcn), (NoEcn, NoEcn, none)),
            ((NoEcn, EcnPp), (NoEcn, NoEcn, none)),
            ((NoEcn, AccEcn), (NoEcn, NoEcn, none)),
            ((ClassicEcn, NoEcn), (NoEcn, NoEcn, none)),
            ((ClassicEcn, ClassicEcn), (ClassicEcn, ClassicEcn, ece_only)),
            ((ClassicEcn, EcnPp), (ClassicEcn, EcnPp, ece_only)),
            ((ClassicEcn, AccEcn), (ClassicEcn, EcnPp, ece_only)),
            ((EcnPp, NoEcn), (NoEcn, NoEcn, none)),
            ((EcnPp, ClassicEcn), (EcnPp, ClassicEcn, ece_only)),
            ((EcnPp, EcnPp), (EcnPp, EcnPp, ece_only)),
            ((EcnPp, AccEcn), (EcnPp, EcnPp, ece_only)),
            ((AccEcn, NoEcn), (NoEcn, NoEcn, none)),
            ((AccEcn, ClassicEcn), (ClassicEcn, ClassicEcn, ece_only)),
            ((AccEcn, EcnPp), (ClassicEcn, EcnPp, ece_only)),
            // The AccECN SYN goes out ECT(0)-marked; the reflection on an
            // untampered path is AE alone.
            ((AccEcn, AccEcn), (AccEcn, AccEcn, ae_only)),
        ];

        for ((init, resp), want) in cases {
            let got = handshake(init, resp);
            assert_eq!(got, want, "initiator {:?} responder {:?}", init, resp);
        }
    }

    #[test]
    fn negotiated_never_exceeds_either_end() {
        let modes = [NoEcn, ClassicEcn, EcnPp, AccEcn];
        for init in modes {
            for resp in modes {
                let (init_mode, resp_mode, _) = handshake(init, resp);
                assert!(init_mode <= init);
                assert!(resp_mode <= resp);
                // The responder never settles above what the SYN offered.
                assert!(resp_mode <= offered_ceiling(syn_flags(init)));
            }
        }
    }

    #[test]
    fn contradictory_syn_resolves_down() {
        for flags in [
            BitFlags::from_flag(HeaderFlag::Ae),
            BitFlags::from_flag(HeaderFlag::Ece),
            BitFlags::from_flag(HeaderFlag::Cwr),
            HeaderFlag::Cwr | HeaderFlag::Ae,
            HeaderFlag::Ece | HeaderFlag::Ae,
        ] {
            assert_eq!(resolve_responder(AccEcn, flags), NoEcn, "{:?}", flags);
        }
    }

    #[test]
    fn contradictory_reply_resolves_down() {
        // An AE-bearing reply means nothing to a classic or ECN++ initiator.
        let reply = HeaderFlag::Ae | HeaderFlag::Cwr;
        assert_eq!(resolve_initiator(ClassicEcn, reply), NoEcn);
        assert_eq!(resolve_initiator(EcnPp, reply), NoEcn);

        // Reserved reflection values are not upgraded to AccECN.
        let reply = HeaderFlag::Ae | HeaderFlag::Cwr | HeaderFlag::Ece;
        assert_eq!(resolve_initiator(AccEcn, reply), NoEcn);
    }

    #[test]
    fn reply_reflects_tampered_syn() {
        // The responder tells an AccECN initiator what its SYN arrived as.
        let cases = [
            (EcnCodepoint::NotEct, HeaderFlag::Cwr.into()),
            (EcnCodepoint::Ect1, HeaderFlag::Cwr | HeaderFlag::Ece),
            (EcnCodepoint::Ect0, HeaderFlag::Ae.into()),
            (EcnCodepoint::Ce, HeaderFlag::Ae | HeaderFlag::Cwr),
        ];
        for (syn_ecn, want) in cases {
            let reply: BitFlags<HeaderFlag> = synack_flags(AccEcn, syn_ecn);
            assert_eq!(reply, want, "{:?}", syn_ecn);
            // Every reflection still resolves to AccECN at the initiator.
            assert_eq!(resolve_initiator(AccEcn, reply), AccEcn);
        }
    }
}
