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

//! Per-segment ECT marking policy.
//!
//! Each successive capability level extends ECT marking to more control
//! traffic that classic ECN leaves unmarked, so congestion signaling stays
//! visible even absent payload. AccECN additionally marks the opening SYN
//! to seed accounting from connection start.

use crate::segment::EcnCodepoint;
use crate::segment::SegmentType;
use crate::EcnMode;

/// The network-layer ECN codepoint to apply to an outbound segment.
///
/// Marked segments use ECT(0). The decision depends only on the negotiated
/// capability level and the segment classification:
///
/// | mode       | SYN | SYN+ACK | pure-ACK | data | FIN | RST |
/// |------------|-----|---------|----------|------|-----|-----|
/// | NoEcn      |  -  |    -    |    -     |  -   |  -  |  -  |
/// | ClassicEcn |  -  |   ECT   |   ECT    | ECT  |  -  |  -  |
/// | EcnPp      |  -  |   ECT   |   ECT    | ECT  | ECT | ECT |
/// | AccEcn     | ECT |   ECT   |   ECT    | ECT  | ECT | ECT |
pub fn ect_codepoint(mode: EcnMode, segment: SegmentType) -> EcnCodepoint {
    let marked = match mode {
        EcnMode::NoEcn => false,
        EcnMode::ClassicEcn => matches!(
            segment,
            SegmentType::SynAck | SegmentType::PureAck | SegmentType::Data
        ),
        EcnMode::EcnPp => !matches!(segment, SegmentType::Syn),
        EcnMode::AccEcn => true,
    };

    if marked {
        EcnCodepoint::Ect0
    } else {
        EcnCodepoint::NotEct
    }
}
