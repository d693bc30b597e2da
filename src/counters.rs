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

//! Running counters of ECN markings, one set per connection.

/// All counters are 24 bits wide on the wire and wrap modulo 2^24.
///
/// Wraparound is defined behavior, not an overflow error; the protocol
/// reasons about deltas between exchanges, never absolute magnitude.
pub const COUNTER_MASK: u32 = 0x00FF_FFFF;

/// Protocol-defined seed value for the CE packet counter.
pub const SEED_CE_PACKETS: u32 = 5;

/// Protocol-defined seed value for the ECT(0) byte counter.
pub const SEED_ECT0_BYTES: u32 = 1;

/// Marking counters for one direction of a connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CounterValues {
    /// The number of packets marked with CE.
    pub ce_packets: u32,

    /// The number of payload bytes in packets marked with CE.
    pub ce_bytes: u32,

    /// The number of payload bytes in packets marked with ECT(0).
    pub ect0_bytes: u32,

    /// The number of payload bytes in packets marked with ECT(1).
    pub ect1_bytes: u32,
}

impl CounterValues {
    fn bump(counter: &mut u32, n: u32) {
        *counter = counter.wrapping_add(n) & COUNTER_MASK;
    }
}

/// One side of a [`CounterSet`].
///
/// The one-time seeding required by the protocol is kept structurally
/// visible: a side starts `Unseeded` and moves to `Seeded` exactly once,
/// applying the fixed starting values on the transition. Increments are
/// accepted in either state and survive a later redundant seed call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EcnCounters {
    /// The fixed protocol starting point has not been applied yet.
    Unseeded(CounterValues),

    /// The side has been seeded; further seed calls are no-ops.
    Seeded(CounterValues),
}

impl Default for EcnCounters {
    fn default() -> EcnCounters {
        EcnCounters::Unseeded(CounterValues::default())
    }
}

impl EcnCounters {
    /// Apply the protocol-defined starting values (CE-packets=5,
    /// ECT0-bytes=1, the rest 0). Idempotent: only the first call per side
    /// has any effect.
    pub fn seed(&mut self) {
        if let EcnCounters::Unseeded(_) = self {
            *self = EcnCounters::Seeded(CounterValues {
                ce_packets: SEED_CE_PACKETS,
                ce_bytes: 0,
                ect0_bytes: SEED_ECT0_BYTES,
                ect1_bytes: 0,
            });
        }
    }

    /// Account one CE-marked packet carrying `bytes` payload bytes.
    pub fn record_ce(&mut self, bytes: usize) {
        let v = self.values_mut();
        CounterValues::bump(&mut v.ce_packets, 1);
        CounterValues::bump(&mut v.ce_bytes, bytes as u32);
    }

    /// Account one ECT(0)-marked packet carrying `bytes` payload bytes.
    pub fn record_ect0(&mut self, bytes: usize) {
        CounterValues::bump(&mut self.values_mut().ect0_bytes, bytes as u32);
    }

    /// Account one ECT(1)-marked packet carrying `bytes` payload bytes.
    pub fn record_ect1(&mut self, bytes: usize) {
        CounterValues::bump(&mut self.values_mut().ect1_bytes, bytes as u32);
    }

    /// Return the current counter values.
    pub fn values(&self) -> &CounterValues {
        match self {
            EcnCounters::Unseeded(v) => v,
            EcnCounters::Seeded(v) => v,
        }
    }

    /// Whether the fixed starting point has been applied.
    pub fn is_seeded(&self) -> bool {
        matches!(self, EcnCounters::Seeded(_))
    }

    fn values_mut(&mut self) -> &mut CounterValues {
        match self {
            EcnCounters::Unseeded(v) => v,
            EcnCounters::Seeded(v) => v,
        }
    }
}

/// Per-connection marking counters, one independent side per direction.
///
/// The sent side tracks the ECT value this endpoint chose when constructing
/// each outbound segment; the received side tracks the true network ECN
/// field of each distinct inbound segment. Exactly one update per distinct
/// segment per direction; retransmission detection belongs to the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CounterSet {
    /// Counters for segments sent by this endpoint.
    pub sent: EcnCounters,

    /// Counters for segments received by this endpoint.
    pub received: EcnCounters,
}
