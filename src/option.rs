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

//! The AccECN TCP option carrying full-precision marking counters.

use crate::codec::Decoder;
use crate::codec::Encoder;
use crate::counters::CounterValues;
use crate::counters::COUNTER_MASK;
use crate::error::Error;
use crate::Result;

/// The experimental TCP option kind used by the AccECN option.
///
/// See RFC 6994 Section 1
pub const ACCECN_OPTION_KIND: u8 = 254;

/// The experiment identifier of the AccECN option.
pub const ACCECN_MAGIC: u16 = 0xACCE;

/// Wire size of the AccECN option: kind(1) + length(1) + magic(2) + three
/// 24-bit counters.
pub const ACCECN_OPTION_LEN: usize = 13;

/// The AccECN TCP option.
///
/// An ephemeral wire record: constructed per outbound segment from the
/// receive-side counters, parsed per inbound segment, never persisted.
/// The values carried are absolute running counters; computing deltas
/// against the previously received option is the caller's responsibility.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccEcnOption {
    /// The number of payload bytes received in packets marked with ECT(0).
    pub ect0_bytes: u32,

    /// The number of payload bytes received in packets marked with CE.
    pub ce_bytes: u32,

    /// The number of payload bytes received in packets marked with ECT(1).
    pub ect1_bytes: u32,
}

impl AccEcnOption {
    /// Build an option reporting the given receive-side counters.
    pub fn new(values: &CounterValues) -> AccEcnOption {
        AccEcnOption {
            ect0_bytes: values.ect0_bytes,
            ce_bytes: values.ce_bytes,
            ect1_bytes: values.ect1_bytes,
        }
    }

    /// Write the option to the given buffer.
    ///
    /// Always emits exactly [`ACCECN_OPTION_LEN`] bytes.
    pub fn to_bytes(&self, mut buf: &mut [u8]) -> Result<usize> {
        let len = buf.len();

        buf.write_u8(ACCECN_OPTION_KIND)?;
        buf.write_u8(ACCECN_OPTION_LEN as u8)?;
        buf.write_u16(ACCECN_MAGIC)?;
        buf.write_u24(self.ect0_bytes & COUNTER_MASK)?;
        buf.write_u24(self.ce_bytes & COUNTER_MASK)?;
        buf.write_u24(self.ect1_bytes & COUNTER_MASK)?;

        Ok(len - buf.len())
    }

    /// Parse an option from the given buffer.
    ///
    /// An unknown kind or experiment identifier yields
    /// [`Error::InvalidOption`]; the caller must treat the option as absent
    /// and keep its previously decoded state.
    pub fn from_bytes(mut buf: &[u8]) -> Result<(AccEcnOption, usize)> {
        let len = buf.len();

        let kind = buf.read_u8()?;
        let _ = buf.read_u8()?;
        let magic = buf.read_u16()?;
        if kind != ACCECN_OPTION_KIND || magic != ACCECN_MAGIC {
            return Err(Error::InvalidOption);
        }

        let opt = AccEcnOption {
            ect0_bytes: buf.read_u24()?,
            ce_bytes: buf.read_u24()?,
            ect1_bytes: buf.read_u24()?,
        };

        Ok((opt, len - buf.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn option_wire_format() -> Result<()> {
        let opt = AccEcnOption {
            ect0_bytes: 0x010203,
            ce_bytes: 0x0A0B0C,
            ect1_bytes: 0xFFFFFF,
        };

        let mut buf = [0; ACCECN_OPTION_LEN];
        let len = opt.to_bytes(&mut buf)?;
        assert_eq!(len, ACCECN_OPTION_LEN);
        assert_eq!(
            buf,
            [
                254, 13, 0xAC, 0xCE, // kind, length, magic
                0x01, 0x02, 0x03, // ect0_bytes
                0x0A, 0x0B, 0x0C, // ce_bytes
                0xFF, 0xFF, 0xFF, // ect1_bytes
            ]
        );

        let (opt2, len2) = AccEcnOption::from_bytes(&buf)?;
        assert_eq!(opt, opt2);
        assert_eq!(len2, ACCECN_OPTION_LEN);
        Ok(())
    }

    #[test]
    fn option_round_trip_random() -> Result<()> {
        let mut rng = rand::thread_rng();
        let mut buf = [0; ACCECN_OPTION_LEN];

        for _ in 0..1000 {
            let opt = AccEcnOption {
                ect0_bytes: rng.gen::<u32>() & COUNTER_MASK,
                ce_bytes: rng.gen::<u32>() & COUNTER_MASK,
                ect1_bytes: rng.gen::<u32>() & COUNTER_MASK,
            };
            assert_eq!(opt.to_bytes(&mut buf)?, ACCECN_OPTION_LEN);

            let (opt2, len) = AccEcnOption::from_bytes(&buf)?;
            assert_eq!(opt, opt2);
            assert_eq!(len, ACCECN_OPTION_LEN);
        }
        Ok(())
    }

    #[test]
    fn option_wrong_kind() -> Result<()> {
        let opt = AccEcnOption::default();
        let mut buf = [0; ACCECN_OPTION_LEN];
        opt.to_bytes(&mut buf)?;

        buf[0] = 8; // timestamp option kind
        assert_eq!(
            AccEcnOption::from_bytes(&buf),
            Err(Error::InvalidOption)
        );
        Ok(())
    }

    #[test]
    fn option_wrong_magic() -> Result<()> {
        let opt = AccEcnOption::default();
        let mut buf = [0; ACCECN_OPTION_LEN];
        opt.to_bytes(&mut buf)?;

        buf[2] = 0xDE;
        buf[3] = 0xAD;
        assert_eq!(
            AccEcnOption::from_bytes(&buf),
            Err(Error::InvalidOption)
        );
        Ok(())
    }

    #[test]
    fn option_too_short() {
        let buf = [ACCECN_OPTION_KIND, 13, 0xAC, 0xCE, 0x01];
        assert_eq!(
            AccEcnOption::from_bytes(&buf),
            Err(Error::BufferTooShort)
        );

        let opt = AccEcnOption::default();
        let mut buf = [0; ACCECN_OPTION_LEN - 1];
        assert_eq!(opt.to_bytes(&mut buf), Err(Error::BufferTooShort));
    }
}
