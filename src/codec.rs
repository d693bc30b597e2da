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

use bytes::Buf;
use bytes::BufMut;

use crate::error::Error;
use crate::Result;

/// Encoder for TCP option wire data
pub trait Encoder {
    /// Write an unsigned 8 bit integer to self.
    fn write_u8(&mut self, n: u8) -> Result<usize>;

    /// Write an unsigned 16 bit integer to self in big-endian byte order.
    fn write_u16(&mut self, n: u16) -> Result<usize>;

    /// Write an unsigned 24 bit integer to self in big-endian byte order.
    fn write_u24(&mut self, n: u32) -> Result<usize>;

    /// Write a slice to self.
    fn write(&mut self, src: &[u8]) -> Result<usize>;
}

/// Decoder for TCP option wire data
pub trait Decoder {
    /// Read an unsigned 8 bit integer from self.
    fn read_u8(&mut self) -> Result<u8>;

    /// Read an unsigned 16 bit integer from self in big-endian byte order.
    fn read_u16(&mut self) -> Result<u16>;

    /// Read an unsigned 24 bit integer from self in big-endian byte order.
    fn read_u24(&mut self) -> Result<u32>;

    /// Read `len` bytes inside self.
    fn read(&mut self, len: usize) -> Result<Vec<u8>>;

    /// Skip len bytes inside self.
    fn skip(&mut self, len: usize) -> Result<()>;
}

impl Encoder for &mut [u8] {
    fn write_u8(&mut self, n: u8) -> Result<usize> {
        if self.remaining_mut() < 1 {
            return Err(Error::BufferTooShort);
        }
        self.put_u8(n);
        Ok(1)
    }

    fn write_u16(&mut self, n: u16) -> Result<usize> {
        if self.remaining_mut() < 2 {
            return Err(Error::BufferTooShort);
        }
        self.put_u16(n);
        Ok(2)
    }

    fn write_u24(&mut self, n: u32) -> Result<usize> {
        if self.remaining_mut() < 3 {
            return Err(Error::BufferTooShort);
        }
        self.put_u8(((n & 0x00FF_0000) >> 16) as u8);
        self.put_u16((n & 0xFFFF) as u16);
        Ok(3)
    }

    fn write(&mut self, src: &[u8]) -> Result<usize> {
        if self.remaining_mut() < src.len() {
            return Err(Error::BufferTooShort);
        }
        self.put_slice(src);
        Ok(src.len())
    }
}

impl Decoder for &[u8] {
    fn read_u8(&mut self) -> Result<u8> {
        if self.remaining() < 1 {
            return Err(Error::BufferTooShort);
        }
        Ok(self.get_u8())
    }

    fn read_u16(&mut self) -> Result<u16> {
        if self.remaining() < 2 {
            return Err(Error::BufferTooShort);
        }
        Ok(self.get_u16())
    }

    fn read_u24(&mut self) -> Result<u32> {
        if self.remaining() < 3 {
            return Err(Error::BufferTooShort);
        }
        let mut n = self.get_u16() as u32;
        n <<= 8;
        n += self.get_u8() as u32;
        Ok(n)
    }

    fn read(&mut self, len: usize) -> Result<Vec<u8>> {
        if self.remaining() < len {
            return Err(Error::BufferTooShort);
        }

        let mut vec = vec![0; len];
        self.copy_to_slice(&mut vec[..]);

        Ok(vec)
    }

    fn skip(&mut self, len: usize) -> Result<()> {
        if self.remaining() < len {
            return Err(Error::BufferTooShort);
        }
        *self = &self[len..];
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;

    #[test]
    fn codec_uint() -> Result<()> {
        let mut buf = [0_u8; 8];
        let mut len = 0;

        let mut bw = &mut buf[..];
        len += bw.write_u8(0x01)?;
        len += bw.write_u16(0x0102)?;
        len += bw.write_u24(0x010203)?;
        let exp = [
            0x01_u8, // u8
            0x01, 0x02, // u16
            0x01, 0x02, 0x03, // u24
        ];
        assert_eq!(len, exp.len());
        assert_eq!(buf[..len], exp);

        let mut br = &buf[..];
        assert_eq!(br.read_u8()?, 0x01);
        assert_eq!(br.read_u16()?, 0x0102);
        assert_eq!(br.read_u24()?, 0x010203);
        Ok(())
    }

    #[test]
    fn codec_u24_truncation() -> Result<()> {
        let mut buf = [0_u8; 3];
        let mut bw = &mut buf[..];
        bw.write_u24(0xFF_ABCDEF)?;
        assert_eq!(buf, [0xAB, 0xCD, 0xEF]);

        let mut br = &buf[..];
        assert_eq!(br.read_u24()?, 0xABCDEF);
        Ok(())
    }

    #[test]
    fn codec_bytes() -> Result<()> {
        let mut buf = [0_u8; 8];
        let data = [0x01_u8, 0x02, 0x03, 0x04, 0x05, 0x06];

        let mut bw = &mut buf[..];
        let len = bw.write(&data[..])?;

        let mut br = &buf[..];
        assert_eq!(br.read(len)?[..], data[..]);
        Ok(())
    }

    #[test]
    fn buffer_too_short() -> Result<()> {
        let mut buf = [255; 16];
        let mut br = &buf[0..0];
        assert!(br.read_u8().is_err());
        assert!(br.read_u16().is_err());
        assert!(br.read_u24().is_err());
        assert!(br.read(1).is_err());
        assert!(br.skip(1).is_err());

        let mut bw = &mut buf[0..0];
        assert!(bw.write_u8(1).is_err());
        assert!(bw.write_u16(1).is_err());
        assert!(bw.write_u24(1).is_err());
        let data = [1; 10];
        assert!(bw.write(&data[..]).is_err());

        Ok(())
    }
}
