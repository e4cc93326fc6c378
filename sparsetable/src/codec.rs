// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Fixed-size value encoding for the data section.

use std::io;
use std::io::Read;
use std::io::Write;

use byteorder::LittleEndian;
use byteorder::ReadBytesExt;
use byteorder::WriteBytesExt;

use crate::error::Error;

/// A value that can be stored in the data section of a serialized table.
///
/// Only plain, fixed-size values qualify: each value is written as exactly
/// [`ENCODED_SIZE`](Self::ENCODED_SIZE) raw bytes with no length prefix, so
/// the type must not own heap memory or any other external resource. Adding
/// variable-size values would need per-value framing and therefore a new
/// file format.
pub trait FixedValue: Copy {
    /// Number of bytes every encoded value occupies.
    const ENCODED_SIZE: usize;

    /// Writes the little-endian encoding of `self`.
    fn write_to<W: Write + ?Sized>(self, writer: &mut W) -> io::Result<()>;

    /// Reads one little-endian encoded value.
    fn read_from<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self>;
}

impl FixedValue for u8 {
    const ENCODED_SIZE: usize = 1;

    fn write_to<W: Write + ?Sized>(self, writer: &mut W) -> io::Result<()> {
        writer.write_u8(self)
    }

    fn read_from<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        reader.read_u8()
    }
}

impl FixedValue for i8 {
    const ENCODED_SIZE: usize = 1;

    fn write_to<W: Write + ?Sized>(self, writer: &mut W) -> io::Result<()> {
        writer.write_i8(self)
    }

    fn read_from<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        reader.read_i8()
    }
}

macro_rules! impl_fixed_value {
    ($name:ty, $read:ident, $write:ident) => {
        impl FixedValue for $name {
            const ENCODED_SIZE: usize = std::mem::size_of::<$name>();

            fn write_to<W: Write + ?Sized>(self, writer: &mut W) -> io::Result<()> {
                writer.$write::<LittleEndian>(self)
            }

            fn read_from<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
                reader.$read::<LittleEndian>()
            }
        }
    };
}

impl_fixed_value!(u16, read_u16, write_u16);
impl_fixed_value!(i16, read_i16, write_i16);
impl_fixed_value!(u32, read_u32, write_u32);
impl_fixed_value!(i32, read_i32, write_i32);
impl_fixed_value!(u64, read_u64, write_u64);
impl_fixed_value!(i64, read_i64, write_i64);
impl_fixed_value!(f32, read_f32, write_f32);
impl_fixed_value!(f64, read_f64, write_f64);

/// Maps a failed read of `tag`: a short stream is corrupt data, anything else
/// is an I/O failure of the source.
pub(crate) fn read_error(tag: &'static str) -> impl FnOnce(io::Error) -> Error {
    move |err| {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Error::truncated(tag)
        } else {
            Error::io(tag, err)
        }
    }
}

pub(crate) fn write_error(tag: &'static str) -> impl FnOnce(io::Error) -> Error {
    move |err| Error::io(tag, err)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_encoded_sizes() {
        assert_eq!(u8::ENCODED_SIZE, 1);
        assert_eq!(i16::ENCODED_SIZE, 2);
        assert_eq!(f32::ENCODED_SIZE, 4);
        assert_eq!(u64::ENCODED_SIZE, 8);
    }

    #[test]
    fn test_little_endian_layout() {
        let mut bytes = vec![];
        0x0102_0304_0506_0708u64.write_to(&mut bytes).unwrap();
        (-2i16).write_to(&mut bytes).unwrap();
        assert_eq!(bytes, [8, 7, 6, 5, 4, 3, 2, 1, 0xfe, 0xff]);

        let mut cursor = Cursor::new(bytes);
        assert_eq!(u64::read_from(&mut cursor).unwrap(), 0x0102_0304_0506_0708);
        assert_eq!(i16::read_from(&mut cursor).unwrap(), -2);
    }

    #[test]
    fn test_nan_payload_is_preserved() {
        let value = f64::from_bits(0x7ff8_0000_dead_beef);
        let mut bytes = vec![];
        value.write_to(&mut bytes).unwrap();
        let decoded = f64::read_from(&mut bytes.as_slice()).unwrap();
        assert_eq!(decoded.to_bits(), value.to_bits());
    }

    #[test]
    fn test_short_read_is_corrupt_data() {
        let mut cursor = Cursor::new([1u8, 2, 3]);
        let err = u32::read_from(&mut cursor)
            .map_err(read_error("value"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptData);
        assert_eq!(err.context("field"), Some("value"));
    }

    #[test]
    fn test_other_read_failure_is_io_error() {
        let err = read_error("bitmap")(io::Error::other("device gone"));
        assert_eq!(err.kind(), ErrorKind::IOError);
    }
}
