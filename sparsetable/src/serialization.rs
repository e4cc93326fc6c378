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

//! Binary layout of a serialized table.
//!
//! The stream is two sections written back to back, all integers
//! little-endian, with no magic number or version field:
//!
//! ```text
//! metadata: u64 size
//!           u64 bitmap[ceil(size / G)]     (low G bits meaningful)
//! data:     T   value[num_nonempty]        (T::ENCODED_SIZE bytes each)
//! ```
//!
//! Values are ordered by ascending index. The metadata section alone tells
//! whether any index is occupied, see [`TableMetadata`].

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Read;
use std::io::Write;
use std::path::Path;

use byteorder::LittleEndian;
use byteorder::ReadBytesExt;
use byteorder::WriteBytesExt;
use tracing::debug;

use crate::codec::FixedValue;
use crate::codec::read_error;
use crate::codec::write_error;
use crate::error::Error;
use crate::group::SparseGroup;
use crate::table::DEFAULT_GROUP_SIZE;
use crate::table::SparseTable;

const WORD_SIZE_BYTES: usize = 8;

/// Upper bound on bitmaps reserved before any of them have been read, so a
/// corrupt size field cannot trigger a huge allocation up front.
const MAX_PREALLOCATED_GROUPS: usize = 1 << 16;

impl<T, const G: usize> SparseTable<T, G> {
    /// Writes the metadata section: the virtual size and one occupancy word
    /// per group.
    pub fn write_metadata<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), Error> {
        writer
            .write_u64::<LittleEndian>(self.size() as u64)
            .map_err(write_error("virtual_size"))?;
        for group in self.groups() {
            writer
                .write_u64::<LittleEndian>(group.bitmap())
                .map_err(write_error("bitmap"))?;
        }
        Ok(())
    }

    /// Reads a metadata section written by [`write_metadata`](Self::write_metadata).
    ///
    /// The returned [`TableMetadata`] must then read the data section that
    /// follows it to produce the table.
    pub fn read_metadata<R: Read + ?Sized>(reader: &mut R) -> Result<TableMetadata<G>, Error> {
        TableMetadata::read_from(reader)
    }
}

impl<T: FixedValue, const G: usize> SparseTable<T, G> {
    /// Writes the data section: every occupied value in ascending index
    /// order, with no framing.
    pub fn write_nopointer_data<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), Error> {
        for group in self.groups() {
            for value in group.values() {
                value.write_to(writer).map_err(write_error("value"))?;
            }
        }
        Ok(())
    }

    /// Writes the metadata section followed by the data section.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), Error> {
        self.write_metadata(writer)?;
        self.write_nopointer_data(writer)
    }

    /// Reads a table written by [`write_to`](Self::write_to).
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, Error> {
        Self::read_metadata(reader)?.read_nopointer_data(reader)
    }

    /// Returns the number of bytes [`write_to`](Self::write_to) produces.
    pub fn serialized_size(&self) -> usize {
        WORD_SIZE_BYTES * (1 + self.num_groups()) + T::ENCODED_SIZE * self.num_nonempty()
    }

    /// Serializes the table into a byte vector.
    pub fn serialize(&self) -> Result<Vec<u8>, Error> {
        let mut bytes = Vec::with_capacity(self.serialized_size());
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }

    /// Deserializes a table from bytes produced by [`serialize`](Self::serialize).
    ///
    /// Bytes left over after the data section are rejected as corrupt.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        let mut slice = bytes;
        let table = Self::read_from(&mut slice)?;
        if !slice.is_empty() {
            return Err(Error::corrupt(format!(
                "{} trailing bytes after data section",
                slice.len()
            )));
        }
        Ok(table)
    }

    /// Writes the table to the file at `path`, replacing its contents.
    ///
    /// The file is opened and closed within this call, whether or not the
    /// write succeeds.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|err| Error::io("file", err).with_context("path", path.display()))?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer
            .into_inner()
            .map_err(|err| Error::io("file", err.into_error()).with_context("path", path.display()))?;

        debug!(
            path = %path.display(),
            size = self.size(),
            num_nonempty = self.num_nonempty(),
            "saved sparse table"
        );
        Ok(())
    }

    /// Reads a table from the file at `path`.
    ///
    /// The file must hold exactly one serialized table.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|err| Error::io("file", err).with_context("path", path.display()))?;
        let mut reader = BufReader::new(file);
        let table = Self::read_from(&mut reader)?;

        let trailing = reader.fill_buf().map_err(read_error("file"))?;
        if !trailing.is_empty() {
            return Err(
                Error::corrupt("trailing bytes after data section").with_context("path", path.display())
            );
        }

        debug!(
            path = %path.display(),
            size = table.size(),
            num_nonempty = table.num_nonempty(),
            "loaded sparse table"
        );
        Ok(table)
    }
}

/// The decoded metadata section of a serialized table.
///
/// It knows which slots are occupied but holds no values; call
/// [`read_nopointer_data`](Self::read_nopointer_data) on the same stream to
/// finish decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableMetadata<const G: usize = DEFAULT_GROUP_SIZE> {
    size: usize,
    num_nonempty: usize,
    bitmaps: Vec<u64>,
}

impl<const G: usize> TableMetadata<G> {
    fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, Error> {
        let size = reader
            .read_u64::<LittleEndian>()
            .map_err(read_error("virtual_size"))?;
        let size = usize::try_from(size).map_err(|_| {
            Error::corrupt(format!("virtual size {size} exceeds the address space"))
                .with_context("field", "virtual_size")
        })?;

        let num_groups = size.div_ceil(G);
        let mut bitmaps = Vec::with_capacity(num_groups.min(MAX_PREALLOCATED_GROUPS));
        let mut num_nonempty = 0usize;
        for group_index in 0..num_groups {
            let bitmap = reader
                .read_u64::<LittleEndian>()
                .map_err(read_error("bitmap"))?;

            let slots = (size - group_index * G).min(G);
            let valid = u64::MAX >> (64 - slots);
            if bitmap & !valid != 0 {
                return Err(Error::corrupt(format!(
                    "bitmap {bitmap:#x} of group {group_index} marks slots beyond the table"
                ))
                .with_context("field", "bitmap")
                .with_context("group", group_index));
            }

            num_nonempty += bitmap.count_ones() as usize;
            bitmaps.push(bitmap);
        }

        Ok(Self {
            size,
            num_nonempty,
            bitmaps,
        })
    }

    /// Returns the virtual size of the serialized table.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the number of groups in the serialized table.
    pub fn num_groups(&self) -> usize {
        self.bitmaps.len()
    }

    /// Returns the number of occupied slots, which is also the number of
    /// values in the data section.
    pub fn num_nonempty(&self) -> usize {
        self.num_nonempty
    }

    /// Returns whether the slot at `index` is occupied.
    pub fn contains(&self, index: usize) -> Result<bool, Error> {
        if index >= self.size {
            return Err(Error::index_out_of_range(index, self.size));
        }
        Ok(self.bitmaps[index / G] & (1u64 << (index % G)) != 0)
    }

    /// Reads the data section and assembles the table.
    ///
    /// Nothing is returned unless every value was read.
    pub fn read_nopointer_data<T: FixedValue, R: Read + ?Sized>(
        self,
        reader: &mut R,
    ) -> Result<SparseTable<T, G>, Error> {
        let mut groups = Vec::with_capacity(self.bitmaps.len());
        for bitmap in self.bitmaps {
            let count = bitmap.count_ones() as usize;
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                values.push(T::read_from(reader).map_err(read_error("value"))?);
            }
            groups.push(SparseGroup::from_parts(bitmap, values)?);
        }
        Ok(SparseTable::from_groups(self.size, groups))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    type Table4 = SparseTable<u64, 4>;

    fn scenario() -> Table4 {
        let mut table = Table4::with_size(10);
        table.set(0, 100).unwrap();
        table.set(3, 101).unwrap();
        table.set(7, 102).unwrap();
        table
    }

    #[test]
    fn test_exact_layout() {
        let bytes = scenario().serialize().unwrap();

        let mut expected = vec![];
        expected.extend_from_slice(&10u64.to_le_bytes());
        expected.extend_from_slice(&0b1001u64.to_le_bytes());
        expected.extend_from_slice(&0b1000u64.to_le_bytes());
        expected.extend_from_slice(&0u64.to_le_bytes());
        expected.extend_from_slice(&100u64.to_le_bytes());
        expected.extend_from_slice(&101u64.to_le_bytes());
        expected.extend_from_slice(&102u64.to_le_bytes());
        assert_eq!(bytes, expected);
        assert_eq!(bytes.len(), scenario().serialized_size());
    }

    #[test]
    fn test_sections_are_separable() {
        let table = scenario();
        let mut metadata = vec![];
        table.write_metadata(&mut metadata).unwrap();
        assert_eq!(metadata.len(), 8 * 4);

        let mut data = vec![];
        table.write_nopointer_data(&mut data).unwrap();
        assert_eq!(data.len(), 8 * 3);

        let mut stream = metadata.as_slice().chain(data.as_slice());
        let decoded = Table4::read_metadata(&mut stream).unwrap();
        assert_eq!(decoded.size(), 10);
        assert_eq!(decoded.num_groups(), 3);
        assert_eq!(decoded.num_nonempty(), 3);
        assert!(decoded.contains(7).unwrap());
        assert!(!decoded.contains(8).unwrap());
        assert!(decoded.contains(10).is_err());

        let restored: Table4 = decoded.read_nopointer_data(&mut stream).unwrap();
        assert_eq!(restored, table);
    }

    #[test]
    fn test_empty_table_round_trip() {
        let table: SparseTable<u32> = SparseTable::new();
        let bytes = table.serialize().unwrap();
        assert_eq!(bytes, 0u64.to_le_bytes());
        assert_eq!(SparseTable::<u32>::deserialize(&bytes).unwrap(), table);
    }

    #[test]
    fn test_truncated_metadata() {
        let bytes = scenario().serialize().unwrap();
        for len in [0, 5, 8, 20, 31] {
            let err = Table4::deserialize(&bytes[..len]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::CorruptData, "len={len}");
        }
    }

    #[test]
    fn test_truncated_data() {
        let bytes = scenario().serialize().unwrap();
        let err = Table4::deserialize(&bytes[..bytes.len() - 1]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptData);
        assert_eq!(err.context("field"), Some("value"));
    }

    #[test]
    fn test_bits_beyond_size_are_corrupt() {
        let mut bytes = scenario().serialize().unwrap();
        // last group covers indices 8 and 9 only
        bytes[24..32].copy_from_slice(&0b100u64.to_le_bytes());
        let err = Table4::deserialize(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptData);
        assert_eq!(err.context("group"), Some("2"));
    }

    #[test]
    fn test_bits_beyond_group_are_corrupt() {
        let mut bytes = vec![];
        bytes.extend_from_slice(&8u64.to_le_bytes());
        bytes.extend_from_slice(&0b1_0000u64.to_le_bytes());
        bytes.extend_from_slice(&0u64.to_le_bytes());
        let err = Table4::read_metadata(&mut bytes.as_slice()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptData);
    }

    #[test]
    fn test_trailing_bytes_are_corrupt() {
        let mut bytes = scenario().serialize().unwrap();
        bytes.push(0);
        let err = Table4::deserialize(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptData);
    }

    #[test]
    fn test_huge_size_without_bitmaps_is_corrupt() {
        let bytes = u64::MAX.to_le_bytes();
        let err = Table4::deserialize(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptData);
    }
}
