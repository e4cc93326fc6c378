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

use crate::error::Error;

/// A fixed-capacity bucket of `G` logical slots.
///
/// Occupancy lives in a single `u64` bitmap; only the occupied values are
/// stored, densely and in slot order, so the value for slot `offset` sits at
/// the rank of its bit (the number of set bits below it). The dense slice is
/// sized exactly to the population count: an empty group owns no heap memory.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct SparseGroup<T, const G: usize> {
    /// Bit `k` set means slot `k` holds a value. Bits `>= G` are always clear.
    bitmap: u64,
    /// Occupied values in rank order, `values.len() == bitmap.count_ones()`.
    values: Box<[T]>,
}

impl<T, const G: usize> SparseGroup<T, G> {
    /// Mask covering every valid slot of the group.
    pub(crate) const SLOT_MASK: u64 = u64::MAX >> (64 - G);

    pub fn new() -> Self {
        const { assert!(G > 0 && G <= 64, "group size must be in [1, 64]") };
        Self {
            bitmap: 0,
            values: Box::default(),
        }
    }

    /// Rebuilds a group from a bitmap and its values in rank order.
    pub fn from_parts(bitmap: u64, values: Vec<T>) -> Result<Self, Error> {
        if bitmap & !Self::SLOT_MASK != 0 {
            return Err(Error::corrupt(format!(
                "bitmap {bitmap:#x} has bits beyond group size {G}"
            )));
        }
        if values.len() != bitmap.count_ones() as usize {
            return Err(Error::corrupt(format!(
                "bitmap {bitmap:#x} marks {} slots but {} values were given",
                bitmap.count_ones(),
                values.len()
            )));
        }
        let mut group = Self::new();
        group.bitmap = bitmap;
        group.values = values.into_boxed_slice();
        Ok(group)
    }

    pub fn bitmap(&self) -> u64 {
        self.bitmap
    }

    pub fn num_nonempty(&self) -> usize {
        self.values.len()
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.bitmap & Self::bit(offset) != 0
    }

    pub fn get(&self, offset: usize) -> Option<&T> {
        if self.contains(offset) {
            Some(&self.values[self.rank(offset)])
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, offset: usize) -> Option<&mut T> {
        if self.contains(offset) {
            let rank = self.rank(offset);
            Some(&mut self.values[rank])
        } else {
            None
        }
    }

    /// Stores `value` at `offset`, returning the value it replaced.
    ///
    /// `None` means the slot was empty and is now newly occupied.
    pub fn set(&mut self, offset: usize, value: T) -> Option<T> {
        let rank = self.rank(offset);
        if self.contains(offset) {
            return Some(std::mem::replace(&mut self.values[rank], value));
        }

        let mut values = std::mem::take(&mut self.values).into_vec();
        values.reserve_exact(1);
        values.insert(rank, value);
        self.values = values.into_boxed_slice();
        self.bitmap |= Self::bit(offset);
        None
    }

    /// Empties the slot at `offset`, returning the value it held.
    pub fn erase(&mut self, offset: usize) -> Option<T> {
        if !self.contains(offset) {
            return None;
        }

        let rank = self.rank(offset);
        let mut values = std::mem::take(&mut self.values).into_vec();
        let removed = values.remove(rank);
        self.values = values.into_boxed_slice();
        self.bitmap &= !Self::bit(offset);
        Some(removed)
    }

    /// Drops every occupied slot at offset `len` or above and returns how
    /// many were dropped.
    pub fn truncate(&mut self, len: usize) -> usize {
        if len >= G {
            return 0;
        }

        let keep = self.rank(len);
        let dropped = self.values.len() - keep;
        if dropped > 0 {
            let mut values = std::mem::take(&mut self.values).into_vec();
            values.truncate(keep);
            self.values = values.into_boxed_slice();
            self.bitmap &= Self::bit(len) - 1;
        }
        dropped
    }

    pub fn clear(&mut self) {
        self.bitmap = 0;
        self.values = Box::default();
    }

    /// Occupied slots as `(offset, value)` in ascending offset order.
    pub fn iter(&self) -> GroupIter<'_, T> {
        GroupIter {
            bitmap: self.bitmap,
            values: self.values.iter(),
        }
    }

    /// Values in rank order, which is also ascending offset order.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Number of set bits strictly below `offset`.
    fn rank(&self, offset: usize) -> usize {
        (self.bitmap & (Self::bit(offset) - 1)).count_ones() as usize
    }

    fn bit(offset: usize) -> u64 {
        assert!(offset < G, "offset {offset} out of group of size {G}");
        1u64 << offset
    }
}

impl<T, const G: usize> Default for SparseGroup<T, G> {
    fn default() -> Self {
        Self::new()
    }
}

/// Walks the set bits of a group bitmap alongside its dense values.
pub(crate) struct GroupIter<'a, T> {
    bitmap: u64,
    values: std::slice::Iter<'a, T>,
}

impl<'a, T> Iterator for GroupIter<'a, T> {
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.bitmap == 0 {
            return None;
        }
        let offset = self.bitmap.trailing_zeros() as usize;
        // clear lowest set bit
        self.bitmap &= self.bitmap - 1;
        self.values.next().map(|value| (offset, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.values.size_hint()
    }
}

impl<T> ExactSizeIterator for GroupIter<'_, T> {}
