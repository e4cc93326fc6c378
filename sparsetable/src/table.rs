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

use std::fmt;

use tracing::trace;

use crate::error::Error;
use crate::group::SparseGroup;
use crate::iter::NonemptyIter;

/// Default number of slots per group.
pub const DEFAULT_GROUP_SIZE: usize = 48;

/// A sparse array over a virtual index space of `size()` slots.
///
/// Slots are partitioned into groups of `G` slots; each group keeps an
/// occupancy bitmap plus a dense slice of only the occupied values, so an
/// empty slot costs a fraction of a bit once its group is allocated. Reads of
/// an empty slot yield the default value, much like indexing a plain array.
///
/// # Examples
///
/// ```
/// use sparsetable::SparseTable;
///
/// let mut table: SparseTable<u64> = SparseTable::with_size(1_000_000);
/// table.set(7, 100).unwrap();
/// table.set(999_999, 101).unwrap();
///
/// assert_eq!(table.get(7).unwrap(), 100);
/// assert_eq!(table.get(8).unwrap(), 0);
/// assert_eq!(table.num_nonempty(), 2);
/// assert!(table.set(1_000_000, 1).is_err());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SparseTable<T, const G: usize = DEFAULT_GROUP_SIZE> {
    size: usize,
    /// Cached total of occupied slots across all groups.
    num_nonempty: usize,
    groups: Vec<SparseGroup<T, G>>,
}

impl<T, const G: usize> SparseTable<T, G> {
    /// Number of slots per group.
    pub const GROUP_SIZE: usize = G;

    /// Creates an empty table with a virtual size of zero.
    pub fn new() -> Self {
        Self {
            size: 0,
            num_nonempty: 0,
            groups: Vec::new(),
        }
    }

    /// Creates a table of `size` empty slots.
    pub fn with_size(size: usize) -> Self {
        let mut table = Self::new();
        table.resize(size);
        table
    }

    pub(crate) fn from_groups(size: usize, groups: Vec<SparseGroup<T, G>>) -> Self {
        debug_assert_eq!(groups.len(), size.div_ceil(G));
        let num_nonempty = groups.iter().map(SparseGroup::num_nonempty).sum();
        Self {
            size,
            num_nonempty,
            groups,
        }
    }

    pub(crate) fn groups(&self) -> &[SparseGroup<T, G>] {
        &self.groups
    }

    /// Returns the virtual size of the table.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the number of occupied slots.
    pub fn num_nonempty(&self) -> usize {
        self.num_nonempty
    }

    /// Returns true if no slot is occupied, regardless of the virtual size.
    pub fn is_empty(&self) -> bool {
        self.num_nonempty == 0
    }

    /// Returns the number of groups backing the table.
    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    /// Changes the virtual size of the table.
    ///
    /// Growing appends empty slots. Shrinking discards every occupied slot at
    /// index `new_size` or above.
    pub fn resize(&mut self, new_size: usize) {
        let old_size = self.size;
        let num_groups = new_size.div_ceil(G);

        if new_size < old_size {
            let mut dropped: usize = self.groups[num_groups..]
                .iter()
                .map(SparseGroup::num_nonempty)
                .sum();
            self.groups.truncate(num_groups);
            self.groups.shrink_to_fit();

            let tail = new_size % G;
            if tail != 0 {
                if let Some(last) = self.groups.last_mut() {
                    dropped += last.truncate(tail);
                }
            }
            self.num_nonempty -= dropped;
        } else {
            self.groups.resize_with(num_groups, SparseGroup::new);
        }

        self.size = new_size;
        trace!(
            old_size,
            new_size,
            num_nonempty = self.num_nonempty,
            "resized sparse table"
        );
    }

    /// Returns whether the slot at `index` is occupied.
    pub fn contains(&self, index: usize) -> Result<bool, Error> {
        let (group, offset) = self.locate(index)?;
        Ok(self.groups[group].contains(offset))
    }

    /// Returns a reference to the value at `index`, or `None` if the slot is
    /// empty.
    pub fn try_get(&self, index: usize) -> Result<Option<&T>, Error> {
        let (group, offset) = self.locate(index)?;
        Ok(self.groups[group].get(offset))
    }

    /// Returns a mutable reference to the value at `index`, or `None` if the
    /// slot is empty.
    pub fn get_mut(&mut self, index: usize) -> Result<Option<&mut T>, Error> {
        let (group, offset) = self.locate(index)?;
        Ok(self.groups[group].get_mut(offset))
    }

    /// Returns the value at `index`, or `T::default()` if the slot is empty.
    ///
    /// Use [`contains`](Self::contains) or [`try_get`](Self::try_get) to tell
    /// an empty slot from a stored default value.
    pub fn get(&self, index: usize) -> Result<T, Error>
    where
        T: Clone + Default,
    {
        Ok(self.try_get(index)?.cloned().unwrap_or_default())
    }

    /// Stores `value` at `index` and returns the value it replaced, if any.
    pub fn set(&mut self, index: usize, value: T) -> Result<Option<T>, Error> {
        let (group, offset) = self.locate(index)?;
        let old = self.groups[group].set(offset, value);
        if old.is_none() {
            self.num_nonempty += 1;
        }
        Ok(old)
    }

    /// Empties the slot at `index` and returns the value it held, if any.
    pub fn erase(&mut self, index: usize) -> Result<Option<T>, Error> {
        let (group, offset) = self.locate(index)?;
        let removed = self.groups[group].erase(offset);
        if removed.is_some() {
            self.num_nonempty -= 1;
        }
        Ok(removed)
    }

    /// Empties every slot while keeping the virtual size.
    pub fn clear(&mut self) {
        self.groups.iter_mut().for_each(SparseGroup::clear);
        self.num_nonempty = 0;
    }

    /// Iterates over the occupied slots as `(index, &value)` in ascending
    /// index order.
    ///
    /// Every call starts a fresh pass from the first occupied slot. The
    /// iterator borrows the table, so the table cannot be resized or written
    /// to while a pass is in progress.
    pub fn iter_nonempty(&self) -> NonemptyIter<'_, T, G> {
        NonemptyIter::new(&self.groups, self.num_nonempty)
    }

    fn locate(&self, index: usize) -> Result<(usize, usize), Error> {
        if index >= self.size {
            return Err(Error::index_out_of_range(index, self.size));
        }
        Ok((index / G, index % G))
    }
}

impl<T, const G: usize> Default for SparseTable<T, G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const G: usize> fmt::Debug for SparseTable<T, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseTable")
            .field("size", &self.size)
            .field("group_size", &G)
            .field("num_groups", &self.groups.len())
            .field("num_nonempty", &self.num_nonempty)
            .finish()
    }
}

impl<'a, T, const G: usize> IntoIterator for &'a SparseTable<T, G> {
    type Item = (usize, &'a T);
    type IntoIter = NonemptyIter<'a, T, G>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_nonempty()
    }
}
