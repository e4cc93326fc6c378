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

use std::iter::Enumerate;
use std::iter::FusedIterator;
use std::slice;

use crate::group::GroupIter;
use crate::group::SparseGroup;

/// Iterator over the occupied slots of a [`SparseTable`](crate::SparseTable)
/// as `(index, &value)`, in strictly ascending index order.
pub struct NonemptyIter<'a, T, const G: usize> {
    groups: Enumerate<slice::Iter<'a, SparseGroup<T, G>>>,
    /// First global index of the current group and the walk over its slots.
    current: Option<(usize, GroupIter<'a, T>)>,
    remaining: usize,
}

impl<'a, T, const G: usize> NonemptyIter<'a, T, G> {
    pub(crate) fn new(groups: &'a [SparseGroup<T, G>], num_nonempty: usize) -> Self {
        Self {
            groups: groups.iter().enumerate(),
            current: None,
            remaining: num_nonempty,
        }
    }
}

impl<'a, T, const G: usize> Iterator for NonemptyIter<'a, T, G> {
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((base, slots)) = &mut self.current {
                if let Some((offset, value)) = slots.next() {
                    self.remaining -= 1;
                    return Some((*base + offset, value));
                }
            }
            let (group_index, group) = self
                .groups
                .find(|(_, group)| group.num_nonempty() > 0)?;
            self.current = Some((group_index * G, group.iter()));
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, const G: usize> ExactSizeIterator for NonemptyIter<'_, T, G> {}

impl<T, const G: usize> FusedIterator for NonemptyIter<'_, T, G> {}
