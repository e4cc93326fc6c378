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

#![allow(dead_code)]

use std::io;
use std::io::Write;

use sparsetable::SparseTable;

/// Builds the table used throughout the tests: size 10, group size 4,
/// occupied at 0, 3 and 7.
pub fn example_table() -> SparseTable<u64, 4> {
    let mut table = SparseTable::with_size(10);
    table.set(0, 100).unwrap();
    table.set(3, 101).unwrap();
    table.set(7, 102).unwrap();
    table
}

pub fn collect_entries<T: Copy, const G: usize>(table: &SparseTable<T, G>) -> Vec<(usize, T)> {
    table.iter_nonempty().map(|(i, v)| (i, *v)).collect()
}

/// A sink that accepts `capacity` bytes and fails every write after that.
pub struct LimitedWriter {
    written: Vec<u8>,
    capacity: usize,
}

impl LimitedWriter {
    pub fn new(capacity: usize) -> Self {
        Self {
            written: vec![],
            capacity,
        }
    }

    pub fn written(&self) -> &[u8] {
        &self.written
    }
}

impl Write for LimitedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let room = self.capacity - self.written.len();
        if room == 0 {
            return Err(io::Error::other("sink is full"));
        }
        let n = room.min(buf.len());
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
