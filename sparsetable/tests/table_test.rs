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

mod common;

use common::collect_entries;
use common::example_table;
use googletest::assert_that;
use googletest::prelude::contains_substring;
use sparsetable::SparseTable;
use sparsetable::error::ErrorKind;

#[test]
fn test_example_scenario() {
    let mut table = example_table();
    assert_eq!(table.num_nonempty(), 3);
    assert_eq!(
        collect_entries(&table),
        vec![(0, 100), (3, 101), (7, 102)]
    );

    let bytes = table.serialize().unwrap();
    let restored = SparseTable::<u64, 4>::deserialize(&bytes).unwrap();
    assert_eq!(collect_entries(&restored), collect_entries(&table));

    table.resize(5);
    assert_eq!(table.num_nonempty(), 2);
    let err = table.get(7).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
    assert_that!(err.message(), contains_substring("index 7 out of range"));
}

#[test]
fn test_index_correspondence() {
    let mut table: SparseTable<i32> = SparseTable::with_size(500);
    for i in (0..500).step_by(7) {
        table.set(i, -(i as i32)).unwrap();
    }
    for i in 0..500 {
        if i % 7 == 0 {
            assert_eq!(table.get(i).unwrap(), -(i as i32));
            assert!(table.contains(i).unwrap());
        } else {
            assert_eq!(table.get(i).unwrap(), 0);
            assert!(!table.contains(i).unwrap());
        }
    }

    for i in (0..500).step_by(14) {
        assert_eq!(table.erase(i).unwrap(), Some(-(i as i32)));
        assert!(!table.contains(i).unwrap());
        assert_eq!(table.get(i).unwrap(), 0);
    }
    assert_eq!(table.num_nonempty(), 36);
}

#[test]
fn test_large_virtual_size() {
    let size = 1usize << 24;
    let mut table: SparseTable<u64> = SparseTable::with_size(size);
    table.set(size - 1, 1).unwrap();
    table.set(size / 2, 2).unwrap();
    table.set(0, 3).unwrap();

    assert_eq!(table.num_groups(), size.div_ceil(48));
    assert_eq!(
        collect_entries(&table),
        vec![(0, 3), (size / 2, 2), (size - 1, 1)]
    );
    assert_eq!(table.serialized_size(), 8 + 8 * table.num_groups() + 3 * 8);
}

#[test]
fn test_out_of_range_on_every_accessor() {
    let mut table: SparseTable<u8, 8> = SparseTable::with_size(16);
    assert_eq!(table.get(16).unwrap_err().kind(), ErrorKind::IndexOutOfRange);
    assert_eq!(table.try_get(16).unwrap_err().kind(), ErrorKind::IndexOutOfRange);
    assert_eq!(table.contains(16).unwrap_err().kind(), ErrorKind::IndexOutOfRange);
    assert_eq!(table.set(16, 1).unwrap_err().kind(), ErrorKind::IndexOutOfRange);
    assert_eq!(table.erase(16).unwrap_err().kind(), ErrorKind::IndexOutOfRange);
    assert_eq!(table.get_mut(16).unwrap_err().kind(), ErrorKind::IndexOutOfRange);
    assert!(table.is_empty());
}

#[test]
fn test_full_group_boundaries() {
    let mut table: SparseTable<u16, 64> = SparseTable::with_size(200);
    for i in [0, 63, 64, 127, 128, 199] {
        table.set(i, i as u16).unwrap();
    }
    assert_eq!(
        collect_entries(&table),
        vec![(0, 0), (63, 63), (64, 64), (127, 127), (128, 128), (199, 199)]
    );
    table.resize(128);
    assert_eq!(table.num_nonempty(), 4);
    table.resize(64);
    assert_eq!(
        collect_entries(&table),
        vec![(0, 0), (63, 63)]
    );
}

#[test]
fn test_clone_is_independent() {
    let original = example_table();
    let mut copy = original.clone();
    copy.set(1, 1).unwrap();
    assert_eq!(original.num_nonempty(), 3);
    assert_eq!(copy.num_nonempty(), 4);
    assert_ne!(original, copy);
}
