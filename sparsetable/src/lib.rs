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

//! A sparse array over a huge virtual index space.
//!
//! [`SparseTable`] addresses up to `usize::MAX` slots while storing only the
//! occupied ones. Slots are split into fixed-size groups, each holding an
//! occupancy bitmap and a dense slice of its values, which keeps the cost of
//! an empty slot well under one byte and every access O(1).
//!
//! Tables serialize to a compact two-section binary format (occupancy
//! metadata, then raw values) that can be written to and read back from any
//! [`std::io::Write`] / [`std::io::Read`], or a file path.
//!
//! # Usage
//!
//! ```rust
//! use sparsetable::SparseTable;
//!
//! let mut table = SparseTable::<u64, 4>::with_size(10);
//! table.set(0, 100).unwrap();
//! table.set(3, 101).unwrap();
//! table.set(7, 102).unwrap();
//! assert_eq!(table.num_nonempty(), 3);
//!
//! let bytes = table.serialize().unwrap();
//! let restored = SparseTable::<u64, 4>::deserialize(&bytes).unwrap();
//! let entries: Vec<_> = restored.iter_nonempty().collect();
//! assert_eq!(entries, vec![(0, &100), (3, &101), (7, &102)]);
//!
//! table.resize(5);
//! assert_eq!(table.num_nonempty(), 2);
//! assert!(table.get(7).is_err());
//! ```
//!
//! # Concurrency
//!
//! A table has no internal synchronization. Share it across threads behind
//! an exclusive lock, or partition the index space over several tables.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]

pub mod error;
pub mod random;

mod codec;
mod group;
mod iter;
mod serialization;
mod table;

pub use self::codec::FixedValue;
pub use self::iter::NonemptyIter;
pub use self::serialization::TableMetadata;
pub use self::table::DEFAULT_GROUP_SIZE;
pub use self::table::SparseTable;
