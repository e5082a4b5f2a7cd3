//! Slotted - Cursor Addressed Collections
//!
//! Three classic containers backed by slot arenas instead of per-node heap
//! allocations: a doubly [linked list](crate::list::LinkedList), an
//! [unbalanced binary search tree map](crate::treemap::TreeMap), and a
//! [fixed-bucket chained hash map](crate::hashmap::HashMap). Elements live
//! in numbered slots, and positions are handed out as small `Copy` cursors
//! that a caller can hold across mutations.
//!
//! Holding a position across mutations is exactly where pointer-based
//! containers turn into use-after-free bugs, so the cursor protocol here is
//! checked: list and tree cursors carry the generation of the slot they
//! were minted against, and any use after that element was removed reports
//! [`Error::NoSuchElement`] instead of touching whatever tenant now
//! occupies the slot. Navigation is explicit - `next` and `prev` return a
//! `Result` rather than stepping silently off either end.
//!
//! The containers are deliberately plain: the tree performs no rebalancing
//! and the hash map never rehashes, so degenerate workloads degrade the way
//! the textbook says they should. The bundled benchmarks drive both maps
//! through identical insert, remove, lookup and traversal phases to make
//! those curves visible. The crate contains no unsafe code.
//!
//! # Features
//! * `serde` - serialize and deserialize support for all three containers
//!
//! `serde` is disabled by default.

#![deny(warnings)]
#![warn(unused_extern_crates)]
#![warn(missing_docs)]
#![allow(clippy::needless_lifetimes)]
#![forbid(unsafe_code)]

pub mod error;
pub use error::Error;

mod arena;

pub mod list;
pub use list::LinkedList;

pub mod treemap;
pub use treemap::TreeMap;

pub mod hashmap;
pub use hashmap::HashMap;

#[cfg(feature = "serde")]
mod utils;
