#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// A hash map built on the Fibonacci-hashing table.
///
/// This module provides a `HashMap` that wraps the `HashTable` with a
/// value-equality key policy and a configurable hasher builder.
pub mod hash_map;

/// The underlying open-addressing table engine, parameterized over a key
/// policy.
pub mod hash_table;

/// A hash set built on the Fibonacci-hashing table.
///
/// This module provides a `HashSet` that stores keys only, sharing the
/// `HashTable` engine with the map.
pub mod hash_set;

/// Map and set variants keyed by reference identity instead of value
/// equality.
pub mod identity;

/// An insertion-ordered map decorator over the hash map.
pub mod ordered_map;

/// An insertion-ordered set decorator over the hash set.
pub mod ordered_set;

pub use hash_map::Entry;
pub use hash_map::HashMap;
pub use hash_set::HashSet;
pub use hash_table::HashTable;
pub use identity::IdentityMap;
pub use identity::IdentitySet;
pub use ordered_map::OrderedMap;
pub use ordered_set::OrderedSet;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// Default hasher builder: foldhash's fast `RandomState`.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// Default hasher builder: the standard library's SipHash
        /// `RandomState`.
        pub type DefaultHashBuilder = std::collections::hash_map::RandomState;
    } else {
        /// Placeholder default hasher builder.
        ///
        /// Uninhabited. Enable the `foldhash` or `std` feature for a usable
        /// default, or supply a `BuildHasher` explicitly.
        #[derive(Clone, Copy, Debug)]
        pub enum DefaultHashBuilder {}
    }
}
