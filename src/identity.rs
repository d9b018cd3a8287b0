//! Reference-identity keyed map and set.
//!
//! [`IdentityMap`] and [`IdentitySet`] compare keys by the address of the
//! object they refer to instead of by `Hash`/`Eq`. Two keys are the same
//! entry only when they point at the same allocation, so two value-equal
//! strings in different allocations occupy two entries. The address itself
//! feeds the table's Fibonacci placement, so no hasher builder is involved
//! and lookups never run user hashing code.
//!
//! Keys must implement [`ReferenceKey`], which pins down what "the address"
//! means for a type. Implementations are provided for `Rc`, `Arc`, and
//! shared references.

use core::fmt::Debug;

use alloc::rc::Rc;
#[cfg(target_has_atomic = "ptr")]
use alloc::sync::Arc;

use crate::hash_table::Entry;
use crate::hash_table::HashTable;
use crate::hash_table::KeyPolicy;

/// A key type with a stable referent address.
///
/// The returned pointer must not change for as long as the key is stored in
/// a table. Pointer-stable handles like `Rc` and `Arc` satisfy this
/// naturally; plain references satisfy it for the lifetime of the borrow.
pub trait ReferenceKey {
    /// Returns the address of the referent.
    fn referent(&self) -> *const ();
}

impl<T: ?Sized> ReferenceKey for Rc<T> {
    fn referent(&self) -> *const () {
        Rc::as_ptr(self).cast()
    }
}

#[cfg(target_has_atomic = "ptr")]
impl<T: ?Sized> ReferenceKey for Arc<T> {
    fn referent(&self) -> *const () {
        Arc::as_ptr(self).cast()
    }
}

impl<T: ?Sized> ReferenceKey for &T {
    fn referent(&self) -> *const () {
        (*self as *const T).cast()
    }
}

/// Key policy that hashes and compares referent addresses.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl<K> KeyPolicy<K> for Identity
where
    K: ReferenceKey,
{
    fn hash(&self, key: &K) -> u64 {
        key.referent() as usize as u64
    }

    fn eq(&self, a: &K, b: &K) -> bool {
        core::ptr::eq(a.referent(), b.referent())
    }
}

/// A hash map keyed by reference identity.
///
/// Entries match only when their keys point at the same allocation. Useful
/// for interning, object-graph traversals, and caches keyed by handle
/// rather than by value.
///
/// # Examples
///
/// ```rust
/// use std::rc::Rc;
///
/// use fib_hash::IdentityMap;
///
/// let a = Rc::new("key".to_string());
/// let b = Rc::new("key".to_string());
///
/// let mut map = IdentityMap::new();
/// map.insert(a.clone(), 1);
/// map.insert(b.clone(), 2);
///
/// // Value-equal but distinct allocations are distinct entries.
/// assert_eq!(map.len(), 2);
/// assert_eq!(map.get(&a), Some(&1));
/// assert_eq!(map.get(&b), Some(&2));
/// ```
#[derive(Clone)]
pub struct IdentityMap<K, V> {
    table: HashTable<K, V, Identity>,
}

impl<K, V> IdentityMap<K, V>
where
    K: ReferenceKey,
{
    /// Creates a new empty map.
    pub fn new() -> Self {
        Self {
            table: HashTable::with_policy(Identity),
        }
    }

    /// Creates a new map with at least `capacity` slots. The slot count is
    /// rounded up to the next power of two.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: HashTable::with_capacity_and_policy(capacity, Identity),
        }
    }

    /// Creates a new map with at least `capacity` slots and the given load
    /// factor.
    ///
    /// # Panics
    ///
    /// Panics if `load_factor` is not in `(0, 1]`.
    pub fn with_capacity_and_load_factor(capacity: usize, load_factor: f32) -> Self {
        Self {
            table: HashTable::with_capacity_load_factor_and_policy(capacity, load_factor, Identity),
        }
    }

    /// Returns the number of entries in the map.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the current slot count of the backing table.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the map's load factor.
    pub fn load_factor(&self) -> f32 {
        self.table.load_factor()
    }

    /// Inserts a key-value pair, matching existing keys by referent
    /// address. Returns the previous value if the same referent was already
    /// present.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.table.insert(key, value)
    }

    /// Returns the value stored for the referent of `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.table.get(key)
    }

    /// Returns a mutable reference to the value stored for the referent of
    /// `key`.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.table.get_mut(key)
    }

    /// Returns the stored key and value for the referent of `key`.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.table.get_key_value(key)
    }

    /// Returns the value for the referent of `key`, or `default` if absent.
    pub fn get_or<'a>(&'a self, key: &K, default: &'a V) -> &'a V {
        self.table.get_or(key, default)
    }

    /// Returns `true` if the map has an entry for the referent of `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.table.contains_key(key)
    }

    /// Removes the entry for the referent of `key`, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.table.remove(key)
    }

    /// Removes the entry for the referent of `key`, returning the stored
    /// key and value.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        self.table.remove_entry(key)
    }

    /// Gets the entry for the referent of `key` for in-place manipulation.
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, Identity> {
        self.table.entry(key)
    }

    /// Removes all entries, keeping the allocated capacity.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Removes all entries and shrinks the backing table to at most
    /// `maximum_capacity` slots.
    pub fn clear_to(&mut self, maximum_capacity: usize) {
        self.table.clear_to(maximum_capacity);
    }

    /// Shrinks the backing table to `maximum_capacity` slots or less, but
    /// never below what the current entries need.
    pub fn shrink(&mut self, maximum_capacity: usize) {
        self.table.shrink(maximum_capacity);
    }

    /// Grows the backing table so `additional` more entries fit without
    /// rehashing.
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    /// Retains only the entries for which the predicate returns `true`.
    pub fn retain(&mut self, f: impl FnMut(&K, &mut V) -> bool) {
        self.table.retain(f);
    }

    /// Returns the first key whose value satisfies the predicate. Scans the
    /// whole map.
    pub fn find_key_by(&self, pred: impl FnMut(&V) -> bool) -> Option<&K> {
        self.table.find_key_by(pred)
    }

    /// Returns an iterator that removes and yields all entries.
    pub fn drain(&mut self) -> crate::hash_table::Drain<'_, K, V> {
        self.table.drain()
    }
}

impl<K, V> IdentityMap<K, V> {
    /// Returns an iterator over the entries of the map in arbitrary order.
    pub fn iter(&self) -> crate::hash_table::Iter<'_, K, V> {
        self.table.iter()
    }

    /// Returns an iterator over the entries with mutable values.
    pub fn iter_mut(&mut self) -> crate::hash_table::IterMut<'_, K, V> {
        self.table.iter_mut()
    }
}

impl<K, V> Default for IdentityMap<K, V>
where
    K: ReferenceKey,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Debug for IdentityMap<K, V>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in self.iter() {
            map.entry(k, v);
        }
        map.finish()
    }
}

impl<K, V> Extend<(K, V)> for IdentityMap<K, V>
where
    K: ReferenceKey,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for IdentityMap<K, V>
where
    K: ReferenceKey,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K, V> IntoIterator for IdentityMap<K, V> {
    type IntoIter = crate::hash_table::IntoIter<K, V>;
    type Item = (K, V);

    fn into_iter(self) -> Self::IntoIter {
        self.table.into_iter()
    }
}

impl<'a, K, V> IntoIterator for &'a IdentityMap<K, V> {
    type IntoIter = crate::hash_table::Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V> IntoIterator for &'a mut IdentityMap<K, V> {
    type IntoIter = crate::hash_table::IterMut<'a, K, V>;
    type Item = (&'a K, &'a mut V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// A hash set keyed by reference identity.
///
/// Two handles are the same member only when they point at the same
/// allocation.
///
/// # Examples
///
/// ```rust
/// use std::rc::Rc;
///
/// use fib_hash::IdentitySet;
///
/// let a = Rc::new(1);
/// let b = Rc::new(1);
///
/// let mut set = IdentitySet::new();
/// assert!(set.insert(a.clone()));
/// assert!(set.insert(b));
/// assert!(!set.insert(a));
/// assert_eq!(set.len(), 2);
/// ```
#[derive(Clone)]
pub struct IdentitySet<T> {
    table: HashTable<T, (), Identity>,
}

impl<T> IdentitySet<T>
where
    T: ReferenceKey,
{
    /// Creates a new empty set.
    pub fn new() -> Self {
        Self {
            table: HashTable::with_policy(Identity),
        }
    }

    /// Creates a new set with at least `capacity` slots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: HashTable::with_capacity_and_policy(capacity, Identity),
        }
    }

    /// Returns the number of values in the set.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the set contains no values.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the current slot count of the backing table.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Adds a value to the set. Returns `true` if no handle with the same
    /// referent was already present.
    pub fn insert(&mut self, value: T) -> bool {
        self.table.insert(value, ()).is_none()
    }

    /// Returns `true` if the set contains a handle with the same referent
    /// as `value`.
    pub fn contains(&self, value: &T) -> bool {
        self.table.contains_key(value)
    }

    /// Returns the stored handle with the same referent as `value`, if any.
    pub fn get(&self, value: &T) -> Option<&T> {
        self.table.get_key_value(value).map(|(k, _)| k)
    }

    /// Removes the handle with the same referent as `value`. Returns `true`
    /// if it was present.
    pub fn remove(&mut self, value: &T) -> bool {
        self.table.remove(value).is_some()
    }

    /// Removes and returns the stored handle with the same referent as
    /// `value`, if any.
    pub fn take(&mut self, value: &T) -> Option<T> {
        self.table.remove_entry(value).map(|(k, ())| k)
    }

    /// Removes all values, keeping the allocated capacity.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Removes all values and shrinks the backing table to at most
    /// `maximum_capacity` slots.
    pub fn clear_to(&mut self, maximum_capacity: usize) {
        self.table.clear_to(maximum_capacity);
    }

    /// Retains only the values specified by the predicate.
    pub fn retain(&mut self, mut f: impl FnMut(&T) -> bool) {
        self.table.retain(|k, ()| f(k));
    }
}

impl<T> IdentitySet<T> {
    /// Returns an iterator over the values of the set in arbitrary order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.table.iter(),
        }
    }
}

impl<T> Default for IdentitySet<T>
where
    T: ReferenceKey,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for IdentitySet<T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T> Extend<T> for IdentitySet<T>
where
    T: ReferenceKey,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T> FromIterator<T> for IdentitySet<T>
where
    T: ReferenceKey,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<T> IntoIterator for IdentitySet<T> {
    type IntoIter = IntoIter<T>;
    type Item = T;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

impl<'a, T> IntoIterator for &'a IdentitySet<T> {
    type IntoIter = Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

/// An iterator over the values of an `IdentitySet`.
#[derive(Clone)]
pub struct Iter<'a, T> {
    inner: crate::hash_table::Iter<'a, T, ()>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, ())| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> core::iter::FusedIterator for Iter<'_, T> {}

/// A consuming iterator over the values of an `IdentitySet`.
pub struct IntoIter<T> {
    inner: crate::hash_table::IntoIter<T, ()>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, ())| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}
impl<T> core::iter::FusedIterator for IntoIter<T> {}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec::Vec;

    use super::*;

    #[test]
    fn test_distinct_allocations_are_distinct_keys() {
        let a = Rc::new("key".to_string());
        let b = Rc::new("key".to_string());
        assert_eq!(*a, *b);

        let mut map = IdentityMap::new();
        map.insert(a.clone(), 1);
        map.insert(b.clone(), 2);

        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&a), Some(&1));
        assert_eq!(map.get(&b), Some(&2));
    }

    #[test]
    fn test_clones_share_an_entry() {
        let a = Rc::new(42);
        let b = a.clone();

        let mut map = IdentityMap::new();
        assert_eq!(map.insert(a, "first"), None);
        assert_eq!(map.insert(b.clone(), "second"), Some("first"));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&b), Some(&"second"));
    }

    #[test]
    fn test_value_equal_map_collapses_where_identity_map_does_not() {
        let a = Rc::new("dup".to_string());
        let b = Rc::new("dup".to_string());

        let mut by_value: crate::HashMap<Rc<alloc::string::String>, i32> = crate::HashMap::new();
        by_value.insert(a.clone(), 1);
        by_value.insert(b.clone(), 2);
        assert_eq!(by_value.len(), 1);

        let mut by_identity = IdentityMap::new();
        by_identity.insert(a, 1);
        by_identity.insert(b, 2);
        assert_eq!(by_identity.len(), 2);
    }

    #[test]
    fn test_reference_keys() {
        let first = 1;
        let second = 1;

        let mut set = IdentitySet::new();
        assert!(set.insert(&first));
        assert!(set.insert(&second));
        assert!(!set.insert(&first));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&&first));
        assert!(set.remove(&&second));
        assert_eq!(set.len(), 1);
    }

    #[cfg(target_has_atomic = "ptr")]
    #[test]
    fn test_arc_keys() {
        let a = Arc::new([1u8, 2, 3]);
        let b = a.clone();

        let mut map = IdentityMap::new();
        map.insert(a, "slice");
        assert_eq!(map.get(&b), Some(&"slice"));
        assert_eq!(map.remove(&b), Some("slice"));
        assert!(map.is_empty());
    }

    #[test]
    fn test_removal_under_address_collisions() {
        let handles: Vec<Rc<i32>> = (0..200).map(Rc::new).collect();

        let mut map = IdentityMap::new();
        for (i, handle) in handles.iter().enumerate() {
            map.insert(handle.clone(), i);
        }
        assert_eq!(map.len(), 200);

        for handle in handles.iter().step_by(2) {
            assert!(map.remove(handle).is_some());
        }
        assert_eq!(map.len(), 100);
        for (i, handle) in handles.iter().enumerate() {
            assert_eq!(map.get(handle).is_some(), i % 2 == 1);
        }
    }

    #[test]
    fn test_entry_api() {
        let key = Rc::new("counter");

        let mut map = IdentityMap::new();
        *map.entry(key.clone()).or_insert(0) += 1;
        *map.entry(key.clone()).or_insert(0) += 1;
        assert_eq!(map.get(&key), Some(&2));
    }

    #[test]
    fn test_retain_and_iterators() {
        let handles: Vec<Rc<i32>> = (0..10).map(Rc::new).collect();

        let mut map: IdentityMap<Rc<i32>, i32> = handles
            .iter()
            .map(|handle| (handle.clone(), **handle))
            .collect();
        map.retain(|_, value| *value % 2 == 0);
        assert_eq!(map.len(), 5);

        let mut values: Vec<i32> = map.iter().map(|(_, v)| *v).collect();
        values.sort_unstable();
        assert_eq!(values, [0, 2, 4, 6, 8]);
    }
}
