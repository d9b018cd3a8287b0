use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::iter::FusedIterator;

use alloc::vec::Vec;

use crate::DefaultHashBuilder;
use crate::HashMap;

/// A hash map that iterates in insertion order.
///
/// `OrderedMap<K, V, S>` pairs a [`HashMap`] with a `Vec<K>` recording the
/// order in which keys were first inserted. Lookups stay hash-speed;
/// removal pays an extra linear scan of the key list. Re-inserting an
/// existing key replaces its value but keeps its original position.
///
/// Keys must be `Clone` because each key is stored twice, once in the table
/// and once in the order list. Cheap handles like `Rc<str>` or small copy
/// types keep that overhead trivial.
///
/// # Examples
///
/// ```rust
/// # #[cfg(any(feature = "std", feature = "foldhash"))]
/// # {
/// use fib_hash::OrderedMap;
///
/// let mut map: OrderedMap<&str, i32> = OrderedMap::new();
/// map.insert("a", 1);
/// map.insert("b", 2);
/// map.insert("c", 3);
/// map.remove(&"b");
/// map.insert("d", 4);
///
/// let keys: Vec<&str> = map.keys().copied().collect();
/// assert_eq!(keys, ["a", "c", "d"]);
/// # }
/// ```
#[derive(Clone)]
pub struct OrderedMap<K, V, S = DefaultHashBuilder> {
    map: HashMap<K, V, S>,
    keys: Vec<K>,
}

impl<K, V, S> OrderedMap<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    /// Creates a new map with the given hasher builder.
    pub fn with_hasher(hash_builder: S) -> Self {
        Self {
            map: HashMap::with_hasher(hash_builder),
            keys: Vec::new(),
        }
    }

    /// Creates a new map with at least `capacity` slots and the given
    /// hasher builder.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            map: HashMap::with_capacity_and_hasher(capacity, hash_builder),
            keys: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of entries in the map.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the map contains no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the current slot count of the backing table.
    pub fn capacity(&self) -> usize {
        self.map.capacity()
    }

    /// Returns the map's hasher builder.
    pub fn hasher(&self) -> &S {
        self.map.hasher()
    }

    /// Inserts a key-value pair into the map.
    ///
    /// A new key is appended to the insertion order. An existing key keeps
    /// its position and has its value replaced, with the old value
    /// returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if !self.map.contains_key(&key) {
            self.keys.push(key.clone());
        }
        self.map.insert(key, value)
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.map.get_mut(key)
    }

    /// Returns the value for `key`, or `default` if the key is absent.
    pub fn get_or<'a>(&'a self, key: &K, default: &'a V) -> &'a V {
        self.map.get_or(key, default)
    }

    /// Returns `true` if the map contains a value for the specified key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Removes a key from the map, returning its value if the key was
    /// present. Later keys shift down one position in the insertion order.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.map.remove(key)?;
        let position = self
            .keys
            .iter()
            .position(|k| k == key)
            .unwrap_or_else(|| unreachable!("key list out of sync with table"));
        self.keys.remove(position);
        Some(value)
    }

    /// Removes and returns the entry at `index` in the insertion order.
    /// Later keys shift down one position.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn remove_at(&mut self, index: usize) -> (K, V) {
        let key = self.keys.remove(index);
        match self.map.remove_entry(&key) {
            Some(entry) => entry,
            None => unreachable!("key list out of sync with table"),
        }
    }

    /// Returns the key and value at `index` in the insertion order.
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        let key = self.keys.get(index)?;
        self.map.get_key_value(key)
    }

    /// Returns the position of `key` in the insertion order.
    pub fn index_of(&self, key: &K) -> Option<usize> {
        if !self.map.contains_key(key) {
            return None;
        }
        self.keys.iter().position(|k| k == key)
    }

    /// Returns the keys in insertion order as a slice.
    ///
    /// The slice borrows the map's own order list, so no allocation takes
    /// place.
    pub fn ordered_keys(&self) -> &[K] {
        &self.keys
    }

    /// Removes all entries, keeping the allocated capacity.
    pub fn clear(&mut self) {
        self.map.clear();
        self.keys.clear();
    }

    /// Removes all entries and shrinks the backing table to at most
    /// `maximum_capacity` slots.
    pub fn clear_to(&mut self, maximum_capacity: usize) {
        self.map.clear_to(maximum_capacity);
        self.keys.clear();
        self.keys.shrink_to_fit();
    }

    /// Grows the backing table so `additional` more entries fit without
    /// rehashing.
    pub fn reserve(&mut self, additional: usize) {
        self.map.reserve(additional);
        self.keys.reserve(additional);
    }

    /// Retains only the entries for which the predicate returns `true`,
    /// preserving the insertion order of the survivors.
    pub fn retain(&mut self, f: impl FnMut(&K, &mut V) -> bool) {
        self.map.retain(f);
        let map = &self.map;
        self.keys.retain(|k| map.contains_key(k));
    }

    /// Returns an iterator over the entries in insertion order.
    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter {
            keys: self.keys.iter(),
            map: &self.map,
        }
    }

    /// Returns an iterator over the keys in insertion order.
    pub fn keys(&self) -> Keys<'_, K, V, S> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values in insertion order.
    pub fn values(&self) -> Values<'_, K, V, S> {
        Values { inner: self.iter() }
    }
}

impl<K, V, S> OrderedMap<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher + Default,
{
    /// Creates a new map using the default hasher builder.
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates a new map with at least `capacity` slots using the default
    /// hasher builder.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }
}

impl<K, V, S> Default for OrderedMap<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> Debug for OrderedMap<K, V, S>
where
    K: Hash + Eq + Clone + Debug,
    V: Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in self.iter() {
            map.entry(k, v);
        }
        map.finish()
    }
}

impl<K, V, S> PartialEq for OrderedMap<K, V, S>
where
    K: Hash + Eq + Clone,
    V: PartialEq,
    S: BuildHasher,
{
    /// Compares entry sets. Insertion order does not participate in
    /// equality.
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<K, V, S> Eq for OrderedMap<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> core::ops::Index<&K> for OrderedMap<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    type Output = V;

    fn index(&self, key: &K) -> &V {
        &self.map[key]
    }
}

impl<K, V, S> Extend<(K, V)> for OrderedMap<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for OrderedMap<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K, V, S, const N: usize> From<[(K, V); N]> for OrderedMap<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher + Default,
{
    fn from(entries: [(K, V); N]) -> Self {
        Self::from_iter(entries)
    }
}

impl<K, V, S> IntoIterator for OrderedMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    type IntoIter = IntoIter<K, V, S>;
    type Item = (K, V);

    fn into_iter(self) -> IntoIter<K, V, S> {
        IntoIter {
            keys: self.keys.into_iter(),
            map: self.map,
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a OrderedMap<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    type IntoIter = Iter<'a, K, V, S>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Iter<'a, K, V, S> {
        self.iter()
    }
}

/// An insertion-order iterator over the entries of an `OrderedMap`.
pub struct Iter<'a, K, V, S> {
    keys: core::slice::Iter<'a, K>,
    map: &'a HashMap<K, V, S>,
}

impl<K, V, S> Clone for Iter<'_, K, V, S> {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
            map: self.map,
        }
    }
}

impl<'a, K, V, S> Iterator for Iter<'a, K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.keys.next()?;
        match self.map.get_key_value(key) {
            Some(entry) => Some(entry),
            None => unreachable!("key list out of sync with table"),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }
}

impl<K, V, S> ExactSizeIterator for Iter<'_, K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
}

impl<K, V, S> FusedIterator for Iter<'_, K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
}

/// An insertion-order iterator over the keys of an `OrderedMap`.
pub struct Keys<'a, K, V, S> {
    inner: Iter<'a, K, V, S>,
}

impl<'a, K, V, S> Iterator for Keys<'a, K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, S> FusedIterator for Keys<'_, K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
}

/// An insertion-order iterator over the values of an `OrderedMap`.
pub struct Values<'a, K, V, S> {
    inner: Iter<'a, K, V, S>,
}

impl<'a, K, V, S> Iterator for Values<'a, K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, S> FusedIterator for Values<'_, K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
}

/// A consuming insertion-order iterator over the entries of an
/// `OrderedMap`.
pub struct IntoIter<K, V, S> {
    keys: alloc::vec::IntoIter<K>,
    map: HashMap<K, V, S>,
}

impl<K, V, S> Iterator for IntoIter<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.keys.next()?;
        match self.map.remove(&key) {
            Some(value) => Some((key, value)),
            None => unreachable!("key list out of sync with table"),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }
}

impl<K, V, S> FusedIterator for IntoIter<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
}
