use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::iter::FusedIterator;

use alloc::vec::Vec;

use crate::DefaultHashBuilder;
use crate::HashSet;

/// A hash set that iterates in insertion order.
///
/// `OrderedSet<T, S>` pairs a [`HashSet`] with a `Vec<T>` recording the
/// order in which values were first inserted. Membership checks stay
/// hash-speed; removal pays an extra linear scan of the order list.
/// Re-inserting a present value is a no-op and keeps its original
/// position.
///
/// # Examples
///
/// ```rust
/// # #[cfg(any(feature = "std", feature = "foldhash"))]
/// # {
/// use fib_hash::OrderedSet;
///
/// let mut set: OrderedSet<&str> = OrderedSet::new();
/// set.insert("b");
/// set.insert("a");
/// set.insert("c");
/// set.remove(&"a");
///
/// let values: Vec<&str> = set.iter().copied().collect();
/// assert_eq!(values, ["b", "c"]);
/// # }
/// ```
#[derive(Clone)]
pub struct OrderedSet<T, S = DefaultHashBuilder> {
    set: HashSet<T, S>,
    order: Vec<T>,
}

impl<T, S> OrderedSet<T, S>
where
    T: Hash + Eq + Clone,
    S: BuildHasher,
{
    /// Creates a new set with the given hasher builder.
    pub fn with_hasher(hash_builder: S) -> Self {
        Self {
            set: HashSet::with_hasher(hash_builder),
            order: Vec::new(),
        }
    }

    /// Creates a new set with at least `capacity` slots and the given
    /// hasher builder.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            set: HashSet::with_capacity_and_hasher(capacity, hash_builder),
            order: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of values in the set.
    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// Returns `true` if the set contains no values.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Returns the current slot count of the backing table.
    pub fn capacity(&self) -> usize {
        self.set.capacity()
    }

    /// Adds a value to the set, appending new values to the insertion
    /// order. Returns `true` if the value was not already present.
    pub fn insert(&mut self, value: T) -> bool {
        if self.set.insert(value.clone()) {
            self.order.push(value);
            true
        } else {
            false
        }
    }

    /// Returns `true` if the set contains the value.
    pub fn contains(&self, value: &T) -> bool {
        self.set.contains(value)
    }

    /// Returns a reference to the stored value equal to `value`, if any.
    pub fn get(&self, value: &T) -> Option<&T> {
        self.set.get(value)
    }

    /// Removes a value from the set. Returns `true` if the value was
    /// present. Later values shift down one position in the insertion
    /// order.
    pub fn remove(&mut self, value: &T) -> bool {
        if !self.set.remove(value) {
            return false;
        }
        let position = self
            .order
            .iter()
            .position(|v| v == value)
            .unwrap_or_else(|| unreachable!("order list out of sync with table"));
        self.order.remove(position);
        true
    }

    /// Removes and returns the value at `index` in the insertion order.
    /// Later values shift down one position.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn remove_at(&mut self, index: usize) -> T {
        let value = self.order.remove(index);
        if self.set.take(&value).is_none() {
            unreachable!("order list out of sync with table");
        }
        value
    }

    /// Returns the value at `index` in the insertion order.
    pub fn get_index(&self, index: usize) -> Option<&T> {
        self.order.get(index)
    }

    /// Returns the position of `value` in the insertion order.
    pub fn index_of(&self, value: &T) -> Option<usize> {
        if !self.set.contains(value) {
            return None;
        }
        self.order.iter().position(|v| v == value)
    }

    /// Returns the values in insertion order as a slice.
    pub fn ordered_values(&self) -> &[T] {
        &self.order
    }

    /// Removes all values, keeping the allocated capacity.
    pub fn clear(&mut self) {
        self.set.clear();
        self.order.clear();
    }

    /// Removes all values and shrinks the backing table to at most
    /// `maximum_capacity` slots.
    pub fn clear_to(&mut self, maximum_capacity: usize) {
        self.set.clear_to(maximum_capacity);
        self.order.clear();
        self.order.shrink_to_fit();
    }

    /// Grows the backing table so `additional` more values fit without
    /// rehashing.
    pub fn reserve(&mut self, additional: usize) {
        self.set.reserve(additional);
        self.order.reserve(additional);
    }

    /// Retains only the values specified by the predicate, preserving the
    /// insertion order of the survivors.
    pub fn retain(&mut self, mut f: impl FnMut(&T) -> bool) {
        self.set.retain(&mut f);
        let set = &self.set;
        self.order.retain(|v| set.contains(v));
    }

    /// Returns an iterator over the values in insertion order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.order.iter(),
        }
    }
}

impl<T, S> OrderedSet<T, S>
where
    T: Hash + Eq + Clone,
    S: BuildHasher + Default,
{
    /// Creates a new set using the default hasher builder.
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates a new set with at least `capacity` slots using the default
    /// hasher builder.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }
}

impl<T, S> Default for OrderedSet<T, S>
where
    T: Hash + Eq + Clone,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> Debug for OrderedSet<T, S>
where
    T: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.order.iter()).finish()
    }
}

impl<T, S> PartialEq for OrderedSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    /// Compares membership. Insertion order does not participate in
    /// equality.
    fn eq(&self, other: &Self) -> bool {
        self.set == other.set
    }
}

impl<T, S> Eq for OrderedSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
}

impl<T, S> Extend<T> for OrderedSet<T, S>
where
    T: Hash + Eq + Clone,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T, S> FromIterator<T> for OrderedSet<T, S>
where
    T: Hash + Eq + Clone,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<T, S, const N: usize> From<[T; N]> for OrderedSet<T, S>
where
    T: Hash + Eq + Clone,
    S: BuildHasher + Default,
{
    fn from(values: [T; N]) -> Self {
        Self::from_iter(values)
    }
}

impl<T, S> IntoIterator for OrderedSet<T, S> {
    type IntoIter = IntoIter<T>;
    type Item = T;

    /// Consumes the set, yielding values in insertion order.
    fn into_iter(self) -> IntoIter<T> {
        IntoIter {
            inner: self.order.into_iter(),
        }
    }
}

impl<'a, T, S> IntoIterator for &'a OrderedSet<T, S>
where
    T: Hash + Eq + Clone,
    S: BuildHasher,
{
    type IntoIter = Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

/// An insertion-order iterator over the values of an `OrderedSet`.
#[derive(Clone)]
pub struct Iter<'a, T> {
    inner: core::slice::Iter<'a, T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

/// A consuming insertion-order iterator over the values of an
/// `OrderedSet`.
pub struct IntoIter<T> {
    inner: alloc::vec::IntoIter<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}
impl<T> FusedIterator for IntoIter<T> {}
