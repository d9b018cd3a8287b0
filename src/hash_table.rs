use alloc::boxed::Box;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::iter::FusedIterator;

/// 2^64 divided by the golden ratio. Multiplying a hash by this odd constant
/// spreads entropy from every bit of the hash into the upper bits, which the
/// placement function then shifts down into an index. This keeps bucket
/// occupancy near-uniform even for hashes whose low bits are poorly
/// distributed (sequential integers, pointer-derived hashes, and so on).
///
/// See <https://probablydance.com/2018/06/16/fibonacci-hashing-the-optimization-that-the-world-forgot-or-a-better-alternative-to-integer-modulo/>
/// for background on Fibonacci hashing.
const FIBONACCI_MULTIPLIER: u64 = 0x9E3779B97F4A7C15;

/// Load factor used when none is given. Load factors above ~0.9 sharply
/// increase probe lengths and the chance of an early rehash to the next
/// power-of-two size.
pub const DEFAULT_LOAD_FACTOR: f32 = 0.8;

const DEFAULT_CAPACITY: usize = 16;

#[inline(always)]
fn threshold_for(capacity: usize, load_factor: f32) -> usize {
    // The capacity - 1 clamp keeps at least one slot empty even at load
    // factor 1.0. A completely full table would never terminate a probe for
    // an absent key.
    (((capacity as f64) * (load_factor as f64)) as usize).min(capacity - 1)
}

fn empty_slots<K, V>(capacity: usize) -> Box<[Option<(K, V)>]> {
    core::iter::repeat_with(|| None).take(capacity).collect()
}

/// Hashing and equality strategy for table keys.
///
/// The table consults its policy for every placement and slot comparison, so
/// the policy decides what "the same key" means. [`Equivalence`] gives the
/// ordinary value-equality behavior; [`Identity`](crate::identity::Identity)
/// substitutes reference identity. Implementations must be coherent: keys
/// that compare equal must hash identically.
pub trait KeyPolicy<K> {
    /// Hashes a key. The table mixes the result through the Fibonacci
    /// multiplier before truncating it to an index, so this does not need to
    /// produce well-distributed low bits.
    fn hash(&self, key: &K) -> u64;

    /// Whether two keys are the same key for storage purposes.
    fn eq(&self, a: &K, b: &K) -> bool;
}

/// Value-equality policy: keys hash through a [`BuildHasher`] and compare
/// with [`Eq`].
#[derive(Clone, Default, Debug)]
pub struct Equivalence<S> {
    hash_builder: S,
}

impl<S> Equivalence<S> {
    /// Creates the policy from a hasher builder.
    pub fn new(hash_builder: S) -> Self {
        Self { hash_builder }
    }

    /// Returns the wrapped hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }
}

impl<K, S> KeyPolicy<K> for Equivalence<S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn hash(&self, key: &K) -> u64 {
        self.hash_builder.hash_one(key)
    }

    fn eq(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

/// An open-addressing hash table using Fibonacci hashing, linear probing, and
/// backward-shift deletion.
///
/// `HashTable<K, V, P>` stores key-value pairs in a single power-of-two slot
/// array with no tombstones: removal slides displaced entries back toward
/// their ideal slot, so every stored key is always reachable by probing
/// forward from its placement with no gaps in between. The hashing and
/// equality behavior is supplied by a [`KeyPolicy`], which is how the
/// value-equality and reference-identity variants share this one engine.
///
/// Most callers want the [`HashMap`](crate::HashMap),
/// [`HashSet`](crate::HashSet), [`IdentityMap`](crate::IdentityMap), or
/// [`OrderedMap`](crate::OrderedMap) wrappers instead of using the table
/// directly.
///
/// The table is single-threaded: it performs no internal synchronization and
/// the borrow rules are the only guard against aliased mutation.
///
/// ## Example
///
/// ```rust
/// # #[cfg(any(feature = "std", feature = "foldhash"))]
/// # {
/// use fib_hash::DefaultHashBuilder;
/// use fib_hash::hash_table::Equivalence;
/// use fib_hash::hash_table::HashTable;
///
/// let policy = Equivalence::new(DefaultHashBuilder::default());
/// let mut table: HashTable<&str, u32, _> = HashTable::with_policy(policy);
///
/// table.insert("a", 1);
/// assert_eq!(table.get(&"a"), Some(&1));
/// assert_eq!(table.remove(&"a"), Some(1));
/// # }
/// ```
#[derive(Clone)]
pub struct HashTable<K, V, P> {
    policy: P,
    slots: Box<[Option<(K, V)>]>,
    len: usize,
    mask: usize,
    shift: u32,
    load_factor: f32,
    threshold: usize,
}

impl<K, V, P> Debug for HashTable<K, V, P>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, P> HashTable<K, V, P>
where
    P: KeyPolicy<K>,
{
    /// Creates an empty table with a default capacity and load factor.
    pub fn with_policy(policy: P) -> Self {
        Self::with_capacity_and_policy(DEFAULT_CAPACITY, policy)
    }

    /// Creates an empty table with at least `capacity` slots.
    ///
    /// The slot count is rounded up to the next power of two. A request of 0
    /// produces a 1-slot table that grows on first insert.
    pub fn with_capacity_and_policy(capacity: usize, policy: P) -> Self {
        Self::with_capacity_load_factor_and_policy(capacity, DEFAULT_LOAD_FACTOR, policy)
    }

    /// Creates an empty table with at least `capacity` slots and the given
    /// load factor.
    ///
    /// # Panics
    ///
    /// Panics if `load_factor` is not in `(0, 1]`, or if the rounded capacity
    /// overflows `usize`.
    pub fn with_capacity_load_factor_and_policy(
        capacity: usize,
        load_factor: f32,
        policy: P,
    ) -> Self {
        assert!(
            load_factor > 0.0 && load_factor <= 1.0,
            "load_factor must be in (0, 1]: {load_factor}"
        );
        let capacity = capacity
            .max(1)
            .checked_next_power_of_two()
            .expect("capacity overflow");
        let mask = capacity - 1;
        Self {
            policy,
            slots: empty_slots(capacity),
            len: 0,
            mask,
            // 64 for a 1-slot table; place() compensates.
            shift: (mask as u64).leading_zeros(),
            load_factor,
            threshold: threshold_for(capacity, load_factor),
        }
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the current slot count. Always a power of two; at most
    /// `capacity() * load_factor()` entries fit before the table doubles.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the load factor the table was built with.
    pub fn load_factor(&self) -> f32 {
        self.load_factor
    }

    /// Returns the key policy.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Maps a hash to a slot index in `[0, capacity)`.
    #[inline(always)]
    fn place(&self, hash: u64) -> usize {
        // shift is 64 when there is a single slot; wrapping_shr turns that
        // into a no-op shift and the mask still lands on slot 0.
        (hash.wrapping_mul(FIBONACCI_MULTIPLIER).wrapping_shr(self.shift) as usize) & self.mask
    }

    #[inline(always)]
    fn place_key(&self, key: &K) -> usize {
        self.place(self.policy.hash(key))
    }

    /// Finds the slot holding `key` (`Ok`) or the empty slot where a probe
    /// for it ends (`Err`).
    fn locate(&self, key: &K) -> Result<usize, usize> {
        let mut index = self.place_key(key);
        loop {
            match &self.slots[index] {
                None => return Err(index),
                Some((stored, _)) if self.policy.eq(stored, key) => return Ok(index),
                Some(_) => index = (index + 1) & self.mask,
            }
        }
    }

    /// Inserts a key-value pair, returning the previous value if the key was
    /// already present.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.locate(&key) {
            Ok(index) => self.slots[index]
                .as_mut()
                .map(|(_, stored)| core::mem::replace(stored, value)),
            Err(_) => {
                self.insert_unique(key, value);
                None
            }
        }
    }

    /// Inserts a key known to be absent and returns its slot index.
    ///
    /// Grows first when the insert would push `len` past the load-factor
    /// threshold, so the returned index stays valid after the call.
    fn insert_unique(&mut self, key: K, value: V) -> usize {
        if self.len + 1 > self.threshold {
            self.grow();
        }
        let mut index = self.place_key(&key);
        while self.slots[index].is_some() {
            index = (index + 1) & self.mask;
        }
        self.slots[index] = Some((key, value));
        self.len += 1;
        index
    }

    /// Returns a reference to the value stored for `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        match self.locate(key) {
            Ok(index) => self.slots[index].as_ref().map(|(_, value)| value),
            Err(_) => None,
        }
    }

    /// Returns a mutable reference to the value stored for `key`.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        match self.locate(key) {
            Ok(index) => self.slots[index].as_mut().map(|(_, value)| value),
            Err(_) => None,
        }
    }

    /// Returns the stored key and value for `key`.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        match self.locate(key) {
            Ok(index) => self.slots[index].as_ref().map(|(k, v)| (k, v)),
            Err(_) => None,
        }
    }

    /// Returns the value stored for `key`, or `default` if the key is
    /// absent. Absence is decided by presence in the table, never by
    /// inspecting the value itself.
    pub fn get_or<'a>(&'a self, key: &K, default: &'a V) -> &'a V {
        self.get(key).unwrap_or(default)
    }

    /// Returns `true` if the table holds an entry for `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.locate(key).is_ok()
    }

    /// Returns the first key whose value satisfies the predicate. Scans every
    /// stored entry.
    pub fn find_key_by(&self, mut pred: impl FnMut(&V) -> bool) -> Option<&K> {
        self.slots
            .iter()
            .flatten()
            .find(|(_, value)| pred(value))
            .map(|(key, _)| key)
    }

    /// Removes `key` and returns its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes `key` and returns the stored key and value.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        match self.locate(key) {
            Ok(index) => Some(self.remove_index(index)),
            Err(_) => None,
        }
    }

    /// Removes the entry at an occupied slot using backward-shift deletion.
    ///
    /// Rather than leaving a tombstone, this walks the probe run after the
    /// vacated slot and slides each entry back into the gap whenever the gap
    /// lies on that entry's own probe path. Every surviving key therefore
    /// stays reachable from its placement with no gap before it.
    fn remove_index(&mut self, index: usize) -> (K, V) {
        let Some(removed) = self.slots[index].take() else {
            unreachable!("remove_index on an empty slot")
        };
        let mask = self.mask;
        let mut gap = index;
        let mut next = (gap + 1) & mask;
        loop {
            let placement = match &self.slots[next] {
                None => break,
                Some((key, _)) => self.place_key(key),
            };
            // The entry moves back only if the gap sits between its ideal
            // slot and its current slot in circular probe order.
            if (next.wrapping_sub(placement) & mask) > (gap.wrapping_sub(placement) & mask) {
                self.slots[gap] = self.slots[next].take();
                gap = next;
            }
            next = (next + 1) & mask;
        }
        self.len -= 1;
        removed
    }

    /// Removes every entry, keeping the current capacity.
    pub fn clear(&mut self) {
        if self.len == 0 {
            return;
        }
        for slot in &mut self.slots {
            *slot = None;
        }
        self.len = 0;
    }

    /// Removes every entry and shrinks the slot array to at most
    /// `maximum_capacity` slots (rounded up to a power of two).
    pub fn clear_to(&mut self, maximum_capacity: usize) {
        let target = maximum_capacity
            .max(1)
            .checked_next_power_of_two()
            .expect("capacity overflow");
        if target >= self.capacity() {
            self.clear();
            return;
        }
        self.len = 0;
        self.slots = empty_slots(target);
        self.mask = target - 1;
        self.shift = (self.mask as u64).leading_zeros();
        self.threshold = threshold_for(target, self.load_factor);
    }

    /// Shrinks the slot array to `maximum_capacity` or less, rehashing the
    /// stored entries. Does nothing if the table is already that small; uses
    /// the smallest capacity that fits the current entries if they do not
    /// fit in `maximum_capacity`.
    pub fn shrink(&mut self, maximum_capacity: usize) {
        let requested = maximum_capacity
            .max(1)
            .checked_next_power_of_two()
            .expect("capacity overflow");
        let target = requested.max(self.capacity_for(self.len));
        if target < self.capacity() {
            self.rehash(target);
        }
    }

    /// Grows the table as needed so `additional` more entries fit without
    /// another rehash.
    pub fn reserve(&mut self, additional: usize) {
        let needed = self.len.checked_add(additional).expect("capacity overflow");
        if needed > self.threshold {
            let target = self.capacity_for(needed);
            self.rehash(target);
        }
    }

    /// Smallest power-of-two capacity whose threshold admits `count` entries.
    fn capacity_for(&self, count: usize) -> usize {
        let mut capacity = count
            .max(1)
            .checked_next_power_of_two()
            .expect("capacity overflow");
        while threshold_for(capacity, self.load_factor) < count {
            capacity = capacity.checked_mul(2).expect("capacity overflow");
        }
        capacity
    }

    fn grow(&mut self) {
        let target = self.capacity().checked_mul(2).expect("capacity overflow");
        self.rehash(target);
    }

    /// Reallocates the slot array at `new_capacity` and re-places every
    /// entry. Not incremental: one O(capacity) pass.
    fn rehash(&mut self, new_capacity: usize) {
        debug_assert!(new_capacity.is_power_of_two());
        debug_assert!(threshold_for(new_capacity, self.load_factor) >= self.len);
        let old = core::mem::replace(&mut self.slots, empty_slots(new_capacity));
        self.mask = new_capacity - 1;
        self.shift = (self.mask as u64).leading_zeros();
        self.threshold = threshold_for(new_capacity, self.load_factor);
        for slot in old.into_vec() {
            if let Some((key, value)) = slot {
                // Keys are distinct already; probe straight for an empty slot.
                let mut index = self.place_key(&key);
                while self.slots[index].is_some() {
                    index = (index + 1) & self.mask;
                }
                self.slots[index] = Some((key, value));
            }
        }
    }

    /// Retains only the entries for which the predicate returns `true`.
    ///
    /// The predicate runs exactly once per entry, so it may mutate values
    /// freely. The scan starts at an empty slot, which no probe run can
    /// straddle; a backward shift after a removal then only moves entries
    /// onto or ahead of the cursor, never behind it, and the vacated slot
    /// is examined again before the cursor advances.
    pub fn retain(&mut self, mut f: impl FnMut(&K, &mut V) -> bool) {
        // The threshold clamp keeps at least one slot empty at all times.
        let start = match self.slots.iter().position(|slot| slot.is_none()) {
            Some(index) => index,
            None => unreachable!("table has no empty slot"),
        };
        let mut offset = 0;
        while offset < self.slots.len() {
            let index = (start + offset) & self.mask;
            let keep = match &mut self.slots[index] {
                None => true,
                Some((key, value)) => f(key, value),
            };
            if keep {
                offset += 1;
            } else {
                self.remove_index(index);
            }
        }
    }

    /// Gets the slot for `key` for in-place manipulation.
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, P> {
        match self.locate(&key) {
            Ok(index) => Entry::Occupied(OccupiedEntry { table: self, index }),
            Err(_) => Entry::Vacant(VacantEntry { table: self, key }),
        }
    }

    fn occupied(&self, index: usize) -> &(K, V) {
        match &self.slots[index] {
            Some(entry) => entry,
            None => unreachable!("expected an occupied slot"),
        }
    }

    fn occupied_mut(&mut self, index: usize) -> &mut (K, V) {
        match &mut self.slots[index] {
            Some(entry) => entry,
            None => unreachable!("expected an occupied slot"),
        }
    }
}

impl<K, V, P> HashTable<K, V, P> {
    /// Returns an iterator over the stored entries in slot order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: self.slots.iter(),
            remaining: self.len,
        }
    }

    /// Returns an iterator over the stored entries with mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            slots: self.slots.iter_mut(),
            remaining: self.len,
        }
    }

    /// Returns an iterator that removes and yields every entry. Dropping the
    /// iterator removes any entries it has not yielded.
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        let Self { slots, len, .. } = self;
        Drain {
            slots: slots.iter_mut(),
            len,
        }
    }
}

impl<K, V, P> IntoIterator for HashTable<K, V, P> {
    type IntoIter = IntoIter<K, V>;
    type Item = (K, V);

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter {
            remaining: self.len,
            slots: self.slots.into_vec().into_iter(),
        }
    }
}

impl<'a, K, V, P> IntoIterator for &'a HashTable<K, V, P> {
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, P> IntoIterator for &'a mut HashTable<K, V, P> {
    type IntoIter = IterMut<'a, K, V>;
    type Item = (&'a K, &'a mut V);

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

/// A view into a single table slot, vacant or occupied.
///
/// Constructed by [`HashTable::entry`].
pub enum Entry<'a, K, V, P> {
    /// The key is present.
    Occupied(OccupiedEntry<'a, K, V, P>),
    /// The key is absent.
    Vacant(VacantEntry<'a, K, V, P>),
}

impl<'a, K, V, P: KeyPolicy<K>> Entry<'a, K, V, P> {
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts a computed value if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Mutates the value in place if the entry is occupied.
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns a reference to this entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

impl<'a, K, V, P> Entry<'a, K, V, P>
where
    V: Default,
    P: KeyPolicy<K>,
{
    /// Inserts the default value if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(Default::default)
    }
}

/// A view into an occupied table slot.
pub struct OccupiedEntry<'a, K, V, P> {
    table: &'a mut HashTable<K, V, P>,
    index: usize,
}

impl<'a, K, V, P: KeyPolicy<K>> OccupiedEntry<'a, K, V, P> {
    /// Returns a reference to the stored key.
    pub fn key(&self) -> &K {
        &self.table.occupied(self.index).0
    }

    /// Returns a reference to the value.
    pub fn get(&self) -> &V {
        &self.table.occupied(self.index).1
    }

    /// Returns a mutable reference to the value.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.table.occupied_mut(self.index).1
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut V {
        &mut self.table.occupied_mut(self.index).1
    }

    /// Replaces the value, returning the old one.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(self.get_mut(), value)
    }

    /// Removes the entry, returning the value.
    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    /// Removes the entry, returning the stored key and value.
    pub fn remove_entry(self) -> (K, V) {
        self.table.remove_index(self.index)
    }
}

/// A view into a vacant table slot.
pub struct VacantEntry<'a, K, V, P> {
    table: &'a mut HashTable<K, V, P>,
    key: K,
}

impl<'a, K, V, P: KeyPolicy<K>> VacantEntry<'a, K, V, P> {
    /// Returns a reference to the key that would be inserted.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Takes ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts the value and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        let index = self.table.insert_unique(self.key, value);
        &mut self.table.occupied_mut(index).1
    }
}

/// An iterator over the entries of a `HashTable`.
#[derive(Clone)]
pub struct Iter<'a, K, V> {
    slots: core::slice::Iter<'a, Option<(K, V)>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Some((key, value)) = slot {
                self.remaining -= 1;
                return Some((key, value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// An iterator over the entries of a `HashTable` with mutable values.
pub struct IterMut<'a, K, V> {
    slots: core::slice::IterMut<'a, Option<(K, V)>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Some((key, value)) = slot {
                self.remaining -= 1;
                return Some((&*key, value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// A consuming iterator over the entries of a `HashTable`.
pub struct IntoIter<K, V> {
    slots: alloc::vec::IntoIter<Option<(K, V)>>,
    remaining: usize,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Some(entry) = slot {
                self.remaining -= 1;
                return Some(entry);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

/// A draining iterator over the entries of a `HashTable`.
pub struct Drain<'a, K, V> {
    slots: core::slice::IterMut<'a, Option<(K, V)>>,
    len: &'a mut usize,
}

impl<K, V> Iterator for Drain<'_, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Some(entry) = slot.take() {
                *self.len -= 1;
                return Some(entry);
            }
        }
        None
    }
}

impl<K, V> Drop for Drain<'_, K, V> {
    fn drop(&mut self) {
        for _ in self {}
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec::Vec;
    use core::hash::Hasher;

    use siphasher::sip::SipHasher;

    use super::*;

    #[derive(Clone)]
    struct SipPolicy {
        k1: u64,
        k2: u64,
    }

    impl SipPolicy {
        fn new() -> Self {
            Self {
                k1: 0xDEAD,
                k2: 0xBEEF,
            }
        }
    }

    impl<K: Hash + Eq> KeyPolicy<K> for SipPolicy {
        fn hash(&self, key: &K) -> u64 {
            let mut hasher = SipHasher::new_with_keys(self.k1, self.k2);
            key.hash(&mut hasher);
            hasher.finish()
        }

        fn eq(&self, a: &K, b: &K) -> bool {
            a == b
        }
    }

    /// Hashes every key to the same value. Worst case for linear probing;
    /// exercises long runs, backward shift, and wrap-around.
    #[derive(Clone)]
    struct Colliding;

    impl<K: Eq> KeyPolicy<K> for Colliding {
        fn hash(&self, _key: &K) -> u64 {
            7
        }

        fn eq(&self, a: &K, b: &K) -> bool {
            a == b
        }
    }

    /// Uses the key itself as the hash. Sequential keys then carry no
    /// entropy beyond their value, which is exactly what the Fibonacci
    /// multiplier is there to spread.
    #[derive(Clone)]
    struct PassThrough;

    impl KeyPolicy<u64> for PassThrough {
        fn hash(&self, key: &u64) -> u64 {
            *key
        }

        fn eq(&self, a: &u64, b: &u64) -> bool {
            a == b
        }
    }

    fn sip_table<K: Hash + Eq, V>() -> HashTable<K, V, SipPolicy> {
        HashTable::with_policy(SipPolicy::new())
    }

    #[test]
    fn test_insert_get_overwrite() {
        let mut table = sip_table();
        assert_eq!(table.insert(1, "one"), None);
        assert_eq!(table.insert(2, "two"), None);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&1), Some(&"one"));
        assert_eq!(table.get(&3), None);

        assert_eq!(table.insert(1, "uno"), Some("one"));
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&1), Some(&"uno"));
    }

    #[test]
    fn test_zero_capacity_starts_with_one_slot() {
        let mut table = HashTable::with_capacity_and_policy(0, SipPolicy::new());
        assert_eq!(table.capacity(), 1);
        table.insert(1u32, 1u32);
        assert!(table.capacity() > 1);
        assert_eq!(table.get(&1), Some(&1));
    }

    #[test]
    fn test_resize_triggers_exactly_at_threshold() {
        let mut table = HashTable::with_capacity_load_factor_and_policy(16, 0.75, SipPolicy::new());
        assert_eq!(table.capacity(), 16);

        for i in 0u32..12 {
            table.insert(i, i);
            assert_eq!(table.capacity(), 16);
        }
        table.insert(12, 12);
        assert_eq!(table.capacity(), 32);
        for i in 0u32..13 {
            assert_eq!(table.get(&i), Some(&i));
        }
    }

    #[test]
    fn test_load_factor_one_never_leaves_table_full() {
        let mut table = HashTable::with_capacity_load_factor_and_policy(4, 1.0, SipPolicy::new());
        for i in 0u32..64 {
            table.insert(i, i);
            assert!(table.len() < table.capacity());
            // A lookup for an absent key must terminate.
            assert_eq!(table.get(&u32::MAX), None);
        }
    }

    #[test]
    #[should_panic(expected = "load_factor must be in (0, 1]")]
    fn test_invalid_load_factor_rejected() {
        let _ = HashTable::<u32, u32, _>::with_capacity_load_factor_and_policy(
            16,
            0.0,
            SipPolicy::new(),
        );
    }

    #[test]
    #[should_panic(expected = "load_factor must be in (0, 1]")]
    fn test_load_factor_above_one_rejected() {
        let _ = HashTable::<u32, u32, _>::with_capacity_load_factor_and_policy(
            16,
            1.5,
            SipPolicy::new(),
        );
    }

    #[test]
    fn test_backward_shift_keeps_colliding_keys_reachable() {
        let mut table = HashTable::with_capacity_and_policy(16, Colliding);
        for i in 0u32..8 {
            table.insert(i, i * 10);
        }
        // Remove from the middle of the run, then the head, then the tail.
        assert_eq!(table.remove(&3), Some(30));
        assert_eq!(table.remove(&0), Some(0));
        assert_eq!(table.remove(&7), Some(70));
        assert_eq!(table.len(), 5);
        for i in [1u32, 2, 4, 5, 6] {
            assert_eq!(table.get(&i), Some(&(i * 10)), "key {i} became unreachable");
        }
        assert_eq!(table.get(&3), None);
    }

    #[test]
    fn test_backward_shift_across_wrap() {
        // A colliding run seeded near the top of the table wraps around to
        // slot 0 once it grows long enough.
        #[derive(Clone)]
        struct NearEnd;
        impl KeyPolicy<u32> for NearEnd {
            fn hash(&self, _key: &u32) -> u64 {
                // Placement of hash 3 in a 16-slot table is slot 13, so a run
                // of ten entries spills past the last slot.
                3
            }

            fn eq(&self, a: &u32, b: &u32) -> bool {
                a == b
            }
        }

        let mut table = HashTable::with_capacity_load_factor_and_policy(16, 0.9, NearEnd);
        for i in 0u32..10 {
            table.insert(i, i);
        }
        for remove in [0u32, 5, 9, 2] {
            assert_eq!(table.remove(&remove), Some(remove));
        }
        for i in 0u32..10 {
            let expected = !matches!(i, 0 | 5 | 9 | 2);
            assert_eq!(table.get(&i).is_some(), expected, "key {i}");
        }
    }

    #[test]
    fn test_random_removal_orders_leave_survivors_reachable() {
        use rand::SeedableRng;
        use rand::seq::SliceRandom;

        let mut rng = rand::rngs::SmallRng::seed_from_u64(0x5EED);
        for _ in 0..20 {
            let mut table = HashTable::with_capacity_and_policy(8, PassThrough);
            let keys: Vec<u64> = (0..200).collect();
            for &k in &keys {
                table.insert(k, k);
            }
            let mut order = keys.clone();
            order.shuffle(&mut rng);
            let (gone, kept) = order.split_at(100);
            for &k in gone {
                assert_eq!(table.remove(&k), Some(k));
            }
            assert_eq!(table.len(), 100);
            for &k in kept {
                assert_eq!(table.get(&k), Some(&k));
            }
            for &k in gone {
                assert_eq!(table.get(&k), None);
            }
        }
    }

    #[test]
    fn test_sequential_keys_spread_by_fibonacci_placement() {
        // Pass-through hashes of 0..n differ only in low bits; placement must
        // still distribute them instead of clustering at slot 0.
        let mut table = HashTable::with_capacity_and_policy(256, PassThrough);
        for i in 0u64..200 {
            table.insert(i, ());
        }
        assert_eq!(table.len(), 200);
        assert_eq!(table.capacity(), 256);
        for i in 0u64..200 {
            assert!(table.contains_key(&i));
        }
    }

    #[test]
    fn test_remove_on_single_slot_table() {
        let mut table = HashTable::with_capacity_and_policy(0, SipPolicy::new());
        table.insert(9u8, 9u8);
        assert_eq!(table.remove(&9), Some(9));
        assert!(table.is_empty());
        assert_eq!(table.remove(&9), None);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut table = sip_table();
        for i in 0u32..100 {
            table.insert(i, i);
        }
        let capacity = table.capacity();
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.capacity(), capacity);
        assert_eq!(table.get(&1), None);
    }

    #[test]
    fn test_clear_to_shrinks() {
        let mut table = sip_table();
        for i in 0u32..100 {
            table.insert(i, i);
        }
        table.clear_to(8);
        assert!(table.is_empty());
        assert_eq!(table.capacity(), 8);
        table.insert(1, 1);
        assert_eq!(table.get(&1), Some(&1));
    }

    #[test]
    fn test_shrink_respects_live_entries() {
        let mut table = sip_table();
        for i in 0u32..100 {
            table.insert(i, i);
        }
        table.shrink(2);
        assert!(table.capacity() >= 100);
        for i in 0u32..100 {
            assert_eq!(table.get(&i), Some(&i));
        }

        for i in 10u32..100 {
            table.remove(&i);
        }
        table.shrink(2);
        assert!(table.capacity() < 128);
        for i in 0u32..10 {
            assert_eq!(table.get(&i), Some(&i));
        }
    }

    #[test]
    fn test_reserve() {
        let mut table = sip_table::<u32, u32>();
        table.reserve(1000);
        let capacity = table.capacity();
        for i in 0..1000 {
            table.insert(i, i);
            assert_eq!(table.capacity(), capacity);
        }
    }

    #[test]
    fn test_get_or() {
        let mut table = sip_table();
        table.insert("a", 1);
        assert_eq!(*table.get_or(&"a", &0), 1);
        assert_eq!(*table.get_or(&"b", &0), 0);
    }

    #[test]
    fn test_find_key_by() {
        let mut table = sip_table();
        table.insert("a", 10);
        table.insert("b", 20);
        assert_eq!(table.find_key_by(|v| *v == 20), Some(&"b"));
        assert_eq!(table.find_key_by(|v| *v == 30), None);
    }

    #[test]
    fn test_retain_under_collisions() {
        let mut table = HashTable::with_capacity_and_policy(32, Colliding);
        for i in 0u32..20 {
            table.insert(i, i);
        }
        table.retain(|k, _| k % 2 == 0);
        assert_eq!(table.len(), 10);
        for i in 0u32..20 {
            assert_eq!(table.contains_key(&i), i % 2 == 0, "key {i}");
        }
    }

    #[test]
    fn test_retain_applies_predicate_once_per_entry_across_wrap() {
        #[derive(Clone)]
        struct NearEnd;
        impl KeyPolicy<u32> for NearEnd {
            fn hash(&self, _key: &u32) -> u64 {
                // Placement of hash 3 in a 16-slot table is slot 13; a run
                // of ten entries wraps past the last slot.
                3
            }

            fn eq(&self, a: &u32, b: &u32) -> bool {
                a == b
            }
        }

        let mut table = HashTable::with_capacity_load_factor_and_policy(16, 0.9, NearEnd);
        for i in 0u32..10 {
            table.insert(i, i);
        }
        // Removing the odd keys shifts entries across the array end while
        // the scan is still in progress. A mutating predicate must touch
        // each surviving value exactly once.
        table.retain(|k, v| {
            *v += 100;
            k % 2 == 0
        });
        assert_eq!(table.len(), 5);
        for i in [0u32, 2, 4, 6, 8] {
            assert_eq!(table.get(&i), Some(&(i + 100)), "key {i}");
        }
    }

    #[test]
    fn test_retain_can_mutate_values() {
        let mut table = sip_table();
        for i in 0u32..10 {
            table.insert(i, i);
        }
        table.retain(|_, v| {
            *v += 100;
            true
        });
        for i in 0u32..10 {
            assert_eq!(table.get(&i), Some(&(i + 100)));
        }
    }

    #[test]
    fn test_entry_api() {
        let mut table = sip_table();

        let value = table.entry(1u32).or_insert(10u32);
        assert_eq!(*value, 10);
        *table.entry(1).or_insert(99) += 1;
        assert_eq!(table.get(&1), Some(&11));

        match table.entry(1) {
            Entry::Occupied(mut entry) => {
                assert_eq!(entry.key(), &1);
                assert_eq!(entry.insert(50), 11);
                assert_eq!(entry.remove(), 50);
            }
            Entry::Vacant(_) => panic!("expected occupied"),
        }
        assert!(table.is_empty());

        match table.entry(2) {
            Entry::Vacant(entry) => {
                assert_eq!(entry.key(), &2);
                entry.insert(20);
            }
            Entry::Occupied(_) => panic!("expected vacant"),
        }
        assert_eq!(table.get(&2), Some(&20));
    }

    #[test]
    fn test_entry_insert_that_grows_returns_valid_reference() {
        let mut table = HashTable::with_capacity_load_factor_and_policy(2, 0.5, SipPolicy::new());
        for i in 0u32..32 {
            let value = table.entry(i).or_insert(i);
            assert_eq!(*value, i);
        }
        assert_eq!(table.len(), 32);
    }

    #[test]
    fn test_iterators_visit_every_entry_once() {
        let mut table = sip_table();
        for i in 0u32..50 {
            table.insert(i, i * 2);
        }

        let mut seen: Vec<u32> = table.iter().map(|(k, _)| *k).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..50).collect::<Vec<_>>());
        assert_eq!(table.iter().len(), 50);

        for (_, v) in table.iter_mut() {
            *v += 1;
        }
        assert_eq!(table.get(&3), Some(&7));

        let mut owned: Vec<(u32, u32)> = table.into_iter().collect();
        owned.sort_unstable();
        assert_eq!(owned.len(), 50);
        assert_eq!(owned[3], (3, 7));
    }

    #[test]
    fn test_drain() {
        let mut table = sip_table();
        for i in 0u32..10 {
            table.insert(i, i);
        }
        let drained: Vec<(u32, u32)> = table.drain().collect();
        assert_eq!(drained.len(), 10);
        assert!(table.is_empty());

        for i in 0u32..10 {
            table.insert(i, i);
        }
        {
            let mut partial = table.drain();
            partial.next();
            // Dropping mid-drain still empties the table.
        }
        assert!(table.is_empty());
        table.insert(1, 1);
        assert_eq!(table.get(&1), Some(&1));
    }

    #[test]
    fn test_clone_is_a_copy_constructor() {
        let mut table = sip_table();
        for i in 0u32..20 {
            table.insert(i, i.to_string());
        }
        let copy = table.clone();
        table.remove(&3);
        assert_eq!(copy.len(), 20);
        assert_eq!(copy.get(&3), Some(&"3".to_string()));
    }

    #[test]
    fn test_debug_formatting() {
        let mut table: HashTable<u32, String, _> = sip_table();
        table.insert(1, "one".to_string());
        let rendered = alloc::format!("{table:?}");
        assert!(rendered.contains("1"));
        assert!(rendered.contains("one"));
    }
}
