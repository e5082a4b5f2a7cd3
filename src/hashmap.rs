//! HashMap - a fixed-bucket chained hash map
//!
//! The map hashes each key once to pick a bucket out of a count fixed at
//! construction, and every bucket is a [`LinkedList`] of key-value pairs.
//! There is no rehashing and no load-factor management: past the bucket
//! count, lookups degrade linearly with chain length, which is exactly the
//! behaviour the workload benchmarks contrast against the tree map.
//!
//! The default build hasher is a fixed-seed state, so a given key lands in
//! the same bucket run after run. The `S` parameter admits any
//! `BuildHasher`; the tests use a pass-through state to steer keys into
//! chosen buckets and exercise long chains.
//!
//! Cursors address entries as a (bucket, chain offset) pair. Unlike the
//! list and tree cursors there is no per-entry generation behind them, so
//! they come with one caveat, spelled out on [`Cursor`].

use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};
use std::mem;

#[cfg(feature = "serde")]
use serde::{
    de::{Deserialize, Deserializer},
    ser::{Serialize, SerializeMap, Serializer},
};

use tracing::trace;

#[cfg(feature = "serde")]
use crate::utils::MapCollector;

use crate::error::Error;
use crate::list::{Iter as ChainIter, LinkedList};

/// The build hasher used when none is supplied. Fixed-seed, so bucket
/// placement is deterministic across runs and processes.
pub type DefaultHashBuilder = foldhash::fast::FixedState;

/// Bucket count used by [`HashMap::new`] and [`Default`].
pub const DEFAULT_BUCKET_COUNT: usize = 10_000;

/// Position in a [`HashMap`]: a bucket index and an offset into that
/// bucket's chain.
///
/// The `end()` position is encoded as the last bucket paired with the
/// length of its chain, one past the final entry. Every checked use
/// re-validates the offset against the current chain length, so a cursor
/// can never address outside live storage. What the offset cannot detect
/// is an earlier removal in the same chain: entries behind the removed one
/// shift down, and an in-range cursor silently addresses the shifted
/// element on next use. Treat hash map cursors as invalidated by removals
/// in the chain they point into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    bucket: usize,
    offset: usize,
}

/// An unordered map of fixed bucket count using separate chaining.
///
/// Each key is stored in exactly the bucket its hash selects, appended to
/// the bucket's chain on first insertion; a repeated insert replaces the
/// value in place. Traversal visits buckets in index order and each chain
/// front to back, so iteration order is a function of bucket placement and
/// insertion order, not of key order.
///
/// Equality is defined over the bucket arrangement: two maps are equal
/// when they have the same bucket count and every chain matches in order.
/// Maps holding the same pairs under different bucket counts or chain
/// orders are not equal.
///
/// # Examples
/// ```
/// use slotted::HashMap;
///
/// let mut map: HashMap<u64, &str> = HashMap::new();
/// map.insert(1, "one");
/// map.insert(2, "two");
///
/// assert_eq!(map.get(&1), Some(&"one"));
/// assert!(map.value(&3).is_err());
///
/// assert_eq!(map.remove(&2), Ok("two"));
/// assert!(map.remove(&2).is_err());
/// ```
#[derive(Clone)]
pub struct HashMap<K, V, S = DefaultHashBuilder> {
    buckets: Box<[LinkedList<(K, V)>]>,
    len: usize,
    build_hasher: S,
}

impl<K, V> HashMap<K, V, DefaultHashBuilder> {
    /// Construct a new map with [`DEFAULT_BUCKET_COUNT`] buckets and the
    /// default build hasher.
    pub fn new() -> Self {
        Self::with_bucket_count_and_hasher(DEFAULT_BUCKET_COUNT, DefaultHashBuilder::default())
    }

    /// Construct a new map with `bucket_count` buckets. Panics if the
    /// count is zero.
    pub fn with_bucket_count(bucket_count: usize) -> Self {
        Self::with_bucket_count_and_hasher(bucket_count, DefaultHashBuilder::default())
    }
}

impl<K, V, S> HashMap<K, V, S> {
    /// Construct a new map with [`DEFAULT_BUCKET_COUNT`] buckets and the
    /// given build hasher.
    pub fn with_hasher(build_hasher: S) -> Self {
        Self::with_bucket_count_and_hasher(DEFAULT_BUCKET_COUNT, build_hasher)
    }

    /// Construct a new map with `bucket_count` buckets and the given build
    /// hasher. Panics if the count is zero; a map with no buckets cannot
    /// place any key.
    pub fn with_bucket_count_and_hasher(bucket_count: usize, build_hasher: S) -> Self {
        assert!(bucket_count > 0, "Invalid bucket count!");
        let buckets = (0..bucket_count)
            .map(|_| LinkedList::new())
            .collect::<Vec<_>>()
            .into_boxed_slice();
        HashMap {
            buckets,
            len: 0,
            build_hasher,
        }
    }

    /// The number of buckets, fixed at construction.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the current number of k:v pairs in the map.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Determine if the map is currently empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove every entry, keeping the bucket count.
    pub fn clear(&mut self) {
        for chain in self.buckets.iter_mut() {
            chain.clear();
        }
        self.len = 0;
    }

    /// Cursor of the first entry in traversal order: offset 0 of the first
    /// occupied bucket. Equals `end()` on an empty map.
    pub fn first(&self) -> Cursor {
        match self.buckets.iter().position(|chain| !chain.is_empty()) {
            Some(bucket) => Cursor { bucket, offset: 0 },
            None => self.end(),
        }
    }

    /// The one-past-the-last position: the last bucket paired with its
    /// current chain length.
    pub fn end(&self) -> Cursor {
        let last = self.buckets.len() - 1;
        Cursor {
            bucket: last,
            offset: self.buckets[last].len(),
        }
    }

    /// References to the entry at the cursor. The `end()` position and any
    /// offset at or beyond the chain length are errors.
    pub fn get_at(&self, at: Cursor) -> Result<(&K, &V), Error> {
        let chain = self.buckets.get(at.bucket).ok_or(Error::NoSuchElement)?;
        let pair = chain.get(chain.cursor_at(at.offset))?;
        Ok((&pair.0, &pair.1))
    }

    /// Access the entry at the cursor with the value mutable. The key
    /// stays immutable; rewriting it would break bucket placement.
    pub fn get_at_mut(&mut self, at: Cursor) -> Result<(&K, &mut V), Error> {
        let chain = self
            .buckets
            .get_mut(at.bucket)
            .ok_or(Error::NoSuchElement)?;
        let pair = chain.get_mut(chain.cursor_at(at.offset))?;
        Ok((&pair.0, &mut pair.1))
    }

    /// Remove the entry at the cursor and return it. The `end()` position
    /// and out-of-range offsets are errors. Entries behind the removed one
    /// in the same chain shift down by one offset.
    pub fn remove_at(&mut self, at: Cursor) -> Result<(K, V), Error> {
        let chain = self
            .buckets
            .get_mut(at.bucket)
            .ok_or(Error::NoSuchElement)?;
        let pair = chain.remove(chain.cursor_at(at.offset))?;
        self.len -= 1;
        Ok(pair)
    }

    /// Step a cursor toward the end of traversal order: down the current
    /// chain, then to offset 0 of the next occupied bucket. Stepping from
    /// the last entry yields `end()`; stepping from `end()` or an
    /// out-of-range offset is an error.
    pub fn next(&self, at: Cursor) -> Result<Cursor, Error> {
        if at == self.end() {
            return Err(Error::NoSuchElement);
        }
        let chain = self.buckets.get(at.bucket).ok_or(Error::NoSuchElement)?;
        if at.offset >= chain.len() {
            return Err(Error::NoSuchElement);
        }
        if at.offset + 1 < chain.len() {
            return Ok(Cursor {
                bucket: at.bucket,
                offset: at.offset + 1,
            });
        }
        for bucket in at.bucket + 1..self.buckets.len() {
            if !self.buckets[bucket].is_empty() {
                return Ok(Cursor { bucket, offset: 0 });
            }
        }
        Ok(self.end())
    }

    /// Step a cursor toward the beginning of traversal order. Stepping
    /// from the first entry is an error; stepping from `end()` yields the
    /// last entry of the last occupied bucket, or an error on an empty
    /// map.
    pub fn prev(&self, at: Cursor) -> Result<Cursor, Error> {
        if at == self.first() {
            return Err(Error::NoSuchElement);
        }
        if at == self.end() {
            for bucket in (0..self.buckets.len()).rev() {
                let chain = &self.buckets[bucket];
                if !chain.is_empty() {
                    return Ok(Cursor {
                        bucket,
                        offset: chain.len() - 1,
                    });
                }
            }
            // An empty map has first() == end() and was caught above.
            unreachable!()
        }
        let chain = self.buckets.get(at.bucket).ok_or(Error::NoSuchElement)?;
        if at.offset >= chain.len() {
            return Err(Error::NoSuchElement);
        }
        if at.offset > 0 {
            return Ok(Cursor {
                bucket: at.bucket,
                offset: at.offset - 1,
            });
        }
        for bucket in (0..at.bucket).rev() {
            let chain = &self.buckets[bucket];
            if !chain.is_empty() {
                return Ok(Cursor {
                    bucket,
                    offset: chain.len() - 1,
                });
            }
        }
        // Offset 0 with no occupied bucket before it is first() and was
        // caught above.
        unreachable!()
    }

    /// Iterator over `(&K, &V)` in traversal order: buckets by index, each
    /// chain front to back.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            chain: None,
            remaining: self.len,
        }
    }

    /// Iterator over `&K` in traversal order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys(self.iter())
    }

    /// Iterator over `&V` in traversal order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values(self.iter())
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn hash_key<Q>(&self, k: &Q) -> u64
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut hasher = self.build_hasher.build_hasher();
        k.hash(&mut hasher);
        hasher.finish()
    }

    fn bucket_of<Q>(&self, k: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        (self.hash_key(k) % self.buckets.len() as u64) as usize
    }

    // Offset of the key in its bucket's chain.
    fn chain_offset<Q>(&self, bucket: usize, k: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.buckets[bucket].iter().position(|(ek, _)| ek.borrow() == k)
    }

    /// Insert or update a value by key. If the key was present its value
    /// is replaced in place (keeping its chain position) and the old value
    /// returned as `Some(V)`; a new key is appended at the tail of its
    /// bucket's chain.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let bucket = self.bucket_of(&key);
        match self.chain_offset(bucket, &key) {
            Some(offset) => {
                let chain = &mut self.buckets[bucket];
                match chain.get_mut(chain.cursor_at(offset)) {
                    Ok(pair) => Some(mem::replace(&mut pair.1, value)),
                    Err(_) => unreachable!(),
                }
            }
            None => {
                trace!(bucket, "insert append");
                let _ = self.buckets[bucket].push_back((key, value));
                self.len += 1;
                None
            }
        }
    }

    /// Retrieve the value for a key, appending an entry built by `f` to
    /// the key's chain if it is absent, and hand back a mutable reference
    /// either way.
    pub fn get_or_insert_with<F>(&mut self, key: K, f: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let bucket = self.bucket_of(&key);
        let offset = self.chain_offset(bucket, &key);
        let chain = &mut self.buckets[bucket];
        let at = match offset {
            Some(offset) => chain.cursor_at(offset),
            None => {
                self.len += 1;
                chain.push_back((key, f()))
            }
        };
        match chain.get_mut(at) {
            Ok(pair) => &mut pair.1,
            Err(_) => unreachable!(),
        }
    }

    /// Retrieve the value for a key, inserting `V::default()` if the key
    /// is absent. This is the indexing operation: `map.get_or_default(k)`
    /// both creates and addresses the entry.
    pub fn get_or_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Retrieve a value from the map. If the key exists, a reference is
    /// returned as `Some(&V)`, otherwise `None`.
    pub fn get<Q>(&self, k: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let bucket = self.bucket_of(k);
        self.buckets[bucket]
            .iter()
            .find_map(|(ek, v)| if ek.borrow() == k { Some(v) } else { None })
    }

    /// Retrieve a mutable reference to the value for a key.
    pub fn get_mut<Q>(&mut self, k: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let bucket = self.bucket_of(k);
        let offset = self.chain_offset(bucket, k)?;
        let chain = &mut self.buckets[bucket];
        match chain.get_mut(chain.cursor_at(offset)) {
            Ok(pair) => Some(&mut pair.1),
            Err(_) => unreachable!(),
        }
    }

    /// Assert if a key exists in the map.
    pub fn contains_key<Q>(&self, k: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(k).is_some()
    }

    /// Checked value access: a reference to the value for `k`, or
    /// [`Error::NoSuchElement`] if the key is absent.
    pub fn value<Q>(&self, k: &Q) -> Result<&V, Error>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(k).ok_or(Error::NoSuchElement)
    }

    /// Checked mutable value access for `k`.
    pub fn value_mut<Q>(&mut self, k: &Q) -> Result<&mut V, Error>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_mut(k).ok_or(Error::NoSuchElement)
    }

    /// Cursor of the entry for `k`, or `end()` if the key is absent.
    pub fn find<Q>(&self, k: &Q) -> Cursor
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let bucket = self.bucket_of(k);
        match self.chain_offset(bucket, k) {
            Some(offset) => Cursor { bucket, offset },
            None => self.end(),
        }
    }

    /// Remove the entry for a key and return its value. An absent key is
    /// [`Error::NoSuchElement`], which covers removal from an empty map.
    /// Entries behind it in the same chain shift down by one offset.
    pub fn remove<Q>(&mut self, k: &Q) -> Result<V, Error>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let bucket = self.bucket_of(k);
        let offset = self.chain_offset(bucket, k).ok_or(Error::NoSuchElement)?;
        let chain = &mut self.buckets[bucket];
        match chain.remove(chain.cursor_at(offset)) {
            Ok((_, v)) => {
                self.len -= 1;
                Ok(v)
            }
            Err(_) => unreachable!(),
        }
    }
}

impl<K, V, S: Default> Default for HashMap<K, V, S> {
    fn default() -> Self {
        Self::with_bucket_count_and_hasher(DEFAULT_BUCKET_COUNT, S::default())
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for HashMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, V: PartialEq, S> PartialEq for HashMap<K, V, S> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len
            && self.buckets.len() == other.buckets.len()
            && self
                .buckets
                .iter()
                .zip(other.buckets.iter())
                .all(|(a, b)| a == b)
    }
}

impl<K: Eq, V: Eq, S> Eq for HashMap<K, V, S> {}

impl<K, V, S> FromIterator<(K, V)> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = HashMap::with_bucket_count_and_hasher(DEFAULT_BUCKET_COUNT, S::default());
        iter.into_iter().for_each(|(k, v)| {
            // Bulk construction keeps the first value seen for a key.
            let _ = map.get_or_insert_with(k, || v);
        });
        map
    }
}

impl<K, V, S> Extend<(K, V)> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        iter.into_iter().for_each(|(k, v)| {
            let _ = self.insert(k, v);
        });
    }
}

impl<K: Hash + Eq, V, const N: usize> From<[(K, V); N]> for HashMap<K, V, DefaultHashBuilder> {
    fn from(arr: [(K, V); N]) -> Self {
        arr.into_iter().collect()
    }
}

/// Borrowing iterator over a [`HashMap`] in traversal order.
pub struct Iter<'a, K, V> {
    buckets: std::slice::Iter<'a, LinkedList<(K, V)>>,
    chain: Option<ChainIter<'a, (K, V)>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(chain) = self.chain.as_mut() {
                if let Some((k, v)) = chain.next() {
                    self.remaining -= 1;
                    return Some((k, v));
                }
            }
            self.chain = Some(self.buckets.next()?.iter());
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {}

/// Iterator over the keys of a [`HashMap`] in traversal order.
pub struct Keys<'a, K, V>(Iter<'a, K, V>);

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, K, V> ExactSizeIterator for Keys<'a, K, V> {}

/// Iterator over the values of a [`HashMap`] in traversal order.
pub struct Values<'a, K, V>(Iter<'a, K, V>);

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, K, V> ExactSizeIterator for Values<'a, K, V> {}

impl<'a, K, V, S> IntoIterator for &'a HashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

#[cfg(feature = "serde")]
impl<K, V, S> Serialize for HashMap<K, V, S>
where
    K: Serialize,
    V: Serialize,
{
    fn serialize<Sr>(&self, serializer: Sr) -> Result<Sr::Ok, Sr::Error>
    where
        Sr: Serializer,
    {
        let mut state = serializer.serialize_map(Some(self.len))?;

        for (key, val) in self.iter() {
            state.serialize_entry(key, val)?;
        }

        state.end()
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V, S> Deserialize<'de> for HashMap<K, V, S>
where
    K: Deserialize<'de> + Hash + Eq,
    V: Deserialize<'de>,
    S: BuildHasher + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(MapCollector::new())
    }
}

#[cfg(test)]
mod tests {
    use std::hash::{BuildHasher, Hasher};

    use super::{Cursor, HashMap};
    use crate::error::Error;

    // Forwards u64 keys untouched, so `key % bucket_count` picks the
    // bucket directly and collisions can be arranged.
    #[derive(Clone, Default)]
    struct PassThroughState;

    struct PassThroughHasher(u64);

    impl Hasher for PassThroughHasher {
        fn finish(&self) -> u64 {
            self.0
        }

        fn write(&mut self, _bytes: &[u8]) {
            unreachable!()
        }

        fn write_u64(&mut self, n: u64) {
            self.0 = n;
        }
    }

    impl BuildHasher for PassThroughState {
        type Hasher = PassThroughHasher;

        fn build_hasher(&self) -> PassThroughHasher {
            PassThroughHasher(0)
        }
    }

    #[test]
    fn test_hashmap_basic_write() {
        let _ = tracing_subscriber::fmt::try_init();
        let mut map: HashMap<u64, u64> = HashMap::new();

        map.insert(10, 10);
        map.insert(15, 15);

        assert!(map.contains_key(&10));
        assert!(map.contains_key(&15));
        assert!(!map.contains_key(&20));

        assert!(map.get(&10) == Some(&10));
        {
            let v = map.get_mut(&10).unwrap();
            *v = 11;
        }
        assert!(map.get(&10) == Some(&11));

        // Updating keeps the chain position and the length.
        assert!(map.insert(15, 16) == Some(15));
        assert!(map.len() == 2);

        assert!(map.remove(&10) == Ok(11));
        assert!(!map.contains_key(&10));
        assert!(map.contains_key(&15));

        assert!(map.remove(&30) == Err(Error::NoSuchElement));

        map.clear();
        assert!(!map.contains_key(&10));
        assert!(!map.contains_key(&15));
        assert!(map.is_empty());
        assert!(map.remove(&15) == Err(Error::NoSuchElement));
    }

    #[test]
    fn test_hashmap_bucket_collisions() {
        let mut map: HashMap<u64, &str, PassThroughState> =
            HashMap::with_bucket_count_and_hasher(8, PassThroughState);

        // 0 and 8 collide into bucket 0; 1 goes to bucket 1.
        map.insert(0, "zero");
        map.insert(8, "eight");
        map.insert(1, "one");
        assert!(map.len() == 3);

        assert!(map.find(&0) == Cursor { bucket: 0, offset: 0 });
        assert!(map.find(&8) == Cursor { bucket: 0, offset: 1 });
        assert!(map.find(&1) == Cursor { bucket: 1, offset: 0 });
        assert!(map.find(&16) == map.end());

        assert!(map.remove(&0) == Ok("zero"));
        // The collided key shifts to the chain front.
        assert!(map.find(&8) == Cursor { bucket: 0, offset: 0 });
        assert!(map.get(&8) == Some(&"eight"));
        assert!(map.get(&0).is_none());
    }

    #[test]
    fn test_hashmap_cursor_walk() {
        let mut map: HashMap<u64, u64, PassThroughState> =
            HashMap::with_bucket_count_and_hasher(4, PassThroughState);
        // Buckets: 1 -> [1, 5], 3 -> [3]; buckets 0 and 2 stay empty.
        map.insert(1, 10);
        map.insert(5, 50);
        map.insert(3, 30);

        let mut at = map.first();
        assert!(at == Cursor { bucket: 1, offset: 0 });
        assert!(map.get_at(at) == Ok((&1, &10)));
        at = map.next(at).unwrap();
        assert!(map.get_at(at) == Ok((&5, &50)));
        at = map.next(at).unwrap();
        assert!(map.get_at(at) == Ok((&3, &30)));
        at = map.next(at).unwrap();
        assert!(at == map.end());
        assert!(map.next(at) == Err(Error::NoSuchElement));
        assert!(map.get_at(at) == Err(Error::NoSuchElement));

        // And back again, crossing the empty bucket 2.
        at = map.prev(at).unwrap();
        assert!(map.get_at(at) == Ok((&3, &30)));
        at = map.prev(at).unwrap();
        assert!(map.get_at(at) == Ok((&5, &50)));
        at = map.prev(at).unwrap();
        assert!(at == map.first());
        assert!(map.prev(at) == Err(Error::NoSuchElement));

        let empty: HashMap<u64, u64> = HashMap::new();
        assert!(empty.first() == empty.end());
        assert!(empty.prev(empty.end()) == Err(Error::NoSuchElement));
    }

    #[test]
    fn test_hashmap_cursor_offset_shift() {
        let mut map: HashMap<u64, &str, PassThroughState> =
            HashMap::with_bucket_count_and_hasher(2, PassThroughState);
        // One chain: [0, 2, 4].
        map.insert(0, "a");
        map.insert(2, "b");
        map.insert(4, "c");

        let at_b = map.find(&2);
        assert!(map.get_at(at_b) == Ok((&2, &"b")));

        // Removing an earlier chain entry shifts the rest down; the held
        // offset now silently addresses the shifted element.
        assert!(map.remove(&0).is_ok());
        assert!(map.get_at(at_b) == Ok((&4, &"c")));

        // Once the offset falls past the chain it is caught.
        assert!(map.remove(&2).is_ok());
        assert!(map.get_at(at_b) == Err(Error::NoSuchElement));
        assert!(map.next(at_b) == Err(Error::NoSuchElement));
        assert!(map.prev(at_b) == Err(Error::NoSuchElement));
    }

    #[test]
    fn test_hashmap_end_encoding() {
        let mut map: HashMap<u64, u64, PassThroughState> =
            HashMap::with_bucket_count_and_hasher(4, PassThroughState);
        assert!(map.end() == Cursor { bucket: 3, offset: 0 });

        // Entries in the last bucket move the end offset past them.
        map.insert(3, 30);
        map.insert(7, 70);
        assert!(map.end() == Cursor { bucket: 3, offset: 2 });

        let last = map.prev(map.end()).unwrap();
        assert!(map.get_at(last) == Ok((&7, &70)));
    }

    #[test]
    fn test_hashmap_single_bucket() {
        let mut map: HashMap<u64, u64> = HashMap::with_bucket_count(1);
        for k in 0..16 {
            map.insert(k, k);
        }
        assert!(map.len() == 16);
        // Chain order is insertion order.
        let keys: Vec<u64> = map.keys().copied().collect();
        assert!(keys == (0..16).collect::<Vec<u64>>());

        for k in (0..16).step_by(2) {
            assert!(map.remove(&k).is_ok());
        }
        assert!(map.len() == 8);
        assert!(map.get(&3) == Some(&3));
        assert!(map.get(&2).is_none());
    }

    #[test]
    #[should_panic(expected = "Invalid bucket count!")]
    fn test_hashmap_zero_buckets() {
        let _map: HashMap<u64, u64> = HashMap::with_bucket_count(0);
    }

    #[test]
    fn test_hashmap_get_or_default() {
        let mut map: HashMap<u64, u64> = HashMap::with_bucket_count(16);
        *map.get_or_default(7) += 1;
        *map.get_or_default(7) += 1;
        assert!(map.get(&7) == Some(&2));
        assert!(map.len() == 1);

        let slot = map.get_or_insert_with(9, || 40);
        assert!(*slot == 40);
        *slot += 2;
        assert!(map.get(&9) == Some(&42));
        assert!(map.len() == 2);
    }

    #[test]
    fn test_hashmap_value_checked() {
        let mut map: HashMap<u64, u64> = HashMap::with_bucket_count(16);
        map.insert(1, 10);
        assert!(map.value(&1) == Ok(&10));
        assert!(map.value(&2) == Err(Error::NoSuchElement));
        *map.value_mut(&1).unwrap() = 11;
        assert!(map.value(&1) == Ok(&11));
        assert!(map.value_mut(&2) == Err(Error::NoSuchElement));
    }

    #[test]
    fn test_hashmap_remove_at() {
        let mut map: HashMap<u64, u64, PassThroughState> =
            HashMap::with_bucket_count_and_hasher(4, PassThroughState);
        map.insert(1, 10);
        map.insert(5, 50);

        let at = map.find(&5);
        assert!(map.remove_at(at) == Ok((5, 50)));
        assert!(map.len() == 1);
        assert!(map.remove_at(at) == Err(Error::NoSuchElement));
        assert!(map.remove_at(map.end()) == Err(Error::NoSuchElement));
    }

    #[test]
    fn test_hashmap_eq() {
        // Without collisions the bucket arrangement only depends on the
        // pair set, so insertion order does not matter.
        let a: HashMap<u64, u64, PassThroughState> = [(1, 1), (2, 2)].into_iter().collect();
        let b: HashMap<u64, u64, PassThroughState> = [(2, 2), (1, 1)].into_iter().collect();
        assert!(a == b);

        // Colliding keys make chain order part of the arrangement.
        let mut c: HashMap<u64, u64, PassThroughState> =
            HashMap::with_bucket_count_and_hasher(2, PassThroughState);
        c.insert(0, 0);
        c.insert(2, 2);
        let mut d: HashMap<u64, u64, PassThroughState> =
            HashMap::with_bucket_count_and_hasher(2, PassThroughState);
        d.insert(2, 2);
        d.insert(0, 0);
        assert!(c != d);

        // Same pairs under a different bucket count are not equal either.
        let e: HashMap<u64, u64, PassThroughState> =
            HashMap::with_bucket_count_and_hasher(4, PassThroughState);
        let f: HashMap<u64, u64, PassThroughState> =
            HashMap::with_bucket_count_and_hasher(8, PassThroughState);
        assert!(e != f);

        let mut g = c.clone();
        assert!(c == g);
        *g.get_mut(&0).unwrap() = 9;
        assert!(c != g);
    }

    #[test]
    fn test_hashmap_from_iter_first_wins() {
        let map: HashMap<u64, &str> = vec![(1, "first"), (2, "two"), (1, "second")]
            .into_iter()
            .collect();
        assert!(map.len() == 2);
        assert!(map.get(&1) == Some(&"first"));

        // Extend goes through insert and therefore updates.
        let mut map = map;
        map.extend([(1, "third")]);
        assert!(map.get(&1) == Some(&"third"));
    }

    #[test]
    fn test_hashmap_clone_independent() {
        let map: HashMap<u64, u64> = [(1, 1), (2, 2)].into();
        let mut copy = map.clone();
        assert!(map == copy);

        assert!(copy.remove(&1).is_ok());
        assert!(map.get(&1) == Some(&1));
        assert!(map != copy);
        assert!(map.len() == 2);
        assert!(copy.len() == 1);
    }

    #[test]
    fn test_hashmap_basic_iter() {
        let mut map: HashMap<u64, u64> = HashMap::new();
        assert!(map.iter().count() == 0);

        map.insert(10, 10);
        map.insert(15, 15);

        assert!(map.iter().count() == 2);
        assert!(map.iter().len() == 2);
        let key_sum: u64 = map.keys().sum();
        assert!(key_sum == 25);
        let val_sum: u64 = map.values().sum();
        assert!(val_sum == 25);

        let pairs: Vec<(u64, u64)> = (&map).into_iter().map(|(k, v)| (*k, *v)).collect();
        assert!(pairs.len() == 2);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_hashmap_serialize_deserialize() {
        let map: HashMap<usize, usize> = vec![(10, 11), (15, 16), (20, 21)].into_iter().collect();

        let value = serde_json::to_value(&map).unwrap();
        assert_eq!(value, serde_json::json!({ "10": 11, "15": 16, "20": 21 }));

        let map: HashMap<usize, usize> = serde_json::from_value(value).unwrap();
        let mut vec: Vec<(usize, usize)> = map.iter().map(|(k, v)| (*k, *v)).collect();
        vec.sort_unstable();
        assert_eq!(vec, [(10, 11), (15, 16), (20, 21)]);
    }
}
