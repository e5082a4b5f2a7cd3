//! TreeMap - an ordered map over an unbalanced binary search tree
//!
//! The tree is a plain binary search tree with parent back-links and no
//! rebalancing of any kind. In-order traversal yields keys in ascending
//! order, and the cost of every operation tracks the shape the insertion
//! order produced: random keys give O(log n) paths, sorted keys degrade to
//! a linked-list shape with O(n) paths. The structure is deliberate about
//! this; it exists to make the cost of an unbalanced tree observable under
//! the workload benchmarks, in contrast to the hashed map.
//!
//! Nodes live in a generation-checked arena (see [`Cursor`] for the
//! staleness contract). Removal of a node with two children follows the
//! replacement scheme: the in-order successor is unlinked first, then a
//! fresh node carrying the successor's entry is wired into the removed
//! node's position, with both children's parent links repointed at it.
//! Cursors onto the removed node and onto the moved successor both become
//! stale; re-finding the key addresses the replacement.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::mem;

#[cfg(feature = "serde")]
use serde::{
    de::{Deserialize, Deserializer},
    ser::{Serialize, SerializeMap, Serializer},
};

use tracing::trace;

#[cfg(feature = "serde")]
use crate::utils::MapCollector;

use crate::arena::{Arena, Id};
use crate::error::Error;

#[derive(Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    parent: Option<Id>,
    left: Option<Id>,
    right: Option<Id>,
}

/// Position in a [`TreeMap`].
///
/// Cursors are cheap to copy and do not borrow the map; navigation and
/// access go back through map methods and are validated on every use. The
/// value `end()` is the one-past-the-last position. A cursor onto an entry
/// that has since been removed is stale and every checked use of it fails
/// with [`Error::NoSuchElement`]. Note that removing an entry whose node
/// has two children also stales cursors onto the in-order successor, since
/// the successor's entry moves into a replacement node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor(Option<Id>);

/// An ordered map implemented as an unbalanced binary search tree.
///
/// Keys are kept unique and traversal is in ascending key order. There is
/// no rebalancing: lookup, insertion and removal are O(depth), and the
/// depth is whatever the insertion order built. Equality compares the
/// entry sequence in sorted order, so two maps with the same entries but
/// different shapes compare equal.
///
/// # Examples
/// ```
/// use slotted::TreeMap;
///
/// let mut map: TreeMap<u64, &str> = TreeMap::new();
/// map.insert(5, "five");
/// map.insert(3, "three");
/// map.insert(8, "eight");
///
/// // In-order traversal is ascending by key.
/// let keys: Vec<u64> = map.keys().copied().collect();
/// assert_eq!(keys, [3, 5, 8]);
///
/// // Checked access reports absence as an error instead of a panic.
/// assert!(map.value(&3).is_ok());
/// assert!(map.value(&4).is_err());
/// ```
#[derive(Clone)]
pub struct TreeMap<K, V> {
    nodes: Arena<Node<K, V>>,
    root: Option<Id>,
}

impl<K, V> TreeMap<K, V> {
    /// Construct a new empty map.
    pub const fn new() -> Self {
        TreeMap {
            nodes: Arena::new(),
            root: None,
        }
    }

    /// Returns the current number of entries in the map.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Determine if the map is currently empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Remove every entry. All previously issued cursors become stale.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    // Internal node access. Link ids always address live slots, so a miss
    // here is a broken structure invariant.
    fn node(&self, id: Id) -> &Node<K, V> {
        match self.nodes.get(id) {
            Some(n) => n,
            None => unreachable!(),
        }
    }

    fn node_mut(&mut self, id: Id) -> &mut Node<K, V> {
        match self.nodes.get_mut(id) {
            Some(n) => n,
            None => unreachable!(),
        }
    }

    fn leftmost(&self, mut id: Id) -> Id {
        while let Some(l) = self.node(id).left {
            id = l;
        }
        id
    }

    fn rightmost(&self, mut id: Id) -> Id {
        while let Some(r) = self.node(id).right {
            id = r;
        }
        id
    }

    /// Cursor of the entry with the smallest key; equals `end()` on an
    /// empty map.
    pub fn first(&self) -> Cursor {
        Cursor(self.root.map(|r| self.leftmost(r)))
    }

    /// Cursor of the entry with the largest key; equals `end()` on an
    /// empty map.
    pub fn last(&self) -> Cursor {
        Cursor(self.root.map(|r| self.rightmost(r)))
    }

    /// The one-past-the-last position.
    pub fn end(&self) -> Cursor {
        Cursor(None)
    }

    /// References to the entry at the cursor. The `end()` position and
    /// stale cursors are errors.
    pub fn get_at(&self, at: Cursor) -> Result<(&K, &V), Error> {
        let id = at.0.ok_or(Error::NoSuchElement)?;
        let n = self.nodes.get(id).ok_or(Error::NoSuchElement)?;
        Ok((&n.key, &n.value))
    }

    /// Access the entry at the cursor with the value mutable. The key stays
    /// immutable; rewriting it would break the search order.
    pub fn get_at_mut(&mut self, at: Cursor) -> Result<(&K, &mut V), Error> {
        let id = at.0.ok_or(Error::NoSuchElement)?;
        let n = self.nodes.get_mut(id).ok_or(Error::NoSuchElement)?;
        Ok((&n.key, &mut n.value))
    }

    /// Remove the entry at the cursor and return it. The `end()` position
    /// and stale cursors are errors.
    pub fn remove_at(&mut self, at: Cursor) -> Result<(K, V), Error> {
        let id = at.0.ok_or(Error::NoSuchElement)?;
        if !self.nodes.contains(id) {
            return Err(Error::NoSuchElement);
        }
        Ok(self.detach(id))
    }

    // Point the parent's child link (or the root) away from `old`.
    fn replace_child(&mut self, parent: Option<Id>, old: Id, new: Option<Id>) {
        match parent {
            None => {
                debug_assert!(self.root == Some(old));
                self.root = new;
            }
            Some(p) => {
                let pn = self.node_mut(p);
                if pn.left == Some(old) {
                    pn.left = new;
                } else {
                    debug_assert!(pn.right == Some(old));
                    pn.right = new;
                }
            }
        }
    }

    fn take_node(&mut self, id: Id) -> (K, V) {
        match self.nodes.remove(id) {
            Some(n) => (n.key, n.value),
            None => unreachable!(),
        }
    }

    // Unlink a live node by shape: leaf, single child, or replacement via
    // the in-order successor.
    fn detach(&mut self, id: Id) -> (K, V) {
        let (parent, left, right) = {
            let n = self.node(id);
            (n.parent, n.left, n.right)
        };
        match (left, right) {
            (None, None) => {
                trace!("detach leaf");
                self.replace_child(parent, id, None);
                self.take_node(id)
            }
            (Some(child), None) | (None, Some(child)) => {
                trace!("detach splice");
                self.replace_child(parent, id, Some(child));
                self.node_mut(child).parent = parent;
                self.take_node(id)
            }
            (Some(_), Some(r)) => {
                trace!("detach via successor");
                // The successor is the leftmost node of the right subtree
                // and has no left child, so detaching it recurses at most
                // once, into the leaf or splice case.
                let succ = self.leftmost(r);
                let (sk, sv) = self.detach(succ);
                // Reread the shape: unlinking the successor reshaped the
                // right subtree (including when it was the direct right
                // child).
                let (parent, left, right) = {
                    let n = self.node(id);
                    (n.parent, n.left, n.right)
                };
                let rep = self.nodes.insert(Node {
                    key: sk,
                    value: sv,
                    parent,
                    left,
                    right,
                });
                self.replace_child(parent, id, Some(rep));
                if let Some(l) = left {
                    self.node_mut(l).parent = Some(rep);
                }
                if let Some(r) = right {
                    self.node_mut(r).parent = Some(rep);
                }
                self.take_node(id)
            }
        }
    }

    /// Double-ended iterator over `(&K, &V)` in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            map: self,
            front: self.root.map(|r| self.leftmost(r)),
            back: self.root.map(|r| self.rightmost(r)),
            remaining: self.len(),
        }
    }

    /// Iterator over `&K` in ascending order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys(self.iter())
    }

    /// Iterator over `&V` in ascending key order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values(self.iter())
    }
}

impl<K: Ord, V> TreeMap<K, V> {
    // Descend from the root comparing keys.
    fn find_id<Q>(&self, key: &Q) -> Option<Id>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut at = self.root;
        while let Some(id) = at {
            let n = self.node(id);
            match key.cmp(n.key.borrow()) {
                Ordering::Less => at = n.left,
                Ordering::Greater => at = n.right,
                Ordering::Equal => return Some(id),
            }
        }
        None
    }

    /// Insert or update a value by key. If the key was present its value is
    /// replaced in place and the old value returned as `Some(V)`; the tree
    /// is never restructured by an update. A new key is attached as a leaf
    /// at the point the descent ran off the tree.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let mut at = match self.root {
            Some(r) => r,
            None => {
                let id = self.nodes.insert(Node {
                    key,
                    value,
                    parent: None,
                    left: None,
                    right: None,
                });
                self.root = Some(id);
                return None;
            }
        };
        loop {
            let n = self.node(at);
            let ord = key.cmp(&n.key);
            let (left, right) = (n.left, n.right);
            match ord {
                Ordering::Less => match left {
                    Some(l) => at = l,
                    None => {
                        let id = self.nodes.insert(Node {
                            key,
                            value,
                            parent: Some(at),
                            left: None,
                            right: None,
                        });
                        self.node_mut(at).left = Some(id);
                        return None;
                    }
                },
                Ordering::Greater => match right {
                    Some(r) => at = r,
                    None => {
                        let id = self.nodes.insert(Node {
                            key,
                            value,
                            parent: Some(at),
                            left: None,
                            right: None,
                        });
                        self.node_mut(at).right = Some(id);
                        return None;
                    }
                },
                Ordering::Equal => {
                    return Some(mem::replace(&mut self.node_mut(at).value, value));
                }
            }
        }
    }

    /// Retrieve the value for a key, inserting one built by `f` if the key
    /// is absent, and hand back a mutable reference either way.
    pub fn get_or_insert_with<F>(&mut self, key: K, f: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let found = match self.root {
            Some(r) => {
                let mut at = r;
                loop {
                    let n = self.node(at);
                    let ord = key.cmp(&n.key);
                    let (left, right) = (n.left, n.right);
                    match ord {
                        Ordering::Less => match left {
                            Some(l) => at = l,
                            None => break Err(at),
                        },
                        Ordering::Greater => match right {
                            Some(r) => at = r,
                            None => break Err(at),
                        },
                        Ordering::Equal => break Ok(at),
                    }
                }
            }
            None => {
                let id = self.nodes.insert(Node {
                    key,
                    value: f(),
                    parent: None,
                    left: None,
                    right: None,
                });
                self.root = Some(id);
                return &mut self.node_mut(id).value;
            }
        };
        let id = match found {
            Ok(id) => id,
            Err(parent) => {
                let go_left = key < self.node(parent).key;
                let id = self.nodes.insert(Node {
                    key,
                    value: f(),
                    parent: Some(parent),
                    left: None,
                    right: None,
                });
                if go_left {
                    self.node_mut(parent).left = Some(id);
                } else {
                    self.node_mut(parent).right = Some(id);
                }
                id
            }
        };
        &mut self.node_mut(id).value
    }

    /// Retrieve the value for a key, inserting `V::default()` if the key is
    /// absent. This is the indexing operation: `map.get_or_default(k)` both
    /// creates and addresses the entry.
    pub fn get_or_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Retrieve a value from the map. If the key exists, a reference is
    /// returned as `Some(&V)`, otherwise `None`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.find_id(key)?;
        Some(&self.node(id).value)
    }

    /// Retrieve a mutable reference to the value for a key.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.find_id(key)?;
        Some(&mut self.node_mut(id).value)
    }

    /// Assert if a key exists in the map.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_id(key).is_some()
    }

    /// Checked value access: a reference to the value for `key`, or
    /// [`Error::NoSuchElement`] if the key is absent.
    pub fn value<Q>(&self, key: &Q) -> Result<&V, Error>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).ok_or(Error::NoSuchElement)
    }

    /// Checked mutable value access for `key`.
    pub fn value_mut<Q>(&mut self, key: &Q) -> Result<&mut V, Error>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_mut(key).ok_or(Error::NoSuchElement)
    }

    /// Cursor of the entry for `key`, or `end()` if the key is absent.
    pub fn find<Q>(&self, key: &Q) -> Cursor
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Cursor(self.find_id(key))
    }

    /// Remove the entry for a key and return its value. An absent key is
    /// [`Error::NoSuchElement`], which covers removal from an empty map.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<V, Error>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.find_id(key).ok_or(Error::NoSuchElement)?;
        let (_, v) = self.detach(id);
        Ok(v)
    }

    // In-order successor: leftmost of the right subtree when there is one,
    // otherwise the first ancestor whose key is greater than the starting
    // key.
    fn succ_of(&self, id: Id) -> Option<Id> {
        let n = self.node(id);
        if let Some(r) = n.right {
            return Some(self.leftmost(r));
        }
        let start = &n.key;
        let mut up = n.parent;
        while let Some(p) = up {
            let pn = self.node(p);
            if pn.key < *start {
                up = pn.parent;
            } else {
                return Some(p);
            }
        }
        None
    }

    fn pred_of(&self, id: Id) -> Option<Id> {
        let n = self.node(id);
        if let Some(l) = n.left {
            return Some(self.rightmost(l));
        }
        let start = &n.key;
        let mut up = n.parent;
        while let Some(p) = up {
            let pn = self.node(p);
            if pn.key > *start {
                up = pn.parent;
            } else {
                return Some(p);
            }
        }
        None
    }

    /// Step a cursor toward larger keys. Stepping from the largest key
    /// yields `end()`; stepping from `end()` or a stale cursor is an error.
    pub fn next(&self, at: Cursor) -> Result<Cursor, Error> {
        let id = at.0.ok_or(Error::NoSuchElement)?;
        if !self.nodes.contains(id) {
            return Err(Error::NoSuchElement);
        }
        Ok(Cursor(self.succ_of(id)))
    }

    /// Step a cursor toward smaller keys. Stepping from the smallest key is
    /// an error; stepping from `end()` yields the cursor of the largest
    /// key, or an error on an empty map.
    pub fn prev(&self, at: Cursor) -> Result<Cursor, Error> {
        match at.0 {
            None => match self.root {
                Some(r) => Ok(Cursor(Some(self.rightmost(r)))),
                None => Err(Error::NoSuchElement),
            },
            Some(id) => {
                if !self.nodes.contains(id) {
                    return Err(Error::NoSuchElement);
                }
                match self.pred_of(id) {
                    Some(p) => Ok(Cursor(Some(p))),
                    None => Err(Error::NoSuchElement),
                }
            }
        }
    }
}

impl<K, V> Default for TreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for TreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V: PartialEq> PartialEq for TreeMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Ord, V: Eq> Eq for TreeMap<K, V> {}

impl<K: Ord, V> FromIterator<(K, V)> for TreeMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = TreeMap::new();
        iter.into_iter().for_each(|(k, v)| {
            // Bulk construction keeps the first value seen for a key.
            let _ = map.get_or_insert_with(k, || v);
        });
        map
    }
}

impl<K: Ord, V> Extend<(K, V)> for TreeMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        iter.into_iter().for_each(|(k, v)| {
            let _ = self.insert(k, v);
        });
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for TreeMap<K, V> {
    fn from(arr: [(K, V); N]) -> Self {
        arr.into_iter().collect()
    }
}

/// Borrowing iterator over a [`TreeMap`] in ascending key order.
pub struct Iter<'a, K, V> {
    map: &'a TreeMap<K, V>,
    front: Option<Id>,
    back: Option<Id>,
    remaining: usize,
}

impl<'a, K: Ord, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front?;
        let n = self.map.node(id);
        self.front = self.map.succ_of(id);
        self.remaining -= 1;
        Some((&n.key, &n.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K: Ord, V> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back?;
        let n = self.map.node(id);
        self.back = self.map.pred_of(id);
        self.remaining -= 1;
        Some((&n.key, &n.value))
    }
}

impl<'a, K: Ord, V> ExactSizeIterator for Iter<'a, K, V> {}

/// Iterator over the keys of a [`TreeMap`] in ascending order.
pub struct Keys<'a, K, V>(Iter<'a, K, V>);

impl<'a, K: Ord, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, K: Ord, V> DoubleEndedIterator for Keys<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(|(k, _)| k)
    }
}

impl<'a, K: Ord, V> ExactSizeIterator for Keys<'a, K, V> {}

/// Iterator over the values of a [`TreeMap`] in ascending key order.
pub struct Values<'a, K, V>(Iter<'a, K, V>);

impl<'a, K: Ord, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, K: Ord, V> DoubleEndedIterator for Values<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(|(_, v)| v)
    }
}

impl<'a, K: Ord, V> ExactSizeIterator for Values<'a, K, V> {}

impl<'a, K: Ord, V> IntoIterator for &'a TreeMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

#[cfg(feature = "serde")]
impl<K, V> Serialize for TreeMap<K, V>
where
    K: Serialize + Ord,
    V: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_map(Some(self.len()))?;

        for (key, val) in self.iter() {
            state.serialize_entry(key, val)?;
        }

        state.end()
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> Deserialize<'de> for TreeMap<K, V>
where
    K: Deserialize<'de> + Ord,
    V: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(MapCollector::new())
    }
}
