//! LinkedList - a doubly linked list with checked cursors
//!
//! The list stores its nodes in a generation-checked arena and links them by
//! slot id, so positions can be handed out as small `Copy` [`Cursor`] values
//! that never borrow the list. Navigation and element access take the cursor
//! back through the list and are validated on every use: walking past either
//! end, dereferencing the end position, or using a cursor whose element has
//! been removed all return an error instead of touching the wrong element.
//!
//! Insertion is positional (`insert` places a value before any cursor,
//! including `end()`), removal is positional or by popping either end, and
//! iteration is available both through the cursor protocol and through a
//! conventional double-ended [`Iter`].

use std::fmt;

#[cfg(feature = "serde")]
use serde::{
    de::{Deserialize, Deserializer},
    ser::{Serialize, SerializeSeq, Serializer},
};

use tracing::trace;

#[cfg(feature = "serde")]
use crate::utils::SeqCollector;

use crate::arena::{Arena, Id};
use crate::error::Error;

#[derive(Clone)]
struct Node<T> {
    value: T,
    next: Option<Id>,
    prev: Option<Id>,
}

/// Position in a [`LinkedList`].
///
/// Cursors are cheap to copy and do not borrow the list; all navigation and
/// access goes back through list methods, which re-validate the cursor each
/// time. The value `end()` addresses the one-past-the-last position. A
/// cursor onto an element that has since been removed is stale: every
/// checked use of it fails with [`Error::NoSuchElement`], even if the
/// underlying storage slot has been reused for a newer element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor(Option<Id>);

/// A doubly linked list over arbitrary element types.
///
/// Supports O(1) insertion and removal at any cursor position, front/back
/// pops, range removal, and bidirectional traversal. Element lookup by
/// position is O(n) by nature; cursor arithmetic ([`LinkedList::seek`])
/// steps one element at a time.
///
/// # Examples
/// ```
/// use slotted::LinkedList;
///
/// let mut list: LinkedList<u64> = LinkedList::new();
/// list.push_back(1);
/// list.push_back(3);
/// let at3 = list.tail();
///
/// // Insert before a held position.
/// list.insert(at3, 2).unwrap();
/// let content: Vec<u64> = list.iter().copied().collect();
/// assert_eq!(content, [1, 2, 3]);
///
/// // Removal through one cursor makes other cursors to that element stale.
/// list.remove(at3).unwrap();
/// assert!(list.get(at3).is_err());
/// ```
#[derive(Clone)]
pub struct LinkedList<T> {
    nodes: Arena<Node<T>>,
    head: Option<Id>,
    tail: Option<Id>,
}

impl<T> LinkedList<T> {
    /// Construct a new empty list.
    pub const fn new() -> Self {
        LinkedList {
            nodes: Arena::new(),
            head: None,
            tail: None,
        }
    }

    /// Returns the current number of elements in the list.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Determine if the list is currently empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Remove every element. All previously issued cursors become stale.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = None;
        self.tail = None;
    }

    // Internal node access. The link ids held in head/tail/next/prev always
    // address live slots, so a miss here is a broken structure invariant.
    fn node(&self, id: Id) -> &Node<T> {
        match self.nodes.get(id) {
            Some(n) => n,
            None => unreachable!(),
        }
    }

    fn node_mut(&mut self, id: Id) -> &mut Node<T> {
        match self.nodes.get_mut(id) {
            Some(n) => n,
            None => unreachable!(),
        }
    }

    /// Append a value at the back of the list, returning its cursor.
    pub fn push_back(&mut self, value: T) -> Cursor {
        let id = self.nodes.insert(Node {
            value,
            next: None,
            prev: self.tail,
        });
        match self.tail {
            Some(t) => self.node_mut(t).next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        Cursor(Some(id))
    }

    /// Prepend a value at the front of the list, returning its cursor.
    pub fn push_front(&mut self, value: T) -> Cursor {
        let id = self.nodes.insert(Node {
            value,
            next: self.head,
            prev: None,
        });
        match self.head {
            Some(h) => self.node_mut(h).prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        Cursor(Some(id))
    }

    /// Insert a value before the position `at` and return the new element's
    /// cursor. Inserting before `end()` appends. A stale cursor is an error
    /// and leaves the list untouched.
    pub fn insert(&mut self, at: Cursor, value: T) -> Result<Cursor, Error> {
        let before = match at.0 {
            None => return Ok(self.push_back(value)),
            Some(id) => {
                if !self.nodes.contains(id) {
                    return Err(Error::NoSuchElement);
                }
                id
            }
        };
        let prev = self.node(before).prev;
        let id = self.nodes.insert(Node {
            value,
            next: Some(before),
            prev,
        });
        self.node_mut(before).prev = Some(id);
        match prev {
            Some(p) => self.node_mut(p).next = Some(id),
            None => self.head = Some(id),
        }
        Ok(Cursor(Some(id)))
    }

    // Detach a live node from the chain and take its value out.
    fn unlink(&mut self, id: Id) -> T {
        let (prev, next) = {
            let n = self.node(id);
            (n.prev, n.next)
        };
        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }
        match self.nodes.remove(id) {
            Some(node) => node.value,
            None => unreachable!(),
        }
    }

    /// Remove and return the first element, or [`Error::Empty`] if there is
    /// nothing to pop.
    pub fn pop_front(&mut self) -> Result<T, Error> {
        let id = self.head.ok_or(Error::Empty)?;
        Ok(self.unlink(id))
    }

    /// Remove and return the last element, or [`Error::Empty`] if there is
    /// nothing to pop.
    pub fn pop_back(&mut self) -> Result<T, Error> {
        let id = self.tail.ok_or(Error::Empty)?;
        Ok(self.unlink(id))
    }

    /// Remove the element at the cursor and return its value. The `end()`
    /// position and stale cursors are errors. Every other cursor onto the
    /// removed element becomes stale.
    pub fn remove(&mut self, at: Cursor) -> Result<T, Error> {
        let id = at.0.ok_or(Error::NoSuchElement)?;
        if !self.nodes.contains(id) {
            return Err(Error::NoSuchElement);
        }
        Ok(self.unlink(id))
    }

    /// Remove the range `[first, last)` by repeated single removal; `last`
    /// may be `end()`. Hitting `end()` or a stale position before reaching
    /// `last` is an error, with the elements already removed staying
    /// removed.
    pub fn remove_range(&mut self, first: Cursor, last: Cursor) -> Result<(), Error> {
        let mut removed = 0usize;
        let mut at = first;
        while at != last {
            let id = at.0.ok_or(Error::NoSuchElement)?;
            if !self.nodes.contains(id) {
                return Err(Error::NoSuchElement);
            }
            let next = self.node(id).next;
            let _ = self.unlink(id);
            removed += 1;
            at = Cursor(next);
        }
        trace!(removed, "remove_range");
        Ok(())
    }

    /// Reference to the first element, `None` on an empty list.
    pub fn front(&self) -> Option<&T> {
        let id = self.head?;
        Some(&self.node(id).value)
    }

    /// Mutable reference to the first element.
    pub fn front_mut(&mut self) -> Option<&mut T> {
        let id = self.head?;
        Some(&mut self.node_mut(id).value)
    }

    /// Reference to the last element, `None` on an empty list.
    pub fn back(&self) -> Option<&T> {
        let id = self.tail?;
        Some(&self.node(id).value)
    }

    /// Mutable reference to the last element.
    pub fn back_mut(&mut self) -> Option<&mut T> {
        let id = self.tail?;
        Some(&mut self.node_mut(id).value)
    }

    /// Cursor of the first element; equals `end()` on an empty list.
    pub fn head(&self) -> Cursor {
        Cursor(self.head)
    }

    /// Cursor of the last element; equals `end()` on an empty list.
    pub fn tail(&self) -> Cursor {
        Cursor(self.tail)
    }

    /// The one-past-the-last position.
    pub fn end(&self) -> Cursor {
        Cursor(None)
    }

    /// Step a cursor toward the back. Stepping from the last element yields
    /// `end()`; stepping from `end()` or a stale cursor is an error.
    pub fn next(&self, at: Cursor) -> Result<Cursor, Error> {
        let id = at.0.ok_or(Error::NoSuchElement)?;
        let n = self.nodes.get(id).ok_or(Error::NoSuchElement)?;
        Ok(Cursor(n.next))
    }

    /// Step a cursor toward the front. Stepping from the first element is an
    /// error; stepping from `end()` yields the cursor of the last element,
    /// or an error on an empty list.
    pub fn prev(&self, at: Cursor) -> Result<Cursor, Error> {
        match at.0 {
            None => match self.tail {
                Some(t) => Ok(Cursor(Some(t))),
                None => Err(Error::NoSuchElement),
            },
            Some(id) => {
                let n = self.nodes.get(id).ok_or(Error::NoSuchElement)?;
                match n.prev {
                    Some(p) => Ok(Cursor(Some(p))),
                    None => Err(Error::NoSuchElement),
                }
            }
        }
    }

    /// Offset a cursor by `delta` positions, as repeated single steps. Each
    /// step is checked exactly like [`LinkedList::next`]/[`LinkedList::prev`],
    /// so a seek that would cross either boundary fails at the step that
    /// crosses it.
    pub fn seek(&self, from: Cursor, delta: isize) -> Result<Cursor, Error> {
        let mut at = from;
        if delta >= 0 {
            for _ in 0..delta {
                at = self.next(at)?;
            }
        } else {
            for _ in 0..delta.unsigned_abs() {
                at = self.prev(at)?;
            }
        }
        Ok(at)
    }

    /// Reference to the element at the cursor. The `end()` position and
    /// stale cursors are errors.
    pub fn get(&self, at: Cursor) -> Result<&T, Error> {
        let id = at.0.ok_or(Error::NoSuchElement)?;
        let n = self.nodes.get(id).ok_or(Error::NoSuchElement)?;
        Ok(&n.value)
    }

    /// Mutable reference to the element at the cursor.
    pub fn get_mut(&mut self, at: Cursor) -> Result<&mut T, Error> {
        let id = at.0.ok_or(Error::NoSuchElement)?;
        let n = self.nodes.get_mut(id).ok_or(Error::NoSuchElement)?;
        Ok(&mut n.value)
    }

    // Cursor of the element `offset` steps from the front; `end()` when the
    // offset is out of range. Used by the hash map to address chain entries.
    pub(crate) fn cursor_at(&self, offset: usize) -> Cursor {
        let mut at = self.head;
        for _ in 0..offset {
            match at {
                Some(id) => at = self.node(id).next,
                None => break,
            }
        }
        Cursor(at)
    }

    /// Double-ended iterator over `&T` in list order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            front: self.head,
            back: self.tail,
            remaining: self.len(),
        }
    }
}

impl<T> Default for LinkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for LinkedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for LinkedList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for LinkedList<T> {}

impl<T> FromIterator<T> for LinkedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = LinkedList::new();
        list.extend(iter);
        list
    }
}

impl<T> Extend<T> for LinkedList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        iter.into_iter().for_each(|v| {
            let _ = self.push_back(v);
        });
    }
}

impl<T, const N: usize> From<[T; N]> for LinkedList<T> {
    fn from(arr: [T; N]) -> Self {
        arr.into_iter().collect()
    }
}

/// Borrowing iterator over a [`LinkedList`], in list order.
pub struct Iter<'a, T> {
    list: &'a LinkedList<T>,
    front: Option<Id>,
    back: Option<Id>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front?;
        let n = self.list.node(id);
        self.front = n.next;
        self.remaining -= 1;
        Some(&n.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back?;
        let n = self.list.node(id);
        self.back = n.prev;
        self.remaining -= 1;
        Some(&n.value)
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> {}

/// Owning iterator over a [`LinkedList`]; drains front to back.
pub struct IntoIter<T>(LinkedList<T>);

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.0.pop_front().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.0.len(), Some(self.0.len()))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        self.0.pop_back().ok()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> IntoIterator for LinkedList<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter(self)
    }
}

impl<'a, T> IntoIterator for &'a LinkedList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

#[cfg(feature = "serde")]
impl<T: Serialize> Serialize for LinkedList<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_seq(Some(self.len()))?;
        for value in self.iter() {
            state.serialize_element(value)?;
        }
        state.end()
    }
}

#[cfg(feature = "serde")]
impl<'de, T: Deserialize<'de>> Deserialize<'de> for LinkedList<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(SeqCollector::new())
    }
}
