use std::collections::VecDeque;

use slotted::list::{Cursor, LinkedList};
use slotted::Error;

// Walk to the element at `offset`, or to the end position when offset == len.
fn cursor_at<T>(list: &LinkedList<T>, offset: usize) -> Cursor {
    let mut at = list.head();
    for _ in 0..offset {
        at = list.next(at).unwrap();
    }
    at
}

proptest::proptest! {
    #[test]
    fn list_push_pop_consistent(ops: Vec<(bool, bool, u8)>) {
        let mut deque: VecDeque<u8> = VecDeque::new();
        let mut list: LinkedList<u8> = LinkedList::new();

        for (push, front, value) in ops {
            if push {
                if front {
                    deque.push_front(value);
                    list.push_front(value);
                } else {
                    deque.push_back(value);
                    list.push_back(value);
                }
            } else if front {
                assert_eq!(deque.pop_front(), list.pop_front().ok());
            } else {
                assert_eq!(deque.pop_back(), list.pop_back().ok());
            }

            assert_eq!(deque.len(), list.len());
            assert_eq!(deque.front(), list.front());
            assert_eq!(deque.back(), list.back());
            assert!(deque.iter().eq(list.iter()));
        }
    }

    #[test]
    fn list_insert_consistent(values: Vec<u8>, inserts: Vec<(proptest::sample::Index, u8)>) {
        let mut deque: VecDeque<u8> = values.iter().cloned().collect();
        let mut list: LinkedList<u8> = values.iter().cloned().collect();

        for (index, value) in inserts {
            // Positions include one past the last element.
            let offset = index.index(deque.len() + 1);

            deque.insert(offset, value);
            let at = cursor_at(&list, offset);
            let new_at = list.insert(at, value).unwrap();

            assert_eq!(list.get(new_at), Ok(&value));
            assert!(deque.iter().eq(list.iter()));
        }
    }

    #[test]
    fn list_remove_consistent(values in proptest::collection::vec(proptest::arbitrary::any::<u8>(), 1..64), indices: Vec<proptest::sample::Index>) {
        let mut deque: VecDeque<u8> = values.iter().cloned().collect();
        let mut list: LinkedList<u8> = values.iter().cloned().collect();

        for index in indices {
            if deque.is_empty() {
                break;
            }
            let offset = index.index(deque.len());

            let at = cursor_at(&list, offset);
            assert_eq!(deque.remove(offset), list.remove(at).ok());

            // A removed position stays dead.
            assert_eq!(list.get(at), Err(Error::NoSuchElement));
            assert!(deque.iter().eq(list.iter()));
        }
    }

    #[test]
    fn list_seek_consistent(values in proptest::collection::vec(proptest::arbitrary::any::<u8>(), 1..64), from: proptest::sample::Index, delta in -70isize..70) {
        let list: LinkedList<u8> = values.iter().cloned().collect();
        let len = values.len() as isize;

        let start = from.index(values.len());
        let target = start as isize + delta;
        let at = cursor_at(&list, start);

        match list.seek(at, delta) {
            Ok(to) => {
                assert!((0..=len).contains(&target));
                if target == len {
                    assert!(to == list.end());
                } else {
                    assert_eq!(list.get(to), Ok(&values[target as usize]));
                }
            }
            Err(e) => {
                assert_eq!(e, Error::NoSuchElement);
                assert!(target < 0 || target > len);
            }
        }
    }

    #[test]
    fn list_iter_matches_cursor_walk(values: Vec<u8>) {
        let list: LinkedList<u8> = values.iter().cloned().collect();

        let mut walked = Vec::new();
        let mut at = list.head();
        while at != list.end() {
            walked.push(*list.get(at).unwrap());
            at = list.next(at).unwrap();
        }

        assert_eq!(walked, values);
        assert_eq!(list.next(at), Err(Error::NoSuchElement));
        assert!(list.iter().rev().eq(values.iter().rev()));
    }
}

#[test]
fn list_pop_order_1() {
    let mut list: LinkedList<u64> = LinkedList::new();
    list.push_back(1);
    list.push_back(2);
    list.push_back(3);

    assert_eq!(list.pop_front(), Ok(1));
    assert_eq!(list.pop_back(), Ok(3));
    assert_eq!(list.pop_front(), Ok(2));
    assert_eq!(list.pop_back(), Err(Error::Empty));
    assert_eq!(list.pop_front(), Err(Error::Empty));
}

#[test]
fn list_take_leaves_empty() {
    let mut list: LinkedList<u64> = (0..4).collect();

    let taken = std::mem::take(&mut list);
    assert_eq!(taken.len(), 4);

    assert!(list.is_empty());
    assert_eq!(list.pop_front(), Err(Error::Empty));

    // The emptied value is still a working list.
    list.push_back(9);
    assert_eq!(list.front(), Some(&9));
}

#[cfg(feature = "serde")]
#[test]
fn list_serde_roundtrip() {
    let list: LinkedList<u64> = (0..8).collect();

    let value = serde_json::to_value(&list).unwrap();
    let back: LinkedList<u64> = serde_json::from_value(value).unwrap();

    assert!(list == back);
}
