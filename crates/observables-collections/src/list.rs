//! Observable list.
//!
//! [`ObservableList`] wraps a `Vec<T>` and reports every mutation to its
//! observers as a [`ListChange`]. Bulk operations are coarse-grained:
//! `extend`, `clear`, `reverse` and the sort family fire a single change for
//! the whole operation.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use observables_core::{Observable, ObservableConfig, ObservableError, ObservableResult, Observed, Observer};

/// Operation tag of a [`ListChange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListOperation {
    /// A value was appended.
    Append,
    /// A value was inserted.
    Insert,
    /// A value was replaced.
    Modify,
    /// A value was removed.
    Delete,
    /// All values were removed.
    Clear,
    /// Several values were appended at once.
    Extend,
    /// The order was reversed.
    Reverse,
    /// The list was sorted.
    Sort,
}

impl ListOperation {
    /// Get the operation name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ListOperation::Append => "append",
            ListOperation::Insert => "insert",
            ListOperation::Modify => "modify",
            ListOperation::Delete => "delete",
            ListOperation::Clear => "clear",
            ListOperation::Extend => "extend",
            ListOperation::Reverse => "reverse",
            ListOperation::Sort => "sort",
        }
    }
}

impl fmt::Display for ListOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparator used to sort an [`ObservableList`].
///
/// Like [`Observer`], a `SortKey` is a shared handle; observers of a sort
/// receive the very key the caller passed and can compare it with
/// [`SortKey::ptr_eq`].
pub struct SortKey<T> {
    compare: Rc<dyn Fn(&T, &T) -> Ordering>,
}

impl<T> SortKey<T> {
    /// Create a key from a comparator.
    pub fn new(compare: impl Fn(&T, &T) -> Ordering + 'static) -> Self {
        Self {
            compare: Rc::new(compare),
        }
    }

    /// Create a key that orders values by a derived key.
    pub fn by_key<K, F>(key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + 'static,
    {
        Self::new(move |a, b| key(a).cmp(&key(b)))
    }

    /// Compare two values.
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.compare)(a, b)
    }

    /// Check whether two keys are the same handle.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.compare), Rc::as_ptr(&other.compare))
    }
}

impl<T> Clone for SortKey<T> {
    fn clone(&self) -> Self {
        Self {
            compare: Rc::clone(&self.compare),
        }
    }
}

impl<T> PartialEq for SortKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T> fmt::Debug for SortKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortKey").finish_non_exhaustive()
    }
}

/// Change record for an [`ObservableList`].
#[derive(Debug, Clone, PartialEq)]
pub enum ListChange<T> {
    /// `value` was appended at `index` (the length before appending).
    Append {
        /// Position of the new value.
        index: usize,
        /// The appended value.
        value: T,
    },
    /// `value` was inserted at `index`.
    Insert {
        /// Requested position. Positions past the end append.
        index: usize,
        /// Value that was at `index` before, if any.
        displaced: Option<T>,
        /// The inserted value.
        value: T,
    },
    /// The value at `index` was replaced.
    Modify {
        /// Position of the replaced value.
        index: usize,
        /// Value before the change.
        old_value: T,
        /// Value after the change.
        new_value: T,
    },
    /// The value at `index` was removed.
    Delete {
        /// Position of the removed value.
        index: usize,
        /// The removed value.
        value: T,
    },
    /// All values were removed.
    Clear,
    /// `values` were appended starting at `index` (the length before).
    Extend {
        /// Position of the first new value.
        index: usize,
        /// The appended batch.
        values: Vec<T>,
    },
    /// The order was reversed.
    Reverse,
    /// The list was sorted.
    Sort {
        /// Comparator, or `None` for the natural order.
        key: Option<SortKey<T>>,
        /// Whether the order is descending.
        reverse: bool,
    },
}

impl<T> ListChange<T> {
    /// Get the operation tag.
    pub fn operation(&self) -> ListOperation {
        match self {
            ListChange::Append { .. } => ListOperation::Append,
            ListChange::Insert { .. } => ListOperation::Insert,
            ListChange::Modify { .. } => ListOperation::Modify,
            ListChange::Delete { .. } => ListOperation::Delete,
            ListChange::Clear => ListOperation::Clear,
            ListChange::Extend { .. } => ListOperation::Extend,
            ListChange::Reverse => ListOperation::Reverse,
            ListChange::Sort { .. } => ListOperation::Sort,
        }
    }

    /// Index the change applies to. `None` for whole-list operations.
    pub fn index(&self) -> Option<usize> {
        match self {
            ListChange::Append { index, .. }
            | ListChange::Insert { index, .. }
            | ListChange::Modify { index, .. }
            | ListChange::Delete { index, .. }
            | ListChange::Extend { index, .. } => Some(*index),
            ListChange::Clear | ListChange::Reverse | ListChange::Sort { .. } => None,
        }
    }

    /// Single element value before the change, if any.
    pub fn old_value(&self) -> Option<&T> {
        match self {
            ListChange::Insert { displaced, .. } => displaced.as_ref(),
            ListChange::Modify { old_value, .. } => Some(old_value),
            ListChange::Delete { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Single element value after the change, if any.
    ///
    /// `Extend` carries a batch instead; see [`ListChange::Extend`].
    pub fn new_value(&self) -> Option<&T> {
        match self {
            ListChange::Append { value, .. } | ListChange::Insert { value, .. } => Some(value),
            ListChange::Modify { new_value, .. } => Some(new_value),
            _ => None,
        }
    }
}

/// Observer handle for an [`ObservableList`].
pub type ListObserver<T> = Observer<ObservableList<T>, ListChange<T>>;

struct ListInner<T: 'static> {
    items: RefCell<Vec<T>>,
    observable: Observable<ObservableList<T>, ListChange<T>>,
}

/// An observable `Vec`.
///
/// `ObservableList` is a shared handle; clones see the same items and
/// observers. Every mutating method dispatches the change to the
/// before-observers, applies it, then dispatches it to the after-observers.
///
/// # Example
///
/// ```
/// use observables_collections::ObservableList;
/// use observables_core::Observed;
///
/// let list: ObservableList<&str> = ObservableList::new();
/// list.observe_after(|_, change| {
///     println!("{} at {:?}", change.operation(), change.index());
///     Ok(())
/// });
///
/// list.append("a").unwrap();
/// list.extend(["b", "c"]).unwrap();
/// assert_eq!(list.to_vec(), vec!["a", "b", "c"]);
/// ```
pub struct ObservableList<T: 'static> {
    inner: Rc<ListInner<T>>,
}

impl<T: Clone + PartialEq + 'static> ObservableList<T> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::with_config(Vec::new(), ObservableConfig::default())
    }

    /// Create a list holding `items` with the given configuration.
    pub fn with_config(items: impl IntoIterator<Item = T>, config: ObservableConfig) -> Self {
        Self {
            inner: Rc::new(ListInner {
                items: RefCell::new(items.into_iter().collect()),
                observable: Observable::new(config),
            }),
        }
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    /// Get a clone of the item at `index`.
    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.items.borrow().get(index).cloned()
    }

    /// Check if the list contains `value`.
    pub fn contains(&self, value: &T) -> bool {
        self.inner.items.borrow().contains(value)
    }

    /// Position of the first item equal to `value`.
    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.inner.items.borrow().iter().position(|item| item == value)
    }

    /// Copy the items into a `Vec`.
    pub fn to_vec(&self) -> Vec<T> {
        self.inner.items.borrow().clone()
    }

    /// Access the items by reference.
    ///
    /// The closure must not mutate this list.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.inner.items.borrow())
    }

    /// Append a value.
    pub fn append(&self, value: T) -> ObservableResult<()> {
        let change = ListChange::Append {
            index: self.len(),
            value: value.clone(),
        };
        self.apply(&change, |items| {
            items.push(value);
            Ok(())
        })
    }

    /// Insert a value at `index`, shifting later items right.
    ///
    /// An index at or past the end appends; the change then reports no
    /// displaced value.
    pub fn insert(&self, index: usize, value: T) -> ObservableResult<()> {
        let change = ListChange::Insert {
            index,
            displaced: self.get(index),
            value: value.clone(),
        };
        self.apply(&change, |items| {
            let at = index.min(items.len());
            items.insert(at, value);
            Ok(())
        })
    }

    /// Replace the value at `index`.
    ///
    /// Replacing a value with an equal one does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ObservableError::IndexOutOfRange`] if `index` is out of
    /// bounds.
    pub fn set(&self, index: usize, value: T) -> ObservableResult<()> {
        let old_value = self.get(index).ok_or_else(|| self.out_of_range(index))?;
        if old_value == value {
            return Ok(());
        }

        let change = ListChange::Modify {
            index,
            old_value,
            new_value: value.clone(),
        };
        self.apply(&change, |items| {
            let len = items.len();
            let slot = items
                .get_mut(index)
                .ok_or(ObservableError::IndexOutOfRange { index, len })?;
            *slot = value;
            Ok(())
        })
    }

    /// Remove and return the last value.
    ///
    /// # Errors
    ///
    /// Returns [`ObservableError::EmptyContainer`] if the list is empty.
    pub fn pop(&self) -> ObservableResult<T> {
        let len = self.len();
        if len == 0 {
            return Err(ObservableError::EmptyContainer);
        }
        self.pop_at(len - 1)
    }

    /// Remove and return the value at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ObservableError::IndexOutOfRange`] if `index` is out of
    /// bounds.
    pub fn pop_at(&self, index: usize) -> ObservableResult<T> {
        let value = self.get(index).ok_or_else(|| self.out_of_range(index))?;
        let change = ListChange::Delete { index, value };
        self.apply(&change, |items| {
            if index < items.len() {
                Ok(items.remove(index))
            } else {
                Err(ObservableError::IndexOutOfRange {
                    index,
                    len: items.len(),
                })
            }
        })
    }

    /// Remove the value at `index`.
    pub fn delete(&self, index: usize) -> ObservableResult<()> {
        self.pop_at(index).map(|_| ())
    }

    /// Remove the first value equal to `value`.
    ///
    /// # Errors
    ///
    /// Returns [`ObservableError::ValueNotFound`] if no item equals `value`.
    pub fn remove(&self, value: &T) -> ObservableResult<()> {
        let index = self.index_of(value).ok_or(ObservableError::ValueNotFound)?;
        let change = ListChange::Delete {
            index,
            value: value.clone(),
        };
        self.apply(&change, |items| {
            // Located again: before-observers may have moved things around.
            let position = items
                .iter()
                .position(|item| item == value)
                .ok_or(ObservableError::ValueNotFound)?;
            items.remove(position);
            Ok(())
        })
    }

    /// Remove all values. Fires a single `Clear` change.
    pub fn clear(&self) -> ObservableResult<()> {
        self.apply(&ListChange::Clear, |items| {
            items.clear();
            Ok(())
        })
    }

    /// Append every value of `values`. Fires a single `Extend` change
    /// carrying the whole batch, even when the batch is empty.
    pub fn extend(&self, values: impl IntoIterator<Item = T>) -> ObservableResult<()> {
        let values: Vec<T> = values.into_iter().collect();
        let change = ListChange::Extend {
            index: self.len(),
            values: values.clone(),
        };
        self.apply(&change, |items| {
            items.extend(values);
            Ok(())
        })
    }

    /// Reverse the order in place.
    pub fn reverse(&self) -> ObservableResult<()> {
        self.apply(&ListChange::Reverse, |items| {
            items.reverse();
            Ok(())
        })
    }

    /// Sort in natural order. The change carries no key.
    pub fn sort(&self, reverse: bool) -> ObservableResult<()>
    where
        T: Ord,
    {
        self.sort_with(None, reverse, |a, b| a.cmp(b))
    }

    /// Sort with a comparator. The change carries `key`.
    pub fn sort_by(&self, key: SortKey<T>, reverse: bool) -> ObservableResult<()> {
        let compare = key.clone();
        self.sort_with(Some(key), reverse, move |a, b| compare.compare(a, b))
    }

    /// Sort by a derived key.
    pub fn sort_by_key<K, F>(&self, key: F, reverse: bool) -> ObservableResult<()>
    where
        K: Ord,
        F: Fn(&T) -> K + 'static,
    {
        self.sort_by(SortKey::by_key(key), reverse)
    }

    // Stable in both directions: equal items keep their relative order.
    // The comparator runs on a copy with no borrow held, so it may read the
    // list it is sorting.
    fn sort_with(
        &self,
        key: Option<SortKey<T>>,
        reverse: bool,
        compare: impl Fn(&T, &T) -> Ordering,
    ) -> ObservableResult<()> {
        let change = ListChange::Sort { key, reverse };
        self.inner.observable.dispatch_before(self, &change)?;
        let mut sorted = self.to_vec();
        sorted.sort_by(|a, b| {
            let ordering = compare(a, b);
            if reverse { ordering.reverse() } else { ordering }
        });
        *self.inner.items.borrow_mut() = sorted;
        self.inner.observable.dispatch_after(self, &change)
    }

    fn out_of_range(&self, index: usize) -> ObservableError {
        ObservableError::IndexOutOfRange {
            index,
            len: self.len(),
        }
    }

    fn apply<R>(
        &self,
        change: &ListChange<T>,
        mutate: impl FnOnce(&mut Vec<T>) -> ObservableResult<R>,
    ) -> ObservableResult<R> {
        self.inner.observable.dispatch_before(self, change)?;
        let result = mutate(&mut self.inner.items.borrow_mut())?;
        self.inner.observable.dispatch_after(self, change)?;
        Ok(result)
    }
}

impl<T: 'static> ObservableList<T> {
    /// Check whether two handles refer to the same list.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: 'static> Observed for ObservableList<T> {
    type Change = ListChange<T>;

    fn observable(&self) -> &Observable<Self, Self::Change> {
        &self.inner.observable
    }
}

impl<T: 'static> Clone for ObservableList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + PartialEq + 'static> FromIterator<T> for ObservableList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::with_config(iter, ObservableConfig::default())
    }
}

impl<T: Clone + PartialEq + 'static> From<Vec<T>> for ObservableList<T> {
    fn from(items: Vec<T>) -> Self {
        Self::with_config(items, ObservableConfig::default())
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableList")
            .field("id", &self.inner.observable.id())
            .field("items", &*self.inner.items.borrow())
            .finish()
    }
}

impl<T: fmt::Debug + 'static> fmt::Display for ObservableList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObservableList({:?})", self.inner.items.borrow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, thiserror::Error)]
    #[error("blocked")]
    struct Blocked;

    type Log<T> = Rc<RefCell<Vec<(&'static str, ListChange<T>)>>>;

    fn record<T: Clone + PartialEq + 'static>(list: &ObservableList<T>) -> Log<T> {
        let log: Log<T> = Rc::new(RefCell::new(Vec::new()));
        let before = Rc::clone(&log);
        list.observe_before(move |_, change| {
            before.borrow_mut().push(("before", change.clone()));
            Ok(())
        });
        let after = Rc::clone(&log);
        list.observe_after(move |_, change| {
            after.borrow_mut().push(("after", change.clone()));
            Ok(())
        });
        log
    }

    fn after_changes<T: Clone>(log: &Log<T>) -> Vec<ListChange<T>> {
        log.borrow()
            .iter()
            .filter(|(phase, _)| *phase == "after")
            .map(|(_, change)| change.clone())
            .collect()
    }

    #[test]
    fn test_append_reports_previous_length() {
        let list = ObservableList::new();
        let log = record(&list);

        list.append("a").unwrap();
        assert_eq!(
            *log.borrow(),
            vec![
                ("before", ListChange::Append { index: 0, value: "a" }),
                ("after", ListChange::Append { index: 0, value: "a" }),
            ]
        );
        assert_eq!(list.to_vec(), vec!["a"]);
    }

    #[test]
    fn test_extend_is_one_change() {
        let list = ObservableList::from(vec!["a"]);
        let log = record(&list);

        list.extend(["b", "c"]).unwrap();
        assert_eq!(
            after_changes(&log),
            vec![ListChange::Extend {
                index: 1,
                values: vec!["b", "c"]
            }]
        );
        assert_eq!(log.borrow().len(), 2);
        assert_eq!(list.to_vec(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_extend_with_nothing_still_notifies() {
        let list: ObservableList<i32> = ObservableList::new();
        let log = record(&list);

        list.extend(Vec::new()).unwrap();
        assert_eq!(
            after_changes(&log),
            vec![ListChange::Extend {
                index: 0,
                values: vec![]
            }]
        );
    }

    #[test]
    fn test_insert_displaced_value() {
        let list = ObservableList::from(vec![1, 2, 3]);
        let log = record(&list);

        list.insert(1, 9).unwrap();
        list.insert(4, 7).unwrap();
        list.insert(100, 8).unwrap();

        assert_eq!(
            after_changes(&log),
            vec![
                ListChange::Insert {
                    index: 1,
                    displaced: Some(2),
                    value: 9
                },
                ListChange::Insert {
                    index: 4,
                    displaced: None,
                    value: 7
                },
                ListChange::Insert {
                    index: 100,
                    displaced: None,
                    value: 8
                },
            ]
        );
        assert_eq!(list.to_vec(), vec![1, 9, 2, 3, 7, 8]);
    }

    #[test]
    fn test_set_modifies() {
        let list = ObservableList::from(vec!["a", "b"]);
        let log = record(&list);

        list.set(1, "foobar").unwrap();
        assert_eq!(
            after_changes(&log),
            vec![ListChange::Modify {
                index: 1,
                old_value: "b",
                new_value: "foobar"
            }]
        );
        assert_eq!(list.get(1), Some("foobar"));
    }

    #[test]
    fn test_set_equal_value_is_silent() {
        let list = ObservableList::from(vec![1, 2]);
        let log = record(&list);

        list.set(0, 1).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_set_out_of_range() {
        let list = ObservableList::from(vec![1]);
        let log = record(&list);

        let err = list.set(3, 5).unwrap_err();
        assert!(matches!(
            err,
            ObservableError::IndexOutOfRange { index: 3, len: 1 }
        ));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_delete_family() {
        let list = ObservableList::from(vec!["a", "b", "c", "d", "b"]);
        let log = record(&list);

        assert_eq!(list.pop().unwrap(), "b");
        assert_eq!(list.pop_at(0).unwrap(), "a");
        list.remove(&"c").unwrap();
        list.delete(0).unwrap();

        assert_eq!(
            after_changes(&log),
            vec![
                ListChange::Delete { index: 4, value: "b" },
                ListChange::Delete { index: 0, value: "a" },
                ListChange::Delete { index: 1, value: "c" },
                ListChange::Delete { index: 0, value: "b" },
            ]
        );
        assert_eq!(list.to_vec(), vec!["d"]);
    }

    #[test]
    fn test_remove_first_match_only() {
        let list = ObservableList::from(vec![1, 2, 1]);
        list.remove(&1).unwrap();
        assert_eq!(list.to_vec(), vec![2, 1]);
    }

    #[test]
    fn test_lookup_failures_dispatch_nothing() {
        let list: ObservableList<i32> = ObservableList::new();
        let log = record(&list);

        assert!(matches!(list.pop(), Err(ObservableError::EmptyContainer)));
        assert!(matches!(
            list.pop_at(2),
            Err(ObservableError::IndexOutOfRange { index: 2, len: 0 })
        ));
        assert!(matches!(list.remove(&4), Err(ObservableError::ValueNotFound)));
        assert!(list.delete(0).is_err());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_clear_is_one_change() {
        let list = ObservableList::from(vec![1, 2, 3, 4]);
        let log = record(&list);

        list.clear().unwrap();
        assert_eq!(after_changes(&log), vec![ListChange::Clear]);
        assert!(list.is_empty());

        // Clearing an empty list still notifies.
        list.clear().unwrap();
        assert_eq!(after_changes(&log).len(), 2);
    }

    #[test]
    fn test_reverse() {
        let list = ObservableList::from(vec![1, 2, 3]);
        let log = record(&list);

        list.reverse().unwrap();
        assert_eq!(after_changes(&log), vec![ListChange::Reverse]);
        assert_eq!(list.to_vec(), vec![3, 2, 1]);
    }

    #[test]
    fn test_sort_natural_order() {
        let list = ObservableList::from(vec![3, 1, 2]);
        let log = record(&list);

        list.sort(false).unwrap();
        assert_eq!(list.to_vec(), vec![1, 2, 3]);
        list.sort(true).unwrap();
        assert_eq!(list.to_vec(), vec![3, 2, 1]);

        assert_eq!(
            after_changes(&log),
            vec![
                ListChange::Sort {
                    key: None,
                    reverse: false
                },
                ListChange::Sort {
                    key: None,
                    reverse: true
                },
            ]
        );
    }

    #[test]
    fn test_sort_reports_key() {
        let list = ObservableList::from(vec!["bb", "a", "ccc"]);
        let log = record(&list);
        let key = SortKey::by_key(|value: &&str| value.len());

        list.sort_by(key.clone(), false).unwrap();
        assert_eq!(list.to_vec(), vec!["a", "bb", "ccc"]);

        let changes = after_changes(&log);
        assert_eq!(changes.len(), 1);
        match &changes[0] {
            ListChange::Sort {
                key: Some(reported),
                reverse,
            } => {
                assert!(reported.ptr_eq(&key));
                assert!(!reverse);
            }
            other => panic!("unexpected change: {:?}", other),
        }
        assert_eq!(changes[0].index(), None);
    }

    #[test]
    fn test_sort_reverse_is_stable() {
        let list = ObservableList::from(vec![(1, 'a'), (2, 'b'), (1, 'c'), (2, 'd')]);
        list.sort_by_key(|pair: &(i32, char)| pair.0, true).unwrap();
        assert_eq!(list.to_vec(), vec![(2, 'b'), (2, 'd'), (1, 'a'), (1, 'c')]);
    }

    #[test]
    fn test_sort_comparator_may_read_list() {
        let list = ObservableList::from(vec![3, 1, 2]);
        let log = record(&list);
        let seen = Rc::new(Cell::new(0));

        let inner = list.clone();
        let lens = Rc::clone(&seen);
        let key = SortKey::new(move |a: &i32, b: &i32| {
            lens.set(inner.len());
            assert!(inner.contains(a) && inner.contains(b));
            a.cmp(b)
        });
        list.sort_by(key, false).unwrap();

        assert_eq!(list.to_vec(), vec![1, 2, 3]);
        assert_eq!(seen.get(), 3);
        assert_eq!(after_changes(&log).len(), 1);
    }

    #[test]
    fn test_change_accessors() {
        let change = ListChange::Insert {
            index: 2,
            displaced: Some(5),
            value: 6,
        };
        assert_eq!(change.operation(), ListOperation::Insert);
        assert_eq!(change.index(), Some(2));
        assert_eq!(change.old_value(), Some(&5));
        assert_eq!(change.new_value(), Some(&6));

        let change: ListChange<i32> = ListChange::Clear;
        assert_eq!(change.operation().to_string(), "clear");
        assert_eq!(change.index(), None);
        assert_eq!(change.old_value(), None);
    }

    #[test]
    fn test_observer_sees_source_state() {
        let list = ObservableList::from(vec![1]);
        let lengths = Rc::new(RefCell::new(Vec::new()));

        let before = Rc::clone(&lengths);
        list.observe_before(move |source: &ObservableList<i32>, _| {
            before.borrow_mut().push(source.len());
            Ok(())
        });
        let after = Rc::clone(&lengths);
        list.observe_after(move |source: &ObservableList<i32>, _| {
            after.borrow_mut().push(source.len());
            Ok(())
        });

        list.append(2).unwrap();
        assert_eq!(*lengths.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_before_failure_blocks_mutation() {
        let list = ObservableList::from(vec![1]);
        list.observe_before(|_, _| Err(Box::new(Blocked)));

        assert!(list.append(2).is_err());
        assert_eq!(list.to_vec(), vec![1]);
    }

    #[test]
    fn test_after_failure_keeps_mutation() {
        let list = ObservableList::from(vec![1]);
        list.observe_after(|_, _| Err(Box::new(Blocked)));

        let err = list.append(2).unwrap_err();
        assert_eq!(err.to_string(), "blocked");
        assert_eq!(list.to_vec(), vec![1, 2]);
    }

    #[test]
    fn test_observer_may_mutate_source() {
        let list = ObservableList::from(vec![0]);
        list.observe_after(|source: &ObservableList<i32>, change| {
            if let ListChange::Append { value, .. } = change {
                if *value < 3 {
                    source.append(value + 1)?;
                }
            }
            Ok(())
        });

        list.append(1).unwrap();
        assert_eq!(list.to_vec(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_display() {
        let list = ObservableList::from(vec![1, 2]);
        assert_eq!(list.to_string(), "ObservableList([1, 2])");
    }
}
