//! Observable dictionary.
//!
//! Keys keep insertion order, so `popitem` removes the most recently
//! inserted entry.

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use observables_core::{Observable, ObservableConfig, ObservableError, ObservableResult, Observed, Observer};

/// Operation tag of a [`DictChange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DictOperation {
    /// A new key was added.
    Create,
    /// The value of an existing key was replaced.
    Modify,
    /// A key was removed.
    Delete,
    /// All keys were removed.
    Clear,
}

impl DictOperation {
    /// Get the operation name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DictOperation::Create => "create",
            DictOperation::Modify => "modify",
            DictOperation::Delete => "delete",
            DictOperation::Clear => "clear",
        }
    }
}

impl fmt::Display for DictOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Change record for an [`ObservableDict`].
///
/// `key` is `None` only for `Clear`. `old_value` is `None` for `Create`
/// and `new_value` is `None` for `Delete`.
#[derive(Debug, Clone, PartialEq)]
pub struct DictChange<K, V> {
    /// Operation tag.
    pub operation: DictOperation,
    /// Affected key.
    pub key: Option<K>,
    /// Value before the change.
    pub old_value: Option<V>,
    /// Value after the change.
    pub new_value: Option<V>,
}

impl<K, V> DictChange<K, V> {
    /// A `Create` of `key` with `value`.
    pub fn create(key: K, value: V) -> Self {
        Self {
            operation: DictOperation::Create,
            key: Some(key),
            old_value: None,
            new_value: Some(value),
        }
    }

    /// A `Modify` of `key` from `old_value` to `new_value`.
    pub fn modify(key: K, old_value: V, new_value: V) -> Self {
        Self {
            operation: DictOperation::Modify,
            key: Some(key),
            old_value: Some(old_value),
            new_value: Some(new_value),
        }
    }

    /// A `Delete` of `key`, which held `old_value`.
    pub fn delete(key: K, old_value: V) -> Self {
        Self {
            operation: DictOperation::Delete,
            key: Some(key),
            old_value: Some(old_value),
            new_value: None,
        }
    }

    /// A `Clear` of every key.
    pub fn clear() -> Self {
        Self {
            operation: DictOperation::Clear,
            key: None,
            old_value: None,
            new_value: None,
        }
    }
}

/// Observer handle for an [`ObservableDict`].
pub type DictObserver<K, V> = Observer<ObservableDict<K, V>, DictChange<K, V>>;

struct DictInner<K: 'static, V: 'static> {
    entries: RefCell<IndexMap<K, V>>,
    observable: Observable<ObservableDict<K, V>, DictChange<K, V>>,
}

/// An observable, insertion-ordered map.
///
/// `ObservableDict` is a shared handle; clones see the same entries and
/// observers.
///
/// # Example
///
/// ```
/// use observables_collections::{DictOperation, ObservableDict};
/// use observables_core::Observed;
///
/// let stock: ObservableDict<&str, u32> = ObservableDict::new();
/// stock.observe_after(|_, change| {
///     assert_eq!(change.operation, DictOperation::Create);
///     Ok(())
/// });
/// stock.insert("apples", 3).unwrap();
/// ```
pub struct ObservableDict<K: 'static, V: 'static> {
    inner: Rc<DictInner<K, V>>,
}

impl<K, V> ObservableDict<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + 'static,
    V: Clone + PartialEq + 'static,
{
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::with_config(Vec::new(), ObservableConfig::default())
    }

    /// Create a dictionary holding `entries` with the given configuration.
    pub fn with_config(entries: impl IntoIterator<Item = (K, V)>, config: ObservableConfig) -> Self {
        Self {
            inner: Rc::new(DictInner {
                entries: RefCell::new(entries.into_iter().collect()),
                observable: Observable::new(config),
            }),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    /// Check if the dictionary is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.borrow().is_empty()
    }

    /// Get a clone of the value stored under `key`.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.entries.borrow().get(key).cloned()
    }

    /// Check if `key` is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.entries.borrow().contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<K> {
        self.inner.entries.borrow().keys().cloned().collect()
    }

    /// Values in insertion order.
    pub fn values(&self) -> Vec<V> {
        self.inner.entries.borrow().values().cloned().collect()
    }

    /// Entries in insertion order.
    pub fn items(&self) -> Vec<(K, V)> {
        self.inner
            .entries
            .borrow()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Access the entries by reference.
    ///
    /// The closure must not mutate this dictionary.
    pub fn with<R>(&self, f: impl FnOnce(&IndexMap<K, V>) -> R) -> R {
        f(&self.inner.entries.borrow())
    }

    /// Store `value` under `key`, returning the previous value.
    ///
    /// A new key fires `Create`, a changed value fires `Modify`, and a value
    /// equal to the stored one fires nothing.
    pub fn insert(&self, key: K, value: V) -> ObservableResult<Option<V>> {
        let change = match self.get(&key) {
            Some(old_value) if old_value == value => return Ok(Some(old_value)),
            Some(old_value) => DictChange::modify(key.clone(), old_value, value.clone()),
            None => DictChange::create(key.clone(), value.clone()),
        };
        self.apply(&change, |entries| Ok(entries.insert(key, value)))
    }

    /// Remove `key`, returning its value.
    ///
    /// # Errors
    ///
    /// Returns [`ObservableError::KeyNotFound`] if `key` is absent.
    pub fn remove(&self, key: &K) -> ObservableResult<V> {
        let old_value = self
            .get(key)
            .ok_or_else(|| ObservableError::key_not_found(key))?;
        let change = DictChange::delete(key.clone(), old_value);
        self.apply(&change, |entries| {
            entries
                .shift_remove(key)
                .ok_or_else(|| ObservableError::key_not_found(key))
        })
    }

    /// Remove `key`, returning its value.
    ///
    /// `default` is returned only when a before-observer already removed
    /// the key.
    ///
    /// # Errors
    ///
    /// Returns [`ObservableError::KeyNotFound`] if `key` is absent when
    /// called; nothing is dispatched in that case.
    pub fn pop(&self, key: &K, default: Option<V>) -> ObservableResult<V> {
        let old_value = self
            .get(key)
            .ok_or_else(|| ObservableError::key_not_found(key))?;
        let change = DictChange::delete(key.clone(), old_value);
        self.apply(&change, |entries| {
            entries
                .shift_remove(key)
                .or(default)
                .ok_or_else(|| ObservableError::key_not_found(key))
        })
    }

    /// Remove and return the most recently inserted entry.
    ///
    /// # Errors
    ///
    /// Returns [`ObservableError::EmptyContainer`] if the dictionary is
    /// empty.
    pub fn popitem(&self) -> ObservableResult<(K, V)> {
        let (key, old_value) = self
            .with(|entries| {
                entries
                    .last()
                    .map(|(key, value)| (key.clone(), value.clone()))
            })
            .ok_or(ObservableError::EmptyContainer)?;

        let change = DictChange::delete(key.clone(), old_value.clone());
        self.apply(&change, |entries| {
            entries
                .shift_remove(&key)
                .ok_or_else(|| ObservableError::key_not_found(&key))
        })?;
        Ok((key, old_value))
    }

    /// Insert every entry of `data` in order.
    ///
    /// Each entry is a separate `insert` with its own change.
    pub fn update(&self, data: impl IntoIterator<Item = (K, V)>) -> ObservableResult<()> {
        self.update_with(data, std::iter::empty())
    }

    /// Insert every entry of `data`, then every entry of `extra`.
    ///
    /// An empty `data` skips `extra` entirely.
    pub fn update_with(
        &self,
        data: impl IntoIterator<Item = (K, V)>,
        extra: impl IntoIterator<Item = (K, V)>,
    ) -> ObservableResult<()> {
        let mut data = data.into_iter().peekable();
        if data.peek().is_none() {
            return Ok(());
        }

        for (key, value) in data.chain(extra) {
            self.insert(key, value)?;
        }
        Ok(())
    }

    /// Get the value under `key`, inserting `default` first if absent.
    pub fn set_default(&self, key: K, default: V) -> ObservableResult<V> {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        self.insert(key, default.clone())?;
        Ok(default)
    }

    /// Remove all entries. Fires a single `Clear` change.
    pub fn clear(&self) -> ObservableResult<()> {
        self.apply(&DictChange::clear(), |entries| {
            entries.clear();
            Ok(())
        })
    }

    fn apply<R>(
        &self,
        change: &DictChange<K, V>,
        mutate: impl FnOnce(&mut IndexMap<K, V>) -> ObservableResult<R>,
    ) -> ObservableResult<R> {
        self.inner.observable.dispatch_before(self, change)?;
        let result = mutate(&mut self.inner.entries.borrow_mut())?;
        self.inner.observable.dispatch_after(self, change)?;
        Ok(result)
    }
}

impl<K: 'static, V: 'static> ObservableDict<K, V> {
    /// Check whether two handles refer to the same dictionary.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<K: 'static, V: 'static> Observed for ObservableDict<K, V> {
    type Change = DictChange<K, V>;

    fn observable(&self) -> &Observable<Self, Self::Change> {
        &self.inner.observable
    }
}

impl<K: 'static, V: 'static> Clone for ObservableDict<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<K, V> Default for ObservableDict<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + 'static,
    V: Clone + PartialEq + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for ObservableDict<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + 'static,
    V: Clone + PartialEq + 'static,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::with_config(iter, ObservableConfig::default())
    }
}

impl<K: fmt::Debug + 'static, V: fmt::Debug + 'static> fmt::Debug for ObservableDict<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableDict")
            .field("id", &self.inner.observable.id())
            .field("entries", &*self.inner.entries.borrow())
            .finish()
    }
}

impl<K: fmt::Debug + 'static, V: fmt::Debug + 'static> fmt::Display for ObservableDict<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObservableDict({:?})", self.inner.entries.borrow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Rc<RefCell<Vec<DictChange<&'static str, i32>>>>;

    fn record(dict: &ObservableDict<&'static str, i32>) -> Log {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let inner = Rc::clone(&log);
        dict.observe_after(move |_, change| {
            inner.borrow_mut().push(change.clone());
            Ok(())
        });
        log
    }

    fn dict_of(entries: &[(&'static str, i32)]) -> ObservableDict<&'static str, i32> {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_insert_create_then_modify() {
        let dict = ObservableDict::new();
        let log = record(&dict);

        assert_eq!(dict.insert("a", 1).unwrap(), None);
        assert_eq!(dict.insert("a", 2).unwrap(), Some(1));
        assert_eq!(dict.insert("a", 2).unwrap(), Some(2));

        assert_eq!(
            *log.borrow(),
            vec![DictChange::create("a", 1), DictChange::modify("a", 1, 2)]
        );
    }

    #[test]
    fn test_before_observer_sees_old_entries() {
        let dict = dict_of(&[("a", 1)]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let inner = Rc::clone(&seen);
        dict.observe_before(move |source: &ObservableDict<&'static str, i32>, _| {
            inner.borrow_mut().push(source.get(&"a"));
            Ok(())
        });

        dict.insert("a", 5).unwrap();
        assert_eq!(*seen.borrow(), vec![Some(1)]);
    }

    #[test]
    fn test_remove_and_pop() {
        let dict = dict_of(&[("a", 1), ("b", 2)]);
        let log = record(&dict);

        assert_eq!(dict.remove(&"a").unwrap(), 1);
        assert_eq!(dict.pop(&"b", None).unwrap(), 2);
        assert!(dict.is_empty());

        assert_eq!(
            *log.borrow(),
            vec![DictChange::delete("a", 1), DictChange::delete("b", 2)]
        );
    }

    #[test]
    fn test_missing_key_dispatches_nothing() {
        let dict = dict_of(&[("a", 1)]);
        let log = record(&dict);

        let err = dict.remove(&"zz").unwrap_err();
        assert!(matches!(err, ObservableError::KeyNotFound { ref key } if key == "\"zz\""));
        assert!(dict.pop(&"zz", Some(0)).is_err());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_pop_default_covers_observer_removal() {
        let dict = dict_of(&[("a", 1)]);
        dict.observe_before(|source: &ObservableDict<&'static str, i32>, change| {
            if change.operation == DictOperation::Delete {
                // Bypass notification by going through the raw entries.
                source.inner.entries.borrow_mut().shift_remove(&"a");
            }
            Ok(())
        });

        assert_eq!(dict.pop(&"a", Some(42)).unwrap(), 42);
    }

    #[test]
    fn test_popitem_is_last_inserted() {
        let dict = dict_of(&[("a", 1), ("b", 2)]);
        let log = record(&dict);

        assert_eq!(dict.popitem().unwrap(), ("b", 2));
        assert_eq!(dict.keys(), vec!["a"]);
        assert_eq!(*log.borrow(), vec![DictChange::delete("b", 2)]);

        dict.popitem().unwrap();
        assert!(matches!(dict.popitem(), Err(ObservableError::EmptyContainer)));
    }

    #[test]
    fn test_update_inserts_in_order() {
        let dict = dict_of(&[("a", 1)]);
        let log = record(&dict);

        dict.update_with([("a", 1), ("b", 2)], [("c", 3)]).unwrap();
        assert_eq!(
            *log.borrow(),
            vec![DictChange::create("b", 2), DictChange::create("c", 3)]
        );
        assert_eq!(dict.keys(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_update_empty_skips_extra() {
        let dict = ObservableDict::new();
        let log = record(&dict);

        dict.update_with(Vec::new(), [("c", 3)]).unwrap();
        assert!(log.borrow().is_empty());
        assert!(dict.is_empty());

        dict.update([("d", 4)]).unwrap();
        assert_eq!(dict.items(), vec![("d", 4)]);
    }

    #[test]
    fn test_set_default() {
        let dict = dict_of(&[("a", 1)]);
        let log = record(&dict);

        assert_eq!(dict.set_default("a", 9).unwrap(), 1);
        assert!(log.borrow().is_empty());

        assert_eq!(dict.set_default("b", 9).unwrap(), 9);
        assert_eq!(*log.borrow(), vec![DictChange::create("b", 9)]);
    }

    #[test]
    fn test_clear() {
        let dict = dict_of(&[("a", 1), ("b", 2)]);
        let log = record(&dict);

        dict.clear().unwrap();
        assert!(dict.is_empty());
        assert_eq!(*log.borrow(), vec![DictChange::clear()]);
        assert_eq!(log.borrow()[0].key, None);
    }

    #[test]
    fn test_remove_preserves_order() {
        let dict = dict_of(&[("a", 1), ("b", 2), ("c", 3)]);
        dict.remove(&"b").unwrap();
        assert_eq!(dict.values(), vec![1, 3]);
    }

    #[test]
    fn test_display() {
        let dict = dict_of(&[("a", 1)]);
        assert_eq!(dict.to_string(), "ObservableDict({\"a\": 1})");
    }
}
