//! Observable attribute bag.
//!
//! [`ObservableObject`] stores named attributes and reports their creation,
//! modification and deletion. Attribute values default to
//! [`serde_json::Value`] so one object can hold heterogeneous data.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use observables_core::{Observable, ObservableConfig, ObservableError, ObservableResult, Observed, Observer};

/// Operation tag of an [`ObjectChange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectOperation {
    /// A new attribute was set.
    Create,
    /// An existing attribute was replaced.
    Modify,
    /// An attribute was removed.
    Delete,
}

impl ObjectOperation {
    /// Get the operation name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectOperation::Create => "create",
            ObjectOperation::Modify => "modify",
            ObjectOperation::Delete => "delete",
        }
    }
}

impl fmt::Display for ObjectOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Change record for an [`ObservableObject`].
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectChange<V> {
    /// Operation tag.
    pub operation: ObjectOperation,
    /// Attribute name.
    pub name: String,
    /// `None` for `Create`.
    pub old_value: Option<V>,
    /// `None` for `Delete`.
    pub new_value: Option<V>,
}

/// Observer handle for an [`ObservableObject`].
pub type ObjectObserver<V = serde_json::Value> = Observer<ObservableObject<V>, ObjectChange<V>>;

struct ObjectInner<V: 'static> {
    attributes: RefCell<IndexMap<String, V>>,
    observable: Observable<ObservableObject<V>, ObjectChange<V>>,
}

/// An object whose attribute assignments and deletions are observable.
///
/// ```
/// use observables_collections::ObservableObject;
/// use serde_json::json;
///
/// let item = ObservableObject::new();
/// item.set_attr("text", json!("Buy milk")).unwrap();
/// item.set_attr("done", json!(false)).unwrap();
/// assert_eq!(item.get_attr("done"), Some(json!(false)));
/// ```
pub struct ObservableObject<V: 'static = serde_json::Value> {
    inner: Rc<ObjectInner<V>>,
}

impl<V: Clone + PartialEq + 'static> ObservableObject<V> {
    /// Create an object without attributes.
    pub fn new() -> Self {
        Self::with_config(ObservableConfig::default())
    }

    /// Create an object with the given configuration.
    pub fn with_config(config: ObservableConfig) -> Self {
        Self {
            inner: Rc::new(ObjectInner {
                attributes: RefCell::new(IndexMap::new()),
                observable: Observable::new(config),
            }),
        }
    }

    /// Get a clone of an attribute.
    pub fn get_attr(&self, name: &str) -> Option<V> {
        self.inner.attributes.borrow().get(name).cloned()
    }

    /// Check if an attribute is set.
    pub fn has_attr(&self, name: &str) -> bool {
        self.inner.attributes.borrow().contains_key(name)
    }

    /// Attribute names in assignment order.
    pub fn attribute_names(&self) -> Vec<String> {
        self.inner.attributes.borrow().keys().cloned().collect()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.inner.attributes.borrow().len()
    }

    /// Check if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.inner.attributes.borrow().is_empty()
    }

    /// Access the attributes by reference.
    ///
    /// The closure must not mutate this object.
    pub fn with<R>(&self, f: impl FnOnce(&IndexMap<String, V>) -> R) -> R {
        f(&self.inner.attributes.borrow())
    }

    /// Assign an attribute.
    ///
    /// Assigning a value equal to the current one fires nothing.
    pub fn set_attr(&self, name: impl Into<String>, value: V) -> ObservableResult<()> {
        let name = name.into();
        let change = match self.get_attr(&name) {
            Some(old_value) if old_value == value => return Ok(()),
            Some(old_value) => ObjectChange {
                operation: ObjectOperation::Modify,
                name: name.clone(),
                old_value: Some(old_value),
                new_value: Some(value.clone()),
            },
            None => ObjectChange {
                operation: ObjectOperation::Create,
                name: name.clone(),
                old_value: None,
                new_value: Some(value.clone()),
            },
        };

        self.apply(&change, |attributes| {
            attributes.insert(name, value);
            Ok(())
        })
    }

    /// Delete an attribute.
    ///
    /// # Errors
    ///
    /// Returns [`ObservableError::AttributeNotFound`] if the attribute is not
    /// set.
    pub fn del_attr(&self, name: &str) -> ObservableResult<()> {
        let not_found = || ObservableError::AttributeNotFound {
            name: name.to_string(),
        };
        let old_value = self.get_attr(name).ok_or_else(not_found)?;

        let change = ObjectChange {
            operation: ObjectOperation::Delete,
            name: name.to_string(),
            old_value: Some(old_value),
            new_value: None,
        };
        self.apply(&change, |attributes| {
            attributes.shift_remove(name).map(|_| ()).ok_or_else(not_found)
        })
    }

    fn apply(
        &self,
        change: &ObjectChange<V>,
        mutate: impl FnOnce(&mut IndexMap<String, V>) -> ObservableResult<()>,
    ) -> ObservableResult<()> {
        self.inner.observable.dispatch_before(self, change)?;
        mutate(&mut self.inner.attributes.borrow_mut())?;
        self.inner.observable.dispatch_after(self, change)
    }
}

impl<V: 'static> ObservableObject<V> {
    /// Check whether two handles refer to the same object.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<V: 'static> Observed for ObservableObject<V> {
    type Change = ObjectChange<V>;

    fn observable(&self) -> &Observable<Self, Self::Change> {
        &self.inner.observable
    }
}

impl<V: 'static> Clone for ObservableObject<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V: Clone + PartialEq + 'static> Default for ObservableObject<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug + 'static> fmt::Debug for ObservableObject<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableObject")
            .field("id", &self.inner.observable.id())
            .field("attributes", &*self.inner.attributes.borrow())
            .finish()
    }
}

impl<V: fmt::Debug + 'static> fmt::Display for ObservableObject<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObservableObject({:?})", self.inner.attributes.borrow())
    }
}
