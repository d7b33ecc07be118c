//! Observable scalar values.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use observables_core::{
    Observable, ObservableConfig, ObservableId, ObservableResult, Observed, Observer,
};

/// Change record for an [`ObservableValue`].
///
/// Values carry no operation tag or locator: the only mutation is `set`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChange<T> {
    /// Value before the change.
    pub old_value: T,
    /// Value after the change.
    pub new_value: T,
}

/// Observer handle for an [`ObservableValue`].
pub type ValueObserver<T> = Observer<ObservableValue<T>, ValueChange<T>>;

pub(crate) struct ValueInner<T: 'static> {
    value: RefCell<T>,
    observable: Observable<ObservableValue<T>, ValueChange<T>>,
    /// Forwarders this value installed on the values it is bound to.
    pub(crate) bindings: RefCell<HashMap<ObservableId, ValueObserver<T>>>,
}

/// A single observable slot.
///
/// `ObservableValue` is a shared handle: cloning it yields another handle to
/// the same slot, observers and bindings. [`ObservableValue::ptr_eq`] tells
/// handles of the same slot apart from equal-valued but distinct slots.
///
/// # Example
///
/// ```
/// use observables_core::Observed;
/// use observables_value::ObservableValue;
///
/// let temperature = ObservableValue::new(20);
/// temperature.observe_after(|_, change| {
///     println!("{} -> {}", change.old_value, change.new_value);
///     Ok(())
/// });
///
/// temperature.set(21).unwrap(); // notifies
/// temperature.set(21).unwrap(); // unchanged, no notification
/// ```
pub struct ObservableValue<T: 'static> {
    pub(crate) inner: Rc<ValueInner<T>>,
}

impl<T: Clone + PartialEq + 'static> ObservableValue<T> {
    /// Create a value with default configuration.
    pub fn new(value: T) -> Self {
        Self::with_config(value, ObservableConfig::default())
    }

    /// Create a value with the given configuration.
    pub fn with_config(value: T, config: ObservableConfig) -> Self {
        Self {
            inner: Rc::new(ValueInner {
                value: RefCell::new(value),
                observable: Observable::new(config),
                bindings: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Access the current value by reference.
    ///
    /// The closure must not call `set` on this value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value, notifying observers if it changed.
    ///
    /// Setting a value equal to the current one does nothing.
    ///
    /// # Errors
    ///
    /// Returns the first observer failure. A failure in a before-observer
    /// leaves the value unchanged; a failure in an after-observer is
    /// reported after the new value has been stored.
    pub fn set(&self, new_value: T) -> ObservableResult<()> {
        let old_value = {
            let current = self.inner.value.borrow();
            if *current == new_value {
                return Ok(());
            }
            current.clone()
        };

        let change = ValueChange {
            old_value,
            new_value,
        };
        self.inner.observable.dispatch_before(self, &change)?;
        *self.inner.value.borrow_mut() = change.new_value.clone();
        self.inner.observable.dispatch_after(self, &change)
    }
}

impl<T: 'static> ObservableValue<T> {
    /// Check whether two handles refer to the same slot.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn downgrade(&self) -> Weak<ValueInner<T>> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn from_inner(inner: Rc<ValueInner<T>>) -> Self {
        Self { inner }
    }
}

impl<T: 'static> Observed for ObservableValue<T> {
    type Change = ValueChange<T>;

    fn observable(&self) -> &Observable<Self, Self::Change> {
        &self.inner.observable
    }
}

impl<T: 'static> Clone for ObservableValue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for ObservableValue<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for ObservableValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableValue")
            .field("id", &self.inner.observable.id())
            .field("value", &*self.inner.value.borrow())
            .field("bindings", &self.inner.bindings.borrow().len())
            .finish()
    }
}

impl<T: fmt::Debug + 'static> fmt::Display for ObservableValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObservableValue({:?})", self.inner.value.borrow())
    }
}
