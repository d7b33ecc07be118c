//! Value binding.
//!
//! Binding `a` to `b` installs an after-observer on `b` that forwards every
//! new value of `b` into `a.set(..)`. The forwarder holds a weak reference to
//! `a`, so a binding never keeps a dropped value alive; once `a` is gone the
//! forwarder left on `b` does nothing.
//!
//! Two values bound in both directions settle after one hop each way, since
//! `set` ignores a value equal to the current one.

use std::any::Any;

use tracing::debug;

use observables_core::{ObservableError, ObservableId, ObservableResult, Observed, Observer};

use crate::value::{ObservableValue, ValueChange};

impl<T: Clone + PartialEq + 'static> ObservableValue<T> {
    /// Keep this value synchronised with `other`.
    ///
    /// Every later change of `other` is copied into this value, and this
    /// value takes `other`'s current value immediately. Binding again to the
    /// same `other` replaces the earlier forwarder.
    ///
    /// # Errors
    ///
    /// Returns an observer failure raised by the initial synchronisation. The
    /// binding stays in place in that case.
    pub fn bind_to(&self, other: &ObservableValue<T>) -> ObservableResult<()> {
        let previous = self.inner.bindings.borrow_mut().remove(&other.id());
        if let Some(previous) = previous {
            other.remove_after_observer(&previous)?;
        }

        let target = self.downgrade();
        let forwarder = Observer::new(move |_: &ObservableValue<T>, change: &ValueChange<T>| {
            match target.upgrade() {
                Some(inner) => ObservableValue::from_inner(inner)
                    .set(change.new_value.clone())
                    .map_err(ObservableError::into_observer_error),
                None => Ok(()),
            }
        });

        self.inner
            .bindings
            .borrow_mut()
            .insert(other.id(), forwarder.clone());
        other.add_after_observer(forwarder);

        debug!(source = %self.id(), target = %other.id(), "Value bound");

        self.set(other.get())
    }

    /// Bind to a dynamically typed target.
    ///
    /// # Errors
    ///
    /// Returns [`ObservableError::TypeConstraint`] if `other` is not an
    /// `ObservableValue<T>`, otherwise behaves like [`bind_to`](Self::bind_to).
    pub fn bind_to_any(&self, other: &dyn Any) -> ObservableResult<()> {
        let other = other.downcast_ref::<ObservableValue<T>>().ok_or(
            ObservableError::TypeConstraint {
                expected: std::any::type_name::<ObservableValue<T>>(),
            },
        )?;
        self.bind_to(other)
    }

    /// Stop following `other`.
    ///
    /// Only this direction is removed; if `other` is bound to this value it
    /// keeps following it.
    ///
    /// # Errors
    ///
    /// Returns [`ObservableError::BindingNotFound`] if this value is not bound
    /// to `other`.
    pub fn unbind_from(&self, other: &ObservableValue<T>) -> ObservableResult<()> {
        let forwarder = self
            .inner
            .bindings
            .borrow_mut()
            .remove(&other.id())
            .ok_or(ObservableError::BindingNotFound { target: other.id() })?;
        other.remove_after_observer(&forwarder)?;

        debug!(source = %self.id(), target = %other.id(), "Value unbound");
        Ok(())
    }

    /// Check whether this value follows `other`.
    pub fn is_bound_to(&self, other: &ObservableValue<T>) -> bool {
        self.inner.bindings.borrow().contains_key(&other.id())
    }

    /// IDs of the values this value follows.
    pub fn bound_ids(&self) -> Vec<ObservableId> {
        self.inner.bindings.borrow().keys().copied().collect()
    }

    /// Bind two values to each other.
    ///
    /// `a` first binds to `b` and takes `b`'s value, then `b` binds to `a`.
    /// Afterwards both hold the value `b` had when this was called.
    ///
    /// The order matters to observers: `a` sees one change to `b`'s value,
    /// and `b` sees none because `a` already holds it when `b` binds.
    /// Binding `b` to `a` first would leave both at `a`'s value instead.
    ///
    /// ```
    /// use observables_value::ObservableValue;
    ///
    /// let a = ObservableValue::new(1);
    /// let b = ObservableValue::new(2);
    /// ObservableValue::bind(&a, &b).unwrap();
    /// assert_eq!((a.get(), b.get()), (2, 2));
    ///
    /// a.set(3).unwrap();
    /// assert_eq!(b.get(), 3);
    /// ```
    pub fn bind(a: &ObservableValue<T>, b: &ObservableValue<T>) -> ObservableResult<()> {
        a.bind_to(b)?;
        b.bind_to(a)
    }

    /// Remove both directions of a binding: `a` from `b`, then `b` from `a`.
    pub fn unbind(a: &ObservableValue<T>, b: &ObservableValue<T>) -> ObservableResult<()> {
        a.unbind_from(b)?;
        b.unbind_from(a)
    }
}
