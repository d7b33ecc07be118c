//! Observer registration and dispatch.
//!
//! An [`Observable`] keeps two ordered lists of [`Observer`] handles, one
//! invoked before a mutation takes effect and one invoked after. Containers
//! embed an `Observable` and expose it through the [`Observed`] trait, which
//! forwards registration calls to the embedded instance.
//!
//! # Dispatch
//!
//! Dispatch is synchronous and runs observers in registration order. The
//! observer list is snapshotted when dispatch starts, so callbacks may add or
//! remove observers (or mutate the container) without disturbing the running
//! iteration; such changes take effect from the next dispatch on.
//!
//! The first observer that returns an error stops dispatch. The remaining
//! observers in that list are not called and the error is returned to the
//! caller of the mutating operation. For the "after" list this means the
//! mutation has already been applied when the caller sees the failure.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::config::ObservableConfig;
use crate::error::{ObservableError, ObservableResult, ObserverResult};

/// Unique identifier for an observable container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObservableId(Uuid);

impl ObservableId {
    /// Create a new random observable ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObservableId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObservableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of a mutation an observer list belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Before the mutation is applied.
    Before,
    /// After the mutation is applied.
    After,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Before => write!(f, "before"),
            Phase::After => write!(f, "after"),
        }
    }
}

type Callback<S, E> = dyn Fn(&S, &E) -> ObserverResult;

/// A registered callback.
///
/// `Observer` is a reference-counted handle: clones refer to the same
/// callback and compare equal, which is how [`Observable::remove_before_observer`]
/// and [`Observable::remove_after_observer`] find the entry to remove.
/// Handles wrapping distinct closures never compare equal, even if the
/// closures have identical bodies.
///
/// The callback receives the source container and the change record.
pub struct Observer<S, E> {
    callback: Rc<Callback<S, E>>,
}

impl<S, E> Observer<S, E> {
    /// Wrap a fallible callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&S, &E) -> ObserverResult + 'static,
    {
        Self {
            callback: Rc::new(callback),
        }
    }

    /// Wrap a callback that never fails.
    pub fn from_fn<F>(callback: F) -> Self
    where
        F: Fn(&S, &E) + 'static,
    {
        Self::new(move |source, event| {
            callback(source, event);
            Ok(())
        })
    }

    /// Invoke the callback.
    pub fn notify(&self, source: &S, event: &E) -> ObserverResult {
        (self.callback)(source, event)
    }

    /// Check whether two handles refer to the same callback.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.callback), Rc::as_ptr(&other.callback))
    }
}

impl<S, E> Clone for Observer<S, E> {
    fn clone(&self) -> Self {
        Self {
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<S, E> PartialEq for Observer<S, E> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<S, E> Eq for Observer<S, E> {}

impl<S, E> fmt::Debug for Observer<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("callback", &Rc::as_ptr(&self.callback).cast::<()>())
            .finish()
    }
}

/// Before/after observer lists for one container.
///
/// `S` is the container type handed to callbacks as the event source and
/// `E` is the container's change record type.
pub struct Observable<S, E> {
    id: ObservableId,
    config: ObservableConfig,
    before: RefCell<Vec<Observer<S, E>>>,
    after: RefCell<Vec<Observer<S, E>>>,
}

impl<S, E> Observable<S, E> {
    /// Create an observable with no observers.
    pub fn new(config: ObservableConfig) -> Self {
        Self {
            id: ObservableId::new(),
            config,
            before: RefCell::new(Vec::new()),
            after: RefCell::new(Vec::new()),
        }
    }

    /// Unique ID of this observable.
    pub fn id(&self) -> ObservableId {
        self.id
    }

    /// Configuration this observable was created with.
    pub fn config(&self) -> &ObservableConfig {
        &self.config
    }

    /// Label used in log output.
    pub fn label(&self) -> String {
        self.config
            .label
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }

    /// Append an observer to the before list.
    pub fn add_before_observer(&self, observer: Observer<S, E>) {
        self.add(Phase::Before, observer);
    }

    /// Append an observer to the after list.
    pub fn add_after_observer(&self, observer: Observer<S, E>) {
        self.add(Phase::After, observer);
    }

    /// Remove the first occurrence of `observer` from the before list.
    ///
    /// # Errors
    ///
    /// Returns [`ObservableError::ObserverNotFound`] if the handle is not
    /// registered.
    pub fn remove_before_observer(&self, observer: &Observer<S, E>) -> ObservableResult<()> {
        self.remove(Phase::Before, observer)
    }

    /// Remove the first occurrence of `observer` from the after list.
    ///
    /// # Errors
    ///
    /// Returns [`ObservableError::ObserverNotFound`] if the handle is not
    /// registered.
    pub fn remove_after_observer(&self, observer: &Observer<S, E>) -> ObservableResult<()> {
        self.remove(Phase::After, observer)
    }

    /// Number of registered before-observers, counting duplicates.
    pub fn before_observer_count(&self) -> usize {
        self.before.borrow().len()
    }

    /// Number of registered after-observers, counting duplicates.
    pub fn after_observer_count(&self) -> usize {
        self.after.borrow().len()
    }

    /// Notify before-observers. Used by container implementations.
    pub fn dispatch_before(&self, source: &S, event: &E) -> ObservableResult<()> {
        self.dispatch(Phase::Before, source, event)
    }

    /// Notify after-observers. Used by container implementations.
    pub fn dispatch_after(&self, source: &S, event: &E) -> ObservableResult<()> {
        self.dispatch(Phase::After, source, event)
    }

    fn list(&self, phase: Phase) -> &RefCell<Vec<Observer<S, E>>> {
        match phase {
            Phase::Before => &self.before,
            Phase::After => &self.after,
        }
    }

    fn add(&self, phase: Phase, observer: Observer<S, E>) {
        let mut observers = self.list(phase).borrow_mut();
        observers.push(observer);
        debug!(
            observable = %self.label(),
            phase = %phase,
            observers = observers.len(),
            "Observer added"
        );
    }

    fn remove(&self, phase: Phase, observer: &Observer<S, E>) -> ObservableResult<()> {
        let mut observers = self.list(phase).borrow_mut();
        let position = observers
            .iter()
            .position(|registered| registered.ptr_eq(observer))
            .ok_or(ObservableError::ObserverNotFound { phase })?;
        observers.remove(position);
        debug!(
            observable = %self.label(),
            phase = %phase,
            observers = observers.len(),
            "Observer removed"
        );
        Ok(())
    }

    fn dispatch(&self, phase: Phase, source: &S, event: &E) -> ObservableResult<()> {
        // Snapshot so callbacks can touch the registry without a live borrow.
        let observers: Vec<Observer<S, E>> = self.list(phase).borrow().clone();

        if self.config.trace_dispatch {
            trace!(
                observable = %self.label(),
                phase = %phase,
                observers = observers.len(),
                "Dispatching change"
            );
        }

        for observer in &observers {
            observer
                .notify(source, event)
                .map_err(ObservableError::Observer)?;
        }
        Ok(())
    }
}

impl<S, E> Default for Observable<S, E> {
    fn default() -> Self {
        Self::new(ObservableConfig::default())
    }
}

impl<S, E> fmt::Debug for Observable<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("id", &self.id)
            .field("label", &self.config.label)
            .field("before_observers", &self.before_observer_count())
            .field("after_observers", &self.after_observer_count())
            .finish()
    }
}

/// Implemented by every observable container.
///
/// The provided methods delegate to the container's embedded
/// [`Observable`], so a container only has to say where that instance lives.
pub trait Observed: Sized + 'static {
    /// Change record passed to observers of this container.
    type Change: 'static;

    /// The embedded observer registry.
    fn observable(&self) -> &Observable<Self, Self::Change>;

    /// Unique ID of this container.
    fn id(&self) -> ObservableId {
        self.observable().id()
    }

    /// Register an observer called before every mutation.
    fn add_before_observer(&self, observer: Observer<Self, Self::Change>) {
        self.observable().add_before_observer(observer);
    }

    /// Register an observer called after every mutation.
    fn add_after_observer(&self, observer: Observer<Self, Self::Change>) {
        self.observable().add_after_observer(observer);
    }

    /// Remove the first registration of `observer` from the before list.
    fn remove_before_observer(&self, observer: &Observer<Self, Self::Change>) -> ObservableResult<()> {
        self.observable().remove_before_observer(observer)
    }

    /// Remove the first registration of `observer` from the after list.
    fn remove_after_observer(&self, observer: &Observer<Self, Self::Change>) -> ObservableResult<()> {
        self.observable().remove_after_observer(observer)
    }

    /// Register a closure as a before-observer and return its handle.
    fn observe_before<F>(&self, callback: F) -> Observer<Self, Self::Change>
    where
        F: Fn(&Self, &Self::Change) -> ObserverResult + 'static,
    {
        let observer = Observer::new(callback);
        self.add_before_observer(observer.clone());
        observer
    }

    /// Register a closure as an after-observer and return its handle.
    fn observe_after<F>(&self, callback: F) -> Observer<Self, Self::Change>
    where
        F: Fn(&Self, &Self::Change) -> ObserverResult + 'static,
    {
        let observer = Observer::new(callback);
        self.add_after_observer(observer.clone());
        observer
    }

    /// Number of registered before-observers.
    fn before_observer_count(&self) -> usize {
        self.observable().before_observer_count()
    }

    /// Number of registered after-observers.
    fn after_observer_count(&self) -> usize {
        self.observable().after_observer_count()
    }
}
