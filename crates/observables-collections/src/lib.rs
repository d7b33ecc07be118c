//! Observables Collections
//!
//! Observable counterparts of the standard containers:
//!
//! - [`ObservableList`]: a `Vec` reporting [`ListChange`]s
//! - [`ObservableDict`]: an insertion-ordered map reporting [`DictChange`]s
//! - [`ObservableObject`]: named attributes reporting [`ObjectChange`]s
//!
//! Every container is a shared handle over its storage and its
//! [`Observable`](observables_core::Observable). Mutations dispatch the
//! change to the before-observers, apply it, then dispatch it to the
//! after-observers. A failing before-observer leaves the container
//! untouched.
//!
//! # Usage
//!
//! ```
//! use observables_collections::ObservableList;
//! use observables_core::Observed;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let todo: ObservableList<&str> = ObservableList::new();
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let log = Rc::clone(&seen);
//! todo.observe_after(move |_, change| {
//!     log.borrow_mut().push(change.operation());
//!     Ok(())
//! });
//!
//! todo.append("write docs").unwrap();
//! todo.clear().unwrap();
//! assert_eq!(seen.borrow().len(), 2);
//! ```

pub mod dict;
pub mod list;
pub mod object;

pub use dict::{DictChange, DictObserver, DictOperation, ObservableDict};
pub use list::{ListChange, ListObserver, ListOperation, ObservableList, SortKey};
pub use object::{ObjectChange, ObjectObserver, ObjectOperation, ObservableObject};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::dict::{DictChange, DictOperation, ObservableDict};
    pub use crate::list::{ListChange, ListOperation, ObservableList, SortKey};
    pub use crate::object::{ObjectChange, ObjectOperation, ObservableObject};
}
