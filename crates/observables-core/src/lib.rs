//! Observables Core
//!
//! This crate provides the observer machinery shared by every observable
//! container:
//!
//! - [`Observable`]: before/after observer lists with ordered dispatch
//! - [`Observer`]: reference-counted callback handle with identity semantics
//! - [`Observed`]: the trait containers implement to expose registration
//! - [`ObservableConfig`]: per-container configuration
//! - [`ObservableError`]: the error type used across the workspace
//!
//! # Example
//!
//! ```
//! use observables_core::{Observable, Observer};
//!
//! let registry: Observable<(), u32> = Observable::default();
//! registry.add_after_observer(Observer::from_fn(|_, change: &u32| {
//!     println!("changed: {change}");
//! }));
//! registry.dispatch_after(&(), &7).unwrap();
//! ```
//!
//! # Threading
//!
//! Observables use reference counting and interior mutability without
//! locks. They are neither `Send` nor `Sync`; one logical thread of control
//! per container is a precondition.

pub mod config;
pub mod error;
pub mod observable;

// Re-export main types at crate root
pub use config::ObservableConfig;
pub use error::{ObservableError, ObservableResult, ObserverError, ObserverResult};
pub use observable::{Observable, ObservableId, Observed, Observer, Phase};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::ObservableConfig;
    pub use crate::error::{ObservableError, ObservableResult, ObserverResult};
    pub use crate::observable::{Observed, Observer, Phase};
}
