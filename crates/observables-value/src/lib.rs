//! Observables Value
//!
//! This crate provides [`ObservableValue`], a single observable slot, and
//! the binding mechanism that keeps two values synchronised.
//!
//! # Binding
//!
//! ```
//! use observables_value::ObservableValue;
//!
//! let celsius = ObservableValue::new(20);
//! let display = ObservableValue::new(0);
//!
//! // `display` follows `celsius` from now on.
//! display.bind_to(&celsius).unwrap();
//! assert_eq!(display.get(), 20);
//!
//! celsius.set(25).unwrap();
//! assert_eq!(display.get(), 25);
//!
//! display.unbind_from(&celsius).unwrap();
//! celsius.set(30).unwrap();
//! assert_eq!(display.get(), 25);
//! ```
//!
//! [`ObservableValue::bind`] links two values in both directions.

mod binding;
pub mod value;

pub use value::{ObservableValue, ValueChange, ValueObserver};
