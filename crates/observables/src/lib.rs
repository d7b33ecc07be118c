//! # Observables
//!
//! Drop-in observable counterparts of the everyday containers. Every
//! mutation is reported to observers registered on the container, once
//! before it takes effect and once after.
//!
//! ## Features
//!
//! - **Containers**: [`ObservableValue`], [`ObservableList`],
//!   [`ObservableDict`] and [`ObservableObject`]
//! - **Two phases**: before-observers can veto a change by failing,
//!   after-observers see the applied result
//! - **Binding**: values can follow each other one way or both ways
//! - **Recording**: changes flatten into serializable [`ChangeRecord`]s
//!
//! ## Quick Start
//!
//! ```
//! use observables::prelude::*;
//!
//! let todo = ObservableList::new();
//! let recorder = Recorder::new();
//! recorder.attach_after(&todo);
//!
//! todo.append("Buy milk")?;
//! todo.extend(["Walk dog", "Write report"])?;
//! todo.sort(false)?;
//!
//! let report = recorder.report();
//! assert_eq!(report.change_count(), 3);
//! # Ok::<(), ObservableError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     Your Application                     │
//! ├──────────────────────────────────────────────────────────┤
//! │                   observables (facade)                   │
//! │                                                          │
//! │  ┌───────────────────┬─────────────────────────────────┐ │
//! │  │ observables-value │ observables-collections         │ │
//! │  │ (value, binding)  │ (list, dict, object)            │ │
//! │  ├───────────────────┴─────────────────────────────────┤ │
//! │  │ observables-observe (records, recorder, reports)    │ │
//! │  └─────────────────────────────────────────────────────┘ │
//! ├──────────────────────────────────────────────────────────┤
//! │        observables-core (Observable, Observer, errors)   │
//! └──────────────────────────────────────────────────────────┘
//! ```

// Re-export from sub-crates
pub use observables_collections;
pub use observables_core;
pub use observables_observe;
pub use observables_value;

pub use observables_collections::{
    DictChange, DictObserver, DictOperation, ListChange, ListObserver, ListOperation,
    ObjectChange, ObjectObserver, ObjectOperation, ObservableDict, ObservableList,
    ObservableObject, SortKey,
};
pub use observables_core::{
    Observable, ObservableConfig, ObservableError, ObservableId, ObservableResult, Observed,
    Observer, ObserverError, ObserverResult, Phase,
};
pub use observables_observe::{
    ChangeRecord, ChangeReport, ContainerKind, LoggingObserver, Recorder, ToRecord,
};
pub use observables_value::{ObservableValue, ValueChange, ValueObserver};

/// JSON value type used as the default attribute type of [`ObservableObject`].
pub use serde_json::Value as JsonValue;

/// Prelude module for convenient imports.
pub mod prelude {
    // Containers
    pub use observables_collections::{
        DictChange, DictOperation, ListChange, ListOperation, ObjectChange, ObjectOperation,
        ObservableDict, ObservableList, ObservableObject, SortKey,
    };
    pub use observables_value::{ObservableValue, ValueChange};

    // Core types
    pub use observables_core::{
        ObservableConfig, ObservableError, ObservableResult, Observed, Observer, ObserverResult,
        Phase,
    };

    // Observability types
    pub use observables_observe::{ChangeRecord, ChangeReport, LoggingObserver, Recorder, ToRecord};
}
