//! Observables Observe
//!
//! Tooling for watching observable containers from the outside:
//!
//! - [`ChangeRecord`]: a container-independent, serializable change
//! - [`Recorder`]: collects records from any number of containers
//! - [`LoggingObserver`]: emits one `tracing` event per change
//! - [`ChangeReport`]: per-operation counts and the record list
//!
//! # Recording
//!
//! ```
//! use observables_collections::ObservableDict;
//! use observables_observe::Recorder;
//!
//! let dict: ObservableDict<String, i32> = ObservableDict::new();
//! let recorder = Recorder::new();
//! recorder.attach_after(&dict);
//!
//! dict.insert("x".to_string(), 1).unwrap();
//! dict.insert("x".to_string(), 1).unwrap(); // unchanged
//! dict.insert("x".to_string(), 2).unwrap();
//!
//! let report = recorder.report();
//! assert_eq!(report.counts["dict.create"], 1);
//! assert_eq!(report.counts["dict.modify"], 1);
//! println!("{}", report.to_text());
//! ```

pub mod events;
pub mod record;
pub mod report;

// Re-export main types
pub use events::{Attachment, LoggingObserver, Recorder};
pub use record::{ChangeRecord, ContainerKind, ToRecord};
pub use report::{ChangeReport, Diagnostic, DiagnosticLevel, ReportId};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::events::{LoggingObserver, Recorder};
    pub use crate::record::{ChangeRecord, ToRecord};
    pub use crate::report::ChangeReport;
}
