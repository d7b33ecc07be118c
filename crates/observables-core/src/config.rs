//! Configuration for observable containers.
//!
//! Containers built with `new` use [`ObservableConfig::default`]; every
//! container also has a `with_config` constructor taking one of these.

/// Per-container configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservableConfig {
    /// Name used in log output.
    ///
    /// Defaults to the container's unique ID.
    pub label: Option<String>,

    /// Emit a `trace`-level event for every dispatch.
    ///
    /// Disabled by default.
    pub trace_dispatch: bool,
}

impl ObservableConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration with the given label.
    pub fn named(label: impl Into<String>) -> Self {
        Self::new().with_label(label)
    }

    /// Create a configuration with dispatch tracing enabled.
    pub fn traced() -> Self {
        Self::new().with_trace_dispatch(true)
    }

    /// Set the label used in log output.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Enable or disable dispatch tracing.
    pub fn with_trace_dispatch(mut self, enabled: bool) -> Self {
        self.trace_dispatch = enabled;
        self
    }
}
