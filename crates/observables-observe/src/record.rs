//! Serializable change records.
//!
//! Every container reports changes with its own typed record. [`ToRecord`]
//! flattens any of them into a [`ChangeRecord`] with JSON payloads, so
//! changes from different containers can be stored, logged and reported
//! side by side.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use observables_collections::{DictChange, ListChange, ObjectChange};
use observables_core::{ObservableId, Phase};
use observables_value::ValueChange;

/// Kind of container a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    /// An `ObservableValue`.
    Value,
    /// An `ObservableList`.
    List,
    /// An `ObservableDict`.
    Dict,
    /// An `ObservableObject`.
    Object,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKind::Value => write!(f, "value"),
            ContainerKind::List => write!(f, "list"),
            ContainerKind::Dict => write!(f, "dict"),
            ContainerKind::Object => write!(f, "object"),
        }
    }
}

/// Conversion of a typed change into record fields.
pub trait ToRecord {
    /// Container the change belongs to.
    fn container(&self) -> ContainerKind;

    /// Operation name.
    fn operation(&self) -> &'static str;

    /// Index, key or attribute name the change applies to.
    fn locator(&self) -> Option<Value> {
        None
    }

    /// Value before the change.
    fn old_value(&self) -> Option<Value> {
        None
    }

    /// Value after the change.
    fn new_value(&self) -> Option<Value> {
        None
    }

    /// Operation-specific extras.
    fn details(&self) -> Option<Value> {
        None
    }
}

/// A change flattened to JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Position in the recording, assigned by the recorder.
    pub sequence: u64,
    /// Dispatch phase the change was observed in.
    pub phase: Phase,
    /// ID of the container that changed.
    pub source: ObservableId,
    /// Configured label of that container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Kind of container.
    pub container: ContainerKind,
    /// Operation name, e.g. `insert` or `modify`.
    pub operation: String,
    /// Index, key or attribute name the change applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<Value>,
    /// Value before the change.
    #[serde(default)]
    pub old_value: Option<Value>,
    /// Value after the change.
    #[serde(default)]
    pub new_value: Option<Value>,
    /// Operation-specific extras, such as sort options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ChangeRecord {
    /// Build an unsequenced record from a typed change.
    pub fn new(
        phase: Phase,
        source: ObservableId,
        label: Option<String>,
        change: &impl ToRecord,
    ) -> Self {
        Self {
            sequence: 0,
            phase,
            source,
            label,
            container: change.container(),
            operation: change.operation().to_string(),
            locator: change.locator(),
            old_value: change.old_value(),
            new_value: change.new_value(),
            details: change.details(),
        }
    }

    /// Name of the source: its label, or its ID.
    pub fn source_name(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| self.source.to_string())
    }
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} {}",
            self.sequence, self.phase, self.container
        )?;
        if let Some(label) = &self.label {
            write!(f, " '{}'", label)?;
        }
        write!(f, " {}", self.operation)?;
        if let Some(locator) = &self.locator {
            write!(f, " [{}]", locator)?;
        }
        if self.old_value.is_some() || self.new_value.is_some() {
            write!(
                f,
                ": {} -> {}",
                render(&self.old_value),
                render(&self.new_value)
            )?;
        }
        if let Some(details) = &self.details {
            write!(f, " {}", details)?;
        }
        Ok(())
    }
}

/// Render an optional payload, `-` standing for "no value".
pub fn render(value: &Option<Value>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "-".to_string(),
    }
}

/// Convert a payload to JSON. Payloads JSON cannot represent become a
/// descriptive string rather than failing the observer.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value)
        .unwrap_or_else(|err| Value::String(format!("<unserializable: {}>", err)))
}

impl<T: Serialize> ToRecord for ValueChange<T> {
    fn container(&self) -> ContainerKind {
        ContainerKind::Value
    }

    fn operation(&self) -> &'static str {
        "set"
    }

    fn old_value(&self) -> Option<Value> {
        Some(to_json(&self.old_value))
    }

    fn new_value(&self) -> Option<Value> {
        Some(to_json(&self.new_value))
    }
}

impl<T: Serialize> ToRecord for ListChange<T> {
    fn container(&self) -> ContainerKind {
        ContainerKind::List
    }

    fn operation(&self) -> &'static str {
        ListChange::operation(self).as_str()
    }

    fn locator(&self) -> Option<Value> {
        self.index().map(Value::from)
    }

    fn old_value(&self) -> Option<Value> {
        ListChange::old_value(self).map(to_json)
    }

    fn new_value(&self) -> Option<Value> {
        match self {
            ListChange::Extend { values, .. } => Some(to_json(values)),
            _ => ListChange::new_value(self).map(to_json),
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            ListChange::Sort { key, reverse } => Some(json!({
                "keyed": key.is_some(),
                "reverse": reverse,
            })),
            _ => None,
        }
    }
}

impl<K: Serialize, V: Serialize> ToRecord for DictChange<K, V> {
    fn container(&self) -> ContainerKind {
        ContainerKind::Dict
    }

    fn operation(&self) -> &'static str {
        self.operation.as_str()
    }

    fn locator(&self) -> Option<Value> {
        self.key.as_ref().map(to_json)
    }

    fn old_value(&self) -> Option<Value> {
        self.old_value.as_ref().map(to_json)
    }

    fn new_value(&self) -> Option<Value> {
        self.new_value.as_ref().map(to_json)
    }
}

impl<V: Serialize> ToRecord for ObjectChange<V> {
    fn container(&self) -> ContainerKind {
        ContainerKind::Object
    }

    fn operation(&self) -> &'static str {
        self.operation.as_str()
    }

    fn locator(&self) -> Option<Value> {
        Some(Value::String(self.name.clone()))
    }

    fn old_value(&self) -> Option<Value> {
        self.old_value.as_ref().map(to_json)
    }

    fn new_value(&self) -> Option<Value> {
        self.new_value.as_ref().map(to_json)
    }
}
