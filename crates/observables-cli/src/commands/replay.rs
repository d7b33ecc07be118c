//! Replay command - Apply a scripted sequence of operations.
//!
//! A script names one container and lists the steps to apply to it:
//!
//! ```toml
//! container = "list"
//! label = "todo"
//! initial = ["a"]
//!
//! [[step]]
//! op = "append"
//! value = "b"
//!
//! [[step]]
//! op = "sort"
//! reverse = true
//! ```
//!
//! Values are JSON-typed. A failing step is reported as an error
//! diagnostic and the remaining steps still run, unless `--fail-fast` is
//! given.

use std::cmp::Ordering;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use serde::Deserialize;
use serde_json::Value;

use observables::prelude::*;

use crate::OutputFormat;
use crate::commands::{attach_recorder, print_reports};

/// Arguments for the replay command.
#[derive(Args)]
pub struct ReplayArgs {
    /// Path to the TOML script
    #[arg(required = true)]
    pub script: PathBuf,

    /// Stop at the first failing step
    #[arg(long)]
    pub fail_fast: bool,

    /// Also record before-phase changes
    #[arg(long)]
    pub before: bool,
}

/// Container a script operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerType {
    /// `ObservableList` of JSON values.
    List,
    /// `ObservableDict` with string keys.
    Dict,
    /// `ObservableObject`.
    Object,
    /// `ObservableValue` holding one JSON value.
    Value,
}

/// A replay script.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Container to create.
    pub container: ContainerType,
    /// Label of the container.
    pub label: Option<String>,
    /// Initial contents: an array for lists, a table for dicts and objects,
    /// any value for values.
    pub initial: Option<Value>,
    /// Emit a trace event per dispatch.
    #[serde(default)]
    pub trace: bool,
    /// Steps in order.
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

/// One operation of a script.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    /// Operation name, e.g. `append` or `set_default`.
    pub op: String,
    /// List position.
    pub index: Option<usize>,
    /// Dict key or attribute name.
    pub key: Option<String>,
    /// Value to write, or the default for `pop`.
    pub value: Option<Value>,
    /// Batch for `extend`.
    pub values: Option<Vec<Value>>,
    /// Descending order for `sort`.
    #[serde(default)]
    pub reverse: bool,
}

impl Step {
    fn index(&self) -> Result<usize> {
        self.index
            .ok_or_else(|| anyhow!("'{}' needs an 'index'", self.op))
    }

    fn key(&self) -> Result<String> {
        self.key
            .clone()
            .ok_or_else(|| anyhow!("'{}' needs a 'key'", self.op))
    }

    fn value(&self) -> Result<Value> {
        self.value
            .clone()
            .ok_or_else(|| anyhow!("'{}' needs a 'value'", self.op))
    }

    fn values(&self) -> Result<Vec<Value>> {
        self.values
            .clone()
            .ok_or_else(|| anyhow!("'{}' needs 'values'", self.op))
    }
}

impl Script {
    /// Parse a script from TOML text.
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid replay script")
    }

    fn config(&self) -> ObservableConfig {
        let config = ObservableConfig::new().with_trace_dispatch(self.trace);
        match &self.label {
            Some(label) => config.with_label(label.clone()),
            None => config,
        }
    }
}

/// Execute the replay command.
pub fn execute(args: ReplayArgs, format: OutputFormat, quiet: bool) -> Result<()> {
    let text = std::fs::read_to_string(&args.script)
        .with_context(|| format!("Failed to read script {}", args.script.display()))?;
    let script = Script::parse(&text)?;

    if !quiet {
        tracing::info!(
            script = %args.script.display(),
            container = ?script.container,
            steps = script.steps.len(),
            "Replaying script"
        );
    }

    let report = replay(&script, args.before, args.fail_fast)?;
    print_reports(std::slice::from_ref(&report), format)?;

    if report.has_errors() {
        bail!("{} step(s) failed", report.error_count());
    }
    Ok(())
}

/// Run a script against a fresh container and report the changes.
pub fn replay(script: &Script, before: bool, fail_fast: bool) -> Result<ChangeReport> {
    let recorder = Recorder::new();
    let config = script.config();

    let results: Vec<Result<()>> = match script.container {
        ContainerType::List => {
            let items = match &script.initial {
                Some(Value::Array(items)) => items.clone(),
                Some(other) => bail!("List initial contents must be an array, got {}", other),
                None => Vec::new(),
            };
            let list = ObservableList::with_config(items, config);
            attach_recorder(&recorder, &list, before);
            run_steps(script, fail_fast, |step| list_step(&list, step))
        }
        ContainerType::Dict => {
            let dict = ObservableDict::with_config(table(&script.initial)?, config);
            attach_recorder(&recorder, &dict, before);
            run_steps(script, fail_fast, |step| dict_step(&dict, step))
        }
        ContainerType::Object => {
            let object = ObservableObject::with_config(config);
            for (name, value) in table(&script.initial)? {
                object.set_attr(name, value)?;
            }
            attach_recorder(&recorder, &object, before);
            run_steps(script, fail_fast, |step| object_step(&object, step))
        }
        ContainerType::Value => {
            let initial = script.initial.clone().unwrap_or(Value::Null);
            let value = ObservableValue::with_config(initial, config);
            attach_recorder(&recorder, &value, before);
            run_steps(script, fail_fast, |step| value_step(&value, step))
        }
    };

    let mut report = recorder.report();
    if let Some(label) = &script.label {
        report = report.with_title(label.clone());
    }
    for (i, result) in results.iter().enumerate() {
        if let Err(e) = result {
            let step = &script.steps[i];
            report.add_error(
                format!("Step {} ({}) failed", i + 1, step.op),
                Some(format!("{:#}", e)),
            );
        }
    }
    if results.len() < script.steps.len() {
        report.add_warning(format!(
            "Stopped after step {} of {}",
            results.len(),
            script.steps.len()
        ));
    }
    Ok(report)
}

fn run_steps(
    script: &Script,
    fail_fast: bool,
    mut apply: impl FnMut(&Step) -> Result<()>,
) -> Vec<Result<()>> {
    let mut results = Vec::with_capacity(script.steps.len());
    for (i, step) in script.steps.iter().enumerate() {
        let result = apply(step);
        if let Err(e) = &result {
            tracing::warn!(step = i + 1, op = %step.op, error = %e, "Step failed");
        }
        let failed = result.is_err();
        results.push(result);
        if failed && fail_fast {
            break;
        }
    }
    results
}

fn table(initial: &Option<Value>) -> Result<Vec<(String, Value)>> {
    match initial {
        Some(Value::Object(entries)) => Ok(entries
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()),
        Some(other) => bail!("Initial contents must be a table, got {}", other),
        None => Ok(Vec::new()),
    }
}

fn list_step(list: &ObservableList<Value>, step: &Step) -> Result<()> {
    match step.op.as_str() {
        "append" => list.append(step.value()?)?,
        "insert" => list.insert(step.index()?, step.value()?)?,
        "set" => list.set(step.index()?, step.value()?)?,
        "pop" => {
            match step.index {
                Some(index) => list.pop_at(index)?,
                None => list.pop()?,
            };
        }
        "remove" => list.remove(&step.value()?)?,
        "delete" => list.delete(step.index()?)?,
        "clear" => list.clear()?,
        "extend" => list.extend(step.values()?)?,
        "reverse" => list.reverse()?,
        "sort" => list.sort_by(SortKey::new(compare_json), step.reverse)?,
        other => bail!("Unknown list operation '{}'", other),
    }
    Ok(())
}

fn dict_step(dict: &ObservableDict<String, Value>, step: &Step) -> Result<()> {
    match step.op.as_str() {
        "insert" | "set" => {
            dict.insert(step.key()?, step.value()?)?;
        }
        "remove" | "delete" => {
            dict.remove(&step.key()?)?;
        }
        "pop" => {
            dict.pop(&step.key()?, step.value.clone())?;
        }
        "popitem" => {
            dict.popitem()?;
        }
        "update" => match step.value()? {
            Value::Object(entries) => dict.update(entries)?,
            other => bail!("'update' needs a table value, got {}", other),
        },
        "set_default" => {
            dict.set_default(step.key()?, step.value()?)?;
        }
        "clear" => dict.clear()?,
        other => bail!("Unknown dict operation '{}'", other),
    }
    Ok(())
}

fn object_step(object: &ObservableObject, step: &Step) -> Result<()> {
    match step.op.as_str() {
        "set" => object.set_attr(step.key()?, step.value()?)?,
        "delete" => object.del_attr(&step.key()?)?,
        other => bail!("Unknown object operation '{}'", other),
    }
    Ok(())
}

fn value_step(value: &ObservableValue<Value>, step: &Step) -> Result<()> {
    match step.op.as_str() {
        "set" => value.set(step.value()?)?,
        other => bail!("Unknown value operation '{}'", other),
    }
    Ok(())
}

/// Order JSON values: null, booleans, numbers, strings, then anything else
/// by its text.
fn compare_json(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or(f64::NAN);
            let b = b.as_f64().unwrap_or(f64::NAN);
            a.total_cmp(&b)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => rank(a)
            .cmp(&rank(b))
            .then_with(|| a.to_string().cmp(&b.to_string())),
    }
}
