//! Demo command - Run a built-in scenario.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde_json::json;
use tracing::Level;

use observables::prelude::*;

use crate::OutputFormat;
use crate::commands::{attach_recorder, print_reports};

/// Built-in scenarios.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Append, extend, insert, modify, delete, sort, reverse and clear a list
    List,
    /// Create, modify, pop and clear dictionary keys
    Dict,
    /// Create, modify and delete object attributes
    Object,
    /// Set and bind scalar values
    Value,
    /// Every scenario in turn
    All,
}

/// Arguments for the demo command.
#[derive(Args)]
pub struct DemoArgs {
    /// Scenario to run
    #[arg(value_enum, default_value = "all")]
    pub scenario: Scenario,

    /// Also record before-phase changes
    #[arg(long)]
    pub before: bool,
}

/// Execute the demo command.
pub fn execute(args: DemoArgs, format: OutputFormat, quiet: bool) -> Result<()> {
    let scenarios = match args.scenario {
        Scenario::All => vec![
            Scenario::List,
            Scenario::Dict,
            Scenario::Object,
            Scenario::Value,
        ],
        single => vec![single],
    };

    let mut reports = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        if !quiet {
            tracing::info!(scenario = ?scenario, "Running demo");
        }
        let report = run(scenario, args.before)
            .with_context(|| format!("Demo '{:?}' failed", scenario))?;
        reports.push(report);
    }

    print_reports(&reports, format)
}

/// Run one scenario and report what it changed.
pub fn run(scenario: Scenario, before: bool) -> ObservableResult<ChangeReport> {
    let recorder = Recorder::new();
    let logger = LoggingObserver::new().with_level(Level::INFO);

    let title = match scenario {
        Scenario::List => {
            let list = ObservableList::with_config(Vec::new(), ObservableConfig::named("todo"));
            attach_recorder(&recorder, &list, before);
            logger.attach(&list);
            list_scenario(&list)?;
            "list"
        }
        Scenario::Dict => {
            let dict = ObservableDict::with_config(Vec::new(), ObservableConfig::named("stock"));
            attach_recorder(&recorder, &dict, before);
            logger.attach(&dict);
            dict_scenario(&dict)?;
            "dict"
        }
        Scenario::Object => {
            let object = ObservableObject::with_config(ObservableConfig::named("item"));
            attach_recorder(&recorder, &object, before);
            logger.attach(&object);
            object_scenario(&object)?;
            "object"
        }
        Scenario::Value => {
            let a = ObservableValue::with_config(1, ObservableConfig::named("a"));
            let b = ObservableValue::with_config(2, ObservableConfig::named("b"));
            for value in [&a, &b] {
                attach_recorder(&recorder, value, before);
                logger.attach(value);
            }
            value_scenario(&a, &b)?;
            "value"
        }
        Scenario::All => return Ok(ChangeReport::new(Vec::new(), 0).with_title("all")),
    };

    let mut report = recorder.report().with_title(title);
    if report.change_count() == 0 {
        report.add_warning("Scenario changed nothing");
    }
    Ok(report)
}

fn list_scenario(list: &ObservableList<&'static str>) -> ObservableResult<()> {
    list.append("a")?;
    list.extend(["b", "c"])?;
    list.insert(1, "x")?;
    list.set(0, "foobar")?;
    // Same value again: no change.
    list.set(0, "foobar")?;
    list.remove(&"x")?;
    list.pop()?;
    list.sort_by_key(|item: &&str| item.len(), false)?;
    list.reverse()?;
    list.clear()
}

fn dict_scenario(dict: &ObservableDict<String, i64>) -> ObservableResult<()> {
    dict.insert("apples".to_string(), 3)?;
    dict.insert("apples".to_string(), 3)?;
    dict.insert("apples".to_string(), 5)?;
    dict.update([("pears".to_string(), 2), ("plums".to_string(), 7)])?;
    dict.set_default("figs".to_string(), 0)?;
    dict.pop(&"pears".to_string(), None)?;
    dict.popitem()?;
    dict.clear()
}

fn object_scenario(object: &ObservableObject) -> ObservableResult<()> {
    object.set_attr("text", json!("a"))?;
    object.set_attr("text", json!("a"))?;
    object.set_attr("text", json!("b"))?;
    object.set_attr("newOne", json!(4))?;
    object.del_attr("newOne")
}

fn value_scenario(a: &ObservableValue<i64>, b: &ObservableValue<i64>) -> ObservableResult<()> {
    ObservableValue::bind(a, b)?;
    a.set(10)?;
    b.set(20)?;
    a.unbind_from(b)?;
    b.set(30)?;
    a.set(40)
}
