//! Subcommands.

pub mod demo;
pub mod replay;

use anyhow::Result;

use observables::{ChangeReport, Observed, Recorder, ToRecord};

use crate::OutputFormat;

/// Print reports in the requested format.
///
/// JSON output is a single document: one report as an object, several as
/// an array.
pub fn print_reports(reports: &[ChangeReport], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            for (i, report) in reports.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print!("{}", report.to_text());
            }
        }
        OutputFormat::Json | OutputFormat::JsonCompact => {
            let json = match reports {
                [report] => report.to_json(),
                _ => serde_json::Value::Array(reports.iter().map(ChangeReport::to_json).collect()),
            };
            let text = if matches!(format, OutputFormat::JsonCompact) {
                serde_json::to_string(&json)?
            } else {
                serde_json::to_string_pretty(&json)?
            };
            println!("{}", text);
        }
    }
    Ok(())
}

/// Record changes of `target`, including the before phase if asked to.
pub fn attach_recorder<O>(recorder: &Recorder, target: &O, before: bool)
where
    O: Observed,
    O::Change: ToRecord,
{
    if before {
        recorder.attach(target);
    } else {
        recorder.attach_after(target);
    }
}
