//! CLI presentation: text and json formatters for merge reports and store listings.

use crate::cluster::{MergeReport, Provenance};
use crate::error::{MergeError, StorageError};
use crate::store::{DatasetKind, Store};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use std::path::Path;

fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Human-readable merge report: one table row per output.
pub fn format_merge_report_text(report: &MergeReport, dry_run: bool) -> String {
    let mut out = String::new();
    let title = if dry_run { "Merge plan (dry run)" } else { "Merge results" };
    out.push_str(&format!("{}\n\n", format_section_heading(title)));

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Output", "Files", "Inputs"]);
    for output in &report.outputs {
        table.add_row(vec![
            file_name(&output.path),
            output.filecount.to_string(),
            output.inputfiles.join(", "),
        ]);
    }
    out.push_str(&format!("{}\n\n", table));
    out.push_str(&format!(
        "Total: {} inputs into {} outputs ({} merges, {} passes).",
        report.total_inputs,
        report.outputs.len(),
        report.merges,
        report.passes
    ));
    out
}

pub fn format_merge_report_json(report: &MergeReport) -> Result<String, MergeError> {
    serde_json::to_string_pretty(report).map_err(|e| {
        MergeError::Storage(StorageError::Encode {
            path: "<report>".into(),
            reason: e.to_string(),
        })
    })
}

/// Scalar-aggregate datasets of a store, with provenance when present.
pub fn format_show_text(path: &Path, store: &Store) -> Result<String, MergeError> {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading(&file_name(path))));

    if let Some(provenance) = Provenance::read(store)? {
        out.push_str(&format!(
            "Merged output of {} files: {}\n\n",
            provenance.filecount,
            provenance.inputfiles.join(", ")
        ));
    }

    let scalars: Vec<_> = store
        .datasets()
        .into_iter()
        .filter(|(_, dataset)| dataset.kind() == Some(DatasetKind::ScalarAggregate))
        .collect();
    if scalars.is_empty() {
        out.push_str("No summary datasets.");
        return Ok(out);
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Dataset", "Type", "Value"]);
    for (dataset_path, dataset) in scalars {
        let value = dataset
            .scalar_value()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![dataset_path, dataset.dtype().to_string(), value]);
    }
    out.push_str(&table.to_string());
    Ok(out)
}
