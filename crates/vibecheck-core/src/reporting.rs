use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::EvaluationResult;

pub const RESULTS_SCHEMA_VERSION: &str = "1.0";

const HEADERS: [&str; 5] = ["Model", "Total Checks", "Matches", "Mismatches", "Accuracy"];

/// Canonical eval results artifact written next to the summary table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalResultsArtifact {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub source_file: String,
    pub source_digest: String,
    pub limit: usize,
    pub results: Vec<EvaluationResult>,
}

impl EvalResultsArtifact {
    pub fn new(
        source_file: impl Into<String>,
        source_digest: impl Into<String>,
        limit: usize,
        results: Vec<EvaluationResult>,
    ) -> Self {
        Self {
            schema_version: RESULTS_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            source_file: source_file.into(),
            source_digest: source_digest.into(),
            limit,
            results,
        }
    }
}

/// Write the results artifact in pretty JSON format.
pub fn write_eval_results_json(path: &Path, artifact: &EvalResultsArtifact) -> Result<()> {
    let content = serde_json::to_string_pretty(artifact).context("serialize eval artifact")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Accuracy as a percentage with two decimals, e.g. `66.67%`.
pub fn format_accuracy(accuracy: f64) -> String {
    format!("{:.2}%", accuracy * 100.0)
}

/// Render the per-model summary as a grid table, one row per model in run order.
///
/// Text columns are left-aligned, count columns right-aligned.
pub fn render_summary_table(results: &[EvaluationResult]) -> String {
    let rows: Vec<[String; 5]> = results
        .iter()
        .map(|r| {
            [
                r.model.clone(),
                r.total_checks.to_string(),
                r.matches.to_string(),
                r.mismatches.to_string(),
                format_accuracy(r.accuracy),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push_str(&rule(&widths, '-'));
    out.push_str(&line(&HEADERS.map(String::from), &widths));
    out.push_str(&rule(&widths, '='));
    for row in &rows {
        out.push_str(&line(row, &widths));
        out.push_str(&rule(&widths, '-'));
    }
    out
}

fn right_aligned(column: usize) -> bool {
    (1..=3).contains(&column)
}

fn rule(widths: &[usize; 5], fill: char) -> String {
    let mut out = String::from("+");
    for width in widths {
        out.extend(std::iter::repeat(fill).take(width + 2));
        out.push('+');
    }
    out.push('\n');
    out
}

fn line(cells: &[String; 5], widths: &[usize; 5]) -> String {
    let mut out = String::from("|");
    for (column, (cell, width)) in cells.iter().zip(widths).enumerate() {
        let padded = if right_aligned(column) {
            format!(" {:>width$} ", cell, width = *width)
        } else {
            format!(" {:<width$} ", cell, width = *width)
        };
        out.push_str(&padded);
        out.push('|');
    }
    out.push('\n');
    out
}
