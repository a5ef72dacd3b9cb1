// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The machine-readable export report.
//!
//! One report per orchestrator run: a timestamp, the per-artifact record
//! list, and summary statistics, persisted as JSON next to the
//! artifacts. Records are append-only — the pipeline never reads them
//! back; they exist for downstream humans and tooling.

use crate::verifier::VerifyOutcome;
use crate::DeployError;
use std::path::{Path, PathBuf};

/// Name of the report file inside the output directory.
pub const REPORT_FILENAME: &str = "export_report.json";

/// One successfully exported checkpoint.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExportRecord {
    /// Model name derived from the checkpoint filename.
    pub model_name: String,
    /// Source checkpoint path.
    pub checkpoint_path: PathBuf,
    /// Derived artifact path.
    pub artifact_path: PathBuf,
    /// Artifact size in bytes.
    pub file_size_bytes: u64,
    /// Artifact size in megabytes.
    pub file_size_mb: f64,
    /// Export resolution `[height, width]`.
    pub input_size: (usize, usize),
    /// Verification outcome category.
    pub test_status: VerifyOutcome,
    /// `true` only when verification ran and passed.
    pub test_success: bool,
    /// RFC 3339 export timestamp.
    pub export_time: String,
}

/// Aggregate statistics over a report's records.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ReportSummary {
    /// Sum of artifact sizes in megabytes.
    pub total_size_mb: f64,
    /// Count of records whose verification passed.
    pub successful_tests: usize,
    /// Export resolution used for the run.
    pub input_size: (usize, usize),
}

/// The complete report for one orchestrator run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExportReport {
    /// RFC 3339 timestamp of report creation.
    pub export_timestamp: String,
    /// Number of artifacts produced.
    pub total_models_exported: usize,
    /// Per-artifact records in processing order.
    pub models: Vec<ExportRecord>,
    /// Aggregate statistics.
    pub summary: ReportSummary,
}

impl ExportReport {
    /// Builds a report over `records` for a run at `input_size`.
    ///
    /// An empty batch still yields a well-formed report with zero
    /// counts — a run that produced nothing is a reportable outcome,
    /// not a crash.
    pub fn new(records: Vec<ExportRecord>, input_size: (usize, usize)) -> Self {
        let total_size_mb = records.iter().map(|r| r.file_size_mb).sum();
        let successful_tests = records.iter().filter(|r| r.test_success).count();
        Self {
            export_timestamp: chrono::Utc::now().to_rfc3339(),
            total_models_exported: records.len(),
            summary: ReportSummary {
                total_size_mb,
                successful_tests,
                input_size,
            },
            models: records,
        }
    }

    /// Persists the report as pretty-printed JSON.
    pub fn write(&self, path: &Path) -> Result<(), DeployError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!("export report saved: {}", path.display());
        Ok(())
    }

    /// Reads a report back from disk.
    pub fn from_file(path: &Path) -> Result<Self, DeployError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Returns a human-readable summary block for CLI output.
    pub fn summary_table(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        if self.models.is_empty() {
            out.push_str("  No artifacts were produced.\n");
            return out;
        }

        let _ = writeln!(
            out,
            "  {:<28} {:>10} {:>9}",
            "Model", "Size MB", "Test",
        );
        let _ = writeln!(out, "  {}", "-".repeat(50));
        for record in &self.models {
            let _ = writeln!(
                out,
                "  {:<28} {:>10.2} {:>9}",
                record.model_name,
                record.file_size_mb,
                record.test_status.as_str(),
            );
        }
        let _ = writeln!(out, "  {}", "-".repeat(50));
        let _ = writeln!(
            out,
            "  {} artifact(s), {:.2} MB total, {} verification(s) passed",
            self.total_models_exported,
            self.summary.total_size_mb,
            self.summary.successful_tests,
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, mb: f64, status: VerifyOutcome) -> ExportRecord {
        ExportRecord {
            model_name: name.into(),
            checkpoint_path: PathBuf::from(format!("/snap/{name}.ckpt")),
            artifact_path: PathBuf::from(format!("/out/{name}.sng")),
            file_size_bytes: (mb * 1024.0 * 1024.0) as u64,
            file_size_mb: mb,
            input_size: (256, 256),
            test_status: status,
            test_success: status.is_success(),
            export_time: "2025-06-01T12:00:00+00:00".into(),
        }
    }

    #[test]
    fn test_summary_statistics() {
        let report = ExportReport::new(
            vec![
                record("a", 1.5, VerifyOutcome::Passed),
                record("b", 2.0, VerifyOutcome::Failed),
                record("c", 0.5, VerifyOutcome::Skipped),
            ],
            (256, 256),
        );
        assert_eq!(report.total_models_exported, 3);
        assert_eq!(report.summary.successful_tests, 1);
        assert!((report.summary.total_size_mb - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_report_is_well_formed() {
        let report = ExportReport::new(vec![], (512, 512));
        assert_eq!(report.total_models_exported, 0);
        assert_eq!(report.summary.successful_tests, 0);
        assert_eq!(report.summary.total_size_mb, 0.0);
        assert!(report.summary_table().contains("No artifacts"));
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(REPORT_FILENAME);

        let report = ExportReport::new(vec![record("m", 1.0, VerifyOutcome::Passed)], (128, 128));
        report.write(&path).unwrap();

        let back = ExportReport::from_file(&path).unwrap();
        assert_eq!(back.total_models_exported, 1);
        assert_eq!(back.models[0].model_name, "m");
        assert_eq!(back.models[0].test_status, VerifyOutcome::Passed);
        assert!(back.models[0].test_success);
        assert_eq!(back.summary.input_size, (128, 128));
    }

    #[test]
    fn test_summary_table_lists_models() {
        let report = ExportReport::new(
            vec![
                record("unet_epoch_40", 3.2, VerifyOutcome::Passed),
                record("unet_epoch_80", 3.2, VerifyOutcome::Skipped),
            ],
            (256, 256),
        );
        let table = report.summary_table();
        assert!(table.contains("unet_epoch_40"));
        assert!(table.contains("passed"));
        assert!(table.contains("skipped"));
        assert!(table.contains("2 artifact(s)"));
    }
}
