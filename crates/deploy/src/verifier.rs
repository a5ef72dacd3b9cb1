// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Artifact cross-checking in the independent runtime.
//!
//! Verification opens the freshly-written artifact in its own execution
//! session, pushes a random batch of the exported shape through it, and
//! checks that an output of the contracted shape comes back. Any
//! failure along the way — unreadable artifact, kernel error, wrong
//! output shape — is a *failed* verification, reported per item and
//! never fatal to the batch.
//!
//! A build without the `verifier` feature has no independent runtime;
//! verification is then *skipped*, a distinct outcome that is never
//! conflated with failure.

use std::path::Path;
use tensor_core::Device;

/// Outcome of one artifact verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyOutcome {
    /// The artifact executed and honored the shape contract.
    Passed,
    /// The artifact failed to load, execute, or match the contract.
    Failed,
    /// Verification did not run (runtime not built in, or disabled).
    Skipped,
}

impl VerifyOutcome {
    /// `true` only for [`VerifyOutcome::Passed`].
    pub fn is_success(self) -> bool {
        matches!(self, VerifyOutcome::Passed)
    }

    /// Label used in logs and the summary table.
    pub fn as_str(self) -> &'static str {
        match self {
            VerifyOutcome::Passed => "passed",
            VerifyOutcome::Failed => "failed",
            VerifyOutcome::Skipped => "skipped",
        }
    }
}

/// The result of verifying one artifact.
#[derive(Debug, Clone)]
pub struct VerifyReport {
    /// Outcome category.
    pub outcome: VerifyOutcome,
    /// Output shape observed during execution, when one was produced.
    pub output_shape: Option<Vec<usize>>,
    /// Failure or skip diagnostic.
    pub detail: Option<String>,
}

impl VerifyReport {
    /// A skipped verification with the given reason.
    pub fn skipped(reason: &str) -> Self {
        Self {
            outcome: VerifyOutcome::Skipped,
            output_shape: None,
            detail: Some(reason.to_string()),
        }
    }
}

/// Verifies the artifact at `artifact_path` against the
/// `(height, width)` resolution it was exported with.
#[cfg(feature = "verifier")]
pub fn verify(artifact_path: &Path, resolution: (usize, usize), device: Device) -> VerifyReport {
    match execute_contract_check(artifact_path, resolution, device) {
        Ok(output_shape) => {
            tracing::info!(
                "verification passed for '{}' (output {:?})",
                artifact_path.display(),
                output_shape,
            );
            VerifyReport {
                outcome: VerifyOutcome::Passed,
                output_shape: Some(output_shape),
                detail: None,
            }
        }
        Err(detail) => {
            tracing::warn!(
                "verification failed for '{}': {detail}",
                artifact_path.display(),
            );
            VerifyReport {
                outcome: VerifyOutcome::Failed,
                output_shape: None,
                detail: Some(detail),
            }
        }
    }
}

/// Without the independent runtime built in, verification cannot run.
#[cfg(not(feature = "verifier"))]
pub fn verify(artifact_path: &Path, _resolution: (usize, usize), _device: Device) -> VerifyReport {
    tracing::warn!(
        "verification runtime not built into this binary; skipping check for '{}'",
        artifact_path.display(),
    );
    VerifyReport::skipped("verification runtime not built into this binary")
}

#[cfg(feature = "verifier")]
fn execute_contract_check(
    artifact_path: &Path,
    (height, width): (usize, usize),
    device: Device,
) -> Result<Vec<usize>, String> {
    use rand::Rng;
    use tensor_core::{Shape, Tensor};

    let session = runtime::GraphExecutor::open(artifact_path, device)
        .map_err(|e| format!("session creation failed: {e}"))?;

    let channels = session.graph().manifest().channels;
    let expected = Shape::nchw(1, channels, height, width);

    let mut rng = rand::thread_rng();
    let values: Vec<f32> = (0..expected.num_elements())
        .map(|_| rng.gen::<f32>())
        .collect();
    let input = Tensor::from_f32(expected.clone(), &values)
        .map_err(|e| format!("synthetic input construction failed: {e}"))?;

    let run = session
        .execute(&input)
        .map_err(|e| format!("execution failed: {e}"))?;
    tracing::debug!("{}", run.metrics.summary());

    if run.output.shape() != &expected {
        return Err(format!(
            "output shape {} does not match contract {expected}",
            run.output.shape(),
        ));
    }

    Ok(run.output.shape().dims().to_vec())
}

#[cfg(all(test, feature = "verifier"))]
mod tests {
    use super::*;
    use model_ir::{artifact, Graph, GraphManifest, NodeDef, OpKind, WeightsMap, INPUT_NAME, OUTPUT_NAME};

    fn write_identityish_artifact(dir: &Path, h: usize, w: usize) -> std::path::PathBuf {
        let manifest = GraphManifest {
            name: "check".into(),
            format_version: artifact::FORMAT_VERSION,
            input_name: INPUT_NAME.into(),
            output_name: OUTPUT_NAME.into(),
            channels: 3,
            height: h,
            width: w,
            dynamic_axes: vec![0],
            nodes: vec![NodeDef {
                name: "act".into(),
                op: OpKind::Sigmoid,
                inputs: vec![INPUT_NAME.into()],
                output: OUTPUT_NAME.into(),
                weights: vec![],
            }],
        };
        let graph = Graph::new(manifest).validate().unwrap();
        let path = dir.join("check.sng");
        artifact::write(&path, &graph, &WeightsMap::new()).unwrap();
        path
    }

    #[test]
    fn test_verify_passes_on_shape_preserving_graph() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_identityish_artifact(dir.path(), 8, 12);

        let report = verify(&path, (8, 12), Device::Cpu);
        assert_eq!(report.outcome, VerifyOutcome::Passed);
        assert_eq!(report.output_shape, Some(vec![1, 3, 8, 12]));
        assert!(report.outcome.is_success());
    }

    #[test]
    fn test_verify_fails_on_resolution_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_identityish_artifact(dir.path(), 8, 8);

        let report = verify(&path, (16, 16), Device::Cpu);
        assert_eq!(report.outcome, VerifyOutcome::Failed);
        assert!(report.detail.unwrap().contains("execution failed"));
    }

    #[test]
    fn test_verify_fails_on_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let report = verify(&dir.path().join("absent.sng"), (8, 8), Device::Cpu);
        assert_eq!(report.outcome, VerifyOutcome::Failed);
    }

    #[test]
    fn test_skipped_is_distinct() {
        let report = VerifyReport::skipped("disabled by flag");
        assert_eq!(report.outcome, VerifyOutcome::Skipped);
        assert!(!report.outcome.is_success());
        assert_ne!(VerifyOutcome::Skipped, VerifyOutcome::Failed);
    }

    #[test]
    fn test_shape_mismatch_graph_fails_contract() {
        // A pooling graph halves the resolution: contract must fail.
        let dir = tempfile::tempdir().unwrap();
        let manifest = GraphManifest {
            name: "pool".into(),
            format_version: artifact::FORMAT_VERSION,
            input_name: INPUT_NAME.into(),
            output_name: OUTPUT_NAME.into(),
            channels: 3,
            height: 8,
            width: 8,
            dynamic_axes: vec![0],
            nodes: vec![NodeDef {
                name: "pool".into(),
                op: OpKind::MaxPool2d { kernel: 2, stride: 2 },
                inputs: vec![INPUT_NAME.into()],
                output: OUTPUT_NAME.into(),
                weights: vec![],
            }],
        };
        let graph = Graph::new(manifest).validate().unwrap();
        let path = dir.path().join("pool.sng");
        artifact::write(&path, &graph, &WeightsMap::new()).unwrap();

        let report = verify(&path, (8, 8), Device::Cpu);
        assert_eq!(report.outcome, VerifyOutcome::Failed);
        assert!(report.detail.unwrap().contains("does not match contract"));
    }
}
