// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Graph execution over memory-mapped artifacts.
//!
//! [`GraphExecutor`] opens a `.sng` artifact once via mmap, validates
//! the embedded manifest, and then interprets the graph node by node for
//! each [`execute`](GraphExecutor::execute) call. Weight *data* is read
//! from the mapped payload on demand — the file is never copied wholesale
//! into memory.

use crate::{ExecutionMetrics, RuntimeError};
use model_ir::{Graph, NodeDef, OpKind, Validated};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tensor_core::{ops, DType, Device, Shape, Tensor};

/// The result of a single artifact execution.
#[derive(Debug)]
pub struct ExecutionOutput {
    /// The tensor bound to the graph's declared output name.
    pub output: Tensor,
    /// Per-node and overall timing.
    pub metrics: ExecutionMetrics,
}

/// An independent execution session over one portable artifact.
pub struct GraphExecutor {
    path: PathBuf,
    graph: Graph<Validated>,
    mmap: memmap2::Mmap,
    device: Device,
}

impl GraphExecutor {
    /// Opens and validates an artifact for execution on `device`.
    pub fn open(path: &Path, device: Device) -> Result<Self, RuntimeError> {
        let file = std::fs::File::open(path).map_err(|e| RuntimeError::OpenError {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;
        let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|e| RuntimeError::OpenError {
            path: path.display().to_string(),
            detail: format!("mmap failed: {e}"),
        })?;

        let graph = model_ir::artifact::read_manifest(&mmap)?;
        tracing::info!("opened artifact '{}': {}", path.display(), graph.summary());

        Ok(Self {
            path: path.to_path_buf(),
            graph,
            mmap,
            device,
        })
    }

    /// Returns the validated graph.
    pub fn graph(&self) -> &Graph<Validated> {
        &self.graph
    }

    /// Returns the artifact path this session was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the device this session executes on.
    pub fn device(&self) -> Device {
        self.device
    }

    /// Returns the input shape contract for the given batch size.
    ///
    /// The batch axis is the artifact's only dynamic axis; channels,
    /// height, and width are fixed at export time.
    pub fn input_shape(&self, batch: usize) -> Shape {
        let m = self.graph.manifest();
        Shape::nchw(batch, m.channels, m.height, m.width)
    }

    /// Executes the graph on `input`.
    ///
    /// `input` must match the manifest contract in channels, height, and
    /// width; any batch size is accepted.
    pub fn execute(&self, input: &Tensor) -> Result<ExecutionOutput, RuntimeError> {
        let run_start = Instant::now();
        let manifest = self.graph.manifest();

        let shape = input.shape();
        let expected = self.input_shape(if shape.is_nchw() { shape.batch() } else { 1 });
        if input.dtype() != DType::F32 || shape != &expected {
            return Err(RuntimeError::InputMismatch {
                expected,
                actual: shape.clone(),
            });
        }

        let payload = safetensors::SafeTensors::deserialize(&self.mmap).map_err(|e| {
            RuntimeError::WeightLoadError {
                name: "<payload>".into(),
                detail: format!("SafeTensors parse error: {e:?}"),
            }
        })?;

        let mut metrics = ExecutionMetrics::new();
        let mut values: HashMap<&str, Tensor> = HashMap::new();
        values.insert(manifest.input_name.as_str(), input.clone());

        for node in self.graph.nodes() {
            let node_start = Instant::now();
            let output = self.execute_node(node, &values, &payload)?;
            tracing::debug!(
                "node '{}' ({}) -> {}",
                node.name,
                node.op,
                output.shape(),
            );
            values.insert(node.output.as_str(), output);
            metrics.record_node(node.name.clone(), node.op.as_str(), node_start.elapsed());
        }

        // Graph validation guarantees the final node produced the output.
        let output = values
            .remove(manifest.output_name.as_str())
            .expect("validated graph must produce its declared output");

        metrics.finalise(run_start.elapsed());
        Ok(ExecutionOutput { output, metrics })
    }

    // ── Private helpers ────────────────────────────────────────

    fn execute_node(
        &self,
        node: &NodeDef,
        values: &HashMap<&str, Tensor>,
        payload: &safetensors::SafeTensors<'_>,
    ) -> Result<Tensor, RuntimeError> {
        // Inputs are guaranteed present by graph validation.
        let value = |i: usize| -> &Tensor {
            values
                .get(node.inputs[i].as_str())
                .expect("validated graph inputs must be defined")
        };
        let weight = |i: usize| self.load_weight(&node.weights[i], payload);
        let exec_err = |source| RuntimeError::ExecutionError {
            node: node.name.clone(),
            source,
        };

        let result = match &node.op {
            OpKind::Conv2d { stride, padding } => {
                let w = weight(0)?;
                let b = weight(1)?;
                ops::conv2d(&value(0).view(), &w.view(), Some(&b.view()), *stride, *padding)
            }
            OpKind::ConvTranspose2d { stride } => {
                let w = weight(0)?;
                let b = weight(1)?;
                ops::conv_transpose2d(&value(0).view(), &w.view(), Some(&b.view()), *stride)
            }
            OpKind::BatchNorm { epsilon } => {
                let gamma = weight(0)?;
                let beta = weight(1)?;
                let mean = weight(2)?;
                let var = weight(3)?;
                ops::batch_norm(
                    &value(0).view(),
                    &gamma.view(),
                    &beta.view(),
                    &mean.view(),
                    &var.view(),
                    *epsilon,
                )
            }
            OpKind::Relu => ops::relu(&value(0).view()),
            OpKind::Sigmoid => ops::sigmoid(&value(0).view()),
            OpKind::MaxPool2d { kernel, stride } => {
                ops::max_pool2d(&value(0).view(), *kernel, *stride)
            }
            OpKind::Concat => ops::concat_channels(&value(0).view(), &value(1).view()),
        };

        result.map_err(exec_err)
    }

    /// Extracts one weight tensor from the mapped payload.
    fn load_weight(
        &self,
        name: &str,
        payload: &safetensors::SafeTensors<'_>,
    ) -> Result<Tensor, RuntimeError> {
        let view = payload.tensor(name).map_err(|e| RuntimeError::WeightLoadError {
            name: name.to_string(),
            detail: format!("tensor not found: {e:?}"),
        })?;
        if view.dtype() != safetensors::Dtype::F32 {
            return Err(RuntimeError::WeightLoadError {
                name: name.to_string(),
                detail: format!("unsupported payload dtype {:?}", view.dtype()),
            });
        }
        Tensor::from_bytes(
            Shape::new(view.shape().to_vec()),
            DType::F32,
            view.data().to_vec(),
        )
        .map_err(|e| RuntimeError::WeightLoadError {
            name: name.to_string(),
            detail: format!("shape mismatch: {e}"),
        })
    }
}

impl std::fmt::Debug for GraphExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphExecutor")
            .field("path", &self.path)
            .field("graph", &self.graph.manifest().name)
            .field("nodes", &self.graph.num_nodes())
            .field("device", &self.device)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_ir::{artifact, GraphManifest, WeightsMap, INPUT_NAME, OUTPUT_NAME};

    /// A one-conv + sigmoid graph scaling the input by 2 then squashing.
    fn write_tiny_artifact(dir: &Path) -> PathBuf {
        let manifest = GraphManifest {
            name: "tiny".into(),
            format_version: artifact::FORMAT_VERSION,
            input_name: INPUT_NAME.into(),
            output_name: OUTPUT_NAME.into(),
            channels: 1,
            height: 2,
            width: 2,
            dynamic_axes: vec![0],
            nodes: vec![
                model_ir::NodeDef {
                    name: "scale".into(),
                    op: OpKind::Conv2d { stride: 1, padding: 0 },
                    inputs: vec![INPUT_NAME.into()],
                    output: "scale".into(),
                    weights: vec!["scale.weight".into(), "scale.bias".into()],
                },
                model_ir::NodeDef {
                    name: "act".into(),
                    op: OpKind::Sigmoid,
                    inputs: vec!["scale".into()],
                    output: OUTPUT_NAME.into(),
                    weights: vec![],
                },
            ],
        };
        let graph = Graph::new(manifest).validate().unwrap();

        let mut weights = WeightsMap::new();
        weights.insert(
            "scale.weight".into(),
            Tensor::from_f32(Shape::new(vec![1, 1, 1, 1]), &[2.0]).unwrap(),
        );
        weights.insert(
            "scale.bias".into(),
            Tensor::from_f32(Shape::vector(1), &[0.0]).unwrap(),
        );

        let path = dir.join("tiny.sng");
        artifact::write(&path, &graph, &weights).unwrap();
        path
    }

    #[test]
    fn test_open_and_execute() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_tiny_artifact(dir.path());

        let session = GraphExecutor::open(&path, Device::Cpu).unwrap();
        assert_eq!(session.input_shape(1), Shape::nchw(1, 1, 2, 2));

        let input = Tensor::from_f32(Shape::nchw(1, 1, 2, 2), &[0.0; 4]).unwrap();
        let run = session.execute(&input).unwrap();

        assert_eq!(run.output.shape(), &Shape::nchw(1, 1, 2, 2));
        // sigmoid(0 * 2) = 0.5 everywhere.
        assert!(run.output.as_f32_slice().iter().all(|&x| (x - 0.5).abs() < 1e-6));
        assert_eq!(run.metrics.node_metrics.len(), 2);
    }

    #[test]
    fn test_dynamic_batch_axis() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_tiny_artifact(dir.path());
        let session = GraphExecutor::open(&path, Device::Cpu).unwrap();

        let input = Tensor::zeros(Shape::nchw(3, 1, 2, 2), DType::F32);
        let run = session.execute(&input).unwrap();
        assert_eq!(run.output.shape(), &Shape::nchw(3, 1, 2, 2));
    }

    #[test]
    fn test_fixed_spatial_axes_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_tiny_artifact(dir.path());
        let session = GraphExecutor::open(&path, Device::Cpu).unwrap();

        let input = Tensor::zeros(Shape::nchw(1, 1, 4, 4), DType::F32);
        assert!(matches!(
            session.execute(&input),
            Err(RuntimeError::InputMismatch { .. })
        ));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.sng");
        assert!(matches!(
            GraphExecutor::open(&missing, Device::Cpu),
            Err(RuntimeError::OpenError { .. })
        ));
    }

    #[test]
    fn test_open_rejects_corrupt_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.sng");
        std::fs::write(&path, b"definitely not safetensors").unwrap();
        assert!(GraphExecutor::open(&path, Device::Cpu).is_err());
    }
}
