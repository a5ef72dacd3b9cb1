// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Single-file artifact container.
//!
//! An exported graph is one `.sng` file: a SafeTensors buffer holding
//! every parameter tensor as `f32`, with the graph manifest JSON and the
//! format tag embedded in the SafeTensors header metadata. Parameter
//! values are embedded in the artifact, never referenced externally, so
//! the file is self-contained and deployable on its own.

use crate::{Graph, GraphError, Validated, WeightsMap};
use std::collections::HashMap;
use std::path::Path;
use tensor_core::DType;

/// Interchange format version this build reads and writes.
pub const FORMAT_VERSION: u32 = 1;

/// File extension of portable artifacts.
pub const ARTIFACT_EXTENSION: &str = "sng";

/// Format identifier stored in the header metadata.
pub const FORMAT_NAME: &str = "seanet-graph";

const META_FORMAT: &str = "format";
const META_VERSION: &str = "format_version";
const META_GRAPH: &str = "graph";

/// Serializes a validated graph and its weights into `path`.
///
/// Every weight tensor referenced by the graph must be present in
/// `weights` as an `f32` tensor. Returns the artifact's byte size.
pub fn write(
    path: &Path,
    graph: &Graph<Validated>,
    weights: &WeightsMap,
) -> Result<u64, GraphError> {
    let manifest = graph.manifest();

    let mut views: Vec<(&str, safetensors::tensor::TensorView<'_>)> = Vec::new();
    for name in manifest.referenced_weights() {
        let tensor = weights
            .get(name)
            .ok_or_else(|| GraphError::WeightNotFound { name: name.to_string() })?;
        if tensor.dtype() != DType::F32 {
            return Err(GraphError::InvalidGraph(format!(
                "weight '{name}' has dtype {}, artifacts embed f32 only",
                tensor.dtype(),
            )));
        }
        let view = safetensors::tensor::TensorView::new(
            safetensors::Dtype::F32,
            tensor.shape().dims().to_vec(),
            tensor.as_bytes(),
        )
        .map_err(|e| GraphError::SafeTensorsError(format!("bad view for '{name}': {e:?}")))?;
        views.push((name, view));
    }

    let mut metadata = HashMap::new();
    metadata.insert(META_FORMAT.to_string(), FORMAT_NAME.to_string());
    metadata.insert(META_VERSION.to_string(), FORMAT_VERSION.to_string());
    metadata.insert(META_GRAPH.to_string(), manifest.to_json()?);

    let bytes = safetensors::serialize(views, &Some(metadata))
        .map_err(|e| GraphError::SafeTensorsError(format!("serialize failed: {e:?}")))?;

    std::fs::write(path, &bytes)?;
    tracing::debug!(
        "wrote artifact '{}' ({} tensors, {} bytes)",
        path.display(),
        manifest.total_weight_count(),
        bytes.len(),
    );

    Ok(bytes.len() as u64)
}

/// Extracts and validates the graph manifest from an artifact buffer.
///
/// Only the SafeTensors header is parsed — tensor data stays untouched,
/// so this is cheap even on memory-mapped multi-megabyte artifacts.
pub fn read_manifest(buffer: &[u8]) -> Result<Graph<Validated>, GraphError> {
    let (_, header) = safetensors::SafeTensors::read_metadata(buffer)
        .map_err(|e| GraphError::SafeTensorsError(format!("header parse error: {e:?}")))?;

    let metadata = header
        .metadata()
        .as_ref()
        .ok_or_else(|| GraphError::InvalidGraph("artifact carries no header metadata".into()))?;

    match metadata.get(META_FORMAT).map(String::as_str) {
        Some(FORMAT_NAME) => {}
        Some(other) => {
            return Err(GraphError::InvalidGraph(format!(
                "not a {FORMAT_NAME} artifact (format tag '{other}')",
            )));
        }
        None => {
            return Err(GraphError::InvalidGraph(format!(
                "not a {FORMAT_NAME} artifact (missing format tag)",
            )));
        }
    }

    let manifest_json = metadata
        .get(META_GRAPH)
        .ok_or_else(|| GraphError::InvalidGraph("artifact carries no graph manifest".into()))?;

    let manifest = crate::GraphManifest::from_json(manifest_json)?;
    Graph::new(manifest).validate()
}

/// Reads and validates the graph manifest from an artifact file.
pub fn read_manifest_from_file(path: &Path) -> Result<Graph<Validated>, GraphError> {
    let buffer = std::fs::read(path)?;
    read_manifest(&buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GraphManifest, NodeDef, OpKind, INPUT_NAME, OUTPUT_NAME};
    use tensor_core::{Shape, Tensor};

    fn tiny_graph() -> Graph<Validated> {
        let manifest = GraphManifest {
            name: "tiny".into(),
            format_version: FORMAT_VERSION,
            input_name: INPUT_NAME.into(),
            output_name: OUTPUT_NAME.into(),
            channels: 1,
            height: 4,
            width: 4,
            dynamic_axes: vec![0],
            nodes: vec![NodeDef {
                name: "head".into(),
                op: OpKind::Conv2d { stride: 1, padding: 0 },
                inputs: vec![INPUT_NAME.into()],
                output: OUTPUT_NAME.into(),
                weights: vec!["head.weight".into(), "head.bias".into()],
            }],
        };
        Graph::new(manifest).validate().unwrap()
    }

    fn tiny_weights() -> WeightsMap {
        let mut weights = WeightsMap::new();
        weights.insert(
            "head.weight".into(),
            Tensor::from_f32(Shape::new(vec![1, 1, 1, 1]), &[2.0]).unwrap(),
        );
        weights.insert(
            "head.bias".into(),
            Tensor::from_f32(Shape::vector(1), &[0.5]).unwrap(),
        );
        weights
    }

    #[test]
    fn test_write_and_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.sng");

        let size = write(&path, &tiny_graph(), &tiny_weights()).unwrap();
        assert!(size > 0);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), size);

        let graph = read_manifest_from_file(&path).unwrap();
        assert_eq!(graph.manifest().name, "tiny");
        assert_eq!(graph.num_nodes(), 1);
        assert_eq!(graph.manifest().dynamic_axes, vec![0]);
    }

    #[test]
    fn test_write_missing_weight() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.sng");
        let mut weights = tiny_weights();
        weights.remove("head.bias");

        assert!(matches!(
            write(&path, &tiny_graph(), &weights),
            Err(GraphError::WeightNotFound { .. })
        ));
    }

    #[test]
    fn test_read_rejects_foreign_safetensors() {
        // A SafeTensors file without our format tag is not an artifact.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foreign.sng");

        let tensor = Tensor::from_f32(Shape::vector(2), &[1.0, 2.0]).unwrap();
        let view = safetensors::tensor::TensorView::new(
            safetensors::Dtype::F32,
            vec![2],
            tensor.as_bytes(),
        )
        .unwrap();
        let bytes = safetensors::serialize(vec![("w", view)], &None).unwrap();
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(
            read_manifest_from_file(&path),
            Err(GraphError::InvalidGraph(_))
        ));
    }

    #[test]
    fn test_read_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.sng");
        std::fs::write(&path, b"not a safetensors file").unwrap();
        assert!(read_manifest_from_file(&path).is_err());
    }

    #[test]
    fn test_payload_tensors_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.sng");
        write(&path, &tiny_graph(), &tiny_weights()).unwrap();

        let buffer = std::fs::read(&path).unwrap();
        let st = safetensors::SafeTensors::deserialize(&buffer).unwrap();
        let view = st.tensor("head.weight").unwrap();
        assert_eq!(view.shape(), &[1, 1, 1, 1]);
    }
}
