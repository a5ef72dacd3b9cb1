// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! JSON graph manifest.
//!
//! The manifest describes the exported computation: node wiring, the
//! declared input/output tensor names, the spatial resolution baked in
//! at export time, and which axes stay dynamic.
//!
//! # Format
//! ```json
//! {
//!   "name": "unet_epoch_80",
//!   "format_version": 1,
//!   "input_name": "input",
//!   "output_name": "output",
//!   "channels": 3,
//!   "height": 512,
//!   "width": 512,
//!   "dynamic_axes": [0],
//!   "nodes": [
//!     { "name": "enc1.conv1", "op": "conv2d", "stride": 1, "padding": 1,
//!       "inputs": ["input"], "output": "enc1.a1",
//!       "weights": ["enc1.conv1.weight", "enc1.conv1.bias"] },
//!     ...
//!   ]
//! }
//! ```
//!
//! Only the batch axis (index 0) is dynamic; height and width are fixed
//! to the values used at export time.

use crate::{GraphError, NodeDef};

/// Declared input tensor name of every exported graph.
pub const INPUT_NAME: &str = "input";

/// Declared output tensor name of every exported graph.
pub const OUTPUT_NAME: &str = "output";

/// Top-level graph manifest, serialized into the artifact header.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GraphManifest {
    /// Model name (derived from the source checkpoint filename).
    pub name: String,
    /// Interchange format version tag.
    pub format_version: u32,
    /// Declared input tensor name (always [`INPUT_NAME`] for our exports).
    pub input_name: String,
    /// Declared output tensor name (always [`OUTPUT_NAME`] for our exports).
    pub output_name: String,
    /// Input/output channel count.
    pub channels: usize,
    /// Spatial height baked in at export time.
    pub height: usize,
    /// Spatial width baked in at export time.
    pub width: usize,
    /// Axes whose size is not fixed at export time. Only the batch axis.
    pub dynamic_axes: Vec<usize>,
    /// Node definitions in execution order.
    pub nodes: Vec<NodeDef>,
}

impl GraphManifest {
    /// Parses a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let manifest: Self = serde_json::from_str(json)?;
        Ok(manifest)
    }

    /// Serializes the manifest to a JSON string.
    pub fn to_json(&self) -> Result<String, GraphError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Returns the names of all weight tensors referenced by any node.
    pub fn referenced_weights(&self) -> impl Iterator<Item = &str> {
        self.nodes
            .iter()
            .flat_map(|n| n.weights.iter())
            .map(String::as_str)
    }

    /// Total number of weight tensors referenced across all nodes.
    pub fn total_weight_count(&self) -> usize {
        self.referenced_weights().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OpKind;

    pub(crate) fn sample_manifest() -> GraphManifest {
        GraphManifest {
            name: "tiny".into(),
            format_version: crate::artifact::FORMAT_VERSION,
            input_name: INPUT_NAME.into(),
            output_name: OUTPUT_NAME.into(),
            channels: 3,
            height: 16,
            width: 16,
            dynamic_axes: vec![0],
            nodes: vec![
                NodeDef {
                    name: "head".into(),
                    op: OpKind::Conv2d { stride: 1, padding: 0 },
                    inputs: vec![INPUT_NAME.into()],
                    output: "head.a".into(),
                    weights: vec!["head.weight".into(), "head.bias".into()],
                },
                NodeDef {
                    name: "act".into(),
                    op: OpKind::Sigmoid,
                    inputs: vec!["head.a".into()],
                    output: OUTPUT_NAME.into(),
                    weights: vec![],
                },
            ],
        }
    }

    #[test]
    fn test_json_roundtrip() {
        let m = sample_manifest();
        let json = m.to_json().unwrap();
        let back = GraphManifest::from_json(&json).unwrap();
        assert_eq!(back.name, m.name);
        assert_eq!(back.nodes.len(), 2);
        assert_eq!(back.dynamic_axes, vec![0]);
    }

    #[test]
    fn test_referenced_weights() {
        let m = sample_manifest();
        let names: Vec<&str> = m.referenced_weights().collect();
        assert_eq!(names, vec!["head.weight", "head.bias"]);
        assert_eq!(m.total_weight_count(), 2);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(GraphManifest::from_json("{\"name\": 3}").is_err());
    }
}
