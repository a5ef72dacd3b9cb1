// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Validated graph wrapper.
//!
//! # Type-State Pattern
//!
//! A parsed manifest transitions through states enforced at compile time:
//!
//! ```text
//! Graph<Draft>      — manifest parsed or traced, not yet checked.
//!       │  .validate()
//!       ▼
//! Graph<Validated>  — wiring verified, ready for export or execution.
//! ```
//!
//! This prevents the exporter from ever serializing — and the runtime
//! from ever executing — an unchecked graph. The transition consumes the
//! old state and returns the new one, so there is zero runtime cost —
//! the marker types are `PhantomData` (ZST).

use crate::{GraphError, GraphManifest, NodeDef};
use std::collections::HashSet;
use std::fmt;

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: graph has been built but not validated.
#[derive(Debug, Clone)]
pub struct Draft;

/// Marker: graph wiring has been verified.
#[derive(Debug, Clone)]
pub struct Validated;

/// Sealed trait for graph states.
pub trait GraphState: fmt::Debug + Clone {}
impl GraphState for Draft {}
impl GraphState for Validated {}

// ── Graph ──────────────────────────────────────────────────────────

/// A portable graph manifest with a compile-time validation marker.
#[derive(Debug, Clone)]
pub struct Graph<S: GraphState = Draft> {
    manifest: GraphManifest,
    _state: std::marker::PhantomData<S>,
}

impl Graph<Draft> {
    /// Wraps a manifest in the `Draft` state.
    pub fn new(manifest: GraphManifest) -> Self {
        Self {
            manifest,
            _state: std::marker::PhantomData,
        }
    }

    /// Validates the graph wiring and transitions to `Validated`.
    ///
    /// # Checks
    /// - The format version is one this build understands.
    /// - Input/output tensor names are declared and distinct.
    /// - Only the batch axis is marked dynamic.
    /// - At least one node; node names and produced value names unique.
    /// - Every node input was produced by an earlier node or is the
    ///   declared graph input.
    /// - The final node — and only the final node — produces the
    ///   declared graph output.
    /// - Each node carries exactly the weight count its op requires.
    pub fn validate(self) -> Result<Graph<Validated>, GraphError> {
        let m = &self.manifest;

        if m.format_version != crate::artifact::FORMAT_VERSION {
            return Err(GraphError::UnsupportedVersion {
                found: m.format_version,
                supported: crate::artifact::FORMAT_VERSION,
            });
        }

        if m.input_name.is_empty() || m.output_name.is_empty() {
            return Err(GraphError::InvalidGraph(
                "input/output tensor names must be declared".into(),
            ));
        }
        if m.input_name == m.output_name {
            return Err(GraphError::InvalidGraph(
                "input and output tensor names must differ".into(),
            ));
        }
        if m.dynamic_axes != [0] {
            return Err(GraphError::InvalidGraph(format!(
                "only the batch axis may be dynamic, got {:?}",
                m.dynamic_axes,
            )));
        }
        if m.nodes.is_empty() {
            return Err(GraphError::InvalidGraph("graph contains no nodes".into()));
        }
        if m.channels == 0 || m.height == 0 || m.width == 0 {
            return Err(GraphError::InvalidGraph(format!(
                "zero-sized input contract {}x{}x{}",
                m.channels, m.height, m.width,
            )));
        }

        let mut node_names = HashSet::new();
        let mut produced: HashSet<&str> = HashSet::new();

        for node in &m.nodes {
            if !node_names.insert(node.name.as_str()) {
                return Err(GraphError::InvalidNode {
                    node: node.name.clone(),
                    detail: "duplicate node name".into(),
                });
            }

            if node.inputs.len() != node.op.input_arity() {
                return Err(GraphError::InvalidNode {
                    node: node.name.clone(),
                    detail: format!(
                        "op {} takes {} input(s), found {}",
                        node.op,
                        node.op.input_arity(),
                        node.inputs.len(),
                    ),
                });
            }
            for input in &node.inputs {
                if input != &m.input_name && !produced.contains(input.as_str()) {
                    return Err(GraphError::InvalidNode {
                        node: node.name.clone(),
                        detail: format!("input value '{input}' is not defined at this point"),
                    });
                }
            }

            if node.output == m.input_name || !produced.insert(node.output.as_str()) {
                return Err(GraphError::InvalidNode {
                    node: node.name.clone(),
                    detail: format!("output value '{}' is already defined", node.output),
                });
            }

            if node.weights.len() != node.op.weight_arity() {
                return Err(GraphError::InvalidNode {
                    node: node.name.clone(),
                    detail: format!(
                        "op {} requires {} weight tensor(s), found {}",
                        node.op,
                        node.op.weight_arity(),
                        node.weights.len(),
                    ),
                });
            }
        }

        // The output must be produced, and by the final node: anything
        // after the output value would be dead computation.
        let last = m.nodes.last().map(|n| n.output.as_str());
        if last != Some(m.output_name.as_str()) {
            return Err(GraphError::InvalidGraph(format!(
                "final node must produce '{}', produces '{}'",
                m.output_name,
                last.unwrap_or("<none>"),
            )));
        }

        Ok(Graph {
            manifest: self.manifest,
            _state: std::marker::PhantomData,
        })
    }
}

impl Graph<Validated> {
    /// Returns the underlying manifest.
    pub fn manifest(&self) -> &GraphManifest {
        &self.manifest
    }

    /// Returns the nodes in execution order.
    pub fn nodes(&self) -> &[NodeDef] {
        &self.manifest.nodes
    }

    /// Returns the number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.manifest.nodes.len()
    }

    /// Returns a summary string describing the graph.
    pub fn summary(&self) -> String {
        format!(
            "Graph '{}': {} nodes, {} weight tensors, input {}x{}x{} (batch dynamic)",
            self.manifest.name,
            self.num_nodes(),
            self.manifest.total_weight_count(),
            self.manifest.channels,
            self.manifest.height,
            self.manifest.width,
        )
    }
}

impl<S: GraphState> fmt::Display for Graph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Graph '{}' ({} nodes):",
            self.manifest.name,
            self.manifest.nodes.len(),
        )?;
        for node in &self.manifest.nodes {
            writeln!(f, "  {}", node.summary())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OpKind, INPUT_NAME, OUTPUT_NAME};

    fn manifest_with_nodes(nodes: Vec<NodeDef>) -> GraphManifest {
        GraphManifest {
            name: "test".into(),
            format_version: crate::artifact::FORMAT_VERSION,
            input_name: INPUT_NAME.into(),
            output_name: OUTPUT_NAME.into(),
            channels: 3,
            height: 16,
            width: 16,
            dynamic_axes: vec![0],
            nodes,
        }
    }

    fn relu(name: &str, input: &str, output: &str) -> NodeDef {
        NodeDef {
            name: name.into(),
            op: OpKind::Relu,
            inputs: vec![input.into()],
            output: output.into(),
            weights: vec![],
        }
    }

    #[test]
    fn test_validate_ok() {
        let m = manifest_with_nodes(vec![
            relu("a", INPUT_NAME, "x"),
            relu("b", "x", OUTPUT_NAME),
        ]);
        let graph = Graph::new(m).validate().unwrap();
        assert_eq!(graph.num_nodes(), 2);
        assert!(graph.summary().contains("2 nodes"));
    }

    #[test]
    fn test_validate_empty() {
        let m = manifest_with_nodes(vec![]);
        assert!(matches!(
            Graph::new(m).validate(),
            Err(GraphError::InvalidGraph(_))
        ));
    }

    #[test]
    fn test_validate_undefined_input() {
        let m = manifest_with_nodes(vec![relu("a", "bogus", OUTPUT_NAME)]);
        assert!(matches!(
            Graph::new(m).validate(),
            Err(GraphError::InvalidNode { .. })
        ));
    }

    #[test]
    fn test_validate_duplicate_node_name() {
        let m = manifest_with_nodes(vec![
            relu("a", INPUT_NAME, "x"),
            relu("a", "x", OUTPUT_NAME),
        ]);
        assert!(Graph::new(m).validate().is_err());
    }

    #[test]
    fn test_validate_output_not_last() {
        let m = manifest_with_nodes(vec![
            relu("a", INPUT_NAME, OUTPUT_NAME),
            relu("b", OUTPUT_NAME, "dead"),
        ]);
        assert!(Graph::new(m).validate().is_err());
    }

    #[test]
    fn test_validate_weight_arity() {
        let mut node = relu("a", INPUT_NAME, OUTPUT_NAME);
        node.op = OpKind::Conv2d { stride: 1, padding: 1 };
        node.weights = vec!["w".into()]; // Conv2d wants [weight, bias].
        let m = manifest_with_nodes(vec![node]);
        assert!(Graph::new(m).validate().is_err());
    }

    #[test]
    fn test_validate_version_gate() {
        let mut m = manifest_with_nodes(vec![relu("a", INPUT_NAME, OUTPUT_NAME)]);
        m.format_version = 99;
        assert!(matches!(
            Graph::new(m).validate(),
            Err(GraphError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn test_validate_dynamic_axes_fixed() {
        let mut m = manifest_with_nodes(vec![relu("a", INPUT_NAME, OUTPUT_NAME)]);
        m.dynamic_axes = vec![0, 2, 3];
        assert!(Graph::new(m).validate().is_err());
    }
}
