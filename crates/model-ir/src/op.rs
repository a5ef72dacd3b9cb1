// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Node definitions for the portable graph format.
//!
//! Each [`NodeDef`] describes a single computation: its op, the value
//! names it consumes and produces, and the weight tensors it reads from
//! the artifact payload. Weight *data* is never stored here — only names
//! (keys into the SafeTensors payload).

/// The computation a graph node performs.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OpKind {
    /// 2-D convolution with square stride/padding.
    Conv2d { stride: usize, padding: usize },
    /// Transposed 2-D convolution (upsampling).
    ConvTranspose2d { stride: usize },
    /// Per-channel batch normalization with stored running statistics.
    BatchNorm { epsilon: f32 },
    /// Rectified linear unit.
    Relu,
    /// Logistic sigmoid.
    Sigmoid,
    /// Square-window max pooling.
    MaxPool2d { kernel: usize, stride: usize },
    /// Channel-axis concatenation of two values.
    Concat,
}

impl OpKind {
    /// Number of value inputs this op consumes.
    pub fn input_arity(&self) -> usize {
        match self {
            OpKind::Concat => 2,
            _ => 1,
        }
    }

    /// Number of weight tensors this op reads from the payload.
    ///
    /// Convolutions carry `[weight, bias]`, batch norm carries
    /// `[gamma, beta, running_mean, running_var]`, everything else is
    /// weightless.
    pub fn weight_arity(&self) -> usize {
        match self {
            OpKind::Conv2d { .. } | OpKind::ConvTranspose2d { .. } => 2,
            OpKind::BatchNorm { .. } => 4,
            _ => 0,
        }
    }

    /// Returns a human-readable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Conv2d { .. } => "conv2d",
            OpKind::ConvTranspose2d { .. } => "conv_transpose2d",
            OpKind::BatchNorm { .. } => "batch_norm",
            OpKind::Relu => "relu",
            OpKind::Sigmoid => "sigmoid",
            OpKind::MaxPool2d { .. } => "max_pool2d",
            OpKind::Concat => "concat",
        }
    }
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single node in the portable graph.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NodeDef {
    /// Unique node name (e.g., `"enc1.conv1"`).
    pub name: String,
    /// The computation this node performs.
    #[serde(flatten)]
    pub op: OpKind,
    /// Value names consumed, in op order.
    pub inputs: Vec<String>,
    /// Value name produced.
    pub output: String,
    /// Weight tensor names in the artifact payload, in op order.
    #[serde(default)]
    pub weights: Vec<String>,
}

impl NodeDef {
    /// Returns a concise summary string for display.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}) {:?} -> {}",
            self.name,
            self.op,
            self.inputs,
            self.output,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arities() {
        assert_eq!(OpKind::Conv2d { stride: 1, padding: 1 }.weight_arity(), 2);
        assert_eq!(OpKind::BatchNorm { epsilon: 1e-5 }.weight_arity(), 4);
        assert_eq!(OpKind::Relu.weight_arity(), 0);
        assert_eq!(OpKind::Concat.input_arity(), 2);
        assert_eq!(OpKind::Sigmoid.input_arity(), 1);
    }

    #[test]
    fn test_serde_tagged_op() {
        let node = NodeDef {
            name: "enc1.conv1".into(),
            op: OpKind::Conv2d { stride: 1, padding: 1 },
            inputs: vec!["input".into()],
            output: "enc1.a1".into(),
            weights: vec!["enc1.conv1.weight".into(), "enc1.conv1.bias".into()],
        };
        let json = serde_json::to_string(&node).unwrap();
        assert!(json.contains("\"op\":\"conv2d\""));
        let back: NodeDef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_weights_default_empty() {
        let json = r#"{
            "name": "act",
            "op": "relu",
            "inputs": ["x"],
            "output": "y"
        }"#;
        let node: NodeDef = serde_json::from_str(json).unwrap();
        assert!(node.weights.is_empty());
        assert_eq!(node.op, OpKind::Relu);
    }
}
