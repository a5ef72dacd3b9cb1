// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The encoder/decoder network and its [`ImageModel`] implementation.
//!
//! Layout (feature width `f = init_features`):
//!
//! ```text
//! enc1 (in→f) ─ pool ─ enc2 (f→2f) ─ pool ─ enc3 ─ pool ─ enc4 ─ pool
//!   │                    │                   │              │
//!   │                    │                   │              │     bottleneck (8f→16f)
//!   │                    │                   │              │        │
//! dec1 (2f→f) ─ cat ─ dec2 (4f→2f) ─ cat ─ dec3 ─ cat ─ dec4 ◄─ upconv4
//!   │
//! head (f→out, 1×1) ─ sigmoid
//! ```
//!
//! Every block is conv3×3 → batch-norm → relu, twice. `forward` and
//! `trace` walk the same topology, so the traced graph executes exactly
//! the computation the in-memory network performs.

use model_ir::{
    ArchSpec, BindError, GraphError, GraphManifest, ImageModel, NodeDef, OpKind, WeightsMap,
    INPUT_NAME, OUTPUT_NAME,
};
use tensor_core::{ops, DType, Device, Shape, Tensor, TensorError};

/// Batch-norm stabilizer, matching the value the checkpoints were
/// trained with.
pub const BN_EPSILON: f32 = 1e-5;

/// Spatial resolutions must be multiples of this (four 2× poolings).
pub const SPATIAL_MULTIPLE: usize = 16;

/// Number of encoder/decoder levels.
const LEVELS: usize = 4;

/// The enhancement network with weights bound.
pub struct Unet {
    spec: ArchSpec,
    params: WeightsMap,
    training: bool,
    device: Device,
}

impl Unet {
    /// Feature width at encoder level `i` (1-based).
    fn features(&self, level: usize) -> usize {
        self.spec.init_features << (level - 1)
    }

    /// Looks up a parameter that is guaranteed by construction.
    fn param(&self, name: &str) -> &Tensor {
        self.params
            .get(name)
            .unwrap_or_else(|| panic!("parameter '{name}' must exist by construction"))
    }

    // ── Forward helpers ────────────────────────────────────────

    fn conv(
        &self,
        name: &str,
        x: &Tensor,
        stride: usize,
        padding: usize,
    ) -> Result<Tensor, TensorError> {
        let w = self.param(&format!("{name}.weight"));
        let b = self.param(&format!("{name}.bias"));
        ops::conv2d(&x.view(), &w.view(), Some(&b.view()), stride, padding)
    }

    fn upconv(&self, name: &str, x: &Tensor) -> Result<Tensor, TensorError> {
        let w = self.param(&format!("{name}.weight"));
        let b = self.param(&format!("{name}.bias"));
        ops::conv_transpose2d(&x.view(), &w.view(), Some(&b.view()), 2)
    }

    fn normalize(&self, name: &str, x: &Tensor) -> Result<Tensor, TensorError> {
        let gamma = self.param(&format!("{name}.weight"));
        let beta = self.param(&format!("{name}.bias"));
        if self.training {
            let (mean, var) = batch_statistics(x);
            ops::batch_norm(
                &x.view(),
                &gamma.view(),
                &beta.view(),
                &mean.view(),
                &var.view(),
                BN_EPSILON,
            )
        } else {
            let mean = self.param(&format!("{name}.running_mean"));
            let var = self.param(&format!("{name}.running_var"));
            ops::batch_norm(
                &x.view(),
                &gamma.view(),
                &beta.view(),
                &mean.view(),
                &var.view(),
                BN_EPSILON,
            )
        }
    }

    /// conv → norm → relu, twice.
    fn block_forward(&self, prefix: &str, x: &Tensor) -> Result<Tensor, TensorError> {
        let x = self.conv(&format!("{prefix}.conv1"), x, 1, 1)?;
        let x = self.normalize(&format!("{prefix}.norm1"), &x)?;
        let x = ops::relu(&x.view())?;
        let x = self.conv(&format!("{prefix}.conv2"), &x, 1, 1)?;
        let x = self.normalize(&format!("{prefix}.norm2"), &x)?;
        ops::relu(&x.view())
    }

    // ── Trace helpers ──────────────────────────────────────────

    fn conv_node(
        name: &str,
        op: OpKind,
        inputs: Vec<String>,
        nodes: &mut Vec<NodeDef>,
    ) -> String {
        let node = NodeDef {
            name: name.to_string(),
            op,
            inputs,
            output: name.to_string(),
            weights: vec![format!("{name}.weight"), format!("{name}.bias")],
        };
        nodes.push(node);
        name.to_string()
    }

    fn plain_node(
        name: &str,
        op: OpKind,
        inputs: Vec<String>,
        output: &str,
        nodes: &mut Vec<NodeDef>,
    ) -> String {
        nodes.push(NodeDef {
            name: name.to_string(),
            op,
            inputs,
            output: output.to_string(),
            weights: vec![],
        });
        output.to_string()
    }

    fn norm_node(name: &str, input: String, nodes: &mut Vec<NodeDef>) -> String {
        nodes.push(NodeDef {
            name: name.to_string(),
            op: OpKind::BatchNorm { epsilon: BN_EPSILON },
            inputs: vec![input],
            output: name.to_string(),
            weights: vec![
                format!("{name}.weight"),
                format!("{name}.bias"),
                format!("{name}.running_mean"),
                format!("{name}.running_var"),
            ],
        });
        name.to_string()
    }

    fn block_trace(&self, prefix: &str, input: String, nodes: &mut Vec<NodeDef>) -> String {
        let conv = OpKind::Conv2d { stride: 1, padding: 1 };
        let v = Self::conv_node(&format!("{prefix}.conv1"), conv.clone(), vec![input], nodes);
        let v = Self::norm_node(&format!("{prefix}.norm1"), v, nodes);
        let relu1 = format!("{prefix}.relu1");
        let v = Self::plain_node(&relu1, OpKind::Relu, vec![v], &relu1, nodes);
        let v = Self::conv_node(&format!("{prefix}.conv2"), conv, vec![v], nodes);
        let v = Self::norm_node(&format!("{prefix}.norm2"), v, nodes);
        let relu2 = format!("{prefix}.relu2");
        Self::plain_node(&relu2, OpKind::Relu, vec![v], &relu2, nodes)
    }

    // ── Parameter table ────────────────────────────────────────

    /// Builds the full parameter table for `spec`, with conventional
    /// initialization (zero weights, identity normalization statistics).
    fn parameter_table(spec: ArchSpec) -> WeightsMap {
        let mut params = WeightsMap::new();
        let f = spec.init_features;

        let mut add = |name: String, shape: Shape, value: f32| {
            let n = shape.num_elements();
            params.insert(name, Tensor::from_f32(shape, &vec![value; n]).unwrap());
        };

        fn add_block(
            add: &mut dyn FnMut(String, Shape, f32),
            prefix: &str,
            in_c: usize,
            out_c: usize,
        ) {
            add(
                format!("{prefix}.conv1.weight"),
                Shape::new(vec![out_c, in_c, 3, 3]),
                0.0,
            );
            add(format!("{prefix}.conv1.bias"), Shape::vector(out_c), 0.0);
            for (suffix, value) in [
                ("norm1.weight", 1.0),
                ("norm1.bias", 0.0),
                ("norm1.running_mean", 0.0),
                ("norm1.running_var", 1.0),
            ] {
                add(format!("{prefix}.{suffix}"), Shape::vector(out_c), value);
            }
            add(
                format!("{prefix}.conv2.weight"),
                Shape::new(vec![out_c, out_c, 3, 3]),
                0.0,
            );
            add(format!("{prefix}.conv2.bias"), Shape::vector(out_c), 0.0);
            for (suffix, value) in [
                ("norm2.weight", 1.0),
                ("norm2.bias", 0.0),
                ("norm2.running_mean", 0.0),
                ("norm2.running_var", 1.0),
            ] {
                add(format!("{prefix}.{suffix}"), Shape::vector(out_c), value);
            }
        }

        // Encoder path.
        let mut in_c = spec.in_channels;
        for level in 1..=LEVELS {
            let out_c = f << (level - 1);
            add_block(&mut add, &format!("enc{level}"), in_c, out_c);
            in_c = out_c;
        }

        // Bottleneck.
        add_block(&mut add, "bottleneck", f << (LEVELS - 1), f << LEVELS);

        // Decoder path.
        for level in (1..=LEVELS).rev() {
            let out_c = f << (level - 1);
            let in_c = out_c * 2;
            add(
                format!("upconv{level}.weight"),
                Shape::new(vec![in_c, out_c, 2, 2]),
                0.0,
            );
            add(format!("upconv{level}.bias"), Shape::vector(out_c), 0.0);
            add_block(&mut add, &format!("dec{level}"), in_c, out_c);
        }

        // 1x1 projection head.
        add(
            "head.weight".to_string(),
            Shape::new(vec![spec.out_channels, f, 1, 1]),
            0.0,
        );
        add("head.bias".to_string(), Shape::vector(spec.out_channels), 0.0);

        params
    }

    fn check_resolution(height: usize, width: usize) -> Result<(), GraphError> {
        if height == 0
            || width == 0
            || height % SPATIAL_MULTIPLE != 0
            || width % SPATIAL_MULTIPLE != 0
        {
            return Err(GraphError::InvalidGraph(format!(
                "resolution {height}x{width} is not a positive multiple of {SPATIAL_MULTIPLE}",
            )));
        }
        Ok(())
    }
}

impl ImageModel for Unet {
    fn construct(spec: ArchSpec) -> Self {
        let params = Self::parameter_table(spec);
        tracing::debug!(
            "constructed unet ({}) with {} parameter tensors",
            spec,
            params.len(),
        );
        Self {
            spec,
            params,
            training: true,
            device: Device::Cpu,
        }
    }

    fn spec(&self) -> &ArchSpec {
        &self.spec
    }

    fn bind_weights(&mut self, weights: WeightsMap) -> Result<(), BindError> {
        // Validate the full key set both ways before touching anything:
        // binding is all-or-nothing.
        for (name, expected) in &self.params {
            let tensor = weights
                .get(name)
                .ok_or_else(|| BindError::MissingParameter { name: name.clone() })?;
            if tensor.dtype() != DType::F32 {
                return Err(BindError::WrongDType {
                    name: name.clone(),
                    dtype: tensor.dtype(),
                });
            }
            if tensor.shape() != expected.shape() {
                return Err(BindError::ShapeMismatch {
                    name: name.clone(),
                    expected: expected.shape().clone(),
                    actual: tensor.shape().clone(),
                });
            }
        }
        for name in weights.keys() {
            if !self.params.contains_key(name) {
                return Err(BindError::UnexpectedParameter { name: name.clone() });
            }
        }

        self.params = weights;
        Ok(())
    }

    fn named_parameters(&self) -> &WeightsMap {
        &self.params
    }

    fn forward(&self, input: &Tensor) -> Result<Tensor, TensorError> {
        let shape = input.shape();
        if input.dtype() != DType::F32 || !shape.is_nchw() {
            return Err(TensorError::InvalidArgument {
                op: "unet",
                detail: format!("expected rank-4 f32 input, got {shape} ({})", input.dtype()),
            });
        }
        if shape.channels() != self.spec.in_channels {
            return Err(TensorError::InvalidArgument {
                op: "unet",
                detail: format!(
                    "expected {} input channels, got {}",
                    self.spec.in_channels,
                    shape.channels(),
                ),
            });
        }
        if shape.height() % SPATIAL_MULTIPLE != 0 || shape.width() % SPATIAL_MULTIPLE != 0 {
            return Err(TensorError::InvalidArgument {
                op: "unet",
                detail: format!(
                    "resolution {}x{} is not a multiple of {SPATIAL_MULTIPLE}",
                    shape.height(),
                    shape.width(),
                ),
            });
        }

        // Encoder: keep each level's activation for the skip merge.
        let mut skips: Vec<Tensor> = Vec::with_capacity(LEVELS);
        let mut x = input.clone();
        for level in 1..=LEVELS {
            let e = self.block_forward(&format!("enc{level}"), &x)?;
            x = ops::max_pool2d(&e.view(), 2, 2)?;
            skips.push(e);
        }

        let mut x = self.block_forward("bottleneck", &x)?;

        // Decoder: upsample, merge the skip, convolve back down.
        for level in (1..=LEVELS).rev() {
            let up = self.upconv(&format!("upconv{level}"), &x)?;
            let merged = ops::concat_channels(&up.view(), &skips[level - 1].view())?;
            x = self.block_forward(&format!("dec{level}"), &merged)?;
        }

        let x = self.conv("head", &x, 1, 0)?;
        ops::sigmoid(&x.view())
    }

    fn trace(&self, height: usize, width: usize) -> Result<GraphManifest, GraphError> {
        Self::check_resolution(height, width)?;

        let mut nodes = Vec::new();

        // Encoder.
        let mut skip_values = Vec::with_capacity(LEVELS);
        let mut value = INPUT_NAME.to_string();
        for level in 1..=LEVELS {
            let e = self.block_trace(&format!("enc{level}"), value, &mut nodes);
            let pool = format!("pool{level}");
            value = Self::plain_node(
                &pool,
                OpKind::MaxPool2d { kernel: 2, stride: 2 },
                vec![e.clone()],
                &pool,
                &mut nodes,
            );
            skip_values.push(e);
        }

        let mut value = self.block_trace("bottleneck", value, &mut nodes);

        // Decoder.
        for level in (1..=LEVELS).rev() {
            let up = Self::conv_node(
                &format!("upconv{level}"),
                OpKind::ConvTranspose2d { stride: 2 },
                vec![value],
                &mut nodes,
            );
            let cat = format!("dec{level}.cat");
            let merged = Self::plain_node(
                &cat,
                OpKind::Concat,
                vec![up, skip_values[level - 1].clone()],
                &cat,
                &mut nodes,
            );
            value = self.block_trace(&format!("dec{level}"), merged, &mut nodes);
        }

        let head = Self::conv_node(
            "head",
            OpKind::Conv2d { stride: 1, padding: 0 },
            vec![value],
            &mut nodes,
        );
        Self::plain_node("head.act", OpKind::Sigmoid, vec![head], OUTPUT_NAME, &mut nodes);

        Ok(GraphManifest {
            name: "unet".to_string(),
            format_version: model_ir::artifact::FORMAT_VERSION,
            input_name: INPUT_NAME.to_string(),
            output_name: OUTPUT_NAME.to_string(),
            channels: self.spec.in_channels,
            height,
            width,
            dynamic_axes: vec![0],
            nodes,
        })
    }

    fn set_training(&mut self, training: bool) {
        self.training = training;
    }

    fn is_training(&self) -> bool {
        self.training
    }

    fn to_device(mut self, device: Device) -> Self {
        // CPU is the only resident backend; the transfer still consumes
        // and returns the instance so accelerator moves keep this shape.
        self.device = device;
        self
    }

    fn device(&self) -> Device {
        self.device
    }
}

impl std::fmt::Debug for Unet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unet")
            .field("spec", &self.spec)
            .field("parameters", &self.params.len())
            .field("training", &self.training)
            .field("device", &self.device)
            .finish()
    }
}

/// Per-channel mean and biased variance over batch and spatial axes.
fn batch_statistics(x: &Tensor) -> (Tensor, Tensor) {
    let shape = x.shape();
    let (n, c, h, w) = (shape.batch(), shape.channels(), shape.height(), shape.width());
    let data = x.as_f32_slice();
    let plane = h * w;
    let count = (n * plane) as f32;

    let mut mean = vec![0.0f32; c];
    let mut var = vec![0.0f32; c];

    for bn in 0..n {
        for ch in 0..c {
            let base = (bn * c + ch) * plane;
            for i in 0..plane {
                mean[ch] += data[base + i];
            }
        }
    }
    for m in &mut mean {
        *m /= count;
    }
    for bn in 0..n {
        for ch in 0..c {
            let base = (bn * c + ch) * plane;
            for i in 0..plane {
                let d = data[base + i] - mean[ch];
                var[ch] += d * d;
            }
        }
    }
    for v in &mut var {
        *v /= count;
    }

    (
        Tensor::from_f32(Shape::vector(c), &mean).unwrap(),
        Tensor::from_f32(Shape::vector(c), &var).unwrap(),
    )
}
