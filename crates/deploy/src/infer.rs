// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Batch inference over an image folder.
//!
//! Per-input contract: drop the alpha channel if the source image has
//! one (only RGB is enhanced), run the model, clamp the output into the
//! normalized `[0, 1]` range, rescale to 8-bit, and write one output
//! image per input under the original filename. The source directory is
//! never written to.

use crate::{DeployError, ImageFolder, Sample};
use model_ir::ImageModel;
use std::path::{Path, PathBuf};
use tensor_core::{Shape, Tensor};

/// Result of one batch-inference run.
#[derive(Debug)]
pub struct InferenceSummary {
    /// Number of output images written.
    pub images_written: usize,
    /// Number of inputs skipped because they failed to decode.
    pub images_skipped: usize,
    /// Directory outputs were written to.
    pub output_dir: PathBuf,
}

/// Runs `model` over every image in `dataset`, writing enhanced images
/// into `output_dir` (created if absent).
///
/// Undecodable inputs are logged and skipped; a model failure is fatal,
/// since it would recur for every remaining input.
pub fn run<M: ImageModel>(
    model: &M,
    dataset: &ImageFolder,
    output_dir: &Path,
) -> Result<InferenceSummary, DeployError> {
    if output_dir == dataset.dir() {
        return Err(DeployError::Config(
            "output directory must differ from the input directory".into(),
        ));
    }
    std::fs::create_dir_all(output_dir)?;

    let mut written = 0usize;
    let mut skipped = 0usize;

    for sample in dataset.iter() {
        let sample = match sample {
            Ok(sample) => sample,
            Err(e) => {
                tracing::warn!("skipping undecodable input: {e}");
                skipped += 1;
                continue;
            }
        };

        let output_path = output_dir.join(&sample.filename);
        enhance_one(model, sample, &output_path)?;
        written += 1;
    }

    tracing::info!(
        "inference complete: {written} image(s) written to '{}', {skipped} skipped",
        output_dir.display(),
    );
    Ok(InferenceSummary {
        images_written: written,
        images_skipped: skipped,
        output_dir: output_dir.to_path_buf(),
    })
}

fn enhance_one<M: ImageModel>(
    model: &M,
    sample: Sample,
    output_path: &Path,
) -> Result<(), DeployError> {
    let mut input = sample.image;

    // Alpha is not enhanced: keep the RGB planes only.
    if input.shape().channels() == 4 {
        tracing::debug!("'{}': dropping alpha channel", sample.filename);
        input = drop_alpha(&input)?;
    }

    let mut output = model.forward(&input)?;
    output.clamp_in_place(0.0, 1.0);

    let image = tensor_to_rgb(&output)?;
    image.save(output_path)?;
    tracing::debug!("wrote '{}'", output_path.display());
    Ok(())
}

/// Keeps the first three channels of a single-item RGBA batch.
fn drop_alpha(input: &Tensor) -> Result<Tensor, DeployError> {
    let shape = input.shape();
    let (n, h, w) = (shape.batch(), shape.height(), shape.width());
    let plane = h * w;
    let src = input.as_f32_slice();

    let mut values = vec![0.0f32; n * 3 * plane];
    for bn in 0..n {
        let src_base = bn * 4 * plane;
        let dst_base = bn * 3 * plane;
        values[dst_base..dst_base + 3 * plane]
            .copy_from_slice(&src[src_base..src_base + 3 * plane]);
    }
    Ok(Tensor::from_f32(Shape::nchw(n, 3, h, w), &values)?)
}

/// Converts a clamped `[0, 1]` single-item RGB batch to an 8-bit image.
fn tensor_to_rgb(tensor: &Tensor) -> Result<image::RgbImage, DeployError> {
    let shape = tensor.shape();
    if !shape.is_nchw() || shape.batch() != 1 || shape.channels() != 3 {
        return Err(DeployError::Config(format!(
            "cannot write tensor of shape {shape} as an RGB image",
        )));
    }
    let (h, w) = (shape.height(), shape.width());
    let values = tensor.as_f32_slice();
    let plane = h * w;

    let image = image::RgbImage::from_fn(w as u32, h as u32, |x, y| {
        let idx = y as usize * w + x as usize;
        let to_u8 = |v: f32| (v * 255.0).round() as u8;
        image::Rgb([
            to_u8(values[idx]),
            to_u8(values[plane + idx]),
            to_u8(values[2 * plane + idx]),
        ])
    });
    Ok(image)
}
