// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Image-folder dataloader.
//!
//! Yields `(image_tensor, label_placeholder, filename)` samples for the
//! inference runner. Test sets carry no ground-truth labels, so the
//! label slot is always empty here; it exists so paired datasets can use
//! the same sample shape.
//!
//! Images decode to NCHW `f32` tensors normalized into `[0, 1]`. Files
//! with an alpha channel keep it (four channels) — dropping alpha is the
//! *runner's* contract, not the loader's.

use crate::DeployError;
use image::GenericImageView;
use std::path::{Path, PathBuf};
use tensor_core::{Shape, Tensor};

/// Image file extensions the loader picks up.
const SUPPORTED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// One dataset item.
#[derive(Debug)]
pub struct Sample {
    /// NCHW `f32` tensor in `[0, 1]`, batch size 1; 3 or 4 channels.
    pub image: Tensor,
    /// Ground-truth slot; always `None` for test folders.
    pub label: Option<Tensor>,
    /// Original filename, reused verbatim for output naming.
    pub filename: String,
}

/// A directory of input images, iterated in filename order.
pub struct ImageFolder {
    dir: PathBuf,
    resize: Option<(usize, usize)>,
    entries: Vec<PathBuf>,
}

impl ImageFolder {
    /// Scans `dir` for supported image files.
    ///
    /// With `resize = Some((height, width))`, every decoded image is
    /// rescaled to that resolution before tensor conversion.
    pub fn open(dir: &Path, resize: Option<(usize, usize)>) -> Result<Self, DeployError> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let supported = path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
                    .unwrap_or(false);
            if supported {
                entries.push(path);
            }
        }
        entries.sort();
        tracing::debug!("image folder '{}': {} file(s)", dir.display(), entries.len());
        Ok(Self {
            dir: dir.to_path_buf(),
            resize,
            entries,
        })
    }

    /// The directory this folder reads from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of images found.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if no supported images were found.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates samples in filename order, decoding lazily.
    pub fn iter(&self) -> impl Iterator<Item = Result<Sample, DeployError>> + '_ {
        self.entries
            .iter()
            .map(move |path| load_sample(path, self.resize))
    }
}

fn load_sample(path: &Path, resize: Option<(usize, usize)>) -> Result<Sample, DeployError> {
    let decoded = image::open(path)?;
    let decoded = match resize {
        Some((height, width)) => decoded.resize_exact(
            width as u32,
            height as u32,
            image::imageops::FilterType::Triangle,
        ),
        None => decoded,
    };

    let (width, height) = decoded.dimensions();
    let filename = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    // Preserve alpha when the source carries it.
    let (channels, raw) = if decoded.color().has_alpha() {
        (4usize, decoded.to_rgba8().into_raw())
    } else {
        (3usize, decoded.to_rgb8().into_raw())
    };

    let (h, w) = (height as usize, width as usize);
    let mut values = vec![0.0f32; channels * h * w];
    // HWC bytes → CHW floats in [0, 1].
    for y in 0..h {
        for x in 0..w {
            for c in 0..channels {
                values[(c * h + y) * w + x] =
                    raw[(y * w + x) * channels + c] as f32 / 255.0;
            }
        }
    }

    let image = Tensor::from_f32(Shape::nchw(1, channels, h, w), &values)?;
    Ok(Sample {
        image,
        label: None,
        filename,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32, alpha: bool) {
        let path = dir.join(name);
        if alpha {
            let img = image::RgbaImage::from_fn(width, height, |x, y| {
                image::Rgba([x as u8, y as u8, 128, 200])
            });
            img.save(&path).unwrap();
        } else {
            let img = image::RgbImage::from_fn(width, height, |x, y| {
                image::Rgb([x as u8, y as u8, 64])
            });
            img.save(&path).unwrap();
        }
    }

    #[test]
    fn test_scan_and_order() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "b.png", 4, 4, false);
        write_png(dir.path(), "a.png", 4, 4, false);
        std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let folder = ImageFolder::open(dir.path(), None).unwrap();
        assert_eq!(folder.len(), 2);

        let names: Vec<String> = folder
            .iter()
            .map(|s| s.unwrap().filename)
            .collect();
        assert_eq!(names, vec!["a.png", "b.png"]);
    }

    #[test]
    fn test_rgb_tensor_layout() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "img.png", 2, 2, false);

        let folder = ImageFolder::open(dir.path(), None).unwrap();
        let sample = folder.iter().next().unwrap().unwrap();
        assert_eq!(sample.image.shape(), &Shape::nchw(1, 3, 2, 2));
        assert!(sample.label.is_none());

        // Pixel (x=1, y=0) has red 1 → 1/255 at CHW index [0, 0, 1].
        let v = sample.image.as_f32_slice();
        assert!((v[1] - 1.0 / 255.0).abs() < 1e-6);
        // Blue plane is constant 64/255.
        assert!((v[2 * 4] - 64.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_alpha_channel_preserved() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "rgba.png", 3, 3, true);

        let folder = ImageFolder::open(dir.path(), None).unwrap();
        let sample = folder.iter().next().unwrap().unwrap();
        assert_eq!(sample.image.shape(), &Shape::nchw(1, 4, 3, 3));

        // Alpha plane is constant 200/255.
        let v = sample.image.as_f32_slice();
        let alpha_plane = &v[3 * 9..4 * 9];
        assert!(alpha_plane.iter().all(|&a| (a - 200.0 / 255.0).abs() < 1e-6));
    }

    #[test]
    fn test_resize() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "img.png", 10, 6, false);

        let folder = ImageFolder::open(dir.path(), Some((16, 32))).unwrap();
        let sample = folder.iter().next().unwrap().unwrap();
        assert_eq!(sample.image.shape(), &Shape::nchw(1, 3, 16, 32));
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImageFolder::open(&dir.path().join("absent"), None).is_err());
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let folder = ImageFolder::open(dir.path(), None).unwrap();
        assert!(folder.is_empty());
    }
}
