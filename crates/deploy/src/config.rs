// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Pipeline configuration loaded from TOML files or constructed
//! programmatically.
//!
//! # TOML Format
//! ```toml
//! checkpoint_dir = "./snapshots"
//! output_dir = "./artifacts"
//! input_size = [512, 512]
//! verify = true
//! device = "cpu"
//! ```

use crate::DeployError;
use std::path::{Path, PathBuf};
use tensor_core::Device;

/// Configuration for the export pipeline.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DeployConfig {
    /// Directory scanned for `.ckpt` checkpoint files.
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: PathBuf,
    /// Directory artifacts and the export report are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Export resolution `[height, width]`, baked into artifacts.
    #[serde(default = "default_input_size")]
    pub input_size: (usize, usize),
    /// Whether exported artifacts are cross-checked after export.
    #[serde(default = "default_true")]
    pub verify: bool,
    /// Execution device name (only `"cpu"` is built in).
    #[serde(default = "default_device")]
    pub device: String,
}

fn default_checkpoint_dir() -> PathBuf {
    PathBuf::from("./snapshots")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./artifacts")
}

fn default_input_size() -> (usize, usize) {
    (512, 512)
}

fn default_true() -> bool {
    true
}

fn default_device() -> String {
    "cpu".to_string()
}

impl DeployConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, DeployError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DeployError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, DeployError> {
        toml::from_str(toml_str)
            .map_err(|e| DeployError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, DeployError> {
        toml::to_string_pretty(self)
            .map_err(|e| DeployError::Config(format!("TOML serialise error: {e}")))
    }

    /// Parses the device name into a [`Device`].
    pub fn parse_device(&self) -> Result<Device, DeployError> {
        Device::parse(&self.device).ok_or_else(|| {
            DeployError::Config(format!(
                "unknown device '{}'; this binary only builds in 'cpu'",
                self.device,
            ))
        })
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: default_checkpoint_dir(),
            output_dir: default_output_dir(),
            input_size: default_input_size(),
            verify: true,
            device: default_device(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let c = DeployConfig::default();
        assert_eq!(c.input_size, (512, 512));
        assert!(c.verify);
        assert_eq!(c.device, "cpu");
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
checkpoint_dir = "/tmp/snapshots"
output_dir = "/tmp/artifacts"
input_size = [256, 320]
verify = false
device = "cpu"
"#;
        let c = DeployConfig::from_toml(toml).unwrap();
        assert_eq!(c.checkpoint_dir, PathBuf::from("/tmp/snapshots"));
        assert_eq!(c.input_size, (256, 320));
        assert!(!c.verify);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let c = DeployConfig::from_toml("checkpoint_dir = \"/x\"").unwrap();
        assert_eq!(c.checkpoint_dir, PathBuf::from("/x"));
        assert_eq!(c.input_size, (512, 512));
        assert!(c.verify);
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let c = DeployConfig::default();
        let toml = c.to_toml().unwrap();
        let back = DeployConfig::from_toml(&toml).unwrap();
        assert_eq!(back.input_size, c.input_size);
        assert_eq!(back.device, c.device);
    }

    #[test]
    fn test_parse_device() {
        let c = DeployConfig::default();
        assert_eq!(c.parse_device().unwrap(), Device::Cpu);

        let bad = DeployConfig {
            device: "cuda".into(),
            ..Default::default()
        };
        assert!(bad.parse_device().is_err());
    }
}
