// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Execution device selection.
//!
//! The device is an explicit configuration value threaded through every
//! component call — there is no ambient "current device" process state.
//! Only the CPU backend is built in; the type exists so model placement
//! and artifact execution name their target explicitly and accelerator
//! backends can slot in without touching call sites.

/// The device a model or graph executes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Host CPU (the only resident backend).
    #[default]
    Cpu,
}

impl Device {
    /// Parses a device name as it appears in configuration files.
    ///
    /// Returns `None` for backends that are not built into this binary.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cpu" => Some(Device::Cpu),
            _ => None,
        }
    }

    /// Returns the canonical device name.
    pub fn as_str(self) -> &'static str {
        match self {
            Device::Cpu => "cpu",
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Device::parse("cpu"), Some(Device::Cpu));
        assert_eq!(Device::parse("CPU"), Some(Device::Cpu));
        assert_eq!(Device::parse("cuda"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Device::Cpu), "cpu");
    }
}
