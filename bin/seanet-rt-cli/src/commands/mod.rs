// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and shared CLI plumbing.

pub mod export;
pub mod infer;
pub mod inspect;

use deploy::DeployConfig;
use std::path::Path;

/// Initializes the tracing subscriber from the `-v` count.
///
/// `RUST_LOG` takes precedence over the verbosity flags when set.
pub fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Loads the pipeline configuration: the given TOML file, or defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<DeployConfig> {
    match path {
        Some(path) => {
            let config = DeployConfig::from_file(path)?;
            tracing::info!("loaded configuration from '{}'", path.display());
            Ok(config)
        }
        None => Ok(DeployConfig::default()),
    }
}

/// Truncates a string to `max_len` with ellipsis if needed.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}
