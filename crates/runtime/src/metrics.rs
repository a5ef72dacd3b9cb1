// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Execution profiling metrics.
//!
//! [`ExecutionMetrics`] collects per-node and aggregate timing for one
//! artifact execution. Verification runs log the summary so slow or
//! degenerate graphs are visible in batch output.

use std::time::Duration;

/// Metrics for a single node's execution.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NodeMetrics {
    /// Node name.
    pub node_name: String,
    /// Op label (e.g., `"conv2d"`).
    pub op: &'static str,
    /// Time spent executing the node's kernel.
    pub duration: Duration,
}

/// Aggregate metrics for a complete artifact execution.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ExecutionMetrics {
    /// Total wall-clock time for the execution.
    pub total_duration: Duration,
    /// Per-node metrics in execution order.
    pub node_metrics: Vec<NodeMetrics>,
}

impl ExecutionMetrics {
    /// Creates an empty metrics container.
    pub fn new() -> Self {
        Self {
            total_duration: Duration::ZERO,
            node_metrics: Vec::new(),
        }
    }

    /// Records metrics for a single node.
    pub fn record_node(&mut self, name: String, op: &'static str, duration: Duration) {
        self.node_metrics.push(NodeMetrics {
            node_name: name,
            op,
            duration,
        });
    }

    /// Finalises metrics with the total wall-clock time.
    pub fn finalise(&mut self, total: Duration) {
        self.total_duration = total;
    }

    /// Returns the slowest node, if any were recorded.
    pub fn slowest_node(&self) -> Option<&NodeMetrics> {
        self.node_metrics.iter().max_by_key(|n| n.duration)
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        let slowest = self
            .slowest_node()
            .map(|n| {
                format!(
                    ", slowest '{}' ({}) {:.2}ms",
                    n.node_name,
                    n.op,
                    n.duration.as_secs_f64() * 1000.0,
                )
            })
            .unwrap_or_default();
        format!(
            "Execution: {:.2}ms total, {} nodes{}",
            self.total_duration.as_secs_f64() * 1000.0,
            self.node_metrics.len(),
            slowest,
        )
    }
}

impl Default for ExecutionMetrics {
    fn default() -> Self {
        Self::new()
    }
}
