// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # runtime
//!
//! Executes portable graph artifacts in an independent session.
//!
//! This crate never touches the architecture's own forward code: it
//! opens a `.sng` artifact (memory-mapped), validates the embedded
//! manifest, and interprets the graph node by node with the shared
//! `tensor-core` kernels. The conversion pipeline uses it to cross-check
//! exported artifacts; deployments use it to serve them.
//!
//! # Example
//! ```no_run
//! use runtime::GraphExecutor;
//! use std::path::Path;
//! use tensor_core::{DType, Device, Shape, Tensor};
//!
//! let session = GraphExecutor::open(Path::new("unet_epoch_80.sng"), Device::Cpu).unwrap();
//! let input = Tensor::zeros(session.input_shape(1), DType::F32);
//! let run = session.execute(&input).unwrap();
//! println!("{}", run.metrics.summary());
//! ```

mod error;
mod executor;
mod metrics;

pub use error::RuntimeError;
pub use executor::{ExecutionOutput, GraphExecutor};
pub use metrics::{ExecutionMetrics, NodeMetrics};
