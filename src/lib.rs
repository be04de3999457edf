// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! # sklearn-flow - Pipeline Flow Codec
//!
//! `sklearn-flow` converts scikit-learn style pipelines into self-contained
//! JSON flow documents and rebuilds equivalent pipelines from them.
//!
//! ## Features
//!
//! - **Flattening** - Nested pipelines, feature unions and column transformers
//!   become one reference-linked step list
//! - **Fidelity** - Values without a JSON form are wrapped, never dropped
//! - **Validation** - Structural checks before decoding, JSON Schema on demand
//! - **Registry** - Class paths resolve through an explicit constructor table
//!
//! ## Quick Start
//!
//! ```bash
//! # Encode a pipeline description
//! sklearn-flow encode titanic.yaml > flow.json
//!
//! # Validate and rebuild it
//! sklearn-flow validate flow.json
//! sklearn-flow decode flow.json
//! ```

pub mod cli;
pub mod codec;
pub mod config;
pub mod errors;
pub mod flow;
pub mod schema;
pub mod transform;
pub mod utils;

// Re-export commonly used types
pub use codec::{from_flow, to_flow, FlowCodec};
pub use config::CodecConfig;
pub use errors::{FlowError, FlowResult};
pub use flow::Flow;
pub use transform::{
    ColumnTransformer, Estimator, FeatureUnion, ParamValue, Pipeline, Transform, TransformRegistry,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
