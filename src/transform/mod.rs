// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! Transform units
//!
//! The in-memory side of the codec: estimators, pipelines, the two union
//! shapes and the registry that rebuilds them from class paths.

mod definition;
mod describe;
mod registry;
mod value;

pub use definition::*;
pub use registry::{
    with_allowed_params, Construction, Registration, TransformFactory, TransformKind,
    TransformRegistry,
};
pub use value::{ParamValue, Params};
