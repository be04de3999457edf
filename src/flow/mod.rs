// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! Flow documents
//!
//! The JSON side of the codec: document structures, the value codec, the
//! encoder and decoder, structural validation and the step graph.

mod decoder;
mod document;
mod encoder;
mod fingerprint;
mod graph;
mod reference;
mod validation;
mod value;

pub use decoder::decode_flow;
pub use document::*;
pub use encoder::{encode_flow, FlowEncoder};
pub use fingerprint::{fingerprint, FlowHasher};
pub use graph::{Dependency, StepGraph};
pub use reference::DataRef;
pub use validation::{FlowValidator, ValidationReport};
pub use value::{decode_value, encode_value, PICKLE_ENCODING};
