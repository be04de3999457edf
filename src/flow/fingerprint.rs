// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! Content fingerprints
//!
//! Uses BLAKE3 over the canonical JSON of a flow with every document `id`
//! removed, so two encodings of the same graph hash the same.

use blake3::Hasher;
use serde_json::Value;

use super::Flow;
use crate::errors::FlowResult;

/// Incremental hasher for flow documents
pub struct FlowHasher {
    hasher: Hasher,
}

impl FlowHasher {
    pub fn new() -> Self {
        Self {
            hasher: Hasher::new(),
        }
    }

    /// Feed one flow into the hash
    pub fn update_flow(&mut self, flow: &Flow) -> FlowResult<()> {
        let mut value = flow.to_value()?;
        strip_ids(&mut value);

        // serde_json maps are ordered, so this rendering is canonical
        let canonical = serde_json::to_string(&value)?;
        self.hasher.update(canonical.as_bytes());
        Ok(())
    }

    /// Hash arbitrary bytes
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Finalize and get the hex digest
    pub fn finalize(self) -> String {
        self.hasher.finalize().to_hex().to_string()
    }
}

impl Default for FlowHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute the id-independent fingerprint of a flow
pub fn fingerprint(flow: &Flow) -> FlowResult<String> {
    let mut hasher = FlowHasher::new();
    hasher.update_flow(flow)?;
    Ok(hasher.finalize())
}

/// Remove the `id` of this document and of every embedded one
fn strip_ids(document: &mut Value) {
    let Some(object) = document.as_object_mut() else {
        return;
    };
    object.remove("id");

    if let Some(Value::Array(steps)) = object.get_mut("steps") {
        for step in steps {
            if let Some(embedded) = step.get_mut("pipeline") {
                strip_ids(embedded);
            }
        }
    }
}
