// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! JSON Schema validation of flow documents
//!
//! The codec only relies on the [`SchemaValidator`] trait. With the
//! `schema-validation` feature a `jsonschema` backed implementation is
//! available together with a bundled draft-07 schema of the document.

use serde_json::Value;
use std::path::Path;

use crate::errors::{FlowError, FlowResult};
use crate::flow::Flow;

/// Bundled schema of the flow document
pub const BUNDLED_SCHEMA: &str = include_str!("../../schemas/pipeline.json");

/// Checks a document against a schema
pub trait SchemaValidator {
    /// Validate a JSON document, listing every violation on failure
    fn validate(&self, document: &Value) -> FlowResult<()>;

    /// Validate a flow document
    fn validate_flow(&self, flow: &Flow) -> FlowResult<()> {
        self.validate(&flow.to_value()?)
    }
}

/// Parse the bundled schema
pub fn bundled_schema() -> FlowResult<Value> {
    serde_json::from_str(BUNDLED_SCHEMA).map_err(|e| FlowError::SchemaUnavailable {
        reason: e.to_string(),
    })
}

/// Load a schema document from a file
pub fn load_schema(path: &Path) -> FlowResult<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| FlowError::FileReadError {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    serde_json::from_str(&content).map_err(|e| FlowError::SchemaUnavailable {
        reason: format!("{}: {}", path.display(), e),
    })
}

#[cfg(feature = "schema-validation")]
pub use self::json_schema::JsonSchemaValidator;

#[cfg(feature = "schema-validation")]
mod json_schema {
    use jsonschema::{Draft, JSONSchema};
    use serde_json::Value;

    use super::SchemaValidator;
    use crate::errors::{FlowError, FlowResult};

    /// Validator compiled from a JSON Schema document
    pub struct JsonSchemaValidator {
        schema: JSONSchema,
    }

    impl JsonSchemaValidator {
        /// Compile `schema` (draft-07)
        pub fn new(schema: &Value) -> FlowResult<Self> {
            let schema = JSONSchema::options()
                .with_draft(Draft::Draft7)
                .compile(schema)
                .map_err(|e| FlowError::SchemaUnavailable {
                    reason: e.to_string(),
                })?;

            Ok(Self { schema })
        }

        /// Validator for the bundled flow schema
        pub fn bundled() -> FlowResult<Self> {
            Self::new(&super::bundled_schema()?)
        }
    }

    impl SchemaValidator for JsonSchemaValidator {
        fn validate(&self, document: &Value) -> FlowResult<()> {
            self.schema.validate(document).map_err(|errors| {
                let errors = errors
                    .map(|e| {
                        let path = e.instance_path.to_string();
                        if path.is_empty() {
                            e.to_string()
                        } else {
                            format!("{}: {}", path, e)
                        }
                    })
                    .collect();
                FlowError::SchemaViolation { errors }
            })
        }
    }
}
