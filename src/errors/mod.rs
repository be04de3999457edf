// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! Error types for flow encoding and decoding
//!
//! Every failure aborts the whole encode or decode call. Messages name the
//! offending step index (or the location of the unit in the transform graph)
//! together with the expectation that was violated.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for sklearn-flow operations
pub type FlowResult<T> = Result<T, FlowError>;

/// Main error type for sklearn-flow
#[derive(Error, Debug, Diagnostic)]
pub enum FlowError {
    // ─────────────────────────────────────────────────────────────────────────
    // Encoding Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Encountered an already fitted estimator '{class_path}' at {location}")]
    #[diagnostic(
        code(sklearn_flow::already_configured),
        help("A flow describes an unfitted template. Encode the pipeline before fitting it.")
    )]
    AlreadyConfigured { class_path: String, location: String },

    #[error("Unnamed transform at {location}")]
    #[diagnostic(
        code(sklearn_flow::unnamed_step),
        help("Every pipeline step and union child needs a non-empty name")
    )]
    UnnamedStep { location: String },

    #[error("{}", nesting_message(.limit, .step))]
    #[diagnostic(
        code(sklearn_flow::nesting_too_deep),
        help("Raise `max_depth` in the codec configuration if the graph really is this deep")
    )]
    NestingTooDeep { limit: usize, step: Option<usize> },

    // ─────────────────────────────────────────────────────────────────────────
    // Value Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Invalid hyper-parameter value encoding: {encoding}")]
    #[diagnostic(
        code(sklearn_flow::unknown_encoding),
        help("Only the 'pickle' fallback encoding is supported")
    )]
    UnknownEncoding { encoding: String },

    #[error("Invalid encoded hyper-parameter value: {reason}")]
    #[diagnostic(code(sklearn_flow::invalid_encoded_value))]
    InvalidEncodedValue { reason: String },

    #[error("Invalid value for hyper-parameter '{name}' of step {step}: {source}")]
    #[diagnostic(code(sklearn_flow::invalid_hyperparam_value))]
    InvalidHyperparamValue {
        step: usize,
        name: String,
        #[source]
        source: Box<FlowError>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Document Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Invalid step type for step {step}: {step_type}")]
    #[diagnostic(
        code(sklearn_flow::invalid_step_type),
        help("Supported step types: SKLEARN, SUBPIPELINE")
    )]
    InvalidStepType { step: usize, step_type: String },

    #[error("Invalid hyper-parameter type for hyper-parameter '{name}' of step {step}: {hyperparam_type}")]
    #[diagnostic(
        code(sklearn_flow::invalid_hyperparam_type),
        help("Supported hyper-parameter types: VALUE, STEP")
    )]
    InvalidHyperparamType {
        step: usize,
        name: String,
        hyperparam_type: String,
    },

    #[error("{}", structural_message(.step, .reason))]
    #[diagnostic(code(sklearn_flow::structural_mismatch))]
    StructuralMismatch { step: Option<usize>, reason: String },

    #[error("Hyper-parameter '{name}' of step {step} references step {target}, but the flow has {len} steps")]
    #[diagnostic(code(sklearn_flow::invalid_step_reference))]
    InvalidStepReference {
        step: usize,
        name: String,
        target: usize,
        len: usize,
    },

    #[error("Cyclic step references between steps {}", join_indices(.steps))]
    #[diagnostic(
        code(sklearn_flow::cyclic_step_reference),
        help("Only acyclic graphs of nested containers can be represented as a flow")
    )]
    CyclicStepReference { steps: Vec<usize> },

    #[error("Cannot resolve estimator class '{class_path}' for step {step}")]
    #[diagnostic(
        code(sklearn_flow::unresolvable_class),
        help("Register the class with the TransformRegistry used for decoding")
    )]
    UnresolvableClass { step: usize, class_path: String },

    #[error("Invalid parameter '{name}' for '{class_path}': {reason}")]
    #[diagnostic(code(sklearn_flow::invalid_parameter))]
    InvalidParameter {
        class_path: String,
        name: String,
        reason: String,
    },

    #[error("Invalid pipeline description: {reason}")]
    #[diagnostic(
        code(sklearn_flow::invalid_description),
        help("Every transform needs a 'class', or 'steps' for a nested pipeline")
    )]
    InvalidDescription { reason: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Schema Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Flow document does not conform to its schema: {}", .errors.join("; "))]
    #[diagnostic(code(sklearn_flow::schema_violation))]
    SchemaViolation { errors: Vec<String> },

    #[error("Schema is unavailable: {reason}")]
    #[diagnostic(code(sklearn_flow::schema_unavailable))]
    SchemaUnavailable { reason: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Invalid configuration in '{path}': {message}")]
    #[diagnostic(
        code(sklearn_flow::config_error),
        help("Known keys: schema, library_version, max_depth, strict")
    )]
    ConfigError { path: PathBuf, message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(sklearn_flow::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Failed to write file '{path}': {error}")]
    #[diagnostic(code(sklearn_flow::file_write_error))]
    FileWriteError { path: PathBuf, error: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(sklearn_flow::io_error))]
    Io { message: String },

    #[error("JSON error: {message}")]
    #[diagnostic(code(sklearn_flow::json_error))]
    Json { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(sklearn_flow::yaml_error))]
    Yaml { message: String },

    #[error("TOML parsing error: {message}")]
    #[diagnostic(code(sklearn_flow::toml_error))]
    Toml { message: String },
}

fn structural_message(step: &Option<usize>, reason: &str) -> String {
    match step {
        Some(step) => format!("Invalid flow at step {}: {}", step, reason),
        None => format!("Invalid flow: {}", reason),
    }
}

fn nesting_message(limit: &usize, step: &Option<usize>) -> String {
    match step {
        Some(step) => format!(
            "Transform graph nesting exceeds the limit of {} levels at step {}",
            limit, step
        ),
        None => format!("Transform graph nesting exceeds the limit of {} levels", limit),
    }
}

fn join_indices(steps: &[usize]) -> String {
    steps
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<std::io::Error> for FlowError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for FlowError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<toml::de::Error> for FlowError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl FlowError {
    /// Structural problem located at a specific step
    pub fn at_step(step: usize, reason: impl Into<String>) -> Self {
        Self::StructuralMismatch {
            step: Some(step),
            reason: reason.into(),
        }
    }

    /// Structural problem concerning the document as a whole
    pub fn document(reason: impl Into<String>) -> Self {
        Self::StructuralMismatch {
            step: None,
            reason: reason.into(),
        }
    }

    /// Attach a value codec failure to the hyperparameter it came from
    pub fn in_hyperparam(self, step: usize, name: impl Into<String>) -> Self {
        Self::InvalidHyperparamValue {
            step,
            name: name.into(),
            source: Box::new(self),
        }
    }

    /// Problem in a YAML pipeline description
    pub fn description(reason: impl Into<String>) -> Self {
        Self::InvalidDescription {
            reason: reason.into(),
        }
    }

    /// Step index this error is attached to, if any
    pub fn step(&self) -> Option<usize> {
        match self {
            Self::InvalidStepType { step, .. }
            | Self::InvalidHyperparamType { step, .. }
            | Self::InvalidStepReference { step, .. }
            | Self::InvalidHyperparamValue { step, .. }
            | Self::UnresolvableClass { step, .. } => Some(*step),
            Self::StructuralMismatch { step, .. } | Self::NestingTooDeep { step, .. } => *step,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_message_names_step() {
        let err = FlowError::at_step(3, "Missing step name");
        assert_eq!(err.to_string(), "Invalid flow at step 3: Missing step name");
        assert_eq!(err.step(), Some(3));

        let err = FlowError::document("Invalid number of pipeline inputs: 2");
        assert_eq!(err.to_string(), "Invalid flow: Invalid number of pipeline inputs: 2");
        assert_eq!(err.step(), None);
    }

    #[test]
    fn test_value_error_names_hyperparam() {
        let err = FlowError::UnknownEncoding {
            encoding: "json".into(),
        }
        .in_hyperparam(1, "C");

        assert_eq!(
            err.to_string(),
            "Invalid value for hyper-parameter 'C' of step 1: Invalid hyper-parameter value encoding: json"
        );
        assert_eq!(err.step(), Some(1));
    }

    #[test]
    fn test_nesting_message_names_step() {
        let err = FlowError::NestingTooDeep {
            limit: 4,
            step: Some(2),
        };
        assert_eq!(
            err.to_string(),
            "Transform graph nesting exceeds the limit of 4 levels at step 2"
        );
        assert_eq!(err.step(), Some(2));
    }

    #[test]
    fn test_cycle_message_lists_steps() {
        let err = FlowError::CyclicStepReference { steps: vec![1, 4] };
        assert_eq!(err.to_string(), "Cyclic step references between steps 1, 4");
    }
}
