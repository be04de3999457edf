// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! Flow document structures
//!
//! Defines the JSON shape of a flow: one input, one output and a flat list of
//! steps linked by data references and step references.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use super::DataRef;
use crate::errors::{FlowError, FlowResult};

/// Schema the documents produced by this crate conform to
pub const FLOW_SCHEMA: &str = "https://openml.github.io/flow2/schemas/v0/pipeline.json";

/// Name of the single document input
pub const INPUT_NAME: &str = "pipeline input";

/// Name of the single document output
pub const OUTPUT_NAME: &str = "pipeline output";

/// Argument key carrying a chain step's input
pub const INPUT_ARGUMENT: &str = "input";

/// Argument type of a chain step's input
pub const CONTAINER: &str = "CONTAINER";

/// Output id of a chain step
pub const OUTPUT_ID: &str = "output";

/// A flow document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    /// Document shape contract
    pub schema: String,

    /// Fresh identifier of this encoding
    pub id: String,

    /// Document inputs (exactly one when well formed)
    pub inputs: Vec<FlowInput>,

    /// Document outputs (exactly one when well formed)
    pub outputs: Vec<FlowOutput>,

    /// Steps; position is the address used by step references
    pub steps: Vec<Step>,
}

impl Flow {
    /// Create a document around `steps` whose output is `output`
    pub fn new(schema: impl Into<String>, steps: Vec<Step>, output: &DataRef) -> Self {
        Self {
            schema: schema.into(),
            id: uuid::Uuid::new_v4().to_string(),
            inputs: vec![FlowInput {
                name: INPUT_NAME.to_string(),
            }],
            outputs: vec![FlowOutput {
                name: OUTPUT_NAME.to_string(),
                data: output.to_string(),
            }],
            steps,
        }
    }

    /// Load a document from a JSON file
    pub fn from_file(path: &Path) -> FlowResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| FlowError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse a document from JSON
    pub fn from_json(json: &str) -> FlowResult<Self> {
        serde_json::from_str(json).map_err(Into::into)
    }

    /// Build a document from an already parsed JSON value
    pub fn from_value(value: Value) -> FlowResult<Self> {
        serde_json::from_value(value).map_err(Into::into)
    }

    /// Serialize to compact JSON
    pub fn to_json(&self) -> FlowResult<String> {
        serde_json::to_string(self).map_err(Into::into)
    }

    /// Serialize to indented JSON
    pub fn to_json_pretty(&self) -> FlowResult<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }

    /// Serialize to a JSON value
    pub fn to_value(&self) -> FlowResult<Value> {
        serde_json::to_value(self).map_err(Into::into)
    }

    /// Declared output reference, if the document has exactly one output
    pub fn output_reference(&self) -> Option<&str> {
        match self.outputs.as_slice() {
            [output] => Some(&output.data),
            _ => None,
        }
    }

    /// Indices of the steps that form the top-level chain
    pub fn chain(&self) -> Vec<usize> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, step)| step.is_chain_member())
            .map(|(i, _)| i)
            .collect()
    }
}

/// Named document input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowInput {
    pub name: String,
}

/// Named document output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowOutput {
    pub name: String,

    /// Data reference of the final chain step
    pub data: String,
}

/// Step type tag
///
/// Unknown tags are kept so the decoder can report them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepType {
    /// Leaf estimator (also used for the union containers)
    Sklearn,
    /// Embedded independent flow
    Subpipeline,
    /// Anything else
    Other(String),
}

impl From<String> for StepType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "SKLEARN" => Self::Sklearn,
            "SUBPIPELINE" => Self::Subpipeline,
            _ => Self::Other(s),
        }
    }
}

impl From<StepType> for String {
    fn from(t: StepType) -> Self {
        t.to_string()
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sklearn => write!(f, "SKLEARN"),
            Self::Subpipeline => write!(f, "SUBPIPELINE"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Estimator reference of a `SKLEARN` step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatorRef {
    /// Fully-qualified class path
    pub python_path: String,

    /// Version of the transform library that wrote the step
    pub version: String,
}

/// One entry of a flow's step list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(rename = "type")]
    pub step_type: StepType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimator: Option<EstimatorRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyperparams: Option<BTreeMap<String, Hyperparameter>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<Box<Flow>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<BTreeMap<String, Argument>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<StepOutput>>,
}

impl Step {
    /// A `SKLEARN` step for `class_path`
    pub fn sklearn(class_path: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            step_type: StepType::Sklearn,
            name: None,
            estimator: Some(EstimatorRef {
                python_path: class_path.into(),
                version: version.into(),
            }),
            hyperparams: None,
            pipeline: None,
            arguments: None,
            outputs: None,
        }
    }

    /// A `SUBPIPELINE` step embedding `flow`
    pub fn subpipeline(flow: Flow) -> Self {
        Self {
            step_type: StepType::Subpipeline,
            name: None,
            estimator: None,
            hyperparams: None,
            pipeline: Some(Box::new(flow)),
            arguments: None,
            outputs: None,
        }
    }

    /// Set the step name (empty names are left out)
    pub fn with_name(mut self, name: Option<&str>) -> Self {
        self.name = name.filter(|n| !n.is_empty()).map(str::to_string);
        self
    }

    /// Set the hyperparameters (an empty set is left out)
    pub fn with_hyperparams(mut self, hyperparams: BTreeMap<String, Hyperparameter>) -> Self {
        self.hyperparams = (!hyperparams.is_empty()).then_some(hyperparams);
        self
    }

    /// Make this step a chain member reading from `input`
    pub fn with_input(mut self, input: Option<&DataRef>) -> Self {
        if let Some(input) = input {
            let mut arguments = BTreeMap::new();
            arguments.insert(
                INPUT_ARGUMENT.to_string(),
                Argument {
                    arg_type: CONTAINER.to_string(),
                    data: input.to_string(),
                },
            );
            self.arguments = Some(arguments);
            self.outputs = Some(vec![StepOutput {
                id: OUTPUT_ID.to_string(),
            }]);
        }
        self
    }

    /// Non-empty arguments
    pub fn arguments(&self) -> Option<&BTreeMap<String, Argument>> {
        self.arguments.as_ref().filter(|a| !a.is_empty())
    }

    /// Non-empty outputs
    pub fn outputs(&self) -> Option<&[StepOutput]> {
        self.outputs.as_deref().filter(|o| !o.is_empty())
    }

    /// Part of the top-level chain: carries both arguments and outputs
    pub fn is_chain_member(&self) -> bool {
        self.arguments().is_some() && self.outputs().is_some()
    }

    /// Declared input reference
    pub fn input_reference(&self) -> Option<&str> {
        self.arguments()
            .and_then(|a| a.get(INPUT_ARGUMENT))
            .map(|a| a.data.as_str())
    }

    /// Class path for `SKLEARN` steps
    pub fn class_path(&self) -> Option<&str> {
        self.estimator.as_ref().map(|e| e.python_path.as_str())
    }

    /// Step references made by this step's hyperparameters
    pub fn step_references(&self) -> impl Iterator<Item = (&str, StepRef)> + '_ {
        self.hyperparams
            .iter()
            .flatten()
            .filter(|(_, h)| h.hyperparam_type == HyperparamType::Step)
            .filter_map(|(name, h)| StepRef::parse(&h.data).map(|r| (name.as_str(), r)))
    }

    /// Short human label
    pub fn label(&self) -> String {
        let kind = match &self.step_type {
            StepType::Sklearn => self.class_path().unwrap_or("?").to_string(),
            StepType::Subpipeline => "subpipeline".to_string(),
            StepType::Other(t) => t.clone(),
        };

        match &self.name {
            Some(name) => format!("{} ({})", name, kind),
            None => kind,
        }
    }
}

/// Input argument of a chain step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    #[serde(rename = "type")]
    pub arg_type: String,

    /// Data reference
    pub data: String,
}

/// Output declaration of a chain step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutput {
    pub id: String,
}

/// Hyperparameter type tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HyperparamType {
    /// Inline literal or fallback-wrapped value
    Value,
    /// Reference into the step list
    Step,
    /// Anything else
    Other(String),
}

impl From<String> for HyperparamType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "VALUE" => Self::Value,
            "STEP" => Self::Step,
            _ => Self::Other(s),
        }
    }
}

impl From<HyperparamType> for String {
    fn from(t: HyperparamType) -> Self {
        t.to_string()
    }
}

impl fmt::Display for HyperparamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value => write!(f, "VALUE"),
            Self::Step => write!(f, "STEP"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

/// A hyperparameter entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameter {
    #[serde(rename = "type")]
    pub hyperparam_type: HyperparamType,

    pub data: Value,
}

impl Hyperparameter {
    /// Inline value
    pub fn value(data: Value) -> Self {
        Self {
            hyperparam_type: HyperparamType::Value,
            data,
        }
    }

    /// Reference to a single step
    pub fn step(index: usize) -> Self {
        Self {
            hyperparam_type: HyperparamType::Step,
            data: Value::from(index),
        }
    }

    /// Reference to a list of steps
    pub fn steps(indices: Vec<usize>) -> Self {
        Self {
            hyperparam_type: HyperparamType::Step,
            data: Value::from(indices),
        }
    }
}

/// Parsed data of a `STEP` hyperparameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepRef {
    Single(usize),
    List(Vec<usize>),
}

impl StepRef {
    /// Parse an index or a list of indices
    pub fn parse(data: &Value) -> Option<Self> {
        fn index(value: &Value) -> Option<usize> {
            value.as_u64().and_then(|i| usize::try_from(i).ok())
        }

        match data {
            Value::Array(items) => items.iter().map(index).collect::<Option<_>>().map(Self::List),
            other => index(other).map(Self::Single),
        }
    }

    /// Referenced indices in order
    pub fn indices(&self) -> &[usize] {
        match self {
            Self::Single(i) => std::slice::from_ref(i),
            Self::List(l) => l,
        }
    }
}
