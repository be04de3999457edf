// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! Step encoder
//!
//! Flattens a transform graph into one append-only step list. Nested
//! transforms and union children are appended before the step that
//! references them and are addressed only by index; the top-level chain is
//! linked through data references.

use std::collections::BTreeMap;

use super::{encode_value, DataRef, Flow, Hyperparameter, Step};
use crate::config::CodecConfig;
use crate::errors::{FlowError, FlowResult};
use crate::transform::{
    ParamValue, Params, Pipeline, Transform, TRANSFORMERS, TRANSFORMER_COLUMNS, TRANSFORMER_LIST,
};

/// Encode a pipeline into a flow document
pub fn encode_flow(pipeline: &Pipeline, config: &CodecConfig) -> FlowResult<Flow> {
    if let Some((class_path, location)) = pipeline.find_configured() {
        return Err(FlowError::AlreadyConfigured {
            class_path,
            location,
        });
    }
    if let Some(location) = pipeline.find_unnamed() {
        return Err(FlowError::UnnamedStep { location });
    }

    let flow = encode_pipeline(pipeline, config, 0)?;

    tracing::info!(
        steps = flow.steps.len(),
        output = %flow.outputs[0].data,
        "Encoded pipeline"
    );

    Ok(flow)
}

fn encode_pipeline(pipeline: &Pipeline, config: &CodecConfig, depth: usize) -> FlowResult<Flow> {
    let mut encoder = FlowEncoder::at_depth(config, depth);
    let mut cursor = DataRef::Input;

    for (name, transform) in &pipeline.steps {
        let index = encoder.encode_unit(transform, Some(name.as_str()), Some(&cursor))?;
        cursor = DataRef::Step(index);
    }

    Ok(Flow::new(&config.schema, encoder.into_steps(), &cursor))
}

/// Owns the step list of one encoding pass
#[derive(Debug)]
pub struct FlowEncoder<'c> {
    config: &'c CodecConfig,
    steps: Vec<Step>,
    depth: usize,
}

impl<'c> FlowEncoder<'c> {
    /// Create an encoder with an empty step list
    pub fn new(config: &'c CodecConfig) -> Self {
        Self::at_depth(config, 0)
    }

    fn at_depth(config: &'c CodecConfig, depth: usize) -> Self {
        Self {
            config,
            steps: Vec::new(),
            depth,
        }
    }

    /// Append `transform` (and everything it references) and return the index
    /// of its own step.
    ///
    /// With an `input` the step becomes a chain member reading from that
    /// reference; without one it is detached. Nothing is appended when the
    /// transform or anything below it is already fitted.
    pub fn encode(
        &mut self,
        transform: &Transform,
        name: Option<&str>,
        input: Option<&DataRef>,
    ) -> FlowResult<usize> {
        let root = name.unwrap_or_else(|| transform.class_path());
        if let Some((class_path, location)) = transform.find_configured(root) {
            return Err(FlowError::AlreadyConfigured {
                class_path,
                location,
            });
        }
        if name == Some("") {
            return Err(FlowError::UnnamedStep {
                location: transform.class_path().to_string(),
            });
        }
        if let Some(location) = transform.find_unnamed(root) {
            return Err(FlowError::UnnamedStep { location });
        }

        self.encode_unit(transform, name, input)
    }

    /// Steps appended so far
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<Step> {
        self.steps
    }

    fn encode_unit(
        &mut self,
        transform: &Transform,
        name: Option<&str>,
        input: Option<&DataRef>,
    ) -> FlowResult<usize> {
        if self.depth >= self.config.max_depth {
            return Err(FlowError::NestingTooDeep {
                limit: self.config.max_depth,
                step: None,
            });
        }

        self.depth += 1;
        let step = self.build_step(transform);
        self.depth -= 1;

        let step = step?.with_name(name).with_input(input);
        Ok(self.push(step))
    }

    fn build_step(&mut self, transform: &Transform) -> FlowResult<Step> {
        let step = match transform {
            Transform::Estimator(estimator) => {
                let hyperparams = self.encode_params(&estimator.params, &[])?;
                self.sklearn_step(&estimator.class_path)
                    .with_hyperparams(hyperparams)
            }
            Transform::Pipeline(pipeline) => {
                Step::subpipeline(encode_pipeline(pipeline, self.config, self.depth)?)
            }
            Transform::FeatureUnion(union) => {
                let mut hyperparams = self.encode_params(&union.params, &[TRANSFORMER_LIST])?;

                let children = union
                    .transformer_list
                    .iter()
                    .map(|(name, child)| self.encode_unit(child, Some(name.as_str()), None))
                    .collect::<FlowResult<Vec<_>>>()?;

                hyperparams.insert(TRANSFORMER_LIST.to_string(), Hyperparameter::steps(children));
                self.sklearn_step(&union.class_path)
                    .with_hyperparams(hyperparams)
            }
            Transform::ColumnTransformer(columns) => {
                let mut hyperparams =
                    self.encode_params(&columns.params, &[TRANSFORMERS, TRANSFORMER_COLUMNS])?;

                let mut children = Vec::with_capacity(columns.transformers.len());
                let mut selectors = Vec::with_capacity(columns.transformers.len());
                for (name, child, selector) in &columns.transformers {
                    children.push(self.encode_unit(child, Some(name.as_str()), None)?);
                    selectors.push(selector.clone());
                }

                hyperparams.insert(TRANSFORMERS.to_string(), Hyperparameter::steps(children));
                hyperparams.insert(
                    TRANSFORMER_COLUMNS.to_string(),
                    Hyperparameter::value(encode_value(&ParamValue::List(selectors))?),
                );
                self.sklearn_step(&columns.class_path)
                    .with_hyperparams(hyperparams)
            }
        };

        Ok(step)
    }

    fn sklearn_step(&self, class_path: &str) -> Step {
        Step::sklearn(class_path, &self.config.library_version)
    }

    /// Encode ordinary parameters; nested transforms become step references
    fn encode_params(
        &mut self,
        params: &Params,
        reserved: &[&str],
    ) -> FlowResult<BTreeMap<String, Hyperparameter>> {
        let mut hyperparams = BTreeMap::new();

        for (name, value) in params {
            if reserved.contains(&name.as_str()) {
                tracing::warn!(param = %name, "Ignoring parameter shadowing a composite parameter");
                continue;
            }

            let hyperparam = if let Some(transform) = value.as_transform() {
                Hyperparameter::step(self.encode_unit(transform, None, None)?)
            } else if let Some(transforms) = value.as_transform_list() {
                let indices = transforms
                    .into_iter()
                    .map(|t| self.encode_unit(t, None, None))
                    .collect::<FlowResult<Vec<_>>>()?;
                Hyperparameter::steps(indices)
            } else {
                Hyperparameter::value(encode_value(value)?)
            };

            hyperparams.insert(name.clone(), hyperparam);
        }

        Ok(hyperparams)
    }

    fn push(&mut self, step: Step) -> usize {
        let index = self.steps.len();
        tracing::debug!(index, step = %step.label(), "Appended step");
        self.steps.push(step);
        index
    }
}
