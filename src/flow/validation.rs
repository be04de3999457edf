// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! Flow validation
//!
//! Structural checks run on a whole document before anything is decoded.
//! Embedded sub-pipelines are checked recursively.

use std::collections::BTreeSet;

use super::{
    DataRef, Flow, HyperparamType, Step, StepGraph, StepRef, StepType, CONTAINER, INPUT_ARGUMENT,
    OUTPUT_ID,
};
use crate::config::CodecConfig;
use crate::errors::{FlowError, FlowResult};

/// Flow validator
#[derive(Debug, Clone, Copy)]
pub struct FlowValidator<'c> {
    config: &'c CodecConfig,
}

impl<'c> FlowValidator<'c> {
    pub fn new(config: &'c CodecConfig) -> Self {
        Self { config }
    }

    /// Validate a flow document.
    ///
    /// The first violation is returned as an error; conditions the decoder
    /// can live with are collected as warnings.
    pub fn validate(&self, flow: &Flow) -> FlowResult<ValidationReport> {
        let mut report = ValidationReport::new();
        self.validate_at(flow, 0, None, "", &mut report)?;
        Ok(report)
    }

    fn validate_at(
        &self,
        flow: &Flow,
        depth: usize,
        parent: Option<usize>,
        prefix: &str,
        report: &mut ValidationReport,
    ) -> FlowResult<()> {
        if depth >= self.config.max_depth {
            return Err(FlowError::NestingTooDeep {
                limit: self.config.max_depth,
                step: parent,
            });
        }

        if flow.inputs.len() != 1 {
            return Err(FlowError::document(format!(
                "Invalid number of pipeline inputs: {}",
                flow.inputs.len()
            )));
        }
        if flow.outputs.len() != 1 {
            return Err(FlowError::document(format!(
                "Invalid number of pipeline outputs: {}",
                flow.outputs.len()
            )));
        }

        if flow.schema != self.config.schema {
            report.add_warning(format!(
                "{}Document schema '{}' differs from '{}'",
                prefix, flow.schema, self.config.schema
            ));
        }

        for (index, step) in flow.steps.iter().enumerate() {
            self.validate_step(flow, index, step)?;
        }

        let chain = self.validate_chain(flow)?;

        let graph = StepGraph::build(flow);
        graph.check_acyclic()?;

        let orphans = graph.orphans();
        if let Some(&orphan) = orphans.first() {
            if self.config.strict {
                return Err(FlowError::at_step(
                    orphan,
                    "Step is neither part of the pipeline nor referenced by another step",
                ));
            }
        }
        for &orphan in &orphans {
            tracing::warn!(step = orphan, "Ignoring unreferenced step");
            report.add_warning(format!(
                "{}Step {} is neither part of the pipeline nor referenced by another step",
                prefix, orphan
            ));
        }

        self.check_versions(flow, prefix, report);

        for (index, step) in flow.steps.iter().enumerate() {
            if let Some(embedded) = &step.pipeline {
                let nested = format!("{}step {}: ", prefix, index);
                self.validate_at(embedded, depth + 1, Some(index), &nested, report)?;
            }
        }

        if depth == 0 {
            report.chain = chain;
            report.orphans = orphans;
        }

        Ok(())
    }

    /// Step tag, payload and hyperparameter checks
    fn validate_step(&self, flow: &Flow, index: usize, step: &Step) -> FlowResult<()> {
        match &step.step_type {
            StepType::Sklearn if step.estimator.is_none() => {
                return Err(FlowError::at_step(index, "SKLEARN step without estimator"));
            }
            StepType::Subpipeline if step.pipeline.is_none() => {
                return Err(FlowError::at_step(index, "SUBPIPELINE step without pipeline"));
            }
            StepType::Other(step_type) => {
                return Err(FlowError::InvalidStepType {
                    step: index,
                    step_type: step_type.clone(),
                });
            }
            _ => {}
        }

        for (name, hyperparam) in step.hyperparams.iter().flatten() {
            match &hyperparam.hyperparam_type {
                HyperparamType::Value => {}
                HyperparamType::Step => {
                    let reference = StepRef::parse(&hyperparam.data).ok_or_else(|| {
                        FlowError::at_step(
                            index,
                            format!(
                                "Invalid step reference for hyper-parameter '{}': {}",
                                name, hyperparam.data
                            ),
                        )
                    })?;

                    if let Some(&target) =
                        reference.indices().iter().find(|&&t| t >= flow.steps.len())
                    {
                        return Err(FlowError::InvalidStepReference {
                            step: index,
                            name: name.clone(),
                            target,
                            len: flow.steps.len(),
                        });
                    }
                }
                HyperparamType::Other(hyperparam_type) => {
                    return Err(FlowError::InvalidHyperparamType {
                        step: index,
                        name: name.clone(),
                        hyperparam_type: hyperparam_type.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Argument, output and reference chain checks; returns the chain
    fn validate_chain(&self, flow: &Flow) -> FlowResult<Vec<usize>> {
        let mut chain = Vec::new();
        let mut cursor = DataRef::Input.to_string();

        for (index, step) in flow.steps.iter().enumerate() {
            let arguments = step.arguments();
            let outputs = step.outputs();

            if let Some(arguments) = arguments {
                let input = match arguments.get(INPUT_ARGUMENT) {
                    Some(input) if arguments.len() == 1 => input,
                    _ => {
                        let keys: Vec<&str> = arguments.keys().map(String::as_str).collect();
                        return Err(FlowError::at_step(
                            index,
                            format!("Invalid step arguments: [{}]", keys.join(", ")),
                        ));
                    }
                };

                if input.arg_type != CONTAINER {
                    return Err(FlowError::at_step(
                        index,
                        format!("Invalid input type: {}", input.arg_type),
                    ));
                }

                if input.data != cursor {
                    return Err(FlowError::at_step(
                        index,
                        format!(
                            "Expected input data reference '{}' does not match provided input data reference '{}'",
                            cursor, input.data
                        ),
                    ));
                }
            }

            if let Some(outputs) = outputs {
                match outputs {
                    [output] if output.id == OUTPUT_ID => {}
                    [output] => {
                        return Err(FlowError::at_step(
                            index,
                            format!("Invalid output data id: {}", output.id),
                        ));
                    }
                    _ => {
                        return Err(FlowError::at_step(
                            index,
                            format!("Invalid number of step outputs: {}", outputs.len()),
                        ));
                    }
                }
            }

            if step.is_chain_member() {
                if step.name.is_none() {
                    return Err(FlowError::at_step(index, "Missing step name"));
                }

                chain.push(index);
                cursor = DataRef::Step(index).to_string();
            }
        }

        let declared = &flow.outputs[0].data;
        if *declared != cursor {
            return Err(FlowError::document(format!(
                "Expected output data reference '{}' does not match provided output data reference '{}'",
                cursor, declared
            )));
        }

        Ok(chain)
    }

    fn check_versions(&self, flow: &Flow, prefix: &str, report: &mut ValidationReport) {
        let versions: BTreeSet<&str> = flow
            .steps
            .iter()
            .filter_map(|s| s.estimator.as_ref())
            .map(|e| e.version.as_str())
            .filter(|v| *v != self.config.library_version)
            .collect();

        for version in versions {
            tracing::warn!(version, expected = %self.config.library_version, "Library version drift");
            report.add_warning(format!(
                "{}Steps were written with library version {} (decoding for {})",
                prefix, version, self.config.library_version
            ));
        }
    }
}

/// Result of flow validation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Indices of the top-level chain steps
    pub chain: Vec<usize>,
    /// Top-level steps nothing uses
    pub orphans: Vec<usize>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
