// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! Codec entry points

use std::collections::BTreeSet;

use crate::config::CodecConfig;
use crate::errors::FlowResult;
use crate::flow::{decode_flow, encode_flow, Flow, FlowValidator, ValidationReport};
use crate::transform::{Pipeline, TransformRegistry};

/// Bidirectional codec between pipelines and flow documents
#[derive(Debug, Clone)]
pub struct FlowCodec {
    registry: TransformRegistry,
    config: CodecConfig,
}

impl FlowCodec {
    /// Create a codec resolving classes through `registry`
    pub fn new(registry: TransformRegistry) -> Self {
        Self {
            registry,
            config: CodecConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn registry(&self) -> &TransformRegistry {
        &self.registry
    }

    /// Encode a pipeline of unfitted transforms
    pub fn to_flow(&self, pipeline: &Pipeline) -> FlowResult<Flow> {
        encode_flow(pipeline, &self.config)
    }

    /// Rebuild the pipeline a flow describes
    pub fn from_flow(&self, flow: &Flow) -> FlowResult<Pipeline> {
        self.from_flow_with_report(flow).map(|(pipeline, _)| pipeline)
    }

    /// Rebuild the pipeline and keep the validation warnings
    pub fn from_flow_with_report(&self, flow: &Flow) -> FlowResult<(Pipeline, ValidationReport)> {
        decode_flow(flow, &self.registry, &self.config)
    }

    /// Structural validation only
    pub fn validate(&self, flow: &Flow) -> FlowResult<ValidationReport> {
        FlowValidator::new(&self.config).validate(flow)
    }

    /// Class paths in `flow` (embedded flows included) the registry cannot
    /// build
    pub fn unresolved_classes(&self, flow: &Flow) -> Vec<String> {
        let mut missing = BTreeSet::new();
        self.collect_unresolved(flow, &mut missing);
        missing.into_iter().collect()
    }

    fn collect_unresolved(&self, flow: &Flow, missing: &mut BTreeSet<String>) {
        for step in &flow.steps {
            if let Some(class_path) = step.class_path() {
                if !self.registry.contains(class_path) {
                    missing.insert(class_path.to_string());
                }
            }
            if let Some(embedded) = &step.pipeline {
                self.collect_unresolved(embedded, missing);
            }
        }
    }
}

impl Default for FlowCodec {
    fn default() -> Self {
        Self::new(TransformRegistry::sklearn())
    }
}

/// Encode `pipeline` with the default configuration
pub fn to_flow(pipeline: &Pipeline) -> FlowResult<Flow> {
    encode_flow(pipeline, &CodecConfig::default())
}

/// Decode `flow` with the default configuration
pub fn from_flow(flow: &Flow, registry: &TransformRegistry) -> FlowResult<Pipeline> {
    decode_flow(flow, registry, &CodecConfig::default()).map(|(pipeline, _)| pipeline)
}
