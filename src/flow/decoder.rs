// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! Step decoder
//!
//! Rebuilds a pipeline from a validated flow document. Steps referenced from
//! hyperparameters are resolved on demand, so dependencies are always built
//! before the step that needs them whatever their position in the array.

use super::{
    decode_value, Flow, FlowValidator, HyperparamType, Hyperparameter, Step, StepRef, StepType,
    ValidationReport,
};
use crate::config::CodecConfig;
use crate::errors::{FlowError, FlowResult};
use crate::transform::{
    Construction, ParamValue, Params, Pipeline, Transform, TransformKind, TransformRegistry,
    TRANSFORMERS, TRANSFORMER_COLUMNS, TRANSFORMER_LIST,
};

/// Validate `flow` and rebuild the pipeline it describes
pub fn decode_flow(
    flow: &Flow,
    registry: &TransformRegistry,
    config: &CodecConfig,
) -> FlowResult<(Pipeline, ValidationReport)> {
    let report = FlowValidator::new(config).validate(flow)?;

    let decoder = FlowDecoder {
        registry,
        config,
    };
    let pipeline = decoder.decode_pipeline(flow, 0)?;

    tracing::info!(
        steps = flow.steps.len(),
        chain = pipeline.steps.len(),
        "Decoded flow"
    );

    Ok((pipeline, report))
}

/// Resolves steps of validated documents against a registry
struct FlowDecoder<'a> {
    registry: &'a TransformRegistry,
    config: &'a CodecConfig,
}

impl FlowDecoder<'_> {
    fn decode_pipeline(&self, flow: &Flow, depth: usize) -> FlowResult<Pipeline> {
        let mut pipeline = Pipeline::new();

        for index in flow.chain() {
            let step = &flow.steps[index];
            let name = step
                .name
                .clone()
                .ok_or_else(|| FlowError::at_step(index, "Missing step name"))?;

            let transform = self.decode_step(flow, index, depth)?;
            pipeline.steps.push((name, transform));
        }

        Ok(pipeline)
    }

    fn decode_step(&self, flow: &Flow, index: usize, depth: usize) -> FlowResult<Transform> {
        if depth >= self.config.max_depth {
            return Err(FlowError::NestingTooDeep {
                limit: self.config.max_depth,
                step: Some(index),
            });
        }

        let step = flow
            .steps
            .get(index)
            .ok_or_else(|| FlowError::document(format!("Step {} does not exist", index)))?;

        let transform = match &step.step_type {
            StepType::Sklearn => self.decode_sklearn(flow, index, step, depth + 1)?,
            StepType::Subpipeline => {
                let embedded = step
                    .pipeline
                    .as_deref()
                    .ok_or_else(|| FlowError::at_step(index, "SUBPIPELINE step without pipeline"))?;
                self.decode_pipeline(embedded, depth + 1)?.into()
            }
            StepType::Other(step_type) => {
                return Err(FlowError::InvalidStepType {
                    step: index,
                    step_type: step_type.clone(),
                })
            }
        };

        tracing::debug!(index, class_path = transform.class_path(), "Decoded step");
        Ok(transform)
    }

    fn decode_sklearn(
        &self,
        flow: &Flow,
        index: usize,
        step: &Step,
        depth: usize,
    ) -> FlowResult<Transform> {
        let class_path = step
            .class_path()
            .ok_or_else(|| FlowError::at_step(index, "SKLEARN step without estimator"))?;

        let registration =
            self.registry
                .get(class_path)
                .ok_or_else(|| FlowError::UnresolvableClass {
                    step: index,
                    class_path: class_path.to_string(),
                })?;

        let construction = match registration.kind() {
            TransformKind::ParallelUnion => {
                let params = self.decode_params(flow, index, step, &[TRANSFORMER_LIST], depth)?;
                let transformer_list =
                    self.named_children(flow, index, step, TRANSFORMER_LIST, depth)?;

                Construction::ParallelUnion {
                    transformer_list,
                    params,
                }
            }
            TransformKind::ColumnUnion => {
                let mut params = self.decode_params(flow, index, step, &[TRANSFORMERS], depth)?;
                let children = self.named_children(flow, index, step, TRANSFORMERS, depth)?;

                let columns = match params.remove(TRANSFORMER_COLUMNS) {
                    Some(ParamValue::List(columns)) => columns,
                    Some(_) => {
                        return Err(FlowError::at_step(
                            index,
                            format!("'{}' is not a list", TRANSFORMER_COLUMNS),
                        ))
                    }
                    None if children.is_empty() => Vec::new(),
                    None => {
                        return Err(FlowError::at_step(
                            index,
                            format!("Missing '{}'", TRANSFORMER_COLUMNS),
                        ))
                    }
                };

                if columns.len() != children.len() {
                    return Err(FlowError::at_step(
                        index,
                        format!(
                            "'{}' has {} entries but '{}' has {}",
                            TRANSFORMER_COLUMNS,
                            columns.len(),
                            TRANSFORMERS,
                            children.len()
                        ),
                    ));
                }

                let transformers = children
                    .into_iter()
                    .zip(columns)
                    .map(|((name, transform), columns)| (name, transform, columns))
                    .collect();

                Construction::ColumnUnion {
                    transformers,
                    params,
                }
            }
            TransformKind::Leaf => Construction::Leaf {
                params: self.decode_params(flow, index, step, &[], depth)?,
            },
            // Chains only travel as SUBPIPELINE steps
            TransformKind::Sequential => {
                return Err(FlowError::at_step(
                    index,
                    format!(
                        "'{}' is registered as a sequential unit and cannot be a SKLEARN step",
                        class_path
                    ),
                ))
            }
        };

        registration.build(class_path, construction)
    }

    /// Decode every hyperparameter except the `composite` ones
    fn decode_params(
        &self,
        flow: &Flow,
        index: usize,
        step: &Step,
        composite: &[&str],
        depth: usize,
    ) -> FlowResult<Params> {
        let mut params = Params::new();

        for (name, hyperparam) in step.hyperparams.iter().flatten() {
            if composite.contains(&name.as_str()) {
                continue;
            }

            params.insert(name.clone(), self.decode_hyperparam(flow, index, name, hyperparam, depth)?);
        }

        Ok(params)
    }

    fn decode_hyperparam(
        &self,
        flow: &Flow,
        index: usize,
        name: &str,
        hyperparam: &Hyperparameter,
        depth: usize,
    ) -> FlowResult<ParamValue> {
        match &hyperparam.hyperparam_type {
            HyperparamType::Value => {
                decode_value(&hyperparam.data).map_err(|e| e.in_hyperparam(index, name))
            }
            HyperparamType::Step => match self.step_reference(index, name, hyperparam)? {
                StepRef::Single(target) => {
                    Ok(ParamValue::Transform(Box::new(self.decode_step(flow, target, depth)?)))
                }
                StepRef::List(targets) => targets
                    .into_iter()
                    .map(|target| {
                        self.decode_step(flow, target, depth)
                            .map(|t| ParamValue::Transform(Box::new(t)))
                    })
                    .collect::<FlowResult<Vec<_>>>()
                    .map(ParamValue::List),
            },
            HyperparamType::Other(hyperparam_type) => Err(FlowError::InvalidHyperparamType {
                step: index,
                name: name.to_string(),
                hyperparam_type: hyperparam_type.clone(),
            }),
        }
    }

    /// Resolve a union's composite parameter into `(name, child)` pairs
    fn named_children(
        &self,
        flow: &Flow,
        index: usize,
        step: &Step,
        composite: &str,
        depth: usize,
    ) -> FlowResult<Vec<(String, Transform)>> {
        let Some(hyperparam) = step.hyperparams.as_ref().and_then(|h| h.get(composite)) else {
            return Ok(Vec::new());
        };

        if hyperparam.hyperparam_type != HyperparamType::Step {
            return Err(FlowError::at_step(
                index,
                format!("'{}' must be a STEP hyper-parameter", composite),
            ));
        }

        let targets = match self.step_reference(index, composite, hyperparam)? {
            StepRef::List(targets) => targets,
            StepRef::Single(target) => vec![target],
        };

        targets
            .into_iter()
            .map(|target| {
                let name = flow
                    .steps
                    .get(target)
                    .and_then(|s| s.name.clone())
                    .ok_or_else(|| {
                        FlowError::at_step(
                            target,
                            format!("Missing step name for child of step {}", index),
                        )
                    })?;

                Ok((name, self.decode_step(flow, target, depth)?))
            })
            .collect()
    }

    fn step_reference(
        &self,
        index: usize,
        name: &str,
        hyperparam: &Hyperparameter,
    ) -> FlowResult<StepRef> {
        StepRef::parse(&hyperparam.data).ok_or_else(|| {
            FlowError::at_step(
                index,
                format!(
                    "Invalid step reference for hyper-parameter '{}': {}",
                    name, hyperparam.data
                ),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{encode_flow, DataRef, FLOW_SCHEMA};
    use crate::transform::{ColumnTransformer, Estimator, FeatureUnion};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn round_trip(pipeline: &Pipeline) -> Pipeline {
        let config = CodecConfig::default();
        let flow = encode_flow(pipeline, &config).unwrap();
        let json = flow.to_json().unwrap();
        let flow = Flow::from_json(&json).unwrap();
        decode_flow(&flow, &TransformRegistry::sklearn(), &config)
            .unwrap()
            .0
    }

    fn decode(flow: &Flow) -> FlowResult<Pipeline> {
        decode_flow(flow, &TransformRegistry::sklearn(), &CodecConfig::default()).map(|(p, _)| p)
    }

    #[test]
    fn test_linear_round_trip() {
        let pipeline = Pipeline::new()
            .step(
                "imputer",
                Estimator::new("sklearn.impute.SimpleImputer").param("strategy", "median"),
            )
            .step(
                "clf",
                Estimator::new("sklearn.linear_model.LogisticRegression")
                    .param("C", 1.0)
                    .param("max_iter", 100)
                    .param("class_weight", ParamValue::Null),
            );

        assert_eq!(round_trip(&pipeline), pipeline);
    }

    #[test]
    fn test_column_union_round_trip() {
        let pipeline = Pipeline::new().step(
            "preprocess",
            ColumnTransformer::new()
                .transformer(
                    "num",
                    Pipeline::new()
                        .step("impute", Estimator::new("sklearn.impute.SimpleImputer"))
                        .step("scale", Estimator::new("sklearn.preprocessing.StandardScaler")),
                    vec!["age", "fare"],
                )
                .transformer(
                    "cat",
                    Estimator::new("sklearn.preprocessing.OneHotEncoder")
                        .param("handle_unknown", "ignore"),
                    vec!["sex", "embarked"],
                )
                .param("remainder", "drop"),
        );

        assert_eq!(round_trip(&pipeline), pipeline);
    }

    #[test]
    fn test_feature_union_and_nested_params_round_trip() {
        let pipeline = Pipeline::new()
            .step(
                "features",
                FeatureUnion::new()
                    .transformer("pca", Estimator::new("sklearn.decomposition.PCA").param("n_components", 2))
                    .transformer("kbest", Estimator::new("sklearn.feature_selection.SelectKBest").param("k", 1))
                    .param("n_jobs", ParamValue::Null),
            )
            .step(
                "clf",
                Estimator::new("sklearn.ensemble.VotingClassifier").param(
                    "estimators",
                    vec![
                        Transform::from(Estimator::new("sklearn.svm.SVC").param("gamma", f64::INFINITY)),
                        Transform::from(Estimator::new("sklearn.naive_bayes.GaussianNB")),
                    ],
                ),
            );

        assert_eq!(round_trip(&pipeline), pipeline);
    }

    #[test]
    fn test_unresolvable_class() {
        let pipeline = Pipeline::new().step("x", Estimator::new("sklearn.does.not.Exist"));
        let flow = encode_flow(&pipeline, &CodecConfig::default()).unwrap();

        match decode(&flow).unwrap_err() {
            FlowError::UnresolvableClass { step, class_path } => {
                assert_eq!(step, 0);
                assert_eq!(class_path, "sklearn.does.not.Exist");
            }
            other => panic!("Expected UnresolvableClass, got {:?}", other),
        }
    }

    #[test]
    fn test_forward_reference_is_resolved() {
        let mut hyperparams = BTreeMap::new();
        hyperparams.insert("base_estimator".to_string(), Hyperparameter::step(1));

        let steps = vec![
            Step::sklearn("sklearn.ensemble.BaggingClassifier", "0.22.1")
                .with_name(Some("bag"))
                .with_hyperparams(hyperparams)
                .with_input(Some(&DataRef::Input)),
            Step::sklearn("sklearn.tree.DecisionTreeClassifier", "0.22.1"),
        ];
        let flow = Flow::new(FLOW_SCHEMA, steps, &DataRef::Step(0));

        let pipeline = decode(&flow).unwrap();
        assert_eq!(
            pipeline,
            Pipeline::new().step(
                "bag",
                Estimator::new("sklearn.ensemble.BaggingClassifier").param(
                    "base_estimator",
                    Transform::from(Estimator::new("sklearn.tree.DecisionTreeClassifier")),
                ),
            )
        );
    }

    #[test]
    fn test_column_count_mismatch() {
        let pipeline = Pipeline::new().step(
            "prep",
            ColumnTransformer::new()
                .transformer("a", Estimator::new("sklearn.preprocessing.StandardScaler"), vec!["x"])
                .transformer("b", Estimator::new("sklearn.preprocessing.MinMaxScaler"), vec!["y"]),
        );
        let mut flow = encode_flow(&pipeline, &CodecConfig::default()).unwrap();
        flow.steps[2]
            .hyperparams
            .as_mut()
            .unwrap()
            .insert(TRANSFORMER_COLUMNS.to_string(), Hyperparameter::value(json!([["x"]])));

        let err = decode(&flow).unwrap_err();
        assert_eq!(err.step(), Some(2));
    }

    #[test]
    fn test_unnamed_union_child() {
        let pipeline = Pipeline::new().step(
            "features",
            FeatureUnion::new().transformer("pca", Estimator::new("sklearn.decomposition.PCA")),
        );
        let mut flow = encode_flow(&pipeline, &CodecConfig::default()).unwrap();
        flow.steps[0].name = None;

        let err = decode(&flow).unwrap_err();
        assert_eq!(err.step(), Some(0));
    }

    #[test]
    fn test_invalid_document_builds_nothing() {
        let pipeline = Pipeline::new().step("x", Estimator::new("sklearn.svm.SVC"));
        let mut flow = encode_flow(&pipeline, &CodecConfig::default()).unwrap();
        flow.outputs[0].data = "inputs.0".into();

        assert!(matches!(
            decode(&flow).unwrap_err(),
            FlowError::StructuralMismatch { step: None, .. }
        ));
    }

    fn chain_with_param(name: &str, data: serde_json::Value) -> Flow {
        let mut hyperparams = BTreeMap::new();
        hyperparams.insert(name.to_string(), Hyperparameter::value(data));

        let steps = vec![
            Step::sklearn("sklearn.preprocessing.StandardScaler", "0.22.1")
                .with_name(Some("scale"))
                .with_input(Some(&DataRef::Input)),
            Step::sklearn("sklearn.svm.SVC", "0.22.1")
                .with_name(Some("svc"))
                .with_hyperparams(hyperparams)
                .with_input(Some(&DataRef::Step(0))),
        ];
        Flow::new(FLOW_SCHEMA, steps, &DataRef::Step(1))
    }

    #[test]
    fn test_unknown_encoding_names_step_and_param() {
        let flow = chain_with_param("C", json!({"encoding": "json", "value": "1"}));

        let err = decode(&flow).unwrap_err();
        assert_eq!(err.step(), Some(1));
        assert!(err.to_string().contains("'C' of step 1"));
        match err {
            FlowError::InvalidHyperparamValue { name, source, .. } => {
                assert_eq!(name, "C");
                assert!(matches!(*source, FlowError::UnknownEncoding { ref encoding } if encoding == "json"));
            }
            other => panic!("Expected InvalidHyperparamValue, got {:?}", other),
        }
    }

    #[test]
    fn test_corrupt_blob_names_step() {
        let flow = chain_with_param("gamma", json!({"encoding": "pickle", "value": "!!not base64!!"}));

        let err = decode(&flow).unwrap_err();
        assert_eq!(err.step(), Some(1));
        assert!(err.to_string().contains("'gamma' of step 1"));
    }

    #[test]
    fn test_depth_limit_names_step() {
        let pipeline = Pipeline::new().step(
            "outer",
            Pipeline::new().step("inner", Estimator::new("sklearn.svm.SVC")),
        );
        let config = CodecConfig::default();
        let flow = encode_flow(&pipeline, &config).unwrap();
        let decoder = FlowDecoder {
            registry: &TransformRegistry::sklearn(),
            config: &CodecConfig {
                max_depth: 1,
                ..CodecConfig::default()
            },
        };

        // The embedded chain starts one level down, where its step 0 hits the limit
        match decoder.decode_pipeline(&flow, 0).unwrap_err() {
            FlowError::NestingTooDeep { limit, step } => {
                assert_eq!(limit, 1);
                assert_eq!(step, Some(0));
            }
            other => panic!("Expected NestingTooDeep, got {:?}", other),
        }
    }

    #[test]
    fn test_sequential_registration_is_rejected() {
        let mut registry = TransformRegistry::sklearn();
        registry.register_with(
            "sklearn.pipeline.Pipeline",
            TransformKind::Sequential,
            std::sync::Arc::new(|_: &str, _: Construction| -> FlowResult<Transform> {
                Ok(Transform::from(Pipeline::new()))
            }),
        );

        let steps = vec![Step::sklearn("sklearn.pipeline.Pipeline", "0.22.1")
            .with_name(Some("chain"))
            .with_input(Some(&DataRef::Input))];
        let flow = Flow::new(FLOW_SCHEMA, steps, &DataRef::Step(0));

        let err = decode_flow(&flow, &registry, &CodecConfig::default()).unwrap_err();
        assert!(matches!(err, FlowError::StructuralMismatch { step: Some(0), .. }));
    }

    #[test]
    fn test_custom_factory_is_used() {
        let mut registry = TransformRegistry::new();
        registry.register_with(
            "custom.Scaler",
            TransformKind::Leaf,
            std::sync::Arc::new(|class_path: &str, construction: Construction| -> FlowResult<Transform> {
                let Construction::Leaf { mut params } = construction else {
                    unreachable!("leaf registration");
                };
                params.insert("rebuilt".into(), true.into());
                Ok(Transform::from(Estimator {
                    class_path: class_path.to_string(),
                    params,
                    configured: false,
                }))
            }),
        );

        let pipeline = Pipeline::new().step("s", Estimator::new("custom.Scaler"));
        let flow = encode_flow(&pipeline, &CodecConfig::default()).unwrap();
        let (decoded, _) = decode_flow(&flow, &registry, &CodecConfig::default()).unwrap();

        assert_eq!(
            decoded.get_step("s"),
            Some(&Transform::from(Estimator::new("custom.Scaler").param("rebuilt", true)))
        );
    }
}
