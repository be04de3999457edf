// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! Library-level encode/decode scenarios

use serde_json::json;
use std::path::PathBuf;

use sklearn_flow::flow::{fingerprint, StepGraph};
use sklearn_flow::{
    from_flow, to_flow, Estimator, FeatureUnion, Flow, FlowCodec, FlowError, ParamValue, Pipeline,
    Transform, TransformRegistry,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn titanic() -> Pipeline {
    Pipeline::from_file(&fixture("titanic.yaml")).unwrap()
}

#[test]
fn test_titanic_layout() {
    let flow = to_flow(&titanic()).unwrap();

    // Both column branches are emitted before the union that owns them
    assert_eq!(flow.steps.len(), 4);
    assert_eq!(flow.chain(), vec![2, 3]);
    assert_eq!(flow.output_reference(), Some("steps.3.output"));

    let union = &flow.steps[2];
    assert_eq!(
        union.class_path(),
        Some("sklearn.compose.ColumnTransformer")
    );
    let hyperparams = union.hyperparams.as_ref().unwrap();
    assert_eq!(hyperparams["transformers"].data, json!([0, 1]));
    assert_eq!(
        hyperparams["transformer_columns"].data,
        json!([["age", "fare"], ["embarked", "sex", "pclass"]])
    );

    assert_eq!(flow.steps[0].name.as_deref(), Some("num"));
    assert!(flow.steps[0].pipeline.is_some());
    assert!(!flow.steps[0].is_chain_member());
    assert_eq!(flow.steps[3].input_reference(), Some("steps.2.output"));
}

#[test]
fn test_titanic_round_trip_through_json() {
    let pipeline = titanic();
    let codec = FlowCodec::default();

    let json = codec.to_flow(&pipeline).unwrap().to_json_pretty().unwrap();
    let flow = Flow::from_json(&json).unwrap();

    assert_eq!(codec.from_flow(&flow).unwrap(), pipeline);
}

#[test]
fn test_handwritten_document_decodes() {
    let flow = Flow::from_file(&fixture("linear.json")).unwrap();
    let pipeline = from_flow(&flow, &TransformRegistry::sklearn()).unwrap();

    let expected = Pipeline::new()
        .step(
            "scale",
            Estimator::new("sklearn.preprocessing.StandardScaler").param("with_mean", true),
        )
        .step(
            "svc",
            Estimator::new("sklearn.svm.SVC")
                .param("C", 1.5)
                .param("kernel", "rbf"),
        );
    assert_eq!(pipeline, expected);
}

#[test]
fn test_encoding_is_fresh_but_fingerprint_is_stable() {
    let pipeline = titanic();
    let first = to_flow(&pipeline).unwrap();
    let second = to_flow(&pipeline).unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(fingerprint(&first).unwrap(), fingerprint(&second).unwrap());
}

#[test]
fn test_non_finite_values_survive_strict_json() {
    let pipeline = Pipeline::new().step(
        "sgd",
        Estimator::new("sklearn.linear_model.SGDClassifier")
            .param("alpha", f64::INFINITY)
            .param("tol", f64::NEG_INFINITY),
    );

    let json = to_flow(&pipeline).unwrap().to_json().unwrap();
    assert!(!json.contains("Infinity"));

    let decoded = from_flow(&Flow::from_json(&json).unwrap(), &TransformRegistry::sklearn()).unwrap();
    assert_eq!(decoded, pipeline);
}

#[test]
fn test_feature_union_with_nested_estimator_param() {
    let selector = Estimator::new("sklearn.feature_selection.SelectKBest").param("k", 2);
    let pipeline = Pipeline::new()
        .step(
            "features",
            FeatureUnion::new()
                .transformer("pca", Estimator::new("sklearn.decomposition.PCA"))
                .transformer("kbest", selector)
                .param("n_jobs", ParamValue::Null),
        )
        .step(
            "vote",
            Estimator::new("sklearn.ensemble.BaggingClassifier")
                .param("base_estimator", Transform::from(Estimator::new("sklearn.svm.SVC"))),
        );

    let flow = to_flow(&pipeline).unwrap();
    let graph = StepGraph::build(&flow);
    assert!(graph.check_acyclic().is_ok());
    assert!(graph.orphans().is_empty());

    let decoded = from_flow(&flow, &TransformRegistry::sklearn()).unwrap();
    assert_eq!(decoded, pipeline);
}

#[test]
fn test_unregistered_class_is_reported_with_its_step() {
    let mut flow = Flow::from_file(&fixture("linear.json")).unwrap();
    flow.steps[1].estimator.as_mut().unwrap().python_path = "acme.models.Magic".into();

    match from_flow(&flow, &TransformRegistry::sklearn()).unwrap_err() {
        FlowError::UnresolvableClass { step, class_path } => {
            assert_eq!(step, 1);
            assert_eq!(class_path, "acme.models.Magic");
        }
        other => panic!("Expected UnresolvableClass, got {:?}", other),
    }

    let mut registry = TransformRegistry::sklearn();
    registry.register_estimator("acme.models.Magic");
    assert!(from_flow(&flow, &registry).is_ok());
}

#[test]
fn test_extra_document_input_is_rejected() {
    let mut value = Flow::from_file(&fixture("linear.json"))
        .unwrap()
        .to_value()
        .unwrap();
    value["inputs"]
        .as_array_mut()
        .unwrap()
        .push(json!({"name": "second input"}));

    let flow = Flow::from_value(value).unwrap();
    let err = from_flow(&flow, &TransformRegistry::sklearn()).unwrap_err();
    assert!(err.to_string().contains("Invalid number of pipeline inputs: 2"));
}

#[test]
fn test_fitted_transform_is_refused() {
    let pipeline = Pipeline::new().step(
        "scale",
        Estimator::new("sklearn.preprocessing.StandardScaler").fitted(),
    );

    assert!(matches!(
        to_flow(&pipeline),
        Err(FlowError::AlreadyConfigured { .. })
    ));
}
