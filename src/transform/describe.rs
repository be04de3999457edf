// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! YAML pipeline descriptions
//!
//! Human-written form of a [`Pipeline`], used as `encode` input and
//! `decode` output of the CLI:
//!
//! ```yaml
//! steps:
//!   - name: preprocessor
//!     class: sklearn.compose.ColumnTransformer
//!     transformers:
//!       - name: num
//!         columns: [age, fare]
//!         steps:
//!           - name: imputer
//!             class: sklearn.impute.SimpleImputer
//!             params:
//!               strategy: median
//!   - name: classifier
//!     class: sklearn.linear_model.LogisticRegression
//!     params:
//!       solver: lbfgs
//! ```
//!
//! A mapping with `steps` is a nested pipeline, `transformer_list` makes a
//! feature union, `transformers` a column transformer; anything else needs a
//! `class`. Inside `params`, a mapping carrying `class` or `steps` is read as
//! a nested transform, any other mapping as a plain map value. A plain map
//! that happens to use one of those keys is written with a `!map` tag.

use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Mapping, Value};
use std::path::Path;

use super::{
    ColumnTransformer, Estimator, FeatureUnion, ParamValue, Params, Pipeline, Transform,
    COLUMN_TRANSFORMER_CLASS, FEATURE_UNION_CLASS, TRANSFORMERS, TRANSFORMER_LIST,
};
use crate::errors::{FlowError, FlowResult};

const CLASS: &str = "class";
const STEPS: &str = "steps";
const PARAMS: &str = "params";
const NAME: &str = "name";
const COLUMNS: &str = "columns";
const FITTED: &str = "fitted";
const MAP_TAG: &str = "map";

impl Pipeline {
    /// Load a pipeline description from a YAML file
    pub fn from_file(path: &Path) -> FlowResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| FlowError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_yaml(&content)
    }

    /// Parse a pipeline description
    pub fn from_yaml(yaml: &str) -> FlowResult<Self> {
        let value: Value = serde_yaml::from_str(yaml)?;
        pipeline_from_yaml(&value, "pipeline")
    }

    /// Render the pipeline as a description
    pub fn to_yaml(&self) -> FlowResult<String> {
        serde_yaml::to_string(&pipeline_to_yaml(self)).map_err(Into::into)
    }
}

fn as_mapping<'a>(value: &'a Value, location: &str) -> FlowResult<&'a Mapping> {
    value
        .as_mapping()
        .ok_or_else(|| FlowError::description(format!("{}: expected a mapping", location)))
}

fn as_sequence<'a>(value: &'a Value, location: &str) -> FlowResult<&'a [Value]> {
    value
        .as_sequence()
        .map(Vec::as_slice)
        .ok_or_else(|| FlowError::description(format!("{}: expected a list", location)))
}

fn pipeline_from_yaml(value: &Value, location: &str) -> FlowResult<Pipeline> {
    let map = as_mapping(value, location)?;
    let steps = map
        .get(STEPS)
        .ok_or_else(|| FlowError::description(format!("{}: missing 'steps'", location)))?;

    let steps = as_sequence(steps, location)?
        .iter()
        .enumerate()
        .map(|(i, step)| named_from_yaml(step, &format!("{}.steps[{}]", location, i)))
        .collect::<FlowResult<Vec<_>>>()?;

    Ok(Pipeline { steps })
}

fn name_of(map: &Mapping, location: &str) -> FlowResult<String> {
    map.get(NAME)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| FlowError::description(format!("{}: missing 'name'", location)))
}

fn named_from_yaml(value: &Value, location: &str) -> FlowResult<(String, Transform)> {
    let map = as_mapping(value, location)?;
    let name = name_of(map, location)?;
    let transform = transform_from_yaml(value, &format!("{}/{}", location, name))?;
    Ok((name, transform))
}

fn transform_from_yaml(value: &Value, location: &str) -> FlowResult<Transform> {
    let map = as_mapping(value, location)?;

    if map.contains_key(STEPS) {
        return pipeline_from_yaml(value, location).map(Transform::from);
    }

    let params = match map.get(PARAMS) {
        Some(params) => params_from_yaml(params, location)?,
        None => Params::new(),
    };

    let class_path = match map.get(CLASS) {
        Some(class) => Some(class.as_str().map(str::to_string).ok_or_else(|| {
            FlowError::description(format!("{}: 'class' must be a string", location))
        })?),
        None => None,
    };

    if let Some(children) = map.get(TRANSFORMER_LIST) {
        let transformer_list = as_sequence(children, location)?
            .iter()
            .enumerate()
            .map(|(i, child)| {
                named_from_yaml(child, &format!("{}.{}[{}]", location, TRANSFORMER_LIST, i))
            })
            .collect::<FlowResult<Vec<_>>>()?;

        return Ok(FeatureUnion {
            class_path: class_path.unwrap_or_else(|| FEATURE_UNION_CLASS.to_string()),
            transformer_list,
            params,
        }
        .into());
    }

    if let Some(children) = map.get(TRANSFORMERS) {
        let mut transformers = Vec::new();
        for (i, child) in as_sequence(children, location)?.iter().enumerate() {
            let child_location = format!("{}.{}[{}]", location, TRANSFORMERS, i);
            let (name, transform) = named_from_yaml(child, &child_location)?;
            let columns = as_mapping(child, &child_location)?
                .get(COLUMNS)
                .ok_or_else(|| {
                    FlowError::description(format!("{}: missing 'columns'", child_location))
                })?;
            transformers.push((name, transform, value_from_yaml(columns, &child_location)?));
        }

        return Ok(ColumnTransformer {
            class_path: class_path.unwrap_or_else(|| COLUMN_TRANSFORMER_CLASS.to_string()),
            transformers,
            params,
        }
        .into());
    }

    let class_path = class_path
        .ok_or_else(|| FlowError::description(format!("{}: missing 'class'", location)))?;

    Ok(Estimator {
        class_path,
        params,
        configured: map.get(FITTED).and_then(Value::as_bool).unwrap_or(false),
    }
    .into())
}

fn params_from_yaml(value: &Value, location: &str) -> FlowResult<Params> {
    let mut params = Params::new();

    for (key, value) in as_mapping(value, location)? {
        let key = key.as_str().ok_or_else(|| {
            FlowError::description(format!("{}: parameter names must be strings", location))
        })?;
        let value = value_from_yaml(value, &format!("{}.{}", location, key))?;
        params.insert(key.to_string(), value);
    }

    Ok(params)
}

fn value_from_yaml(value: &Value, location: &str) -> FlowResult<ParamValue> {
    let value = match value {
        Value::Null => ParamValue::Null,
        Value::Bool(b) => ParamValue::Bool(*b),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => ParamValue::Int(i),
            (None, Some(f)) => ParamValue::Float(f),
            (None, None) => {
                return Err(FlowError::description(format!(
                    "{}: unsupported number {}",
                    location, n
                )))
            }
        },
        Value::String(s) => ParamValue::Str(s.clone()),
        Value::Sequence(items) => ParamValue::List(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| value_from_yaml(item, &format!("{}[{}]", location, i)))
                .collect::<FlowResult<_>>()?,
        ),
        Value::Mapping(map) if map.contains_key(CLASS) || map.contains_key(STEPS) => {
            ParamValue::Transform(Box::new(transform_from_yaml(value, location)?))
        }
        Value::Mapping(_) => ParamValue::Map(params_from_yaml(value, location)?),
        Value::Tagged(tagged) if tagged.tag == MAP_TAG => {
            ParamValue::Map(params_from_yaml(&tagged.value, location)?)
        }
        Value::Tagged(tagged) => {
            return Err(FlowError::description(format!(
                "{}: unsupported YAML tag {}",
                location, tagged.tag
            )))
        }
    };

    Ok(value)
}

fn pipeline_to_yaml(pipeline: &Pipeline) -> Value {
    let mut map = Mapping::new();
    map.insert(STEPS.into(), steps_to_yaml(pipeline));
    Value::Mapping(map)
}

fn steps_to_yaml(pipeline: &Pipeline) -> Value {
    Value::Sequence(
        pipeline
            .steps
            .iter()
            .map(|(name, t)| named_to_yaml(name, t, None))
            .collect(),
    )
}

fn named_to_yaml(name: &str, transform: &Transform, columns: Option<&ParamValue>) -> Value {
    let mut map = Mapping::new();
    map.insert(NAME.into(), name.into());
    if let Some(columns) = columns {
        map.insert(COLUMNS.into(), value_to_yaml(columns));
    }
    write_transform(&mut map, transform);
    Value::Mapping(map)
}

fn write_transform(map: &mut Mapping, transform: &Transform) {
    match transform {
        Transform::Estimator(e) => {
            map.insert(CLASS.into(), e.class_path.as_str().into());
            if e.configured {
                map.insert(FITTED.into(), Value::Bool(true));
            }
        }
        Transform::Pipeline(p) => {
            map.insert(STEPS.into(), steps_to_yaml(p));
        }
        Transform::FeatureUnion(u) => {
            map.insert(CLASS.into(), u.class_path.as_str().into());
            map.insert(
                TRANSFORMER_LIST.into(),
                Value::Sequence(
                    u.transformer_list
                        .iter()
                        .map(|(name, t)| named_to_yaml(name, t, None))
                        .collect(),
                ),
            );
        }
        Transform::ColumnTransformer(c) => {
            map.insert(CLASS.into(), c.class_path.as_str().into());
            map.insert(
                TRANSFORMERS.into(),
                Value::Sequence(
                    c.transformers
                        .iter()
                        .map(|(name, t, columns)| named_to_yaml(name, t, Some(columns)))
                        .collect(),
                ),
            );
        }
    }

    if let Some(params) = transform.params().filter(|p| !p.is_empty()) {
        map.insert(PARAMS.into(), params_to_yaml(params));
    }
}

fn params_to_yaml(params: &Params) -> Value {
    let mut map = Mapping::new();
    for (name, value) in params {
        map.insert(name.as_str().into(), value_to_yaml(value));
    }
    Value::Mapping(map)
}

fn value_to_yaml(value: &ParamValue) -> Value {
    match value {
        ParamValue::Null => Value::Null,
        ParamValue::Bool(b) => Value::Bool(*b),
        ParamValue::Int(i) => Value::Number((*i).into()),
        ParamValue::Float(f) => Value::Number((*f).into()),
        ParamValue::Str(s) => Value::String(s.clone()),
        ParamValue::List(items) => Value::Sequence(items.iter().map(value_to_yaml).collect()),
        ParamValue::Map(map) if map.contains_key(CLASS) || map.contains_key(STEPS) => {
            Value::Tagged(Box::new(TaggedValue {
                tag: Tag::new(MAP_TAG),
                value: params_to_yaml(map),
            }))
        }
        ParamValue::Map(map) => params_to_yaml(map),
        ParamValue::Transform(t) => {
            let mut map = Mapping::new();
            write_transform(&mut map, t);
            Value::Mapping(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TITANIC: &str = r#"
steps:
  - name: preprocessor
    class: sklearn.compose.ColumnTransformer
    transformers:
      - name: num
        columns: [age, fare]
        steps:
          - name: imputer
            class: sklearn.impute.SimpleImputer
            params:
              strategy: median
          - name: scaler
            class: sklearn.preprocessing.StandardScaler
      - name: cat
        columns: [embarked, sex, pclass]
        steps:
          - name: imputer
            class: sklearn.impute.SimpleImputer
            params:
              strategy: constant
              fill_value: missing
          - name: onehot
            class: sklearn.preprocessing.OneHotEncoder
            params:
              handle_unknown: ignore
  - name: classifier
    class: sklearn.linear_model.LogisticRegression
    params:
      solver: lbfgs
      C: 1.0
      max_iter: 100
"#;

    #[test]
    fn test_parse_titanic_description() {
        let pipeline = Pipeline::from_yaml(TITANIC).unwrap();
        assert_eq!(pipeline.step_names(), vec!["preprocessor", "classifier"]);

        match pipeline.get_step("preprocessor").unwrap() {
            Transform::ColumnTransformer(c) => {
                assert_eq!(c.class_path, COLUMN_TRANSFORMER_CLASS);
                assert_eq!(c.transformers.len(), 2);
                assert_eq!(c.transformers[0].0, "num");
                assert_eq!(c.transformers[0].2, ParamValue::from(vec!["age", "fare"]));
                assert!(matches!(c.transformers[1].1, Transform::Pipeline(_)));
            }
            other => panic!("Expected ColumnTransformer, got {:?}", other),
        }

        let classifier = pipeline.get_step("classifier").unwrap();
        let params = classifier.params().unwrap();
        assert_eq!(params.get("C"), Some(&ParamValue::Float(1.0)));
        assert_eq!(params.get("max_iter"), Some(&ParamValue::Int(100)));
    }

    #[test]
    fn test_round_trip_yaml() {
        let pipeline = Pipeline::from_yaml(TITANIC).unwrap();
        let yaml = pipeline.to_yaml().unwrap();
        let parsed = Pipeline::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, pipeline);
    }

    #[test]
    fn test_nested_transform_and_map_params() {
        let yaml = r#"
steps:
  - name: bagging
    class: sklearn.ensemble.BaggingClassifier
    fitted: false
    params:
      base_estimator:
        class: sklearn.tree.DecisionTreeClassifier
        params:
          max_depth: 3
      class_weight:
        a: 1
        b: 2
"#;
        let pipeline = Pipeline::from_yaml(yaml).unwrap();
        let params = pipeline.get_step("bagging").unwrap().params().unwrap();

        assert!(matches!(params.get("base_estimator"), Some(ParamValue::Transform(_))));
        assert!(matches!(params.get("class_weight"), Some(ParamValue::Map(m)) if m.len() == 2));
    }

    #[test]
    fn test_map_with_transform_keys_survives_yaml() {
        let mut meta = Params::new();
        meta.insert("class".into(), ParamValue::from("positive"));
        meta.insert("steps".into(), ParamValue::from(3));

        let pipeline = Pipeline::new().step(
            "clf",
            Estimator::new("sklearn.linear_model.LogisticRegression")
                .param("meta", ParamValue::Map(meta))
                .param("base", Transform::from(Estimator::new("sklearn.svm.SVC"))),
        );

        let yaml = pipeline.to_yaml().unwrap();
        assert!(yaml.contains("!map"));
        assert_eq!(Pipeline::from_yaml(&yaml).unwrap(), pipeline);
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let yaml = r#"
steps:
  - name: clf
    class: sklearn.svm.SVC
    params:
      kernel: !custom rbf
"#;
        assert!(matches!(
            Pipeline::from_yaml(yaml),
            Err(FlowError::InvalidDescription { .. })
        ));
    }

    #[test]
    fn test_missing_class_is_rejected() {
        let yaml = r#"
steps:
  - name: broken
    params: {}
"#;
        let err = Pipeline::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, FlowError::InvalidDescription { .. }));
        assert!(err.to_string().contains("missing 'class'"));
    }

    #[test]
    fn test_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pipeline.yaml");
        std::fs::write(&path, TITANIC).unwrap();

        let pipeline = Pipeline::from_file(&path).unwrap();
        assert_eq!(pipeline.steps.len(), 2);

        let err = Pipeline::from_file(&temp.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, FlowError::FileReadError { .. }));
    }
}
