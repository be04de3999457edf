// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! Transform unit structures
//!
//! A [`Transform`] is one node of a pipeline graph. Leaves are plain
//! [`Estimator`]s; the three composite shapes are [`Pipeline`] (a sequential
//! chain), [`FeatureUnion`] (children fed the same input, outputs
//! concatenated) and [`ColumnTransformer`] (children fed column subsets).

use serde::{Deserialize, Serialize};

use super::{ParamValue, Params, TransformKind};

/// Class path of the sequential container
pub const PIPELINE_CLASS: &str = "sklearn.pipeline.Pipeline";

/// Class path of the parallel union container
pub const FEATURE_UNION_CLASS: &str = "sklearn.pipeline.FeatureUnion";

/// Class path of the column-routed union container
pub const COLUMN_TRANSFORMER_CLASS: &str = "sklearn.compose.ColumnTransformer";

/// Composite parameter holding a feature union's children
pub const TRANSFORMER_LIST: &str = "transformer_list";

/// Composite parameter holding a column transformer's children
pub const TRANSFORMERS: &str = "transformers";

/// Parameter holding a column transformer's column selectors, parallel to
/// [`TRANSFORMERS`]
pub const TRANSFORMER_COLUMNS: &str = "transformer_columns";

/// One node of a pipeline graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Transform {
    Estimator(Estimator),
    Pipeline(Pipeline),
    FeatureUnion(FeatureUnion),
    ColumnTransformer(ColumnTransformer),
}

impl Transform {
    /// Fully-qualified class path
    pub fn class_path(&self) -> &str {
        match self {
            Self::Estimator(e) => &e.class_path,
            Self::Pipeline(_) => PIPELINE_CLASS,
            Self::FeatureUnion(u) => &u.class_path,
            Self::ColumnTransformer(c) => &c.class_path,
        }
    }

    /// Shape of this unit
    pub fn kind(&self) -> TransformKind {
        match self {
            Self::Estimator(_) => TransformKind::Leaf,
            Self::Pipeline(_) => TransformKind::Sequential,
            Self::FeatureUnion(_) => TransformKind::ParallelUnion,
            Self::ColumnTransformer(_) => TransformKind::ColumnUnion,
        }
    }

    /// Ordinary (non-composite) parameters, shallow
    pub fn params(&self) -> Option<&Params> {
        match self {
            Self::Estimator(e) => Some(&e.params),
            Self::Pipeline(_) => None,
            Self::FeatureUnion(u) => Some(&u.params),
            Self::ColumnTransformer(c) => Some(&c.params),
        }
    }

    /// Whether this unit itself carries state learned from data
    pub fn is_configured(&self) -> bool {
        match self {
            Self::Estimator(e) => e.configured,
            _ => false,
        }
    }

    /// Find the first unit in this subtree that carries learned state.
    ///
    /// Returns its class path and a slash-separated location rooted at
    /// `location`.
    pub fn find_configured(&self, location: &str) -> Option<(String, String)> {
        if self.is_configured() {
            return Some((self.class_path().to_string(), location.to_string()));
        }

        for (name, child) in self.named_children() {
            if let Some(found) = child.find_configured(&format!("{}/{}", location, name)) {
                return Some(found);
            }
        }

        self.params()
            .and_then(|params| find_configured_in_params(params, location))
    }

    /// Find the first pipeline step or union child below this unit whose
    /// name is empty, and return its location.
    ///
    /// Units nested in mapping parameters are skipped; they travel wrapped and
    /// never become named steps.
    pub fn find_unnamed(&self, location: &str) -> Option<String> {
        for (position, (name, child)) in self.named_children().into_iter().enumerate() {
            if name.is_empty() {
                return Some(format!("{}[{}]", location, position));
            }
            if let Some(found) = child.find_unnamed(&format!("{}/{}", location, name)) {
                return Some(found);
            }
        }

        self.params().and_then(|params| {
            params
                .iter()
                .find_map(|(name, value)| find_unnamed_in_value(value, &format!("{}.{}", location, name)))
        })
    }

    fn named_children(&self) -> Vec<(&str, &Transform)> {
        match self {
            Self::Estimator(_) => vec![],
            Self::Pipeline(p) => p.steps.iter().map(|(name, t)| (name.as_str(), t)).collect(),
            Self::FeatureUnion(u) => u
                .transformer_list
                .iter()
                .map(|(name, t)| (name.as_str(), t))
                .collect(),
            Self::ColumnTransformer(c) => c
                .transformers
                .iter()
                .map(|(name, t, _)| (name.as_str(), t))
                .collect(),
        }
    }
}

fn find_unnamed_in_value(value: &ParamValue, location: &str) -> Option<String> {
    match value {
        ParamValue::Transform(t) => t.find_unnamed(location),
        ParamValue::List(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, item)| find_unnamed_in_value(item, &format!("{}[{}]", location, i))),
        _ => None,
    }
}

fn find_configured_in_params(params: &Params, location: &str) -> Option<(String, String)> {
    params
        .iter()
        .find_map(|(name, value)| find_configured_in_value(value, &format!("{}.{}", location, name)))
}

fn find_configured_in_value(value: &ParamValue, location: &str) -> Option<(String, String)> {
    match value {
        ParamValue::Transform(t) => t.find_configured(location),
        ParamValue::List(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, item)| find_configured_in_value(item, &format!("{}[{}]", location, i))),
        ParamValue::Map(map) => find_configured_in_params(map, location),
        _ => None,
    }
}

impl From<Estimator> for Transform {
    fn from(e: Estimator) -> Self {
        Self::Estimator(e)
    }
}

impl From<Pipeline> for Transform {
    fn from(p: Pipeline) -> Self {
        Self::Pipeline(p)
    }
}

impl From<FeatureUnion> for Transform {
    fn from(u: FeatureUnion) -> Self {
        Self::FeatureUnion(u)
    }
}

impl From<ColumnTransformer> for Transform {
    fn from(c: ColumnTransformer) -> Self {
        Self::ColumnTransformer(c)
    }
}

/// A leaf transform unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimator {
    /// Fully-qualified class path (e.g. `sklearn.impute.SimpleImputer`)
    pub class_path: String,

    /// Constructor parameters
    pub params: Params,

    /// Carries state learned from data
    pub configured: bool,
}

impl Estimator {
    pub fn new(class_path: impl Into<String>) -> Self {
        Self {
            class_path: class_path.into(),
            params: Params::new(),
            configured: false,
        }
    }

    /// Set a parameter
    pub fn param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Mark the estimator as fitted
    pub fn fitted(mut self) -> Self {
        self.configured = true;
        self
    }
}

/// Sequential chain of named transforms
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    /// Steps in execution order
    pub steps: Vec<(String, Transform)>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named step
    pub fn step(mut self, name: impl Into<String>, transform: impl Into<Transform>) -> Self {
        self.steps.push((name.into(), transform.into()));
        self
    }

    /// Get a step by name
    pub fn get_step(&self, name: &str) -> Option<&Transform> {
        self.steps.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    /// Get all step names
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Find the first unit in the pipeline that carries learned state
    pub fn find_configured(&self) -> Option<(String, String)> {
        self.steps
            .iter()
            .find_map(|(name, t)| t.find_configured(name))
    }

    /// Location of the first step or union child with an empty name
    pub fn find_unnamed(&self) -> Option<String> {
        self.steps.iter().enumerate().find_map(|(position, (name, t))| {
            if name.is_empty() {
                Some(format!("pipeline[{}]", position))
            } else {
                t.find_unnamed(name)
            }
        })
    }
}

/// Named transforms applied to the same input, outputs concatenated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureUnion {
    pub class_path: String,

    /// Children in order
    pub transformer_list: Vec<(String, Transform)>,

    /// Remaining constructor parameters
    pub params: Params,
}

impl FeatureUnion {
    pub fn new() -> Self {
        Self {
            class_path: FEATURE_UNION_CLASS.to_string(),
            transformer_list: Vec::new(),
            params: Params::new(),
        }
    }

    /// Append a named child
    pub fn transformer(mut self, name: impl Into<String>, transform: impl Into<Transform>) -> Self {
        self.transformer_list.push((name.into(), transform.into()));
        self
    }

    /// Set a parameter
    pub fn param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

impl Default for FeatureUnion {
    fn default() -> Self {
        Self::new()
    }
}

/// Named transforms each applied to a selected subset of columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransformer {
    pub class_path: String,

    /// `(name, transform, column selector)` triples in order
    pub transformers: Vec<(String, Transform, ParamValue)>,

    /// Remaining constructor parameters
    pub params: Params,
}

impl ColumnTransformer {
    pub fn new() -> Self {
        Self {
            class_path: COLUMN_TRANSFORMER_CLASS.to_string(),
            transformers: Vec::new(),
            params: Params::new(),
        }
    }

    /// Append a named child routed to `columns`
    pub fn transformer(
        mut self,
        name: impl Into<String>,
        transform: impl Into<Transform>,
        columns: impl Into<ParamValue>,
    ) -> Self {
        self.transformers
            .push((name.into(), transform.into(), columns.into()));
        self
    }

    /// Set a parameter
    pub fn param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

impl Default for ColumnTransformer {
    fn default() -> Self {
        Self::new()
    }
}
