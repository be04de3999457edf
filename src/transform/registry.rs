// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! Transform registry
//!
//! Maps class paths to constructors. The decoder looks every `SKLEARN` step
//! up here; a class path that is not registered cannot be rebuilt.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{
    ColumnTransformer, Estimator, FeatureUnion, ParamValue, Params, Transform,
    COLUMN_TRANSFORMER_CLASS, FEATURE_UNION_CLASS,
};
use crate::errors::{FlowError, FlowResult};

/// Structural shape of a transform unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    /// Ordinary unit
    Leaf,
    /// Ordered chain of named units
    Sequential,
    /// Named units fed the same input
    ParallelUnion,
    /// Named units fed selected columns
    ColumnUnion,
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf => write!(f, "leaf"),
            Self::Sequential => write!(f, "sequential"),
            Self::ParallelUnion => write!(f, "parallel union"),
            Self::ColumnUnion => write!(f, "column union"),
        }
    }
}

/// Everything a constructor receives once all references are resolved
#[derive(Debug, Clone, PartialEq)]
pub enum Construction {
    Leaf {
        params: Params,
    },
    ParallelUnion {
        transformer_list: Vec<(String, Transform)>,
        params: Params,
    },
    ColumnUnion {
        transformers: Vec<(String, Transform, ParamValue)>,
        params: Params,
    },
}

/// Constructor for a registered class path
pub type TransformFactory =
    Arc<dyn Fn(&str, Construction) -> FlowResult<Transform> + Send + Sync>;

/// A registered class
#[derive(Clone)]
pub struct Registration {
    kind: TransformKind,
    factory: TransformFactory,
}

impl Registration {
    pub fn kind(&self) -> TransformKind {
        self.kind
    }

    /// Build a transform of `class_path`
    pub fn build(&self, class_path: &str, construction: Construction) -> FlowResult<Transform> {
        (self.factory)(class_path, construction)
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Class path to constructor mapping
#[derive(Debug, Clone, Default)]
pub struct TransformRegistry {
    entries: HashMap<String, Registration>,
}

impl TransformRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the common scikit-learn classes
    pub fn sklearn() -> Self {
        let mut registry = Self::new();

        for class_path in SKLEARN_ESTIMATORS {
            registry.register_estimator(*class_path);
        }

        registry.register_feature_union(FEATURE_UNION_CLASS);
        registry.register_column_transformer(COLUMN_TRANSFORMER_CLASS);

        registry
    }

    /// Register a leaf class built with the default constructor
    pub fn register_estimator(&mut self, class_path: impl Into<String>) -> &mut Self {
        self.register_with(class_path, TransformKind::Leaf, Arc::new(default_factory))
    }

    /// Register a parallel union class built with the default constructor
    pub fn register_feature_union(&mut self, class_path: impl Into<String>) -> &mut Self {
        self.register_with(
            class_path,
            TransformKind::ParallelUnion,
            Arc::new(default_factory),
        )
    }

    /// Register a column union class built with the default constructor
    pub fn register_column_transformer(&mut self, class_path: impl Into<String>) -> &mut Self {
        self.register_with(
            class_path,
            TransformKind::ColumnUnion,
            Arc::new(default_factory),
        )
    }

    /// Register a class with a custom constructor
    pub fn register_with(
        &mut self,
        class_path: impl Into<String>,
        kind: TransformKind,
        factory: TransformFactory,
    ) -> &mut Self {
        self.entries
            .insert(class_path.into(), Registration { kind, factory });
        self
    }

    /// Look a class path up
    pub fn get(&self, class_path: &str) -> Option<&Registration> {
        self.entries.get(class_path)
    }

    pub fn contains(&self, class_path: &str) -> bool {
        self.entries.contains_key(class_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered class paths, sorted
    pub fn class_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}

/// Builds the plain in-memory representation of each shape
fn default_factory(class_path: &str, construction: Construction) -> FlowResult<Transform> {
    let transform = match construction {
        Construction::Leaf { params } => Estimator {
            class_path: class_path.to_string(),
            params,
            configured: false,
        }
        .into(),
        Construction::ParallelUnion {
            transformer_list,
            params,
        } => FeatureUnion {
            class_path: class_path.to_string(),
            transformer_list,
            params,
        }
        .into(),
        Construction::ColumnUnion {
            transformers,
            params,
        } => ColumnTransformer {
            class_path: class_path.to_string(),
            transformers,
            params,
        }
        .into(),
    };

    Ok(transform)
}

/// Wraps a constructor so it rejects parameters outside `allowed`
pub fn with_allowed_params(allowed: &'static [&'static str], factory: TransformFactory) -> TransformFactory {
    Arc::new(move |class_path: &str, construction: Construction| {
        let params = match &construction {
            Construction::Leaf { params }
            | Construction::ParallelUnion { params, .. }
            | Construction::ColumnUnion { params, .. } => params,
        };

        if let Some(name) = params.keys().find(|name| !allowed.contains(&name.as_str())) {
            return Err(FlowError::InvalidParameter {
                class_path: class_path.to_string(),
                name: name.clone(),
                reason: format!("expected one of: {}", allowed.join(", ")),
            });
        }

        factory(class_path, construction)
    })
}

const SKLEARN_ESTIMATORS: &[&str] = &[
    // Preprocessing
    "sklearn.impute.SimpleImputer",
    "sklearn.impute.KNNImputer",
    "sklearn.preprocessing.StandardScaler",
    "sklearn.preprocessing.MinMaxScaler",
    "sklearn.preprocessing.MaxAbsScaler",
    "sklearn.preprocessing.RobustScaler",
    "sklearn.preprocessing.Normalizer",
    "sklearn.preprocessing.OneHotEncoder",
    "sklearn.preprocessing.OrdinalEncoder",
    "sklearn.preprocessing.PolynomialFeatures",
    "sklearn.preprocessing.FunctionTransformer",
    "sklearn.preprocessing.KBinsDiscretizer",
    // Feature extraction and selection
    "sklearn.feature_extraction.text.CountVectorizer",
    "sklearn.feature_extraction.text.TfidfTransformer",
    "sklearn.feature_extraction.text.TfidfVectorizer",
    "sklearn.feature_selection.SelectKBest",
    "sklearn.feature_selection.VarianceThreshold",
    "sklearn.feature_selection.RFE",
    // Decomposition
    "sklearn.decomposition.PCA",
    "sklearn.decomposition.TruncatedSVD",
    // Linear models
    "sklearn.linear_model.LogisticRegression",
    "sklearn.linear_model.LinearRegression",
    "sklearn.linear_model.Ridge",
    "sklearn.linear_model.Lasso",
    "sklearn.linear_model.SGDClassifier",
    // Other estimators
    "sklearn.svm.SVC",
    "sklearn.svm.SVR",
    "sklearn.neighbors.KNeighborsClassifier",
    "sklearn.naive_bayes.GaussianNB",
    "sklearn.tree.DecisionTreeClassifier",
    "sklearn.tree.DecisionTreeRegressor",
    // Ensembles
    "sklearn.ensemble.RandomForestClassifier",
    "sklearn.ensemble.RandomForestRegressor",
    "sklearn.ensemble.GradientBoostingClassifier",
    "sklearn.ensemble.AdaBoostClassifier",
    "sklearn.ensemble.BaggingClassifier",
    "sklearn.ensemble.VotingClassifier",
];
