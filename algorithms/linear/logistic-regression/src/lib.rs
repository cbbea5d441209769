use ndarray::{Array1, Array2};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use spamdet_helpers::{ClassTag, Float, SparseError, SparseVector, argmax, softmax_in_place};
use thiserror::Error;

/// Errors that can occur when loading or evaluating a logistic regression model.
#[derive(Debug, Error)]
pub enum LogisticError {
    /// A model needs at least two classes.
    #[error("logistic regression needs at least two classes, found {0}")]
    TooFewClasses(usize),
    /// `coef` and `intercept` must have one row (binary) or one row per class.
    #[error("expected {expected} {what}, found {found}")]
    RowCountMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// The rows of `coef` differ in length.
    #[error("coef row {row} has {found} columns, expected {expected}")]
    RaggedMatrix {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// A weight is NaN or infinite.
    #[error("{0} contains a non-finite weight")]
    NonFiniteWeight(&'static str),
    /// The input does not have the model's number of features.
    #[error("expected {expected} features, found {found}")]
    FeatureCountMismatch { expected: usize, found: usize },
    #[error("could not determine a most likely class")]
    NoLikelyClass,
    #[error("malformed classifier artifact: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Sparse(#[from] SparseError),
}

/// The fitted state of a logistic regression model, as exported by the training toolchain.
///
/// A binary model has a single `coef` row and a single intercept scoring
/// the second class; a multinomial model has one of each per class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticParams<F> {
    pub classes: Vec<ClassTag>,
    pub coef: Vec<Vec<F>>,
    pub intercept: Vec<F>,
}

/// A fitted logistic regression classifier over sparse features.
#[derive(Debug, Clone)]
pub struct LogisticRegression<F: Float> {
    classes: Vec<ClassTag>,
    coef: Array2<F>,
    intercept: Array1<F>,
}

impl<F: Float> LogisticRegression<F> {
    /// Builds a model from exported parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if there are fewer than two classes, if the number of
    /// weight rows does not fit the number of classes, if `coef` is ragged,
    /// or if any weight is not finite.
    pub fn from_params(params: LogisticParams<F>) -> Result<Self, LogisticError> {
        let n_classes = params.classes.len();
        if n_classes < 2 {
            return Err(LogisticError::TooFewClasses(n_classes));
        }
        let expected_rows = if n_classes == 2 { 1 } else { n_classes };
        if params.coef.len() != expected_rows {
            return Err(LogisticError::RowCountMismatch {
                what: "coef rows",
                expected: expected_rows,
                found: params.coef.len(),
            });
        }
        if params.intercept.len() != expected_rows {
            return Err(LogisticError::RowCountMismatch {
                what: "intercept entries",
                expected: expected_rows,
                found: params.intercept.len(),
            });
        }

        let n_features = params.coef[0].len();
        let mut flat = Vec::with_capacity(expected_rows * n_features);
        for (row, values) in params.coef.into_iter().enumerate() {
            if values.len() != n_features {
                return Err(LogisticError::RaggedMatrix {
                    row,
                    expected: n_features,
                    found: values.len(),
                });
            }
            flat.extend(values);
        }
        if flat.iter().any(|w| !w.is_finite()) {
            return Err(LogisticError::NonFiniteWeight("coef"));
        }
        if params.intercept.iter().any(|w| !w.is_finite()) {
            return Err(LogisticError::NonFiniteWeight("intercept"));
        }

        let coef = Array2::from_shape_vec((expected_rows, n_features), flat).map_err(|_| {
            LogisticError::RaggedMatrix {
                row: 0,
                expected: n_features,
                found: 0,
            }
        })?;

        Ok(Self {
            classes: params.classes,
            coef,
            intercept: Array1::from(params.intercept),
        })
    }

    /// Parses and validates a JSON artifact.
    pub fn from_json(json: &str) -> Result<Self, LogisticError>
    where
        F: DeserializeOwned,
    {
        let params: LogisticParams<F> = serde_json::from_str(json)?;
        Self::from_params(params)
    }

    pub fn classes(&self) -> &[ClassTag] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.coef.ncols()
    }

    /// Raw linear scores, one per row of `coef`.
    pub fn decision_function(&self, features: &SparseVector<F>) -> Result<Array1<F>, LogisticError> {
        if features.dim() != self.n_features() {
            return Err(LogisticError::FeatureCountMismatch {
                expected: self.n_features(),
                found: features.dim(),
            });
        }
        let mut scores = self.intercept.clone();
        for (r, row) in self.coef.rows().into_iter().enumerate() {
            scores[r] += features.dot(row)?;
        }
        Ok(scores)
    }

    /// Probability of each class, in `classes()` order.
    pub fn predict_proba(&self, features: &SparseVector<F>) -> Result<Array1<F>, LogisticError> {
        let scores = self.decision_function(features)?;
        if self.classes.len() == 2 {
            let positive = sigmoid(scores[0]);
            return Ok(Array1::from(vec![F::one() - positive, positive]));
        }
        let mut proba = scores;
        softmax_in_place(proba.view_mut());
        Ok(proba)
    }

    /// Index (into `classes()`) of the most likely class.
    pub fn predict(&self, features: &SparseVector<F>) -> Result<usize, LogisticError> {
        let proba = self.predict_proba(features)?;
        argmax(proba.view()).ok_or(LogisticError::NoLikelyClass)
    }
}

/// Logistic function, evaluated without overflow for large `|z|`.
fn sigmoid<F: Float>(z: F) -> F {
    if z >= F::zero() {
        F::one() / (F::one() + (-z).exp())
    } else {
        let e = z.exp();
        e / (F::one() + e)
    }
}
