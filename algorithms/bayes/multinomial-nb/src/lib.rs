use ndarray::{Array1, Array2};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use spamdet_helpers::{ClassTag, Float, SparseError, SparseVector, argmax, softmax_in_place};
use thiserror::Error;

/// Errors that can occur when loading or evaluating a multinomial naive Bayes model.
#[derive(Debug, Error)]
pub enum NaiveBayesError {
    /// A model needs at least one class.
    #[error("model has no classes")]
    NoClasses,
    /// `class_log_prior` or `feature_log_prob` do not have one row per class.
    #[error("expected {expected} {what}, found {found}")]
    ClassCountMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// The rows of `feature_log_prob` differ in length.
    #[error("feature_log_prob row {row} has {found} columns, expected {expected}")]
    RaggedMatrix {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// A log probability is NaN or positive infinity.
    #[error("{0} contains a non-finite log probability")]
    InvalidLogProb(&'static str),
    /// The input does not have the model's number of features.
    #[error("expected {expected} features, found {found}")]
    FeatureCountMismatch { expected: usize, found: usize },
    /// The joint log likelihood degenerated (every class scored NaN).
    #[error("could not determine a most likely class")]
    NoLikelyClass,
    #[error("malformed classifier artifact: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Sparse(#[from] SparseError),
}

/// The fitted state of a multinomial naive Bayes model, as exported by the training toolchain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultinomialNbParams<F> {
    pub classes: Vec<ClassTag>,
    pub class_log_prior: Vec<F>,
    pub feature_log_prob: Vec<Vec<F>>,
}

/// A fitted multinomial naive Bayes classifier.
///
/// Scores each class by `log P(c) + Σ_j x_j · log P(j | c)` and turns the
/// scores into a posterior distribution.
#[derive(Debug, Clone)]
pub struct MultinomialNb<F: Float> {
    classes: Vec<ClassTag>,
    class_log_prior: Array1<F>,
    feature_log_prob: Array2<F>,
}

impl<F: Float> MultinomialNb<F> {
    /// Builds a model from exported parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no classes, if the prior or the
    /// likelihood matrix do not have one row per class, if the matrix is
    /// ragged, or if any log probability is NaN or `+inf`. A log probability of
    /// `-inf` (zero probability) is accepted.
    pub fn from_params(params: MultinomialNbParams<F>) -> Result<Self, NaiveBayesError> {
        let n_classes = params.classes.len();
        if n_classes == 0 {
            return Err(NaiveBayesError::NoClasses);
        }
        if params.class_log_prior.len() != n_classes {
            return Err(NaiveBayesError::ClassCountMismatch {
                what: "class_log_prior entries",
                expected: n_classes,
                found: params.class_log_prior.len(),
            });
        }
        if params.feature_log_prob.len() != n_classes {
            return Err(NaiveBayesError::ClassCountMismatch {
                what: "feature_log_prob rows",
                expected: n_classes,
                found: params.feature_log_prob.len(),
            });
        }

        let n_features = params.feature_log_prob[0].len();
        let mut flat = Vec::with_capacity(n_classes * n_features);
        for (row, values) in params.feature_log_prob.into_iter().enumerate() {
            if values.len() != n_features {
                return Err(NaiveBayesError::RaggedMatrix {
                    row,
                    expected: n_features,
                    found: values.len(),
                });
            }
            flat.extend(values);
        }

        let invalid = |v: &F| v.is_nan() || *v == F::infinity();
        if params.class_log_prior.iter().any(invalid) {
            return Err(NaiveBayesError::InvalidLogProb("class_log_prior"));
        }
        if flat.iter().any(invalid) {
            return Err(NaiveBayesError::InvalidLogProb("feature_log_prob"));
        }

        let feature_log_prob = Array2::from_shape_vec((n_classes, n_features), flat)
            .map_err(|_| NaiveBayesError::RaggedMatrix {
                row: 0,
                expected: n_features,
                found: 0,
            })?;

        Ok(Self {
            classes: params.classes,
            class_log_prior: Array1::from(params.class_log_prior),
            feature_log_prob,
        })
    }

    /// Parses and validates a JSON artifact.
    pub fn from_json(json: &str) -> Result<Self, NaiveBayesError>
    where
        F: DeserializeOwned,
    {
        let params: MultinomialNbParams<F> = serde_json::from_str(json)?;
        Self::from_params(params)
    }

    /// Class tags in the order used by every probability vector.
    pub fn classes(&self) -> &[ClassTag] {
        &self.classes
    }

    /// Number of input features.
    pub fn n_features(&self) -> usize {
        self.feature_log_prob.ncols()
    }

    /// Unnormalized log posterior of each class.
    ///
    /// Features are expected to be non-negative weights such as counts or
    /// TF-IDF values.
    pub fn joint_log_likelihood(
        &self,
        features: &SparseVector<F>,
    ) -> Result<Array1<F>, NaiveBayesError> {
        if features.dim() != self.n_features() {
            return Err(NaiveBayesError::FeatureCountMismatch {
                expected: self.n_features(),
                found: features.dim(),
            });
        }
        let mut jll = self.class_log_prior.clone();
        for (c, row) in self.feature_log_prob.rows().into_iter().enumerate() {
            jll[c] += features.dot(row)?;
        }
        Ok(jll)
    }

    /// Posterior probability of each class, in `classes()` order.
    pub fn predict_proba(&self, features: &SparseVector<F>) -> Result<Array1<F>, NaiveBayesError> {
        let mut proba = self.joint_log_likelihood(features)?;
        softmax_in_place(proba.view_mut());
        Ok(proba)
    }

    /// Index (into `classes()`) of the most likely class.
    pub fn predict(&self, features: &SparseVector<F>) -> Result<usize, NaiveBayesError> {
        let jll = self.joint_log_likelihood(features)?;
        argmax(jll.view()).ok_or(NaiveBayesError::NoLikelyClass)
    }
}
