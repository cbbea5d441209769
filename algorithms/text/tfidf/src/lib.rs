use std::collections::{HashMap, HashSet};
use std::io::Read;

use ndarray::Array1;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use spamdet_helpers::{Float, SparseError, SparseVector};
use thiserror::Error;

/// The token pattern used when an exported vectorizer does not carry one:
/// words of two or more word characters.
pub const DEFAULT_TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

/// Errors that can occur when loading or applying a TF-IDF vectorizer.
#[derive(Debug, Error)]
pub enum TfidfError {
    /// The exported token pattern is not a valid regular expression.
    #[error("invalid token pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    /// The token pattern has more than one capture group.
    #[error("token pattern may contain at most one capture group, found {0}")]
    TooManyCaptureGroups(usize),
    /// `ngram_range` is empty or starts at zero.
    #[error("invalid n-gram range ({min}, {max})")]
    InvalidNgramRange { min: usize, max: usize },
    /// The vocabulary maps a term outside `0..vocabulary.len()`, or two terms share a column.
    #[error("vocabulary term {term:?} has invalid column {column} (vocabulary size {dim})")]
    InvalidColumn {
        term: String,
        column: usize,
        dim: usize,
    },
    /// `use_idf` is set but no idf weights were exported.
    #[error("idf weights are required when use_idf is true")]
    MissingIdf,
    /// The idf weights do not line up with the vocabulary.
    #[error("idf has {found} weights but the vocabulary has {expected} terms")]
    IdfLengthMismatch { expected: usize, found: usize },
    /// An idf weight is NaN or infinite.
    #[error("idf weight for column {0} is not finite")]
    NonFiniteIdf(usize),
    /// The exported document is not valid JSON for this format.
    #[error("malformed vectorizer artifact: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Sparse(#[from] SparseError),
}

/// Row normalization applied after weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

/// The fitted state of a TF-IDF vectorizer, as exported by the training toolchain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "F: Deserialize<'de>"))]
pub struct TfidfParams<F> {
    pub vocabulary: HashMap<String, usize>,
    #[serde(default)]
    pub idf: Option<Vec<F>>,
    #[serde(default = "enabled")]
    pub use_idf: bool,
    #[serde(default = "enabled")]
    pub lowercase: bool,
    #[serde(default = "default_token_pattern")]
    pub token_pattern: String,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default)]
    pub stop_words: Vec<String>,
    #[serde(default)]
    pub binary: bool,
    #[serde(default)]
    pub sublinear_tf: bool,
    #[serde(default = "default_norm")]
    pub norm: Option<Norm>,
}

fn enabled() -> bool {
    true
}

fn default_token_pattern() -> String {
    DEFAULT_TOKEN_PATTERN.to_string()
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

impl<F> TfidfParams<F> {
    /// Parameters with the default analyzer settings for a fitted vocabulary and idf.
    pub fn new(vocabulary: HashMap<String, usize>, idf: Vec<F>) -> Self {
        TfidfParams {
            vocabulary,
            idf: Some(idf),
            use_idf: true,
            lowercase: true,
            token_pattern: default_token_pattern(),
            ngram_range: default_ngram_range(),
            stop_words: Vec::new(),
            binary: false,
            sublinear_tf: false,
            norm: default_norm(),
        }
    }
}

/// A fitted TF-IDF vectorizer.
///
/// Maps a document to a sparse vector with one column per vocabulary term:
/// term counts, optionally clamped or log-scaled, weighted by idf and
/// normalized per row. Terms outside the vocabulary are ignored.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer<F: Float> {
    vocabulary: HashMap<String, usize>,
    idf: Option<Array1<F>>,
    token_pattern: Regex,
    lowercase: bool,
    ngram_range: (usize, usize),
    stop_words: HashSet<String>,
    binary: bool,
    sublinear_tf: bool,
    norm: Option<Norm>,
}

impl<F: Float> TfidfVectorizer<F> {
    /// Builds a vectorizer from exported parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the token pattern does not compile or has more than
    /// one capture group, if the n-gram range is invalid, if the vocabulary
    /// columns are not exactly `0..vocabulary.len()`, or if the idf weights are
    /// missing, mis-sized or not finite.
    pub fn from_params(params: TfidfParams<F>) -> Result<Self, TfidfError> {
        let (min_n, max_n) = params.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(TfidfError::InvalidNgramRange {
                min: min_n,
                max: max_n,
            });
        }

        let token_pattern = Regex::new(&params.token_pattern)?;
        // captures_len counts the implicit whole-match group.
        let groups = token_pattern.captures_len() - 1;
        if groups > 1 {
            return Err(TfidfError::TooManyCaptureGroups(groups));
        }

        let dim = params.vocabulary.len();
        let mut seen = vec![false; dim];
        for (term, &column) in &params.vocabulary {
            if column >= dim || seen[column] {
                return Err(TfidfError::InvalidColumn {
                    term: term.clone(),
                    column,
                    dim,
                });
            }
            seen[column] = true;
        }

        let idf = if params.use_idf {
            let idf = params.idf.ok_or(TfidfError::MissingIdf)?;
            if idf.len() != dim {
                return Err(TfidfError::IdfLengthMismatch {
                    expected: dim,
                    found: idf.len(),
                });
            }
            if let Some(column) = idf.iter().position(|w| !w.is_finite()) {
                return Err(TfidfError::NonFiniteIdf(column));
            }
            Some(Array1::from(idf))
        } else {
            None
        };

        Ok(Self {
            vocabulary: params.vocabulary,
            idf,
            token_pattern,
            lowercase: params.lowercase,
            ngram_range: params.ngram_range,
            stop_words: params.stop_words.into_iter().collect(),
            binary: params.binary,
            sublinear_tf: params.sublinear_tf,
            norm: params.norm,
        })
    }

    /// Parses and validates a JSON artifact.
    pub fn from_json(json: &str) -> Result<Self, TfidfError>
    where
        F: DeserializeOwned,
    {
        let params: TfidfParams<F> = serde_json::from_str(json)?;
        Self::from_params(params)
    }

    /// Reads, parses and validates a JSON artifact.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TfidfError>
    where
        F: DeserializeOwned,
    {
        let params: TfidfParams<F> = serde_json::from_reader(reader)?;
        Self::from_params(params)
    }

    /// Number of output columns.
    pub fn dim(&self) -> usize {
        self.vocabulary.len()
    }

    /// Splits a document into analyzer terms: tokens with stop words removed,
    /// expanded into the configured word n-grams.
    pub fn analyze(&self, document: &str) -> Vec<String> {
        let document = if self.lowercase {
            document.to_lowercase()
        } else {
            document.to_string()
        };

        let tokens: Vec<&str> = if self.token_pattern.captures_len() == 2 {
            self.token_pattern
                .captures_iter(&document)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str())
                .collect()
        } else {
            self.token_pattern
                .find_iter(&document)
                .map(|m| m.as_str())
                .collect()
        };

        let tokens: Vec<&str> = tokens
            .into_iter()
            .filter(|t| !self.stop_words.contains(*t))
            .collect();

        word_ngrams(&tokens, self.ngram_range)
    }

    /// Transforms a document into its TF-IDF feature vector.
    pub fn transform(&self, document: &str) -> Result<SparseVector<F>, TfidfError> {
        let counts: Vec<(usize, F)> = self
            .analyze(document)
            .iter()
            .filter_map(|term| self.vocabulary.get(term))
            .map(|&column| (column, F::one()))
            .collect();

        let mut features = SparseVector::from_entries(self.dim(), counts)?;

        if self.binary {
            features.map_in_place(|_, _| F::one());
        }
        if self.sublinear_tf {
            features.map_in_place(|_, tf| F::one() + tf.ln());
        }
        if let Some(idf) = &self.idf {
            features.map_in_place(|column, tf| tf * idf[column]);
        }

        let norm = match self.norm {
            Some(Norm::L1) => features.l1_norm(),
            Some(Norm::L2) => features.l2_norm(),
            None => F::zero(),
        };
        if norm > F::zero() {
            features.scale(F::one() / norm);
        }

        Ok(features)
    }
}

/// Expands tokens into every n-gram with `min_n <= n <= max_n`, joined by spaces.
fn word_ngrams(tokens: &[&str], (min_n, max_n): (usize, usize)) -> Vec<String> {
    let mut terms = Vec::new();
    for n in min_n..=max_n.min(tokens.len()) {
        for window in tokens.windows(n) {
            terms.push(window.join(" "));
        }
    }
    terms
}
