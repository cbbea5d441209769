use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use spamdet::{
    LogisticError, LogisticParams, LogisticRegression, MultinomialNb, MultinomialNbParams,
    NaiveBayesError, TfidfError, TfidfVectorizer,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::classifier::{LogisticAdapter, NaiveBayesAdapter, SpamDetector, TfidfAdapter};

pub const DEFAULT_MODEL_DIR: &str = "spam_model";
pub const DEFAULT_CLASSIFIER_FILE: &str = "model.json";
pub const DEFAULT_VECTORIZER_FILE: &str = "tfidf.json";

/// Errors that can occur while loading the model artifacts.
#[derive(Debug, Error)]
pub enum LoadError {
    /// One or both artifact files do not exist.
    #[error("Pre-trained model files not found.")]
    NotFound { missing: Vec<PathBuf> },
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("vectorizer {}: {source}", path.display())]
    Vectorizer { path: PathBuf, source: TfidfError },
    #[error("classifier: {0}")]
    NaiveBayes(#[from] NaiveBayesError),
    #[error("classifier: {0}")]
    Logistic(#[from] LogisticError),
    /// The classifier is not a two-class spam/ham model.
    #[error("expected a binary spam/ham classifier, found {0} classes")]
    NotBinary(usize),
    /// A class tag that maps to neither spam nor ham (or maps to one twice).
    #[error("class {0} is not a distinct spam or ham label")]
    UnknownClass(String),
    /// The vectorizer and classifier were fitted on different feature spaces.
    #[error("vectorizer produces {vectorizer} features but classifier expects {classifier}")]
    DimensionMismatch { vectorizer: usize, classifier: usize },
}

impl LoadError {
    /// The line shown in the status area when loading fails.
    pub fn status_message(&self) -> String {
        match self {
            LoadError::NotFound { .. } => self.to_string(),
            other => format!("Could not load pre-trained model: {}", other),
        }
    }
}

/// Where the two artifacts live on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub dir: PathBuf,
    pub classifier: PathBuf,
    pub vectorizer: PathBuf,
}

impl ModelPaths {
    pub fn new(dir: impl Into<PathBuf>, classifier_file: &str, vectorizer_file: &str) -> Self {
        let dir = dir.into();
        Self {
            classifier: dir.join(classifier_file),
            vectorizer: dir.join(vectorizer_file),
            dir,
        }
    }

    /// `spam_model/model.json` and `spam_model/tfidf.json`.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, DEFAULT_CLASSIFIER_FILE, DEFAULT_VECTORIZER_FILE)
    }

    fn file_name(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }

    pub fn classifier_name(&self) -> String {
        Self::file_name(&self.classifier)
    }

    pub fn vectorizer_name(&self) -> String {
        Self::file_name(&self.vectorizer)
    }
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self::from_dir(DEFAULT_MODEL_DIR)
    }
}

/// The classifier artifact, tagged by model family.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ClassifierArtifact {
    MultinomialNb(MultinomialNbParams<f64>),
    LogisticRegression(LogisticParams<f64>),
}

/// Loads and cross-checks both artifacts.
///
/// Both files must exist before either is parsed.
pub fn load_detector(paths: &ModelPaths) -> Result<SpamDetector, LoadError> {
    let missing: Vec<PathBuf> = [&paths.classifier, &paths.vectorizer]
        .into_iter()
        .filter(|p| !p.is_file())
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::NotFound { missing });
    }

    let classifier: Box<dyn crate::classifier::Classifier> =
        match read_json::<ClassifierArtifact>(&paths.classifier)? {
            ClassifierArtifact::MultinomialNb(params) => {
                Box::new(NaiveBayesAdapter::new(MultinomialNb::from_params(params)?)?)
            }
            ClassifierArtifact::LogisticRegression(params) => {
                Box::new(LogisticAdapter::new(LogisticRegression::from_params(params)?)?)
            }
        };

    let vectorizer: TfidfVectorizer<f64> =
        TfidfVectorizer::from_reader(open(&paths.vectorizer)?).map_err(|source| {
            LoadError::Vectorizer {
                path: paths.vectorizer.clone(),
                source,
            }
        })?;

    SpamDetector::new(Box::new(TfidfAdapter::new(vectorizer)), classifier)
}

/// Loads the detector, logging the outcome, and returns the status line to show.
pub fn load_with_status(paths: &ModelPaths) -> (Option<SpamDetector>, String) {
    match load_detector(paths) {
        Ok(detector) => {
            info!(
                dir = %paths.dir.display(),
                model = %detector.describe(),
                "pre-trained model loaded"
            );
            (
                Some(detector),
                "Pre-trained model loaded successfully!".to_string(),
            )
        }
        Err(LoadError::NotFound { missing }) => {
            for path in &missing {
                warn!(path = %path.display(), "model file not found");
            }
            (None, LoadError::NotFound { missing }.status_message())
        }
        Err(e) => {
            warn!(error = %e, "could not load pre-trained model");
            (None, e.status_message())
        }
    }
}

fn open(path: &Path) -> Result<BufReader<File>, LoadError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    serde_json::from_reader(open(path)?).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}
