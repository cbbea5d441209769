use spamdet::{
    ClassTag, ClassificationResult, Label, LogisticRegression, MultinomialNb, SparseVector,
    TfidfVectorizer, normalize,
};
use std::error::Error;
use thiserror::Error;
use tracing::debug;

use crate::loader::LoadError;

/// Turns normalized text into a feature vector.
pub trait Vectorizer: Send + Sync {
    fn transform(&self, text: &str) -> Result<SparseVector<f64>, Box<dyn Error + Send + Sync>>;

    /// Number of columns every output vector has.
    fn dim(&self) -> usize;

    /// Return the name of the vectorizer (e.g., "TF-IDF (8000 terms)").
    fn name(&self) -> String;
}

/// Turns a feature vector into a spam/ham decision with class probabilities.
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &SparseVector<f64>)
    -> Result<Prediction, Box<dyn Error + Send + Sync>>;

    /// Number of features the model expects.
    fn n_features(&self) -> usize;

    /// Return the name of the classifier (e.g., "Multinomial NB").
    fn name(&self) -> String;
}

/// A classifier's decision together with the probability of each label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: Label,
    pub spam: f64,
    pub ham: f64,
}

impl Prediction {
    pub fn probability(&self, label: Label) -> f64 {
        match label {
            Label::Spam => self.spam,
            Label::Ham => self.ham,
        }
    }

    /// Probability of the predicted label.
    pub fn confidence(&self) -> f64 {
        self.probability(self.label)
    }
}

/// Why a classification request produced no result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifyError {
    /// The input was empty or only whitespace.
    #[error("Please enter a message to check.")]
    EmptyInput,
    /// No model has been loaded.
    #[error("Model not loaded. Ensure {classifier} and {vectorizer} are in the {dir} directory.")]
    ModelUnavailable {
        dir: String,
        classifier: String,
        vectorizer: String,
    },
    /// Feature extraction or prediction failed.
    #[error("{0}")]
    Inference(String),
}

/// A loaded vectorizer/classifier pair, immutable once built.
pub struct SpamDetector {
    vectorizer: Box<dyn Vectorizer>,
    classifier: Box<dyn Classifier>,
}

impl SpamDetector {
    /// Pairs a vectorizer with a classifier.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::DimensionMismatch` if the vectorizer's output does
    /// not have the number of features the classifier expects.
    pub fn new(
        vectorizer: Box<dyn Vectorizer>,
        classifier: Box<dyn Classifier>,
    ) -> Result<Self, LoadError> {
        if vectorizer.dim() != classifier.n_features() {
            return Err(LoadError::DimensionMismatch {
                vectorizer: vectorizer.dim(),
                classifier: classifier.n_features(),
            });
        }
        Ok(Self {
            vectorizer,
            classifier,
        })
    }

    pub fn describe(&self) -> String {
        format!("{} + {}", self.vectorizer.name(), self.classifier.name())
    }

    /// Runs the full pipeline and returns both class probabilities.
    ///
    /// Empty or whitespace-only input is rejected before it reaches the vectorizer.
    pub fn predict_text(&self, raw_text: &str) -> Result<Prediction, ClassifyError> {
        if raw_text.trim().is_empty() {
            return Err(ClassifyError::EmptyInput);
        }
        let text = normalize(raw_text);
        let features = self
            .vectorizer
            .transform(&text)
            .map_err(|e| ClassifyError::Inference(e.to_string()))?;
        let prediction = self
            .classifier
            .predict(&features)
            .map_err(|e| ClassifyError::Inference(e.to_string()))?;
        debug!(
            label = %prediction.label,
            spam = prediction.spam,
            ham = prediction.ham,
            features = features.nnz(),
            "classified message"
        );
        Ok(prediction)
    }

    /// Classifies a message, reporting the probability of the predicted label.
    pub fn classify(&self, raw_text: &str) -> Result<ClassificationResult, ClassifyError> {
        let prediction = self.predict_text(raw_text)?;
        Ok(ClassificationResult::new(
            prediction.label,
            prediction.confidence(),
        ))
    }
}

// --- Adapters over the model crates ---

pub struct TfidfAdapter {
    vectorizer: TfidfVectorizer<f64>,
}

impl TfidfAdapter {
    pub fn new(vectorizer: TfidfVectorizer<f64>) -> Self {
        Self { vectorizer }
    }
}

impl Vectorizer for TfidfAdapter {
    fn transform(&self, text: &str) -> Result<SparseVector<f64>, Box<dyn Error + Send + Sync>> {
        self.vectorizer.transform(text).map_err(|e| e.into())
    }

    fn dim(&self) -> usize {
        self.vectorizer.dim()
    }

    fn name(&self) -> String {
        format!("TF-IDF ({} terms)", self.vectorizer.dim())
    }
}

/// Positions of the spam and ham classes in a model's class list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryClasses {
    spam: usize,
    ham: usize,
}

impl BinaryClasses {
    /// Requires exactly two classes, one of them spam and the other ham.
    pub fn resolve(classes: &[ClassTag]) -> Result<Self, LoadError> {
        if classes.len() != 2 {
            return Err(LoadError::NotBinary(classes.len()));
        }
        let mut spam = None;
        let mut ham = None;
        for (index, tag) in classes.iter().enumerate() {
            match Label::from_class_tag(tag) {
                Some(Label::Spam) if spam.is_none() => spam = Some(index),
                Some(Label::Ham) if ham.is_none() => ham = Some(index),
                _ => return Err(LoadError::UnknownClass(tag.to_string())),
            }
        }
        match (spam, ham) {
            (Some(spam), Some(ham)) => Ok(Self { spam, ham }),
            _ => Err(LoadError::NotBinary(classes.len())),
        }
    }

    /// Builds a prediction from the predicted class index and the probability vector.
    fn prediction(
        &self,
        index: usize,
        proba: &[f64],
    ) -> Result<Prediction, Box<dyn Error + Send + Sync>> {
        let label = if index == self.spam {
            Label::Spam
        } else {
            Label::Ham
        };
        let spam = proba.get(self.spam).copied().unwrap_or(f64::NAN);
        let ham = proba.get(self.ham).copied().unwrap_or(f64::NAN);
        if !(spam.is_finite() && ham.is_finite()) {
            return Err("classifier produced non-finite probabilities".into());
        }
        Ok(Prediction { label, spam, ham })
    }
}

pub struct NaiveBayesAdapter {
    model: MultinomialNb<f64>,
    classes: BinaryClasses,
}

impl NaiveBayesAdapter {
    pub fn new(model: MultinomialNb<f64>) -> Result<Self, LoadError> {
        let classes = BinaryClasses::resolve(model.classes())?;
        Ok(Self { model, classes })
    }
}

impl Classifier for NaiveBayesAdapter {
    fn predict(
        &self,
        features: &SparseVector<f64>,
    ) -> Result<Prediction, Box<dyn Error + Send + Sync>> {
        let index = self.model.predict(features)?;
        let proba = self.model.predict_proba(features)?;
        self.classes.prediction(index, &proba.to_vec())
    }

    fn n_features(&self) -> usize {
        self.model.n_features()
    }

    fn name(&self) -> String {
        "Multinomial NB".to_string()
    }
}

pub struct LogisticAdapter {
    model: LogisticRegression<f64>,
    classes: BinaryClasses,
}

impl LogisticAdapter {
    pub fn new(model: LogisticRegression<f64>) -> Result<Self, LoadError> {
        let classes = BinaryClasses::resolve(model.classes())?;
        Ok(Self { model, classes })
    }
}

impl Classifier for LogisticAdapter {
    fn predict(
        &self,
        features: &SparseVector<f64>,
    ) -> Result<Prediction, Box<dyn Error + Send + Sync>> {
        let index = self.model.predict(features)?;
        let proba = self.model.predict_proba(features)?;
        self.classes.prediction(index, &proba.to_vec())
    }

    fn n_features(&self) -> usize {
        self.model.n_features()
    }

    fn name(&self) -> String {
        "Logistic Regression".to_string()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use spamdet::{MultinomialNbParams, TfidfParams};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TERMS: [&str; 6] = ["win", "free", "prize", "now", "lunch", "tomorrow"];

    /// A small but real TF-IDF + naive Bayes pair.
    pub(crate) fn toy_detector() -> SpamDetector {
        let vocabulary: HashMap<String, usize> = TERMS
            .iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), i))
            .collect();
        let vectorizer =
            TfidfVectorizer::from_params(TfidfParams::new(vocabulary, vec![1.4, 1.2, 1.9, 1.1, 1.6, 1.5]))
                .unwrap();
        let model = MultinomialNb::from_params(MultinomialNbParams {
            classes: vec![ClassTag::Int(0), ClassTag::Int(1)],
            class_log_prior: vec![-0.2, -1.7],
            feature_log_prob: vec![
                vec![-3.5, -3.2, -4.0, -2.5, -1.2, -1.3],
                vec![-1.1, -1.0, -1.3, -1.6, -4.2, -3.9],
            ],
        })
        .unwrap();
        SpamDetector::new(
            Box::new(TfidfAdapter::new(vectorizer)),
            Box::new(NaiveBayesAdapter::new(model).unwrap()),
        )
        .unwrap()
    }

    /// Records every text it receives and returns a fixed vector.
    struct RecordingVectorizer {
        seen: Mutex<Vec<String>>,
    }

    impl Vectorizer for RecordingVectorizer {
        fn transform(&self, text: &str) -> Result<SparseVector<f64>, Box<dyn Error + Send + Sync>> {
            self.seen.lock().unwrap().push(text.to_string());
            Ok(SparseVector::from_entries(2, vec![(0, 1.0)])?)
        }
        fn dim(&self) -> usize {
            2
        }
        fn name(&self) -> String {
            "recording".to_string()
        }
    }

    /// Always predicts the same thing and counts its calls.
    struct FixedClassifier {
        prediction: Prediction,
        calls: AtomicUsize,
    }

    impl Classifier for FixedClassifier {
        fn predict(
            &self,
            _features: &SparseVector<f64>,
        ) -> Result<Prediction, Box<dyn Error + Send + Sync>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.prediction)
        }
        fn n_features(&self) -> usize {
            2
        }
        fn name(&self) -> String {
            "fixed".to_string()
        }
    }

    struct FailingClassifier;

    impl Classifier for FailingClassifier {
        fn predict(
            &self,
            _features: &SparseVector<f64>,
        ) -> Result<Prediction, Box<dyn Error + Send + Sync>> {
            Err("corrupt model state".into())
        }
        fn n_features(&self) -> usize {
            2
        }
        fn name(&self) -> String {
            "failing".to_string()
        }
    }

    /// A detector whose classifier always fails.
    pub(crate) fn failing_detector() -> SpamDetector {
        SpamDetector::new(Box::new(recording()), Box::new(FailingClassifier)).unwrap()
    }

    fn recording() -> RecordingVectorizer {
        RecordingVectorizer {
            seen: Mutex::new(Vec::new()),
        }
    }

    #[test]
    fn test_scenario_win_free_prize_now() {
        let vectorizer = recording();
        let classifier = FixedClassifier {
            prediction: Prediction {
                label: Label::Spam,
                spam: 0.923,
                ham: 0.077,
            },
            calls: AtomicUsize::new(0),
        };
        let detector = SpamDetector::new(Box::new(vectorizer), Box::new(classifier)).unwrap();

        let result = detector.classify("WIN FREE PRIZE NOW!!!").unwrap();
        assert_eq!(result.label, Label::Spam);
        assert_abs_diff_eq!(result.confidence, 0.923, epsilon = 1e-12);
        assert_eq!(result.to_string(), "SPAM (92.3%)");
    }

    #[test]
    fn test_vectorizer_receives_normalized_text() {
        let vectorizer = std::sync::Arc::new(recording());

        struct Shared(std::sync::Arc<RecordingVectorizer>);
        impl Vectorizer for Shared {
            fn transform(
                &self,
                text: &str,
            ) -> Result<SparseVector<f64>, Box<dyn Error + Send + Sync>> {
                self.0.transform(text)
            }
            fn dim(&self) -> usize {
                self.0.dim()
            }
            fn name(&self) -> String {
                self.0.name()
            }
        }

        let classifier = FixedClassifier {
            prediction: Prediction {
                label: Label::Ham,
                spam: 0.1,
                ham: 0.9,
            },
            calls: AtomicUsize::new(0),
        };
        let detector =
            SpamDetector::new(Box::new(Shared(vectorizer.clone())), Box::new(classifier)).unwrap();
        detector.classify("Free! MONEY now!!!").unwrap();

        assert_eq!(*vectorizer.seen.lock().unwrap(), vec!["free money now".to_string()]);
    }

    #[test]
    fn test_blank_input_never_reaches_the_model() {
        let detector = SpamDetector::new(
            Box::new(recording()),
            Box::new(FailingClassifier),
        )
        .unwrap();
        for input in ["", "   ", "\t\n"] {
            assert_eq!(detector.classify(input), Err(ClassifyError::EmptyInput));
        }
    }

    #[test]
    fn test_inference_failure_is_reported() {
        let detector = failing_detector();
        assert_eq!(
            detector.classify("hello there"),
            Err(ClassifyError::Inference("corrupt model state".to_string()))
        );
        // The detector stays usable after a failure.
        assert!(detector.classify("again").is_err());
        assert_eq!(detector.classify(" "), Err(ClassifyError::EmptyInput));
    }

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        struct Wide;
        impl Classifier for Wide {
            fn predict(
                &self,
                _features: &SparseVector<f64>,
            ) -> Result<Prediction, Box<dyn Error + Send + Sync>> {
                Err("unused".into())
            }
            fn n_features(&self) -> usize {
                7
            }
            fn name(&self) -> String {
                "wide".to_string()
            }
        }
        let result = SpamDetector::new(Box::new(recording()), Box::new(Wide));
        assert!(matches!(
            result,
            Err(LoadError::DimensionMismatch {
                vectorizer: 2,
                classifier: 7
            })
        ));
    }

    #[test]
    fn test_real_models_probabilities_are_complementary() {
        let detector = toy_detector();
        for text in [
            "WIN a FREE prize NOW!!!",
            "lunch tomorrow?",
            "free lunch",
            "nothing in the vocabulary",
        ] {
            let prediction = detector.predict_text(text).unwrap();
            assert_abs_diff_eq!(prediction.spam + prediction.ham, 1.0, epsilon = 1e-6);
            assert!((0.0..=1.0).contains(&prediction.confidence()));
            assert!(prediction.confidence() >= 0.5);
        }
    }

    #[test]
    fn test_real_models_are_deterministic_and_ignore_punctuation() {
        let detector = toy_detector();
        let a = detector.classify("win free prize now").unwrap();
        let b = detector.classify("WIN FREE PRIZE NOW!!!").unwrap();
        let c = detector.classify("win free prize now").unwrap();
        assert_eq!(a.label, Label::Spam);
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(detector.classify("Lunch tomorrow?").unwrap().label, Label::Ham);
    }

    #[test]
    fn test_binary_classes_resolution() {
        let classes = BinaryClasses::resolve(&[ClassTag::Int(0), ClassTag::Int(1)]).unwrap();
        assert_eq!(classes, BinaryClasses { spam: 1, ham: 0 });

        let classes = BinaryClasses::resolve(&[
            ClassTag::Text("spam".to_string()),
            ClassTag::Text("ham".to_string()),
        ])
        .unwrap();
        assert_eq!(classes, BinaryClasses { spam: 0, ham: 1 });

        assert!(matches!(
            BinaryClasses::resolve(&[ClassTag::Int(1), ClassTag::Int(1)]),
            Err(LoadError::UnknownClass(_))
        ));
        assert!(matches!(
            BinaryClasses::resolve(&[ClassTag::Int(0), ClassTag::Int(1), ClassTag::Int(2)]),
            Err(LoadError::NotBinary(3))
        ));
        assert!(matches!(
            BinaryClasses::resolve(&[ClassTag::Int(0), ClassTag::Int(7)]),
            Err(LoadError::UnknownClass(_))
        ));
    }
}
