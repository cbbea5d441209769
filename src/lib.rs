//! Spam detection building blocks.
//!
//! Re-exports the shared types from `spamdet-helpers` together with the
//! fitted model types the detector can load.

pub use spamdet_helpers::{
    ClassTag, ClassificationResult, Float, Label, SparseError, SparseVector, argmax, log_sum_exp,
    normalize, softmax_in_place,
};

pub use logistic_regression::{LogisticError, LogisticParams, LogisticRegression};
pub use multinomial_nb::{MultinomialNb, MultinomialNbParams, NaiveBayesError};
pub use tfidf::{Norm, TfidfError, TfidfParams, TfidfVectorizer};

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const VECTORIZER: &str = r#"{
        "vocabulary": {"win": 0, "free": 1, "prize": 2, "now": 3, "lunch": 4, "tomorrow": 5},
        "idf": [1.4, 1.2, 1.9, 1.1, 1.6, 1.5]
    }"#;

    const CLASSIFIER: &str = r#"{
        "classes": [0, 1],
        "class_log_prior": [-0.2, -1.7],
        "feature_log_prob": [
            [-3.5, -3.2, -4.0, -2.5, -1.2, -1.3],
            [-1.1, -1.0, -1.3, -1.6, -4.2, -3.9]
        ]
    }"#;

    fn classify(text: &str) -> (Label, f64) {
        let vectorizer: TfidfVectorizer<f64> = TfidfVectorizer::from_json(VECTORIZER).unwrap();
        let model: MultinomialNb<f64> = MultinomialNb::from_json(CLASSIFIER).unwrap();
        let features = vectorizer.transform(&normalize(text)).unwrap();
        let index = model.predict(&features).unwrap();
        let proba = model.predict_proba(&features).unwrap();
        let label = Label::from_class_tag(&model.classes()[index]).unwrap();
        (label, proba[index])
    }

    #[test]
    fn test_pipeline_separates_spam_from_ham() {
        let (label, confidence) = classify("WIN a FREE prize NOW!!!");
        assert_eq!(label, Label::Spam);
        assert!(confidence > 0.5 && confidence <= 1.0);

        let (label, _) = classify("Lunch tomorrow?");
        assert_eq!(label, Label::Ham);
    }

    #[test]
    fn test_pipeline_ignores_case_and_punctuation() {
        let (a_label, a_conf) = classify("win free prize now");
        let (b_label, b_conf) = classify("WIN FREE PRIZE NOW!!!");
        assert_eq!(a_label, b_label);
        assert_abs_diff_eq!(a_conf, b_conf, epsilon = 1e-15);
    }
}
