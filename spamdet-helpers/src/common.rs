use std::fmt::{self, Display, Formatter};

/// The two outcomes a spam classifier can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Spam,
    Ham,
}

impl Label {
    /// Maps a class tag exported by the training toolchain onto a label.
    ///
    /// Integer `1` and the text `"spam"` mean spam, `0` and `"ham"` mean ham.
    /// Text tags are matched case-insensitively, and numeric text such as
    /// `"1"` is accepted too. Anything else has no label.
    pub fn from_class_tag(tag: &ClassTag) -> Option<Self> {
        match tag {
            ClassTag::Int(1) => Some(Label::Spam),
            ClassTag::Int(0) => Some(Label::Ham),
            ClassTag::Int(_) => None,
            ClassTag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "spam" | "1" => Some(Label::Spam),
                "ham" | "0" => Some(Label::Ham),
                _ => None,
            },
        }
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Label::Spam => write!(f, "SPAM"),
            Label::Ham => write!(f, "HAM"),
        }
    }
}

/// A class value as stored in a fitted model: either an integer or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate", untagged)
)]
pub enum ClassTag {
    Int(i64),
    Text(String),
}

impl Display for ClassTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ClassTag::Int(value) => write!(f, "{}", value),
            ClassTag::Text(value) => write!(f, "{:?}", value),
        }
    }
}

/// The outcome of classifying a single message.
///
/// `confidence` is the probability mass the classifier assigned to `label`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationResult {
    pub label: Label,
    pub confidence: f64,
}

impl ClassificationResult {
    /// Creates a result, clamping the confidence into `[0, 1]`.
    pub fn new(label: Label, confidence: f64) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        ClassificationResult { label, confidence }
    }

    /// The confidence expressed as a percentage.
    pub fn percent(&self) -> f64 {
        self.confidence * 100.0
    }
}

impl Display for ClassificationResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.1}%)", self.label, self.percent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_tags_map_to_labels() {
        assert_eq!(Label::from_class_tag(&ClassTag::Int(1)), Some(Label::Spam));
        assert_eq!(Label::from_class_tag(&ClassTag::Int(0)), Some(Label::Ham));
        assert_eq!(Label::from_class_tag(&ClassTag::Int(2)), None);
        assert_eq!(
            Label::from_class_tag(&ClassTag::Text("SPAM".to_string())),
            Some(Label::Spam)
        );
        assert_eq!(
            Label::from_class_tag(&ClassTag::Text(" ham ".to_string())),
            Some(Label::Ham)
        );
        assert_eq!(
            Label::from_class_tag(&ClassTag::Text("eggs".to_string())),
            None
        );
    }

    #[test]
    fn test_result_formats_with_one_decimal() {
        let spam = ClassificationResult::new(Label::Spam, 0.923);
        assert_eq!(spam.to_string(), "SPAM (92.3%)");

        let ham = ClassificationResult::new(Label::Ham, 0.88);
        assert_eq!(ham.to_string(), "HAM (88.0%)");
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(ClassificationResult::new(Label::Spam, 1.5).confidence, 1.0);
        assert_eq!(ClassificationResult::new(Label::Ham, -0.1).confidence, 0.0);
        assert_eq!(ClassificationResult::new(Label::Ham, f64::NAN).confidence, 0.0);
    }
}
