//! Headline sentiment: a compound polarity score bucketed into five labels.
//!
//! The lexicon is loaded once when the classifier is built
//! (`SentimentClassifier::vader`) and the same instance is shared by every
//! request through the application state.

use metrics::counter;
use serde::{Deserialize, Serialize};
use std::fmt;
use vader_sentiment::SentimentIntensityAnalyzer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    #[serde(rename = "Extremely Positive")]
    ExtremelyPositive,
    #[serde(rename = "Positive")]
    Positive,
    #[serde(rename = "Neutral")]
    Neutral,
    #[serde(rename = "Negative")]
    Negative,
    #[serde(rename = "Extremely Negative")]
    ExtremelyNegative,
}

impl SentimentLabel {
    pub fn label(self) -> &'static str {
        match self {
            SentimentLabel::ExtremelyPositive => "Extremely Positive",
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::ExtremelyNegative => "Extremely Negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bucket a compound score. Extreme buckets are inclusive at ±0.5; exact zero
/// (and NaN) is Neutral.
pub fn label_for_compound(c: f64) -> SentimentLabel {
    if c >= 0.5 {
        SentimentLabel::ExtremelyPositive
    } else if c > 0.0 {
        SentimentLabel::Positive
    } else if c <= -0.5 {
        SentimentLabel::ExtremelyNegative
    } else if c < 0.0 {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

/// Maps text to a compound polarity score in [-1, 1].
pub trait CompoundScorer: Send + Sync {
    fn compound(&self, text: &str) -> f64;
}

/// VADER lexicon scorer.
pub struct VaderScorer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl VaderScorer {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }
}

impl Default for VaderScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl CompoundScorer for VaderScorer {
    fn compound(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }
        let scores = self.analyzer.polarity_scores(text);
        scores.get("compound").copied().unwrap_or(0.0).clamp(-1.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scored {
    pub compound: f64,
    pub label: SentimentLabel,
}

/// Long-lived classifier; build once, share by reference.
pub struct SentimentClassifier {
    scorer: Box<dyn CompoundScorer>,
}

impl SentimentClassifier {
    pub fn new(scorer: Box<dyn CompoundScorer>) -> Self {
        Self { scorer }
    }

    /// Initialization step: loads the VADER lexicon.
    pub fn vader() -> Self {
        let t0 = std::time::Instant::now();
        let classifier = Self::new(Box::new(VaderScorer::new()));
        tracing::info!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "sentiment lexicon loaded"
        );
        classifier
    }

    pub fn score(&self, text: &str) -> Scored {
        counter!("headlines_scored_total").increment(1);
        let compound = self.scorer.compound(text);
        Scored {
            compound,
            label: label_for_compound(compound),
        }
    }
}

impl fmt::Debug for SentimentClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentimentClassifier").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_boundaries() {
        for c in [0.5, 0.7, 1.0] {
            assert_eq!(label_for_compound(c), SentimentLabel::ExtremelyPositive, "{c}");
        }
        for c in [0.1, 0.49] {
            assert_eq!(label_for_compound(c), SentimentLabel::Positive, "{c}");
        }
        assert_eq!(label_for_compound(0.0), SentimentLabel::Neutral);
        assert_eq!(label_for_compound(-0.0), SentimentLabel::Neutral);
        for c in [-0.1, -0.49] {
            assert_eq!(label_for_compound(c), SentimentLabel::Negative, "{c}");
        }
        for c in [-0.5, -1.0] {
            assert_eq!(label_for_compound(c), SentimentLabel::ExtremelyNegative, "{c}");
        }
    }

    #[test]
    fn nan_falls_through_to_neutral() {
        assert_eq!(label_for_compound(f64::NAN), SentimentLabel::Neutral);
    }

    #[test]
    fn vader_separates_clear_polarity() {
        let c = SentimentClassifier::vader();
        let up = c.score("Great quarter: profits surge and investors are thrilled!");
        let down = c.score("Terrible losses, fraud charges and a horrible outlook.");
        assert!(up.compound > 0.0, "{up:?}");
        assert!(down.compound < 0.0, "{down:?}");
        assert!((-1.0..=1.0).contains(&up.compound));
        assert_eq!(c.score("   ").label, SentimentLabel::Neutral);
    }

    #[test]
    fn labels_serialize_as_display_names() {
        let v = serde_json::to_value(SentimentLabel::ExtremelyNegative).unwrap();
        assert_eq!(v, "Extremely Negative");
        assert_eq!(SentimentLabel::Positive.to_string(), "Positive");
    }
}
