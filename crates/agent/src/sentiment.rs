//! Keyword sentiment detection for anger signals

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use call_agent_core::Sentiment;

static NEGATIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "angry",
        "furious",
        "mad",
        "upset",
        "annoyed",
        "frustrated",
        "frustrating",
        "ridiculous",
        "unacceptable",
        "useless",
        "stupid",
        "terrible",
        "awful",
        "horrible",
        "worst",
        "disgusting",
        "disappointed",
        "pathetic",
        "hate",
    ]
    .into_iter()
    .collect()
});

static POSITIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "thanks",
        "thank",
        "great",
        "good",
        "perfect",
        "wonderful",
        "excellent",
        "amazing",
        "awesome",
        "fantastic",
        "lovely",
        "helpful",
        "appreciate",
        "happy",
        "glad",
    ]
    .into_iter()
    .collect()
});

static NEGATORS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["not", "never", "no", "isn't", "wasn't", "don't", "didn't"]
        .into_iter()
        .collect()
});

/// Multi-word expressions of frustration
static NEGATIVE_PHRASES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bwaste\s+of\s+(my\s+)?time\b",
        r"(?i)\bfed\s+up\b",
        r"(?i)\bhow\s+many\s+times\b",
        r"(?i)\b(not|aren't|you're\s+not)\s+listening\b",
        r"(?i)\bwaiting\s+(forever|for\s+ages)\b",
    ]
    .into_iter()
    .filter_map(|p| {
        Regex::new(p)
            .map_err(|e| tracing::error!(pattern = p, error = %e, "Invalid sentiment pattern"))
            .ok()
    })
    .collect()
});

/// Maps caller utterances to a coarse sentiment
#[derive(Debug, Clone, Copy, Default)]
pub struct SentimentDetector;

impl SentimentDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn detect(&self, text: &str) -> Sentiment {
        let lower = text.to_lowercase().replace('\u{2019}', "'");

        let mut negative = NEGATIVE_PHRASES.iter().filter(|re| re.is_match(&lower)).count();
        let mut positive = 0usize;

        let words: Vec<&str> = lower
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|w| !w.is_empty())
            .collect();

        for (i, word) in words.iter().enumerate() {
            let negated = i > 0 && NEGATORS.contains(words[i - 1]);
            if NEGATIVE_WORDS.contains(*word) {
                // "not angry" carries no anger signal
                if !negated {
                    negative += 1;
                }
            } else if POSITIVE_WORDS.contains(*word) {
                // "not happy" reads as a complaint
                if negated {
                    negative += 1;
                } else {
                    positive += 1;
                }
            }
        }

        if negative > positive {
            Sentiment::Negative
        } else if positive > negative {
            Sentiment::Positive
        } else {
            Sentiment::Neutral
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negated_negative_word_is_not_anger() {
        let detector = SentimentDetector::new();
        assert_eq!(detector.detect("I'm not angry, just confused"), Sentiment::Neutral);
        assert_eq!(detector.detect("No, I'm not upset at all"), Sentiment::Neutral);
        assert_eq!(
            detector.detect("I'm not angry but this is terrible"),
            Sentiment::Negative
        );
        assert_eq!(detector.detect("You're not listening"), Sentiment::Negative);
    }

    #[test]
    fn test_negative() {
        let detector = SentimentDetector::new();
        assert_eq!(detector.detect("This is ridiculous!"), Sentiment::Negative);
        assert_eq!(detector.detect("I'm furious right now"), Sentiment::Negative);
        assert_eq!(
            detector.detect("What a waste of my time"),
            Sentiment::Negative
        );
    }

    #[test]
    fn test_positive() {
        let detector = SentimentDetector::new();
        assert_eq!(detector.detect("Great, thank you so much"), Sentiment::Positive);
        assert_eq!(detector.detect("That was helpful"), Sentiment::Positive);
    }

    #[test]
    fn test_neutral() {
        let detector = SentimentDetector::new();
        assert_eq!(detector.detect("What time do you open?"), Sentiment::Neutral);
        assert_eq!(detector.detect(""), Sentiment::Neutral);
    }

    #[test]
    fn test_negation_flips_positive_word() {
        let detector = SentimentDetector::new();
        assert_eq!(detector.detect("I am not happy"), Sentiment::Negative);
        assert_eq!(detector.detect("I don\u{2019}t appreciate this"), Sentiment::Negative);
    }
}
