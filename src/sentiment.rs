//! Lexicon-based sentiment classification.
//!
//! Each sentiment-bearing word carries a polarity in `[-1, 1]`. A negation
//! within the preceding few tokens flips and dampens the next sentiment word,
//! and an intensifier scales it. The text's polarity is the mean over the
//! sentiment-bearing words, so text without any such word scores exactly zero.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use rayon::prelude::*;

use crate::post::{Post, SentimentLabel};

const NEGATION_WINDOW: usize = 3;
const NEGATION_FACTOR: f64 = -0.5;
/// Word scores are summed in millionths so that cancelling words add up to
/// exactly zero.
const SCORE_SCALE: f64 = 1_000_000.0;

static DEFAULT_LEXICON: Lazy<HashMap<String, f64>> = Lazy::new(|| {
    let positive = [
        ("amazing", 0.6),
        ("awesome", 1.0),
        ("beautiful", 0.85),
        ("best", 1.0),
        ("better", 0.5),
        ("brilliant", 0.9),
        ("congrats", 0.6),
        ("congratulations", 0.6),
        ("cool", 0.35),
        ("excellent", 1.0),
        ("excited", 0.4),
        ("fantastic", 0.4),
        ("fun", 0.3),
        ("glad", 0.5),
        ("good", 0.7),
        ("great", 0.8),
        ("happy", 0.8),
        ("hope", 0.3),
        ("interesting", 0.5),
        ("love", 0.5),
        ("lovely", 0.5),
        ("nice", 0.6),
        ("perfect", 1.0),
        ("proud", 0.8),
        ("success", 0.3),
        ("support", 0.2),
        ("thanks", 0.2),
        ("win", 0.8),
        ("wonderful", 1.0),
    ];
    let negative = [
        ("angry", -0.5),
        ("awful", -1.0),
        ("bad", -0.7),
        ("boring", -1.0),
        ("corrupt", -0.5),
        ("crisis", -0.4),
        ("disappointed", -0.75),
        ("disappointing", -0.6),
        ("fail", -0.5),
        ("failed", -0.5),
        ("fake", -0.5),
        ("hate", -0.8),
        ("horrible", -1.0),
        ("lie", -0.5),
        ("poor", -0.4),
        ("sad", -0.5),
        ("scandal", -0.5),
        ("stupid", -0.8),
        ("terrible", -1.0),
        ("ugly", -0.7),
        ("worse", -0.4),
        ("worst", -1.0),
        ("wrong", -0.5),
    ];
    positive
        .into_iter()
        .chain(negative)
        .map(|(word, score)| (word.to_owned(), score))
        .collect()
});

static INTENSIFIERS: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    HashMap::from([
        ("very", 1.3),
        ("really", 1.3),
        ("extremely", 1.5),
        ("so", 1.2),
        ("super", 1.3),
        ("slightly", 0.7),
        ("somewhat", 0.8),
    ])
});

static NEGATIONS: &[&str] = &[
    "not", "no", "never", "nothing", "dont", "don't", "doesnt", "doesn't", "didnt", "didn't",
    "isnt", "isn't", "wasnt", "wasn't", "cant", "can't", "wont", "won't", "aint", "ain't",
];

/// Deterministic lexical-polarity classifier.
#[derive(Debug, Clone)]
pub struct SentimentClassifier {
    lexicon: HashMap<String, f64>,
}

impl Default for SentimentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentClassifier {
    pub fn new() -> Self {
        Self {
            lexicon: DEFAULT_LEXICON.clone(),
        }
    }

    /// Replaces the word polarities. Keys are matched in lowercase.
    pub fn with_lexicon(lexicon: HashMap<String, f64>) -> Self {
        Self {
            lexicon: lexicon
                .into_iter()
                .map(|(word, score)| (word.to_lowercase(), score))
                .collect(),
        }
    }

    pub fn lexicon_size(&self) -> usize {
        self.lexicon.len()
    }

    /// Lexicon entries sorted by word.
    pub fn lexicon_entries(&self) -> Vec<(&str, f64)> {
        let mut entries: Vec<(&str, f64)> =
            self.lexicon.iter().map(|(w, s)| (w.as_str(), *s)).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Polarity of `text`, clamped to `[-1, 1]`.
    pub fn polarity(&self, text: &str) -> f64 {
        let mut total: i64 = 0;
        let mut scored = 0usize;
        let mut modifier = 1.0;
        let mut since_negation: Option<usize> = None;

        for token in tokens(text) {
            if NEGATIONS.contains(&token.as_str()) {
                since_negation = Some(0);
                continue;
            }
            if let Some(m) = INTENSIFIERS.get(token.as_str()) {
                modifier = *m;
                continue;
            }

            if let Some(base) = self.lexicon.get(&token) {
                let mut score = base * modifier;
                if since_negation.is_some_and(|n| n < NEGATION_WINDOW) {
                    score *= NEGATION_FACTOR;
                    since_negation = None;
                }
                total = total.saturating_add((score * SCORE_SCALE).round() as i64);
                scored += 1;
                modifier = 1.0;
            }

            since_negation = since_negation
                .map(|n| n + 1)
                .filter(|n| *n < NEGATION_WINDOW);
        }

        if scored == 0 {
            0.0
        } else {
            (total as f64 / SCORE_SCALE / scored as f64).clamp(-1.0, 1.0)
        }
    }

    pub fn classify(&self, text: &str) -> SentimentLabel {
        SentimentLabel::from_polarity(self.polarity(text))
    }

    /// Labels for posts that do not carry one yet, keyed by post id.
    ///
    /// Posts that already have a label are skipped. Missing text reads as
    /// empty text and classifies as neutral.
    pub fn label_posts(&self, posts: &[Post]) -> HashMap<usize, SentimentLabel> {
        let labels: HashMap<usize, SentimentLabel> = posts
            .par_iter()
            .filter(|post| post.sentiment.is_none())
            .map(|post| (post.id, self.classify(post.text_or_empty())))
            .collect();
        tracing::debug!(
            classified = labels.len(),
            preset = posts.len() - labels.len(),
            "classified post sentiment"
        );
        labels
    }
}

/// Attaches labels to the posts with matching ids. Existing labels are kept.
pub fn apply_labels(posts: &mut [Post], labels: &HashMap<usize, SentimentLabel>) {
    for post in posts.iter_mut().filter(|p| p.sentiment.is_none()) {
        post.sentiment = labels.get(&post.id).copied();
    }
}

/// Lowercased word tokens; handles and links are skipped.
fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .filter(|raw| !raw.starts_with('@') && !raw.contains("://"))
        .map(|raw| {
            raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .trim_matches('\'')
                .to_lowercase()
        })
        .filter(|t| !t.is_empty())
}
