//! ACTQM quality scoring of generated contract text.
//!
//! ACTQM blends two sub-scores, weighting clause coverage twice as heavily
//! as formality:
//!
//! - **CCS** (clause coverage): the share of the category's required keywords
//!   that appear in the text, matched case-insensitively as substrings.
//! - **FS** (formality): `max(0, 1 − penalty × grammar_issues / sentences)`.
//!
//! `ACTQM = (2·CCS + FS) / 3 × 100`. All three are reported rounded to two
//! decimals; ACTQM is computed from the unrounded sub-scores.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use lexdraft_core::{KeywordRegistry, QualityReport};
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum GrammarError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("penalty factor must be within [0, 1], got {0}")]
    InvalidPenalty(f64),
    #[error("grammar check failed: {0}")]
    Grammar(#[from] GrammarError),
}

/// Counts grammar and style issues in a text.
#[async_trait]
pub trait GrammarChecker: Send + Sync {
    async fn check(&self, text: &str) -> Result<usize, GrammarError>;
}

/// Counts sentences in a text.
pub trait SentenceSegmenter: Send + Sync {
    fn sentence_count(&self, text: &str) -> usize;
}

static SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[^.!?]+[.!?]*").expect("sentence pattern is valid"));

/// Readability-style sentence counter.
///
/// A sentence is a run of text up to and including its `.`, `!` or `?`
/// terminators. Fragments of two words or fewer (list numbering, "Inc.",
/// headings) are not counted. The count is never below one.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleSegmenter;

impl SentenceSegmenter for RuleSegmenter {
    fn sentence_count(&self, text: &str) -> usize {
        let sentences = SENTENCE
            .find_iter(text)
            .filter(|m| word_count(m.as_str()) > 2)
            .count();
        sentences.max(1)
    }
}

fn word_count(fragment: &str) -> usize {
    fragment
        .split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .count()
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// ACTQM scorer over injected grammar and sentence collaborators.
#[derive(Clone)]
pub struct Scorer {
    grammar: Arc<dyn GrammarChecker>,
    segmenter: Arc<dyn SentenceSegmenter>,
}

impl Scorer {
    pub fn new(grammar: Arc<dyn GrammarChecker>, segmenter: Arc<dyn SentenceSegmenter>) -> Self {
        Self { grammar, segmenter }
    }

    /// A scorer using [`RuleSegmenter`] for sentence counts.
    pub fn with_rule_segmenter(grammar: Arc<dyn GrammarChecker>) -> Self {
        Self::new(grammar, Arc::new(RuleSegmenter))
    }

    /// Score `text` as a contract of `category`.
    ///
    /// A category missing from the registry, or one with no keywords,
    /// scores zero coverage rather than failing.
    pub async fn score(
        &self,
        text: &str,
        category: &str,
        registry: &KeywordRegistry,
        penalty_factor: f64,
    ) -> Result<QualityReport, ScoreError> {
        if !(0.0..=1.0).contains(&penalty_factor) {
            return Err(ScoreError::InvalidPenalty(penalty_factor));
        }

        let required: &[String] = match registry.required(category) {
            Ok(keywords) => keywords,
            Err(e) => {
                warn!(category, error = %e, "no required keywords; clause coverage is zero");
                &[]
            }
        };
        let lowered = text.to_lowercase();
        let keywords_found: Vec<String> = required
            .iter()
            .filter(|k| lowered.contains(&k.to_lowercase()))
            .cloned()
            .collect();
        let ccs = if required.is_empty() {
            0.0
        } else {
            keywords_found.len() as f64 / required.len() as f64
        };

        let grammar_issues = self.grammar.check(text).await?;
        let sentences = self.segmenter.sentence_count(text);
        let fs = (1.0 - penalty_factor * grammar_issues as f64 / sentences.max(1) as f64).max(0.0);

        let actqm = (2.0 * ccs + fs) / 3.0 * 100.0;
        debug!(category, ccs, fs, actqm, grammar_issues, sentences, "scored text");

        Ok(QualityReport {
            ccs: round2(ccs),
            fs: round2(fs),
            actqm: round2(actqm),
            keywords_found,
            total_required: required.len(),
            grammar_issues,
            sentences,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedIssues(usize);

    #[async_trait]
    impl GrammarChecker for FixedIssues {
        async fn check(&self, _text: &str) -> Result<usize, GrammarError> {
            Ok(self.0)
        }
    }

    struct FixedSentences(usize);

    impl SentenceSegmenter for FixedSentences {
        fn sentence_count(&self, _text: &str) -> usize {
            self.0
        }
    }

    struct Unreachable;

    #[async_trait]
    impl GrammarChecker for Unreachable {
        async fn check(&self, _text: &str) -> Result<usize, GrammarError> {
            Err(GrammarError::Server {
                status: 503,
                body: "unavailable".into(),
            })
        }
    }

    struct Counting(AtomicUsize);

    #[async_trait]
    impl GrammarChecker for Counting {
        async fn check(&self, _text: &str) -> Result<usize, GrammarError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(0)
        }
    }

    fn registry() -> KeywordRegistry {
        KeywordRegistry::from_json_str(r#"{"NDA": ["confidential", "disclosure"]}"#).unwrap()
    }

    fn scorer(issues: usize, sentences: usize) -> Scorer {
        Scorer::new(
            Arc::new(FixedIssues(issues)),
            Arc::new(FixedSentences(sentences)),
        )
    }

    #[tokio::test]
    async fn full_coverage_clean_text_scores_100() {
        let text = "All Confidential Information shall be protected. \
                    Any disclosure requires prior written consent.";
        let report = Scorer::with_rule_segmenter(Arc::new(FixedIssues(0)))
            .score(text, "NDA", &registry(), 0.5)
            .await
            .unwrap();
        assert_eq!(report.sentences, 2);
        assert_eq!(report.ccs, 1.0);
        assert_eq!(report.fs, 1.0);
        assert_eq!(report.actqm, 100.0);
        assert_eq!(report.keywords_found, ["confidential", "disclosure"]);
        assert_eq!(report.total_required, 2);
    }

    #[tokio::test]
    async fn half_coverage_with_issues() {
        let text = "The confidential terms apply.";
        let report = scorer(2, 4)
            .score(text, "NDA", &registry(), 0.5)
            .await
            .unwrap();
        assert_eq!(report.ccs, 0.5);
        assert_eq!(report.fs, 0.75);
        assert_eq!(report.actqm, 58.33);
        assert_eq!(report.grammar_issues, 2);
    }

    #[tokio::test]
    async fn no_keywords_found_is_zero_coverage() {
        let report = scorer(0, 3)
            .score("Payment is due monthly.", "NDA", &registry(), 0.5)
            .await
            .unwrap();
        assert_eq!(report.ccs, 0.0);
        assert_eq!(report.fs, 1.0);
        assert_eq!(report.actqm, 33.33);
        assert!(report.keywords_found.is_empty());
    }

    #[tokio::test]
    async fn unknown_category_is_zero_coverage() {
        let report = scorer(0, 1)
            .score("confidential disclosure", "Lease", &registry(), 0.5)
            .await
            .unwrap();
        assert_eq!(report.ccs, 0.0);
        assert_eq!(report.total_required, 0);
    }

    #[tokio::test]
    async fn empty_keyword_list_is_zero_coverage() {
        let registry = KeywordRegistry::from_json_str(r#"{"MSA": []}"#).unwrap();
        let report = scorer(0, 1)
            .score("anything", "MSA", &registry, 0.5)
            .await
            .unwrap();
        assert_eq!(report.ccs, 0.0);
    }

    #[tokio::test]
    async fn zero_penalty_means_full_formality() {
        let report = scorer(40, 2)
            .score("confidential", "NDA", &registry(), 0.0)
            .await
            .unwrap();
        assert_eq!(report.fs, 1.0);
    }

    #[tokio::test]
    async fn formality_is_clamped_at_zero() {
        let report = scorer(10, 1)
            .score("confidential disclosure", "NDA", &registry(), 1.0)
            .await
            .unwrap();
        assert_eq!(report.fs, 0.0);
        assert_eq!(report.actqm, 66.67);
    }

    #[tokio::test]
    async fn zero_sentences_treated_as_one() {
        let report = scorer(1, 0)
            .score("confidential", "NDA", &registry(), 0.5)
            .await
            .unwrap();
        assert_eq!(report.fs, 0.5);
    }

    #[tokio::test]
    async fn penalty_out_of_range_rejected() {
        let err = scorer(0, 1)
            .score("text", "NDA", &registry(), 1.5)
            .await
            .unwrap_err();
        assert!(matches!(err, ScoreError::InvalidPenalty(p) if p == 1.5));
        assert!(scorer(0, 1).score("text", "NDA", &registry(), -0.1).await.is_err());
    }

    #[tokio::test]
    async fn grammar_failure_propagates() {
        let scorer = Scorer::with_rule_segmenter(Arc::new(Unreachable));
        let err = scorer
            .score("text", "NDA", &registry(), 0.5)
            .await
            .unwrap_err();
        assert!(matches!(err, ScoreError::Grammar(GrammarError::Server { status: 503, .. })));
    }

    #[tokio::test]
    async fn scoring_is_idempotent() {
        let checker = Arc::new(Counting(AtomicUsize::new(0)));
        let scorer = Scorer::with_rule_segmenter(checker.clone());
        let text = "The Receiving Party keeps all information confidential.";
        let a = scorer.score(text, "nda", &registry(), 0.5).await.unwrap();
        let b = scorer.score(text, "nda", &registry(), 0.5).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.ccs, 0.5);
        assert_eq!(checker.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn segmenter_counts_terminated_sentences() {
        let text = "This Agreement is made today. The parties agree as follows! \
                    Does the term survive termination?";
        assert_eq!(RuleSegmenter.sentence_count(text), 3);
    }

    #[test]
    fn segmenter_ignores_short_fragments() {
        let text = "1. Definitions. The following terms have the meanings set out below.";
        assert_eq!(RuleSegmenter.sentence_count(text), 1);
    }

    #[test]
    fn segmenter_never_returns_zero() {
        assert_eq!(RuleSegmenter.sentence_count(""), 1);
        assert_eq!(RuleSegmenter.sentence_count("Hi."), 1);
    }

    #[test]
    fn segmenter_counts_unterminated_tail() {
        let text = "The term is two years. Either party may terminate on notice";
        assert_eq!(RuleSegmenter.sentence_count(text), 2);
    }
}
