use rayon::prelude::*;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::annotate::{Annotator, Sentence};
use crate::taxonomy::{SIMILAR_WORD_POOL, SimilarWords, Taxonomy};

/// Placeholder group substituted for each blanked word.
pub const BLANK: &str = "__________";

/// Thresholds for the generation pipeline.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorConfig {
    /// Sentences with fewer words than this are rejected outright.
    pub min_sentence_words: usize,
    /// Ceiling on distractor candidates gathered per answer word.
    pub distractor_pool: usize,
    /// Distractors carried into the final result. A candidate must exceed
    /// this count to be selectable at all.
    pub distractors_kept: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_sentence_words: 6,
            distractor_pool: SIMILAR_WORD_POOL,
            distractors_kept: 3,
        }
    }
}

/// One source document per generation request.
///
/// Nothing here is validated; an empty title is legal and simply means the
/// title filter never excludes anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub body: String,
    pub url: String,
    pub title: String,
}

impl Document {
    pub fn new(
        body: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            body: body.into(),
            url: url.into(),
            title: title.into(),
        }
    }
}

/// One sentence judged usable for quizzing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateQuestion {
    pub title: String,
    pub url: String,
    /// Blanked words, in sentence order. Never empty.
    pub answer: Vec<String>,
    /// Distractor candidates; populated only for single-word answers.
    pub similar_words: Vec<String>,
    /// Sentence display text with the answer's first occurrence blanked.
    pub question: String,
}

impl CandidateQuestion {
    /// The answer as a single space-joined string.
    pub fn answer_text(&self) -> String {
        self.answer.join(" ")
    }
}

/// Finalized trivia: question text, the correct answer, and exactly
/// [`GeneratorConfig::distractors_kept`] incorrect alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriviaResult {
    pub question: String,
    pub answer: String,
    pub distractors: Vec<String>,
}

/// Full generation pipeline over one annotation facility and one taxonomy.
pub struct TriviaGenerator<'a> {
    annotator: &'a dyn Annotator,
    resolver: SimilarWords<'a>,
    config: GeneratorConfig,
}

impl<'a> TriviaGenerator<'a> {
    pub fn new(annotator: &'a dyn Annotator, taxonomy: &'a Taxonomy) -> Self {
        Self::with_config(annotator, taxonomy, GeneratorConfig::default())
    }

    pub fn with_config(
        annotator: &'a dyn Annotator,
        taxonomy: &'a Taxonomy,
        config: GeneratorConfig,
    ) -> Self {
        Self {
            annotator,
            resolver: SimilarWords::new(taxonomy, config.distractor_pool),
            config,
        }
    }

    /// Analyzes a document into candidate questions, in sentence order.
    ///
    /// The first segmented sentence is always dropped; opening sentences
    /// are introductory and make poor quiz material. Evaluation fans out
    /// across sentences, and the collected order still matches sentence
    /// order, which the selector depends on.
    pub fn candidates(&self, document: &Document) -> Vec<CandidateQuestion> {
        let sentences = self.annotator.sentences(&document.body);
        let rest = sentences.get(1..).unwrap_or(&[]);
        let candidates: Vec<CandidateQuestion> = rest
            .par_iter()
            .filter_map(|sentence| self.evaluate(sentence, document))
            .collect();
        debug!(
            sentences = sentences.len(),
            candidates = candidates.len(),
            title = %document.title,
            "analyzed document"
        );
        candidates
    }

    /// Decides whether one sentence is usable and, if so, what to blank.
    ///
    /// Adverb-led and short sentences are rejected. Otherwise the first
    /// common singular noun that is not a substring of the title is the
    /// target: if a detected noun phrase contains it, the phrase's last two
    /// words are blanked, else the word alone. Only that first target is
    /// ever considered. A phrase starting with an apostrophe marks a
    /// tokenization artifact and disables phrase blanking for the whole
    /// sentence.
    pub fn evaluate(&self, sentence: &Sentence, document: &Document) -> Option<CandidateQuestion> {
        let tokens = sentence.tokens();
        if tokens.len() < self.config.min_sentence_words {
            return None;
        }
        if tokens[0].tag.is_adverb() {
            return None;
        }

        let mut blanked: Vec<String> = Vec::new();
        for token in tokens {
            if !token.tag.is_common_singular_noun() || document.title.contains(&token.text) {
                continue;
            }
            for phrase in sentence.noun_phrases() {
                if phrase.text().starts_with('\'') {
                    break;
                }
                if phrase.text().contains(token.text.as_str()) {
                    let words = phrase.words();
                    let tail_start = words.len().saturating_sub(2);
                    blanked.extend(words[tail_start..].iter().cloned());
                    break;
                }
            }
            if blanked.is_empty() {
                blanked.push(token.text.clone());
            }
            break;
        }

        if blanked.is_empty() {
            return None;
        }

        // Multi-word substitutions are too unreliable to offer distractors
        // for; leave those to the phrase blank alone.
        let similar_words = if blanked.len() == 1 {
            self.resolver.lookup(&blanked[0])
        } else {
            Vec::new()
        };

        let answer_phrase = blanked.join(" ");
        let blanks = vec![BLANK; blanked.len()].join(" ");
        let question = blank_first_occurrence(sentence.display(), &answer_phrase, &blanks);

        Some(CandidateQuestion {
            title: document.title.clone(),
            url: document.url.clone(),
            answer: blanked,
            similar_words,
            question,
        })
    }

    /// Runs the whole pipeline: analyze, then select.
    pub fn generate(&self, document: &Document) -> Option<TriviaResult> {
        let candidates = self.candidates(document);
        let result = select(&candidates, self.config.distractors_kept);
        if result.is_none() {
            debug!(title = %document.title, "no viable trivia candidate");
        }
        result
    }
}

/// Picks the winning candidate and truncates its distractors.
///
/// Scans in order and keeps reassigning, so the last candidate with more
/// than `keep` distractors wins. Returns `None` when nothing qualifies;
/// callers surface that as an explicit not-found outcome.
pub fn select(candidates: &[CandidateQuestion], keep: usize) -> Option<TriviaResult> {
    let mut winner: Option<&CandidateQuestion> = None;
    for candidate in candidates {
        if candidate.similar_words.len() > keep {
            winner = Some(candidate);
        }
    }
    winner.map(|candidate| TriviaResult {
        question: candidate.question.clone(),
        answer: candidate.answer_text(),
        distractors: candidate.similar_words[..keep].to_vec(),
    })
}

/// Replaces the first case-insensitive occurrence of `phrase` in `display`.
///
/// A phrase that never occurs literally (phrase-boundary edge cases) leaves
/// the text unchanged; the miss is deliberate and silent.
fn blank_first_occurrence(display: &str, phrase: &str, blanks: &str) -> String {
    match RegexBuilder::new(&regex::escape(phrase))
        .case_insensitive(true)
        .build()
    {
        Ok(pattern) => pattern.replace(display, blanks).into_owned(),
        Err(_) => display.to_string(),
    }
}
