use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Coarse part-of-speech class attached to each token.
///
/// The trivia pipeline only branches on `Adverb` and `NounSingular`; the
/// remaining classes exist so annotators can hand over whatever they know
/// without collapsing everything into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    Determiner,
    Pronoun,
    Preposition,
    Conjunction,
    Modal,
    Numeral,
    Adverb,
    Adjective,
    Verb,
    NounSingular,
    NounPlural,
    NounProper,
    Other,
}

impl Tag {
    /// True for the common singular noun class targeted for blanking.
    pub fn is_common_singular_noun(self) -> bool {
        matches!(self, Tag::NounSingular)
    }

    pub fn is_adverb(self) -> bool {
        matches!(self, Tag::Adverb)
    }

    fn is_noun(self) -> bool {
        matches!(self, Tag::NounSingular | Tag::NounPlural | Tag::NounProper)
    }

    fn chunkable(self) -> bool {
        self.is_noun() || matches!(self, Tag::Adjective)
    }
}

/// One word of a sentence with its tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub tag: Tag,
}

impl Token {
    pub fn new(text: impl Into<String>, tag: Tag) -> Self {
        Self {
            text: text.into(),
            tag,
        }
    }
}

/// A detected noun phrase: an ordered word span referring to one concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NounPhrase {
    words: Vec<String>,
    text: String,
}

impl NounPhrase {
    pub fn new(words: Vec<String>) -> Self {
        let text = words.join(" ");
        Self { words, text }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Space-joined phrase text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// An annotated sentence: ordered tagged words, detected noun phrases, and
/// the original display form. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    tokens: Vec<Token>,
    noun_phrases: Vec<NounPhrase>,
    display: String,
}

impl Sentence {
    pub fn new(
        tokens: Vec<Token>,
        noun_phrases: Vec<NounPhrase>,
        display: impl Into<String>,
    ) -> Self {
        Self {
            tokens,
            noun_phrases,
            display: display.into(),
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn noun_phrases(&self) -> &[NounPhrase] {
        &self.noun_phrases
    }

    /// Original casing and punctuation, suitable for question rendering.
    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn word_count(&self) -> usize {
        self.tokens.len()
    }
}

/// Source of annotated sentences.
///
/// Tagging quality bounds question quality, so production deployments may
/// swap in a model-backed implementation; the pipeline treats whatever it
/// receives as ground truth.
pub trait Annotator: Sync {
    /// Segments `text` into annotated sentences, in document order.
    fn sentences(&self, text: &str) -> Vec<Sentence>;
}

const DETERMINERS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "each", "every", "either", "neither",
    "some", "any", "no", "another", "both", "all",
];

const PRONOUNS: &[&str] = &[
    "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us", "them", "who", "whom",
    "which", "what", "its", "his", "their", "our", "your", "my", "itself", "himself", "herself",
    "themselves",
];

const PREPOSITIONS: &[&str] = &[
    "of", "in", "on", "at", "by", "for", "with", "about", "against", "between", "into", "through",
    "during", "before", "after", "above", "below", "to", "from", "up", "down", "under", "over",
    "near", "within", "without", "along", "across", "behind", "beyond", "among", "around", "upon",
    "as", "per",
];

const CONJUNCTIONS: &[&str] = &[
    "and", "but", "or", "nor", "so", "because", "although", "though", "while", "whereas", "if",
    "unless", "until", "since", "when", "where", "that", "whether",
];

const MODALS: &[&str] = &[
    "can", "could", "may", "might", "must", "shall", "should", "will", "would",
];

const COMMON_VERBS: &[&str] = &[
    "is", "are", "was", "were", "be", "been", "being", "am", "has", "have", "had", "do", "does",
    "did", "became", "become", "becomes", "remains", "remain", "include", "includes", "included",
    "make", "makes", "made", "take", "takes", "took", "won", "lost", "held", "hold", "holds",
    "serve", "serves", "served", "lies", "lie", "lay", "covers", "cover", "covered", "borders",
    "border", "bordered", "form", "forms", "formed", "use", "uses", "used", "know", "known",
    "knows", "sit", "sits", "sat", "grew", "grow", "grows",
];

const COMMON_ADVERBS: &[&str] = &[
    "very", "never", "also", "often", "always", "sometimes", "soon", "now", "then", "here",
    "there", "however", "perhaps", "almost", "already", "again", "too", "quite", "rather", "yet",
    "even", "still", "just", "meanwhile", "moreover", "instead", "otherwise", "furthermore",
    "today", "yesterday", "tomorrow", "thus", "therefore", "well", "not",
];

const ADJECTIVE_SUFFIXES: &[&str] = &[
    "ous", "ful", "ive", "less", "able", "ible", "est", "most",
];

/// Deterministic heuristic annotator: UAX-29 segmentation, closed-class
/// lists plus suffix rules for tagging, adjective/noun runs for phrases.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleAnnotator;

impl RuleAnnotator {
    pub fn new() -> Self {
        Self
    }

    fn tag_word(word: &str, sentence_initial: bool) -> Tag {
        let lower = word.to_lowercase();

        if word.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return Tag::Numeral;
        }
        if let Some(tag) = closed_class(&lower) {
            return tag;
        }

        // A capitalized word past the sentence opener reads as a name.
        let capitalized = word.chars().next().is_some_and(char::is_uppercase);
        if capitalized && !sentence_initial {
            return Tag::NounProper;
        }

        if lower.ends_with("ly") && lower.len() > 3 {
            return Tag::Adverb;
        }
        if (lower.ends_with("ing") && lower.len() > 4) || (lower.ends_with("ed") && lower.len() > 3)
        {
            return Tag::Verb;
        }
        if ADJECTIVE_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
            return Tag::Adjective;
        }
        if lower.ends_with('s')
            && !lower.ends_with("ss")
            && !lower.ends_with("us")
            && !lower.ends_with("is")
            && lower.len() > 3
        {
            return Tag::NounPlural;
        }

        Tag::NounSingular
    }

    fn chunk_phrases(tokens: &[Token]) -> Vec<NounPhrase> {
        let mut phrases = Vec::new();
        let mut run: Vec<String> = Vec::new();
        let mut run_has_noun = false;

        for token in tokens {
            if token.tag.chunkable() {
                run_has_noun |= token.tag.is_noun();
                run.push(token.text.clone());
            } else {
                flush_run(&mut phrases, &mut run, &mut run_has_noun);
            }
        }
        flush_run(&mut phrases, &mut run, &mut run_has_noun);
        phrases
    }
}

fn flush_run(phrases: &mut Vec<NounPhrase>, run: &mut Vec<String>, has_noun: &mut bool) {
    // Single-word runs are left to the evaluator's single-word fallback.
    if *has_noun && run.len() >= 2 {
        phrases.push(NounPhrase::new(std::mem::take(run)));
    } else {
        run.clear();
    }
    *has_noun = false;
}

fn closed_class(lower: &str) -> Option<Tag> {
    if DETERMINERS.contains(&lower) {
        Some(Tag::Determiner)
    } else if PRONOUNS.contains(&lower) {
        Some(Tag::Pronoun)
    } else if MODALS.contains(&lower) {
        Some(Tag::Modal)
    } else if COMMON_VERBS.contains(&lower) {
        Some(Tag::Verb)
    } else if COMMON_ADVERBS.contains(&lower) {
        Some(Tag::Adverb)
    } else if PREPOSITIONS.contains(&lower) {
        Some(Tag::Preposition)
    } else if CONJUNCTIONS.contains(&lower) {
        Some(Tag::Conjunction)
    } else {
        None
    }
}

impl Annotator for RuleAnnotator {
    fn sentences(&self, text: &str) -> Vec<Sentence> {
        text.split_sentence_bounds()
            .filter_map(|segment| {
                let display = segment.trim();
                if display.is_empty() {
                    return None;
                }
                let tokens: Vec<Token> = display
                    .unicode_words()
                    .enumerate()
                    .map(|(index, word)| Token::new(word, Self::tag_word(word, index == 0)))
                    .collect();
                if tokens.is_empty() {
                    return None;
                }
                let noun_phrases = Self::chunk_phrases(&tokens);
                Some(Sentence::new(tokens, noun_phrases, display))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_in_document_order() {
        let annotator = RuleAnnotator::new();
        let sentences =
            annotator.sentences("The city grew quickly. It sits on a river. Trade made it rich.");
        assert_eq!(sentences.len(), 3);
        assert!(sentences[0].display().starts_with("The city"));
        assert!(sentences[2].display().starts_with("Trade"));
    }

    #[test]
    fn blank_text_yields_no_sentences() {
        let annotator = RuleAnnotator::new();
        assert!(annotator.sentences("   \n  ").is_empty());
    }

    #[test]
    fn tags_closed_classes_and_defaults() {
        assert_eq!(RuleAnnotator::tag_word("the", false), Tag::Determiner);
        assert_eq!(RuleAnnotator::tag_word("quickly", false), Tag::Adverb);
        assert_eq!(RuleAnnotator::tag_word("However", true), Tag::Adverb);
        assert_eq!(RuleAnnotator::tag_word("harbor", false), Tag::NounSingular);
        assert_eq!(RuleAnnotator::tag_word("rivers", false), Tag::NounPlural);
        assert_eq!(RuleAnnotator::tag_word("1836", false), Tag::Numeral);
    }

    #[test]
    fn capitalized_mid_sentence_is_a_name() {
        assert_eq!(RuleAnnotator::tag_word("Houston", false), Tag::NounProper);
        // The sentence opener is capitalized by convention, not by namehood.
        assert_eq!(RuleAnnotator::tag_word("Trade", true), Tag::NounSingular);
    }

    #[test]
    fn chunks_adjacent_noun_runs() {
        let annotator = RuleAnnotator::new();
        let sentences = annotator.sentences("The town sits in a fertile river valley near the coast.");
        let sentence = &sentences[0];
        let texts: Vec<&str> = sentence.noun_phrases().iter().map(|p| p.text()).collect();
        assert!(texts.contains(&"fertile river valley"));
        // "town" stands alone, so no single-word phrase is emitted for it.
        assert!(!texts.contains(&"town"));
    }
}
