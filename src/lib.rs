pub mod annotate;
pub mod taxonomy;
pub mod trivia;

use once_cell::sync::Lazy;

pub use annotate::{Annotator, NounPhrase, RuleAnnotator, Sentence, Tag, Token};
pub use taxonomy::{SIMILAR_WORD_POOL, SimilarWords, Taxonomy, TaxonomyError};
pub use trivia::{
    BLANK, CandidateQuestion, Document, GeneratorConfig, TriviaGenerator, TriviaResult, select,
};

static TAXONOMY_JSON: &str = include_str!("../data/taxonomy.json");

static DEFAULT_TAXONOMY: Lazy<Taxonomy> =
    Lazy::new(|| Taxonomy::from_json_str(TAXONOMY_JSON).expect("bundled taxonomy parses"));

/// The compiled-in noun taxonomy.
pub fn default_taxonomy() -> &'static Taxonomy {
    &DEFAULT_TAXONOMY
}

/// Runs the whole pipeline with the bundled annotator and taxonomy.
///
/// Returns `None` when no sentence yields a candidate with enough
/// distractors; that is the expected not-found outcome, not an error.
pub fn generate_trivia(document: &Document) -> Option<TriviaResult> {
    static ANNOTATOR: RuleAnnotator = RuleAnnotator;
    TriviaGenerator::new(&ANNOTATOR, default_taxonomy()).generate(document)
}
