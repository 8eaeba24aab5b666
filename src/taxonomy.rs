use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;

use fst::Map;
use lru::LruCache;
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::debug;

/// Default ceiling on candidates returned by [`Taxonomy::similar_words`].
pub const SIMILAR_WORD_POOL: usize = 8;

const SIMILAR_CACHE_CAPACITY: usize = 256;

/// Half-open slice into one of the flat index pools.
#[derive(Debug, Clone, Copy)]
struct Range {
    start: u32,
    len: u32,
}

impl Range {
    fn slice<'a, T>(&self, pool: &'a [T]) -> &'a [T] {
        let start = self.start as usize;
        &pool[start..start + self.len as usize]
    }
}

/// One noun concept: its surface terms and its direct generalization /
/// specialization links.
#[derive(Debug)]
struct ConceptRecord {
    key: String,
    terms: Vec<String>,
    hypernyms: Vec<u32>,
    hyponyms: Vec<u32>,
}

/// Read-only noun-concept hierarchy.
///
/// Surface forms resolve through an fst map to a sense list ordered the way
/// the source file lists senses; generalization and specialization links are
/// enumerated in that same file order, which keeps every lookup
/// deterministic.
#[derive(Debug)]
pub struct Taxonomy {
    term_index: Map<Vec<u8>>,
    sense_ranges: Vec<Range>,
    sense_pool: Vec<u32>,
    concepts: Vec<ConceptRecord>,
}

#[derive(Debug, Deserialize)]
struct TaxonomyFile {
    concepts: Vec<ConceptSpec>,
}

#[derive(Debug, Deserialize)]
struct ConceptSpec {
    key: String,
    terms: Vec<String>,
    #[serde(default)]
    hypernyms: Vec<String>,
}

#[derive(Debug)]
pub enum TaxonomyError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Index(fst::Error),
    EmptyTerms { concept: String },
    UnknownHypernym { concept: String, hypernym: String },
}

impl fmt::Display for TaxonomyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaxonomyError::Io(err) => write!(f, "io error: {err}"),
            TaxonomyError::Parse(err) => write!(f, "parse error: {err}"),
            TaxonomyError::Index(err) => write!(f, "term index error: {err}"),
            TaxonomyError::EmptyTerms { concept } => {
                write!(f, "concept {concept:?} lists no surface terms")
            }
            TaxonomyError::UnknownHypernym { concept, hypernym } => {
                write!(f, "concept {concept:?} references unknown hypernym {hypernym:?}")
            }
        }
    }
}

impl Error for TaxonomyError {}

impl From<std::io::Error> for TaxonomyError {
    fn from(value: std::io::Error) -> Self {
        TaxonomyError::Io(value)
    }
}

impl From<serde_json::Error> for TaxonomyError {
    fn from(value: serde_json::Error) -> Self {
        TaxonomyError::Parse(value)
    }
}

impl From<fst::Error> for TaxonomyError {
    fn from(value: fst::Error) -> Self {
        TaxonomyError::Index(value)
    }
}

impl Taxonomy {
    /// Loads a concept file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TaxonomyError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Parses a concept file from a JSON string.
    pub fn from_json_str(raw: &str) -> Result<Self, TaxonomyError> {
        let file: TaxonomyFile = serde_json::from_str(raw)?;
        Self::from_specs(file.concepts)
    }

    fn from_specs(specs: Vec<ConceptSpec>) -> Result<Self, TaxonomyError> {
        let mut key_to_index: BTreeMap<&str, u32> = BTreeMap::new();
        for (index, spec) in specs.iter().enumerate() {
            if spec.terms.is_empty() {
                return Err(TaxonomyError::EmptyTerms {
                    concept: spec.key.clone(),
                });
            }
            key_to_index.insert(spec.key.as_str(), index as u32);
        }

        let mut concepts: Vec<ConceptRecord> = Vec::with_capacity(specs.len());
        for spec in &specs {
            let mut hypernyms = Vec::with_capacity(spec.hypernyms.len());
            for parent in &spec.hypernyms {
                let parent_index = key_to_index.get(parent.as_str()).copied().ok_or_else(|| {
                    TaxonomyError::UnknownHypernym {
                        concept: spec.key.clone(),
                        hypernym: parent.clone(),
                    }
                })?;
                hypernyms.push(parent_index);
            }
            concepts.push(ConceptRecord {
                key: spec.key.clone(),
                terms: spec.terms.clone(),
                hypernyms,
                hyponyms: Vec::new(),
            });
        }

        // Specialization links mirror the file's declaration order, so
        // sibling enumeration stays deterministic.
        for child in 0..concepts.len() {
            let parents = concepts[child].hypernyms.clone();
            for parent in parents {
                concepts[parent as usize].hyponyms.push(child as u32);
            }
        }

        // Sense lists per surface form, again in declaration order.
        let mut senses_by_term: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        for (index, concept) in concepts.iter().enumerate() {
            for term in &concept.terms {
                senses_by_term
                    .entry(normalize_term(term))
                    .or_default()
                    .push(index as u32);
            }
        }

        let mut sense_ranges = Vec::with_capacity(senses_by_term.len());
        let mut sense_pool = Vec::new();
        let mut index_entries: Vec<(String, u64)> = Vec::with_capacity(senses_by_term.len());
        for (term, senses) in senses_by_term {
            let range = Range {
                start: sense_pool.len() as u32,
                len: senses.len() as u32,
            };
            sense_pool.extend(senses);
            index_entries.push((term, sense_ranges.len() as u64));
            sense_ranges.push(range);
        }

        // BTreeMap iteration is sorted, which is exactly what fst wants.
        let term_index = Map::from_iter(index_entries)?;

        debug!(
            concepts = concepts.len(),
            terms = sense_ranges.len(),
            "taxonomy loaded"
        );
        Ok(Self {
            term_index,
            sense_ranges,
            sense_pool,
            concepts,
        })
    }

    pub fn concept_count(&self) -> usize {
        self.concepts.len()
    }

    pub fn term_count(&self) -> usize {
        self.sense_ranges.len()
    }

    /// Concept senses registered for a surface form, most common first.
    fn senses(&self, word: &str) -> &[u32] {
        match self.term_index.get(normalize_term(word)) {
            Some(slot) => self.sense_ranges[slot as usize].slice(&self.sense_pool),
            None => &[],
        }
    }

    /// Finds up to `cap` semantically related words for `word`.
    ///
    /// Takes the first registered sense, walks to its first generalization,
    /// and enumerates that generalization's specializations, reporting each
    /// one's leading surface term with separators normalized to spaces. The
    /// input word itself is excluded by exact match; duplicates from
    /// distinct siblings are reported as-is. Absence at any level (unknown
    /// word, no generalization, no siblings) yields an empty list rather
    /// than an error.
    pub fn similar_words(&self, word: &str, cap: usize) -> Vec<String> {
        let Some(&sense) = self.senses(word).first() else {
            return Vec::new();
        };
        let Some(&parent) = self.concepts[sense as usize].hypernyms.first() else {
            return Vec::new();
        };

        let mut similar = Vec::new();
        for &sibling in &self.concepts[parent as usize].hyponyms {
            let Some(term) = self.concepts[sibling as usize].terms.first() else {
                continue;
            };
            let candidate = term.replace('_', " ");
            if candidate != word {
                similar.push(candidate);
            }
            if similar.len() == cap {
                break;
            }
        }
        similar
    }

    /// Key and surface terms for every sense of `word`, for inspection
    /// surfaces.
    pub fn describe(&self, word: &str) -> Vec<(&str, &[String])> {
        self.senses(word)
            .iter()
            .map(|&sense| {
                let concept = &self.concepts[sense as usize];
                (concept.key.as_str(), concept.terms.as_slice())
            })
            .collect()
    }
}

fn normalize_term(term: &str) -> String {
    term.trim().to_lowercase().replace(' ', "_")
}

/// Caching front for [`Taxonomy::similar_words`].
///
/// Articles repeat their subject nouns across sentences; the cache keeps
/// those repeats from re-walking the hierarchy. Results are identical to
/// the uncached path.
pub struct SimilarWords<'a> {
    taxonomy: &'a Taxonomy,
    cache: Mutex<LruCache<String, Vec<String>>>,
    cap: usize,
}

impl<'a> SimilarWords<'a> {
    pub fn new(taxonomy: &'a Taxonomy, cap: usize) -> Self {
        let capacity =
            NonZeroUsize::new(SIMILAR_CACHE_CAPACITY).expect("cache capacity is nonzero");
        Self {
            taxonomy,
            cache: Mutex::new(LruCache::new(capacity)),
            cap,
        }
    }

    pub fn lookup(&self, word: &str) -> Vec<String> {
        if let Some(hit) = self.cache.lock().get(word) {
            return hit.clone();
        }
        let similar = self.taxonomy.similar_words(word, self.cap);
        self.cache
            .lock()
            .put(word.to_string(), similar.clone());
        similar
    }
}
