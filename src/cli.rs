use std::error::Error;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use atty::Stream;
use clap::{Parser, Subcommand};
use quizgloss::{
    CandidateQuestion, Document, RuleAnnotator, SIMILAR_WORD_POOL, Taxonomy, TriviaGenerator,
    TriviaResult, default_taxonomy,
};
use rand::Rng;
use serde_json::json;
use termimad::{FmtText, MadSkin, terminal_size};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "quizgloss",
    about = "Generate fill-in-the-blank trivia from article text",
    version
)]
pub struct Cli {
    /// Emit JSON instead of human-readable output.
    #[arg(long, global = true)]
    json: bool,

    /// Concept file to use instead of the bundled taxonomy.
    #[arg(long, global = true, value_name = "PATH")]
    taxonomy: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one finished trivia question from a document.
    Generate {
        #[command(flatten)]
        input: DocumentArgs,
    },
    /// List every candidate question the analyzer finds.
    Candidates {
        #[command(flatten)]
        input: DocumentArgs,
    },
    /// Show taxonomy distractors for a single word.
    Similar {
        /// Word to look up.
        word: String,
        /// Maximum number of candidates to return.
        #[arg(short, long, default_value_t = SIMILAR_WORD_POOL)]
        limit: usize,
    },
    /// Play one interactive round on the terminal.
    Play {
        #[command(flatten)]
        input: DocumentArgs,
    },
}

#[derive(clap::Args, Debug)]
struct DocumentArgs {
    /// Path to the document body; read from stdin when omitted.
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Article title, used by the noun filter.
    #[arg(long, default_value = "")]
    title: String,

    /// Source URL carried into the output.
    #[arg(long, default_value = "")]
    url: String,
}

impl DocumentArgs {
    fn into_document(self) -> Result<Document, Box<dyn Error>> {
        let body = match &self.file {
            Some(path) => fs::read_to_string(path)
                .map_err(|err| format!("Failed to read {}: {err}", path.display()))?,
            None => {
                let mut buffer = String::new();
                io::stdin().read_to_string(&mut buffer)?;
                buffer
            }
        };
        Ok(Document::new(body, self.url, self.title))
    }
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let loaded = match cli.taxonomy.as_deref() {
        Some(path) => Some(load_taxonomy(path)?),
        None => None,
    };
    let taxonomy = loaded.as_ref().unwrap_or(default_taxonomy());

    match cli.command {
        Command::Generate { input } => handle_generate(input.into_document()?, taxonomy, cli.json),
        Command::Candidates { input } => {
            handle_candidates(input.into_document()?, taxonomy, cli.json)
        }
        Command::Similar { word, limit } => handle_similar(&word, limit, taxonomy, cli.json),
        Command::Play { input } => handle_play(input.into_document()?, taxonomy),
    }
}

fn load_taxonomy(path: &Path) -> Result<Taxonomy, Box<dyn Error>> {
    Taxonomy::from_path(path)
        .map_err(|err| format!("Failed to load taxonomy from {}: {err}", path.display()).into())
}

fn handle_generate(
    document: Document,
    taxonomy: &Taxonomy,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let annotator = RuleAnnotator::new();
    let generator = TriviaGenerator::new(&annotator, taxonomy);
    match generator.generate(&document) {
        Some(result) => {
            if as_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_trivia(&result);
            }
        }
        None => {
            if as_json {
                println!("{}", serde_json::to_string_pretty(&json!({ "found": false }))?);
            } else {
                println!("No trivia could be generated from this document.");
            }
        }
    }
    Ok(())
}

fn handle_candidates(
    document: Document,
    taxonomy: &Taxonomy,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let annotator = RuleAnnotator::new();
    let generator = TriviaGenerator::new(&annotator, taxonomy);
    let candidates = generator.candidates(&document);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&candidates)?);
    } else {
        print_candidate_table(&candidates);
    }
    Ok(())
}

fn handle_similar(
    word: &str,
    limit: usize,
    taxonomy: &Taxonomy,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let limit = limit.max(1);
    let similar = taxonomy.similar_words(word, limit);

    if as_json {
        let payload = json!({
            "word": word,
            "senses": taxonomy.describe(word),
            "similar_words": similar,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if similar.is_empty() {
        println!("No similar words found for {word:?}.");
    } else {
        println!("Similar to {word:?}:");
        for candidate in &similar {
            println!("- {candidate}");
        }
    }
    Ok(())
}

fn handle_play(document: Document, taxonomy: &Taxonomy) -> Result<(), Box<dyn Error>> {
    let annotator = RuleAnnotator::new();
    let generator = TriviaGenerator::new(&annotator, taxonomy);
    let Some(result) = generator.generate(&document) else {
        println!("No trivia could be generated from this document.");
        return Ok(());
    };

    // Answer placement is presentation logic, so the shuffle happens here
    // rather than in the pipeline.
    let mut options = result.distractors.clone();
    let slot = rand::thread_rng().gen_range(0..=options.len());
    options.insert(slot, result.answer.clone());

    render_markdown_block("Question", &result.question);
    println!();
    for (index, option) in options.iter().enumerate() {
        println!("  {}) {option}", index + 1);
    }
    print!("\nYour answer [1-{}]: ", options.len());
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let choice: usize = line
        .trim()
        .parse()
        .map_err(|_| format!("Expected a number between 1 and {}", options.len()))?;
    let picked = options
        .get(choice.wrapping_sub(1))
        .ok_or_else(|| format!("Expected a number between 1 and {}", options.len()))?;

    if *picked == result.answer {
        println!("Correct!");
    } else {
        println!("Wrong - the answer was {:?}.", result.answer);
    }
    Ok(())
}

fn print_trivia(result: &TriviaResult) {
    render_markdown_block("Question", &result.question);
    println!("\nAnswer: {}", result.answer);
    println!("Distractors: {}", result.distractors.join(", "));
}

fn print_candidate_table(candidates: &[CandidateQuestion]) {
    if candidates.is_empty() {
        println!("No candidate questions found.");
        return;
    }
    let width = candidates
        .iter()
        .map(|candidate| candidate.answer_text().len())
        .max()
        .unwrap_or(6)
        .max("ANSWER".len());
    println!("{:<width$}  {:>7}  {}", "ANSWER", "SIMILAR", "QUESTION", width = width);
    println!("{:-<width$}  {:->7}  {:-<8}", "", "", "", width = width);
    for candidate in candidates {
        println!(
            "{:<width$}  {:>7}  {}",
            candidate.answer_text(),
            candidate.similar_words.len(),
            candidate.question,
            width = width
        );
    }
}

fn stdout_is_tty() -> bool {
    atty::is(Stream::Stdout)
}

fn markdown_width() -> usize {
    let (width, _) = terminal_size();
    width.max(60) as usize
}

fn render_markdown_block(title: &str, body: &str) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return;
    }
    println!("{title}:");
    if stdout_is_tty() {
        let skin = MadSkin::default();
        let formatted = FmtText::from(&skin, trimmed, Some(markdown_width()));
        println!("{formatted}");
    } else {
        println!("{trimmed}");
    }
}
