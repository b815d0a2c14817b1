use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
    process::ExitCode,
};

use clap::{
    Parser,
    Subcommand,
};
use serde::{
    de::DeserializeOwned,
    Serialize,
};
use tracing_subscriber::EnvFilter;
use ulpan::{
    core::{
        LessonSource,
        LessonWord,
        MatchingConfig,
        Orchestrator,
        Result,
        SourceFailure,
        VocabularyIndex,
        VocabularyRecord,
    },
    persistence::{
        save_json,
        Approval,
        MatchStore,
    },
    segmentation::LessonBatch,
};

#[derive(Parser)]
#[command(name = "ulpan", version, about = "Match Hebrew lesson vocabulary against a flashcard collection")]
struct Cli {
    /// Matching config (JSON); defaults to the one in the app data directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Match store file; defaults to the one in the app data directory
    #[arg(long, global = true)]
    store: Option<PathBuf>,
    /// Log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Suggest vocabulary candidates for lesson words
    Suggest {
        /// Lesson sources: [{"source_id": "L001.S01", "phrases": [...]}]
        #[arg(long, conflicts_with = "words", required_unless_present = "words")]
        lessons: Option<PathBuf>,
        /// Pre-extracted lesson words: [{"surface_form", "source_id", "context"}]
        #[arg(long)]
        words: Option<PathBuf>,
        /// Vocabulary snapshot: [{"surface_form", "translation", "card_id", "tags"}]
        #[arg(long)]
        vocabulary: PathBuf,
        /// Write the report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Neither read nor update the match store
        #[arg(long)]
        no_store: bool,
    },
    /// Record approved matches and print the resulting tag plan
    Approve {
        /// Approvals: [{"source_id", "lesson_word", "card_id", "confidence"}]
        approvals: PathBuf,
        /// Vocabulary snapshot, used to spot cards that are already tagged
        #[arg(long)]
        vocabulary: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print match store statistics
    Stats,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => MatchingConfig::load(path)?,
        None => MatchingConfig::load_default()?,
    };
    let open_store = || match &cli.store {
        Some(path) => MatchStore::open(path),
        None => MatchStore::open_default(),
    };

    match cli.command {
        Command::Suggest { lessons, words, vocabulary, output, no_store } => {
            let orchestrator = Orchestrator::new(config)?;
            let index = load_vocabulary(&vocabulary)?;
            let batch = match (lessons, words) {
                (Some(path), _) => orchestrator.extractor().extract_batch(read_records::<LessonSource>(&path)?),
                (None, Some(path)) => read_words(&path)?,
                (None, None) => LessonBatch::default(),
            };

            let mut store = if no_store { None } else { Some(open_store()?) };
            let report = orchestrator.match_batch(&batch, &index, store.as_mut())?;
            emit(&report, output.as_deref())?;
            if let Some(store) = store {
                store.close()?;
            }
        }
        Command::Approve { approvals, vocabulary, output } => {
            let orchestrator = Orchestrator::new(config)?;
            let approvals: Vec<Approval> = read_json(&approvals)?;
            let index = vocabulary.as_deref().map(load_vocabulary).transpose()?;

            let mut store = open_store()?;
            let plan = orchestrator.apply_approvals(&approvals, &mut store, index.as_ref())?;
            store.close()?;
            emit(&plan, output.as_deref())?;
        }
        Command::Stats => {
            let store = open_store()?;
            emit(&store.statistics(), None)?;
        }
    }

    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Parses each element of a JSON array on its own, so one bad record only
/// costs that record.
fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<std::result::Result<T, SourceFailure>>> {
    let values: Vec<serde_json::Value> = read_json(path)?;
    Ok(values
        .into_iter()
        .enumerate()
        .map(|(position, value)| {
            let label = value
                .get("source_id")
                .and_then(|id| id.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}[{}]", path.display(), position));
            serde_json::from_value(value).map_err(|e| SourceFailure::new(label, e))
        })
        .collect())
}

fn read_words(path: &Path) -> Result<LessonBatch> {
    let mut batch = LessonBatch::default();
    for record in read_records::<LessonWord>(path)? {
        match record {
            Ok(word) => batch.words.push(word),
            Err(failure) => batch.failures.push(failure),
        }
    }
    Ok(batch)
}

fn load_vocabulary(path: &Path) -> Result<VocabularyIndex> {
    let mut index = VocabularyIndex::new();
    let mut rejected = 0;
    for record in read_records::<VocabularyRecord>(path)? {
        match record {
            Ok(record) => {
                if !index.insert(record.into()) {
                    rejected += 1;
                }
            }
            Err(failure) => {
                tracing::warn!("Skipping vocabulary row {}: {}", failure.source, failure.reason);
                rejected += 1;
            }
        }
    }

    let stats = index.stats();
    tracing::info!("Vocabulary: {} entries, {} distinct forms, {} rejected", stats.entries, stats.distinct_forms, rejected);
    Ok(index)
}

fn emit<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => save_json(value, path),
        None => {
            println!("{}", serde_json::to_string_pretty(value)?);
            Ok(())
        }
    }
}
