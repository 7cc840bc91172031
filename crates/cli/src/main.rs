use anyhow::{anyhow, bail, Context};
use chrono::{Local, NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use minutes_core::config::locale_from_env_value;
use minutes_core::constants::{DEFAULT_LLM_BASE_URL, DEFAULT_LLM_MODEL, MARKDOWN_EXTENSION};
use minutes_core::extraction::{corrections::propose_corrections, daily, topics};
use minutes_core::{
    Attendee, ChatCompletionsModel, CoreConfig, CorrectionService, DateLabel, Decision,
    Meeting, NonEmptyText, NoteRepository, StateDocumentService, TopicTrackingResult,
    Vocabulary,
};

#[derive(Parser)]
#[command(name = "minutes")]
#[command(about = "Meeting notes assistant for a Markdown vault")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List meeting kinds
    Kinds,
    /// Create a note from a transcript (read from stdin unless --transcript is given)
    New {
        /// Meeting kind folder (see `kinds`)
        kind: String,
        /// Meeting title, also used as the series name
        title: String,
        /// Meeting date (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
        /// Start time (HH:MM, default now)
        #[arg(long)]
        time: Option<String>,
        /// Duration in minutes
        #[arg(long)]
        duration: Option<i64>,
        /// Attendees (comma-separated, `Name <email>` allowed)
        #[arg(long, value_delimiter = ',')]
        attendees: Vec<String>,
        /// Subtype tag stored in the note header
        #[arg(long)]
        subtype: Option<String>,
        /// File holding the transcript
        #[arg(long)]
        transcript: Option<PathBuf>,
    },
    /// List unprocessed notes, newest first
    Pending,
    /// Correct a note's transcript interactively
    Correct {
        /// Note to correct
        note: PathBuf,
    },
    /// Correct, extract and merge a note, then mark it processed
    Process {
        /// Note to process
        note: PathBuf,
        /// Skip the correction pass
        #[arg(long)]
        no_correct: bool,
        /// Apply without asking for confirmation
        #[arg(long, short)]
        yes: bool,
    },
    /// Merge a saved topic-tracking result (JSON) into a state document
    Merge {
        /// State document to update
        state_document: PathBuf,
        /// JSON file with `updated_topics` and `new_other_topics`
        #[arg(long)]
        result: PathBuf,
        /// Date label of the meeting (yyMMdd)
        #[arg(long)]
        date: String,
        /// History document (default: next to the state document)
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// Show the vocabulary
    Vocab,
    /// Add an entry to the memorised corrections
    Memorise {
        /// Text as the transcription gets it wrong
        original: String,
        /// Replacement
        correction: String,
    },
}

/// Builds the core configuration from the environment.
///
/// # Environment Variables
/// - `VAULT_PATH`: vault root directory (required)
/// - `MINUTES_LOCALE`: `ca` (default) or `en`
/// - `MINUTES_SELF_NAME`: attendee left out of daily standup extraction
fn load_config() -> anyhow::Result<Arc<CoreConfig>> {
    let vault = std::env::var("VAULT_PATH").context("VAULT_PATH is not set")?;
    let locale = locale_from_env_value(std::env::var("MINUTES_LOCALE").ok())?;
    let self_name = std::env::var("MINUTES_SELF_NAME").ok();
    let cfg = CoreConfig::new(expand_home(&vault), locale, self_name)?;
    Ok(Arc::new(cfg))
}

/// Builds the model client from the environment.
///
/// # Environment Variables
/// - `LLM_BASE_URL`: OpenAI-compatible endpoint (default: OpenAI)
/// - `LLM_API_KEY`: bearer token
/// - `LLM_MODEL`: model name
fn load_model() -> anyhow::Result<ChatCompletionsModel> {
    let base_url =
        std::env::var("LLM_BASE_URL").unwrap_or_else(|_| DEFAULT_LLM_BASE_URL.into());
    let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.into());
    let api_key = std::env::var("LLM_API_KEY").ok();
    Ok(ChatCompletionsModel::new(base_url, api_key, model)?)
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}

fn ask(question: &str) -> anyhow::Result<String> {
    print!("{question}");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

fn confirm(question: &str) -> anyhow::Result<bool> {
    Ok(Decision::parse(&ask(&format!("{question} (y/n): "))?) == Decision::Accept)
}

/// Parses `Name <email>` or a bare name.
fn parse_attendee(raw: &str) -> anyhow::Result<Attendee> {
    let raw = raw.trim();
    let (name, email) = match raw.split_once('<') {
        Some((name, rest)) => (name, Some(rest.trim_end_matches('>').trim().to_string())),
        None => (raw, None),
    };
    Ok(Attendee {
        name: NonEmptyText::new(name).with_context(|| format!("invalid attendee '{raw}'"))?,
        email: email.filter(|e| !e.is_empty()),
    })
}

fn print_block(text: &str) {
    for line in text.lines() {
        println!("  {line}");
    }
    println!();
}

#[allow(clippy::too_many_arguments)]
fn new_note(
    repo: &NoteRepository,
    kind: &str,
    title: &str,
    date: Option<&str>,
    time: Option<&str>,
    duration: Option<i64>,
    attendees: &[String],
    subtype: Option<&str>,
    transcript: Option<&Path>,
) -> anyhow::Result<()> {
    let now = Local::now().naive_local();
    let date = match date {
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .with_context(|| format!("invalid date '{d}', expected YYYY-MM-DD"))?,
        None => now.date(),
    };
    let time = match time {
        Some(t) => NaiveTime::parse_from_str(t, "%H:%M")
            .with_context(|| format!("invalid time '{t}', expected HH:MM"))?,
        None => now.time(),
    };
    let start = date.and_time(time);

    let meeting = Meeting {
        title: NonEmptyText::new(title).context("meeting title cannot be empty")?,
        start,
        end: duration.map(|m| start + chrono::Duration::minutes(m)),
        attendees: attendees
            .iter()
            .filter(|a| !a.trim().is_empty())
            .map(|a| parse_attendee(a))
            .collect::<anyhow::Result<_>>()?,
    };

    let text = match transcript {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            eprintln!("Paste the transcript (Ctrl+D to finish):");
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            text
        }
    };
    if text.trim().is_empty() {
        bail!("transcript is empty; no note created");
    }

    let path = repo.create_note(&meeting, &text, kind, subtype)?;
    println!("Created {}", path.display());
    Ok(())
}

fn correct_note(
    cfg: &Arc<CoreConfig>,
    repo: &NoteRepository,
    model: &ChatCompletionsModel,
    note: &Path,
) -> anyhow::Result<()> {
    let service = CorrectionService::new(cfg.clone());
    let original = repo.read_transcript(note)?;

    let (transcript, replayed) = service.apply_memorised(&original)?;
    if replayed > 0 {
        println!("Applied {replayed} memorised corrections");
    }

    let vocabulary = Vocabulary::load(&cfg.vocabulary_path())?;
    let reference = repo.latest_processed_transcript(note)?;
    let proposals = propose_corrections(model, &vocabulary, reference.as_deref(), &transcript)?;
    if proposals.is_empty() {
        println!("No errors detected.");
    }

    let outcome = service.review(&transcript, &proposals, |proposal, context| {
        if !context.is_empty() {
            println!("  ...{context}...");
        }
        println!(
            "  \"{}\" → \"{}\"  ({})",
            proposal.original, proposal.correction, proposal.reason
        );
        let decision = match Decision::parse(&ask("  Apply? (y/n/m=yes and memorise/own text): ")?) {
            Decision::Replace { correction, .. } => {
                let memorise = confirm(&format!(
                    "  Memorise \"{}\" → \"{correction}\"?",
                    proposal.original
                ))?;
                Decision::Replace {
                    correction,
                    memorise,
                }
            }
            other => other,
        };
        println!();
        Ok::<_, anyhow::Error>(decision)
    })?;

    if outcome.memorised > 0 {
        println!("Memorised {} corrections", outcome.memorised);
    }
    if outcome.transcript != original {
        repo.write_transcript(note, &outcome.transcript)?;
        println!(
            "Transcript updated ({} reviewed corrections applied)",
            outcome.approved.len()
        );
    }
    Ok(())
}

fn process_note(
    cfg: &Arc<CoreConfig>,
    repo: &NoteRepository,
    note: &Path,
    no_correct: bool,
    yes: bool,
) -> anyhow::Result<()> {
    if repo.is_processed(note) {
        bail!("{} has already been processed", note.display());
    }
    let model = load_model()?;
    if !no_correct {
        correct_note(cfg, repo, &model, note)?;
    }

    let series = repo.series_of(note)?;
    let date = repo
        .date_of(note)
        .ok_or_else(|| anyhow!("{} has no yyMMdd date prefix", note.display()))?;
    let transcript = repo.read_transcript(note)?;
    let kind = series.kind().unwrap_or_default();
    let locale = cfg.locale();

    if kind == locale.tracking_kind {
        let state = StateDocumentService::new(cfg.clone());
        let open_topics = state.active_topics(series.state_document())?;
        let result = topics::extract_topic_updates(&model, &open_topics, &transcript)?;

        for update in &result.updated_topics {
            println!("### {}\n  {}\n", update.topic_name, update.summary);
        }
        for topic in &result.new_other_topics {
            println!("  - {topic}");
        }
        if !yes && !confirm("Apply these updates and mark the note processed?")? {
            println!("Note left unprocessed.");
            return Ok(());
        }

        let outcome =
            state.update(series.state_document(), series.history_document(), &result, &date)?;
        println!(
            "Updated {} topics, moved {} other topics and {} closed topics to history",
            outcome.topics_updated,
            outcome.displaced.len(),
            outcome.archived.len()
        );
    } else if kind == locale.daily_kind {
        let metadata = repo.read_metadata(note)?;
        let vocabulary = Vocabulary::load(&cfg.vocabulary_path())?;
        let result = daily::extract_daily(
            &model,
            &vocabulary,
            &metadata.attendee_names(),
            cfg.self_name(),
            &transcript,
        )?;

        print_block(&daily::render_daily(&result, locale));
        if !yes && !confirm("Append this summary and mark the note processed?")? {
            println!("Note left unprocessed.");
            return Ok(());
        }
        daily::append_daily(series.history_document(), locale, &result, &date)?;
    } else {
        bail!(
            "no extraction for meeting kind '{kind}' (expected '{}' or '{}')",
            locale.tracking_kind,
            locale.daily_kind
        );
    }

    let processed = repo.mark_processed(note)?;
    println!("Marked {} as processed", processed.display());
    Ok(())
}

fn merge_result(
    cfg: &Arc<CoreConfig>,
    state_document: &Path,
    result_path: &Path,
    date: &str,
    history: Option<PathBuf>,
) -> anyhow::Result<()> {
    let date = DateLabel::parse(date)?;
    let json = std::fs::read_to_string(result_path)
        .with_context(|| format!("failed to read {}", result_path.display()))?;
    let result: TopicTrackingResult = serde_json::from_str(&json)
        .with_context(|| format!("{} is not a topic-tracking result", result_path.display()))?;

    let history = history.unwrap_or_else(|| {
        state_document.with_file_name(format!(
            "{}.{MARKDOWN_EXTENSION}",
            cfg.locale().history_document
        ))
    });

    let outcome = StateDocumentService::new(cfg.clone()).update(
        state_document,
        &history,
        &result,
        &date,
    )?;
    if outcome.written {
        println!(
            "Updated {} topics, moved {} other topics and {} closed topics to {}",
            outcome.topics_updated,
            outcome.displaced.len(),
            outcome.archived.len(),
            history.display()
        );
    } else {
        println!("Nothing to merge.");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("minutes=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'minutes --help' for commands");
        return Ok(());
    };

    let cfg = load_config()?;
    tracing::debug!("using vault {}", cfg.vault_dir().display());
    let repo = NoteRepository::new(cfg.clone());

    match command {
        Commands::Kinds => {
            let kinds = repo.meeting_kinds()?;
            if kinds.is_empty() {
                println!("No meeting kinds found under {}.", cfg.meetings_dir().display());
            }
            for kind in kinds {
                println!("{kind}");
            }
        }
        Commands::New {
            kind,
            title,
            date,
            time,
            duration,
            attendees,
            subtype,
            transcript,
        } => new_note(
            &repo,
            &kind,
            &title,
            date.as_deref(),
            time.as_deref(),
            duration,
            &attendees,
            subtype.as_deref(),
            transcript.as_deref(),
        )?,
        Commands::Pending => {
            let notes = repo.list_unprocessed()?;
            if notes.is_empty() {
                println!("No unprocessed notes.");
            }
            for (i, note) in notes.iter().enumerate() {
                let date = note.date.as_ref().map_or("------", |d| d.as_str());
                println!("{:2}. {date} | {}", i + 1, note.title);
                println!("    {}", note.path.display());
            }
        }
        Commands::Correct { note } => {
            let model = load_model()?;
            correct_note(&cfg, &repo, &model, &note)?;
        }
        Commands::Process {
            note,
            no_correct,
            yes,
        } => process_note(&cfg, &repo, &note, no_correct, yes)?,
        Commands::Merge {
            state_document,
            result,
            date,
            history,
        } => merge_result(&cfg, &state_document, &result, &date, history)?,
        Commands::Vocab => {
            let vocabulary = Vocabulary::load(&cfg.vocabulary_path())?;
            if vocabulary.is_empty() {
                println!("No vocabulary at {}.", cfg.vocabulary_path().display());
            }
            for (section, terms) in vocabulary.sections() {
                println!("{section} ({}): {}", terms.len(), terms.join(", "));
            }
        }
        Commands::Memorise {
            original,
            correction,
        } => {
            if original.trim().is_empty() {
                bail!("original text cannot be empty");
            }
            let service = CorrectionService::new(cfg.clone());
            if service.memorise(&original, &correction)? {
                println!("Memorised \"{original}\" → \"{correction}\"");
            } else {
                println!("Already memorised.");
            }
        }
    }

    Ok(())
}
