//! Recall CLI
//!
//! Lists lessons, imports vocabulary, and runs interactive flashcard sessions
//! in the terminal.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use recall_core::{
    parse_extraction_payload, AudioOutput, Capabilities, CardFace, CardPresenter, Config,
    EventBroadcaster, FaceContent, FeedbackCue, JsonLessonStore, Judgment, Lesson, LessonStore,
    Orientation, PresenterOptions, RecallError, ReviewEvent, Scheduler,
    SessionSnapshot, SpeechRequest, TokioScheduler,
};
use recall_report::{
    json::JsonGenerator, MarkdownGenerator, ReportGenerator, ReportInput, RoundInput,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

/// Recall - vocabulary flashcards
///
/// Studies a lesson's vocabulary in rounds: every word you forget comes back in
/// the next round until you know them all.
#[derive(Parser, Debug)]
#[command(name = "recall")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: recall.json in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Directory holding the lesson files
    #[arg(long, value_name = "DIR", global = true)]
    lessons_dir: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the available lessons
    List,

    /// Study a lesson's vocabulary
    Study {
        /// Identifier of the lesson
        #[arg(value_name = "LESSON_ID")]
        lesson_id: String,

        /// Show the meaning first and recall the word
        #[arg(long)]
        reverse: bool,

        /// Output directory for session reports
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<String>,
    },

    /// Create or replace a lesson from an extraction payload
    Import {
        /// Identifier of the lesson
        #[arg(value_name = "LESSON_ID")]
        lesson_id: String,

        /// JSON file with a `vocabulary` array
        #[arg(long, value_name = "FILE")]
        payload: PathBuf,

        /// Vocabulary title
        #[arg(long)]
        title: Option<String>,

        /// Lesson date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,

        /// Allow editing lessons
        #[arg(long)]
        admin: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(config = ?args.config, "Config file");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(ref lessons_dir) = args.lessons_dir {
        config.lessons_dir.clone_from(lessons_dir);
    }

    match args.command {
        Command::List => {
            config.validate()?;
            list_lessons(&config)
        }
        Command::Study {
            lesson_id,
            reverse,
            output_dir,
        } => {
            if let Some(ref output_dir) = output_dir {
                config.output_dir.clone_from(output_dir);
            }
            if reverse {
                config.orientation = Orientation::Reverse;
            }
            // Re-validate after overrides
            config.validate()?;
            study(&config, &lesson_id).await
        }
        Command::Import {
            lesson_id,
            payload,
            title,
            date,
            admin,
        } => {
            config.validate()?;
            let caps = Capabilities { can_edit: admin };
            import_lesson(&config, &lesson_id, &payload, title, date, caps)
        }
    }
}

/// Loads configuration from the given path or the current directory.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

// ============================================================================
// list
// ============================================================================

fn list_lessons(config: &Config) -> anyhow::Result<()> {
    let store = JsonLessonStore::new(&config.lessons_dir);
    let lessons = store.list_lessons()?;

    if lessons.is_empty() {
        println!("No lessons in '{}'.", store.dir().display());
        println!("Import one with: recall import <LESSON_ID> --payload <FILE> --admin");
        return Ok(());
    }

    for lesson in &lessons {
        println!(
            "{:<20} {}  {} ({} words)",
            lesson.id,
            lesson.date,
            lesson.display_title(),
            lesson.vocabulary.len()
        );
    }
    Ok(())
}

// ============================================================================
// import
// ============================================================================

fn import_lesson(
    config: &Config,
    lesson_id: &str,
    payload: &Path,
    title: Option<String>,
    date: Option<String>,
    caps: Capabilities,
) -> anyhow::Result<()> {
    if !caps.can_edit {
        return Err(RecallError::permission_denied("importing a lesson").into());
    }
    if let Some(ref date) = date {
        NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| {
            anyhow::anyhow!("Invalid date '{date}': {e}\n\nSuggestion: Use the YYYY-MM-DD format")
        })?;
    }

    let raw = std::fs::read_to_string(payload).map_err(|e| {
        anyhow::anyhow!("Failed to read payload '{}': {e}", payload.display())
    })?;
    let extracted = parse_extraction_payload(&raw)?;

    for rejected in &extracted.rejected {
        println!("  Skipped entry {}: {}", rejected.index, rejected.reason);
    }
    if extracted.items.is_empty() {
        anyhow::bail!("The payload contains no usable vocabulary");
    }

    let store = JsonLessonStore::new(&config.lessons_dir);
    let mut lesson = store
        .get_lesson(lesson_id)?
        .unwrap_or_else(|| Lesson::new(lesson_id, Vec::new()));
    lesson.vocabulary = extracted.items;
    if let Some(title) = title {
        lesson.vocabulary_title = title;
    }
    if let Some(date) = date {
        lesson.date = date;
    }

    store.save_lesson(&lesson, &caps)?;
    println!(
        "Saved lesson '{}' with {} words.",
        lesson.id,
        lesson.vocabulary.len()
    );
    Ok(())
}

// ============================================================================
// study
// ============================================================================

/// A command typed during a study session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StudyCommand {
    Flip,
    Known,
    Forgot,
    Speak,
    ToggleOrientation,
    Continue,
    Quit,
    Help,
}

fn parse_command(line: &str) -> Option<StudyCommand> {
    match line.trim().to_lowercase().as_str() {
        "f" | "flip" => Some(StudyCommand::Flip),
        "k" | "known" => Some(StudyCommand::Known),
        "x" | "forgot" => Some(StudyCommand::Forgot),
        "s" | "speak" => Some(StudyCommand::Speak),
        "r" | "reverse" => Some(StudyCommand::ToggleOrientation),
        "" | "c" | "continue" => Some(StudyCommand::Continue),
        "q" | "quit" => Some(StudyCommand::Quit),
        "h" | "help" | "?" => Some(StudyCommand::Help),
        _ => None,
    }
}

/// Terminal stand-in for sound and speech.
#[derive(Debug, Clone, Copy)]
struct TerminalAudio;

impl AudioOutput for TerminalAudio {
    fn play_cue(&self, cue: FeedbackCue) {
        let tone = cue.tone();
        tracing::debug!(?cue, start_hz = tone.start_hz, "Feedback cue");
        if cue == FeedbackCue::Wrong {
            print!("\x07");
        }
    }

    fn speak(&self, request: SpeechRequest) {
        let texts: Vec<&str> = request.utterances.iter().map(|u| u.text.as_str()).collect();
        println!("  (speaking) {}", texts.join("  ...  "));
    }
}

async fn study(config: &Config, lesson_id: &str) -> anyhow::Result<()> {
    let store = JsonLessonStore::new(&config.lessons_dir);
    let lesson = store
        .get_lesson(lesson_id)?
        .ok_or_else(|| RecallError::lesson_not_found(lesson_id))?;
    tracing::info!(lesson = %lesson.id, words = lesson.vocabulary.len(), "Studying lesson");

    let (scheduler, mut fired) = TokioScheduler::new();
    let events = EventBroadcaster::default();
    let mut event_rx = events.subscribe();

    let mut presenter = CardPresenter::new(
        lesson.shared_vocabulary(),
        scheduler,
        TerminalAudio,
        PresenterOptions::from_config(config),
    )
    .with_events(events);
    presenter.start()?;

    println!("{}", lesson.display_title());
    print_help();
    render_events(&presenter, &mut event_rx);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt();
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::debug!("stdin closed");
                    break;
                };
                let Some(command) = parse_command(&line) else {
                    println!("  Unknown command '{}'. Press h for help.", line.trim());
                    continue;
                };
                if command == StudyCommand::Quit {
                    break;
                }
                handle_command(&mut presenter, command)?;
            }
            Some(handle) = fired.recv() => {
                presenter.on_timer(handle);
            }
        }

        render_events(&presenter, &mut event_rx);
        if presenter.state().is_terminal() {
            break;
        }
    }

    let snapshot = presenter.close();
    write_reports(&lesson, &snapshot, Path::new(&config.output_dir))
}

fn handle_command<S: Scheduler>(
    presenter: &mut CardPresenter<S, TerminalAudio>,
    command: StudyCommand,
) -> anyhow::Result<()> {
    let result = match command {
        StudyCommand::Flip => presenter.flip().map(|_| print_card(presenter)),
        StudyCommand::Known => presenter.judge(Judgment::Known).map(|_| ()),
        StudyCommand::Forgot => presenter.judge(Judgment::Forgot).map(|_| ()),
        StudyCommand::Speak => presenter.speak_current(),
        StudyCommand::ToggleOrientation => presenter.toggle_orientation().map(|o| {
            println!("  Orientation: {o}");
            print_card(presenter);
        }),
        StudyCommand::Continue => presenter.continue_session().map(|_| ()),
        StudyCommand::Help => {
            print_help();
            Ok(())
        }
        StudyCommand::Quit => Ok(()),
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.is_contract_violation() => {
            println!("  Not available while {}.", presenter.state());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn render_events<S: Scheduler>(
    presenter: &CardPresenter<S, TerminalAudio>,
    events: &mut broadcast::Receiver<ReviewEvent>,
) {
    loop {
        match events.try_recv() {
            Ok(event) => render_event(presenter, &event),
            Err(broadcast::error::TryRecvError::Lagged(n)) => {
                tracing::warn!(skipped = n, "Renderer fell behind");
            }
            Err(_) => break,
        }
    }
}

fn render_event<S: Scheduler>(presenter: &CardPresenter<S, TerminalAudio>, event: &ReviewEvent) {
    match event {
        ReviewEvent::SessionStarted(p) => {
            println!("{} words, {} orientation\n", p.item_count, p.orientation);
        }
        ReviewEvent::CardShown(p) => {
            let marker = if p.previously_forgotten { " *" } else { "" };
            println!("\n[Round {} | {}/{}]{marker}", p.round, p.position, p.round_length);
            print_card(presenter);
        }
        ReviewEvent::CardJudged(p) => match p.judgment {
            Judgment::Known => println!("  Known: {}", p.word),
            Judgment::Forgot => println!("  Forgot: {} (comes back next round)", p.word),
        },
        ReviewEvent::RoundComplete(p) => {
            println!("\nRound {} complete: {} reviewed.", p.round, p.reviewed);
            if p.to_review == 0 {
                println!("You knew every card. Press c to finish.");
            } else {
                println!("{} words to review. Press c to start the next round.", p.to_review);
            }
        }
        ReviewEvent::SessionComplete(p) => {
            println!("\nSession complete after {} rounds.", p.rounds);
            if !p.troublesome_words.is_empty() {
                println!("Words to revisit: {}", p.troublesome_words.join(", "));
            }
        }
        ReviewEvent::SessionClosed(_) => {}
    }
}

fn print_card<S: Scheduler>(presenter: &CardPresenter<S, TerminalAudio>) {
    match presenter.current_face() {
        Ok(face) => print_face(&face),
        Err(e) => tracing::debug!(error = %e, "No card to print"),
    }
}

fn print_face(face: &CardFace) {
    match &face.content {
        FaceContent::Word { word, ipa, images } => {
            match ipa {
                Some(ipa) => println!("  {word}  {ipa}"),
                None => println!("  {word}"),
            }
            for image in images {
                tracing::debug!(variant = ?image.variant, url = %image.url, "Image");
            }
        }
        FaceContent::Meaning {
            definition,
            example,
        } => {
            println!("  {definition}");
            println!("  \"{example}\"");
        }
    }
}

fn print_help() {
    println!("Commands: f flip, k known, x forgot, s speak, r reverse, c/enter continue, q quit");
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

// ============================================================================
// reports
// ============================================================================

/// Writes Markdown and JSON reports for a finished or abandoned session.
fn write_reports(lesson: &Lesson, snapshot: &SessionSnapshot, output_dir: &Path) -> anyhow::Result<()> {
    let Some(input) = create_report_input(lesson, snapshot) else {
        tracing::debug!("Session never started, no report written");
        return Ok(());
    };

    let report = ReportGenerator::new(input).generate()?;

    std::fs::create_dir_all(output_dir)?;

    let md_path = output_dir.join("recall-report.md");
    std::fs::write(&md_path, MarkdownGenerator::new(&report).generate())?;
    println!("\n  Markdown report: {}", md_path.display());

    let json_path = output_dir.join("recall-report.json");
    JsonGenerator::new(&report).write_to_file(&json_path, true)?;
    println!("  JSON report: {}", json_path.display());

    Ok(())
}

/// Creates a `ReportInput` from the closed session.
fn create_report_input(lesson: &Lesson, snapshot: &SessionSnapshot) -> Option<ReportInput> {
    let session = snapshot.session.as_ref()?;
    let word_at = |index: usize| {
        lesson
            .vocabulary
            .get(index)
            .map_or_else(|| format!("#{index}"), |item| item.word.clone())
    };

    let rounds = session
        .history()
        .iter()
        .map(|record| RoundInput {
            round: record.round,
            reviewed: record.reviewed,
            forgotten_words: record.forgotten.iter().map(|&i| word_at(i)).collect(),
            started_at: record.started_at,
            ended_at: record.ended_at,
        })
        .collect();

    Some(ReportInput {
        lesson_title: lesson.display_title().to_string(),
        total_words: lesson.vocabulary.len(),
        completed: snapshot.completed(),
        started_at: session.started_at(),
        ended_at: session.ended_at().unwrap_or_else(Utc::now),
        rounds,
        troublesome_words: session.ever_forgotten().to_vec(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use recall_core::{ManualScheduler, NullAudio, VocabularyItem};

    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("f"), Some(StudyCommand::Flip));
        assert_eq!(parse_command(" K "), Some(StudyCommand::Known));
        assert_eq!(parse_command("x"), Some(StudyCommand::Forgot));
        assert_eq!(parse_command(""), Some(StudyCommand::Continue));
        assert_eq!(parse_command("quit"), Some(StudyCommand::Quit));
        assert_eq!(parse_command("?"), Some(StudyCommand::Help));
        assert_eq!(parse_command("zzz"), None);
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let args = Args::try_parse_from(["recall", "study", "2024-05-01", "--reverse"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Study { ref lesson_id, reverse: true, .. } if lesson_id == "2024-05-01"
        ));

        let args = Args::try_parse_from([
            "recall", "import", "l1", "--payload", "words.json", "--admin", "-v",
        ])
        .unwrap();
        assert!(args.verbose);
        assert!(matches!(args.command, Command::Import { admin: true, .. }));
    }

    #[test]
    fn test_import_requires_admin() {
        let config = Config::default();
        let err = import_lesson(
            &config,
            "l1",
            Path::new("missing.json"),
            None,
            None,
            Capabilities::read_only(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("--admin"));
    }

    #[test]
    fn test_create_report_input_maps_indices_to_words() {
        let lesson = Lesson::new(
            "l1",
            vec![
                VocabularyItem::new("alpha", "a", "A."),
                VocabularyItem::new("bravo", "b", "B."),
            ],
        );
        let scheduler = ManualScheduler::new();
        let mut presenter = CardPresenter::new(
            lesson.shared_vocabulary(),
            scheduler.clone(),
            NullAudio,
            PresenterOptions::default(),
        );
        presenter.start().unwrap();
        for outcome in [Judgment::Known, Judgment::Forgot] {
            let handle = presenter.judge(outcome).unwrap();
            scheduler.advance(std::time::Duration::from_secs(1));
            presenter.on_timer(handle);
        }
        let snapshot = presenter.close();

        let input = create_report_input(&lesson, &snapshot).unwrap();
        assert!(!input.completed);
        assert_eq!(input.rounds.len(), 1);
        assert_eq!(input.rounds[0].forgotten_words, vec!["bravo"]);
        assert_eq!(input.troublesome_words, vec!["bravo"]);
    }
}
