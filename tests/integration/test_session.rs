//! End-to-end tests for a review session
//!
//! Lesson fixture -> presenter -> report, driven both by the manual scheduler
//! and by real tokio timers on a paused clock.

use std::path::PathBuf;
use std::time::Duration;

use recall_core::{
    create_session, CardPresenter, CardSide, Config, EventBroadcaster, FaceContent,
    JsonLessonStore, Judgment, Lesson, LessonStore, ManualScheduler, NullAudio, Orientation,
    PresenterOptions, PresenterState, RecordingAudio, ReviewEvent, Scheduler, SessionSnapshot,
    TokioScheduler,
};
use recall_report::{
    json::JsonGenerator, MarkdownGenerator, ReportGenerator, ReportInput, ReportStatus,
    RoundInput,
};

/// Path to the sample lesson fixture.
fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/sample-lesson")
}

fn fixture_lesson(id: &str) -> Lesson {
    JsonLessonStore::new(fixture_path().join("lessons"))
        .get_lesson(id)
        .expect("Failed to read lesson")
        .expect("Lesson fixture missing")
}

/// Judges the current card and lets its feedback pulse run out.
fn judge_and_advance<A: recall_core::AudioOutput>(
    presenter: &mut CardPresenter<ManualScheduler, A>,
    scheduler: &ManualScheduler,
    outcome: Judgment,
) {
    let handle = presenter.judge(outcome).expect("judge failed");
    let fired = scheduler.advance(Duration::from_secs(1));
    assert_eq!(fired, vec![handle]);
    assert!(presenter.on_timer(handle));
}

fn report_input(lesson: &Lesson, snapshot: &SessionSnapshot) -> ReportInput {
    let session = snapshot.session.as_ref().expect("session was started");
    ReportInput {
        lesson_title: lesson.display_title().to_string(),
        total_words: lesson.vocabulary.len(),
        completed: snapshot.completed(),
        started_at: session.started_at(),
        ended_at: session.ended_at().unwrap_or_else(chrono::Utc::now),
        rounds: session
            .history()
            .iter()
            .map(|record| RoundInput {
                round: record.round,
                reviewed: record.reviewed,
                forgotten_words: record
                    .forgotten
                    .iter()
                    .map(|&i| lesson.vocabulary[i].word.clone())
                    .collect(),
                started_at: record.started_at,
                ended_at: record.ended_at,
            })
            .collect(),
        troublesome_words: session.ever_forgotten().to_vec(),
    }
}

#[test]
fn test_sample_config_loads() {
    let config = Config::load_from_file(&fixture_path().join("recall.json"))
        .expect("Failed to load config");

    assert_eq!(config.lessons_dir, "lessons");
    assert_eq!(config.output_dir, "reports");
    assert_eq!(config.feedback_delay(), Duration::from_millis(250));
    assert_eq!(config.orientation, Orientation::Reverse);
    assert!(!config.sound.enabled);
    assert!(config.speech.auto_speak_on_flip);
    assert!((config.speech.word_rate - 0.8).abs() < f32::EPSILON);
    assert!((config.speech.example_rate - 0.95).abs() < f32::EPSILON);
    config.validate().expect("fixture config should be valid");
}

#[test]
fn test_full_session_from_fixture_to_report() {
    let lesson = fixture_lesson("week-3");
    let scheduler = ManualScheduler::new();
    let events = EventBroadcaster::default();
    let mut rx = events.subscribe();
    let mut presenter = CardPresenter::new(
        lesson.shared_vocabulary(),
        scheduler.clone(),
        NullAudio,
        PresenterOptions::default(),
    )
    .with_events(events);
    presenter.start().expect("session should start");

    // Round 1: quay known, moor forgot, swell forgot.
    assert_eq!(presenter.current().unwrap().word, "quay");
    judge_and_advance(&mut presenter, &scheduler, Judgment::Known);
    judge_and_advance(&mut presenter, &scheduler, Judgment::Forgot);
    judge_and_advance(&mut presenter, &scheduler, Judgment::Forgot);
    assert_eq!(presenter.state(), PresenterState::RoundSummary);

    // Round 2: moor known, swell forgot again.
    presenter.continue_session().unwrap();
    assert_eq!(presenter.current().unwrap().word, "moor");
    assert_eq!(presenter.progress().unwrap(), (1, 2));
    assert!(presenter.current_face().unwrap().previously_forgotten);
    judge_and_advance(&mut presenter, &scheduler, Judgment::Known);
    judge_and_advance(&mut presenter, &scheduler, Judgment::Forgot);

    // Round 3: swell known.
    presenter.continue_session().unwrap();
    assert_eq!(presenter.progress().unwrap(), (1, 1));
    judge_and_advance(&mut presenter, &scheduler, Judgment::Known);
    assert_eq!(
        presenter.continue_session().unwrap(),
        PresenterState::SessionComplete
    );

    let snapshot = presenter.close();
    assert!(snapshot.completed());

    let mut names = Vec::new();
    while let Ok(event) = rx.try_recv() {
        names.push(event.event_name());
    }
    assert_eq!(names.first(), Some(&"session_started"));
    assert_eq!(names.iter().filter(|n| **n == "card_judged").count(), 6);
    assert_eq!(names.iter().filter(|n| **n == "round_complete").count(), 3);
    assert_eq!(&names[names.len() - 2..], ["session_complete", "session_closed"]);

    let report = ReportGenerator::new(report_input(&lesson, &snapshot))
        .generate()
        .expect("report should build");
    assert_eq!(report.lesson_title, "Week 3: Harbour Life");
    assert_eq!(report.summary.status, ReportStatus::Completed);
    assert_eq!(report.summary.rounds, 3);
    assert_eq!(report.summary.words_forgotten, 2);
    assert_eq!(report.rounds[0].forgotten_words, vec!["moor", "swell"]);
    assert_eq!(report.rounds[1].known, 1);
    assert_eq!(report.troublesome_words, vec!["moor", "swell"]);

    let markdown = MarkdownGenerator::new(&report).generate();
    assert!(markdown.contains("# Recall Session Report: Week 3: Harbour Life"));
    assert!(markdown.contains("| 1 | 3 | 1 | 2 (moor, swell) |"));
    assert!(markdown.contains("- swell"));

    let json = JsonGenerator::new(&report).generate().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["summary"]["status"], "completed");
    assert_eq!(value["rounds"].as_array().map(Vec::len), Some(3));
}

#[test]
fn test_session_closed_early_reports_abandoned() {
    let lesson = fixture_lesson("week-3");
    let scheduler = ManualScheduler::new();
    let mut presenter = create_session(
        lesson.shared_vocabulary(),
        scheduler.clone(),
        NullAudio,
        PresenterOptions::default(),
    )
    .unwrap();

    judge_and_advance(&mut presenter, &scheduler, Judgment::Forgot);
    // Closing mid-feedback must not leave the timer behind.
    presenter.judge(Judgment::Known).unwrap();
    assert_eq!(scheduler.pending_count(), 1);
    let snapshot = presenter.close();
    assert_eq!(scheduler.pending_count(), 0);
    assert!(!snapshot.completed());

    let report = ReportGenerator::new(report_input(&lesson, &snapshot))
        .generate()
        .unwrap();
    assert_eq!(report.summary.status, ReportStatus::Abandoned);
    assert!(report.rounds.is_empty());
    assert_eq!(report.troublesome_words, vec!["quay"]);
}

#[test]
fn test_fixture_config_drives_presenter() {
    let config = Config::load_from_file(&fixture_path().join("recall.json")).unwrap();
    let lesson = fixture_lesson("week-3");
    let audio = RecordingAudio::new();
    let mut presenter = create_session(
        lesson.shared_vocabulary(),
        ManualScheduler::new(),
        audio.clone(),
        PresenterOptions::from_config(&config),
    )
    .unwrap();

    // Reverse orientation: the meaning comes first, the word is on the back.
    let front = presenter.current_face().unwrap();
    assert_eq!(front.side, CardSide::Front);
    assert!(matches!(front.content, FaceContent::Meaning { .. }));

    assert!(presenter.flip().unwrap());
    let back = presenter.current_face().unwrap();
    match back.content {
        FaceContent::Word { word, ipa, images } => {
            assert_eq!(word, "quay");
            assert_eq!(ipa.as_deref(), Some("/kiː/"));
            assert_eq!(images.len(), 3);
        }
        FaceContent::Meaning { .. } => panic!("expected the word on the back"),
    }

    let speech = audio.last_speech().expect("auto-speak on flip");
    assert_eq!(speech.utterances[0].text, "quay");
    assert_eq!(speech.utterances[1].text, "The fishing boats tied up at the quay.");
    assert!((speech.utterances[0].rate - 0.8).abs() < f32::EPSILON);

    // Sound is disabled in the fixture.
    presenter.judge(Judgment::Known).unwrap();
    assert!(audio.cues().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_tokio_timers_drive_the_session() {
    let lesson = fixture_lesson("week-4");
    let (scheduler, mut fired) = TokioScheduler::new();
    let options = PresenterOptions {
        feedback_delay: Duration::from_millis(400),
        ..PresenterOptions::default()
    };
    let mut presenter =
        create_session(lesson.shared_vocabulary(), scheduler, NullAudio, options).unwrap();

    let handle = presenter.judge(Judgment::Forgot).unwrap();
    assert_eq!(presenter.state(), PresenterState::AwaitingAdvance);
    assert_eq!(presenter.current().unwrap().word, "haggle");

    let delivered = fired.recv().await.expect("timer should fire");
    assert_eq!(delivered, handle);
    assert!(presenter.on_timer(delivered));
    assert_eq!(presenter.state(), PresenterState::RoundSummary);

    presenter.continue_session().unwrap();
    let handle = presenter.judge(Judgment::Known).unwrap();
    let delivered = fired.recv().await.unwrap();
    assert_eq!(delivered, handle);
    presenter.on_timer(delivered);
    assert_eq!(
        presenter.continue_session().unwrap(),
        PresenterState::SessionComplete
    );

    let snapshot = presenter.close();
    assert!(snapshot.completed());
    let session = snapshot.session.unwrap();
    assert_eq!(session.round(), 2);
    assert_eq!(session.ever_forgotten(), ["haggle"]);
}

#[tokio::test(start_paused = true)]
async fn test_stale_timer_from_shared_scheduler_is_ignored() {
    let lesson = fixture_lesson("week-3");
    let (scheduler, mut fired) = TokioScheduler::new();
    let foreign = scheduler.schedule(Duration::from_millis(10)).unwrap();

    let mut presenter = create_session(
        lesson.shared_vocabulary(),
        scheduler,
        NullAudio,
        PresenterOptions::default(),
    )
    .unwrap();
    let own = presenter.judge(Judgment::Known).unwrap();

    let first = fired.recv().await.unwrap();
    assert_eq!(first, foreign);
    assert!(!presenter.on_timer(first));
    assert_eq!(presenter.state(), PresenterState::AwaitingAdvance);

    let second = fired.recv().await.unwrap();
    assert_eq!(second, own);
    assert!(presenter.on_timer(second));
    assert_eq!(presenter.current().unwrap().word, "moor");
}

#[test]
fn test_events_serialize_for_subscribers() {
    let event = ReviewEvent::round_complete(2, 4, 1);
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["event"], "round_complete");
    assert_eq!(json["payload"]["toReview"], 1);
}
