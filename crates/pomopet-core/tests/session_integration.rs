//! End-to-end session tests: a full cycle through the controller, persisted
//! to an on-disk database and read back.

use std::sync::Arc;

use chrono::NaiveDate;
use pomopet_core::audio::{AudioEngine, MemoryDevice, NoiseSynthesizer};
use pomopet_core::timer::SegmentKind;
use pomopet_core::{
    Database, Event, FocusSession, NoHaptics, Segment, SessionObserver, SessionRequest,
    SessionStatus, Settings, Task,
};
use tempfile::TempDir;

#[derive(Default)]
struct Log {
    segments: Vec<(usize, SegmentKind)>,
    completed: Option<(u64, bool)>,
    cancelled: Option<u64>,
}

impl SessionObserver for Log {
    fn on_segment_change(&mut self, segment: &Segment, index: usize) {
        self.segments.push((index, segment.kind));
    }

    fn on_complete(&mut self, focused_minutes: u64, task_should_be_marked_done: bool) {
        self.completed = Some((focused_minutes, task_should_be_marked_done));
    }

    fn on_cancel(&mut self, partial_focused_minutes: u64) {
        self.cancelled = Some(partial_focused_minutes);
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 4, d).unwrap()
}

fn run(events: Vec<Event>, log: &mut Log) {
    for event in &events {
        event.dispatch(log);
    }
}

fn audio() -> Arc<AudioEngine<MemoryDevice>> {
    Arc::new(AudioEngine::with_synthesizer(
        MemoryDevice::new(8000),
        NoiseSynthesizer::with_seed(8000, 3),
    ))
}

#[tokio::test]
async fn full_cycle_with_skipped_break_persists() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("pomopet.db");

    let mut settings = Settings::default();
    settings.timer.pomodoros_per_round = 2;
    settings.sound.selected_sound_id = "rain".into();

    let mut session = FocusSession::new(
        settings,
        audio(),
        NoHaptics,
        Database::open_at(&db_path).unwrap(),
    )
    .with_today(|| day(7));

    let task = Task {
        id: "essay".into(),
        ..Task::default()
    };
    let mut log = Log::default();

    run(session.start(SessionRequest::Pomodoro, Some(task)).await.unwrap(), &mut log);
    run(session.tick(25 * 60).unwrap(), &mut log);
    assert_eq!(session.engine().current_segment().unwrap().kind, SegmentKind::ShortBreak);

    session.pause().unwrap();
    run(session.skip_break().await.unwrap(), &mut log);
    assert_eq!(session.engine().status(), SessionStatus::Running);
    assert!(session.audio().is_audible());

    run(session.tick(25 * 60 + 15 * 60).unwrap(), &mut log);
    assert_eq!(session.engine().status(), SessionStatus::Completed);

    assert_eq!(
        log.segments,
        vec![
            (0, SegmentKind::Work),
            (1, SegmentKind::ShortBreak),
            (2, SegmentKind::Work),
            (3, SegmentKind::LongBreak),
        ]
    );
    assert_eq!(log.completed, Some((50, true)));
    assert_eq!(log.cancelled, None);
    drop(session);

    let db = Database::open_at(&db_path).unwrap();
    let records = db.recent_records(10).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].record.duration_minutes, 50);
    assert_eq!(records[0].record.date, day(7));
    assert!(db.is_task_done("essay").unwrap());
    let pet = db.load_pet().unwrap();
    assert_eq!(pet.current_exp, 5);
    assert_eq!(pet.happiness, 60);
    assert_eq!(pet.last_daily_activity_date, Some(day(7)));
}

#[tokio::test]
async fn cancelled_task_is_not_marked_done() {
    let mut session = FocusSession::new(
        Settings::default(),
        audio(),
        NoHaptics,
        Database::open_memory().unwrap(),
    )
    .with_today(|| day(8));

    let task = Task {
        id: "inbox".into(),
        duration_minutes: Some(30),
        pomodoro_count: None,
    };
    session
        .start(SessionRequest::Custom { minutes: 10 }, Some(task))
        .await
        .unwrap();
    assert_eq!(session.engine().remaining_secs(), 30 * 60);

    session.tick(12 * 60 + 30).unwrap();
    let mut log = Log::default();
    for event in session.cancel().unwrap() {
        event.dispatch(&mut log);
    }
    assert_eq!(log.cancelled, Some(12));

    let outcome = session.outcome().unwrap();
    assert!(!outcome.task_marked_done);
    assert!(!session.persistence().is_task_done("inbox").unwrap());
    assert_eq!(session.persistence().stats_for_day(day(8)).unwrap().focus_minutes, 12);
}

#[tokio::test]
async fn streak_grows_across_days() {
    let db_dir = TempDir::new().unwrap();
    let db_path = db_dir.path().join("streak.db");

    for d in [1, 2, 3, 5] {
        let mut session = FocusSession::new(
            Settings::default(),
            audio(),
            NoHaptics,
            Database::open_at(&db_path).unwrap(),
        )
        .with_today(move || day(d));
        session
            .start(SessionRequest::Custom { minutes: 5 }, None)
            .await
            .unwrap();
        session.tick(300).unwrap();
    }

    let streak = Database::open_at(&db_path).unwrap().load_streak().unwrap();
    assert_eq!(streak.current, 1);
    assert_eq!(streak.longest, 3);
    assert_eq!(streak.last_date, Some(day(5)));
}
