// Integration tests (native) for the `lane-rush` crate.
// These drive the session controller with a manual clock; no browser APIs.

use lane_rush::game::clock::{ManualClock, PlaybackClock};
use lane_rush::game::notes::{NoteId, NoteState};
use lane_rush::{GameConfig, GameError, GameEvent, Session, Status};

fn session_with_track(duration: f64, seed: u64) -> Session {
    let mut s = Session::with_seed(GameConfig::default(), seed).unwrap();
    s.load_track(duration).unwrap();
    s
}

fn key_for_lane(s: &Session, lane: usize) -> String {
    s.keymap().key_for(lane).unwrap().to_string()
}

#[test]
fn two_second_track_end_to_end() {
    let clock = ManualClock::new(100.0);
    let mut s = session_with_track(2.0, 3);
    let ticket = s.start(clock.now()).unwrap();

    let times: Vec<f64> = s.field().notes().iter().map(|n| n.time).collect();
    assert_eq!(times, vec![0.0, 0.5, 1.0, 1.5]);

    // First note sits on the hit line at t = 0.
    let first = s.field().notes()[0].clone();
    let key = key_for_lane(&s, first.lane);
    let events = s.key_down(&key, clock.now());
    assert_eq!(events[1], GameEvent::Hit { lane: first.lane, note: first.id });
    assert_eq!(s.scoreboard().score, 100);
    assert_eq!(s.scoreboard().combo, 1);
    s.key_up(&key);

    // Let the 0.5s note fall past the field end untouched.
    clock.set(100.75);
    let frame = s.tick(ticket, clock.now()).unwrap();
    let second = s.field().notes()[1].clone();
    assert_eq!(frame.report.missed, vec![second.id]);
    assert!(frame.events.contains(&GameEvent::NoteMissed { lane: second.lane, note: second.id }));
    assert_eq!(s.field().get(second.id).unwrap().state(), NoteState::Missed);
    assert_eq!(s.scoreboard().combo, 0);
    assert_eq!(s.scoreboard().score, 100);
}

#[test]
fn press_in_window_always_hits() {
    for seed in 0..20 {
        let clock = ManualClock::new(0.0);
        let mut s = session_with_track(4.0, seed);
        s.start(clock.now()).unwrap();
        let notes: Vec<_> = s.field().notes().to_vec();
        for (i, note) in notes.iter().enumerate() {
            // Alternate early and late presses inside the +-0.1s band.
            let offset = if i % 2 == 0 { -0.05 } else { 0.08 };
            clock.set(note.time + offset);
            let key = key_for_lane(&s, note.lane);
            let events = s.key_down(&key, clock.now());
            assert_eq!(events[1], GameEvent::Hit { lane: note.lane, note: note.id }, "seed {seed}");
            assert_eq!(s.scoreboard().combo as usize, i + 1);
        }
        assert_eq!(s.scoreboard().score, 100 * notes.len() as u64);
    }
}

#[test]
fn stray_press_resets_any_combo() {
    let clock = ManualClock::new(0.0);
    let mut s = session_with_track(3.0, 11);
    s.start(clock.now()).unwrap();
    let notes: Vec<_> = s.field().notes().to_vec();
    for note in &notes[..4] {
        clock.set(note.time);
        let key = key_for_lane(&s, note.lane);
        s.key_down(&key, clock.now());
    }
    assert_eq!(s.scoreboard().combo, 4);

    // Halfway between beats nothing is in any band.
    clock.set(notes[4].time - 0.25);
    let key = key_for_lane(&s, notes[4].lane);
    let events = s.key_down(&key, clock.now());
    assert_eq!(events[1], GameEvent::PressMiss { lane: notes[4].lane });
    assert_eq!(s.scoreboard().combo, 0);
    assert_eq!(s.scoreboard().max_combo, 4);
}

#[test]
fn unmapped_keys_change_nothing() {
    let clock = ManualClock::new(0.0);
    let mut s = session_with_track(2.0, 5);
    s.start(clock.now()).unwrap();
    assert!(s.key_down("Q", clock.now()).is_empty());
    assert!(s.key_up("Q").is_none());
    assert_eq!(s.scoreboard().misses, 0);
    assert_eq!(s.field().pending_count(), 4);
}

#[test]
fn pause_and_resume_preserve_elapsed_time() {
    let clock = ManualClock::new(50.0);
    let mut s = session_with_track(10.0, 1);
    let ticket = s.start(clock.now()).unwrap();
    clock.advance(1.25);
    s.tick(ticket, clock.now()).unwrap();
    let before = s.elapsed(clock.now());

    s.toggle_pause(clock.now()).unwrap();
    clock.advance(30.0);
    assert!(s.tick(ticket, clock.now()).is_none());
    let pending_while_paused = s.field().pending_count();

    s.toggle_pause(clock.now()).unwrap();
    assert!((s.elapsed(clock.now()) - before).abs() < 1.0 / 60.0);
    assert_eq!(s.field().pending_count(), pending_while_paused);
    assert!(s.tick(ticket, clock.now()).is_some());
}

#[test]
fn stop_then_start_gives_a_fresh_round_without_ghosts() {
    let clock = ManualClock::new(0.0);
    let mut s = session_with_track(2.0, 9);
    let old = s.start(clock.now()).unwrap();
    let first = s.field().notes()[0].clone();
    let key = key_for_lane(&s, first.lane);
    s.key_down(&key, clock.now());
    assert_eq!(s.scoreboard().score, 100);

    assert!(s.stop());
    assert_eq!(s.status(), Status::Stopped);
    // A frame queued before stop must not touch anything.
    assert!(s.tick(old, clock.now()).is_none());

    clock.advance(5.0);
    let fresh = s.start(clock.now()).unwrap();
    assert_ne!(old, fresh);
    assert_eq!(s.scoreboard().score, 0);
    assert_eq!(s.scoreboard().combo, 0);
    assert_eq!(s.field().notes().len(), 4);
    assert!(s.field().notes().iter().all(|n| n.state() == NoteState::Pending));

    // The old loop keeps firing after the restart: still ignored.
    clock.advance(1.0);
    assert!(s.tick(old, clock.now()).is_none());
    assert!(!s.is_current(old));
    assert_eq!(s.field().pending_count(), 4);
    let frame = s.tick(fresh, clock.now()).unwrap();
    assert_eq!(frame.report.missed.len(), 2);
}

#[test]
fn missing_track_warns_without_state_change() {
    let mut s = Session::with_seed(GameConfig::default(), 0).unwrap();
    assert_eq!(s.start(0.0), Err(GameError::NoTrackLoaded));
    assert_eq!(s.status(), Status::Idle);
    assert!(s.field().notes().is_empty());
}

#[test]
fn zero_length_track_runs_with_no_notes_and_completes() {
    let mut s = session_with_track(0.0, 2);
    let ticket = s.start(0.0).unwrap();
    assert!(s.field().notes().is_empty());
    let frame = s.tick(ticket, 0.016).unwrap();
    assert_eq!(frame.events, vec![GameEvent::RoundComplete]);
    assert_eq!(s.status(), Status::Stopped);
}

#[test]
fn notes_queued_in_one_lane_resolve_in_time_order() {
    let cfg = GameConfig::default().with_keys(&["J"]).unwrap();
    let mut s = Session::with_seed(cfg, 4).unwrap();
    s.load_track(2.0).unwrap();
    s.start(0.0).unwrap();
    // One lane: every note queues behind the previous one.
    let events = s.key_down("j", 0.0);
    assert!(matches!(events[1], GameEvent::Hit { note, .. } if note.0 == 0));
    let events = s.key_down("j", 0.0);
    assert_eq!(events[1], GameEvent::PressMiss { lane: 0 });
    let events = s.key_down("j", 0.5);
    assert!(matches!(events[1], GameEvent::Hit { note, .. } if note.0 == 1));

    // No frame ran since 0.5s. The 1.0s note has already left the field, so
    // it counts as missed and the press lands on the 1.5s note.
    let events = s.key_down("j", 1.45);
    assert_eq!(events[1], GameEvent::NoteMissed { lane: 0, note: NoteId(2) });
    assert_eq!(events[2], GameEvent::Hit { lane: 0, note: NoteId(3) });
    assert_eq!(s.scoreboard().misses, 2);
    assert_eq!(s.scoreboard().combo, 1);
    assert!(s.field().front(0).is_none());
}

#[test]
fn full_round_reports_completion_once() {
    let clock = ManualClock::new(0.0);
    let mut s = session_with_track(1.0, 8);
    let ticket = s.start(clock.now()).unwrap();
    let mut completions = 0;
    for _ in 0..120 {
        clock.advance(1.0 / 60.0);
        if let Some(frame) = s.tick(ticket, clock.now()) {
            completions += frame
                .events
                .iter()
                .filter(|e| **e == GameEvent::RoundComplete)
                .count();
        }
    }
    assert_eq!(completions, 1);
    assert_eq!(s.scoreboard().misses, 2);
    assert_eq!(s.status(), Status::Stopped);
}
