//! Integration tests for the phase-cycle engine driven by a manual clock.

use cadence_core::{
    Clock, ClockStatus, Event, ExerciseDefinition, ManualClock, Phase, PhaseCycleEngine,
    SessionStatus,
};

fn inhale_hold_exhale(cycles: u32) -> ExerciseDefinition {
    ExerciseDefinition::new(
        "calm",
        vec![
            Phase::new("inhale", 4),
            Phase::new("hold", 0),
            Phase::new("exhale", 8),
        ],
        cycles,
    )
}

/// Fire the clock `ticks` times, collecting (tick number, event) pairs.
fn run(engine: &mut PhaseCycleEngine<ManualClock>, ticks: u64) -> Vec<(u64, Event)> {
    let mut events = Vec::new();
    for n in 1..=ticks {
        // the engine must ignore ticks once its clock is stopped
        engine.clock_mut().fire();
        if let Some(event) = engine.tick() {
            events.push((n, event));
        }
    }
    events
}

#[test]
fn test_phase_ordering_skips_zero_duration_hold() {
    let mut engine = PhaseCycleEngine::new(ManualClock::new());
    let started = engine.start(inhale_hold_exhale(2)).unwrap();
    let mut visited = match started {
        Event::SessionStarted { phase_name, .. } => vec![(0, phase_name, 0)],
        other => panic!("expected SessionStarted, got {other:?}"),
    };

    let events = run(&mut engine, 24);
    let mut completions = Vec::new();
    for (n, event) in &events {
        match event {
            Event::PhaseChanged {
                phase_name, cycle, ..
            } => visited.push((*n, phase_name.clone(), *cycle)),
            Event::Completed { .. } => completions.push(*n),
            other => panic!("unexpected event {other:?}"),
        }
    }

    assert_eq!(
        visited,
        vec![
            (0, "inhale".to_string(), 0),
            (4, "exhale".to_string(), 0),
            (12, "inhale".to_string(), 1),
            (16, "exhale".to_string(), 1),
        ]
    );
    assert!(visited.iter().all(|(_, name, _)| name != "hold"));
    assert_eq!(completions, vec![24]);

    let before = engine.session().cloned();
    assert!(engine.tick().is_none());
    assert_eq!(engine.session().cloned(), before);
    assert_eq!(engine.status(), Some(SessionStatus::Completed));
    assert_eq!(engine.clock().status(), ClockStatus::Stopped);
}

#[test]
fn test_clock_stops_delivering_after_completion() {
    let mut engine = PhaseCycleEngine::new(ManualClock::new());
    engine.start(inhale_hold_exhale(1)).unwrap();

    let mut delivered = 0;
    while engine.clock_mut().fire().is_some() {
        delivered += 1;
        engine.tick();
        assert!(delivered <= 12, "clock kept running after completion");
    }
    assert_eq!(delivered, 12);
    assert!(engine.is_completed());
}

#[test]
fn test_double_pause_equals_single_pause() {
    let mut engine = PhaseCycleEngine::new(ManualClock::new());
    engine.start(inhale_hold_exhale(2)).unwrap();
    run(&mut engine, 6);

    let first = engine.pause();
    let remaining_at_first = engine.session().unwrap().seconds_remaining_in_phase();
    let second = engine.pause();
    let remaining_at_second = engine.session().unwrap().seconds_remaining_in_phase();

    assert!(matches!(first, Some(Event::PausedChanged { paused: true, .. })));
    assert!(second.is_none());
    assert_eq!(remaining_at_first, remaining_at_second);
    assert_eq!(remaining_at_first, 6);

    // ticks that still arrive while paused change nothing
    for _ in 0..5 {
        assert!(engine.tick().is_none());
    }
    assert_eq!(engine.session().unwrap().seconds_remaining_in_phase(), 6);
    assert!(engine.clock_mut().fire().is_none());
}

#[test]
fn test_reset_restores_initial_state() {
    let definition = ExerciseDefinition::new(
        "late-start",
        vec![
            Phase::new("settle", 0),
            Phase::new("inhale", 3),
            Phase::new("exhale", 5),
        ],
        3,
    );

    for ticks in [0, 1, 3, 7, 8, 13, 23, 24, 30] {
        let mut engine = PhaseCycleEngine::new(ManualClock::new());
        engine.start(definition.clone()).unwrap();
        run(&mut engine, ticks);

        assert!(matches!(engine.reset(), Some(Event::Reset { .. })));
        let session = engine.session().unwrap();
        assert_eq!(session.current_phase_index(), 1, "after {ticks} ticks");
        assert_eq!(session.current_cycle(), 0);
        assert_eq!(session.seconds_remaining_in_phase(), 3);
        assert_eq!(session.definition(), &definition);
        assert!(!session.running());
    }
}

#[test]
fn test_sleep_timer_countdown() {
    let mut engine = PhaseCycleEngine::new(ManualClock::new());
    engine
        .start(ExerciseDefinition::countdown("sleep", 90))
        .unwrap();
    let events = run(&mut engine, 120);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], (90, Event::Completed { .. })));
}

#[test]
fn test_independent_sessions_do_not_share_state() {
    let mut breathing = PhaseCycleEngine::new(ManualClock::new());
    let mut sleep = PhaseCycleEngine::new(ManualClock::new());
    breathing.start(inhale_hold_exhale(1)).unwrap();
    sleep.start(ExerciseDefinition::countdown("sleep", 60)).unwrap();

    breathing.pause();
    run(&mut sleep, 10);
    assert_eq!(sleep.session().unwrap().seconds_remaining_in_phase(), 50);
    assert_eq!(breathing.session().unwrap().seconds_remaining_in_phase(), 4);

    sleep.close();
    assert!(breathing.session().is_some());
    assert_eq!(breathing.clock().status(), ClockStatus::Paused);
}

mod with_ticker {
    use std::time::Duration;

    use cadence_core::{Event, ExerciseDefinition, Phase, PhaseCycleEngine, SessionStatus, Ticker};
    use tokio::time::{self, Instant};

    #[tokio::test(start_paused = true)]
    async fn pause_and_resume_through_a_real_ticker() {
        let mut engine = PhaseCycleEngine::new(Ticker::new());
        let started = Instant::now();
        engine
            .start(ExerciseDefinition::new(
                "short",
                vec![Phase::new("in", 2), Phase::new("out", 3)],
                1,
            ))
            .unwrap();

        engine.clock_mut().next_tick().await.unwrap();
        assert!(engine.tick().is_none());
        assert_eq!(engine.session().unwrap().seconds_remaining_in_phase(), 1);

        assert!(engine.pause().is_some());
        let silent = time::timeout(Duration::from_secs(10), engine.clock_mut().next_tick()).await;
        assert!(silent.is_err(), "a paused session must not receive ticks");
        assert_eq!(engine.status(), Some(SessionStatus::Paused));
        assert_eq!(engine.session().unwrap().seconds_remaining_in_phase(), 1);

        assert!(engine.resume().is_some());
        let mut events = Vec::new();
        while let Some(_tick) = engine.clock_mut().next_tick().await {
            if let Some(event) = engine.tick() {
                events.push(event);
            }
        }

        assert!(matches!(
            events.as_slice(),
            [Event::PhaseChanged { phase_index: 1, .. }, Event::Completed { .. }]
        ));
        assert!(engine.is_completed());
        // five ticks of one second plus ten seconds paused
        assert_eq!(started.elapsed(), Duration::from_secs(15));
    }
}
