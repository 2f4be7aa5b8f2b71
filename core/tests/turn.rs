//! Turn pipeline tests, driven through the LifeEngine.

use lifesim_core::{
    catalog::{ContentLoader, EventCatalog},
    command::PlayerAction,
    config::{SimConfig, TerminationConfig, TurnConfig},
    content::ContentPack,
    engine::{CharacterSpec, LifeEngine},
    error::SimError,
    event::SimEvent,
    notify::RecordingNotifier,
    stats::Stat,
    store::SimStore,
    turn::Blocked,
};

const FORK: &str = r#"{ "dynamic": [
    { "id": "fork_in_the_road", "title": "A fork in the road", "description": "Left or right?", "category": "decision",
      "choices": [
        { "id": "left", "text": "Go left", "effects": { "happiness": 1 },
          "delayed": { "years": 2, "description": "The left road paid off.", "effects": { "smarts": 3 } } },
        { "id": "right", "text": "Go right" }
      ] }
] }"#;

/// Events always fire and nobody dies of old age early.
fn eager_config() -> SimConfig {
    SimConfig {
        turn: TurnConfig {
            base_event_probability: 1.0,
            max_event_probability: 1.0,
            minor_age_factor: 1.0,
            ..TurnConfig::default()
        },
        ..SimConfig::default()
    }
}

fn engine_with(events: &str, config: SimConfig, seed: u64) -> LifeEngine {
    let catalog = EventCatalog::from_json("turn-test", events, ContentLoader::new(true)).expect("test events");
    let content = ContentPack { catalog, ..ContentPack::builtin(true).expect("builtin content") };
    let store = SimStore::in_memory().expect("in-memory store");
    let spec = CharacterSpec { name: Some("Robin Hale".into()), birth_year: 1990, ..CharacterSpec::default() };
    LifeEngine::new(format!("turn-test-{seed}"), seed, store, content, config, spec).expect("engine")
}

#[test]
fn pending_choice_blocks_aging() {
    let mut engine = engine_with(FORK, eager_config(), 1);

    let first = engine.age_up().expect("age up");
    assert_eq!(first.age, 1);
    assert_eq!(first.presented.as_deref(), Some("fork_in_the_road"));
    assert_eq!(engine.state().pending.as_deref(), Some("fork_in_the_road"));

    let blocked = engine.age_up().expect("age up");
    assert_eq!(blocked.blocked, Some(Blocked::AwaitingChoice));
    assert_eq!(engine.character().age(), 1);

    let report = engine.choose("left").expect("choose");
    assert!(report.outcome.is_ok());
    assert!(engine.state().pending.is_none());

    let next = engine.age_up().expect("age up");
    assert_eq!(next.age, 2);
    assert!(next.blocked.is_none());
    // One-shot: it never comes back.
    assert!(next.presented.is_none());
}

#[test]
fn choosing_without_a_pending_event_fails() {
    let mut engine = engine_with(r#"{}"#, SimConfig::default(), 2);
    assert!(matches!(engine.choose("left"), Err(SimError::NoPendingEvent)));
}

#[test]
fn unknown_choice_leaves_the_event_pending() {
    let mut engine = engine_with(FORK, eager_config(), 3);
    engine.age_up().expect("age up");
    let before = engine.character().clone();

    let report = engine.choose("straight_ahead").expect("choose");
    assert!(report.outcome.is_err());
    assert_eq!(engine.state().pending.as_deref(), Some("fork_in_the_road"));
    assert_eq!(engine.character(), &before);
}

#[test]
fn delayed_effect_is_consumed_on_its_target_year() {
    let mut engine = engine_with(FORK, eager_config(), 4);
    engine.age_up().expect("age up");
    engine.choose("left").expect("choose");
    assert_eq!(engine.character().delayed_events.len(), 1);

    let at_two = engine.age_up().expect("age 2");
    assert!(!at_two.events.iter().any(|(_, e)| matches!(e, SimEvent::DelayedEffectApplied { .. })));

    let at_three = engine.age_up().expect("age 3");
    assert_eq!(at_three.age, 3);
    assert!(at_three
        .events
        .iter()
        .any(|(_, e)| matches!(e, SimEvent::DelayedEffectApplied { age: 3, .. })));
    assert!(engine.character().delayed_events.is_empty());
    assert!(at_three.narrative.iter().any(|l| l.contains("The left road paid off.")));
}

#[test]
fn age_moves_one_year_per_turn_and_stats_stay_bounded() {
    let mut engine = engine_with(include_str!("../data/events.json"), SimConfig::default(), 0xB0B);

    let mut last = engine.character().age();
    for _ in 0..120 {
        if let Some(event) = engine.pending_event() {
            let choice_id = event.choices[0].id.clone();
            engine.choose(&choice_id).expect("choose");
        }
        let report = engine.age_up().expect("age up");
        if report.blocked == Some(Blocked::GameOver) {
            assert_eq!(engine.character().age(), last);
            break;
        }
        assert_eq!(report.age, last + 1);
        last = report.age;

        let stats = engine.character().stats();
        assert!(stats.within_bounds(), "stats out of range at age {last}: {stats:?}");
        assert!(stats.wealth() >= 0);
        if report.game_over() {
            assert!(engine.state().pending.is_none());
        }
    }
}

fn short_life() -> SimConfig {
    SimConfig {
        termination: TerminationConfig { max_age: 3, ..TerminationConfig::default() },
        ..SimConfig::default()
    }
}

#[test]
fn dead_characters_are_read_only() {
    let recorder = RecordingNotifier::new();
    let mut engine = engine_with(r#"{}"#, short_life(), 5).with_notifier(Box::new(recorder.clone()));

    for _ in 0..3 {
        engine.age_up().expect("age up");
    }
    assert!(engine.character().is_game_over());
    assert_eq!(engine.character().age(), 3);
    let frozen = engine.character().clone();

    let report = engine.age_up().expect("age up");
    assert_eq!(report.blocked, Some(Blocked::GameOver));
    assert!(matches!(engine.choose("anything"), Err(SimError::GameOver { .. })));
    assert!(matches!(
        engine.perform(PlayerAction::ApplyJob { career_id: "retail".into() }),
        Err(SimError::GameOver { .. })
    ));
    assert_eq!(engine.character(), &frozen);
    assert_eq!(engine.character().stat(Stat::Health), frozen.stat(Stat::Health));

    let notes = recorder.notifications();
    assert!(notes.iter().any(|n| n.title == "Game over"));
}

#[test]
fn every_turn_is_logged_with_its_age() {
    let mut engine = engine_with(r#"{}"#, SimConfig::default(), 6);
    for _ in 0..4 {
        engine.age_up().expect("age up");
    }
    let run_id = engine.run_id.clone();
    for age in 1..=4 {
        let entries = engine.store().events_for_age(&run_id, age).expect("events");
        assert!(entries.iter().any(|e| e.event_type == "turn_started"), "no TurnStarted at age {age}");
        assert!(entries.iter().any(|e| e.event_type == "turn_completed"), "no TurnCompleted at age {age}");
    }
}

#[test]
fn rejected_actions_change_nothing() {
    let mut engine = engine_with(r#"{}"#, SimConfig::default(), 7);
    let before = engine.character().clone();
    let result = engine
        .perform(PlayerAction::ApplyJob { career_id: "retail".into() })
        .expect("perform");
    assert!(!result.is_applied());
    assert_eq!(engine.character(), &before);
}

const HOMEWORK: &str = r#"{ "dynamic": [
    { "id": "homework", "title": "Homework", "description": "Finish it or skip it?", "category": "education",
      "conditions": { "min_age": 15 },
      "choices": [ { "id": "finish", "text": "Finish it", "effects": { "smarts": 2 } } ] }
] }"#;

#[test]
fn arrest_withdraws_an_event_drawn_outside() {
    let mut engine = engine_with(HOMEWORK, eager_config(), 8);
    while engine.state().pending.is_none() {
        let report = engine.age_up().expect("age up");
        assert!(report.blocked.is_none() && !report.game_over());
        assert!(report.age <= 15, "homework should be offered at 15");
    }
    assert_eq!(engine.state().pending.as_deref(), Some("homework"));

    for _ in 0..500 {
        if engine.character().is_in_prison() {
            break;
        }
        engine
            .perform(PlayerAction::CommitCrime { operation_id: "break_in".into() })
            .expect("perform");
    }
    assert!(engine.character().is_in_prison());
    assert!(engine.state().pending.is_none());
    assert!(matches!(engine.choose("finish"), Err(SimError::NoPendingEvent)));

    let next = engine.age_up().expect("age up");
    assert_ne!(next.blocked, Some(Blocked::AwaitingChoice));
}
