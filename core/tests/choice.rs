//! ChoiceResolver tests: effects, delayed consequences, relationship and
//! subsystem transitions, and the no-op failure modes.

use lifesim_core::{
    catalog::{ContentLoader, EventCatalog},
    character::{Character, DeathCause, DelayedKind, GameOver, Gender, Relation, RelationshipStatus},
    choice::{ChoiceError, ChoiceResolver},
    config::SimConfig,
    content::ContentPack,
    event::SimEvent,
    rng::ScriptedRng,
    stats::{Skill, Stat, Stats},
    subsystem::Subsystems,
    tracker::EventTracker,
};

const EVENTS: &str = r#"{ "dynamic": [
    { "id": "windfall", "title": "Windfall", "description": "A letter from a lawyer.", "category": "finance",
      "choices": [
        { "id": "take", "text": "Take the money", "effects": { "wealth": 80, "happiness": 5 },
          "consequences": [ { "text": "Your phone would not stop ringing.", "probability": 1.0 },
                            { "text": "A cousin sued you.", "probability": 0.2 } ] },
        { "id": "some", "text": "Take a little", "effects": { "wealth": 50 } },
        { "id": "decline", "text": "Decline", "effects": { "happiness": -5 },
          "delayed": { "years": 3, "description": "You still wonder about it.", "effects": { "happiness": -2 } } }
      ] },
    { "id": "proposal", "title": "Proposal", "description": "", "category": "relationship",
      "choices": [ { "id": "yes", "text": "Say yes", "relationship": "married", "flags": ["married"] } ] },
    { "id": "job_fair", "title": "Job fair", "description": "", "category": "career",
      "choices": [ { "id": "retail", "text": "Apply at the mall", "action": { "type": "apply_job", "career_id": "retail" },
                     "skills": { "leadership": 2 } } ] }
] }"#;

struct Fixture {
    config: SimConfig,
    subsystems: Subsystems,
    catalog: EventCatalog,
}

fn fixture() -> Fixture {
    let config = SimConfig::default();
    let content = ContentPack::builtin(true).expect("builtin content");
    let subsystems = Subsystems::new(&config, &content);
    let catalog = EventCatalog::from_json("choices", EVENTS, ContentLoader::new(true)).expect("test events");
    Fixture { config, subsystems, catalog }
}

fn adult(age: u32) -> Character {
    Character::new("c".into(), "Sam Rivera".into(), 1980, Gender::Female, Stats::new(80, 50, 50, 50, 50, 10))
        .starting_at(age)
}

#[test]
fn large_windfall_schedules_exactly_one_attention_event() {
    let f = fixture();
    let resolver = ChoiceResolver::new(&f.config.choice, &f.subsystems);
    let event = f.catalog.get("windfall").expect("windfall");
    let mut c = adult(30);
    let mut tracker = EventTracker::new();

    let outcome = resolver
        .apply_choice(&mut c, &mut tracker, event, "take", &mut ScriptedRng::constant(0.5))
        .expect("choice applies");

    assert_eq!(c.stat(Stat::Wealth), 90);
    assert_eq!(c.stat(Stat::Happiness), 55);
    assert_eq!(outcome.magnitude, 85);

    let attention: Vec<_> = c
        .delayed_events
        .iter()
        .filter(|d| d.kind == DelayedKind::WealthGainAttention)
        .collect();
    assert_eq!(attention.len(), 1);
    assert_eq!(attention[0].target_age, 31);
    assert_eq!(attention[0].skills.get(&Skill::Notoriety), Some(&10));
}

#[test]
fn threshold_is_strict() {
    let f = fixture();
    let resolver = ChoiceResolver::new(&f.config.choice, &f.subsystems);
    let event = f.catalog.get("windfall").expect("windfall");
    let mut c = adult(30);

    resolver
        .apply_choice(&mut c, &mut EventTracker::new(), event, "some", &mut ScriptedRng::constant(0.5))
        .expect("choice applies");
    assert!(c.delayed_events.is_empty());
}

#[test]
fn consequences_roll_per_line() {
    let f = fixture();
    let resolver = ChoiceResolver::new(&f.config.choice, &f.subsystems);
    let event = f.catalog.get("windfall").expect("windfall");
    let mut c = adult(30);

    let outcome = resolver
        .apply_choice(&mut c, &mut EventTracker::new(), event, "take", &mut ScriptedRng::constant(0.5))
        .expect("choice applies");
    let narrative = outcome.log.narrative.join("\n");
    assert!(narrative.contains("phone would not stop ringing"));
    assert!(!narrative.contains("cousin sued"));
}

#[test]
fn authored_follow_up_lands_years_later() {
    let f = fixture();
    let resolver = ChoiceResolver::new(&f.config.choice, &f.subsystems);
    let event = f.catalog.get("windfall").expect("windfall");
    let mut c = adult(40);

    resolver
        .apply_choice(&mut c, &mut EventTracker::new(), event, "decline", &mut ScriptedRng::constant(0.5))
        .expect("choice applies");
    assert_eq!(c.delayed_events.len(), 1);
    assert_eq!(c.delayed_events[0].kind, DelayedKind::FollowUp);
    assert_eq!(c.delayed_events[0].target_age, 43);
}

#[test]
fn resolution_updates_the_tracker() {
    let f = fixture();
    let resolver = ChoiceResolver::new(&f.config.choice, &f.subsystems);
    let event = f.catalog.get("windfall").expect("windfall");
    let mut c = adult(30);
    let mut tracker = EventTracker::new();

    let outcome = resolver
        .apply_choice(&mut c, &mut tracker, event, "take", &mut ScriptedRng::constant(0.5))
        .expect("choice applies");

    assert!(tracker.is_triggered("windfall"));
    assert_eq!(tracker.last_event_age, Some(30));
    assert_eq!(tracker.choice_history.len(), 1);
    assert_eq!(tracker.choice_history[0].choice_id, "take");
    assert!(outcome
        .log
        .has_event(|e| matches!(e, SimEvent::ChoiceResolved { choice_id, .. } if choice_id == "take")));
}

#[test]
fn unknown_choice_changes_nothing() {
    let f = fixture();
    let resolver = ChoiceResolver::new(&f.config.choice, &f.subsystems);
    let event = f.catalog.get("windfall").expect("windfall");
    let mut c = adult(30);
    let mut tracker = EventTracker::new();
    let before = (c.clone(), tracker.clone());

    let err = resolver
        .apply_choice(&mut c, &mut tracker, event, "steal_it", &mut ScriptedRng::constant(0.5))
        .expect_err("unknown choice");
    assert!(matches!(err, ChoiceError::UnknownChoice { ref choice_id, .. } if choice_id == "steal_it"));
    assert_eq!((c, tracker), before);
}

#[test]
fn ended_life_rejects_choices() {
    let f = fixture();
    let resolver = ChoiceResolver::new(&f.config.choice, &f.subsystems);
    let event = f.catalog.get("windfall").expect("windfall");
    let mut c = adult(80);
    c.game_over = Some(GameOver { age: 80, cause: DeathCause::OldAge });
    let before = c.clone();

    let err = resolver
        .apply_choice(&mut c, &mut EventTracker::new(), event, "take", &mut ScriptedRng::constant(0.5))
        .expect_err("game over");
    assert_eq!(err, ChoiceError::GameOver);
    assert_eq!(c, before);
}

#[test]
fn marriage_adds_a_spouse_and_a_major_decision() {
    let f = fixture();
    let resolver = ChoiceResolver::new(&f.config.choice, &f.subsystems);
    let event = f.catalog.get("proposal").expect("proposal");
    let mut c = adult(28);

    resolver
        .apply_choice(&mut c, &mut EventTracker::new(), event, "yes", &mut ScriptedRng::constant(0.0))
        .expect("choice applies");

    assert_eq!(c.relationship_status, RelationshipStatus::Married);
    assert!(c.flags.contains("married"));
    let spouses: Vec<_> = c.family.iter().filter(|m| m.relation == Relation::Spouse).collect();
    assert_eq!(spouses.len(), 1);
    assert!(spouses[0].name.ends_with("Rivera"));
    assert_eq!(c.major_decisions.len(), 1);
    assert_eq!(c.major_decisions[0].source_event, "Proposal");
}

#[test]
fn job_action_goes_through_the_career_subsystem() {
    let f = fixture();
    let resolver = ChoiceResolver::new(&f.config.choice, &f.subsystems);
    let event = f.catalog.get("job_fair").expect("job fair");

    let mut c = adult(20);
    let outcome = resolver
        .apply_choice(&mut c, &mut EventTracker::new(), event, "retail", &mut ScriptedRng::constant(0.0))
        .expect("choice applies");
    assert!(c.has_job());
    assert_eq!(c.skill(Skill::Leadership), 2);
    assert_eq!(c.major_decisions.len(), 1);
    assert!(outcome.log.has_event(|e| matches!(e, SimEvent::Hired { career_id, .. } if career_id == "retail")));

    // Too young: the choice still resolves but the hire is rejected.
    let mut kid = adult(14);
    resolver
        .apply_choice(&mut kid, &mut EventTracker::new(), event, "retail", &mut ScriptedRng::constant(0.0))
        .expect("choice applies");
    assert!(!kid.has_job());
}
