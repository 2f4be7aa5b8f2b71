//! EventSelector and AugmentedSelector tests.
//!
//! Covers the eligibility rules, one-shot and cooldown exclusion, the
//! weighted draw and the augmented re-weighting.

use lifesim_core::{
    catalog::{ContentLoader, Event, EventCatalog},
    character::{Character, Gender},
    config::SelectionConfig,
    crime_subsystem::{CrimeType, Rank},
    event::Chronicle,
    prison_subsystem::{arrest, Facility},
    rng::{RngBank, ScriptedRng, SubsystemSlot},
    selector::{AugmentedSelector, EventSelector},
    stats::Stats,
    tracker::EventTracker,
};

fn catalog(json: &str) -> EventCatalog {
    EventCatalog::from_json("test", json, ContentLoader::new(true)).expect("test catalog")
}

fn person(age: u32, smarts: i64) -> Character {
    Character::new("p".into(), "Pat Doe".into(), 1990, Gender::Nonbinary, Stats::new(80, 50, smarts, 50, 50, 10))
        .starting_at(age)
}

fn selector() -> EventSelector {
    EventSelector::new(SelectionConfig::default())
}

fn ids(events: &[&Event]) -> Vec<String> {
    events.iter().map(|e| e.id.clone()).collect()
}

const BASIC: &str = r#"{ "dynamic": [
    { "id": "adult_only", "title": "Adult", "description": "", "category": "random",
      "conditions": { "min_age": 18 }, "choices": [ { "id": "ok", "text": "Ok" } ] },
    { "id": "smart_kid", "title": "Smart", "description": "", "category": "education",
      "conditions": { "max_age": 17, "min_stats": { "smarts": 60 } }, "choices": [ { "id": "ok", "text": "Ok" } ] },
    { "id": "teen", "title": "Teen", "description": "", "category": "social",
      "conditions": { "life_stage": "teen" }, "choices": [ { "id": "ok", "text": "Ok" } ] },
    { "id": "employed", "title": "Work", "description": "", "category": "career",
      "conditions": { "has_job": true }, "choices": [ { "id": "ok", "text": "Ok" } ] },
    { "id": "graduate", "title": "Grad", "description": "", "category": "education",
      "conditions": { "has_education": "university" }, "choices": [ { "id": "ok", "text": "Ok" } ] }
] }"#;

#[test]
fn min_age_excludes_regardless_of_other_fields() {
    let cat = catalog(BASIC);
    let c = person(17, 65);
    let eligible = selector().available_events(&cat.dynamic, &c, &EventTracker::new(), &mut ScriptedRng::constant(0.0));
    let ids = ids(&eligible);
    assert!(!ids.contains(&"adult_only".to_string()));
    assert_eq!(ids, vec!["smart_kid".to_string(), "teen".to_string()]);
}

#[test]
fn stat_threshold_is_read_per_stat() {
    let cat = catalog(BASIC);
    let c = person(15, 59);
    let eligible = selector().available_events(&cat.dynamic, &c, &EventTracker::new(), &mut ScriptedRng::constant(0.0));
    assert_eq!(ids(&eligible), vec!["teen".to_string()]);
}

#[test]
fn probability_gate_passes_on_equal_draw() {
    let cat = catalog(
        r#"{ "dynamic": [ { "id": "coin", "title": "Coin", "description": "", "category": "random",
            "conditions": { "probability": 0.5 }, "choices": [ { "id": "ok", "text": "Ok" } ] } ] }"#,
    );
    let c = person(30, 50);
    let s = selector();
    let tracker = EventTracker::new();
    assert_eq!(s.available_events(&cat.dynamic, &c, &tracker, &mut ScriptedRng::constant(0.5)).len(), 1);
    assert!(s.available_events(&cat.dynamic, &c, &tracker, &mut ScriptedRng::constant(0.51)).is_empty());
}

#[test]
fn triggered_events_never_return() {
    let cat = catalog(BASIC);
    let c = person(30, 50);
    let mut tracker = EventTracker::new();
    tracker.mark_triggered("adult_only", 20);

    let s = selector();
    for age in [30, 50, 90] {
        let c = c.clone().starting_at(age);
        let eligible = s.available_events(&cat.dynamic, &c, &tracker, &mut ScriptedRng::constant(0.0));
        assert!(!ids(&eligible).contains(&"adult_only".to_string()), "one-shot event returned at age {age}");
    }
}

#[test]
fn cooldown_holds_for_two_years() {
    let cat = catalog(
        r#"{ "random": [ { "id": "wallet", "title": "Wallet", "description": "", "category": "random",
            "effects": { "wealth": 1 } } ] }"#,
    );
    let s = selector();
    let mut tracker = EventTracker::new();
    tracker.touch("wallet", 30);

    let at = |age| {
        let c = person(age, 50);
        s.random_pool_events(&cat.random_pool, &c, &tracker, &mut ScriptedRng::constant(0.0)).len()
    };
    assert_eq!(at(30), 0);
    assert_eq!(at(31), 0);
    assert_eq!(at(32), 1);
}

#[test]
fn prison_events_are_exclusive() {
    let cat = catalog(
        r#"{ "dynamic": [
            { "id": "outside", "title": "Outside", "description": "", "category": "random",
              "choices": [ { "id": "ok", "text": "Ok" } ] },
            { "id": "inside", "title": "Inside", "description": "", "category": "prison",
              "conditions": { "in_prison": true }, "choices": [ { "id": "ok", "text": "Ok" } ] }
        ] }"#,
    );
    let s = selector();
    let tracker = EventTracker::new();
    let mut c = person(25, 50);

    let free = s.available_events(&cat.dynamic, &c, &tracker, &mut ScriptedRng::constant(0.0));
    assert_eq!(ids(&free), vec!["outside".to_string()]);

    arrest(&mut c, CrimeType::Burglary, &mut ScriptedRng::constant(0.0), &mut Chronicle::new());
    assert_eq!(c.prison.incarceration().map(|i| i.facility), Some(Facility::MediumSecurity));
    let inside = s.available_events(&cat.dynamic, &c, &tracker, &mut ScriptedRng::constant(0.0));
    assert_eq!(ids(&inside), vec!["inside".to_string()]);
}

#[test]
fn crime_rank_and_flags_gate_events() {
    let cat = catalog(
        r#"{ "dynamic": [
            { "id": "sitdown", "title": "Sit-down", "description": "", "category": "crime",
              "conditions": { "crime_rank": "soldier" }, "choices": [ { "id": "ok", "text": "Ok" } ] },
            { "id": "dog_walk", "title": "Walk", "description": "", "category": "random",
              "conditions": { "requires_flag": "dog_owner", "excludes_flag": "allergic" },
              "choices": [ { "id": "ok", "text": "Ok" } ] }
        ] }"#,
    );
    let s = selector();
    let tracker = EventTracker::new();
    let mut c = person(30, 50);
    let run = |c: &Character| ids(&s.available_events(&cat.dynamic, c, &tracker, &mut ScriptedRng::constant(0.0)));

    assert!(run(&c).is_empty());
    c.crime.rank = Rank::Caporegime;
    c.flags.insert("dog_owner".into());
    assert_eq!(run(&c), vec!["sitdown".to_string(), "dog_walk".to_string()]);
    c.flags.insert("allergic".into());
    assert_eq!(run(&c), vec!["sitdown".to_string()]);
}

#[test]
fn weighted_selection_converges_to_weights() {
    let cat = catalog(
        r#"{ "dynamic": [
            { "id": "light", "title": "L", "description": "", "category": "random", "weight": 1,
              "choices": [ { "id": "ok", "text": "Ok" } ] },
            { "id": "heavy", "title": "H", "description": "", "category": "random", "weight": 3,
              "choices": [ { "id": "ok", "text": "Ok" } ] }
        ] }"#,
    );
    let candidates: Vec<&Event> = cat.dynamic.iter().collect();
    let s = selector();
    let mut bank = RngBank::new(0x5EED_1234);
    let mut rng = bank.for_slot(SubsystemSlot::DynamicEvents);

    const TRIALS: usize = 20_000;
    let heavy = (0..TRIALS)
        .filter(|_| s.select_event(&candidates, &mut rng).map(|e| e.id.as_str()) == Some("heavy"))
        .count();
    let share = heavy as f64 / TRIALS as f64;
    assert!((share - 0.75).abs() < 0.02, "heavy share {share:.3} not near 0.75");
}

#[test]
fn empty_candidate_list_selects_nothing() {
    assert!(selector().select_event(&[], &mut ScriptedRng::constant(0.3)).is_none());
}

#[test]
fn augmented_layer_composes_modifiers() {
    let cat = catalog(
        r#"{ "dynamic": [
            { "id": "window", "title": "W", "description": "", "category": "random",
              "conditions": { "min_age": 20, "max_age": 40 }, "choices": [ { "id": "ok", "text": "Ok" } ] },
            { "id": "marriage_offer", "title": "M", "description": "", "category": "relationship",
              "choices": [ { "id": "ok", "text": "Ok" } ] },
            { "id": "promotion", "title": "P", "description": "", "category": "career", "weight": 2,
              "choices": [ { "id": "ok", "text": "Ok" } ] }
        ] }"#,
    );
    let candidates: Vec<&Event> = cat.dynamic.iter().collect();
    let augmented = AugmentedSelector::new(selector());

    // Midpoint of the window: full weight.
    let weights: Vec<f64> = augmented.reweight(&candidates, &person(30, 50)).iter().map(|(_, w)| *w).collect();
    assert_eq!(weights, vec![1.0, 0.3, 3.0]);

    // 5 years from the midpoint of a 20-year window.
    let w = augmented.age_factor(&cat.dynamic[0], &person(35, 50));
    assert!((w - 0.75).abs() < 1e-9);

    // Far outside the window the floor applies.
    assert_eq!(augmented.age_factor(&cat.dynamic[0], &person(80, 50)), 0.5);
}

#[test]
fn base_selector_ignores_augmented_modifiers() {
    let cat = catalog(
        r#"{ "dynamic": [
            { "id": "marriage_offer", "title": "M", "description": "", "category": "relationship",
              "choices": [ { "id": "ok", "text": "Ok" } ] },
            { "id": "other", "title": "O", "description": "", "category": "random",
              "choices": [ { "id": "ok", "text": "Ok" } ] }
        ] }"#,
    );
    let candidates: Vec<&Event> = cat.dynamic.iter().collect();
    // total 2, draw 0.4 → r = 0.8 → first event under equal weights.
    let picked = selector().select_event(&candidates, &mut ScriptedRng::constant(0.4));
    assert_eq!(picked.map(|e| e.id.as_str()), Some("marriage_offer"));

    // Augmented: weights 0.3 and 1.0, total 1.3, r = 0.52 → second event.
    let picked = AugmentedSelector::new(selector()).select_event(&candidates, &person(30, 50), &mut ScriptedRng::constant(0.4));
    assert_eq!(picked.map(|e| e.id.as_str()), Some("other"));
}
