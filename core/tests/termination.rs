//! Termination predicate tests.

use lifesim_core::{
    balancer::StatBalancer,
    character::{Character, DeathCause, Gender},
    config::TerminationConfig,
    crime_subsystem::CrimeType,
    event::{Chronicle, SimEvent},
    health_subsystem::ActiveCondition,
    prison_subsystem::{arrest, CustodyState},
    rng::ScriptedRng,
    stats::{Stat, Stats},
    termination::{finalize, is_game_over, survival_chance},
};

fn character(age: u32, health: i64, wealth: i64) -> Character {
    Character::new("t".into(), "Lou Park".into(), 1940, Gender::Male, Stats::new(health, 50, 50, 50, 50, wealth))
        .starting_at(age)
}

fn sick(mut c: Character) -> Character {
    c.conditions.push(ActiveCondition {
        id: "diabetes".into(),
        name: "Diabetes".into(),
        diagnosed_at: c.age().saturating_sub(5),
        chronic: true,
    });
    c
}

#[test]
fn sick_poor_senior_rarely_survives_a_collapse() {
    let config = TerminationConfig::default();
    let mut c = sick(character(70, 0, 10));

    let chance = survival_chance(&config, &c);
    assert!((chance - 0.05).abs() < 1e-9);

    let check = is_game_over(&config, &c, &mut ScriptedRng::constant(0.5));
    assert!(check.game_over);
    assert_eq!(check.cause, Some(DeathCause::Illness));

    let mut log = Chronicle::new();
    finalize(&config, &mut c, &check, &mut log);
    assert!(c.is_game_over());
    assert!(log.has_event(|e| matches!(e, SimEvent::GameOver { age: 70, .. })));
}

#[test]
fn survival_depends_on_stage_and_wealth() {
    let config = TerminationConfig::default();
    assert_eq!(survival_chance(&config, &character(8, 0, 0)), 0.5);
    assert_eq!(survival_chance(&config, &character(40, 0, 0)), 0.3);
    assert!((survival_chance(&config, &character(40, 0, 50)) - 0.45).abs() < 1e-9);
    assert!((survival_chance(&config, &sick(character(40, 0, 0))) - 0.15).abs() < 1e-9);
}

#[test]
fn healthy_young_character_keeps_living() {
    let config = TerminationConfig::default();
    let c = character(30, 60, 0);
    let check = is_game_over(&config, &c, &mut ScriptedRng::constant(0.0));
    assert!(!check.game_over);
    assert!(!check.revived());
}

#[test]
fn recorded_killing_ends_the_life_without_a_roll() {
    let config = TerminationConfig::default();
    let mut c = character(45, 90, 500);
    c.fatal_cause = Some(DeathCause::Killed { by: "the family".into() });

    let mut rng = ScriptedRng::constant(0.99);
    let check = is_game_over(&config, &c, &mut rng);
    assert_eq!(rng.consumed(), 0);
    assert_eq!(check.cause, Some(DeathCause::Killed { by: "the family".into() }));
}

#[test]
fn dying_inside_closes_the_custody_record() {
    let config = TerminationConfig::default();
    let mut c = character(40, 60, 0);
    arrest(&mut c, CrimeType::Murder, &mut ScriptedRng::constant(0.0), &mut Chronicle::new());
    c.fatal_cause = Some(DeathCause::Killed { by: "another inmate".into() });

    let check = is_game_over(&config, &c, &mut ScriptedRng::constant(0.0));
    finalize(&config, &mut c, &check, &mut Chronicle::new());
    assert_eq!(c.prison.custody, CustodyState::Deceased);
}

#[test]
fn stats_are_frozen_after_death() {
    let config = TerminationConfig::default();
    let mut c = character(config.max_age, 50, 0);
    let check = is_game_over(&config, &c, &mut ScriptedRng::constant(0.99));
    assert_eq!(check.cause, Some(DeathCause::OldAge));
    finalize(&config, &mut c, &check, &mut Chronicle::new());

    let before = c.stat(Stat::Health);
    StatBalancer::apply_one(&mut c, Stat::Health, -30);
    assert_eq!(c.stat(Stat::Health), before);
}
