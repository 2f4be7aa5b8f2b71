//! Life simulation turn engine.
//!
//! A character ages one year per turn. Each turn advances the subsystem
//! state machines, draws at most one event for the player, and checks
//! whether the life has ended. `engine::LifeEngine` is the entry point.

pub mod achievements;
pub mod balancer;
pub mod career_subsystem;
pub mod catalog;
pub mod character;
pub mod choice;
pub mod command;
pub mod config;
pub mod content;
pub mod crime_subsystem;
pub mod drift_subsystem;
pub mod education_subsystem;
pub mod engine;
pub mod error;
pub mod event;
pub mod family_subsystem;
pub mod finance_subsystem;
pub mod health_subsystem;
pub mod history;
pub mod name_generator;
pub mod notify;
pub mod prison_subsystem;
pub mod rng;
pub mod selector;
pub mod snapshot;
pub mod stats;
pub mod store;
pub mod subsystem;
pub mod termination;
pub mod tracker;
pub mod turn;
pub mod types;
