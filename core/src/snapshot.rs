//! Snapshot serialization: full life state to/from JSON.
//!
//! A snapshot is taken every SNAPSHOT_INTERVAL years of age. It holds
//! everything needed to resume the life from that age without
//! replaying it, including the RNG bank's stream counters.

use crate::{
    rng::{RngBank, SubsystemSlot},
    turn::LifeState,
    types::{Age, RunId},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SNAPSHOT_INTERVAL: Age = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeSnapshot {
    pub run_id: RunId,
    pub age: Age,
    pub master_seed: u64,
    pub rng_issued: BTreeMap<SubsystemSlot, u64>,
    pub state: LifeState,
}

impl LifeSnapshot {
    pub fn capture(run_id: &str, state: &LifeState, rngs: &RngBank) -> Self {
        Self {
            run_id: run_id.to_string(),
            age: state.character.age(),
            master_seed: rngs.master_seed(),
            rng_issued: rngs.issued().clone(),
            state: state.clone(),
        }
    }

    pub fn rng_bank(&self) -> RngBank {
        RngBank::restore(self.master_seed, self.rng_issued.clone())
    }
}
