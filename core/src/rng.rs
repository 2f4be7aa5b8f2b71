//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness flows through a `RandomSource`. In a running session
//! that is a SubsystemRng handed out by the RngBank, derived from the
//! single master seed stored on the run record.
//!
//! Each pipeline phase gets its own RNG stream, seeded deterministically
//! from (master_seed, slot index, draw counter). This means:
//!   - Adding a new slot never changes existing slots' streams.
//!   - Rolls made by different phases within one turn are independent.
//!   - A run is fully reproducible from its seed and its player inputs.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use std::collections::BTreeMap;

/// The only way simulation code draws random numbers.
pub trait RandomSource {
    /// Roll a float in [0.0, 1.0).
    fn next_f64(&mut self) -> f64;

    /// Bernoulli trial: returns true with probability p.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Probability gate that passes when the draw is at most `p`.
    fn roll_at_most(&mut self, p: f64) -> bool {
        self.next_f64() <= p
    }

    /// Uniform float in [lo, hi).
    fn range_f64(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Uniform integer in [lo, hi] (inclusive on both ends).
    fn range_i64(&mut self, lo: i64, hi: i64) -> i64 {
        if hi <= lo {
            return lo;
        }
        let span = (hi - lo + 1) as f64;
        (lo + (self.next_f64() * span).floor() as i64).min(hi)
    }

    /// Uniform index in [0, len). `len` must be > 0.
    fn pick_index(&mut self, len: usize) -> usize {
        assert!(len > 0, "len must be > 0");
        ((self.next_f64() * len as f64).floor() as usize).min(len - 1)
    }
}

/// A named, deterministic RNG for a single pipeline slot.
pub struct SubsystemRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SubsystemRng {
    /// Create a slot RNG from the master seed and a stable index.
    /// The index must never change once assigned.
    pub fn new(master_seed: u64, subsystem_index: u64) -> Self {
        let derived_seed = master_seed ^ (subsystem_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        use rand::RngCore;
        self.inner.next_u64()
    }

    /// Fill a byte buffer (used for deterministic identifiers).
    pub fn fill_bytes(&mut self, buf: &mut [u8]) {
        use rand::RngCore;
        self.inner.fill_bytes(buf);
    }
}

impl RandomSource for SubsystemRng {
    fn next_f64(&mut self) -> f64 {
        let bits = self.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

/// All slot RNGs for a single run.
///
/// Every call to `for_slot` yields a fresh stream keyed on how many
/// streams that slot has already consumed, so replaying the same
/// sequence of calls replays the same draws.
pub struct RngBank {
    master_seed: u64,
    issued: BTreeMap<SubsystemSlot, u64>,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed, issued: BTreeMap::new() }
    }

    /// Resume a bank from snapshotted counters.
    pub fn restore(master_seed: u64, issued: BTreeMap<SubsystemSlot, u64>) -> Self {
        Self { master_seed, issued }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub fn for_slot(&mut self, slot: SubsystemSlot) -> SubsystemRng {
        let counter = self.issued.entry(slot).or_insert(0);
        let seed = self.master_seed ^ counter.wrapping_mul(0xbf58_476d_1ce4_e5b9);
        *counter += 1;
        SubsystemRng::new(seed, slot as u64 + 1).with_name(slot.name())
    }

    /// Number of streams already issued per slot (persisted in snapshots).
    pub fn issued(&self) -> &BTreeMap<SubsystemSlot, u64> {
        &self.issued
    }
}

/// Stable slot assignments.
/// NEVER reorder or remove entries. Append only.
/// Reordering changes every slot's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u64)]
pub enum SubsystemSlot {
    Creation = 0,
    Prison = 1,
    Education = 2,
    Finance = 3,
    Drift = 4,
    Crime = 5,
    Health = 6,
    Career = 7,
    DynamicEvents = 8,
    EventGate = 9,
    StaticEvents = 10,
    Choice = 11,
    Actions = 12,
    Termination = 13,
    Family = 14,
    // Add new slots here, append only.
}

impl SubsystemSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Creation => "creation",
            Self::Prison => "prison",
            Self::Education => "education",
            Self::Finance => "finance",
            Self::Drift => "drift",
            Self::Crime => "crime",
            Self::Health => "health",
            Self::Career => "career",
            Self::DynamicEvents => "dynamic_events",
            Self::EventGate => "event_gate",
            Self::StaticEvents => "static_events",
            Self::Choice => "choice",
            Self::Actions => "actions",
            Self::Termination => "termination",
            Self::Family => "family",
        }
    }
}

/// Replays a fixed list of draws, cycling when exhausted.
/// Used by tests that need exact control over every roll.
#[derive(Debug, Clone)]
pub struct ScriptedRng {
    draws: Vec<f64>,
    cursor: usize,
}

impl ScriptedRng {
    pub fn new(draws: Vec<f64>) -> Self {
        assert!(!draws.is_empty(), "ScriptedRng needs at least one draw");
        Self { draws, cursor: 0 }
    }

    /// Always returns the same value.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// How many draws have been consumed so far.
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedRng {
    fn next_f64(&mut self) -> f64 {
        let value = self.draws[self.cursor % self.draws.len()];
        self.cursor += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = RngBank::new(7);
        let mut b = RngBank::new(7);
        let xs: Vec<f64> = (0..5).map(|_| a.for_slot(SubsystemSlot::Drift).next_f64()).collect();
        let ys: Vec<f64> = (0..5).map(|_| b.for_slot(SubsystemSlot::Drift).next_f64()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn successive_streams_differ() {
        let mut bank = RngBank::new(7);
        let first = bank.for_slot(SubsystemSlot::Health).next_f64();
        let second = bank.for_slot(SubsystemSlot::Health).next_f64();
        assert_ne!(first, second);
    }

    #[test]
    fn range_i64_is_inclusive_and_bounded() {
        let mut rng = ScriptedRng::new(vec![0.0, 0.999_999]);
        assert_eq!(rng.range_i64(3, 5), 3);
        assert_eq!(rng.range_i64(3, 5), 5);
    }

    #[test]
    fn scripted_rng_cycles() {
        let mut rng = ScriptedRng::new(vec![0.1, 0.2]);
        assert_eq!(rng.next_f64(), 0.1);
        assert_eq!(rng.next_f64(), 0.2);
        assert_eq!(rng.next_f64(), 0.1);
        assert_eq!(rng.consumed(), 3);
    }
}
