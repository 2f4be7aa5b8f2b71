//! The life session: one character, one seed, one store.
//!
//! RULES:
//!   - All randomness flows through the RngBank.
//!   - Every structured event is written to the event log.
//!   - Notifications are derived from events after they are persisted.
//!   - Once the character is dead every operation is a guarded no-op.

use crate::{
    catalog::Event,
    character::{Character, FamilyMember, Gender, Relation},
    choice::{ChoiceError, ChoiceOutcome, ChoiceResolver},
    command::{PlayerAction, Routed},
    config::SimConfig,
    content::ContentPack,
    error::{SimError, SimResult},
    event::{EventLogEntry, SimEvent},
    name_generator::NameGenerator,
    notify::{LogNotifier, Notification, Notifier},
    rng::{RandomSource, RngBank, SubsystemRng, SubsystemSlot},
    selector::{AugmentedSelector, EventSelector},
    snapshot::{LifeSnapshot, SNAPSHOT_INTERVAL},
    stats::Stats,
    store::{LifeLogStore, SimStore},
    subsystem::{ActionResult, Subsystems},
    turn::{LifeState, TurnProcessor, TurnReport},
    types::{Age, EventId, RunId},
};
use serde::{Deserialize, Serialize};

/// How to create the character. Anything left empty is randomised.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CharacterSpec {
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub birth_year: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceReport {
    pub event_id: EventId,
    pub outcome: Result<ChoiceOutcome, ChoiceError>,
}

pub struct LifeEngine {
    pub run_id:  RunId,
    seed:        u64,
    config:      SimConfig,
    content:     ContentPack,
    subsystems:  Subsystems,
    selector:    AugmentedSelector,
    rng_bank:    RngBank,
    store:       SimStore,
    notifier:    Box<dyn Notifier>,
    state:       LifeState,
}

impl LifeEngine {
    pub fn new(
        run_id: RunId,
        seed: u64,
        store: SimStore,
        content: ContentPack,
        config: SimConfig,
        spec: CharacterSpec,
    ) -> SimResult<Self> {
        let mut rng_bank = RngBank::new(seed);
        let character = create_character(&spec, &mut rng_bank.for_slot(SubsystemSlot::Creation));

        store.migrate()?;
        store.insert_run(&run_id, seed, env!("CARGO_PKG_VERSION"), &character.id)?;
        let history = store.load(&character.id)?;

        let mut state = LifeState::new(character);
        state.history = history;
        let engine = Self::assemble(run_id, seed, store, content, config, rng_bank, state);

        let init = SimEvent::RunInitialized {
            run_id: engine.run_id.clone(),
            character_id: engine.state.character.id.clone(),
            seed,
        };
        engine.persist(0, &[("engine", init)])?;
        log::info!(
            "run={} character={} ({}) seed={seed}",
            engine.run_id,
            engine.state.character.name,
            engine.state.character.id
        );
        Ok(engine)
    }

    /// Continue a run from its latest snapshot.
    pub fn resume(run_id: &str, store: SimStore, content: ContentPack, config: SimConfig) -> SimResult<Option<Self>> {
        store.migrate()?;
        let Some((age, json)) = store.latest_snapshot_before(run_id, Age::MAX)? else {
            return Ok(None);
        };
        let snapshot: LifeSnapshot = serde_json::from_str(&json)?;
        log::info!("run={run_id} resumed from snapshot at age {age}");
        let rng_bank = snapshot.rng_bank();
        Ok(Some(Self::assemble(
            snapshot.run_id,
            snapshot.master_seed,
            store,
            content,
            config,
            rng_bank,
            snapshot.state,
        )))
    }

    fn assemble(
        run_id: RunId,
        seed: u64,
        store: SimStore,
        content: ContentPack,
        config: SimConfig,
        rng_bank: RngBank,
        state: LifeState,
    ) -> Self {
        let subsystems = Subsystems::new(&config, &content);
        let selector = AugmentedSelector::new(EventSelector::new(config.selection.clone()));
        Self {
            run_id,
            seed,
            config,
            content,
            subsystems,
            selector,
            rng_bank,
            store,
            notifier: Box::new(LogNotifier),
            state,
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn state(&self) -> &LifeState {
        &self.state
    }

    pub fn character(&self) -> &Character {
        &self.state.character
    }

    pub fn content(&self) -> &ContentPack {
        &self.content
    }

    pub fn store(&self) -> &SimStore {
        &self.store
    }

    pub fn pending_event(&self) -> Option<&Event> {
        let id = self.state.pending.as_deref()?;
        self.content.catalog.get(id)
    }

    /// Advance the life by one year.
    pub fn age_up(&mut self) -> SimResult<TurnReport> {
        let turn = TurnProcessor::new(&self.config, &self.content.catalog, &self.subsystems, &self.selector);
        let report = turn.age_up(&mut self.state, &mut self.rng_bank);
        if report.blocked.is_some() {
            return Ok(report);
        }

        self.persist(report.age, &report.events)?;
        self.save_history()?;
        if report.age % SNAPSHOT_INTERVAL == 0 || report.game_over() {
            self.take_snapshot()?;
        }
        Ok(report)
    }

    /// Resolve the pending event with `choice_id`.
    pub fn choose(&mut self, choice_id: &str) -> SimResult<ChoiceReport> {
        self.guard()?;
        self.drop_stale_pending();
        let event_id = self.state.pending.clone().ok_or(SimError::NoPendingEvent)?;
        let Some(event) = self.content.catalog.get(&event_id) else {
            // Content changed under a resumed run.
            log::warn!("pending event {event_id} no longer exists; dropping it");
            self.state.pending = None;
            return Err(SimError::NoPendingEvent);
        };

        let resolver = ChoiceResolver::new(&self.config.choice, &self.subsystems);
        let mut rng = self.rng_bank.for_slot(SubsystemSlot::Choice);
        let outcome = resolver.apply_choice(
            &mut self.state.character,
            &mut self.state.tracker,
            event,
            choice_id,
            &mut rng,
        );

        if let Ok(resolved) = &outcome {
            self.state.pending = None;
            let age = self.state.character.age();
            self.state.history.record(age, resolved.log.narrative.iter().cloned());
            self.persist(age, &resolved.log.events)?;
            self.save_history()?;
        }
        Ok(ChoiceReport { event_id, outcome })
    }

    /// Perform a direct subsystem action.
    pub fn perform(&mut self, action: PlayerAction) -> SimResult<ActionResult> {
        self.guard()?;
        let mut rng = self.rng_bank.for_slot(SubsystemSlot::Actions);
        let character = &mut self.state.character;
        let subsystems = &self.subsystems;
        let result = match action.route() {
            Routed::Career(a) => subsystems.career.apply_action(character, a),
            Routed::Education(a) => subsystems.education.apply_action(character, a),
            Routed::Crime(a) => subsystems.crime.apply_action(character, a, &mut rng),
            Routed::Prison(a) => subsystems.prison.apply_action(character, a, &mut rng),
            Routed::Health(a) => subsystems.health.apply_action(character, a, &mut rng),
            Routed::Finance(a) => subsystems.finance.apply_action(character, a),
        };

        if let ActionResult::Applied(log) = &result {
            let age = self.state.character.age();
            self.state.history.record(age, log.narrative.iter().cloned());
            self.persist(age, &log.events)?;
            self.drop_stale_pending();
            self.save_history()?;
        }
        Ok(result)
    }

    /// Flush the age history to the store.
    pub fn close(self) -> SimResult<()> {
        self.save_history()?;
        log::info!("run={} closed at age {}", self.run_id, self.state.character.age());
        Ok(())
    }

    fn guard(&self) -> SimResult<()> {
        if self.state.character.is_game_over() {
            return Err(SimError::GameOver { character_id: self.state.character.id.clone() });
        }
        Ok(())
    }

    fn save_history(&self) -> SimResult<()> {
        self.store.save(&self.state.character.id, &self.state.history)
    }

    /// A pending event is only valid for the custody it was drawn under.
    /// An arrest or escape in between withdraws it.
    fn drop_stale_pending(&mut self) {
        let Some(event) = self.pending_event() else { return };
        let wants_prison = event.conditions.in_prison.unwrap_or(false);
        if wants_prison != self.state.character.is_in_prison() {
            log::debug!("pending event {} withdrawn after custody change", event.id);
            self.state.pending = None;
        }
    }

    fn persist(&self, age: Age, events: &[(&'static str, SimEvent)]) -> SimResult<()> {
        for (source, event) in events {
            let entry = EventLogEntry {
                id:         None,
                run_id:     self.run_id.clone(),
                age,
                source:     source.to_string(),
                event_type: event.type_name().to_string(),
                payload:    serde_json::to_string(event)?,
            };
            self.store.append_event(&entry)?;
        }
        for event in events.iter().map(|(_, e)| e) {
            if let Some(notification) = Notification::for_event(event) {
                self.notifier.notify(&notification);
            }
        }
        Ok(())
    }

    fn take_snapshot(&self) -> SimResult<()> {
        let snapshot = LifeSnapshot::capture(&self.run_id, &self.state, &self.rng_bank);
        let json = serde_json::to_string(&snapshot)?;
        self.store.save_snapshot(&self.run_id, snapshot.age, &json)?;
        log::debug!("age={} snapshot saved", snapshot.age);
        Ok(())
    }
}

/// Roll a newborn from `spec`. Stats are uniform in [20, 80], health in
/// [60, 100]; the id is a UUID built from the same stream.
pub fn create_character(spec: &CharacterSpec, rng: &mut SubsystemRng) -> Character {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    let id = uuid::Builder::from_random_bytes(bytes).into_uuid().to_string();

    let gender = spec.gender.unwrap_or_else(|| match rng.pick_index(3) {
        0 => Gender::Female,
        1 => Gender::Male,
        _ => Gender::Nonbinary,
    });
    let name = spec.name.clone().unwrap_or_else(|| NameGenerator::full_name(gender, rng));
    let stats = Stats::new(
        rng.range_i64(60, 100),
        rng.range_i64(20, 80),
        rng.range_i64(20, 80),
        rng.range_i64(20, 80),
        rng.range_i64(20, 80),
        0,
    );

    let mut character = Character::new(id, name, spec.birth_year, gender, stats);
    let surname = NameGenerator::surname_of(&character.name)
        .map(str::to_string)
        .unwrap_or_else(|| NameGenerator::last_name(rng).to_string());
    for (relation, parent_gender) in [(Relation::Mother, Gender::Female), (Relation::Father, Gender::Male)] {
        let first = NameGenerator::first_name(parent_gender, rng);
        character.family.push(FamilyMember {
            relation,
            name: format!("{first} {surname}"),
            age: rng.range_i64(20, 40) as Age,
            alive: true,
        });
    }
    character
}
