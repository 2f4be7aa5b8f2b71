//! The read-only content provider: events, careers, crime operations and
//! diagnosable conditions.

use crate::{
    career_subsystem::CareerDef,
    catalog::{ChoiceAction, ContentLoader, EventCatalog},
    crime_subsystem::CrimeOperation,
    error::ContentError,
    health_subsystem::ConditionDef,
};
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::path::Path;

const EVENTS_FILE: &str = "events.json";
const CAREERS_FILE: &str = "careers.json";
const CRIMES_FILE: &str = "crimes.json";
const CONDITIONS_FILE: &str = "conditions.json";

const BUILTIN_EVENTS: &str = include_str!("../data/events.json");
const BUILTIN_CAREERS: &str = include_str!("../data/careers.json");
const BUILTIN_CRIMES: &str = include_str!("../data/crimes.json");
const BUILTIN_CONDITIONS: &str = include_str!("../data/conditions.json");

#[derive(Debug, Clone, Default)]
pub struct ContentPack {
    pub catalog: EventCatalog,
    pub careers: Vec<CareerDef>,
    pub operations: Vec<CrimeOperation>,
    pub conditions: Vec<ConditionDef>,
}

impl ContentPack {
    /// Content shipped with the crate.
    pub fn builtin(strict: bool) -> Result<Self, ContentError> {
        Self::from_sources(
            strict,
            [BUILTIN_EVENTS, BUILTIN_CAREERS, BUILTIN_CRIMES, BUILTIN_CONDITIONS],
        )
    }

    /// Load the same four files from `dir`.
    pub fn load(dir: &Path, strict: bool) -> Result<Self, ContentError> {
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read_to_string(&path).map_err(|e| ContentError::Io {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        };
        let events = read(EVENTS_FILE)?;
        let careers = read(CAREERS_FILE)?;
        let crimes = read(CRIMES_FILE)?;
        let conditions = read(CONDITIONS_FILE)?;
        Self::from_sources(strict, [events.as_str(), careers.as_str(), crimes.as_str(), conditions.as_str()])
    }

    fn from_sources(strict: bool, [events, careers, crimes, conditions]: [&str; 4]) -> Result<Self, ContentError> {
        let loader = ContentLoader::new(strict);
        let mut pack = Self {
            catalog: EventCatalog::from_json(EVENTS_FILE, events, loader)?,
            careers: parse_list(CAREERS_FILE, careers)?,
            operations: parse_list(CRIMES_FILE, crimes)?,
            conditions: parse_list(CONDITIONS_FILE, conditions)?,
        };
        pack.check_ids(&loader)?;
        pack.check_references(&loader)?;
        log::debug!(
            "content: {} events, {} careers, {} operations, {} conditions",
            pack.catalog.len(),
            pack.careers.len(),
            pack.operations.len(),
            pack.conditions.len()
        );
        Ok(pack)
    }

    fn check_ids(&mut self, loader: &ContentLoader) -> Result<(), ContentError> {
        dedup(loader, "careers", &mut self.careers, |c| &c.id)?;
        dedup(loader, "crime operations", &mut self.operations, |o| &o.id)?;
        dedup(loader, "conditions", &mut self.conditions, |c| &c.id)?;
        Ok(())
    }

    /// Every `apply_job` choice must name a known career. Lenient mode
    /// strips the dangling action and keeps the rest of the choice.
    fn check_references(&mut self, loader: &ContentLoader) -> Result<(), ContentError> {
        let careers: BTreeSet<String> = self.careers.iter().map(|c| c.id.clone()).collect();
        let EventCatalog { dynamic, random_pool, static_pool } = &mut self.catalog;
        for event in dynamic.iter_mut().chain(random_pool.iter_mut()).chain(static_pool.iter_mut()) {
            for choice in &mut event.choices {
                let Some(ChoiceAction::ApplyJob { career_id }) = &choice.action else {
                    continue;
                };
                if careers.contains(career_id) {
                    continue;
                }
                loader.violation(ContentError::UnknownReference {
                    owner: format!("{}/{}", event.id, choice.id),
                    kind: "career",
                    id: career_id.clone(),
                })?;
                choice.action = None;
            }
        }
        Ok(())
    }
}

fn parse_list<T: DeserializeOwned>(source_name: &str, text: &str) -> Result<Vec<T>, ContentError> {
    serde_json::from_str(text).map_err(|e| ContentError::Parse {
        source_name: source_name.to_string(),
        reason: e.to_string(),
    })
}

fn dedup<T>(
    loader: &ContentLoader,
    collection: &'static str,
    items: &mut Vec<T>,
    id: impl Fn(&T) -> &String,
) -> Result<(), ContentError> {
    let mut seen = BTreeSet::new();
    let mut kept = Vec::with_capacity(items.len());
    for item in items.drain(..) {
        if seen.insert(id(&item).clone()) {
            kept.push(item);
        } else {
            loader.violation(ContentError::DuplicateId { collection, id: id(&item).clone() })?;
        }
    }
    *items = kept;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_content_loads_strictly() {
        let pack = ContentPack::builtin(true).expect("builtin content");
        assert!(pack.catalog.get("murder_assignment").is_some());
        assert!(pack.catalog.get("prison_tunnel").is_some());
        assert!(!pack.careers.is_empty());
        assert!(!pack.operations.is_empty());
        assert!(!pack.conditions.is_empty());
    }

    #[test]
    fn dangling_career_reference_is_stripped_when_lenient() {
        let events = r#"{ "dynamic": [ { "id": "e", "title": "E", "description": "", "category": "career",
            "choices": [ { "id": "c", "text": "C", "action": { "type": "apply_job", "career_id": "astronaut" } } ] } ] }"#;
        let strict = ContentPack::from_sources(true, [events, "[]", "[]", "[]"]);
        assert!(matches!(strict, Err(ContentError::UnknownReference { .. })));

        let lenient = ContentPack::from_sources(false, [events, "[]", "[]", "[]"]).expect("lenient");
        assert_eq!(lenient.catalog.get("e").and_then(|e| e.choices[0].action.clone()), None);
    }
}
