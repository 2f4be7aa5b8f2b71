//! Deterministic name generation from curated lists.
//!
//! Same RNG stream, same names.

use crate::{character::Gender, rng::RandomSource};

pub struct NameGenerator;

impl NameGenerator {
    pub fn full_name(gender: Gender, rng: &mut dyn RandomSource) -> String {
        let first = Self::first_name(gender, rng);
        let last = Self::last_name(rng);
        format!("{first} {last}")
    }

    /// First name only; family members share the character's surname.
    pub fn first_name(gender: Gender, rng: &mut dyn RandomSource) -> &'static str {
        let names = match gender {
            Gender::Female => FEMALE,
            Gender::Male => MALE,
            Gender::Nonbinary => NEUTRAL,
        };
        names[rng.pick_index(names.len())]
    }

    pub fn last_name(rng: &mut dyn RandomSource) -> &'static str {
        LAST[rng.pick_index(LAST.len())]
    }

    /// Split "First Last" and return the surname, if any.
    pub fn surname_of(full_name: &str) -> Option<&str> {
        full_name.rsplit_once(' ').map(|(_, last)| last)
    }
}

const FEMALE: &[&str] = &[
    "Olivia", "Emma", "Ava", "Sophia", "Isabella", "Mia", "Amelia", "Harper", "Evelyn", "Abigail",
    "Ella", "Scarlett", "Grace", "Chloe", "Camila", "Penelope", "Riley", "Layla", "Lillian", "Nora",
    "Zoey", "Hannah", "Lily", "Eleanor", "Hazel", "Violet", "Aurora", "Savannah", "Audrey", "Brooklyn",
    "Lucia", "Priya", "Mei", "Fatima", "Amara", "Yara", "Ingrid", "Rosa", "Noor", "Keiko",
];

const MALE: &[&str] = &[
    "Liam", "Noah", "Oliver", "Elijah", "James", "William", "Benjamin", "Lucas", "Henry", "Theodore",
    "Jack", "Levi", "Alexander", "Jackson", "Mateo", "Daniel", "Michael", "Mason", "Sebastian", "Ethan",
    "Logan", "Owen", "Samuel", "Jacob", "Asher", "Aiden", "John", "Joseph", "Wyatt", "David",
    "Diego", "Arjun", "Wei", "Omar", "Kwame", "Tariq", "Lars", "Marco", "Hiro", "Emeka",
];

const NEUTRAL: &[&str] = &[
    "Alex", "Avery", "Jordan", "Taylor", "Morgan", "Casey", "Quinn", "Rowan", "Sage", "Skyler",
    "Jamie", "Robin", "Emerson", "Finley", "Hayden", "Parker", "Reese", "River", "Ash", "Kai",
];

const LAST: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez", "Martinez",
    "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor", "Moore", "Jackson", "Martin",
    "Lee", "Perez", "Thompson", "White", "Harris", "Sanchez", "Clark", "Ramirez", "Lewis", "Robinson",
    "Walker", "Young", "Allen", "King", "Wright", "Scott", "Torres", "Nguyen", "Hill", "Flores",
    "Patel", "Kim", "Okafor", "Rossi", "Novak", "Schmidt", "Tanaka", "Costa", "Haddad", "Larsen",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SubsystemRng;

    #[test]
    fn same_stream_same_name() {
        let a = NameGenerator::full_name(Gender::Female, &mut SubsystemRng::new(7, 1));
        let b = NameGenerator::full_name(Gender::Female, &mut SubsystemRng::new(7, 1));
        assert_eq!(a, b);
        assert_eq!(a.split(' ').count(), 2);
    }

    #[test]
    fn surname_is_last_word() {
        assert_eq!(NameGenerator::surname_of("Ada Lovelace"), Some("Lovelace"));
        assert_eq!(NameGenerator::surname_of("Cher"), None);
    }
}
