//! Closed table of life achievements, each unlocked at most once.

use crate::{
    career_subsystem::CareerState,
    character::{Character, RelationshipStatus},
    crime_subsystem::Rank,
    education_subsystem::EducationStage,
    event::{Chronicle, SimEvent},
    stats::{Skill, Stat},
    tracker::EventTracker,
};

pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub unlocked: fn(&Character, &EventTracker) -> bool,
}

pub const ACHIEVEMENTS: &[Achievement] = &[
    Achievement { id: "coming_of_age", title: "Coming of Age", unlocked: |c, _| c.age() >= 18 },
    Achievement { id: "diploma", title: "Diploma in Hand", unlocked: |c, _| c.has_education(EducationStage::HighSchool) },
    Achievement { id: "graduate", title: "College Graduate", unlocked: |c, _| c.has_education(EducationStage::University) },
    Achievement { id: "doctorate", title: "Advanced Degree", unlocked: |c, _| c.has_education(EducationStage::Graduate) },
    Achievement { id: "first_paycheck", title: "First Paycheck", unlocked: |c, _| c.has_job() },
    Achievement {
        id: "corner_office",
        title: "Corner Office",
        unlocked: |c, _| matches!(&c.career, CareerState::Employed(job) if job.level >= 4),
    },
    Achievement { id: "millionaire", title: "Millionaire", unlocked: |c, _| c.stat(Stat::Wealth) >= 1000 },
    Achievement { id: "homeowner", title: "Property Owner", unlocked: |c, _| !c.assets.is_empty() },
    Achievement {
        id: "tied_the_knot",
        title: "Tied the Knot",
        unlocked: |c, _| c.relationship_status == RelationshipStatus::Married,
    },
    Achievement { id: "made", title: "Made Member", unlocked: |c, _| c.crime.made },
    Achievement { id: "godfather", title: "The Godfather", unlocked: |c, _| c.crime.rank == Rank::Godfather },
    Achievement { id: "jailbird", title: "Jailbird", unlocked: |c, _| c.prison.times_incarcerated > 0 },
    Achievement { id: "great_escape", title: "The Great Escape", unlocked: |c, _| c.prison.is_fugitive() },
    Achievement { id: "athlete", title: "Peak Physique", unlocked: |c, _| c.skill(Skill::Fitness) >= 80 },
    Achievement { id: "virtuoso", title: "Virtuoso", unlocked: |c, _| c.skill(Skill::Music) >= 80 },
    Achievement { id: "decisive", title: "Decisive", unlocked: |_, t| t.choice_history.len() >= 25 },
    Achievement { id: "golden_years", title: "Golden Years", unlocked: |c, _| c.age() >= 65 },
    Achievement { id: "centenarian", title: "Centenarian", unlocked: |c, _| c.age() >= 100 },
];

/// Record every achievement that became true this turn. Returns the ids
/// of the newly unlocked ones.
pub fn check(character: &mut Character, tracker: &EventTracker, log: &mut Chronicle) -> Vec<&'static str> {
    let mut unlocked = Vec::new();
    for achievement in ACHIEVEMENTS {
        if character.has_achievement(achievement.id) || !(achievement.unlocked)(character, tracker) {
            continue;
        }
        character.achievements.push(achievement.id.to_string());
        log.narrate(format!("Achievement unlocked: {}!", achievement.title));
        log.emit(
            "achievements",
            SimEvent::AchievementUnlocked { age: character.age(), achievement_id: achievement.id.to_string() },
        );
        unlocked.push(achievement.id);
    }
    unlocked
}

pub fn title(id: &str) -> Option<&'static str> {
    ACHIEVEMENTS.iter().find(|a| a.id == id).map(|a| a.title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{character::Gender, stats::Stats};

    #[test]
    fn achievements_fire_once() {
        let mut c = Character::new("a".into(), "A".into(), 1990, Gender::Female, Stats::new(80, 50, 50, 50, 50, 0))
            .starting_at(18);
        let tracker = EventTracker::new();

        let mut log = Chronicle::new();
        assert_eq!(check(&mut c, &tracker, &mut log), vec!["coming_of_age"]);

        let mut again = Chronicle::new();
        assert!(check(&mut c, &tracker, &mut again).is_empty());
        assert!(again.events.is_empty());
        assert_eq!(c.achievements, vec!["coming_of_age".to_string()]);
    }
}
