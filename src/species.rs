use serde::{Deserialize, Serialize};

/// Animal species of the ecosystem. Plants are a separate actor kind.
///
/// A species is a parameter set, not a distinct behavior: every animal
/// runs the same state machine and branches on its [`SpeciesTraits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    Human,
    Dodo,
    Monkey,
    Pig,
    Tortoise,
}

impl Species {
    pub const ALL: [Species; 5] = [
        Species::Human,
        Species::Dodo,
        Species::Monkey,
        Species::Pig,
        Species::Tortoise,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Species::Human => "human",
            Species::Dodo => "dodo",
            Species::Monkey => "monkey",
            Species::Pig => "pig",
            Species::Tortoise => "tortoise",
        }
    }
}

/// A single entry of a species' diet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Prey {
    Human,
    Dodo,
    Monkey,
    Pig,
    Tortoise,
    Plants,
}

impl Prey {
    pub fn as_species(&self) -> Option<Species> {
        match self {
            Prey::Human => Some(Species::Human),
            Prey::Dodo => Some(Species::Dodo),
            Prey::Monkey => Some(Species::Monkey),
            Prey::Pig => Some(Species::Pig),
            Prey::Tortoise => Some(Species::Tortoise),
            Prey::Plants => None,
        }
    }
}

impl From<Species> for Prey {
    fn from(species: Species) -> Self {
        match species {
            Species::Human => Prey::Human,
            Species::Dodo => Prey::Dodo,
            Species::Monkey => Prey::Monkey,
            Species::Pig => Prey::Pig,
            Species::Tortoise => Prey::Tortoise,
        }
    }
}

/// Immutable per-species parameter record.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SpeciesTraits {
    /// Probability that a field cell spawns this species at population time.
    pub spawn_prob: f64,
    /// Minimum age for breeding.
    pub breeding_age: u32,
    /// Per-tick breeding probability, before weather modulation.
    pub breeding_prob: f64,
    /// Maximum offspring per successful breeding draw.
    pub max_litter: u32,
    /// Age beyond which the animal dies.
    pub max_age: u32,
    /// Energy transferred to a predator, per unit of the eaten animal's age.
    pub food_value: f64,
    /// Food level of a newborn.
    pub start_food: f64,
    /// Per-tick probability of dying from disease while infected or not.
    pub disease_death_prob: f64,
    /// What this species may eat.
    pub prey: Vec<Prey>,
    /// Probability of killing an adjacent predator at night, for species
    /// that strike back instead of sleeping.
    #[serde(default)]
    pub night_attack_prob: Option<f64>,
    /// Whether breeding happens during night ticks as well.
    #[serde(default)]
    pub breeds_at_night: bool,
}

/// Immutable table of all species records plus the precomputed predator
/// relation, built once at startup from the configuration.
pub struct SpeciesTable {
    traits: [SpeciesTraits; 5],
    predators: [Vec<Species>; 5],
}

impl SpeciesTable {
    pub fn new(traits: [SpeciesTraits; 5]) -> Self {
        let mut predators: [Vec<Species>; 5] = Default::default();
        for predator in Species::ALL {
            for prey in &traits[predator as usize].prey {
                if let Some(species) = prey.as_species() {
                    predators[species as usize].push(predator);
                }
            }
        }
        Self { traits, predators }
    }

    pub fn traits(&self, species: Species) -> &SpeciesTraits {
        &self.traits[species as usize]
    }

    /// The species that list `species` as prey.
    pub fn predators(&self, species: Species) -> &[Species] {
        &self.predators[species as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn predator_relation_is_inverse_of_prey_sets() {
        let table = Config::default().species_table();

        assert!(table.predators(Species::Dodo).contains(&Species::Human));
        assert!(table.predators(Species::Dodo).contains(&Species::Monkey));
        assert!(table.predators(Species::Pig).contains(&Species::Human));
        assert!(table.predators(Species::Human).is_empty());
    }

    #[test]
    fn prey_round_trips_through_species() {
        for species in Species::ALL {
            assert_eq!(Prey::from(species).as_species(), Some(species));
        }
        assert_eq!(Prey::Plants.as_species(), None);
    }
}
