use crate::actor::{Actor, ActorId};
use crate::field::{Field, Location};
use crate::weather::Weather;
use anyhow::{Context, Result};
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Live-actor counts by species label, surveyed from a field scan.
///
/// Each cell contributes its visible occupant, mirroring what an
/// external display of the field would show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationStats {
    counts: BTreeMap<String, usize>,
}

impl PopulationStats {
    /// Count the visible occupant of every cell.
    pub fn survey(field: &Field, actors: &HashMap<ActorId, Actor>) -> Self {
        let mut counts = BTreeMap::new();
        for loc in field.locations() {
            let Some(id) = field.occupant_at(loc) else {
                continue;
            };
            let Some(actor) = actors.get(&id) else {
                continue;
            };
            if actor.alive {
                *counts.entry(actor.label().to_owned()).or_insert(0) += 1;
            }
        }
        Self { counts }
    }

    fn from_labels<'a>(labels: impl Iterator<Item = &'a str>) -> Self {
        let mut counts = BTreeMap::new();
        for label in labels {
            *counts.entry(label.to_owned()).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn count(&self, label: &str) -> usize {
        self.counts.get(label).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &BTreeMap<String, usize> {
        &self.counts
    }

    /// True iff more than one species other than plants has living members.
    pub fn is_viable(&self) -> bool {
        let species_alive = self
            .counts
            .iter()
            .filter(|&(label, &count)| label != "plant" && count > 0)
            .count();
        species_alive > 1
    }
}

/// Serializable snapshot of the field occupancy plus tick metadata.
///
/// Restoring a snapshot and replaying [`FieldSnapshot::population`] or
/// [`FieldSnapshot::is_viable`] agrees exactly with the live field it
/// was captured from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub tick: u64,
    pub weather: Weather,
    pub infected: usize,
    pub cells: BTreeMap<Location, String>,
}

impl FieldSnapshot {
    pub fn capture(
        tick: u64,
        weather: Weather,
        infected: usize,
        field: &Field,
        actors: &HashMap<ActorId, Actor>,
    ) -> Self {
        let mut cells = BTreeMap::new();
        for loc in field.locations() {
            let Some(id) = field.occupant_at(loc) else {
                continue;
            };
            let Some(actor) = actors.get(&id) else {
                continue;
            };
            if actor.alive {
                cells.insert(loc, actor.label().to_owned());
            }
        }
        Self {
            tick,
            weather,
            infected,
            cells,
        }
    }

    pub fn population(&self) -> PopulationStats {
        PopulationStats::from_labels(self.cells.values().map(String::as_str))
    }

    pub fn is_viable(&self) -> bool {
        self.population().is_viable()
    }

    /// Write the snapshot as MessagePack.
    pub fn save<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write(&mut writer, &self).context("failed to serialize snapshot")?;
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }

    /// Load a previously saved snapshot.
    pub fn load<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);
        let snapshot = decode::from_read(&mut reader).context("failed to deserialize snapshot")?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Gender;
    use crate::field::Occupancy;
    use crate::species::Species;

    fn world_with(animals: &[(u64, Species, usize, usize)]) -> (Field, HashMap<ActorId, Actor>) {
        let mut field = Field::new(5, 5);
        let mut actors = HashMap::new();
        for &(raw_id, species, row, col) in animals {
            let id = ActorId(raw_id);
            let loc = Location::new(row, col);
            let actor = Actor::animal(id, species, Gender::Female, loc, 5, 10.0, false);
            field.place(id, Occupancy::Exclusive, loc);
            actors.insert(id, actor);
        }
        (field, actors)
    }

    #[test]
    fn survey_counts_by_label() {
        let (field, actors) = world_with(&[
            (1, Species::Human, 0, 0),
            (2, Species::Human, 0, 1),
            (3, Species::Pig, 1, 0),
        ]);
        let stats = PopulationStats::survey(&field, &actors);
        assert_eq!(stats.count("human"), 2);
        assert_eq!(stats.count("pig"), 1);
        assert_eq!(stats.count("dodo"), 0);
    }

    #[test]
    fn one_animal_species_is_not_viable() {
        let (mut field, mut actors) = world_with(&[(1, Species::Human, 0, 0)]);
        let plant_id = ActorId(99);
        let plant_loc = Location::new(2, 2);
        field.place(plant_id, Occupancy::Shared, plant_loc);
        actors.insert(plant_id, Actor::plant(plant_id, plant_loc, 1));

        let stats = PopulationStats::survey(&field, &actors);
        assert!(!stats.is_viable());
    }

    #[test]
    fn two_animal_species_are_viable() {
        let (field, actors) = world_with(&[(1, Species::Human, 0, 0), (2, Species::Pig, 1, 1)]);
        let stats = PopulationStats::survey(&field, &actors);
        assert!(stats.is_viable());
    }

    #[test]
    fn snapshot_population_matches_survey() {
        let (field, actors) = world_with(&[
            (1, Species::Human, 0, 0),
            (2, Species::Pig, 1, 1),
            (3, Species::Tortoise, 2, 2),
        ]);
        let stats = PopulationStats::survey(&field, &actors);
        let snapshot = FieldSnapshot::capture(3, Weather::Sunny, 0, &field, &actors);

        assert_eq!(snapshot.population(), stats);
        assert_eq!(snapshot.is_viable(), stats.is_viable());
    }
}
