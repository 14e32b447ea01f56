use crate::field::{Location, Occupancy};
use crate::species::Species;
use serde::{Deserialize, Serialize};

/// Stable handle for an actor; the field and roster refer to actors by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

/// Mutable state of a living animal.
#[derive(Debug, Clone)]
pub struct Animal {
    pub species: Species,
    pub gender: Gender,
    pub age: u32,
    pub food_level: f64,
    pub infected: bool,
}

/// Mutable state of a plant. Plants have no hunger, gender, or infection.
#[derive(Debug, Clone)]
pub struct Plant {
    pub age: u32,
}

#[derive(Debug, Clone)]
pub enum Body {
    Animal(Animal),
    Plant(Plant),
}

/// A living entity on the field.
///
/// Death is terminal: the alive flag drops, the location is unset, and
/// the simulation vacates the actor's field cell.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: ActorId,
    pub alive: bool,
    pub location: Option<Location>,
    pub body: Body,
}

impl Actor {
    pub fn animal(
        id: ActorId,
        species: Species,
        gender: Gender,
        location: Location,
        age: u32,
        food_level: f64,
        infected: bool,
    ) -> Self {
        Self {
            id,
            alive: true,
            location: Some(location),
            body: Body::Animal(Animal {
                species,
                gender,
                age,
                food_level,
                infected,
            }),
        }
    }

    /// A newborn animal: age zero, full food level, uninfected.
    pub fn newborn(
        id: ActorId,
        species: Species,
        gender: Gender,
        location: Location,
        start_food: f64,
    ) -> Self {
        Self::animal(id, species, gender, location, 0, start_food, false)
    }

    pub fn plant(id: ActorId, location: Location, age: u32) -> Self {
        Self {
            id,
            alive: true,
            location: Some(location),
            body: Body::Plant(Plant { age }),
        }
    }

    /// Animals exclude other exclusive occupants; plants share their cell.
    pub fn occupancy(&self) -> Occupancy {
        match self.body {
            Body::Animal(_) => Occupancy::Exclusive,
            Body::Plant(_) => Occupancy::Shared,
        }
    }

    /// Label used in population counts and snapshots.
    pub fn label(&self) -> &'static str {
        match &self.body {
            Body::Animal(animal) => animal.species.label(),
            Body::Plant(_) => "plant",
        }
    }

    pub fn as_animal(&self) -> Option<&Animal> {
        match &self.body {
            Body::Animal(animal) => Some(animal),
            Body::Plant(_) => None,
        }
    }

    pub fn as_animal_mut(&mut self) -> Option<&mut Animal> {
        match &mut self.body {
            Body::Animal(animal) => Some(animal),
            Body::Plant(_) => None,
        }
    }

    fn age(&self) -> u32 {
        match &self.body {
            Body::Animal(animal) => animal.age,
            Body::Plant(plant) => plant.age,
        }
    }

    /// Energy a predator gains by eating this actor: age times the base
    /// food value, evaluated at the time of death.
    pub fn food_value(&self, base: f64) -> f64 {
        self.age() as f64 * base
    }
}
