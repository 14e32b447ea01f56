use anyhow::{Context, Result};
use rand::prelude::*;
use rand_distr::weighted::WeightedIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weather conditions that modulate breeding and hunting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    Sunny,
    Rainy,
    Foggy,
    Snowy,
}

impl Weather {
    pub const ALL: [Weather; 4] = [Weather::Sunny, Weather::Rainy, Weather::Foggy, Weather::Snowy];

    pub fn label(&self) -> &'static str {
        match self {
            Weather::Sunny => "sunny",
            Weather::Rainy => "rainy",
            Weather::Foggy => "foggy",
            Weather::Snowy => "snowy",
        }
    }
}

/// Per-condition multipliers applied to breeding and hunting probabilities.
///
/// Conditions absent from the configuration default to a multiplier of 1.0.
pub struct WeatherTable {
    plant_breed: [f64; 4],
    animal_breed: [f64; 4],
    animal_hunt: [f64; 4],
}

fn build_row(entries: &BTreeMap<Weather, f64>) -> [f64; 4] {
    let mut row = [1.0; 4];
    for (i, weather) in Weather::ALL.iter().enumerate() {
        if let Some(&mult) = entries.get(weather) {
            row[i] = mult;
        }
    }
    row
}

impl WeatherTable {
    pub fn new(
        plant_breed: &BTreeMap<Weather, f64>,
        animal_breed: &BTreeMap<Weather, f64>,
        animal_hunt: &BTreeMap<Weather, f64>,
    ) -> Self {
        Self {
            plant_breed: build_row(plant_breed),
            animal_breed: build_row(animal_breed),
            animal_hunt: build_row(animal_hunt),
        }
    }

    pub fn plant_breed(&self, weather: Weather) -> f64 {
        self.plant_breed[weather as usize]
    }

    pub fn animal_breed(&self, weather: Weather) -> f64 {
        self.animal_breed[weather as usize]
    }

    pub fn animal_hunt(&self, weather: Weather) -> f64 {
        self.animal_hunt[weather as usize]
    }
}

/// Probability-weighted random draw over the weather conditions.
pub struct WeatherDraw {
    dist: WeightedIndex<f64>,
}

impl WeatherDraw {
    /// Build a draw from per-condition weights, which must sum to 1.0
    /// (validated by the configuration before reaching this point).
    pub fn new(weights: [f64; 4]) -> Result<Self> {
        let dist = WeightedIndex::new(weights).context("failed to build weather distribution")?;
        Ok(Self { dist })
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> Weather {
        Weather::ALL[self.dist.sample(rng)]
    }
}
