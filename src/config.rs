use crate::species::{Prey, Species, SpeciesTable, SpeciesTraits};
use crate::weather::Weather;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use; the [`Default`]
/// implementation carries a complete, balanced parameter set so the
/// library is usable without a file. See [`Config::from_file`].
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    pub field: FieldConfig,
    pub weather: WeatherConfig,
    pub plants: PlantConfig,
    pub disease: DiseaseConfig,
    pub species: SpeciesSection,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Number of rows.
    pub depth: usize,
    /// Number of columns.
    pub width: usize,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Weights of the per-tick random weather draw; must sum to 1.0.
    pub weights: WeatherWeights,
    /// Breeding multipliers for plants, by condition.
    #[serde(default)]
    pub plant_breed: BTreeMap<Weather, f64>,
    /// Breeding multipliers for animals, by condition.
    #[serde(default)]
    pub animal_breed: BTreeMap<Weather, f64>,
    /// Hunting multipliers for animals, by condition.
    #[serde(default)]
    pub animal_hunt: BTreeMap<Weather, f64>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct WeatherWeights {
    pub sunny: f64,
    pub rainy: f64,
    pub foggy: f64,
    pub snowy: f64,
}

impl WeatherWeights {
    /// Weights ordered as [`Weather::ALL`].
    pub fn as_array(&self) -> [f64; 4] {
        [self.sunny, self.rainy, self.foggy, self.snowy]
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PlantConfig {
    /// Probability that a cell holds a plant at population time,
    /// independent of the animal spawn draws.
    pub spawn_prob: f64,
    /// Per-tick breeding probability by day, before weather modulation.
    pub breeding_prob: f64,
    /// Maximum seedlings per successful breeding draw.
    pub max_litter: u32,
    /// Age beyond which the plant dies.
    pub max_age: u32,
    /// Energy transferred to a grazer, per unit of the plant's age.
    pub food_value: f64,
    /// Divisor applied to the breeding probability at night.
    pub night_divisor: f64,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct DiseaseConfig {
    /// Probability that an animal starts out infected at population time.
    pub seed_prob: f64,
    /// Probability that infection passes to each adjacent animal per night
    /// tick, and to a predator eating infected prey.
    pub spread_prob: f64,
    /// Per-night probability that an infected animal is cured.
    pub cure_prob: f64,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SpeciesSection {
    pub human: SpeciesTraits,
    pub dodo: SpeciesTraits,
    pub monkey: SpeciesTraits,
    pub pig: SpeciesTraits,
    pub tortoise: SpeciesTraits,
}

impl SpeciesSection {
    pub fn get(&self, species: Species) -> &SpeciesTraits {
        match species {
            Species::Human => &self.human,
            Species::Dodo => &self.dodo,
            Species::Monkey => &self.monkey,
            Species::Pig => &self.pig,
            Species::Tortoise => &self.tortoise,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            field: FieldConfig {
                depth: 100,
                width: 150,
            },
            weather: WeatherConfig {
                weights: WeatherWeights {
                    sunny: 0.4,
                    rainy: 0.3,
                    foggy: 0.2,
                    snowy: 0.1,
                },
                plant_breed: BTreeMap::from([
                    (Weather::Sunny, 1.5),
                    (Weather::Rainy, 1.25),
                    (Weather::Snowy, 0.5),
                ]),
                animal_breed: BTreeMap::new(),
                animal_hunt: BTreeMap::from([(Weather::Foggy, 0.5)]),
            },
            plants: PlantConfig {
                spawn_prob: 0.2,
                breeding_prob: 0.4,
                max_litter: 2,
                max_age: 10,
                food_value: 1.5,
                night_divisor: 10.0,
            },
            disease: DiseaseConfig {
                seed_prob: 0.05,
                spread_prob: 0.1,
                cure_prob: 0.05,
            },
            species: SpeciesSection {
                human: SpeciesTraits {
                    spawn_prob: 0.05,
                    breeding_age: 15,
                    breeding_prob: 0.1,
                    max_litter: 3,
                    max_age: 60,
                    food_value: 0.4,
                    start_food: 20.0,
                    disease_death_prob: 0.02,
                    prey: vec![Prey::Pig, Prey::Dodo],
                    night_attack_prob: None,
                    breeds_at_night: false,
                },
                dodo: SpeciesTraits {
                    spawn_prob: 0.02,
                    breeding_age: 30,
                    breeding_prob: 0.03,
                    max_litter: 2,
                    max_age: 60,
                    food_value: 0.6,
                    start_food: 20.0,
                    disease_death_prob: 0.04,
                    prey: vec![Prey::Plants],
                    night_attack_prob: Some(0.05),
                    breeds_at_night: false,
                },
                monkey: SpeciesTraits {
                    spawn_prob: 0.05,
                    breeding_age: 6,
                    breeding_prob: 0.6,
                    max_litter: 4,
                    max_age: 50,
                    food_value: 0.5,
                    start_food: 20.0,
                    disease_death_prob: 0.05,
                    prey: vec![Prey::Dodo],
                    night_attack_prob: None,
                    breeds_at_night: false,
                },
                pig: SpeciesTraits {
                    spawn_prob: 0.05,
                    breeding_age: 5,
                    breeding_prob: 0.11,
                    max_litter: 9,
                    max_age: 40,
                    food_value: 0.7,
                    start_food: 20.0,
                    disease_death_prob: 0.03,
                    prey: vec![Prey::Plants],
                    night_attack_prob: None,
                    breeds_at_night: false,
                },
                tortoise: SpeciesTraits {
                    spawn_prob: 0.02,
                    breeding_age: 10,
                    breeding_prob: 0.2,
                    max_litter: 5,
                    max_age: 90,
                    food_value: 0.3,
                    start_food: 20.0,
                    disease_death_prob: 0.01,
                    prey: vec![Prey::Plants],
                    night_attack_prob: None,
                    breeds_at_night: false,
                },
            },
        }
    }
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized, or if
    /// the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    /// Build the immutable species table from the configured records.
    pub fn species_table(&self) -> SpeciesTable {
        SpeciesTable::new(Species::ALL.map(|species| self.species.get(species).clone()))
    }

    pub fn validate(&self) -> Result<()> {
        check_num(self.field.depth, 1..10_000).context("invalid field depth")?;
        check_num(self.field.width, 1..10_000).context("invalid field width")?;

        let weights = self.weather.weights.as_array();
        check_prob_vec(&weights).context("invalid weather weights")?;
        for table in [
            &self.weather.plant_breed,
            &self.weather.animal_breed,
            &self.weather.animal_hunt,
        ] {
            for (weather, &mult) in table {
                check_num(mult, 0.0..100.0)
                    .with_context(|| format!("invalid multiplier for {}", weather.label()))?;
            }
        }

        check_num(self.plants.spawn_prob, 0.0..=1.0).context("invalid plant spawn probability")?;
        check_num(self.plants.breeding_prob, 0.0..=1.0)
            .context("invalid plant breeding probability")?;
        check_num(self.plants.max_litter, 1..100).context("invalid plant litter size")?;
        check_num(self.plants.max_age, 1..10_000).context("invalid plant max age")?;
        check_num(self.plants.food_value, 0.0..1_000.0).context("invalid plant food value")?;
        check_num(self.plants.night_divisor, 1.0..1_000.0)
            .context("invalid plant night divisor")?;

        check_num(self.disease.seed_prob, 0.0..=1.0).context("invalid disease seed probability")?;
        check_num(self.disease.spread_prob, 0.0..=1.0)
            .context("invalid disease spread probability")?;
        check_num(self.disease.cure_prob, 0.0..=1.0).context("invalid disease cure probability")?;

        let mut spawn_total = 0.0;
        for species in Species::ALL {
            let traits = self.species.get(species);
            check_traits(traits)
                .with_context(|| format!("invalid traits for {}", species.label()))?;
            spawn_total += traits.spawn_prob;
        }
        if spawn_total > 1.0 {
            bail!("species spawn probabilities must sum to at most 1.0, but sum to {spawn_total}");
        }

        Ok(())
    }
}

fn check_traits(traits: &SpeciesTraits) -> Result<()> {
    check_num(traits.spawn_prob, 0.0..=1.0).context("invalid spawn probability")?;
    check_num(traits.breeding_prob, 0.0..=1.0).context("invalid breeding probability")?;
    check_num(traits.max_litter, 1..100).context("invalid litter size")?;
    check_num(traits.max_age, 1..10_000).context("invalid max age")?;
    check_num(traits.breeding_age, 0..10_000).context("invalid breeding age")?;
    check_num(traits.food_value, 0.0..1_000.0).context("invalid food value")?;
    check_num(traits.start_food, 0.0..1_000_000.0).context("invalid starting food level")?;
    check_num(traits.disease_death_prob, 0.0..=1.0).context("invalid disease death probability")?;
    if let Some(prob) = traits.night_attack_prob {
        check_num(prob, 0.0..=1.0).context("invalid night attack probability")?;
    }
    Ok(())
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

fn check_prob_vec(vec: &[f64]) -> Result<()> {
    // Non-negative elements summing to ~1.0.
    if vec.iter().any(|&ele| ele < 0.0) {
        bail!("vector must have only non-negative elements");
    }
    let sum: f64 = vec.iter().sum();
    let tol = 1e-8;
    if (sum - 1.0).abs() > tol {
        bail!("vector must sum to 1.0 (tolerance: {tol}), but sums to {sum}");
    }
    Ok(())
}
