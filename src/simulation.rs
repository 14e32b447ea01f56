use crate::actor::{Actor, ActorId, Body, Gender};
use crate::config::Config;
use crate::field::{Field, Location};
use crate::species::{Prey, Species, SpeciesTable, SpeciesTraits};
use crate::stats::{FieldSnapshot, PopulationStats};
use crate::weather::{Weather, WeatherDraw, WeatherTable};
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use std::collections::HashMap;

/// Base probability that a predator eats prey it has found, before the
/// weather hunting multiplier is applied.
const EATING_PROBABILITY: f64 = 0.8;

/// Day/night phase of a tick, derived from tick parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Day,
    Night,
}

/// Outcome of a single tick.
#[derive(Debug, Clone)]
pub struct TickSummary {
    pub tick: u64,
    pub phase: Phase,
    pub weather: Weather,
    pub births: usize,
    pub deaths: usize,
    pub infected: usize,
}

/// The ecosystem state: field, actors, tick counter, and random source.
///
/// `step_once` is the only mutator of field and roster; the scheduler
/// guarantees it never runs concurrently with itself, so no locking is
/// needed inside the tick logic.
pub struct Simulation {
    cfg: Config,
    table: SpeciesTable,
    weather_table: WeatherTable,
    weather_draw: WeatherDraw,
    field: Field,
    actors: HashMap<ActorId, Actor>,
    roster: Vec<ActorId>,
    next_id: u64,
    tick: u64,
    weather: Weather,
    weather_override: Option<Weather>,
    rng: ChaCha12Rng,
}

impl Simulation {
    /// Create an empty simulation with an explicit random source.
    pub fn new(cfg: Config, rng: ChaCha12Rng) -> Result<Self> {
        cfg.validate().context("failed to validate config")?;

        let table = cfg.species_table();
        let weather_table = WeatherTable::new(
            &cfg.weather.plant_breed,
            &cfg.weather.animal_breed,
            &cfg.weather.animal_hunt,
        );
        let weather_draw = WeatherDraw::new(cfg.weather.weights.as_array())?;
        let field = Field::new(cfg.field.depth, cfg.field.width);

        Ok(Self {
            cfg,
            table,
            weather_table,
            weather_draw,
            field,
            actors: HashMap::new(),
            roster: Vec::new(),
            next_id: 0,
            tick: 0,
            weather: Weather::Sunny,
            weather_override: None,
            rng,
        })
    }

    /// Create a simulation with a deterministic seed, for tests and
    /// reproducible runs.
    pub fn from_seed(cfg: Config, seed: u64) -> Result<Self> {
        Self::new(cfg, ChaCha12Rng::seed_from_u64(seed))
    }

    /// Create a simulation seeded from OS entropy.
    pub fn from_os_rng(cfg: Config) -> Result<Self> {
        let rng = ChaCha12Rng::try_from_os_rng()?;
        Self::new(cfg, rng)
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn weather(&self) -> Weather {
        self.weather
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    /// Fix the weather for subsequent ticks, or `None` to draw it
    /// randomly each tick.
    pub fn set_weather_override(&mut self, weather: Option<Weather>) {
        self.weather_override = weather;
    }

    /// Clear the field and seed a fresh random population: per cell, an
    /// ordered chain of independent spawn draws places at most one animal
    /// (random age and food level), then an independent draw may add one
    /// plant. Returns the number of animals seeded infected.
    pub fn populate(&mut self) -> usize {
        self.field.clear_all();
        self.actors.clear();
        self.roster.clear();

        let mut infected_seeded = 0;
        let locations: Vec<Location> = self.field.locations().collect();
        for loc in locations {
            let mut spawned = None;
            for species in Species::ALL {
                if self.rng.random::<f64>() < self.table.traits(species).spawn_prob {
                    spawned = Some(species);
                    break;
                }
            }
            if let Some(species) = spawned {
                let traits = self.table.traits(species).clone();
                let age = self.rng.random_range(0..traits.max_age);
                let food_level = self.rng.random_range(1.0..traits.start_food.max(2.0));
                let infected = self.rng.random::<f64>() < self.cfg.disease.seed_prob;
                if infected {
                    infected_seeded += 1;
                }
                let gender = self.random_gender();
                let id = self.alloc_id();
                let actor = Actor::animal(id, species, gender, loc, age, food_level, infected);
                self.insert_actor(actor);
                self.roster.push(id);
            }
            if self.rng.random::<f64>() < self.cfg.plants.spawn_prob {
                let age = self.rng.random_range(0..self.cfg.plants.max_age);
                let id = self.alloc_id();
                self.insert_actor(Actor::plant(id, loc, age));
                self.roster.push(id);
            }
        }

        log::info!(
            "populated {} actors ({infected_seeded} infected)",
            self.roster.len()
        );
        infected_seeded
    }

    /// Return the simulation to tick zero with a fresh population.
    pub fn reset(&mut self) -> usize {
        self.tick = 0;
        self.weather = Weather::Sunny;
        self.populate()
    }

    /// Place a single animal, for scenario construction.
    pub fn spawn_animal(
        &mut self,
        species: Species,
        gender: Gender,
        loc: Location,
        age: u32,
        food_level: f64,
        infected: bool,
    ) -> ActorId {
        let id = self.alloc_id();
        self.insert_actor(Actor::animal(id, species, gender, loc, age, food_level, infected));
        self.roster.push(id);
        id
    }

    /// Place a single plant, for scenario construction.
    pub fn spawn_plant(&mut self, loc: Location, age: u32) -> ActorId {
        let id = self.alloc_id();
        self.insert_actor(Actor::plant(id, loc, age));
        self.roster.push(id);
        id
    }

    /// Advance the simulation by one tick.
    ///
    /// Every live actor acts once; newborns join the roster and the dead
    /// leave it only after the full pass, so the roster is never mutated
    /// mid-iteration. Breeding happens before feeding and movement within
    /// a day tick.
    pub fn step_once(&mut self) -> TickSummary {
        self.tick += 1;
        let phase = if self.tick % 2 == 1 {
            Phase::Day
        } else {
            Phase::Night
        };
        let weather = match self.weather_override {
            Some(weather) => weather,
            None => self.weather_draw.sample(&mut self.rng),
        };
        self.weather = weather;

        let mut births = Vec::new();
        let pass: Vec<ActorId> = self.roster.clone();
        for id in pass {
            if self.actors.get(&id).is_some_and(|actor| actor.alive) {
                self.act(id, phase, weather, &mut births);
            }
        }

        let deaths = self.actors.values().filter(|actor| !actor.alive).count();
        self.actors.retain(|_, actor| actor.alive);
        self.roster.retain(|id| self.actors.contains_key(id));
        // A newborn can die in the same pass it was born (eaten by a
        // later-acting predator); drop those before extending the roster.
        births.retain(|id| self.actors.contains_key(id));
        let newborn_count = births.len();
        self.roster.extend(births);

        let infected = self.infected_count();
        let summary = TickSummary {
            tick: self.tick,
            phase,
            weather,
            births: newborn_count,
            deaths,
            infected,
        };
        log::debug!(
            "tick {} ({:?}, {}): {} actors, {} births, {} deaths, {} infected",
            summary.tick,
            summary.phase,
            weather.label(),
            self.roster.len(),
            summary.births,
            summary.deaths,
            summary.infected,
        );
        summary
    }

    pub fn population(&self) -> PopulationStats {
        PopulationStats::survey(&self.field, &self.actors)
    }

    /// True iff more than one species other than plants currently has
    /// living members.
    pub fn is_viable(&self) -> bool {
        self.population().is_viable()
    }

    pub fn snapshot(&self) -> FieldSnapshot {
        FieldSnapshot::capture(
            self.tick,
            self.weather,
            self.infected_count(),
            &self.field,
            &self.actors,
        )
    }

    fn infected_count(&self) -> usize {
        self.actors
            .values()
            .filter(|actor| actor.alive)
            .filter_map(|actor| actor.as_animal())
            .filter(|animal| animal.infected)
            .count()
    }

    fn alloc_id(&mut self) -> ActorId {
        self.next_id += 1;
        ActorId(self.next_id)
    }

    fn random_gender(&mut self) -> Gender {
        if self.rng.random::<bool>() {
            Gender::Male
        } else {
            Gender::Female
        }
    }

    /// Record the actor in the map and its field layer; roster membership
    /// is the caller's concern (newborns join only after the pass).
    fn insert_actor(&mut self, actor: Actor) {
        if let Some(loc) = actor.location {
            self.field.place(actor.id, actor.occupancy(), loc);
        }
        self.actors.insert(actor.id, actor);
    }

    fn set_dead(&mut self, id: ActorId) {
        let Some(actor) = self.actors.get_mut(&id) else {
            return;
        };
        if !actor.alive {
            return;
        }
        actor.alive = false;
        let occupancy = actor.occupancy();
        if let Some(loc) = actor.location.take() {
            self.field.vacate(loc, occupancy);
        }
    }

    fn move_actor(&mut self, id: ActorId, dest: Location) {
        let Some(actor) = self.actors.get_mut(&id) else {
            return;
        };
        let occupancy = actor.occupancy();
        if let Some(old) = actor.location.replace(dest) {
            self.field.vacate(old, occupancy);
        }
        self.field.place(id, occupancy, dest);
    }

    fn act(&mut self, id: ActorId, phase: Phase, weather: Weather, births: &mut Vec<ActorId>) {
        let Some(actor) = self.actors.get(&id) else {
            return;
        };
        match (&actor.body, phase) {
            (Body::Animal(animal), Phase::Day) => {
                let species = animal.species;
                self.animal_day(id, species, weather, births);
            }
            (Body::Animal(animal), Phase::Night) => {
                let species = animal.species;
                self.animal_night(id, species, weather, births);
            }
            (Body::Plant(_), Phase::Day) => self.plant_day(id, weather, births),
            (Body::Plant(_), Phase::Night) => self.plant_night(id, weather, births),
        }
    }

    fn animal_day(
        &mut self,
        id: ActorId,
        species: Species,
        weather: Weather,
        births: &mut Vec<ActorId>,
    ) {
        let traits = self.table.traits(species).clone();

        let died = {
            let Some(animal) = self.actors.get_mut(&id).and_then(Actor::as_animal_mut) else {
                return;
            };
            animal.age += 1;
            animal.food_level -= 1.0;
            animal.age > traits.max_age || animal.food_level <= 0.0
        };
        if died {
            self.set_dead(id);
            return;
        }

        // Disease-death roll, independent per tick.
        if self.rng.random::<f64>() < traits.disease_death_prob {
            self.set_dead(id);
            return;
        }

        self.give_birth(id, species, &traits, weather, births);

        let food_cell = self.find_food(id, &traits, weather);
        let dest = match food_cell {
            Some(loc) => Some(loc),
            None => self
                .actors
                .get(&id)
                .and_then(|actor| actor.location)
                .and_then(|loc| self.field.free_adjacent_location(loc, &mut self.rng)),
        };
        match dest {
            Some(loc) => self.move_actor(id, loc),
            // Overcrowding.
            None => self.set_dead(id),
        }
    }

    fn animal_night(
        &mut self,
        id: ActorId,
        species: Species,
        weather: Weather,
        births: &mut Vec<ActorId>,
    ) {
        let traits = self.table.traits(species).clone();

        if self.rng.random::<f64>() < traits.disease_death_prob {
            self.set_dead(id);
            return;
        }

        // Prey species that strike back hunt their predators at night
        // instead of sleeping.
        if let Some(prob) = traits.night_attack_prob {
            self.night_attack(id, species, prob);
            return;
        }

        if traits.breeds_at_night {
            self.give_birth(id, species, &traits, weather, births);
        }

        let infected = self
            .actors
            .get(&id)
            .and_then(Actor::as_animal)
            .is_some_and(|animal| animal.infected);
        if infected && self.rng.random::<f64>() < self.cfg.disease.cure_prob {
            if let Some(animal) = self.actors.get_mut(&id).and_then(Actor::as_animal_mut) {
                animal.infected = false;
            }
        } else if infected {
            self.spread_infection(id);
        }
    }

    /// Shared breeding algorithm: requires breeding age and an adjacent
    /// live partner of the same species and opposite gender, then a
    /// single weather-modulated draw for the whole litter.
    fn give_birth(
        &mut self,
        id: ActorId,
        species: Species,
        traits: &SpeciesTraits,
        weather: Weather,
        births: &mut Vec<ActorId>,
    ) {
        let Some((loc, my_gender, age)) = self.actors.get(&id).and_then(|actor| {
            let loc = actor.location?;
            let animal = actor.as_animal()?;
            Some((loc, animal.gender, animal.age))
        }) else {
            return;
        };
        if age < traits.breeding_age {
            return;
        }

        let mut partner = false;
        for adjacent in self.field.adjacent_locations(loc, &mut self.rng) {
            let Some(other) = self
                .field
                .exclusive_at(adjacent)
                .and_then(|oid| self.actors.get(&oid))
            else {
                continue;
            };
            if !other.alive {
                continue;
            }
            if let Some(animal) = other.as_animal() {
                if animal.species == species && animal.gender != my_gender {
                    partner = true;
                    break;
                }
            }
        }
        if !partner {
            return;
        }

        let mult = self.weather_table.animal_breed(weather);
        if self.rng.random::<f64>() >= traits.breeding_prob * mult {
            return;
        }

        let litter = self.rng.random_range(1..=traits.max_litter);
        let free = self.field.free_adjacent_locations(loc, &mut self.rng);
        for birth_loc in free.into_iter().take(litter as usize) {
            let gender = self.random_gender();
            let young_id = self.alloc_id();
            let young = Actor::newborn(young_id, species, gender, birth_loc, traits.start_food);
            self.insert_actor(young);
            births.push(young_id);
        }
    }

    /// Scan adjacent cells in random order for the first live prey and
    /// try to eat it. Returns the prey's cell on success so the predator
    /// can move into it.
    fn find_food(
        &mut self,
        id: ActorId,
        traits: &SpeciesTraits,
        weather: Weather,
    ) -> Option<Location> {
        let loc = self.actors.get(&id).and_then(|actor| actor.location)?;
        let hunt_mult = self.weather_table.animal_hunt(weather);

        for adjacent in self.field.adjacent_locations(loc, &mut self.rng) {
            let Some(prey_id) = self.field.occupant_at(adjacent) else {
                continue;
            };
            let Some(prey) = self.actors.get(&prey_id) else {
                continue;
            };
            if !prey.alive {
                continue;
            }
            let edible = match &prey.body {
                Body::Animal(animal) => traits.prey.contains(&Prey::from(animal.species)),
                Body::Plant(_) => traits.prey.contains(&Prey::Plants),
            };
            if !edible {
                continue;
            }
            if self.rng.random::<f64>() >= EATING_PROBABILITY * hunt_mult {
                continue;
            }

            let base = match &prey.body {
                Body::Animal(animal) => self.table.traits(animal.species).food_value,
                Body::Plant(_) => self.cfg.plants.food_value,
            };
            let gain = prey.food_value(base);
            let prey_infected = prey.as_animal().is_some_and(|animal| animal.infected);
            self.set_dead(prey_id);

            let transfer = prey_infected && self.rng.random::<f64>() < self.cfg.disease.spread_prob;
            if let Some(animal) = self.actors.get_mut(&id).and_then(Actor::as_animal_mut) {
                animal.food_level += gain;
                if transfer {
                    animal.infected = true;
                }
            }
            return Some(adjacent);
        }
        None
    }

    /// Night counterattack: the first adjacent member of this species'
    /// predator set is killed with a small fixed probability, and the
    /// attacker moves into the vacated cell.
    fn night_attack(&mut self, id: ActorId, species: Species, prob: f64) {
        let Some(loc) = self.actors.get(&id).and_then(|actor| actor.location) else {
            return;
        };
        let predators = self.table.predators(species).to_vec();

        for adjacent in self.field.adjacent_locations(loc, &mut self.rng) {
            let Some(other_id) = self.field.exclusive_at(adjacent) else {
                continue;
            };
            let Some(other) = self.actors.get(&other_id) else {
                continue;
            };
            if !other.alive {
                continue;
            }
            let is_predator = other
                .as_animal()
                .is_some_and(|animal| predators.contains(&animal.species));
            if !is_predator {
                continue;
            }
            if self.rng.random::<f64>() < prob {
                self.set_dead(other_id);
                self.move_actor(id, adjacent);
            }
            return;
        }
    }

    /// Infection spreads from an infected animal to each adjacent animal
    /// independently. The roll must fall *below* the spread probability —
    /// spread is rare by convention, pinned by tests.
    fn spread_infection(&mut self, id: ActorId) {
        let Some(loc) = self.actors.get(&id).and_then(|actor| actor.location) else {
            return;
        };
        let spread_prob = self.cfg.disease.spread_prob;

        for adjacent in self.field.adjacent_locations(loc, &mut self.rng) {
            let Some(other_id) = self.field.exclusive_at(adjacent) else {
                continue;
            };
            if self.rng.random::<f64>() >= spread_prob {
                continue;
            }
            if let Some(animal) = self
                .actors
                .get_mut(&other_id)
                .filter(|actor| actor.alive)
                .and_then(Actor::as_animal_mut)
            {
                animal.infected = true;
            }
        }
    }

    fn plant_day(&mut self, id: ActorId, weather: Weather, births: &mut Vec<ActorId>) {
        let died = {
            let Some(actor) = self.actors.get_mut(&id) else {
                return;
            };
            let Body::Plant(plant) = &mut actor.body else {
                return;
            };
            plant.age += 1;
            plant.age > self.cfg.plants.max_age
        };
        if died {
            self.set_dead(id);
            return;
        }
        self.plant_breed(id, weather, Phase::Day, births);
    }

    fn plant_night(&mut self, id: ActorId, weather: Weather, births: &mut Vec<ActorId>) {
        self.plant_breed(id, weather, Phase::Night, births);
    }

    /// Plant breeding: same probability draw as animals but without a
    /// partner requirement, steeply penalized at night, and never seeding
    /// a cell that already holds a plant.
    fn plant_breed(&mut self, id: ActorId, weather: Weather, phase: Phase, births: &mut Vec<ActorId>) {
        let Some(loc) = self.actors.get(&id).and_then(|actor| actor.location) else {
            return;
        };

        let mut prob = self.cfg.plants.breeding_prob * self.weather_table.plant_breed(weather);
        if phase == Phase::Night {
            prob /= self.cfg.plants.night_divisor;
        }
        if self.rng.random::<f64>() >= prob {
            return;
        }

        let litter = self.rng.random_range(1..=self.cfg.plants.max_litter);
        let mut seeded = 0;
        for free_loc in self.field.free_adjacent_locations(loc, &mut self.rng) {
            if seeded == litter {
                break;
            }
            if self.field.shared_at(free_loc).is_some() {
                continue;
            }
            let young_id = self.alloc_id();
            self.insert_actor(Actor::plant(young_id, free_loc, 0));
            births.push(young_id);
            seeded += 1;
        }
    }
}
