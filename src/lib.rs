//! A discrete-time, grid-based multi-species ecosystem simulation.
//!
//! Actors (plants and five animal species) occupy cells of a 2-D field,
//! age, hunt, breed, sicken, and die under day/night and weather
//! modifiers; a pausable scheduler advances the simulation at a
//! controllable cadence.

pub mod actor;
pub mod config;
pub mod controller;
pub mod field;
pub mod scheduler;
pub mod simulation;
pub mod species;
pub mod stats;
pub mod weather;

pub use actor::{Actor, ActorId, Gender};
pub use config::Config;
pub use controller::SimulationController;
pub use field::{Field, Location, Occupancy};
pub use scheduler::{Scheduler, SchedulerState};
pub use simulation::{Phase, Simulation, TickSummary};
pub use species::{Prey, Species, SpeciesTable, SpeciesTraits};
pub use stats::{FieldSnapshot, PopulationStats};
pub use weather::{Weather, WeatherTable};
