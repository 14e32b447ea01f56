use crate::config::Config;
use crate::scheduler::Scheduler;
use crate::simulation::Simulation;
use crate::stats::{FieldSnapshot, PopulationStats};
use crate::weather::Weather;
use anyhow::{Context, Result, bail};
use std::sync::{Arc, Mutex, atomic::{AtomicUsize, Ordering}};
use std::time::Duration;

/// Tick delays selectable via `speed_up`/`slow_down`, slowest first.
const DELAY_STEPS_MS: [u64; 6] = [1000, 500, 250, 120, 60, 30];
const DEFAULT_DELAY_IDX: usize = 4;

/// Orchestrates the simulation and its scheduler.
///
/// The simulation lives behind a mutex shared with the scheduler worker;
/// every control call here is safe from any thread and takes effect no
/// later than the start of the next tick.
pub struct SimulationController {
    sim: Arc<Mutex<Simulation>>,
    scheduler: Scheduler,
    delay_idx: AtomicUsize,
}

impl SimulationController {
    /// Build a controller with a freshly populated simulation.
    pub fn new(cfg: Config, seed: Option<u64>) -> Result<Self> {
        let mut sim = match seed {
            Some(seed) => Simulation::from_seed(cfg, seed),
            None => Simulation::from_os_rng(cfg),
        }
        .context("failed to construct simulation")?;
        sim.populate();

        Ok(Self {
            sim: Arc::new(Mutex::new(sim)),
            scheduler: Scheduler::new(),
            delay_idx: AtomicUsize::new(DEFAULT_DELAY_IDX),
        })
    }

    fn delay(&self) -> Duration {
        Duration::from_millis(DELAY_STEPS_MS[self.delay_idx.load(Ordering::Relaxed)])
    }

    /// Run the simulation for `total_ticks` further ticks on the
    /// scheduler cadence, stopping early if the population ceases to be
    /// viable.
    pub fn run(&self, total_ticks: u64) -> Result<()> {
        let target = self.sim.lock().unwrap().tick() + total_ticks;

        let worker_sim = Arc::clone(&self.sim);
        self.scheduler.start(
            move || {
                let mut sim = worker_sim.lock().unwrap();
                if !sim.is_viable() {
                    log::warn!("population is no longer viable, stopping");
                    return false;
                }
                let summary = sim.step_once();
                summary.tick < target
            },
            self.delay(),
        )
    }

    pub fn pause(&self) {
        self.scheduler.pause();
    }

    pub fn resume(&self) {
        self.scheduler.resume();
    }

    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }

    /// Block until the current run finishes or the scheduler shuts down.
    pub fn wait(&self) {
        self.scheduler.wait_idle();
    }

    /// Advance exactly one tick, only while paused or stopped.
    pub fn force_one_step(&self) -> Result<()> {
        self.scheduler
            .step_once_now()
            .context("cannot force a step")
    }

    /// Repopulate the field at tick zero. Rejected while running.
    pub fn reset(&self) -> Result<()> {
        if self.scheduler.is_running() {
            bail!("cannot reset while the scheduler is running; pause it first");
        }
        let mut sim = self.sim.lock().unwrap();
        sim.reset();
        Ok(())
    }

    pub fn speed_up(&self) {
        let idx = self.delay_idx.load(Ordering::Relaxed);
        if idx + 1 < DELAY_STEPS_MS.len() {
            self.delay_idx.store(idx + 1, Ordering::Relaxed);
        }
        self.scheduler.set_interval(self.delay());
    }

    pub fn slow_down(&self) {
        let idx = self.delay_idx.load(Ordering::Relaxed);
        if idx > 0 {
            self.delay_idx.store(idx - 1, Ordering::Relaxed);
        }
        self.scheduler.set_interval(self.delay());
    }

    /// Fix the weather for subsequent ticks, or `None` for a random draw
    /// each tick.
    pub fn set_weather_override(&self, weather: Option<Weather>) {
        self.sim.lock().unwrap().set_weather_override(weather);
    }

    pub fn tick(&self) -> u64 {
        self.sim.lock().unwrap().tick()
    }

    pub fn population(&self) -> PopulationStats {
        self.sim.lock().unwrap().population()
    }

    pub fn is_viable(&self) -> bool {
        self.sim.lock().unwrap().is_viable()
    }

    pub fn field_snapshot(&self) -> FieldSnapshot {
        self.sim.lock().unwrap().snapshot()
    }
}
