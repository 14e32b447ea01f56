use mauritia::{Config, SimulationController, Weather};
use std::thread;
use std::time::Duration;

/// A population that cannot collapse for the duration of a test: two
/// well-fed, long-lived, disease-free species that only wander.
fn stable_config() -> Config {
    let mut cfg = Config::default();
    cfg.field.depth = 40;
    cfg.field.width = 40;
    cfg.plants.spawn_prob = 0.2;
    cfg.plants.breeding_prob = 0.0;
    cfg.disease.seed_prob = 0.0;
    cfg.disease.spread_prob = 0.0;
    for traits in [
        &mut cfg.species.human,
        &mut cfg.species.dodo,
        &mut cfg.species.monkey,
        &mut cfg.species.pig,
        &mut cfg.species.tortoise,
    ] {
        traits.spawn_prob = 0.0;
        traits.breeding_prob = 0.0;
        traits.disease_death_prob = 0.0;
        traits.night_attack_prob = None;
        traits.start_food = 10_000.0;
        traits.max_age = 9_999;
    }
    cfg.species.human.spawn_prob = 0.1;
    cfg.species.tortoise.spawn_prob = 0.1;
    cfg
}

#[test]
fn pause_freezes_the_tick_counter() {
    let controller = SimulationController::new(stable_config(), Some(4242)).unwrap();
    for _ in 0..4 {
        controller.speed_up();
    }
    controller.run(1_000_000).unwrap();

    thread::sleep(Duration::from_millis(300));
    controller.pause();
    // An in-flight tick may still land; sample after it settles.
    thread::sleep(Duration::from_millis(50));
    let frozen = controller.tick();
    assert!(frozen > 0, "scheduler never advanced the simulation");

    thread::sleep(Duration::from_millis(500));
    assert_eq!(controller.tick(), frozen);

    controller.resume();
    thread::sleep(Duration::from_millis(300));
    assert!(controller.tick() > frozen);

    controller.shutdown();
}

#[test]
fn force_one_step_works_only_while_paused() {
    let controller = SimulationController::new(stable_config(), Some(7)).unwrap();
    controller.run(1_000_000).unwrap();
    assert!(controller.force_one_step().is_err());

    controller.pause();
    thread::sleep(Duration::from_millis(100));
    let before = controller.tick();
    controller.force_one_step().unwrap();
    assert_eq!(controller.tick(), before + 1);

    controller.shutdown();
}

#[test]
fn reset_is_rejected_while_running() {
    let controller = SimulationController::new(stable_config(), Some(11)).unwrap();
    controller.run(1_000_000).unwrap();
    assert!(controller.reset().is_err());

    controller.pause();
    thread::sleep(Duration::from_millis(100));
    controller.reset().unwrap();
    assert_eq!(controller.tick(), 0);
    assert!(controller.is_viable());

    controller.shutdown();
}

#[test]
fn weather_override_takes_effect_by_the_next_tick() {
    let controller = SimulationController::new(stable_config(), Some(23)).unwrap();
    controller.set_weather_override(Some(Weather::Snowy));

    controller.run(1_000_000).unwrap();
    thread::sleep(Duration::from_millis(150));
    controller.pause();
    thread::sleep(Duration::from_millis(50));
    controller.force_one_step().unwrap();

    assert_eq!(controller.field_snapshot().weather, Weather::Snowy);
    controller.shutdown();
}

#[test]
fn run_stops_at_the_requested_tick() {
    let controller = SimulationController::new(stable_config(), Some(31)).unwrap();
    for _ in 0..5 {
        controller.speed_up(); // clamp at the fastest cadence
    }
    controller.run(6).unwrap();
    controller.wait();

    assert_eq!(controller.tick(), 6);
    assert!(controller.population().count("human") > 0);
    controller.shutdown();
}

#[test]
fn speed_controls_survive_the_extremes() {
    let controller = SimulationController::new(stable_config(), Some(3)).unwrap();
    controller.run(1_000_000).unwrap();

    // Walking past both ends of the delay ladder must clamp, not panic.
    for _ in 0..10 {
        controller.speed_up();
    }
    for _ in 0..10 {
        controller.slow_down();
    }
    thread::sleep(Duration::from_millis(50));
    controller.shutdown();
}
