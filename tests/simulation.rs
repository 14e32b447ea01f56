use mauritia::{Actor, Config, Gender, Location, Simulation, Species, Weather};

/// A configuration where nothing happens by chance: no disease, no
/// breeding, no plant growth. Scenarios re-enable exactly what they test.
fn quiet_config(depth: usize, width: usize) -> Config {
    let mut cfg = Config::default();
    cfg.field.depth = depth;
    cfg.field.width = width;
    for traits in [
        &mut cfg.species.human,
        &mut cfg.species.dodo,
        &mut cfg.species.monkey,
        &mut cfg.species.pig,
        &mut cfg.species.tortoise,
    ] {
        traits.disease_death_prob = 0.0;
        traits.breeding_prob = 0.0;
        traits.night_attack_prob = None;
    }
    cfg.plants.breeding_prob = 0.0;
    cfg.disease.spread_prob = 0.0;
    cfg.disease.cure_prob = 0.0;
    cfg
}

#[test]
fn human_hunts_pig_on_a_three_by_three_field() {
    // Run the scenario under many seeds: whatever the feeding draw does,
    // the outcome must be one of the two allowed ones.
    for seed in 0..32 {
        let mut sim = Simulation::from_seed(quiet_config(3, 3), seed).unwrap();
        sim.set_weather_override(Some(Weather::Sunny));

        let human = sim.spawn_animal(
            Species::Human,
            Gender::Male,
            Location::new(1, 1),
            20,
            10.0,
            false,
        );
        let pig = sim.spawn_animal(
            Species::Pig,
            Gender::Female,
            Location::new(1, 2),
            10,
            50.0,
            false,
        );
        let pig_value = 10.0 * sim.config().species.pig.food_value;

        sim.step_once(); // day tick

        let human_food = sim
            .actor(human)
            .and_then(Actor::as_animal)
            .map(|animal| animal.food_level)
            .expect("human survives: a free adjacent cell always exists on 3x3");

        if sim.actor(pig).is_none() {
            // Feeding succeeded: the pig's food value at death, minus the
            // tick's hunger, lands on the human exactly.
            assert_eq!(human_food, 10.0 - 1.0 + pig_value);
        } else {
            assert_eq!(human_food, 10.0 - 1.0);
        }
    }
}

#[test]
fn surrounded_animal_dies_of_overcrowding() {
    let mut sim = Simulation::from_seed(quiet_config(3, 3), 7).unwrap();
    sim.set_weather_override(Some(Weather::Sunny));

    // Tortoises are not on the human's menu, so no cell can be freed by
    // feeding and there is nowhere to move.
    let human = sim.spawn_animal(
        Species::Human,
        Gender::Male,
        Location::new(1, 1),
        20,
        100.0,
        false,
    );
    for row in 0..3 {
        for col in 0..3 {
            if (row, col) != (1, 1) {
                sim.spawn_animal(
                    Species::Tortoise,
                    Gender::Female,
                    Location::new(row, col),
                    20,
                    100.0,
                    false,
                );
            }
        }
    }

    sim.step_once();
    assert!(sim.actor(human).is_none());
}

#[test]
fn no_birth_among_same_gender_neighbours() {
    let mut cfg = quiet_config(5, 5);
    cfg.species.human.breeding_prob = 1.0;
    cfg.species.human.breeding_age = 1;
    let mut sim = Simulation::from_seed(cfg, 13).unwrap();
    sim.set_weather_override(Some(Weather::Sunny));

    for col in 0..3 {
        sim.spawn_animal(
            Species::Human,
            Gender::Female,
            Location::new(2, col),
            20,
            1_000.0,
            false,
        );
    }

    for _ in 0..20 {
        sim.step_once();
        assert_eq!(sim.population().count("human"), 3);
    }
}

#[test]
fn opposite_gender_neighbours_breed_with_certainty() {
    let mut cfg = quiet_config(5, 5);
    cfg.species.human.breeding_prob = 1.0;
    cfg.species.human.breeding_age = 1;
    let mut sim = Simulation::from_seed(cfg, 17).unwrap();
    sim.set_weather_override(Some(Weather::Sunny));

    sim.spawn_animal(
        Species::Human,
        Gender::Female,
        Location::new(2, 2),
        20,
        1_000.0,
        false,
    );
    sim.spawn_animal(
        Species::Human,
        Gender::Male,
        Location::new(2, 3),
        20,
        1_000.0,
        false,
    );

    let summary = sim.step_once(); // day tick: both draws succeed at probability 1
    assert!(summary.births > 0);
    assert!(sim.population().count("human") > 2);
}

#[test]
fn viability_requires_two_animal_species() {
    let mut sim = Simulation::from_seed(quiet_config(5, 5), 3).unwrap();

    sim.spawn_plant(Location::new(0, 0), 2);
    sim.spawn_plant(Location::new(0, 1), 2);
    sim.spawn_animal(
        Species::Pig,
        Gender::Male,
        Location::new(2, 2),
        5,
        50.0,
        false,
    );
    assert!(!sim.is_viable());

    sim.spawn_animal(
        Species::Dodo,
        Gender::Female,
        Location::new(4, 4),
        5,
        50.0,
        false,
    );
    assert!(sim.is_viable());
}

#[test]
fn infection_spreads_when_the_roll_falls_below_the_probability() {
    // spread_prob = 1.0: every roll falls below it, so one night tick
    // must infect every neighbour. This pins the direction of the
    // spread predicate.
    let mut cfg = quiet_config(2, 2);
    cfg.disease.spread_prob = 1.0;
    let mut sim = Simulation::from_seed(cfg, 29).unwrap();
    sim.set_weather_override(Some(Weather::Sunny));

    let carrier = sim.spawn_animal(
        Species::Pig,
        Gender::Male,
        Location::new(0, 0),
        5,
        100.0,
        true,
    );
    let healthy = sim.spawn_animal(
        Species::Pig,
        Gender::Female,
        Location::new(0, 1),
        5,
        100.0,
        false,
    );

    sim.step_once(); // day: pigs only wander, every 2x2 cell stays adjacent
    sim.step_once(); // night: infection spreads

    let infected = |id| {
        sim.actor(id)
            .and_then(Actor::as_animal)
            .is_some_and(|animal| animal.infected)
    };
    assert!(infected(carrier));
    assert!(infected(healthy));
}

#[test]
fn infection_never_spreads_at_probability_zero() {
    let mut sim = Simulation::from_seed(quiet_config(2, 2), 31).unwrap();
    sim.set_weather_override(Some(Weather::Sunny));

    sim.spawn_animal(
        Species::Pig,
        Gender::Male,
        Location::new(0, 0),
        5,
        100.0,
        true,
    );
    let healthy = sim.spawn_animal(
        Species::Pig,
        Gender::Female,
        Location::new(0, 1),
        5,
        100.0,
        false,
    );

    for _ in 0..10 {
        sim.step_once();
    }
    let still_healthy = sim
        .actor(healthy)
        .and_then(Actor::as_animal)
        .is_some_and(|animal| !animal.infected);
    assert!(still_healthy);
}

#[test]
fn dodo_strikes_back_at_night_with_certainty() {
    let mut cfg = quiet_config(3, 3);
    cfg.species.dodo.night_attack_prob = Some(1.0);
    // Zero the hunting multiplier so the monkey can never eat the dodo
    // by day; the only lethal interaction left is the night attack.
    cfg.weather.animal_hunt.insert(Weather::Foggy, 0.0);
    cfg.species.dodo.max_age = 9_999;
    cfg.species.monkey.max_age = 9_999;
    let mut sim = Simulation::from_seed(cfg, 41).unwrap();
    sim.set_weather_override(Some(Weather::Foggy));

    sim.spawn_animal(
        Species::Dodo,
        Gender::Male,
        Location::new(1, 1),
        1,
        1_000_000.0 - 1.0,
        false,
    );
    // Monkeys prey on dodos, so the monkey is in the dodo's predator set.
    let monkey = sim.spawn_animal(
        Species::Monkey,
        Gender::Female,
        Location::new(1, 2),
        1,
        1_000_000.0 - 1.0,
        false,
    );

    // With certain attack probability the monkey dies on the first night
    // tick the two spend adjacent; on a 3x3 field that happens fast.
    let mut monkey_died = false;
    for _ in 0..400 {
        sim.step_once();
        if sim.actor(monkey).is_none() {
            monkey_died = true;
            break;
        }
    }
    assert!(monkey_died);
}

#[test]
fn field_and_actors_stay_consistent_over_a_populated_run() {
    let mut cfg = Config::default();
    cfg.field.depth = 20;
    cfg.field.width = 20;
    let mut sim = Simulation::from_seed(cfg, 1234).unwrap();

    sim.populate();
    for _ in 0..10 {
        sim.step_once();
    }

    for actor in sim.actors() {
        assert!(actor.alive, "dead actors must be removed after the tick");
        let loc = actor
            .location
            .expect("a live actor always has a location");
        let recorded = match actor.occupancy() {
            mauritia::Occupancy::Exclusive => sim.field().exclusive_at(loc),
            mauritia::Occupancy::Shared => sim.field().shared_at(loc),
        };
        assert_eq!(recorded, Some(actor.id), "actor and field disagree");
    }
}

#[test]
fn snapshot_round_trips_through_messagepack() {
    use mauritia::FieldSnapshot;
    use std::path::PathBuf;

    let mut cfg = Config::default();
    cfg.field.depth = 15;
    cfg.field.width = 15;
    let mut sim = Simulation::from_seed(cfg, 99).unwrap();
    sim.populate();
    for _ in 0..4 {
        sim.step_once();
    }

    let live_population = sim.population();
    let snapshot = sim.snapshot();
    assert_eq!(snapshot.population(), live_population);
    assert_eq!(snapshot.is_viable(), live_population.is_viable());

    let file = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("snapshot_round_trip.msgpack");
    snapshot.save(&file).unwrap();
    let restored = FieldSnapshot::load(&file).unwrap();

    assert_eq!(restored, snapshot);
    assert_eq!(restored.population(), live_population);
    assert_eq!(restored.is_viable(), live_population.is_viable());
    std::fs::remove_file(&file).ok();
}
