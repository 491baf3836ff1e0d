//! Integration tests for TERRARIUM

use tempfile::tempdir;
use terrarium::agents::{Agent, AgentKind, Plant, PlantKind, PlantSpecies};
use terrarium::atmosphere::{EnvironmentalStatus, Gas, GasPool};
use terrarium::checkpoint::Checkpoint;
use terrarium::environment::Conditions;
use terrarium::habitat::Point;
use terrarium::{Config, World};

fn empty_config() -> Config {
    let mut config = Config::default();
    config.population.initial_trees = 0;
    config.population.initial_grass = 0;
    config.population.initial_herbivores = 0;
    config.population.initial_carnivores = 0;
    config
}

fn small_config() -> Config {
    let mut config = Config::default();
    config.population.initial_trees = 6;
    config.population.initial_grass = 60;
    config.population.initial_herbivores = 12;
    config.population.initial_carnivores = 4;
    config
}

#[test]
fn test_single_tree_production() {
    let species = PlantSpecies {
        layer_height: 0.0,
        ..PlantSpecies::tree()
    };
    let mut tree = Plant::with_biomass(
        terrarium::agents::AgentId::new(0, 0),
        PlantKind::Tree,
        species,
        Point::new(10.0, 10.0),
        10.0,
        0.0,
    );
    let conditions = Conditions::fixed(20.0, 1.0);

    assert!((species.respiration(10.0, 20.0) - 0.0072).abs() < 1e-12);
    assert!((species.gross_photosynthesis(10.0, 1.0) - 0.108).abs() < 1e-12);
    assert!((tree.net_production(&conditions) - 0.1008).abs() < 1e-12);

    tree.update(1.0, &conditions);
    assert!((tree.body.biomass() - 10.1008).abs() < 1e-12);
}

#[test]
fn test_empty_atmosphere_never_changes() {
    let mut config = empty_config();
    config.atmosphere.ocean_sink_per_day = 0.0;
    let initial = GasPool::new(&config.atmosphere.initial).percentages();

    let mut world = World::new_with_seed(config, 7);
    assert_eq!(world.ledger.registered_count(), 0);
    world.run(500);

    assert_eq!(world.ledger.percentages(), initial);
    assert_eq!(world.ledger.status(), EnvironmentalStatus::Healthy);
}

#[test]
fn test_starving_carnivore_disappears() {
    let mut world = World::new_with_seed(empty_config(), 8);
    let id = world.spawn_manual(AgentKind::Carnivore, Some(Point::new(30.0, 30.0)));
    if let Some(carnivore) = world.agents.get_mut(id).and_then(Agent::as_carnivore_mut) {
        carnivore.set_hunger(0.0);
        carnivore.body.set_biomass(10.0);
    }

    let mut steps = 0;
    while world.agents.get(id).is_some() && steps < 2000 {
        world.step();
        steps += 1;
    }

    assert!(world.agents.get(id).is_none(), "carnivore still alive after {} steps", steps);
    assert!(!world.ledger.is_registered(id));
    assert_eq!(world.population(AgentKind::Carnivore), 0);
    assert_eq!(
        world.nearest_living(AgentKind::Carnivore, Point::new(30.0, 30.0), 500.0),
        None
    );
}

#[test]
fn test_status_follows_current_oxygen() {
    let mut config = empty_config();
    config.atmosphere.ocean_sink_per_day = 0.0;
    let mut world = World::new_with_seed(config, 9);
    assert_eq!(world.ledger.status(), EnvironmentalStatus::Healthy);

    // 59 500 mol O2 of ~854 000 total is just under 7%
    world.ledger.add_spike(-150_000.0, Gas::Oxygen);
    world.step();
    assert_eq!(world.ledger.status(), EnvironmentalStatus::Critical);

    // ~17.6%: between danger and warning
    world.ledger.add_spike(110_000.0, Gas::Oxygen);
    world.step();
    assert_eq!(world.ledger.status(), EnvironmentalStatus::Warning);

    world.ledger.add_spike(40_000.0, Gas::Oxygen);
    world.step();
    assert_eq!(world.ledger.status(), EnvironmentalStatus::Healthy);
    assert_eq!(world.ledger.status_changes(), 3);
}

#[test]
fn test_inert_gases_untouched() {
    let mut world = World::new_with_seed(small_config(), 10);
    let nitrogen = world.ledger.moles(Gas::Nitrogen);
    let argon = world.ledger.moles(Gas::Argon);

    world.run(400);
    let tree = world.spawn_manual(AgentKind::Tree, None);
    world.burn_plant(tree);
    assert!(!world.ledger.add_spike(100.0, Gas::Nitrogen));
    world.run(10);

    assert_eq!(world.ledger.moles(Gas::Nitrogen), nitrogen);
    assert_eq!(world.ledger.moles(Gas::Argon), argon);
}

#[test]
fn test_percentages_consistent_with_moles() {
    let mut world = World::new_with_seed(small_config(), 11);
    world.run(300);

    let pool = world.ledger.pool();
    let sum: f64 = Gas::ALL.iter().map(|&gas| pool.moles(gas)).sum();
    assert!((world.ledger.total_moles() - sum).abs() < 1e-6);
    assert!((world.ledger.percentages().sum() - 100.0).abs() < 1e-9);
    assert!(pool.oxygen() >= 0.0);
    assert!(pool.carbon_dioxide() >= 0.0);
}

#[test]
fn test_registry_matches_living_agents() {
    let mut world = World::new_with_seed(small_config(), 12);
    for _ in 0..10 {
        world.run(50);
        assert_eq!(world.ledger.registered_count(), world.total_population());
        for (id, agent) in world.agents.iter() {
            assert!(agent.is_alive());
            assert!(world.ledger.is_registered(id));
        }
    }
}

#[test]
fn test_unregister_twice_is_harmless() {
    let mut world = World::new_with_seed(empty_config(), 13);
    let id = world.spawn_manual(AgentKind::Grass, None);
    assert!(world.ledger.unregister(id));
    assert!(!world.ledger.unregister(id));
    assert_eq!(world.ledger.registered_count(), 0);
}

#[test]
fn test_biomass_stays_in_bounds() {
    let mut world = World::new_with_seed(small_config(), 14);
    world.run(600);

    for (_, agent) in world.agents.iter() {
        let body = agent.body();
        assert!(body.biomass() >= body.min_biomass());
        assert!(body.biomass() <= body.max_biomass());
        if let Some(carnivore) = agent.as_carnivore() {
            assert!(carnivore.hunger() >= 0.0);
            assert!(carnivore.hunger() <= carnivore.config.max_hunger);
        }
        assert!(world.habitat().is_habitable(agent.position()));
    }
}

#[test]
fn test_checkpoint_persistence() {
    let mut world = World::new_with_seed(small_config(), 54321);
    world.run(100);

    let checkpoint = world.create_checkpoint();
    let dir = tempdir().unwrap();
    let temp_path = dir.path().join("checkpoint.bin");
    checkpoint.save(&temp_path).expect("Failed to save checkpoint");

    let loaded = Checkpoint::load(&temp_path).expect("Failed to load checkpoint");
    assert_eq!(loaded.time, world.time);
    assert_eq!(loaded.agents.len(), world.agents.len());
    assert_eq!(loaded.random_seed, world.seed());

    let mut restored = World::from_checkpoint(loaded);
    assert_eq!(restored.time, world.time);
    assert_eq!(restored.total_population(), world.total_population());
    assert_eq!(restored.ledger.pool(), world.ledger.pool());
    assert_eq!(restored.clock.day(), world.clock.day());

    restored.run(100);
    assert_eq!(restored.time, 200);
    assert_eq!(restored.ledger.registered_count(), restored.total_population());
}

#[test]
fn test_reproducibility() {
    let config = small_config();
    let mut world1 = World::new_with_seed(config.clone(), 99999);
    let mut world2 = World::new_with_seed(config, 99999);

    world1.run(300);
    world2.run(300);

    assert_eq!(world1.time, world2.time);
    for kind in AgentKind::ALL {
        assert_eq!(world1.population(kind), world2.population(kind));
    }
    assert_eq!(world1.ledger.pool(), world2.ledger.pool());
    let positions = |world: &World| -> Vec<Point> {
        world.agents.iter().map(|(_, agent)| agent.position()).collect()
    };
    assert_eq!(positions(&world1), positions(&world2));
}

#[test]
fn test_day_night_drives_plant_exchange() {
    let mut config = empty_config();
    config.population.initial_trees = 10;
    let mut world = World::new_with_seed(config, 15);

    let cycle = world.clock.config().cycle_length;
    let steps_per_day = (cycle / world.config.simulation.tick_seconds) as u64;
    let mut saw_production = false;
    let mut saw_respiration_only = false;
    world.run_with_callback(steps_per_day, |world, _| {
        let rates = world.rates();
        if world.clock.photosynthetic_efficiency() > 0.5 && rates.plants_o2 > 0.0 {
            saw_production = true;
        }
        if world.clock.photosynthetic_efficiency() == 0.0 && rates.plants_o2 < 0.0 {
            saw_respiration_only = true;
        }
    });

    assert!(saw_production);
    assert!(saw_respiration_only);
}

#[test]
fn test_stats_tracking() {
    let mut config = small_config();
    config.logging.stats_interval = 10;

    let mut world = World::new_with_seed(config, 33333);
    world.run(100);

    assert_eq!(world.stats.time, 100);
    assert_eq!(world.stats.total_population(), world.total_population());

    // Steps 10, 20, ... 100
    assert_eq!(world.stats_history.snapshots.len(), 11);
    let series = world.stats_history.oxygen_series();
    assert!(series.iter().all(|&(_, o2)| o2 > 0.0 && o2 < 100.0));
}
