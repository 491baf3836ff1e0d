//! World simulation engine - main simulation loop.
//!
//! Owns every service (clock, ledger, habitat, controllers) and hands them to
//! agents by reference each step. Nothing is global.

use crate::agents::{
    Agent, AgentArena, AgentId, AgentKind, CarnivoreActivity, CarnivoreSenses, DeathCause,
    HerbivoreSenses, Sex,
};
use crate::atmosphere::{GasLedger, RateBreakdown};
use crate::checkpoint::Checkpoint;
use crate::config::Config;
use crate::environment::{Conditions, EnvironmentClock};
use crate::habitat::{Habitat, IslandHabitat, Point};
use crate::population::{
    count_living, Birth, BreedingController, Nursery, PairingOutcome, ReproductionController,
    ReproductionTrigger, RespawnQueue, ScheduledEffect, Scheduler,
};
use crate::spatial::SpatialIndex;
use crate::stats::{Stats, StatsHistory};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// The simulation world
pub struct World {
    // Agents
    pub agents: AgentArena,

    // Services
    pub clock: EnvironmentClock,
    pub ledger: GasLedger,
    habitat: Box<dyn Habitat>,
    spatial_index: SpatialIndex,

    // Population controllers
    pub respawn: RespawnQueue,
    pub scheduler: Scheduler,
    reproduction: ReproductionController,
    breeding: BreedingController,

    // State
    pub time: u64,
    /// Simulated seconds since start
    pub elapsed: f64,

    // Configuration
    pub config: Config,

    // Statistics
    pub stats: Stats,
    pub stats_history: StatsHistory,

    // Random number generator (seeded for reproducibility)
    rng: ChaCha8Rng,
    seed: u64,

    births_this_step: usize,
    deaths_this_step: usize,
}

impl World {
    /// Create a new world with the given configuration
    pub fn new(config: Config) -> Self {
        let seed = rand::thread_rng().gen();
        Self::new_with_seed(config, seed)
    }

    /// Create a new world with a specific seed for reproducibility
    pub fn new_with_seed(config: Config, seed: u64) -> Self {
        let habitat = Box::new(IslandHabitat::new(&config.habitat));
        Self::with_habitat(config, habitat, seed)
    }

    /// Create a world on a custom habitat
    pub fn with_habitat(config: Config, habitat: Box<dyn Habitat>, seed: u64) -> Self {
        let config = config.sanitized();
        let clock = EnvironmentClock::new(&config.clock);
        let ledger = GasLedger::new(
            &config.atmosphere,
            clock.config().cycle_length,
            config.simulation.speed_multiplier,
        );

        let mut world = Self::assemble(config, habitat, clock, ledger, AgentArena::new(), seed);
        world.populate();
        world.update_spatial_index();
        world.update_stats();

        log::info!(
            "World created (seed {}): {} trees, {} grass, {} herbivores, {} carnivores",
            seed,
            world.stats.trees,
            world.stats.grass,
            world.stats.herbivores,
            world.stats.carnivores
        );
        world
    }

    fn assemble(
        config: Config,
        habitat: Box<dyn Habitat>,
        clock: EnvironmentClock,
        ledger: GasLedger,
        agents: AgentArena,
        seed: u64,
    ) -> Self {
        let spatial_index = SpatialIndex::new(
            config.habitat.width,
            config.habitat.height,
            config.simulation.spatial_cell_size,
        );
        let stats_history = StatsHistory::new(config.logging.stats_interval);

        Self {
            agents,
            clock,
            ledger,
            habitat,
            spatial_index,
            respawn: RespawnQueue::new(),
            scheduler: Scheduler::new(),
            reproduction: ReproductionController,
            breeding: BreedingController::new(),
            time: 0,
            elapsed: 0.0,
            config,
            stats: Stats::new(),
            stats_history,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            births_this_step: 0,
            deaths_this_step: 0,
        }
    }

    /// Spawn the initial population at random habitable points
    fn populate(&mut self) {
        let population = self.config.population.clone();
        let mut nursery = self.nursery();

        let plan = [
            (AgentKind::Tree, population.initial_trees),
            (AgentKind::Grass, population.initial_grass),
            (AgentKind::Herbivore, population.initial_herbivores),
            (AgentKind::Carnivore, population.initial_carnivores),
        ];
        for (kind, count) in plan {
            for i in 0..count {
                let position = nursery.habitat.random_habitable_point(&mut *nursery.rng);
                let mut birth = Birth::new(kind, position);
                if kind == AgentKind::Carnivore {
                    // Alternate so both sexes exist from the start
                    birth = birth.with_sex(if i % 2 == 0 { Sex::Female } else { Sex::Male });
                }
                nursery.spawn(birth);
            }
        }
    }

    /// Restore world from checkpoint
    pub fn from_checkpoint(checkpoint: Checkpoint) -> Self {
        let config = checkpoint.config.sanitized();
        let habitat = Box::new(IslandHabitat::new(&config.habitat));
        let clock = EnvironmentClock::restore(&config.clock, checkpoint.day, checkpoint.time01);
        let ledger = GasLedger::from_pool(
            checkpoint.gas,
            &config.atmosphere,
            clock.config().cycle_length,
            config.simulation.speed_multiplier,
        );

        let mut world = Self::assemble(
            config,
            habitat,
            clock,
            ledger,
            checkpoint.agents,
            checkpoint.random_seed,
        );
        world.time = checkpoint.time;
        world.elapsed = checkpoint.elapsed;
        world.respawn = checkpoint.respawn;
        world.scheduler = checkpoint.scheduler;
        // Continue a fresh stream rather than replaying the one from step 0
        world.rng = ChaCha8Rng::seed_from_u64(checkpoint.random_seed ^ checkpoint.time);

        for (id, agent) in world.agents.iter() {
            if agent.is_alive() {
                world.ledger.register(id);
            }
        }

        world.update_spatial_index();
        world.update_stats();
        log::info!(
            "World restored at step {} (day {}, {})",
            world.time,
            world.clock.day(),
            world.clock.clock_string()
        );
        world
    }

    /// Create checkpoint of current state
    pub fn create_checkpoint(&self) -> Checkpoint {
        Checkpoint::new(
            self.time,
            self.elapsed,
            self.config.clone(),
            self.clock.day(),
            self.clock.time01(),
            self.ledger.pool().clone(),
            self.agents.clone(),
            self.respawn.clone(),
            self.scheduler.clone(),
            self.stats.clone(),
            self.seed,
        )
    }

    fn nursery(&mut self) -> Nursery<'_> {
        Nursery {
            agents: &mut self.agents,
            ledger: &mut self.ledger,
            habitat: self.habitat.as_ref(),
            rng: &mut self.rng,
            config: &self.config,
            now: self.elapsed,
            births: 0,
        }
    }

    /// Main simulation step
    pub fn step(&mut self) {
        self.births_this_step = 0;
        self.deaths_this_step = 0;
        let dt = self.config.simulation.tick_seconds;

        // Phase 1: Advance the clock
        let new_days = self.clock.update(dt);
        self.elapsed += dt;
        let conditions = self.clock.conditions();

        // Phase 2: Parallel metabolism (each agent sees only itself)
        let starved = self.agents.par_update(|agent| {
            agent
                .update_metabolism(dt, &conditions)
                .map(|cause| (agent.id(), agent.kind(), cause))
        });
        for (id, kind, cause) in starved {
            log::debug!("{} {} died: {:?}", kind.name(), id, cause);
        }

        // Phase 3: Behaviour (sequential, shares the world RNG)
        self.update_herbivores(dt);
        self.update_carnivores(dt, &conditions);

        // Phase 4: Remove dead agents
        self.remove_dead();

        // Phase 5: Gas exchange
        self.ledger.tick(dt, &self.agents, &conditions);

        // Phase 6: Population controllers
        self.update_population(new_days);

        // Phase 7: Update spatial index
        self.update_spatial_index();

        self.time += 1;

        // Phase 8: Update statistics
        self.update_stats();
    }

    fn update_herbivores(&mut self, dt: f64) {
        for id in self.agents.ids() {
            let Some(herbivore) = self.agents.get(id).and_then(Agent::as_herbivore) else {
                continue;
            };
            if !herbivore.body.is_alive() {
                continue;
            }
            let position = herbivore.body.position;
            let cfg = herbivore.config;

            let threat = self
                .nearest_living_where(&[AgentKind::Carnivore], position, cfg.flee_radius, |agent| {
                    agent
                        .as_carnivore()
                        .is_some_and(|c| c.activity == CarnivoreActivity::Hunting)
                })
                .and_then(|cid| self.agents.get(cid))
                .map(Agent::position);

            // A plant on its floor yields nothing when grazed
            let edible = |plant: &Agent| {
                plant.biomass() > cfg.min_plant_biomass.max(plant.body().min_biomass())
            };

            let mut food = None;
            let mut stale = false;
            if let Some(target) = herbivore.target {
                match self
                    .agents
                    .get(target)
                    .filter(|&plant| plant.is_alive() && edible(plant))
                {
                    Some(plant) => food = Some(plant.position()),
                    None => stale = true,
                }
            }

            let search = food.is_none() && (herbivore.search_due() || stale);
            let found = if search && herbivore.is_hungry() {
                self.nearest_living_where(
                    &[AgentKind::Grass, AgentKind::Tree],
                    position,
                    cfg.search_radius,
                    edible,
                )
                .and_then(|pid| self.agents.get(pid).map(|plant| (pid, plant.position())))
            } else {
                None
            };

            let bite = {
                let herbivore = self.agents.get_mut(id).and_then(Agent::as_herbivore_mut);
                let Some(herbivore) = herbivore else {
                    continue;
                };
                if stale {
                    log::debug!("herbivore {} lost its food target; searching again", id);
                    herbivore.lose_target();
                }
                if search {
                    herbivore.reset_search();
                    if let Some((pid, at)) = found {
                        herbivore.target = Some(pid);
                        food = Some(at);
                    }
                }
                let senses = HerbivoreSenses {
                    threat,
                    target: food,
                };
                herbivore.act(dt, &senses, self.habitat.as_ref(), &mut self.rng)
            };

            if let Some(plant_id) = bite {
                let taken = self
                    .agents
                    .get_mut(plant_id)
                    .and_then(Agent::as_plant_mut)
                    .map(|plant| plant.graze(cfg.eating_amount))
                    .unwrap_or(0.0);

                if let Some(herbivore) = self.agents.get_mut(id).and_then(Agent::as_herbivore_mut) {
                    if taken > 0.0 {
                        herbivore.eat(taken);
                    } else {
                        herbivore.lose_target();
                    }
                }
            }
        }
    }

    fn update_carnivores(&mut self, dt: f64, conditions: &Conditions) {
        for id in self.agents.ids() {
            let Some(carnivore) = self.agents.get(id).and_then(Agent::as_carnivore) else {
                continue;
            };
            if !carnivore.body.is_alive() {
                continue;
            }
            let position = carnivore.body.position;
            let cfg = carnivore.config;

            let mut prey = None;
            let mut stale = false;
            if let Some(target) = carnivore.target {
                match self.agents.get(target).filter(|h| h.is_alive()) {
                    Some(h) => prey = Some(h.position()),
                    None => stale = true,
                }
            }

            let search = prey.is_none() && (carnivore.search_due() || stale);
            let found = if search && carnivore.wants_to_hunt() {
                self.nearest_living(AgentKind::Herbivore, position, cfg.search_radius)
                    .and_then(|hid| self.agents.get(hid).map(|h| (hid, h.position())))
            } else {
                None
            };
            let mate = self.breeding.seek_target(id, &self.agents);

            let kill = {
                let carnivore = self.agents.get_mut(id).and_then(Agent::as_carnivore_mut);
                let Some(carnivore) = carnivore else {
                    continue;
                };
                if stale {
                    log::debug!("carnivore {} lost its prey; searching again", id);
                    carnivore.lose_target();
                }
                if search {
                    carnivore.reset_search();
                    if let Some((hid, at)) = found {
                        carnivore.target = Some(hid);
                        prey = Some(at);
                    }
                }
                let senses = CarnivoreSenses { prey, mate };
                carnivore.act(dt, conditions, &senses, self.habitat.as_ref(), &mut self.rng)
            };

            if let Some(prey_id) = kill {
                // Re-check immediately before eating; another carnivore may have got there first
                let eaten = self
                    .agents
                    .get_mut(prey_id)
                    .filter(|agent| agent.is_alive())
                    .and_then(|agent| {
                        let biomass = agent.biomass();
                        agent
                            .as_herbivore_mut()
                            .map(|h| h.body.kill(DeathCause::Predation))
                            .map(|_| biomass)
                    });

                let carnivore = self.agents.get_mut(id).and_then(Agent::as_carnivore_mut);
                let Some(carnivore) = carnivore else {
                    continue;
                };
                match eaten {
                    Some(biomass) => {
                        carnivore.eat_prey(biomass);
                        log::debug!(
                            "carnivore {} ate herbivore {} ({:.2} kg)",
                            id,
                            prey_id,
                            biomass
                        );
                        self.scheduler.schedule(
                            self.elapsed + self.config.population.reproduction_delay,
                            ScheduledEffect::Reproduce(AgentKind::Herbivore),
                        );
                    }
                    None => carnivore.lose_target(),
                }
            }
        }
    }

    /// Unregister and destroy everything that died this step
    fn remove_dead(&mut self) {
        let dead: Vec<(AgentId, AgentKind, Option<DeathCause>)> = self
            .agents
            .iter()
            .filter(|(_, agent)| !agent.is_alive())
            .map(|(id, agent)| (id, agent.kind(), agent.body().death_cause()))
            .collect();

        for (id, kind, cause) in dead {
            self.ledger.unregister(id);
            if kind == AgentKind::Grass {
                self.respawn.notify(crate::agents::PlantKind::Grass);
            }
            if self.agents.remove(id).is_some() {
                self.deaths_this_step += 1;
                log::debug!("Removed dead {} {} ({:?})", kind.name(), id, cause);
            }
        }
    }

    fn update_population(&mut self, new_days: u32) {
        let due = self.scheduler.take_due(self.elapsed);
        let reproduction = self.reproduction;

        let mut nursery = Nursery {
            agents: &mut self.agents,
            ledger: &mut self.ledger,
            habitat: self.habitat.as_ref(),
            rng: &mut self.rng,
            config: &self.config,
            now: self.elapsed,
            births: 0,
        };

        for effect in due {
            match effect {
                ScheduledEffect::Reproduce(kind) => {
                    reproduction.reproduce(kind, ReproductionTrigger::Automatic, &mut nursery);
                }
            }
        }

        self.respawn.drain_one(&mut nursery);

        if new_days > 0 {
            self.breeding.begin_day(&mut nursery);
        }
        if let PairingOutcome::Bred(child) = self.breeding.update(&mut nursery) {
            log::debug!("Breeding produced carnivore {}", child);
        }

        self.births_this_step += nursery.births;
    }

    /// Update spatial index
    fn update_spatial_index(&mut self) {
        self.spatial_index.clear();
        for (id, agent) in self.agents.iter() {
            if agent.is_alive() {
                self.spatial_index.insert(agent.position(), id, agent.kind());
            }
        }
    }

    /// Update statistics
    fn update_stats(&mut self) {
        self.stats.time = self.time;
        self.stats.elapsed = self.elapsed;
        self.stats.births = self.births_this_step;
        self.stats.deaths = self.deaths_this_step;
        self.stats.respawn_backlog = self.respawn.len();
        self.stats.update(&self.agents, &self.ledger, &self.clock);

        // Record history
        if self.time % self.config.logging.stats_interval.max(1) == 0 {
            self.stats_history.record(self.stats.clone());
        }
    }

    /// Run simulation for specified number of steps
    pub fn run(&mut self, steps: u64) {
        for _ in 0..steps {
            self.step();
        }
    }

    /// Run simulation with callback for progress updates
    pub fn run_with_callback<F>(&mut self, steps: u64, mut callback: F)
    where
        F: FnMut(&World, u64),
    {
        for i in 0..steps {
            self.step();
            callback(self, i);
        }
    }

    /// Nearest living agent of `kind` within `radius`
    pub fn nearest_living(&self, kind: AgentKind, point: Point, radius: f64) -> Option<AgentId> {
        self.nearest_living_where(&[kind], point, radius, |_| true)
    }

    fn nearest_living_where<F>(
        &self,
        kinds: &[AgentKind],
        point: Point,
        radius: f64,
        filter: F,
    ) -> Option<AgentId>
    where
        F: Fn(&Agent) -> bool,
    {
        kinds
            .iter()
            .flat_map(|&kind| self.spatial_index.query_radius(point, radius, kind))
            .filter_map(|id| {
                self.agents
                    .get(id)
                    .filter(|agent| agent.is_alive() && filter(agent))
                    .map(|agent| (id, agent.position().distance(point)))
            })
            .filter(|&(_, distance)| distance <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(id, _)| id)
    }

    /// Burn a living plant. Returns the moles of CO2 released.
    pub fn burn_plant(&mut self, id: AgentId) -> Option<f64> {
        let plant = self.agents.get_mut(id).and_then(Agent::as_plant_mut)?;
        if !plant.body.is_alive() {
            return None;
        }
        let biomass = plant.body.biomass();
        plant.body.kill(DeathCause::Burned);

        let moles = biomass * self.config.atmosphere.combustion_co2_per_kg;
        self.ledger.add_co2_spike(moles);
        log::info!("{:?} {} burnt: {:.1} mol CO2 released", plant.kind, id, moles);
        Some(moles)
    }

    /// Spawn an agent on request, ignoring population caps.
    ///
    /// `None` picks a random habitable point.
    pub fn spawn_manual(&mut self, kind: AgentKind, at: Option<Point>) -> AgentId {
        let mut nursery = self.nursery();
        let position = match at {
            Some(point) => point,
            None => nursery.habitat.random_habitable_point(&mut *nursery.rng),
        };
        let id = nursery.spawn(Birth::new(kind, position));
        self.births_this_step += 1;
        self.update_spatial_index();
        id
    }

    /// Run the reproduction controller on request, ignoring population caps
    pub fn trigger_reproduction(&mut self, kind: AgentKind) -> Option<AgentId> {
        let reproduction = self.reproduction;
        let mut nursery = self.nursery();
        let child = reproduction.reproduce(kind, ReproductionTrigger::Manual, &mut nursery);
        if child.is_some() {
            self.births_this_step += 1;
            self.update_spatial_index();
        }
        child
    }

    /// Current living population of one kind
    pub fn population(&self, kind: AgentKind) -> usize {
        count_living(&self.agents, kind)
    }

    pub fn total_population(&self) -> usize {
        AgentKind::ALL.iter().map(|&kind| self.population(kind)).sum()
    }

    /// No animals left
    pub fn is_extinct(&self) -> bool {
        self.population(AgentKind::Herbivore) == 0 && self.population(AgentKind::Carnivore) == 0
    }

    /// Instantaneous rates of the last tick
    pub fn rates(&self) -> RateBreakdown {
        self.ledger.last_rates()
    }

    pub fn habitat(&self) -> &dyn Habitat {
        self.habitat.as_ref()
    }

    /// Active breeding pairing, if any
    pub fn pairing(&self) -> Option<crate::population::Pairing> {
        self.breeding.pairing()
    }

    /// Get seed for reproducibility
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atmosphere::Gas;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.population.initial_trees = 5;
        config.population.initial_grass = 40;
        config.population.initial_herbivores = 10;
        config.population.initial_carnivores = 2;
        config
    }

    fn empty_config() -> Config {
        let mut config = Config::default();
        config.population.initial_trees = 0;
        config.population.initial_grass = 0;
        config.population.initial_herbivores = 0;
        config.population.initial_carnivores = 0;
        config
    }

    #[test]
    fn test_world_creation() {
        let config = test_config();
        let world = World::new(config);

        assert_eq!(world.population(AgentKind::Grass), 40);
        assert_eq!(world.population(AgentKind::Carnivore), 2);
        assert_eq!(world.ledger.registered_count(), world.total_population());
        assert_eq!(world.time, 0);
    }

    #[test]
    fn test_world_step() {
        let mut world = World::new_with_seed(test_config(), 1);
        world.step();

        assert_eq!(world.time, 1);
        assert!((world.elapsed - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_world_run() {
        let mut world = World::new_with_seed(test_config(), 2);
        world.run(100);

        assert_eq!(world.time, 100);
        assert_eq!(world.ledger.registered_count(), world.total_population());
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let mut world = World::new_with_seed(test_config(), 12345);
        world.run(50);

        let checkpoint = world.create_checkpoint();
        let restored = World::from_checkpoint(checkpoint);

        assert_eq!(restored.time, world.time);
        assert_eq!(restored.total_population(), world.total_population());
        assert_eq!(restored.ledger.registered_count(), world.total_population());
        assert_eq!(restored.ledger.pool(), world.ledger.pool());
        assert_eq!(restored.ledger.status(), world.ledger.status());
        assert_eq!(restored.clock.day(), world.clock.day());
        assert_eq!(restored.seed(), world.seed());
    }

    #[test]
    fn test_reproducibility() {
        let config = test_config();
        let mut world1 = World::new_with_seed(config.clone(), 42);
        let mut world2 = World::new_with_seed(config, 42);

        world1.run(200);
        world2.run(200);

        for kind in AgentKind::ALL {
            assert_eq!(world1.population(kind), world2.population(kind));
        }
        assert_eq!(world1.ledger.pool(), world2.ledger.pool());
    }

    #[test]
    fn test_burn_plant_spikes_co2() {
        let mut world = World::new_with_seed(empty_config(), 3);
        let tree = world.spawn_manual(AgentKind::Tree, Some(Point::new(20.0, 20.0)));
        let biomass = world.agents.get(tree).map(Agent::biomass).unwrap_or(0.0);
        let before = world.ledger.moles(Gas::CarbonDioxide);

        let released = world.burn_plant(tree);
        assert_eq!(released, Some(biomass * 37.5));
        assert!((world.ledger.moles(Gas::CarbonDioxide) - before - biomass * 37.5).abs() < 1e-9);

        // Already dead
        assert_eq!(world.burn_plant(tree), None);
        world.step();
        assert!(world.agents.get(tree).is_none());
        assert!(!world.ledger.is_registered(tree));
    }

    #[test]
    fn test_manual_spawn_bypasses_cap() {
        let mut config = empty_config();
        config.population.herbivore_cap = 1;
        let mut world = World::new_with_seed(config, 4);
        world.spawn_manual(AgentKind::Herbivore, None);
        world.spawn_manual(AgentKind::Herbivore, None);
        assert_eq!(world.population(AgentKind::Herbivore), 2);

        assert!(world.trigger_reproduction(AgentKind::Herbivore).is_some());
        assert_eq!(world.population(AgentKind::Herbivore), 3);
    }

    #[test]
    fn test_grass_death_feeds_respawn() {
        let mut world = World::new_with_seed(empty_config(), 5);
        let grass = world.spawn_manual(AgentKind::Grass, Some(Point::new(30.0, 30.0)));
        if let Some(agent) = world.agents.get_mut(grass) {
            agent.body_mut().kill(DeathCause::Grazed);
        }

        world.step();
        // Died, queued and respawned in the same step
        assert!(world.agents.get(grass).is_none());
        assert_eq!(world.population(AgentKind::Grass), 1);
        assert!(world.respawn.is_empty());
    }

    fn carnivore_mut(world: &mut World, id: AgentId) -> Option<&mut crate::agents::Carnivore> {
        world.agents.get_mut(id).and_then(Agent::as_carnivore_mut)
    }

    #[test]
    fn test_carnivore_searches_again_when_prey_taken() {
        let mut world = World::new_with_seed(empty_config(), 7);
        let spot = Point::new(40.0, 40.0);
        let first = world.spawn_manual(AgentKind::Carnivore, Some(spot));
        let second = world.spawn_manual(AgentKind::Carnivore, Some(spot));
        let prey = world.spawn_manual(AgentKind::Herbivore, Some(spot));
        let spare = world.spawn_manual(AgentKind::Herbivore, Some(Point::new(40.0, 70.0)));
        for id in [first, second] {
            if let Some(carnivore) = carnivore_mut(&mut world, id) {
                carnivore.set_hunger(0.0);
                carnivore.target = Some(prey);
            }
        }
        assert_eq!(world.ledger.registered_count(), 4);

        world.step();

        // The first carnivore ate; the second found its prey dead and picked a new one
        assert!(world.agents.get(prey).is_none());
        assert!(!world.ledger.is_registered(prey));
        assert_eq!(world.population(AgentKind::Herbivore), 1);
        assert_eq!(world.population(AgentKind::Carnivore), 2);
        assert_eq!(world.ledger.registered_count(), 3);
        assert!(carnivore_mut(&mut world, first).is_some_and(|c| c.hunger() > 0.0));
        let second = carnivore_mut(&mut world, second).map(|c| (c.target, c.hunger()));
        assert_eq!(second, Some((Some(spare), 0.0)));
        assert_eq!(world.scheduler.len(), 1);
    }

    #[test]
    fn test_kill_schedules_delayed_herbivore_birth() {
        let mut config = empty_config();
        config.population.reproduction_delay = 10.0;
        let mut world = World::new_with_seed(config, 8);
        let spot = Point::new(40.0, 40.0);
        let hunter = world.spawn_manual(AgentKind::Carnivore, Some(spot));
        world.spawn_manual(AgentKind::Herbivore, Some(spot));
        world.spawn_manual(AgentKind::Herbivore, Some(Point::new(40.0, 100.0)));
        world.spawn_manual(AgentKind::Herbivore, Some(Point::new(45.0, 100.0)));
        if let Some(carnivore) = carnivore_mut(&mut world, hunter) {
            carnivore.set_hunger(0.0);
        }

        world.step();
        assert_eq!(world.population(AgentKind::Herbivore), 2);
        assert_eq!(world.ledger.registered_count(), 3);
        assert_eq!(world.scheduler.next_due(), Some(10.5));

        // Fed: no more kills while the birth is pending
        if let Some(carnivore) = carnivore_mut(&mut world, hunter) {
            carnivore.set_hunger(carnivore.config.max_hunger);
        }
        world.run(19);
        assert_eq!(world.elapsed, 10.0);
        assert_eq!(world.population(AgentKind::Herbivore), 2);
        assert_eq!(world.scheduler.len(), 1);

        world.step();
        assert_eq!(world.population(AgentKind::Herbivore), 3);
        assert_eq!(world.ledger.registered_count(), 4);
        assert!(world.scheduler.is_empty());

        world.run(40);
        assert_eq!(world.population(AgentKind::Herbivore), 3);
    }

    #[test]
    fn test_grazed_grass_respawns() {
        let mut world = World::new_with_seed(empty_config(), 9);
        let spot = Point::new(40.0, 40.0);
        let grass = world.spawn_manual(AgentKind::Grass, Some(spot));
        let herbivore = world.spawn_manual(AgentKind::Herbivore, Some(spot));
        let start = world.agents.get(herbivore).map(Agent::biomass).unwrap_or(0.0);
        assert_eq!(world.ledger.registered_count(), 2);

        let mut steps = 0;
        while world.agents.get(grass).is_some() {
            world.step();
            steps += 1;
            assert!(steps <= 10, "grass survived {} steps of grazing", steps);
        }

        // Two bites, one eating interval apart
        assert_eq!(steps, 3);
        assert!(!world.ledger.is_registered(grass));
        assert_eq!(world.population(AgentKind::Grass), 1);
        assert!(world.respawn.is_empty());
        assert_eq!(world.ledger.registered_count(), 2);
        let fed = world.agents.get(herbivore).map(Agent::biomass).unwrap_or(0.0);
        assert!(fed > start);
    }

    #[test]
    fn test_respawn_drains_one_per_tick() {
        let mut world = World::new_with_seed(empty_config(), 10);
        let patches: Vec<AgentId> = (0..3)
            .map(|i| world.spawn_manual(AgentKind::Grass, Some(Point::new(20.0 + i as f64, 20.0))))
            .collect();
        for id in patches {
            if let Some(agent) = world.agents.get_mut(id) {
                agent.body_mut().kill(DeathCause::Grazed);
            }
        }

        for expected in 1..=3 {
            world.step();
            assert_eq!(world.population(AgentKind::Grass), expected);
            assert_eq!(world.respawn.len(), 3 - expected);
            assert_eq!(world.ledger.registered_count(), expected);
        }
    }

    #[test]
    fn test_tree_at_floor_is_not_food() {
        let mut config = empty_config();
        // Night: trees respire and stay on their floor
        config.clock.start_hour = 0.0;
        let mut world = World::new_with_seed(config, 11);
        let spot = Point::new(40.0, 40.0);
        let tree = world.spawn_manual(AgentKind::Tree, Some(spot));
        if let Some(agent) = world.agents.get_mut(tree) {
            agent.body_mut().set_biomass(0.0);
        }
        let herbivore = world.spawn_manual(AgentKind::Herbivore, Some(spot));

        world.run(10);

        let target = world.agents.get(herbivore).and_then(Agent::as_herbivore).map(|h| h.target);
        assert_eq!(target, Some(None));
        assert_eq!(world.agents.get(tree).map(Agent::biomass), Some(1.0));
    }

    #[test]
    fn test_nearest_living_skips_dead() {
        let mut world = World::new_with_seed(empty_config(), 6);
        let near = world.spawn_manual(AgentKind::Carnivore, Some(Point::new(10.0, 10.0)));
        let far = world.spawn_manual(AgentKind::Carnivore, Some(Point::new(20.0, 10.0)));
        let origin = Point::new(9.0, 10.0);

        assert_eq!(world.nearest_living(AgentKind::Carnivore, origin, 50.0), Some(near));
        if let Some(agent) = world.agents.get_mut(near) {
            agent.body_mut().kill(DeathCause::Starvation);
        }
        assert_eq!(world.nearest_living(AgentKind::Carnivore, origin, 50.0), Some(far));
        assert_eq!(world.nearest_living(AgentKind::Carnivore, origin, 5.0), None);
    }
}
