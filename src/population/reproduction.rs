//! Asexual, population-balancing reproduction.

use super::{living_of, Nursery};
use crate::agents::{AgentId, AgentKind};
use rand::Rng;

/// Who asked for the offspring
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReproductionTrigger {
    /// Scheduled by the simulation; respects the population cap
    Automatic,
    /// Requested by a user; ignores the cap
    Manual,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ReproductionController;

impl ReproductionController {
    /// Pick two distinct living parents of `kind` and place one offspring
    /// near their midpoint. Returns `None` if suppressed or short of parents.
    pub fn reproduce(
        &self,
        kind: AgentKind,
        trigger: ReproductionTrigger,
        nursery: &mut Nursery<'_>,
    ) -> Option<AgentId> {
        let parents = living_of(nursery.agents, kind);

        if trigger == ReproductionTrigger::Automatic {
            if let Some(cap) = nursery.config.population.cap(kind) {
                if parents.len() >= cap {
                    log::debug!(
                        "{} reproduction suppressed: {} at cap {}",
                        kind.name(),
                        parents.len(),
                        cap
                    );
                    return None;
                }
            }
        }

        if parents.len() < 2 {
            log::debug!("{} reproduction skipped: fewer than two parents", kind.name());
            return None;
        }

        let first = nursery.rng.gen_range(0..parents.len());
        let mut second = nursery.rng.gen_range(0..parents.len() - 1);
        if second >= first {
            second += 1;
        }

        let a = nursery.agents.get(parents[first])?.position();
        let b = nursery.agents.get(parents[second])?.position();

        let jitter = nursery.config.population.offspring_jitter.max(0.0);
        let (dx, dy) = if jitter > 0.0 {
            (
                nursery.rng.gen_range(-jitter..=jitter),
                nursery.rng.gen_range(-jitter..=jitter),
            )
        } else {
            (0.0, 0.0)
        };
        let position = nursery
            .habitat
            .clamp_to_habitable(a.midpoint(b).offset(dx, dy));

        let birth = nursery.offspring(kind, position);
        Some(nursery.spawn(birth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habitat::Point;
    use crate::population::testing::Fixture;
    use crate::population::{count_living, Birth};

    fn seed_herbivores(fx: &mut Fixture, points: &[Point]) -> Vec<AgentId> {
        let mut nursery = fx.nursery(0.0);
        points
            .iter()
            .map(|&p| nursery.spawn(Birth::new(AgentKind::Herbivore, p)))
            .collect()
    }

    #[test]
    fn test_offspring_near_midpoint() {
        let mut fx = Fixture::new(11);
        seed_herbivores(&mut fx, &[Point::new(10.0, 10.0), Point::new(30.0, 10.0)]);

        let id = ReproductionController.reproduce(
            AgentKind::Herbivore,
            ReproductionTrigger::Automatic,
            &mut fx.nursery(1.0),
        );
        let child = id
            .and_then(|id| fx.agents.get(id))
            .map(|agent| (agent.position(), agent.biomass()));

        let (position, biomass) = child.expect("offspring");
        assert!(position.distance(Point::new(20.0, 10.0)) <= 2.0 * 2f64.sqrt() + 1e-9);
        assert!((biomass - 8.0 * 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_needs_two_living_parents() {
        let mut fx = Fixture::new(12);
        let ids = seed_herbivores(&mut fx, &[Point::new(10.0, 10.0), Point::new(12.0, 10.0)]);
        if let Some(agent) = fx.agents.get_mut(ids[1]) {
            agent.body_mut().kill(crate::agents::DeathCause::Predation);
        }

        let result = ReproductionController.reproduce(
            AgentKind::Herbivore,
            ReproductionTrigger::Manual,
            &mut fx.nursery(1.0),
        );
        assert_eq!(result, None);
    }

    #[test]
    fn test_cap_applies_only_to_automatic() {
        let mut fx = Fixture::new(13);
        fx.config.population.herbivore_cap = 2;
        seed_herbivores(&mut fx, &[Point::new(10.0, 10.0), Point::new(12.0, 10.0)]);

        let auto = ReproductionController.reproduce(
            AgentKind::Herbivore,
            ReproductionTrigger::Automatic,
            &mut fx.nursery(1.0),
        );
        assert_eq!(auto, None);

        let manual = ReproductionController.reproduce(
            AgentKind::Herbivore,
            ReproductionTrigger::Manual,
            &mut fx.nursery(1.0),
        );
        assert!(manual.is_some());
        assert_eq!(count_living(&fx.agents, AgentKind::Herbivore), 3);
    }
}
