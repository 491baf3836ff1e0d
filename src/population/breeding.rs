//! Sexed breeding: one male/female pairing at a time.
//!
//! Once per in-sim day, while carnivores are below the breeding cap, a random
//! male is assigned to seek a random female. When they come within the
//! breeding distance one offspring is born and the pairing ends. If the
//! timeout passes first the pairing ends without offspring.

use super::{count_living, living_of, Nursery};
use crate::agents::{AgentArena, AgentId, AgentKind, Sex};
use crate::habitat::Point;
use rand::Rng;

/// Active seek relationship
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pairing {
    pub seeker: AgentId,
    pub partner: AgentId,
    /// Simulation time at which the pairing is abandoned
    pub deadline: f64,
}

/// What happened to the pairing on an update
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PairingOutcome {
    Idle,
    Seeking,
    Bred(AgentId),
    TimedOut,
    /// One of the pair died or was destroyed
    Broken,
}

#[derive(Clone, Debug, Default)]
pub struct BreedingController {
    pairing: Option<Pairing>,
}

impl BreedingController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pairing(&self) -> Option<Pairing> {
        self.pairing
    }

    /// Partner position for a carnivore that is currently seeking
    pub fn seek_target(&self, id: AgentId, agents: &AgentArena) -> Option<Point> {
        let pairing = self.pairing?;
        if pairing.seeker != id {
            return None;
        }
        agents
            .get(pairing.partner)
            .filter(|agent| agent.is_alive())
            .map(|agent| agent.position())
    }

    /// Daily pairing attempt. Returns the new pairing, if one was made.
    pub fn begin_day(&mut self, nursery: &mut Nursery<'_>) -> Option<Pairing> {
        if self.pairing.is_some() {
            return None;
        }

        let carnivores = living_of(nursery.agents, AgentKind::Carnivore);
        if carnivores.len() >= nursery.config.population.breeding_cap {
            return None;
        }

        let agents = &*nursery.agents;
        let (males, females): (Vec<AgentId>, Vec<AgentId>) = carnivores
            .into_iter()
            .partition(|&id| sex_of(agents, id) == Some(Sex::Male));
        if males.is_empty() || females.is_empty() {
            return None;
        }

        let seeker = males[nursery.rng.gen_range(0..males.len())];
        let partner = females[nursery.rng.gen_range(0..females.len())];
        let pairing = Pairing {
            seeker,
            partner,
            deadline: nursery.now + nursery.config.population.breeding_timeout.max(0.0),
        };
        self.pairing = Some(pairing);
        log::info!("Paired carnivores {} -> {}", seeker, partner);
        Some(pairing)
    }

    /// Check distance, liveness and timeout of the active pairing
    pub fn update(&mut self, nursery: &mut Nursery<'_>) -> PairingOutcome {
        let Some(pairing) = self.pairing else {
            return PairingOutcome::Idle;
        };

        let seeker = living_position(nursery.agents, pairing.seeker);
        let partner = living_position(nursery.agents, pairing.partner);
        let (Some(a), Some(b)) = (seeker, partner) else {
            log::debug!("Pairing {} -> {} broken", pairing.seeker, pairing.partner);
            self.clear();
            return PairingOutcome::Broken;
        };

        if a.distance(b) < nursery.config.population.breeding_distance {
            let sex = Self::scarcer_sex(nursery.agents);
            let birth = nursery.offspring(AgentKind::Carnivore, a.midpoint(b)).with_sex(sex);
            let child = nursery.spawn(birth);
            log::info!(
                "Carnivores {} and {} bred {:?} offspring {}",
                pairing.seeker,
                pairing.partner,
                sex,
                child
            );
            self.clear();
            return PairingOutcome::Bred(child);
        }

        if nursery.now >= pairing.deadline {
            log::debug!("Pairing {} -> {} timed out", pairing.seeker, pairing.partner);
            self.clear();
            return PairingOutcome::TimedOut;
        }

        PairingOutcome::Seeking
    }

    /// The sex with fewer living carnivores; ties go to Female
    pub fn scarcer_sex(agents: &AgentArena) -> Sex {
        let males = agents
            .iter()
            .filter_map(|(_, agent)| agent.as_carnivore())
            .filter(|c| c.body.is_alive() && c.sex == Sex::Male)
            .count();
        let total = count_living(agents, AgentKind::Carnivore);
        let females = total - males;
        if males < females {
            Sex::Male
        } else {
            Sex::Female
        }
    }

    /// End the pairing and release the seeker
    pub fn clear(&mut self) {
        self.pairing = None;
    }
}

fn sex_of(agents: &AgentArena, id: AgentId) -> Option<Sex> {
    agents.get(id).and_then(|agent| agent.as_carnivore()).map(|c| c.sex)
}

fn living_position(agents: &AgentArena, id: AgentId) -> Option<Point> {
    agents
        .get(id)
        .filter(|agent| agent.is_alive())
        .map(|agent| agent.position())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::DeathCause;
    use crate::population::testing::Fixture;
    use crate::population::Birth;

    fn carnivore(fx: &mut Fixture, sex: Sex, at: Point) -> AgentId {
        fx.nursery(0.0)
            .spawn(Birth::new(AgentKind::Carnivore, at).with_sex(sex))
    }

    #[test]
    fn test_pairs_male_with_female() {
        let mut fx = Fixture::new(21);
        let male = carnivore(&mut fx, Sex::Male, Point::new(10.0, 10.0));
        let female = carnivore(&mut fx, Sex::Female, Point::new(50.0, 50.0));

        let mut breeding = BreedingController::new();
        let pairing = breeding.begin_day(&mut fx.nursery(0.0));
        let pairing = pairing.expect("pairing");
        assert_eq!(pairing.seeker, male);
        assert_eq!(pairing.partner, female);
        assert_eq!(pairing.deadline, 300.0);

        assert_eq!(breeding.seek_target(female, &fx.agents), None);
        assert_eq!(
            breeding.seek_target(male, &fx.agents),
            Some(Point::new(50.0, 50.0))
        );

        // Only one pairing at a time
        assert_eq!(breeding.begin_day(&mut fx.nursery(1.0)), None);
    }

    #[test]
    fn test_no_pairing_without_both_sexes() {
        let mut fx = Fixture::new(22);
        carnivore(&mut fx, Sex::Female, Point::new(10.0, 10.0));
        carnivore(&mut fx, Sex::Female, Point::new(20.0, 10.0));
        let mut breeding = BreedingController::new();
        assert_eq!(breeding.begin_day(&mut fx.nursery(0.0)), None);
    }

    #[test]
    fn test_no_pairing_at_cap() {
        let mut fx = Fixture::new(23);
        fx.config.population.breeding_cap = 2;
        carnivore(&mut fx, Sex::Male, Point::new(10.0, 10.0));
        carnivore(&mut fx, Sex::Female, Point::new(20.0, 10.0));
        let mut breeding = BreedingController::new();
        assert_eq!(breeding.begin_day(&mut fx.nursery(0.0)), None);
    }

    #[test]
    fn test_breeds_when_close() {
        let mut fx = Fixture::new(24);
        carnivore(&mut fx, Sex::Male, Point::new(10.0, 10.0));
        carnivore(&mut fx, Sex::Female, Point::new(11.0, 10.0));
        carnivore(&mut fx, Sex::Female, Point::new(80.0, 80.0));

        let mut breeding = BreedingController::new();
        let pairing = breeding.begin_day(&mut fx.nursery(0.0));
        assert!(pairing.is_some());

        // Move whichever female was picked next to the male
        if let Some(partner) = pairing.map(|p| p.partner) {
            if let Some(agent) = fx.agents.get_mut(partner) {
                agent.body_mut().position = Point::new(10.5, 10.0);
            }
        }

        let outcome = breeding.update(&mut fx.nursery(5.0));
        let PairingOutcome::Bred(child) = outcome else {
            panic!("expected offspring, got {:?}", outcome);
        };
        let child = fx.agents.get(child).and_then(|a| a.as_carnivore()).cloned();
        // One male, two females: the scarcer sex is Male
        assert_eq!(child.map(|c| c.sex), Some(Sex::Male));
        assert!(breeding.pairing().is_none());
    }

    #[test]
    fn test_tie_favours_female() {
        let mut fx = Fixture::new(25);
        carnivore(&mut fx, Sex::Male, Point::new(10.0, 10.0));
        carnivore(&mut fx, Sex::Female, Point::new(10.5, 10.0));
        assert_eq!(BreedingController::scarcer_sex(&fx.agents), Sex::Female);
    }

    #[test]
    fn test_times_out() {
        let mut fx = Fixture::new(26);
        let male = carnivore(&mut fx, Sex::Male, Point::new(10.0, 10.0));
        carnivore(&mut fx, Sex::Female, Point::new(90.0, 90.0));

        let mut breeding = BreedingController::new();
        breeding.begin_day(&mut fx.nursery(0.0));
        assert_eq!(breeding.update(&mut fx.nursery(100.0)), PairingOutcome::Seeking);
        assert_eq!(breeding.update(&mut fx.nursery(300.0)), PairingOutcome::TimedOut);
        assert!(breeding.pairing().is_none());

        assert_eq!(breeding.seek_target(male, &fx.agents), None);
        assert_eq!(breeding.update(&mut fx.nursery(301.0)), PairingOutcome::Idle);
    }

    #[test]
    fn test_partner_death_breaks_pairing() {
        let mut fx = Fixture::new(27);
        carnivore(&mut fx, Sex::Male, Point::new(10.0, 10.0));
        let female = carnivore(&mut fx, Sex::Female, Point::new(90.0, 90.0));

        let mut breeding = BreedingController::new();
        breeding.begin_day(&mut fx.nursery(0.0));
        if let Some(agent) = fx.agents.get_mut(female) {
            agent.body_mut().kill(DeathCause::Starvation);
        }
        assert_eq!(breeding.update(&mut fx.nursery(1.0)), PairingOutcome::Broken);
    }
}
