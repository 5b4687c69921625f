//! Building/running simulations

use std::num::NonZeroUsize;

use log::{debug, info, warn};
use rand::{
    distributions::Uniform, prelude::Distribution, rngs::StdRng, SeedableRng,
};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::{
    blockchain::{BlockPublishingError, Blockchain},
    miner::{Miner, MinerId},
    network::DeliveryQueue,
    params::Params,
    power_dist::PowerDistribution,
    results::{ResultsBuilder, RunReport},
    rewards::RewardAccounting,
};

pub mod builder;

pub use builder::{SimulationBuildError, SimulationBuilder};

/// Rounds between progress log messages.
const PROGRESS_INTERVAL: usize = 5000;

/// Container for a validated simulation configuration, which may be run
/// repeatedly. Simulations should be run using this struct's `run_all` method.
#[derive(Debug, Clone)]
pub struct SimulationGroup {
    params: Params,
    powers: PowerDistribution,
    reference: MinerId,
    repeat_all: NonZeroUsize,
    seed: Option<u64>,
}

impl SimulationGroup {
    pub fn builder() -> SimulationBuilder {
        SimulationBuilder::new()
    }

    #[inline]
    pub fn params(&self) -> &Params {
        &self.params
    }

    #[inline]
    pub fn powers(&self) -> &PowerDistribution {
        &self.powers
    }

    /// Runs the configured simulation `repeat_all` times. Run `i` is seeded
    /// with the base seed plus `i`.
    pub fn run_all(self) -> Result<ResultsBuilder, SimulationError> {
        let SimulationGroup { params, powers, reference, repeat_all, seed } =
            self;

        let base_seed = seed.unwrap_or_else(rand::random);
        let sims: Vec<_> = (0..repeat_all.get() as u64)
            .map(|i| Simulation {
                params,
                powers: powers.clone(),
                reference,
                seed: base_seed.wrapping_add(i),
            })
            .collect();

        #[cfg(feature = "rayon")]
        let outputs: Result<_, _> =
            sims.into_par_iter().map(|sim| sim.run()).collect();
        #[cfg(not(feature = "rayon"))]
        let outputs: Result<_, _> =
            sims.into_iter().map(|sim| sim.run()).collect();

        Ok(ResultsBuilder::new(outputs?, repeat_all))
    }
}

/// A single seeded run of the GHOST mining game.
///
/// # Details
/// Within a round, every miner gets a chance to mine, in list order, before
/// any block in transit is delivered. Delivered blocks reach all miners in
/// the same round.
#[derive(Debug, Clone)]
struct Simulation {
    params: Params,
    powers: PowerDistribution,
    reference: MinerId,
    seed: u64,
}

/// Contains the output data from a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationOutput {
    /// Every block created during the run.
    pub chain: Blockchain,
    /// Miners in their final state.
    pub miners: Vec<Miner>,
    pub params: Params,
    pub powers: PowerDistribution,
    /// Miner whose head defines the canonical chain.
    pub reference: MinerId,
    pub rewards: RewardAccounting,
    pub seed: u64,
    /// Blocks still in transit when the run ended.
    pub undelivered: usize,
}

impl SimulationOutput {
    /// Textual report of this run.
    pub fn report(&self) -> RunReport<'_> {
        RunReport::new(self)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("block could not be published")]
    BlockPublishingError(#[from] BlockPublishingError),
}

impl Simulation {
    /// Executes the configured simulation.
    fn run(self) -> Result<SimulationOutput, SimulationError> {
        let Simulation { params, powers, reference, seed } = self;

        info!(
            "starting run: {} miners, {} rounds, seed {}",
            powers.len(),
            params.rounds,
            seed
        );

        let mut rng = StdRng::seed_from_u64(seed);
        let mut chain = Blockchain::new(params.uncle_depth);
        let mut miners: Vec<_> = powers
            .miners()
            .map(|(id, power)| Miner::new(id, power, &chain))
            .collect();

        // Validated during the build step: the range is finite and non-empty
        let solution =
            Uniform::new(0.0, params.pow_solution_time * powers.total());
        let cutoff = params.mining_cutoff();
        let mut queue = DeliveryQueue::new();

        for t in 0..params.rounds {
            if t % PROGRESS_INTERVAL == 0 {
                debug!(
                    "round {}/{}: {} blocks mined",
                    t,
                    params.rounds,
                    chain.num_mined()
                );
            }

            // Always iterate through miners in list order
            for miner in miners.iter_mut() {
                let draw = solution.sample(&mut rng);
                if draw < miner.power() && t < cutoff {
                    let block = miner.mine(&mut chain)?;
                    let arrival = t.saturating_add(params.transit_time);
                    queue.schedule(arrival, block);
                }
            }

            for delivery in queue.due(t) {
                for miner in miners.iter_mut() {
                    miner.receive(&chain, delivery.block);
                }
            }
        }

        if !queue.is_empty() {
            warn!(
                "{} blocks were still in transit at the end of the run",
                queue.len()
            );
        }

        let head = miners[reference.get() - 1].head();
        let rewards = RewardAccounting::tally(&chain, head, &params);

        info!(
            "finished run with seed {}: {} blocks mined, chain length {}",
            seed,
            rewards.blocks_mined(),
            rewards.chain_length()
        );

        Ok(SimulationOutput {
            chain,
            miners,
            params,
            powers,
            reference,
            rewards,
            seed,
            undelivered: queue.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{SimulationBuilder, SimulationOutput};
    use crate::miner::MinerId;

    fn run_once(builder: SimulationBuilder) -> SimulationOutput {
        builder.build().unwrap().run_all().unwrap().data().remove(0)
    }

    #[test]
    fn single_miner_without_delay_has_no_uncles() {
        let output = run_once(
            SimulationBuilder::new()
                .add_miner(1.0)
                .uncle_depth(4)
                .rounds(50)
                .transit_time(0)
                .pow_solution_time(1.0)
                .seed(7),
        );
        let rewards = &output.rewards;

        assert_eq!(output.chain.num_mined(), 50);
        assert_eq!(rewards.chain_length(), 50);
        assert_eq!(rewards.uncle_count(), 0);
        assert_eq!(rewards.average_uncles(), Some(0.0));
        assert_eq!(rewards.efficiency(), Some(1.0));
        assert_eq!(rewards.reward_of(MinerId(1)), 50.0);
        assert_eq!(output.undelivered, 0);
    }

    #[test]
    fn single_miner_chain_matches_successful_rounds() {
        let output = run_once(
            SimulationBuilder::new()
                .add_miner(1.0)
                .uncle_depth(4)
                .rounds(50)
                .transit_time(0)
                .pow_solution_time(3.0)
                .seed(11),
        );

        assert_eq!(output.rewards.chain_length(), output.chain.num_mined());
        assert_eq!(output.rewards.uncle_count(), 0);
    }

    #[test]
    fn equal_miners_with_delay_produce_uncles() {
        for seed in 0..5 {
            let output = run_once(
                SimulationBuilder::new()
                    .add_miners(1.0, 2)
                    .rounds(2000)
                    .transit_time(5)
                    .pow_solution_time(2.0)
                    .seed(seed),
            );

            let average = output.rewards.average_uncles().unwrap();
            assert!(average > 0.0, "seed {} gave no uncles", seed);
        }
    }

    #[test]
    fn no_mining_when_run_is_within_cutoff() {
        let output = run_once(
            SimulationBuilder::new()
                .add_miners(1.0, 2)
                .rounds(30)
                .transit_time(10)
                .pow_solution_time(0.5)
                .seed(1),
        );

        assert_eq!(output.chain.num_mined(), 0);
        assert_eq!(output.rewards.chain_length(), 0);
        assert_eq!(output.rewards.average_uncles(), None);
    }

    #[test]
    fn no_blocks_mined_in_final_transit_window() {
        // A single miner with all the power finds a block every round until
        // the cutoff at 100 - 3 * 5.
        let output = run_once(
            SimulationBuilder::new()
                .add_miner(1.0)
                .rounds(100)
                .transit_time(5)
                .pow_solution_time(1.0)
                .seed(2),
        );
        let chain = &output.chain;

        assert_eq!(chain.num_mined(), 85);
        assert_eq!(output.rewards.chain_length(), 85);
        assert_eq!(
            chain[output.miners[0].head()].height,
            chain.genesis_height() + 85
        );
        assert_eq!(output.undelivered, 0);
    }

    #[test]
    fn huge_transit_time_does_not_overflow() {
        let output = run_once(
            SimulationBuilder::new()
                .add_miner(1.0)
                .rounds(20)
                .transit_time(usize::MAX / 2)
                .seed(1),
        );

        assert_eq!(output.chain.num_mined(), 0);
        assert_eq!(output.undelivered, 0);
    }

    #[test]
    fn mining_precedes_delivery_within_a_round() {
        // Both miners find a block in round 0, before either block is
        // delivered, so both extend the genesis tip.
        let output = run_once(
            SimulationBuilder::new()
                .add_miners(1.0, 2)
                .rounds(1)
                .transit_time(0)
                .pow_solution_time(0.5)
                .seed(4),
        );
        let chain = &output.chain;
        let mined: Vec<_> = chain.mined().collect();

        assert_eq!(mined.len(), 2);
        assert_ne!(mined[0].miner_id, mined[1].miner_id);
        for block in &mined {
            assert_eq!(block.parent_id, Some(chain.genesis_tip()));
            assert!(block.uncles.is_empty());
        }

        // Both blocks were delivered in the same round; each miner keeps
        // its own block on the tie.
        for (miner, block) in output.miners.iter().zip(&mined) {
            assert_eq!(miner.view().len(), chain.num_blocks());
            assert_eq!(miner.head(), block.id);
        }
    }

    #[test]
    fn same_seed_same_result() {
        let builder = || {
            SimulationBuilder::new()
                .add_miners(1.0, 3)
                .add_miner(5.0)
                .rounds(3000)
                .transit_time(4)
                .pow_solution_time(3.0)
                .seed(99)
        };

        let a = run_once(builder());
        let b = run_once(builder());

        assert_eq!(a.rewards, b.rewards);
        assert_eq!(a.chain.num_blocks(), b.chain.num_blocks());
        assert_eq!(a.miners, b.miners);
    }

    #[test]
    fn simulated_blocks_respect_ghost_invariants() {
        let output = run_once(
            SimulationBuilder::new()
                .power_values([1.0, 1.0, 2.0, 4.0])
                .rounds(3000)
                .transit_time(6)
                .pow_solution_time(2.0)
                .seed(3),
        );
        let chain = &output.chain;
        let depth = chain.uncle_depth();

        for block in chain.mined() {
            let parent = &chain[block.parent_id.unwrap()];
            assert_eq!(
                block.score,
                parent.score + 1 + block.uncles.len() as u64
            );
            assert!(block.score > parent.score);
            assert_eq!(block.height, parent.height + 1);

            let claimed: HashSet<_> = chain
                .ancestors_of(parent.id)
                .take(depth)
                .flat_map(|ancestor| ancestor.uncles.iter().copied())
                .collect();

            for &uncle in &block.uncles {
                assert!(!chain.is_ancestor(uncle, block.id));
                assert!(!claimed.contains(&uncle));
                assert!(chain[uncle].height + depth as u64 >= block.height);
            }
        }

        let rewards = &output.rewards;
        assert!(rewards.blocks_in_chain() <= rewards.blocks_mined());
        assert!(rewards.efficiency().unwrap() <= 1.0);
    }

    #[test]
    fn heads_agree_once_deliveries_settle() {
        let output = run_once(
            SimulationBuilder::new()
                .add_miners(1.0, 4)
                .rounds(2000)
                .transit_time(3)
                .pow_solution_time(4.0)
                .seed(5),
        );

        // Every miner has seen every block, so all heads carry the best
        // score even if ties left them on different tips.
        let best = output.chain.mined().map(|b| b.score).max().unwrap();
        assert_eq!(output.undelivered, 0);
        for miner in &output.miners {
            assert_eq!(miner.view().len(), output.chain.num_blocks());
            assert_eq!(output.chain[miner.head()].score, best);
        }
    }
}
