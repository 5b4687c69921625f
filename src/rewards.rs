//! Reward accounting along the canonical chain

use std::collections::{BTreeMap, HashSet};

use crate::{
    block::{Block, BlockId},
    blockchain::Blockchain,
    miner::MinerId,
    params::Params,
    power_dist::{PowerDistribution, PowerValue},
};

/// Rewards and chain statistics derived from the canonical chain ending at a
/// reference miner's head.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardAccounting {
    head: BlockId,
    rewards: BTreeMap<MinerId, f64>,
    in_chain: HashSet<BlockId>,
    chain_length: usize,
    uncle_count: usize,
    blocks_mined: usize,
    rounds: usize,
}

/// Reward earned by a group of miners with equal power.
#[derive(Debug, Clone, PartialEq)]
pub struct CohortReward {
    pub power: PowerValue,
    pub miners: usize,
    /// Mean reward per miner of the cohort.
    pub mean: f64,
    /// `mean` divided by the mean of the lowest cohort with nonzero power.
    /// `None` for zero-power cohorts or if that baseline is zero.
    pub normalized: Option<f64>,
}

impl RewardAccounting {
    /// Walks the chain from `head` down to the genesis blocks, paying each
    /// chain block's miner a block reward plus a nephew reward per uncle, and
    /// each uncle's miner an uncle reward.
    pub fn tally(chain: &Blockchain, head: BlockId, params: &Params) -> Self {
        let mut rewards: BTreeMap<MinerId, f64> = BTreeMap::new();
        let mut in_chain = HashSet::new();
        let mut chain_length = 0;
        let mut uncle_count = 0;

        for block in canonical_chain(chain, head) {
            chain_length += 1;
            uncle_count += block.uncles.len();
            in_chain.insert(block.id);

            *rewards.entry(block.miner_id).or_default() += 1.0
                + params.nephew_reward_coeff * block.uncles.len() as f64;

            for &uncle in &block.uncles {
                in_chain.insert(uncle);
                *rewards.entry(chain[uncle].miner_id).or_default() +=
                    params.uncle_reward_coeff;
            }
        }

        RewardAccounting {
            head,
            rewards,
            in_chain,
            chain_length,
            uncle_count,
            blocks_mined: chain.num_mined(),
            rounds: params.rounds,
        }
    }

    /// Head the canonical chain was walked from.
    #[inline]
    pub fn head(&self) -> BlockId {
        self.head
    }

    /// Total reward of each miner which earned anything.
    #[inline]
    pub fn rewards(&self) -> &BTreeMap<MinerId, f64> {
        &self.rewards
    }

    pub fn reward_of(&self, miner_id: MinerId) -> f64 {
        self.rewards.get(&miner_id).copied().unwrap_or_default()
    }

    /// Returns true iff `id` is a canonical chain block or one of their
    /// uncles.
    #[inline]
    pub fn in_chain(&self, id: BlockId) -> bool {
        self.in_chain.contains(&id)
    }

    /// Number of mined blocks on the canonical chain.
    #[inline]
    pub fn chain_length(&self) -> usize {
        self.chain_length
    }

    /// Number of uncles included by canonical chain blocks.
    #[inline]
    pub fn uncle_count(&self) -> usize {
        self.uncle_count
    }

    /// Canonical chain blocks plus their uncles.
    #[inline]
    pub fn blocks_in_chain(&self) -> usize {
        self.chain_length + self.uncle_count
    }

    /// Number of blocks produced during the run.
    #[inline]
    pub fn blocks_mined(&self) -> usize {
        self.blocks_mined
    }

    /// Share of mined blocks which ended up in the chain.
    pub fn efficiency(&self) -> Option<f64> {
        (self.blocks_mined > 0)
            .then(|| self.blocks_in_chain() as f64 / self.blocks_mined as f64)
    }

    /// Mean number of uncles per canonical chain block.
    pub fn average_uncles(&self) -> Option<f64> {
        (self.chain_length > 0)
            .then(|| self.uncle_count as f64 / self.chain_length as f64)
    }

    /// Mean number of rounds between canonical chain blocks.
    pub fn block_time(&self) -> Option<f64> {
        (self.chain_length > 0)
            .then(|| self.rounds as f64 / self.chain_length as f64)
    }

    /// Mean reward per miner for each cohort of `powers`, in ascending order
    /// of power, normalized against the lowest cohort with nonzero power.
    pub fn cohort_rewards(
        &self,
        powers: &PowerDistribution,
    ) -> Vec<CohortReward> {
        let means: Vec<_> = powers
            .cohorts()
            .into_iter()
            .map(|cohort| {
                let total: f64 =
                    cohort.miners.iter().map(|&m| self.reward_of(m)).sum();
                let count = cohort.miners.len();

                (cohort.power, count, total / count as f64)
            })
            .collect();

        // Miners without power never earn, so they cannot be the baseline
        let baseline = means
            .iter()
            .find(|&&(power, _, _)| power > 0.0)
            .map(|&(_, _, mean)| mean)
            .unwrap_or_default();

        means
            .into_iter()
            .map(|(power, miners, mean)| CohortReward {
                power,
                miners,
                mean,
                normalized: (power > 0.0 && baseline > 0.0)
                    .then(|| mean / baseline),
            })
            .collect()
    }

    /// Returns the canonical chain blocks, from the head down to the highest
    /// genesis block (exclusive).
    pub fn chain_walk<'a>(
        &self,
        chain: &'a Blockchain,
    ) -> impl Iterator<Item = &'a Block> + 'a {
        canonical_chain(chain, self.head)
    }
}

fn canonical_chain(
    chain: &Blockchain,
    head: BlockId,
) -> impl Iterator<Item = &Block> {
    let boundary = chain.genesis_height();

    chain
        .ancestors_of(head)
        .take_while(move |block| block.height > boundary)
}
