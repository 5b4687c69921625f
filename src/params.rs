//! Constants governing a simulation run

/// Parameters of a simulation. All values are fixed once a simulation is
/// built; see [`SimulationBuilder`](crate::simulation::SimulationBuilder) for
/// validation rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Params {
    /// Expected number of rounds between successful solutions across the
    /// whole network.
    pub pow_solution_time: f64,
    /// Rounds a block takes to reach every miner.
    pub transit_time: usize,
    /// Maximum number of generations an uncle may trail the block which
    /// includes it.
    pub uncle_depth: usize,
    /// Reward paid to an uncle's miner, relative to a full block reward of 1.
    pub uncle_reward_coeff: f64,
    /// Reward paid to a block's miner for each uncle it includes.
    pub nephew_reward_coeff: f64,
    /// Number of simulated rounds.
    pub rounds: usize,
}

impl Params {
    pub const DEFAULT_POW_SOLUTION_TIME: f64 = 10.0;
    pub const DEFAULT_TRANSIT_TIME: usize = 10;
    pub const DEFAULT_UNCLE_DEPTH: usize = 4;
    pub const DEFAULT_UNCLE_REWARD_COEFF: f64 = 30.0 / 32.0;
    pub const DEFAULT_NEPHEW_REWARD_COEFF: f64 = 1.0 / 64.0;
    pub const DEFAULT_ROUNDS: usize = 200_000;

    /// First round in which no more blocks are mined, leaving time for
    /// blocks in transit to be delivered.
    #[inline]
    pub fn mining_cutoff(&self) -> usize {
        self.rounds.saturating_sub(self.transit_time.saturating_mul(3))
    }
}

impl Default for Params {
    fn default() -> Self {
        Params {
            pow_solution_time: Self::DEFAULT_POW_SOLUTION_TIME,
            transit_time: Self::DEFAULT_TRANSIT_TIME,
            uncle_depth: Self::DEFAULT_UNCLE_DEPTH,
            uncle_reward_coeff: Self::DEFAULT_UNCLE_REWARD_COEFF,
            nephew_reward_coeff: Self::DEFAULT_NEPHEW_REWARD_COEFF,
            rounds: Self::DEFAULT_ROUNDS,
        }
    }
}
