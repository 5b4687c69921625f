use std::num::NonZeroUsize;

use crate::{
    miner::MinerId,
    params::Params,
    power_dist::{PowerDistribution, PowerDistributionError, PowerValue},
};

use super::SimulationGroup;

/// Builds a [`SimulationGroup`]. Unset parameters take the values of
/// [`Params::default`].
#[derive(Debug, Default)]
pub struct SimulationBuilder {
    pub rounds: Option<usize>,
    pub repeat_all: Option<usize>,
    pub seed: Option<u64>,
    pub pow_solution_time: Option<f64>,
    pub transit_time: Option<usize>,
    pub uncle_depth: Option<usize>,
    pub uncle_reward_coeff: Option<f64>,
    pub nephew_reward_coeff: Option<f64>,
    pub reference_miner: Option<MinerId>,
    /// Hashpower of each miner, in order of miner ID.
    pub powers: Vec<PowerValue>,
}

#[derive(Debug, thiserror::Error)]
pub enum SimulationBuildError {
    #[error("no miners were added")]
    NoMinersGiven,
    #[error("number of simulation rounds must be greater than 0")]
    ZeroRounds,
    #[error("uncle depth must be greater than 0")]
    ZeroUncleDepth,
    #[error("cannot repeat a simulation 0 times")]
    RepeatZero,
    #[error("PoW solution time {0} is not a positive number")]
    BadSolutionTime(f64),
    #[error("solution time times total power ({0}) is not finite")]
    BadSolutionRange(f64),
    #[error("reward coefficient {0} is negative or not finite")]
    BadRewardCoeff(f64),
    #[error("reference miner {0} was not added to the simulation")]
    ReferenceMinerNotFound(MinerId),
    #[error(transparent)]
    PowerDistributionError(#[from] PowerDistributionError),
}

impl SimulationBuilder {
    /// Creates a new [`SimulationBuilder`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a miner with hashpower `power`. Miners receive IDs 1, 2, ... in
    /// order of addition.
    pub fn add_miner(mut self, power: PowerValue) -> Self {
        self.powers.push(power);

        self
    }

    /// Add `count` miners with hashpower `power`.
    pub fn add_miners(mut self, power: PowerValue, count: usize) -> Self {
        self.powers.extend(std::iter::repeat(power).take(count));

        self
    }

    /// Call [`SimulationBuilder::add_miner`] once for each element of
    /// `values`.
    pub fn power_values<I>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = PowerValue>,
    {
        self.powers.extend(values);

        self
    }

    /// Sets every simulation parameter at once.
    pub fn params(mut self, params: Params) -> Self {
        self.pow_solution_time = Some(params.pow_solution_time);
        self.transit_time = Some(params.transit_time);
        self.uncle_depth = Some(params.uncle_depth);
        self.uncle_reward_coeff = Some(params.uncle_reward_coeff);
        self.nephew_reward_coeff = Some(params.nephew_reward_coeff);
        self.rounds = Some(params.rounds);

        self
    }

    /// Sets the number of rounds each simulation will last for.
    pub fn rounds(mut self, rounds: usize) -> Self {
        self.rounds = Some(rounds);

        self
    }

    /// Run the simulation `num` times (default 1).
    pub fn repeat_all(mut self, num: usize) -> Self {
        self.repeat_all = Some(num);

        self
    }

    /// Sets the base seed of the random number generator. A random seed is
    /// drawn otherwise.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);

        self
    }

    pub fn pow_solution_time(mut self, time: f64) -> Self {
        self.pow_solution_time = Some(time);

        self
    }

    pub fn transit_time(mut self, time: usize) -> Self {
        self.transit_time = Some(time);

        self
    }

    pub fn uncle_depth(mut self, depth: usize) -> Self {
        self.uncle_depth = Some(depth);

        self
    }

    pub fn uncle_reward_coeff(mut self, coeff: f64) -> Self {
        self.uncle_reward_coeff = Some(coeff);

        self
    }

    pub fn nephew_reward_coeff(mut self, coeff: f64) -> Self {
        self.nephew_reward_coeff = Some(coeff);

        self
    }

    /// Sets the miner whose view defines the canonical chain when tallying
    /// rewards (default: the first miner).
    pub fn reference_miner(mut self, miner: MinerId) -> Self {
        self.reference_miner = Some(miner);

        self
    }

    /// Creates a [`SimulationGroup`] from the specified parameters.
    pub fn build(self) -> Result<SimulationGroup, SimulationBuildError> {
        use SimulationBuildError::*;

        let SimulationBuilder {
            rounds,
            repeat_all,
            seed,
            pow_solution_time,
            transit_time,
            uncle_depth,
            uncle_reward_coeff,
            nephew_reward_coeff,
            reference_miner,
            powers,
        } = self;

        if powers.is_empty() {
            return Err(NoMinersGiven);
        }
        let powers = PowerDistribution::new(powers);
        powers.validate()?;

        let defaults = Params::default();
        let params = Params {
            pow_solution_time: pow_solution_time
                .unwrap_or(defaults.pow_solution_time),
            transit_time: transit_time.unwrap_or(defaults.transit_time),
            uncle_depth: uncle_depth.unwrap_or(defaults.uncle_depth),
            uncle_reward_coeff: uncle_reward_coeff
                .unwrap_or(defaults.uncle_reward_coeff),
            nephew_reward_coeff: nephew_reward_coeff
                .unwrap_or(defaults.nephew_reward_coeff),
            rounds: rounds.unwrap_or(defaults.rounds),
        };

        if params.rounds == 0 {
            return Err(ZeroRounds);
        }
        if params.uncle_depth == 0 {
            return Err(ZeroUncleDepth);
        }
        if !params.pow_solution_time.is_finite()
            || params.pow_solution_time <= 0.0
        {
            return Err(BadSolutionTime(params.pow_solution_time));
        }
        let solution_range = params.pow_solution_time * powers.total();
        if !solution_range.is_finite() {
            return Err(BadSolutionRange(solution_range));
        }
        for coeff in [params.uncle_reward_coeff, params.nephew_reward_coeff] {
            if !coeff.is_finite() || coeff < 0.0 {
                return Err(BadRewardCoeff(coeff));
            }
        }

        let repeat_all = match repeat_all {
            Some(x) => NonZeroUsize::new(x).ok_or(RepeatZero)?,
            None => NonZeroUsize::MIN,
        };

        let reference = reference_miner.unwrap_or_default();
        if powers.power_of(reference).is_none() {
            return Err(ReferenceMinerNotFound(reference));
        }

        Ok(SimulationGroup { params, powers, reference, repeat_all, seed })
    }
}
