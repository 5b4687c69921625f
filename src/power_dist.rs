//! Describing distributions of mining power

use crate::miner::MinerId;

/// Numeric type used to represent mining power.
pub type PowerValue = f64;

/// Hashpower of each miner in a simulation, in the order miners were added.
///
/// Values are relative weights and need not sum to 1.0. A miner with power
/// `p` finds a block in a given round with probability
/// `p / (pow_solution_time * total)`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PowerDistribution {
    values: Vec<PowerValue>,
}

#[derive(Debug, thiserror::Error)]
pub enum PowerDistributionError {
    #[error("power value {0} is negative or not finite")]
    BadPowerValue(PowerValue),
    #[error("cannot create a distribution for zero miners")]
    ZeroMinersGiven,
    #[error("power values sum to zero")]
    ZeroTotalPower,
}

/// Miners sharing the same hashpower. Produced by
/// [`PowerDistribution::cohorts`].
#[derive(Debug, Clone, PartialEq)]
pub struct Cohort {
    pub power: PowerValue,
    pub miners: Vec<MinerId>,
}

impl PowerDistribution {
    pub fn new(values: Vec<PowerValue>) -> Self {
        Self { values }
    }

    /// Returns true if this distribution can be used in a simulation.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Checks that this distribution is non-empty, contains only finite
    /// non-negative values, and has positive total power.
    pub fn validate(&self) -> Result<(), PowerDistributionError> {
        use PowerDistributionError::*;

        if self.values.is_empty() {
            return Err(ZeroMinersGiven);
        }

        if let Some(&val) =
            self.values.iter().find(|&x| !x.is_finite() || *x < 0.0)
        {
            return Err(BadPowerValue(val));
        }

        if self.total() <= 0.0 {
            return Err(ZeroTotalPower);
        }

        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn values(&self) -> &[PowerValue] {
        &self.values
    }

    /// Sum of all power values.
    pub fn total(&self) -> PowerValue {
        self.values.iter().sum()
    }

    /// Returns the power of `miner_id`, if such a miner exists.
    pub fn power_of(&self, miner_id: MinerId) -> Option<PowerValue> {
        miner_id
            .get()
            .checked_sub(1)
            .and_then(|i| self.values.get(i))
            .copied()
    }

    /// Iterates over `(miner_id, power)` pairs. Miner IDs start at 1.
    pub fn miners(&self) -> impl Iterator<Item = (MinerId, PowerValue)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(i, &power)| (MinerId(i + 1), power))
    }

    /// Groups miners by equal power, in ascending order of power.
    pub fn cohorts(&self) -> Vec<Cohort> {
        let mut cohorts: Vec<Cohort> = vec![];

        for (miner_id, power) in self.miners() {
            match cohorts.iter_mut().find(|c| c.power == power) {
                Some(cohort) => cohort.miners.push(miner_id),
                None => cohorts.push(Cohort { power, miners: vec![miner_id] }),
            }
        }

        cohorts.sort_by(|a, b| a.power.total_cmp(&b.power));
        cohorts
    }
}

impl FromIterator<PowerValue> for PowerDistribution {
    fn from_iter<T: IntoIterator<Item = PowerValue>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{PowerDistribution, PowerDistributionError};
    use crate::miner::MinerId;

    #[test]
    fn validate_rejects_bad_values() {
        assert!(matches!(
            PowerDistribution::default().validate(),
            Err(PowerDistributionError::ZeroMinersGiven)
        ));
        assert!(matches!(
            PowerDistribution::new(vec![1.0, -1.0]).validate(),
            Err(PowerDistributionError::BadPowerValue(_))
        ));
        assert!(matches!(
            PowerDistribution::new(vec![1.0, f64::NAN]).validate(),
            Err(PowerDistributionError::BadPowerValue(_))
        ));
        assert!(matches!(
            PowerDistribution::new(vec![0.0, 0.0]).validate(),
            Err(PowerDistributionError::ZeroTotalPower)
        ));
        assert!(PowerDistribution::new(vec![0.0, 3.0]).is_valid());
    }

    #[test]
    fn cohorts_sorted_by_power() {
        let dist: PowerDistribution =
            [5.0, 1.0, 5.0, 1.0, 25.0].into_iter().collect();
        let cohorts = dist.cohorts();

        assert_eq!(cohorts.len(), 3);
        assert_eq!(cohorts[0].power, 1.0);
        assert_eq!(cohorts[0].miners, vec![MinerId(2), MinerId(4)]);
        assert_eq!(cohorts[1].miners, vec![MinerId(1), MinerId(3)]);
        assert_eq!(cohorts[2].power, 25.0);
        assert_eq!(dist.total(), 37.0);
        assert_eq!(dist.power_of(MinerId(5)), Some(25.0));
        assert_eq!(dist.power_of(MinerId(6)), None);
    }
}
